use std::fmt::Write;

use serde::Serialize;

use crate::models::{ReportResult, UserScoreRecord};
use crate::score;

const EVEN_ROW_BACKGROUND: &str = "#f9f9f9";
const ODD_ROW_BACKGROUND: &str = "#ffffff";

pub fn display_date(report: &ReportResult) -> String {
    report.date.format("%d/%m/%Y").to_string()
}

pub fn subject(report: &ReportResult, team: &str) -> String {
    format!("📊 Produtividade {} — {}", team, display_date(report))
}

pub fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn row_background(rank: usize) -> &'static str {
    if rank % 2 == 0 {
        EVEN_ROW_BACKGROUND
    } else {
        ODD_ROW_BACKGROUND
    }
}

fn write_row(output: &mut String, rank: usize, record: &UserScoreRecord) {
    let counts = &record.counts;
    let _ = writeln!(output, "    <tr style=\"background:{};\">", row_background(rank));
    let _ = writeln!(
        output,
        "      <td style=\"padding:10px 14px; font-weight:bold;\">{}</td>",
        score::rank_label(rank)
    );
    let _ = writeln!(
        output,
        "      <td style=\"padding:10px 14px; font-family:monospace; font-size:12px; color:#555;\" title=\"{}\">{}</td>",
        escape_html(&record.user_id),
        escape_html(&record.display_id)
    );
    for count in [counts.rejected, counts.forms, counts.rotativos, counts.reviewed_doc] {
        let _ = writeln!(
            output,
            "      <td style=\"padding:10px 14px; text-align:center;\">{count}</td>"
        );
    }
    let _ = writeln!(
        output,
        "      <td style=\"padding:10px 14px; text-align:center; font-weight:bold; color:#2c7be5;\">{:.1}</td>",
        record.score
    );
    let _ = writeln!(output, "    </tr>");
}

pub fn build_html(report: &ReportResult, team: &str) -> String {
    let date = display_date(report);
    let team = escape_html(team);

    let mut rows = String::new();
    for (rank, record) in report.records.iter().enumerate() {
        write_row(&mut rows, rank, record);
    }

    let mut output = String::new();
    let _ = writeln!(output, "<!DOCTYPE html>");
    let _ = writeln!(output, "<html>");
    let _ = writeln!(output, "<head><meta charset=\"UTF-8\"></head>");
    let _ = writeln!(
        output,
        "<body style=\"margin:0; padding:0; background:#f4f6f9; font-family:Arial, sans-serif;\">"
    );
    let _ = writeln!(
        output,
        "  <table width=\"100%\" cellpadding=\"0\" cellspacing=\"0\" style=\"background:#f4f6f9; padding:30px 0;\">"
    );
    let _ = writeln!(output, "    <tr><td align=\"center\">");
    let _ = writeln!(
        output,
        "      <table width=\"680\" cellpadding=\"0\" cellspacing=\"0\" style=\"background:#ffffff; border-radius:10px; overflow:hidden; box-shadow:0 2px 10px rgba(0,0,0,0.08);\">"
    );

    let _ = writeln!(output, "        <!-- Header -->");
    let _ = writeln!(output, "        <tr>");
    let _ = writeln!(output, "          <td style=\"background:#1a1a2e; padding:28px 32px;\">");
    let _ = writeln!(
        output,
        "            <h1 style=\"margin:0; color:#ffffff; font-size:22px;\">📊 Relatório de Produtividade</h1>"
    );
    let _ = writeln!(
        output,
        "            <p style=\"margin:6px 0 0; color:#aab4c8; font-size:14px;\">{team} · {date}</p>"
    );
    let _ = writeln!(output, "          </td>");
    let _ = writeln!(output, "        </tr>");

    let _ = writeln!(output, "        <!-- Total -->");
    let _ = writeln!(output, "        <tr>");
    let _ = writeln!(
        output,
        "          <td style=\"padding:24px 32px; background:#eef2ff; border-bottom:1px solid #dde3f0;\">"
    );
    let _ = writeln!(
        output,
        "            <p style=\"margin:0; font-size:14px; color:#555;\">Score total da equipa hoje</p>"
    );
    let _ = writeln!(
        output,
        "            <p style=\"margin:4px 0 0; font-size:36px; font-weight:bold; color:#1a1a2e;\">{:.1}</p>",
        report.total_score
    );
    let _ = writeln!(output, "          </td>");
    let _ = writeln!(output, "        </tr>");

    let _ = writeln!(output, "        <!-- Table -->");
    let _ = writeln!(output, "        <tr>");
    let _ = writeln!(output, "          <td style=\"padding:24px 32px;\">");
    let _ = writeln!(
        output,
        "            <table width=\"100%\" cellpadding=\"0\" cellspacing=\"0\" style=\"border-collapse:collapse; font-size:14px;\">"
    );
    let _ = writeln!(output, "              <thead>");
    let _ = writeln!(output, "                <tr style=\"background:#1a1a2e; color:#ffffff;\">");
    for (heading, align) in [
        ("#", "left"),
        ("Reviewer", "left"),
        ("Rejected", "center"),
        ("Forms", "center"),
        ("Rotativos", "center"),
        ("Reviewed Doc", "center"),
        ("Score", "center"),
    ] {
        let _ = writeln!(
            output,
            "                  <th style=\"padding:10px 14px; text-align:{align};\">{heading}</th>"
        );
    }
    let _ = writeln!(output, "                </tr>");
    let _ = writeln!(output, "              </thead>");
    let _ = writeln!(output, "              <tbody>");
    output.push_str(&rows);
    let _ = writeln!(output, "              </tbody>");
    let _ = writeln!(output, "            </table>");
    let _ = writeln!(output, "          </td>");
    let _ = writeln!(output, "        </tr>");

    let _ = writeln!(output, "        <!-- Footer -->");
    let _ = writeln!(output, "        <tr>");
    let _ = writeln!(
        output,
        "          <td style=\"padding:18px 32px; background:#f4f6f9; border-top:1px solid #e0e0e0;\">"
    );
    let _ = writeln!(
        output,
        "            <p style=\"margin:0; font-size:12px; color:#999;\">Enviado automaticamente · {team} · {date} às 23:59</p>"
    );
    let _ = writeln!(output, "          </td>");
    let _ = writeln!(output, "        </tr>");

    let _ = writeln!(output, "      </table>");
    let _ = writeln!(output, "    </td></tr>");
    let _ = writeln!(output, "  </table>");
    let _ = writeln!(output, "</body>");
    let _ = writeln!(output, "</html>");

    output
}

pub fn build_text(report: &ReportResult, team: &str) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "Relatório de Produtividade · {} · {}", team, display_date(report));
    let _ = writeln!(output, "Score total da equipa hoje: {:.1}", report.total_score);
    let _ = writeln!(output);

    if report.records.is_empty() {
        let _ = writeln!(output, "Sem atividade registada.");
        return output;
    }

    for (rank, record) in report.records.iter().enumerate() {
        let counts = &record.counts;
        let _ = writeln!(
            output,
            "{} {} score {:.1} (rejected {}, forms {}, rotativos {}, reviewed doc {})",
            score::rank_label(rank),
            record.display_id,
            record.score,
            counts.rejected,
            counts.forms,
            counts.rotativos,
            counts.reviewed_doc
        );
    }
    output
}

const CSV_HEADER: [&str; 8] = [
    "rank",
    "user_id",
    "rejected",
    "rejected_secondary",
    "forms",
    "rotativos",
    "reviewed_doc",
    "score",
];

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    rank: usize,
    user_id: &'a str,
    rejected: u64,
    rejected_secondary: u64,
    forms: u64,
    rotativos: u64,
    reviewed_doc: u64,
    score: String,
}

pub fn write_csv<W: std::io::Write>(report: &ReportResult, writer: W) -> anyhow::Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    writer.write_record(CSV_HEADER)?;
    for (rank, record) in report.records.iter().enumerate() {
        let counts = &record.counts;
        writer.serialize(CsvRow {
            rank: rank + 1,
            user_id: &record.user_id,
            rejected: counts.rejected,
            rejected_secondary: counts.rejected_secondary,
            forms: counts.forms,
            rotativos: counts.rotativos,
            reviewed_doc: counts.reviewed_doc,
            score: format!("{:.1}", record.score),
        })?;
    }
    writer.flush()?;
    Ok(())
}
