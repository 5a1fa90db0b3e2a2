use anyhow::Context;
use chrono::NaiveDate;
use tracing::{info, warn};

use crate::config::{AnalyticsConfig, Config};
use crate::mailer::{Mailer, OutgoingEmail};
use crate::mixpanel::{EventSource, FetchOutcome};
use crate::models::{Category, DailyMetrics, ReportResult};
use crate::report;
use crate::score;

pub fn duplicate_queries(analytics: &AnalyticsConfig) -> Vec<(Category, Category)> {
    let mut pairs = Vec::new();
    for (index, first) in Category::ALL.iter().enumerate() {
        for second in &Category::ALL[index + 1..] {
            if first.event_name() == second.event_name()
                && analytics.filter_for(*first) == analytics.filter_for(*second)
            {
                pairs.push((*first, *second));
            }
        }
    }
    pairs
}

pub async fn collect_metrics<S: EventSource>(
    source: &S,
    analytics: &AnalyticsConfig,
    date: NaiveDate,
) -> anyhow::Result<DailyMetrics> {
    for (first, second) in duplicate_queries(analytics) {
        warn!(
            first = %first.slot(),
            second = %second.slot(),
            event = first.event_name(),
            "Categories issue identical queries; counts will be duplicated"
        );
    }

    let mut metrics = DailyMetrics::default();
    for category in Category::ALL {
        let event = category.event_name();
        let outcome = source
            .fetch_event(event, date, analytics.filter_for(category))
            .await
            .with_context(|| format!("failed to fetch `{event}` for category {}", category.slot()))?;

        if let FetchOutcome::Malformed { reason } = &outcome {
            warn!(
                category = %category.slot(),
                event,
                %reason,
                "Unexpected insights response, treating as no data"
            );
        }
        let counts = outcome.into_counts();
        info!(category = %category.slot(), event, users = counts.len(), "Fetched event counts");
        metrics.insert(category, counts);
    }
    Ok(metrics)
}

pub async fn build_report<S: EventSource>(
    config: &Config,
    source: &S,
    date: NaiveDate,
) -> anyhow::Result<ReportResult> {
    let metrics = collect_metrics(source, &config.analytics, date).await?;
    let report = score::aggregate(&metrics, date);
    info!(
        users = report.records.len(),
        total_score = report.total_score,
        "Scores computed"
    );
    Ok(report)
}

pub fn render_email(report: &ReportResult, team: &str) -> OutgoingEmail {
    OutgoingEmail {
        subject: report::subject(report, team),
        html: report::build_html(report, team),
        text: report::build_text(report, team),
    }
}

/// Full scheduled run: fetch the day's metrics, score them and email the leaderboard.
pub async fn run<S: EventSource, M: Mailer>(
    config: &Config,
    source: &S,
    mailer: &M,
    date: NaiveDate,
) -> anyhow::Result<ReportResult> {
    let report = build_report(config, source, date).await?;
    let email = render_email(&report, &config.team_name);
    mailer
        .send(&email)
        .await
        .context("failed to send report email")?;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{FetchError, MailError};
    use crate::models::MetricResult;
    use std::collections::{BTreeMap, HashMap};
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct FakeSource {
        bodies: HashMap<&'static str, FetchOutcome>,
        failing: Option<&'static str>,
        calls: Mutex<Vec<(String, NaiveDate, Option<String>)>>,
    }

    impl FakeSource {
        fn with(mut self, event: &'static str, entries: &[(&str, u64)]) -> Self {
            let counts: MetricResult = entries
                .iter()
                .map(|(user, count)| (user.to_string(), *count))
                .collect();
            self.bodies.insert(event, FetchOutcome::Counts(counts));
            self
        }
    }

    impl EventSource for FakeSource {
        async fn fetch_event(
            &self,
            event_name: &str,
            date: NaiveDate,
            filter: Option<&str>,
        ) -> Result<FetchOutcome, FetchError> {
            self.calls.lock().unwrap().push((
                event_name.to_string(),
                date,
                filter.map(String::from),
            ));
            if self.failing == Some(event_name) {
                return Err(FetchError::Server {
                    status: 500,
                    body: "boom".to_string(),
                });
            }
            Ok(self
                .bodies
                .get(event_name)
                .cloned()
                .unwrap_or_else(|| FetchOutcome::Counts(MetricResult::new())))
        }
    }

    #[derive(Default)]
    struct FakeMailer {
        sent: Mutex<Vec<OutgoingEmail>>,
        fail: bool,
    }

    impl Mailer for FakeMailer {
        async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
            if self.fail {
                return Err(MailError::Smtp("535 authentication failed".to_string()));
            }
            self.sent.lock().unwrap().push(email.clone());
            Ok(())
        }
    }

    fn config() -> Config {
        Config {
            analytics: AnalyticsConfig {
                username: "svc".to_string(),
                secret: "secret".to_string(),
                project_id: "1".to_string(),
                api_url: "http://localhost/insights".to_string(),
                timeout: Duration::from_secs(1),
                filters: BTreeMap::new(),
            },
            team_name: "DocDigitizer".to_string(),
        }
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 4).unwrap()
    }

    #[tokio::test]
    async fn fetches_five_categories_in_order() {
        let source = FakeSource::default();
        collect_metrics(&source, &config().analytics, day()).await.unwrap();
        let calls = source.calls.lock().unwrap();
        let events: Vec<&str> = calls.iter().map(|(event, _, _)| event.as_str()).collect();
        assert_eq!(
            events,
            vec![
                "Rejected Review",
                "Rejected Review",
                "Reviewed Field",
                "Reviewed Field",
                "Reviewed Doc"
            ]
        );
        assert!(calls.iter().all(|(_, date, filter)| *date == day() && filter.is_none()));
    }

    #[tokio::test]
    async fn configured_filter_reaches_its_category_only() {
        let mut config = config();
        config
            .analytics
            .filters
            .insert(Category::Rotativos, "properties[\"line\"] == \"rotativos\"".to_string());
        let source = FakeSource::default();
        collect_metrics(&source, &config.analytics, day()).await.unwrap();
        let calls = source.calls.lock().unwrap();
        assert_eq!(calls[2].2, None);
        assert_eq!(calls[3].2.as_deref(), Some("properties[\"line\"] == \"rotativos\""));
    }

    #[test]
    fn duplicate_queries_detected_until_filtered() {
        let mut config = config();
        assert_eq!(
            duplicate_queries(&config.analytics),
            vec![
                (Category::RejectedReview, Category::RejectedReviewSecondary),
                (Category::Forms, Category::Rotativos)
            ]
        );
        config
            .analytics
            .filters
            .insert(Category::RejectedReviewSecondary, "x".to_string());
        assert_eq!(
            duplicate_queries(&config.analytics),
            vec![(Category::Forms, Category::Rotativos)]
        );
    }

    #[tokio::test]
    async fn run_scores_and_sends_one_email() {
        let source = FakeSource::default()
            .with("Rejected Review", &[("reviewer-aaaa", 10)])
            .with("Reviewed Field", &[("reviewer-aaaa", 1), ("reviewer-bbbb", 3)])
            .with("Reviewed Doc", &[("reviewer-bbbb", 2)]);
        let mailer = FakeMailer::default();

        let report = run(&config(), &source, &mailer, day()).await.unwrap();

        // A and B both read "Rejected Review", C and D both read "Reviewed Field"
        assert_eq!(report.records.len(), 2);
        assert_eq!(report.records[0].user_id, "reviewer-aaaa");
        assert_eq!(report.records[0].counts.rejected_secondary, 10);
        assert_eq!(report.records[0].score, 21.6);
        assert_eq!(report.records[1].score, 7.2);
        assert_eq!(report.total_score, 28.8);

        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].subject, "📊 Produtividade DocDigitizer — 04/03/2026");
        assert!(sent[0].html.contains(">28.8</p>"));
    }

    #[tokio::test]
    async fn empty_day_still_sends() {
        let source = FakeSource::default();
        let mailer = FakeMailer::default();
        let report = run(&config(), &source, &mailer, day()).await.unwrap();
        assert!(report.records.is_empty());
        assert_eq!(report.total_score, 0.0);
        assert_eq!(mailer.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn malformed_body_counts_as_empty() {
        let mut source = FakeSource::default().with("Reviewed Doc", &[("u1", 4)]);
        source.bodies.insert(
            "Rejected Review",
            FetchOutcome::Malformed {
                reason: "missing `data`".to_string(),
            },
        );
        let metrics = collect_metrics(&source, &config().analytics, day()).await.unwrap();
        assert!(metrics.rejected.is_empty());
        assert!(metrics.rejected_secondary.is_empty());
        assert_eq!(metrics.reviewed_doc["u1"], 4);
    }

    #[tokio::test]
    async fn http_failure_aborts_before_sending() {
        let source = FakeSource {
            failing: Some("Reviewed Field"),
            ..FakeSource::default()
        };
        let mailer = FakeMailer::default();
        let err = run(&config(), &source, &mailer, day()).await.unwrap_err();
        assert!(format!("{err:#}").contains("HTTP 500"));
        assert!(mailer.sent.lock().unwrap().is_empty());
        // stops at the first failing category
        assert_eq!(source.calls.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn mail_failure_propagates() {
        let source = FakeSource::default().with("Reviewed Doc", &[("u1", 1)]);
        let mailer = FakeMailer {
            fail: true,
            ..FakeMailer::default()
        };
        let err = run(&config(), &source, &mailer, day()).await.unwrap_err();
        assert!(format!("{err:#}").contains("authentication failed"));
    }
}
