use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use reqwest::Client;
use serde_json::json;
use tracing::warn;

use crate::config::Config;
use crate::model::JobRecord;

const API_BASE: &str = "https://api.telegram.org";

/// Telegram push channel. Every public method is fire-and-forget: a failed
/// send is logged and swallowed, never retried, and never fails the run.
pub struct Notifier {
    client: Client,
    bot_token: String,
    chat_id: String,
}

impl Notifier {
    pub fn new(cfg: &Config) -> Self {
        Self {
            client: Client::new(),
            bot_token: cfg.bot_token.clone(),
            chat_id: cfg.chat_id.clone(),
        }
    }

    async fn send(&self, text: &str) -> Result<()> {
        let url = format!("{API_BASE}/bot{}/sendMessage", self.bot_token);
        self.client
            .post(&url)
            .json(&json!({
                "chat_id": self.chat_id,
                "text": text,
                "parse_mode": "HTML",
                "disable_web_page_preview": true,
            }))
            .send()
            .await
            .context("sending Telegram message")?
            .error_for_status()
            .context("Telegram rejected the message")?;
        Ok(())
    }

    /// One message per new record, sent sequentially in scrape order.
    pub async fn notify_new(&self, records: &[JobRecord]) {
        for record in records {
            if let Err(e) = self.send(&format_record(record)).await {
                warn!("failed to notify about {}: {e:#}", record.id);
            }
        }
    }

    pub async fn send_summary(&self, new_count: usize, total: usize, elapsed: Duration) {
        let text = format_summary(new_count, total, elapsed, Local::now());
        if let Err(e) = self.send(&text).await {
            warn!("failed to send summary: {e:#}");
        }
    }

    /// Single best-effort failure report, sent before the run error
    /// propagates to the caller.
    pub async fn send_failure(&self, error: &anyhow::Error) {
        let text = format!(
            "\u{274c} <b>Job check failed</b>\n<i>{}</i>",
            escape_html(&format!("{error:#}"))
        );
        if let Err(e) = self.send(&text).await {
            warn!("failed to send failure notification: {e:#}");
        }
    }
}

fn format_record(record: &JobRecord) -> String {
    let mut lines = vec![format!("\u{1f195} <b>{}</b>", escape_html(&record.title))];
    for (icon, value) in [
        ("\u{1f3e5}", &record.employer),
        ("\u{1f4cd}", &record.location),
        ("\u{1f4b0}", &record.salary),
    ] {
        if !value.is_empty() {
            lines.push(format!("{icon} {}", escape_html(value)));
        }
    }
    if !record.link.is_empty() {
        lines.push(format!(r#"<a href="{}">View posting</a>"#, escape_html(&record.link)));
    }
    lines.join("\n")
}

fn format_summary(new_count: usize, total: usize, elapsed: Duration, at: DateTime<Local>) -> String {
    let headline = if new_count > 0 {
        format!("\u{2705} <b>Found {new_count} new job posting(s)</b>")
    } else {
        "No new job postings this time.".to_string()
    };
    format!(
        "{headline}\n{new_count} new out of {total} scraped\nChecked {} in {:.1}s",
        at.format("%d/%m/%Y %H:%M"),
        elapsed.as_secs_f64()
    )
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::test_record;

    #[test]
    fn escapes_html_entities() {
        assert_eq!(escape_html("A & B <Trust>"), "A &amp; B &lt;Trust&gt;");
    }

    #[test]
    fn record_message_has_title_and_link() {
        let mut record = test_record("/candidate/jobadvert/C9999", "Consultant Dermatologist");
        record.link = "https://www.jobs.nhs.uk/candidate/jobadvert/C9999".to_string();
        record.employer = "Guy's and St Thomas' NHS Foundation Trust".to_string();
        record.salary = "£93,666 to £126,281 a year".to_string();

        let text = format_record(&record);
        assert!(text.contains("<b>Consultant Dermatologist</b>"));
        assert!(text.contains(r#"<a href="https://www.jobs.nhs.uk/candidate/jobadvert/C9999">"#));
        assert!(text.contains("£93,666 to £126,281 a year"));
    }

    #[test]
    fn record_message_escapes_fields() {
        let mut record = test_record("a", "R&D Fellow <Dermatology>");
        record.link = "https://example.test/job".to_string();
        let text = format_record(&record);
        assert!(text.contains("R&amp;D Fellow &lt;Dermatology&gt;"));
        assert!(!text.contains("<Dermatology>"));
    }

    #[test]
    fn record_message_omits_empty_fields() {
        let text = format_record(&test_record("a", "Consultant"));
        assert_eq!(text.lines().count(), 1);
    }

    #[test]
    fn summary_reports_counts() {
        let text = format_summary(2, 2, Duration::from_secs(12), Local::now());
        assert!(text.contains("2 new out of 2 scraped"));
        assert!(text.contains("Found 2 new job posting(s)"));
        assert!(text.contains("in 12.0s"));
    }

    #[test]
    fn summary_for_zero_new() {
        let text = format_summary(0, 0, Duration::from_secs(8), Local::now());
        assert!(text.starts_with("No new job postings"));
        assert!(text.contains("0 new out of 0 scraped"));
    }
}
