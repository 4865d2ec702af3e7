//! Output sink for rendered reports
//!
//! Defines the interface for emitting the per-minute report so tests can
//! capture output without stdout. Diagnostics stay on the `log` stderr
//! stream; only rendered reports go through the sink.

use super::report::Report;
use async_trait::async_trait;
use std::io::Write;

#[derive(Debug)]
pub enum SinkError {
    Io(std::io::Error),
}

impl From<std::io::Error> for SinkError {
    fn from(err: std::io::Error) -> Self {
        SinkError::Io(err)
    }
}

impl std::fmt::Display for SinkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SinkError::Io(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for SinkError {}

#[async_trait]
pub trait ReportSink: Send {
    /// Render one report cycle.
    async fn render(&mut self, report: &Report) -> Result<(), SinkError>;
}

/// Render the two-section textual report.
pub fn format_report(report: &Report, distinguished_domain: &str) -> String {
    let mut out = String::new();

    out.push_str(&format!("\nMinute {} Report\n", report.minute));

    out.push_str("Domain Report:\n");
    out.push_str(&format!(
        "Total number of Wikipedia Domains Updated: {}\n",
        report.domains.len()
    ));
    for entry in &report.domains {
        out.push_str(&format!("{}: {} pages updated\n", entry.domain, entry.pages));
    }

    out.push_str(&format!("\nUsers Report (for {}):\n", distinguished_domain));
    for entry in &report.users {
        out.push_str(&format!("{}: {} edits\n", entry.user, entry.max_edit_count));
    }

    out
}

/// Production sink: reports on stdout, distinct from the stderr diagnostics.
pub struct StdoutSink {
    distinguished_domain: String,
}

impl StdoutSink {
    pub fn new(distinguished_domain: String) -> Self {
        Self {
            distinguished_domain,
        }
    }
}

#[async_trait]
impl ReportSink for StdoutSink {
    async fn render(&mut self, report: &Report) -> Result<(), SinkError> {
        let text = format_report(report, &self.distinguished_domain);
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(text.as_bytes())?;
        stdout.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate_core::report::{DomainCount, UserEdits};

    #[test]
    fn test_format_report_layout() {
        let report = Report {
            minute: 3,
            domains: vec![
                DomainCount {
                    domain: "en.wikipedia.org".to_string(),
                    pages: 2,
                },
                DomainCount {
                    domain: "de.wikipedia.org".to_string(),
                    pages: 1,
                },
            ],
            users: vec![UserEdits {
                user: "U1".to_string(),
                max_edit_count: 10,
            }],
        };

        let text = format_report(&report, "en.wikipedia.org");

        assert_eq!(
            text,
            "\nMinute 3 Report\n\
             Domain Report:\n\
             Total number of Wikipedia Domains Updated: 2\n\
             en.wikipedia.org: 2 pages updated\n\
             de.wikipedia.org: 1 pages updated\n\
             \nUsers Report (for en.wikipedia.org):\n\
             U1: 10 edits\n"
        );
    }

    #[test]
    fn test_format_empty_report() {
        let report = Report {
            minute: 1,
            domains: vec![],
            users: vec![],
        };

        let text = format_report(&report, "en.wikipedia.org");
        assert!(text.contains("Total number of Wikipedia Domains Updated: 0"));
    }
}
