//! Stream consumption control loop
//!
//! Owns the sliding window for the process lifetime and drives the
//! `Connecting → Streaming → (Retrying | Terminated)` state machine: line
//! consumption, SSE control-line filtering, reconnection, and the periodic
//! evict + generate + render cycle.

use crate::aggregate_core::report;
use crate::aggregate_core::sink::{ReportSink, SinkError};
use crate::aggregate_core::window::SlidingWindow;
use crate::config::RuntimeConfig;
use crate::stream_core::backoff::FixedBackoff;
use crate::stream_core::parser::{self, Rejection};
use crate::stream_core::source::{LineConnector, LineSource, SourceError};
use chrono::Utc;
use tokio::time::{interval, Duration, Interval, MissedTickBehavior};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Connecting,
    Streaming,
    Retrying,
    Terminated,
}

#[derive(Debug)]
pub enum ControllerError {
    /// The upstream rejected the handshake. Never retried.
    ConnectFault(u16),
    /// Transient faults exceeded the retry budget.
    RetryBudgetExhausted,
    /// The report sink failed.
    Sink(SinkError),
}

impl std::fmt::Display for ControllerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ControllerError::ConnectFault(status) => {
                write!(f, "failed to connect to stream: status {}", status)
            }
            ControllerError::RetryBudgetExhausted => {
                write!(f, "maximum retry attempts exceeded")
            }
            ControllerError::Sink(e) => write!(f, "report sink error: {}", e),
        }
    }
}

impl std::error::Error for ControllerError {}

/// Outcome of one streaming session.
enum StreamOutcome {
    /// The stream closed cleanly (EOF without error).
    Closed,
    /// The stream reported an I/O failure mid-read.
    Fault,
}

pub struct StreamController<C: LineConnector, S: ReportSink> {
    connector: C,
    sink: S,
    window: SlidingWindow,
    backoff: FixedBackoff,
    report_interval_secs: u64,
    distinguished_domain: String,
    minute_counter: u64,
    state: ControllerState,
}

impl<C: LineConnector, S: ReportSink> StreamController<C, S> {
    pub fn new(config: &RuntimeConfig, connector: C, sink: S) -> Self {
        Self {
            connector,
            sink,
            window: SlidingWindow::new(config.window_secs),
            backoff: FixedBackoff::new(config.retry_delay_secs, config.retry_attempts),
            report_interval_secs: config.report_interval_secs,
            distinguished_domain: config.distinguished_domain.clone(),
            minute_counter: 1,
            state: ControllerState::Connecting,
        }
    }

    /// Run the control loop until the stream closes cleanly or a fatal
    /// condition terminates it.
    pub async fn run(mut self) -> Result<(), ControllerError> {
        // The report cadence spans reconnects; only an emitted report resets
        // the baseline.
        let mut ticker = interval(Duration::from_secs(self.report_interval_secs));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await; // skip first immediate tick

        loop {
            match self.state {
                ControllerState::Connecting => {
                    log::info!("🔌 Connecting to event stream...");
                    match self.connector.connect().await {
                        Ok(source) => {
                            log::info!("✅ Connected to event stream");
                            self.state = ControllerState::Streaming;
                            match self.stream(source, &mut ticker).await? {
                                StreamOutcome::Closed => {
                                    // Clean closure terminates gracefully
                                    // without consuming the retry budget.
                                    log::info!("Stream closed cleanly");
                                    self.state = ControllerState::Terminated;
                                    return Ok(());
                                }
                                StreamOutcome::Fault => {
                                    self.state = ControllerState::Retrying;
                                }
                            }
                        }
                        Err(SourceError::ConnectFault(status)) => {
                            log::error!("❌ Stream handshake rejected: status {}", status);
                            self.state = ControllerState::Terminated;
                            return Err(ControllerError::ConnectFault(status));
                        }
                        Err(SourceError::Transient(msg)) => {
                            log::error!("❌ Connection failed: {}", msg);
                            self.state = ControllerState::Retrying;
                        }
                    }
                }
                ControllerState::Retrying => match self.backoff.sleep().await {
                    Ok(()) => self.state = ControllerState::Connecting,
                    Err(_) => {
                        log::error!("❌ Max retries reached, giving up");
                        self.state = ControllerState::Terminated;
                        return Err(ControllerError::RetryBudgetExhausted);
                    }
                },
                // Streaming is entered through stream(); Terminated always
                // returns out of the loop above.
                ControllerState::Streaming | ControllerState::Terminated => unreachable!(),
            }
        }
    }

    async fn stream(
        &mut self,
        mut source: Box<dyn LineSource>,
        ticker: &mut Interval,
    ) -> Result<StreamOutcome, ControllerError> {
        loop {
            tokio::select! {
                line = source.next_line() => {
                    match line {
                        Ok(Some(line)) => self.handle_line(&line),
                        Ok(None) => return Ok(StreamOutcome::Closed),
                        Err(SourceError::Transient(msg)) => {
                            log::error!("❌ Stream fault: {}", msg);
                            return Ok(StreamOutcome::Fault);
                        }
                        Err(SourceError::ConnectFault(status)) => {
                            return Err(ControllerError::ConnectFault(status));
                        }
                    }
                }
                _ = ticker.tick() => {
                    self.emit_report().await?;
                }
            }
        }
    }

    /// Filter protocol noise, parse the rest, append accepted events.
    /// Per-event faults are recovered locally: logged and skipped.
    fn handle_line(&mut self, line: &str) {
        let line = line.trim();
        if line.is_empty() || is_control_line(line) {
            return;
        }

        match parser::parse(line) {
            Ok(event) => {
                log::debug!(
                    "Event: domain={} page={} user={}",
                    event.domain,
                    event.page_title,
                    event.user
                );
                self.window.append(event);
            }
            Err(Rejection::BotFiltered) => {
                log::debug!("Skipping bot edit");
            }
            Err(rejection) => {
                log::warn!("Skipping event: {}", rejection);
            }
        }
    }

    async fn emit_report(&mut self) -> Result<(), ControllerError> {
        let now = Utc::now().timestamp();
        self.window.evict(now);

        let report = report::generate(
            self.window.snapshot(),
            &self.distinguished_domain,
            self.minute_counter,
        );
        log::info!(
            "📊 Minute {}: {} events in window, {} domains",
            self.minute_counter,
            self.window.len(),
            report.domains.len()
        );

        self.sink
            .render(&report)
            .await
            .map_err(ControllerError::Sink)?;
        self.minute_counter += 1;
        Ok(())
    }
}

/// SSE comment/event-name/id lines are protocol-level noise and never reach
/// the parser.
fn is_control_line(line: &str) -> bool {
    line.starts_with(':') || line.starts_with("event:") || line.starts_with("id:")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_line_detection() {
        assert!(is_control_line(": keep-alive"));
        assert!(is_control_line("event: message"));
        assert!(is_control_line("id: [{\"topic\":\"eqiad\"}]"));
        assert!(!is_control_line("data: {}"));
        assert!(!is_control_line("{\"meta\":{}}"));
    }
}
