//! Integration tests for the stream control loop.
//!
//! The controller is exercised end-to-end through scripted line sources and a
//! collecting report sink, so connection faults, retries, and report cycles
//! are verified without a network or stdout.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::time::Duration;
use wikiflow::aggregate_core::{Report, ReportSink, SinkError};
use wikiflow::config::RuntimeConfig;
use wikiflow::stream_core::{
    ControllerError, LineConnector, LineSource, SourceError, StreamController,
};

/// One scripted action of a mock line source.
enum Step {
    Line(&'static str),
    /// Pend for the given seconds (virtual time) before the next step.
    Idle(u64),
    Fault(&'static str),
}

struct ScriptedSource {
    steps: VecDeque<Step>,
}

#[async_trait]
impl LineSource for ScriptedSource {
    async fn next_line(&mut self) -> Result<Option<String>, SourceError> {
        loop {
            match self.steps.pop_front() {
                Some(Step::Line(line)) => return Ok(Some(line.to_string())),
                Some(Step::Idle(secs)) => {
                    tokio::time::sleep(Duration::from_secs(secs)).await;
                }
                Some(Step::Fault(msg)) => {
                    return Err(SourceError::Transient(msg.to_string()))
                }
                None => return Ok(None),
            }
        }
    }
}

/// One scripted outcome of a connection attempt.
enum Connect {
    Source(Vec<Step>),
    Refuse(u16),
    NetFail,
}

struct ScriptedConnector {
    outcomes: VecDeque<Connect>,
    attempts: Arc<AtomicUsize>,
}

impl ScriptedConnector {
    fn new(outcomes: Vec<Connect>) -> (Self, Arc<AtomicUsize>) {
        let attempts = Arc::new(AtomicUsize::new(0));
        (
            Self {
                outcomes: outcomes.into(),
                attempts: attempts.clone(),
            },
            attempts,
        )
    }
}

#[async_trait]
impl LineConnector for ScriptedConnector {
    async fn connect(&mut self) -> Result<Box<dyn LineSource>, SourceError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        match self.outcomes.pop_front() {
            Some(Connect::Source(steps)) => Ok(Box::new(ScriptedSource {
                steps: steps.into(),
            })),
            Some(Connect::Refuse(status)) => Err(SourceError::ConnectFault(status)),
            Some(Connect::NetFail) | None => {
                Err(SourceError::Transient("connection refused".to_string()))
            }
        }
    }
}

struct CollectingSink {
    reports: Arc<Mutex<Vec<Report>>>,
}

impl CollectingSink {
    fn new() -> (Self, Arc<Mutex<Vec<Report>>>) {
        let reports = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                reports: reports.clone(),
            },
            reports,
        )
    }
}

#[async_trait]
impl ReportSink for CollectingSink {
    async fn render(&mut self, report: &Report) -> Result<(), SinkError> {
        self.reports.lock().unwrap().push(report.clone());
        Ok(())
    }
}

fn test_config() -> RuntimeConfig {
    RuntimeConfig {
        stream_url: "http://localhost/stream".to_string(),
        window_secs: 300,
        report_interval_secs: 60,
        retry_attempts: 5,
        retry_delay_secs: 5,
        distinguished_domain: "en.wikipedia.org".to_string(),
        rust_log: "info".to_string(),
    }
}

const EVENT_A: &str = r#"data: {"meta":{"domain":"en.wikipedia.org"},"page_title":"A","performer":{"user_text":"U1","user_edit_count":10}}"#;
const EVENT_B: &str = r#"data: {"meta":{"domain":"en.wikipedia.org"},"page_title":"B","performer":{"user_text":"U1","user_edit_count":5}}"#;
const BOT_EVENT: &str = r#"data: {"meta":{"domain":"en.wikipedia.org"},"page_title":"C","performer":{"user_text":"SomeBot","user_is_bot":true}}"#;

#[tokio::test(start_paused = true)]
async fn test_report_cycle_aggregates_window() {
    let (connector, _) = ScriptedConnector::new(vec![Connect::Source(vec![
        Step::Line(": keep-alive"),
        Step::Line("event: message"),
        Step::Line("id: [{\"topic\":\"eqiad.mediawiki\"}]"),
        Step::Line(EVENT_A),
        Step::Line("this is not json"),
        Step::Line(EVENT_B),
        Step::Line(BOT_EVENT),
        Step::Idle(90),
    ])]);
    let (sink, reports) = CollectingSink::new();

    let controller = StreamController::new(&test_config(), connector, sink);
    controller.run().await.unwrap();

    let reports = reports.lock().unwrap();
    assert_eq!(reports.len(), 1);

    let report = &reports[0];
    assert_eq!(report.minute, 1);
    // Bot event and malformed line never land in the window
    assert_eq!(report.domains.len(), 1);
    assert_eq!(report.domains[0].domain, "en.wikipedia.org");
    assert_eq!(report.domains[0].pages, 2);
    // Max edit count, not sum or latest
    assert_eq!(report.users.len(), 1);
    assert_eq!(report.users[0].user, "U1");
    assert_eq!(report.users[0].max_edit_count, 10);
}

#[tokio::test(start_paused = true)]
async fn test_minute_counter_increments_per_cycle() {
    // Two idles: a pending read is dropped when the ticker fires, consuming
    // one idle step per report cycle.
    let (connector, _) = ScriptedConnector::new(vec![Connect::Source(vec![
        Step::Line(EVENT_A),
        Step::Idle(90),
        Step::Idle(90),
    ])]);
    let (sink, reports) = CollectingSink::new();

    let controller = StreamController::new(&test_config(), connector, sink);
    controller.run().await.unwrap();

    let reports = reports.lock().unwrap();
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].minute, 1);
    assert_eq!(reports[1].minute, 2);
}

#[tokio::test(start_paused = true)]
async fn test_clean_eof_terminates_gracefully() {
    let (connector, attempts) =
        ScriptedConnector::new(vec![Connect::Source(vec![Step::Line(EVENT_A)])]);
    let (sink, reports) = CollectingSink::new();

    let controller = StreamController::new(&test_config(), connector, sink);
    let result = controller.run().await;

    assert!(result.is_ok());
    // Clean closure never consumes the retry budget
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
    assert!(reports.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_window_survives_reconnect() {
    let (connector, attempts) = ScriptedConnector::new(vec![
        Connect::Source(vec![Step::Line(EVENT_A), Step::Fault("broken pipe")]),
        Connect::Source(vec![Step::Line(EVENT_B), Step::Idle(90)]),
    ]);
    let (sink, reports) = CollectingSink::new();

    let controller = StreamController::new(&test_config(), connector, sink);
    controller.run().await.unwrap();

    assert_eq!(attempts.load(Ordering::SeqCst), 2);
    let reports = reports.lock().unwrap();
    assert_eq!(reports.len(), 1);
    // Events from before the fault are still in the window
    assert_eq!(reports[0].domains[0].pages, 2);
}

#[tokio::test(start_paused = true)]
async fn test_retry_budget_exhausted_after_consecutive_faults() {
    // Every connection attempt fails at the network level
    let (connector, attempts) = ScriptedConnector::new(vec![]);
    let (sink, _) = CollectingSink::new();

    let controller = StreamController::new(&test_config(), connector, sink);
    let result = controller.run().await;

    assert!(matches!(result, Err(ControllerError::RetryBudgetExhausted)));
    // Initial attempt plus 5 budgeted retries, never a 6th reconnect
    assert_eq!(attempts.load(Ordering::SeqCst), 6);
}

#[tokio::test(start_paused = true)]
async fn test_handshake_rejection_is_fatal() {
    let (connector, attempts) = ScriptedConnector::new(vec![Connect::Refuse(403)]);
    let (sink, _) = CollectingSink::new();

    let controller = StreamController::new(&test_config(), connector, sink);
    let result = controller.run().await;

    assert!(matches!(result, Err(ControllerError::ConnectFault(403))));
    // Fatal handshake never enters the retry loop
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_mid_stream_fault_retries_then_exhausts() {
    // One good connection that faults, then nothing but network failures
    let (connector, attempts) = ScriptedConnector::new(vec![Connect::Source(vec![
        Step::Line(EVENT_A),
        Step::Fault("connection reset"),
    ])]);
    let (sink, _) = CollectingSink::new();

    let controller = StreamController::new(&test_config(), connector, sink);
    let result = controller.run().await;

    assert!(matches!(result, Err(ControllerError::RetryBudgetExhausted)));
    assert_eq!(attempts.load(Ordering::SeqCst), 6);
}
