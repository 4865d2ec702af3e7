//! Aggregate Core - Windowed Aggregation and Reporting

pub mod report;
pub mod sink;
pub mod window;

pub use report::{generate, DomainCount, Report, UserEdits};
pub use sink::{format_report, ReportSink, SinkError, StdoutSink};
pub use window::SlidingWindow;
