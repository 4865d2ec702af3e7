//! Stream Core - SSE Consumption and Control Loop
//!
//! ```text
//! SseConnector → LineSource → StreamController
//!     ↓ (control-line filter)
//! parser::parse → Event → SlidingWindow
//!     ↓ (every report interval)
//! report::generate → ReportSink
//! ```

pub mod backoff;
pub mod controller;
pub mod parser;
pub mod source;

pub use backoff::{FixedBackoff, RetryBudgetExhausted};
pub use controller::{ControllerError, ControllerState, StreamController};
pub use parser::{parse, Event, Rejection};
pub use source::{LineConnector, LineSource, SourceError, SseConnector, SseLineSource};
