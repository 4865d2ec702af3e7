pub mod aggregate_core;
pub mod config;
pub mod stream_core;
