//! Report sink adapters.

mod http_sink;

pub use http_sink::HttpReportSink;
