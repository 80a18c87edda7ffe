//! Sink implementations

#[cfg(feature = "console")]
pub mod console;
#[cfg(feature = "file")]
pub mod json;
pub mod memory;

#[cfg(feature = "console")]
pub use console::ConsoleSink;
#[cfg(feature = "file")]
pub use json::JsonSink;
pub use memory::{MemorySink, RecordBuffer};

pub use crate::core::Sink;
