//! Diagnostic sink for the store's gated debug channels.
//!
//! # Responsibility
//! - Define the text-line output capability the store writes debug lines to.
//! - Provide the stdout production sink and an in-memory capture sink.
//!
//! # Invariants
//! - Emitting a line must never fail or panic; the sink is fire-and-forget.
//! - The sink is an injected capability, not an ambient global, so tests can
//!   capture output deterministically.

use std::sync::{Arc, Mutex};

/// Text-line output channel for debug diagnostics.
pub trait DebugSink: Send {
    /// Emits one formatted line. Must not panic.
    fn line(&self, text: &str);
}

impl<S: DebugSink + Sync> DebugSink for Arc<S> {
    fn line(&self, text: &str) {
        S::line(self, text);
    }
}

/// Production sink: prints each line to standard output.
#[derive(Debug, Default)]
pub struct StdoutSink;

impl DebugSink for StdoutSink {
    fn line(&self, text: &str) {
        println!("{text}");
    }
}

/// Capture sink that records emitted lines for later inspection.
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of every line emitted so far.
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().map(|lines| lines.clone()).unwrap_or_default()
    }
}

impl DebugSink for MemorySink {
    fn line(&self, text: &str) {
        // A poisoned lock drops the line instead of propagating the panic.
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(text.to_string());
        }
    }
}

/// Formats a line for the error debug channel.
pub fn error_line(text: &str) -> String {
    format!("!! Database Error !! > {text}")
}

/// Formats a line for the message debug channel.
pub fn message_line(text: &str) -> String {
    format!(">> Database > {text}")
}
