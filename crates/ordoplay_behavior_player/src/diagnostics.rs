// SPDX-License-Identifier: MIT OR Apache-2.0
//! Warning and error tally for the player's exit summary.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Messages kept for the summary
const KEPT_MESSAGES: usize = 16;

#[derive(Debug, Default)]
struct Tally {
    warnings: AtomicUsize,
    errors: AtomicUsize,
    messages: Mutex<Vec<String>>,
}

/// Read side of the [`DiagnosticsLayer`]
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    tally: Arc<Tally>,
}

impl Diagnostics {
    /// Number of warnings logged so far
    pub fn warnings(&self) -> usize {
        self.tally.warnings.load(Ordering::Relaxed)
    }

    /// Number of errors logged so far
    pub fn errors(&self) -> usize {
        self.tally.errors.load(Ordering::Relaxed)
    }

    /// First warning and error messages, oldest first
    pub fn messages(&self) -> Vec<String> {
        self.tally
            .messages
            .lock()
            .map(|messages| messages.clone())
            .unwrap_or_default()
    }
}

/// A `tracing_subscriber::Layer` counting warnings and errors
pub struct DiagnosticsLayer {
    tally: Arc<Tally>,
}

impl DiagnosticsLayer {
    /// Create a layer and the handle reading its counts
    pub fn new() -> (Self, Diagnostics) {
        let tally = Arc::new(Tally::default());
        (
            Self { tally: tally.clone() },
            Diagnostics { tally },
        )
    }
}

impl<S> tracing_subscriber::Layer<S> for DiagnosticsLayer
where
    S: tracing::Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
        let level = *event.metadata().level();
        let counter = match level {
            tracing::Level::WARN => &self.tally.warnings,
            tracing::Level::ERROR => &self.tally.errors,
            _ => return,
        };
        counter.fetch_add(1, Ordering::Relaxed);

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        if let Ok(mut messages) = self.tally.messages.lock() {
            if messages.len() < KEPT_MESSAGES {
                messages.push(format!("{level}: {}", visitor.finish()));
            }
        }
    }
}

/// Collects the message and fields of an event into one line
#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: Vec<String>,
}

impl MessageVisitor {
    fn finish(self) -> String {
        if self.fields.is_empty() {
            return self.message;
        }
        format!("{} ({})", self.message, self.fields.join(", "))
    }
}

impl tracing::field::Visit for MessageVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            self.fields.push(format!("{} = {value:?}", field.name()));
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.fields.push(format!("{} = {value}", field.name()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::layer::SubscriberExt;

    #[test]
    fn test_counts_warnings_and_errors() {
        let (layer, diagnostics) = DiagnosticsLayer::new();
        let subscriber = tracing_subscriber::registry().with(layer);
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!("ignored");
            tracing::warn!(node_type = "math/add", node_id = 3, "Can't add");
            tracing::warn!("Second");
            tracing::error!("Broken");
        });

        assert_eq!(diagnostics.warnings(), 2);
        assert_eq!(diagnostics.errors(), 1);
        let messages = diagnostics.messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0], "WARN: Can't add (node_type = math/add, node_id = 3)");
        assert_eq!(messages[2], "ERROR: Broken");
    }

    #[test]
    fn test_keeps_first_messages_only() {
        let (layer, diagnostics) = DiagnosticsLayer::new();
        let subscriber = tracing_subscriber::registry().with(layer);
        tracing::subscriber::with_default(subscriber, || {
            for i in 0..KEPT_MESSAGES + 4 {
                tracing::warn!("warning {i}");
            }
        });

        assert_eq!(diagnostics.warnings(), KEPT_MESSAGES + 4);
        assert_eq!(diagnostics.messages().len(), KEPT_MESSAGES);
        assert_eq!(diagnostics.messages()[0], "WARN: warning 0");
    }
}
