//! Tracing layer that forwards events to LSP window/logMessage.
//!
//! Events are sent through the connection's outgoing channel, so they never
//! touch stdout directly and cannot interleave with protocol frames.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crossbeam_channel::Sender;
use lsp_server::{Connection, Message, Notification};
use lsp_types::notification::{LogMessage, Notification as _};
use lsp_types::{LogMessageParams, MessageType};
use tracing::{Level, Subscriber};
use tracing_subscriber::Layer;

/// A tracing layer that sends log messages to the LSP client.
///
/// Before `mark_initialized()` is called, messages are dropped: the client
/// must not receive notifications before it has answered `initialize`.
pub struct LspLayer {
    sender: Sender<Message>,
    initialized: Arc<AtomicBool>,
    /// Least severe level forwarded to the client.
    max_level: Level,
}

/// Handle to mark the LspLayer as initialized.
#[derive(Clone)]
pub struct LspLayerHandle {
    initialized: Arc<AtomicBool>,
}

impl LspLayerHandle {
    /// Mark the layer as initialized. Messages will now be sent.
    pub fn mark_initialized(&self) {
        self.initialized.store(true, Ordering::SeqCst);
    }
}

impl LspLayer {
    /// Create a new LSP tracing layer and a handle to control it.
    pub fn new(connection: &Connection, max_level: Level) -> (Self, LspLayerHandle) {
        let initialized = Arc::new(AtomicBool::new(false));

        let layer = Self {
            sender: connection.sender.clone(),
            initialized: Arc::clone(&initialized),
            max_level,
        };

        let handle = LspLayerHandle { initialized };

        (layer, handle)
    }

    fn level_to_message_type(level: &Level) -> MessageType {
        match *level {
            Level::ERROR => MessageType::ERROR,
            Level::WARN => MessageType::WARNING,
            Level::INFO => MessageType::INFO,
            Level::DEBUG | Level::TRACE => MessageType::LOG,
        }
    }
}

impl<S: Subscriber> Layer<S> for LspLayer {
    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        if !self.initialized.load(Ordering::SeqCst) {
            return;
        }

        let metadata = event.metadata();
        // `Level` orders more verbose levels as greater.
        if *metadata.level() > self.max_level {
            return;
        }

        /// Collects the message, then every other field as `name=value`.
        #[derive(Default)]
        struct MessageVisitor {
            message: String,
            fields: Vec<String>,
        }

        impl tracing::field::Visit for MessageVisitor {
            fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
                if field.name() == "message" {
                    self.message = format!("{:?}", value);
                } else {
                    self.fields.push(format!("{}={:?}", field.name(), value));
                }
            }

            fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
                if field.name() == "message" {
                    self.message = value.to_string();
                } else {
                    self.fields.push(format!("{}={}", field.name(), value));
                }
            }
        }

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        let mut message = if visitor.message.is_empty() {
            metadata.target().to_string()
        } else {
            visitor.message
        };
        for field in visitor.fields {
            message.push(' ');
            message.push_str(&field);
        }

        let params = LogMessageParams {
            typ: Self::level_to_message_type(metadata.level()),
            message,
        };
        let notif = Notification::new(LogMessage::METHOD.to_string(), params);
        let _ = self.sender.send(Message::Notification(notif));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::layer::SubscriberExt;

    fn log_messages(client: &Connection) -> Vec<LogMessageParams> {
        client
            .receiver
            .try_iter()
            .filter_map(|msg| match msg {
                Message::Notification(n) if n.method == LogMessage::METHOD => {
                    serde_json::from_value(n.params).ok()
                }
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_drops_events_before_initialization() {
        let (server, client) = Connection::memory();
        let (layer, _handle) = LspLayer::new(&server, Level::INFO);
        let subscriber = tracing_subscriber::registry().with(layer);

        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!("too early");
        });

        assert!(log_messages(&client).is_empty());
    }

    #[test]
    fn test_forwards_events_up_to_max_level() {
        let (server, client) = Connection::memory();
        let (layer, handle) = LspLayer::new(&server, Level::INFO);
        handle.mark_initialized();
        let subscriber = tracing_subscriber::registry().with(layer);

        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!("document is not indexed");
            tracing::debug!("too chatty");
        });

        let messages = log_messages(&client);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].typ, MessageType::WARNING);
        assert_eq!(messages[0].message, "document is not indexed");
    }

    #[test]
    fn test_fields_are_appended_to_message() {
        let (server, client) = Connection::memory();
        let (layer, handle) = LspLayer::new(&server, Level::WARN);
        handle.mark_initialized();
        let subscriber = tracing_subscriber::registry().with(layer);

        let err = gibiane::IndexError::NotIndexed("file:///w/plate.dgibi".to_string());
        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!(%err, uri = "file:///w/plate.dgibi", "Query on unindexed document");
        });

        let messages = log_messages(&client);
        assert_eq!(messages.len(), 1);
        assert_eq!(
            messages[0].message,
            "Query on unindexed document \
             err=document is not indexed: file:///w/plate.dgibi \
             uri=file:///w/plate.dgibi"
        );
    }
}
