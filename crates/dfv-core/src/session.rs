//! Host session channel.
//!
//! The engine never talks to a browser directly. It registers the patch
//! handler name and pushes update commands through a [`Session`]; the host
//! routes incoming patch batches back to
//! [`DataFrameOutput::handle_patches`](crate::DataFrameOutput::handle_patches).

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Mutex, PoisonError};

use serde::Serialize;
use serde_json::Value;

/// Message kind used for every outbound data frame command.
pub const DATA_FRAME_MESSAGE: &str = "shinyDataFrameMessage";

/// Opaque session identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The host's per-client session.
pub trait Session: Send + Sync {
    fn id(&self) -> &SessionId;

    /// Namespace an output id for the client.
    fn ns(&self, id: &str) -> String;

    /// Register (`enabled`) or clear the handler called `name`, returning the
    /// key the client uses to address it.
    fn set_message_handler(&self, name: &str, enabled: bool) -> String;

    fn send_custom_message(&self, kind: &str, message: Value);
}

/// A message captured by [`MemorySession`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentMessage {
    pub kind: String,
    pub message: Value,
}

/// In-process session that records everything sent through it.
#[derive(Debug)]
pub struct MemorySession {
    id: SessionId,
    namespace: Option<String>,
    handlers: Mutex<BTreeMap<String, bool>>,
    sent: Mutex<Vec<SentMessage>>,
}

impl MemorySession {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: SessionId::new(id),
            namespace: None,
            handlers: Mutex::new(BTreeMap::new()),
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Session for a module, prefixing ids with `namespace-`.
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Whether the handler called `name` is currently registered.
    pub fn handler_enabled(&self, name: &str) -> bool {
        self.handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .copied()
            .unwrap_or(false)
    }

    /// Messages sent so far, oldest first.
    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Remove and return every recorded message.
    pub fn take_sent(&self) -> Vec<SentMessage> {
        std::mem::take(&mut *self.sent.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl Session for MemorySession {
    fn id(&self) -> &SessionId {
        &self.id
    }

    fn ns(&self, id: &str) -> String {
        match &self.namespace {
            Some(namespace) => format!("{namespace}-{id}"),
            None => id.to_string(),
        }
    }

    fn set_message_handler(&self, name: &str, enabled: bool) -> String {
        let key = self.ns(name);
        self.handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.clone(), enabled);
        tracing::trace!(session = %self.id, handler = %key, enabled, "message handler updated");
        key
    }

    fn send_custom_message(&self, kind: &str, message: Value) {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(SentMessage {
                kind: kind.to_string(),
                message,
            });
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_namespacing() {
        let session = MemorySession::new("s1");
        assert_eq!(session.ns("grid"), "grid");
        let module = MemorySession::new("s2").with_namespace("mod");
        assert_eq!(module.ns("grid"), "mod-grid");
    }

    #[test]
    fn test_handlers_and_messages_are_recorded() {
        let session = MemorySession::new("s1");
        let key = session.set_message_handler("data_frame_patches_grid", true);
        assert_eq!(key, "data_frame_patches_grid");
        assert!(session.handler_enabled(&key));

        session.set_message_handler("data_frame_patches_grid", false);
        assert!(!session.handler_enabled(&key));

        session.send_custom_message(DATA_FRAME_MESSAGE, json!({"id": "grid"}));
        assert_eq!(session.sent().len(), 1);
        assert_eq!(session.take_sent()[0].kind, DATA_FRAME_MESSAGE);
        assert!(session.sent().is_empty());
    }
}
