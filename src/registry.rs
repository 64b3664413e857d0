//! Client registry
//!
//! Maps unique display names to connection sinks. Names are kept in
//! registration order so rosters list clients in the order they joined.
//!
//! The registry itself is a plain data structure; it is owned by the
//! `ChatServer` task, which makes every operation part of one
//! mutual-exclusion domain.

use std::collections::HashMap;

use crate::sink::ClientSink;

/// Name → sink table with name uniqueness
#[derive(Debug, Default)]
pub struct ClientRegistry {
    /// Display name → outbound sink
    sinks: HashMap<String, ClientSink>,
    /// Names in registration order
    order: Vec<String>,
}

impl ClientRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `name` unless it is already taken
    ///
    /// Returns false without touching the registry if the name is present.
    pub fn try_register(&mut self, name: &str, sink: ClientSink) -> bool {
        if self.sinks.contains_key(name) {
            return false;
        }
        self.sinks.insert(name.to_string(), sink);
        self.order.push(name.to_string());
        true
    }

    /// Remove `name` if present, returning its sink
    pub fn unregister(&mut self, name: &str) -> Option<ClientSink> {
        let sink = self.sinks.remove(name)?;
        self.order.retain(|n| n != name);
        Some(sink)
    }

    /// Point-in-time copy of the registered names, in registration order
    pub fn snapshot(&self) -> Vec<String> {
        self.order.clone()
    }

    /// Sink registered under `name`
    pub fn lookup(&self, name: &str) -> Option<&ClientSink> {
        self.sinks.get(name)
    }

    /// Visit every registered client in registration order
    pub fn for_each<F>(&self, mut apply: F)
    where
        F: FnMut(&str, &ClientSink),
    {
        for name in &self.order {
            if let Some(sink) = self.sinks.get(name) {
                apply(name, sink);
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn contains(&self, name: &str) -> bool {
        self.sinks.contains_key(name)
    }

    /// Number of registered clients
    pub(crate) fn len(&self) -> usize {
        self.sinks.len()
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ConnectionId;

    fn sink() -> ClientSink {
        ClientSink::channel(ConnectionId::new(), 32).0
    }

    #[test]
    fn test_register_unique() {
        let mut registry = ClientRegistry::new();

        assert!(registry.try_register("alice", sink()));
        assert!(!registry.try_register("alice", sink()));
        assert!(registry.try_register("bob", sink()));

        assert_eq!(registry.len(), 2);
        assert!(registry.contains("alice"));
        assert!(registry.contains("bob"));
    }

    #[test]
    fn test_failed_register_keeps_original() {
        let mut registry = ClientRegistry::new();
        let first = sink();
        let first_id = first.connection();

        registry.try_register("alice", first);
        registry.try_register("alice", sink());

        assert_eq!(registry.lookup("alice").map(|s| s.connection()), Some(first_id));
        assert_eq!(registry.snapshot(), vec!["alice"]);
    }

    #[test]
    fn test_snapshot_preserves_order() {
        let mut registry = ClientRegistry::new();
        registry.try_register("carol", sink());
        registry.try_register("alice", sink());
        registry.try_register("bob", sink());

        assert_eq!(registry.snapshot(), vec!["carol", "alice", "bob"]);

        registry.unregister("alice");
        assert_eq!(registry.snapshot(), vec!["carol", "bob"]);

        registry.try_register("alice", sink());
        assert_eq!(registry.snapshot(), vec!["carol", "bob", "alice"]);
    }

    #[test]
    fn test_unregister_missing_is_noop() {
        let mut registry = ClientRegistry::new();
        registry.try_register("alice", sink());

        assert!(registry.unregister("ghost").is_none());
        assert_eq!(registry.len(), 1);

        assert!(registry.unregister("alice").is_some());
        assert!(registry.unregister("alice").is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_lookup() {
        let mut registry = ClientRegistry::new();
        assert!(registry.lookup("alice").is_none());

        registry.try_register("alice", sink());
        assert!(registry.lookup("alice").is_some());
        assert!(registry.lookup("Alice").is_none());
    }

    #[test]
    fn test_for_each_visits_all_in_order() {
        let mut registry = ClientRegistry::new();
        registry.try_register("a", sink());
        registry.try_register("b", sink());
        registry.try_register("c", sink());

        let mut seen = Vec::new();
        registry.for_each(|name, _| seen.push(name.to_string()));

        assert_eq!(seen, vec!["a", "b", "c"]);
    }
}
