//! Message routing
//!
//! Decides who receives a content line and what they receive. Routing only
//! enqueues on recipient sinks, so it never blocks on a slow client and a
//! recipient that is going away cannot fail the sender. A recipient whose
//! queue is full misses the line.

use tracing::debug;

use crate::message::{ChatLine, ServerMessage};
use crate::registry::ClientRegistry;
use crate::sink::ClientSink;

/// What happened to one routed line
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RouteOutcome {
    /// Lines queued on recipient sinks
    pub delivered: usize,
    /// Recipients whose queue was closed or full; the line was discarded
    pub dropped: usize,
    /// Addressed targets not present in the registry
    pub unknown: Vec<String>,
}

impl RouteOutcome {
    fn record(&mut self, sink: &ClientSink, msg: ServerMessage) {
        match sink.deliver(msg) {
            Ok(()) => self.delivered += 1,
            Err(_) => self.dropped += 1,
        }
    }
}

/// Route one content line from `sender`
///
/// A line without `>>` goes to every registered client, sender included, as
/// `MESSAGE <sender>: <line>`. An addressed line sends only its final segment
/// to each listed target that is registered; other targets are skipped. The
/// sender is not echoed unless it names itself.
pub fn route(registry: &ClientRegistry, sender: &str, line: &str) -> RouteOutcome {
    let mut outcome = RouteOutcome::default();

    match ChatLine::parse(line) {
        ChatLine::Broadcast(body) => {
            registry.for_each(|_, sink| {
                outcome.record(sink, message(sender, body));
            });
        }
        ChatLine::Addressed { targets, body } => {
            for target in targets {
                match registry.lookup(target) {
                    Some(sink) => outcome.record(sink, message(sender, body)),
                    None => {
                        debug!("{} addressed unknown recipient '{}'", sender, target);
                        outcome.unknown.push(target.to_string());
                    }
                }
            }
        }
    }

    outcome
}

fn message(sender: &str, body: &str) -> ServerMessage {
    ServerMessage::Message {
        from: sender.to_string(),
        body: body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc;

    use super::*;
    use crate::types::ConnectionId;

    fn join(registry: &mut ClientRegistry, name: &str) -> mpsc::Receiver<ServerMessage> {
        join_with_capacity(registry, name, 32)
    }

    fn join_with_capacity(
        registry: &mut ClientRegistry,
        name: &str,
        capacity: usize,
    ) -> mpsc::Receiver<ServerMessage> {
        let (sink, rx) = ClientSink::channel(ConnectionId::new(), capacity);
        assert!(registry.try_register(name, sink));
        rx
    }

    fn drain(rx: &mut mpsc::Receiver<ServerMessage>) -> Vec<String> {
        let mut lines = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            lines.push(msg.to_string());
        }
        lines
    }

    #[test]
    fn test_broadcast_reaches_everyone() {
        let mut registry = ClientRegistry::new();
        let mut a = join(&mut registry, "A");
        let mut b = join(&mut registry, "B");
        let mut c = join(&mut registry, "C");

        let outcome = route(&registry, "A", "hello");

        assert_eq!(outcome.delivered, 3);
        assert_eq!(drain(&mut a), vec!["MESSAGE A: hello"]);
        assert_eq!(drain(&mut b), vec!["MESSAGE A: hello"]);
        assert_eq!(drain(&mut c), vec!["MESSAGE A: hello"]);
    }

    #[test]
    fn test_addressed_reaches_target_only() {
        let mut registry = ClientRegistry::new();
        let mut a = join(&mut registry, "A");
        let mut b = join(&mut registry, "B");
        let mut c = join(&mut registry, "C");

        let outcome = route(&registry, "A", "B>>hello");

        assert_eq!(outcome.delivered, 1);
        assert!(drain(&mut a).is_empty());
        assert_eq!(drain(&mut b), vec!["MESSAGE A: hello"]);
        assert!(drain(&mut c).is_empty());
    }

    #[test]
    fn test_multicast_forwards_body_only() {
        let mut registry = ClientRegistry::new();
        let _a = join(&mut registry, "A");
        let mut b = join(&mut registry, "B");
        let mut c = join(&mut registry, "C");

        route(&registry, "A", "B>>C>>meet at noon");

        assert_eq!(drain(&mut b), vec!["MESSAGE A: meet at noon"]);
        assert_eq!(drain(&mut c), vec!["MESSAGE A: meet at noon"]);
    }

    #[test]
    fn test_sender_listed_as_target_is_echoed() {
        let mut registry = ClientRegistry::new();
        let mut a = join(&mut registry, "A");
        let mut b = join(&mut registry, "B");

        route(&registry, "A", "A>>B>>hi");

        assert_eq!(drain(&mut a), vec!["MESSAGE A: hi"]);
        assert_eq!(drain(&mut b), vec!["MESSAGE A: hi"]);
    }

    #[test]
    fn test_unknown_target_skipped() {
        let mut registry = ClientRegistry::new();
        let mut a = join(&mut registry, "A");
        let mut b = join(&mut registry, "B");

        let outcome = route(&registry, "A", "Ghost>>B>>hi");

        assert_eq!(outcome.delivered, 1);
        assert_eq!(outcome.unknown, vec!["Ghost"]);
        assert!(drain(&mut a).is_empty());
        assert_eq!(drain(&mut b), vec!["MESSAGE A: hi"]);
    }

    #[test]
    fn test_only_unknown_target_is_noop() {
        let mut registry = ClientRegistry::new();
        let mut a = join(&mut registry, "A");

        let outcome = route(&registry, "A", "Ghost>>hi");

        assert_eq!(outcome.delivered, 0);
        assert!(drain(&mut a).is_empty());
    }

    #[test]
    fn test_empty_body_still_delivered() {
        let mut registry = ClientRegistry::new();
        let mut b = join(&mut registry, "B");

        let outcome = route(&registry, "A", "B>>");

        assert_eq!(outcome.delivered, 1);
        assert_eq!(drain(&mut b), vec!["MESSAGE A: "]);
    }

    #[test]
    fn test_duplicate_targets_deliver_per_occurrence() {
        let mut registry = ClientRegistry::new();
        let mut b = join(&mut registry, "B");

        let outcome = route(&registry, "A", "B>>B>>twice");

        assert_eq!(outcome.delivered, 2);
        assert_eq!(drain(&mut b).len(), 2);
    }

    #[test]
    fn test_closed_recipient_does_not_fail_routing() {
        let mut registry = ClientRegistry::new();
        let mut a = join(&mut registry, "A");
        let b = join(&mut registry, "B");
        drop(b);

        let outcome = route(&registry, "A", "still here");

        assert_eq!(outcome.delivered, 1);
        assert_eq!(outcome.dropped, 1);
        assert_eq!(drain(&mut a), vec!["MESSAGE A: still here"]);
    }

    #[test]
    fn test_non_reading_recipient_stays_bounded() {
        let mut registry = ClientRegistry::new();
        let mut hog = join_with_capacity(&mut registry, "hog", 4);
        let mut reader = join_with_capacity(&mut registry, "reader", 4);

        let mut dropped = 0;
        for i in 0..100 {
            let outcome = route(&registry, "hog", &format!("line {}", i));
            dropped += outcome.dropped;
            // the reader keeps up, the hog never reads
            assert_eq!(drain(&mut reader), vec![format!("MESSAGE hog: line {}", i)]);
        }

        assert_eq!(hog.len(), 4);
        assert_eq!(dropped, 96);
        assert_eq!(
            drain(&mut hog),
            vec![
                "MESSAGE hog: line 0",
                "MESSAGE hog: line 1",
                "MESSAGE hog: line 2",
                "MESSAGE hog: line 3"
            ]
        );
    }
}
