//! Agent registry, mailbox, and file reservations (spec.md §4.5).

pub mod conflicts;
pub mod mailbox;

pub use mailbox::MailStore;

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use swarmcell_core::model::Importance;
    use swarmcell_storage::StorageEngine;

    use crate::MailStore;

    fn store() -> MailStore<StorageEngine> {
        MailStore::new(Arc::new(StorageEngine::open_in_memory().unwrap()))
    }

    #[test]
    fn send_and_receive_roundtrip() {
        let m = store();
        m.register_agent("p", "alice", 1).unwrap();
        m.register_agent("p", "bob", 1).unwrap();
        let msg = m
            .send_message("p", "alice", &["bob".to_string()], "hi", "body", None, Importance::Normal, false, 10)
            .unwrap();
        let inbox = m.get_inbox("p", "bob").unwrap();
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].id, msg.id);
        m.mark_read("p", msg.id, "bob", 11).unwrap();
        assert!(m.get_inbox("p", "bob").unwrap().is_empty());
    }

    #[test]
    fn exclusive_reservations_conflict() {
        let m = store();
        m.register_agent("p", "alice", 1).unwrap();
        m.register_agent("p", "bob", 1).unwrap();
        m.reserve("p", "alice", &["src/lib.rs".to_string()], true, 3600, 1).unwrap();
        let err = m.reserve("p", "bob", &["src/lib.rs".to_string()], true, 3600, 2).unwrap_err();
        assert!(matches!(err, swarmcell_core::errors::SwarmError::Conflict { .. }));
    }

    #[test]
    fn expired_reservations_are_invisible_to_conflict_check() {
        let m = store();
        m.register_agent("p", "alice", 1).unwrap();
        m.reserve("p", "alice", &["src/lib.rs".to_string()], true, 10, 1).unwrap();
        let conflicts = m.check_conflicts("p", "src/lib.rs", true, "bob", 100).unwrap();
        assert!(conflicts.is_empty());
    }

    #[test]
    fn ack_required_message_tracks_pending_acks() {
        let m = store();
        m.register_agent("p", "alice", 1).unwrap();
        m.register_agent("p", "bob", 1).unwrap();
        let msg = m
            .send_message("p", "alice", &["bob".to_string()], "confirm", "please ack", None, Importance::High, true, 1)
            .unwrap();
        assert_eq!(m.pending_acks("p", msg.id).unwrap(), vec!["bob".to_string()]);
        m.ack("p", msg.id, "bob", 2).unwrap();
        assert!(m.pending_acks("p", msg.id).unwrap().is_empty());
    }
}
