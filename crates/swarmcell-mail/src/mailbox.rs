//! `MailStore` — agent registry, mailbox, and file reservations (spec.md
//! §4.5).

use std::sync::Arc;

use swarmcell_core::errors::{SwarmError, SwarmResult};
use swarmcell_core::model::{Agent, EventType, Importance, Message, Reservation, ReservationConflict};
use swarmcell_core::traits::StorageAdapter;
use swarmcell_storage::queries::{agents as q_agents, events as q_events, mail as q_mail};

use crate::conflicts::{patterns_may_conflict, validate_pattern};

pub struct MailStore<S: StorageAdapter> {
    storage: Arc<S>,
}

impl<S: StorageAdapter> MailStore<S> {
    pub fn new(storage: Arc<S>) -> Self {
        Self { storage }
    }

    pub fn register_agent(&self, project_key: &str, name: &str, now: i64) -> SwarmResult<Agent> {
        self.storage.exec(|conn| q_agents::register_agent(conn, project_key, name, now))
    }

    pub fn touch_agent(&self, project_key: &str, name: &str, now: i64) -> SwarmResult<()> {
        self.storage.exec(|conn| q_agents::touch_agent(conn, project_key, name, now))
    }

    pub fn get_agents(&self, project_key: &str) -> SwarmResult<Vec<Agent>> {
        self.storage.query(|conn| q_agents::list_agents(conn, project_key))
    }

    #[allow(clippy::too_many_arguments)]
    pub fn send_message(
        &self,
        project_key: &str,
        from_agent: &str,
        to: &[String],
        subject: &str,
        body: &str,
        thread_id: Option<String>,
        importance: Importance,
        ack_required: bool,
        now: i64,
    ) -> SwarmResult<Message> {
        if to.is_empty() {
            return Err(SwarmError::Validation { field: "to".into(), reason: "must name at least one recipient".into() });
        }
        let msg = Message {
            id: 0,
            project_key: project_key.to_string(),
            from_agent: from_agent.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
            thread_id,
            importance,
            ack_required,
            created_at: now,
        };
        let message_id = self.storage.transaction(|conn| {
            let id = q_mail::insert_message(conn, project_key, &msg, to)?;
            q_events::append_event(
                conn,
                project_key,
                EventType::MessageSent,
                now,
                &serde_json::json!({"message_id": id, "from": from_agent, "to": to}),
            )?;
            Ok(id)
        })?;
        Ok(Message { id: message_id, ..msg })
    }

    pub fn get_inbox(&self, project_key: &str, agent_name: &str) -> SwarmResult<Vec<Message>> {
        self.storage.query(|conn| q_mail::inbox(conn, project_key, agent_name))
    }

    pub fn get_thread_messages(&self, project_key: &str, thread_id: &str) -> SwarmResult<Vec<Message>> {
        self.storage.query(|conn| q_mail::thread_messages(conn, project_key, thread_id))
    }

    pub fn mark_read(&self, project_key: &str, message_id: i64, agent_name: &str, now: i64) -> SwarmResult<()> {
        self.storage.exec(|conn| q_mail::mark_read(conn, project_key, message_id, agent_name, now))
    }

    pub fn ack(&self, project_key: &str, message_id: i64, agent_name: &str, now: i64) -> SwarmResult<()> {
        self.storage
            .query(|conn| q_mail::get_recipient(conn, project_key, message_id, agent_name))?
            .ok_or_else(|| SwarmError::NotFound { entity: "recipient".into(), id: format!("{message_id}/{agent_name}") })?;
        self.storage.transaction(|conn| {
            q_mail::ack_message(conn, project_key, message_id, agent_name, now)?;
            q_events::append_event(
                conn,
                project_key,
                EventType::MessageAcked,
                now,
                &serde_json::json!({"message_id": message_id, "agent": agent_name}),
            )?;
            Ok(())
        })
    }

    /// Recipients of a message still owing an ack.
    pub fn pending_acks(&self, project_key: &str, message_id: i64) -> SwarmResult<Vec<String>> {
        self.storage.query(|conn| q_mail::pending_acks(conn, project_key, message_id))
    }

    pub fn check_conflicts(&self, project_key: &str, pattern: &str, exclusive: bool, requesting_agent: &str, now: i64) -> SwarmResult<Vec<ReservationConflict>> {
        validate_pattern(pattern)?;
        let active = self.storage.query(|conn| q_mail::list_active_reservations(conn, project_key, now))?;
        Ok(active
            .into_iter()
            .filter(|r| r.agent_name != requesting_agent)
            .filter(|r| exclusive && r.exclusive)
            .filter(|r| patterns_may_conflict(pattern, &r.path_pattern))
            .map(|r| ReservationConflict {
                requested_pattern: pattern.to_string(),
                holder_agent: r.agent_name,
                holder_pattern: r.path_pattern,
                holder_reservation_id: r.id,
            })
            .collect())
    }

    /// Reserves every path in `paths` for `agent_name`, failing with
    /// `Conflict` on the first overlap against a live exclusive reservation.
    /// Leaves no partial reservation behind on failure.
    pub fn reserve(
        &self,
        project_key: &str,
        agent_name: &str,
        paths: &[String],
        exclusive: bool,
        ttl_secs: i64,
        now: i64,
    ) -> SwarmResult<Vec<Reservation>> {
        for pattern in paths {
            let conflicts = self.check_conflicts(project_key, pattern, exclusive, agent_name, now)?;
            if let Some(c) = conflicts.into_iter().next() {
                return Err(SwarmError::Conflict { resource: c.requested_pattern, holder: c.holder_agent });
            }
        }
        let expires_at = now + ttl_secs;
        let mut created = Vec::with_capacity(paths.len());
        for pattern in paths {
            let reservation = Reservation {
                id: 0,
                project_key: project_key.to_string(),
                agent_name: agent_name.to_string(),
                path_pattern: pattern.clone(),
                exclusive,
                created_at: now,
                expires_at,
            };
            let id = self.storage.transaction(|conn| {
                let id = q_mail::insert_reservation(conn, &reservation)?;
                q_events::append_event(
                    conn,
                    project_key,
                    EventType::ReservationCreated,
                    now,
                    &serde_json::json!({"reservation_id": id, "agent": agent_name, "pattern": pattern}),
                )?;
                Ok(id)
            })?;
            created.push(Reservation { id, ..reservation });
        }
        Ok(created)
    }

    pub fn release(&self, project_key: &str, reservation_ids: &[i64], now: i64) -> SwarmResult<()> {
        for id in reservation_ids {
            self.storage.transaction(|conn| {
                q_mail::release_reservation(conn, project_key, *id)?;
                q_events::append_event(
                    conn,
                    project_key,
                    EventType::ReservationReleased,
                    now,
                    &serde_json::json!({"reservation_id": id}),
                )?;
                Ok(())
            })?;
        }
        Ok(())
    }

    pub fn get_active_reservations(&self, project_key: &str, now: i64) -> SwarmResult<Vec<Reservation>> {
        self.storage.query(|conn| q_mail::list_active_reservations(conn, project_key, now))
    }

    /// Deletes every expired reservation; returns how many were reaped.
    pub fn reap_expired(&self, project_key: &str, now: i64) -> SwarmResult<usize> {
        self.storage.exec(|conn| q_mail::reap_expired_reservations(conn, project_key, now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swarmcell_storage::StorageEngine;

    fn mail() -> MailStore<StorageEngine> {
        MailStore::new(Arc::new(StorageEngine::open_in_memory().unwrap()))
    }

    #[test]
    fn send_then_inbox_then_ack_clears_pending() {
        let m = mail();
        m.register_agent("p", "alice", 1).unwrap();
        m.register_agent("p", "bob", 1).unwrap();
        let msg = m
            .send_message("p", "alice", &["bob".to_string()], "status", "on it", None, Importance::Normal, true, 2)
            .unwrap();

        let inbox = m.get_inbox("p", "bob").unwrap();
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].id, msg.id);
        assert_eq!(m.pending_acks("p", msg.id).unwrap(), vec!["bob".to_string()]);

        m.ack("p", msg.id, "bob", 3).unwrap();
        assert!(m.pending_acks("p", msg.id).unwrap().is_empty());
    }

    #[test]
    fn send_with_no_recipients_is_rejected() {
        let m = mail();
        let err = m.send_message("p", "alice", &[], "subj", "body", None, Importance::Normal, false, 1).unwrap_err();
        assert!(matches!(err, SwarmError::Validation { .. }));
    }

    /// S5: an exclusive reservation on a glob blocks an exclusive request on
    /// a path it covers, from a different agent; a non-exclusive request on
    /// the same path still succeeds.
    #[test]
    fn exclusive_reservation_conflicts_with_overlapping_exclusive_request() {
        let m = mail();
        m.register_agent("p", "alpha", 1).unwrap();
        m.register_agent("p", "beta", 1).unwrap();
        m.reserve("p", "alpha", &["src/auth/**".to_string()], true, 3600, 1).unwrap();

        let conflicts = m.check_conflicts("p", "src/auth/login.ts", true, "beta", 2).unwrap();
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].holder_agent, "alpha");

        let err = m.reserve("p", "beta", &["src/auth/login.ts".to_string()], true, 3600, 2).unwrap_err();
        assert!(matches!(err, SwarmError::Conflict { .. }));

        let ok = m.reserve("p", "beta", &["src/auth/login.ts".to_string()], false, 3600, 2).unwrap();
        assert_eq!(ok.len(), 1);
    }

    #[test]
    fn reserve_leaves_no_partial_state_on_conflict() {
        let m = mail();
        m.register_agent("p", "alpha", 1).unwrap();
        m.register_agent("p", "beta", 1).unwrap();
        m.reserve("p", "alpha", &["src/a.rs".to_string()], true, 3600, 1).unwrap();

        let err = m.reserve("p", "beta", &["src/b.rs".to_string(), "src/a.rs".to_string()], true, 3600, 2).unwrap_err();
        assert!(matches!(err, SwarmError::Conflict { .. }));

        let active = m.get_active_reservations("p", 2).unwrap();
        assert!(active.iter().all(|r| r.agent_name != "beta"));
    }

    #[test]
    fn reap_expired_removes_past_ttl_only() {
        let m = mail();
        m.register_agent("p", "alpha", 1).unwrap();
        m.reserve("p", "alpha", &["src/a.rs".to_string()], true, 10, 1).unwrap();
        m.reserve("p", "alpha", &["src/b.rs".to_string()], true, 1000, 1).unwrap();

        let reaped = m.reap_expired("p", 20).unwrap();
        assert_eq!(reaped, 1);
        let remaining = m.get_active_reservations("p", 20).unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].path_pattern, "src/b.rs");
    }
}
