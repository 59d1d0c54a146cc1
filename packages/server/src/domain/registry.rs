//! Room Registry: which live sessions are in which rooms.
//!
//! Pure in-memory bookkeeping. Both indices sit behind one lock, so a
//! `members` snapshot never observes a half-applied join or leave.
//!
//! The registry holds outbox senders, not sessions: it never keeps a
//! connection alive, and a dropped connection just makes its sender fail.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use tokio::sync::RwLock;

use super::{Outbox, RoomId, Session, SessionId};

/// A broadcast target taken from a membership snapshot.
#[derive(Debug, Clone)]
pub struct Member {
    pub session_id: SessionId,
    pub outbox: Outbox,
}

/// Live session and room counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RegistryStats {
    /// Connected sessions, including those in no room.
    pub sessions: usize,
    /// Rooms with at least one member.
    pub rooms: usize,
}

#[derive(Debug, Default)]
struct RegistryInner {
    rooms: HashMap<RoomId, HashMap<SessionId, Outbox>>,
    sessions: HashMap<SessionId, HashSet<RoomId>>,
}

impl RegistryInner {
    fn stats(&self) -> RegistryStats {
        RegistryStats {
            sessions: self.sessions.len(),
            rooms: self.rooms.len(),
        }
    }

    fn remove_membership(&mut self, room_id: &RoomId, session_id: &SessionId) -> bool {
        let Some(members) = self.rooms.get_mut(room_id) else {
            return false;
        };
        let removed = members.remove(session_id).is_some();
        if members.is_empty() {
            self.rooms.remove(room_id);
        }
        removed
    }
}

#[derive(Debug, Default)]
pub struct RoomRegistry {
    inner: RwLock<RegistryInner>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a live session that has not joined anything yet.
    pub async fn connect(&self, session: &Session) {
        let mut inner = self.inner.write().await;
        inner.sessions.entry(session.id().clone()).or_default();
    }

    /// Add `session` to `room_id`. Returns `false` if it was already a member.
    pub async fn join(&self, room_id: &RoomId, session: &Session) -> bool {
        let mut inner = self.inner.write().await;
        inner
            .sessions
            .entry(session.id().clone())
            .or_default()
            .insert(room_id.clone());
        inner
            .rooms
            .entry(room_id.clone())
            .or_default()
            .insert(session.id().clone(), session.outbox().clone())
            .is_none()
    }

    /// Remove one membership. No-op (returns `false`) if absent.
    pub async fn leave(&self, room_id: &RoomId, session_id: &SessionId) -> bool {
        let mut inner = self.inner.write().await;
        if let Some(rooms) = inner.sessions.get_mut(session_id) {
            rooms.remove(room_id);
        }
        inner.remove_membership(room_id, session_id)
    }

    /// Remove the session from every room and forget it. Returns the rooms it
    /// was in, sorted.
    pub async fn leave_all(&self, session_id: &SessionId) -> Vec<RoomId> {
        let mut inner = self.inner.write().await;
        let joined = inner.sessions.remove(session_id).unwrap_or_default();
        for room_id in &joined {
            inner.remove_membership(room_id, session_id);
        }
        let mut rooms: Vec<RoomId> = joined.into_iter().collect();
        rooms.sort();
        rooms
    }

    /// Snapshot of the members of `room_id` at the moment of the call.
    pub async fn members(&self, room_id: &RoomId) -> Vec<Member> {
        let inner = self.inner.read().await;
        inner
            .rooms
            .get(room_id)
            .map(|members| {
                members
                    .iter()
                    .map(|(session_id, outbox)| Member {
                        session_id: session_id.clone(),
                        outbox: outbox.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Rooms the session currently belongs to, sorted.
    pub async fn rooms_of(&self, session_id: &SessionId) -> Vec<RoomId> {
        let inner = self.inner.read().await;
        let mut rooms: Vec<RoomId> = inner
            .sessions
            .get(session_id)
            .map(|rooms| rooms.iter().cloned().collect())
            .unwrap_or_default();
        rooms.sort();
        rooms
    }

    pub async fn is_member(&self, room_id: &RoomId, session_id: &SessionId) -> bool {
        let inner = self.inner.read().await;
        inner
            .rooms
            .get(room_id)
            .is_some_and(|members| members.contains_key(session_id))
    }

    pub async fn stats(&self) -> RegistryStats {
        self.inner.read().await.stats()
    }

    /// Like [`stats`](Self::stats) but gives up instead of waiting when a
    /// writer holds the lock.
    pub fn try_stats(&self) -> Option<RegistryStats> {
        self.inner.try_read().ok().map(|inner| inner.stats())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Identity, OutboundEvent, ResumeToken, UserId};
    use tokio::sync::mpsc::{self, UnboundedReceiver};

    fn session(id: &str) -> (Session, UnboundedReceiver<OutboundEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let session = Session::new(
            SessionId::new(id),
            Identity::verified(UserId::new(id).unwrap(), None),
            ResumeToken::new(format!("token-{id}")),
            tx,
        );
        (session, rx)
    }

    fn room(id: &str) -> RoomId {
        RoomId::new(id).unwrap()
    }

    #[tokio::test]
    async fn test_join_is_idempotent() {
        // given:
        let registry = RoomRegistry::new();
        let (alice, _rx) = session("alice");

        // when:
        let first = registry.join(&room("global"), &alice).await;
        let second = registry.join(&room("global"), &alice).await;

        // then:
        assert!(first);
        assert!(!second);
        assert_eq!(registry.members(&room("global")).await.len(), 1);
    }

    #[tokio::test]
    async fn test_members_only_lists_that_room() {
        // given:
        let registry = RoomRegistry::new();
        let (alice, _rx1) = session("alice");
        let (bob, _rx2) = session("bob");
        registry.join(&room("a"), &alice).await;
        registry.join(&room("b"), &alice).await;
        registry.join(&room("b"), &bob).await;

        // when:
        let members_a = registry.members(&room("a")).await;
        let mut members_b: Vec<String> = registry
            .members(&room("b"))
            .await
            .into_iter()
            .map(|m| m.session_id.as_str().to_string())
            .collect();
        members_b.sort();

        // then:
        assert_eq!(members_a.len(), 1);
        assert_eq!(members_a[0].session_id.as_str(), "alice");
        assert_eq!(members_b, vec!["alice", "bob"]);
    }

    #[tokio::test]
    async fn test_leave_absent_is_noop() {
        // given:
        let registry = RoomRegistry::new();
        let (alice, _rx) = session("alice");

        // when:
        let removed = registry.leave(&room("global"), alice.id()).await;

        // then:
        assert!(!removed);
        assert_eq!(registry.stats().await, RegistryStats::default());
    }

    #[tokio::test]
    async fn test_leave_drops_empty_room() {
        // given:
        let registry = RoomRegistry::new();
        let (alice, _rx) = session("alice");
        registry.join(&room("global"), &alice).await;

        // when:
        let removed = registry.leave(&room("global"), alice.id()).await;

        // then:
        assert!(removed);
        assert!(registry.members(&room("global")).await.is_empty());
        assert!(registry.rooms_of(alice.id()).await.is_empty());
        assert_eq!(
            registry.stats().await,
            RegistryStats {
                sessions: 1,
                rooms: 0
            }
        );
    }

    #[tokio::test]
    async fn test_leave_all_is_exhaustive() {
        // given:
        let registry = RoomRegistry::new();
        let (alice, _rx1) = session("alice");
        let (bob, _rx2) = session("bob");
        for name in ["c", "a", "b"] {
            registry.join(&room(name), &alice).await;
        }
        registry.join(&room("a"), &bob).await;

        // when:
        let left = registry.leave_all(alice.id()).await;

        // then:
        assert_eq!(left, vec![room("a"), room("b"), room("c")]);
        for name in ["a", "b", "c"] {
            assert!(!registry.is_member(&room(name), alice.id()).await);
        }
        assert!(registry.is_member(&room("a"), bob.id()).await);
        assert_eq!(
            registry.stats().await,
            RegistryStats {
                sessions: 1,
                rooms: 1
            }
        );
    }

    #[tokio::test]
    async fn test_stats_counts_sessions_without_rooms() {
        // given:
        let registry = RoomRegistry::new();
        let (alice, _rx1) = session("alice");
        let (bob, _rx2) = session("bob");
        registry.connect(&alice).await;
        registry.connect(&bob).await;
        registry.join(&room("global"), &bob).await;

        // when:
        let stats = registry.try_stats();

        // then:
        assert_eq!(
            stats,
            Some(RegistryStats {
                sessions: 2,
                rooms: 1
            })
        );
    }

    #[tokio::test]
    async fn test_try_stats_gives_up_while_writer_holds_lock() {
        // given:
        let registry = RoomRegistry::new();
        let _guard = registry.inner.write().await;

        // when:
        let stats = registry.try_stats();

        // then:
        assert_eq!(stats, None);
    }
}
