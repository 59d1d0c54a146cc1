//! Per-room critical sections.
//!
//! Operations on the same room run one at a time, in lock acquisition
//! order; different rooms never wait on each other.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex as StdMutex, MutexGuard, PoisonError},
};

use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::RoomId;

type RoomLocks = HashMap<RoomId, Arc<Mutex<()>>>;

/// Held for the duration of one room operation. Dropping it hands the room
/// to the next waiter, or forgets the room when nobody is waiting.
#[derive(Debug)]
pub struct RoomTurn {
    room_id: RoomId,
    guard: Option<OwnedMutexGuard<()>>,
    locks: Arc<StdMutex<RoomLocks>>,
}

impl Drop for RoomTurn {
    fn drop(&mut self) {
        drop(self.guard.take());
        let mut locks = lock_map(&self.locks);
        // Only the map holds it: no holder and no waiter left.
        if locks
            .get(&self.room_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(&self.room_id);
        }
    }
}

/// The map lock is never held across an await, so a plain mutex is enough.
fn lock_map(locks: &StdMutex<RoomLocks>) -> MutexGuard<'_, RoomLocks> {
    locks.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Default)]
pub struct RoomSequencer {
    locks: Arc<StdMutex<RoomLocks>>,
}

impl RoomSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive use of `room_id`.
    pub async fn acquire(&self, room_id: &RoomId) -> RoomTurn {
        let lock = lock_map(&self.locks)
            .entry(room_id.clone())
            .or_default()
            .clone();
        let guard = lock.lock_owned().await;

        RoomTurn {
            room_id: room_id.clone(),
            guard: Some(guard),
            locks: self.locks.clone(),
        }
    }

    /// Number of rooms with a held or awaited turn.
    pub fn active_rooms(&self) -> usize {
        lock_map(&self.locks)
            .values()
            .filter(|lock| Arc::strong_count(lock) > 1)
            .count()
    }

    #[cfg(test)]
    fn tracked_rooms(&self) -> usize {
        lock_map(&self.locks).len()
    }
}
