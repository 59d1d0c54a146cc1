//! Read access to room history.
//!
//! Access control belongs to the auth collaborator. The relay only asks
//! this seam before serving history over HTTP.

use super::{RoomId, UserId};

#[cfg_attr(test, mockall::automock)]
pub trait RoomAccess: Send + Sync {
    /// Whether `viewer` (None for unauthenticated callers) may read the
    /// history of `room_id`.
    fn can_view<'a>(&self, viewer: Option<&'a UserId>, room_id: &RoomId) -> bool;
}

/// Every room is readable by everyone.
#[derive(Debug, Default, Clone, Copy)]
pub struct OpenAccess;

impl RoomAccess for OpenAccess {
    fn can_view(&self, _viewer: Option<&UserId>, _room_id: &RoomId) -> bool {
        true
    }
}
