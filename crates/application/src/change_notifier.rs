//! Typed change events and the best-effort broadcast port.
//!
//! Events are advisory cache-invalidation hints: at-most-once, unordered
//! across concurrent mutations, and never a source of truth. A listener
//! re-fetches through the read endpoints after any event.

use serde::Serialize;

use leadflow_domain::LeadId;

use crate::activity_service::ActivityWithAuthor;
use crate::lead_service::LeadWithOwner;

/// Change event published after a successful mutation.
///
/// Serializes as a `{type, data}` envelope with a snake_case tag, e.g.
/// `{"type":"lead_deleted","data":{"id":7}}`. The union is closed: listeners
/// can match exhaustively and never see an unknown shape from this server.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ChangeEvent {
    /// A lead was created; data is the sanitized lead with its owner.
    LeadCreated(LeadWithOwner),
    /// A lead was updated; data is the fresh post-write state with owner.
    LeadUpdated(LeadWithOwner),
    /// A lead and all its activities were deleted.
    LeadDeleted {
        /// Identifier of the removed lead.
        id: LeadId,
    },
    /// An activity was logged; data carries the acting user as author.
    ActivityCreated(ActivityWithAuthor),
}

/// Port for the best-effort change broadcast.
///
/// Publishing must never fail the originating mutation: implementations
/// swallow delivery errors and drop events when no listener is connected.
/// There is no queuing for connections that are not yet open and no replay
/// for connections that come back.
pub trait ChangeNotifier: Send + Sync {
    /// Publishes one event to every currently open connection.
    fn publish(&self, event: ChangeEvent);
}
