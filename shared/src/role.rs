//! # Network Role Context
//!
//! Describes how the local peer relates to a replicated character: whether
//! it holds authority, whether the character is locally controlled, and
//! whether the peer is a dedicated server with no local rendering client.

use serde::{Deserialize, Serialize};

/// Network-role context of one peer's view of a character.
///
/// The authority is the only peer permitted to mutate replicated state;
/// every other peer only reacts to replication events. Local control is
/// independent of authority: a listen server has authority and local control
/// for its own pawn, a dedicated server has authority but never local
/// control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetContext {
    /// Whether this peer is allowed to mutate replicated state
    pub has_authority: bool,

    /// Whether the character is controlled from this peer
    pub locally_controlled: bool,

    /// Whether this peer is a dedicated server without a local client
    pub dedicated_server: bool,
}

impl NetContext {
    /// Authority on a dedicated server
    pub fn dedicated_server() -> Self {
        Self {
            has_authority: true,
            locally_controlled: false,
            dedicated_server: true,
        }
    }

    /// Authority on a listen server controlling the character locally
    pub fn listen_server_local() -> Self {
        Self {
            has_authority: true,
            locally_controlled: true,
            dedicated_server: false,
        }
    }

    /// Remote client observing a character it does not control
    pub fn remote_client() -> Self {
        Self {
            has_authority: false,
            locally_controlled: false,
            dedicated_server: false,
        }
    }

    /// Client controlling the character locally
    pub fn local_client() -> Self {
        Self {
            has_authority: false,
            locally_controlled: true,
            dedicated_server: false,
        }
    }

    /// Whether this peer counts as the server side for role-gated effects
    pub fn is_server_peer(&self) -> bool {
        self.has_authority
    }

    /// Whether this peer counts as a client side for role-gated effects.
    ///
    /// Every peer with a local rendering client qualifies, including a
    /// listen server. Only a dedicated server is excluded.
    pub fn is_client_peer(&self) -> bool {
        !self.dedicated_server
    }

    /// Log prefix describing this context, e.g. `SERVER|Local`
    pub fn describe(&self) -> String {
        format!(
            "{}|{}",
            if self.has_authority { "SERVER" } else { "CLIENT" },
            if self.locally_controlled { "Local" } else { "NotLocal" }
        )
    }
}
