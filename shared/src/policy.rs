//! # Recipe and Modifier Policies
//!
//! Policy enums controlling how a character recipe is instanced and on which
//! network roles its setup logic executes, plus the role gates evaluated
//! before a modifier is applied on a peer.

use crate::role::NetContext;
use serde::{Deserialize, Serialize};

/// How a character recipe is instanced when applied.
///
/// This limits what a recipe can do in its implementation: a NonInstanced
/// recipe executes against the shared class-default definition and cannot
/// hold per-character state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstancingPolicy {
    /// The recipe is never instanced; setup runs on the shared definition
    NonInstanced,

    /// Each character gets its own instance of the recipe. State can be
    /// saved per character.
    Instanced,
}

/// Where a character recipe executes on the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NetExecutionPolicy {
    /// The recipe runs on both server and client
    Both,

    /// The recipe only runs on the server
    ServerOnly,

    /// The recipe only runs on clients
    ClientOnly,

    /// The recipe only runs on the peer that locally controls the character
    LocalOnly,
}

impl NetExecutionPolicy {
    /// Whether a recipe with this policy executes on the given peer.
    ///
    /// Entries ineligible for the current peer are marked finished without
    /// running, so the aggregate completion computation never waits on a
    /// role that will never execute the recipe.
    pub fn executes_on(&self, net: &NetContext) -> bool {
        match self {
            Self::Both => true,
            Self::ServerOnly => net.has_authority,
            Self::LocalOnly => net.locally_controlled,
            Self::ClientOnly => net.locally_controlled || !net.has_authority,
        }
    }
}

/// Role gates evaluated before a modifier is applied on a peer.
///
/// The same character data produces different actually-applied modifier
/// subsets on each peer: purely cosmetic modifiers need not run on a
/// dedicated server, and control-sensitive ones only on the owning client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModifierPolicy {
    /// Apply only on the peer that locally controls the character,
    /// overriding the server/client gates
    pub only_apply_on_local: bool,

    /// Apply on server peers
    pub apply_on_server: bool,

    /// Apply on client peers
    pub apply_on_client: bool,
}

impl ModifierPolicy {
    /// Policy applying on both server and client peers
    pub fn server_and_client() -> Self {
        Self {
            only_apply_on_local: false,
            apply_on_server: true,
            apply_on_client: true,
        }
    }

    /// Policy applying only on client peers
    pub fn client_only() -> Self {
        Self {
            only_apply_on_local: false,
            apply_on_server: false,
            apply_on_client: true,
        }
    }

    /// Policy applying only on the locally-controlling peer
    pub fn local_only() -> Self {
        Self {
            only_apply_on_local: true,
            apply_on_server: false,
            apply_on_client: false,
        }
    }

    /// Whether a modifier with this policy applies on the given peer
    pub fn should_apply(&self, net: &NetContext) -> bool {
        if self.only_apply_on_local {
            return net.locally_controlled;
        }

        (net.is_client_peer() && self.apply_on_client)
            || (net.is_server_peer() && self.apply_on_server)
    }
}

impl Default for ModifierPolicy {
    fn default() -> Self {
        Self::server_and_client()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_executes_everywhere() {
        for net in [
            NetContext::dedicated_server(),
            NetContext::listen_server_local(),
            NetContext::remote_client(),
            NetContext::local_client(),
        ] {
            assert!(NetExecutionPolicy::Both.executes_on(&net));
        }
    }

    #[test]
    fn server_only_requires_authority() {
        assert!(NetExecutionPolicy::ServerOnly.executes_on(&NetContext::dedicated_server()));
        assert!(!NetExecutionPolicy::ServerOnly.executes_on(&NetContext::local_client()));
        assert!(!NetExecutionPolicy::ServerOnly.executes_on(&NetContext::remote_client()));
    }

    #[test]
    fn local_only_requires_local_control() {
        assert!(NetExecutionPolicy::LocalOnly.executes_on(&NetContext::local_client()));
        assert!(NetExecutionPolicy::LocalOnly.executes_on(&NetContext::listen_server_local()));
        assert!(!NetExecutionPolicy::LocalOnly.executes_on(&NetContext::dedicated_server()));
        assert!(!NetExecutionPolicy::LocalOnly.executes_on(&NetContext::remote_client()));
    }

    #[test]
    fn client_only_excludes_pure_authority() {
        assert!(NetExecutionPolicy::ClientOnly.executes_on(&NetContext::remote_client()));
        assert!(NetExecutionPolicy::ClientOnly.executes_on(&NetContext::local_client()));
        assert!(NetExecutionPolicy::ClientOnly.executes_on(&NetContext::listen_server_local()));
        assert!(!NetExecutionPolicy::ClientOnly.executes_on(&NetContext::dedicated_server()));
    }

    #[test]
    fn modifier_gate_truth_table() {
        let contexts = [
            (NetContext::dedicated_server(), true, false, false),
            (NetContext::listen_server_local(), true, true, true),
            (NetContext::remote_client(), false, true, false),
            (NetContext::local_client(), false, true, true),
        ];

        for only_local in [false, true] {
            for apply_server in [false, true] {
                for apply_client in [false, true] {
                    let policy = ModifierPolicy {
                        only_apply_on_local: only_local,
                        apply_on_server: apply_server,
                        apply_on_client: apply_client,
                    };

                    for (net, is_server, is_client, is_local) in contexts {
                        let expected = if only_local {
                            is_local
                        } else {
                            (is_client && apply_client) || (is_server && apply_server)
                        };
                        assert_eq!(
                            policy.should_apply(&net),
                            expected,
                            "policy {policy:?} on {net:?}"
                        );
                    }
                }
            }
        }
    }
}
