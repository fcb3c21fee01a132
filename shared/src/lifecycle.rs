//! # Initialization Lifecycle Types
//!
//! State enums for the per-feature initialization chain and for the recipe
//! application protocol. Both progress strictly forward.

use serde::{Deserialize, Serialize};

/// Per-feature initialization state of a character component.
///
/// States form a fixed linear chain. Every feature component on a character
/// tracks its own state and advances in lockstep with its siblings: the two
/// barrier transitions only succeed once all registered features have caught
/// up.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub enum InitState {
    /// The component has not begun initializing
    #[default]
    None,

    /// The owning character exists and the component is attached
    Spawned,

    /// The data the component needs to initialize is available
    DataAvailable,

    /// The component has consumed its data
    DataInitialized,

    /// The character is ready for gameplay systems. Terminal state.
    GameplayReady,
}

impl InitState {
    /// The transition chain walked by `check_default_initialization`,
    /// in order
    pub const CHAIN: [InitState; 4] = [
        InitState::Spawned,
        InitState::DataAvailable,
        InitState::DataInitialized,
        InitState::GameplayReady,
    ];

    /// The next state in the chain, if any
    pub fn next(self) -> Option<InitState> {
        match self {
            Self::None => Some(Self::Spawned),
            Self::Spawned => Some(Self::DataAvailable),
            Self::DataAvailable => Some(Self::DataInitialized),
            Self::DataInitialized => Some(Self::GameplayReady),
            Self::GameplayReady => None,
        }
    }
}

/// Current application state of a character's committed recipes.
///
/// Strictly forward: PreCommit -> Committed -> Complete, never backward.
/// Commit is a one-way transition per character lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecipeApplicationState {
    /// Recipe classes not yet committed
    PreCommit,

    /// Recipe classes have been committed and setup is in progress
    Committed,

    /// Every committed recipe has finished its setup
    Complete,
}
