//! # Recipe and Modifier Handles
//!
//! Globally unique identifier tokens for pending recipes, active recipes,
//! and modifier entries. Handles are generated from process-wide monotonic
//! counters that never reset and never reuse a value; the zero value always
//! means "invalid".

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

static NEXT_PENDING_HANDLE: AtomicU32 = AtomicU32::new(1);
static NEXT_ACTIVE_HANDLE: AtomicU32 = AtomicU32::new(1);
static NEXT_MODIFIER_ENTRY_ID: AtomicU32 = AtomicU32::new(1);

/// Handle that points to a specific pending character recipe.
///
/// These are globally unique. The default handle is invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PendingRecipeHandle(u32);

impl PendingRecipeHandle {
    /// Generate a fresh, valid handle
    pub fn generate() -> Self {
        Self(NEXT_PENDING_HANDLE.fetch_add(1, Ordering::Relaxed))
    }

    /// True if this handle was produced by `generate`
    pub fn is_valid(&self) -> bool {
        self.0 != 0
    }

    /// Raw handle value
    pub fn raw(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for PendingRecipeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "{}", self.0)
        } else {
            write!(f, "Invalid")
        }
    }
}

/// Handle that points to a specific active character recipe.
///
/// These are globally unique and replicated as part of the entry identity,
/// so a recipe can be referred to across the network before the executing
/// side has created an instance for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ActiveRecipeHandle(u32);

impl ActiveRecipeHandle {
    /// Generate a fresh, valid handle
    pub fn generate() -> Self {
        Self(NEXT_ACTIVE_HANDLE.fetch_add(1, Ordering::Relaxed))
    }

    /// True if this handle was produced by `generate`
    pub fn is_valid(&self) -> bool {
        self.0 != 0
    }

    /// Raw handle value
    pub fn raw(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for ActiveRecipeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "{}", self.0)
        } else {
            write!(f, "Invalid")
        }
    }
}

/// Identifier for an applied modifier entry, replicated as the entry identity
/// of the modifier container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ModifierEntryId(u32);

impl ModifierEntryId {
    /// Generate a fresh, valid id
    pub fn generate() -> Self {
        Self(NEXT_MODIFIER_ENTRY_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// True if this id was produced by `generate`
    pub fn is_valid(&self) -> bool {
        self.0 != 0
    }

    /// Raw id value
    pub fn raw(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for ModifierEntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "{}", self.0)
        } else {
            write!(f, "Invalid")
        }
    }
}
