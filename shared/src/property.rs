//! # Shared Property System
//!
//! Property types and values for the character property surface. Modifiers
//! and recipes write these onto the owning pawn through the actor boundary.

use crate::types::*;
use serde::{Deserialize, Serialize};

/// The different types of properties that can be stored on a pawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PropertyType {
    // Primitive types
    Bool,
    Int32,
    Float,
    String,

    // Structured types
    Vector,
    Rotator,

    // Reference types
    ClassReference,

    // Special types
    Name,
    Custom, // Custom struct - stored as JSON
}

/// The value of a property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    // Primitive values
    Bool(bool),
    Int32(i32),
    Float(f32),
    String(String),

    // Structured values
    Vector(Vector3),
    Rotator(Rotator),

    // Reference values
    ClassReference(String), // Class name

    // Special values
    Name(String),
    CustomJson(String),

    // Null value
    None,
}

impl PropertyValue {
    /// Get the type of this property value
    pub fn get_type(&self) -> PropertyType {
        match self {
            Self::Bool(_) => PropertyType::Bool,
            Self::Int32(_) => PropertyType::Int32,
            Self::Float(_) => PropertyType::Float,
            Self::String(_) => PropertyType::String,
            Self::Vector(_) => PropertyType::Vector,
            Self::Rotator(_) => PropertyType::Rotator,
            Self::ClassReference(_) => PropertyType::ClassReference,
            Self::Name(_) => PropertyType::Name,
            Self::CustomJson(_) => PropertyType::Custom,
            Self::None => PropertyType::Bool, // Default None to bool type
        }
    }

    /// Convert to a human-readable string for display/debugging
    pub fn display_string(&self) -> String {
        match self {
            Self::Bool(b) => b.to_string(),
            Self::Int32(i) => i.to_string(),
            Self::Float(f) => f.to_string(),
            Self::String(s) => s.clone(),
            Self::Vector(v) => format!("(X={},Y={},Z={})", v.x, v.y, v.z),
            Self::Rotator(r) => {
                format!("(Pitch={},Yaw={},Roll={})", r.pitch, r.yaw, r.roll)
            }
            Self::ClassReference(name) => format!("Class:{}", name),
            Self::Name(name) => format!("Name:{}", name),
            Self::CustomJson(json) => json.clone(),
            Self::None => "None".to_string(),
        }
    }
}
