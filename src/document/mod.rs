//! Input graph document.
//!
//! The document arrives already structured (YAML or JSON text); this module
//! only deserializes it. `compile` turns it into the engine's working set.

pub mod compile;
mod types;

pub use compile::{Graph, Link, Node, NodeId, NodeKind, compile};
pub use types::*;

use crate::error::LayoutError;

impl GraphDocument {
    pub fn from_yaml(source: &str) -> Result<Self, LayoutError> {
        Ok(serde_yaml::from_str(source)?)
    }

    pub fn from_json(source: &str) -> Result<Self, LayoutError> {
        Ok(serde_json::from_str(source)?)
    }

    /// Parse either format; text starting with `{` is treated as JSON.
    pub fn parse(source: &str) -> Result<Self, LayoutError> {
        if source.trim_start().starts_with('{') {
            Self::from_json(source)
        } else {
            Self::from_yaml(source)
        }
    }
}
