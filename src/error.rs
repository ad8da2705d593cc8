//! Error and warning types.
//!
//! Structural problems with the input document are `LayoutError`s and stop the
//! engine from being built. Everything else (dangling references, degenerate
//! geometry) is a `Warning`: the layout still runs, just with fewer
//! constraints on the affected entities.

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("document has no `layout` block")]
    MissingLayout,

    #[error("layout has no `sector_distribution`")]
    MissingSectorDistribution,

    #[error("entity #{0} has neither a name nor an id")]
    UnnamedEntity(usize),

    #[error("entity '{0}' is declared more than once")]
    DuplicateEntity(String),

    #[error("invalid viewport {width}x{height}")]
    InvalidViewport { width: f64, height: f64 },

    #[error("could not read YAML document: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("could not read JSON document: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    UnknownSector,
    DegenerateSector,
    DegenerateCircle,
    UnknownCircle,
    MissingCircle,
    UnknownEndpoint,
    SelfLink,
    BlankCenter,
}

/// A non-fatal data-quality finding, surfaced to the caller alongside the layout.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Warning {
    pub kind: WarningKind,
    /// Entity or relationship the warning is about.
    pub subject: String,
    pub message: String,
}

impl Warning {
    pub fn new(kind: WarningKind, subject: impl Into<String>, message: impl Into<String>) -> Self {
        let warning = Self {
            kind,
            subject: subject.into(),
            message: message.into(),
        };
        tracing::warn!(kind = ?warning.kind, subject = %warning.subject, "{}", warning.message);
        warning
    }
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.subject, self.message)
    }
}
