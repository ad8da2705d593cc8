//! Constrained radial layout for social circle diagrams.
//!
//! A central entity sits at the viewport center, surrounded by concentric
//! circles split into named sectors. Every other entity is placed inside its
//! sector and circle, then relaxed by a force simulation that never lets it
//! leave that region. Dragged entities are projected onto their region in
//! real time.
//!
//! Pipeline: `document` (parse) -> `document::compile` (graph + sector
//! angles) -> `layout::ForceSimulation` (relaxation, drag) -> `output`
//! (renderer JSON with `style` applied).

pub mod document;
pub mod error;
pub mod layout;
pub mod output;
pub mod session;
pub mod style;
pub mod wasm;

pub use document::{Graph, GraphDocument, compile};
pub use error::{LayoutError, Warning, WarningKind};
pub use layout::{ForceConfig, ForceSimulation, PointF, Viewport, project};
pub use output::LayoutOutput;
pub use session::LayoutSession;
pub use style::{LinkStyle, NodeStyle, StyleResolver};
