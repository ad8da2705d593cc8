//! WASM bindings for the circles-core library.
//!
//! All functions exposed to JavaScript via wasm-bindgen are defined here.
//! Results cross the boundary as JSON strings; failures are reported in the
//! `error` field of the output instead of being thrown.

use wasm_bindgen::prelude::*;

use crate::output::LayoutOutput;
use crate::session::LayoutSession;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    tracing_wasm::set_as_global_default();
}

fn to_json(output: &LayoutOutput) -> String {
    serde_json::to_string(output).unwrap_or_else(|e| {
        tracing::error!("failed to serialize layout output: {e}");
        r#"{"error":{"message":"failed to serialize layout output"}}"#.to_string()
    })
}

/// Lay out a document to completion and return the settled layout as JSON.
#[wasm_bindgen]
pub fn layout_document(source: &str, width: f64, height: f64) -> String {
    match LayoutSession::from_source(source, width, height) {
        Ok(mut session) => {
            session.run_until_settled();
            to_json(&session.snapshot())
        }
        Err(e) => {
            tracing::error!("Error building layout: {e}");
            to_json(&LayoutOutput::from_error(&e))
        }
    }
}

/// A live, tick-driven layout for interactive use.
#[wasm_bindgen]
pub struct CirclesEngine {
    session: Option<LayoutSession>,
    error: Option<String>,
    width: f64,
    height: f64,
}

#[wasm_bindgen]
impl CirclesEngine {
    #[wasm_bindgen(constructor)]
    pub fn new(source: &str, width: f64, height: f64) -> CirclesEngine {
        let mut engine = CirclesEngine {
            session: None,
            error: None,
            width,
            height,
        };
        engine.load(source);
        engine
    }

    /// Replace the document. On failure the previous layout keeps running and
    /// the error is reported by the next `snapshot`.
    pub fn load(&mut self, source: &str) -> bool {
        match LayoutSession::from_source(source, self.width, self.height) {
            Ok(session) => {
                self.session = Some(session);
                self.error = None;
                true
            }
            Err(e) => {
                tracing::error!("Error loading document: {e}");
                self.error = Some(e.to_string());
                false
            }
        }
    }

    /// Advance one tick. Returns false when there is nothing left to do.
    pub fn tick(&mut self) -> bool {
        self.session.as_mut().is_some_and(LayoutSession::tick)
    }

    pub fn is_settled(&self) -> bool {
        self.session.as_ref().is_none_or(LayoutSession::is_settled)
    }

    /// Current positions, styles and guides as JSON.
    pub fn snapshot(&self) -> String {
        let mut output = self.session.as_ref().map(LayoutSession::snapshot).unwrap_or_default();
        if let Some(message) = &self.error {
            output.error = Some(crate::output::ErrorInfo { message: message.clone() });
        }
        to_json(&output)
    }

    pub fn drag_start(&mut self, id: &str) -> bool {
        self.session.as_mut().is_some_and(|s| s.drag_start(id))
    }

    /// Projected `[x, y]` for the proposed point; empty for an unknown id.
    pub fn drag_move(&mut self, id: &str, x: f64, y: f64) -> Vec<f64> {
        self.session
            .as_mut()
            .and_then(|s| s.drag_move(id, x, y))
            .map(|p| vec![p.x, p.y])
            .unwrap_or_default()
    }

    pub fn drag_end(&mut self, id: &str) -> bool {
        self.session.as_mut().is_some_and(|s| s.drag_end(id))
    }
}
