//! Scriptable renderer used by unit tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{DiagramId, DiagramRenderer, RenderError, RendererConfig};

pub const STUB_SVG: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" width="120" height="40" viewBox="0 0 120 40"><rect x="1" y="1" width="118" height="38" stroke-width="2"/></svg>"#;

#[derive(Debug, Default)]
pub struct StubRenderer {
    reject_with: Option<String>,
    fail_with: Option<String>,
    validate_calls: AtomicUsize,
    render_calls: AtomicUsize,
    rendered: Mutex<Vec<(String, String, RendererConfig)>>,
}

impl StubRenderer {
    pub fn accepting() -> Self {
        Self::default()
    }

    /// Validation fails with `message`.
    pub fn rejecting(message: &str) -> Self {
        Self {
            reject_with: Some(message.to_string()),
            ..Self::default()
        }
    }

    /// Validation passes but rendering fails with `message`.
    pub fn failing(message: &str) -> Self {
        Self {
            fail_with: Some(message.to_string()),
            ..Self::default()
        }
    }

    pub fn validate_calls(&self) -> usize {
        self.validate_calls.load(Ordering::SeqCst)
    }

    pub fn render_calls(&self) -> usize {
        self.render_calls.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        self.validate_calls() + self.render_calls()
    }

    /// `(id, source, config)` for every render call so far.
    pub fn rendered(&self) -> Vec<(String, String, RendererConfig)> {
        self.rendered.lock().expect("stub lock").clone()
    }
}

impl DiagramRenderer for StubRenderer {
    fn validate(&self, _source: &str) -> Result<(), RenderError> {
        self.validate_calls.fetch_add(1, Ordering::SeqCst);
        match &self.reject_with {
            Some(msg) => Err(RenderError::Validation(msg.clone())),
            None => Ok(()),
        }
    }

    fn render(
        &self,
        id: &DiagramId,
        source: &str,
        config: &RendererConfig,
    ) -> Result<String, RenderError> {
        self.render_calls.fetch_add(1, Ordering::SeqCst);
        self.rendered.lock().expect("stub lock").push((
            id.as_str().to_string(),
            source.to_string(),
            config.clone(),
        ));
        match &self.fail_with {
            Some(msg) => Err(RenderError::Render(msg.clone())),
            None => Ok(STUB_SVG.to_string()),
        }
    }
}
