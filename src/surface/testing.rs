//! Scripted rendering surface for unit tests

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};

use super::{scripts, PageGeneration, RenderingSurface, SurfaceError};
use crate::pagination::ScrollBehavior;

enum Reply {
    Value(Value),
    Error(String),
}

#[derive(Default)]
struct Recorded {
    evaluated: Vec<String>,
    loaded: Vec<(String, Option<String>)>,
    behaviors: Vec<ScrollBehavior>,
}

/// Answers scripts from a fixed table and records everything it is asked
///
/// `document.readyState` answers `"complete"` unless overridden; unknown
/// scripts answer `null`.
#[derive(Default)]
pub struct ScriptedSurface {
    replies: Mutex<HashMap<String, Reply>>,
    recycle_on: Mutex<HashMap<String, PageGeneration>>,
    recorded: Mutex<Recorded>,
}

impl ScriptedSurface {
    pub fn new() -> Self {
        let surface = Self::default();
        surface.respond(scripts::READY_STATE, json!("complete"));
        surface
    }

    pub fn respond(&self, script: impl Into<String>, value: Value) {
        self.replies.lock().insert(script.into(), Reply::Value(value));
    }

    pub fn fail(&self, script: impl Into<String>, message: &str) {
        self.replies
            .lock()
            .insert(script.into(), Reply::Error(message.to_string()));
    }

    /// Recycle the page while `script` is in flight
    pub fn advance_on(&self, script: impl Into<String>, generation: PageGeneration) {
        self.recycle_on.lock().insert(script.into(), generation);
    }

    /// Reply the surface gives to `getContentDimensions()`
    pub fn respond_dimensions(&self, width: f64, height: f64, viewport_width: f64, viewport_height: f64) {
        self.respond(
            scripts::CONTENT_DIMENSIONS,
            json!({
                "scrollWidth": width,
                "scrollHeight": height,
                "scrollLeft": 0,
                "scrollTop": 0,
                "viewportWidth": viewport_width,
                "viewportHeight": viewport_height
            }),
        );
    }

    pub fn evaluated(&self) -> Vec<String> {
        self.recorded.lock().evaluated.clone()
    }

    pub fn loaded(&self) -> Vec<(String, Option<String>)> {
        self.recorded.lock().loaded.clone()
    }

    pub fn behaviors(&self) -> Vec<ScrollBehavior> {
        self.recorded.lock().behaviors.clone()
    }
}

#[async_trait]
impl RenderingSurface for ScriptedSurface {
    async fn load_document(&self, html: &str, base_url: Option<&str>) -> Result<(), SurfaceError> {
        self.recorded
            .lock()
            .loaded
            .push((html.to_string(), base_url.map(str::to_string)));
        Ok(())
    }

    async fn evaluate(&self, script: &str) -> Result<Value, SurfaceError> {
        self.recorded.lock().evaluated.push(script.to_string());

        if let Some(generation) = self.recycle_on.lock().get(script) {
            generation.advance();
        }

        match self.replies.lock().get(script) {
            Some(Reply::Value(value)) => Ok(value.clone()),
            Some(Reply::Error(message)) => Err(SurfaceError::Script(message.clone())),
            None => Ok(Value::Null),
        }
    }

    fn apply_scroll_behavior(&self, behavior: ScrollBehavior) {
        self.recorded.lock().behaviors.push(behavior);
    }
}
