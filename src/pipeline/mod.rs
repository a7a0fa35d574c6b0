//! Debounced live-render pipeline.
//!
//! [`RenderPipeline`] is a pure state machine driven by explicit timestamps:
//! the event loop feeds it inputs and polls it for jobs, and the preview
//! worker runs those jobs through [`run_preview_job`]. Each job carries a
//! sequence number so only the newest outcome ever reaches the screen.

mod worker;

pub use worker::{RenderWorker, WorkerEvent};

use image::DynamicImage;

use crate::diagram::{DiagramId, DiagramRenderer, RenderError, RendererConfig, ThemeId};

/// Quiet period after the last edit before a render starts.
pub const DEBOUNCE_MS: u64 = 300;

/// What the preview surface shows. Exactly one holds at a time.
#[derive(Debug, Clone, Default)]
pub enum RenderState {
    #[default]
    Empty,
    Loading,
    Error(String),
    Rendered(RenderedDiagram),
}

impl RenderState {
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Loading => "rendering",
            Self::Error(_) => "error",
            Self::Rendered(_) => "ok",
        }
    }
}

/// A successfully rendered diagram.
#[derive(Debug, Clone)]
pub struct RenderedDiagram {
    pub id: DiagramId,
    pub svg: String,
    /// Rasterized preview, when a pixel width was requested.
    pub image: Option<DynamicImage>,
}

/// Snapshot of everything a render depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderInput {
    pub source: String,
    pub theme: ThemeId,
    /// Width in pixels to rasterize at; `None` skips rasterizing.
    pub target_width_px: Option<u32>,
}

/// A render ready to hand to the preview worker.
#[derive(Debug, Clone)]
pub struct RenderJob {
    pub seq: u64,
    pub id: DiagramId,
    pub source: String,
    pub config: RendererConfig,
    pub target_width_px: Option<u32>,
}

#[derive(Debug)]
pub struct RenderOutcome {
    pub seq: u64,
    pub result: Result<RenderedDiagram, RenderError>,
}

#[derive(Debug)]
pub struct RenderPipeline {
    delay_ms: u64,
    pending: Option<(RenderInput, u64)>,
    state: RenderState,
    latest_seq: u64,
}

impl Default for RenderPipeline {
    fn default() -> Self {
        Self::new(DEBOUNCE_MS)
    }
}

impl RenderPipeline {
    pub const fn new(delay_ms: u64) -> Self {
        Self {
            delay_ms,
            pending: None,
            state: RenderState::Empty,
            latest_seq: 0,
        }
    }

    /// Record a change. Restarts the quiet window; earlier pending input is
    /// discarded.
    pub fn schedule(&mut self, input: RenderInput, now_ms: u64) {
        crate::perf::log_event(
            "pipeline.schedule",
            format!(
                "bytes={} theme={} width={:?} at={now_ms}",
                input.source.len(),
                input.theme,
                input.target_width_px
            ),
        );
        self.pending = Some((input, now_ms));
    }

    /// Fire the pending input once the quiet window has elapsed.
    ///
    /// Blank sources move straight to [`RenderState::Empty`] and yield no
    /// job. Anything else moves to [`RenderState::Loading`] and yields a job
    /// with a fresh sequence number.
    pub fn poll(&mut self, now_ms: u64) -> Option<RenderJob> {
        let (_, queued_at) = self.pending.as_ref()?;
        if now_ms.saturating_sub(*queued_at) < self.delay_ms {
            return None;
        }
        let (input, _) = self.pending.take()?;
        // Advancing on Empty too keeps an older in-flight render from
        // overwriting the placeholder.
        self.latest_seq += 1;

        if input.source.trim().is_empty() {
            self.state = RenderState::Empty;
            crate::perf::log_event("pipeline.empty", format!("seq={}", self.latest_seq));
            return None;
        }

        self.state = RenderState::Loading;
        crate::perf::log_event("pipeline.fire", format!("seq={}", self.latest_seq));
        Some(RenderJob {
            seq: self.latest_seq,
            id: DiagramId::fresh("mermaid"),
            source: input.source,
            config: RendererConfig::preview(input.theme),
            target_width_px: input.target_width_px,
        })
    }

    /// Apply a finished render. Returns `false` when the outcome belongs to
    /// a superseded job and was dropped.
    pub fn complete(&mut self, outcome: RenderOutcome) -> bool {
        if outcome.seq != self.latest_seq {
            crate::perf::log_event(
                "pipeline.stale",
                format!("seq={} latest={}", outcome.seq, self.latest_seq),
            );
            return false;
        }
        self.state = match outcome.result {
            Ok(diagram) => RenderState::Rendered(diagram),
            Err(err) => RenderState::Error(err.message().to_string()),
        };
        crate::perf::log_event(
            "pipeline.complete",
            format!("seq={} state={}", outcome.seq, self.state.label()),
        );
        true
    }

    pub const fn state(&self) -> &RenderState {
        &self.state
    }

    /// Input is waiting for its quiet window to elapse.
    pub const fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Milliseconds until the pending input fires, if any.
    pub fn ms_until_ready(&self, now_ms: u64) -> Option<u64> {
        let (_, queued_at) = self.pending.as_ref()?;
        Some(
            self.delay_ms
                .saturating_sub(now_ms.saturating_sub(*queued_at)),
        )
    }

    pub const fn latest_seq(&self) -> u64 {
        self.latest_seq
    }
}

/// Validate, render and (optionally) rasterize one job.
///
/// Every failure is captured in the outcome; nothing here panics or
/// propagates.
pub fn run_preview_job(renderer: &dyn DiagramRenderer, job: RenderJob) -> RenderOutcome {
    let _scope = crate::perf::scope("pipeline.render");
    let result = render_job(renderer, &job);
    if let Err(err) = &result {
        tracing::debug!(seq = job.seq, error = %err, "preview render failed");
    }
    RenderOutcome {
        seq: job.seq,
        result,
    }
}

fn render_job(renderer: &dyn DiagramRenderer, job: &RenderJob) -> Result<RenderedDiagram, RenderError> {
    renderer.validate(&job.source)?;
    let svg = renderer.render(&job.id, &job.source, &job.config)?;
    let image = match job.target_width_px {
        Some(width) => Some(
            crate::mermaid::rasterize_svg(&svg, width)
                .map_err(|err| RenderError::Render(format!("{err:#}")))?,
        ),
        None => None,
    };
    Ok(RenderedDiagram {
        id: job.id.clone(),
        svg,
        image,
    })
}
