use std::io::stdout;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event;
use crossterm::event::{
    DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
};
use crossterm::execute;
use ratatui::DefaultTerminal;

use crate::app::{App, Message, Model, ToastLevel, update};
use crate::pipeline::{RenderState, RenderWorker};

/// Quiet period before a burst of resize events is applied.
const RESIZE_DEBOUNCE_MS: u64 = 100;

pub(super) struct ResizeDebouncer {
    delay_ms: u64,
    pending: Option<(u16, u16, u64)>,
}

impl ResizeDebouncer {
    pub(super) const fn new(delay_ms: u64) -> Self {
        Self {
            delay_ms,
            pending: None,
        }
    }

    pub(super) const fn queue(&mut self, width: u16, height: u16, now_ms: u64) {
        self.pending = Some((width, height, now_ms));
    }

    pub(super) fn take_ready(&mut self, now_ms: u64) -> Option<(u16, u16)> {
        let (width, height, queued_at) = self.pending?;
        if now_ms.saturating_sub(queued_at) >= self.delay_ms {
            self.pending = None;
            Some((width, height))
        } else {
            None
        }
    }

    pub(super) const fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

impl App {
    /// Run the main event loop.
    ///
    /// # Errors
    ///
    /// Returns an error if the render worker cannot start, the terminal
    /// cannot be initialized, or terminal I/O fails.
    pub fn run(&mut self) -> Result<()> {
        let _run_scope = crate::perf::scope("app.run.total");

        // Create image picker BEFORE initializing terminal (queries stdio)
        let picker = if self.images_enabled {
            let _picker_scope = crate::perf::scope("app.create_picker");
            crate::image::create_picker(self.force_half_cell)
        } else {
            None
        };

        let worker = RenderWorker::spawn(Arc::clone(&self.renderer))
            .context("Failed to start render worker")?;

        let init_scope = crate::perf::scope("app.ratatui_init");
        let mut terminal = ratatui::try_init()
            .context("Failed to initialize terminal; mermedit requires an interactive terminal")?;
        let size = terminal.size()?;
        drop(init_scope);

        let mut model = Model::new(&self.source, (size.width, size.height)).with_picker(picker);
        model.theme = self.theme;
        model.export_config = self.export_config;
        model.out_dir.clone_from(&self.out_dir);
        model.images_enabled = self.images_enabled;
        model
            .config_global_path
            .clone_from(&self.config_global_path);
        model.config_local_path.clone_from(&self.config_local_path);
        crate::perf::log_event(
            "init.layout",
            format!(
                "terminal={}x{} preview_px={:?}",
                size.width,
                size.height,
                model.preview_target_width_px()
            ),
        );

        let result = execute!(stdout(), EnableMouseCapture, EnableBracketedPaste)
            .map_err(anyhow::Error::from)
            .and_then(|()| Self::event_loop(&mut terminal, &mut model, &worker));

        // Restore terminal
        let _ = execute!(stdout(), DisableBracketedPaste, DisableMouseCapture);
        ratatui::restore();

        result
    }

    fn event_loop(
        terminal: &mut DefaultTerminal,
        model: &mut Model,
        worker: &RenderWorker,
    ) -> Result<()> {
        let start = Instant::now();
        let elapsed_ms = || u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        let mut resize_debouncer = ResizeDebouncer::new(RESIZE_DEBOUNCE_MS);
        let mut frame_idx: u64 = 0;
        let mut needs_render = true;

        loop {
            if model.expire_toast(Instant::now()) {
                needs_render = true;
            }

            let now_ms = elapsed_ms();

            if let Some((width, height)) = resize_debouncer.take_ready(now_ms) {
                crate::perf::log_event(
                    "event.resize.apply",
                    format!("frame={frame_idx} width={width} height={height}"),
                );
                *model = update(std::mem::take(model), Message::Resize(width, height));
                needs_render = true;
            }

            if Self::drive_pipeline(model, worker, now_ms) {
                needs_render = true;
            }

            while let Some(event) = worker.try_recv() {
                Self::handle_worker_event(model, event);
                needs_render = true;
            }

            // Handle events
            let poll_ms = if needs_render {
                0
            } else if let Some(ms) = model.pipeline.ms_until_ready(now_ms) {
                ms.clamp(1, 50)
            } else if resize_debouncer.is_pending()
                || model.export_in_flight
                || matches!(model.pipeline.state(), RenderState::Loading)
            {
                10
            } else {
                250
            };
            if event::poll(Duration::from_millis(poll_ms))? {
                // Refresh timestamp after poll wait so debouncers use accurate times.
                let event_ms = elapsed_ms();
                let msg =
                    Self::handle_event(&event::read()?, model, event_ms, &mut resize_debouncer);
                if let Some(msg) = msg {
                    crate::perf::log_event(
                        "event.message",
                        format!("frame={frame_idx} msg={msg:?}"),
                    );
                    Self::dispatch(model, worker, msg);
                    needs_render = true;
                }

                // Coalesce key repeat and paste bursts into a single render.
                let mut drained = 0_u32;
                while event::poll(Duration::from_millis(0))? {
                    let drain_ms = elapsed_ms();
                    let msg =
                        Self::handle_event(&event::read()?, model, drain_ms, &mut resize_debouncer);
                    if let Some(msg) = msg {
                        drained += 1;
                        Self::dispatch(model, worker, msg);
                        needs_render = true;
                    }
                }
                if drained > 0 {
                    crate::perf::log_event(
                        "event.drain",
                        format!("frame={frame_idx} drained={drained}"),
                    );
                }
            }

            if needs_render {
                frame_idx += 1;
                let draw_start = Instant::now();
                terminal.draw(|frame| crate::ui::render(model, frame))?;
                if crate::perf::is_debug_log_enabled() {
                    crate::perf::log_event(
                        "frame.draw",
                        format!(
                            "frame={} draw_ms={:.3} state={}",
                            frame_idx,
                            draw_start.elapsed().as_secs_f64() * 1000.0,
                            model.pipeline.state().label()
                        ),
                    );
                }
                needs_render = false;
            }

            if model.should_quit {
                break;
            }
        }
        Ok(())
    }

    pub(super) fn dispatch(model: &mut Model, worker: &RenderWorker, msg: Message) {
        let side_msg = msg.clone();
        *model = update(std::mem::take(model), msg);
        Self::handle_message_side_effects(model, worker, &side_msg);
    }

    /// Schedule renders for changed input and hand ready jobs to the
    /// worker. Returns whether the preview state changed.
    fn drive_pipeline(model: &mut Model, worker: &RenderWorker, now_ms: u64) -> bool {
        model.sync_render_schedule(now_ms);
        let seq_before = model.pipeline.latest_seq();
        if let Some(job) = model.pipeline.poll(now_ms)
            && !worker.submit_preview(job)
        {
            tracing::error!("preview worker stopped");
            model.show_toast(ToastLevel::Error, "Preview renderer stopped unexpectedly");
        }
        if model.pipeline.latest_seq() == seq_before {
            return false;
        }
        model.refresh_preview_protocol();
        true
    }
}
