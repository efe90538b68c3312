//! Cooperative repaint loop.
//!
//! The host owns the frame clock. A [`RenderLoop`] asks its
//! [`FrameScheduler`] for the next frame and, when the host calls back,
//! repaints the stage's dirty panes and asks again.

use crate::stage::Stage;
use std::time::Duration;

// Use web-time on WASM, std::time otherwise
#[cfg(target_arch = "wasm32")]
use web_time::Instant;
#[cfg(not(target_arch = "wasm32"))]
use std::time::Instant;

/// Host hook for scheduling the next animation frame.
pub trait FrameScheduler {
    fn request_frame(&mut self);
}

/// Scheduler that only counts requests. The caller drives frames by hand.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ManualScheduler {
    pub requested: u64,
}

impl FrameScheduler for ManualScheduler {
    fn request_frame(&mut self) {
        self.requested += 1;
    }
}

#[derive(Debug)]
pub struct RenderLoop<S: FrameScheduler> {
    scheduler: S,
    running: bool,
    frames: u64,
    started: Option<Instant>,
}

impl<S: FrameScheduler> RenderLoop<S> {
    pub fn new(scheduler: S) -> Self {
        Self {
            scheduler,
            running: false,
            frames: 0,
            started: None,
        }
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    /// Start requesting frames. A no-op if already running.
    pub fn start(&mut self) {
        if self.running {
            return;
        }
        self.running = true;
        self.started = Some(Instant::now());
        self.scheduler.request_frame();
        log::debug!("Render loop started");
    }

    /// Frame callback: repaint dirty panes, then schedule the next frame.
    /// Returns the number of panes painted. Does nothing once stopped.
    pub fn tick(&mut self, stage: &mut Stage) -> usize {
        if !self.running {
            return 0;
        }
        let painted = stage.render_frame();
        self.frames += 1;
        self.scheduler.request_frame();
        painted
    }

    pub fn stop(&mut self) {
        if self.running {
            self.running = false;
            log::debug!("Render loop stopped after {} frame(s)", self.frames);
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Time since the loop was last started.
    pub fn elapsed(&self) -> Duration {
        self.started.map(|t| t.elapsed()).unwrap_or_default()
    }
}
