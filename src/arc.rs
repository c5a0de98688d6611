use std::f64::consts::PI;
use std::fmt;
use std::time::{Duration, Instant};

use crate::time::format_time;

/// Just under a full turn: a 360° SVG arc has identical endpoints and draws nothing.
pub const FULL_ARC_SPAN: f64 = 359.99;

/// Fixed geometry of the countdown dial, in SVG user units (y grows downwards).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcConfig {
    pub cx: f64,
    pub cy: f64,
    pub radius: f64,
    pub start_angle: f64,
    pub full_arc_span: f64,
}

impl Default for ArcConfig {
    fn default() -> Self {
        ArcConfig {
            cx: 150.0,
            cy: 150.0,
            radius: 120.0,
            start_angle: -90.0,
            full_arc_span: FULL_ARC_SPAN,
        }
    }
}

fn deg2rad(deg: f64) -> f64 {
    deg * PI / 180.0
}

/// A single clockwise arc segment of the dial.
#[derive(Debug, Clone, PartialEq)]
pub struct ArcPath {
    pub cx: f64,
    pub cy: f64,
    pub radius: f64,
    pub start_angle: f64,
    pub end_angle: f64,
    pub start: (f64, f64),
    pub end: (f64, f64),
    pub large_arc: bool,
}

impl ArcPath {
    /// Samples the arc from its start angle to its end angle, inclusive.
    pub fn points(&self, steps: usize) -> Vec<(f64, f64)> {
        let steps = steps.max(1);
        let sweep = self.end_angle - self.start_angle;
        (0..=steps)
            .map(|i| {
                let angle = deg2rad(self.start_angle + sweep * i as f64 / steps as f64);
                (
                    self.cx + self.radius * angle.cos(),
                    self.cy + self.radius * angle.sin(),
                )
            })
            .collect()
    }
}

impl fmt::Display for ArcPath {
    /// SVG path data: a move to the start point followed by one arc command.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "M {:.3} {:.3} A {} {} 0 {} 1 {:.3} {:.3}",
            self.start.0,
            self.start.1,
            self.radius,
            self.radius,
            u8::from(self.large_arc),
            self.end.0,
            self.end.1
        )
    }
}

pub fn draw_arc_path(config: &ArcConfig, end_angle: f64) -> ArcPath {
    let ArcConfig {
        cx,
        cy,
        radius,
        start_angle,
        ..
    } = *config;

    let start = (
        cx + radius * deg2rad(start_angle).cos(),
        cy + radius * deg2rad(start_angle).sin(),
    );
    let end = (
        cx + radius * deg2rad(end_angle).cos(),
        cy + radius * deg2rad(end_angle).sin(),
    );

    ArcPath {
        cx,
        cy,
        radius,
        start_angle,
        end_angle,
        start,
        end,
        large_arc: (end_angle - start_angle).abs() > 180.0,
    }
}

/// Where the timer draws: an arc and a line of time text.
pub trait TimerSurface {
    fn draw_arc(&mut self, path: &ArcPath);
    fn show_time(&mut self, text: &str);
}

/// In-memory dial, read back by the terminal renderer.
#[derive(Debug, Clone, Default)]
pub struct DialFace {
    pub path: Option<ArcPath>,
    pub time_text: String,
}

impl TimerSurface for DialFace {
    fn draw_arc(&mut self, path: &ArcPath) {
        self.path = Some(path.clone());
    }

    fn show_time(&mut self, text: &str) {
        self.time_text = text.to_string();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    Completed,
}

#[derive(Debug, Clone, Copy)]
enum Animation {
    Idle,
    Reveal {
        started: Instant,
        duration: Duration,
        target_span: f64,
        target_seconds: i64,
    },
    Countdown {
        started: Instant,
        initial_seconds: i64,
        start_span: f64,
    },
}

/// Countdown drawn as a shrinking arc.
///
/// The timer never schedules anything itself: the host calls [`ArcTimer::tick`]
/// once per frame, and remaining time is derived from the elapsed fraction of
/// the whole countdown rather than from per-second decrements, so the digits
/// and the arc always agree.
pub struct ArcTimer<S: TimerSurface = DialFace> {
    config: ArcConfig,
    surface: S,
    end_angle: f64,
    total_seconds: i64,
    duration_seconds: i64,
    running: bool,
    animation: Animation,
}

impl ArcTimer<DialFace> {
    pub fn new(config: ArcConfig) -> Self {
        Self::with_surface(config, DialFace::default())
    }
}

impl<S: TimerSurface> ArcTimer<S> {
    pub fn with_surface(config: ArcConfig, surface: S) -> Self {
        ArcTimer {
            end_angle: config.start_angle,
            config,
            surface,
            total_seconds: 0,
            duration_seconds: 0,
            running: false,
            animation: Animation::Idle,
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn config(&self) -> &ArcConfig {
        &self.config
    }

    fn redraw(&mut self) {
        let path = draw_arc_path(&self.config, self.end_angle);
        self.surface.draw_arc(&path);
    }

    fn show_seconds(&mut self, secs: i64) {
        self.surface.show_time(&format_time(secs));
    }

    /// Loads a task's remaining time. `duration` falls back to `remaining`.
    /// Any countdown or reveal in flight is dropped; counting does not start.
    pub fn set_task(&mut self, remaining: i64, duration: Option<i64>) {
        self.duration_seconds = duration.unwrap_or(remaining);
        self.total_seconds = remaining;
        self.running = false;
        self.animation = Animation::Idle;

        let ratio = if self.duration_seconds > 0 {
            (self.total_seconds as f64 / self.duration_seconds as f64).clamp(0.0, 1.0)
        } else {
            0.0
        };

        self.end_angle = self.config.start_angle + self.config.full_arc_span * ratio;
        self.redraw();
        self.show_seconds(self.total_seconds);
    }

    /// Full ring with `0:00`, shown when there is nothing left to time.
    pub fn show_finished(&mut self) {
        self.total_seconds = 0;
        self.duration_seconds = 0;
        self.running = false;
        self.animation = Animation::Idle;
        self.end_angle = self.config.start_angle + self.config.full_arc_span;
        self.redraw();
        self.show_seconds(0);
    }

    /// Sweeps the arc open from the start angle to its current position while
    /// the digits count up. Purely cosmetic; ignored while running.
    pub fn reveal(&mut self, now: Instant, duration: Duration) {
        if self.running {
            return;
        }
        self.animation = Animation::Reveal {
            started: now,
            duration,
            target_span: self.end_angle - self.config.start_angle,
            target_seconds: self.total_seconds,
        };
        self.end_angle = self.config.start_angle;
        self.redraw();
        self.show_seconds(0);
    }

    pub fn start(&mut self, now: Instant) {
        if self.running || self.total_seconds <= 0 {
            return;
        }

        if let Animation::Reveal { target_span, .. } = self.animation {
            self.end_angle = self.config.start_angle + target_span;
            self.redraw();
            self.show_seconds(self.total_seconds);
        }

        self.running = true;
        self.animation = Animation::Countdown {
            started: now,
            initial_seconds: self.total_seconds,
            start_span: self.end_angle - self.config.start_angle,
        };
        log::debug!("countdown started with {}s remaining", self.total_seconds);
    }

    pub fn pause(&mut self) {
        self.running = false;
    }

    /// Advances whatever animation is in flight to `now`. Yields
    /// [`TimerEvent::Completed`] exactly once, on the step that reaches zero.
    pub fn tick(&mut self, now: Instant) -> Option<TimerEvent> {
        match self.animation {
            Animation::Idle => None,
            Animation::Reveal {
                started,
                duration,
                target_span,
                target_seconds,
            } => {
                let t = fraction(now.saturating_duration_since(started), duration);
                self.end_angle = self.config.start_angle + target_span * t;
                self.redraw();

                if t < 1.0 {
                    self.show_seconds((target_seconds as f64 * t).round() as i64);
                } else {
                    self.show_seconds(target_seconds);
                    self.animation = Animation::Idle;
                }
                None
            }
            Animation::Countdown {
                started,
                initial_seconds,
                start_span,
            } => {
                if !self.running {
                    self.animation = Animation::Idle;
                    return None;
                }

                let total = Duration::from_secs(initial_seconds.max(0) as u64);
                let t = fraction(now.saturating_duration_since(started), total);

                self.end_angle = self.config.start_angle + start_span * (1.0 - t);
                self.redraw();

                self.total_seconds = ((initial_seconds as f64 * (1.0 - t)).round() as i64).max(0);
                self.show_seconds(self.total_seconds);

                if t < 1.0 {
                    return None;
                }

                self.running = false;
                self.total_seconds = 0;
                self.animation = Animation::Idle;
                self.show_seconds(0);
                log::debug!("countdown completed");
                Some(TimerEvent::Completed)
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn remaining_seconds(&self) -> i64 {
        self.total_seconds
    }

    pub fn duration_seconds(&self) -> i64 {
        self.duration_seconds
    }

    pub fn end_angle(&self) -> f64 {
        self.end_angle
    }
}

fn fraction(elapsed: Duration, total: Duration) -> f64 {
    if total.is_zero() {
        return 1.0;
    }
    (elapsed.as_secs_f64() / total.as_secs_f64()).min(1.0)
}
