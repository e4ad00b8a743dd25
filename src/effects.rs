//! Time-based visual effects: text scramble, idle opacity sweep and the
//! preview crossfade.
//!
//! Everything here is a pure function of elapsed time, so the sequencer can
//! sample any effect at any `Instant` without owning a timer.

use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Glyphs used while a cell is scrambled
pub const SCRAMBLE_CHARS: &str = "qwerty1337h@ck3r";
pub const SCRAMBLE_DURATION: Duration = Duration::from_millis(800);
pub const SCRAMBLE_REVEAL_DELAY: Duration = Duration::from_millis(300);
/// How long a scrambled glyph stays before being redrawn
const SCRAMBLE_GLYPH_PERIOD: Duration = Duration::from_millis(60);

pub const CROSSFADE_OPACITY: Duration = Duration::from_millis(600);
pub const CROSSFADE_SCALE: Duration = Duration::from_millis(800);
pub const CROSSFADE_START_SCALE: f32 = 1.2;

const SWEEP_COLUMN_STAGGER: f32 = 0.2;
const SWEEP_ROW_STAGGER: f32 = 0.05;
const SWEEP_FADE: f32 = 0.1;
const SWEEP_LOW_OPACITY: f32 = 0.05;
const SWEEP_REPEAT_DELAY: f32 = 2.0;
/// Cells that take part in the sweep; the number column stays put
const SWEEP_COLUMNS: std::ops::RangeInclusive<usize> = 1..=5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ease {
    Linear,
    InOutQuad,
    OutQuad,
}

impl Ease {
    fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Ease::Linear => t,
            Ease::InOutQuad => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
            Ease::OutQuad => 1.0 - (1.0 - t) * (1.0 - t),
        }
    }
}

fn interpolate(from: f32, to: f32, elapsed: f32, duration: f32, ease: Ease) -> f32 {
    if duration <= 0.0 || elapsed >= duration {
        return to;
    }
    from + (to - from) * ease.apply(elapsed / duration)
}

/// A single value animating from `from` to `to`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tween {
    pub from: f32,
    pub to: f32,
    pub start: Instant,
    pub duration: Duration,
    pub ease: Ease,
}

impl Tween {
    pub fn settled(value: f32, now: Instant) -> Self {
        Tween {
            from: value,
            to: value,
            start: now,
            duration: Duration::ZERO,
            ease: Ease::Linear,
        }
    }

    pub fn value_at(&self, now: Instant) -> f32 {
        let elapsed = now.saturating_duration_since(self.start).as_secs_f32();
        interpolate(
            self.from,
            self.to,
            elapsed,
            self.duration.as_secs_f32(),
            self.ease,
        )
    }
}

/// Scramble-reveal effect on one cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scramble {
    pub started: Instant,
    pub seed: u64,
}

impl Scramble {
    pub fn new(started: Instant, seed: u64) -> Self {
        Scramble { started, seed }
    }

    pub fn is_done(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.started) >= SCRAMBLE_DURATION
    }

    /// Text shown at `now`.
    ///
    /// Before the reveal delay every glyph is scrambled; afterwards the
    /// original is revealed left to right, and it is exact once the effect
    /// is done. Whitespace is never scrambled and the char count never
    /// changes.
    pub fn frame(&self, original: &str, now: Instant) -> String {
        let elapsed = now.saturating_duration_since(self.started);
        if elapsed >= SCRAMBLE_DURATION {
            return original.to_string();
        }

        let chars: Vec<char> = original.chars().collect();
        let revealed = if elapsed <= SCRAMBLE_REVEAL_DELAY {
            0
        } else {
            let window = (SCRAMBLE_DURATION - SCRAMBLE_REVEAL_DELAY).as_secs_f32();
            let progress = (elapsed - SCRAMBLE_REVEAL_DELAY).as_secs_f32() / window;
            ((chars.len() as f32) * progress).floor() as usize
        };

        let bucket = (elapsed.as_millis() / SCRAMBLE_GLYPH_PERIOD.as_millis()) as u64;
        let mut rng = StdRng::seed_from_u64(self.seed.wrapping_mul(0x9E37_79B9_7F4A_7C15) ^ bucket);
        let glyphs: Vec<char> = SCRAMBLE_CHARS.chars().collect();

        chars
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                if i < revealed || c.is_whitespace() {
                    c
                } else {
                    glyphs[rng.gen_range(0..glyphs.len())]
                }
            })
            .collect()
    }
}

/// The idle scanning sweep over all rows.
///
/// Column by column, each row's cell fades to near-invisible and back,
/// staggered per row, then the whole sweep pauses and repeats.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sweep {
    pub started: Instant,
    pub rows: usize,
}

impl Sweep {
    pub fn new(started: Instant, rows: usize) -> Self {
        Sweep { started, rows }
    }

    fn hide_show_gap(&self) -> f32 {
        self.rows as f32 * SWEEP_ROW_STAGGER * 0.5
    }

    /// Length of one cycle including the pause before the next
    pub fn cycle(&self) -> f32 {
        let last_column = SWEEP_COLUMNS.count() as f32 * SWEEP_COLUMN_STAGGER;
        let last_row = self.rows.saturating_sub(1) as f32 * SWEEP_ROW_STAGGER;
        last_column + self.hide_show_gap() + last_row + SWEEP_FADE + SWEEP_REPEAT_DELAY
    }

    pub fn opacity(&self, row: usize, column: usize, now: Instant) -> f32 {
        if !SWEEP_COLUMNS.contains(&column) || row >= self.rows {
            return 1.0;
        }

        let elapsed = now.saturating_duration_since(self.started).as_secs_f32();
        let t = elapsed % self.cycle();

        let column_start = column as f32 * SWEEP_COLUMN_STAGGER;
        let hide = column_start + row as f32 * SWEEP_ROW_STAGGER;
        let show = hide + self.hide_show_gap();

        if t < hide {
            1.0
        } else if t < show {
            interpolate(1.0, SWEEP_LOW_OPACITY, t - hide, SWEEP_FADE, Ease::InOutQuad)
        } else {
            let low = interpolate(1.0, SWEEP_LOW_OPACITY, show - hide, SWEEP_FADE, Ease::InOutQuad);
            interpolate(low, 1.0, t - show, SWEEP_FADE, Ease::InOutQuad)
        }
    }
}

/// Preview panel crossfade state
#[derive(Debug, Clone, PartialEq)]
pub struct Crossfade {
    pub image: Option<String>,
    pub opacity: Tween,
    pub scale: Tween,
}

impl Crossfade {
    pub fn hidden(now: Instant) -> Self {
        Crossfade {
            image: None,
            opacity: Tween::settled(0.0, now),
            scale: Tween::settled(1.0, now),
        }
    }

    /// Snap to a transparent, scaled-up pose and animate in.
    /// Overwrites any transition still in flight.
    pub fn show(&mut self, image: &str, now: Instant) {
        self.image = Some(image.to_string());
        self.opacity = Tween {
            from: 0.0,
            to: 1.0,
            start: now,
            duration: CROSSFADE_OPACITY,
            ease: Ease::InOutQuad,
        };
        self.scale = Tween {
            from: CROSSFADE_START_SCALE,
            to: 1.0,
            start: now,
            duration: CROSSFADE_SCALE,
            ease: Ease::OutQuad,
        };
    }

    /// Fade to transparent from wherever the opacity currently is
    pub fn hide(&mut self, now: Instant) {
        self.opacity = Tween {
            from: self.opacity.value_at(now),
            to: 0.0,
            start: now,
            duration: CROSSFADE_OPACITY,
            ease: Ease::InOutQuad,
        };
    }

    pub fn opacity_at(&self, now: Instant) -> f32 {
        self.opacity.value_at(now)
    }

    pub fn scale_at(&self, now: Instant) -> f32 {
        self.scale.value_at(now)
    }

    pub fn is_visible(&self, now: Instant) -> bool {
        self.image.is_some() && self.opacity_at(now) > 0.0
    }
}
