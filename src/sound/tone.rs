//! Synthesized gong used when no cue file is available.
//!
//! A struck bowl is approximated by three inharmonic partials under a
//! short attack and an exponential decay. Being generated rather than
//! decoded, it can never fail to load.

use std::f32::consts::TAU;
use std::time::Duration;

use rodio::Source;

/// Output sample rate of the synthesized gong.
pub const GONG_SAMPLE_RATE: u32 = 44_100;

/// Length of the synthesized gong.
pub const GONG_DURATION: Duration = Duration::from_secs(4);

const FUNDAMENTAL_HZ: f32 = 196.0;

/// (frequency ratio, gain) of each partial.
const PARTIALS: &[(f32, f32)] = &[(1.0, 0.55), (2.76, 0.25), (5.40, 0.12)];

const ATTACK_SECONDS: f32 = 0.005;
const DECAY_SECONDS: f32 = 1.2;

/// A mono, decaying bowl tone.
#[derive(Debug, Clone)]
pub struct GongTone {
    index: u32,
    total: u32,
}

impl GongTone {
    #[must_use]
    pub fn new() -> Self {
        Self {
            index: 0,
            total: GONG_SAMPLE_RATE * GONG_DURATION.as_secs() as u32,
        }
    }

    /// Returns the total number of samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.total as usize
    }

    /// Always false; the tone has a fixed, non-zero length.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Computes the sample at `index`.
    #[must_use]
    pub fn sample_at(index: u32) -> f32 {
        let t = index as f32 / GONG_SAMPLE_RATE as f32;
        let envelope = (t / ATTACK_SECONDS).min(1.0) * (-t / DECAY_SECONDS).exp();
        let wave: f32 = PARTIALS
            .iter()
            .map(|(ratio, gain)| gain * (TAU * FUNDAMENTAL_HZ * ratio * t).sin())
            .sum();
        wave * envelope
    }
}

impl Default for GongTone {
    fn default() -> Self {
        Self::new()
    }
}

impl Iterator for GongTone {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        if self.index >= self.total {
            return None;
        }
        let sample = Self::sample_at(self.index);
        self.index += 1;
        Some(sample)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.total - self.index) as usize;
        (remaining, Some(remaining))
    }
}

impl Source for GongTone {
    fn current_frame_len(&self) -> Option<usize> {
        Some((self.total - self.index) as usize)
    }

    fn channels(&self) -> u16 {
        1
    }

    fn sample_rate(&self) -> u32 {
        GONG_SAMPLE_RATE
    }

    fn total_duration(&self) -> Option<Duration> {
        Some(GONG_DURATION)
    }
}
