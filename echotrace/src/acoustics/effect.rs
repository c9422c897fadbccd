//! Smoothed effect parameters ready for the audio backend.

use crate::acoustics::zone::{ReverbParams, ZoneResult};
use crate::math::Vec3;

/// Below this exposure the ambient filter ramps down.
const AMBIENT_FULL_CLARITY: f32 = 0.4;
const AMBIENT_GAIN_FLOOR: f32 = 0.3;
const AMBIENT_HF_EXPONENT: f32 = 1.5;

/// Low-pass style filter gains (broadband and high-frequency).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterGains {
    pub gain: f32,
    pub gain_hf: f32,
}

impl FilterGains {
    pub const UNITY: Self = Self {
        gain: 1.0,
        gain_hf: 1.0,
    };

    pub const fn new(gain: f32, gain_hf: f32) -> Self {
        Self { gain, gain_hf }
    }

    /// Gains for ambient sources given how exposed the listener is to the
    /// outside. High frequencies fall off faster than the broadband gain.
    pub fn ambient(outside_percent: f32) -> Self {
        let clarity = if outside_percent.is_finite() {
            (outside_percent / AMBIENT_FULL_CLARITY).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let gain = AMBIENT_GAIN_FLOOR + clarity * (1.0 - AMBIENT_GAIN_FLOOR);
        Self {
            gain,
            gain_hf: gain.powf(AMBIENT_HF_EXPONENT),
        }
    }
}

impl Default for FilterGains {
    fn default() -> Self {
        Self::UNITY
    }
}

/// Parameters pushed into one backend reverb effect.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ReverbEffectParams {
    pub reverb: ReverbParams,
    pub reflections_pan: Vec3,
    pub late_reverb_pan: Vec3,
}

/// Exponential smoothing factor for a frame of `dt` seconds.
pub fn blend_factor(speed: f32, dt: f32) -> f32 {
    let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
    1.0 - (-speed * dt).exp()
}

/// Persistent smoothed state of one zone.
#[derive(Debug, Clone, Default)]
pub struct ZoneState {
    params: ReverbEffectParams,
    seeded: bool,
    dirty: bool,
}

impl ZoneState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Blends toward `target` by `t`; the first application snaps.
    pub fn apply(&mut self, target: &ZoneResult, pan: Vec3, t: f32) {
        let t = if self.seeded { t.clamp(0.0, 1.0) } else { 1.0 };

        self.params.reverb.blend_toward(&target.reverb, t);
        // Reflections and late reverb share one direction for now
        self.params.reflections_pan += (pan - self.params.reflections_pan) * t;
        self.params.late_reverb_pan += (pan - self.params.late_reverb_pan) * t;

        self.seeded = true;
        self.dirty = true;
    }

    pub fn params(&self) -> &ReverbEffectParams {
        &self.params
    }

    pub fn is_seeded(&self) -> bool {
        self.seeded
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Clears the dirty flag, returning whether it was set.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }
}
