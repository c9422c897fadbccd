//! Raw per-zone reverb results as produced by the raytracer.

use crate::math::{Aabb, Vec3};

/// EAX-style reverb parameters, in the units the audio backend expects.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReverbParams {
    pub density: f32,
    pub diffusion: f32,
    pub gain: f32,
    pub gain_lf: f32,
    pub gain_hf: f32,
    pub decay_time: f32,
    pub decay_lf_ratio: f32,
    pub decay_hf_ratio: f32,
    pub reflections_gain: f32,
    pub reflections_delay: f32,
    pub late_reverb_gain: f32,
    pub late_reverb_delay: f32,
    pub echo_time: f32,
    pub echo_depth: f32,
    pub modulation_time: f32,
    pub modulation_depth: f32,
    pub air_absorption_gain_hf: f32,
    pub hf_reference: f32,
    pub lf_reference: f32,
    pub room_rolloff_factor: f32,
    /// Not blended; copied from the latest result
    pub decay_hf_limit: bool,
}

impl ReverbParams {
    pub const SCALAR_COUNT: usize = 20;

    /// Every blendable parameter, in declaration order.
    pub fn scalars(&self) -> [f32; Self::SCALAR_COUNT] {
        [
            self.density,
            self.diffusion,
            self.gain,
            self.gain_lf,
            self.gain_hf,
            self.decay_time,
            self.decay_lf_ratio,
            self.decay_hf_ratio,
            self.reflections_gain,
            self.reflections_delay,
            self.late_reverb_gain,
            self.late_reverb_delay,
            self.echo_time,
            self.echo_depth,
            self.modulation_time,
            self.modulation_depth,
            self.air_absorption_gain_hf,
            self.hf_reference,
            self.lf_reference,
            self.room_rolloff_factor,
        ]
    }

    fn scalars_mut(&mut self) -> [&mut f32; Self::SCALAR_COUNT] {
        [
            &mut self.density,
            &mut self.diffusion,
            &mut self.gain,
            &mut self.gain_lf,
            &mut self.gain_hf,
            &mut self.decay_time,
            &mut self.decay_lf_ratio,
            &mut self.decay_hf_ratio,
            &mut self.reflections_gain,
            &mut self.reflections_delay,
            &mut self.late_reverb_gain,
            &mut self.late_reverb_delay,
            &mut self.echo_time,
            &mut self.echo_depth,
            &mut self.modulation_time,
            &mut self.modulation_depth,
            &mut self.air_absorption_gain_hf,
            &mut self.hf_reference,
            &mut self.lf_reference,
            &mut self.room_rolloff_factor,
        ]
    }

    /// Moves every scalar a fraction `t` of the way toward `target`.
    pub fn blend_toward(&mut self, target: &ReverbParams, t: f32) {
        let targets = target.scalars();
        for (current, goal) in self.scalars_mut().into_iter().zip(targets) {
            *current += (goal - *current) * t;
        }
        self.decay_hf_limit = target.decay_hf_limit;
    }
}

impl Default for ReverbParams {
    /// EFX reverb defaults (a generic room).
    fn default() -> Self {
        Self {
            density: 1.0,
            diffusion: 1.0,
            gain: 0.32,
            gain_lf: 1.0,
            gain_hf: 0.89,
            decay_time: 1.49,
            decay_lf_ratio: 1.0,
            decay_hf_ratio: 0.83,
            reflections_gain: 0.05,
            reflections_delay: 0.007,
            late_reverb_gain: 1.26,
            late_reverb_delay: 0.011,
            echo_time: 0.25,
            echo_depth: 0.0,
            modulation_time: 0.25,
            modulation_depth: 0.0,
            air_absorption_gain_hf: 0.994,
            hf_reference: 5000.0,
            lf_reference: 250.0,
            room_rolloff_factor: 0.0,
            decay_hf_limit: true,
        }
    }
}

/// One zone's result for one raytracer update.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ZoneResult {
    pub reverb: ReverbParams,
    /// Direction the zone's reverb arrives from; zero for no directionality
    pub pan: Vec3,
    pub center: Vec3,
    pub bounds: Aabb,
}

/// Everything the raytracer produced in one update.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReverbResults {
    pub listener: ZoneResult,
    pub outside: Option<ZoneResult>,
    pub grouped: Vec<ZoneResult>,
    /// Fraction of listener rays that escaped to the outside, in [0, 1]
    pub outside_percent: f32,
}
