//! Acoustic aggregator: turns raw zone results into smoothed, panned effect
//! parameters, one state per effect slot.

use crate::acoustics::effect::{FilterGains, ReverbEffectParams, ZoneState, blend_factor};
use crate::acoustics::zone::{ReverbResults, ZoneResult};
use crate::math::{Aabb, Vec3};

/// Width of the band inside a room's boundary over which pan fades out.
pub const PAN_SMOOTH_DISTANCE: f32 = 2.5;

/// Room radius is the zone diagonal raised to this power.
pub const ROOM_RADIUS_EXPONENT: f32 = 0.77;

/// Identifies one backend reverb effect.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EffectSlot {
    Listener,
    Outside,
    Grouped(usize),
}

/// Approximate radius of a zone from its bounds.
pub fn room_radius(bounds: &Aabb) -> f32 {
    let radius = bounds.diagonal().length().powf(ROOM_RADIUS_EXPONENT);
    if radius.is_finite() { radius } else { 0.0 }
}

/// Scales a zone's pan direction by how close the listener is to the
/// zone's boundary.
///
/// Outside the room (or exactly on its radius) the direction is returned at
/// full unit strength. Within the smoothing band it fades linearly, reaching
/// zero at the band's inner edge and staying zero toward the center.
/// Degenerate input (zero or non-finite pan, a listener on the center, or a
/// zone without extent) yields zero.
pub fn attenuate_pan(pan: Vec3, center: Vec3, bounds: &Aabb, listener: Vec3) -> Vec3 {
    if pan == Vec3::ZERO || !pan.is_finite() {
        return Vec3::ZERO;
    }
    let direction = pan.normalize_or_zero();

    let distance = listener.distance(center);
    let radius = room_radius(bounds);
    if distance == 0.0 || radius <= 0.0 {
        return Vec3::ZERO;
    }
    if distance >= radius {
        return direction;
    }

    let band = PAN_SMOOTH_DISTANCE.min(radius);
    let threshold = radius - band;
    let strength = ((distance - threshold).max(0.0) / band).clamp(0.0, 1.0);

    let scaled = direction * strength;
    if scaled.is_finite() { scaled } else { Vec3::ZERO }
}

fn sanitize(pan: Vec3) -> Vec3 {
    if pan.is_finite() { pan } else { Vec3::ZERO }
}

/// Smoothed reverb state for the listener, outside and grouped zones.
///
/// States are created on the first result for their slot and dropped by
/// [`reset`](Self::reset) when the audio device goes away.
pub struct AcousticAggregator {
    speed: f32,
    max_grouped: usize,
    listener: Option<ZoneState>,
    outside: Option<ZoneState>,
    grouped: Vec<ZoneState>,
    ambient: Option<FilterGains>,
}

impl AcousticAggregator {
    pub fn new(speed: f32, max_grouped: usize) -> Self {
        Self {
            speed,
            max_grouped,
            listener: None,
            outside: None,
            grouped: Vec::new(),
            ambient: None,
        }
    }

    /// Folds one set of raytracer results into the smoothed state.
    ///
    /// `dt` is the wall-clock time in seconds since the previous update.
    /// Grouped results past the configured maximum are ignored; grouped states
    /// past the current result count are evicted.
    pub fn update(&mut self, results: &ReverbResults, listener: Vec3, dt: f32) {
        let t = blend_factor(self.speed, dt);

        self.listener
            .get_or_insert_with(ZoneState::new)
            .apply(&results.listener, sanitize(results.listener.pan), t);

        match &results.outside {
            Some(outside) => self
                .outside
                .get_or_insert_with(ZoneState::new)
                .apply(outside, sanitize(outside.pan), t),
            None => {
                if self.outside.take().is_some() {
                    log::debug!("Outside zone no longer reported, evicting its state");
                }
            }
        }

        let count = results.grouped.len().min(self.max_grouped);
        if self.grouped.len() > count {
            log::debug!(
                "Grouped zones shrank from {} to {}, evicting stale state",
                self.grouped.len(),
                count
            );
            self.grouped.truncate(count);
        }
        for (index, zone) in results.grouped.iter().take(count).enumerate() {
            if self.grouped.len() <= index {
                self.grouped.push(ZoneState::new());
            }
            let pan = attenuate_pan(zone.pan, zone.center, &zone.bounds, listener);
            self.grouped[index].apply(zone, pan, t);
        }

        self.ambient = Some(FilterGains::ambient(results.outside_percent));
    }

    /// Returns the parameters of every slot updated since the last call and
    /// clears their dirty flags.
    pub fn drain_dirty(&mut self) -> Vec<(EffectSlot, ReverbEffectParams)> {
        let mut dirty = Vec::new();
        if let Some(state) = self.listener.as_mut().filter(|s| s.is_dirty()) {
            state.take_dirty();
            dirty.push((EffectSlot::Listener, *state.params()));
        }
        if let Some(state) = self.outside.as_mut().filter(|s| s.is_dirty()) {
            state.take_dirty();
            dirty.push((EffectSlot::Outside, *state.params()));
        }
        for (index, state) in self.grouped.iter_mut().enumerate() {
            if state.take_dirty() {
                dirty.push((EffectSlot::Grouped(index), *state.params()));
            }
        }
        dirty
    }

    /// Ambient filter gains; `None` until the first result arrives.
    pub fn ambient(&self) -> Option<FilterGains> {
        self.ambient
    }

    pub fn state(&self, slot: EffectSlot) -> Option<&ZoneState> {
        match slot {
            EffectSlot::Listener => self.listener.as_ref(),
            EffectSlot::Outside => self.outside.as_ref(),
            EffectSlot::Grouped(index) => self.grouped.get(index),
        }
    }

    pub fn params(&self, slot: EffectSlot) -> Option<&ReverbEffectParams> {
        self.state(slot).map(ZoneState::params)
    }

    pub fn grouped_count(&self) -> usize {
        self.grouped.len()
    }

    pub fn max_grouped(&self) -> usize {
        self.max_grouped
    }

    /// Lowers or raises the grouped-zone cap; excess state is evicted now.
    pub fn set_max_grouped(&mut self, max: usize) {
        self.max_grouped = max;
        self.grouped.truncate(max);
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed;
    }

    /// Drops every smoothed state; the next update seeds from scratch.
    pub fn reset(&mut self) {
        self.listener = None;
        self.outside = None;
        self.grouped.clear();
        self.ambient = None;
    }
}
