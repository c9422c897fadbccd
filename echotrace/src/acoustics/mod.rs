//! Reverb result aggregation: per-zone smoothing and pan attenuation.

pub mod aggregator;
pub mod effect;
pub mod zone;

pub use aggregator::{AcousticAggregator, EffectSlot, attenuate_pan, room_radius};
pub use effect::{FilterGains, ReverbEffectParams, ZoneState, blend_factor};
pub use zone::{ReverbParams, ReverbResults, ZoneResult};
