//! Interface to the 3D audio backend.

use crate::acoustics::{FilterGains, ReverbEffectParams};
use crate::error::Result;
use crate::math::Vec3;

/// Backend reverb effect object.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct EffectId(pub u64);

impl std::fmt::Display for EffectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EffectId({})", self.0)
    }
}

/// Handle for an audio emitter, allocated by the acoustic world.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EmitterId(pub(crate) u64);

impl EmitterId {
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for EmitterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EmitterId({})", self.0)
    }
}

/// Audio device lifecycle notifications, sent by the backend.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DeviceEvent {
    /// Every effect object has been invalidated
    Destroyed,
    /// A new device is ready; effects must be recreated before use
    Recreated,
}

/// Trait implemented by the audio backend binding.
///
/// Effects are device-bound: after a [`DeviceEvent::Destroyed`] every
/// [`EffectId`] handed out before is dead and is never passed back.
pub trait AudioBackend {
    fn create_reverb_effect(&mut self, params: &ReverbEffectParams) -> Result<EffectId>;

    /// Applies new parameters to a live effect.
    fn update_reverb_effect(&mut self, effect: EffectId, params: &ReverbEffectParams);

    fn delete_reverb_effect(&mut self, effect: EffectId);

    /// Sets the reverb send and direct-path filter of an emitter's source.
    /// `None` means no reverb send.
    fn route_emitter(&mut self, emitter: EmitterId, effect: Option<EffectId>, filter: FilterGains);

    fn set_emitter_position(&mut self, _emitter: EmitterId, _position: Vec3) {}

    fn play(&mut self, emitter: EmitterId) -> Result<()>;

    fn stop(&mut self, emitter: EmitterId);
}
