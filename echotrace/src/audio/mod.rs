//! Audio backend boundary: reverb effects, emitters and device lifecycle.

pub mod backend;
pub mod effects;
pub mod emitter;

pub use backend::{AudioBackend, DeviceEvent, EffectId, EmitterId};
pub use effects::EffectBank;
pub use emitter::{Emitter, EmitterKind, EmitterSet};
