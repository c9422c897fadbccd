//! Sound emitters and how they pick up reverb and filter results.

use std::collections::BTreeMap;

use crate::acoustics::{EffectSlot, FilterGains};
use crate::audio::backend::{AudioBackend, EmitterId};
use crate::audio::effects::EffectBank;
use crate::error::{EchotraceError, Result};
use crate::math::Vec3;
use crate::scene::{AcousticRaytracer, VoiceId};

/// How an emitter is wired into the acoustic simulation.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EmitterKind {
    /// Tracked by a raytracer voice; gets per-voice occlusion and the reverb
    /// of the zone it sits in
    Raytraced,
    /// Background bed filtered by how exposed the listener is to the outside
    Ambient,
    /// Listener-relative (UI, first-person) sound with the listener's reverb
    Relative,
}

#[derive(Debug, Clone)]
pub struct Emitter {
    pub kind: EmitterKind,
    pub position: Vec3,
    voice: Option<VoiceId>,
    playing: bool,
    play_requested: bool,
    resume_pending: bool,
}

impl Emitter {
    pub fn voice(&self) -> Option<VoiceId> {
        self.voice
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Playback was asked for but is waiting on results or a device.
    pub fn is_pending(&self) -> bool {
        self.play_requested || self.resume_pending
    }
}

#[derive(Debug, Default)]
pub struct EmitterSet {
    emitters: BTreeMap<EmitterId, Emitter>,
    next_id: u64,
}

impl EmitterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an emitter, creating a raytracer voice for raytraced ones.
    pub fn attach(
        &mut self,
        kind: EmitterKind,
        position: Vec3,
        raytracer: &mut dyn AcousticRaytracer,
    ) -> Result<EmitterId> {
        let voice = match kind {
            EmitterKind::Raytraced => Some(raytracer.create_voice(position)?),
            EmitterKind::Ambient | EmitterKind::Relative => None,
        };

        let id = EmitterId(self.next_id);
        self.next_id += 1;
        self.emitters.insert(
            id,
            Emitter {
                kind,
                position,
                voice,
                playing: false,
                play_requested: false,
                resume_pending: false,
            },
        );
        log::debug!("Attached {:?} emitter {}", kind, id);
        Ok(id)
    }

    /// Stops playback and releases the emitter's voice.
    pub fn detach(
        &mut self,
        id: EmitterId,
        raytracer: &mut dyn AcousticRaytracer,
        backend: &mut dyn AudioBackend,
    ) -> Result<()> {
        let emitter = self
            .emitters
            .remove(&id)
            .ok_or(EchotraceError::UnknownEmitter(id.raw()))?;
        if let Some(voice) = emitter.voice {
            raytracer.remove_voice(voice);
        }
        if emitter.playing {
            backend.stop(id);
        }
        log::debug!("Detached emitter {}", id);
        Ok(())
    }

    pub fn set_position(
        &mut self,
        id: EmitterId,
        position: Vec3,
        raytracer: &mut dyn AcousticRaytracer,
    ) -> Result<()> {
        let emitter = self.get_mut(id)?;
        emitter.position = position;
        if let Some(voice) = emitter.voice {
            raytracer.update_voice_position(voice, position);
        }
        Ok(())
    }

    /// Asks for playback. The emitter starts on the first update where it
    /// has everything it needs (voice results, ambient gains, a device).
    pub fn request_play(&mut self, id: EmitterId) -> Result<()> {
        let emitter = self.get_mut(id)?;
        if !emitter.playing {
            emitter.play_requested = true;
        }
        Ok(())
    }

    pub fn stop(&mut self, id: EmitterId, backend: &mut dyn AudioBackend) -> Result<()> {
        let emitter = self.get_mut(id)?;
        emitter.play_requested = false;
        emitter.resume_pending = false;
        if std::mem::take(&mut emitter.playing) {
            backend.stop(id);
        }
        Ok(())
    }

    /// Routes every emitter to its current effect and filter and starts
    /// the ones whose playback is pending and now possible.
    pub fn update(
        &mut self,
        raytracer: &dyn AcousticRaytracer,
        bank: &EffectBank,
        ambient: Option<FilterGains>,
        backend: &mut dyn AudioBackend,
    ) {
        for (id, emitter) in self.emitters.iter_mut() {
            let route = match emitter.kind {
                EmitterKind::Raytraced => emitter
                    .voice
                    .and_then(|voice| raytracer.voice_result(voice))
                    .filter(|result| !result.initialising)
                    .map(|result| {
                        let slot = match result.grouped_zone {
                            Some(index) if bank.effect_for(EffectSlot::Grouped(index)).is_some() => {
                                EffectSlot::Grouped(index)
                            }
                            _ if result.uses_outside_zone => EffectSlot::Outside,
                            _ => EffectSlot::Listener,
                        };
                        let effect = bank
                            .effect_for(slot)
                            .or_else(|| bank.effect_for(EffectSlot::Listener));
                        (effect, result.filter)
                    }),
                EmitterKind::Ambient => ambient.map(|gains| (None, gains)),
                EmitterKind::Relative => {
                    Some((bank.effect_for(EffectSlot::Listener), FilterGains::UNITY))
                }
            };

            let Some((effect, filter)) = route else {
                continue;
            };
            backend.set_emitter_position(*id, emitter.position);
            backend.route_emitter(*id, effect, filter);

            if !emitter.playing && (emitter.play_requested || emitter.resume_pending) {
                match backend.play(*id) {
                    Ok(()) => {
                        if emitter.resume_pending {
                            log::info!("Resumed emitter {} after device recreation", id);
                        }
                        emitter.playing = true;
                        emitter.play_requested = false;
                        emitter.resume_pending = false;
                    }
                    Err(err) => log::warn!("Failed to start emitter {}: {}", id, err),
                }
            }
        }
    }

    /// Marks playing emitters for resumption once the device is back.
    pub fn on_device_lost(&mut self) {
        for emitter in self.emitters.values_mut() {
            if std::mem::take(&mut emitter.playing) {
                emitter.resume_pending = true;
            }
        }
    }

    /// Removes every emitter, stopping playback and releasing voices.
    pub fn clear(&mut self, raytracer: &mut dyn AcousticRaytracer, backend: &mut dyn AudioBackend) {
        for (id, emitter) in std::mem::take(&mut self.emitters) {
            if emitter.playing {
                backend.stop(id);
            }
            if let Some(voice) = emitter.voice {
                raytracer.remove_voice(voice);
            }
        }
    }

    pub fn get(&self, id: EmitterId) -> Option<&Emitter> {
        self.emitters.get(&id)
    }

    fn get_mut(&mut self, id: EmitterId) -> Result<&mut Emitter> {
        self.emitters
            .get_mut(&id)
            .ok_or(EchotraceError::UnknownEmitter(id.raw()))
    }

    pub fn len(&self) -> usize {
        self.emitters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.emitters.is_empty()
    }
}
