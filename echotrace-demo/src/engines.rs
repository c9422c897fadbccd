//! Stand-ins for the raytracer and the audio backend so the demo runs
//! headless.

use std::collections::{BTreeMap, HashMap};

use echotrace::acoustics::{FilterGains, ReverbEffectParams, ReverbParams, ReverbResults, ZoneResult};
use echotrace::audio::{AudioBackend, EffectId, EmitterId};
use echotrace::math::{Aabb, Vec3};
use echotrace::scene::{
    AcousticPrimitive, AcousticRaytracer, MaterialId, MaterialProperties, PrimitiveHandle,
    PrimitiveShape, RaytracerSettings, VoiceId, VoiceResult,
};
use echotrace::{EchotraceError, RayCounts, Result};

/// Frames between two simulated raytracing passes.
const PASS_INTERVAL: u64 = 4;

struct SimulatedVoice {
    position: Vec3,
    passes: u32,
}

/// Fakes reverb results from primitive placement: the hull of all primitive
/// origins is the listener's room and every prism is a grouped zone.
pub struct SimulatedRaytracer {
    primitives: HashMap<PrimitiveHandle, AcousticPrimitive>,
    materials: BTreeMap<MaterialId, MaterialProperties>,
    voices: BTreeMap<VoiceId, SimulatedVoice>,
    next_voice: u64,
    listener: Vec3,
    frame: u64,
    max_voices: u32,
    max_grouped_zones: usize,
    ready: Option<ReverbResults>,
}

impl SimulatedRaytracer {
    fn enclosure(&self) -> Option<Aabb> {
        let mut origins = self
            .primitives
            .values()
            .filter(|p| !matches!(p.shape, PrimitiveShape::Plane { .. }))
            .map(|p| Vec3::from(p.shape.transform().translation));
        let first = origins.next()?;
        let mut bounds = Aabb::from_point(first);
        origins.for_each(|origin| bounds.extend(origin));
        Some(bounds)
    }

    fn trace(&self) -> ReverbResults {
        let enclosure = self.enclosure().unwrap_or_default();
        let inside = enclosure.contains(self.listener);
        let size = enclosure.diagonal().length();

        let listener = ZoneResult {
            reverb: ReverbParams {
                decay_time: 0.3 + size * 0.05,
                late_reverb_gain: if inside { 1.26 } else { 0.4 },
                ..Default::default()
            },
            pan: Vec3::ZERO,
            center: enclosure.center(),
            bounds: enclosure,
        };

        let mut prisms: Vec<_> = self
            .primitives
            .iter()
            .filter_map(|(handle, p)| match p.shape {
                PrimitiveShape::Prism { size, transform } => Some((*handle, size, transform)),
                _ => None,
            })
            .collect();
        prisms.sort_by_key(|(handle, _, _)| *handle);

        let grouped = prisms
            .into_iter()
            .take(self.max_grouped_zones)
            .map(|(_, size, transform)| {
                let center = Vec3::from(transform.translation);
                ZoneResult {
                    reverb: ReverbParams {
                        decay_time: 0.2 + size.length() * 0.1,
                        ..Default::default()
                    },
                    pan: center - self.listener,
                    center,
                    bounds: Aabb::new(center - size * 0.5, center + size * 0.5),
                }
            })
            .collect();

        ReverbResults {
            listener,
            outside: (!inside).then(|| ZoneResult {
                reverb: ReverbParams {
                    decay_time: 0.5,
                    ..Default::default()
                },
                ..Default::default()
            }),
            grouped,
            outside_percent: if inside { 0.05 } else { 0.8 },
        }
    }
}

impl AcousticRaytracer for SimulatedRaytracer {
    fn create_context(settings: &RaytracerSettings) -> Result<Self> {
        if settings.world_size.min_element() <= 0.0 {
            return Err(EchotraceError::Raytracer("empty world".to_string()));
        }
        log::info!(
            "Simulated raytracer: world {} at {}, {} custom materials",
            settings.world_size,
            settings.world_position,
            settings.materials.len()
        );
        Ok(Self {
            primitives: HashMap::new(),
            materials: settings
                .materials
                .iter()
                .map(|m| (m.id, m.properties))
                .collect(),
            voices: BTreeMap::new(),
            next_voice: 0,
            listener: Vec3::ZERO,
            frame: 0,
            max_voices: settings.max_voices,
            max_grouped_zones: settings.max_grouped_zones,
            ready: None,
        })
    }

    fn dispose(&mut self) {
        log::info!(
            "Simulated raytracer disposed with {} primitives still registered",
            self.primitives.len()
        );
        self.primitives.clear();
        self.voices.clear();
    }

    fn add_primitive(&mut self, handle: PrimitiveHandle, primitive: &AcousticPrimitive) {
        self.primitives.insert(handle, primitive.clone());
    }

    fn update_primitive(&mut self, handle: PrimitiveHandle, primitive: &AcousticPrimitive) {
        self.primitives.insert(handle, primitive.clone());
    }

    fn remove_primitive(&mut self, handle: PrimitiveHandle) {
        self.primitives.remove(&handle);
    }

    fn update_listener(&mut self, position: Vec3, _pitch: f32, _yaw: f32) {
        self.listener = position;
    }

    fn update(&mut self) {
        self.frame += 1;
        if self.frame % PASS_INTERVAL == 0 {
            for voice in self.voices.values_mut() {
                voice.passes += 1;
            }
            self.ready = Some(self.trace());
        }
    }

    fn take_reverb_results(&mut self) -> Option<ReverbResults> {
        self.ready.take()
    }

    fn material_mut(&mut self, id: MaterialId) -> Option<&mut MaterialProperties> {
        Some(self.materials.entry(id).or_default())
    }

    fn create_voice(&mut self, position: Vec3) -> Result<VoiceId> {
        if self.voices.len() >= self.max_voices as usize {
            return Err(EchotraceError::Raytracer(format!(
                "all {} voices in use",
                self.max_voices
            )));
        }
        let voice = VoiceId(self.next_voice);
        self.next_voice += 1;
        self.voices.insert(voice, SimulatedVoice { position, passes: 0 });
        Ok(voice)
    }

    fn update_voice_position(&mut self, voice: VoiceId, position: Vec3) {
        if let Some(v) = self.voices.get_mut(&voice) {
            v.position = position;
        }
    }

    fn remove_voice(&mut self, voice: VoiceId) {
        self.voices.remove(&voice);
    }

    fn voice_result(&self, voice: VoiceId) -> Option<VoiceResult> {
        let v = self.voices.get(&voice)?;
        let distance = v.position.distance(self.listener);
        let gain = 1.0 / (1.0 + distance * 0.1);
        let inside = self.enclosure().is_some_and(|e| e.contains(v.position));
        Some(VoiceResult {
            initialising: v.passes < 2,
            grouped_zone: None,
            uses_outside_zone: !inside,
            filter: FilterGains::new(gain, gain * gain),
        })
    }

    fn update_world_bounds(&mut self, position: Vec3, size: Vec3) {
        log::info!("World bounds now {} + {}", position, size);
    }

    fn update_max_voices(&mut self, max: u32) {
        self.max_voices = max;
    }

    fn update_max_grouped_zones(&mut self, max: usize) {
        self.max_grouped_zones = max;
    }

    fn update_ray_counts(&mut self, counts: RayCounts) {
        log::info!("Ray counts now {:?}", counts);
    }
}

/// Audio backend that only logs what it is asked to do.
#[derive(Default)]
pub struct LoggingBackend {
    effects: HashMap<EffectId, ReverbEffectParams>,
    next_effect: u64,
    playing: BTreeMap<EmitterId, (Option<EffectId>, FilterGains)>,
}

impl LoggingBackend {
    pub fn live_effects(&self) -> usize {
        self.effects.len()
    }

    pub fn playing(&self) -> usize {
        self.playing.len()
    }

    /// Drops everything the device owned, as a real device loss would.
    pub fn lose_device(&mut self) {
        self.effects.clear();
        self.playing.clear();
    }
}

impl AudioBackend for LoggingBackend {
    fn create_reverb_effect(&mut self, params: &ReverbEffectParams) -> Result<EffectId> {
        let effect = EffectId(self.next_effect);
        self.next_effect += 1;
        self.effects.insert(effect, *params);
        log::info!(
            "backend: created {} (decay {:.2}s)",
            effect,
            params.reverb.decay_time
        );
        Ok(effect)
    }

    fn update_reverb_effect(&mut self, effect: EffectId, params: &ReverbEffectParams) {
        log::trace!("backend: {} decay {:.2}s", effect, params.reverb.decay_time);
        self.effects.insert(effect, *params);
    }

    fn delete_reverb_effect(&mut self, effect: EffectId) {
        self.effects.remove(&effect);
        log::info!("backend: deleted {}", effect);
    }

    fn route_emitter(&mut self, emitter: EmitterId, effect: Option<EffectId>, filter: FilterGains) {
        if let Some(route) = self.playing.get_mut(&emitter) {
            *route = (effect, filter);
        }
    }

    fn play(&mut self, emitter: EmitterId) -> Result<()> {
        log::info!("backend: play {}", emitter);
        self.playing.insert(emitter, (None, FilterGains::UNITY));
        Ok(())
    }

    fn stop(&mut self, emitter: EmitterId) {
        log::info!("backend: stop {}", emitter);
        self.playing.remove(&emitter);
    }
}
