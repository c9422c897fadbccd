//! In-memory raytracer and audio backend that record every call.

use std::collections::{BTreeMap, HashMap, VecDeque};

use crate::acoustics::{FilterGains, ReverbEffectParams, ReverbResults};
use crate::audio::{AudioBackend, EffectId, EmitterId};
use crate::config::RayCounts;
use crate::error::{EchotraceError, Result};
use crate::math::Vec3;
use crate::scene::{
    AcousticPrimitive, AcousticRaytracer, MaterialId, MaterialProperties, PrimitiveHandle,
    RaytracerSettings, VoiceId, VoiceResult,
};

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[derive(Debug, Clone, PartialEq)]
pub enum RaytracerCall {
    AddPrimitive(PrimitiveHandle),
    UpdatePrimitive(PrimitiveHandle),
    RemovePrimitive(PrimitiveHandle),
    UpdateListener { position: Vec3, pitch: f32, yaw: f32 },
    SetRenderView { position: Vec3, field_of_view: f32 },
    Update,
    CreateVoice(VoiceId),
    UpdateVoicePosition(VoiceId, Vec3),
    RemoveVoice(VoiceId),
    UpdateWorldBounds(Vec3, Vec3),
    UpdateMaxVoices(u32),
    UpdateMaxGroupedZones(usize),
    UpdateRayCounts(RayCounts),
    Dispose,
}

#[derive(Debug, Default)]
pub struct RecordingRaytracer {
    pub calls: Vec<RaytracerCall>,
    pub primitives: HashMap<PrimitiveHandle, AcousticPrimitive>,
    pub materials: BTreeMap<MaterialId, MaterialProperties>,
    pub settings: Option<RaytracerSettings>,
    /// Handed out one per `take_reverb_results` call
    pub queued_results: VecDeque<ReverbResults>,
    voices: BTreeMap<VoiceId, VoiceResult>,
    next_voice: u64,
}

impl RecordingRaytracer {
    pub fn live_primitives(&self) -> usize {
        self.primitives.len()
    }

    pub fn live_voices(&self) -> usize {
        self.voices.len()
    }

    pub fn set_voice_result(&mut self, voice: VoiceId, result: VoiceResult) {
        self.voices.insert(voice, result);
    }

    pub fn queue_results(&mut self, results: ReverbResults) {
        self.queued_results.push_back(results);
    }
}

impl AcousticRaytracer for RecordingRaytracer {
    fn create_context(settings: &RaytracerSettings) -> Result<Self> {
        if settings.max_voices == 0 {
            return Err(EchotraceError::Raytracer("no voices".to_string()));
        }
        Ok(Self {
            materials: settings
                .materials
                .iter()
                .map(|entry| (entry.id, entry.properties))
                .collect(),
            settings: Some(settings.clone()),
            ..Default::default()
        })
    }

    fn dispose(&mut self) {
        self.primitives.clear();
        self.voices.clear();
        self.calls.push(RaytracerCall::Dispose);
    }

    fn add_primitive(&mut self, handle: PrimitiveHandle, primitive: &AcousticPrimitive) {
        self.primitives.insert(handle, primitive.clone());
        self.calls.push(RaytracerCall::AddPrimitive(handle));
    }

    fn update_primitive(&mut self, handle: PrimitiveHandle, primitive: &AcousticPrimitive) {
        self.primitives.insert(handle, primitive.clone());
        self.calls.push(RaytracerCall::UpdatePrimitive(handle));
    }

    fn remove_primitive(&mut self, handle: PrimitiveHandle) {
        self.primitives.remove(&handle);
        self.calls.push(RaytracerCall::RemovePrimitive(handle));
    }

    fn update_listener(&mut self, position: Vec3, pitch: f32, yaw: f32) {
        self.calls.push(RaytracerCall::UpdateListener {
            position,
            pitch,
            yaw,
        });
    }

    fn set_render_view(&mut self, position: Vec3, _pitch: f32, _yaw: f32, field_of_view: f32) {
        self.calls.push(RaytracerCall::SetRenderView {
            position,
            field_of_view,
        });
    }

    fn update(&mut self) {
        self.calls.push(RaytracerCall::Update);
    }

    fn take_reverb_results(&mut self) -> Option<ReverbResults> {
        self.queued_results.pop_front()
    }

    fn material_mut(&mut self, id: MaterialId) -> Option<&mut MaterialProperties> {
        Some(self.materials.entry(id).or_default())
    }

    fn create_voice(&mut self, _position: Vec3) -> Result<VoiceId> {
        let voice = VoiceId(self.next_voice);
        self.next_voice += 1;
        self.voices.insert(
            voice,
            VoiceResult {
                initialising: true,
                grouped_zone: None,
                uses_outside_zone: false,
                filter: FilterGains::UNITY,
            },
        );
        self.calls.push(RaytracerCall::CreateVoice(voice));
        Ok(voice)
    }

    fn update_voice_position(&mut self, voice: VoiceId, position: Vec3) {
        self.calls.push(RaytracerCall::UpdateVoicePosition(voice, position));
    }

    fn remove_voice(&mut self, voice: VoiceId) {
        self.voices.remove(&voice);
        self.calls.push(RaytracerCall::RemoveVoice(voice));
    }

    fn voice_result(&self, voice: VoiceId) -> Option<VoiceResult> {
        self.voices.get(&voice).copied()
    }

    fn update_world_bounds(&mut self, position: Vec3, size: Vec3) {
        self.calls.push(RaytracerCall::UpdateWorldBounds(position, size));
    }

    fn update_max_voices(&mut self, max: u32) {
        self.calls.push(RaytracerCall::UpdateMaxVoices(max));
    }

    fn update_max_grouped_zones(&mut self, max: usize) {
        self.calls.push(RaytracerCall::UpdateMaxGroupedZones(max));
    }

    fn update_ray_counts(&mut self, counts: RayCounts) {
        self.calls.push(RaytracerCall::UpdateRayCounts(counts));
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    CreateEffect(EffectId),
    UpdateEffect(EffectId),
    DeleteEffect(EffectId),
    Route(EmitterId, Option<EffectId>, FilterGains),
    Play(EmitterId),
    Stop(EmitterId),
}

#[derive(Debug, Default)]
pub struct RecordingBackend {
    pub calls: Vec<BackendCall>,
    pub effects: HashMap<EffectId, ReverbEffectParams>,
    next_effect: u64,
}

impl RecordingBackend {
    pub fn live_effects(&self) -> usize {
        self.effects.len()
    }
}

impl AudioBackend for RecordingBackend {
    fn create_reverb_effect(&mut self, params: &ReverbEffectParams) -> Result<EffectId> {
        let effect = EffectId(self.next_effect);
        self.next_effect += 1;
        self.effects.insert(effect, *params);
        self.calls.push(BackendCall::CreateEffect(effect));
        Ok(effect)
    }

    fn update_reverb_effect(&mut self, effect: EffectId, params: &ReverbEffectParams) {
        self.effects.insert(effect, *params);
        self.calls.push(BackendCall::UpdateEffect(effect));
    }

    fn delete_reverb_effect(&mut self, effect: EffectId) {
        self.effects.remove(&effect);
        self.calls.push(BackendCall::DeleteEffect(effect));
    }

    fn route_emitter(&mut self, emitter: EmitterId, effect: Option<EffectId>, filter: FilterGains) {
        self.calls.push(BackendCall::Route(emitter, effect, filter));
    }

    fn play(&mut self, emitter: EmitterId) -> Result<()> {
        self.calls.push(BackendCall::Play(emitter));
        Ok(())
    }

    fn stop(&mut self, emitter: EmitterId) {
        self.calls.push(BackendCall::Stop(emitter));
    }
}
