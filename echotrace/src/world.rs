use std::time::Instant;

use crossbeam_channel::{Receiver, Sender};

use crate::acoustics::{AcousticAggregator, ReverbEffectParams};
use crate::audio::{AudioBackend, DeviceEvent, EffectBank, Emitter, EmitterId, EmitterKind, EmitterSet};
use crate::config::{EchotraceWorldDesc, RayCounts};
use crate::error::{EchotraceError, Result};
use crate::events::EchotraceEvent;
use crate::math::{Pose, Vec3};
use crate::registry::PrimitiveRegistry;
use crate::scene::{
    AcousticRaytracer, CustomMaterial, MaterialId, MaterialProperties, MaterialResolver,
    RaytracerSettings, SceneEvent, SceneGraph,
};
use crate::watcher::{SceneWatcher, SyncContext, WatcherState};

/// The acoustic context: owns the raytracer and audio backend bindings and
/// every piece of state that links them to the host scene.
///
/// `AcousticWorld` is driven entirely by the host's callbacks, all on one
/// thread:
///
/// - [`scene_loaded`](Self::scene_loaded) once the host scene is ready,
/// - [`handle_scene_event`](Self::handle_scene_event) for each structural change,
/// - [`physics_process`](Self::physics_process) every physics step (transform sync),
/// - [`process`](Self::process) every render frame (listener, reverb, emitters),
/// - [`shutdown`](Self::shutdown) when the scene goes away.
///
/// Nothing here blocks. Advisory conditions are logged and also queued as
/// [`EchotraceEvent`]s; drain them with [`poll_events`](Self::poll_events).
pub struct AcousticWorld<R: AcousticRaytracer, B: AudioBackend> {
    desc: EchotraceWorldDesc,
    raytracer: R,
    backend: B,
    resolver: MaterialResolver,
    registry: PrimitiveRegistry,
    watcher: SceneWatcher,
    aggregator: AcousticAggregator,
    effects: EffectBank,
    emitters: EmitterSet,
    listener: Pose,
    last_reverb_update: Option<Instant>,
    device_available: bool,
    disposed: bool,
    event_sender: Sender<EchotraceEvent>,
    event_receiver: Receiver<EchotraceEvent>,
    device_sender: Sender<DeviceEvent>,
    device_receiver: Receiver<DeviceEvent>,
}

impl<R: AcousticRaytracer, B: AudioBackend> AcousticWorld<R, B> {
    /// Creates the raytracer context from `desc` with the given custom
    /// materials baked into its settings.
    ///
    /// Invalid materials are rejected individually (logged and reported as
    /// [`EchotraceEvent::MaterialRejected`]); only an invalid `desc` or a
    /// failing raytracer makes this return an error.
    pub fn new(desc: EchotraceWorldDesc, materials: Vec<CustomMaterial>, backend: B) -> Result<Self> {
        desc.validate()?;

        let (event_sender, event_receiver) = crossbeam_channel::unbounded();
        let (device_sender, device_receiver) = crossbeam_channel::unbounded();

        let mut resolver = MaterialResolver::new(event_sender.clone());
        for material in materials {
            let result = resolver.register(material.clone());
            Self::report_registration(&event_sender, &material, &result);
        }

        let settings = RaytracerSettings::from_desc(&desc, &resolver);
        let raytracer = R::create_context(&settings)?;
        log::info!(
            "Acoustic world created: {} custom materials, {} voices, {} grouped zones",
            settings.materials.len(),
            desc.max_voices,
            desc.max_grouped_zones
        );

        Ok(Self {
            aggregator: AcousticAggregator::new(desc.reverb_smoothing_speed, desc.max_grouped_zones),
            registry: PrimitiveRegistry::new(event_sender.clone()),
            desc,
            raytracer,
            backend,
            resolver,
            watcher: SceneWatcher::new(),
            effects: EffectBank::new(),
            emitters: EmitterSet::new(),
            listener: Pose::identity(),
            last_reverb_update: None,
            device_available: true,
            disposed: false,
            event_sender,
            event_receiver,
            device_sender,
            device_receiver,
        })
    }

    fn report_registration(
        events: &Sender<EchotraceEvent>,
        material: &CustomMaterial,
        result: &Result<()>,
    ) {
        let event = match result {
            Ok(()) => EchotraceEvent::MaterialRegistered {
                id: material.id,
                name: material.name.clone(),
            },
            Err(err) => {
                log::warn!("Rejected custom material '{}': {}", material.name, err);
                EchotraceEvent::MaterialRejected {
                    name: material.name.clone(),
                    reason: err.to_string(),
                }
            }
        };
        let _ = events.send(event);
    }

    fn sync_context(&mut self) -> SyncContext<'_> {
        SyncContext {
            resolver: &self.resolver,
            registry: &mut self.registry,
            raytracer: &mut self.raytracer,
            world_bounds: self.desc.bounds(),
        }
    }

    /// Registers a custom material with the live context.
    ///
    /// Prior registrations are left untouched on failure.
    pub fn register_material(&mut self, material: CustomMaterial) -> Result<()> {
        let result = self.resolver.register(material.clone());
        Self::report_registration(&self.event_sender, &material, &result);
        result?;

        if let Some(properties) = self.raytracer.material_mut(material.id) {
            *properties = material.properties;
        }
        Ok(())
    }

    /// Editable properties of a registered custom material. Changes reach the
    /// raytracer on the next [`process`](Self::process).
    pub fn material_mut(&mut self, id: MaterialId) -> Option<&mut MaterialProperties> {
        self.resolver.get_mut(id).map(|m| &mut m.properties)
    }

    fn apply_material_updates(&mut self) {
        for material in self.resolver.iter() {
            if let Some(properties) = self.raytracer.material_mut(material.id) {
                *properties = material.properties;
            }
        }
    }

    /// Host scene finished loading: mirror it and start watching it.
    pub fn scene_loaded(&mut self, scene: &dyn SceneGraph) -> usize {
        if self.disposed {
            log::warn!("scene_loaded called after shutdown");
            return 0;
        }
        let mut watcher = std::mem::take(&mut self.watcher);
        let created = watcher.start(scene, self.sync_context());
        self.watcher = watcher;
        created
    }

    pub fn handle_scene_event(&mut self, scene: &dyn SceneGraph, event: SceneEvent) {
        let mut watcher = std::mem::take(&mut self.watcher);
        watcher.handle_event(scene, event, self.sync_context());
        self.watcher = watcher;
    }

    /// Physics-step callback: pushes current transforms of every live
    /// primitive. Returns the number of primitives updated.
    pub fn physics_process(&mut self, scene: &dyn SceneGraph) -> usize {
        let watcher = std::mem::take(&mut self.watcher);
        let updated = watcher.refresh(scene, self.sync_context());
        self.watcher = watcher;
        updated
    }

    /// Render-frame callback.
    pub fn process(&mut self, listener: Pose) {
        self.process_at(listener, Instant::now());
    }

    /// [`process`](Self::process) with an explicit frame time, which drives
    /// the reverb smoothing.
    pub fn process_at(&mut self, listener: Pose, now: Instant) {
        if self.disposed {
            return;
        }
        self.drain_device_events();

        self.listener = listener;
        let (pitch, yaw) = (listener.pitch(), listener.yaw());
        self.raytracer.update_listener(listener.position, pitch, yaw);
        self.raytracer
            .set_render_view(listener.position, pitch, yaw, self.desc.field_of_view);

        self.apply_material_updates();
        self.raytracer.update();

        if let Some(results) = self.raytracer.take_reverb_results() {
            let dt = self
                .last_reverb_update
                .map(|last| now.saturating_duration_since(last).as_secs_f32())
                .unwrap_or(0.0);
            self.last_reverb_update = Some(now);
            self.aggregator.update(&results, listener.position, dt);
        }

        if !self.device_available {
            return;
        }
        self.effects.sync(&mut self.aggregator, &mut self.backend);
        self.emitters.update(
            &self.raytracer,
            &self.effects,
            self.aggregator.ambient(),
            &mut self.backend,
        );
    }

    fn drain_device_events(&mut self) {
        while let Ok(event) = self.device_receiver.try_recv() {
            match event {
                DeviceEvent::Destroyed => {
                    if !self.device_available {
                        continue;
                    }
                    log::warn!("Audio device destroyed, dropping reverb effects");
                    self.device_available = false;
                    self.effects.invalidate();
                    self.aggregator.reset();
                    self.last_reverb_update = None;
                    self.emitters.on_device_lost();
                    let _ = self.event_sender.send(EchotraceEvent::DeviceLost);
                }
                DeviceEvent::Recreated => {
                    log::info!("Audio device recreated");
                    self.device_available = true;
                    if let Err(err) = self
                        .effects
                        .recreate_listener(&ReverbEffectParams::default(), &mut self.backend)
                    {
                        log::error!("Failed to recreate listener reverb effect: {}", err);
                    }
                    let _ = self.event_sender.send(EchotraceEvent::DeviceRecreated);
                }
            }
        }
    }

    /// Stops watching `scene`, releases every emitter, effect and primitive,
    /// then disposes the raytracer context. Later callbacks are ignored.
    pub fn shutdown(&mut self, scene: &dyn SceneGraph) {
        if self.disposed {
            return;
        }
        self.watcher.stop(scene, &mut self.registry);
        self.registry.clear();
        self.emitters.clear(&mut self.raytracer, &mut self.backend);
        if self.device_available {
            self.effects.release(&mut self.backend);
        } else {
            self.effects.invalidate();
        }
        self.aggregator.reset();
        self.raytracer.dispose();
        self.disposed = true;
        log::info!("Acoustic world shut down");
    }

    pub fn set_world_bounds(&mut self, position: Vec3, size: Vec3) -> Result<()> {
        if !size.is_finite() || size.cmple(Vec3::ZERO).any() || !position.is_finite() {
            return Err(EchotraceError::Configuration(format!(
                "invalid world bounds: position {}, size {}",
                position, size
            )));
        }
        self.desc.world_position = position;
        self.desc.world_size = size;
        self.raytracer.update_world_bounds(position, size);
        Ok(())
    }

    pub fn set_max_voices(&mut self, max: u32) -> Result<()> {
        if max == 0 {
            return Err(EchotraceError::Configuration(
                "max_voices must be at least 1".to_string(),
            ));
        }
        self.desc.max_voices = max;
        self.raytracer.update_max_voices(max);
        Ok(())
    }

    /// Changes the grouped-zone cap. Smoothed state and effects above the new
    /// cap are dropped.
    pub fn set_max_grouped_zones(&mut self, max: usize) -> Result<()> {
        if max == 0 {
            return Err(EchotraceError::Configuration(
                "max_grouped_zones must be at least 1".to_string(),
            ));
        }
        self.desc.max_grouped_zones = max;
        self.aggregator.set_max_grouped(max);
        self.raytracer.update_max_grouped_zones(max);
        Ok(())
    }

    /// Changes how quickly smoothed reverb follows new results.
    pub fn set_reverb_smoothing_speed(&mut self, speed: f32) -> Result<()> {
        if !speed.is_finite() || speed <= 0.0 {
            return Err(EchotraceError::Configuration(format!(
                "reverb_smoothing_speed must be positive, got {}",
                speed
            )));
        }
        self.desc.reverb_smoothing_speed = speed;
        self.aggregator.set_speed(speed);
        Ok(())
    }

    pub fn set_ray_counts(&mut self, counts: RayCounts) {
        self.desc.ray_counts = counts;
        self.raytracer.update_ray_counts(counts);
    }

    pub fn attach_emitter(&mut self, kind: EmitterKind, position: Vec3) -> Result<EmitterId> {
        self.emitters.attach(kind, position, &mut self.raytracer)
    }

    pub fn detach_emitter(&mut self, id: EmitterId) -> Result<()> {
        self.emitters
            .detach(id, &mut self.raytracer, &mut self.backend)
    }

    pub fn set_emitter_position(&mut self, id: EmitterId, position: Vec3) -> Result<()> {
        self.emitters
            .set_position(id, position, &mut self.raytracer)
    }

    /// Requests playback; the emitter starts once its results are ready.
    pub fn play_emitter(&mut self, id: EmitterId) -> Result<()> {
        self.emitters.request_play(id)
    }

    pub fn stop_emitter(&mut self, id: EmitterId) -> Result<()> {
        self.emitters.stop(id, &mut self.backend)
    }

    pub fn emitter(&self, id: EmitterId) -> Option<&Emitter> {
        self.emitters.get(id)
    }

    /// Drains every event reported since the last call.
    pub fn poll_events(&mut self) -> Vec<EchotraceEvent> {
        self.event_receiver.try_iter().collect()
    }

    /// Sender the audio backend uses to report device loss and recreation.
    pub fn device_events(&self) -> Sender<DeviceEvent> {
        self.device_sender.clone()
    }

    pub fn desc(&self) -> &EchotraceWorldDesc {
        &self.desc
    }

    pub fn listener(&self) -> Pose {
        self.listener
    }

    pub fn watcher_state(&self) -> WatcherState {
        self.watcher.state()
    }

    pub fn is_device_available(&self) -> bool {
        self.device_available
    }

    pub fn resolver(&self) -> &MaterialResolver {
        &self.resolver
    }

    pub fn registry(&self) -> &PrimitiveRegistry {
        &self.registry
    }

    pub fn aggregator(&self) -> &AcousticAggregator {
        &self.aggregator
    }

    pub fn effects(&self) -> &EffectBank {
        &self.effects
    }

    pub fn raytracer(&self) -> &R {
        &self.raytracer
    }

    pub fn raytracer_mut(&mut self) -> &mut R {
        &mut self.raytracer
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }
}
