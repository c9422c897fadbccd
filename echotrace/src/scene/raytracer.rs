//! Interface to the external acoustic raytracing engine.
//!
//! The engine is a black box: it receives primitives, material properties
//! and the listener pose, and periodically produces reverb results for the
//! listener zone and for grouped zones, plus per-voice occlusion filters.
//! echotrace drives it exclusively through [`AcousticRaytracer`].

use crate::acoustics::{FilterGains, ReverbResults};
use crate::config::{EchotraceWorldDesc, RayCounts};
use crate::error::Result;
use crate::math::Vec3;
use crate::scene::material::{MaterialId, MaterialProperties, MaterialResolver};
use crate::scene::primitive::{AcousticPrimitive, PrimitiveHandle};

/// Settings passed to [`AcousticRaytracer::create_context`].
#[derive(Debug, Clone)]
pub struct RaytracerSettings {
    pub world_position: Vec3,
    pub world_size: Vec3,
    pub rendering_enabled: bool,
    pub max_voices: u32,
    pub max_grouped_zones: usize,
    pub ray_counts: RayCounts,
    /// Custom material properties and debug colors, keyed by ID
    pub materials: Vec<MaterialEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialEntry {
    pub id: MaterialId,
    pub properties: MaterialProperties,
    pub debug_color: [u8; 3],
}

impl RaytracerSettings {
    pub fn from_desc(desc: &EchotraceWorldDesc, materials: &MaterialResolver) -> Self {
        Self {
            world_position: desc.world_position,
            world_size: desc.world_size,
            rendering_enabled: desc.rendering_enabled,
            max_voices: desc.max_voices,
            max_grouped_zones: desc.max_grouped_zones,
            ray_counts: desc.ray_counts,
            materials: materials
                .iter()
                .map(|m| MaterialEntry {
                    id: m.id,
                    properties: m.properties,
                    debug_color: m.debug_color,
                })
                .collect(),
        }
    }
}

/// Handle of a raytracer voice (a tracked sound source position).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VoiceId(pub u64);

impl std::fmt::Display for VoiceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "VoiceId({})", self.0)
    }
}

/// Latest raytracing result for a voice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoiceResult {
    /// True until the first raytracing pass for this voice completes
    pub initialising: bool,
    /// Grouped zone whose reverb this voice should use, if any
    pub grouped_zone: Option<usize>,
    /// Whether this voice should use the outside zone's reverb
    pub uses_outside_zone: bool,
    /// Occlusion filter between the voice and the listener
    pub filter: FilterGains,
}

/// Trait implemented by the acoustic raytracing engine binding.
///
/// All calls are synchronous request/response and happen on the thread that
/// owns the [`AcousticWorld`](crate::AcousticWorld). Whatever concurrency the
/// engine uses internally stays hidden behind these methods.
///
/// # Primitive ownership
///
/// Primitives are owned by echotrace's registry. The engine receives a
/// reference when a primitive is added and again whenever it is refreshed,
/// keyed by a [`PrimitiveHandle`] that stays stable for the primitive's
/// lifetime.
///
/// # Example
///
/// ```
/// use echotrace::acoustics::ReverbResults;
/// use echotrace::math::Vec3;
/// use echotrace::scene::{
///     AcousticPrimitive, AcousticRaytracer, MaterialId, MaterialProperties, PrimitiveHandle,
///     RaytracerSettings, VoiceId, VoiceResult,
/// };
/// use echotrace::config::RayCounts;
///
/// struct SilentEngine;
///
/// impl AcousticRaytracer for SilentEngine {
///     fn create_context(_settings: &RaytracerSettings) -> echotrace::Result<Self> {
///         Ok(SilentEngine)
///     }
///     fn dispose(&mut self) {}
///     fn add_primitive(&mut self, _handle: PrimitiveHandle, _primitive: &AcousticPrimitive) {}
///     fn update_primitive(&mut self, _handle: PrimitiveHandle, _primitive: &AcousticPrimitive) {}
///     fn remove_primitive(&mut self, _handle: PrimitiveHandle) {}
///     fn update_listener(&mut self, _position: Vec3, _pitch: f32, _yaw: f32) {}
///     fn update(&mut self) {}
///     fn take_reverb_results(&mut self) -> Option<ReverbResults> {
///         None
///     }
///     fn material_mut(&mut self, _id: MaterialId) -> Option<&mut MaterialProperties> {
///         None
///     }
///     fn create_voice(&mut self, _position: Vec3) -> echotrace::Result<VoiceId> {
///         Ok(VoiceId(0))
///     }
///     fn update_voice_position(&mut self, _voice: VoiceId, _position: Vec3) {}
///     fn remove_voice(&mut self, _voice: VoiceId) {}
///     fn voice_result(&self, _voice: VoiceId) -> Option<VoiceResult> {
///         None
///     }
///     fn update_world_bounds(&mut self, _position: Vec3, _size: Vec3) {}
///     fn update_max_voices(&mut self, _max: u32) {}
///     fn update_max_grouped_zones(&mut self, _max: usize) {}
///     fn update_ray_counts(&mut self, _counts: RayCounts) {}
/// }
/// ```
pub trait AcousticRaytracer {
    /// Creates a raytracing context from the given settings.
    fn create_context(settings: &RaytracerSettings) -> Result<Self>
    where
        Self: Sized;

    /// Releases the context. No other call is made afterwards.
    fn dispose(&mut self);

    /// Registers a new primitive under `handle`.
    fn add_primitive(&mut self, handle: PrimitiveHandle, primitive: &AcousticPrimitive);

    /// Pushes new transform/dimension values for an already registered primitive.
    fn update_primitive(&mut self, handle: PrimitiveHandle, primitive: &AcousticPrimitive);

    fn remove_primitive(&mut self, handle: PrimitiveHandle);

    fn update_listener(&mut self, position: Vec3, pitch: f32, yaw: f32);

    /// Moves the debug render view (optional).
    fn set_render_view(&mut self, _position: Vec3, _pitch: f32, _yaw: f32, _field_of_view: f32) {}

    /// Advances the engine by one frame.
    fn update(&mut self);

    /// Returns reverb results produced since the last call, if any.
    fn take_reverb_results(&mut self) -> Option<ReverbResults>;

    /// Mutable properties of a material in the live context.
    fn material_mut(&mut self, id: MaterialId) -> Option<&mut MaterialProperties>;

    fn create_voice(&mut self, position: Vec3) -> Result<VoiceId>;

    fn update_voice_position(&mut self, voice: VoiceId, position: Vec3);

    fn remove_voice(&mut self, voice: VoiceId);

    fn voice_result(&self, voice: VoiceId) -> Option<VoiceResult>;

    fn update_world_bounds(&mut self, position: Vec3, size: Vec3);

    fn update_max_voices(&mut self, max: u32);

    fn update_max_grouped_zones(&mut self, max: usize);

    fn update_ray_counts(&mut self, counts: RayCounts);
}
