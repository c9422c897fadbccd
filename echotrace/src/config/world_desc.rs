use crate::error::{EchotraceError, Result};
use crate::math::{Aabb, Vec3};

/// Ray budgets for each raytracing phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RayCounts {
    /// Rays cast from the listener to estimate reverb
    pub reverb: u32,
    /// Rays cast between listener and voices to estimate occlusion
    pub occlusion: u32,
    /// Rays cast through permeable meshes
    pub permeation: u32,
    /// Bounces traced per reverb ray
    pub trail_bounces: u32,
    /// Rays cast per voice for grouped reverb
    pub voice_reverb: u32,
    /// Bounces traced per voice reverb ray
    pub voice_reverb_bounces: u32,
}

impl Default for RayCounts {
    fn default() -> Self {
        Self {
            reverb: 256,
            occlusion: 512,
            permeation: 128,
            trail_bounces: 8,
            voice_reverb: 32,
            voice_reverb_bounces: 8,
        }
    }
}

/// Configuration descriptor for an acoustic world.
///
/// Every field is forwarded verbatim into the raytracer settings when the
/// context is created, and the live setters on
/// [`AcousticWorld`](crate::AcousticWorld) forward later changes.
#[derive(Debug, Clone)]
pub struct EchotraceWorldDesc {
    /// Minimum corner of the raytraced region
    pub world_position: Vec3,
    /// Extent of the raytraced region
    pub world_size: Vec3,
    /// Whether the raytracer should draw its debug view
    pub rendering_enabled: bool,
    /// Maximum number of concurrently tracked voices
    pub max_voices: u32,
    /// Maximum number of grouped reverb zones
    pub max_grouped_zones: usize,
    pub ray_counts: RayCounts,
    /// Field of view handed to the debug render view, in radians
    pub field_of_view: f32,
    /// Responsiveness of reverb smoothing. Higher reacts faster; 8 is about 125 ms.
    pub reverb_smoothing_speed: f32,
}

impl Default for EchotraceWorldDesc {
    fn default() -> Self {
        Self {
            world_position: Vec3::new(-100.0, 0.0, -100.0),
            world_size: Vec3::new(200.0, 100.0, 200.0),
            rendering_enabled: true,
            max_voices: 8,
            max_grouped_zones: 3,
            ray_counts: RayCounts::default(),
            field_of_view: 90f32.to_radians(),
            reverb_smoothing_speed: 8.0,
        }
    }
}

impl EchotraceWorldDesc {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn world_bounds(mut self, position: Vec3, size: Vec3) -> Self {
        self.world_position = position;
        self.world_size = size;
        self
    }

    pub fn rendering_enabled(mut self, enabled: bool) -> Self {
        self.rendering_enabled = enabled;
        self
    }

    pub fn max_voices(mut self, max: u32) -> Self {
        self.max_voices = max;
        self
    }

    pub fn max_grouped_zones(mut self, max: usize) -> Self {
        self.max_grouped_zones = max;
        self
    }

    pub fn ray_counts(mut self, counts: RayCounts) -> Self {
        self.ray_counts = counts;
        self
    }

    pub fn reverb_smoothing_speed(mut self, speed: f32) -> Self {
        self.reverb_smoothing_speed = speed;
        self
    }

    /// The raytraced region as a box.
    pub fn bounds(&self) -> Aabb {
        Aabb::new(self.world_position, self.world_position + self.world_size)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.world_position.is_finite() || !self.world_size.is_finite() {
            return Err(EchotraceError::Configuration(
                "World bounds must be finite".to_string(),
            ));
        }
        if self.world_size.cmple(Vec3::ZERO).any() {
            return Err(EchotraceError::Configuration(format!(
                "World size must be positive on every axis, got {}",
                self.world_size
            )));
        }
        if self.max_voices == 0 {
            return Err(EchotraceError::Configuration(
                "max_voices must be at least 1".to_string(),
            ));
        }
        if self.max_grouped_zones == 0 {
            return Err(EchotraceError::Configuration(
                "max_grouped_zones must be at least 1".to_string(),
            ));
        }
        if !self.reverb_smoothing_speed.is_finite() || self.reverb_smoothing_speed <= 0.0 {
            return Err(EchotraceError::Configuration(format!(
                "reverb_smoothing_speed must be positive, got {}",
                self.reverb_smoothing_speed
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_desc_is_valid() {
        let desc = EchotraceWorldDesc::default();
        assert!(desc.validate().is_ok());
        assert_eq!(desc.bounds().max, Vec3::new(100.0, 100.0, 100.0));
    }

    #[test]
    fn test_rejects_degenerate_world() {
        let desc = EchotraceWorldDesc::new().world_bounds(Vec3::ZERO, Vec3::new(10.0, 0.0, 10.0));
        assert!(matches!(
            desc.validate(),
            Err(EchotraceError::Configuration(_))
        ));

        let desc = EchotraceWorldDesc::new().max_grouped_zones(0);
        assert!(desc.validate().is_err());
    }
}
