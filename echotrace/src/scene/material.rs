//! Acoustic materials and per-node material resolution.
//!
//! Material IDs below [`MaterialId::CUSTOM_MIN`] belong to the raytracer's
//! built-in palette. Anything from 1000 upwards is user-defined and must be
//! registered with a [`MaterialResolver`] before nodes can refer to it.

use crate::error::{EchotraceError, Result};
use crate::events::{EchotraceEvent, EventSender};
use crate::scene::graph::{NodeId, SceneGraph};
use std::collections::BTreeMap;

/// Material identifier understood by the raytracer.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaterialId(pub u32);

impl MaterialId {
    pub const AIR: Self = Self(0);
    pub const BRICK: Self = Self(1);
    pub const CLOTH: Self = Self(2);
    pub const CONCRETE: Self = Self(3);
    pub const CONCRETE_POLISHED: Self = Self(4);
    pub const DIRT: Self = Self(5);
    pub const GRASS: Self = Self(6);
    pub const ICE: Self = Self(7);
    pub const LEAF: Self = Self(8);
    pub const MARBLE: Self = Self(9);
    pub const METAL: Self = Self(10);
    pub const MUD: Self = Self(11);
    pub const ROCK: Self = Self(12);
    pub const SAND: Self = Self(13);
    pub const SNOW: Self = Self(14);
    pub const TREE: Self = Self(15);
    pub const WOOD_INDOOR: Self = Self(16);
    pub const WOOD_OUTDOOR: Self = Self(17);

    /// First ID available to user-defined materials.
    pub const CUSTOM_MIN: u32 = 1000;

    pub fn is_air(self) -> bool {
        self == Self::AIR
    }

    pub fn is_custom(self) -> bool {
        self.0 >= Self::CUSTOM_MIN
    }

    pub fn is_builtin(self) -> bool {
        BUILTIN_MATERIALS.iter().any(|(_, id)| *id == self)
    }
}

impl std::fmt::Display for MaterialId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MaterialId({})", self.0)
    }
}

/// Built-in material names, matched case-insensitively.
pub const BUILTIN_MATERIALS: &[(&str, MaterialId)] = &[
    ("air", MaterialId::AIR),
    ("brick", MaterialId::BRICK),
    ("cloth", MaterialId::CLOTH),
    ("concrete", MaterialId::CONCRETE),
    ("concretepolished", MaterialId::CONCRETE_POLISHED),
    ("dirt", MaterialId::DIRT),
    ("grass", MaterialId::GRASS),
    ("ice", MaterialId::ICE),
    ("leaf", MaterialId::LEAF),
    ("marble", MaterialId::MARBLE),
    ("metal", MaterialId::METAL),
    ("mud", MaterialId::MUD),
    ("rock", MaterialId::ROCK),
    ("sand", MaterialId::SAND),
    ("snow", MaterialId::SNOW),
    ("tree", MaterialId::TREE),
    ("woodindoor", MaterialId::WOOD_INDOOR),
    ("woodoutdoor", MaterialId::WOOD_OUTDOOR),
];

/// Look up a built-in material by name.
pub fn builtin_material(name: &str) -> Option<MaterialId> {
    let name = name.trim();
    BUILTIN_MATERIALS
        .iter()
        .find(|(builtin, _)| builtin.eq_ignore_ascii_case(name))
        .map(|(_, id)| *id)
}

/// Acoustic properties of a surface, split into low and high frequency bands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialProperties {
    /// Fraction of energy absorbed on reflection (0.0 - 1.0)
    pub absorption_lf: f32,
    pub absorption_hf: f32,

    /// Fraction of reflected energy scattered diffusely (0.0 - 1.0)
    pub scattering_lf: f32,
    pub scattering_hf: f32,

    /// Attenuation of transmitted sound, in dB per meter (>= 0.0)
    pub transmission_lf: f32,
    pub transmission_hf: f32,
}

impl MaterialProperties {
    pub const fn new(
        absorption_lf: f32,
        absorption_hf: f32,
        scattering_lf: f32,
        scattering_hf: f32,
        transmission_lf: f32,
        transmission_hf: f32,
    ) -> Self {
        Self {
            absorption_lf,
            absorption_hf,
            scattering_lf,
            scattering_hf,
            transmission_lf,
            transmission_hf,
        }
    }

    /// Validates that all properties are within their valid ranges
    pub fn validate(&self) -> std::result::Result<(), &'static str> {
        for val in [self.absorption_lf, self.absorption_hf] {
            if !(0.0..=1.0).contains(&val) {
                return Err("Absorption values must be between 0.0 and 1.0");
            }
        }

        for val in [self.scattering_lf, self.scattering_hf] {
            if !(0.0..=1.0).contains(&val) {
                return Err("Scattering values must be between 0.0 and 1.0");
            }
        }

        for val in [self.transmission_lf, self.transmission_hf] {
            if !val.is_finite() || val < 0.0 {
                return Err("Transmission values must be finite and non-negative");
            }
        }

        Ok(())
    }
}

impl Default for MaterialProperties {
    fn default() -> Self {
        Self::new(0.02, 0.1, 0.3, 0.5, 100.0, 150.0)
    }
}

/// A user-defined material.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomMaterial {
    pub id: MaterialId,
    pub name: String,
    pub properties: MaterialProperties,
    /// Color used by the raytracer's debug view
    pub debug_color: [u8; 3],
}

impl CustomMaterial {
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id: MaterialId(id),
            name: name.into(),
            properties: MaterialProperties::default(),
            debug_color: [255, 0, 255],
        }
    }

    pub fn with_properties(mut self, properties: MaterialProperties) -> Self {
        self.properties = properties;
        self
    }

    pub fn with_debug_color(mut self, rgb: [u8; 3]) -> Self {
        self.debug_color = rgb;
        self
    }
}

/// Material annotation attached to a scene node.
#[derive(Debug, Clone, PartialEq)]
pub enum MaterialAnnotation {
    /// A built-in or custom material name
    Name(String),
    /// A custom-material descriptor, referenced by ID
    Custom(MaterialId),
}

impl MaterialAnnotation {
    pub fn name(name: impl Into<String>) -> Self {
        Self::Name(name.into())
    }
}

/// Registry of custom materials plus the node → material lookup.
pub struct MaterialResolver {
    custom: BTreeMap<MaterialId, CustomMaterial>,
    events: EventSender,
}

impl MaterialResolver {
    pub fn new(events: EventSender) -> Self {
        Self {
            custom: BTreeMap::new(),
            events,
        }
    }

    /// Registers a custom material.
    ///
    /// # Errors
    ///
    /// Fails without touching prior registrations when the ID is below
    /// [`MaterialId::CUSTOM_MIN`], the ID or name is already taken, or the
    /// properties are out of range.
    pub fn register(&mut self, material: CustomMaterial) -> Result<()> {
        if !material.id.is_custom() {
            return Err(EchotraceError::ReservedMaterialId(material.id.0));
        }

        if let Some(existing) = self.custom.get(&material.id) {
            return Err(EchotraceError::DuplicateMaterialId {
                id: material.id.0,
                existing: existing.name.clone(),
            });
        }

        if let Some(existing) = self
            .custom
            .values()
            .find(|m| m.name.eq_ignore_ascii_case(&material.name))
        {
            return Err(EchotraceError::InvalidMaterial(format!(
                "name '{}' is already used by material {}",
                material.name, existing.id
            )));
        }

        material.properties.validate().map_err(|e| {
            EchotraceError::InvalidMaterial(format!("'{}': {}", material.name, e))
        })?;

        log::info!(
            "Registered custom material '{}' ({})",
            material.name,
            material.id
        );
        self.custom.insert(material.id, material);
        Ok(())
    }

    pub fn get(&self, id: MaterialId) -> Option<&CustomMaterial> {
        self.custom.get(&id)
    }

    pub fn get_mut(&mut self, id: MaterialId) -> Option<&mut CustomMaterial> {
        self.custom.get_mut(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CustomMaterial> {
        self.custom.values()
    }

    pub fn len(&self) -> usize {
        self.custom.len()
    }

    pub fn is_empty(&self) -> bool {
        self.custom.is_empty()
    }

    /// Custom materials first, then the built-in table.
    pub fn lookup_name(&self, name: &str) -> Option<MaterialId> {
        let trimmed = name.trim();
        self.custom
            .values()
            .find(|m| m.name.eq_ignore_ascii_case(trimmed))
            .map(|m| m.id)
            .or_else(|| builtin_material(trimmed))
    }

    /// Material for `node`: its own annotation if it has one, `inherited` otherwise.
    pub fn resolve(&self, scene: &dyn SceneGraph, node: NodeId, inherited: MaterialId) -> MaterialId {
        match scene.material(node) {
            Some(annotation) => self.resolve_annotation(scene, node, annotation),
            None => inherited,
        }
    }

    /// Material for `node` taken from the nearest annotated ancestor (or itself).
    pub fn resolve_inherited(&self, scene: &dyn SceneGraph, node: NodeId) -> MaterialId {
        let mut current = Some(node);
        while let Some(id) = current {
            if let Some(annotation) = scene.material(id) {
                return self.resolve_annotation(scene, id, annotation);
            }
            current = scene.parent(id);
        }
        MaterialId::AIR
    }

    fn resolve_annotation(
        &self,
        scene: &dyn SceneGraph,
        node: NodeId,
        annotation: &MaterialAnnotation,
    ) -> MaterialId {
        match annotation {
            MaterialAnnotation::Name(name) => match self.lookup_name(name) {
                Some(id) => id,
                None => {
                    log::warn!(
                        "Unknown material '{}' on '{}', defaulting to air",
                        name,
                        scene.name(node)
                    );
                    let _ = self.events.send(EchotraceEvent::UnknownMaterial {
                        node,
                        name: name.clone(),
                    });
                    MaterialId::AIR
                }
            },
            MaterialAnnotation::Custom(id) => {
                if self.custom.contains_key(id) || id.is_builtin() {
                    *id
                } else {
                    log::warn!(
                        "Material {} on '{}' is not registered, defaulting to air",
                        id,
                        scene.name(node)
                    );
                    let _ = self.events.send(EchotraceEvent::UnknownMaterial {
                        node,
                        name: id.to_string(),
                    });
                    MaterialId::AIR
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::tree::{SceneNode, SceneTree};

    fn resolver() -> (MaterialResolver, crossbeam_channel::Receiver<EchotraceEvent>) {
        let (tx, rx) = crossbeam_channel::unbounded();
        (MaterialResolver::new(tx), rx)
    }

    #[test]
    fn test_properties_validation() {
        assert!(MaterialProperties::default().validate().is_ok());

        let bad_absorption = MaterialProperties::new(1.5, 0.1, 0.3, 0.5, 10.0, 10.0);
        assert!(bad_absorption.validate().is_err());

        let bad_transmission = MaterialProperties::new(0.1, 0.1, 0.3, 0.5, -1.0, 10.0);
        assert!(bad_transmission.validate().is_err());
    }

    #[test]
    fn test_register_reserved_and_duplicate_ids() {
        let (mut materials, _rx) = resolver();

        let err = materials.register(CustomMaterial::new(999, "felt")).unwrap_err();
        assert!(matches!(err, EchotraceError::ReservedMaterialId(999)));
        assert!(materials.is_empty());

        let first = CustomMaterial::new(1000, "felt")
            .with_properties(MaterialProperties::new(0.5, 0.9, 0.1, 0.1, 20.0, 40.0));
        materials.register(first.clone()).unwrap();

        let err = materials
            .register(CustomMaterial::new(1000, "foam"))
            .unwrap_err();
        assert!(matches!(err, EchotraceError::DuplicateMaterialId { id: 1000, .. }));
        assert_eq!(materials.len(), 1);
        assert_eq!(materials.get(MaterialId(1000)), Some(&first));
    }

    #[test]
    fn test_register_rejects_duplicate_name_case_insensitively() {
        let (mut materials, _rx) = resolver();
        materials.register(CustomMaterial::new(1000, "Felt")).unwrap();
        assert!(materials.register(CustomMaterial::new(1001, "FELT")).is_err());
        assert_eq!(materials.len(), 1);
    }

    #[test]
    fn test_lookup_prefers_custom_over_builtin() {
        let (mut materials, _rx) = resolver();
        assert_eq!(materials.lookup_name("Concrete"), Some(MaterialId::CONCRETE));

        materials
            .register(CustomMaterial::new(1200, "concrete"))
            .unwrap();
        assert_eq!(materials.lookup_name("CONCRETE"), Some(MaterialId(1200)));
        assert_eq!(materials.lookup_name("woodindoor"), Some(MaterialId::WOOD_INDOOR));
        assert_eq!(materials.lookup_name("plasma"), None);
    }

    #[test]
    fn test_resolve_inherits_and_overrides() {
        let (materials, rx) = resolver();
        let mut scene = SceneTree::new();
        let root = scene.root();
        let room = scene
            .add_child(root, SceneNode::new("room").with_material(MaterialAnnotation::name("brick")))
            .unwrap();
        let wall = scene.add_child(room, SceneNode::new("wall")).unwrap();
        let rug = scene
            .add_child(room, SceneNode::new("rug").with_material(MaterialAnnotation::name("cloth")))
            .unwrap();
        let odd = scene
            .add_child(room, SceneNode::new("odd").with_material(MaterialAnnotation::name("plasma")))
            .unwrap();

        assert_eq!(materials.resolve(&scene, wall, MaterialId::BRICK), MaterialId::BRICK);
        assert_eq!(materials.resolve(&scene, rug, MaterialId::BRICK), MaterialId::CLOTH);
        assert_eq!(materials.resolve_inherited(&scene, wall), MaterialId::BRICK);
        assert_eq!(materials.resolve_inherited(&scene, root), MaterialId::AIR);

        assert_eq!(materials.resolve(&scene, odd, MaterialId::BRICK), MaterialId::AIR);
        assert!(matches!(
            rx.try_recv(),
            Ok(EchotraceEvent::UnknownMaterial { node, .. }) if node == odd
        ));
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let (mut materials, _rx) = resolver();
        materials.register(CustomMaterial::new(1500, "padding")).unwrap();

        let mut scene = SceneTree::new();
        let root = scene.root();
        let node = scene
            .add_child(root, SceneNode::new("pad").with_material(MaterialAnnotation::name("Padding")))
            .unwrap();

        let first = materials.resolve(&scene, node, MaterialId::AIR);
        let second = materials.resolve(&scene, node, MaterialId::AIR);
        assert_eq!(first, MaterialId(1500));
        assert_eq!(first, second);
    }

    #[test]
    fn test_custom_descriptor_requires_registration() {
        let (mut materials, _rx) = resolver();
        let mut scene = SceneTree::new();
        let root = scene.root();
        let node = scene
            .add_child(
                root,
                SceneNode::new("panel").with_material(MaterialAnnotation::Custom(MaterialId(1100))),
            )
            .unwrap();

        assert_eq!(materials.resolve_inherited(&scene, node), MaterialId::AIR);
        materials.register(CustomMaterial::new(1100, "panel")).unwrap();
        assert_eq!(materials.resolve_inherited(&scene, node), MaterialId(1100));
    }
}
