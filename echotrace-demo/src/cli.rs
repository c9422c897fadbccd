use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use echotrace::acoustics::EffectSlot;
use echotrace::math::{Affine3A, Quat};
use echotrace::scene::{
    CollisionShape, CustomMaterial, MaterialAnnotation, MaterialProperties, MeshSurface,
    NodeGeometry, NodeId, SceneGraph, SceneNode, SceneTree, TriangleMesh,
};
use echotrace::{
    AcousticWorld, DeviceEvent, EchotraceEvent, EchotraceWorldDesc, EmitterKind, Pose, Vec3,
};

use crate::engines::{LoggingBackend, SimulatedRaytracer};

type DemoWorld = AcousticWorld<SimulatedRaytracer, LoggingBackend>;

const FRAME: Duration = Duration::from_millis(16);

fn wall(name: &str, center: Vec3, size: Vec3) -> SceneNode {
    SceneNode::new(name)
        .with_transform(Affine3A::from_translation(center))
        .with_geometry(NodeGeometry::Collision(CollisionShape::Box { size }))
}

fn statue_mesh() -> Arc<TriangleMesh> {
    // Square pyramid, normals authored per vertex
    let apex = Vec3::new(0.0, 2.0, 0.0);
    let base = [
        Vec3::new(-0.5, 0.0, -0.5),
        Vec3::new(0.5, 0.0, -0.5),
        Vec3::new(0.5, 0.0, 0.5),
        Vec3::new(-0.5, 0.0, 0.5),
    ];
    let mut vertices = Vec::new();
    let mut normals = Vec::new();
    for i in 0..4 {
        let (a, b) = (base[i], base[(i + 1) % 4]);
        let outward = ((a + b) * 0.5).normalize() + Vec3::Y * 0.25;
        vertices.extend([a, b, apex]);
        normals.extend([outward; 3]);
    }
    Arc::new(TriangleMesh::single(
        MeshSurface::new(vertices).with_normals(normals),
    ))
}

fn build_scene(scene: &mut SceneTree) -> Result<NodeId> {
    let root = scene.root();
    let missing = || anyhow::anyhow!("scene rejected a node");

    let hall = scene
        .add_child(
            root,
            SceneNode::new("hall").with_material(MaterialAnnotation::name("Concrete")),
        )
        .ok_or_else(missing)?;
    scene.add_child(
        hall,
        SceneNode::new("floor").with_geometry(NodeGeometry::Collision(
            CollisionShape::WorldBoundary {
                normal: Vec3::Y,
                distance: 0.0,
            },
        )),
    );
    for (name, center, size) in [
        ("north", Vec3::new(0.0, 2.0, -8.0), Vec3::new(16.0, 4.0, 0.5)),
        ("south", Vec3::new(0.0, 2.0, 8.0), Vec3::new(16.0, 4.0, 0.5)),
        ("east", Vec3::new(8.0, 2.0, 0.0), Vec3::new(0.5, 4.0, 16.0)),
        ("west", Vec3::new(-8.0, 2.0, 0.0), Vec3::new(0.5, 4.0, 16.0)),
    ] {
        scene.add_child(hall, wall(name, center, size));
    }

    let pillar = scene
        .add_child(
            hall,
            SceneNode::new("pillar")
                .with_transform(Affine3A::from_translation(Vec3::new(2.0, 1.5, 2.0)))
                .with_geometry(NodeGeometry::CsgCylinder {
                    radius: 0.4,
                    height: 3.0,
                    cone: false,
                })
                .with_material(MaterialAnnotation::name("marble")),
        )
        .ok_or_else(missing)?;

    scene.add_child(
        hall,
        SceneNode::new("statue")
            .with_transform(Affine3A::from_translation(Vec3::new(-3.0, 0.0, 3.0)))
            .with_geometry(NodeGeometry::Mesh(Some(statue_mesh())))
            .with_material(MaterialAnnotation::name("rock")),
    );

    let studio = scene
        .add_child(
            hall,
            SceneNode::new("studio")
                .with_transform(Affine3A::from_translation(Vec3::new(-5.0, 0.0, -5.0)))
                .with_material(MaterialAnnotation::name("acoustic_foam")),
        )
        .ok_or_else(missing)?;
    scene.add_child(studio, wall("booth", Vec3::new(0.0, 1.25, 0.0), Vec3::splat(2.5)));

    scene.add_child(
        root,
        SceneNode::new("courtyard")
            .with_transform(Affine3A::from_translation(Vec3::new(0.0, 0.0, 20.0)))
            .with_geometry(NodeGeometry::Collision(CollisionShape::HeightMap {
                width: 4,
                depth: 4,
                heights: vec![
                    0.0, 0.1, 0.2, 0.1, //
                    0.1, 0.3, 0.4, 0.2, //
                    0.2, 0.4, f32::NAN, 0.3, //
                    0.1, 0.2, 0.3, 0.2,
                ],
            }))
            .with_material(MaterialAnnotation::name("grass")),
    );

    // Both of these are reported and skipped
    scene.add_child(
        hall,
        SceneNode::new("sensor").with_geometry(NodeGeometry::Collision(
            CollisionShape::Unsupported {
                kind: "SeparationRayShape3D".to_string(),
            },
        )),
    );
    scene.add_child(
        hall,
        SceneNode::new("banner")
            .with_geometry(NodeGeometry::CsgBox {
                size: Vec3::new(1.0, 2.0, 0.05),
            })
            .with_material(MaterialAnnotation::name("velvet")),
    );

    scene.drain_events();
    Ok(pillar)
}

fn report_events(world: &mut DemoWorld) {
    let mut primitive_events = 0;
    for event in world.poll_events() {
        if event.is_primitive_event() {
            primitive_events += 1;
        }
        if event.is_warning() {
            match event.node() {
                Some(node) => log::warn!("{}: {:?}", node, event),
                None => log::warn!("event: {:?}", event),
            }
        } else if !matches!(event, EchotraceEvent::PrimitiveCreated { .. }) {
            log::info!("event: {:?}", event);
        }
    }
    if primitive_events > 0 {
        log::debug!("{} primitive events", primitive_events);
    }
}

pub fn run_walkthrough(frames: u32) -> Result<()> {
    let foam = CustomMaterial::new(1000, "acoustic_foam")
        .with_properties(MaterialProperties::new(0.6, 0.9, 0.4, 0.6, 120.0, 180.0))
        .with_debug_color([40, 40, 200]);

    let desc = EchotraceWorldDesc::default().max_grouped_zones(2);
    let mut world: DemoWorld = AcousticWorld::new(desc, vec![foam], LoggingBackend::default())?;

    let mut scene = SceneTree::new();
    let pillar = build_scene(&mut scene)?;

    log::info!("=== Loading scene ===");
    let created = world.scene_loaded(&scene);
    log::info!(
        "{} primitives mirrored from {} scene nodes",
        created,
        scene.len()
    );
    report_events(&mut world);

    let voice = world.attach_emitter(EmitterKind::Raytraced, Vec3::new(4.0, 1.0, -4.0))?;
    let ambience = world.attach_emitter(EmitterKind::Ambient, Vec3::ZERO)?;
    let footsteps = world.attach_emitter(EmitterKind::Relative, Vec3::ZERO)?;
    for emitter in [voice, ambience, footsteps] {
        world.play_emitter(emitter)?;
    }

    let device = world.device_events();
    let start = Instant::now();
    let mut crate_node: Option<NodeId> = None;

    log::info!("=== Walking through {} frames ===", frames);
    for frame in 0..frames {
        // Walk from the studio corner out through the south wall
        let progress = frame as f32 / frames.max(1) as f32;
        let position = Vec3::new(-6.0, 1.7, -6.0).lerp(Vec3::new(2.0, 1.7, 14.0), progress);
        let listener = Pose::from_pitch_yaw(position, 0.0, progress * std::f32::consts::PI);

        if frame % 45 == 20 {
            match crate_node.take() {
                Some(node) => {
                    scene.remove(node);
                }
                None => {
                    crate_node = scene.add_child(
                        pillar,
                        SceneNode::new("crate")
                            .with_transform(Affine3A::from_translation(Vec3::new(1.0, -1.0, 0.0)))
                            .with_geometry(NodeGeometry::CsgBox { size: Vec3::ONE })
                            .with_material(MaterialAnnotation::name("woodindoor")),
                    );
                }
            }
        }
        for event in scene.drain_events() {
            world.handle_scene_event(&scene, event);
        }

        // Rotate the pillar (and whatever sits on it)
        scene.set_local_transform(
            pillar,
            Affine3A::from_rotation_translation(
                Quat::from_rotation_y(progress * 2.0),
                Vec3::new(2.0, 1.5, 2.0),
            ),
        );
        world.physics_process(&scene);

        if frame == frames / 2 {
            log::info!("=== Simulating audio device loss ===");
            world.backend_mut().lose_device();
            device.send(DeviceEvent::Destroyed)?;
        }
        if frame == frames / 2 + 10 {
            device.send(DeviceEvent::Recreated)?;
        }

        world.process_at(listener, start + FRAME * frame);
        world.set_emitter_position(voice, position + Vec3::new(1.0, 0.0, -1.0))?;
        report_events(&mut world);

        if frame % 30 == 0 {
            let decay = world
                .aggregator()
                .params(EffectSlot::Listener)
                .map(|p| p.reverb.decay_time);
            log::info!(
                "frame {:>4}: listener at {}, decay {:?}, ambient {:?}, {} effects, {} playing",
                frame,
                position,
                decay,
                world.aggregator().ambient(),
                world.backend().live_effects(),
                world.backend().playing()
            );
        }
    }

    log::info!("=== Shutting down ===");
    world.detach_emitter(voice)?;
    world.shutdown(&scene);
    report_events(&mut world);
    log::info!(
        "Remaining backend effects: {}, primitives: {}",
        world.backend().live_effects(),
        world.registry().len()
    );
    Ok(())
}
