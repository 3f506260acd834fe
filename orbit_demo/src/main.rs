//! Orbit demo application
//!
//! Builds a small solar system on the headless driver: a spinning sun, a
//! planet on a circular orbit with a moon, a comet on a spline, and a
//! short-lived flare that deletes itself. Each frame's pass statistics are
//! logged.

use scene_engine::config::{Config, ConfigError};
use scene_engine::foundation::logging;
use scene_engine::foundation::math::{Vec2, Vec3};
use scene_engine::scene::{DebugData, RenderPass, SceneConfig, SceneManager, SceneNodeType, StaticMesh};
use scene_engine::video::{Color, Colorf, Material, MaterialType, NullDriver};
use std::rc::Rc;

const FRAME_MS: u32 = 16;
const FRAME_COUNT: u32 = 120;

#[derive(Debug, thiserror::Error)]
enum DemoError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

fn load_config() -> Result<SceneConfig, DemoError> {
    match std::env::args().nth(1) {
        Some(path) => {
            log::info!("Loading scene configuration from {}", path);
            Ok(SceneConfig::load_from_file(path)?)
        }
        None => Ok(SceneConfig::default()),
    }
}

fn build_scene(scene: &mut SceneManager) {
    scene.set_ambient_light(Colorf::new(0.1, 0.1, 0.15, 1.0));
    scene.add_camera_scene_node(None, Vec3::new(0.0, 40.0, -120.0), Vec3::zeros(), -1, true);
    scene.add_light_scene_node(None, Vec3::zeros(), Colorf::new(1.0, 0.9, 0.7, 1.0), 500.0, -1);

    let sun = scene.add_cube_scene_node(20.0, None, 1, Vec3::zeros());
    if let Some(node) = scene.scene_node_mut(sun) {
        node.set_name("sun");
    }
    let spin = scene.create_rotation_animator(Vec3::new(0.0, 30.0, 0.0));
    scene.add_animator(sun, spin);

    let planet = scene.add_cube_scene_node(6.0, None, 2, Vec3::zeros());
    let orbit = scene.create_fly_circle_animator(Vec3::zeros(), 50.0, 0.001, Vec3::new(0.0, 1.0, 0.0), 0.0, 0.0);
    scene.add_animator(planet, orbit);
    scene.add_shadow_volume_scene_node(planet, Vec3::new(0.0, -1.0, 0.0), false, 200.0, -1);

    let glass = Material {
        material_type: MaterialType::TransparentAlphaChannel,
        ..Material::default()
    };
    let moon = scene.add_mesh_scene_node(
        Rc::new(StaticMesh::cube(2.0, glass)),
        Some(planet),
        3,
        Vec3::new(10.0, 0.0, 0.0),
        Vec3::zeros(),
        Vec3::new(1.0, 1.0, 1.0),
    );
    if let Some(node) = scene.scene_node_mut(moon) {
        node.set_debug_data_visible(DebugData::BBOX);
    }

    let comet = scene.add_billboard_scene_node(None, Vec2::new(4.0, 4.0), Vec3::zeros(), 4, Color::WHITE);
    let path = vec![
        Vec3::new(-80.0, 10.0, 0.0),
        Vec3::new(0.0, 20.0, 80.0),
        Vec3::new(80.0, 10.0, 0.0),
        Vec3::new(0.0, 0.0, -80.0),
    ];
    let tail = scene.create_follow_spline_animator(0, path, 2.0, 0.5, true, false);
    scene.add_animator(comet, tail);

    let flare_color = Color::new(128, 255, 200, 0);
    let flare = scene.add_billboard_scene_node(Some(sun), Vec2::new(30.0, 30.0), Vec3::zeros(), 5, flare_color);
    let fade = scene.create_delete_animator(1000);
    scene.add_animator(flare, fade);

    scene.add_text_scene_node("orbit demo", Color::WHITE, Some(planet), Vec3::new(0.0, 8.0, 0.0), 6);
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_with_default("info");
    log::info!("Starting orbit demo...");

    let config = load_config()?;
    let mut scene = SceneManager::with_config(NullDriver::new().into_shared(), config);
    build_scene(&mut scene);
    log::info!("Scene built with {} nodes", scene.node_count());

    for frame in 0..FRAME_COUNT {
        let time = frame * FRAME_MS;
        scene.render_frame(time);

        let stats = scene.frame_stats();
        if frame % 30 == 0 {
            log::info!(
                "t={:>5} ms  solid={} transparent={} shadow={} gui={} culled={}",
                time,
                stats.drawn(RenderPass::Solid),
                stats.drawn(RenderPass::Transparent),
                stats.drawn(RenderPass::Shadow),
                stats.drawn(RenderPass::Gui),
                stats.culled
            );
        }
    }

    let meshes = scene.scene_nodes_from_type(SceneNodeType::MESH, None);
    log::info!("Finished: {} nodes left, {} mesh nodes", scene.node_count(), meshes.len());
    if let Some(planet) = scene.scene_node_from_id(2, None).and_then(|id| scene.scene_node(id)) {
        log::info!("Planet ended at {:?}", planet.absolute_position());
    }
    Ok(())
}
