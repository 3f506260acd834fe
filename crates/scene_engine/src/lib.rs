//! # Scene Engine
//!
//! Scene graph and per-frame render scheduling for a 3D engine.
//!
//! ## Features
//!
//! - **Scene Graph**: Reference-counted node tree with relative and absolute transforms
//! - **Animators**: Pluggable per-node behaviors driven by a millisecond clock
//! - **Render Passes**: Fixed pass order with texture grouping and depth sorting
//! - **Culling**: Box, frustum and occlusion-query visibility tests
//! - **Driver Abstraction**: Any device behind the `VideoDriver` trait
//!
//! ## Quick Start
//!
//! ```rust
//! use scene_engine::prelude::*;
//!
//! let driver = NullDriver::new().into_shared();
//! let mut scene = SceneManager::new(driver);
//!
//! scene.add_camera_scene_node(None, Vec3::new(0.0, 5.0, -20.0), Vec3::zeros(), -1, true);
//! let cube = scene.add_cube_scene_node(10.0, None, -1, Vec3::zeros());
//! let spin = scene.create_rotation_animator(Vec3::new(0.0, 45.0, 0.0));
//! scene.add_animator(cube, spin);
//!
//! for frame in 0..3 {
//!     scene.render_frame(frame * 16);
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod foundation;
pub mod scene;
pub mod video;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        config::{Config, ConfigFormat},
        foundation::math::{Mat4, Vec2, Vec3},
        scene::{
            animators::{AnimatorRef, SceneNodeAnimator},
            nodes::{CameraSceneNode, MeshSceneNode},
            AutomaticCulling, DebugData, RenderPass, SceneConfig, SceneManager, SceneNode, SceneNodeId,
            SceneNodeKind, SceneNodeType, StaticMesh,
        },
        video::{Color, Colorf, Material, NullDriver, SharedDriver, TextureId, VideoDriver},
    };
}
