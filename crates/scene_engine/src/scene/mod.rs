//! Scene graph and per-frame render scheduling
//!
//! A [`SceneManager`] owns every node of a scene in an arena, keyed by
//! [`SceneNodeId`]. Each frame runs three phases:
//!
//! ```text
//! on_animate(time)          animators move nodes, absolute transforms refresh
//!      ↓
//! on_register_scene_node()  visible nodes queue themselves into render passes
//!      ↓
//! draw_all()                passes are sorted and drawn in a fixed order
//! ```
//!
//! Node behavior lives in [`SceneNodeKind`] implementations (see [`nodes`]);
//! per-node behavior over time lives in animators (see [`animators`]).

pub mod animators;
mod bounds;
mod collision;
pub(crate) mod culling;
mod frustum;
mod hierarchy;
mod mesh;
mod node;
pub mod nodes;
mod render_queue;
mod scene_manager;
mod transform;

pub use bounds::AABB;
pub use collision::{BoxCollisionWorld, CollisionResult, CollisionWorld};
pub use frustum::{FrustumPlane, Plane, ViewFrustum};
pub use mesh::{Mesh, MeshBuffer, MeshCache, StaticMesh};
pub use node::{
    AutomaticCulling, DebugData, RenderContext, SceneNode, SceneNodeId, SceneNodeKind, SceneNodeType, UNSET_ID,
};
pub use render_queue::{
    DistanceNodeEntry, FrameStats, RenderPass, RenderQueues, Registrar, SolidNodeEntry, TransparentNodeEntry,
};
pub use scene_manager::{SceneConfig, SceneManager};
pub use transform::TransformNode;

#[cfg(test)]
pub(crate) mod test_support {
    use super::SceneManager;
    use crate::video::{DriverLog, NullDriver};

    /// Scene backed by a fresh null driver
    pub fn scene() -> SceneManager {
        SceneManager::new(NullDriver::new().into_shared())
    }

    /// Scene plus the call log of its driver
    pub fn scene_with_log() -> (SceneManager, DriverLog) {
        let driver = NullDriver::new();
        let log = driver.log();
        (SceneManager::new(driver.into_shared()), log)
    }
}
