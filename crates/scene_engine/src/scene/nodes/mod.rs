//! Built-in node kinds
//!
//! Each kind implements [`SceneNodeKind`](crate::scene::SceneNodeKind) and is
//! created through the matching `add_*` factory on
//! [`SceneManager`](crate::scene::SceneManager).

mod billboard;
mod camera;
mod empty;
mod light;
mod mesh;
mod shadow_volume;
mod sky_box;
mod text;

pub use billboard::BillboardSceneNode;
pub use camera::{CameraSceneNode, CameraView};
pub use empty::EmptySceneNode;
pub use light::LightSceneNode;
pub use mesh::MeshSceneNode;
pub use shadow_volume::ShadowVolumeSceneNode;
pub use sky_box::{SkyBoxSceneNode, SkyBoxTextures};
pub use text::TextSceneNode;
