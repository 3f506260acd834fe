//! Material description shared by nodes and the driver

use super::Color;

/// Number of texture layers per material
pub const MATERIAL_MAX_TEXTURES: usize = 4;

/// Opaque texture identity
///
/// The solid pass sorts on this value to group draws by texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TextureId(pub u32);

/// Built-in material renderers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MaterialType {
    /// Opaque, single texture
    #[default]
    Solid,
    /// Opaque, second layer is a light map
    LightMap,
    /// Opaque, second layer is a detail map
    DetailMap,
    /// Additive blending
    TransparentAddColor,
    /// Blending through the texture alpha channel
    TransparentAlphaChannel,
    /// Alpha test against the texture alpha; depth-sorted like a solid
    TransparentAlphaChannelRef,
    /// Blending through vertex alpha
    TransparentVertexAlpha,
}

impl MaterialType {
    /// Whether the renderer blends with the frame buffer
    pub fn is_transparent(self) -> bool {
        matches!(
            self,
            Self::TransparentAddColor | Self::TransparentAlphaChannel | Self::TransparentVertexAlpha
        )
    }
}

/// Boolean material switches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaterialFlag {
    /// Dynamic lighting
    Lighting,
    /// Depth test
    ZBuffer,
    /// Depth writes
    ZWrite,
    /// Back face culling
    BackFaceCulling,
    /// Wireframe rasterization
    Wireframe,
}

/// Render state of one mesh buffer or node surface
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    /// Renderer used for this material
    pub material_type: MaterialType,
    /// Texture layers
    pub textures: [Option<TextureId>; MATERIAL_MAX_TEXTURES],
    /// Diffuse color
    pub diffuse_color: Color,
    /// Dynamic lighting
    pub lighting: bool,
    /// Depth test
    pub z_buffer: bool,
    /// Depth writes
    pub z_write: bool,
    /// Back face culling
    pub back_face_culling: bool,
    /// Wireframe rasterization
    pub wireframe: bool,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            material_type: MaterialType::Solid,
            textures: [None; MATERIAL_MAX_TEXTURES],
            diffuse_color: Color::WHITE,
            lighting: true,
            z_buffer: true,
            z_write: true,
            back_face_culling: true,
            wireframe: false,
        }
    }
}

impl Material {
    /// Material with a texture on the first layer
    pub fn with_texture(texture: TextureId) -> Self {
        let mut material = Self::default();
        material.textures[0] = Some(texture);
        material
    }

    /// Texture on a layer, `None` if empty or out of range
    pub fn texture(&self, layer: usize) -> Option<TextureId> {
        self.textures.get(layer).copied().flatten()
    }

    /// Set the texture on a layer; out-of-range layers are ignored
    pub fn set_texture(&mut self, layer: usize, texture: Option<TextureId>) {
        if let Some(slot) = self.textures.get_mut(layer) {
            *slot = texture;
        }
    }

    /// Set a boolean flag
    pub fn set_flag(&mut self, flag: MaterialFlag, value: bool) {
        match flag {
            MaterialFlag::Lighting => self.lighting = value,
            MaterialFlag::ZBuffer => self.z_buffer = value,
            MaterialFlag::ZWrite => self.z_write = value,
            MaterialFlag::BackFaceCulling => self.back_face_culling = value,
            MaterialFlag::Wireframe => self.wireframe = value,
        }
    }

    /// Read a boolean flag
    pub fn flag(&self, flag: MaterialFlag) -> bool {
        match flag {
            MaterialFlag::Lighting => self.lighting,
            MaterialFlag::ZBuffer => self.z_buffer,
            MaterialFlag::ZWrite => self.z_write,
            MaterialFlag::BackFaceCulling => self.back_face_culling,
            MaterialFlag::Wireframe => self.wireframe,
        }
    }

    /// Whether this material is drawn in a transparent pass
    pub fn is_transparent(&self) -> bool {
        self.material_type.is_transparent()
    }
}
