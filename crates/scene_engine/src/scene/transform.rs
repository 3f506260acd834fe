//! Transform node: relative translation/rotation/scale plus a cached world matrix

use crate::foundation::math::{constants, utils, Mat4, Vec3};

/// Relative transform of a scene node and its cached absolute matrix
///
/// The absolute matrix is only refreshed by [`TransformNode::update_absolute`];
/// moving a parent does not touch the cached matrices of its children until
/// the next refresh pass.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformNode {
    /// Translation relative to the parent
    pub translation: Vec3,
    /// Euler rotation relative to the parent, in degrees
    pub rotation: Vec3,
    /// Scale relative to the parent
    pub scale: Vec3,
    absolute: Mat4,
}

impl Default for TransformNode {
    fn default() -> Self {
        Self::new(Vec3::zeros(), Vec3::zeros(), Vec3::new(1.0, 1.0, 1.0))
    }
}

impl TransformNode {
    /// Create a transform; the absolute matrix starts out as the relative one
    pub fn new(translation: Vec3, rotation: Vec3, scale: Vec3) -> Self {
        let mut node = Self {
            translation,
            rotation,
            scale,
            absolute: Mat4::identity(),
        };
        node.absolute = node.relative_transformation();
        node
    }

    /// Compose `T * R * S`
    ///
    /// The scale factor is skipped when it is exactly one on every axis.
    pub fn relative_transformation(&self) -> Mat4 {
        let mut matrix = utils::rotation_from_degrees(&self.rotation);
        matrix.m14 = self.translation.x;
        matrix.m24 = self.translation.y;
        matrix.m34 = self.translation.z;

        if !self.has_unit_scale() {
            matrix *= Mat4::new_nonuniform_scaling(&self.scale);
        }
        matrix
    }

    /// Recompute the absolute matrix from the parent's absolute matrix
    pub fn update_absolute(&mut self, parent_absolute: Option<&Mat4>) {
        let relative = self.relative_transformation();
        self.absolute = match parent_absolute {
            Some(parent) => parent * relative,
            None => relative,
        };
    }

    /// Cached absolute matrix as of the last refresh
    pub fn absolute(&self) -> &Mat4 {
        &self.absolute
    }

    /// Overwrite the cached absolute matrix
    pub(crate) fn set_absolute(&mut self, absolute: Mat4) {
        self.absolute = absolute;
    }

    /// World position as of the last refresh
    pub fn absolute_position(&self) -> Vec3 {
        utils::translation_of(&self.absolute)
    }

    fn has_unit_scale(&self) -> bool {
        (self.scale - Vec3::new(1.0, 1.0, 1.0)).amax() <= constants::ROUNDING_ERROR
    }
}
