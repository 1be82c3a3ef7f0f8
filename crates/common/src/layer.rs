//! Layer description — the declarative interface between caller state and the
//! compositing pipeline.
//!
//! The caller replaces the ordered layer list wholesale; layers are immutable
//! once constructed. Each layer names its image by [`ImageId`] and carries the
//! blend mode, opacity, optional mask, and placement transform used when the
//! stack is rendered into the offscreen target.

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

use crate::blend::BlendMode;
use crate::types::{ImageId, Size};

/// 2D placement transform mapping the unit quad `[0,1]²` into logical image
/// space.
#[derive(Copy, Clone, Debug, Serialize, Deserialize)]
pub struct Transform2D {
    /// Position of the anchor point in logical pixels.
    pub position: [f32; 2],
    /// Extent of the quad in logical pixels.
    pub scale: [f32; 2],
    /// Rotation around the anchor in degrees.
    pub rotation: f32,
    /// Anchor point in unit-quad coordinates (0.5, 0.5 = center).
    pub anchor: [f32; 2],
}

impl Default for Transform2D {
    fn default() -> Self {
        Self {
            position: [0.0, 0.0],
            scale: [1.0, 1.0],
            rotation: 0.0,
            anchor: [0.5, 0.5],
        }
    }
}

impl Transform2D {
    /// A transform placing the unit quad over the full logical image rect.
    pub fn full_image(image_size: Size) -> Self {
        let w = image_size.width as f32;
        let h = image_size.height as f32;
        Self {
            position: [w / 2.0, h / 2.0],
            scale: [w, h],
            rotation: 0.0,
            anchor: [0.5, 0.5],
        }
    }

    /// Model matrix taking unit-quad vertices to logical image space.
    pub fn to_matrix(&self) -> Mat4 {
        let translate = Mat4::from_translation(Vec3::new(self.position[0], self.position[1], 0.0));
        let rotate = Mat4::from_rotation_z(self.rotation.to_radians());
        let scale = Mat4::from_scale(Vec3::new(self.scale[0], self.scale[1], 1.0));
        let recenter = Mat4::from_translation(Vec3::new(-self.anchor[0], -self.anchor[1], 0.0));
        translate * rotate * scale * recenter
    }
}

/// Masking function applied when sampling a layer's mask texture.
///
/// A mask sample whose coordinate falls outside the mask's own `[0,1]²`
/// domain contributes zero coverage rather than clamping to an edge texel,
/// so mask boundaries do not smear.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MaskMode {
    /// Coverage is the mask texel's alpha channel.
    #[default]
    Alpha,
    /// Coverage is the mask texel's luminance.
    Luminance,
    /// One minus the alpha channel.
    InverseAlpha,
    /// One minus the luminance.
    InverseLuminance,
}

impl MaskMode {
    /// Integer constant selecting this mode in the blend shader.
    pub fn shader_index(self) -> u32 {
        match self {
            Self::Alpha => 0,
            Self::Luminance => 1,
            Self::InverseAlpha => 2,
            Self::InverseLuminance => 3,
        }
    }
}

/// Mask applied to a layer.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LayerMask {
    /// Cache key of the mask image.
    pub image: ImageId,
    /// Masking function.
    pub mode: MaskMode,
    /// Mask opacity (0 = no effect, 1 = full coverage modulation).
    pub opacity: f32,
    /// Placement of the mask quad in logical image space.
    pub transform: Transform2D,
}

impl LayerMask {
    pub fn new(image: ImageId) -> Self {
        Self {
            image,
            mode: MaskMode::default(),
            opacity: 1.0,
            transform: Transform2D::default(),
        }
    }
}

/// One entry of the ordered layer stack (bottom to top).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Layer {
    /// Cache key of the layer's image.
    pub image: ImageId,
    /// Layer opacity in `[0,1]`.
    pub opacity: f32,
    /// Compositing function against the accumulated color below.
    pub blend_mode: BlendMode,
    /// Placement of the layer quad in logical image space.
    pub transform: Transform2D,
    /// Optional mask.
    pub mask: Option<LayerMask>,
}

impl Layer {
    pub fn new(image: ImageId) -> Self {
        Self {
            image,
            opacity: 1.0,
            blend_mode: BlendMode::default(),
            transform: Transform2D::default(),
            mask: None,
        }
    }

    /// True iff this layer's blend mode is achievable through GPU blend-state
    /// alone, without reading the destination in the shader.
    pub fn is_trivially_blended(&self) -> bool {
        self.blend_mode.is_trivial()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    #[test]
    fn default_transform_is_centered_unit() {
        let t = Transform2D::default();
        assert_eq!(t.position, [0.0, 0.0]);
        assert_eq!(t.scale, [1.0, 1.0]);
        assert_eq!(t.anchor, [0.5, 0.5]);
        assert_eq!(t.rotation, 0.0);
    }

    #[test]
    fn full_image_maps_unit_quad_corners() {
        let t = Transform2D::full_image(Size::new(800, 600));
        let m = t.to_matrix();
        let lo = m * Vec4::new(0.0, 0.0, 0.0, 1.0);
        let hi = m * Vec4::new(1.0, 1.0, 0.0, 1.0);
        assert!((lo.x - 0.0).abs() < 1e-4 && (lo.y - 0.0).abs() < 1e-4);
        assert!((hi.x - 800.0).abs() < 1e-3 && (hi.y - 600.0).abs() < 1e-3);
    }

    #[test]
    fn rotation_spins_around_anchor() {
        let t = Transform2D {
            position: [10.0, 10.0],
            scale: [2.0, 2.0],
            rotation: 180.0,
            anchor: [0.5, 0.5],
        };
        let m = t.to_matrix();
        // The anchor itself is a fixed point.
        let center = m * Vec4::new(0.5, 0.5, 0.0, 1.0);
        assert!((center.x - 10.0).abs() < 1e-4);
        assert!((center.y - 10.0).abs() < 1e-4);
        // A corner lands on the opposite side after a half turn.
        let corner = m * Vec4::new(0.0, 0.0, 0.0, 1.0);
        assert!((corner.x - 11.0).abs() < 1e-4);
        assert!((corner.y - 11.0).abs() < 1e-4);
    }

    #[test]
    fn trivial_blend_flag_follows_mode() {
        let mut layer = Layer::new(ImageId::new("a"));
        assert!(layer.is_trivially_blended());
        layer.blend_mode = BlendMode::Multiply;
        assert!(!layer.is_trivially_blended());
    }
}
