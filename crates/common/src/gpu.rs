//! GPU backend abstraction.
//!
//! The compositor never talks to a graphics context directly; it programs
//! against [`RenderBackend`] with opaque handle structs. A production backend
//! wraps a real GL/wgpu context; tests substitute a recording implementation.

use glam::Mat4;
use serde::{Deserialize, Serialize};

use crate::error::GpuError;

/// Pixel formats for textures and decoded bitmaps.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PixelFormat {
    #[default]
    Rgba8,
    Bgra8,
}

impl PixelFormat {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Rgba8 | Self::Bgra8 => 4,
        }
    }
}

/// Texture minification/magnification filtering.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum FilterMode {
    Nearest,
    #[default]
    Linear,
    /// Linear filtering with linear mip selection; requires a mip chain.
    LinearMipmapLinear,
}

/// Texture coordinate wrapping.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum WrapMode {
    #[default]
    ClampToEdge,
    Repeat,
}

/// Creation parameters for a GPU texture.
#[derive(Clone, Debug)]
pub struct TextureDesc {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub filter: FilterMode,
    pub wrap: WrapMode,
    /// Whether a mip chain is allocated for this texture.
    pub mipmaps: bool,
}

/// Opaque GPU texture handle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Texture {
    /// Backend-specific object handle.
    pub handle: u64,
    pub width: u32,
    pub height: u32,
    pub mipmaps: bool,
}

/// Opaque framebuffer handle with its color attachment.
#[derive(Clone, Debug)]
pub struct RenderTarget {
    /// Backend-specific framebuffer handle.
    pub handle: u64,
    /// The attached color texture.
    pub color: Texture,
}

/// Identifies a shader program by role.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ProgramId {
    /// Draws a layer quad, applying blend mode, opacity, and optional mask.
    ///
    /// Samples `source`; samples `backdrop` only for non-trivial blend
    /// modes; mask samples outside `[0,1]²` contribute zero coverage.
    LayerBlend,
    /// Copies the region covered by a quad from one color attachment into the
    /// bound target, sampling the source at screen-space coordinates.
    RegionCopy,
    /// Presents the composited offscreen result onto the visible surface.
    Present,
}

impl ProgramId {
    /// Shader entry point name.
    pub fn entry_point(self) -> &'static str {
        match self {
            Self::LayerBlend => "layer_blend",
            Self::RegionCopy => "region_copy",
            Self::Present => "present",
        }
    }
}

/// Fixed-function blend state for a draw.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum BlendState {
    /// Source-over alpha blending.
    #[default]
    AlphaOver,
    /// Additive blending.
    Additive,
    /// No blending; fragment output replaces the destination.
    Replace,
}

/// Mask-related uniforms, present only when the drawn layer carries a mask.
///
/// Kept as an explicit optional sub-structure rather than loose entries in a
/// dynamic uniform map, so a draw either has the complete mask block or none
/// of it.
#[derive(Clone, Debug)]
pub struct MaskUniforms {
    /// Handle of the mask texture.
    pub texture: u64,
    /// [`crate::layer::MaskMode`] shader index.
    pub mode_index: u32,
    pub opacity: f32,
    /// Placement of the mask quad in logical image space.
    pub transform: Mat4,
}

/// Explicitly assembled uniform block for one draw.
#[derive(Clone, Debug)]
pub struct DrawUniforms {
    /// Projection * placement matrix for the unit quad.
    pub mvp: Mat4,
    pub opacity: f32,
    /// [`crate::blend::BlendMode`] shader index.
    pub blend_index: u32,
    /// Handle of the primary sampler's texture.
    pub source: u64,
    /// Destination snapshot sampler; set only for non-trivial blend modes.
    pub backdrop: Option<u64>,
    pub mask: Option<MaskUniforms>,
}

impl DrawUniforms {
    /// A plain textured-quad uniform block: full opacity, no backdrop, no mask.
    pub fn quad(mvp: Mat4, source: u64) -> Self {
        Self {
            mvp,
            opacity: 1.0,
            blend_index: 0,
            source,
            backdrop: None,
            mask: None,
        }
    }
}

/// A single draw submission.
#[derive(Clone, Debug)]
pub struct DrawCall<'a> {
    /// Target framebuffer; `None` draws to the visible surface.
    pub target: Option<&'a RenderTarget>,
    pub program: ProgramId,
    pub blend: BlendState,
    pub uniforms: DrawUniforms,
}

/// Encoded-image formats for surface snapshots.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SnapshotFormat {
    Png,
    Jpeg,
    Webp,
}

impl SnapshotFormat {
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Webp => "image/webp",
        }
    }
}

/// Graphics-context abstraction the compositor renders through.
///
/// Handle lifecycles: every object returned by a `create_*` method is owned
/// by the caller and must be released through the matching `destroy_*`
/// method; destruction is an idempotent no-op for already-released handles.
pub trait RenderBackend: Send + Sync {
    /// Create a texture, optionally uploading initial pixel data.
    ///
    /// `pixels`, when given, must be `width * height * bytes_per_pixel` bytes.
    fn create_texture(
        &self,
        desc: &TextureDesc,
        pixels: Option<&[u8]>,
    ) -> Result<Texture, GpuError>;

    fn destroy_texture(&self, texture: &Texture);

    /// Create a framebuffer with `color` attached at the color attachment.
    fn create_target(&self, color: &Texture) -> Result<RenderTarget, GpuError>;

    fn destroy_target(&self, target: &RenderTarget);

    /// Clear a target (or the visible surface when `None`) to a color.
    fn clear(&self, target: Option<&RenderTarget>, color: [f32; 4]) -> Result<(), GpuError>;

    /// Submit one draw of the unit quad.
    fn draw(&self, call: &DrawCall<'_>) -> Result<(), GpuError>;

    /// Rebuild the mip chain of a texture from its base level.
    fn regenerate_mipmaps(&self, texture: &Texture) -> Result<(), GpuError>;

    /// Read back the color attachment's pixels.
    fn read_pixels(&self, target: &RenderTarget) -> Result<Vec<u8>, GpuError>;

    /// Encode the visible surface's current contents.
    ///
    /// Fails with [`GpuError::SnapshotUnsupported`] when the surface is not
    /// persistable.
    fn encode_surface(&self, format: SnapshotFormat, quality: f32) -> Result<String, GpuError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn program_entry_points() {
        assert_eq!(ProgramId::LayerBlend.entry_point(), "layer_blend");
        assert_eq!(ProgramId::RegionCopy.entry_point(), "region_copy");
        assert_eq!(ProgramId::Present.entry_point(), "present");
    }

    #[test]
    fn quad_uniforms_carry_no_optional_blocks() {
        let u = DrawUniforms::quad(Mat4::IDENTITY, 7);
        assert_eq!(u.source, 7);
        assert_eq!(u.opacity, 1.0);
        assert!(u.backdrop.is_none());
        assert!(u.mask.is_none());
    }

    #[test]
    fn snapshot_mime_types() {
        assert_eq!(SnapshotFormat::Png.mime_type(), "image/png");
        assert_eq!(SnapshotFormat::Jpeg.mime_type(), "image/jpeg");
        assert_eq!(SnapshotFormat::Webp.mime_type(), "image/webp");
    }

    #[test]
    fn pixel_formats_are_four_bytes() {
        assert_eq!(PixelFormat::Rgba8.bytes_per_pixel(), 4);
        assert_eq!(PixelFormat::Bgra8.bytes_per_pixel(), 4);
    }
}
