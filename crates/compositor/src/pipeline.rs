//! Layer stack rendering with the copy-then-blend protocol.
//!
//! Each layer is driven through an explicit per-layer state machine,
//! [`LayerPhase`]: `NeedsCopy → Blending → Done`. Trivially blended layers
//! (fixed-function blend state suffices) start directly at `Blending`. Layers
//! whose blend mode is a function of the destination color first snapshot the
//! region they cover from the write target into the read target, then blend
//! into the write target sampling that snapshot — the indirection that works
//! around the read-while-write restriction on a single color target.
//!
//! Layer order is strict: later layers sample the accumulated color of
//! earlier ones.

use glam::Mat4;
use tracing::{debug, warn};

use strata_common::{
    BlendState, DrawCall, DrawUniforms, Layer, MaskUniforms, ProgramId, RenderBackend, Size,
};

use crate::cache::TextureCache;
use crate::error::CompositorResult;
use crate::offscreen::BufferPair;

/// Transparent black, the initial contents of both offscreen targets.
pub const TRANSPARENT: [f32; 4] = [0.0, 0.0, 0.0, 0.0];

/// Per-layer progress through the copy-then-blend protocol.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LayerPhase {
    /// The destination region must be snapshotted into the read target
    /// before this layer can blend.
    NeedsCopy,
    /// Ready to draw into the write target.
    Blending,
    Done,
}

impl LayerPhase {
    /// Initial phase for a layer: trivially blended layers skip the copy.
    pub fn for_layer(layer: &Layer) -> Self {
        if layer.is_trivially_blended() {
            Self::Blending
        } else {
            Self::NeedsCopy
        }
    }

    pub fn advance(self) -> Self {
        match self {
            Self::NeedsCopy => Self::Blending,
            Self::Blending | Self::Done => Self::Done,
        }
    }
}

/// Counters for observable render work. Cheap to copy; cumulative over the
/// compositor's lifetime.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Completed offscreen stack recompositions.
    pub passes: u64,
    /// Draw calls submitted, presentation included.
    pub draws: u64,
    /// Write-to-read region snapshot draws.
    pub copy_draws: u64,
    /// Target clears issued.
    pub clears: u64,
    /// Images auto-evicted by policy.
    pub evicted: u64,
}

/// Composite the ordered layer stack into the offscreen write target.
///
/// An empty stack yields a fully transparent write target. Layers whose image
/// is not yet resident are skipped. Mipmaps on the write target's color
/// attachment are regenerated once after the full pass.
pub fn render_stack(
    backend: &dyn RenderBackend,
    cache: &TextureCache,
    layers: &[Layer],
    pair: &BufferPair,
    logical: Size,
    render_id: u64,
    stats: &mut RenderStats,
) -> CompositorResult<()> {
    backend.clear(Some(&pair.write), TRANSPARENT)?;
    backend.clear(Some(&pair.read), TRANSPARENT)?;
    stats.clears += 2;

    // Logical image space → clip space; shared by every layer draw.
    let projection = ortho_logical(logical);

    for (index, layer) in layers.iter().enumerate() {
        let Some(texture) = cache.mark_used(&layer.image, render_id) else {
            warn!(layer = index, image = %layer.image, "Layer image not resident; skipping");
            continue;
        };
        let mvp = projection * layer.transform.to_matrix();
        let mask = mask_uniforms(cache, layer, render_id);

        let mut phase = LayerPhase::for_layer(layer);
        while phase != LayerPhase::Done {
            match phase {
                LayerPhase::NeedsCopy => {
                    // Snapshot only the region this layer's quad covers; a
                    // full-target copy would be wasted work.
                    backend.draw(&DrawCall {
                        target: Some(&pair.read),
                        program: ProgramId::RegionCopy,
                        blend: BlendState::Replace,
                        uniforms: DrawUniforms::quad(mvp, pair.write.color.handle),
                    })?;
                    stats.draws += 1;
                    stats.copy_draws += 1;
                }
                LayerPhase::Blending => {
                    let native = layer.blend_mode.native_state();
                    backend.draw(&DrawCall {
                        target: Some(&pair.write),
                        program: ProgramId::LayerBlend,
                        // Non-trivial modes blend in the fragment stage and
                        // write with replace semantics.
                        blend: native.unwrap_or(BlendState::Replace),
                        uniforms: DrawUniforms {
                            mvp,
                            opacity: layer.opacity,
                            blend_index: layer.blend_mode.shader_index(),
                            source: texture.handle,
                            backdrop: native.is_none().then_some(pair.read.color.handle),
                            mask: mask.clone(),
                        },
                    })?;
                    stats.draws += 1;
                }
                LayerPhase::Done => {}
            }
            phase = phase.advance();
        }
    }

    backend.regenerate_mipmaps(&pair.write.color)?;
    stats.passes += 1;
    debug!(layers = layers.len(), render_id, "Recomposited layer stack");
    Ok(())
}

fn mask_uniforms(cache: &TextureCache, layer: &Layer, render_id: u64) -> Option<MaskUniforms> {
    let mask = layer.mask.as_ref()?;
    match cache.mark_used(&mask.image, render_id) {
        Some(texture) => Some(MaskUniforms {
            texture: texture.handle,
            mode_index: mask.mode.shader_index(),
            opacity: mask.opacity,
            transform: mask.transform.to_matrix(),
        }),
        None => {
            warn!(image = %mask.image, "Mask image not resident; drawing layer unmasked");
            None
        }
    }
}

fn ortho_logical(logical: Size) -> Mat4 {
    Mat4::orthographic_rh(
        0.0,
        logical.width as f32,
        logical.height as f32,
        0.0,
        -1.0,
        1.0,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;
    use strata_common::{BlendMode, ImageId};

    #[test]
    fn trivial_layer_starts_at_blending() {
        let layer = Layer::new(ImageId::new("a"));
        assert_eq!(LayerPhase::for_layer(&layer), LayerPhase::Blending);
    }

    #[test]
    fn destination_reading_layer_starts_at_needs_copy() {
        let mut layer = Layer::new(ImageId::new("a"));
        layer.blend_mode = BlendMode::Screen;
        assert_eq!(LayerPhase::for_layer(&layer), LayerPhase::NeedsCopy);
    }

    #[test]
    fn phases_advance_in_order_and_terminate() {
        let mut phase = LayerPhase::NeedsCopy;
        phase = phase.advance();
        assert_eq!(phase, LayerPhase::Blending);
        phase = phase.advance();
        assert_eq!(phase, LayerPhase::Done);
        assert_eq!(phase.advance(), LayerPhase::Done);
    }

    #[test]
    fn logical_projection_maps_image_corners_to_clip() {
        let m = ortho_logical(Size::new(100, 50));
        let top_left = m * Vec4::new(0.0, 0.0, 0.0, 1.0);
        let bottom_right = m * Vec4::new(100.0, 50.0, 0.0, 1.0);
        assert!((top_left.x + 1.0).abs() < 1e-5);
        assert!((top_left.y - 1.0).abs() < 1e-5);
        assert!((bottom_right.x - 1.0).abs() < 1e-5);
        assert!((bottom_right.y + 1.0).abs() < 1e-5);
    }
}
