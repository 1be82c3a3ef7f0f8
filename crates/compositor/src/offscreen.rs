//! Offscreen buffer management.
//!
//! The [`OffscreenBuffers`] manager owns the write/read pair of color-attached
//! render targets the layer stack composites into. The *write* target
//! accumulates the stack; the *read* target holds region snapshots of the
//! write target taken just before a layer whose blend mode samples the
//! destination (a color target cannot be read while bound for writing).
//!
//! Both targets share one extent: the logical image size rounded up to a
//! power of two so a full mip chain can be generated. Buffers persist across
//! frames; reallocation happens only when the rounded size changes.

use tracing::debug;

use strata_common::{
    FilterMode, GpuError, PixelFormat, RenderBackend, RenderTarget, Size, TextureDesc, WrapMode,
};

/// The write/read render target pair, both at `size` (power-of-two extents).
#[derive(Debug)]
pub struct BufferPair {
    /// Accumulates the composited stack.
    pub write: RenderTarget,
    /// Destination snapshot for non-trivial blend modes.
    pub read: RenderTarget,
    pub size: Size,
}

/// Allocates and recycles the offscreen buffer pair.
pub struct OffscreenBuffers {
    format: PixelFormat,
    buffers: Option<BufferPair>,
}

impl OffscreenBuffers {
    pub fn new(format: PixelFormat) -> Self {
        Self {
            format,
            buffers: None,
        }
    }

    /// The current pair, if any render has allocated one.
    pub fn current(&self) -> Option<&BufferPair> {
        self.buffers.as_ref()
    }

    /// Return buffers sized for `logical`, plus whether this call allocated a
    /// fresh pair. Reallocation happens only when the power-of-two rounded
    /// size differs from the current allocation; the previous generation
    /// (targets and color attachments) is disposed first. Fresh attachments
    /// hold no pixels, so the caller must recomposite before presenting them.
    pub fn ensure_capacity(
        &mut self,
        backend: &dyn RenderBackend,
        logical: Size,
    ) -> Result<(&BufferPair, bool), GpuError> {
        let rounded = logical.rounded_pow2();

        if let Some(pair) = self.buffers.take() {
            if pair.size == rounded {
                return Ok((self.buffers.insert(pair), false));
            }
            debug!(old = %pair.size, new = %rounded, "Offscreen size changed; disposing previous buffers");
            dispose_pair(backend, pair);
        }

        debug!(
            logical = %logical,
            rounded = %rounded,
            mip_levels = rounded.mipmap_count(),
            "Allocating offscreen buffer pair"
        );
        let write = allocate_target(backend, rounded, self.format)?;
        let read = match allocate_target(backend, rounded, self.format) {
            Ok(target) => target,
            Err(err) => {
                destroy_target(backend, &write);
                return Err(err);
            }
        };

        let pair = self.buffers.insert(BufferPair {
            write,
            read,
            size: rounded,
        });
        Ok((pair, true))
    }

    /// Release the current pair, if any. Idempotent.
    pub fn dispose(&mut self, backend: &dyn RenderBackend) {
        if let Some(pair) = self.buffers.take() {
            debug!(size = %pair.size, "Disposing offscreen buffers");
            dispose_pair(backend, pair);
        }
    }
}

fn allocate_target(
    backend: &dyn RenderBackend,
    size: Size,
    format: PixelFormat,
) -> Result<RenderTarget, GpuError> {
    let desc = TextureDesc {
        width: size.width,
        height: size.height,
        format,
        filter: FilterMode::LinearMipmapLinear,
        wrap: WrapMode::ClampToEdge,
        mipmaps: true,
    };
    let color = backend.create_texture(&desc, None)?;
    match backend.create_target(&color) {
        Ok(target) => Ok(target),
        Err(err) => {
            backend.destroy_texture(&color);
            Err(err)
        }
    }
}

fn destroy_target(backend: &dyn RenderBackend, target: &RenderTarget) {
    backend.destroy_target(target);
    backend.destroy_texture(&target.color);
}

fn dispose_pair(backend: &dyn RenderBackend, pair: BufferPair) {
    destroy_target(backend, &pair.write);
    destroy_target(backend, &pair.read);
}
