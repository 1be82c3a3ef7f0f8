//! Compositor facade — owns the cache, offscreen buffers, and viewport, and
//! drives one frame per [`render`](Compositor::render) call.
//!
//! The caller supplies declarative state (`set_layers`, `set_viewport`) and a
//! frame driver invokes `render` once per tick. Offscreen recomposition runs
//! only when the layer stack version moved since the last composited frame or
//! the offscreen buffers were reallocated; presentation runs every call.
//! `render` is not reentrant-safe; callers serialize invocations (one per
//! animation-frame tick).

use std::sync::Arc;

use tracing::debug;

use strata_common::{
    Bitmap, CompositorConfig, EvictionPolicy, ImageId, Layer, RenderBackend, Size, SnapshotFormat,
};

use crate::cache::{ImageFetcher, SharedLoad, TextureCache};
use crate::error::{CompositorError, CompositorResult};
use crate::offscreen::OffscreenBuffers;
use crate::pipeline::{self, RenderStats};
use crate::viewport::{self, Viewport};

/// Renders an ordered stack of image layers into an offscreen target and
/// presents a pan/zoom-adjusted view of it.
///
/// All GPU objects created through this instance (cached textures, offscreen
/// targets) are owned by it exclusively and released via [`dispose`]
/// (idempotent, also run on drop).
///
/// [`dispose`]: Compositor::dispose
pub struct Compositor {
    backend: Arc<dyn RenderBackend>,
    cache: TextureCache,
    offscreen: OffscreenBuffers,
    viewport: Viewport,
    layers: Vec<Layer>,
    /// Bumped on every stack replacement.
    stack_version: u64,
    /// Stack version the offscreen content currently reflects.
    rendered_version: u64,
    /// Bumped once per render call; stamps texture usage.
    render_id: u64,
    config: CompositorConfig,
    stats: RenderStats,
    disposed: bool,
}

impl Compositor {
    pub fn new(
        backend: Arc<dyn RenderBackend>,
        fetcher: ImageFetcher,
        config: CompositorConfig,
    ) -> Self {
        let cache = TextureCache::new(Arc::clone(&backend), fetcher, config.retain_bitmaps);
        Self {
            backend,
            cache,
            offscreen: OffscreenBuffers::new(config.offscreen_format),
            viewport: Viewport::new(Size::new(1, 1)),
            layers: Vec::new(),
            stack_version: 0,
            rendered_version: 0,
            render_id: 0,
            config,
            stats: RenderStats::default(),
            disposed: false,
        }
    }

    /// Replace the layer stack wholesale and bump the stack version.
    pub fn set_layers(&mut self, layers: Vec<Layer>) {
        self.layers = layers;
        self.stack_version += 1;
        debug!(
            layers = self.layers.len(),
            version = self.stack_version,
            "Layer stack replaced"
        );
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Cache introspection (residency, pending loads).
    pub fn cache(&self) -> &TextureCache {
        &self.cache
    }

    /// Cumulative render-work counters.
    pub fn stats(&self) -> RenderStats {
        self.stats
    }

    /// Request an image into the cache. See [`TextureCache::request`].
    pub fn request_image(&self, id: &ImageId, pre_decoded: Option<Bitmap>) -> SharedLoad {
        self.cache.request(id, pre_decoded)
    }

    /// Drop an image from the cache. See [`TextureCache::discard`].
    pub fn discard_image(&self, id: &ImageId) -> bool {
        self.cache.discard(id)
    }

    /// Render one frame: recomposite the offscreen stack if the layer state
    /// moved since the last composited frame (or the offscreen buffers were
    /// just reallocated), then present onto the visible surface, then apply
    /// the configured eviction policy.
    pub fn render(&mut self, surface_size: Size) -> CompositorResult<()> {
        self.render_id += 1;
        let surface = surface_size.as_vec2();
        let logical = self.viewport.image_size;

        let (pair, reallocated) = self
            .offscreen
            .ensure_capacity(self.backend.as_ref(), logical)?;

        // A freshly allocated pair holds no pixels; the stack must be
        // recomposited into it even when the version did not move.
        let mut recomposed = false;
        if reallocated || self.stack_version > self.rendered_version {
            pipeline::render_stack(
                self.backend.as_ref(),
                &self.cache,
                &self.layers,
                pair,
                logical,
                self.render_id,
                &mut self.stats,
            )?;
            self.rendered_version = self.stack_version;
            recomposed = true;
        }

        viewport::present(self.backend.as_ref(), &self.viewport, pair, surface, &mut self.stats)?;

        // Eviction only follows a recomposition: usage stamps are refreshed
        // there, and a presentation-only frame must not age anything out.
        if recomposed && self.config.eviction == EvictionPolicy::UnusedSinceLastRender {
            self.stats.evicted += self.cache.evict_unused(self.render_id);
        }
        Ok(())
    }

    /// Encode the visible surface's contents, e.g. as a data URL.
    ///
    /// Fails synchronously when the surface is not persistable.
    pub fn snapshot(&self, format: SnapshotFormat, quality: f32) -> CompositorResult<String> {
        Ok(self.backend.encode_surface(format, quality)?)
    }

    /// Read back the offscreen write target's pixels.
    pub fn read_offscreen(&self) -> CompositorResult<Vec<u8>> {
        let pair = self
            .offscreen
            .current()
            .ok_or(CompositorError::OffscreenUnavailable)?;
        Ok(self.backend.read_pixels(&pair.write)?)
    }

    /// Release every GPU resource owned by this instance. Idempotent; also
    /// runs on drop.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.offscreen.dispose(self.backend.as_ref());
        self.cache.dispose();
        debug!("Compositor disposed");
    }
}

impl Drop for Compositor {
    fn drop(&mut self) {
        self.dispose();
    }
}
