//! Texture cache and asynchronous image loader.
//!
//! The [`TextureCache`] owns the mapping from logical image identifiers to
//! GPU-resident textures. Three structures cooperate:
//!
//! - the **desired set** — the authoritative record of which identifiers the
//!   caller currently wants resident. Mutated synchronously by
//!   [`request`](TextureCache::request) / [`discard`](TextureCache::discard)
//!   and re-consulted after every suspension point to detect cancellation;
//! - the **pending map** — the authoritative load per identifier. Every caller
//!   requesting an identifier with a load in flight receives a clone of the
//!   same shared future (fan-in deduplication). Each load carries a token; a
//!   load that settles to find its map entry gone or replaced by a newer
//!   load (discard followed by re-request) cancels itself and leaves the
//!   newer entry untouched;
//! - the **resident map** — identifiers whose texture upload completed while
//!   they were still desired.
//!
//! Cancellation is cooperative: nothing preempts an in-flight fetch, but a
//! load whose identifier left the desired set while it was suspended drops
//! its decoded bitmap and settles as [`LoadOutcome::Cancelled`] without ever
//! touching the resident map.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use futures_util::future::{BoxFuture, Shared};
use futures_util::FutureExt;
use parking_lot::Mutex;
use thiserror::Error;
use tracing::{debug, warn};

use strata_common::{
    Bitmap, FilterMode, GpuError, ImageId, RenderBackend, Texture, TextureDesc, WrapMode,
};

/// How a load settled. Cancellation is a normal outcome, not an error.
#[derive(Clone, Debug, PartialEq)]
pub enum LoadOutcome {
    /// The image is resident; the texture is ready to sample.
    Ready(Texture),
    /// The identifier was discarded while the fetch was in flight.
    Cancelled,
}

/// Errors a load can settle with. Cloneable so every fan-in subscriber of a
/// shared load observes the same failure.
#[derive(Clone, Debug, Error)]
pub enum LoadError {
    /// The caller-supplied fetch/decode function failed. Not retried here;
    /// retry policy belongs to the caller.
    #[error("image fetch failed for {id}: {reason}")]
    Fetch { id: ImageId, reason: String },

    /// Uploading the decoded bitmap to the GPU failed.
    #[error("texture upload failed: {0}")]
    Upload(Arc<GpuError>),
}

/// Future type produced by the caller-supplied fetcher.
pub type FetchFuture = BoxFuture<'static, Result<Bitmap, LoadError>>;

/// Opaque asynchronous fetch/decode function: identifier in, decoded bitmap
/// out. Network access, decoding, and retry policy all live behind it.
pub type ImageFetcher = Arc<dyn Fn(ImageId) -> FetchFuture + Send + Sync>;

/// A deduplicated in-flight (or settled) load, awaitable by any number of
/// callers.
pub type SharedLoad = Shared<BoxFuture<'static, Result<LoadOutcome, LoadError>>>;

/// A cached, GPU-resident layer image.
#[derive(Debug)]
pub struct LayerImage {
    texture: Texture,
    /// Decoded pixels retained past upload when configured.
    bitmap: Option<Bitmap>,
    /// Render id of the last stack recomposition that referenced this image.
    last_used_generation: u64,
}

impl LayerImage {
    pub fn texture(&self) -> &Texture {
        &self.texture
    }

    pub fn last_used_generation(&self) -> u64 {
        self.last_used_generation
    }
}

/// A pending-map entry: the shared future plus the token identifying the
/// load that owns the entry.
struct PendingLoad {
    token: u64,
    load: SharedLoad,
}

#[derive(Default)]
struct CacheState {
    desired: HashSet<ImageId>,
    pending: HashMap<ImageId, PendingLoad>,
    resident: HashMap<ImageId, LayerImage>,
    next_token: u64,
}

/// Owns texture residency for one compositor instance.
pub struct TextureCache {
    backend: Arc<dyn RenderBackend>,
    fetcher: ImageFetcher,
    retain_bitmaps: bool,
    state: Arc<Mutex<CacheState>>,
}

impl TextureCache {
    pub fn new(backend: Arc<dyn RenderBackend>, fetcher: ImageFetcher, retain_bitmaps: bool) -> Self {
        Self {
            backend,
            fetcher,
            retain_bitmaps,
            state: Arc::new(Mutex::new(CacheState::default())),
        }
    }

    /// Request that `id` become resident, optionally supplying already
    /// decoded pixels (skips the fetch).
    ///
    /// Marks the identifier desired synchronously. Returns the existing
    /// shared load when one is in flight; resolves immediately when the image
    /// is already resident; otherwise starts a new load.
    pub fn request(&self, id: &ImageId, pre_decoded: Option<Bitmap>) -> SharedLoad {
        let mut state = self.state.lock();
        state.desired.insert(id.clone());

        if let Some(image) = state.resident.get(id) {
            let texture = image.texture.clone();
            return futures_util::future::ready(Ok(LoadOutcome::Ready(texture)))
                .boxed()
                .shared();
        }

        if let Some(pending) = state.pending.get(id) {
            debug!(image = %id, "Joining in-flight load");
            return pending.load.clone();
        }

        let token = state.next_token;
        state.next_token += 1;

        debug!(image = %id, token, pre_decoded = pre_decoded.is_some(), "Starting load");
        let load = Self::load(
            Arc::clone(&self.backend),
            Arc::clone(&self.fetcher),
            Arc::clone(&self.state),
            id.clone(),
            token,
            pre_decoded,
            self.retain_bitmaps,
        )
        .boxed()
        .shared();
        state.pending.insert(
            id.clone(),
            PendingLoad {
                token,
                load: load.clone(),
            },
        );
        load
    }

    async fn load(
        backend: Arc<dyn RenderBackend>,
        fetcher: ImageFetcher,
        state: Arc<Mutex<CacheState>>,
        id: ImageId,
        token: u64,
        pre_decoded: Option<Bitmap>,
        retain_bitmaps: bool,
    ) -> Result<LoadOutcome, LoadError> {
        // Suspension point: the fetch may yield to the scheduler. The desired
        // set must be re-checked once it resolves.
        let fetched = match pre_decoded {
            Some(bitmap) => Ok(bitmap),
            None => (fetcher)(id.clone()).await,
        };

        let mut state = state.lock();
        // A discard followed by a re-request replaces this entry with a newer
        // load's; only the owner removes it.
        let owns_entry = state
            .pending
            .get(&id)
            .is_some_and(|pending| pending.token == token);
        if owns_entry {
            state.pending.remove(&id);
        }

        let bitmap = match fetched {
            Ok(bitmap) => bitmap,
            Err(err) => {
                warn!(image = %id, error = %err, "Image fetch failed");
                return Err(err);
            }
        };

        if !owns_entry || !state.desired.contains(&id) {
            // Discarded (and possibly superseded by a newer load) while
            // suspended; the decoded bitmap is dropped here.
            debug!(image = %id, token, "Load settled after discard; cancelling");
            return Ok(LoadOutcome::Cancelled);
        }

        let size = bitmap.size();
        let desc = TextureDesc {
            width: size.width,
            height: size.height,
            format: bitmap.format(),
            filter: FilterMode::Linear,
            wrap: WrapMode::ClampToEdge,
            mipmaps: false,
        };
        let texture = backend
            .create_texture(&desc, Some(bitmap.data()))
            .map_err(|err| LoadError::Upload(Arc::new(err)))?;

        debug!(image = %id, size = %size, handle = texture.handle, "Image resident");
        if let Some(previous) = state.resident.insert(
            id,
            LayerImage {
                texture: texture.clone(),
                bitmap: retain_bitmaps.then_some(bitmap),
                last_used_generation: 0,
            },
        ) {
            // The token check makes a displaced entry unreachable on the
            // normal paths; release its texture rather than leak it.
            backend.destroy_texture(&previous.texture);
        }
        Ok(LoadOutcome::Ready(texture))
    }

    /// Drop `id` from the desired set and release any resident texture.
    ///
    /// A load in flight for `id` is not preempted; it observes the missing
    /// desired entry when it settles and cancels itself. Returns `false` when
    /// the identifier was not desired (no-op).
    pub fn discard(&self, id: &ImageId) -> bool {
        let mut state = self.state.lock();
        let was_desired = state.desired.remove(id);
        if let Some(image) = state.resident.remove(id) {
            debug!(image = %id, handle = image.texture.handle, "Discarding resident image");
            self.backend.destroy_texture(&image.texture);
        }
        state.pending.remove(id);
        was_desired
    }

    /// Stamp the image's usage with the current render id and return its
    /// texture, or `None` when it is not resident.
    pub fn mark_used(&self, id: &ImageId, render_id: u64) -> Option<Texture> {
        let mut state = self.state.lock();
        let image = state.resident.get_mut(id)?;
        image.last_used_generation = render_id;
        Some(image.texture.clone())
    }

    /// Decoded pixels retained for `id` past upload. Always `None` unless the
    /// cache was built with `retain_bitmaps`.
    pub fn retained_bitmap(&self, id: &ImageId) -> Option<Bitmap> {
        self.state
            .lock()
            .resident
            .get(id)
            .and_then(|image| image.bitmap.clone())
    }

    /// Discard every resident image whose last use predates `render_id`.
    /// Returns the number of images evicted.
    pub fn evict_unused(&self, render_id: u64) -> u64 {
        let stale: Vec<ImageId> = {
            let state = self.state.lock();
            state
                .resident
                .iter()
                .filter(|(_, image)| image.last_used_generation < render_id)
                .map(|(id, _)| id.clone())
                .collect()
        };
        for id in &stale {
            debug!(image = %id, render_id, "Evicting unused image");
            self.discard(id);
        }
        stale.len() as u64
    }

    pub fn is_desired(&self, id: &ImageId) -> bool {
        self.state.lock().desired.contains(id)
    }

    pub fn is_pending(&self, id: &ImageId) -> bool {
        self.state.lock().pending.contains_key(id)
    }

    pub fn is_resident(&self, id: &ImageId) -> bool {
        self.state.lock().resident.contains_key(id)
    }

    pub fn resident_count(&self) -> usize {
        self.state.lock().resident.len()
    }

    pub fn pending_count(&self) -> usize {
        self.state.lock().pending.len()
    }

    /// Release every resident texture and clear all bookkeeping. Idempotent;
    /// also runs on drop.
    pub fn dispose(&self) {
        let mut state = self.state.lock();
        for (id, image) in state.resident.drain() {
            debug!(image = %id, handle = image.texture.handle, "Releasing texture on dispose");
            self.backend.destroy_texture(&image.texture);
        }
        state.desired.clear();
        state.pending.clear();
    }
}

impl Drop for TextureCache {
    fn drop(&mut self) {
        self.dispose();
    }
}
