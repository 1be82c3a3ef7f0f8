//! `strata-compositor` — GPU-accelerated image-layer compositing for the
//! Strata renderer.
//!
//! This crate turns a declarative, ordered stack of [`Layer`]s into pixels
//! through the backend-agnostic [`RenderBackend`] trait:
//!
//! 1. **Texture cache** — async image loading with fan-in deduplication and
//!    cooperative cancellation, via [`cache::TextureCache`]
//! 2. **Offscreen buffers** — the write/read target pair, power-of-two sized
//!    and mipmapped, via [`offscreen::OffscreenBuffers`]
//! 3. **Blend pipeline** — the copy-then-blend protocol per layer, via
//!    [`pipeline::render_stack`]
//! 4. **Viewport / presenter** — fit, zoom, and pan math plus the per-frame
//!    presentation draw, via [`viewport::Viewport`] and [`viewport::present`]
//!
//! [`Layer`]: strata_common::Layer
//! [`RenderBackend`]: strata_common::RenderBackend

pub mod cache;
pub mod compositor;
pub mod offscreen;
pub mod pipeline;
pub mod viewport;

mod error;

// Re-export primary API
pub use cache::{FetchFuture, ImageFetcher, LoadError, LoadOutcome, SharedLoad, TextureCache};
pub use compositor::Compositor;
pub use error::{CompositorError, CompositorResult};
pub use offscreen::{BufferPair, OffscreenBuffers};
pub use pipeline::{LayerPhase, RenderStats};
pub use viewport::{FitMode, Viewport};
