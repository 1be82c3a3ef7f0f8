//! `strata-common` — Shared types, traits, and errors for the Strata compositor.
//!
//! This crate is the foundation the compositing crates depend on. It defines
//! the core abstractions:
//!
//! - **Types**: `ImageId`, `Size` (newtypes and geometry helpers)
//! - **GPU Trait**: `RenderBackend` (graphics-context abstraction with opaque handles)
//! - **Layer**: `Layer`, `LayerMask`, `Transform2D` (declarative layer stack)
//! - **Blend**: `BlendMode` (per-layer compositing function)
//! - **Bitmap**: `Bitmap` (decoded pixel data, released by ownership)
//! - **Errors**: `GpuError` (thiserror-based)
//! - **Config**: `CompositorConfig`, `EvictionPolicy`

pub mod bitmap;
pub mod blend;
pub mod config;
pub mod error;
pub mod gpu;
pub mod layer;
pub mod types;

// Re-export commonly used items at crate root
pub use bitmap::Bitmap;
pub use blend::BlendMode;
pub use config::{CompositorConfig, EvictionPolicy};
pub use error::GpuError;
pub use gpu::{
    BlendState, DrawCall, DrawUniforms, FilterMode, MaskUniforms, PixelFormat, ProgramId,
    RenderBackend, RenderTarget, SnapshotFormat, Texture, TextureDesc, WrapMode,
};
pub use layer::{Layer, LayerMask, MaskMode, Transform2D};
pub use types::{ImageId, Size};
