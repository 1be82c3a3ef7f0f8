//! Compositor configuration.

use serde::{Deserialize, Serialize};

use crate::gpu::PixelFormat;

/// Automatic eviction policy for cached layer images.
///
/// The age comparison is against the render id of the most recent `render()`
/// call, so an image loaded between frames can be evicted before it was ever
/// drawn. Whether that lazy pruning is wanted depends on the caller, which is
/// why the policy is a configuration knob and defaults to off.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EvictionPolicy {
    /// Cached images live until explicitly discarded.
    #[default]
    Disabled,
    /// After each render, discard every resident image that was not
    /// referenced by the most recent stack recomposition.
    UnusedSinceLastRender,
}

/// Top-level compositor configuration.
#[derive(Copy, Clone, Debug, Serialize, Deserialize)]
pub struct CompositorConfig {
    pub eviction: EvictionPolicy,
    /// Pixel format of the offscreen color attachments.
    pub offscreen_format: PixelFormat,
    /// Keep decoded bitmaps in the cache after GPU upload (enables CPU-side
    /// re-reads at the cost of memory).
    pub retain_bitmaps: bool,
}

impl Default for CompositorConfig {
    fn default() -> Self {
        Self {
            eviction: EvictionPolicy::Disabled,
            offscreen_format: PixelFormat::Rgba8,
            retain_bitmaps: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_keeps_cache_stable() {
        let config = CompositorConfig::default();
        assert_eq!(config.eviction, EvictionPolicy::Disabled);
        assert!(!config.retain_bitmaps);
        assert_eq!(config.offscreen_format, PixelFormat::Rgba8);
    }
}
