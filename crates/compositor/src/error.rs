//! Compositor error types.

use thiserror::Error;

/// Errors that can occur while compositing or presenting.
#[derive(Debug, Error)]
pub enum CompositorError {
    /// A GPU backend operation failed.
    #[error("GPU error: {0}")]
    Gpu(#[from] strata_common::GpuError),

    /// Offscreen readback requested before any render allocated the buffers.
    #[error("Offscreen buffers not allocated; render() has not run yet")]
    OffscreenUnavailable,
}

/// Convenience Result type for compositor operations.
pub type CompositorResult<T> = Result<T, CompositorError>;

#[cfg(test)]
mod tests {
    use super::*;
    use strata_common::GpuError;

    #[test]
    fn gpu_error_converts() {
        let gpu = GpuError::IncompleteTarget("missing color attachment".into());
        let err: CompositorError = gpu.into();
        assert!(matches!(err, CompositorError::Gpu(_)));
        assert!(err.to_string().contains("missing color attachment"));
    }

    #[test]
    fn offscreen_unavailable_displays_hint() {
        let err = CompositorError::OffscreenUnavailable;
        assert!(err.to_string().contains("render()"));
    }
}
