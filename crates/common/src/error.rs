//! GPU backend error types (thiserror-based).

use thiserror::Error;

/// Errors raised by a [`crate::gpu::RenderBackend`].
///
/// Creation and precondition failures surface to the caller immediately and
/// are never retried or swallowed. Load cancellation is deliberately *not* an
/// error; it is a normal outcome of the texture cache's discard race.
#[derive(Error, Debug)]
pub enum GpuError {
    /// Allocating a GPU object failed. Fatal for the operation that needed it.
    #[error("GPU resource creation failed: {what}: {reason}")]
    ResourceCreation {
        what: &'static str,
        reason: String,
    },

    /// Input rejected synchronously at call time (malformed pixel data,
    /// format incompatible with the readback path).
    #[error("Unsupported input: {0}")]
    UnsupportedInput(String),

    /// A framebuffer was not render-complete for an operation requiring it.
    #[error("Render target incomplete: {0}")]
    IncompleteTarget(String),

    /// Snapshot requested on a surface that cannot be persisted.
    #[error("Snapshot unsupported: {0}")]
    SnapshotUnsupported(String),
}
