//! Layer 5: Engine extensions
//!
//! Execution hooks plugged into the `rqa` engine:
//!
//! - **executor**: rayon block dispatcher (`dispatch_parallel`)
//! - **gpu**: `wgpu` compute unit (`GpuUnit`, feature `gpu`)

/// Parallel dispatcher.
pub mod executor;

/// GPU compute unit.
#[cfg(feature = "gpu")]
pub mod gpu;
