//! Spume Core Engine
//!
//! Position-based fluid solver with spray, foam, and bubble synthesis.

pub mod sim;

// Re-export main types
pub use sim::*;

// Re-export params from spume-params
pub use spume_params::*;
