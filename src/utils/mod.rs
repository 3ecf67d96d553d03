//! Utils Module - Helper Functions & Shared Utilities
//!
//! Constants shared across the crate plus the file adapters used by the binary.

pub mod constants;
pub mod io;

pub use constants::*;
pub use io::*;
