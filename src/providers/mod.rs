//! Providers Module - External Data Sources
//!
//! Alchemy (transfers, head block) and GoPlus (token security), plus the
//! traits the core pipeline uses to reach them.

pub mod alchemy;
pub mod goplus;
pub mod rpc;
pub mod source;

pub use alchemy::*;
pub use goplus::*;
pub use rpc::*;
pub use source::*;
