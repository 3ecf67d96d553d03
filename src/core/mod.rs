//! Core Module - Fetch Pipeline
//!
//! Retry engine, head-block resolution, transfer scanning, security
//! enrichment, liquidity ranking and the run orchestrator.

pub mod block_height;
pub mod hunter;
pub mod ranker;
pub mod retry;
pub mod scanner;
pub mod security;

pub use block_height::*;
pub use hunter::*;
pub use retry::*;
pub use scanner::*;
pub use security::*;
