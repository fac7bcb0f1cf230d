//! Core sort engine module
//!
//! The recursive walker, the copy worker pool, and the engine that runs
//! them in order: walk everything, then drain the pool.

mod cancel;
mod engine;
mod pool;
mod walker;

pub use cancel::*;
pub use engine::*;
pub use pool::*;
pub use walker::*;
