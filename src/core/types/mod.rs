//! Shared type definitions
//!
//! The canonical result model every provider response is normalized into,
//! plus the engine-wide error taxonomy.

pub mod canonical;
pub mod errors;

pub use canonical::*;
pub use errors::{EngineError, EngineResult};
