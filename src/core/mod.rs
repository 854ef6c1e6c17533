//! Engine core
//!
//! Canonical model, normalization, provider adapters, routing, usage
//! accounting, and the cost model.

pub mod cost;
pub mod normalize;
pub mod providers;
pub mod router;
pub mod traits;
pub mod types;
pub mod usage;
