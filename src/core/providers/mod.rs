//! Provider adapters
//!
//! One adapter per backend, each translating canonical requests into its
//! backend's wire format and wire responses back into the canonical
//! model.

pub mod inference;
pub mod rekognition;

pub use inference::InferenceProvider;
pub use rekognition::RekognitionProvider;
