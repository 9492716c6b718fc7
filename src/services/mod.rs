//! Services
//!
//! Business logic of the engine.

pub mod synthesis;
