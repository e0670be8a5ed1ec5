//! Repository layer: entity-scoped database operations.

pub mod appointment;
pub mod directory;

pub use appointment::*;
pub use directory::*;
