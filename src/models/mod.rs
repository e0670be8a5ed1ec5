pub mod appointment;
pub mod directory;
pub mod enums;

pub use appointment::*;
pub use directory::*;
pub use enums::*;
