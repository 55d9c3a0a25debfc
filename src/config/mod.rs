//! Static entity descriptors and runtime settings.

pub mod types;
pub mod entities;
pub mod settings;

pub use types::*;
pub use entities::*;
pub use settings::*;
