//! Directory service layer.

mod compensation;
mod directory;

pub use directory::{Directory, DirectoryService, HealthReport};
