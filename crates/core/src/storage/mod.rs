pub mod encryption;
pub mod file;
pub mod format;
pub mod memory;
pub mod mirror;
pub mod traits;
