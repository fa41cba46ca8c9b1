pub mod hook;
pub mod loader;
