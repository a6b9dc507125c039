// Display helpers

pub mod format;

pub use format::*;
