//! Command implementations.

pub mod fix;

pub use self::fix::{execute_fix, output_paths, FixReport};
