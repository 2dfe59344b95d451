//! # pokedata shared
//!
//! Types used by every pokedata crate: configuration loading, the on-disk
//! dataset layout and the source `Record`.

pub mod config;
pub mod error;
pub mod layout;
pub mod record;

// Re-exports
pub use config::*;
pub use error::*;
pub use layout::DatasetLayout;
pub use record::Record;
