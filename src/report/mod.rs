//! Report module - download buffers and terminal summaries

pub mod export;
pub mod summary;

pub use export::*;
pub use summary::*;
