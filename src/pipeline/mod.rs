//! Pipeline module - selection, normalization, join and aggregation of impression exports

pub mod aggregate;
pub mod columns;
pub mod composition;
pub mod convention;
pub mod error;
pub mod loader;
pub mod normalize;
pub mod period;
pub mod selector;
pub mod session;
pub mod transform;

pub use aggregate::*;
pub use columns::*;
pub use composition::*;
pub use convention::*;
pub use error::{PipelineError, Result};
pub use loader::*;
pub use normalize::*;
pub use period::*;
pub use selector::*;
pub use session::*;
pub use transform::*;
