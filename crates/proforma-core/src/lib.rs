pub mod error;
pub mod time_value;
pub mod types;

pub mod development;
pub mod equity;

#[cfg(feature = "scenarios")]
pub mod scenarios;

pub use error::ProFormaError;
pub use types::*;

/// Standard result type for all pro forma operations
pub type ProFormaResult<T> = Result<T, ProFormaError>;
