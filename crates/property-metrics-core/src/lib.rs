pub mod error;
pub mod time_value;
pub mod types;

#[cfg(feature = "real_estate")]
pub mod real_estate;

pub use error::PropertyMetricsError;
pub use types::*;

/// Standard result type for all property-metrics operations
pub type PropertyMetricsResult<T> = Result<T, PropertyMetricsError>;
