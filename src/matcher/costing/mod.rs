#[doc(hidden)]
pub mod default;
#[doc(hidden)]
pub mod weighting;

#[doc(inline)]
pub use default::DefaultWeighting;
#[doc(inline)]
pub use weighting::WeightingStrategy;
