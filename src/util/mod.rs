pub mod geometry;

#[cfg(feature = "tracing")]
pub mod trace;
