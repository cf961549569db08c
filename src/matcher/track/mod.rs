#[doc(hidden)]
pub mod entity;

#[doc(inline)]
pub use entity::*;
