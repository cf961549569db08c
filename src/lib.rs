#![doc = include_str!("../README.md")]

#[cfg(feature = "mimalloc")]
use mimalloc::MiMalloc;
#[cfg_attr(feature = "mimalloc", global_allocator)]
#[cfg(feature = "mimalloc")]
static GLOBAL: MiMalloc = MiMalloc;

pub mod error;
pub mod graph;
pub mod matcher;
pub mod util;

#[cfg(test)]
pub(crate) mod fixture;

pub use error::{MatchError, NetworkError};
pub use graph::*;
pub use matcher::*;
