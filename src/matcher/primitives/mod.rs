pub mod branch;
pub mod cache;
pub mod cancel;
pub mod direction;
pub mod segment;

pub use branch::{AlternativePath, Branch, SearchCursor};
pub use cache::{BoundedCache, MatchCaches};
pub use cancel::CancellationToken;
pub use direction::Direction;
pub use segment::{MatchedSegment, SegmentFlags};

#[cfg(test)]
mod test;
