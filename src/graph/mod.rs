pub mod class;
pub mod impls;
pub mod item;
pub mod traits;

pub use class::{RoadClass, SpeedTable};
pub use impls::memory::MemoryNetwork;
pub use item::{Anchor, NetworkSegment, NodeId, OneWay, SegmentId};
pub use traits::RoadNetwork;
