mod definition;

pub use definition::RoadNetwork;
