mod network;

pub use network::RoadNetwork;
