use crate::graph::RoadClass;
use crate::util::geometry::line_length;

use geo::{LineString, Point};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Stable identifier of a [`NetworkSegment`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct SegmentId(pub u64);

/// Identifier of a junction node joining [`NetworkSegment`]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl Display for SegmentId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// A location on a segment at which it is entered or left.
///
/// `Center` denotes "somewhere along the geometry", used when the
/// traversal begins or ends between the two nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Anchor {
    Start,
    End,
    Center,
}

impl Anchor {
    /// The anchor on the far side of the segment, `Center` stays put.
    pub fn opposite(self) -> Anchor {
        match self {
            Anchor::Start => Anchor::End,
            Anchor::End => Anchor::Start,
            Anchor::Center => Anchor::Center,
        }
    }
}

/// Permitted travel along a segment, relative to its digitisation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum OneWay {
    #[default]
    Bidirectional,
    /// Travel only from the start node towards the end node.
    Forward,
    /// Travel only from the end node towards the start node.
    Backward,
}

impl OneWay {
    /// Parses an OSM `oneway` tag value, unknown values are treated as bidirectional.
    pub fn from_tag(value: &str) -> OneWay {
        match value {
            "yes" | "true" | "1" => OneWay::Forward,
            "-1" | "reverse" => OneWay::Backward,
            _ => OneWay::Bidirectional,
        }
    }

    /// Whether a vehicle may leave the segment through the given anchor.
    pub fn allows_exit(&self, anchor: Anchor) -> bool {
        match (self, anchor) {
            (OneWay::Forward, Anchor::Start) => false,
            (OneWay::Backward, Anchor::End) => false,
            _ => true,
        }
    }

    /// Whether a vehicle may enter the segment through the given anchor.
    pub fn allows_entry(&self, anchor: Anchor) -> bool {
        self.allows_exit(anchor.opposite())
    }
}

/// A directed-capable road segment between two junction nodes.
///
/// Owned by the graph backend and shared read-only with the matcher.
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkSegment {
    pub id: SegmentId,
    pub start_node: NodeId,
    pub end_node: NodeId,

    pub geometry: LineString,
    /// Haversine length of the geometry, in meters.
    pub length: f64,

    pub one_way: OneWay,
    pub class: RoadClass,
    pub urban: bool,
}

impl NetworkSegment {
    pub fn new(
        id: SegmentId,
        (start_node, end_node): (NodeId, NodeId),
        geometry: LineString,
        class: RoadClass,
        one_way: OneWay,
        urban: bool,
    ) -> Self {
        NetworkSegment {
            id,
            start_node,
            end_node,
            length: line_length(&geometry),
            geometry,
            one_way,
            class,
            urban,
        }
    }

    /// The node found at the anchor, `None` for the center.
    #[inline]
    pub fn node_at(&self, anchor: Anchor) -> Option<NodeId> {
        match anchor {
            Anchor::Start => Some(self.start_node),
            Anchor::End => Some(self.end_node),
            Anchor::Center => None,
        }
    }

    /// The anchor at which the node sits on this segment, if it touches it.
    #[inline]
    pub fn anchor_of(&self, node: NodeId) -> Option<Anchor> {
        if node == self.start_node {
            Some(Anchor::Start)
        } else if node == self.end_node {
            Some(Anchor::End)
        } else {
            None
        }
    }

    #[inline]
    pub fn touches(&self, node: NodeId) -> bool {
        self.start_node == node || self.end_node == node
    }

    /// The node on the other side of the segment from the given one.
    #[inline]
    pub fn other_node(&self, node: NodeId) -> NodeId {
        if node == self.start_node {
            self.end_node
        } else {
            self.start_node
        }
    }

    /// A node both segments are attached to, preferring `preferred` when shared.
    pub fn shared_node(&self, other: &NetworkSegment, preferred: Option<NodeId>) -> Option<NodeId> {
        if let Some(node) = preferred.filter(|node| self.touches(*node) && other.touches(*node)) {
            return Some(node);
        }

        [self.end_node, self.start_node]
            .into_iter()
            .find(|node| other.touches(*node))
    }

    pub fn start_point(&self) -> Option<Point> {
        self.geometry.points().next()
    }

    pub fn end_point(&self) -> Option<Point> {
        self.geometry.points().next_back()
    }
}
