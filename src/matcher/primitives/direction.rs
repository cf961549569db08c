use crate::graph::Anchor;
use serde::{Deserialize, Serialize};

/// How a matched segment is traversed, named by its entry and exit anchors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    StartToEnd,
    EndToStart,
    /// Entered and left at the start node, a U-turn.
    StartToStart,
    /// Entered and left at the end node, a U-turn.
    EndToEnd,
    CenterToStart,
    CenterToEnd,
    CenterToCenter,
}

impl Direction {
    pub fn from_anchors(entry: Anchor, exit: Anchor) -> Direction {
        match (entry, exit) {
            (Anchor::Start, Anchor::End) => Direction::StartToEnd,
            (Anchor::End, Anchor::Start) => Direction::EndToStart,
            (Anchor::Start, Anchor::Start) => Direction::StartToStart,
            (Anchor::End, Anchor::End) => Direction::EndToEnd,
            (Anchor::Center, Anchor::Start) => Direction::CenterToStart,
            (Anchor::Center, Anchor::End) => Direction::CenterToEnd,
            // Leaving through the center is only known as "not yet decided"
            (Anchor::Center, Anchor::Center) => Direction::CenterToCenter,
            (Anchor::Start, Anchor::Center) => Direction::StartToEnd,
            (Anchor::End, Anchor::Center) => Direction::EndToStart,
        }
    }

    pub fn entry(&self) -> Anchor {
        match self {
            Direction::StartToEnd | Direction::StartToStart => Anchor::Start,
            Direction::EndToStart | Direction::EndToEnd => Anchor::End,
            Direction::CenterToStart | Direction::CenterToEnd | Direction::CenterToCenter => {
                Anchor::Center
            }
        }
    }

    pub fn exit(&self) -> Anchor {
        match self {
            Direction::StartToEnd | Direction::CenterToEnd | Direction::EndToEnd => Anchor::End,
            Direction::EndToStart | Direction::CenterToStart | Direction::StartToStart => {
                Anchor::Start
            }
            Direction::CenterToCenter => Anchor::Center,
        }
    }

    /// Entering and leaving through the same node.
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        matches!(self, Direction::StartToStart | Direction::EndToEnd)
    }

    /// The same traversal, driven the other way around.
    pub fn reversed(&self) -> Direction {
        Direction::from_anchors(self.exit(), self.entry())
    }
}
