use crate::error::NetworkError;
use crate::graph::{Anchor, NetworkSegment, NodeId, RoadNetwork, SegmentId};
use crate::util::geometry::{distance_to_line, square_around};

use geo::{coord, BoundingRect, Point, Rect};
use log::{debug, info};
use pathfinding::prelude::dijkstra;
use petgraph::prelude::DiGraphMap;
use rayon::prelude::*;
use rstar::{RTree, RTreeObject, AABB};
use rustc_hash::{FxHashMap, FxHasher};
use smallvec::SmallVec;

use std::fmt::{Debug, Formatter};
use std::hash::BuildHasherDefault;
use std::sync::Arc;
use std::time::Instant;
#[cfg(feature = "tracing")]
use tracing::Level;

/// Node topology. An edge `a -> b` lists every segment which can be
/// entered at `a` and left at `b`.
pub type Topology = DiGraphMap<NodeId, SmallVec<[SegmentId; 2]>, BuildHasherDefault<FxHasher>>;

/// Path costs are accumulated in whole centimeters.
const METER_TO_CM: f64 = 100.0;

/// Bounding box entry of a segment within the spatial index.
#[derive(Debug, Clone)]
pub struct IndexedSegment {
    pub id: SegmentId,
    envelope: AABB<Point>,
}

impl IndexedSegment {
    fn new(segment: &NetworkSegment) -> Option<Self> {
        let rect = segment.geometry.bounding_rect()?;

        Some(IndexedSegment {
            id: segment.id,
            envelope: AABB::from_corners(Point(rect.min()), Point(rect.max())),
        })
    }
}

impl RTreeObject for IndexedSegment {
    type Envelope = AABB<Point>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// A road network held entirely in memory.
///
/// Segments are indexed spatially by their bounding boxes; adjacency is
/// derived from their shared node identifiers and one-way restrictions.
pub struct MemoryNetwork {
    name: String,

    segments: FxHashMap<SegmentId, Arc<NetworkSegment>>,
    topology: Topology,
    index: RTree<IndexedSegment>,

    bounds: Option<Rect>,
}

impl Debug for MemoryNetwork {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "MemoryNetwork `{}` with Segments: {}", self.name, self.segments.len())
    }
}

/// A state of the bounded path search: standing on `segment`, about to
/// leave it through `exit`, having taken `hops` transitions so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct Hop {
    segment: SegmentId,
    exit: Option<NodeId>,
    hops: usize,
}

impl MemoryNetwork {
    pub fn new(name: impl Into<String>, segments: impl IntoIterator<Item = NetworkSegment>) -> Self {
        let start_time = Instant::now();
        let name = name.into();

        let segments = segments.into_iter().map(Arc::new).collect::<Vec<_>>();

        let entries = segments
            .par_iter()
            .filter_map(|segment| IndexedSegment::new(segment))
            .collect::<Vec<_>>();

        let bounds = segments
            .par_iter()
            .filter_map(|segment| segment.geometry.bounding_rect())
            .reduce_with(|a, b| {
                Rect::new(
                    coord! { x: a.min().x.min(b.min().x), y: a.min().y.min(b.min().y) },
                    coord! { x: a.max().x.max(b.max().x), y: a.max().y.max(b.max().y) },
                )
            });

        let mut topology = Topology::new();
        for segment in &segments {
            if segment.one_way.allows_entry(Anchor::Start) {
                Self::link(&mut topology, segment.start_node, segment.end_node, segment.id);
            }

            if segment.one_way.allows_entry(Anchor::End) {
                Self::link(&mut topology, segment.end_node, segment.start_node, segment.id);
            }
        }

        let index = RTree::bulk_load(entries);
        let segments = segments
            .into_iter()
            .map(|segment| (segment.id, segment))
            .collect::<FxHashMap<_, _>>();

        info!(
            "Built network `{name}` with {} segments and {} nodes in {:?}",
            segments.len(),
            topology.node_count(),
            start_time.elapsed()
        );

        MemoryNetwork {
            name,
            segments,
            topology,
            index,
            bounds,
        }
    }

    fn link(topology: &mut Topology, from: NodeId, to: NodeId, id: SegmentId) {
        match topology.edge_weight_mut(from, to) {
            Some(ids) => ids.push(id),
            None => {
                topology.add_edge(from, to, SmallVec::from_elem(id, 1));
            }
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> impl Iterator<Item = &Arc<NetworkSegment>> {
        self.segments.values()
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    /// Segments which can be entered at the node, in insertion order.
    fn enterable(&self, node: NodeId) -> impl Iterator<Item = &Arc<NetworkSegment>> {
        self.topology
            .edges(node)
            .flat_map(|(_, _, ids)| ids.iter())
            .filter_map(|id| self.segments.get(id))
    }

    fn successors(&self, hop: &Hop, max_hops: usize) -> Vec<(Hop, u64)> {
        if hop.hops >= max_hops {
            return vec![];
        }

        let Some(current) = self.segments.get(&hop.segment) else {
            return vec![];
        };

        let exits: SmallVec<[NodeId; 2]> = match hop.exit {
            Some(exit) => SmallVec::from_elem(exit, 1),
            None => [Anchor::End, Anchor::Start]
                .into_iter()
                .filter(|anchor| current.one_way.allows_exit(*anchor))
                .filter_map(|anchor| current.node_at(anchor))
                .collect(),
        };

        exits
            .into_iter()
            .flat_map(|node| {
                self.enterable(node)
                    .filter(|next| next.id != hop.segment)
                    .map(move |next| {
                        let state = Hop {
                            segment: next.id,
                            exit: Some(next.other_node(node)),
                            hops: hop.hops + 1,
                        };

                        (state, (next.length * METER_TO_CM).round() as u64)
                    })
            })
            .collect()
    }
}

impl RoadNetwork for MemoryNetwork {
    #[cfg_attr(feature = "tracing", tracing::instrument(level = Level::DEBUG, skip(self)))]
    fn nearest_segments(
        &self,
        point: &Point,
        radius: f64,
        max_count: usize,
    ) -> Result<Vec<(SegmentId, f64)>, NetworkError> {
        let square = square_around(*point, radius * 2.0);
        let bbox = AABB::from_corners(Point(square.min()), Point(square.max()));

        let mut found = self
            .index
            .locate_in_envelope_intersecting(&bbox)
            .filter_map(|entry| {
                let segment = self.segments.get(&entry.id)?;
                let distance = distance_to_line(point, &segment.geometry);

                (distance <= radius).then_some((entry.id, distance))
            })
            .collect::<Vec<_>>();

        found.sort_by(|(a_id, a), (b_id, b)| a.total_cmp(b).then(a_id.cmp(b_id)));
        found.truncate(max_count);

        Ok(found)
    }

    fn segment(&self, id: SegmentId) -> Result<Arc<NetworkSegment>, NetworkError> {
        self.segments
            .get(&id)
            .cloned()
            .ok_or(NetworkError::SegmentNotFound(id))
    }

    fn adjacent_segments(
        &self,
        id: SegmentId,
        exit: NodeId,
    ) -> Result<Vec<Arc<NetworkSegment>>, NetworkError> {
        if !self.segments.contains_key(&id) {
            return Err(NetworkError::SegmentNotFound(id));
        }

        let mut adjacent = self
            .enterable(exit)
            .filter(|segment| segment.id != id)
            .cloned()
            .collect::<Vec<_>>();

        // Parallel edges may list the same segment under several targets
        adjacent.dedup_by_key(|segment| segment.id);
        Ok(adjacent)
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(level = Level::DEBUG, skip(self)))]
    fn shortest_path(
        &self,
        from: SegmentId,
        to: SegmentId,
        max_hops: usize,
    ) -> Result<Option<Vec<Arc<NetworkSegment>>>, NetworkError> {
        let origin = self.segment(from)?;
        let target = self.segment(to)?;

        if origin.id == target.id {
            return Ok(Some(vec![origin]));
        }

        let start = Hop {
            segment: from,
            exit: None,
            hops: 0,
        };

        let Some((states, cost)) = dijkstra(
            &start,
            |hop| self.successors(hop, max_hops),
            |hop| hop.segment == to && hop.hops > 0,
        ) else {
            debug!("No path from {from} to {to} within {max_hops} hops");
            return Ok(None);
        };

        debug!("Path from {from} to {to} over {} segments, {cost}cm", states.len());

        states
            .into_iter()
            .map(|hop| self.segment(hop.segment))
            .collect::<Result<Vec<_>, _>>()
            .map(Some)
    }

    fn covered_area(&self) -> Option<Rect> {
        self.bounds
    }
}
