use crate::fixture::{dead_end_one_way, ladder, Harness, DEAD_END_TRACK, LADDER_STRAIGHT};
use crate::graph::{NodeId, RoadNetwork, SegmentId};
use crate::matcher::{BoundedCache, Branch, Direction, MatchedSegment, SegmentFlags, WeightingStrategy};

use approx::assert_relative_eq;

fn matched(harness: &Harness, id: u64, direction: Direction, start: usize, end: usize) -> MatchedSegment {
    let segment = harness
        .network
        .segment(SegmentId(id))
        .expect("fixture segment must exist");

    let mut matched = MatchedSegment::new(segment, start, direction);
    harness.context().points().assign(&mut matched, start, end);
    matched
}

fn straight(harness: &Harness) -> Branch {
    Branch::new(vec![
        matched(harness, 1, Direction::CenterToEnd, 0, 5),
        matched(harness, 2, Direction::StartToEnd, 5, 10),
        matched(harness, 3, Direction::StartToEnd, 10, 15),
    ])
}

#[test]
fn extending_a_clone_leaves_the_original_untouched() {
    let harness = Harness::new(ladder(), LADDER_STRAIGHT);
    let original = straight(&harness);

    let mut extended = original.clone();
    extended.push(matched(&harness, 4, Direction::StartToEnd, 15, 20));
    extended.edit(|segments| segments[0].flags.u_turn = true);

    assert_eq!(original.len(), 3);
    assert_eq!(original.frontier(), 15);
    assert!(!original.segments()[0].is_u_turn());

    assert_eq!(extended.len(), 4);
    assert_eq!(extended.frontier(), 20);
    assert_eq!(extended.matched_points(), 20);
}

#[test]
fn mutation_clears_the_cached_score() {
    let harness = Harness::new(ladder(), LADDER_STRAIGHT);
    let mut branch = straight(&harness);

    branch.rescore(&harness.weighting);
    assert!(branch.matched_factor().is_some());

    branch.pop();
    assert!(branch.matched_factor().is_none());
    assert_eq!(branch.frontier(), 10);
}

#[test]
fn segments_are_equal_when_their_ranges_overlap() {
    let harness = Harness::new(ladder(), LADDER_STRAIGHT);

    let early = matched(&harness, 2, Direction::StartToEnd, 5, 8);
    let overlapping = matched(&harness, 2, Direction::StartToEnd, 7, 9);
    let late = matched(&harness, 2, Direction::StartToEnd, 8, 11);
    let after = matched(&harness, 2, Direction::StartToEnd, 9, 11);
    let reversed = matched(&harness, 2, Direction::EndToStart, 5, 8);

    assert_eq!(early, overlapping);
    assert_ne!(early, reversed);

    // Adjacent half-open ranges share no point
    assert_ne!(early, late);
    assert_ne!(early, after);

    // Passing through at a border still counts as the same segment
    let passed = matched(&harness, 2, Direction::StartToEnd, 8, 8);
    assert_eq!(early, passed);
    assert_eq!(passed, late);

    assert!(!early.same_position(&late));
    assert!(late.same_position(&after));
    assert!(!late.same_match(&after));
}

#[test]
fn detached_prefix_is_restored_in_front() {
    let harness = Harness::new(ladder(), LADDER_STRAIGHT);
    let mut branch = straight(&harness);
    let original = branch.clone();

    let certain = branch.detach_prefix(2);
    assert_eq!(certain.len(), 2);
    assert_eq!(branch.len(), 1);
    assert_eq!(branch.certain_len(), 2);
    assert_eq!(branch.frontier(), 15);

    // The detached prefix still counts towards the branch totals
    assert_eq!(branch.first_index(), 0);
    assert_eq!(branch.matched_points(), original.matched_points());
    assert_relative_eq!(branch.distance_sum(), original.distance_sum());
    assert_relative_eq!(branch.length(), original.length());

    // Only the remaining segment is re-resolved, against the detached end
    branch.correct_directions_from(0);
    assert_eq!(branch.segments()[0].direction(), Direction::StartToEnd);

    branch.detach_prefix(1);
    assert!(branch.is_empty());
    assert_eq!(branch.frontier(), 15);

    let mut prefix = certain;
    prefix.push(original.segments()[2].clone());

    branch.reattach(&prefix);
    assert!(branch.same_route(&original));
    assert_eq!(branch.certain_len(), 0);
    assert_eq!(branch.matched_points(), original.matched_points());
    assert_relative_eq!(branch.length(), original.length());
}

#[test]
fn detached_prefix_keeps_the_score() {
    let harness = Harness::new(ladder(), LADDER_STRAIGHT);
    let weighting = &harness.weighting;

    let mut turned = matched(&harness, 1, Direction::CenterToEnd, 0, 5);
    turned.flags.u_turn = true;

    let mut branch = Branch::new(vec![
        turned,
        matched(&harness, 5, Direction::StartToEnd, 5, 5),
        matched(&harness, 2, Direction::StartToEnd, 7, 11),
    ]);
    branch.recount_uturns();

    let before = weighting.score(&branch);
    branch.detach_prefix(2);

    assert_eq!(branch.uturns(), 1);
    assert_eq!(branch.empty_segments(), 1);
    assert_relative_eq!(weighting.score(&branch), before, epsilon = 1e-9);

    branch.recount_uturns();
    assert_eq!(branch.uturns(), 1);
}

#[test]
fn directions_follow_the_shared_nodes() {
    let harness = Harness::new(ladder(), LADDER_STRAIGHT);

    let mut branch = Branch::new(vec![
        matched(&harness, 1, Direction::CenterToStart, 0, 5),
        matched(&harness, 2, Direction::CenterToCenter, 5, 10),
        matched(&harness, 6, Direction::CenterToCenter, 10, 11),
    ]);

    branch.correct_directions_from(0);

    let directions = branch.segments().iter().map(MatchedSegment::direction).collect::<Vec<_>>();
    assert_eq!(
        directions,
        vec![Direction::CenterToEnd, Direction::StartToEnd, Direction::StartToEnd]
    );
}

#[test]
fn reversing_segment_keeps_a_degenerate_direction() {
    let harness = Harness::new(ladder(), LADDER_STRAIGHT);

    let mut turned = matched(&harness, 2, Direction::StartToEnd, 5, 7);
    turned.flags.u_turn = true;

    let mut branch = Branch::new(vec![
        matched(&harness, 1, Direction::CenterToEnd, 0, 5),
        turned,
        matched(&harness, 1, Direction::EndToStart, 7, 8),
    ]);

    branch.correct_directions_from(0);
    assert_eq!(branch.segments()[1].direction(), Direction::StartToStart);
    assert_eq!(branch.segments()[2].direction(), Direction::EndToStart);
}

#[test]
fn skipped_part_keeps_its_own_entry() {
    let harness = Harness::new(ladder(), LADDER_STRAIGHT);

    let skipped = matched(&harness, 3, Direction::CenterToEnd, 12, 15).with_flags(SegmentFlags {
        after_skipped_part: true,
        ..SegmentFlags::default()
    });

    let mut branch = Branch::new(vec![matched(&harness, 1, Direction::CenterToEnd, 0, 5), skipped]);
    branch.correct_directions_from(0);

    assert_eq!(branch.segments()[1].direction(), Direction::CenterToEnd);
}

#[test]
fn undecided_exit_honours_one_way_restrictions() {
    let harness = Harness::new(ladder(), LADDER_STRAIGHT);
    let two_way = matched(&harness, 2, Direction::CenterToCenter, 5, 6);
    assert_eq!(two_way.exit_nodes().collect::<Vec<_>>(), vec![NodeId(3), NodeId(2)]);

    let harness = Harness::new(dead_end_one_way(), DEAD_END_TRACK);
    let one_way = matched(&harness, 100, Direction::CenterToCenter, 0, 1);
    assert_eq!(one_way.exit_nodes().collect::<Vec<_>>(), vec![NodeId(102)]);

    let decided = matched(&harness, 100, Direction::StartToEnd, 0, 1);
    assert_eq!(decided.exit_nodes().collect::<Vec<_>>(), vec![NodeId(102)]);
}

#[test]
fn monotonic_ranges_never_move_backwards() {
    let harness = Harness::new(ladder(), LADDER_STRAIGHT);
    assert!(straight(&harness).is_monotonic(LADDER_STRAIGHT.len()));

    let overlapping = Branch::new(vec![
        matched(&harness, 1, Direction::CenterToEnd, 0, 6),
        matched(&harness, 2, Direction::StartToEnd, 5, 10),
    ]);
    assert!(!overlapping.is_monotonic(LADDER_STRAIGHT.len()));

    let beyond = Branch::new(vec![matched(&harness, 1, Direction::CenterToEnd, 0, 5)]);
    assert!(!beyond.is_monotonic(4));
}

#[test]
fn unmatched_tail_is_penalised() {
    let harness = Harness::new(ladder(), LADDER_STRAIGHT);
    let complete = straight(&harness);

    let mut abandoned = complete.clone();
    abandoned.finish_with_tail(LADDER_STRAIGHT.len());

    assert!(abandoned.is_finished());
    assert_eq!(abandoned.unmatched_tail(), 5);
    assert!(harness.weighting.score(&abandoned) > harness.weighting.score(&complete));
}

#[test]
fn linestring_follows_the_direction_of_travel() {
    let harness = Harness::new(ladder(), LADDER_STRAIGHT);

    let branch = Branch::new(vec![
        matched(&harness, 2, Direction::EndToStart, 5, 6),
        matched(&harness, 1, Direction::EndToStart, 6, 7),
    ]);

    let line = branch.linestring();
    assert_eq!(line.0.len(), 3);
    assert!(line.0[0].x > line.0[1].x && line.0[1].x > line.0[2].x);
    assert!(branch.wkt().starts_with("LINESTRING"));
}

#[test]
fn cache_evicts_the_least_recently_used_entry() {
    let mut cache: BoundedCache<u32, String> = BoundedCache::new(2);
    let calculate = |key: u32| move || Ok::<_, ()>(key.to_string());

    cache.query(1, calculate(1)).expect("must calculate");
    cache.query(2, calculate(2)).expect("must calculate");
    cache.query(1, calculate(1)).expect("must hit");
    cache.query(3, calculate(3)).expect("must calculate");

    assert_eq!(cache.len(), 2);
    assert_eq!((cache.hits(), cache.misses()), (1, 3));

    // Entry 2 was the least recently used one
    let value = cache.query(2, calculate(2)).expect("must recalculate");
    assert_eq!(value.as_str(), "2");
    assert_eq!(cache.misses(), 4);

    cache.query(3, calculate(3)).expect("must hit");
    assert_eq!(cache.hits(), 2);
}

#[test]
fn failed_calculations_are_not_cached() {
    let mut cache: BoundedCache<u32, u32> = BoundedCache::new(4);

    assert_eq!(cache.query(1, || Err("unavailable")), Err("unavailable"));
    assert!(cache.is_empty());

    let value = cache.query(1, || Ok::<_, &str>(7)).expect("must calculate");
    assert_eq!(*value, 7);
    assert_eq!(cache.misses(), 2);

    cache.clear();
    assert!(cache.is_empty());
}
