//! Snapping of dragged bounds to edges, centers and gaps of surrounding contents.
//!
//! Every candidate alignment goes through the same running reduction: per axis only
//! the nearest offsets are kept, ties included. Snapping happens independently per
//! rotation context, since alignment is only meaningful within one frame.

use crate::math::{Axis, Range, decompose, local_axis, range_intersection, ranges_overlap, rotate_vec, round};
use crate::model::ContentId;
use kurbo::{Affine, Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Default snapping distance (in context units).
pub const SNAP_THRESHOLD: f64 = 8.0;

/// Default cap on gaps collected per axis and context.
pub const MAX_GAPS_PER_AXIS: usize = 512;

/// Angle snap increment in degrees.
pub const ANGLE_SNAP_INCREMENT: f64 = 15.0;

/// Snap an angle to the nearest increment.
/// Returns the snapped angle in degrees (0-360).
pub fn snap_angle(angle_degrees: f64, increment: f64) -> f64 {
    if increment <= 0.0 {
        return angle_degrees;
    }
    let snapped = (angle_degrees / increment).round() * increment;
    if snapped < 0.0 {
        snapped + 360.0
    } else if snapped >= 360.0 {
        snapped - 360.0
    } else {
        snapped
    }
}

/// Which alignments are looked for, and how far away.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapOptions {
    pub threshold: f64,
    pub max_gaps_per_axis: usize,
    pub edges: bool,
    pub centers: bool,
    pub gaps: bool,
}

impl Default for SnapOptions {
    fn default() -> Self {
        Self {
            threshold: SNAP_THRESHOLD,
            max_gaps_per_axis: MAX_GAPS_PER_AXIS,
            edges: true,
            centers: true,
            gaps: true,
        }
    }
}

/// Bounds of a content that can be snapped to, in its context frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceBounds {
    pub id: ContentId,
    pub bounds: Rect,
}

impl ReferenceBounds {
    pub fn new(id: impl Into<ContentId>, bounds: Rect) -> Self {
        Self { id: id.into(), bounds }
    }
}

fn span(rect: Rect, axis: Axis) -> Range {
    match axis {
        Axis::X => (rect.x0, rect.x1),
        Axis::Y => (rect.y0, rect.y1),
    }
}

fn center(range: Range) -> f64 {
    (range.0 + range.1) / 2.0
}

/// Point with `along` on `axis` and `across` on the other axis.
fn axis_point(axis: Axis, along: f64, across: f64) -> Point {
    match axis {
        Axis::X => Point::new(along, across),
        Axis::Y => Point::new(across, along),
    }
}

/// Empty space between two references along one axis.
#[derive(Debug, Clone, PartialEq)]
pub struct Gap {
    pub start: ReferenceBounds,
    pub end: ReferenceBounds,
    /// Facing side of `start`.
    pub start_side: (Point, Point),
    /// Facing side of `end`.
    pub end_side: (Point, Point),
    pub length: f64,
    /// Shared extent of both references on the perpendicular axis.
    pub overlap: Range,
}

/// Gaps of one context, per axis.
#[derive(Debug, Clone, Default)]
pub struct Gaps {
    pub horizontal: Vec<Gap>,
    pub vertical: Vec<Gap>,
}

impl Gaps {
    pub fn along(&self, axis: Axis) -> &[Gap] {
        match axis {
            Axis::X => &self.horizontal,
            Axis::Y => &self.vertical,
        }
    }
}

/// Find the gaps between references: pairs that are apart on one axis and overlap
/// on the other.
pub fn get_gaps(references: &[ReferenceBounds], max_per_axis: usize) -> Gaps {
    Gaps {
        horizontal: gaps_along(references, Axis::X, max_per_axis),
        vertical: gaps_along(references, Axis::Y, max_per_axis),
    }
}

fn gaps_along(references: &[ReferenceBounds], axis: Axis, max: usize) -> Vec<Gap> {
    let key = |r: &ReferenceBounds| {
        let (min, max) = span(r.bounds, axis);
        let (across_min, across_max) = span(r.bounds, axis.other());
        (min, across_min, max, across_max)
    };
    let mut sorted: Vec<&ReferenceBounds> = references.iter().collect();
    sorted.sort_by(|a, b| {
        let (ka, kb) = (key(a), key(b));
        ka.0.total_cmp(&kb.0)
            .then(ka.1.total_cmp(&kb.1))
            .then(ka.2.total_cmp(&kb.2))
            .then(ka.3.total_cmp(&kb.3))
            .then_with(|| a.id.cmp(&b.id))
    });

    let mut gaps = Vec::new();
    for (i, start) in sorted.iter().enumerate() {
        for end in &sorted[i + 1..] {
            if gaps.len() >= max {
                log::trace!("gap cap of {max} reached on {axis:?}");
                return gaps;
            }
            let start_span = span(start.bounds, axis);
            let end_span = span(end.bounds, axis);
            if start_span.1 >= end_span.0 {
                continue;
            }
            let Some(overlap) = range_intersection(
                span(start.bounds, axis.other()),
                span(end.bounds, axis.other()),
            ) else {
                continue;
            };
            gaps.push(Gap {
                start: (*start).clone(),
                end: (*end).clone(),
                start_side: (
                    axis_point(axis, start_span.1, overlap.0),
                    axis_point(axis, start_span.1, overlap.1),
                ),
                end_side: (
                    axis_point(axis, end_span.0, overlap.0),
                    axis_point(axis, end_span.0, overlap.1),
                ),
                length: end_span.0 - start_span.1,
                overlap,
            });
        }
    }
    gaps
}

/// Which side of a gap a selection continues the pattern on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GapSide {
    /// Before the gap's start reference.
    Leading,
    /// After the gap's end reference.
    Trailing,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SnapKind {
    /// A selection corner or center aligned with a reference corner or center.
    Point { from: Point, to: Point },
    GapCenter { gap: usize },
    GapSide { gap: usize, side: GapSide },
}

/// One accepted candidate: the offset that realizes it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Snap {
    pub offset: f64,
    pub kind: SnapKind,
}

/// Nearest candidates on one axis.
#[derive(Debug, Clone)]
pub struct AxisSnaps {
    min_offset: f64,
    snaps: Vec<Snap>,
}

impl AxisSnaps {
    pub fn new(threshold: f64) -> Self {
        Self {
            min_offset: round(threshold),
            snaps: Vec::new(),
        }
    }

    /// Whether an offset is at least as near as the best one seen so far.
    pub fn should_add(&self, offset: f64) -> bool {
        round(offset.abs()) <= self.min_offset
    }

    /// Keep a candidate if it ties the best; a strictly nearer one replaces them all.
    pub fn push(&mut self, snap: Snap) -> bool {
        if !self.should_add(snap.offset) {
            return false;
        }
        let distance = round(snap.offset.abs());
        if distance < self.min_offset || self.snaps.is_empty() {
            self.snaps.clear();
            self.min_offset = distance;
        }
        self.snaps.push(snap);
        true
    }

    pub fn snaps(&self) -> &[Snap] {
        &self.snaps
    }

    /// Offset of the first nearest candidate.
    pub fn best_offset(&self) -> Option<f64> {
        self.snaps.first().map(|s| s.offset)
    }
}

/// Per-axis accumulator for one frame.
#[derive(Debug, Clone)]
pub struct SnapState {
    pub x: AxisSnaps,
    pub y: AxisSnaps,
}

impl SnapState {
    pub fn new(threshold: f64) -> Self {
        Self {
            x: AxisSnaps::new(threshold),
            y: AxisSnaps::new(threshold),
        }
    }

    pub fn axis(&self, axis: Axis) -> &AxisSnaps {
        match axis {
            Axis::X => &self.x,
            Axis::Y => &self.y,
        }
    }

    fn axis_mut(&mut self, axis: Axis) -> &mut AxisSnaps {
        match axis {
            Axis::X => &mut self.x,
            Axis::Y => &mut self.y,
        }
    }
}

fn corners(rect: Rect) -> [Point; 4] {
    [
        Point::new(rect.x0, rect.y0),
        Point::new(rect.x1, rect.y0),
        Point::new(rect.x1, rect.y1),
        Point::new(rect.x0, rect.y1),
    ]
}

/// Corner-to-corner and center-to-center candidates against individual references.
pub fn get_point_snaps(selection: Rect, references: &[ReferenceBounds], options: &SnapOptions, state: &mut SnapState) {
    let mut pairs: Vec<(Point, Point)> = Vec::new();
    for reference in references {
        if options.edges {
            for from in corners(selection) {
                for to in corners(reference.bounds) {
                    pairs.push((from, to));
                }
            }
        }
        if options.centers {
            pairs.push((selection.center(), reference.bounds.center()));
        }
    }
    for (from, to) in pairs {
        for axis in Axis::BOTH {
            let offset = axis.component(to - from);
            state.axis_mut(axis).push(Snap {
                offset,
                kind: SnapKind::Point { from, to },
            });
        }
    }
}

/// Candidates that center the selection in a gap or repeat a gap beside it.
pub fn get_gap_snaps(selection: Rect, gaps: &Gaps, options: &SnapOptions, state: &mut SnapState) {
    if !options.gaps {
        return;
    }
    for axis in Axis::BOTH {
        let along = span(selection, axis);
        let across = span(selection, axis.other());
        let extent = along.1 - along.0;
        for (index, gap) in gaps.along(axis).iter().enumerate() {
            if !ranges_overlap(across, gap.overlap) {
                continue;
            }
            let start = span(gap.start.bounds, axis);
            let end = span(gap.end.bounds, axis);

            if options.centers && gap.length > extent {
                let offset = center((start.1, end.0)) - center(along);
                state.axis_mut(axis).push(Snap {
                    offset,
                    kind: SnapKind::GapCenter { gap: index },
                });
            }
            let trailing = end.1 + gap.length - along.0;
            state.axis_mut(axis).push(Snap {
                offset: trailing,
                kind: SnapKind::GapSide {
                    gap: index,
                    side: GapSide::Trailing,
                },
            });
            let leading = start.0 - gap.length - along.1;
            state.axis_mut(axis).push(Snap {
                offset: leading,
                kind: SnapKind::GapSide {
                    gap: index,
                    side: GapSide::Leading,
                },
            });
        }
    }
}

/// A guide segment to render, in the root frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SnapLine {
    pub start: Point,
    pub end: Point,
    /// Axis of the snap the line belongs to.
    pub axis: Axis,
}

/// Guide segments per context id.
pub type SnapLines = BTreeMap<String, Vec<SnapLine>>;

/// Geometry a selection can snap against in one rotation context.
#[derive(Debug, Clone)]
pub struct SnapContext {
    pub id: String,
    /// Context frame to root frame.
    pub to_root: Affine,
    pub references: Vec<ReferenceBounds>,
}

#[derive(Debug, Clone)]
struct PreparedContext {
    id: String,
    rotation: f64,
    to_root: Affine,
    references: Vec<ReferenceBounds>,
    gaps: Gaps,
}

/// Result of snapping one pointer position.
#[derive(Debug, Clone, Default)]
pub struct SnapOutcome {
    /// The adjusted offset, in the root frame.
    pub offset: Vec2,
    pub snapped_x: bool,
    pub snapped_y: bool,
    pub lines: SnapLines,
}

/// Snapping over a fixed set of reference contexts, for the duration of a gesture.
#[derive(Debug, Clone)]
pub struct SnapEngine {
    contexts: Vec<PreparedContext>,
    options: SnapOptions,
}

impl SnapEngine {
    /// Precompute gaps for every context that is aligned with the root axes.
    pub fn new(contexts: Vec<SnapContext>, options: SnapOptions) -> Self {
        let contexts = contexts
            .into_iter()
            .filter_map(|context| {
                let rotation = decompose(context.to_root).rotation_degrees;
                if !crate::math::is_axis_aligned(rotation) {
                    log::debug!("skipping snap context {} rotated by {rotation}", context.id);
                    return None;
                }
                let gaps = if options.gaps {
                    get_gaps(&context.references, options.max_gaps_per_axis)
                } else {
                    Gaps::default()
                };
                Some(PreparedContext {
                    id: context.id,
                    rotation,
                    to_root: context.to_root,
                    references: context.references,
                    gaps,
                })
            })
            .collect();
        Self { contexts, options }
    }

    pub fn options(&self) -> &SnapOptions {
        &self.options
    }

    fn collect(&self, context: &PreparedContext, selection: Rect, threshold: f64) -> SnapState {
        let mut state = SnapState::new(threshold);
        get_point_snaps(selection, &context.references, &self.options, &mut state);
        get_gap_snaps(selection, &context.gaps, &self.options, &mut state);
        state
    }

    /// Snap a root-frame drag offset for a selection whose (unmoved) bounds are
    /// given per context id.
    pub fn snap(&self, raw_offset: Vec2, selection: &HashMap<String, Rect>) -> SnapOutcome {
        // Best adjustment per root axis, as (distance, adjustment).
        let mut best: [Option<(f64, f64)>; 2] = [None, None];
        for context in &self.contexts {
            let Some(bounds) = selection.get(&context.id) else {
                continue;
            };
            let local_offset = rotate_vec(raw_offset, -context.rotation);
            let state = self.collect(context, *bounds + local_offset, self.options.threshold);
            for axis in Axis::BOTH {
                let Some(adjust) = state.axis(axis).best_offset() else {
                    continue;
                };
                let root = rotate_vec(axis.vec(adjust), context.rotation);
                let root_axis = local_axis(axis, context.rotation);
                let slot = &mut best[root_axis as usize];
                let distance = round(adjust.abs());
                if slot.is_none_or(|(current, _)| distance < current) {
                    *slot = Some((distance, root_axis.component(root)));
                }
            }
        }

        let adjustment = Vec2::new(
            best[Axis::X as usize].map_or(0.0, |(_, v)| v),
            best[Axis::Y as usize].map_or(0.0, |(_, v)| v),
        );
        let offset = raw_offset + adjustment;
        SnapOutcome {
            offset,
            snapped_x: best[Axis::X as usize].is_some(),
            snapped_y: best[Axis::Y as usize].is_some(),
            lines: self.lines(offset, selection),
        }
    }

    /// Guide lines for the snaps that hold exactly at `offset`.
    fn lines(&self, offset: Vec2, selection: &HashMap<String, Rect>) -> SnapLines {
        let mut lines = SnapLines::new();
        for context in &self.contexts {
            let Some(bounds) = selection.get(&context.id) else {
                continue;
            };
            let moved = *bounds + rotate_vec(offset, -context.rotation);
            let state = self.collect(context, moved, 0.0);
            let mut seen: HashSet<String> = HashSet::new();
            let mut context_lines = Vec::new();
            for axis in Axis::BOTH {
                for snap in state.axis(axis).snaps() {
                    for (start, end) in snap_segments(snap, axis, moved, &context.gaps) {
                        let start = context.to_root * start;
                        let end = context.to_root * end;
                        let key = format!(
                            "{},{},{},{}",
                            round(start.x),
                            round(start.y),
                            round(end.x),
                            round(end.y)
                        );
                        if seen.insert(key) {
                            context_lines.push(SnapLine {
                                start: Point::new(round(start.x), round(start.y)),
                                end: Point::new(round(end.x), round(end.y)),
                                axis,
                            });
                        }
                    }
                }
            }
            if !context_lines.is_empty() {
                lines.entry(context.id.clone()).or_default().extend(context_lines);
            }
        }
        lines
    }
}

/// Segments, in the context frame, that show why `snap` holds for `selection`.
fn snap_segments(snap: &Snap, axis: Axis, selection: Rect, gaps: &Gaps) -> Vec<(Point, Point)> {
    let gap_of = |index: usize| gaps.along(axis).get(index);
    match snap.kind {
        SnapKind::Point { from, to } => vec![(from, to)],
        SnapKind::GapCenter { gap } | SnapKind::GapSide { gap, .. } => {
            let Some(gap) = gap_of(gap) else {
                return Vec::new();
            };
            let along = span(selection, axis);
            let across = range_intersection(gap.overlap, span(selection, axis.other())).unwrap_or(gap.overlap);
            let level = center(across);
            let start = span(gap.start.bounds, axis);
            let end = span(gap.end.bounds, axis);
            let segment = |from: f64, to: f64| (axis_point(axis, from, level), axis_point(axis, to, level));
            match snap.kind {
                SnapKind::GapSide {
                    side: GapSide::Trailing,
                    ..
                } => vec![segment(start.1, end.0), segment(end.1, along.0)],
                SnapKind::GapSide {
                    side: GapSide::Leading,
                    ..
                } => vec![segment(along.1, start.0), segment(start.1, end.0)],
                _ => vec![segment(start.1, along.0), segment(along.1, end.0)],
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn column(id: &str, x0: f64, x1: f64) -> ReferenceBounds {
        ReferenceBounds::new(id, Rect::new(x0, 0.0, x1, 10.0))
    }

    fn three_columns() -> Vec<ReferenceBounds> {
        vec![column("a", 0.0, 10.0), column("b", 20.0, 30.0), column("c", 50.0, 60.0)]
    }

    #[test]
    fn test_snap_angle() {
        assert!((snap_angle(7.0, 15.0) - 0.0).abs() < 0.01);
        assert!((snap_angle(8.0, 15.0) - 15.0).abs() < 0.01);
        assert!((snap_angle(359.0, 15.0) - 0.0).abs() < 0.01);
        assert!((snap_angle(-20.0, 15.0) - 345.0).abs() < 0.01);
        assert_eq!(snap_angle(33.0, 0.0), 33.0);
    }

    #[test]
    fn test_gaps_between_columns() {
        let gaps = get_gaps(&three_columns(), MAX_GAPS_PER_AXIS);
        let lengths: Vec<f64> = gaps.horizontal.iter().map(|g| g.length).collect();
        assert_eq!(lengths, vec![10.0, 40.0, 20.0]);
        assert!(gaps.vertical.is_empty());
        assert_eq!(gaps.horizontal[0].overlap, (0.0, 10.0));
        assert_eq!(gaps.horizontal[0].start_side, (Point::new(10.0, 0.0), Point::new(10.0, 10.0)));
    }

    #[test]
    fn test_no_gap_without_perpendicular_overlap() {
        let refs = vec![
            ReferenceBounds::new("a", Rect::new(0.0, 0.0, 10.0, 10.0)),
            ReferenceBounds::new("b", Rect::new(20.0, 20.0, 30.0, 30.0)),
        ];
        let gaps = get_gaps(&refs, MAX_GAPS_PER_AXIS);
        assert!(gaps.horizontal.is_empty());
        assert!(gaps.vertical.is_empty());
    }

    #[test]
    fn test_gap_cap() {
        let gaps = get_gaps(&three_columns(), 2);
        assert_eq!(gaps.horizontal.len(), 2);
    }

    #[test]
    fn test_gap_center_snap() {
        let refs = three_columns();
        let gaps = get_gaps(&refs, MAX_GAPS_PER_AXIS);
        let options = SnapOptions::default();
        let mut state = SnapState::new(options.threshold);
        let selection = Rect::new(33.0, 0.0, 43.0, 10.0);
        get_point_snaps(selection, &refs, &options, &mut state);
        get_gap_snaps(selection, &gaps, &options, &mut state);

        assert_eq!(state.x.best_offset(), Some(2.0));
        assert!(matches!(state.x.snaps()[0].kind, SnapKind::GapCenter { gap: 2 }));
    }

    #[test]
    fn test_gap_side_snap() {
        let refs = vec![column("a", 0.0, 10.0), column("b", 20.0, 30.0)];
        let gaps = get_gaps(&refs, MAX_GAPS_PER_AXIS);
        let options = SnapOptions {
            edges: false,
            centers: false,
            ..SnapOptions::default()
        };
        let mut state = SnapState::new(options.threshold);
        get_gap_snaps(Rect::new(43.0, 0.0, 48.0, 10.0), &gaps, &options, &mut state);
        assert_eq!(state.x.best_offset(), Some(-3.0));
        assert!(matches!(
            state.x.snaps()[0].kind,
            SnapKind::GapSide {
                side: GapSide::Trailing,
                ..
            }
        ));
    }

    #[test]
    fn test_ties_are_kept_and_replaced() {
        let mut snaps = AxisSnaps::new(10.0);
        let kind = SnapKind::GapCenter { gap: 0 };
        assert!(snaps.push(Snap { offset: 4.0, kind }));
        assert!(snaps.push(Snap { offset: -4.0, kind }));
        assert_eq!(snaps.snaps().len(), 2);
        assert!(!snaps.push(Snap { offset: 5.0, kind }));
        assert!(snaps.push(Snap { offset: 1.0, kind }));
        assert_eq!(snaps.snaps().len(), 1);
        assert_eq!(snaps.best_offset(), Some(1.0));
    }

    #[test]
    fn test_threshold_limits_candidates() {
        let mut snaps = AxisSnaps::new(3.0);
        assert!(!snaps.push(Snap {
            offset: 3.5,
            kind: SnapKind::GapCenter { gap: 0 }
        }));
        assert!(snaps.best_offset().is_none());
    }

    #[test]
    fn test_engine_snaps_and_draws_gap_lines() {
        let engine = SnapEngine::new(
            vec![SnapContext {
                id: "root".into(),
                to_root: Affine::IDENTITY,
                references: three_columns(),
            }],
            SnapOptions::default(),
        );
        let selection = HashMap::from([("root".to_string(), Rect::new(30.0, 0.0, 40.0, 10.0))]);
        let outcome = engine.snap(Vec2::new(3.0, 0.0), &selection);
        assert_eq!(outcome.offset, Vec2::new(5.0, 0.0));
        assert!(outcome.snapped_x);

        let lines = &outcome.lines["root"];
        assert!(lines.contains(&SnapLine {
            start: Point::new(30.0, 5.0),
            end: Point::new(35.0, 5.0),
            axis: Axis::X,
        }));
        assert!(lines.contains(&SnapLine {
            start: Point::new(45.0, 5.0),
            end: Point::new(50.0, 5.0),
            axis: Axis::X,
        }));
    }

    #[test]
    fn test_engine_maps_rotated_context() {
        // References laid out along the context's x, which is the root's y.
        let engine = SnapEngine::new(
            vec![SnapContext {
                id: "turned".into(),
                to_root: crate::math::rotation(90.0),
                references: vec![column("a", 0.0, 10.0)],
            }],
            SnapOptions::default(),
        );
        let selection = HashMap::from([("turned".to_string(), Rect::new(12.0, 0.0, 22.0, 10.0))]);
        // A root-frame drag of -1 on y is -1 on the context's x.
        let outcome = engine.snap(Vec2::new(0.0, -1.0), &selection);
        assert!(outcome.snapped_y);
        assert_eq!(round(outcome.offset.y), -2.0);
    }

    #[test]
    fn test_oblique_context_is_skipped() {
        let engine = SnapEngine::new(
            vec![SnapContext {
                id: "tilted".into(),
                to_root: crate::math::rotation(30.0),
                references: three_columns(),
            }],
            SnapOptions::default(),
        );
        let selection = HashMap::from([("tilted".to_string(), Rect::new(33.0, 0.0, 43.0, 10.0))]);
        let outcome = engine.snap(Vec2::new(1.0, 1.0), &selection);
        assert_eq!(outcome.offset, Vec2::new(1.0, 1.0));
        assert!(outcome.lines.is_empty());
    }

    fn arb_rect() -> impl Strategy<Value = Rect> {
        (0i32..200, 0i32..200, 1i32..50, 1i32..50)
            .prop_map(|(x, y, w, h)| Rect::new(x as f64, y as f64, (x + w) as f64, (y + h) as f64))
    }

    fn normalized(gaps: &[Gap]) -> Vec<(String, String, i64)> {
        let mut out: Vec<_> = gaps
            .iter()
            .map(|g| (g.start.id.clone(), g.end.id.clone(), (g.length * 1000.0) as i64))
            .collect();
        out.sort();
        out
    }

    proptest! {
        #[test]
        fn prop_gaps_ignore_input_order(a in arb_rect(), b in arb_rect(), c in arb_rect()) {
            let forward = vec![
                ReferenceBounds::new("a", a),
                ReferenceBounds::new("b", b),
                ReferenceBounds::new("c", c),
            ];
            let mut backward = forward.clone();
            backward.reverse();
            let g1 = get_gaps(&forward, MAX_GAPS_PER_AXIS);
            let g2 = get_gaps(&backward, MAX_GAPS_PER_AXIS);
            prop_assert_eq!(normalized(&g1.horizontal), normalized(&g2.horizontal));
            prop_assert_eq!(normalized(&g1.vertical), normalized(&g2.vertical));
        }

        #[test]
        fn prop_snap_offset_realizes_alignment(x in -20.0f64..80.0) {
            let refs = three_columns();
            let gaps = get_gaps(&refs, MAX_GAPS_PER_AXIS);
            let options = SnapOptions::default();
            let mut state = SnapState::new(options.threshold);
            let selection = Rect::new(x, 0.0, x + 10.0, 10.0);
            get_point_snaps(selection, &refs, &options, &mut state);
            get_gap_snaps(selection, &gaps, &options, &mut state);

            if let Some(offset) = state.x.best_offset() {
                let moved = selection + Vec2::new(offset, 0.0);
                let mut check = SnapState::new(0.0);
                get_point_snaps(moved, &refs, &options, &mut check);
                get_gap_snaps(moved, &gaps, &options, &mut check);
                prop_assert_eq!(check.x.best_offset().map(round), Some(0.0));
            }
        }
    }
}
