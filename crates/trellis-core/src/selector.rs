//! Resolution of which contents a move gesture has to update.

use crate::dependency::{AxisDependencyGraph, AxisNode, Movement};
use crate::error::{EditError, EditResult};
use crate::math::{Axis, local_axis, rotation_class, round};
use crate::model::{ContentId, Diagram};
use std::collections::{BTreeSet, HashSet, VecDeque};

/// Gesture axes a move drives, in the root frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MoveAxes {
    pub x: bool,
    pub y: bool,
}

impl MoveAxes {
    pub const BOTH: MoveAxes = MoveAxes { x: true, y: true };
    pub const X: MoveAxes = MoveAxes { x: true, y: false };
    pub const Y: MoveAxes = MoveAxes { x: false, y: true };

    pub fn contains(self, axis: Axis) -> bool {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
        }
    }

    pub fn is_single(self) -> bool {
        self.x != self.y
    }

    fn requested(self) -> impl Iterator<Item = Axis> {
        Axis::BOTH.into_iter().filter(move |axis| self.contains(*axis))
    }
}

/// Computes the explicit and implicit targets of a move for one selection.
///
/// Built once per pointer-down; [`MovedElementsSelector::initialize`] can then be
/// called for each axis configuration of the gesture.
#[derive(Debug, Clone)]
pub struct MovedElementsSelector {
    graph: AxisDependencyGraph,
    selected: Vec<ContentId>,
    axes: MoveAxes,
    moved: BTreeSet<AxisNode>,
    implicit: BTreeSet<AxisNode>,
    affected: BTreeSet<ContentId>,
    has_conflict: bool,
}

impl MovedElementsSelector {
    pub fn new(diagram: &Diagram, selected: impl IntoIterator<Item = impl Into<ContentId>>) -> EditResult<Self> {
        diagram.validate()?;
        let graph = AxisDependencyGraph::build(diagram)?;
        let mut ids: Vec<ContentId> = selected.into_iter().map(Into::into).collect();
        ids.sort();
        ids.dedup();
        if let Some(missing) = ids.iter().find(|id| !graph.contains(id)) {
            return Err(EditError::UnknownContent(missing.clone()));
        }
        Ok(Self {
            graph,
            selected: ids,
            axes: MoveAxes::default(),
            moved: BTreeSet::new(),
            implicit: BTreeSet::new(),
            affected: BTreeSet::new(),
            has_conflict: false,
        })
    }

    /// Recompute every result for the given gesture axes.
    pub fn initialize(&mut self, axes: MoveAxes) {
        self.axes = axes;
        self.moved.clear();
        self.implicit.clear();
        self.affected.clear();
        self.has_conflict = false;

        if axes.is_single() && !self.frames_compatible() {
            log::debug!("move conflict: selection spans incompatible rotations");
            self.has_conflict = true;
            return;
        }

        for id in self.selected.clone() {
            let rotation = self.graph.rotation(&id);
            for axis in axes.requested() {
                self.propagate(AxisNode::new(id.clone(), local_axis(axis, rotation)));
            }
        }
        self.fix_up();
        self.detect_conflicts();
        if self.has_conflict {
            self.moved.clear();
            return;
        }
        self.prune();
        self.collect_affected();
    }

    /// A single-axis move is only meaningful if the selection lives in at most two
    /// frames a quarter turn apart.
    fn frames_compatible(&self) -> bool {
        let mut classes: Vec<f64> = self
            .selected
            .iter()
            .map(|id| rotation_class(self.graph.rotation(id)))
            .collect();
        classes.sort_by(f64::total_cmp);
        classes.dedup();
        match classes.as_slice() {
            [] | [_] => true,
            [first, second] => round(second - first) == 90.0,
            _ => false,
        }
    }

    fn propagate(&mut self, seed: AxisNode) {
        let mut queue = VecDeque::from([seed]);
        while let Some(node) = queue.pop_front() {
            if !self.moved.insert(node.clone()) {
                continue;
            }
            if self.graph.movement(&node) == Movement::Forward {
                queue.extend(self.graph.depends_on(&node).iter().cloned());
            }
        }
    }

    /// Add the missing axis to contents moved on one axis only whose shared
    /// dependents are already moving on the other one, until nothing changes.
    fn fix_up(&mut self) {
        loop {
            let ids: BTreeSet<ContentId> = self.moved.iter().map(|n| n.id.clone()).collect();
            let missing: Vec<AxisNode> = ids
                .into_iter()
                .filter_map(|id| {
                    let on_x = self.moved.contains(&AxisNode::new(id.clone(), Axis::X));
                    let on_y = self.moved.contains(&AxisNode::new(id.clone(), Axis::Y));
                    if on_x == on_y {
                        return None;
                    }
                    let axis = if on_x { Axis::X } else { Axis::Y };
                    self.inconsistently_moved(&id, axis)
                        .then(|| AxisNode::new(id, axis.other()))
                })
                .collect();
            if missing.is_empty() {
                break;
            }
            for node in missing {
                log::trace!("moving {} on {:?} as well", node.id, node.axis);
                self.propagate(node);
            }
        }
    }

    /// Whether `id`, moved on `axis` only, has dependents reading it on both axes
    /// whose own dependents are already moving on the other axis.
    fn inconsistently_moved(&self, id: &str, axis: Axis) -> bool {
        let other = AxisNode::new(id, axis.other());
        let on_axis: HashSet<&str> = self
            .graph
            .depended_on(&AxisNode::new(id, axis))
            .iter()
            .map(|n| n.id.as_str())
            .collect();

        let mut seen: HashSet<&AxisNode> = HashSet::new();
        let mut queue: VecDeque<&AxisNode> = self
            .graph
            .depended_on(&other)
            .iter()
            .filter(|n| on_axis.contains(n.id.as_str()))
            .flat_map(|n| self.graph.depended_on(n))
            .collect();
        while let Some(node) = queue.pop_front() {
            if !seen.insert(node) {
                continue;
            }
            if self.moved.contains(node) {
                return true;
            }
            queue.extend(self.graph.depended_on(node));
        }
        false
    }

    fn detect_conflicts(&mut self) {
        for node in &self.moved {
            if self.graph.movement(node) == Movement::Blocked {
                log::debug!("move conflict: {} cannot move on {:?}", node.id, node.axis);
                self.has_conflict = true;
                return;
            }
            if self.axes.is_single() {
                let gesture = local_axis(node.axis, self.graph.rotation(&node.id));
                if !self.axes.contains(gesture) {
                    log::debug!("move conflict: {} would move on unrequested {:?}", node.id, gesture);
                    self.has_conflict = true;
                    return;
                }
            }
        }
    }

    /// Nodes whose every position dependency moves anyway need no edit of their own.
    fn prune(&mut self) {
        self.implicit = self
            .moved
            .iter()
            .filter(|node| {
                let deps = self.graph.depends_on(node);
                !deps.is_empty() && deps.iter().all(|dep| self.moved.contains(dep))
            })
            .cloned()
            .collect();
    }

    fn collect_affected(&mut self) {
        let mut queue: VecDeque<ContentId> = self.moved.iter().map(|n| n.id.clone()).collect();
        while let Some(id) = queue.pop_front() {
            if self.affected.insert(id.clone()) {
                queue.extend(self.graph.dependents(&id).iter().cloned());
            }
        }
    }

    fn explicit(&self, axis: Axis) -> Vec<ContentId> {
        self.moved
            .iter()
            .filter(|n| n.axis == axis && !self.implicit.contains(*n))
            .map(|n| n.id.clone())
            .collect()
    }

    fn implicit(&self, axis: Axis) -> Vec<ContentId> {
        self.implicit
            .iter()
            .filter(|n| n.axis == axis)
            .map(|n| n.id.clone())
            .collect()
    }

    /// Contents the X offset is applied to. Empty when there is a conflict.
    pub fn moved_elements_x(&self) -> Vec<ContentId> {
        self.explicit(Axis::X)
    }

    /// Contents the Y offset is applied to. Empty when there is a conflict.
    pub fn moved_elements_y(&self) -> Vec<ContentId> {
        self.explicit(Axis::Y)
    }

    pub fn implicitly_moved_elements_x(&self) -> Vec<ContentId> {
        self.implicit(Axis::X)
    }

    pub fn implicitly_moved_elements_y(&self) -> Vec<ContentId> {
        self.implicit(Axis::Y)
    }

    /// Every id whose position changes: moved contents and everything laid out from them.
    pub fn affected_element_ids(&self) -> &BTreeSet<ContentId> {
        &self.affected
    }

    /// True when the requested move cannot be carried out consistently.
    pub fn has_conflict(&self) -> bool {
        self.has_conflict
    }

    pub fn selected(&self) -> &[ContentId] {
        &self.selected
    }

    pub fn axes(&self) -> MoveAxes {
        self.axes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AbsolutePoint, Canvas, CanvasConnection, CanvasElement, ConnectionSegment, RelativePoint};
    use proptest::prelude::*;

    fn flat() -> Diagram {
        let mut d = Diagram::new();
        d.insert_canvas(Canvas::new("c", 0.0));
        d.insert_content(AbsolutePoint::new("p", "c", 0.0, 0.0)).unwrap();
        d.insert_content(AbsolutePoint::new("q", "c", 100.0, 0.0)).unwrap();
        d.insert_content(CanvasElement::new("el", "c", "p")).unwrap();
        d
    }

    #[test]
    fn test_element_moves_through_its_point() {
        let mut selector = MovedElementsSelector::new(&flat(), ["el"]).unwrap();
        selector.initialize(MoveAxes::X);
        assert!(!selector.has_conflict());
        assert_eq!(selector.moved_elements_x(), vec!["p"]);
        assert!(selector.moved_elements_y().is_empty());
        assert_eq!(selector.implicitly_moved_elements_x(), vec!["el"]);
        let affected: Vec<&str> = selector.affected_element_ids().iter().map(String::as_str).collect();
        assert_eq!(affected, vec!["el", "p"]);
    }

    #[test]
    fn test_unknown_selection_is_an_error() {
        assert!(matches!(
            MovedElementsSelector::new(&flat(), ["nope"]),
            Err(EditError::UnknownContent(_))
        ));
    }

    #[test]
    fn test_editable_relative_point_moves_itself() {
        let mut d = flat();
        d.insert_content(RelativePoint::new("r", "c", "p", 10.0, 0.0)).unwrap();
        let mut selector = MovedElementsSelector::new(&d, ["r"]).unwrap();
        selector.initialize(MoveAxes::BOTH);
        assert_eq!(selector.moved_elements_x(), vec!["r"]);
        assert_eq!(selector.moved_elements_y(), vec!["r"]);
    }

    #[test]
    fn test_pinned_relative_point_moves_target() {
        let mut d = flat();
        d.insert_content(RelativePoint::new("r", "c", "p", 10.0, 0.0).with_editable(false, true))
            .unwrap();
        let mut selector = MovedElementsSelector::new(&d, ["r"]).unwrap();
        selector.initialize(MoveAxes::BOTH);
        assert_eq!(selector.moved_elements_x(), vec!["p"]);
        assert_eq!(selector.moved_elements_y(), vec!["r"]);
        assert_eq!(selector.implicitly_moved_elements_x(), vec!["r"]);
    }

    #[test]
    fn test_redundant_selection_is_pruned() {
        let mut d = flat();
        d.insert_content(RelativePoint::new("r", "c", "p", 10.0, 0.0)).unwrap();
        let mut selector = MovedElementsSelector::new(&d, ["r", "p"]).unwrap();
        selector.initialize(MoveAxes::BOTH);
        assert_eq!(selector.moved_elements_x(), vec!["p"]);
        assert_eq!(selector.implicitly_moved_elements_y(), vec!["r"]);
    }

    #[test]
    fn test_connection_moves_its_terminal() {
        let mut d = flat();
        d.insert_content(CanvasConnection::new(
            "conn",
            "c",
            "p",
            vec![ConnectionSegment::Line { end: "q".into() }],
        ))
        .unwrap();
        let mut selector = MovedElementsSelector::new(&d, ["conn"]).unwrap();
        selector.initialize(MoveAxes::BOTH);
        assert_eq!(selector.moved_elements_x(), vec!["q"]);
        assert!(selector.affected_element_ids().contains("conn"));
        assert!(!selector.affected_element_ids().contains("p"));
    }

    #[test]
    fn test_fixed_coordinate_conflicts() {
        let mut d = Diagram::new();
        d.insert_canvas(Canvas::new("c", 0.0));
        d.insert_content(AbsolutePoint::new("p", "c", 0.0, 0.0).with_editable(false, true)).unwrap();
        d.insert_content(CanvasElement::new("el", "c", "p")).unwrap();
        let mut selector = MovedElementsSelector::new(&d, ["el"]).unwrap();

        selector.initialize(MoveAxes::X);
        assert!(selector.has_conflict());
        assert!(selector.moved_elements_x().is_empty());

        selector.initialize(MoveAxes::Y);
        assert!(!selector.has_conflict());
        assert_eq!(selector.moved_elements_y(), vec!["p"]);
    }

    #[test]
    fn test_quarter_turn_frames_split_axes() {
        let mut d = Diagram::new();
        d.insert_canvas(Canvas::new("flat", 0.0));
        d.insert_canvas(Canvas::new("turned", 90.0));
        d.insert_content(AbsolutePoint::new("p", "flat", 0.0, 0.0)).unwrap();
        d.insert_content(CanvasElement::new("a", "flat", "p")).unwrap();
        d.insert_content(AbsolutePoint::new("q", "turned", 0.0, 0.0)).unwrap();
        d.insert_content(CanvasElement::new("b", "turned", "q")).unwrap();

        let mut selector = MovedElementsSelector::new(&d, ["a", "b"]).unwrap();
        selector.initialize(MoveAxes::X);
        assert!(!selector.has_conflict());
        assert_eq!(selector.moved_elements_x(), vec!["p"]);
        assert_eq!(selector.moved_elements_y(), vec!["q"]);
    }

    #[test]
    fn test_three_frames_conflict_on_single_axis() {
        let mut d = Diagram::new();
        for (canvas, rotation) in [("c0", 0.0), ("c30", 30.0), ("c90", 90.0)] {
            d.insert_canvas(Canvas::new(canvas, rotation));
            d.insert_content(AbsolutePoint::new(format!("{canvas}-p"), canvas, 0.0, 0.0))
                .unwrap();
        }
        let mut selector = MovedElementsSelector::new(&d, ["c0-p", "c30-p", "c90-p"]).unwrap();
        selector.initialize(MoveAxes::X);
        assert!(selector.has_conflict());

        selector.initialize(MoveAxes::BOTH);
        assert!(!selector.has_conflict());
    }

    #[test]
    fn test_oblique_dependency_conflicts_on_single_axis() {
        let mut d = Diagram::new();
        d.insert_canvas(Canvas::new("flat", 0.0));
        d.insert_canvas(Canvas::new("tilted", 45.0));
        d.insert_content(AbsolutePoint::new("p", "flat", 0.0, 0.0)).unwrap();
        d.insert_content(CanvasElement::new("el", "tilted", "p")).unwrap();
        let mut selector = MovedElementsSelector::new(&d, ["el"]).unwrap();
        selector.initialize(MoveAxes::X);
        assert!(selector.has_conflict());
    }

    /// `r` hangs off `p` with a pinned x and a free y; `el` sits on `r`.
    fn pinned_chain(p_editable_y: bool) -> Diagram {
        let mut d = Diagram::new();
        d.insert_canvas(Canvas::new("c", 0.0));
        d.insert_content(AbsolutePoint::new("p", "c", 0.0, 0.0).with_editable(true, p_editable_y))
            .unwrap();
        d.insert_content(RelativePoint::new("r", "c", "p", 10.0, 0.0).with_editable(false, true))
            .unwrap();
        d.insert_content(CanvasElement::new("el", "c", "r")).unwrap();
        d
    }

    #[test]
    fn test_half_moved_anchor_gets_other_axis() {
        let d = pinned_chain(true);
        let mut selector = MovedElementsSelector::new(&d, ["el"]).unwrap();
        selector.initialize(MoveAxes::BOTH);

        assert!(!selector.has_conflict());
        assert_eq!(selector.moved_elements_x(), vec!["p"]);
        assert_eq!(selector.moved_elements_y(), vec!["p"]);
        assert_eq!(selector.implicitly_moved_elements_x(), vec!["el", "r"]);
        assert_eq!(selector.implicitly_moved_elements_y(), vec!["el", "r"]);
        let affected: Vec<&str> = selector.affected_element_ids().iter().map(String::as_str).collect();
        assert_eq!(affected, vec!["el", "p", "r"]);
    }

    #[test]
    fn test_half_moved_anchor_single_axis_stays_put() {
        let d = pinned_chain(true);
        let mut selector = MovedElementsSelector::new(&d, ["el"]).unwrap();
        selector.initialize(MoveAxes::X);

        assert!(!selector.has_conflict());
        assert_eq!(selector.moved_elements_x(), vec!["p"]);
        assert!(selector.moved_elements_y().is_empty());
        assert_eq!(selector.implicitly_moved_elements_x(), vec!["el", "r"]);
    }

    #[test]
    fn test_added_axis_on_fixed_coordinate_conflicts() {
        let d = pinned_chain(false);
        let mut selector = MovedElementsSelector::new(&d, ["el"]).unwrap();
        selector.initialize(MoveAxes::BOTH);

        assert!(selector.has_conflict());
        assert!(selector.moved_elements_x().is_empty());
        assert!(selector.moved_elements_y().is_empty());

        selector.initialize(MoveAxes::Y);
        assert!(!selector.has_conflict());
        assert_eq!(selector.moved_elements_y(), vec!["r"]);
    }

    #[test]
    fn test_added_axis_on_single_axis_move_conflicts() {
        // `k` reads `r` through a tilted frame, so `ek` moving on x reaches `r` on both axes.
        let mut d = pinned_chain(true);
        d.insert_canvas(Canvas::new("tilted", 30.0));
        d.insert_content(RelativePoint::new("k", "tilted", "r", 5.0, 5.0)).unwrap();
        d.insert_content(CanvasElement::new("ek", "c", "k")).unwrap();
        let mut selector = MovedElementsSelector::new(&d, ["el", "ek"]).unwrap();

        selector.initialize(MoveAxes::X);
        assert!(selector.has_conflict());
        assert!(selector.moved_elements_x().is_empty());

        selector.initialize(MoveAxes::BOTH);
        assert!(!selector.has_conflict());
        assert_eq!(selector.moved_elements_x(), vec!["p"]);
        assert_eq!(selector.moved_elements_y(), vec!["p"]);
        assert_eq!(selector.implicitly_moved_elements_y(), vec!["ek", "el", "k", "r"]);
    }

    proptest! {
        #[test]
        fn prop_initialize_is_idempotent(
            picks in prop::collection::vec(0usize..4, 1..4),
            x in any::<bool>(),
            y in any::<bool>(),
        ) {
            let mut d = flat();
            d.insert_content(RelativePoint::new("r", "c", "q", 1.0, 1.0).with_editable(x, !x)).unwrap();
            let ids = ["p", "q", "el", "r"];
            let selected: Vec<&str> = picks.iter().map(|i| ids[*i]).collect();
            let axes = MoveAxes { x, y };

            let mut selector = MovedElementsSelector::new(&d, selected).unwrap();
            selector.initialize(axes);
            let first = (selector.moved_elements_x(), selector.moved_elements_y(), selector.has_conflict());
            selector.initialize(MoveAxes::BOTH);
            selector.initialize(axes);
            let second = (selector.moved_elements_x(), selector.moved_elements_y(), selector.has_conflict());
            prop_assert_eq!(first, second);

            for id in selector.moved_elements_x() {
                prop_assert!(!selector.implicitly_moved_elements_x().contains(&id));
            }
        }
    }
}
