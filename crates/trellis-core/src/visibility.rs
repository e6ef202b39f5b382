//! Point visibility: which points of a canvas are shown as draggable handles.
//!
//! Visibility flows along dependency edges in two typed directions. A content that
//! is selected, or that something visible-downwards depends on, makes its own
//! dependencies visible ("down"). A content that is selected, or that depends on
//! something visible-upwards, makes its dependents visible ("up"). A selected point
//! additionally makes every connection that depends on it visible-downwards as a
//! peer, one level only.
//!
//! Every reason is stored explicitly per id so deselection can retract exactly what
//! it justified, without rescanning the canvas.

use crate::error::{EditError, EditResult};
use crate::model::{CanvasContent, CanvasId, ContentId, Diagram};
use std::collections::{HashMap, HashSet, VecDeque};

/// Why an id is currently visible.
#[derive(Debug, Clone, Default)]
struct Justification {
    selected: bool,
    /// Dependents that are visible-downwards.
    from_dependents: HashSet<ContentId>,
    /// Dependencies that are visible-upwards.
    from_dependencies: HashSet<ContentId>,
    /// Selected points this connection depends on.
    from_peers: HashSet<ContentId>,
    /// Activity last pushed to neighbours, as (down, up).
    propagated: (bool, bool),
}

impl Justification {
    fn down_active(&self) -> bool {
        self.selected || !self.from_dependents.is_empty() || !self.from_peers.is_empty()
    }

    fn up_active(&self) -> bool {
        self.selected || !self.from_dependencies.is_empty()
    }
}

/// Incremental visibility bookkeeping for one canvas.
#[derive(Debug, Clone)]
pub struct PointVisibilityManager {
    canvas: CanvasId,
    dependencies: HashMap<ContentId, Vec<ContentId>>,
    dependents: HashMap<ContentId, Vec<ContentId>>,
    /// Dependency id -> connections that depend on it.
    peers: HashMap<ContentId, Vec<ContentId>>,
    states: HashMap<ContentId, Justification>,
    visible: HashSet<ContentId>,
}

impl PointVisibilityManager {
    /// Scan a canvas (children plus connection markers) and build the edge maps.
    pub fn new(diagram: &Diagram, canvas_id: &str) -> EditResult<Self> {
        let mut manager = Self {
            canvas: canvas_id.to_string(),
            dependencies: HashMap::new(),
            dependents: HashMap::new(),
            peers: HashMap::new(),
            states: HashMap::new(),
            visible: HashSet::new(),
        };

        for content in diagram.canvas_contents(canvas_id)? {
            let id = content.id();
            let deps = diagram.dependencies(id)?;
            manager.states.entry(id.clone()).or_default();
            for dep in &deps {
                manager.states.entry(dep.clone()).or_default();
                manager.dependents.entry(dep.clone()).or_default().push(id.clone());
                if matches!(content, CanvasContent::Connection(_)) {
                    manager.peers.entry(dep.clone()).or_default().push(id.clone());
                }
            }
            manager.dependencies.insert(id.clone(), deps);
        }

        log::trace!(
            "visibility graph for {canvas_id}: {} nodes, {} edges",
            manager.states.len(),
            manager.dependencies.values().map(Vec::len).sum::<usize>()
        );
        Ok(manager)
    }

    pub fn canvas(&self) -> &str {
        &self.canvas
    }

    /// Select or deselect a content and settle visibility incrementally.
    pub fn set_selection_state(&mut self, id: &str, selected: bool) -> EditResult<()> {
        let state = self
            .states
            .get_mut(id)
            .ok_or_else(|| EditError::UnknownContent(id.to_string()))?;
        if state.selected == selected {
            return Ok(());
        }
        state.selected = selected;

        let mut pending = vec![id.to_string()];
        for connection in self.peers.get(id).into_iter().flatten() {
            if let Some(peer) = self.states.get_mut(connection) {
                if selected {
                    peer.from_peers.insert(id.to_string());
                } else {
                    peer.from_peers.remove(id);
                }
                pending.push(connection.clone());
            }
        }
        self.settle(pending);
        Ok(())
    }

    /// Propagate activity changes until no justification set changes any more.
    fn settle(&mut self, start: Vec<ContentId>) {
        let mut queue: VecDeque<ContentId> = start.into();
        let mut steps = 0usize;
        while let Some(id) = queue.pop_front() {
            steps += 1;
            let Some(state) = self.states.get_mut(&id) else {
                continue;
            };
            let (down, up) = (state.down_active(), state.up_active());
            let (was_down, was_up) = state.propagated;
            state.propagated = (down, up);

            if down || up {
                self.visible.insert(id.clone());
            } else {
                self.visible.remove(&id);
            }

            if down != was_down {
                for dep in self.dependencies.get(&id).into_iter().flatten() {
                    if let Some(target) = self.states.get_mut(dep) {
                        if down {
                            target.from_dependents.insert(id.clone());
                        } else {
                            target.from_dependents.remove(&id);
                        }
                        queue.push_back(dep.clone());
                    }
                }
            }
            if up != was_up {
                for dependent in self.dependents.get(&id).into_iter().flatten() {
                    if let Some(target) = self.states.get_mut(dependent) {
                        if up {
                            target.from_dependencies.insert(id.clone());
                        } else {
                            target.from_dependencies.remove(&id);
                        }
                        queue.push_back(dependent.clone());
                    }
                }
            }
        }
        log::trace!("visibility settled on {} in {steps} steps", self.canvas);
    }

    pub fn is_visible(&self, id: &str) -> bool {
        self.visible.contains(id)
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.states.get(id).is_some_and(|s| s.selected)
    }

    pub fn visible_ids(&self) -> &HashSet<ContentId> {
        &self.visible
    }

    /// Visible ids that are points, in no particular order.
    pub fn visible_points<'a>(&'a self, diagram: &'a Diagram) -> impl Iterator<Item = &'a ContentId> + 'a {
        self.visible
            .iter()
            .filter(move |id| diagram.content(id).is_ok_and(CanvasContent::is_point))
    }

    /// Visibility computed from scratch for a selection, ignoring incremental state.
    pub fn recompute(&self, selected: &HashSet<ContentId>) -> HashSet<ContentId> {
        let selected: Vec<&ContentId> = selected.iter().filter(|id| self.states.contains_key(*id)).collect();

        let mut down: HashSet<ContentId> = HashSet::new();
        let mut queue: VecDeque<ContentId> = VecDeque::new();
        for id in &selected {
            queue.push_back((*id).clone());
            queue.extend(self.peers.get(*id).into_iter().flatten().cloned());
        }
        while let Some(id) = queue.pop_front() {
            if down.insert(id.clone()) {
                queue.extend(self.dependencies.get(&id).into_iter().flatten().cloned());
            }
        }

        let mut up: HashSet<ContentId> = HashSet::new();
        queue.extend(selected.iter().map(|id| (*id).clone()));
        while let Some(id) = queue.pop_front() {
            if up.insert(id.clone()) {
                queue.extend(self.dependents.get(&id).into_iter().flatten().cloned());
            }
        }

        down.extend(up);
        down
    }
}

/// Visibility managers per canvas, valid for one diagram revision.
///
/// An entry built at an older revision is discarded and rebuilt from the current
/// selection on next access. Any structural change to the diagram must bump its
/// revision for this to hold.
#[derive(Debug, Default)]
pub struct VisibilityCache {
    entries: HashMap<CanvasId, (u64, PointVisibilityManager)>,
}

impl VisibilityCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The manager for `canvas_id`, rebuilt if the diagram changed since it was built.
    pub fn manager(
        &mut self,
        diagram: &Diagram,
        canvas_id: &str,
        selected: &HashSet<ContentId>,
    ) -> EditResult<&mut PointVisibilityManager> {
        let fresh = self
            .entries
            .get(canvas_id)
            .is_some_and(|(revision, _)| *revision == diagram.revision());
        if !fresh {
            log::debug!("rebuilding visibility for {canvas_id} at revision {}", diagram.revision());
            let mut manager = PointVisibilityManager::new(diagram, canvas_id)?;
            for id in selected {
                if manager.states.contains_key(id) {
                    manager.set_selection_state(id, true)?;
                }
            }
            self.entries
                .insert(canvas_id.to_string(), (diagram.revision(), manager));
        }
        self.entries
            .get_mut(canvas_id)
            .map(|(_, manager)| manager)
            .ok_or_else(|| EditError::UnknownCanvas(canvas_id.to_string()))
    }

    /// Apply a selection change to every cached manager that tracks `id`.
    ///
    /// A manager also tracks the dependencies its canvas reads from other canvases,
    /// so the change reaches more than the content's own canvas. `selected` must
    /// already reflect the change; stale entries are dropped and rebuilt from it later.
    pub fn set_selection_state(
        &mut self,
        diagram: &Diagram,
        id: &str,
        selected: bool,
        selection: &HashSet<ContentId>,
    ) -> EditResult<()> {
        let canvas = diagram.content(id)?.parent().clone();
        self.manager(diagram, &canvas, selection)?;
        self.entries
            .retain(|_, (revision, _)| *revision == diagram.revision());
        for (_, manager) in self.entries.values_mut() {
            if manager.states.contains_key(id) {
                manager.set_selection_state(id, selected)?;
            }
        }
        Ok(())
    }

    /// Drop every cached manager.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AbsolutePoint, Canvas, CanvasConnection, CanvasElement, ConnectionSegment, RelativePoint};
    use proptest::prelude::*;

    /// a, b absolute; r relative to a; el at r; conn from a to b.
    fn diagram() -> Diagram {
        let mut d = Diagram::new();
        d.insert_canvas(Canvas::new("c", 0.0));
        d.insert_content(AbsolutePoint::new("a", "c", 0.0, 0.0)).unwrap();
        d.insert_content(AbsolutePoint::new("b", "c", 100.0, 0.0)).unwrap();
        d.insert_content(RelativePoint::new("r", "c", "a", 5.0, 5.0)).unwrap();
        d.insert_content(CanvasElement::new("el", "c", "r")).unwrap();
        d.insert_content(CanvasConnection::new(
            "conn",
            "c",
            "a",
            vec![ConnectionSegment::Line { end: "b".into() }],
        ))
        .unwrap();
        d
    }

    fn visible(manager: &PointVisibilityManager) -> Vec<&str> {
        let mut ids: Vec<&str> = manager.visible_ids().iter().map(String::as_str).collect();
        ids.sort();
        ids
    }

    #[test]
    fn test_nothing_visible_initially() {
        let d = diagram();
        let manager = PointVisibilityManager::new(&d, "c").unwrap();
        assert!(manager.visible_ids().is_empty());
    }

    #[test]
    fn test_select_element_shows_dependencies() {
        let d = diagram();
        let mut manager = PointVisibilityManager::new(&d, "c").unwrap();
        manager.set_selection_state("el", true).unwrap();
        assert_eq!(visible(&manager), vec!["a", "el", "r"]);
        assert!(!manager.is_visible("b"));
    }

    #[test]
    fn test_select_point_shows_dependents_and_peer() {
        let d = diagram();
        let mut manager = PointVisibilityManager::new(&d, "c").unwrap();
        manager.set_selection_state("a", true).unwrap();
        // The connection is a peer of `a`, so its other end shows up too.
        assert_eq!(visible(&manager), vec!["a", "b", "conn", "el", "r"]);
    }

    #[test]
    fn test_deselect_retracts_everything() {
        let d = diagram();
        let mut manager = PointVisibilityManager::new(&d, "c").unwrap();
        manager.set_selection_state("a", true).unwrap();
        manager.set_selection_state("el", true).unwrap();
        manager.set_selection_state("a", false).unwrap();
        assert_eq!(visible(&manager), vec!["a", "el", "r"]);
        manager.set_selection_state("el", false).unwrap();
        assert!(manager.visible_ids().is_empty());
    }

    #[test]
    fn test_unknown_id_is_rejected() {
        let d = diagram();
        let mut manager = PointVisibilityManager::new(&d, "c").unwrap();
        assert!(matches!(
            manager.set_selection_state("ghost", true),
            Err(EditError::UnknownContent(_))
        ));
    }

    #[test]
    fn test_cache_rebuilds_on_revision_change() {
        let mut d = diagram();
        let mut cache = VisibilityCache::new();
        let selected: HashSet<ContentId> = ["el".to_string()].into();
        cache.manager(&d, "c", &selected).unwrap();

        d.insert_content(AbsolutePoint::new("late", "c", 1.0, 1.0)).unwrap();
        let manager = cache.manager(&d, "c", &selected).unwrap();
        assert!(manager.is_visible("r"));
        assert!(manager.set_selection_state("late", true).is_ok());
        assert_eq!(cache.len(), 1);
    }

    const IDS: [&str; 5] = ["a", "b", "r", "el", "conn"];

    proptest! {
        #[test]
        fn prop_incremental_matches_batch(ops in prop::collection::vec((0usize..5, any::<bool>()), 0..40)) {
            let d = diagram();
            let mut manager = PointVisibilityManager::new(&d, "c").unwrap();
            let mut selected = HashSet::new();
            for (index, select) in ops {
                let id = IDS[index];
                manager.set_selection_state(id, select).unwrap();
                if select {
                    selected.insert(id.to_string());
                } else {
                    selected.remove(id);
                }
                prop_assert_eq!(manager.visible_ids(), &manager.recompute(&selected));
            }
            if selected.is_empty() {
                prop_assert!(manager.visible_ids().is_empty());
            }
        }
    }
}
