//! Selection bookkeeping.

use crate::error::EditResult;
use crate::model::{ContentId, Diagram};
use crate::visibility::VisibilityCache;
use std::collections::HashSet;

/// The set of selected contents.
///
/// Owns what is selected; every change is forwarded to the visibility manager of
/// the content's canvas so derived visibility stays in step.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    selected: HashSet<ContentId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.contains(id)
    }

    /// Selected ids, sorted.
    pub fn ids(&self) -> Vec<ContentId> {
        let mut ids: Vec<ContentId> = self.selected.iter().cloned().collect();
        ids.sort();
        ids
    }

    pub fn as_set(&self) -> &HashSet<ContentId> {
        &self.selected
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Select or deselect one content.
    pub fn set_selected(
        &mut self,
        diagram: &Diagram,
        visibility: &mut VisibilityCache,
        id: &str,
        selected: bool,
    ) -> EditResult<()> {
        diagram.content(id)?;
        if selected {
            self.selected.insert(id.to_string());
        } else {
            self.selected.remove(id);
        }
        visibility.set_selection_state(diagram, id, selected, &self.selected)
    }

    /// Replace the selection with a single content.
    pub fn select_only(&mut self, diagram: &Diagram, visibility: &mut VisibilityCache, id: &str) -> EditResult<()> {
        diagram.content(id)?;
        self.clear(diagram, visibility)?;
        self.set_selected(diagram, visibility, id, true)
    }

    /// Deselect everything.
    pub fn clear(&mut self, diagram: &Diagram, visibility: &mut VisibilityCache) -> EditResult<()> {
        for id in self.ids() {
            if diagram.contains(&id) {
                self.set_selected(diagram, visibility, &id, false)?;
            } else {
                self.selected.remove(&id);
            }
        }
        Ok(())
    }
}
