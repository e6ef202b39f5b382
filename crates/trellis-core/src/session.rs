//! Editing session: selection, visibility and the active move gesture.

use crate::config::EditorConfig;
use crate::edit::{Edit, EditKind, Transaction};
use crate::error::{EditError, EditResult};
use crate::handlers::{
    AxisSegmentHandler, Corner, LineMoveHandler, MoveHandler, NoopHandler, ResizeHandler, RotationHandler,
    TranslationMoveHandler,
};
use crate::input::{DragState, Modifiers, MouseButton, PointerEvent};
use crate::layout::{LayoutEngine, ROOT_CONTEXT};
use crate::math::rotation;
use crate::model::{CanvasContent, ContentId, ConnectionSegment, Diagram};
use crate::selection::Selection;
use crate::selector::{MoveAxes, MovedElementsSelector};
use crate::snap::{ReferenceBounds, SnapContext, SnapEngine, SnapLines};
use crate::visibility::VisibilityCache;
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// What a pointer-down grabs.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GestureTarget {
    /// The current selection, translated.
    #[default]
    Selection,
    Resize {
        element: ContentId,
        #[serde(default)]
        corner: Corner,
    },
    Rotate {
        element: ContentId,
    },
    AxisSegment {
        connection: ContentId,
        segment: usize,
    },
    LinePoint {
        point: ContentId,
    },
}

struct Gesture {
    handler: Box<dyn MoveHandler>,
    transaction: Transaction,
    last: Option<EditKind>,
}

/// Drives move gestures over a diagram, emitting edit descriptors.
///
/// The editor never changes the diagram itself; applying edits is up to the caller.
pub struct Editor<L> {
    diagram: Diagram,
    layout: L,
    config: EditorConfig,
    selection: Selection,
    visibility: VisibilityCache,
    drag: DragState,
    gesture: Option<Gesture>,
}

impl<L: LayoutEngine> Editor<L> {
    pub fn new(diagram: Diagram, layout: L, config: EditorConfig) -> EditResult<Self> {
        config.validate()?;
        diagram.validate()?;
        Ok(Self {
            diagram,
            layout,
            config,
            selection: Selection::new(),
            visibility: VisibilityCache::new(),
            drag: DragState::new(),
            gesture: None,
        })
    }

    pub fn diagram(&self) -> &Diagram {
        &self.diagram
    }

    /// Structural edits bump the diagram revision, which invalidates cached visibility.
    pub fn diagram_mut(&mut self) -> &mut Diagram {
        &mut self.diagram
    }

    pub fn layout(&self) -> &L {
        &self.layout
    }

    pub fn set_layout(&mut self, layout: L) {
        self.layout = layout;
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn select(&mut self, id: &str, selected: bool) -> EditResult<()> {
        self.selection
            .set_selected(&self.diagram, &mut self.visibility, id, selected)
    }

    pub fn clear_selection(&mut self) -> EditResult<()> {
        self.selection.clear(&self.diagram, &mut self.visibility)
    }

    /// Whether `id` is shown as a handle on its canvas.
    pub fn is_visible(&mut self, id: &str) -> EditResult<bool> {
        let canvas = self.diagram.content(id)?.parent().clone();
        Ok(self
            .visibility
            .manager(&self.diagram, &canvas, self.selection.as_set())?
            .is_visible(id))
    }

    /// Visible points of a canvas, sorted.
    pub fn visible_points(&mut self, canvas: &str) -> EditResult<Vec<ContentId>> {
        let manager = self
            .visibility
            .manager(&self.diagram, canvas, self.selection.as_set())?;
        let mut points: Vec<ContentId> = manager.visible_points(&self.diagram).cloned().collect();
        points.sort();
        Ok(points)
    }

    pub fn is_gesture_active(&self) -> bool {
        self.gesture.is_some()
    }

    /// Guide lines of the latest translation frame.
    pub fn snap_lines(&self) -> Option<&SnapLines> {
        self.gesture.as_ref().and_then(|g| g.handler.snap_lines())
    }

    /// Start a gesture. A gesture still in progress is abandoned without a commit.
    pub fn pointer_down(
        &mut self,
        position: Point,
        button: MouseButton,
        modifiers: Modifiers,
        target: &GestureTarget,
    ) -> EditResult<()> {
        self.drag.press(position, button, modifiers);
        if button != MouseButton::Left {
            return Ok(());
        }
        if self.gesture.take().is_some() {
            log::warn!("pointer down during an active gesture; abandoning it");
        }
        let handler = self.build_handler(target, position)?;
        let transaction = Transaction::new();
        log::debug!("gesture {} started on {target:?}", transaction.id());
        self.gesture = Some(Gesture {
            handler,
            transaction,
            last: None,
        });
        Ok(())
    }

    /// Emit an uncommitted edit for the new pointer position.
    pub fn pointer_move(&mut self, position: Point, modifiers: Modifiers) -> Option<Edit> {
        self.drag.move_to(position, modifiers);
        let gesture = self.gesture.as_mut()?;
        let kind = gesture.handler.on_move(position, modifiers)?;
        gesture.last = Some(kind.clone());
        Some(gesture.transaction.edit(gesture.handler.targets(), kind, false))
    }

    /// Finish the gesture with a committed edit, if it produced anything.
    pub fn pointer_up(&mut self, position: Point, button: MouseButton) -> Option<Edit> {
        let modifiers = self.drag.modifiers;
        self.drag.release(position, button);
        if button != MouseButton::Left {
            return None;
        }
        self.commit(position, modifiers)
    }

    /// The pointer came back over the surface. Without buttons held, any gesture is
    /// finished as if the button had been released outside.
    pub fn pointer_enter(&mut self, position: Point, buttons: bool) -> Option<Edit> {
        if buttons {
            return None;
        }
        let modifiers = self.drag.modifiers;
        self.drag.reset();
        self.commit(position, modifiers)
    }

    /// Dispatch a pointer event; `target` is only used by pointer-down.
    pub fn handle_pointer_event(&mut self, event: &PointerEvent, target: &GestureTarget) -> EditResult<Option<Edit>> {
        Ok(match *event {
            PointerEvent::Down {
                position,
                button,
                modifiers,
            } => {
                self.pointer_down(position, button, modifiers, target)?;
                None
            }
            PointerEvent::Move { position, modifiers } => self.pointer_move(position, modifiers),
            PointerEvent::Up { position, button } => self.pointer_up(position, button),
            PointerEvent::Enter { position, buttons } => self.pointer_enter(position, buttons),
        })
    }

    fn commit(&mut self, position: Point, modifiers: Modifiers) -> Option<Edit> {
        let mut gesture = self.gesture.take()?;
        let kind = gesture.handler.on_move(position, modifiers).or(gesture.last.take())?;
        let edit = gesture.transaction.edit(gesture.handler.targets(), kind, true);
        log::debug!(
            "gesture {} committed at sequence {}",
            edit.transaction_id,
            edit.sequence_number
        );
        Some(edit)
    }

    pub fn undo(&mut self) -> EditResult<()> {
        Err(EditError::Unsupported("undo"))
    }

    pub fn redo(&mut self) -> EditResult<()> {
        Err(EditError::Unsupported("redo"))
    }

    fn build_handler(&self, target: &GestureTarget, start: Point) -> EditResult<Box<dyn MoveHandler>> {
        match target {
            GestureTarget::Selection => self.translation_handler(start),
            GestureTarget::Resize { element, corner } => {
                let CanvasContent::Element(el) = self.diagram.content(element)? else {
                    return Err(unsupported(element, "resize"));
                };
                if !el.resizable {
                    return Err(unsupported(element, "resize"));
                }
                let size = match (el.width, el.height) {
                    (Some(w), Some(h)) => Vec2::new(w, h),
                    _ => self.layout.bounds(element, &el.parent)?.size().to_vec2(),
                };
                let to_canvas = self.layout.local_to_ancestor(&el.parent, ROOT_CONTEXT)?.inverse();
                Ok(Box::new(ResizeHandler::new(
                    element.clone(),
                    start,
                    rotation(-el.rotation) * to_canvas,
                    size,
                    *corner,
                    self.config.resize_max_factor,
                )))
            }
            GestureTarget::Rotate { element } => {
                let CanvasContent::Element(el) = self.diagram.content(element)? else {
                    return Err(unsupported(element, "rotate"));
                };
                if !el.rotatable {
                    return Err(unsupported(element, "rotate"));
                }
                let center = self.layout.bounds(element, ROOT_CONTEXT)?.center();
                Ok(Box::new(RotationHandler::new(
                    element.clone(),
                    center,
                    start,
                    el.rotation,
                    self.config.rotation_snap_increment,
                )))
            }
            GestureTarget::AxisSegment { connection, segment } => {
                let CanvasContent::Connection(conn) = self.diagram.content(connection)? else {
                    return Err(unsupported(connection, "axis segment move"));
                };
                let Some(ConnectionSegment::Axis {
                    end,
                    vertical_pos,
                    editable: true,
                }) = conn.segments.get(*segment)
                else {
                    return Err(unsupported(connection, "axis segment move"));
                };
                let start = conn
                    .segment_start(*segment)
                    .ok_or_else(|| unsupported(connection, "axis segment move"))?;
                let from = self.layout.point(start, &conn.parent)?;
                let to = self.layout.point(end, &conn.parent)?;
                let to_canvas = self.layout.local_to_ancestor(&conn.parent, ROOT_CONTEXT)?.inverse();
                Ok(Box::new(AxisSegmentHandler::new(
                    connection.clone(),
                    *segment,
                    to_canvas,
                    from,
                    to,
                    *vertical_pos,
                )))
            }
            GestureTarget::LinePoint { point } => {
                let CanvasContent::LinePoint(line_point) = self.diagram.content(point)? else {
                    return Err(unsupported(point, "line move"));
                };
                if !line_point.editable_pos {
                    return Err(unsupported(point, "line move"));
                }
                let line = self.layout.layout_line(&line_point.line_provider, ROOT_CONTEXT)?;
                Ok(Box::new(LineMoveHandler::new(point.clone(), line, line_point.segment)))
            }
        }
    }

    fn translation_handler(&self, start: Point) -> EditResult<Box<dyn MoveHandler>> {
        if self.selection.is_empty() {
            return Ok(Box::new(NoopHandler));
        }
        let mut selector = MovedElementsSelector::new(&self.diagram, self.selection.ids())?;
        selector.initialize(MoveAxes::BOTH);
        if selector.has_conflict() {
            log::debug!("selection cannot be moved; using a no-op gesture");
            return Ok(Box::new(NoopHandler));
        }

        let handler = if self.config.snapping_enabled {
            let (contexts, selection) = self.snap_geometry(&selector)?;
            TranslationMoveHandler::new(selector, start)
                .with_snapping(SnapEngine::new(contexts, self.config.snap.clone()), selection)
        } else {
            TranslationMoveHandler::new(selector, start)
        };
        Ok(Box::new(handler))
    }

    /// Reference bounds per canvas, and the selection's bounds in each canvas frame.
    fn snap_geometry(
        &self,
        selector: &MovedElementsSelector,
    ) -> EditResult<(Vec<SnapContext>, HashMap<String, Rect>)> {
        let affected = selector.affected_element_ids();
        let mut contexts = Vec::new();
        let mut selection = HashMap::new();

        for canvas in self.diagram.canvases() {
            let references: Vec<ReferenceBounds> = canvas
                .children
                .iter()
                .filter(|id| !affected.contains(*id) && !self.selection.is_selected(id))
                .filter(|id| matches!(self.diagram.content(id), Ok(CanvasContent::Element(_))))
                .filter_map(|id| match self.layout.bounds(id, &canvas.id) {
                    Ok(bounds) => Some(ReferenceBounds::new(id.clone(), bounds)),
                    Err(e) => {
                        log::trace!("no snap bounds for {id}: {e}");
                        None
                    }
                })
                .collect();
            if references.is_empty() {
                continue;
            }

            let mut bounds: Option<Rect> = None;
            for id in self.selection.ids() {
                let rect = match self.diagram.content(&id)? {
                    CanvasContent::Element(_) => self.layout.bounds(&id, &canvas.id)?,
                    content if content.is_point() => {
                        let p = self.layout.point(&id, &canvas.id)?;
                        Rect::from_points(p, p)
                    }
                    _ => continue,
                };
                bounds = Some(bounds.map_or(rect, |b| b.union(rect)));
            }
            let Some(bounds) = bounds else {
                continue;
            };

            selection.insert(canvas.id.clone(), bounds);
            contexts.push(SnapContext {
                id: canvas.id.clone(),
                to_root: self.layout.local_to_ancestor(&canvas.id, ROOT_CONTEXT)?,
                references,
            });
        }
        Ok((contexts, selection))
    }
}

fn unsupported(id: &str, operation: &'static str) -> EditError {
    EditError::UnsupportedContent {
        id: id.to_string(),
        operation,
    }
}
