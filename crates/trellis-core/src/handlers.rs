//! Move handlers: turn pointer positions into edit payloads for one gesture.
//!
//! Handlers are built at pointer-down with everything they need resolved up front
//! (targets, frames, original geometry), so pointer-move work stays small.

use crate::edit::EditKind;
use crate::input::Modifiers;
use crate::layout::TransformedLine;
use crate::math::{Axis, normalize_degrees, wrap_degrees};
use crate::model::ContentId;
use crate::selector::{MoveAxes, MovedElementsSelector};
use crate::snap::{SnapEngine, SnapLines, snap_angle};
use kurbo::{Affine, Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Common interface of all move handlers.
pub trait MoveHandler {
    /// Ids the emitted edits apply to.
    fn targets(&self) -> Vec<ContentId>;

    /// Payload for the pointer at `pointer` (root frame), or `None` if nothing changes.
    fn on_move(&mut self, pointer: Point, modifiers: Modifiers) -> Option<EditKind>;

    /// Guide lines of the last move, if the handler snaps.
    fn snap_lines(&self) -> Option<&SnapLines> {
        None
    }
}

/// Handler used when a gesture must not edit anything (e.g. on a move conflict).
#[derive(Debug, Clone, Default)]
pub struct NoopHandler;

impl MoveHandler for NoopHandler {
    fn targets(&self) -> Vec<ContentId> {
        Vec::new()
    }

    fn on_move(&mut self, _pointer: Point, _modifiers: Modifiers) -> Option<EditKind> {
        None
    }
}

/// Translation of the current selection.
///
/// Holding shift constrains the drag to its dominant axis, which re-initializes the
/// selector for that single axis. Holding alt suspends snapping.
pub struct TranslationMoveHandler {
    selector: MovedElementsSelector,
    start: Point,
    snap: Option<(SnapEngine, HashMap<String, Rect>)>,
    last_offset: Vec2,
    lines: SnapLines,
}

impl TranslationMoveHandler {
    /// `selector` must already be initialized for both axes without conflict.
    pub fn new(selector: MovedElementsSelector, start: Point) -> Self {
        Self {
            selector,
            start,
            snap: None,
            last_offset: Vec2::ZERO,
            lines: SnapLines::new(),
        }
    }

    /// Snap against `engine`, given the selection's bounds per context.
    pub fn with_snapping(mut self, engine: SnapEngine, selection: HashMap<String, Rect>) -> Self {
        self.snap = Some((engine, selection));
        self
    }

    pub fn selector(&self) -> &MovedElementsSelector {
        &self.selector
    }

    fn constrain(&mut self, raw: Vec2, modifiers: Modifiers) -> Option<Vec2> {
        let axes = if modifiers.shift {
            if raw.x.abs() >= raw.y.abs() { MoveAxes::X } else { MoveAxes::Y }
        } else {
            MoveAxes::BOTH
        };
        if self.selector.axes() != axes {
            log::trace!("re-initializing selector for {axes:?}");
            self.selector.initialize(axes);
        }
        if self.selector.has_conflict() {
            return None;
        }
        Some(Vec2::new(
            if axes.x { raw.x } else { 0.0 },
            if axes.y { raw.y } else { 0.0 },
        ))
    }
}

impl MoveHandler for TranslationMoveHandler {
    fn targets(&self) -> Vec<ContentId> {
        let mut ids = self.selector.moved_elements_x();
        for id in self.selector.moved_elements_y() {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        ids
    }

    fn on_move(&mut self, pointer: Point, modifiers: Modifiers) -> Option<EditKind> {
        let raw = self.constrain(pointer - self.start, modifiers)?;
        let axes = self.selector.axes();

        self.lines.clear();
        let offset = match &self.snap {
            Some((engine, selection)) if !modifiers.alt => {
                let outcome = engine.snap(raw, selection);
                self.lines = outcome.lines;
                Vec2::new(
                    if axes.x { outcome.offset.x } else { 0.0 },
                    if axes.y { outcome.offset.y } else { 0.0 },
                )
            }
            _ => raw,
        };

        let delta = offset - self.last_offset;
        self.last_offset = offset;
        Some(EditKind::TranslationMove {
            x_elements: self.selector.moved_elements_x(),
            y_elements: self.selector.moved_elements_y(),
            offset_x: offset.x,
            offset_y: offset.y,
            delta_offset_x: delta.x,
            delta_offset_y: delta.y,
        })
    }

    fn snap_lines(&self) -> Option<&SnapLines> {
        Some(&self.lines)
    }
}

/// Corner of an element's box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    #[default]
    BottomRight,
}

impl Corner {
    /// Direction the box grows in when the corner moves by a positive delta.
    fn growth(self) -> Vec2 {
        match self {
            Corner::TopLeft => Vec2::new(-1.0, -1.0),
            Corner::TopRight => Vec2::new(1.0, -1.0),
            Corner::BottomLeft => Vec2::new(-1.0, 1.0),
            Corner::BottomRight => Vec2::new(1.0, 1.0),
        }
    }
}

/// Limit a resize factor; past `max` the box flips to unit size the other way.
pub fn clamp_factor(factor: f64, max: f64) -> f64 {
    if !factor.is_finite() {
        1.0
    } else if factor.abs() > max {
        -factor.signum()
    } else {
        factor
    }
}

/// Resize of a single element by dragging one of its corners.
pub struct ResizeHandler {
    element: ContentId,
    start: Point,
    /// Root frame to the element's own (rotated) frame, without translation.
    to_local: Affine,
    size: Vec2,
    corner: Corner,
    max_factor: f64,
    last: Vec2,
}

impl ResizeHandler {
    pub fn new(
        element: impl Into<ContentId>,
        start: Point,
        to_local: Affine,
        size: Vec2,
        corner: Corner,
        max_factor: f64,
    ) -> Self {
        Self {
            element: element.into(),
            start,
            to_local,
            size,
            corner,
            max_factor,
            last: Vec2::new(1.0, 1.0),
        }
    }

    fn factor(&self, extent: f64, grown: f64) -> f64 {
        if extent == 0.0 {
            1.0
        } else {
            clamp_factor((extent + grown) / extent, self.max_factor)
        }
    }
}

impl MoveHandler for ResizeHandler {
    fn targets(&self) -> Vec<ContentId> {
        vec![self.element.clone()]
    }

    fn on_move(&mut self, pointer: Point, modifiers: Modifiers) -> Option<EditKind> {
        let delta = (self.to_local * pointer) - (self.to_local * self.start);
        let growth = self.corner.growth();
        let mut factor = Vec2::new(
            self.factor(self.size.x, delta.x * growth.x),
            self.factor(self.size.y, delta.y * growth.y),
        );
        if modifiers.shift {
            let uniform = if factor.x.abs() >= factor.y.abs() { factor.x } else { factor.y };
            factor = Vec2::new(uniform, uniform);
        }

        let ratio = |now: f64, before: f64| if before == 0.0 { now } else { now / before };
        let delta_factor = Vec2::new(ratio(factor.x, self.last.x), ratio(factor.y, self.last.y));
        self.last = factor;
        Some(EditKind::Resize {
            factor_x: factor.x,
            factor_y: factor.y,
            delta_factor_x: delta_factor.x,
            delta_factor_y: delta_factor.y,
        })
    }
}

/// Rotation of a single element around its center.
pub struct RotationHandler {
    element: ContentId,
    center: Point,
    start_angle: f64,
    original: f64,
    increment: f64,
    last: f64,
}

fn angle_to(center: Point, point: Point) -> f64 {
    let v = point - center;
    v.y.atan2(v.x).to_degrees()
}

impl RotationHandler {
    /// `center` and `start` are in the root frame; `increment` of zero disables snapping.
    pub fn new(element: impl Into<ContentId>, center: Point, start: Point, original: f64, increment: f64) -> Self {
        Self {
            element: element.into(),
            center,
            start_angle: angle_to(center, start),
            original,
            increment,
            last: original,
        }
    }
}

impl MoveHandler for RotationHandler {
    fn targets(&self) -> Vec<ContentId> {
        vec![self.element.clone()]
    }

    fn on_move(&mut self, pointer: Point, modifiers: Modifiers) -> Option<EditKind> {
        if pointer == self.center {
            return None;
        }
        let mut rotation = normalize_degrees(self.original + angle_to(self.center, pointer) - self.start_angle);
        if self.increment > 0.0 && !modifiers.shift {
            rotation = snap_angle(rotation, self.increment);
        }
        let delta = wrap_degrees(rotation - self.last);
        self.last = rotation;
        Some(EditKind::Rotation {
            rotation_degrees: rotation,
            delta_degrees: delta,
        })
    }
}

/// Drag of the vertical part of an axis-aligned connection segment.
pub struct AxisSegmentHandler {
    connection: ContentId,
    segment: usize,
    /// Root frame to the connection's canvas frame.
    to_local: Affine,
    start: Point,
    end: Point,
    original: f64,
}

impl AxisSegmentHandler {
    /// `start` and `end` are the segment's end points in the connection's canvas frame.
    pub fn new(
        connection: impl Into<ContentId>,
        segment: usize,
        to_local: Affine,
        start: Point,
        end: Point,
        original: f64,
    ) -> Self {
        Self {
            connection: connection.into(),
            segment,
            to_local,
            start,
            end,
            original,
        }
    }
}

impl MoveHandler for AxisSegmentHandler {
    fn targets(&self) -> Vec<ContentId> {
        vec![self.connection.clone()]
    }

    fn on_move(&mut self, pointer: Point, _modifiers: Modifiers) -> Option<EditKind> {
        let local = self.to_local * pointer;
        let span = Axis::X.component(self.end - self.start);
        let segment_pos = if span == 0.0 {
            self.original
        } else {
            (local.x - self.start.x) / span
        };
        Some(EditKind::AxisSegmentMove {
            segment: self.segment,
            segment_pos,
        })
    }
}

/// Drag of a point along the line it is placed on.
pub struct LineMoveHandler {
    point: ContentId,
    /// The line, mapped into the root frame.
    line: TransformedLine,
    segment: Option<usize>,
}

impl LineMoveHandler {
    pub fn new(point: impl Into<ContentId>, line: TransformedLine, segment: Option<usize>) -> Self {
        Self {
            point: point.into(),
            line,
            segment,
        }
    }
}

impl MoveHandler for LineMoveHandler {
    fn targets(&self) -> Vec<ContentId> {
        vec![self.point.clone()]
    }

    fn on_move(&mut self, pointer: Point, _modifiers: Modifiers) -> Option<EditKind> {
        let projection = match self.segment {
            Some(index) => self.line.project_on_segment(index, pointer)?,
            None => self.line.project(pointer)?,
        };
        Some(EditKind::LineMove {
            pos: projection.pos.clamp(0.0, 1.0),
            segment: self.segment,
        })
    }
}
