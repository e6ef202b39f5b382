//! Layout collaborator interface and an in-memory implementation.
//!
//! The layout engine owns positions; the editing core only asks it where things are.

use crate::error::{EditError, EditResult};
use crate::math::rotation;
use kurbo::{Affine, CubicBez, Line, ParamCurve, ParamCurveArclen, ParamCurveNearest, PathSeg, Point, Rect};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Accuracy used for arc length and nearest-point queries.
const CURVE_ACCURACY: f64 = 1e-6;

/// Id of the outermost context every other context is nested in.
pub const ROOT_CONTEXT: &str = "root";

/// Resolves positions of laid-out diagram contents.
pub trait LayoutEngine {
    /// Position of point `id` in the frame of `context`.
    fn point(&self, id: &str, context: &str) -> EditResult<Point>;
    /// Transform from the frame of `context` to the frame of `ancestor`.
    fn local_to_ancestor(&self, context: &str, ancestor: &str) -> EditResult<Affine>;
    /// The line exposed by an element or connection, mapped into `context`.
    fn layout_line(&self, provider: &str, context: &str) -> EditResult<TransformedLine>;
    /// Axis-aligned bounds of `id` in the frame of `context`.
    fn bounds(&self, id: &str, context: &str) -> EditResult<Rect>;
}

/// Where a point lies on a line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineProjection {
    /// Index of the closest segment.
    pub segment: usize,
    /// Parameter on that segment.
    pub t: f64,
    /// Arc-length fraction along the whole line.
    pub pos: f64,
    /// The projected point, in the line's target frame.
    pub point: Point,
}

/// A line in its own frame plus the transform into the requesting context.
#[derive(Debug, Clone)]
pub struct TransformedLine {
    pub transform: Affine,
    pub segments: Vec<PathSeg>,
}

impl TransformedLine {
    pub fn new(transform: Affine, segments: Vec<PathSeg>) -> Self {
        Self { transform, segments }
    }

    fn lengths(&self) -> Vec<f64> {
        self.segments.iter().map(|s| s.arclen(CURVE_ACCURACY)).collect()
    }

    /// Project a point given in the target frame onto the line.
    pub fn project(&self, point: Point) -> Option<LineProjection> {
        let local = self.transform.inverse() * point;
        let (segment, nearest) = self
            .segments
            .iter()
            .enumerate()
            .map(|(i, s)| (i, s.nearest(local, CURVE_ACCURACY)))
            .min_by(|a, b| a.1.distance_sq.total_cmp(&b.1.distance_sq))?;

        let lengths = self.lengths();
        let total: f64 = lengths.iter().sum();
        let before: f64 = lengths[..segment].iter().sum();
        let partial = self.segments[segment].subsegment(0.0..nearest.t).arclen(CURVE_ACCURACY);
        let pos = if total > 0.0 { (before + partial) / total } else { 0.0 };

        Some(LineProjection {
            segment,
            t: nearest.t,
            pos,
            point: self.transform * self.segments[segment].eval(nearest.t),
        })
    }

    /// Project onto a single segment; `pos` is then the fraction along that segment.
    pub fn project_on_segment(&self, segment: usize, point: Point) -> Option<LineProjection> {
        let seg = self.segments.get(segment)?;
        let nearest = seg.nearest(self.transform.inverse() * point, CURVE_ACCURACY);
        let length = seg.arclen(CURVE_ACCURACY);
        let partial = seg.subsegment(0.0..nearest.t).arclen(CURVE_ACCURACY);
        Some(LineProjection {
            segment,
            t: nearest.t,
            pos: if length > 0.0 { partial / length } else { 0.0 },
            point: self.transform * seg.eval(nearest.t),
        })
    }

    /// Point at arc-length fraction `pos` of the whole line, in the target frame.
    pub fn point_at(&self, pos: f64) -> Option<Point> {
        let lengths = self.lengths();
        let total: f64 = lengths.iter().sum();
        let mut remaining = pos.clamp(0.0, 1.0) * total;
        for (segment, length) in self.segments.iter().zip(&lengths) {
            if remaining <= *length || std::ptr::eq(segment, self.segments.last()?) {
                let t = if *length > 0.0 {
                    segment.inv_arclen(remaining.min(*length), CURVE_ACCURACY)
                } else {
                    0.0
                };
                return Some(self.transform * segment.eval(t));
            }
            remaining -= length;
        }
        None
    }
}

/// Origin and rotation of a context, expressed in the root frame.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Frame {
    pub origin: Point,
    /// Degrees.
    #[serde(default)]
    pub rotation: f64,
}

impl Frame {
    fn to_root(self) -> Affine {
        Affine::translate(self.origin.to_vec2()) * rotation(self.rotation)
    }
}

/// Bounds of an element in the frame of the context it was laid out in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaidOutBounds {
    pub context: String,
    pub rect: Rect,
}

/// Serializable line segment, in the root frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LineSegmentSpec {
    Line { from: Point, to: Point },
    Cubic { from: Point, c1: Point, c2: Point, to: Point },
}

impl From<&LineSegmentSpec> for PathSeg {
    fn from(spec: &LineSegmentSpec) -> Self {
        match *spec {
            LineSegmentSpec::Line { from, to } => PathSeg::Line(Line::new(from, to)),
            LineSegmentSpec::Cubic { from, c1, c2, to } => PathSeg::Cubic(CubicBez::new(from, c1, c2, to)),
        }
    }
}

/// A layout result captured as plain data: root-frame points, context frames,
/// element bounds and lines.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnapshotLayout {
    #[serde(default)]
    pub contexts: HashMap<String, Frame>,
    /// Point positions in the root frame.
    #[serde(default)]
    pub points: HashMap<String, Point>,
    #[serde(default)]
    pub bounds: HashMap<String, LaidOutBounds>,
    /// Lines in the root frame, keyed by provider.
    #[serde(default)]
    pub lines: HashMap<String, Vec<LineSegmentSpec>>,
}

impl SnapshotLayout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_context(mut self, id: impl Into<String>, origin: Point, rotation: f64) -> Self {
        self.contexts.insert(id.into(), Frame { origin, rotation });
        self
    }

    pub fn with_point(mut self, id: impl Into<String>, point: Point) -> Self {
        self.points.insert(id.into(), point);
        self
    }

    pub fn with_bounds(mut self, id: impl Into<String>, context: impl Into<String>, rect: Rect) -> Self {
        self.bounds.insert(
            id.into(),
            LaidOutBounds {
                context: context.into(),
                rect,
            },
        );
        self
    }

    pub fn with_line(mut self, id: impl Into<String>, segments: Vec<LineSegmentSpec>) -> Self {
        self.lines.insert(id.into(), segments);
        self
    }

    fn to_root(&self, context: &str) -> EditResult<Affine> {
        self.contexts
            .get(context)
            .map(|frame| frame.to_root())
            .ok_or_else(|| EditError::Layout(format!("unknown context {context}")))
    }
}

impl LayoutEngine for SnapshotLayout {
    fn point(&self, id: &str, context: &str) -> EditResult<Point> {
        let root = self
            .points
            .get(id)
            .ok_or_else(|| EditError::Layout(format!("no position for {id}")))?;
        Ok(self.to_root(context)?.inverse() * *root)
    }

    fn local_to_ancestor(&self, context: &str, ancestor: &str) -> EditResult<Affine> {
        Ok(self.to_root(ancestor)?.inverse() * self.to_root(context)?)
    }

    fn layout_line(&self, provider: &str, context: &str) -> EditResult<TransformedLine> {
        let specs = self
            .lines
            .get(provider)
            .ok_or_else(|| EditError::Layout(format!("no line for {provider}")))?;
        Ok(TransformedLine::new(
            self.to_root(context)?.inverse(),
            specs.iter().map(PathSeg::from).collect(),
        ))
    }

    fn bounds(&self, id: &str, context: &str) -> EditResult<Rect> {
        let laid_out = self
            .bounds
            .get(id)
            .ok_or_else(|| EditError::Layout(format!("no bounds for {id}")))?;
        let transform = self.local_to_ancestor(&laid_out.context, ROOT_CONTEXT)?;
        let transform = self.to_root(context)?.inverse() * transform;
        let r = laid_out.rect;
        let corners = [
            Point::new(r.x0, r.y0),
            Point::new(r.x1, r.y0),
            Point::new(r.x1, r.y1),
            Point::new(r.x0, r.y1),
        ]
        .map(|p| transform * p);
        let min_x = corners.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
        let max_x = corners.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max);
        let min_y = corners.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
        let max_y = corners.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);
        Ok(Rect::new(min_x, min_y, max_x, max_y))
    }
}
