//! Diagram snapshot: canvases and the contents placed on them.
//!
//! The snapshot is produced by the layout collaborator and is read-only for the
//! editing core, apart from structural changes that bump [`Diagram::revision`].

use crate::error::{EditError, EditResult};
use crate::math::normalize_degrees;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Stable identifier of a canvas content.
pub type ContentId = String;
/// Identifier of a canvas.
pub type CanvasId = String;

fn default_true() -> bool {
    true
}

/// A container of canvas contents with its own global rotation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Canvas {
    pub id: CanvasId,
    /// Accumulated rotation in degrees, normalized to `[0, 360)`.
    #[serde(default)]
    pub global_rotation: f64,
    /// Contents placed directly on this canvas (markers live on their connection).
    #[serde(default)]
    pub children: Vec<ContentId>,
}

impl Canvas {
    pub fn new(id: impl Into<CanvasId>, global_rotation: f64) -> Self {
        Self {
            id: id.into(),
            global_rotation: normalize_degrees(global_rotation),
            children: Vec::new(),
        }
    }
}

/// A point with fixed coordinates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbsolutePoint {
    pub id: ContentId,
    pub parent: CanvasId,
    pub x: f64,
    pub y: f64,
    #[serde(default = "default_true")]
    pub editable_x: bool,
    #[serde(default = "default_true")]
    pub editable_y: bool,
}

impl AbsolutePoint {
    pub fn new(id: impl Into<ContentId>, parent: impl Into<CanvasId>, x: f64, y: f64) -> Self {
        Self {
            id: id.into(),
            parent: parent.into(),
            x,
            y,
            editable_x: true,
            editable_y: true,
        }
    }

    /// Restrict which coordinates can be edited.
    pub fn with_editable(mut self, x: bool, y: bool) -> Self {
        self.editable_x = x;
        self.editable_y = y;
        self
    }
}

/// A point placed at an offset from another point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelativePoint {
    pub id: ContentId,
    pub parent: CanvasId,
    pub target: ContentId,
    pub offset_x: f64,
    pub offset_y: f64,
    #[serde(default = "default_true")]
    pub editable_x: bool,
    #[serde(default = "default_true")]
    pub editable_y: bool,
}

impl RelativePoint {
    pub fn new(
        id: impl Into<ContentId>,
        parent: impl Into<CanvasId>,
        target: impl Into<ContentId>,
        offset_x: f64,
        offset_y: f64,
    ) -> Self {
        Self {
            id: id.into(),
            parent: parent.into(),
            target: target.into(),
            offset_x,
            offset_y,
            editable_x: true,
            editable_y: true,
        }
    }

    /// Restrict which offsets can be edited.
    pub fn with_editable(mut self, x: bool, y: bool) -> Self {
        self.editable_x = x;
        self.editable_y = y;
        self
    }
}

/// A point placed at a fractional position along a line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinePoint {
    pub id: ContentId,
    pub parent: CanvasId,
    /// Element or connection exposing the line.
    pub line_provider: ContentId,
    /// Position in `0..=1`, relative to `segment` when set, to the whole line otherwise.
    pub pos: f64,
    #[serde(default)]
    pub segment: Option<usize>,
    /// Distance from the line, along its normal.
    #[serde(default)]
    pub distance: f64,
    #[serde(default = "default_true")]
    pub editable_pos: bool,
}

impl LinePoint {
    pub fn new(
        id: impl Into<ContentId>,
        parent: impl Into<CanvasId>,
        line_provider: impl Into<ContentId>,
        pos: f64,
    ) -> Self {
        Self {
            id: id.into(),
            parent: parent.into(),
            line_provider: line_provider.into(),
            pos,
            segment: None,
            distance: 0.0,
            editable_pos: true,
        }
    }

    /// Pin the position to a single segment of a connection.
    pub fn on_segment(mut self, segment: usize) -> Self {
        self.segment = Some(segment);
        self
    }
}

/// A positioned, optionally sized and rotated box.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanvasElement {
    pub id: ContentId,
    pub parent: CanvasId,
    /// Point the element is anchored at. Elements without one are placed by layout only.
    #[serde(default)]
    pub pos: Option<ContentId>,
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
    /// Rotation in degrees.
    #[serde(default)]
    pub rotation: f64,
    #[serde(default = "default_true")]
    pub resizable: bool,
    #[serde(default = "default_true")]
    pub rotatable: bool,
}

impl CanvasElement {
    pub fn new(id: impl Into<ContentId>, parent: impl Into<CanvasId>, pos: impl Into<ContentId>) -> Self {
        Self {
            id: id.into(),
            parent: parent.into(),
            pos: Some(pos.into()),
            width: None,
            height: None,
            rotation: 0.0,
            resizable: true,
            rotatable: true,
        }
    }

    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn with_rotation(mut self, rotation: f64) -> Self {
        self.rotation = rotation;
        self
    }
}

/// One segment of a connection, ending at `end`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConnectionSegment {
    Line {
        end: ContentId,
    },
    /// Horizontal-vertical-horizontal route; the vertical part sits at `vertical_pos`
    /// (fraction of the horizontal distance between the segment's ends).
    Axis {
        end: ContentId,
        vertical_pos: f64,
        #[serde(default = "default_true")]
        editable: bool,
    },
    Bezier {
        end: ContentId,
        start_control: ContentId,
        end_control: ContentId,
    },
}

impl ConnectionSegment {
    /// The point this segment ends at.
    pub fn end(&self) -> &ContentId {
        match self {
            ConnectionSegment::Line { end }
            | ConnectionSegment::Axis { end, .. }
            | ConnectionSegment::Bezier { end, .. } => end,
        }
    }

    /// Ids the segment owns: its end plus any control points.
    pub fn owned_points(&self) -> Vec<ContentId> {
        match self {
            ConnectionSegment::Line { end } | ConnectionSegment::Axis { end, .. } => vec![end.clone()],
            ConnectionSegment::Bezier {
                end,
                start_control,
                end_control,
            } => vec![start_control.clone(), end_control.clone(), end.clone()],
        }
    }
}

/// A chain of segments from `start` through each segment's end.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanvasConnection {
    pub id: ContentId,
    pub parent: CanvasId,
    pub start: ContentId,
    pub segments: Vec<ConnectionSegment>,
    #[serde(default)]
    pub start_marker: Option<ContentId>,
    #[serde(default)]
    pub end_marker: Option<ContentId>,
}

impl CanvasConnection {
    pub fn new(
        id: impl Into<ContentId>,
        parent: impl Into<CanvasId>,
        start: impl Into<ContentId>,
        segments: Vec<ConnectionSegment>,
    ) -> Self {
        Self {
            id: id.into(),
            parent: parent.into(),
            start: start.into(),
            segments,
            start_marker: None,
            end_marker: None,
        }
    }

    /// The point the connection ends at.
    pub fn terminal(&self) -> &ContentId {
        self.segments.last().map(|s| s.end()).unwrap_or(&self.start)
    }

    /// The point segment `index` starts at.
    pub fn segment_start(&self, index: usize) -> Option<&ContentId> {
        match index {
            _ if index >= self.segments.len() => None,
            0 => Some(&self.start),
            _ => self.segments.get(index - 1).map(ConnectionSegment::end),
        }
    }

    /// Points defining segment `index`: its start, control points and end.
    pub fn segment_points(&self, index: usize) -> Option<Vec<ContentId>> {
        let segment = self.segments.get(index)?;
        let mut points = vec![self.segment_start(index)?.clone()];
        points.extend(segment.owned_points());
        Some(points)
    }

    /// The start point followed by every segment's owned points.
    pub fn all_points(&self) -> Vec<ContentId> {
        let mut points = vec![self.start.clone()];
        for segment in &self.segments {
            points.extend(segment.owned_points());
        }
        points
    }
}

/// Which end of a connection a marker decorates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerPosition {
    Start,
    End,
}

/// Arrowhead-like decoration at one end of a connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Marker {
    pub id: ContentId,
    pub parent: CanvasId,
    pub connection: ContentId,
    pub position: MarkerPosition,
}

/// Anything placed on a canvas.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CanvasContent {
    AbsolutePoint(AbsolutePoint),
    RelativePoint(RelativePoint),
    LinePoint(LinePoint),
    Element(CanvasElement),
    Connection(CanvasConnection),
    Marker(Marker),
}

impl CanvasContent {
    pub fn id(&self) -> &ContentId {
        match self {
            CanvasContent::AbsolutePoint(p) => &p.id,
            CanvasContent::RelativePoint(p) => &p.id,
            CanvasContent::LinePoint(p) => &p.id,
            CanvasContent::Element(e) => &e.id,
            CanvasContent::Connection(c) => &c.id,
            CanvasContent::Marker(m) => &m.id,
        }
    }

    /// The canvas this content is placed on.
    pub fn parent(&self) -> &CanvasId {
        match self {
            CanvasContent::AbsolutePoint(p) => &p.parent,
            CanvasContent::RelativePoint(p) => &p.parent,
            CanvasContent::LinePoint(p) => &p.parent,
            CanvasContent::Element(e) => &e.parent,
            CanvasContent::Connection(c) => &c.parent,
            CanvasContent::Marker(m) => &m.parent,
        }
    }

    /// Whether this content is rendered as a draggable point handle.
    pub fn is_point(&self) -> bool {
        matches!(
            self,
            CanvasContent::AbsolutePoint(_) | CanvasContent::RelativePoint(_) | CanvasContent::LinePoint(_)
        )
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            CanvasContent::AbsolutePoint(_) => "absolute point",
            CanvasContent::RelativePoint(_) => "relative point",
            CanvasContent::LinePoint(_) => "line point",
            CanvasContent::Element(_) => "element",
            CanvasContent::Connection(_) => "connection",
            CanvasContent::Marker(_) => "marker",
        }
    }
}

/// Serialized form of a diagram.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiagramSnapshot {
    pub canvases: Vec<Canvas>,
    pub contents: Vec<CanvasContent>,
}

/// A validated diagram graph.
#[derive(Debug, Clone, Default)]
pub struct Diagram {
    canvases: HashMap<CanvasId, Canvas>,
    contents: HashMap<ContentId, CanvasContent>,
    revision: u64,
}

impl Diagram {
    /// Create an empty diagram.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a diagram from a snapshot and check it is well formed.
    pub fn from_snapshot(snapshot: DiagramSnapshot) -> EditResult<Self> {
        let mut diagram = Self::new();
        for mut canvas in snapshot.canvases {
            canvas.global_rotation = normalize_degrees(canvas.global_rotation);
            diagram.canvases.insert(canvas.id.clone(), canvas);
        }
        for content in snapshot.contents {
            // Snapshots may leave `children` out; placement comes from `parent`.
            if let Some(canvas) = diagram.canvases.get_mut(content.parent()) {
                if !matches!(content, CanvasContent::Marker(_)) && !canvas.children.contains(content.id()) {
                    canvas.children.push(content.id().clone());
                }
            }
            diagram.contents.insert(content.id().clone(), content);
        }
        diagram.validate()?;
        Ok(diagram)
    }

    /// Parse and validate a JSON snapshot.
    pub fn from_json(json: &str) -> EditResult<Self> {
        let snapshot: DiagramSnapshot =
            serde_json::from_str(json).map_err(|e| EditError::Config(e.to_string()))?;
        Self::from_snapshot(snapshot)
    }

    /// Structural version; bumped whenever canvases or contents change.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn insert_canvas(&mut self, canvas: Canvas) {
        self.canvases.insert(canvas.id.clone(), canvas);
        self.revision += 1;
    }

    /// Add a content, registering it as a child of its canvas (markers excepted).
    pub fn insert_content(&mut self, content: impl Into<CanvasContent>) -> EditResult<()> {
        let content = content.into();
        let parent = content.parent().clone();
        let canvas = self
            .canvases
            .get_mut(&parent)
            .ok_or_else(|| EditError::UnknownCanvas(parent.clone()))?;
        if !matches!(content, CanvasContent::Marker(_)) && !canvas.children.contains(content.id()) {
            canvas.children.push(content.id().clone());
        }
        self.contents.insert(content.id().clone(), content);
        self.revision += 1;
        Ok(())
    }

    /// Remove a content and detach it from its canvas.
    pub fn remove_content(&mut self, id: &str) -> Option<CanvasContent> {
        let removed = self.contents.remove(id)?;
        if let Some(canvas) = self.canvases.get_mut(removed.parent()) {
            canvas.children.retain(|child| child != id);
        }
        self.revision += 1;
        Some(removed)
    }

    pub fn canvas(&self, id: &str) -> EditResult<&Canvas> {
        self.canvases
            .get(id)
            .ok_or_else(|| EditError::UnknownCanvas(id.to_string()))
    }

    pub fn canvases(&self) -> impl Iterator<Item = &Canvas> {
        self.canvases.values()
    }

    pub fn content(&self, id: &str) -> EditResult<&CanvasContent> {
        self.contents
            .get(id)
            .ok_or_else(|| EditError::UnknownContent(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.contents.contains_key(id)
    }

    pub fn contents(&self) -> impl Iterator<Item = &CanvasContent> {
        self.contents.values()
    }

    /// Global rotation of the canvas a content is placed on.
    pub fn frame_rotation(&self, id: &str) -> EditResult<f64> {
        let content = self.content(id)?;
        Ok(self.canvas(content.parent())?.global_rotation)
    }

    fn connection(&self, from: &str, id: &str) -> EditResult<&CanvasConnection> {
        match self.contents.get(id) {
            Some(CanvasContent::Connection(connection)) => Ok(connection),
            Some(_) => Err(EditError::UnsupportedContent {
                id: id.to_string(),
                operation: "markers",
            }),
            None => Err(EditError::DanglingReference {
                from: from.to_string(),
                to: id.to_string(),
            }),
        }
    }

    /// Ids the line under a line point is computed from.
    fn line_dependencies(&self, point: &LinePoint) -> EditResult<Vec<ContentId>> {
        match self.contents.get(&point.line_provider) {
            Some(CanvasContent::Connection(connection)) => match point.segment {
                Some(index) => connection.segment_points(index).ok_or_else(|| EditError::DanglingReference {
                    from: point.id.clone(),
                    to: format!("{}[{}]", connection.id, index),
                }),
                None => Ok(connection.all_points()),
            },
            Some(_) => Ok(vec![point.line_provider.clone()]),
            None => Err(EditError::DanglingReference {
                from: point.id.clone(),
                to: point.line_provider.clone(),
            }),
        }
    }

    fn marker_dependencies(&self, marker: &Marker) -> EditResult<Vec<ContentId>> {
        let connection = self.connection(&marker.id, &marker.connection)?;
        let index = match marker.position {
            MarkerPosition::Start => 0,
            MarkerPosition::End => connection.segments.len().saturating_sub(1),
        };
        Ok(connection
            .segment_points(index)
            .unwrap_or_else(|| vec![connection.start.clone()]))
    }

    /// Ids the position of `id` is computed from.
    pub fn dependencies(&self, id: &str) -> EditResult<Vec<ContentId>> {
        let deps = match self.content(id)? {
            CanvasContent::AbsolutePoint(_) => Vec::new(),
            CanvasContent::RelativePoint(point) => vec![point.target.clone()],
            CanvasContent::LinePoint(point) => self.line_dependencies(point)?,
            CanvasContent::Element(element) => element.pos.iter().cloned().collect(),
            CanvasContent::Connection(connection) => connection.all_points(),
            CanvasContent::Marker(marker) => self.marker_dependencies(marker)?,
        };
        self.check_references(id, &deps)?;
        Ok(deps)
    }

    /// Ids that must move for `id` to move.
    ///
    /// Same as [`Diagram::dependencies`] except that a connection is positioned by
    /// where it points to: its terminal point.
    pub fn position_dependencies(&self, id: &str) -> EditResult<Vec<ContentId>> {
        match self.content(id)? {
            CanvasContent::Connection(connection) => {
                let deps = vec![connection.terminal().clone()];
                self.check_references(id, &deps)?;
                Ok(deps)
            }
            _ => self.dependencies(id),
        }
    }

    fn check_references(&self, from: &str, ids: &[ContentId]) -> EditResult<()> {
        match ids.iter().find(|id| !self.contents.contains_key(*id)) {
            Some(missing) => Err(EditError::DanglingReference {
                from: from.to_string(),
                to: missing.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Children of a canvas plus the markers of its connections.
    pub fn canvas_contents(&self, canvas_id: &str) -> EditResult<Vec<&CanvasContent>> {
        let canvas = self.canvas(canvas_id)?;
        let mut contents = Vec::with_capacity(canvas.children.len());
        for child in &canvas.children {
            let content = self.contents.get(child).ok_or_else(|| EditError::DanglingReference {
                from: canvas_id.to_string(),
                to: child.clone(),
            })?;
            contents.push(content);
            if let CanvasContent::Connection(connection) = content {
                for marker in connection.start_marker.iter().chain(connection.end_marker.iter()) {
                    contents.push(self.content(marker).map_err(|_| EditError::DanglingReference {
                        from: connection.id.clone(),
                        to: marker.clone(),
                    })?);
                }
            }
        }
        Ok(contents)
    }

    /// Check that every reference resolves and that dependencies form a DAG.
    pub fn validate(&self) -> EditResult<()> {
        for canvas in self.canvases.values() {
            self.canvas_contents(&canvas.id)?;
        }
        for content in self.contents.values() {
            self.canvas(content.parent())?;
            self.dependencies(content.id())?;
        }
        self.check_acyclic()
    }

    fn check_acyclic(&self) -> EditResult<()> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Visiting,
            Done,
        }

        let mut marks: HashMap<&str, Mark> = HashMap::with_capacity(self.contents.len());
        for root in self.contents.keys() {
            if marks.contains_key(root.as_str()) {
                continue;
            }
            // Iterative DFS: (id, expanded)
            let mut stack: Vec<(&str, bool)> = vec![(root.as_str(), false)];
            while let Some((id, expanded)) = stack.pop() {
                if expanded {
                    marks.insert(id, Mark::Done);
                    continue;
                }
                match marks.get(id) {
                    Some(Mark::Done) => continue,
                    Some(Mark::Visiting) => continue,
                    None => {}
                }
                marks.insert(id, Mark::Visiting);
                stack.push((id, true));
                for dep in self.dependencies(id)? {
                    let (dep_id, _) = self
                        .contents
                        .get_key_value(dep.as_str())
                        .ok_or_else(|| EditError::UnknownContent(dep.clone()))?;
                    match marks.get(dep_id.as_str()) {
                        Some(Mark::Visiting) => return Err(EditError::DependencyCycle(dep_id.clone())),
                        Some(Mark::Done) => {}
                        None => stack.push((dep_id.as_str(), false)),
                    }
                }
            }
        }
        Ok(())
    }
}

impl From<AbsolutePoint> for CanvasContent {
    fn from(point: AbsolutePoint) -> Self {
        CanvasContent::AbsolutePoint(point)
    }
}

impl From<RelativePoint> for CanvasContent {
    fn from(point: RelativePoint) -> Self {
        CanvasContent::RelativePoint(point)
    }
}

impl From<LinePoint> for CanvasContent {
    fn from(point: LinePoint) -> Self {
        CanvasContent::LinePoint(point)
    }
}

impl From<CanvasElement> for CanvasContent {
    fn from(element: CanvasElement) -> Self {
        CanvasContent::Element(element)
    }
}

impl From<CanvasConnection> for CanvasContent {
    fn from(connection: CanvasConnection) -> Self {
        CanvasContent::Connection(connection)
    }
}

impl From<Marker> for CanvasContent {
    fn from(marker: Marker) -> Self {
        CanvasContent::Marker(marker)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connection_diagram() -> Diagram {
        let mut diagram = Diagram::new();
        diagram.insert_canvas(Canvas::new("root", 0.0));
        diagram.insert_content(AbsolutePoint::new("a", "root", 0.0, 0.0)).unwrap();
        diagram.insert_content(AbsolutePoint::new("b", "root", 100.0, 0.0)).unwrap();
        diagram.insert_content(AbsolutePoint::new("c1", "root", 20.0, 40.0)).unwrap();
        diagram.insert_content(AbsolutePoint::new("c2", "root", 80.0, 40.0)).unwrap();
        diagram.insert_content(AbsolutePoint::new("d", "root", 100.0, 100.0)).unwrap();
        let mut connection = CanvasConnection::new(
            "conn",
            "root",
            "a",
            vec![
                ConnectionSegment::Line { end: "b".into() },
                ConnectionSegment::Bezier {
                    end: "d".into(),
                    start_control: "c1".into(),
                    end_control: "c2".into(),
                },
            ],
        );
        connection.end_marker = Some("arrow".into());
        diagram.insert_content(connection).unwrap();
        diagram
            .insert_content(Marker {
                id: "arrow".into(),
                parent: "root".into(),
                connection: "conn".into(),
                position: MarkerPosition::End,
            })
            .unwrap();
        diagram
    }

    #[test]
    fn test_connection_dependencies() {
        let diagram = connection_diagram();
        assert_eq!(diagram.dependencies("conn").unwrap(), vec!["a", "b", "c1", "c2", "d"]);
        assert_eq!(diagram.position_dependencies("conn").unwrap(), vec!["d"]);
        assert_eq!(diagram.dependencies("arrow").unwrap(), vec!["b", "c1", "c2", "d"]);
    }

    #[test]
    fn test_segment_bounds() {
        let diagram = connection_diagram();
        let CanvasContent::Connection(conn) = diagram.content("conn").unwrap() else {
            panic!("expected a connection");
        };
        assert_eq!(conn.segment_start(0).map(String::as_str), Some("a"));
        assert_eq!(conn.segment_start(1).map(String::as_str), Some("b"));
        assert_eq!(conn.segment_start(2), None);
        assert_eq!(conn.segment_start(7), None);
        assert_eq!(conn.segment_points(5), None);
    }

    #[test]
    fn test_line_point_on_segment() {
        let mut diagram = connection_diagram();
        diagram
            .insert_content(LinePoint::new("label", "root", "conn", 0.5).on_segment(0))
            .unwrap();
        assert_eq!(diagram.dependencies("label").unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn test_canvas_contents_include_markers() {
        let diagram = connection_diagram();
        let ids: Vec<_> = diagram
            .canvas_contents("root")
            .unwrap()
            .into_iter()
            .map(|c| c.id().clone())
            .collect();
        assert!(ids.contains(&"arrow".to_string()));
        assert_eq!(ids.len(), 7);
    }

    #[test]
    fn test_dangling_reference_is_reported() {
        let mut diagram = Diagram::new();
        diagram.insert_canvas(Canvas::new("root", 0.0));
        diagram
            .insert_content(RelativePoint::new("r", "root", "missing", 1.0, 1.0))
            .unwrap();
        let err = diagram.validate().unwrap_err();
        assert!(matches!(err, EditError::DanglingReference { ref to, .. } if to == "missing"));
    }

    #[test]
    fn test_cycle_is_reported() {
        let mut diagram = Diagram::new();
        diagram.insert_canvas(Canvas::new("root", 0.0));
        diagram.insert_content(RelativePoint::new("p", "root", "q", 1.0, 0.0)).unwrap();
        diagram.insert_content(RelativePoint::new("q", "root", "p", 1.0, 0.0)).unwrap();
        assert!(matches!(diagram.validate(), Err(EditError::DependencyCycle(_))));
    }

    #[test]
    fn test_revision_bumps_on_structural_change() {
        let mut diagram = connection_diagram();
        let before = diagram.revision();
        diagram.insert_content(AbsolutePoint::new("e", "root", 1.0, 1.0)).unwrap();
        assert!(diagram.revision() > before);
        let before = diagram.revision();
        assert!(diagram.remove_content("e").is_some());
        assert!(diagram.revision() > before);
        assert!(!diagram.canvas("root").unwrap().children.contains(&"e".to_string()));
    }

    #[test]
    fn test_from_json() {
        let json = r#"{
            "canvases": [{ "id": "root", "global_rotation": 450, "children": ["p", "el"] }],
            "contents": [
                { "type": "absolute_point", "id": "p", "parent": "root", "x": 1, "y": 2 },
                { "type": "element", "id": "el", "parent": "root", "pos": "p", "width": 10, "height": 5 }
            ]
        }"#;
        let diagram = Diagram::from_json(json).unwrap();
        assert_eq!(diagram.dependencies("el").unwrap(), vec!["p"]);
        assert_eq!(diagram.frame_rotation("el").unwrap(), 90.0);
        match diagram.content("p").unwrap() {
            CanvasContent::AbsolutePoint(p) => assert!(p.editable_x && p.editable_y),
            other => panic!("unexpected {}", other.kind_name()),
        }
    }
}
