//! Per-axis dependency graph used to decide what a move has to touch.

use crate::error::EditResult;
use crate::math::{Axis, AxisTransfer};
use crate::model::{CanvasContent, ContentId, Diagram};
use std::collections::HashMap;

/// One axis of one content, in the content's own canvas frame.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AxisNode {
    pub id: ContentId,
    pub axis: Axis,
}

impl AxisNode {
    pub fn new(id: impl Into<ContentId>, axis: Axis) -> Self {
        Self { id: id.into(), axis }
    }
}

/// How a node reacts when asked to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Movement {
    /// The coordinate is owned and editable here.
    Direct,
    /// The move is carried by the node's position dependencies.
    Forward,
    /// The coordinate cannot be changed.
    Blocked,
}

/// Dependency edges split per axis, with rotation transfer applied at every hop.
#[derive(Debug, Clone, Default)]
pub struct AxisDependencyGraph {
    rotations: HashMap<ContentId, f64>,
    movement: HashMap<AxisNode, Movement>,
    depends_on: HashMap<AxisNode, Vec<AxisNode>>,
    depended_on: HashMap<AxisNode, Vec<AxisNode>>,
    /// Structural dependents per id, without axis information.
    dependents: HashMap<ContentId, Vec<ContentId>>,
}

fn movement_of(content: &CanvasContent, axis: Axis) -> Movement {
    let editable = |x: bool, y: bool| match axis {
        Axis::X => x,
        Axis::Y => y,
    };
    match content {
        CanvasContent::AbsolutePoint(p) if editable(p.editable_x, p.editable_y) => Movement::Direct,
        CanvasContent::AbsolutePoint(_) => Movement::Blocked,
        CanvasContent::RelativePoint(p) if editable(p.editable_x, p.editable_y) => Movement::Direct,
        CanvasContent::RelativePoint(_) => Movement::Forward,
        CanvasContent::Element(e) if e.pos.is_none() => Movement::Blocked,
        CanvasContent::LinePoint(_)
        | CanvasContent::Element(_)
        | CanvasContent::Connection(_)
        | CanvasContent::Marker(_) => Movement::Forward,
    }
}

impl AxisDependencyGraph {
    /// Build the graph over every content of a validated diagram.
    pub fn build(diagram: &Diagram) -> EditResult<Self> {
        let mut graph = Self::default();
        for content in diagram.contents() {
            graph
                .rotations
                .insert(content.id().clone(), diagram.frame_rotation(content.id())?);
        }

        for content in diagram.contents() {
            let id = content.id();
            let rotation = graph.rotation(id);
            for axis in Axis::BOTH {
                graph.movement.insert(AxisNode::new(id.clone(), axis), movement_of(content, axis));
            }

            for dep in diagram.dependencies(id)? {
                graph.dependents.entry(dep).or_default().push(id.clone());
            }

            for dep in diagram.position_dependencies(id)? {
                let transfer = AxisTransfer::from_delta(rotation - graph.rotation(&dep));
                for axis in Axis::BOTH {
                    let from = AxisNode::new(id.clone(), axis);
                    for target in transfer.targets(axis) {
                        let to = AxisNode::new(dep.clone(), *target);
                        graph.depended_on.entry(to.clone()).or_default().push(from.clone());
                        graph.depends_on.entry(from.clone()).or_default().push(to);
                    }
                }
            }
        }
        Ok(graph)
    }

    /// Rotation of the canvas `id` sits on; zero for unknown ids.
    pub fn rotation(&self, id: &str) -> f64 {
        self.rotations.get(id).copied().unwrap_or(0.0)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.rotations.contains_key(id)
    }

    pub fn movement(&self, node: &AxisNode) -> Movement {
        self.movement.get(node).copied().unwrap_or(Movement::Blocked)
    }

    pub fn depends_on(&self, node: &AxisNode) -> &[AxisNode] {
        self.depends_on.get(node).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn depended_on(&self, node: &AxisNode) -> &[AxisNode] {
        self.depended_on.get(node).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Ids whose layout reads `id` directly.
    pub fn dependents(&self, id: &str) -> &[ContentId] {
        self.dependents.get(id).map(Vec::as_slice).unwrap_or(&[])
    }
}
