//! Trellis Core Library
//!
//! Move, snap and point-visibility engine for Trellis diagrams: decides which
//! contents a drag moves, snaps the drag to nearby geometry, and emits edit
//! descriptors for the document layer to apply.

pub mod config;
pub mod dependency;
pub mod edit;
pub mod error;
pub mod handlers;
pub mod input;
pub mod layout;
pub mod math;
pub mod model;
pub mod selection;
pub mod selector;
pub mod session;
pub mod snap;
pub mod visibility;

pub use config::EditorConfig;
pub use dependency::{AxisDependencyGraph, AxisNode, Movement};
pub use edit::{Edit, EditKind, Transaction};
pub use error::{EditError, EditResult};
pub use handlers::{Corner, MoveHandler};
pub use input::{Modifiers, MouseButton, PointerEvent};
pub use layout::{LayoutEngine, SnapshotLayout, TransformedLine, ROOT_CONTEXT};
pub use math::Axis;
pub use model::{CanvasContent, ContentId, Diagram, DiagramSnapshot};
pub use selection::Selection;
pub use selector::{MoveAxes, MovedElementsSelector};
pub use session::{Editor, GestureTarget};
pub use snap::{SnapEngine, SnapLine, SnapLines, SnapOptions};
pub use visibility::{PointVisibilityManager, VisibilityCache};
