//! Edit descriptors emitted to the document layer.

use crate::model::ContentId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind-specific payload of an edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EditKind {
    /// Offsets are in the root frame. Each of `x_elements` shifts its own local x by
    /// the part of the offset along that axis; `y_elements` likewise for local y.
    TranslationMove {
        x_elements: Vec<ContentId>,
        y_elements: Vec<ContentId>,
        offset_x: f64,
        offset_y: f64,
        delta_offset_x: f64,
        delta_offset_y: f64,
    },
    Resize {
        factor_x: f64,
        factor_y: f64,
        delta_factor_x: f64,
        delta_factor_y: f64,
    },
    Rotation {
        rotation_degrees: f64,
        delta_degrees: f64,
    },
    LineMove {
        pos: f64,
        segment: Option<usize>,
    },
    AxisSegmentMove {
        segment: usize,
        segment_pos: f64,
    },
}

/// One emitted edit of a gesture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edit {
    pub transaction_id: String,
    pub sequence_number: u64,
    pub committed: bool,
    /// Target ids of the gesture.
    pub elements: Vec<ContentId>,
    #[serde(flatten)]
    pub kind: EditKind,
}

/// Groups the edits of one gesture.
#[derive(Debug, Clone)]
pub struct Transaction {
    id: String,
    next_sequence: u64,
}

impl Transaction {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            next_sequence: 0,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Wrap a payload into the next edit of this transaction.
    pub fn edit(&mut self, elements: Vec<ContentId>, kind: EditKind, committed: bool) -> Edit {
        let sequence_number = self.next_sequence;
        self.next_sequence += 1;
        Edit {
            transaction_id: self.id.clone(),
            sequence_number,
            committed,
            elements,
            kind,
        }
    }
}

impl Default for Transaction {
    fn default() -> Self {
        Self::new()
    }
}
