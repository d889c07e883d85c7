//! The signature document: an ordered list of strokes.

use crate::point::Point;
use crate::style::{CssColor, StyleOverride, StyleSnapshot};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when reading the interchange format.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Invalid stroke data: {0}")]
    Json(#[from] serde_json::Error),
}

/// One pen-down to pen-up gesture.
#[derive(Debug, Clone, PartialEq)]
pub struct Stroke {
    pub style: StyleSnapshot,
    pub points: Vec<Point>,
}

impl Stroke {
    /// Start an empty stroke with a captured style.
    pub fn new(style: StyleSnapshot) -> Self {
        Self { style, points: Vec::new() }
    }

    pub fn is_dot(&self) -> bool {
        self.points.len() == 1
    }

    pub fn last_point(&self) -> Option<&Point> {
        self.points.last()
    }
}

/// Interchange form of a stroke ("point group").
///
/// Style fields are optional when reading and always written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrokeRecord {
    #[serde(flatten)]
    pub style: StyleOverride,
    pub points: Vec<Point>,
}

impl StrokeRecord {
    pub fn into_stroke(self, defaults: &StyleSnapshot) -> Stroke {
        Stroke {
            style: self.style.resolve(defaults),
            points: self.points,
        }
    }
}

impl From<&Stroke> for StrokeRecord {
    fn from(stroke: &Stroke) -> Self {
        Self {
            style: StyleOverride::from(&stroke.style),
            points: stroke.points.clone(),
        }
    }
}

/// Strokes in creation order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    strokes: Vec<Stroke>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a document from interchange records.
    pub fn from_records(records: Vec<StrokeRecord>, defaults: &StyleSnapshot) -> Self {
        Self {
            strokes: records.into_iter().map(|r| r.into_stroke(defaults)).collect(),
        }
    }

    pub fn to_records(&self) -> Vec<StrokeRecord> {
        self.strokes.iter().map(StrokeRecord::from).collect()
    }

    /// Serialize to the JSON interchange format.
    pub fn to_json(&self) -> Result<String, DocumentError> {
        Ok(serde_json::to_string(&self.to_records())?)
    }

    /// Parse the JSON interchange format, filling missing style fields.
    pub fn from_json(json: &str, defaults: &StyleSnapshot) -> Result<Self, DocumentError> {
        let records: Vec<StrokeRecord> = serde_json::from_str(json)?;
        Ok(Self::from_records(records, defaults))
    }

    pub fn strokes(&self) -> &[Stroke] {
        &self.strokes
    }

    pub fn last_mut(&mut self) -> Option<&mut Stroke> {
        self.strokes.last_mut()
    }

    pub fn push(&mut self, stroke: Stroke) {
        self.strokes.push(stroke);
    }

    /// Drop the most recent stroke.
    pub fn pop(&mut self) -> Option<Stroke> {
        self.strokes.pop()
    }

    /// Append strokes after the existing ones.
    pub fn append(&mut self, strokes: impl IntoIterator<Item = Stroke>) {
        self.strokes.extend(strokes);
    }

    pub fn clear(&mut self) {
        self.strokes.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.strokes.len()
    }

    /// Rewrite the stored colors of every stroke.
    pub fn recolor(&mut self, pen: &CssColor, background: &CssColor) {
        for stroke in &mut self.strokes {
            stroke.style.pen_color = pen.clone();
            stroke.style.background_color = background.clone();
        }
    }

    /// A copy with every stroke drawn in `pen`, or an unchanged copy.
    pub fn with_pen_color(&self, pen: Option<&CssColor>) -> Self {
        let mut copy = self.clone();
        if let Some(pen) = pen {
            for stroke in &mut copy.strokes {
                stroke.style.pen_color = pen.clone();
            }
        }
        copy
    }
}
