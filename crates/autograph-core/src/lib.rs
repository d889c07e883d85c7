//! Autograph Core Library
//!
//! Platform-agnostic stroke capture for the Autograph signature pad: sample
//! points, Bezier fitting, velocity-based smoothing, pointer input
//! normalization and the stroke document.

pub mod curve;
pub mod document;
pub mod events;
pub mod input;
pub mod options;
pub mod point;
pub mod replay;
pub mod smoothing;
pub mod style;
pub mod throttle;

pub use curve::{CurveSegment, SegmentWidths};
pub use document::{Document, DocumentError, Stroke, StrokeRecord};
pub use events::{EventListeners, SessionEvent};
pub use input::{
    AdapterOutput, InputEvent, InputModality, InputSample, MouseButton, MouseInput, Phase,
    PlatformCapabilities, PointerAdapter, PointerInput, StrokeCommand, Touch, TouchInput,
};
pub use options::PadOptions;
pub use point::{Point, PointError};
pub use replay::{StrokeSink, replay};
pub use smoothing::Smoother;
pub use style::{ColorError, CompositeOperation, CssColor, StyleOverride, StyleSnapshot};
pub use throttle::Throttle;
