//! Pointer input normalization for mouse, touch and pointer events.
//!
//! Exactly one input modality is active per pad, picked from what the
//! platform supports. The adapter turns that modality's raw events into
//! begin / move / end commands carrying a single position and pressure.

use serde::{Deserialize, Serialize};

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Phase of a raw input event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Down,
    Move,
    Up,
}

/// What the host platform can deliver.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformCapabilities {
    pub pointer_events: bool,
    pub touch_events: bool,
    /// Touch devices whose pointer events are unreliable (iPadOS desktop mode).
    pub touch_intercepting: bool,
}

/// The event family an adapter listens to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputModality {
    Pointer,
    Mouse { touch: bool },
}

impl InputModality {
    /// Prefer pointer events; fall back to mouse plus touch when available.
    pub fn select(caps: PlatformCapabilities) -> Self {
        if caps.pointer_events && !caps.touch_intercepting {
            InputModality::Pointer
        } else {
            InputModality::Mouse { touch: caps.touch_events }
        }
    }
}

/// A client-space position and pressure, stamped with the event time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InputSample {
    pub x: f64,
    pub y: f64,
    pub pressure: f64,
    pub time: u64,
}

impl InputSample {
    pub fn new(x: f64, y: f64, pressure: f64, time: u64) -> Self {
        Self { x, y, pressure, time }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MouseInput {
    pub phase: Phase,
    pub button: MouseButton,
    pub x: f64,
    pub y: f64,
    pub time: u64,
}

/// One finger of a touch event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Touch {
    pub x: f64,
    pub y: f64,
    /// Reported force, zero when unsupported.
    pub force: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TouchInput {
    pub phase: Phase,
    /// Fingers currently on the drawing surface.
    pub target_touches: Vec<Touch>,
    /// Fingers that changed in this event.
    pub changed_touches: Vec<Touch>,
    /// Whether the event targets the drawing surface itself.
    pub on_surface: bool,
    pub cancelable: bool,
    pub time: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointerInput {
    pub phase: Phase,
    pub x: f64,
    pub y: f64,
    pub pressure: f64,
    pub time: u64,
}

/// Raw input as delivered by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InputEvent {
    Mouse(MouseInput),
    Touch(TouchInput),
    Pointer(PointerInput),
}

/// Normalized stroke command.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum StrokeCommand {
    Begin(InputSample),
    Move(InputSample),
    End(InputSample),
}

impl StrokeCommand {
    pub fn sample(&self) -> InputSample {
        match self {
            StrokeCommand::Begin(s) | StrokeCommand::Move(s) | StrokeCommand::End(s) => *s,
        }
    }
}

/// Result of feeding one raw event to the adapter.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AdapterOutput {
    pub command: Option<StrokeCommand>,
    /// The host should suppress default gesture handling (scroll, zoom).
    pub prevent_default: bool,
}

impl AdapterOutput {
    fn ignored() -> Self {
        Self::default()
    }

    fn command(command: StrokeCommand, prevent_default: bool) -> Self {
        Self {
            command: Some(command),
            prevent_default,
        }
    }
}

/// Tracks the drawing flag and turns raw events into stroke commands.
#[derive(Debug, Clone)]
pub struct PointerAdapter {
    modality: InputModality,
    enabled: bool,
    /// Set on begin, cleared on end. Moves outside a stroke are dropped.
    drawing: bool,
}

impl PointerAdapter {
    pub fn new(modality: InputModality) -> Self {
        Self {
            modality,
            enabled: true,
            drawing: false,
        }
    }

    pub fn for_platform(caps: PlatformCapabilities) -> Self {
        Self::new(InputModality::select(caps))
    }

    pub fn modality(&self) -> InputModality {
        self.modality
    }

    pub fn is_drawing(&self) -> bool {
        self.drawing
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Start listening.
    pub fn enable(&mut self) {
        if !self.enabled {
            self.enabled = true;
            self.drawing = false;
        }
    }

    /// Stop listening; an in-progress gesture is abandoned.
    pub fn disable(&mut self) {
        self.enabled = false;
        self.drawing = false;
    }

    /// Process one raw event.
    pub fn handle(&mut self, event: &InputEvent) -> AdapterOutput {
        if !self.enabled {
            return AdapterOutput::ignored();
        }
        match (event, self.modality) {
            (InputEvent::Pointer(pointer), InputModality::Pointer) => self.handle_pointer(pointer),
            (InputEvent::Mouse(mouse), InputModality::Mouse { .. }) => self.handle_mouse(mouse),
            (InputEvent::Touch(touch), InputModality::Mouse { touch: true }) => self.handle_touch(touch),
            _ => AdapterOutput::ignored(),
        }
    }

    fn handle_pointer(&mut self, event: &PointerInput) -> AdapterOutput {
        let sample = InputSample::new(event.x, event.y, event.pressure, event.time);
        match event.phase {
            Phase::Down => {
                self.drawing = true;
                AdapterOutput::command(StrokeCommand::Begin(sample), true)
            }
            Phase::Move if self.drawing => AdapterOutput::command(StrokeCommand::Move(sample), true),
            Phase::Up if self.drawing => {
                self.drawing = false;
                AdapterOutput::command(StrokeCommand::End(sample), true)
            }
            _ => AdapterOutput::ignored(),
        }
    }

    fn handle_mouse(&mut self, event: &MouseInput) -> AdapterOutput {
        let sample = InputSample::new(event.x, event.y, 0.0, event.time);
        let primary = event.button == MouseButton::Left;
        match event.phase {
            Phase::Down if primary => {
                self.drawing = true;
                AdapterOutput::command(StrokeCommand::Begin(sample), false)
            }
            Phase::Move if self.drawing => AdapterOutput::command(StrokeCommand::Move(sample), false),
            Phase::Up if primary && self.drawing => {
                self.drawing = false;
                AdapterOutput::command(StrokeCommand::End(sample), false)
            }
            _ => AdapterOutput::ignored(),
        }
    }

    fn handle_touch(&mut self, event: &TouchInput) -> AdapterOutput {
        let sample_of = |touch: &Touch| InputSample::new(touch.x, touch.y, touch.force, event.time);
        match event.phase {
            Phase::Down => {
                // Multi-finger gestures are left alone entirely.
                if event.target_touches.len() != 1 {
                    return AdapterOutput {
                        command: None,
                        prevent_default: event.cancelable,
                    };
                }
                match event.changed_touches.first() {
                    Some(touch) => {
                        self.drawing = true;
                        AdapterOutput::command(StrokeCommand::Begin(sample_of(touch)), event.cancelable)
                    }
                    None => AdapterOutput::ignored(),
                }
            }
            Phase::Move => match event.target_touches.first() {
                Some(touch) if self.drawing => {
                    AdapterOutput::command(StrokeCommand::Move(sample_of(touch)), event.cancelable)
                }
                _ => AdapterOutput {
                    command: None,
                    prevent_default: event.cancelable,
                },
            },
            Phase::Up => {
                if !event.on_surface {
                    return AdapterOutput::ignored();
                }
                match event.changed_touches.first() {
                    Some(touch) if self.drawing => {
                        self.drawing = false;
                        AdapterOutput::command(StrokeCommand::End(sample_of(touch)), event.cancelable)
                    }
                    _ => AdapterOutput {
                        command: None,
                        prevent_default: event.cancelable,
                    },
                }
            }
        }
    }
}
