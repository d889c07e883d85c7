//! Stroke lifecycle notifications.

use crate::input::InputSample;
use std::fmt;
use std::sync::mpsc::{Receiver, Sender, channel};

/// Lifecycle of a stroke, each carrying the sample that caused it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SessionEvent {
    BeginStroke(InputSample),
    BeforeUpdateStroke(InputSample),
    AfterUpdateStroke(InputSample),
    EndStroke(InputSample),
}

impl SessionEvent {
    pub fn name(&self) -> &'static str {
        match self {
            SessionEvent::BeginStroke(_) => "beginStroke",
            SessionEvent::BeforeUpdateStroke(_) => "beforeUpdateStroke",
            SessionEvent::AfterUpdateStroke(_) => "afterUpdateStroke",
            SessionEvent::EndStroke(_) => "endStroke",
        }
    }
}

type Listener = Box<dyn FnMut(&SessionEvent)>;

/// Delivers session events to callbacks and channel subscribers.
#[derive(Default)]
pub struct EventListeners {
    listeners: Vec<Listener>,
    subscribers: Vec<Sender<SessionEvent>>,
}

impl fmt::Debug for EventListeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventListeners")
            .field("listeners", &format!("<{} listeners>", self.listeners.len()))
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl EventListeners {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback invoked synchronously for every event.
    pub fn add_listener(&mut self, listener: impl FnMut(&SessionEvent) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Open a channel that receives every event from now on.
    pub fn subscribe(&mut self) -> Receiver<SessionEvent> {
        let (tx, rx) = channel();
        self.subscribers.push(tx);
        rx
    }

    pub fn emit(&mut self, event: SessionEvent) {
        log::trace!("session event {}", event.name());
        for listener in &mut self.listeners {
            listener(&event);
        }
        // Receivers that were dropped unsubscribe themselves.
        self.subscribers.retain(|tx| tx.send(event).is_ok());
    }
}
