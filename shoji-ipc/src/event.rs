use serde::{Deserialize, Serialize};

use crate::WindowInfo;

/// Event filter for subscribing to specific event types
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventFilter {
    /// Subscribe to window events (created, destroyed)
    #[serde(default)]
    pub window: bool,
    /// Subscribe to focus events (window focused, workspace focused)
    #[serde(default)]
    pub focus: bool,
    /// Subscribe to status text updates
    #[serde(default)]
    pub status: bool,
}

impl EventFilter {
    /// Create a filter that subscribes to all events
    pub fn all() -> Self {
        Self {
            window: true,
            focus: true,
            status: true,
        }
    }

    /// Check if the filter matches a given event
    pub fn matches(&self, event: &StateEvent) -> bool {
        match event {
            StateEvent::WindowCreated { .. } | StateEvent::WindowDestroyed { .. } => self.window,
            StateEvent::FocusChanged { .. } | StateEvent::WorkspaceFocused { .. } => self.focus,
            StateEvent::StatusChanged { .. } => self.status,
        }
    }

    /// Check if any filter is set
    pub fn any(&self) -> bool {
        self.window || self.focus || self.status
    }
}

/// Request to subscribe to state events
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubscribeRequest {
    /// Event filter (if not set or all false, subscribes to all events)
    #[serde(default)]
    pub filter: EventFilter,
}

impl SubscribeRequest {
    /// Get the effective filter (all if none specified)
    pub fn effective_filter(&self) -> EventFilter {
        if self.filter.any() {
            self.filter.clone()
        } else {
            EventFilter::all()
        }
    }
}

/// State change events sent to subscribers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StateEvent {
    // Window events
    WindowCreated {
        window: WindowInfo,
    },
    WindowDestroyed {
        window_id: u32,
    },

    // Focus events
    FocusChanged {
        window_id: Option<u32>,
        workspace: String,
    },
    WorkspaceFocused {
        name: String,
    },

    // Tray / bar surface
    StatusChanged {
        text: String,
    },
}
