use crate::core::{ManagerState, Window, WindowId};
use shoji_ipc::{StateEvent, WindowInfo, WorkspaceInfo};
use std::sync::mpsc as std_mpsc;

/// Event emitter for sending state change events from the coordinating thread
/// to the tokio thread. Uses std::sync::mpsc for thread-safe communication.
#[derive(Clone)]
pub struct EventEmitter {
    tx: std_mpsc::Sender<StateEvent>,
}

impl EventEmitter {
    pub fn new(tx: std_mpsc::Sender<StateEvent>) -> Self {
        Self { tx }
    }

    fn emit(&self, event: StateEvent) {
        if let Err(e) = self.tx.send(event) {
            tracing::debug!("Failed to emit event (no receivers?): {}", e);
        }
    }

    pub fn emit_window_created(&self, state: &ManagerState, window: &Window) {
        self.emit(StateEvent::WindowCreated {
            window: window_to_info(state, window),
        });
    }

    pub fn emit_window_destroyed(&self, window_id: WindowId) {
        self.emit(StateEvent::WindowDestroyed { window_id });
    }

    pub fn emit_focus_changed(&self, window_id: Option<WindowId>, workspace: &str) {
        self.emit(StateEvent::FocusChanged {
            window_id,
            workspace: workspace.to_string(),
        });
    }

    pub fn emit_workspace_focused(&self, name: &str) {
        self.emit(StateEvent::WorkspaceFocused {
            name: name.to_string(),
        });
    }

    pub fn emit_status_changed(&self, text: &str) {
        self.emit(StateEvent::StatusChanged {
            text: text.to_string(),
        });
    }
}

pub fn window_to_info(state: &ManagerState, window: &Window) -> WindowInfo {
    WindowInfo {
        id: window.id,
        pid: window.pid,
        title: window.title.clone(),
        app_name: state
            .apps
            .get(&window.pid)
            .map(|app| app.name.clone())
            .unwrap_or_default(),
        workspace: window.workspace.clone(),
        x: window.frame.x,
        y: window.frame.y,
        width: window.frame.width,
        height: window.frame.height,
        is_focused: state.focused == Some(window.id),
        is_hidden: window.is_hidden(),
    }
}

pub fn workspace_infos(state: &ManagerState) -> Vec<WorkspaceInfo> {
    state
        .workspaces
        .values()
        .map(|ws| WorkspaceInfo {
            name: ws.name.clone(),
            monitor_id: ws.monitor,
            layout: ws.root.layout,
            window_ids: ws.root.children.clone(),
            is_displayed: state.is_displayed(&ws.name),
            is_focused: state.focused_workspace == ws.name,
        })
        .collect()
}
