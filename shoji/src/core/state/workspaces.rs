use super::ManagerState;
use crate::core::{MonitorId, WindowId};

impl ManagerState {
    /// Makes `name` the active workspace of `monitor_id`. If it was shown on
    /// another monitor, that monitor takes over the workspace being replaced.
    pub fn show_workspace_on_monitor(&mut self, monitor_id: MonitorId, name: &str) {
        let Some(previous) = self
            .monitors
            .get(&monitor_id)
            .map(|m| m.active_workspace.clone())
        else {
            return;
        };
        if previous == name {
            return;
        }

        let other_monitor = self
            .monitors
            .values()
            .find(|m| m.id != monitor_id && m.active_workspace == name)
            .map(|m| m.id);
        if let Some(other) = other_monitor {
            tracing::debug!(
                "Swapping workspace {} onto monitor {}",
                previous,
                other
            );
            if let Some(m) = self.monitors.get_mut(&other) {
                m.active_workspace = previous.clone();
            }
            self.workspace_or_create(&previous).monitor = Some(other);
        }

        self.workspace_or_create(name).monitor = Some(monitor_id);
        if let Some(m) = self.monitors.get_mut(&monitor_id) {
            m.active_workspace = name.to_string();
        }
    }

    /// Switches to `name` on its own monitor, or on the monitor of the
    /// currently focused workspace when it has none.
    pub fn focus_workspace(&mut self, name: &str) -> bool {
        let target = self
            .monitor_for_workspace(name)
            .or_else(|| self.monitor_for_workspace(&self.focused_workspace))
            .or_else(|| self.main_monitor())
            .map(|m| m.id);
        let Some(monitor_id) = target else {
            tracing::warn!("No monitor to show workspace {}", name);
            return false;
        };

        tracing::info!("Focusing workspace {} on monitor {}", name, monitor_id);
        self.show_workspace_on_monitor(monitor_id, name);
        self.focused_workspace = name.to_string();

        let focus_is_here = self
            .focused_window()
            .is_some_and(|w| w.workspace == name);
        if !focus_is_here {
            self.focused = self.first_window_of(name);
        }
        true
    }

    /// Moves the focused window to `name`. Focus stays behind on the current
    /// workspace when the target is not displayed.
    pub fn move_focused_window_to_workspace(&mut self, name: &str) -> Option<WindowId> {
        let window_id = self.focused?;
        let from = self.window(window_id)?.workspace.clone();
        if from == name {
            return Some(window_id);
        }

        tracing::info!(
            "Moving window {} from workspace {} to {}",
            window_id,
            from,
            name
        );
        if let Some(ws) = self.workspaces.get_mut(&from) {
            ws.root.remove(window_id);
        }
        self.workspace_or_create(name).root.insert(window_id, None);
        if let Some(window) = self.window_mut(window_id) {
            window.workspace = name.to_string();
        }

        if !self.is_displayed(name) {
            self.focused = self.first_window_of(&from);
        }
        Some(window_id)
    }
}
