use std::collections::{BTreeMap, BTreeSet};

use super::{Application, Monitor, MonitorId, Pid, Window, WindowId, Workspace};

mod monitors;
mod workspaces;

pub use monitors::sync_monitors;

pub const MAIN_MODE: &str = "main";
pub const DEFAULT_WORKSPACE: &str = "1";

/// Every registry the engine knows about. Ordered maps keep snapshots
/// comparable, which is what idempotence is checked against.
#[derive(Debug, Clone, PartialEq)]
pub struct ManagerState {
    pub apps: BTreeMap<Pid, Application>,
    pub workspaces: BTreeMap<String, Workspace>,
    pub monitors: BTreeMap<MonitorId, Monitor>,
    pub focused: Option<WindowId>,
    pub focused_workspace: String,
    pub active_mode: String,
    /// Focus pair last handed to focus-changed callbacks.
    pub(crate) dispatched_focus: Option<(Option<WindowId>, String)>,
    /// Focused window the OS reported on the previous reconciliation.
    pub(crate) last_native_focus: Option<WindowId>,
}

impl ManagerState {
    pub fn new() -> Self {
        Self {
            apps: BTreeMap::new(),
            workspaces: BTreeMap::new(),
            monitors: BTreeMap::new(),
            focused: None,
            focused_workspace: DEFAULT_WORKSPACE.to_string(),
            active_mode: MAIN_MODE.to_string(),
            dispatched_focus: None,
            last_native_focus: None,
        }
    }

    pub fn reset(&mut self) {
        tracing::info!("Resetting manager state");
        *self = Self::new();
    }

    pub fn window(&self, window_id: WindowId) -> Option<&Window> {
        self.apps
            .values()
            .find_map(|app| app.windows.get(&window_id))
    }

    pub fn window_mut(&mut self, window_id: WindowId) -> Option<&mut Window> {
        self.apps
            .values_mut()
            .find_map(|app| app.windows.get_mut(&window_id))
    }

    pub fn windows(&self) -> impl Iterator<Item = &Window> {
        self.apps.values().flat_map(|app| app.windows.values())
    }

    pub fn window_ids(&self) -> BTreeSet<WindowId> {
        self.windows().map(|w| w.id).collect()
    }

    pub fn focused_window(&self) -> Option<&Window> {
        self.focused.and_then(|id| self.window(id))
    }

    pub fn workspace_or_create(&mut self, name: &str) -> &mut Workspace {
        self.workspaces.entry(name.to_string()).or_insert_with(|| {
            tracing::debug!("Creating workspace {}", name);
            Workspace::new(name)
        })
    }

    /// A workspace is displayed iff it is the active workspace of the live
    /// monitor it is assigned to.
    pub fn is_displayed(&self, name: &str) -> bool {
        self.monitor_for_workspace(name)
            .is_some_and(|m| m.active_workspace == name)
    }

    pub fn monitor_for_workspace(&self, name: &str) -> Option<&Monitor> {
        self.workspaces
            .get(name)
            .and_then(|ws| ws.monitor)
            .and_then(|id| self.monitors.get(&id))
    }

    pub fn main_monitor(&self) -> Option<&Monitor> {
        self.monitors
            .values()
            .find(|m| m.is_main)
            .or_else(|| self.monitors.values().next())
    }

    pub fn monitor_at(&self, x: i32, y: i32) -> Option<&Monitor> {
        self.monitors.values().find(|m| m.frame.contains(x, y))
    }

    /// Monitors ordered by position, left to right then top to bottom.
    pub fn sorted_monitors(&self) -> Vec<&Monitor> {
        let mut monitors: Vec<_> = self.monitors.values().collect();
        monitors.sort_by_key(|m| (m.frame.x, m.frame.y));
        monitors
    }

    pub fn first_window_of(&self, workspace: &str) -> Option<WindowId> {
        self.workspaces
            .get(workspace)
            .and_then(|ws| ws.root.children.first().copied())
    }

    /// Tracks `window` under its app and places it in its workspace's root.
    pub fn attach_window(&mut self, window: Window, app_name: &str, index: Option<usize>) {
        let window_id = window.id;
        let workspace = window.workspace.clone();
        self.apps
            .entry(window.pid)
            .or_insert_with(|| {
                tracing::info!("Tracking app {} (pid {})", app_name, window.pid);
                Application::new(window.pid, app_name.to_string())
            })
            .windows
            .insert(window_id, window);
        self.workspace_or_create(&workspace)
            .root
            .insert(window_id, index);
    }

    /// Stops tracking a window. Returns it with its former index in the
    /// workspace root.
    pub fn detach_window(&mut self, window_id: WindowId) -> Option<(Window, usize)> {
        let window = self
            .apps
            .values_mut()
            .find_map(|app| app.windows.remove(&window_id))?;
        let index = self
            .workspaces
            .get_mut(&window.workspace)
            .and_then(|ws| ws.root.remove(window_id))
            .unwrap_or(0);
        if self.focused == Some(window_id) {
            self.focused = None;
        }
        Some((window, index))
    }

    pub fn remove_app(&mut self, pid: Pid) -> Option<Application> {
        let app = self.apps.remove(&pid)?;
        for window in app.windows.values() {
            if let Some(ws) = self.workspaces.get_mut(&window.workspace) {
                ws.root.remove(window.id);
            }
            if self.focused == Some(window.id) {
                self.focused = None;
            }
        }
        Some(app)
    }

    /// Repairs a focus that points at a window no longer tracked.
    pub fn normalize_focus(&mut self) {
        if let Some(id) = self.focused {
            if self.window(id).is_none() {
                tracing::debug!("Focused window {} is gone", id);
                self.focused = None;
            }
        }
        if self.focused.is_none() {
            self.focused = self.first_window_of(&self.focused_workspace);
        }
    }

    /// Drops dangling leaves from every workspace.
    pub fn normalize_containers(&mut self) {
        let tracked = self.window_ids();
        for ws in self.workspaces.values_mut() {
            if ws.normalize_containers(|id| tracked.contains(&id)) {
                tracing::debug!("Normalized containers of workspace {}", ws.name);
            }
        }
    }
}

impl Default for ManagerState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Rect;
    use crate::platform::mock::create_test_window;

    fn window(id: WindowId, pid: Pid, workspace: &str) -> Window {
        Window::from_window_info(
            &create_test_window(id, pid, "App", 0, 0, 100, 100),
            workspace,
        )
    }

    fn state_with_monitor() -> ManagerState {
        let mut state = ManagerState::new();
        state.monitors.insert(
            1,
            Monitor::new(1, Rect::new(0, 0, 1920, 1080), true, "1".to_string()),
        );
        state.workspace_or_create("1").monitor = Some(1);
        state
    }

    #[test]
    fn test_attach_and_detach_window() {
        let mut state = state_with_monitor();
        state.attach_window(window(10, 100, "1"), "Safari", None);
        state.attach_window(window(11, 100, "1"), "Safari", None);

        assert_eq!(state.apps.len(), 1);
        assert_eq!(state.workspaces["1"].root.children, vec![10, 11]);

        state.focused = Some(10);
        let (removed, index) = state.detach_window(10).unwrap();
        assert_eq!(removed.id, 10);
        assert_eq!(index, 0);
        assert_eq!(state.focused, None);
        assert_eq!(state.workspaces["1"].root.children, vec![11]);
    }

    #[test]
    fn test_remove_app_detaches_windows() {
        let mut state = state_with_monitor();
        state.attach_window(window(10, 100, "1"), "Safari", None);
        state.attach_window(window(20, 200, "2"), "Terminal", None);

        state.remove_app(100);
        assert!(state.window(10).is_none());
        assert!(state.workspaces["1"].is_empty());
        assert_eq!(state.workspaces["2"].root.children, vec![20]);
    }

    #[test]
    fn test_is_displayed_requires_live_monitor() {
        let mut state = state_with_monitor();
        state.workspace_or_create("2").monitor = Some(1);
        assert!(state.is_displayed("1"));
        assert!(!state.is_displayed("2"));

        state.monitors.clear();
        assert!(!state.is_displayed("1"));
    }

    #[test]
    fn test_normalize_focus_falls_back_to_first_window() {
        let mut state = state_with_monitor();
        state.attach_window(window(10, 100, "1"), "Safari", None);
        state.focused = Some(99);

        state.normalize_focus();
        assert_eq!(state.focused, Some(10));
    }

    #[test]
    fn test_sorted_monitors_by_position() {
        let mut state = ManagerState::new();
        state.monitors.insert(
            1,
            Monitor::new(1, Rect::new(1920, 0, 1920, 1080), true, "1".into()),
        );
        state.monitors.insert(
            2,
            Monitor::new(2, Rect::new(0, 0, 1920, 1080), false, "2".into()),
        );
        let ids: Vec<_> = state.sorted_monitors().iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut state = state_with_monitor();
        state.attach_window(window(10, 100, "1"), "Safari", None);
        state.reset();
        assert_eq!(state, ManagerState::new());
    }
}
