use crate::core::{ClosedWindow, ClosedWindowsCache, ManagerState, Pid, WindowId};
use crate::platform::{LockScreenState, WindowSource};

#[derive(Debug, Default, PartialEq)]
pub struct GcReport {
    pub apps_removed: Vec<Pid>,
    pub windows_removed: Vec<WindowId>,
    pub workspaces_removed: Vec<String>,
}

impl GcReport {
    pub fn is_empty(&self) -> bool {
        self.apps_removed.is_empty()
            && self.windows_removed.is_empty()
            && self.workspaces_removed.is_empty()
    }
}

/// Runs the three passes in order: terminated apps, unobservable windows,
/// unused workspaces.
pub fn collect_garbage(
    state: &mut ManagerState,
    source: &dyn WindowSource,
    closed: &mut ClosedWindowsCache,
) -> GcReport {
    let mut report = GcReport::default();
    remove_terminated_apps(state, source, &mut report);
    remove_unobservable_windows(state, source, closed, &mut report);
    remove_unused_workspaces(state, &mut report);
    report
}

fn remove_terminated_apps(state: &mut ManagerState, source: &dyn WindowSource, report: &mut GcReport) {
    let terminated: Vec<Pid> = state
        .apps
        .values()
        .filter(|app| !app.is_alive(source))
        .map(|app| app.pid)
        .collect();

    for pid in terminated {
        if let Some(app) = state.remove_app(pid) {
            tracing::info!(
                "GC: app {} (pid {}) terminated, dropping {} windows",
                app.name,
                pid,
                app.windows.len()
            );
            report.apps_removed.push(pid);
            report.windows_removed.extend(app.windows.keys().copied());
        }
    }
}

fn remove_unobservable_windows(
    state: &mut ManagerState,
    source: &dyn WindowSource,
    closed: &mut ClosedWindowsCache,
    report: &mut GcReport,
) {
    match source.lock_screen_state() {
        LockScreenState::Unlocked => {}
        other => {
            tracing::debug!("GC: skipping window pass, lock screen state {:?}", other);
            return;
        }
    }

    let tracked: Vec<(WindowId, Pid)> = state.windows().map(|w| (w.id, w.pid)).collect();
    if tracked.is_empty() {
        return;
    }

    let unresolved: Vec<WindowId> = tracked
        .iter()
        .filter(|(id, pid)| !source.window_exists(*id, *pid))
        .map(|(id, _)| *id)
        .collect();
    if unresolved.is_empty() {
        return;
    }
    if unresolved.len() == tracked.len() {
        tracing::warn!(
            "GC: all {} tracked windows are unresolvable, assuming a transient failure",
            tracked.len()
        );
        return;
    }

    for window_id in unresolved {
        if let Some((window, index)) = state.detach_window(window_id) {
            tracing::info!(
                "GC: window {} ({}) no longer resolves",
                window.id,
                window.title
            );
            closed.record(
                window.id,
                ClosedWindow {
                    workspace: window.workspace.clone(),
                    index,
                },
            );
            report.windows_removed.push(window_id);
        }
    }
}

fn remove_unused_workspaces(state: &mut ManagerState, report: &mut GcReport) {
    let unused: Vec<String> = state
        .workspaces
        .values()
        .filter(|ws| ws.is_empty() && !state.is_displayed(&ws.name))
        .map(|ws| ws.name.clone())
        .collect();

    for name in unused {
        tracing::debug!("GC: removing unused workspace {}", name);
        state.workspaces.remove(&name);
        report.workspaces_removed.push(name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{sync_monitors, Window};
    use crate::platform::mock::{create_test_monitor, create_test_window, MockWindowSource};

    fn setup(n: u32) -> (ManagerState, MockWindowSource) {
        let windows: Vec<_> = (1..=n)
            .map(|id| create_test_window(id, 100 + id as i32, "App", 0, 0, 800, 600))
            .collect();
        let source = MockWindowSource::new()
            .with_monitors(vec![create_test_monitor(1, 0, 0, 1920, 1080)])
            .with_windows(windows.clone());

        let mut state = ManagerState::new();
        sync_monitors(&mut state, &source.monitors());
        for info in &windows {
            state.attach_window(Window::from_window_info(info, "1"), &info.app_name, None);
        }
        (state, source)
    }

    #[test]
    fn test_mass_failure_guard() {
        let (mut state, source) = setup(3);
        source.set_unresolvable(&[1, 2, 3]);
        let mut closed = ClosedWindowsCache::new();

        let report = collect_garbage(&mut state, &source, &mut closed);
        assert!(report.windows_removed.is_empty());
        assert_eq!(state.windows().count(), 3);
        assert!(closed.is_empty());
    }

    #[test]
    fn test_partial_collection() {
        let (mut state, source) = setup(4);
        source.set_unresolvable(&[2, 4]);
        let mut closed = ClosedWindowsCache::new();

        let report = collect_garbage(&mut state, &source, &mut closed);
        assert_eq!(report.windows_removed, vec![2, 4]);
        assert_eq!(state.window_ids().into_iter().collect::<Vec<_>>(), vec![1, 3]);
        assert_eq!(state.workspaces["1"].root.children, vec![1, 3]);
        assert_eq!(closed.len(), 2);
        assert_eq!(closed.take(4).unwrap().index, 2);
    }

    #[test]
    fn test_lock_screen_skips_window_pass() {
        let (mut state, source) = setup(3);
        source.set_unresolvable(&[1]);
        let mut closed = ClosedWindowsCache::new();

        source.set_lock_screen(LockScreenState::Locked);
        collect_garbage(&mut state, &source, &mut closed);
        assert_eq!(state.windows().count(), 3);

        source.set_lock_screen(LockScreenState::Unknown);
        collect_garbage(&mut state, &source, &mut closed);
        assert_eq!(state.windows().count(), 3);

        source.set_lock_screen(LockScreenState::Unlocked);
        collect_garbage(&mut state, &source, &mut closed);
        assert_eq!(state.windows().count(), 2);
    }

    #[test]
    fn test_terminated_app_removed_with_windows() {
        let (mut state, source) = setup(2);
        source.terminate_app(101);
        let mut closed = ClosedWindowsCache::new();

        let report = collect_garbage(&mut state, &source, &mut closed);
        assert_eq!(report.apps_removed, vec![101]);
        assert_eq!(report.windows_removed, vec![1]);
        assert!(state.window(1).is_none());
        assert!(state.window(2).is_some());
        assert!(!state.workspaces["1"].contains(1));
    }

    #[test]
    fn test_unused_workspaces_removed() {
        let (mut state, source) = setup(1);
        state.workspace_or_create("7");
        state.workspace_or_create("8").root.insert(1, None);
        let mut closed = ClosedWindowsCache::new();

        let report = collect_garbage(&mut state, &source, &mut closed);
        assert_eq!(report.workspaces_removed, vec!["7".to_string()]);
        assert!(state.workspaces.contains_key("1"));
        assert!(state.workspaces.contains_key("8"));
    }

    #[test]
    fn test_displayed_empty_workspace_survives() {
        let (mut state, source) = setup(0);
        let mut closed = ClosedWindowsCache::new();

        let report = collect_garbage(&mut state, &source, &mut closed);
        assert!(report.is_empty());
        assert!(state.workspaces.contains_key("1"));
    }
}
