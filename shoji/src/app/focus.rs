use crate::core::{ManagerState, WindowId};
use crate::event_emitter::EventEmitter;
use crate::platform::WindowManipulator;

/// The model's focused window at one point of a reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FocusSnapshot {
    window: Option<WindowId>,
}

impl FocusSnapshot {
    pub fn capture(state: &ManagerState) -> Self {
        Self {
            window: state.focused,
        }
    }

    pub fn window(&self) -> Option<WindowId> {
        self.window
    }
}

/// Compares model focus before and after a unit of work.
pub struct FocusTracker {
    before: FocusSnapshot,
}

impl FocusTracker {
    pub fn begin(state: &ManagerState) -> Self {
        Self {
            before: FocusSnapshot::capture(state),
        }
    }

    /// The window the OS should be told to focus, if focus moved.
    pub fn finish(self, state: &ManagerState) -> Option<WindowId> {
        let after = FocusSnapshot::capture(state);
        if after == self.before {
            return None;
        }
        tracing::debug!(
            "Focus moved from {:?} to {:?}",
            self.before.window(),
            after.window()
        );
        after.window()
    }
}

/// Pushes model focus to the OS. The OS never writes back here.
pub fn resync_os_focus(state: &ManagerState, window_id: WindowId, manipulator: &dyn WindowManipulator) {
    if let Some(window) = state.window(window_id) {
        tracing::info!("Focusing window {} (pid {})", window.id, window.pid);
        manipulator.focus_window(window.id, window.pid);
    }
}

/// Adopts the OS-reported focus when it changed since the previous call and
/// names a tracked window. An unchanged report never overrides the model. At
/// startup an empty focus falls back to the first window of the focused
/// workspace.
pub fn update_focus_cache(state: &mut ManagerState, native: Option<WindowId>, startup: bool) {
    let changed = state.last_native_focus != native;
    state.last_native_focus = native;

    let tracked = native
        .filter(|_| changed)
        .and_then(|id| state.window(id).map(|w| (w.id, w.workspace.clone())));

    match tracked {
        Some((window_id, workspace)) => {
            if state.focused != Some(window_id) {
                tracing::debug!("Focus cache: window {} ({})", window_id, workspace);
                state.focused = Some(window_id);
            }
            if state.focused_workspace != workspace || !state.is_displayed(&workspace) {
                state.focus_workspace(&workspace);
                state.focused = Some(window_id);
            }
        }
        None if startup && state.focused.is_none() => {
            state.focused = state.first_window_of(&state.focused_workspace);
        }
        None => {}
    }
}

/// Emits focus-changed events for whatever changed since the last dispatch.
pub fn dispatch_focus_callbacks(state: &mut ManagerState, emitter: &EventEmitter) {
    let current = (state.focused, state.focused_workspace.clone());
    if state.dispatched_focus.as_ref() == Some(&current) {
        return;
    }

    let workspace_changed = state
        .dispatched_focus
        .as_ref()
        .map_or(true, |(_, ws)| *ws != current.1);

    emitter.emit_focus_changed(current.0, &current.1);
    if workspace_changed {
        emitter.emit_workspace_focused(&current.1);
    }
    state.dispatched_focus = Some(current);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{sync_monitors, Window};
    use crate::platform::mock::{create_test_monitor, create_test_window};
    use shoji_ipc::StateEvent;
    use std::sync::mpsc;

    fn setup() -> ManagerState {
        let mut state = ManagerState::new();
        sync_monitors(
            &mut state,
            &[
                create_test_monitor(1, 0, 0, 1920, 1080),
                create_test_monitor(2, 1920, 0, 1920, 1080),
            ],
        );
        for (id, ws) in [(10, "1"), (11, "1"), (20, "2"), (30, "3")] {
            let info = create_test_window(id, id as i32, "App", 0, 0, 100, 100);
            state.attach_window(Window::from_window_info(&info, ws), "App", None);
        }
        state
    }

    #[test]
    fn test_tracker_reports_only_divergence() {
        let mut state = setup();
        state.focused = Some(10);

        let tracker = FocusTracker::begin(&state);
        assert_eq!(tracker.finish(&state), None);

        let tracker = FocusTracker::begin(&state);
        state.focused = Some(11);
        assert_eq!(tracker.finish(&state), Some(11));
    }

    #[test]
    fn test_native_focus_moves_focused_workspace() {
        let mut state = setup();
        update_focus_cache(&mut state, Some(20), false);
        assert_eq!(state.focused, Some(20));
        assert_eq!(state.focused_workspace, "2");
    }

    #[test]
    fn test_native_focus_on_parked_workspace_shows_it() {
        let mut state = setup();
        update_focus_cache(&mut state, Some(30), false);
        assert_eq!(state.focused, Some(30));
        assert_eq!(state.focused_workspace, "3");
        assert!(state.is_displayed("3"));
    }

    #[test]
    fn test_untracked_native_focus_is_ignored() {
        let mut state = setup();
        state.focused = Some(11);
        update_focus_cache(&mut state, Some(999), false);
        update_focus_cache(&mut state, None, false);
        assert_eq!(state.focused, Some(11));
    }

    #[test]
    fn test_unchanged_native_focus_does_not_override_model() {
        let mut state = setup();
        update_focus_cache(&mut state, Some(10), false);
        assert_eq!(state.focused, Some(10));

        state.focus_workspace("3");
        assert_eq!(state.focused, Some(30));

        update_focus_cache(&mut state, Some(10), false);
        assert_eq!(state.focused, Some(30));
        assert_eq!(state.focused_workspace, "3");

        update_focus_cache(&mut state, Some(11), false);
        assert_eq!(state.focused, Some(11));
        assert_eq!(state.focused_workspace, "1");
    }

    #[test]
    fn test_startup_falls_back_to_first_window() {
        let mut state = setup();
        update_focus_cache(&mut state, None, true);
        assert_eq!(state.focused, Some(10));
    }

    #[test]
    fn test_dispatch_focus_callbacks_only_on_change() {
        let mut state = setup();
        let (tx, rx) = mpsc::channel();
        let emitter = EventEmitter::new(tx);
        state.focused = Some(10);

        dispatch_focus_callbacks(&mut state, &emitter);
        let events: Vec<_> = rx.try_iter().collect();
        assert_eq!(
            events,
            vec![
                StateEvent::FocusChanged {
                    window_id: Some(10),
                    workspace: "1".to_string(),
                },
                StateEvent::WorkspaceFocused {
                    name: "1".to_string(),
                },
            ]
        );

        dispatch_focus_callbacks(&mut state, &emitter);
        assert_eq!(rx.try_iter().count(), 0);

        state.focused = Some(11);
        dispatch_focus_callbacks(&mut state, &emitter);
        let events: Vec<_> = rx.try_iter().collect();
        assert_eq!(events.len(), 1);
    }
}
