use crate::core::{MonitorId, Pid, Rect, WindowId, WindowMove};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeState {
    Minimized,
    Fullscreen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockScreenState {
    Locked,
    Unlocked,
    Unknown,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppInfo {
    pub pid: Pid,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WindowInfo {
    pub window_id: WindowId,
    pub pid: Pid,
    pub title: String,
    pub app_name: String,
    pub frame: Rect,
    pub is_on_screen: bool,
    pub native_state: Option<NativeState>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonitorInfo {
    pub id: MonitorId,
    pub frame: Rect,
    pub is_main: bool,
}

/// Read-only queries against the OS. Shared with the detection thread, so
/// implementations must be thread-safe.
pub trait WindowSource: Send + Sync {
    fn running_apps(&self) -> Vec<AppInfo>;
    fn app_windows(&self, pid: Pid) -> Vec<WindowInfo>;
    fn window_exists(&self, window_id: WindowId, pid: Pid) -> bool;
    fn is_process_terminated(&self, pid: Pid) -> bool;
    fn lock_screen_state(&self) -> LockScreenState;
    fn focused_window(&self) -> Option<WindowId>;
    fn monitors(&self) -> Vec<MonitorInfo>;
}

/// Trait for manipulating windows (side effects).
/// This abstraction allows mocking in tests.
pub trait WindowManipulator: Send + Sync {
    fn focus_window(&self, window_id: WindowId, pid: Pid);
    fn move_window(&self, window_id: WindowId, pid: Pid, x: i32, y: i32);
    fn set_window_frame(&self, window_id: WindowId, pid: Pid, frame: Rect);

    fn apply_window_moves(&self, moves: &[WindowMove]) {
        for m in moves {
            self.move_window(m.window_id, m.pid, m.new_x, m.new_y);
        }
    }
}

#[cfg(target_os = "macos")]
pub use self::macos_impl::{MacOSWindowManipulator, MacOSWindowSource};

#[cfg(target_os = "macos")]
mod macos_impl {
    use super::*;
    use crate::macos::{self, AXUIElement};
    use core_graphics::geometry::{CGPoint, CGSize};

    pub struct MacOSWindowSource;

    impl WindowSource for MacOSWindowSource {
        fn running_apps(&self) -> Vec<AppInfo> {
            objc2::rc::autoreleasepool(|_| macos::running_applications())
        }

        fn app_windows(&self, pid: Pid) -> Vec<WindowInfo> {
            let on_screen = macos::on_screen_window_ids();
            let app_name = objc2::rc::autoreleasepool(|_| macos::application_name(pid))
                .unwrap_or_default();

            let ax_windows = match AXUIElement::application(pid).windows() {
                Ok(w) => w,
                Err(e) => {
                    tracing::debug!("Failed to get windows for pid {}: {}", pid, e);
                    return Vec::new();
                }
            };

            ax_windows
                .iter()
                .filter_map(|ax| {
                    let window_id = ax.window_id()?;
                    let frame = ax.frame().ok()?;
                    let native_state = if ax.is_minimized().unwrap_or(false) {
                        Some(NativeState::Minimized)
                    } else if ax.is_fullscreen().unwrap_or(false) {
                        Some(NativeState::Fullscreen)
                    } else {
                        None
                    };
                    Some(WindowInfo {
                        window_id,
                        pid,
                        title: ax.title().unwrap_or_default(),
                        app_name: app_name.clone(),
                        frame,
                        is_on_screen: on_screen.contains(&window_id),
                        native_state,
                    })
                })
                .collect()
        }

        fn window_exists(&self, window_id: WindowId, _pid: Pid) -> bool {
            macos::window_exists(window_id)
        }

        fn is_process_terminated(&self, pid: Pid) -> bool {
            objc2::rc::autoreleasepool(|_| macos::is_application_terminated(pid))
        }

        fn lock_screen_state(&self) -> LockScreenState {
            match objc2::rc::autoreleasepool(|_| macos::frontmost_bundle_id()) {
                Some(id) if id == macos::LOGIN_WINDOW_BUNDLE_ID => LockScreenState::Locked,
                Some(_) => LockScreenState::Unlocked,
                None => LockScreenState::Unknown,
            }
        }

        fn focused_window(&self) -> Option<WindowId> {
            macos::get_focused_window().ok()?.window_id()
        }

        fn monitors(&self) -> Vec<MonitorInfo> {
            macos::get_all_monitors()
        }
    }

    pub struct MacOSWindowManipulator;

    impl WindowManipulator for MacOSWindowManipulator {
        fn focus_window(&self, window_id: WindowId, pid: Pid) {
            macos::activate_application(pid);
            let Some(ax) = macos::find_window(window_id, pid) else {
                tracing::warn!("Could not find AX window for id {} (pid {})", window_id, pid);
                return;
            };
            if let Err(e) = ax.raise() {
                tracing::warn!("Failed to raise window {}: {}", window_id, e);
            } else {
                tracing::debug!("Focused window {} (pid {})", window_id, pid);
            }
        }

        fn move_window(&self, window_id: WindowId, pid: Pid, x: i32, y: i32) {
            let Some(ax) = macos::find_window(window_id, pid) else {
                tracing::warn!("Could not find AX window for id {} (pid {})", window_id, pid);
                return;
            };
            match ax.set_position(CGPoint::new(x as f64, y as f64)) {
                Ok(()) => tracing::debug!(
                    "Moved window (id={}, pid={}) to ({}, {})",
                    window_id,
                    pid,
                    x,
                    y
                ),
                Err(e) => tracing::warn!(
                    "Failed to move window (id={}, pid={}, to=({}, {})): {}",
                    window_id,
                    pid,
                    x,
                    y,
                    e
                ),
            }
        }

        fn set_window_frame(&self, window_id: WindowId, pid: Pid, frame: Rect) {
            let Some(ax) = macos::find_window(window_id, pid) else {
                tracing::warn!("Could not find AX window for id {} (pid {})", window_id, pid);
                return;
            };
            if let Err(e) = ax.set_position(CGPoint::new(frame.x as f64, frame.y as f64)) {
                tracing::warn!("Failed to set position for window {}: {}", window_id, e);
            }
            if let Err(e) = ax.set_size(CGSize::new(frame.width as f64, frame.height as f64)) {
                tracing::warn!("Failed to set size for window {}: {}", window_id, e);
            }
            tracing::debug!(
                "Set frame of window {} (pid={}): ({}, {}) {}x{}",
                window_id,
                pid,
                frame.x,
                frame.y,
                frame.width,
                frame.height
            );
        }
    }
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::BTreeSet;
    use std::sync::Mutex;
    use std::time::Duration;

    struct MockSourceState {
        windows: Vec<WindowInfo>,
        monitors: Vec<MonitorInfo>,
        focused_window_id: Option<WindowId>,
        lock_screen: LockScreenState,
        terminated: BTreeSet<Pid>,
        unresolvable: BTreeSet<WindowId>,
        enumeration_delay: Option<Duration>,
    }

    pub struct MockWindowSource {
        state: Mutex<MockSourceState>,
    }

    impl Default for MockWindowSource {
        fn default() -> Self {
            Self {
                state: Mutex::new(MockSourceState {
                    windows: Vec::new(),
                    monitors: Vec::new(),
                    focused_window_id: None,
                    lock_screen: LockScreenState::Unlocked,
                    terminated: BTreeSet::new(),
                    unresolvable: BTreeSet::new(),
                    enumeration_delay: None,
                }),
            }
        }
    }

    impl MockWindowSource {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_windows(self, windows: Vec<WindowInfo>) -> Self {
            self.state.lock().unwrap().windows = windows;
            self
        }

        pub fn with_monitors(self, monitors: Vec<MonitorInfo>) -> Self {
            self.state.lock().unwrap().monitors = monitors;
            self
        }

        pub fn with_focused(self, window_id: Option<WindowId>) -> Self {
            self.state.lock().unwrap().focused_window_id = window_id;
            self
        }

        pub fn add_window(&self, info: WindowInfo) {
            self.state.lock().unwrap().windows.push(info);
        }

        pub fn remove_window(&self, window_id: WindowId) {
            self.state
                .lock()
                .unwrap()
                .windows
                .retain(|w| w.window_id != window_id);
        }

        pub fn update_window(&self, window_id: WindowId, f: impl FnOnce(&mut WindowInfo)) {
            let mut state = self.state.lock().unwrap();
            if let Some(w) = state.windows.iter_mut().find(|w| w.window_id == window_id) {
                f(w);
            }
        }

        pub fn set_monitors(&self, monitors: Vec<MonitorInfo>) {
            self.state.lock().unwrap().monitors = monitors;
        }

        pub fn set_focused(&self, window_id: Option<WindowId>) {
            self.state.lock().unwrap().focused_window_id = window_id;
        }

        pub fn set_lock_screen(&self, lock_screen: LockScreenState) {
            self.state.lock().unwrap().lock_screen = lock_screen;
        }

        pub fn terminate_app(&self, pid: Pid) {
            self.state.lock().unwrap().terminated.insert(pid);
        }

        /// Windows that stay listed but no longer resolve.
        pub fn set_unresolvable(&self, window_ids: &[WindowId]) {
            self.state.lock().unwrap().unresolvable = window_ids.iter().copied().collect();
        }

        pub fn set_enumeration_delay(&self, delay: Option<Duration>) {
            self.state.lock().unwrap().enumeration_delay = delay;
        }
    }

    impl WindowSource for MockWindowSource {
        fn running_apps(&self) -> Vec<AppInfo> {
            let state = self.state.lock().unwrap();
            let mut apps: Vec<AppInfo> = Vec::new();
            for w in &state.windows {
                if state.terminated.contains(&w.pid) || apps.iter().any(|a| a.pid == w.pid) {
                    continue;
                }
                apps.push(AppInfo {
                    pid: w.pid,
                    name: w.app_name.clone(),
                });
            }
            apps
        }

        fn app_windows(&self, pid: Pid) -> Vec<WindowInfo> {
            let delay = self.state.lock().unwrap().enumeration_delay;
            if let Some(delay) = delay {
                std::thread::sleep(delay);
            }
            let state = self.state.lock().unwrap();
            if state.terminated.contains(&pid) {
                return Vec::new();
            }
            state
                .windows
                .iter()
                .filter(|w| w.pid == pid)
                .cloned()
                .collect()
        }

        fn window_exists(&self, window_id: WindowId, pid: Pid) -> bool {
            let state = self.state.lock().unwrap();
            !state.terminated.contains(&pid)
                && !state.unresolvable.contains(&window_id)
                && state.windows.iter().any(|w| w.window_id == window_id)
        }

        fn is_process_terminated(&self, pid: Pid) -> bool {
            self.state.lock().unwrap().terminated.contains(&pid)
        }

        fn lock_screen_state(&self) -> LockScreenState {
            self.state.lock().unwrap().lock_screen
        }

        fn focused_window(&self) -> Option<WindowId> {
            self.state.lock().unwrap().focused_window_id
        }

        fn monitors(&self) -> Vec<MonitorInfo> {
            self.state.lock().unwrap().monitors.clone()
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum ManipulatorCall {
        Focus { window_id: WindowId },
        Move { window_id: WindowId, x: i32, y: i32 },
        SetFrame { window_id: WindowId, frame: Rect },
    }

    impl ManipulatorCall {
        pub fn window_id(&self) -> WindowId {
            match self {
                Self::Focus { window_id }
                | Self::Move { window_id, .. }
                | Self::SetFrame { window_id, .. } => *window_id,
            }
        }
    }

    #[derive(Default)]
    pub struct MockWindowManipulator {
        calls: Mutex<Vec<ManipulatorCall>>,
    }

    impl MockWindowManipulator {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn calls(&self) -> Vec<ManipulatorCall> {
            self.calls.lock().unwrap().clone()
        }

        pub fn take_calls(&self) -> Vec<ManipulatorCall> {
            std::mem::take(&mut *self.calls.lock().unwrap())
        }

        pub fn focus_calls(&self) -> Vec<WindowId> {
            self.calls()
                .iter()
                .filter_map(|c| match c {
                    ManipulatorCall::Focus { window_id } => Some(*window_id),
                    _ => None,
                })
                .collect()
        }
    }

    impl WindowManipulator for MockWindowManipulator {
        fn focus_window(&self, window_id: WindowId, _pid: Pid) {
            self.calls
                .lock()
                .unwrap()
                .push(ManipulatorCall::Focus { window_id });
        }

        fn move_window(&self, window_id: WindowId, _pid: Pid, x: i32, y: i32) {
            self.calls
                .lock()
                .unwrap()
                .push(ManipulatorCall::Move { window_id, x, y });
        }

        fn set_window_frame(&self, window_id: WindowId, _pid: Pid, frame: Rect) {
            self.calls
                .lock()
                .unwrap()
                .push(ManipulatorCall::SetFrame { window_id, frame });
        }
    }

    pub fn create_test_monitor(id: MonitorId, x: i32, y: i32, width: u32, height: u32) -> MonitorInfo {
        MonitorInfo {
            id,
            frame: Rect::new(x, y, width, height),
            is_main: id == 1,
        }
    }

    pub fn create_test_window(
        window_id: WindowId,
        pid: Pid,
        app_name: &str,
        x: i32,
        y: i32,
        width: u32,
        height: u32,
    ) -> WindowInfo {
        WindowInfo {
            window_id,
            pid,
            title: format!("{} Window", app_name),
            app_name: app_name.to_string(),
            frame: Rect::new(x, y, width, height),
            is_on_screen: true,
            native_state: None,
        }
    }
}
