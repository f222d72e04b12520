use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;

use super::coordinator::JobSender;
use super::timing::Debouncer;
use crate::core::{
    ClosedWindowsCache, LayoutReason, ManagerState, Pid, Rect, Window, WindowId,
};
use crate::event::SessionEvent;
use crate::platform::{WindowInfo, WindowSource};

pub type UnitOfWork = Box<dyn FnOnce(&mut ManagerState) + Send>;

/// Arguments of a reconciliation, carried through the debounce so a late
/// detection can replay them.
pub struct DetectionRequest {
    pub event: SessionEvent,
    pub screen_definitely_unlocked: bool,
    pub startup: bool,
    pub unit_of_work: UnitOfWork,
}

/// What the detection thread is allowed to know about the model.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionSnapshot {
    known_windows: BTreeSet<WindowId>,
    known_apps: Vec<Pid>,
}

impl DetectionSnapshot {
    pub fn capture(state: &ManagerState) -> Self {
        Self {
            known_windows: state.window_ids(),
            known_apps: state.apps.keys().copied().collect(),
        }
    }
}

#[derive(Debug, Default)]
pub struct Discovery {
    pub windows: Vec<WindowInfo>,
    /// Layout reason of every window the source listed, tracked or not.
    pub layout_reasons: BTreeMap<WindowId, LayoutReason>,
}

/// Off-screen windows are only adopted at startup.
fn is_adoptable(info: &WindowInfo, startup: bool) -> bool {
    startup || info.is_on_screen
}

fn layout_reason(info: &WindowInfo) -> LayoutReason {
    info.native_state
        .map(LayoutReason::Native)
        .unwrap_or_default()
}

/// Synchronous pass over every known app and every running app not known yet.
pub fn discover_windows(
    source: &dyn WindowSource,
    snapshot: &DetectionSnapshot,
    startup: bool,
) -> Discovery {
    let mut pids = snapshot.known_apps.clone();
    for app in source.running_apps() {
        if !pids.contains(&app.pid) {
            pids.push(app.pid);
        }
    }

    let mut discovery = Discovery::default();
    for pid in pids {
        for info in source.app_windows(pid) {
            discovery
                .layout_reasons
                .insert(info.window_id, layout_reason(&info));
            if !snapshot.known_windows.contains(&info.window_id) && is_adoptable(&info, startup) {
                discovery.windows.push(info);
            }
        }
    }
    discovery
}

/// Untracked windows of already known apps. Only reads the source, so it is
/// safe to run off the coordinating thread.
pub fn discover_orphan_windows(
    source: &dyn WindowSource,
    snapshot: &DetectionSnapshot,
) -> Vec<WindowInfo> {
    snapshot
        .known_apps
        .iter()
        .flat_map(|&pid| source.app_windows(pid))
        .filter(|info| {
            !snapshot.known_windows.contains(&info.window_id) && is_adoptable(info, false)
        })
        .collect()
}

/// New windows open on the workspace shown where their center is, else on
/// the focused workspace.
fn workspace_for_new_window(state: &ManagerState, frame: &Rect) -> String {
    let (x, y) = frame.center();
    state
        .monitor_at(x, y)
        .map(|m| m.active_workspace.clone())
        .unwrap_or_else(|| state.focused_workspace.clone())
}

/// Starts tracking discovered windows. A window GC removed recently goes back
/// where it was. Returns the ids actually attached.
pub fn attach_windows(
    state: &mut ManagerState,
    closed: &mut ClosedWindowsCache,
    infos: Vec<WindowInfo>,
) -> Vec<WindowId> {
    let mut attached = Vec::new();
    for info in infos {
        if state.window(info.window_id).is_some() {
            continue;
        }
        let (workspace, index) = match closed.take(info.window_id) {
            Some(previous) => {
                tracing::info!(
                    "Restoring window {} to workspace {} at {}",
                    info.window_id,
                    previous.workspace,
                    previous.index
                );
                (previous.workspace, Some(previous.index))
            }
            None => (workspace_for_new_window(state, &info.frame), None),
        };
        tracing::info!(
            "New window {} ({}) on workspace {}",
            info.window_id,
            info.app_name,
            workspace
        );
        let window = Window::from_window_info(&info, &workspace);
        state.attach_window(window, &info.app_name, index);
        attached.push(info.window_id);
    }
    attached
}

/// Debounces detection requests. Only the last request of a burst runs, on
/// the coordinating thread.
pub struct NewWindowDetector {
    debouncer: Debouncer,
    observed: Arc<AtomicBool>,
}

impl NewWindowDetector {
    pub fn new(runtime: Handle) -> Self {
        Self {
            debouncer: Debouncer::new(runtime),
            observed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Shared "new window observed" flag.
    pub fn observed(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.observed)
    }

    pub fn schedule(&mut self, delay: Duration, jobs: JobSender, request: DetectionRequest) {
        tracing::debug!("Scheduling new window detection ({})", request.event);
        self.debouncer.debounce(delay, move |token| {
            jobs.post(move |session| {
                if token.is_current() {
                    session.run_detection(request);
                } else {
                    tracing::debug!("Dropping superseded detection ({})", request.event);
                }
            });
        });
    }
}
