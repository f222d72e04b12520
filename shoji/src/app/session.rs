use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread::ThreadId;

use tokio::runtime::Handle;

use super::coordinator::JobSender;
use super::detect::{
    attach_windows, discover_orphan_windows, discover_windows, DetectionRequest,
    DetectionSnapshot, NewWindowDetector, UnitOfWork,
};
use super::focus::{dispatch_focus_callbacks, resync_os_focus, update_focus_cache, FocusTracker};
use super::gc::{collect_garbage, GcReport};
use super::retile::{apply_layout, apply_layout_reasons};
use super::timing::{RaceOutcome, TimeoutRace};
use super::tray::{status_text, TrayStatus};
use crate::core::{
    sync_monitors, ClosedWindowsCache, Config, LayoutReason, ManagerState, WindowId,
};
use crate::event::SessionEvent;
use crate::event_emitter::EventEmitter;
use crate::layout::Layouter;
use crate::platform::{WindowInfo, WindowManipulator, WindowSource};

/// Request-scoped flags of the reconciliation in progress.
#[derive(Debug, Clone)]
struct RefreshContext {
    event: SessionEvent,
    screen_definitely_unlocked: bool,
    startup: bool,
}

/// Owns the model and is the only thing allowed to mutate it.
pub struct Session {
    state: ManagerState,
    config: Config,
    source: Arc<dyn WindowSource>,
    manipulator: Arc<dyn WindowManipulator>,
    layouter: Box<dyn Layouter>,
    emitter: EventEmitter,
    jobs: JobSender,
    detector: NewWindowDetector,
    closed_windows: ClosedWindowsCache,
    pending_layout_reasons: BTreeMap<WindowId, LayoutReason>,
    tray: TrayStatus,
    context: Option<RefreshContext>,
    owner: ThreadId,
}

impl Session {
    pub fn new(
        config: Config,
        source: Arc<dyn WindowSource>,
        manipulator: Arc<dyn WindowManipulator>,
        layouter: Box<dyn Layouter>,
        emitter: EventEmitter,
        jobs: JobSender,
        runtime: Handle,
    ) -> Self {
        Self {
            state: ManagerState::new(),
            config,
            source,
            manipulator,
            layouter,
            emitter,
            jobs,
            detector: NewWindowDetector::new(runtime),
            closed_windows: ClosedWindowsCache::new(),
            pending_layout_reasons: BTreeMap::new(),
            tray: TrayStatus::default(),
            context: None,
            owner: std::thread::current().id(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn state(&self) -> &ManagerState {
        &self.state
    }

    pub fn status_text(&self) -> String {
        status_text(&self.state)
    }

    /// Event of the reconciliation in progress, for diagnostics.
    pub fn current_event(&self) -> Option<&SessionEvent> {
        self.context.as_ref().map(|c| &c.event)
    }

    /// Makes the calling thread the coordinating thread.
    pub fn bind_to_current_thread(&mut self) {
        self.owner = std::thread::current().id();
    }

    fn assert_coordinator_thread(&self) {
        let current = std::thread::current().id();
        assert_eq!(
            current, self.owner,
            "session used off the coordinating thread ({:?}, owner {:?})",
            current, self.owner
        );
    }

    /// Runs the full refresh pipeline around `unit_of_work` and returns its
    /// result.
    pub fn reconcile<T>(
        &mut self,
        event: SessionEvent,
        screen_definitely_unlocked: bool,
        startup: bool,
        unit_of_work: impl FnOnce(&mut ManagerState) -> T,
    ) -> T {
        self.assert_coordinator_thread();
        tracing::debug!("Reconcile started ({})", event);

        let ctx = RefreshContext {
            event,
            screen_definitely_unlocked,
            startup,
        };
        let previous = self.context.replace(ctx.clone());
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            self.refresh_session(&ctx, unit_of_work)
        }));
        self.context = previous;

        match outcome {
            Ok(result) => {
                tracing::debug!("Reconcile finished ({})", ctx.event);
                result
            }
            Err(payload) => {
                tracing::error!("Reconcile aborted ({})", ctx.event);
                panic::resume_unwind(payload)
            }
        }
    }

    pub fn reconcile_and_layout(
        &mut self,
        event: SessionEvent,
        screen_definitely_unlocked: bool,
        startup: bool,
    ) {
        self.reconcile(event, screen_definitely_unlocked, startup, |_| ());
    }

    fn refresh_session<T>(
        &mut self,
        ctx: &RefreshContext,
        unit_of_work: impl FnOnce(&mut ManagerState) -> T,
    ) -> T {
        if ctx.screen_definitely_unlocked {
            self.closed_windows.clear();
        }

        let report = collect_garbage(&mut self.state, self.source.as_ref(), &mut self.closed_windows);
        self.emit_removed(&report);
        sync_monitors(&mut self.state, &self.source.monitors());

        self.detect_new_apps_and_windows(ctx.startup);

        let native_focus = self.source.focused_window();
        update_focus_cache(&mut self.state, native_focus, ctx.startup);
        let focus = FocusTracker::begin(&self.state);

        self.refresh_model();
        let result = unit_of_work(&mut self.state);
        self.refresh_model();

        let focus_target = focus.finish(&self.state);

        if ctx.startup {
            self.smart_layout_at_startup();
        }

        let layout_reasons = std::mem::take(&mut self.pending_layout_reasons);

        if self.config.tray_enabled {
            if let Some(window_id) = focus_target {
                resync_os_focus(&self.state, window_id, self.manipulator.as_ref());
            }
            self.tray.publish(&self.state, &self.emitter);
            apply_layout_reasons(&mut self.state, layout_reasons);
            apply_layout(
                &mut self.state,
                self.layouter.as_mut(),
                self.manipulator.as_ref(),
            );
        }

        result
    }

    /// GC, focus-changed callbacks and container normalization.
    pub fn refresh_model(&mut self) {
        let report = collect_garbage(&mut self.state, self.source.as_ref(), &mut self.closed_windows);
        self.emit_removed(&report);
        self.state.normalize_focus();
        dispatch_focus_callbacks(&mut self.state, &self.emitter);
        self.state.normalize_containers();
    }

    fn detect_new_apps_and_windows(&mut self, startup: bool) {
        let snapshot = DetectionSnapshot::capture(&self.state);
        let discovery = discover_windows(self.source.as_ref(), &snapshot, startup);

        if startup {
            // Recompute every reason, including windows the source stopped listing
            self.pending_layout_reasons = self
                .state
                .window_ids()
                .into_iter()
                .map(|id| (id, LayoutReason::Standard))
                .collect();
        }
        self.pending_layout_reasons.extend(discovery.layout_reasons);

        self.attach_discovered(discovery.windows);
    }

    fn attach_discovered(&mut self, windows: Vec<WindowInfo>) -> Vec<WindowId> {
        let attached = attach_windows(&mut self.state, &mut self.closed_windows, windows);
        for id in &attached {
            if let Some(window) = self.state.window(*id) {
                self.emitter.emit_window_created(&self.state, window);
            }
        }
        attached
    }

    fn emit_removed(&self, report: &GcReport) {
        if !report.is_empty() {
            tracing::debug!("GC: {:?}", report);
        }
        for id in &report.windows_removed {
            self.emitter.emit_window_destroyed(*id);
        }
    }

    fn smart_layout_at_startup(&mut self) {
        let name = self.state.focused_workspace.clone();
        if let Some(ws) = self.state.workspaces.get_mut(&name) {
            let layout = ws.smart_layout();
            if ws.root.layout != layout {
                tracing::info!(
                    "Startup layout for workspace {}: {}",
                    name,
                    layout.name()
                );
                ws.root.layout = layout;
            }
        }
    }

    /// Debounced background detection. Each call supersedes the previous one.
    pub fn schedule_detection(
        &mut self,
        event: SessionEvent,
        screen_definitely_unlocked: bool,
        startup: bool,
        unit_of_work: UnitOfWork,
    ) {
        self.assert_coordinator_thread();
        if let Some(current) = self.current_event() {
            tracing::debug!("Detection requested during reconcile ({})", current);
        }
        let delay = self.config.debounce_delay();
        self.detector.schedule(
            delay,
            self.jobs.clone(),
            DetectionRequest {
                event,
                screen_definitely_unlocked,
                startup,
                unit_of_work,
            },
        );
    }

    /// The fired debounce action. Blocks for up to the configured timeout
    /// while the detection thread enumerates windows.
    pub(crate) fn run_detection(&mut self, request: DetectionRequest) {
        self.assert_coordinator_thread();
        let event = request.event.clone();

        let observed = self.detector.observed();
        observed.store(false, Ordering::Release);

        let snapshot = DetectionSnapshot::capture(&self.state);
        let source = Arc::clone(&self.source);
        let task_observed = Arc::clone(&observed);
        let jobs = self.jobs.clone();

        let race = TimeoutRace::spawn(
            move || {
                let found = discover_orphan_windows(source.as_ref(), &snapshot);
                if !found.is_empty() {
                    task_observed.store(true, Ordering::Release);
                }
                found
            },
            move |found| {
                if !observed.load(Ordering::Acquire) {
                    return;
                }
                tracing::info!(
                    "Detection finished late with {} new windows, scheduling refresh",
                    found.len()
                );
                jobs.post(move |session| session.finish_late_detection(found, request));
            },
        );

        match race.wait(self.config.detection_timeout()) {
            RaceOutcome::Finished(found) => {
                let attached = self.attach_discovered(found);
                if !attached.is_empty() {
                    tracing::info!("Detection ({}) attached windows {:?}", event, attached);
                }
            }
            RaceOutcome::TimedOut => {
                tracing::debug!("Detection ({}) timed out", event);
            }
        }
    }

    fn finish_late_detection(&mut self, found: Vec<WindowInfo>, request: DetectionRequest) {
        self.attach_discovered(found);
        self.reconcile(
            request.event,
            request.screen_definitely_unlocked,
            request.startup,
            request.unit_of_work,
        );
    }

    /// Idle tick of the coordinator.
    pub fn poll(&mut self) {
        let event = SessionEvent::OsNotification("poll".to_string());
        self.reconcile_and_layout(event.clone(), false, false);
        self.schedule_detection(event, false, false, Box::new(|_| {}));
    }
}
