use objc2_app_kit::{
    NSApplicationActivationOptions, NSApplicationActivationPolicy, NSRunningApplication,
    NSWorkspace,
};

use crate::platform::AppInfo;

pub const LOGIN_WINDOW_BUNDLE_ID: &str = "com.apple.loginwindow";

/// Regular (dock-visible) applications.
pub fn running_applications() -> Vec<AppInfo> {
    let workspace = NSWorkspace::sharedWorkspace();
    workspace
        .runningApplications()
        .iter()
        .filter(|app| app.activationPolicy() == NSApplicationActivationPolicy::Regular)
        .map(|app| AppInfo {
            pid: app.processIdentifier(),
            name: app
                .localizedName()
                .map(|n| n.to_string())
                .unwrap_or_default(),
        })
        .collect()
}

pub fn frontmost_bundle_id() -> Option<String> {
    let workspace = NSWorkspace::sharedWorkspace();
    let app = workspace.frontmostApplication()?;
    app.bundleIdentifier().map(|id| id.to_string())
}

pub fn is_application_terminated(pid: i32) -> bool {
    match NSRunningApplication::runningApplicationWithProcessIdentifier(pid) {
        Some(app) => app.isTerminated(),
        None => !crate::process::is_alive(pid),
    }
}

pub fn activate_application(pid: i32) {
    if let Some(app) = NSRunningApplication::runningApplicationWithProcessIdentifier(pid) {
        app.activateWithOptions(NSApplicationActivationOptions::ActivateAllWindows);
    } else {
        tracing::warn!("No running application for pid {}", pid);
    }
}

pub fn application_name(pid: i32) -> Option<String> {
    let app = NSRunningApplication::runningApplicationWithProcessIdentifier(pid)?;
    app.localizedName().map(|n| n.to_string())
}
