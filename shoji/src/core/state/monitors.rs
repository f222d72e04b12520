use std::collections::BTreeSet;

use super::ManagerState;
use crate::core::{Monitor, MonitorId};
use crate::platform::MonitorInfo;

/// Resyncs the monitor registry with what the OS reports. An empty report is
/// treated as transient and ignored. Returns true if anything changed.
pub fn sync_monitors(state: &mut ManagerState, infos: &[MonitorInfo]) -> bool {
    if infos.is_empty() {
        if !state.monitors.is_empty() {
            tracing::warn!("OS reported no monitors, keeping {}", state.monitors.len());
        }
        return false;
    }

    let mut changed = false;
    let current: BTreeSet<MonitorId> = infos.iter().map(|m| m.id).collect();

    let removed: Vec<MonitorId> = state
        .monitors
        .keys()
        .filter(|id| !current.contains(id))
        .copied()
        .collect();
    for id in removed {
        tracing::info!("Monitor {} disconnected", id);
        state.monitors.remove(&id);
        for ws in state.workspaces.values_mut() {
            if ws.monitor == Some(id) {
                ws.monitor = None;
            }
        }
        changed = true;
    }

    for info in infos {
        match state.monitors.get_mut(&info.id) {
            Some(monitor) => {
                if monitor.frame != info.frame || monitor.is_main != info.is_main {
                    tracing::info!(
                        "Monitor {} changed: ({}, {}) {}x{}",
                        info.id,
                        info.frame.x,
                        info.frame.y,
                        info.frame.width,
                        info.frame.height
                    );
                    monitor.frame = info.frame;
                    monitor.is_main = info.is_main;
                    changed = true;
                }
            }
            None => {
                let workspace = next_workspace_for_new_monitor(state);
                tracing::info!(
                    "Monitor {} connected, showing workspace {}",
                    info.id,
                    workspace
                );
                state.workspace_or_create(&workspace).monitor = Some(info.id);
                state.monitors.insert(
                    info.id,
                    Monitor::new(info.id, info.frame, info.is_main, workspace),
                );
                changed = true;
            }
        }
    }

    if !state.is_displayed(&state.focused_workspace) {
        if let Some(name) = state.main_monitor().map(|m| m.active_workspace.clone()) {
            tracing::info!(
                "Focused workspace {} lost its monitor, focusing {}",
                state.focused_workspace,
                name
            );
            state.focused_workspace = name;
            changed = true;
        }
    }

    changed
}

/// First workspace without a monitor, else the lowest free numeric name.
fn next_workspace_for_new_monitor(state: &ManagerState) -> String {
    if let Some(ws) = state.workspaces.values().find(|ws| ws.monitor.is_none()) {
        return ws.name.clone();
    }
    (1..)
        .map(|n: u32| n.to_string())
        .find(|name| !state.workspaces.contains_key(name))
        .unwrap_or_default()
}
