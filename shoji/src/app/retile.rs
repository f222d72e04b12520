use std::collections::BTreeMap;

use crate::core::{
    HideCorner, Hideable, LayoutReason, ManagerState, MonitorId, Rect, WindowId,
};
use crate::layout::Layouter;
use crate::platform::WindowManipulator;

/// Picks the corner whose parked windows are least likely to peek onto a
/// neighbouring monitor. Offsets are 10% of the monitor size.
pub fn optimal_hide_corner(monitor: &Rect, monitors: &[Rect]) -> HideCorner {
    let x_off = monitor.width as i32 / 10;
    let y_off = monitor.height as i32 / 10;
    let (min_x, max_x, max_y) = (monitor.x, monitor.max_x(), monitor.max_y());

    let bottom_right = [
        (max_x + 2, max_y - y_off),
        (max_x - x_off, max_y + 2),
        (max_x + 2, max_y + 2),
    ];
    let bottom_left = [
        (min_x - 2, max_y - y_off),
        (min_x + x_off, max_y + 2),
        (min_x - 2, max_y + 2),
    ];

    let inside_any = |(x, y): &(i32, i32)| monitors.iter().any(|m| m.contains(*x, *y));

    if bottom_right.iter().any(inside_any) && !bottom_left.iter().any(inside_any) {
        HideCorner::BottomLeft
    } else {
        HideCorner::BottomRight
    }
}

pub fn compute_hide_corners(state: &ManagerState) -> BTreeMap<MonitorId, HideCorner> {
    let frames: Vec<Rect> = state.monitors.values().map(|m| m.frame).collect();
    state
        .monitors
        .values()
        .map(|m| (m.id, optimal_hide_corner(&m.frame, &frames)))
        .collect()
}

/// Applies layout reasons observed during detection. Windows handed to the OS
/// (minimized, native fullscreen) drop out of tiling until they come back.
pub fn apply_layout_reasons(state: &mut ManagerState, pending: BTreeMap<WindowId, LayoutReason>) {
    for (window_id, reason) in pending {
        if let Some(window) = state.window_mut(window_id) {
            if window.layout_reason != reason {
                tracing::debug!(
                    "Window {} layout reason {:?} -> {:?}",
                    window_id,
                    window.layout_reason,
                    reason
                );
                window.layout_reason = reason;
            }
        }
    }
}

/// Two phases, in order. Phase 1: per monitor, unhide the windows of its
/// active workspace and lay them out. Phase 2: park every window of every
/// workspace that is not displayed.
pub fn apply_layout(
    state: &mut ManagerState,
    layouter: &mut dyn Layouter,
    manipulator: &dyn WindowManipulator,
) {
    let corners = compute_hide_corners(state);
    let monitors: Vec<(MonitorId, Rect, String)> = state
        .monitors
        .values()
        .map(|m| (m.id, m.frame, m.active_workspace.clone()))
        .collect();

    for (monitor_id, frame, workspace) in &monitors {
        for window_id in tiling_children(state, workspace) {
            let Some(window) = state.window_mut(window_id) else {
                continue;
            };
            if !window.is_tiled() {
                continue;
            }
            if let Some(m) = window.unhide_from_corner() {
                manipulator.apply_window_moves(&[m]);
            }
        }
        tracing::debug!("Laying out workspace {} on monitor {}", workspace, monitor_id);
        layout_workspace(state, workspace, frame, layouter, manipulator);
    }

    let main_frame = state.main_monitor().map(|m| m.frame);
    let hidden: Vec<String> = state
        .workspaces
        .keys()
        .filter(|name| !state.is_displayed(name))
        .cloned()
        .collect();

    for name in hidden {
        let (frame, corner) = match state.monitor_for_workspace(&name) {
            Some(m) => (
                m.frame,
                corners.get(&m.id).copied().unwrap_or(HideCorner::BottomRight),
            ),
            None => match main_frame {
                Some(frame) => (frame, HideCorner::BottomRight),
                None => continue,
            },
        };
        for window_id in tiling_children(state, &name) {
            let Some(window) = state.window_mut(window_id) else {
                continue;
            };
            if !window.is_tiled() {
                continue;
            }
            if let Some(m) = window.hide_in_corner(corner, &frame) {
                manipulator.apply_window_moves(&[m]);
            }
        }
    }
}

fn tiling_children(state: &ManagerState, workspace: &str) -> Vec<WindowId> {
    state
        .workspaces
        .get(workspace)
        .map(|ws| ws.root.children.clone())
        .unwrap_or_default()
}

fn layout_workspace(
    state: &mut ManagerState,
    workspace: &str,
    frame: &Rect,
    layouter: &mut dyn Layouter,
    manipulator: &dyn WindowManipulator,
) {
    let Some(kind) = state.workspaces.get(workspace).map(|ws| ws.root.layout) else {
        return;
    };
    let window_ids: Vec<WindowId> = tiling_children(state, workspace)
        .into_iter()
        .filter(|id| state.window(*id).is_some_and(|w| w.is_tiled()))
        .collect();
    if window_ids.is_empty() {
        return;
    }

    let geometries = match layouter.layout(kind, frame.width, frame.height, &window_ids) {
        Ok(g) => g,
        Err(e) => {
            tracing::error!("Layout of workspace {} failed: {}", workspace, e);
            return;
        }
    };

    for geom in geometries {
        let target = Rect::new(
            frame.x + geom.x,
            frame.y + geom.y,
            geom.width,
            geom.height,
        );
        let Some(window) = state.window_mut(geom.id) else {
            tracing::warn!("Layout returned unknown window {}", geom.id);
            continue;
        };
        if window.frame != target {
            manipulator.set_window_frame(window.id, window.pid, target);
            window.frame = target;
        }
    }
}
