use crate::core::{ManagerState, MAIN_MODE};
use crate::event_emitter::EventEmitter;

const SEPARATOR: &str = " │ ";

/// `"[m] "` for a non-main binding mode, then each monitor's active workspace
/// left to right. With several monitors the focused one is starred.
pub fn status_text(state: &ManagerState) -> String {
    let mode = if state.active_mode != MAIN_MODE {
        state
            .active_mode
            .chars()
            .next()
            .map(|c| format!("[{}] ", c))
            .unwrap_or_default()
    } else {
        String::new()
    };

    let monitors = state.sorted_monitors();
    let mark_focus = monitors.len() > 1;
    let workspaces: Vec<String> = monitors
        .iter()
        .map(|m| {
            if mark_focus && m.active_workspace == state.focused_workspace {
                format!("*{}", m.active_workspace)
            } else {
                m.active_workspace.clone()
            }
        })
        .collect();

    format!("{}{}", mode, workspaces.join(SEPARATOR))
}

/// Last published status, so unchanged text is not re-sent.
#[derive(Debug, Default)]
pub struct TrayStatus {
    text: String,
}

impl TrayStatus {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn publish(&mut self, state: &ManagerState, emitter: &EventEmitter) {
        let text = status_text(state);
        if text == self.text {
            return;
        }
        tracing::debug!("Status: {}", text);
        emitter.emit_status_changed(&text);
        self.text = text;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::sync_monitors;
    use crate::platform::mock::create_test_monitor;
    use shoji_ipc::StateEvent;
    use std::sync::mpsc;

    #[test]
    fn test_single_monitor_has_no_star() {
        let mut state = ManagerState::new();
        sync_monitors(&mut state, &[create_test_monitor(1, 0, 0, 1920, 1080)]);
        assert_eq!(status_text(&state), "1");
    }

    #[test]
    fn test_monitors_sorted_by_position() {
        let mut state = ManagerState::new();
        // Monitor 1 sits to the right of monitor 2
        sync_monitors(
            &mut state,
            &[
                create_test_monitor(1, 1920, 0, 1920, 1080),
                create_test_monitor(2, 0, 0, 1920, 1080),
            ],
        );
        assert_eq!(status_text(&state), "2 │ *1");

        state.active_mode = "service".to_string();
        assert_eq!(status_text(&state), "[s] 2 │ *1");
    }

    #[test]
    fn test_publish_only_on_change() {
        let mut state = ManagerState::new();
        sync_monitors(&mut state, &[create_test_monitor(1, 0, 0, 1920, 1080)]);
        let (tx, rx) = mpsc::channel();
        let emitter = EventEmitter::new(tx);
        let mut tray = TrayStatus::default();

        tray.publish(&state, &emitter);
        tray.publish(&state, &emitter);
        let events: Vec<_> = rx.try_iter().collect();
        assert_eq!(
            events,
            vec![StateEvent::StatusChanged {
                text: "1".to_string()
            }]
        );
        assert_eq!(tray.text(), "1");
    }
}
