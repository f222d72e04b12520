use shoji_ipc::{Command, Response, WindowInfo};

use super::session::Session;
use crate::event::SessionEvent;
use crate::event_emitter::{window_to_info, workspace_infos};

/// Runs one IPC command on the coordinating thread. Mutating commands run as
/// the unit of work of a reconciliation.
pub fn handle_command(session: &mut Session, cmd: &Command) -> Response {
    match cmd {
        Command::Refresh => {
            session.reconcile_and_layout(SessionEvent::UserCommand, false, false);
            Response::Ok
        }
        Command::FocusWorkspace { name } => {
            if let Err(response) = validate_workspace_name(name) {
                return response;
            }
            let focused = session.reconcile(SessionEvent::UserCommand, false, false, |state| {
                state.focus_workspace(name)
            });
            if focused {
                Response::Ok
            } else {
                Response::Error {
                    message: "No monitor available".to_string(),
                }
            }
        }
        Command::MoveToWorkspace { name } => {
            if let Err(response) = validate_workspace_name(name) {
                return response;
            }
            let moved = session.reconcile(SessionEvent::UserCommand, false, false, |state| {
                state.move_focused_window_to_workspace(name)
            });
            match moved {
                Some(_) => Response::Ok,
                None => Response::Error {
                    message: "No focused window".to_string(),
                },
            }
        }
        Command::Status => Response::Status {
            text: session.status_text(),
        },
        Command::ListWindows => {
            let state = session.state();
            let windows: Vec<WindowInfo> =
                state.windows().map(|w| window_to_info(state, w)).collect();
            Response::Windows { windows }
        }
        Command::ListWorkspaces => Response::Workspaces {
            workspaces: workspace_infos(session.state()),
        },
        Command::Quit => {
            tracing::info!("Quit command received");
            Response::Ok
        }
    }
}

fn validate_workspace_name(name: &str) -> Result<(), Response> {
    if name.trim().is_empty() {
        return Err(Response::Error {
            message: "Workspace name must not be empty".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::coordinator::job_queue;
    use crate::core::Config;
    use crate::event_emitter::EventEmitter;
    use crate::layout::mock::MockLayouter;
    use crate::platform::mock::{
        create_test_monitor, create_test_window, ManipulatorCall, MockWindowManipulator,
        MockWindowSource,
    };
    use std::sync::{mpsc, Arc};

    struct Fixture {
        session: Session,
        manipulator: Arc<MockWindowManipulator>,
        _rt: tokio::runtime::Runtime,
    }

    fn setup(source: MockWindowSource) -> Fixture {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let manipulator = Arc::new(MockWindowManipulator::new());
        let (tx, _rx) = mpsc::channel();
        let (jobs, _job_rx) = job_queue();
        let mut session = Session::new(
            Config::default(),
            Arc::new(source),
            manipulator.clone(),
            Box::new(MockLayouter::default()),
            EventEmitter::new(tx),
            jobs,
            rt.handle().clone(),
        );
        session.reconcile_and_layout(SessionEvent::Startup, true, true);
        manipulator.take_calls();
        Fixture {
            session,
            manipulator,
            _rt: rt,
        }
    }

    fn two_windows() -> MockWindowSource {
        MockWindowSource::new()
            .with_monitors(vec![create_test_monitor(1, 0, 0, 1920, 1080)])
            .with_windows(vec![
                create_test_window(1, 100, "Safari", 0, 0, 800, 600),
                create_test_window(2, 100, "Safari", 0, 0, 800, 600),
            ])
            .with_focused(Some(1))
    }

    #[test]
    fn test_move_to_hidden_workspace_parks_window() {
        let mut f = setup(two_windows());
        let response = handle_command(
            &mut f.session,
            &Command::MoveToWorkspace {
                name: "2".to_string(),
            },
        );
        assert!(matches!(response, Response::Ok));

        let state = f.session.state();
        assert_eq!(state.window(1).unwrap().workspace, "2");
        assert_eq!(state.focused, Some(2));
        assert!(state.window(1).unwrap().is_hidden());

        let calls = f.manipulator.calls();
        assert!(calls.contains(&ManipulatorCall::Focus { window_id: 2 }));
        assert!(calls
            .iter()
            .any(|c| matches!(c, ManipulatorCall::Move { window_id: 1, .. })));
    }

    #[test]
    fn test_move_without_focus_is_an_error() {
        let source =
            MockWindowSource::new().with_monitors(vec![create_test_monitor(1, 0, 0, 1920, 1080)]);
        let mut f = setup(source);
        let response = handle_command(
            &mut f.session,
            &Command::MoveToWorkspace {
                name: "2".to_string(),
            },
        );
        match response {
            Response::Error { message } => assert_eq!(message, "No focused window"),
            other => panic!("unexpected response: {:?}", other),
        }
    }

    #[test]
    fn test_focus_workspace_updates_status() {
        let mut f = setup(two_windows());
        handle_command(
            &mut f.session,
            &Command::MoveToWorkspace {
                name: "2".to_string(),
            },
        );
        let response = handle_command(
            &mut f.session,
            &Command::FocusWorkspace {
                name: "2".to_string(),
            },
        );
        assert!(matches!(response, Response::Ok));
        assert_eq!(f.session.state().focused_workspace, "2");
        assert_eq!(f.session.state().focused, Some(1));

        match handle_command(&mut f.session, &Command::Status) {
            Response::Status { text } => assert_eq!(text, "2"),
            other => panic!("unexpected response: {:?}", other),
        }
    }

    #[test]
    fn test_empty_workspace_name_rejected() {
        let mut f = setup(two_windows());
        let response = handle_command(
            &mut f.session,
            &Command::FocusWorkspace {
                name: " ".to_string(),
            },
        );
        assert!(matches!(response, Response::Error { .. }));
        assert!(f.manipulator.calls().is_empty());
    }

    #[test]
    fn test_list_queries() {
        let mut f = setup(two_windows());
        match handle_command(&mut f.session, &Command::ListWindows) {
            Response::Windows { windows } => {
                assert_eq!(windows.len(), 2);
                assert!(windows[0].is_focused);
                assert_eq!(windows[0].app_name, "Safari");
            }
            other => panic!("unexpected response: {:?}", other),
        }
        match handle_command(&mut f.session, &Command::ListWorkspaces) {
            Response::Workspaces { workspaces } => {
                assert_eq!(workspaces.len(), 1);
                assert_eq!(workspaces[0].window_ids, vec![1, 2]);
                assert!(workspaces[0].is_focused);
            }
            other => panic!("unexpected response: {:?}", other),
        }
    }
}
