mod app;
mod core;
mod event;
mod event_emitter;
mod ipc;
mod layout;
#[cfg(target_os = "macos")]
mod macos;
mod platform;
mod process;

use anyhow::Result;
use argh::FromArgs;
use ipc::IpcClient;
use shoji_ipc::{Command, EventFilter, Response};
use tracing_subscriber::EnvFilter;

use crate::core::Config;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Shoji - macOS tiling window manager session daemon
#[derive(FromArgs)]
struct Cli {
    #[argh(subcommand)]
    command: Option<SubCommand>,
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum SubCommand {
    Start(StartCmd),
    Version(VersionCmd),
    Refresh(RefreshCmd),
    Status(StatusCmd),
    ListWindows(ListWindowsCmd),
    ListWorkspaces(ListWorkspacesCmd),
    FocusWorkspace(FocusWorkspaceCmd),
    MoveToWorkspace(MoveToWorkspaceCmd),
    Subscribe(SubscribeCmd),
    Quit(QuitCmd),
}

/// Start the shoji daemon
#[derive(FromArgs)]
#[argh(subcommand, name = "start")]
struct StartCmd {
    /// new window detection debounce in milliseconds (default 100)
    #[argh(option)]
    debounce_ms: Option<u64>,
    /// new window detection timeout in milliseconds, 0 waits forever (default 100)
    #[argh(option)]
    timeout_ms: Option<u64>,
    /// idle poll interval in milliseconds, 0 disables (default 1000)
    #[argh(option)]
    poll_ms: Option<u64>,
    /// run without the tray surface (no layout, no focus resync)
    #[argh(switch)]
    no_tray: bool,
}

impl StartCmd {
    fn config(&self) -> Config {
        let defaults = Config::default();
        Config {
            new_window_detection_debounce_ms: self
                .debounce_ms
                .unwrap_or(defaults.new_window_detection_debounce_ms),
            new_window_detection_timeout_ms: self
                .timeout_ms
                .unwrap_or(defaults.new_window_detection_timeout_ms),
            tray_enabled: !self.no_tray,
            poll_interval_ms: self.poll_ms.unwrap_or(defaults.poll_interval_ms),
        }
    }
}

/// Show version information
#[derive(FromArgs)]
#[argh(subcommand, name = "version")]
struct VersionCmd {}

/// Reconcile the session with the system and re-apply layout
#[derive(FromArgs)]
#[argh(subcommand, name = "refresh")]
struct RefreshCmd {}

/// Print the status text shown in the tray
#[derive(FromArgs)]
#[argh(subcommand, name = "status")]
struct StatusCmd {}

/// List all managed windows
#[derive(FromArgs)]
#[argh(subcommand, name = "list-windows")]
struct ListWindowsCmd {}

/// List all workspaces
#[derive(FromArgs)]
#[argh(subcommand, name = "list-workspaces")]
struct ListWorkspacesCmd {}

/// Switch to a workspace
#[derive(FromArgs)]
#[argh(subcommand, name = "focus-workspace")]
struct FocusWorkspaceCmd {
    /// workspace name
    #[argh(positional)]
    name: String,
}

/// Move the focused window to a workspace
#[derive(FromArgs)]
#[argh(subcommand, name = "move-to-workspace")]
struct MoveToWorkspaceCmd {
    /// workspace name
    #[argh(positional)]
    name: String,
}

/// Stream state events as JSON lines
#[derive(FromArgs)]
#[argh(subcommand, name = "subscribe")]
struct SubscribeCmd {
    /// window created/destroyed events
    #[argh(switch)]
    window: bool,
    /// focus and workspace events
    #[argh(switch)]
    focus: bool,
    /// status text updates
    #[argh(switch)]
    status: bool,
}

/// Quit the shoji daemon
#[derive(FromArgs)]
#[argh(subcommand, name = "quit")]
struct QuitCmd {}

fn main() -> Result<()> {
    let cli: Cli = argh::from_env();

    match cli.command {
        None => {
            let args: Vec<&str> = vec!["shoji", "--help"];
            if let Err(e) = Cli::from_args(&args[..1], &args[1..]) {
                println!("{}", e.output);
            }
            Ok(())
        }
        Some(SubCommand::Start(cmd)) => {
            tracing_subscriber::fmt()
                .with_env_filter(EnvFilter::from_default_env())
                .init();

            tracing::info!("shoji starting");
            app::App::run(cmd.config())
        }
        Some(SubCommand::Version(_)) => {
            println!("shoji {}", VERSION);
            Ok(())
        }
        Some(SubCommand::Subscribe(cmd)) => ipc::subscribe_and_print(EventFilter {
            window: cmd.window,
            focus: cmd.focus,
            status: cmd.status,
        }),
        Some(subcmd) => run_cli(subcmd),
    }
}

fn run_cli(subcmd: SubCommand) -> Result<()> {
    let cmd = to_command(subcmd);
    let mut client = IpcClient::connect()?;
    let response = client.send(&cmd)?;

    match response {
        Response::Ok => {}
        Response::Error { message } => {
            eprintln!("Error: {}", message);
            std::process::exit(1);
        }
        Response::Status { text } => println!("{}", text),
        Response::Windows { windows } => {
            for w in windows {
                println!(
                    "{}: {} - {} [ws={}, {}x{} @ ({},{})]{}{}",
                    w.id,
                    w.app_name,
                    w.title,
                    w.workspace,
                    w.width,
                    w.height,
                    w.x,
                    w.y,
                    if w.is_hidden { " hidden" } else { "" },
                    if w.is_focused { " *" } else { "" }
                );
            }
        }
        Response::Workspaces { workspaces } => {
            for ws in workspaces {
                let monitor = ws
                    .monitor_id
                    .map(|id| id.to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "{}{} [{}] monitor={} windows={:?}",
                    if ws.is_focused { "*" } else { "" },
                    ws.name,
                    ws.layout.name(),
                    monitor,
                    ws.window_ids
                );
            }
        }
    }

    Ok(())
}

fn to_command(subcmd: SubCommand) -> Command {
    match subcmd {
        SubCommand::Start(_) | SubCommand::Version(_) | SubCommand::Subscribe(_) => {
            unreachable!("handled in main")
        }
        SubCommand::Refresh(_) => Command::Refresh,
        SubCommand::Status(_) => Command::Status,
        SubCommand::ListWindows(_) => Command::ListWindows,
        SubCommand::ListWorkspaces(_) => Command::ListWorkspaces,
        SubCommand::FocusWorkspace(cmd) => Command::FocusWorkspace { name: cmd.name },
        SubCommand::MoveToWorkspace(cmd) => Command::MoveToWorkspace { name: cmd.name },
        SubCommand::Quit(_) => Command::Quit,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::from_args(&["shoji"], args).unwrap()
    }

    #[test]
    fn test_start_flags_build_config() {
        let cli = parse(&["start", "--debounce-ms", "50", "--poll-ms", "0", "--no-tray"]);
        let Some(SubCommand::Start(cmd)) = cli.command else {
            panic!("expected start");
        };
        let config = cmd.config();
        assert_eq!(config.new_window_detection_debounce_ms, 50);
        assert_eq!(config.new_window_detection_timeout_ms, 100);
        assert_eq!(config.poll_interval_ms, 0);
        assert!(!config.tray_enabled);
    }

    #[test]
    fn test_workspace_subcommands() {
        let cli = parse(&["move-to-workspace", "3"]);
        let cmd = to_command(cli.command.unwrap());
        assert!(matches!(cmd, Command::MoveToWorkspace { name } if name == "3"));
    }
}
