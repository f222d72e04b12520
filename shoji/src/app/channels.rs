use std::sync::mpsc as std_mpsc;

use tokio::sync::mpsc;

use super::command::handle_command;
use super::coordinator::{job_queue, JobReceiver, JobSender};
use crate::ipc::{EventBroadcaster, EventServer, IpcServer};
use shoji_ipc::{Command, Response, StateEvent};

pub type IpcCommandWithResponse = (Command, mpsc::Sender<Response>);

pub struct IpcRelay {
    pub jobs: JobSender,
    pub server_tx: mpsc::Sender<IpcCommandWithResponse>,
    pub server_rx: mpsc::Receiver<IpcCommandWithResponse>,
}

pub struct EventStreaming {
    pub broadcaster: EventBroadcaster,
    pub state_event_rx: std_mpsc::Receiver<StateEvent>,
}

pub struct TokioChannels {
    pub ipc: IpcRelay,
    pub events: EventStreaming,
}

pub struct CoordinatorChannels {
    pub jobs: JobSender,
    pub job_rx: JobReceiver,
    pub state_event_tx: std_mpsc::Sender<StateEvent>,
}

pub fn create_channels() -> (TokioChannels, CoordinatorChannels) {
    // Jobs: anywhere -> coordinating thread
    let (jobs, job_rx) = job_queue();

    // IPC server -> relay (tokio internal)
    let (server_tx, server_rx) = mpsc::channel::<IpcCommandWithResponse>(256);

    // State events: coordinating thread -> broadcast
    let (state_event_tx, state_event_rx) = std_mpsc::channel::<StateEvent>();

    let tokio_channels = TokioChannels {
        ipc: IpcRelay {
            jobs: jobs.clone(),
            server_tx,
            server_rx,
        },
        events: EventStreaming {
            broadcaster: EventBroadcaster::new(256),
            state_event_rx,
        },
    };

    let coordinator_channels = CoordinatorChannels {
        jobs,
        job_rx,
        state_event_tx,
    };

    (tokio_channels, coordinator_channels)
}

pub async fn run_async(channels: TokioChannels) {
    let TokioChannels { ipc, events } = channels;
    let IpcRelay {
        jobs,
        server_tx,
        server_rx: mut ipc_rx,
    } = ipc;
    let EventStreaming {
        broadcaster,
        state_event_rx,
    } = events;

    tracing::info!("Tokio runtime started");

    let ipc_server = IpcServer::new(server_tx);
    tokio::spawn(async move {
        if let Err(e) = ipc_server.run().await {
            tracing::error!("IPC server error: {}", e);
        }
    });

    let event_server = EventServer::new(broadcaster.subscribe());
    tokio::spawn(async move {
        if let Err(e) = event_server.run().await {
            tracing::error!("Event server error: {}", e);
        }
    });

    // Forward state events from the coordinating thread to subscribers
    std::thread::spawn(move || {
        while let Ok(event) = state_event_rx.recv() {
            broadcaster.send(event);
        }
    });

    while let Some((cmd, resp_tx)) = ipc_rx.recv().await {
        let quit = jobs.clone();
        jobs.post(move |session| {
            tracing::debug!("Received IPC command: {:?}", cmd);
            let response = handle_command(session, &cmd);
            if resp_tx.blocking_send(response).is_err() {
                tracing::debug!("IPC client went away before the response");
            }
            if matches!(cmd, Command::Quit) {
                quit.quit();
            }
        });
    }

    tracing::info!("Tokio runtime exiting");
}
