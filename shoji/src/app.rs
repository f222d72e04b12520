mod channels;
mod command;
mod coordinator;
mod detect;
mod focus;
mod gc;
mod retile;
mod session;
mod timing;
mod tray;

use anyhow::Result;

use crate::core::Config;

pub struct App {}

impl App {
    #[cfg(target_os = "macos")]
    pub fn run(config: Config) -> Result<()> {
        use std::sync::Arc;

        use crate::event::SessionEvent;
        use crate::event_emitter::EventEmitter;
        use crate::layout::LayoutEngineManager;
        use crate::macos;
        use crate::platform::{MacOSWindowManipulator, MacOSWindowSource};

        if !macos::is_trusted_with_prompt() {
            anyhow::bail!("Please grant Accessibility permission and restart");
        }

        let (tokio_channels, coordinator_channels) = channels::create_channels();
        let channels::CoordinatorChannels {
            jobs,
            job_rx,
            state_event_tx,
        } = coordinator_channels;

        let runtime = tokio::runtime::Runtime::new()?;
        let handle = runtime.handle().clone();
        std::thread::spawn(move || {
            runtime.block_on(channels::run_async(tokio_channels));
        });

        tracing::info!("Config: {:?}", config);
        let mut session = session::Session::new(
            config,
            Arc::new(MacOSWindowSource),
            Arc::new(MacOSWindowManipulator),
            Box::new(LayoutEngineManager::new()),
            EventEmitter::new(state_event_tx),
            jobs,
            handle,
        );
        session.reconcile_and_layout(SessionEvent::Startup, true, true);

        coordinator::Coordinator::new(session, job_rx).run();
        Ok(())
    }

    #[cfg(not(target_os = "macos"))]
    pub fn run(_config: Config) -> Result<()> {
        anyhow::bail!("shoji requires macOS")
    }
}
