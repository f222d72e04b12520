use std::sync::mpsc as std_mpsc;
use std::sync::mpsc::RecvTimeoutError;
#[cfg(test)]
use std::time::Duration;

use super::session::Session;

pub type Job = Box<dyn FnOnce(&mut Session) + Send>;

enum Message {
    Run(Job),
    Quit,
}

/// Posts work onto the coordinating thread. Cheap to clone, usable from any
/// thread.
#[derive(Clone)]
pub struct JobSender {
    tx: std_mpsc::Sender<Message>,
}

impl JobSender {
    pub fn post(&self, job: impl FnOnce(&mut Session) + Send + 'static) {
        if self.tx.send(Message::Run(Box::new(job))).is_err() {
            tracing::debug!("Coordinator is gone, dropping job");
        }
    }

    pub fn quit(&self) {
        if self.tx.send(Message::Quit).is_err() {
            tracing::debug!("Coordinator already stopped");
        }
    }
}

pub struct JobReceiver {
    rx: std_mpsc::Receiver<Message>,
}

pub fn job_queue() -> (JobSender, JobReceiver) {
    let (tx, rx) = std_mpsc::channel();
    (JobSender { tx }, JobReceiver { rx })
}

/// Single consumer of the job queue. Owns the session, so every model
/// mutation happens on the thread running it.
pub struct Coordinator {
    session: Session,
    jobs: JobReceiver,
}

impl Coordinator {
    pub fn new(session: Session, jobs: JobReceiver) -> Self {
        Self { session, jobs }
    }

    #[cfg(test)]
    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn run(mut self) {
        self.session.bind_to_current_thread();
        tracing::info!("Coordinator started");

        loop {
            let message = match self.session.config().poll_interval() {
                Some(interval) => match self.jobs.rx.recv_timeout(interval) {
                    Ok(message) => message,
                    Err(RecvTimeoutError::Timeout) => {
                        self.session.poll();
                        continue;
                    }
                    Err(RecvTimeoutError::Disconnected) => break,
                },
                None => match self.jobs.rx.recv() {
                    Ok(message) => message,
                    Err(_) => break,
                },
            };
            if !self.handle(message) {
                break;
            }
        }

        tracing::info!("Coordinator stopped");
    }

    fn handle(&mut self, message: Message) -> bool {
        match message {
            Message::Run(job) => {
                job(&mut self.session);
                true
            }
            Message::Quit => false,
        }
    }

    /// Waits up to `timeout` for one message and handles it. Returns true if
    /// a job ran.
    #[cfg(test)]
    pub fn run_next(&mut self, timeout: Duration) -> bool {
        match self.jobs.rx.recv_timeout(timeout) {
            Ok(message) => self.handle(message),
            Err(_) => false,
        }
    }
}
