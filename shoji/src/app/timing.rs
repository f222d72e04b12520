use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Identifies one debounce request. Stale once a newer request is made.
#[derive(Debug, Clone)]
pub struct DebounceToken {
    generation: u64,
    latest: Arc<AtomicU64>,
}

impl DebounceToken {
    pub fn is_current(&self) -> bool {
        self.latest.load(Ordering::Acquire) == self.generation
    }
}

/// Runs only the most recent of a burst of requests, `delay` after it was
/// made. Superseded timers are aborted; a timer that already fired is caught
/// by the generation check on its token.
pub struct Debouncer {
    runtime: Handle,
    latest: Arc<AtomicU64>,
    pending: Option<JoinHandle<()>>,
}

impl Debouncer {
    pub fn new(runtime: Handle) -> Self {
        Self {
            runtime,
            latest: Arc::new(AtomicU64::new(0)),
            pending: None,
        }
    }

    pub fn debounce<F>(&mut self, delay: Duration, fire: F)
    where
        F: FnOnce(DebounceToken) + Send + 'static,
    {
        let generation = self.latest.fetch_add(1, Ordering::AcqRel) + 1;
        if let Some(pending) = self.pending.take() {
            pending.abort();
        }

        let token = DebounceToken {
            generation,
            latest: Arc::clone(&self.latest),
        };
        self.pending = Some(self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            if token.is_current() {
                fire(token);
            }
        }));
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.abort();
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum RaceOutcome<T> {
    Finished(T),
    TimedOut,
}

enum Slot<T> {
    Running,
    Finished(T),
    /// The waiter gave up; the task hands its result to `on_late` instead.
    Abandoned,
}

/// A task running on its own thread, raced against a deadline by whoever
/// calls [`TimeoutRace::wait`]. The task is never cancelled.
pub struct TimeoutRace<T> {
    shared: Arc<(Mutex<Slot<T>>, Condvar)>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<T: Send + 'static> TimeoutRace<T> {
    /// Starts `task`. If the waiter times out first, `on_late` receives the
    /// result on the task's thread once it completes.
    pub fn spawn<F, L>(task: F, on_late: L) -> Self
    where
        F: FnOnce() -> T + Send + 'static,
        L: FnOnce(T) + Send + 'static,
    {
        let shared = Arc::new((Mutex::new(Slot::Running), Condvar::new()));
        let task_shared = Arc::clone(&shared);

        std::thread::spawn(move || {
            let value = task();
            let (slot, finished) = &*task_shared;
            let mut slot = lock(slot);
            if matches!(*slot, Slot::Abandoned) {
                drop(slot);
                on_late(value);
            } else {
                *slot = Slot::Finished(value);
                finished.notify_all();
            }
        });

        Self { shared }
    }

    /// Blocks until the task finishes or `timeout` elapses. `None` waits
    /// without a deadline.
    pub fn wait(self, timeout: Option<Duration>) -> RaceOutcome<T> {
        let (slot, finished) = &*self.shared;
        let guard = lock(slot);
        let still_running = |s: &mut Slot<T>| matches!(s, Slot::Running);

        let mut guard = match timeout {
            Some(timeout) => {
                finished
                    .wait_timeout_while(guard, timeout, still_running)
                    .unwrap_or_else(PoisonError::into_inner)
                    .0
            }
            None => finished
                .wait_while(guard, still_running)
                .unwrap_or_else(PoisonError::into_inner),
        };

        match std::mem::replace(&mut *guard, Slot::Abandoned) {
            Slot::Finished(value) => RaceOutcome::Finished(value),
            Slot::Running | Slot::Abandoned => RaceOutcome::TimedOut,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::time::Instant;

    #[test]
    fn test_debounce_coalesces_burst() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let mut debouncer = Debouncer::new(rt.handle().clone());
        let (tx, rx) = mpsc::channel();

        for i in 0..5 {
            let tx = tx.clone();
            debouncer.debounce(Duration::from_millis(50), move |token| {
                tx.send((i, token)).unwrap();
            });
        }

        let (value, token) = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(value, 4);
        assert!(token.is_current());
        assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
    }

    #[test]
    fn test_debounce_token_goes_stale() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let mut debouncer = Debouncer::new(rt.handle().clone());
        let (tx, rx) = mpsc::channel();

        debouncer.debounce(Duration::from_millis(10), move |token| {
            tx.send(token).unwrap();
        });
        let token = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert!(token.is_current());

        debouncer.debounce(Duration::from_secs(60), |_| {});
        assert!(!token.is_current());
    }

    #[test]
    fn test_race_finished_in_time() {
        let (late_tx, late_rx) = mpsc::channel::<u32>();
        let race = TimeoutRace::spawn(|| 42, move |v| late_tx.send(v).unwrap());

        assert_eq!(
            race.wait(Some(Duration::from_secs(2))),
            RaceOutcome::Finished(42)
        );
        assert!(late_rx.recv_timeout(Duration::from_millis(100)).is_err());
    }

    #[test]
    fn test_race_timeout_hands_result_to_late_handler() {
        let (late_tx, late_rx) = mpsc::channel::<u32>();
        let race = TimeoutRace::spawn(
            || {
                std::thread::sleep(Duration::from_millis(200));
                7
            },
            move |v| late_tx.send(v).unwrap(),
        );

        let started = Instant::now();
        assert_eq!(
            race.wait(Some(Duration::from_millis(20))),
            RaceOutcome::TimedOut
        );
        assert!(started.elapsed() < Duration::from_millis(200));
        assert_eq!(late_rx.recv_timeout(Duration::from_secs(2)).unwrap(), 7);
    }

    #[test]
    fn test_race_without_deadline_waits() {
        let race = TimeoutRace::spawn(
            || {
                std::thread::sleep(Duration::from_millis(50));
                "done"
            },
            |_| panic!("no deadline, nothing is late"),
        );
        assert_eq!(race.wait(None), RaceOutcome::Finished("done"));
    }
}
