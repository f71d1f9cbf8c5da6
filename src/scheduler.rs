use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

struct Shared {
    stopped: Mutex<bool>,
    wakeup: Condvar,
    // Seconds since the epoch of the last completed tick; 0 before the first.
    last_tick_epoch: AtomicU64,
}

/// A cancellable recurring job on a background thread. The thread parks on a
/// deadline wait between runs; the interval is measured from the completion
/// of the previous run, so an overlong run never causes overlapping ticks,
/// it just pushes the next one out.
pub struct Scheduler {
    shared: Arc<Shared>,
    handle: Option<JoinHandle<()>>,
}

impl Scheduler {
    pub fn start<F>(interval: Duration, mut job: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        let shared = Arc::new(Shared {
            stopped: Mutex::new(false),
            wakeup: Condvar::new(),
            last_tick_epoch: AtomicU64::new(0),
        });
        let thread_shared = Arc::clone(&shared);
        let handle = std::thread::spawn(move || loop {
            if wait_until_due(&thread_shared, interval) {
                break;
            }
            let started = Instant::now();
            println!("start sync.");
            job();
            println!("cost {}s", started.elapsed().as_secs());
            thread_shared
                .last_tick_epoch
                .store(epoch_secs(), Ordering::Relaxed);
        });
        Self {
            shared,
            handle: Some(handle),
        }
    }

    pub fn last_tick(&self) -> Option<SystemTime> {
        match self.shared.last_tick_epoch.load(Ordering::Relaxed) {
            0 => None,
            secs => Some(UNIX_EPOCH + Duration::from_secs(secs)),
        }
    }

    /// Cooperative stop: an in-flight tick runs to completion, only the next
    /// scheduling decision is prevented.
    pub fn stop(mut self) {
        self.signal_stop();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }

    fn signal_stop(&self) {
        let mut stopped = self.shared.stopped.lock().expect("scheduler mutex poisoned");
        *stopped = true;
        self.shared.wakeup.notify_all();
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.signal_stop();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Sleeps out the interval on the condvar, returning true if a stop request
/// arrived before the deadline.
fn wait_until_due(shared: &Shared, interval: Duration) -> bool {
    let deadline = Instant::now() + interval;
    let mut stopped = shared.stopped.lock().expect("scheduler mutex poisoned");
    loop {
        if *stopped {
            return true;
        }
        let now = Instant::now();
        if now >= deadline {
            return false;
        }
        let (guard, _timeout) = shared
            .wakeup
            .wait_timeout(stopped, deadline - now)
            .expect("scheduler mutex poisoned");
        stopped = guard;
    }
}

fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn job_runs_once_per_interval() {
        let counter = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&counter);
        let scheduler = Scheduler::start(Duration::from_millis(10), move || {
            seen.fetch_add(1, Ordering::SeqCst);
        });
        std::thread::sleep(Duration::from_millis(120));
        scheduler.stop();
        assert!(counter.load(Ordering::SeqCst) >= 2);
    }

    #[test]
    fn stop_before_first_tick_runs_nothing() {
        let counter = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&counter);
        let scheduler = Scheduler::start(Duration::from_secs(3600), move || {
            seen.fetch_add(1, Ordering::SeqCst);
        });
        scheduler.stop();
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn last_tick_is_none_until_a_run_completes() {
        let scheduler = Scheduler::start(Duration::from_secs(3600), || {});
        assert!(scheduler.last_tick().is_none());
        scheduler.stop();
    }

    #[test]
    fn stop_returns_promptly_during_a_long_interval() {
        let scheduler = Scheduler::start(Duration::from_secs(3600), || {});
        let started = Instant::now();
        scheduler.stop();
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
