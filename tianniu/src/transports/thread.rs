use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{sync_channel, SyncSender, TrySendError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tianniu_core::tianniu_debug;

const RETRY_INTERVAL: Duration = Duration::from_millis(10);

enum Task<J> {
    Deliver(J),
    Flush(SyncSender<()>),
    Shutdown,
}

/// A worker thread running deliveries on a current-thread tokio runtime.
///
/// The queue is bounded; once it is full further jobs are rejected instead
/// of blocking the caller.
pub struct TransportThread<J> {
    sender: SyncSender<Task<J>>,
    shutdown: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl<J: Send + 'static> TransportThread<J> {
    pub fn new<DeliverFn, DeliverFuture>(mut deliver: DeliverFn) -> Self
    where
        DeliverFn: FnMut(J) -> DeliverFuture + Send + 'static,
        DeliverFuture: Future<Output = ()>,
    {
        let (sender, receiver) = sync_channel(30);
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_worker = shutdown.clone();
        let handle = thread::Builder::new()
            .name("tianniu-transport".into())
            .spawn(move || {
                // create a runtime on the transport thread
                let rt = match tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                {
                    Ok(rt) => rt,
                    Err(err) => {
                        tianniu_debug!("[TransportThread] failed to start runtime: {}", err);
                        return;
                    }
                };

                // and block on an async fn in this runtime/thread
                rt.block_on(async move {
                    for task in receiver.into_iter() {
                        if shutdown_worker.load(Ordering::SeqCst) {
                            return;
                        }
                        match task {
                            Task::Deliver(job) => deliver(job).await,
                            Task::Flush(sender) => {
                                sender.send(()).ok();
                            }
                            Task::Shutdown => return,
                        }
                    }
                })
            })
            .map_err(|err| {
                tianniu_debug!("[TransportThread] failed to spawn worker: {}", err);
            })
            .ok();

        Self {
            sender,
            shutdown,
            handle,
        }
    }

    /// Queues a job, returning `false` if the queue is full or the worker
    /// is gone.
    pub fn try_send(&self, job: J) -> bool {
        if self.shutdown.load(Ordering::SeqCst) {
            return false;
        }
        match self.sender.try_send(Task::Deliver(job)) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                tianniu_debug!("[TransportThread] queue is full, rejecting delivery");
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }

    /// Waits until every job queued so far was delivered.
    ///
    /// Never blocks longer than `timeout`, even if the queue is full.
    pub fn flush(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let (sender, receiver) = sync_channel(1);
        let mut task = Task::Flush(sender);
        loop {
            match self.sender.try_send(task) {
                Ok(()) => break,
                Err(TrySendError::Full(rejected)) => {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    if remaining.is_zero() {
                        return false;
                    }
                    thread::sleep(remaining.min(RETRY_INTERVAL));
                    task = rejected;
                }
                Err(TrySendError::Disconnected(_)) => return false,
            }
        }
        receiver
            .recv_timeout(deadline.saturating_duration_since(Instant::now()))
            .is_ok()
    }

    /// Drains the queue and stops accepting jobs.
    pub fn shutdown(&self, timeout: Duration) -> bool {
        let flushed = self.flush(timeout);
        self.shutdown.store(true, Ordering::SeqCst);
        flushed
    }
}

// Jobs still queued are discarded; the worker only finishes the one in flight.
impl<J> Drop for TransportThread<J> {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
        let _ = self.sender.try_send(Task::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::AtomicUsize;
    use std::sync::mpsc::channel;

    #[test]
    fn test_flush_waits_for_queued_jobs() {
        let delivered = Arc::new(AtomicUsize::new(0));
        let thread = TransportThread::new({
            let delivered = delivered.clone();
            move |_job: u32| {
                delivered.fetch_add(1, Ordering::SeqCst);
                async {}
            }
        });

        assert!(thread.try_send(1));
        assert!(thread.try_send(2));
        assert!(thread.flush(Duration::from_secs(5)));
        assert_eq!(delivered.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_flush_respects_timeout_with_full_queue() {
        let (release, gate) = channel::<()>();
        let thread = TransportThread::new(move |_job: u32| {
            // blocks the worker until the test lets go
            let _ = gate.recv();
            async {}
        });

        let mut queued = 0;
        while queued < 100 && thread.try_send(queued) {
            queued += 1;
        }
        assert!(queued < 100);

        let started = Instant::now();
        assert!(!thread.flush(Duration::from_millis(100)));
        let elapsed = started.elapsed();
        assert!(elapsed < Duration::from_millis(500), "flush took {:?}", elapsed);

        drop(release);
        drop(thread);
    }

    #[test]
    fn test_shutdown_rejects_jobs() {
        let thread = TransportThread::new(|_job: u32| async {});
        assert!(thread.shutdown(Duration::from_secs(5)));
        assert!(!thread.try_send(1));
    }
}
