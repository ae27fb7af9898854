//! Background worker pool
//!
//! A small fixed pool for work that must not run on caller threads:
//! serializing the log after capture, decoding imports, writing files. Jobs
//! hand their result back through a one-shot channel; callers wait with a
//! timeout so a wedged job surfaces as an error instead of hanging the
//! engine.

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use parking_lot::Mutex;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, warn};

/// Default pool width
pub const DEFAULT_WORKER_THREADS: usize = 4;

type Job = Box<dyn FnOnce() + Send>;

/// Waitable result of a submitted job
pub struct JobHandle<T> {
    label: &'static str,
    rx: Receiver<T>,
}

impl<T> JobHandle<T> {
    /// Block up to `timeout` for the job's result.
    pub fn wait_timeout(self, timeout: Duration) -> crate::Result<T> {
        self.rx
            .recv_timeout(timeout)
            .map_err(|_| crate::Error::Timeout(self.label))
    }
}

/// Fixed-size pool of named worker threads
pub struct WorkerPool {
    tx: Mutex<Option<Sender<Job>>>,
    threads: Mutex<Vec<JoinHandle<()>>>,
}

impl WorkerPool {
    pub fn new(workers: usize) -> crate::Result<Self> {
        let (tx, rx) = unbounded::<Job>();
        let mut threads = Vec::with_capacity(workers);
        for i in 0..workers {
            let rx = rx.clone();
            threads.push(
                thread::Builder::new()
                    .name(format!("worker-{i}"))
                    .spawn(move || {
                        while let Ok(job) = rx.recv() {
                            job();
                        }
                    })?,
            );
        }
        debug!(workers, "worker pool started");
        Ok(Self {
            tx: Mutex::new(Some(tx)),
            threads: Mutex::new(threads),
        })
    }

    /// Queue `f` on the pool. The handle resolves when the job completes;
    /// dropping it detaches the job (fire and forget).
    pub fn submit<T, F>(&self, label: &'static str, f: F) -> JobHandle<T>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        let (result_tx, result_rx) = bounded(1);
        let job: Job = Box::new(move || {
            // the submitter may have stopped waiting
            let _ = result_tx.send(f());
        });
        if let Some(tx) = self.tx.lock().as_ref() {
            if tx.send(job).is_err() {
                warn!(label, "worker pool is shut down, job dropped");
            }
        } else {
            warn!(label, "worker pool is shut down, job dropped");
        }
        JobHandle {
            label,
            rx: result_rx,
        }
    }

    /// Finish queued jobs and join every worker. Idempotent.
    pub fn shutdown(&self) {
        let sender = self.tx.lock().take();
        drop(sender);
        for handle in self.threads.lock().drain(..) {
            if handle.join().is_err() {
                warn!("worker thread panicked");
            }
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}
