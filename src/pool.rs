//! Bounded worker pool for independent blocking jobs.
//!
//! This is the one genuinely multi-threaded component in the crate. It must not be used to
//! run the cooperative state machines in [`crate::http`] or [`crate::scheduler`] — those
//! are single-threaded by design. It exists so an application embedding the cooperative
//! loop has somewhere to push blocking work (file I/O, DNS lookups, hashing) without
//! stalling a tick.

use std::{
    sync::{Arc, Condvar, Mutex},
    thread::JoinHandle,
};

use crossbeam_channel::{Receiver, Sender};
use log::debug;

type Job = Box<dyn FnOnce() + Send + 'static>;

struct PendingCount {
    count: Mutex<usize>,
    drained: Condvar,
}

/// A fixed set of OS worker threads consuming a shared FIFO job queue.
///
/// Workers block on the queue until a job arrives. Shutdown is cooperative: the queue is
/// disconnected, workers finish whatever is already queued and exit, and every worker
/// thread is joined. Dropping the pool shuts it down.
pub struct ThreadPool {
    sender: Option<Sender<Job>>,
    workers: Vec<JoinHandle<()>>,
    pending: Arc<PendingCount>,
}
impl ThreadPool {
    /// Spawn a pool of `threads` workers. A pool smaller than two threads is rounded up.
    pub fn new(threads: usize) -> Self {
        let threads = threads.max(2);
        let (sender, receiver) = crossbeam_channel::unbounded::<Job>();
        let pending = Arc::new(PendingCount {
            count: Mutex::new(0),
            drained: Condvar::new(),
        });
        let mut workers = Vec::with_capacity(threads);
        for index in 0..threads {
            let receiver: Receiver<Job> = receiver.clone();
            let pending = Arc::clone(&pending);
            workers.push(
                std::thread::Builder::new()
                    .name(format!("pool-worker-{index}"))
                    .spawn(move || {
                        while let Ok(job) = receiver.recv() {
                            job();
                            let mut count =
                                pending.count.lock().expect("pending count poisoned");
                            *count -= 1;
                            if *count == 0 {
                                pending.drained.notify_all();
                            }
                        }
                    })
                    .expect("failed to spawn pool worker"),
            );
        }
        Self {
            sender: Some(sender),
            workers,
            pending,
        }
    }

    /// Enqueue a job. Jobs run in FIFO order across the worker set.
    ///
    /// Returns `false` when the pool has already been shut down.
    pub fn execute<F>(&self, job: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        let Some(sender) = &self.sender else {
            return false;
        };
        {
            let mut count = self.pending.count.lock().expect("pending count poisoned");
            *count += 1;
        }
        if sender.send(Box::new(job)).is_err() {
            let mut count = self.pending.count.lock().expect("pending count poisoned");
            *count -= 1;
            return false;
        }
        true
    }

    /// Block until every queued and running job has finished.
    pub fn wait_idle(&self) {
        let mut count = self.pending.count.lock().expect("pending count poisoned");
        while *count > 0 {
            count = self
                .pending
                .drained
                .wait(count)
                .expect("pending count poisoned");
        }
    }

    /// Disconnect the queue, let workers drain it, and join every worker thread.
    ///
    /// Idempotent; also performed on drop.
    pub fn shutdown(&mut self) {
        if self.sender.take().is_none() {
            return;
        }
        debug!("thread pool shutting down, joining {} workers", self.workers.len());
        for worker in self.workers.drain(..) {
            worker.join().ok();
        }
    }

    /// Number of worker threads.
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }
}
impl Drop for ThreadPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}
impl std::fmt::Debug for ThreadPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadPool")
            .field("workers", &self.workers.len())
            .field("running", &self.sender.is_some())
            .finish()
    }
}
