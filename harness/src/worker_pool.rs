//! Fixed-size worker pool for match execution.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use tracing::{debug, warn};

type Job = Box<dyn FnOnce() + Send + 'static>;

/// A fixed set of worker threads draining one task queue. Enqueuing after
/// shutdown is a no-op; shutdown drains everything already queued before
/// joining.
pub struct WorkerPool {
    workers: Vec<JoinHandle<()>>,
    sender: Option<Sender<Job>>,
}

impl WorkerPool {
    pub fn new(num_threads: usize) -> WorkerPool {
        let (sender, receiver) = mpsc::channel::<Job>();
        let receiver = Arc::new(Mutex::new(receiver));
        let workers = (0..num_threads.max(1))
            .map(|id| {
                let receiver: Arc<Mutex<Receiver<Job>>> = Arc::clone(&receiver);
                std::thread::spawn(move || {
                    debug!(worker = id, "worker started");
                    loop {
                        let job = receiver.lock().expect("mutex poisoning").recv();
                        match job {
                            Ok(job) => job(),
                            Err(_) => break, // queue closed and drained
                        }
                    }
                    debug!(worker = id, "worker exiting");
                })
            })
            .collect();
        WorkerPool { workers, sender: Some(sender) }
    }

    pub fn execute(&self, job: impl FnOnce() + Send + 'static) {
        match &self.sender {
            Some(sender) => {
                let _ = sender.send(Box::new(job));
            }
            None => warn!("task enqueued after shutdown, dropping it"),
        }
    }

    /// Close the queue, run everything still pending, and join the workers.
    pub fn shutdown(&mut self) {
        self.sender = None;
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}
