//! Reply dispatch workers
//!
//! A fixed pool of threads on which every call outcome is delivered. A job
//! carrying a thread-affinity hint always lands on the same worker (hint
//! modulo pool size), which gives callers ordering and locality when they
//! want it; unhinted jobs round-robin across the pool.
//!
//! Completions never run on the caller's thread or on a connection's reader
//! thread, so issuing a call never blocks on user code and a slow callback
//! cannot stall reply decoding.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use crossbeam::channel::{unbounded, Sender};

use crate::error::Result;

/// A unit of completion work
pub(crate) type Job = Box<dyn FnOnce() + Send + 'static>;

/// Handle to the reply-dispatch pool; cheap to clone, threads exit when the
/// last clone is dropped
#[derive(Clone)]
pub(crate) struct ReplyPool {
    inner: Arc<PoolInner>,
}

struct PoolInner {
    senders: Vec<Sender<Job>>,
    next: AtomicUsize,
}

impl ReplyPool {
    /// Spawn `workers` dispatch threads (at least one)
    pub fn new(workers: usize) -> Result<Self> {
        let workers = workers.max(1);
        let mut senders = Vec::with_capacity(workers);

        for i in 0..workers {
            let (tx, rx) = unbounded::<Job>();
            senders.push(tx);

            thread::Builder::new()
                .name(format!("courier-reply-{}", i))
                .spawn(move || {
                    for job in rx {
                        job();
                    }
                })?;
        }

        Ok(Self {
            inner: Arc::new(PoolInner {
                senders,
                next: AtomicUsize::new(0),
            }),
        })
    }

    /// Number of worker threads
    pub fn len(&self) -> usize {
        self.inner.senders.len()
    }

    /// Run a job on a pool thread
    ///
    /// `hint` pins the job to worker `hint % len`; `None` round-robins.
    pub fn dispatch(&self, hint: Option<u64>, job: Job) {
        let n = self.inner.senders.len();
        let idx = match hint {
            Some(h) => (h % n as u64) as usize,
            None => self.inner.next.fetch_add(1, Ordering::Relaxed) % n,
        };

        if self.inner.senders[idx].send(job).is_err() {
            // Only possible if the worker died from a panicking callback
            tracing::error!("Reply worker {} is gone; completion dropped", idx);
        }
    }
}
