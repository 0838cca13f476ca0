// SPDX-License-Identifier: GPL-3.0-only

//! Serial work queue
//!
//! A dedicated thread owns a context value and runs submitted jobs against it
//! one at a time, in submission order. Jobs may block (a permission prompt
//! does); everything queued behind them waits.
//!
//! ```text
//! caller ──run/dispatch──► mpsc ──► [queue thread] ──job(&mut C)──► oneshot ──► caller
//! ```

use std::marker::PhantomData;
use tokio::sync::mpsc;
use tracing::debug;

type Job<C> = Box<dyn FnOnce(&mut C) + Send>;

/// Handle to a serial queue owning a `C`
///
/// The worker exits once every handle is dropped and the queued jobs have run.
pub struct SessionQueue<C> {
    sender: mpsc::UnboundedSender<Job<C>>,
}

impl<C: Send + 'static> SessionQueue<C> {
    /// Spawn the worker thread
    pub fn spawn(name: &str, mut context: C) -> std::io::Result<Self> {
        let (sender, mut receiver) = mpsc::unbounded_channel::<Job<C>>();
        let thread_name = name.to_string();

        std::thread::Builder::new()
            .name(thread_name.clone())
            .spawn(move || {
                debug!(queue = %thread_name, "Queue started");
                while let Some(job) = receiver.blocking_recv() {
                    job(&mut context);
                }
                debug!(queue = %thread_name, "Queue stopped");
            })?;

        Ok(Self { sender })
    }

    /// Queue a job without waiting for it
    ///
    /// Returns false if the worker is gone.
    pub fn dispatch(&self, job: impl FnOnce(&mut C) + Send + 'static) -> bool {
        self.sender.send(Box::new(job)).is_ok()
    }

    /// Queue a job and wait for its result
    ///
    /// Returns `None` if the worker exited before running the job.
    pub async fn run<R>(&self, job: impl FnOnce(&mut C) -> R + Send + 'static) -> Option<R>
    where
        R: Send + 'static,
    {
        let (sender, receiver) = futures::channel::oneshot::channel();
        let queued = self.dispatch(move |context| {
            let _ = sender.send(job(context));
        });
        if !queued {
            return None;
        }
        receiver.await.ok()
    }

    /// A handle that does not keep the worker alive
    pub fn downgrade(&self) -> WeakSessionQueue<C> {
        WeakSessionQueue {
            sender: self.sender.downgrade(),
            _context: PhantomData,
        }
    }
}

impl<C> Clone for SessionQueue<C> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

/// Non-owning queue handle
pub struct WeakSessionQueue<C> {
    sender: mpsc::WeakUnboundedSender<Job<C>>,
    _context: PhantomData<fn(C)>,
}

impl<C> WeakSessionQueue<C> {
    /// The queue, if it is still alive
    pub fn upgrade(&self) -> Option<SessionQueue<C>> {
        self.sender.upgrade().map(|sender| SessionQueue { sender })
    }
}

impl<C> Clone for WeakSessionQueue<C> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            _context: PhantomData,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn jobs_run_in_submission_order() {
        let queue = SessionQueue::spawn("test-order", Vec::<u32>::new()).unwrap();

        for i in 0..50 {
            queue.dispatch(move |log| log.push(i));
        }
        let log = queue.run(|log| log.clone()).await.unwrap();

        assert_eq!(log, (0..50).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn jobs_run_on_named_thread() {
        let queue = SessionQueue::spawn("test-named", ()).unwrap();
        let name = queue
            .run(|_| std::thread::current().name().map(str::to_string))
            .await
            .unwrap();
        assert_eq!(name.as_deref(), Some("test-named"));
    }

    #[tokio::test]
    async fn blocking_job_holds_back_later_jobs() {
        let queue = SessionQueue::spawn("test-block", 0u32).unwrap();
        let (release, gate) = std::sync::mpsc::channel::<()>();

        queue.dispatch(move |value| {
            let _ = gate.recv();
            *value = 1;
        });
        let pending = queue.run(|value| *value);
        tokio::pin!(pending);

        assert!(
            tokio::time::timeout(Duration::from_millis(50), &mut pending)
                .await
                .is_err()
        );

        release.send(()).unwrap();
        assert_eq!(pending.await, Some(1));
    }

    #[tokio::test]
    async fn weak_handle_does_not_keep_queue_alive() {
        let queue = SessionQueue::spawn("test-weak", ()).unwrap();
        let weak = queue.downgrade();

        assert!(weak.upgrade().is_some());
        drop(queue);
        assert!(weak.upgrade().is_none());
    }
}
