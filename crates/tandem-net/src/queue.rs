//! Inbound frame queue.
//!
//! The I/O task pushes, callers pop. A blocking consumer parks on a
//! [`Notify`] instead of polling.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::Notify;
use tokio::time::Instant;

use crate::frame::Frame;

/// FIFO of frames received from the peer.
#[derive(Debug, Default)]
pub struct FrameQueue {
    frames: Mutex<VecDeque<Frame>>,
    notify: Notify,
    closed: AtomicBool,
}

impl FrameQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn frames(&self) -> MutexGuard<'_, VecDeque<Frame>> {
        self.frames.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Enqueue a frame and wake one waiting consumer.
    pub fn push(&self, frame: Frame) {
        self.frames().push_back(frame);
        self.notify.notify_one();
    }

    /// Remove the oldest frame, if any. Never blocks.
    pub fn pop(&self) -> Option<Frame> {
        self.frames().pop_front()
    }

    /// Wait up to `timeout` for a frame.
    ///
    /// Returns `None` on timeout, or once the queue is closed and drained.
    pub async fn pop_wait(&self, timeout: Duration) -> Option<Frame> {
        let deadline = Instant::now() + timeout;
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(frame) = self.pop() {
                return Some(frame);
            }
            if self.is_closed() {
                return None;
            }
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return self.pop();
            }
        }
    }

    pub fn len(&self) -> usize {
        self.frames().len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames().is_empty()
    }

    /// Wake every waiter; later waits return immediately once drained.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}
