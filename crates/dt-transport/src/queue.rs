//! The two bounded FIFO queues that are the *only* thing crossing the
//! controller/transport thread boundary: the controller reads
//! [`ActionQueue`] and writes [`SignalQueue`]; the transport task does the
//! opposite. Both are backed by a plain [`std::sync::mpsc::sync_channel`] —
//! cheap to share as an `Arc`, safe to poll from a blocking OS thread
//! (the controller) and from an async task via `spawn_blocking` (the
//! transport side, see `server.rs`).

use std::sync::mpsc::{self, Receiver, SyncSender, TryRecvError, TrySendError};
use std::sync::Mutex;
use std::time::Duration;

/// Default bound for both queues: beyond this, a put fails rather than
/// blocking the caller indefinitely.
pub const DEFAULT_CAPACITY: usize = 1000;

/// A bounded multi-producer, single-consumer FIFO queue.
///
/// Wrapped in a `Mutex` on the receive side purely so the queue can be
/// shared behind a single `Arc` with no split ownership — there is only
/// ever one logical consumer (the controller for actions, the transport's
/// broadcast loop for signals), so the lock is never contended.
pub struct BoundedQueue<T> {
    sender: SyncSender<T>,
    receiver: Mutex<Receiver<T>>,
}

/// A put failed because the queue is at capacity; overflow surfaces as an
/// error signal rather than blocking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueFull;

impl<T> BoundedQueue<T> {
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = mpsc::sync_channel(capacity.max(1));
        Self { sender, receiver: Mutex::new(receiver) }
    }

    /// Non-blocking put. The only put this system ever performs — both
    /// sides push and move on rather than waiting for room.
    pub fn try_push(&self, item: T) -> Result<(), QueueFull> {
        self.sender.try_send(item).map_err(|e| match e {
            TrySendError::Full(_) => QueueFull,
            TrySendError::Disconnected(_) => QueueFull,
        })
    }

    /// Non-blocking get — used by the controller to drain pending actions
    /// without ever stalling the tick loop.
    pub fn try_pop(&self) -> Option<T> {
        let rx = self.receiver.lock().expect("queue receiver mutex poisoned");
        match rx.try_recv() {
            Ok(item) => Some(item),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Drain everything currently queued, in FIFO order.
    pub fn drain(&self) -> Vec<T> {
        let mut out = Vec::new();
        while let Some(item) = self.try_pop() {
            out.push(item);
        }
        out
    }

    /// Blocking get with a timeout — the transport side's only suspension
    /// point while waiting for the controller to produce a signal.
    pub fn pop_timeout(&self, timeout: Duration) -> Option<T> {
        let rx = self.receiver.lock().expect("queue receiver mutex poisoned");
        rx.recv_timeout(timeout).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_then_pop_preserves_fifo_order() {
        let q: BoundedQueue<i32> = BoundedQueue::new(4);
        q.try_push(1).unwrap();
        q.try_push(2).unwrap();
        q.try_push(3).unwrap();
        assert_eq!(q.drain(), vec![1, 2, 3]);
    }

    #[test]
    fn push_beyond_capacity_reports_queue_full() {
        let q: BoundedQueue<i32> = BoundedQueue::new(2);
        q.try_push(1).unwrap();
        q.try_push(2).unwrap();
        assert_eq!(q.try_push(3), Err(QueueFull));
    }

    #[test]
    fn pop_on_empty_queue_returns_none_without_blocking() {
        let q: BoundedQueue<i32> = BoundedQueue::new(4);
        assert_eq!(q.try_pop(), None);
    }

    #[test]
    fn pop_timeout_returns_none_when_nothing_arrives() {
        let q: BoundedQueue<i32> = BoundedQueue::new(4);
        assert_eq!(q.pop_timeout(Duration::from_millis(10)), None);
    }
}
