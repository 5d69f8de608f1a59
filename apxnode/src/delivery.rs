//! Delivery of output change announcements to the transport
//!
//! A node announces a port span once per `Clean -> Dirty` transition. Transports that react
//! to callbacks use [`Push`]; transports that poll use a [`WriteQueue`]. A pair `(A, B)`
//! delivers to both.
//!
//! Delivery runs on the writer's execution context right after the output lock is released.
//! Implementations must not block and must not assume exclusive access to the output data.

use core::cell::RefCell;
use core::future::poll_fn;
use core::task::{Context, Poll};
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::waitqueue::WakerRegistration;
use heapless::Deque;

use crate::core::PortSpan;

pub trait Delivery {
    fn deliver(&self, span: PortSpan);

    /// Number of announcements the sink can hold without being drained.
    /// `None` for sinks that do not buffer.
    fn capacity(&self) -> Option<usize> {
        None
    }

    /// Drops announcements that are still pending. Called when the output reopens and every
    /// port returns to `Clean`.
    fn reset(&self) {}
}

/// Synchronous push delivery
///
/// ```
/// use apxnode::delivery::{Delivery, Push};
/// use apxnode::core::PortSpan;
///
/// let sink = Push(|span: PortSpan| assert_eq!(span.len, 8));
/// sink.deliver(PortSpan::new(0, 8));
/// ```
pub struct Push<F: Fn(PortSpan)>(pub F);

impl<F: Fn(PortSpan)> Delivery for Push<F> {
    fn deliver(&self, span: PortSpan) {
        (self.0)(span);
    }
}

impl<T: Delivery + ?Sized> Delivery for &T {
    fn deliver(&self, span: PortSpan) {
        (**self).deliver(span);
    }

    fn capacity(&self) -> Option<usize> {
        (**self).capacity()
    }

    fn reset(&self) {
        (**self).reset();
    }
}

impl<A: Delivery, B: Delivery> Delivery for (A, B) {
    fn deliver(&self, span: PortSpan) {
        self.0.deliver(span);
        self.1.deliver(span);
    }

    fn capacity(&self) -> Option<usize> {
        match (self.0.capacity(), self.1.capacity()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    fn reset(&self) {
        self.0.reset();
        self.1.reset();
    }
}

/// Bounded write command queue for polling transports
///
/// Capacity `N` must be at least the number of provide ports; the node checks this on
/// construction. As long as the transport pops a command before it acknowledges the port,
/// every port has at most one pending command and the queue never overflows.
pub struct WriteQueue<M: RawMutex, const N: usize>(Mutex<M, RefCell<Inner<N>>>);

struct Inner<const N: usize> {
    queue: Deque<PortSpan, N>,
    waker: WakerRegistration,
}

impl<M: RawMutex, const N: usize> WriteQueue<M, N> {
    pub const fn new() -> Self {
        Self(Mutex::new(RefCell::new(Inner {
            queue: Deque::new(),
            waker: WakerRegistration::new(),
        })))
    }

    pub fn try_pop(&self) -> Option<PortSpan> {
        self.0.lock(|cell| cell.borrow_mut().queue.pop_front())
    }

    pub fn poll_pop(&self, cx: &mut Context<'_>) -> Poll<PortSpan> {
        self.0.lock(|cell| {
            let mut inner = cell.borrow_mut();
            match inner.queue.pop_front() {
                Some(span) => Poll::Ready(span),
                None => {
                    inner.waker.register(cx.waker());
                    Poll::Pending
                }
            }
        })
    }

    /// Asynchronously fetches the next write command. Safe to drop.
    pub async fn pop(&self) -> PortSpan {
        poll_fn(|cx| self.poll_pop(cx)).await
    }

    pub fn len(&self) -> usize {
        self.0.lock(|cell| cell.borrow().queue.len())
    }

    pub fn is_empty(&self) -> bool {
        self.0.lock(|cell| cell.borrow().queue.is_empty())
    }

    /// Drops all pending commands, e.g. when the transport reopens and sends a full image.
    pub fn clear(&self) {
        self.0.lock(|cell| cell.borrow_mut().queue.clear())
    }
}

impl<M: RawMutex, const N: usize> Default for WriteQueue<M, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: RawMutex, const N: usize> Delivery for WriteQueue<M, N> {
    fn deliver(&self, span: PortSpan) {
        self.0.lock(|cell| {
            let mut inner = cell.borrow_mut();
            if inner.queue.push_back(span).is_err() {
                error!(
                    "write queue overflow, dropped offset={} len={}",
                    span.offset, span.len
                );
                return;
            }
            inner.waker.wake();
        })
    }

    fn capacity(&self) -> Option<usize> {
        Some(N)
    }

    fn reset(&self) {
        self.clear();
    }
}
