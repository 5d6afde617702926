// SPDX-License-Identifier: MIT OR Apache-2.0
//! Counting semaphore with strict FIFO hand-off.
//!
//! A release wakes the longest-waiting caller and hands it the permit
//! directly; only when nobody waits does the free permit count go up. Used
//! to bound how many asynchronous middleware bodies run at once.

use crate::error::ConcurrencyError;
use parking_lot::Mutex;
use std::collections::VecDeque;
use tokio::sync::oneshot;

#[derive(Debug)]
struct State {
    /// Free permits
    permits: usize,
    /// Permits currently handed out
    held: usize,
    /// Waiting callers, oldest first
    waiters: VecDeque<oneshot::Sender<()>>,
}

/// Counting semaphore
#[derive(Debug)]
pub struct Semaphore {
    state: Mutex<State>,
}

impl Semaphore {
    /// Create a semaphore with `permits` free permits
    pub fn new(permits: usize) -> Result<Self, ConcurrencyError> {
        if permits == 0 {
            return Err(ConcurrencyError::NoPermits);
        }
        Ok(Self {
            state: Mutex::new(State {
                permits,
                held: 0,
                waiters: VecDeque::new(),
            }),
        })
    }

    /// Take a permit, waiting in line if none is free
    pub async fn acquire(&self) {
        loop {
            let rx = {
                let mut state = self.state.lock();
                if state.permits > 0 && state.waiters.iter().all(oneshot::Sender::is_closed) {
                    state.permits -= 1;
                    state.held += 1;
                    return;
                }
                let (tx, rx) = oneshot::channel();
                state.waiters.push_back(tx);
                rx
            };

            let mut waiting = Waiting {
                semaphore: self,
                rx: Some(rx),
            };
            if let Some(rx) = waiting.rx.as_mut() {
                if rx.await.is_ok() {
                    waiting.rx = None;
                    return;
                }
            }
        }
    }

    /// Take a permit that is given back when the guard drops
    pub async fn permit(&self) -> SemaphorePermit<'_> {
        self.acquire().await;
        SemaphorePermit { semaphore: self }
    }

    /// Give a permit back, waking the oldest waiter if there is one
    pub fn release(&self) -> Result<(), ConcurrencyError> {
        let mut state = self.state.lock();
        if state.held == 0 {
            return Err(ConcurrencyError::UnbalancedRelease);
        }
        while let Some(waiter) = state.waiters.pop_front() {
            if waiter.send(()).is_ok() {
                return Ok(());
            }
        }
        state.held -= 1;
        state.permits += 1;
        Ok(())
    }

    /// Free permits right now
    pub fn available_permits(&self) -> usize {
        self.state.lock().permits
    }

    /// Callers currently waiting
    pub fn queue_length(&self) -> usize {
        self.state.lock().waiters.iter().filter(|w| !w.is_closed()).count()
    }
}

/// Returns a hand-off that raced with cancellation
struct Waiting<'a> {
    semaphore: &'a Semaphore,
    rx: Option<oneshot::Receiver<()>>,
}

impl Drop for Waiting<'_> {
    fn drop(&mut self) {
        if let Some(mut rx) = self.rx.take() {
            rx.close();
            if rx.try_recv().is_ok() {
                let _ = self.semaphore.release();
            }
        }
    }
}

/// RAII permit from [`Semaphore::permit`]
#[derive(Debug)]
pub struct SemaphorePermit<'a> {
    semaphore: &'a Semaphore,
}

impl Drop for SemaphorePermit<'_> {
    fn drop(&mut self) {
        let _ = self.semaphore.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_needs_a_permit() {
        assert_eq!(Semaphore::new(0).unwrap_err(), ConcurrencyError::NoPermits);
    }

    #[tokio::test]
    async fn test_acquire_and_release_counts() {
        let semaphore = Semaphore::new(2).unwrap();
        semaphore.acquire().await;
        assert_eq!(semaphore.available_permits(), 1);
        semaphore.release().unwrap();
        assert_eq!(semaphore.available_permits(), 2);
        assert_eq!(semaphore.release().unwrap_err(), ConcurrencyError::UnbalancedRelease);
    }

    #[tokio::test]
    async fn test_waiters_resolve_in_call_order() {
        let semaphore = Arc::new(Semaphore::new(1).unwrap());
        let order = Arc::new(Mutex::new(Vec::new()));
        semaphore.acquire().await;

        let mut tasks = Vec::new();
        for id in 1..=2 {
            let semaphore = Arc::clone(&semaphore);
            let order = Arc::clone(&order);
            tasks.push(tokio::spawn(async move {
                semaphore.acquire().await;
                order.lock().push(id);
                semaphore.release().unwrap();
            }));
            tokio::task::yield_now().await;
        }
        assert_eq!(semaphore.queue_length(), 2);
        assert_eq!(semaphore.available_permits(), 0);

        semaphore.release().unwrap();
        assert_eq!(semaphore.available_permits(), 0);
        for task in tasks {
            task.await.unwrap();
        }
        assert_eq!(*order.lock(), vec![1, 2]);
        assert_eq!(semaphore.available_permits(), 1);
        assert_eq!(semaphore.queue_length(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_waiter_is_skipped() {
        let semaphore = Semaphore::new(1).unwrap();
        semaphore.acquire().await;
        {
            let waiting = semaphore.acquire();
            tokio::pin!(waiting);
            assert!(futures::poll!(&mut waiting).is_pending());
            assert_eq!(semaphore.queue_length(), 1);
        }
        assert_eq!(semaphore.queue_length(), 0);
        semaphore.release().unwrap();
        assert_eq!(semaphore.available_permits(), 1);
    }

    #[tokio::test]
    async fn test_cancelled_after_wake_returns_permit() {
        let semaphore = Semaphore::new(1).unwrap();
        semaphore.acquire().await;
        {
            let waiting = semaphore.acquire();
            tokio::pin!(waiting);
            assert!(futures::poll!(&mut waiting).is_pending());
            semaphore.release().unwrap();
            assert_eq!(semaphore.available_permits(), 0);
        }
        assert_eq!(semaphore.available_permits(), 1);
        assert_eq!(semaphore.release().unwrap_err(), ConcurrencyError::UnbalancedRelease);
    }

    #[tokio::test]
    async fn test_permit_guard_releases() {
        let semaphore = Semaphore::new(1).unwrap();
        {
            let _permit = semaphore.permit().await;
            assert_eq!(semaphore.available_permits(), 0);
        }
        assert_eq!(semaphore.available_permits(), 1);
    }
}
