//! Bounded pool of reusable resources
//!
//! The pool is a counting semaphore with the resources themselves attached:
//! every resource is created up front, handed out through an RAII guard and
//! returned when the guard drops. A blocked caller sleeps until a resource
//! comes back, the pool closes, its token is cancelled or its deadline
//! passes; nothing wakes it periodically.

use crate::{
    cancel::CancelToken,
    error::{EngineError, Result, Stage},
};
use parking_lot::{Condvar, Mutex};
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

/// A resource that needs explicit teardown
pub trait Resource: Send + 'static {
    /// Release whatever the resource holds
    fn destroy(self) -> Result<()>;
}

#[derive(Debug)]
struct PoolState<T> {
    available: Vec<T>,
    closed: bool,
}

#[derive(Debug)]
struct Gate<T> {
    state: Mutex<PoolState<T>>,
    ready: Condvar,
}

impl<T> Gate<T> {
    // Taking the lock orders the notify after a waiter that already checked
    // its token has started waiting.
    fn wake_all(&self) {
        drop(self.state.lock());
        self.ready.notify_all();
    }
}

/// Fixed-capacity pool of resources
#[derive(Debug)]
pub struct ResourcePool<T: Resource> {
    gate: Arc<Gate<T>>,
    capacity: usize,
}

impl<T: Resource> ResourcePool<T> {
    /// Create `capacity` resources up front (at least one)
    ///
    /// `create` receives the index of the resource being built. If any call
    /// fails, the resources built so far are destroyed and the error is
    /// returned.
    pub fn new<F>(capacity: usize, mut create: F) -> Result<Self>
    where
        F: FnMut(usize) -> Result<T>,
    {
        let capacity = capacity.max(1);
        let mut available = Vec::with_capacity(capacity);

        for index in 0..capacity {
            match create(index) {
                Ok(item) => available.push(item),
                Err(err) => {
                    for item in available.drain(..) {
                        if let Err(destroy_err) = item.destroy() {
                            log::warn!("failed to destroy pooled resource: {destroy_err}");
                        }
                    }
                    return Err(err.in_stage(Stage::Construct));
                }
            }
        }

        log::debug!("resource pool ready with {capacity} entries");
        Ok(Self {
            gate: Arc::new(Gate {
                state: Mutex::new(PoolState {
                    available,
                    closed: false,
                }),
                ready: Condvar::new(),
            }),
            capacity,
        })
    }

    /// Number of resources the pool was built with
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Resources currently waiting in the pool
    pub fn available(&self) -> usize {
        self.gate.state.lock().available.len()
    }

    /// Whether [`close`](Self::close) has been called
    pub fn is_closed(&self) -> bool {
        self.gate.state.lock().closed
    }

    /// Take a resource, blocking until one is free
    ///
    /// Fails with [`EngineError::PoolClosed`] once the pool is closed, or
    /// with the token's error if it fires first. A failed acquire never
    /// takes a resource.
    pub fn acquire(&self, cancel: &CancelToken) -> Result<Pooled<'_, T>> {
        let gate = Arc::downgrade(&self.gate);
        let _waker = cancel.on_cancel(move || {
            if let Some(gate) = gate.upgrade() {
                gate.wake_all();
            }
        });

        let mut state = self.gate.state.lock();
        loop {
            if state.closed {
                return Err(EngineError::PoolClosed);
            }
            cancel.check()?;

            if let Some(item) = state.available.pop() {
                return Ok(Pooled {
                    pool: self,
                    item: Some(item),
                });
            }

            match cancel.deadline() {
                Some(deadline) => {
                    self.gate.ready.wait_until(&mut state, deadline);
                }
                None => self.gate.ready.wait(&mut state),
            }
        }
    }

    /// Return a resource to the pool
    ///
    /// The resource is destroyed instead if the pool is closed or already
    /// holds `capacity` resources.
    pub fn release(&self, item: T) {
        let mut state = self.gate.state.lock();
        if state.closed || state.available.len() >= self.capacity {
            drop(state);
            if let Err(err) = item.destroy() {
                log::warn!("failed to destroy released resource: {err}");
            }
            return;
        }

        state.available.push(item);
        drop(state);
        self.gate.ready.notify_one();
    }

    /// Close the pool and destroy every idle resource
    ///
    /// Checked-out resources are destroyed when they come back. Only the
    /// first call does any work; the first destroy failure is returned.
    pub fn close(&self) -> Result<()> {
        let drained = {
            let mut state = self.gate.state.lock();
            if state.closed {
                return Ok(());
            }
            state.closed = true;
            std::mem::take(&mut state.available)
        };
        self.gate.ready.notify_all();

        let mut first_error = None;
        for item in drained {
            if let Err(err) = item.destroy() {
                log::warn!("failed to destroy pooled resource: {err}");
                first_error.get_or_insert(err);
            }
        }
        log::debug!("resource pool closed");

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl<T: Resource> Drop for ResourcePool<T> {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            log::warn!("error closing resource pool on drop: {err}");
        }
    }
}

/// A resource checked out of a [`ResourcePool`]
///
/// Returned to the pool on drop.
#[derive(Debug)]
pub struct Pooled<'a, T: Resource> {
    pool: &'a ResourcePool<T>,
    item: Option<T>,
}

impl<T: Resource> Pooled<'_, T> {
    /// Detach the resource; the caller must hand it back with
    /// [`ResourcePool::release`]
    pub fn into_inner(mut self) -> T {
        match self.item.take() {
            Some(item) => item,
            None => unreachable!("pooled resource already taken"),
        }
    }
}

impl<T: Resource> Deref for Pooled<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        match &self.item {
            Some(item) => item,
            None => unreachable!("pooled resource already taken"),
        }
    }
}

impl<T: Resource> DerefMut for Pooled<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        match &mut self.item {
            Some(item) => item,
            None => unreachable!("pooled resource already taken"),
        }
    }
}

impl<T: Resource> Drop for Pooled<'_, T> {
    fn drop(&mut self) {
        if let Some(item) = self.item.take() {
            self.pool.release(item);
        }
    }
}
