//! Object Pools
//!
//! Server-owned free-lists that keep the per-tick hot path allocation-free:
//! collision-response records and scratch id buffers are recycled instead of
//! reallocated. Pools are plain instance state, never process-wide globals.
//!
//! Acquisition hands out an RAII [`Lease`]; the leased object returns to the
//! pool when the lease drops, on every exit path including early returns.
//! Popping from an empty pool allocates a fresh object and never fails;
//! releasing beyond capacity drops the object instead of growing the pool.

use core::cell::{Cell, RefCell};
use core::ops::{Deref, DerefMut};

/// Objects that can live in a [`Pool`]: constructible when the free-list is
/// empty, and resettable to a blank state on release.
pub trait Recycle: Default {
    /// Restore the blank state (called when a lease returns to the pool).
    fn recycle(&mut self);
}

impl<T> Recycle for Vec<T> {
    #[inline]
    fn recycle(&mut self) {
        self.clear();
    }
}

/// Fixed-capacity free-list of reusable objects.
pub struct Pool<T: Recycle> {
    free: RefCell<Vec<T>>,
    capacity: usize,
    outstanding: Cell<usize>,
}

impl<T: Recycle> Pool<T> {
    /// Create a pool that retains at most `capacity` released objects.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            free: RefCell::new(Vec::with_capacity(capacity)),
            capacity,
            outstanding: Cell::new(0),
        }
    }

    /// Borrow an object from the pool (allocating if the free-list is empty).
    #[must_use]
    pub fn acquire(&self) -> Lease<'_, T> {
        let value = self.free.borrow_mut().pop().unwrap_or_default();
        self.outstanding.set(self.outstanding.get() + 1);
        Lease {
            pool: self,
            value: Some(value),
        }
    }

    /// Number of leases currently alive.
    #[inline]
    #[must_use]
    pub fn outstanding(&self) -> usize {
        self.outstanding.get()
    }

    /// Number of objects resting in the free-list.
    #[inline]
    #[must_use]
    pub fn pooled(&self) -> usize {
        self.free.borrow().len()
    }
}

/// RAII borrow of a pooled object; returns it on drop.
pub struct Lease<'a, T: Recycle> {
    pool: &'a Pool<T>,
    value: Option<T>,
}

impl<T: Recycle> Deref for Lease<'_, T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        self.value.as_ref().expect("lease value taken before drop")
    }
}

impl<T: Recycle> DerefMut for Lease<'_, T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut T {
        self.value.as_mut().expect("lease value taken before drop")
    }
}

impl<T: Recycle> Drop for Lease<'_, T> {
    fn drop(&mut self) {
        if let Some(mut value) = self.value.take() {
            value.recycle();
            let mut free = self.pool.free.borrow_mut();
            if free.len() < self.pool.capacity {
                free.push(value);
            }
            self.pool.outstanding.set(self.pool.outstanding.get() - 1);
        }
    }
}
