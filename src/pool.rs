// Copyright (c) 2025 Redglyph (@gmail.com). All Rights Reserved.

//! Object pool owned by a build or recognition session.
//!
//! Released objects are reset, then kept for the next acquisition. A [Pooled] guard returns
//! its object to the pool when it goes out of scope, on every exit path.

use std::collections::BTreeSet;
use std::ops::{Deref, DerefMut};

/// Clears an object before it's reused.
pub trait Reset {
    fn reset(&mut self);
}

impl<T> Reset for Vec<T> {
    fn reset(&mut self) {
        self.clear();
    }
}

impl<T> Reset for BTreeSet<T> {
    fn reset(&mut self) {
        self.clear();
    }
}

/// Usage statistics of a pool
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PoolStats {
    /// objects created because the pool was empty
    pub created: usize,
    /// objects taken from the pool
    pub reused: usize,
}

#[derive(Debug, Default)]
pub struct Pool<T> {
    free: Vec<T>,
    stats: PoolStats,
}

impl<T: Reset + Default> Pool<T> {
    pub fn new() -> Self {
        Pool { free: Vec::new(), stats: PoolStats::default() }
    }

    /// Takes an object from the pool, or creates one if the pool is empty.
    pub fn acquire(&mut self) -> T {
        match self.free.pop() {
            Some(obj) => {
                self.stats.reused += 1;
                obj
            }
            None => {
                self.stats.created += 1;
                T::default()
            }
        }
    }

    /// Resets the object and puts it back into the pool.
    pub fn release(&mut self, mut obj: T) {
        obj.reset();
        self.free.push(obj);
    }

    /// Acquires an object that is released automatically when the guard is dropped.
    pub fn scoped(&mut self) -> Pooled<'_, T> {
        let obj = self.acquire();
        Pooled { pool: self, obj: Some(obj) }
    }

    pub fn num_free(&self) -> usize {
        self.free.len()
    }

    pub fn get_stats(&self) -> PoolStats {
        self.stats
    }
}

/// Scoped object acquired from a [Pool].
pub struct Pooled<'a, T: Reset + Default> {
    pool: &'a mut Pool<T>,
    obj: Option<T>,
}

impl<T: Reset + Default> Pooled<'_, T> {
    /// Keeps the object instead of returning it to the pool.
    pub fn detach(mut self) -> T {
        self.obj.take().unwrap_or_default()
    }
}

impl<T: Reset + Default> Deref for Pooled<'_, T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        self.obj.as_ref().expect("pooled object used after detach")
    }
}

impl<T: Reset + Default> DerefMut for Pooled<'_, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.obj.as_mut().expect("pooled object used after detach")
    }
}

impl<T: Reset + Default> Drop for Pooled<'_, T> {
    fn drop(&mut self) {
        if let Some(obj) = self.obj.take() {
            self.pool.release(obj);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_release() {
        let mut pool = Pool::<Vec<u32>>::new();
        let mut v = pool.acquire();
        v.extend([1, 2, 3]);
        let cap = v.capacity();
        pool.release(v);
        assert_eq!(pool.num_free(), 1);
        let v = pool.acquire();
        assert!(v.is_empty());
        assert_eq!(v.capacity(), cap);
        assert_eq!(pool.get_stats(), PoolStats { created: 1, reused: 1 });
    }

    #[test]
    fn scoped() {
        let mut pool = Pool::<BTreeSet<usize>>::new();
        {
            let mut set = pool.scoped();
            set.insert(5);
            assert_eq!(set.len(), 1);
        }
        assert_eq!(pool.num_free(), 1);
        let kept = {
            let mut set = pool.scoped();
            set.insert(8);
            set.detach()
        };
        assert_eq!(kept.len(), 1);
        assert_eq!(pool.num_free(), 0);
        // early exit path
        let result: Result<(), ()> = (|| {
            let set = pool.scoped();
            if set.is_empty() { Err(())? }
            Ok(())
        })();
        assert!(result.is_err());
        assert_eq!(pool.num_free(), 1);
    }
}
