//! Pool of reusable class emitters.
//!
//! Emitting many types in one pass would otherwise allocate fresh buffers and
//! pools for each. The pool keeps a fixed number of emitters and hands them
//! out as owned [`PooledEmitter`] handles; releasing a handle consumes it, so
//! a released emitter cannot be used again by the caller. When every slot is
//! checked out, `acquire` returns an emitter that is not backed by the pool
//! and is simply dropped on release.

use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicUsize, Ordering};

use super::class_writer::ClassEmitter;
use super::options::EmitOptions;

static NEXT_POOL_ID: AtomicUsize = AtomicUsize::new(0);

#[derive(Debug)]
enum Slot {
    /// Never allocated
    Empty,
    /// Allocated and waiting to be reused
    Free(ClassEmitter),
    /// Checked out
    InUse,
}

/// Which pool slot a handle came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Origin {
    pool: usize,
    slot: usize,
}

/// An emitter checked out of an [`EmitterPool`].
#[derive(Debug)]
pub struct PooledEmitter {
    emitter: ClassEmitter,
    origin: Option<Origin>,
}

impl PooledEmitter {
    /// Whether this emitter returns to a pool slot on release.
    pub fn is_pooled(&self) -> bool {
        self.origin.is_some()
    }
}

impl Deref for PooledEmitter {
    type Target = ClassEmitter;

    fn deref(&self) -> &ClassEmitter {
        &self.emitter
    }
}

impl DerefMut for PooledEmitter {
    fn deref_mut(&mut self) -> &mut ClassEmitter {
        &mut self.emitter
    }
}

/// Fixed-capacity set of reusable emitters.
///
/// Acquire and release take `&mut self`; a driver emitting types on several
/// threads needs one pool per worker or a lock around the pool.
#[derive(Debug)]
pub struct EmitterPool {
    id: usize,
    options: EmitOptions,
    slots: Vec<Slot>,
}

impl EmitterPool {
    /// Create a pool with `options.pool_size()` slots, allocated lazily.
    pub fn new(options: EmitOptions) -> Self {
        let slots = (0..options.pool_size()).map(|_| Slot::Empty).collect();
        Self {
            id: NEXT_POOL_ID.fetch_add(1, Ordering::Relaxed),
            options,
            slots,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of pooled emitters currently checked out.
    pub fn in_use(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| matches!(s, Slot::InUse))
            .count()
    }

    /// Check out an emitter, reusing a free slot when there is one.
    pub fn acquire(&mut self) -> PooledEmitter {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            let emitter = match std::mem::replace(slot, Slot::InUse) {
                Slot::Free(mut emitter) => {
                    emitter.reset();
                    emitter
                }
                Slot::Empty => ClassEmitter::new(self.options.clone()),
                Slot::InUse => continue,
            };
            log::trace!("emitter pool {}: slot {index} acquired", self.id);
            return PooledEmitter {
                emitter,
                origin: Some(Origin {
                    pool: self.id,
                    slot: index,
                }),
            };
        }
        log::debug!(
            "emitter pool {} exhausted ({} slots), allocating",
            self.id,
            self.slots.len()
        );
        PooledEmitter {
            emitter: ClassEmitter::new(self.options.clone()),
            origin: None,
        }
    }

    /// Return an emitter. Emitters from outside this pool are dropped.
    pub fn release(&mut self, handle: PooledEmitter) {
        let Some(origin) = handle.origin else {
            return;
        };
        if origin.pool != self.id {
            return;
        }
        if let Some(slot) = self.slots.get_mut(origin.slot)
            && matches!(slot, Slot::InUse)
        {
            *slot = Slot::Free(handle.emitter);
            log::trace!("emitter pool {}: slot {} released", self.id, origin.slot);
        }
    }
}
