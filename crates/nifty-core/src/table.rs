//! Process-wide handle table
//!
//! Backed by one `Mutex`-guarded map plus a LIFO free-list allocator for
//! slot indices, following the same free-stack-then-fresh-counter shape
//! the teacher's slot allocator uses for its fixed-size slot pool —
//! generalized here to hold variable-sized, heterogeneous objects behind
//! `Arc<dyn AnyObject>` instead of fixed memory slots.

use std::any::Any;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use crate::class::prefix_matches;
use crate::error::{NiftyError, NiftyResult};
use crate::handle::Handle;
use crate::object::{AnyObject, CoreObject};

struct Slot {
    generation: u32,
    object: Arc<dyn AnyObject>,
}

struct Inner {
    slots: HashMap<u32, Slot>,
    free_slots: Vec<u32>,
    next_fresh: u32,
    /// Per-slot generation, retained across discard so a reused slot's
    /// next handle never aliases a still-outstanding one for the same
    /// slot index.
    generations: HashMap<u32, u32>,
}

/// The process-wide table every CoreObject is registered with.
///
/// A single process-global instance backs the free-function API in
/// [`crate::create`]/[`crate::lookup`]/etc; tests and embedders that
/// want an isolated table can construct their own with [`HandleTable::new`].
pub struct HandleTable {
    inner: Mutex<Inner>,
    live_count: AtomicU32,
}

impl Default for HandleTable {
    fn default() -> Self {
        Self::new()
    }
}

impl HandleTable {
    pub fn new() -> Self {
        HandleTable {
            inner: Mutex::new(Inner {
                slots: HashMap::new(),
                free_slots: Vec::new(),
                next_fresh: 0,
                generations: HashMap::new(),
            }),
            live_count: AtomicU32::new(0),
        }
    }

    /// Register a freshly constructed object, stamp its header with the
    /// assigned handle, and return that handle. The object's header must
    /// start at refcount 1 (this call does not bump it further).
    pub fn register<T: CoreObject + 'static>(&self, object: T) -> Handle {
        let mut inner = self.inner.lock().unwrap();
        let slot = inner.free_slots.pop().unwrap_or_else(|| {
            let s = inner.next_fresh;
            inner.next_fresh += 1;
            s
        });
        let generation = *inner.generations.entry(slot).or_insert(0);
        let handle = Handle::pack(slot, generation);
        object.header().bind(handle);
        inner.slots.insert(slot, Slot { generation, object: Arc::new(object) });
        drop(inner);
        self.live_count.fetch_add(1, Ordering::Relaxed);
        handle
    }

    /// Look up a handle, bumping the object's logical refcount on
    /// success. Returns `None` for an unknown or stale handle — never an
    /// error, per spec §6.
    ///
    /// The refcount bump happens while `inner` is still held, so it is
    /// atomic with `discard`'s decrement-and-maybe-remove: a handle whose
    /// refcount is about to hit zero either finishes dying (and this
    /// lookup correctly misses it) or is incref'd first (and `discard`
    /// correctly does not remove it), never both.
    pub fn lookup(&self, handle: Handle) -> Option<Arc<dyn AnyObject>> {
        if handle.is_none() {
            return None;
        }
        let inner = self.inner.lock().unwrap();
        let slot = inner.slots.get(&handle.slot())?;
        if slot.generation != handle.generation() {
            return None;
        }
        let obj = Arc::clone(&slot.object);
        obj.header().incref();
        drop(inner);
        Some(obj)
    }

    /// Typed lookup: succeeds only if the stored object's class matches
    /// `class_prefix` at a colon boundary, then downcasts to `T`.
    pub fn lookup_as<T: CoreObject + 'static>(&self, handle: Handle, class_prefix: &'static str) -> NiftyResult<Arc<T>> {
        let obj = self.lookup(handle).ok_or(NiftyError::InvalidHandle)?;
        if !prefix_matches(obj.class(), class_prefix) {
            obj.header().decref();
            return Err(NiftyError::WrongClass {
                expected: class_prefix,
                found: obj.class().to_string(),
            });
        }
        match downcast_arc::<T>(obj) {
            Ok(typed) => Ok(typed),
            Err(obj) => {
                obj.header().decref();
                Err(NiftyError::InvalidHandle)
            }
        }
    }

    /// Decrement an object's logical refcount; at zero, remove it from
    /// the table. The table's own `Arc` clone is dropped at that point —
    /// the subclass's `Drop` impl (the destructor chain, I4) runs once
    /// every other outstanding `Arc` clone from prior lookups is gone
    /// too.
    ///
    /// The decrement happens under `inner`, the same lock `lookup`'s
    /// incref holds — otherwise a lookup could clone the `Arc` and
    /// incref a handle whose refcount this call had already dropped to
    /// zero and recycled, handing back a reference to a slot that may by
    /// then hold an unrelated object.
    pub fn discard(&self, object: &Arc<dyn AnyObject>) {
        let handle = object.header().handle();
        let mut inner = self.inner.lock().unwrap();
        let remaining = object.header().decref();
        if remaining != 0 {
            return;
        }
        if let Some(slot) = inner.slots.remove(&handle.slot()) {
            debug_assert_eq!(slot.generation, handle.generation());
            let next_gen = slot.generation.wrapping_add(1);
            inner.generations.insert(handle.slot(), next_gen);
            inner.free_slots.push(handle.slot());
            drop(inner);
            self.live_count.fetch_sub(1, Ordering::Relaxed);
        }
    }

    /// Iterate over all live objects whose class starts with
    /// `class_prefix`, holding the table lock for the duration —
    /// matching the spec's `apply` contract.
    pub fn apply(&self, class_prefix: &str, mut f: impl FnMut(&Arc<dyn AnyObject>)) {
        let inner = self.inner.lock().unwrap();
        for slot in inner.slots.values() {
            if prefix_matches(slot.object.class(), class_prefix) {
                f(&slot.object);
            }
        }
    }

    /// Number of currently live objects. Exposed for leak-freedom tests.
    pub fn live_count(&self) -> u32 {
        self.live_count.load(Ordering::Relaxed)
    }
}

pub(crate) fn downcast_arc<T: CoreObject + 'static>(obj: Arc<dyn AnyObject>) -> Result<Arc<T>, Arc<dyn AnyObject>> {
    if (*obj).as_any().is::<T>() {
        // SAFETY: just checked the concrete type behind the trait object.
        let raw = Arc::into_raw(obj) as *const T;
        Ok(unsafe { Arc::from_raw(raw) })
    } else {
        Err(obj)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::ObjectHeader;

    struct Probe {
        header: ObjectHeader,
        tag: u32,
    }

    impl CoreObject for Probe {
        fn header(&self) -> &ObjectHeader {
            &self.header
        }
    }

    fn probe(tag: u32) -> Probe {
        Probe { header: ObjectHeader::new("core:probe"), tag }
    }

    #[test]
    fn register_then_lookup_roundtrips_and_bumps_refcount() {
        let table = HandleTable::new();
        let h = table.register(probe(7));
        let obj = table.lookup(h).expect("live handle");
        assert_eq!(obj.header().handle(), h);
        let typed = downcast_arc::<Probe>(obj).ok().expect("downcast should succeed");
        assert_eq!(typed.tag, 7);
        assert_eq!(typed.header().refcount(), 2);
    }

    #[test]
    fn discard_to_zero_removes_from_table() {
        let table = HandleTable::new();
        let h = table.register(probe(1));
        let obj = table.lookup(h).unwrap();
        assert_eq!(table.live_count(), 1);
        table.discard(&obj); // undo the lookup's incref
        table.discard(&obj); // undo create's initial refcount of 1
        assert_eq!(table.live_count(), 0);
        assert!(table.lookup(h).is_none());
    }

    #[test]
    fn recycled_slot_yields_distinct_handle() {
        let table = HandleTable::new();
        let h1 = table.register(probe(1));
        let obj = table.lookup(h1).unwrap();
        table.discard(&obj);
        table.discard(&obj);
        let h2 = table.register(probe(2));
        assert_eq!(h1.slot(), h2.slot());
        assert_ne!(h1, h2);
        assert!(table.lookup(h1).is_none());
    }

    #[test]
    fn lookup_as_rejects_wrong_class() {
        let table = HandleTable::new();
        let h = table.register(probe(1));
        let err = match table.lookup_as::<Probe>(h, "core:other") {
            Err(e) => e,
            Ok(_) => panic!("lookup_as should reject wrong class"),
        };
        assert!(matches!(err, NiftyError::WrongClass { .. }));
    }

    #[test]
    fn apply_visits_only_matching_prefix() {
        let table = HandleTable::new();
        table.register(probe(1));
        table.register(probe(2));
        let mut seen = 0;
        table.apply("core:probe", |_| seen += 1);
        assert_eq!(seen, 2);
        let mut none_seen = 0;
        table.apply("core:other", |_| none_seen += 1);
        assert_eq!(none_seen, 0);
    }
}
