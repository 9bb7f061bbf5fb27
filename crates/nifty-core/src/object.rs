//! CoreObject: the header every Nifty object embeds as its first field
//!
//! Mirrors the C design of "size bytes + destructor function pointer in
//! the header" with a `dyn Any + Send + Sync` payload behind an `Arc`:
//! the logical refcount is tracked explicitly (so it matches the spec's
//! lookup/discard counting exactly), while the bytes themselves are
//! reclaimed by ordinary `Arc`/`Drop` once the table's own reference and
//! every outstanding lookup reference are gone. A subclass's `Drop` impl
//! is the "destructor chain": it runs its own teardown, then the `Drop`
//! of its embedded `CoreObject` field runs last.

use std::any::Any;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use crate::handle::Handle;

/// Fields every CoreObject carries, analogous to the fixed header a C
/// implementation prepends to every allocation.
pub struct ObjectHeader {
    class: &'static str,
    handle: AtomicU64,
    refcount: AtomicUsize,
}

impl ObjectHeader {
    /// Construct a fresh header with refcount 1, per I1/I4. The handle
    /// is not known yet at construction time — it is filled in once the
    /// object is registered with the handle table — so it starts as
    /// `Handle::NONE` and is stamped exactly once via [`Self::bind`].
    pub fn new(class: &'static str) -> Self {
        ObjectHeader {
            class,
            handle: AtomicU64::new(Handle::NONE.as_u64()),
            refcount: AtomicUsize::new(1),
        }
    }

    /// Stamp the handle assigned by the table. Called exactly once,
    /// immediately after the table inserts the object; panics on a
    /// second call since a handle is stable for the object's lifetime
    /// (I3).
    pub(crate) fn bind(&self, handle: Handle) {
        let prev = self.handle.swap(handle.as_u64(), Ordering::Release);
        debug_assert_eq!(prev, Handle::NONE.as_u64(), "handle bound twice");
    }

    /// The object's immutable, ancestor-first class path.
    #[inline]
    pub fn class(&self) -> &'static str {
        self.class
    }

    /// The object's handle, stable since construction (I3).
    #[inline]
    pub fn handle(&self) -> Handle {
        let raw = self.handle.load(Ordering::Acquire);
        // SAFETY-by-construction: `raw` always came from a real Handle.
        unsafe { std::mem::transmute::<u64, Handle>(raw) }
    }

    #[inline]
    pub(crate) fn refcount(&self) -> usize {
        self.refcount.load(Ordering::Acquire)
    }

    /// Increment on a successful lookup; returns the new count.
    #[inline]
    pub(crate) fn incref(&self) -> usize {
        self.refcount.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Decrement on discard; returns the new count. Underflow is a
    /// programming bug per spec §6 and aborts the process rather than
    /// silently wrapping.
    #[inline]
    pub(crate) fn decref(&self) -> usize {
        let prev = self.refcount.fetch_sub(1, Ordering::AcqRel);
        if prev == 0 {
            panic!("CoreObject refcount underflow on handle {}", self.handle());
        }
        prev - 1
    }
}

/// Implemented by every Nifty object; gives the handle table uniform
/// access to the embedded header regardless of concrete subclass.
pub trait CoreObject: Any + Send + Sync {
    fn header(&self) -> &ObjectHeader;

    #[inline]
    fn class(&self) -> &'static str {
        self.header().class()
    }

    #[inline]
    fn handle(&self) -> Handle {
        self.header().handle()
    }
}

/// Blanket trait object bound the handle table stores objects behind:
/// `dyn AnyObject` supports both the `CoreObject` surface and
/// downcasting to a concrete subclass for typed lookups.
pub trait AnyObject: CoreObject + Any {
    fn as_any(&self) -> &dyn Any;
}

impl<T: CoreObject + 'static> AnyObject for T {
    #[inline]
    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Leaf {
        header: ObjectHeader,
    }

    impl CoreObject for Leaf {
        fn header(&self) -> &ObjectHeader {
            &self.header
        }
    }

    #[test]
    fn new_header_starts_at_refcount_one_and_unbound_handle() {
        let h = ObjectHeader::new("core:leaf");
        assert_eq!(h.refcount(), 1);
        assert!(h.handle().is_none());
    }

    #[test]
    fn bind_stamps_handle_once() {
        let h = ObjectHeader::new("core:leaf");
        let handle = Handle::pack(5, 1);
        h.bind(handle);
        assert_eq!(h.handle(), handle);
    }

    #[test]
    fn incref_decref_track_lookup_discard() {
        let h = ObjectHeader::new("core:leaf");
        assert_eq!(h.incref(), 2);
        assert_eq!(h.decref(), 1);
        assert_eq!(h.decref(), 0);
    }

    #[test]
    fn leaf_exposes_class_and_handle_through_core_object() {
        let leaf = Leaf { header: ObjectHeader::new("core:leaf") };
        assert_eq!(leaf.class(), "core:leaf");
        assert!(leaf.handle().is_none());
    }
}
