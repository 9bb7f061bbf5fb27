//! # nifty-core
//!
//! The object runtime the rest of the Nifty toolkit is built on: a
//! reference-counted, handle-based identity layer with lightweight
//! single inheritance and a colon-delimited class path standing in for
//! RTTI.
//!
//! ## Modules
//!
//! - `handle` — opaque, generation-tagged object identifier
//! - `object` — `ObjectHeader`/`CoreObject`/`AnyObject`, the embedded
//!   header every object carries
//! - `table` — the process-wide handle table (`alloc`/`lookup`/`discard`/`apply`)
//! - `class` — class-path grammar and colon-boundary-aware prefix matching
//! - `time` — `Timespec`/`Timeout`, the toolkit's shared time types
//! - `error` — `NiftyError`/`NiftyResult`
//! - `env` — `NIFTY_*` environment variable configuration
//! - `log` — kernel-style debug logging macros

#![allow(dead_code)]

pub mod class;
pub mod env;
pub mod error;
pub mod handle;
pub mod log;
pub mod object;
pub mod table;
pub mod time;

pub use class::{extend, is_valid_class_path, prefix_matches};
pub use error::{NiftyError, NiftyResult};
pub use handle::Handle;
pub use object::{AnyObject, CoreObject, ObjectHeader};
pub use table::HandleTable;
pub use time::{Timeout, Timespec};

use std::sync::{Arc, OnceLock};

fn global_table() -> &'static HandleTable {
    static TABLE: OnceLock<HandleTable> = OnceLock::new();
    TABLE.get_or_init(HandleTable::new)
}

/// `create(class, object)`: register a freshly constructed object with
/// the process-wide handle table and return its handle. The object's
/// header must already carry `class` and start at refcount 1 — ordinary
/// subclass constructors build that header via [`ObjectHeader::new`]
/// before calling this.
pub fn create<T: CoreObject + 'static>(object: T) -> Handle {
    global_table().register(object)
}

/// `lookup(handle) -> object | NULL`: resolve a handle against the
/// process-wide table, bumping the object's refcount on success.
pub fn lookup(handle: Handle) -> Option<Arc<dyn AnyObject>> {
    global_table().lookup(handle)
}

/// Typed lookup: resolves `handle`, checks the class prefix, and
/// downcasts to `T` in one call — the Rust shape of the spec's
/// per-subclass `S_lookup` helper.
pub fn lookup_as<T: CoreObject + 'static>(handle: Handle, class_prefix: &'static str) -> NiftyResult<Arc<T>> {
    global_table().lookup_as(handle, class_prefix)
}

/// `discard(obj)`: release a reference obtained from [`create`] or
/// [`lookup`]. At refcount zero the object leaves the table and its
/// `Drop` impl runs once every other outstanding reference is gone.
pub fn discard(object: &Arc<dyn AnyObject>) {
    global_table().discard(object)
}

/// `apply(class_prefix, fn)`: visit every live object whose class
/// matches `class_prefix`, holding the table lock for the duration.
pub fn apply(class_prefix: &str, f: impl FnMut(&Arc<dyn AnyObject>)) {
    global_table().apply(class_prefix, f)
}

/// `cast(obj, class_prefix) -> obj | NULL`: succeeds iff `obj`'s class
/// matches `class_prefix` at a colon boundary, then downcasts to `T`.
pub fn cast<T: CoreObject + 'static>(object: Arc<dyn AnyObject>, class_prefix: &str) -> Option<Arc<T>> {
    if !prefix_matches(object.class(), class_prefix) {
        return None;
    }
    table::downcast_arc::<T>(object).ok()
}

/// Number of currently live objects in the process-wide table. Useful
/// in tests asserting no-leak behavior after a full teardown.
pub fn live_count() -> u32 {
    global_table().live_count()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Probe {
        header: ObjectHeader,
    }

    impl CoreObject for Probe {
        fn header(&self) -> &ObjectHeader {
            &self.header
        }
    }

    #[test]
    fn create_lookup_discard_roundtrip_on_process_wide_table() {
        let before = live_count();
        let h = create(Probe { header: ObjectHeader::new("core:probe") });
        assert_eq!(live_count(), before + 1);
        let obj = lookup(h).expect("just created");
        discard(&obj); // undo this lookup
        discard(&obj); // undo create's initial refcount of 1
        assert_eq!(live_count(), before);
        assert!(lookup(h).is_none());
    }

    #[test]
    fn cast_rejects_sibling_prefix() {
        let h = create(Probe { header: ObjectHeader::new("core:probe") });
        let obj = lookup(h).unwrap();
        assert!(cast::<Probe>(Arc::clone(&obj), "core:probe").is_some());
        assert!(cast::<Probe>(Arc::clone(&obj), "core:probez").is_none());
        discard(&obj);
        discard(&obj);
    }
}
