//! Handle registry.
//!
//! Keeps callback objects alive while the engine may still call them. The
//! engine holds raw pointers into these objects with no way to tell us when it
//! is done other than the handle being freed, so every binding registered
//! against a handle lives until `remove(handle)` (or `remove_slot`).
//!
//! Nothing is dispatched through here; the engine calls the trampolines in
//! `callback` directly.

use std::collections::HashMap;
use std::sync::Arc;

use lazy_static::lazy_static;
use log::{trace, warn};
use parking_lot::Mutex;

use crate::callback::CallbackBinding;
use crate::config::{BridgeConfig, Retention};
use crate::error::{BassError, Result};
use crate::ffi::DWORD;

/// Slot used for the callbacks passed to a stream creation call.
pub const CREATION_SLOT: u32 = 0;

/// Registrations of one handle.
#[derive(Default)]
struct HandleEntry {
    slots: HashMap<u32, Arc<CallbackBinding>>,
    /// Bindings replaced while `Retention::UntilFree` is in force.
    retired: Vec<Arc<CallbackBinding>>,
}

impl HandleEntry {
    fn is_empty(&self) -> bool {
        self.slots.is_empty() && self.retired.is_empty()
    }
}

/// Table of (handle, slot) -> callback binding.
///
/// All mutation goes through one mutex. Bindings that fall out of the table
/// are dropped after the lock is released, so a binding's `Drop` may call
/// back into the registry.
pub struct ChannelReferences {
    table: Mutex<HashMap<DWORD, HandleEntry>>,
    retention: Retention,
}

lazy_static! {
    static ref CHANNEL_REFERENCES: Arc<ChannelReferences> =
        Arc::new(ChannelReferences::with_retention(BridgeConfig::from_env().retention));
}

impl Default for ChannelReferences {
    fn default() -> Self {
        Self::new()
    }
}

impl ChannelReferences {
    pub fn new() -> Self {
        Self::with_retention(Retention::default())
    }

    pub fn with_retention(retention: Retention) -> Self {
        Self {
            table: Mutex::new(HashMap::new()),
            retention,
        }
    }

    /// The process-wide registry.
    pub fn global() -> Arc<ChannelReferences> {
        CHANNEL_REFERENCES.clone()
    }

    pub fn retention(&self) -> Retention {
        self.retention
    }

    /// Register `binding` under (`handle`, `slot`), replacing any existing one.
    ///
    /// Handle 0 is the engine's failure value; protecting a callback for it
    /// would leak the callback forever, so it is rejected.
    pub fn add(&self, handle: DWORD, slot: u32, binding: Arc<CallbackBinding>) -> Result<()> {
        if handle == 0 {
            warn!("Refusing to register {:?} against handle 0 (slot {})", binding, slot);
            return Err(BassError::InvalidArgument(
                "cannot register a callback against handle 0".into(),
            ));
        }

        let replaced = {
            let mut table = self.table.lock();
            let entry = table.entry(handle).or_default();
            let previous = entry.slots.insert(slot, binding);
            match (previous, self.retention) {
                (Some(old), Retention::UntilFree) => {
                    entry.retired.push(old);
                    None
                }
                (previous, _) => previous,
            }
        };

        trace!(
            "Registered callback for handle {} slot {}{}",
            handle,
            slot,
            if replaced.is_some() { " (replaced)" } else { "" }
        );
        drop(replaced);
        Ok(())
    }

    /// Drop every registration of `handle`. No-op for unknown handles.
    pub fn remove(&self, handle: DWORD) {
        let removed = self.table.lock().remove(&handle);
        if let Some(entry) = &removed {
            trace!(
                "Released {} callback(s) for handle {}",
                entry.slots.len() + entry.retired.len(),
                handle
            );
        }
        drop(removed);
    }

    /// Drop the registration in one slot, leaving the handle's other slots.
    pub fn remove_slot(&self, handle: DWORD, slot: u32) {
        let removed = {
            let mut table = self.table.lock();
            let Some(entry) = table.get_mut(&handle) else {
                return;
            };
            let removed = entry.slots.remove(&slot);
            if entry.is_empty() {
                table.remove(&handle);
            }
            removed
        };
        if removed.is_some() {
            trace!("Released callback for handle {} slot {}", handle, slot);
        }
        drop(removed);
    }

    /// Drop everything (engine shutdown invalidates every handle).
    pub fn clear(&self) {
        let removed = std::mem::take(&mut *self.table.lock());
        if !removed.is_empty() {
            trace!("Released callbacks for {} handle(s)", removed.len());
        }
        drop(removed);
    }

    /// Whether (`handle`, `slot`) currently holds a binding.
    pub fn is_registered(&self, handle: DWORD, slot: u32) -> bool {
        self.table
            .lock()
            .get(&handle)
            .map_or(false, |entry| entry.slots.contains_key(&slot))
    }

    /// Number of live slots for `handle`.
    pub fn slot_count(&self, handle: DWORD) -> usize {
        self.table.lock().get(&handle).map_or(0, |entry| entry.slots.len())
    }

    /// Number of handles with at least one binding (live or retired).
    pub fn handle_count(&self) -> usize {
        self.table.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callback::{CallbackObject, DownloadProcedure, UserContext};
    use std::any::Any;
    use std::sync::Weak;
    use std::thread;

    fn noop_download() -> Arc<CallbackBinding> {
        let procedure: Arc<dyn DownloadProcedure> =
            Arc::new(|_: Option<&[u8]>, _: Option<&UserContext>| {});
        CallbackBinding::download(procedure, None)
    }

    /// Binding wrapping a tracked object, plus a weak ref to observe reclamation.
    fn tracked() -> (Arc<CallbackBinding>, Weak<dyn Any + Send + Sync>) {
        let object: Arc<dyn Any + Send + Sync> = Arc::new(0u64);
        let weak = Arc::downgrade(&object);
        (CallbackBinding::opaque(object), weak)
    }

    #[test]
    fn test_remove_handle_drops_all_slots() {
        let refs = ChannelReferences::new();
        let mut weaks = Vec::new();
        for slot in 0..5 {
            let (binding, weak) = tracked();
            refs.add(9, slot, binding).unwrap();
            weaks.push(weak);
        }
        assert_eq!(refs.slot_count(9), 5);
        assert!(weaks.iter().all(|w| w.upgrade().is_some()));

        refs.remove(9);
        assert_eq!(refs.slot_count(9), 0);
        for slot in 0..5 {
            assert!(!refs.is_registered(9, slot));
        }
        assert!(weaks.iter().all(|w| w.upgrade().is_none()));
        assert!(refs.is_empty());
    }

    #[test]
    fn test_remove_slot_keeps_other_slots() {
        let refs = ChannelReferences::new();
        let (first, first_weak) = tracked();
        let (second, second_weak) = tracked();
        refs.add(3, 1, first).unwrap();
        refs.add(3, 2, second).unwrap();

        refs.remove_slot(3, 1);
        assert!(!refs.is_registered(3, 1));
        assert!(refs.is_registered(3, 2));
        assert!(first_weak.upgrade().is_none());
        assert!(second_weak.upgrade().is_some());

        refs.remove_slot(3, 2);
        assert_eq!(refs.handle_count(), 0);
    }

    #[test]
    fn test_replace_releases_previous() {
        let refs = ChannelReferences::new();
        let (first, first_weak) = tracked();
        let (second, second_weak) = tracked();
        refs.add(11, 0, first).unwrap();
        refs.add(11, 0, second).unwrap();

        assert!(first_weak.upgrade().is_none());
        assert!(second_weak.upgrade().is_some());
        assert_eq!(refs.slot_count(11), 1);
    }

    #[test]
    fn test_replace_with_until_free_retention() {
        let refs = ChannelReferences::with_retention(Retention::UntilFree);
        let (first, first_weak) = tracked();
        let (second, second_weak) = tracked();
        refs.add(11, 0, first).unwrap();
        refs.add(11, 0, second).unwrap();

        // Replaced binding survives until the handle goes
        assert!(first_weak.upgrade().is_some());
        assert_eq!(refs.slot_count(11), 1);

        // Removing the slot alone keeps the retired binding with the handle
        refs.remove_slot(11, 0);
        assert!(second_weak.upgrade().is_none());
        assert!(first_weak.upgrade().is_some());
        assert_eq!(refs.handle_count(), 1);

        refs.remove(11);
        assert!(first_weak.upgrade().is_none());
        assert!(refs.is_empty());
    }

    #[test]
    fn test_remove_unknown_handle_is_noop() {
        let refs = ChannelReferences::new();
        refs.remove(1234);
        refs.remove_slot(1234, 7);
        assert!(refs.is_empty());
    }

    #[test]
    fn test_zero_handle_rejected() {
        let refs = ChannelReferences::new();
        let (binding, weak) = tracked();
        let result = refs.add(0, 0, binding);
        assert!(matches!(result, Err(BassError::InvalidArgument(_))));
        assert!(refs.is_empty());
        // Nothing kept it alive
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn test_handle_42_scenario() {
        let refs = ChannelReferences::new();
        let binding = noop_download();
        let weak = Arc::downgrade(&binding);
        refs.add(42, 0, binding).unwrap();

        // Retained by the registry alone
        assert!(weak.upgrade().is_some());
        assert!(refs.is_registered(42, 0));

        refs.remove(42);
        assert!(weak.upgrade().is_none());
        refs.remove(42);
        assert!(refs.is_empty());
    }

    #[test]
    fn test_drop_may_reenter_registry() {
        struct Reentrant(Arc<ChannelReferences>);
        impl Drop for Reentrant {
            fn drop(&mut self) {
                // Would deadlock if bindings were dropped under the lock
                self.0.remove(77);
            }
        }

        let refs = Arc::new(ChannelReferences::new());
        refs.add(77, 0, noop_download()).unwrap();
        let object: Arc<dyn Any + Send + Sync> = Arc::new(Reentrant(refs.clone()));
        refs.add(5, 0, CallbackBinding::opaque(object)).unwrap();

        refs.remove(5);
        assert!(refs.is_empty());
    }

    #[test]
    fn test_concurrent_disjoint_handles() {
        const THREADS: u32 = 8;
        const HANDLES: u32 = 200;

        let refs = Arc::new(ChannelReferences::new());
        let workers: Vec<_> = (0..THREADS)
            .map(|t| {
                let refs = refs.clone();
                thread::spawn(move || {
                    for i in 0..HANDLES {
                        let handle = 1 + t * HANDLES + i;
                        refs.add(handle, 0, noop_download()).unwrap();
                        refs.add(handle, 1, noop_download()).unwrap();
                        // Odd handles are freed again, even ones lose one slot
                        if i % 2 == 1 {
                            refs.remove(handle);
                        } else {
                            refs.remove_slot(handle, 1);
                        }
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        assert_eq!(refs.handle_count(), (THREADS * HANDLES / 2) as usize);
        for t in 0..THREADS {
            for i in 0..HANDLES {
                let handle = 1 + t * HANDLES + i;
                assert_eq!(refs.is_registered(handle, 0), i % 2 == 0);
                assert!(!refs.is_registered(handle, 1));
            }
        }
    }

    #[test]
    fn test_clear() {
        let refs = ChannelReferences::new();
        refs.add(1, 0, noop_download()).unwrap();
        refs.add(2, 0, noop_download()).unwrap();
        refs.clear();
        assert!(refs.is_empty());
    }

    #[test]
    fn test_global_is_shared() {
        let a = ChannelReferences::global();
        let b = ChannelReferences::global();
        assert!(Arc::ptr_eq(&a, &b));

        // Handle value out of the range the other tests use
        let handle = 0xFFFF_0001;
        a.add(handle, 3, noop_download()).unwrap();
        assert!(b.is_registered(handle, 3));
        b.remove(handle);
        assert!(!a.is_registered(handle, 3));
    }

    #[test]
    fn test_binding_kind_is_kept() {
        let refs = ChannelReferences::new();
        let binding = noop_download();
        assert!(matches!(binding.object(), CallbackObject::Download(_)));
        refs.add(8, 0, binding).unwrap();
        assert!(refs.is_registered(8, 0));
    }
}
