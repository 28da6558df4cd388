//! Shared handle for concurrent use.

use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use crate::memory::ObjectMemory;

/// A cloneable handle to one object memory behind a mutex. Threads
/// clone the handle and lock it around each group of operations.
#[derive(Clone, Debug)]
pub struct SharedObjectMemory {
    inner: Arc<Mutex<ObjectMemory>>,
}

impl SharedObjectMemory {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(ObjectMemory::new())),
        }
    }

    pub fn lock(&self) -> MutexGuard<'_, ObjectMemory> {
        self.inner.lock()
    }
}

impl Default for SharedObjectMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl From<ObjectMemory> for SharedObjectMemory {
    fn from(memory: ObjectMemory) -> Self {
        Self {
            inner: Arc::new(Mutex::new(memory)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::known;
    use std::collections::HashSet;

    #[test]
    fn concurrent_allocations_yield_distinct_oops() {
        let shared = SharedObjectMemory::new();
        let mut all = HashSet::new();
        std::thread::scope(|scope| {
            let mut handles = Vec::new();
            for _ in 0..4 {
                let shared = shared.clone();
                handles.push(scope.spawn(move || {
                    let mut oops = Vec::new();
                    for _ in 0..64 {
                        let oop = shared
                            .lock()
                            .instantiate_class_with_bytes(known::NIL, 8)
                            .unwrap();
                        oops.push(oop);
                    }
                    oops
                }));
            }
            for handle in handles {
                all.extend(handle.join().unwrap());
            }
        });
        assert_eq!(all.len(), 256);
        assert_eq!(shared.lock().all_valid_oops().len(), 256);
    }
}
