use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use flint_model::{Schema, TypeId, TypeIndex, TypeKind};

/// Memoizes the concrete implementors of each polymorphic type.
///
/// The index walk is pure and the type universe is fixed for the run, so
/// concurrent misses on the same key may both scan and compute the same
/// list; the lock protects only the map, never the scan. Entries persist
/// for the process lifetime unless explicitly invalidated, and eviction
/// is never required for correctness.
#[derive(Debug, Default)]
pub struct ImplementationRegistry {
    inner: Mutex<RegistryInner>,
}

#[derive(Debug, Default)]
struct RegistryInner {
    map: HashMap<TypeId, Arc<[TypeId]>>,
    scans: u64,
}

impl ImplementationRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Ordered concrete candidates for `ty`, scanning the index on a
    /// miss. Abstract results from the index are filtered out here.
    pub fn resolve(&self, schema: &Schema, index: &dyn TypeIndex, ty: TypeId) -> Arc<[TypeId]> {
        if let Some(hit) = self.lock_inner().map.get(&ty) {
            return hit.clone();
        }
        let scanned: Arc<[TypeId]> = index
            .implementors_of(ty)
            .into_iter()
            .filter(|candidate| {
                schema
                    .descriptor(*candidate)
                    .is_some_and(|desc| matches!(desc.kind, TypeKind::Class))
            })
            .collect();
        tracing::debug!(
            target = "flint.engine",
            ty = %schema.name_of(ty),
            candidates = scanned.len(),
            "scanned type index for implementors"
        );
        let mut inner = self.lock_inner();
        inner.scans += 1;
        // A racing scan of the same key computed the same list; the
        // first insert wins.
        inner.map.entry(ty).or_insert(scanned).clone()
    }

    /// Drops the cached entry for `ty`; the next resolve rescans.
    pub fn invalidate(&self, ty: TypeId) {
        self.lock_inner().map.remove(&ty);
    }

    pub fn clear(&self) {
        self.lock_inner().map.clear();
    }

    /// Number of index scans performed so far (cache misses).
    #[must_use]
    pub fn scan_count(&self) -> u64 {
        self.lock_inner().scans
    }

    #[track_caller]
    fn lock_inner(&self) -> MutexGuard<'_, RegistryInner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(err) => {
                let loc = std::panic::Location::caller();
                tracing::error!(
                    target = "flint.engine",
                    file = loc.file(),
                    line = loc.line(),
                    column = loc.column(),
                    error = %err,
                    "mutex poisoned; continuing with recovered guard"
                );
                err.into_inner()
            }
        }
    }
}
