use rustc_hash::FxHashMap;
use std::any::Any;
use std::sync::{Arc, Mutex, PoisonError};

type Entry = Option<Box<dyn Any + Send + Sync>>;

/// A type-erased cache of values derived from PDF objects.
///
/// Failures are cached as well, so that broken objects aren't processed more than once.
#[derive(Clone, Default)]
pub(crate) struct Cache(Arc<Mutex<FxHashMap<u128, Entry>>>);

impl Cache {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Return the cached value for `key`, computing it with `f` if it doesn't exist yet.
    ///
    /// The lock is not held while `f` runs, so `f` may itself access the cache.
    pub(crate) fn get_or_insert_with<T: Clone + Send + Sync + 'static>(
        &self,
        key: u128,
        f: impl FnOnce() -> Option<T>,
    ) -> Option<T> {
        if let Some(entry) = self.lock().get(&key) {
            return downcast(entry);
        }

        let value = f();

        let mut map = self.lock();
        let entry = map
            .entry(key)
            .or_insert_with(|| value.map(|v| Box::new(v) as Box<dyn Any + Send + Sync>));

        downcast(entry)
    }

    pub(crate) fn len(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FxHashMap<u128, Entry>> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn downcast<T: Clone + 'static>(entry: &Entry) -> Option<T> {
    entry.as_ref().and_then(|v| v.downcast_ref::<T>().cloned())
}
