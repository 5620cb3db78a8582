use core::ops::Deref;
use std::sync::Arc;

use super::store::Store;

/// A store handle that may be shared between several bitmaps.
///
/// Sharing is established only by [`crate::Bitmap::clone`] on a bitmap whose
/// copy-on-write flag is set. Every mutation funnels through [`CowStore::to_mut`],
/// so a shared store is detached before the first write reaches it and a
/// freshly thawed store always starts out private.
#[derive(Debug)]
pub(crate) struct CowStore(Arc<Store>);

impl CowStore {
    pub fn new(store: Store) -> CowStore {
        CowStore(Arc::new(store))
    }

    /// Shares the underlying store with the returned handle.
    pub fn share(&self) -> CowStore {
        CowStore(Arc::clone(&self.0))
    }

    /// Copies the underlying store; the returned handle is never shared.
    pub fn deep_clone(&self) -> CowStore {
        CowStore::new(Store::clone(&self.0))
    }

    pub fn is_shared(&self) -> bool {
        Arc::strong_count(&self.0) > 1
    }

    /// The single thaw point: detaches the store from any other bitmap
    /// still referencing it, then hands out mutable access.
    #[inline]
    pub fn to_mut(&mut self) -> &mut Store {
        Arc::make_mut(&mut self.0)
    }

    pub fn into_owned(self) -> Store {
        Arc::try_unwrap(self.0).unwrap_or_else(|shared| Store::clone(&shared))
    }
}

impl Deref for CowStore {
    type Target = Store;

    #[inline]
    fn deref(&self) -> &Store {
        &self.0
    }
}

impl PartialEq for CowStore {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || **self == **other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thaw_detaches_shared_store() {
        let mut a = CowStore::new(Store::new());
        let mut b = a.share();
        assert!(a.is_shared());
        assert!(b.is_shared());

        b.to_mut().insert(7);
        assert!(!a.is_shared());
        assert!(!b.is_shared());
        assert!(!a.contains(7));
        assert!(b.contains(7));

        // Mutating an unshared store must not copy it again.
        a.to_mut().insert(3);
        assert!(a.contains(3));
    }

    #[test]
    fn deep_clone_is_private() {
        let a = CowStore::new(Store::new());
        let b = a.deep_clone();
        assert!(!a.is_shared());
        assert!(!b.is_shared());
        assert_eq!(a, b);
    }
}
