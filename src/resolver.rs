//! Error record resolution: numeric code in, field values out.

use tracing::warn;

use crate::store::{ErrorRecord, RecordStore};

/// Resolves numeric error codes against a record store.
///
/// An absent code, an unreadable backing store, and malformed backing
/// content all fold into the same not-found outcome. The store's own
/// diagnostics are logged here and go no further; callers only ever see
/// a record or nothing.
#[derive(Debug)]
pub struct RecordResolver<S> {
    store: S,
}

impl<S: RecordStore> RecordResolver<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// The record for `code`, or `None` when it cannot be produced whole.
    pub fn resolve(&self, code: i64) -> Option<ErrorRecord> {
        match self.store.record_by_code(code) {
            Ok(found) => found,
            Err(err) => {
                warn!("Treating error code {} as unknown: {}", code, err);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn test_resolve_known_code() {
        let resolver = RecordResolver::new(MemoryStore::builtin());
        let record = resolver.resolve(134).unwrap();
        assert_eq!(record.class_nibble, 5);
        assert_eq!(record.generator_error_code, 134);
    }

    #[test]
    fn test_resolve_unknown_code_is_none() {
        let resolver = RecordResolver::new(MemoryStore::builtin());
        assert!(resolver.resolve(999_999).is_none());
    }
}
