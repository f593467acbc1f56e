//! The set of compiled modules available for linking.

use std::path::{Path, PathBuf};

/// The compiled artifact of one source file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompiledModule {
    /// The authoritative path of the source it was built from.
    pub source: PathBuf,
    /// The serialized intermediate representation.
    pub artifact: Vec<u8>,
}

impl CompiledModule {
    /// Creates a module for `source`.
    pub fn new(source: impl Into<PathBuf>, artifact: Vec<u8>) -> Self {
        Self {
            source: source.into(),
            artifact,
        }
    }
}

/// Compiled modules in insertion order, at most one per source path.
///
/// The first module is the link base. The store carries no lock of its own;
/// the orchestrator keeps it behind the same mutex as the content cache.
#[derive(Debug, Default)]
pub struct ModuleStore {
    modules: Vec<CompiledModule>,
}

impl ModuleStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a module. A module already present for the same source is
    /// replaced in place, keeping its link position.
    pub fn insert(&mut self, module: CompiledModule) {
        match self.modules.iter_mut().find(|m| m.source == module.source) {
            Some(existing) => *existing = module,
            None => self.modules.push(module),
        }
    }

    /// Returns `true` if a module built from `source` is present.
    pub fn contains(&self, source: &Path) -> bool {
        self.modules.iter().any(|m| m.source == source)
    }

    /// All modules in link order.
    pub fn all(&self) -> &[CompiledModule] {
        &self.modules
    }

    /// Removes and returns the module built from `source`.
    pub fn remove(&mut self, source: &Path) -> Option<CompiledModule> {
        let pos = self.modules.iter().position(|m| m.source == source)?;
        Some(self.modules.remove(pos))
    }

    /// Drops every module.
    pub fn clear(&mut self) {
        self.modules.clear();
    }

    /// Number of modules.
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Returns `true` if the store holds no modules.
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insertion_order_is_link_order() {
        let mut store = ModuleStore::new();
        store.insert(CompiledModule::new("/p/main.cpp", b"m".to_vec()));
        store.insert(CompiledModule::new("/p/util.cpp", b"u".to_vec()));
        let order: Vec<_> = store.all().iter().map(|m| m.source.clone()).collect();
        assert_eq!(order, vec![PathBuf::from("/p/main.cpp"), PathBuf::from("/p/util.cpp")]);
    }

    #[test]
    fn reinsert_replaces_in_place() {
        let mut store = ModuleStore::new();
        store.insert(CompiledModule::new("/p/main.cpp", b"v1".to_vec()));
        store.insert(CompiledModule::new("/p/util.cpp", b"u".to_vec()));
        store.insert(CompiledModule::new("/p/main.cpp", b"v2".to_vec()));

        assert_eq!(store.len(), 2);
        assert_eq!(store.all()[0].artifact, b"v2");
        assert_eq!(store.all()[1].artifact, b"u");
    }

    #[test]
    fn remove_and_clear() {
        let mut store = ModuleStore::new();
        store.insert(CompiledModule::new("/p/a.cpp", vec![]));
        store.insert(CompiledModule::new("/p/b.cpp", vec![]));

        assert!(store.remove(Path::new("/p/a.cpp")).is_some());
        assert!(store.remove(Path::new("/p/a.cpp")).is_none());
        assert!(!store.contains(Path::new("/p/a.cpp")));
        assert!(store.contains(Path::new("/p/b.cpp")));

        store.clear();
        assert!(store.is_empty());
    }

    #[test]
    fn identity_is_full_path() {
        let mut store = ModuleStore::new();
        store.insert(CompiledModule::new("/p/a/util.cpp", vec![1]));
        store.insert(CompiledModule::new("/p/b/util.cpp", vec![2]));
        assert_eq!(store.len(), 2);
    }
}
