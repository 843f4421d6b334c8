//! ClassRegistry — the "loaded-class oracle" spec.md §4.8 (anonymous
//! classes) and §9 (overload resolution) call for.
//!
//! Grounded on `angelscript-registry/src/registry.rs`'s name-keyed
//! `SymbolRegistry`, simplified: there is no namespace tree to walk (JVM
//! internal names are already fully qualified) and no primitive/function
//! registration — every entry is a fully parsed `ClassFile`, keyed by its
//! internal name.

use rustc_hash::FxHashMap;

use jclass_core::class_file::{ClassFile, MethodInfo};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    #[error("class '{0}' is already registered")]
    DuplicateClass(String),
}

/// Classes discovered while decompiling a batch (e.g. every class in one
/// jar), keyed by internal name (`java/lang/Object`, not dotted).
#[derive(Default)]
pub struct ClassRegistry {
    classes: FxHashMap<String, ClassFile>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, class: ClassFile) -> Result<(), RegistrationError> {
        let name = class.this_class.internal().to_string();
        if self.classes.contains_key(&name) {
            return Err(RegistrationError::DuplicateClass(name));
        }
        self.classes.insert(name, class);
        Ok(())
    }

    pub fn get(&self, internal_name: &str) -> Option<&ClassFile> {
        self.classes.get(internal_name)
    }

    pub fn is_loaded(&self, internal_name: &str) -> bool {
        self.classes.contains_key(internal_name)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ClassFile> {
        self.classes.values()
    }

    /// All overloads of `method_name` declared directly on `internal_name`
    /// — the base set the overload-resolution oracle (§9) ranks by
    /// `implicitCastStatus` against call-site argument types.
    pub fn method_overloads<'a>(&'a self, internal_name: &str, method_name: &str) -> Vec<&'a MethodInfo> {
        self.get(internal_name)
            .map(|c| c.methods.iter().filter(|m| m.name == method_name).collect())
            .unwrap_or_default()
    }

    /// Walk `super_class` links (as far as they're loaded) from `internal_name`
    /// up to but not including `java/lang/Object`.
    pub fn superclass_chain(&self, internal_name: &str) -> Vec<&ClassFile> {
        let mut chain = Vec::new();
        let mut current = self.get(internal_name);
        while let Some(class) = current {
            let Some(super_name) = &class.super_class else { break };
            let Some(super_class) = self.get(super_name.internal()) else { break };
            chain.push(super_class);
            current = Some(super_class);
        }
        chain
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jclass_core::access::ClassAccess;
    use jclass_core::pool::{Constant, ConstantPool};
    use jclass_core::qualified_name::QualifiedName;

    fn empty_class(name: &str) -> ClassFile {
        ClassFile {
            minor_version: 0,
            major_version: 61,
            access_flags: ClassAccess::PUBLIC,
            this_class: QualifiedName::parse(name),
            super_class: Some(QualifiedName::parse("java/lang/Object")),
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            attributes: Vec::new(),
            pool: ConstantPool::from_entries(vec![Constant::Unusable]).unwrap(),
        }
    }

    #[test]
    fn registers_and_looks_up_by_internal_name() {
        let mut registry = ClassRegistry::new();
        registry.register(empty_class("com/example/Foo")).unwrap();
        assert!(registry.is_loaded("com/example/Foo"));
        assert!(registry.get("com/example/Foo").is_some());
    }

    #[test]
    fn duplicate_registration_is_an_error() {
        let mut registry = ClassRegistry::new();
        registry.register(empty_class("Foo")).unwrap();
        let err = registry.register(empty_class("Foo")).unwrap_err();
        assert_eq!(err, RegistrationError::DuplicateClass("Foo".to_string()));
    }

    #[test]
    fn superclass_chain_stops_at_unloaded_class() {
        let mut registry = ClassRegistry::new();
        registry.register(empty_class("Warrior")).unwrap();
        // java/lang/Object is never loaded, so the chain is empty.
        assert!(registry.superclass_chain("Warrior").is_empty());
    }
}
