//! Batch decompilation driver (§5 "two phases: read-all then
//! render-all"; §3 ambient stack "Configuration").
//!
//! Grounded on the teacher's explicit `Config`-struct-threaded-through-
//! `Context` pattern: a `Context` owns the [`Config`] for a run plus the
//! [`ClassRegistry`] every class in the run is loaded into, so an
//! anonymous-class body or an overload set declared in one class file is
//! visible while rendering any other. §5 requires the registry to be
//! complete before any class renders and read-only once rendering
//! starts — [`Context::load`] is the only mutator, [`Context::render_all`]
//! only ever borrows the registry immutably.

use thiserror::Error;

use jclass_core::error::DecompileError;
use jclass_registry::{ClassRegistry, RegistrationError};

use crate::{parse_class, Config};

/// Either phase of [`Context::load`] can fail: the bytes might not parse
/// as a class file, or the class might already be registered under the
/// same internal name (e.g. the same jar entry loaded twice).
#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Decompile(#[from] DecompileError),
    #[error(transparent)]
    Registration(#[from] RegistrationError),
}

pub struct Context {
    pub config: Config,
    registry: ClassRegistry,
}

impl Context {
    pub fn new(config: Config) -> Self {
        Context { config, registry: ClassRegistry::new() }
    }

    /// Read phase: parse one class file's bytes and add it to the
    /// registry. Returns the class's internal name on success. Call this
    /// for every class in the batch before calling [`Context::render_all`]
    /// — a class referenced by an anonymous-class constructor or an
    /// overloaded call that hasn't been loaded yet simply isn't visible
    /// to the oracle (§9 "Overload-resolution oracle absence").
    pub fn load(&mut self, bytes: &[u8]) -> Result<String, LoadError> {
        let class = parse_class(bytes)?;
        let name = class.this_class.internal().to_string();
        self.registry.register(class)?;
        Ok(name)
    }

    /// Render phase: every loaded class against the now-complete
    /// registry. A method-level decompilation failure surfaces as `Err`
    /// for that one class rather than aborting the batch — `render_all`
    /// itself never fails, matching §5's "partial output is never
    /// emitted" at the single-class granularity.
    pub fn render_all(&self) -> Vec<(String, Result<String, DecompileError>)> {
        self.registry
            .iter()
            .map(|class| {
                let name = class.this_class.internal().to_string();
                let result = jclass_decompiler::decompile_class(class, &self.registry, &self.config);
                (name, result)
            })
            .collect()
    }

    pub fn registry(&self) -> &ClassRegistry {
        &self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loading_the_same_class_twice_is_a_duplicate_registration_error() {
        // A trivial (hand-written, not javac-emitted) class file naming
        // itself "Foo": magic, versions, a two-entry constant pool
        // (#1 Utf8("Foo"), #2 Class -> #1), `this_class` pointing at #2,
        // no superclass/interfaces/fields/methods/attributes.
        let mut bytes: Vec<u8> = vec![0xCA, 0xFE, 0xBA, 0xBE, 0x00, 0x00, 0x00, 0x34];
        bytes.extend_from_slice(&3u16.to_be_bytes()); // constant_pool_count
        bytes.push(1); // Utf8 tag
        bytes.extend_from_slice(&3u16.to_be_bytes());
        bytes.extend_from_slice(b"Foo");
        bytes.push(7); // Class tag
        bytes.extend_from_slice(&1u16.to_be_bytes()); // name_index -> #1
        bytes.extend_from_slice(&0x0021u16.to_be_bytes()); // access_flags
        bytes.extend_from_slice(&2u16.to_be_bytes()); // this_class -> #2
        bytes.extend_from_slice(&[0, 0]); // super_class
        bytes.extend_from_slice(&[0, 0]); // interfaces_count
        bytes.extend_from_slice(&[0, 0]); // fields_count
        bytes.extend_from_slice(&[0, 0]); // methods_count
        bytes.extend_from_slice(&[0, 0]); // attributes_count

        let mut ctx = Context::new(Config::default());
        assert_eq!(ctx.load(&bytes).unwrap(), "Foo");
        assert!(matches!(ctx.load(&bytes), Err(LoadError::Registration(RegistrationError::DuplicateClass(name))) if name == "Foo"));
    }
}
