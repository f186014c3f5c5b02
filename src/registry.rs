//! Catalog of type tags to blank-instance factories, scoped per polymorphic base.
//!
//! A base is any unsized trait object type (`dyn Node`, an activation trait, ...).
//! Concrete types are registered by the module that defines them; the archiver
//! only ever asks "which factory produces a `B` for this tag".
use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("Unknown type \"{tag}\" for base {base}")]
    UnknownType { base: &'static str, tag: String },
    #[error("Type \"{tag}\" for base {base} is already registered to {existing}, cannot register {new}")]
    DuplicateRegistration {
        base: &'static str,
        tag: String,
        existing: &'static str,
        new: &'static str,
    },
}

/// Produces a default-constructed instance of one concrete type, boxed as base `B`.
pub struct Factory<B: ?Sized> {
    create: fn() -> Box<B>,
    produces: TypeId,
    produces_name: &'static str,
}

impl<B: ?Sized> Factory<B> {
    /// `D` names the concrete type `create` builds; two factories are the
    /// same factory exactly when they produce the same `D`.
    pub fn new<D: 'static>(create: fn() -> Box<B>) -> Self {
        Self {
            create,
            produces: TypeId::of::<D>(),
            produces_name: type_name::<D>(),
        }
    }

    pub fn create(&self) -> Box<B> {
        (self.create)()
    }

    pub fn produces(&self) -> TypeId {
        self.produces
    }

    pub fn produces_name(&self) -> &'static str {
        self.produces_name
    }
}

impl<B: ?Sized> Clone for Factory<B> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<B: ?Sized> Copy for Factory<B> {}

impl<B: ?Sized> std::fmt::Debug for Factory<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Factory")
            .field("produces", &self.produces_name)
            .finish()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct RegistryKey {
    base: TypeId,
    tag: String,
}

struct RegistryEntry {
    base_name: &'static str,
    // Always a `Factory<B>` for the `B` named by the key.
    factory: Box<dyn Any + Send + Sync>,
}

#[derive(Default)]
pub struct TypeRegistry {
    entries: HashMap<RegistryKey, RegistryEntry>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Registers `factory` for `tag` under base `B`. Registering the same
    /// concrete type twice under one tag is accepted; a different concrete
    /// type is a `DuplicateRegistration`.
    pub fn register<B: ?Sized + 'static>(
        &mut self,
        tag: impl Into<String>,
        factory: Factory<B>,
    ) -> Result<(), RegistryError> {
        let key = RegistryKey {
            base: TypeId::of::<B>(),
            tag: tag.into(),
        };
        if let Some(entry) = self.entries.get(&key) {
            let existing = entry
                .factory
                .downcast_ref::<Factory<B>>()
                .map(|x| (x.produces(), x.produces_name()));
            return match existing {
                Some((produces, _)) if produces == factory.produces() => {
                    log::debug!("Type \"{}\" already registered for {}", key.tag, type_name::<B>());
                    Ok(())
                }
                Some((_, existing_name)) => Err(RegistryError::DuplicateRegistration {
                    base: type_name::<B>(),
                    tag: key.tag,
                    existing: existing_name,
                    new: factory.produces_name(),
                }),
                None => Err(RegistryError::DuplicateRegistration {
                    base: type_name::<B>(),
                    tag: key.tag,
                    existing: entry.base_name,
                    new: factory.produces_name(),
                }),
            };
        }
        self.entries.insert(
            key,
            RegistryEntry {
                base_name: type_name::<B>(),
                factory: Box::new(factory),
            },
        );
        Ok(())
    }

    pub fn resolve<B: ?Sized + 'static>(&self, tag: &str) -> Result<Factory<B>, RegistryError> {
        let key = RegistryKey {
            base: TypeId::of::<B>(),
            tag: tag.to_string(),
        };
        self.entries
            .get(&key)
            .and_then(|entry| entry.factory.downcast_ref::<Factory<B>>())
            .copied()
            .ok_or_else(|| RegistryError::UnknownType {
                base: type_name::<B>(),
                tag: tag.to_string(),
            })
    }

    /// Resolves `tag` and builds a blank instance.
    pub fn create<B: ?Sized + 'static>(&self, tag: &str) -> Result<Box<B>, RegistryError> {
        Ok(self.resolve::<B>(tag)?.create())
    }

    pub fn contains<B: ?Sized + 'static>(&self, tag: &str) -> bool {
        self.resolve::<B>(tag).is_ok()
    }

    /// All tags registered for base `B`, sorted.
    pub fn tags<B: ?Sized + 'static>(&self) -> Vec<String> {
        let base = TypeId::of::<B>();
        let mut tags: Vec<_> = self
            .entries
            .keys()
            .filter(|key| key.base == base)
            .map(|key| key.tag.clone())
            .collect();
        tags.sort();
        tags
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("entries", &self.entries.len())
            .finish()
    }
}
