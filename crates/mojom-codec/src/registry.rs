//! Process-wide table of named descriptors.

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;

use crate::structs::StructDescriptor;
use crate::union::UnionDescriptor;

static GLOBAL: Lazy<Registry> = Lazy::new(Registry::default);

/// Named struct and union descriptors, resolved by [`StructRef::Named`]
/// and [`UnionRef::Named`] at first use.
///
/// Registration is idempotent: the first descriptor registered under a
/// name wins and later registrations get the existing one back.
///
/// [`StructRef::Named`]: crate::StructRef::Named
/// [`UnionRef::Named`]: crate::UnionRef::Named
#[derive(Debug, Default)]
pub struct Registry {
    structs: RwLock<HashMap<String, Arc<StructDescriptor>>>,
    unions: RwLock<HashMap<String, Arc<UnionDescriptor>>>,
}

impl Registry {
    pub fn global() -> &'static Registry {
        &GLOBAL
    }

    pub fn register_struct(&self, descriptor: StructDescriptor) -> Arc<StructDescriptor> {
        let mut structs = self.structs.write();
        Arc::clone(
            structs
                .entry(descriptor.name().to_owned())
                .or_insert_with(|| Arc::new(descriptor)),
        )
    }

    pub fn register_union(&self, descriptor: UnionDescriptor) -> Arc<UnionDescriptor> {
        let mut unions = self.unions.write();
        Arc::clone(
            unions
                .entry(descriptor.name().to_owned())
                .or_insert_with(|| Arc::new(descriptor)),
        )
    }

    pub fn struct_descriptor(&self, name: &str) -> Option<Arc<StructDescriptor>> {
        self.structs.read().get(name).cloned()
    }

    pub fn union_descriptor(&self, name: &str) -> Option<Arc<UnionDescriptor>> {
        self.unions.read().get(name).cloned()
    }
}
