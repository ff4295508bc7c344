//! Builder for repeated elements appended to a collection.

use std::marker::PhantomData;

use xbind_common::XmlName;

use super::{ElementScope, Scope, ScopeParts};
use crate::mapping::ElementBinding;

/// Builds the mapping of a repeated element of type `U`, stored as a member `M` of a
/// collection owned by `C`.
///
/// Created by [`ElementScope::collection_element`], [`ElementScope::variant_element`]
/// or [`ElementScope::member_element`].
#[must_use = "call `end_element` to attach the element to its parent"]
pub struct CollectionChildElementMappingBuilder<C, M, U, Parent> {
    parent: Parent,
    name: XmlName,
    binding: ElementBinding,
    parts: ScopeParts,
    _types: PhantomData<fn() -> (C, M, U)>,
}

impl<C, M, U, Parent> CollectionChildElementMappingBuilder<C, M, U, Parent>
where
    C: 'static,
    U: Default + 'static,
    Parent: ElementScope<C>,
{
    pub(crate) fn new(parent: Parent, name: XmlName, binding: ElementBinding) -> Self {
        Self {
            parent,
            name,
            binding,
            parts: ScopeParts::default(),
            _types: PhantomData,
        }
    }

    /// Attach this element to its parent and continue with the parent.
    pub fn end_element(self) -> Parent {
        let Self {
            mut parent,
            name,
            binding,
            parts,
            ..
        } = self;
        parent
            .parts_mut()
            .child_elements
            .push(parts.defer::<U>(name, binding));
        parent
    }
}

impl<C, M, U: 'static, Parent> Scope<U> for CollectionChildElementMappingBuilder<C, M, U, Parent> {
    fn parts_mut(&mut self) -> &mut ScopeParts {
        &mut self.parts
    }
}

impl<C, M, U: 'static, Parent> ElementScope<U> for CollectionChildElementMappingBuilder<C, M, U, Parent> {}
