//! Builder for a single nested element.

use std::marker::PhantomData;

use xbind_common::XmlName;

use super::{ElementScope, Scope, ScopeParts};
use crate::mapping::ElementBinding;

/// Builds the mapping of an element stored in an `Option<P>` field of `C`.
///
/// Created by [`ElementScope::element`]; [`end_element`](Self::end_element) attaches
/// the mapping and returns the parent builder.
#[must_use = "call `end_element` to attach the element to its parent"]
pub struct ChildElementMappingBuilder<C, P, Parent> {
    parent: Parent,
    name: XmlName,
    binding: ElementBinding,
    parts: ScopeParts,
    _types: PhantomData<fn() -> (C, P)>,
}

impl<C, P, Parent> ChildElementMappingBuilder<C, P, Parent>
where
    C: 'static,
    P: Default + 'static,
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
            .push(parts.defer::<P>(name, binding));
        parent
    }
}

impl<C, P: 'static, Parent> Scope<P> for ChildElementMappingBuilder<C, P, Parent> {
    fn parts_mut(&mut self) -> &mut ScopeParts {
        &mut self.parts
    }
}

impl<C, P: 'static, Parent> ElementScope<P> for ChildElementMappingBuilder<C, P, Parent> {}
