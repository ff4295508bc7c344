//! Compile-time checked property accessors.

use std::fmt;

/// Access to one field of type `P` inside a container `C`.
///
/// A property pairs a name (used in diagnostics) with a getter and a mutable
/// getter. Build one with the [`property!`](crate::property) macro:
///
/// ```
/// use xbind_schema::{property, Property};
///
/// #[derive(Default)]
/// struct Person {
///     id: i32,
/// }
///
/// let id: Property<Person, i32> = property!(Person, id);
/// let mut person = Person::default();
/// id.set(&mut person, 123);
/// assert_eq!(*id.get(&person), 123);
/// assert_eq!(id.name(), "id");
/// ```
pub struct Property<C, P> {
    name: &'static str,
    get: fn(&C) -> &P,
    get_mut: fn(&mut C) -> &mut P,
}

impl<C, P> Clone for Property<C, P> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C, P> Copy for Property<C, P> {}

impl<C, P> fmt::Debug for Property<C, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("name", &self.name)
            .field("container", &std::any::type_name::<C>())
            .field("type", &std::any::type_name::<P>())
            .finish()
    }
}

impl<C, P> Property<C, P> {
    /// Create a property from its accessor functions.
    pub const fn new(name: &'static str, get: fn(&C) -> &P, get_mut: fn(&mut C) -> &mut P) -> Self {
        Self { name, get, get_mut }
    }

    /// Property name.
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Borrow the value.
    #[inline]
    pub fn get<'a>(&self, container: &'a C) -> &'a P {
        (self.get)(container)
    }

    /// Borrow the value mutably.
    #[inline]
    pub fn get_mut<'a>(&self, container: &'a mut C) -> &'a mut P {
        (self.get_mut)(container)
    }

    /// Replace the value.
    #[inline]
    pub fn set(&self, container: &mut C, value: P) {
        *(self.get_mut)(container) = value;
    }
}

/// Build a [`Property`] for a named field of a type.
///
/// The field must be visible at the call site; an inaccessible or misspelled field
/// is a compile error.
#[macro_export]
macro_rules! property {
    ($container:ty, $field:ident) => {
        $crate::Property::<$container, _>::new(
            stringify!($field),
            |container: &$container| &container.$field,
            |container: &mut $container| &mut container.$field,
        )
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Address {
        street_name: String,
        post_code: Option<u32>,
    }

    #[test]
    fn test_get_and_set() {
        let street = property!(Address, street_name);
        let mut address = Address::default();

        street.set(&mut address, "231 Queen Street".to_owned());
        assert_eq!(street.get(&address), "231 Queen Street");

        street.get_mut(&mut address).push_str(", Auckland");
        assert_eq!(address.street_name, "231 Queen Street, Auckland");
    }

    #[test]
    fn test_property_is_copy() {
        let post_code = property!(Address, post_code);
        let copy = post_code;
        let mut address = Address::default();
        copy.set(&mut address, Some(1010));
        assert_eq!(*post_code.get(&address), Some(1010));
        assert_eq!(post_code.name(), "post_code");
    }
}
