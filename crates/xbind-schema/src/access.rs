//! Type-erased bindings between mappings and object fields.
//!
//! Mappings hold their typed accessors behind the small object-safe traits in this
//! module, so the serializer can walk an object graph of `dyn Any` values without
//! knowing the concrete types involved. Each typed implementation downcasts the
//! container once and then works on plain Rust values.

use std::any::{type_name, Any};
use std::marker::PhantomData;
use std::sync::Arc;

use xbind_common::{ReadFn, WriteFn};

use crate::mapping::TypeInfo;
use crate::{Error, Property, Result};

/// A list-like property that elements can be appended to.
///
/// Implemented for `Vec<M>` and for `Option<Vec<M>>`, which is created on the first
/// append.
pub trait Collection: 'static {
    /// The stored member type.
    type Member: 'static;

    /// Append a member.
    fn push_member(&mut self, member: Self::Member);

    /// Members in order.
    fn members(&self) -> &[Self::Member];
}

impl<M: 'static> Collection for Vec<M> {
    type Member = M;

    fn push_member(&mut self, member: M) {
        self.push(member);
    }

    fn members(&self) -> &[M] {
        self
    }
}

impl<M: 'static> Collection for Option<Vec<M>> {
    type Member = M;

    fn push_member(&mut self, member: M) {
        self.get_or_insert_with(Vec::new).push(member);
    }

    fn members(&self) -> &[M] {
        self.as_deref().unwrap_or_default()
    }
}

/// A collection member type that can hold a `U`.
///
/// Every type is a variant of itself. Polymorphic collections use an enum with one
/// `Variant` impl per element type:
///
/// ```
/// use xbind_schema::Variant;
///
/// #[derive(Default)]
/// struct Email(String);
/// #[derive(Default)]
/// struct Phone(String);
///
/// enum Contact {
///     Email(Email),
///     Phone(Phone),
/// }
///
/// impl Variant<Email> for Contact {
///     fn wrap(value: Email) -> Self {
///         Contact::Email(value)
///     }
///     fn peek(&self) -> Option<&Email> {
///         match self {
///             Contact::Email(email) => Some(email),
///             _ => None,
///         }
///     }
/// }
/// ```
pub trait Variant<U>: Sized + 'static {
    /// Store a `U` as this member type.
    fn wrap(value: U) -> Self;

    /// The `U` held by this member, if it holds one.
    fn peek(&self) -> Option<&U>;
}

impl<T: 'static> Variant<T> for T {
    #[inline]
    fn wrap(value: T) -> Self {
        value
    }

    #[inline]
    fn peek(&self) -> Option<&T> {
        Some(self)
    }
}

#[inline]
fn mismatch<T>() -> Error {
    Error::TypeMismatch {
        expected: type_name::<T>(),
    }
}

#[inline]
pub(crate) fn downcast_ref<T: 'static>(value: &dyn Any) -> Result<&T> {
    value.downcast_ref::<T>().ok_or_else(mismatch::<T>)
}

#[inline]
pub(crate) fn downcast_mut<T: 'static>(value: &mut dyn Any) -> Result<&mut T> {
    value.downcast_mut::<T>().ok_or_else(mismatch::<T>)
}

/// A scalar field read from and written as XML text.
pub(crate) trait ValueAccess: Send + Sync {
    fn set_from_xml(&self, container: &mut dyn Any, text: &str) -> Result<()>;
    fn to_xml(&self, container: &dyn Any) -> Result<Option<String>>;
}

pub(crate) struct ConvertedValue<C, P> {
    property: Property<C, P>,
    read: ReadFn<P>,
    write: WriteFn<P>,
}

impl<C, P> ConvertedValue<C, P> {
    pub(crate) fn new(property: Property<C, P>, read: ReadFn<P>, write: WriteFn<P>) -> Self {
        Self {
            property,
            read,
            write,
        }
    }
}

impl<C: 'static, P: 'static> ValueAccess for ConvertedValue<C, P> {
    fn set_from_xml(&self, container: &mut dyn Any, text: &str) -> Result<()> {
        let container = downcast_mut::<C>(container)?;
        let value = (self.read)(text)?;
        self.property.set(container, value);
        Ok(())
    }

    fn to_xml(&self, container: &dyn Any) -> Result<Option<String>> {
        let container = downcast_ref::<C>(container)?;
        Ok((self.write)(self.property.get(container)))
    }
}

/// A single nested element stored in an `Option<P>` field.
pub(crate) trait ChildAccess: Send + Sync {
    fn set(&self, container: &mut dyn Any, child: Box<dyn Any>) -> Result<()>;
    fn get<'a>(&self, container: &'a dyn Any) -> Result<Option<&'a dyn Any>>;
}

pub(crate) struct OptionalChild<C, P> {
    property: Property<C, Option<P>>,
}

impl<C, P> OptionalChild<C, P> {
    pub(crate) fn new(property: Property<C, Option<P>>) -> Self {
        Self { property }
    }
}

impl<C: 'static, P: 'static> ChildAccess for OptionalChild<C, P> {
    fn set(&self, container: &mut dyn Any, child: Box<dyn Any>) -> Result<()> {
        let child = child.downcast::<P>().map_err(|_| mismatch::<P>())?;
        let container = downcast_mut::<C>(container)?;
        self.property.set(container, Some(*child));
        Ok(())
    }

    fn get<'a>(&self, container: &'a dyn Any) -> Result<Option<&'a dyn Any>> {
        let container = downcast_ref::<C>(container)?;
        Ok(self.property.get(container).as_ref().map(|child| child as &dyn Any))
    }
}

/// Repeated elements appended to a collection.
pub(crate) trait CollectionAccess: Send + Sync {
    /// Wrap a freshly read element and append it.
    fn add(&self, container: &mut dyn Any, item: Box<dyn Any>) -> Result<()>;

    /// Address of the backing collection, identifying it across mappings.
    fn identity(&self, container: &dyn Any) -> Result<usize>;

    /// Members of the backing collection.
    fn members<'a>(&self, container: &'a dyn Any) -> Result<Vec<&'a dyn Any>>;

    /// The element held by a member, if this binding's element type claims it.
    fn project<'a>(&self, member: &'a dyn Any) -> Option<&'a dyn Any>;

    /// The collection's member type.
    fn member_type(&self) -> TypeInfo;
}

/// Collection binding for container `C`, collection `X` and element type `U`.
///
/// Without a property the container itself is the collection, and `C == X`.
pub(crate) struct CollectionMember<C, X, U> {
    property: Option<Property<C, X>>,
    _element: PhantomData<fn() -> U>,
}

impl<C, X, U> CollectionMember<C, X, U> {
    pub(crate) fn new(property: Option<Property<C, X>>) -> Self {
        Self {
            property,
            _element: PhantomData,
        }
    }
}

impl<C, X, U> CollectionMember<C, X, U>
where
    C: 'static,
    X: Collection,
{
    fn collection<'a>(&self, container: &'a dyn Any) -> Result<&'a X> {
        match &self.property {
            Some(property) => Ok(property.get(downcast_ref::<C>(container)?)),
            None => downcast_ref::<X>(container),
        }
    }

    fn collection_mut<'a>(&self, container: &'a mut dyn Any) -> Result<&'a mut X> {
        match &self.property {
            Some(property) => Ok(property.get_mut(downcast_mut::<C>(container)?)),
            None => downcast_mut::<X>(container),
        }
    }
}

impl<C, X, U> CollectionAccess for CollectionMember<C, X, U>
where
    C: 'static,
    X: Collection,
    X::Member: Variant<U>,
    U: 'static,
{
    fn add(&self, container: &mut dyn Any, item: Box<dyn Any>) -> Result<()> {
        let item = item.downcast::<U>().map_err(|_| mismatch::<U>())?;
        let member = <X::Member as Variant<U>>::wrap(*item);
        self.collection_mut(container)?.push_member(member);
        Ok(())
    }

    fn identity(&self, container: &dyn Any) -> Result<usize> {
        let collection: *const X = self.collection(container)?;
        Ok(collection as usize)
    }

    fn members<'a>(&self, container: &'a dyn Any) -> Result<Vec<&'a dyn Any>> {
        let members = self.collection(container)?.members();
        Ok(members.iter().map(|member| member as &dyn Any).collect())
    }

    fn project<'a>(&self, member: &'a dyn Any) -> Option<&'a dyn Any> {
        let member = member.downcast_ref::<X::Member>()?;
        <X::Member as Variant<U>>::peek(member).map(|element| element as &dyn Any)
    }

    fn member_type(&self) -> TypeInfo {
        TypeInfo::of::<X::Member>()
    }
}

/// Catch-all nodes stored in a collection field.
pub(crate) trait NodeAccess<N>: Send + Sync {
    fn add(&self, container: &mut dyn Any, node: N) -> Result<()>;
    fn nodes(&self, container: &dyn Any) -> Result<Vec<N>>;
}

/// Conversion from a captured node to a collection member.
pub(crate) type FromNodeFn<N, M> = Arc<dyn Fn(N) -> M + Send + Sync>;

/// Conversion from a collection member back to a node.
pub(crate) type ToNodeFn<N, M> = Arc<dyn Fn(&M) -> N + Send + Sync>;

pub(crate) struct NodeList<C, X: Collection, N> {
    property: Property<C, X>,
    from_node: FromNodeFn<N, X::Member>,
    to_node: ToNodeFn<N, X::Member>,
}

impl<C, X: Collection, N> NodeList<C, X, N> {
    pub(crate) fn new(
        property: Property<C, X>,
        from_node: FromNodeFn<N, X::Member>,
        to_node: ToNodeFn<N, X::Member>,
    ) -> Self {
        Self {
            property,
            from_node,
            to_node,
        }
    }
}

impl<C, X, N> NodeAccess<N> for NodeList<C, X, N>
where
    C: 'static,
    X: Collection,
    N: 'static,
{
    fn add(&self, container: &mut dyn Any, node: N) -> Result<()> {
        let container = downcast_mut::<C>(container)?;
        self.property
            .get_mut(container)
            .push_member((self.from_node)(node));
        Ok(())
    }

    fn nodes(&self, container: &dyn Any) -> Result<Vec<N>> {
        let container = downcast_ref::<C>(container)?;
        Ok(self
            .property
            .get(container)
            .members()
            .iter()
            .map(|member| (self.to_node)(member))
            .collect())
    }
}
