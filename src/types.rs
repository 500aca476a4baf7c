//! Type references and the binder collaborator that maps them to and from
//! the names written in `TypeName` entries.

use std::{
    fmt::{self, Formatter, Display, Debug},
    ops::Deref,
    sync::Arc,
};


/// A cheap-to-clone reference to a serializable type, identified by its
/// qualified name.
///
/// The codec does not interpret type identity beyond equality and hashing;
/// it deduplicates `TypeRef`s into the per-session type table and hands
/// them to a [`TypeBinder`] at exactly two points (writing and reading a
/// `TypeName` entry). How a `TypeRef` relates to actual in-memory types is
/// the value codec's business.
#[derive(Clone, Eq, PartialEq, Hash)]
pub struct TypeRef(Arc<str>);

impl TypeRef {
    pub fn new(qualified_name: impl Into<Arc<str>>) -> Self {
        TypeRef(qualified_name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl Deref for TypeRef {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl Debug for TypeRef {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "TypeRef({:?})", &*self.0)
    }
}

impl Display for TypeRef {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TypeRef {
    fn from(name: &str) -> Self {
        TypeRef::new(name)
    }
}

/// Resolves types to wire names and back.
///
/// Must be deterministic: the same type always binds to the same name
/// within a stream's lifetime. Implementations are shared behind
/// `Arc<dyn TypeBinder>` by any number of independent reader/writer
/// instances, so they must be safe for concurrent use; the codec itself
/// never mutates them.
pub trait TypeBinder: Send + Sync {
    /// The name written to the wire for this type.
    fn bind_to_name(&self, ty: &TypeRef) -> String;

    /// Resolve a wire name back to a type. `None` means the name could not
    /// be bound; the reader logs a warning and carries on with no type.
    fn bind_to_type(&self, name: &str) -> Option<TypeRef>;
}

/// Identity binding: the wire name is the `TypeRef`'s own qualified name.
#[derive(Debug, Copy, Clone, Default)]
pub struct DefaultTypeBinder;

impl TypeBinder for DefaultTypeBinder {
    fn bind_to_name(&self, ty: &TypeRef) -> String {
        ty.name().to_owned()
    }

    fn bind_to_type(&self, name: &str) -> Option<TypeRef> {
        Some(TypeRef::new(name))
    }
}


#[test]
fn test_default_binder_is_identity() {
    let binder = DefaultTypeBinder;
    let ty = TypeRef::new("some.module.Widget");
    let name = binder.bind_to_name(&ty);
    assert_eq!(name, "some.module.Widget");
    assert_eq!(binder.bind_to_type(&name), Some(ty));
}
