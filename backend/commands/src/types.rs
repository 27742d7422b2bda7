/// Runtime type keys and type-erased values flowing through the mappers.
use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Identifies a Rust type at runtime. Equality and hashing use the `TypeId`;
/// the name is kept for messages and for the stable responder key.
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    pub fn of<T: Any + ?Sized>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Fully qualified type name, e.g. `alloc::string::String`.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Last path segment of the type name, e.g. `String`.
    pub fn short_name(&self) -> &'static str {
        short_type_name(self.name)
    }

    pub fn is<T: Any + ?Sized>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }
}

/// Strip the module path from a type name. Generic types are left untouched.
fn short_type_name(name: &'static str) -> &'static str {
    if name.contains('<') {
        return name;
    }
    match name.rfind("::") {
        Some(idx) => &name[idx + 2..],
        None => name,
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeKey({})", self.name)
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.short_name())
    }
}

/// A mapped argument value waiting to be handed to a responder.
pub type ArgValue = Box<dyn Any + Send>;

/// A value returned by a responder, tagged with its runtime type so the
/// matching result mapper can be found.
pub struct Output {
    key: TypeKey,
    value: Box<dyn Any + Send>,
}

impl Output {
    pub fn new<T: Any + Send>(value: T) -> Self {
        Self {
            key: TypeKey::of::<T>(),
            value: Box::new(value),
        }
    }

    /// Shorthand for a plain text reply.
    pub fn text(text: impl Into<String>) -> Self {
        Self::new(text.into())
    }

    pub fn key(&self) -> TypeKey {
        self.key
    }

    pub fn downcast<T: Any>(self) -> Result<T, Self> {
        let key = self.key;
        self.value
            .downcast::<T>()
            .map(|boxed| *boxed)
            .map_err(|value| Self { key, value })
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }
}

impl fmt::Debug for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Output").field("type", &self.key).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_key_equality_ignores_name() {
        assert_eq!(TypeKey::of::<String>(), TypeKey::of::<String>());
        assert_ne!(TypeKey::of::<String>(), TypeKey::of::<&'static str>());
        assert!(TypeKey::of::<i64>().is::<i64>());
    }

    #[test]
    fn test_short_names() {
        assert_eq!(TypeKey::of::<String>().short_name(), "String");
        assert_eq!(TypeKey::of::<i64>().short_name(), "i64");
        assert_eq!(TypeKey::of::<cmdbot_core::UserId>().short_name(), "UserId");
    }

    #[test]
    fn test_output_downcast() {
        let out = Output::text("pong");
        assert!(out.key().is::<String>());
        assert_eq!(out.downcast_ref::<String>().map(String::as_str), Some("pong"));

        let out = out.downcast::<i32>().unwrap_err();
        assert_eq!(out.downcast::<String>().unwrap(), "pong");
    }
}
