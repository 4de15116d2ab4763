//! Subject identities.
//!
//! - [`TypeKey`] - a runtime type identity with links to its parent types
//! - [`ActionKey`] - a named action
//!
//! Both implement [`SubjectKey`], the bound the registry and dispatcher are
//! generic over.

use std::{
    any::{Any, TypeId},
    borrow::Cow,
    collections::HashSet,
    fmt,
    hash::{Hash, Hasher},
};

/// A key handlers can be registered against.
pub trait SubjectKey: Clone + Eq + Hash + fmt::Debug + fmt::Display + Send + Sync + 'static {
    /// Check that the key can be registered.
    ///
    /// Returns the reason when the key is rejected.
    fn validate(&self) -> Result<(), &'static str>;
}

fn no_parents() -> Vec<TypeKey> {
    Vec::new()
}

/// Runtime identity of a type.
///
/// Equality and hashing only consider the [`TypeId`]. The key also carries
/// the type name (for diagnostics) and a function listing the type's direct
/// parents, which lets ancestry be walked without a global type table.
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
    parents: fn() -> Vec<TypeKey>,
}

impl TypeKey {
    /// Key for `T`, without parents.
    pub fn of<T: ?Sized + Any>() -> Self {
        Self::with_parents::<T>(no_parents)
    }

    /// Key for the type of `value`, without parents.
    pub fn of_val<T: ?Sized + Any>(_value: &T) -> Self {
        Self::of::<T>()
    }

    /// Key for `T` whose direct parents are listed by `parents`.
    pub fn with_parents<T: ?Sized + Any>(parents: fn() -> Vec<TypeKey>) -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
            parents,
        }
    }

    /// The underlying [`TypeId`].
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// The full type name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The type name without its module path or generic arguments.
    pub fn short_name(&self) -> &'static str {
        let base = self.name.split('<').next().unwrap_or(self.name);
        base.rsplit("::").next().unwrap_or(base)
    }

    /// The direct parents of this type.
    pub fn parents(&self) -> Vec<TypeKey> {
        (self.parents)()
    }

    /// This type followed by every transitive parent, each listed once.
    ///
    /// Parents are visited depth-first in declaration order.
    pub fn ancestry(&self) -> Vec<TypeKey> {
        let mut seen = HashSet::new();
        let mut lineage = Vec::new();
        let mut stack = vec![*self];

        while let Some(key) = stack.pop() {
            if !seen.insert(key.id) {
                continue;
            }
            lineage.push(key);
            let mut parents = key.parents();
            parents.reverse();
            stack.extend(parents);
        }

        lineage
    }

    /// Whether `self` is `other` or one of its transitive parents.
    pub fn is_ancestor_of(&self, other: &TypeKey) -> bool {
        other.ancestry().iter().any(|key| key == self)
    }

    /// Whether this is the type of a closure.
    pub fn is_closure(&self) -> bool {
        self.name.contains("{{closure}}")
    }

    /// Whether this is a primitive or builtin compound type.
    pub fn is_builtin(&self) -> bool {
        const PRIMITIVES: &[&str] = &[
            "bool", "char", "str", "u8", "u16", "u32", "u64", "u128", "usize", "i8", "i16",
            "i32", "i64", "i128", "isize", "f32", "f64", "()", "!",
            "alloc::string::String",
        ];
        const COMPOUND_PREFIXES: &[&str] = &["(", "[", "&", "*", "fn(", "dyn "];

        PRIMITIVES.contains(&self.name)
            || COMPOUND_PREFIXES
                .iter()
                .any(|prefix| self.name.starts_with(prefix))
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
        f.debug_tuple("TypeKey").field(&self.name).finish()
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl SubjectKey for TypeKey {
    fn validate(&self) -> Result<(), &'static str> {
        if self.is_closure() {
            return Err("closures cannot be used as subjects");
        }
        if self.is_builtin() {
            return Err("builtin types cannot be used as subjects");
        }
        Ok(())
    }
}

/// The name of an observed action.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActionKey(Cow<'static, str>);

impl ActionKey {
    /// Create an action key.
    pub fn new(action: impl Into<Cow<'static, str>>) -> Self {
        Self(action.into())
    }

    /// Create an action key from a static string, usable in constants.
    pub const fn from_static(action: &'static str) -> Self {
        Self(Cow::Borrowed(action))
    }

    /// The action name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&'static str> for ActionKey {
    fn from(action: &'static str) -> Self {
        Self::from_static(action)
    }
}

impl From<String> for ActionKey {
    fn from(action: String) -> Self {
        Self(Cow::Owned(action))
    }
}

impl AsRef<str> for ActionKey {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Debug for ActionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ActionKey").field(&self.as_str()).finish()
    }
}

impl fmt::Display for ActionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl SubjectKey for ActionKey {
    fn validate(&self) -> Result<(), &'static str> {
        if self.0.trim().is_empty() {
            return Err("action names cannot be empty");
        }
        Ok(())
    }
}
