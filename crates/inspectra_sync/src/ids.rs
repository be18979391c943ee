use std::fmt;

use serde::{Deserialize, Serialize};

/// Handle of a live scene entity. The core never dereferences it, it only
/// hands it back to the [`SceneAccess`](crate::host::SceneAccess) collaborator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub u64);

/// Stable instance identifier of one attached sub-object (component).
///
/// Unique for the lifetime of the sub-object and unrelated to its position in
/// the owning entity's list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubObjectId(pub u64);

/// Identity of one widget in the host's retained tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WidgetId(pub u64);

/// Type identifier of a sub-object or resource, as a full type path.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypeKey(String);

impl TypeKey {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last path segment, ignoring generic arguments.
    /// e.g. `my_game::physics::RigidBody<f32>` → `RigidBody`
    pub fn short_name(&self) -> &str {
        let without_generics = self.0.split('<').next().unwrap_or(&self.0);
        without_generics
            .rsplit("::")
            .next()
            .unwrap_or(without_generics)
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TypeKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}
