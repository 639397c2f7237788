//! Mesh group identity

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Logical channel shared by every participant of one broadcast.
///
/// The transport-level id derives deterministically from the name, so
/// agreeing on a name out-of-band is enough to land on the same group.
/// Immutable for the lifetime of any controller built on it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MeshGroup {
    name: String,
    id: Uuid,
}

impl MeshGroup {
    /// Group with an id derived from `name` (UUIDv5).
    pub fn from_name(name: &str) -> Self {
        let id = Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes());
        Self {
            name: name.to_string(),
            id,
        }
    }

    /// Group with an explicit transport id.
    pub fn new(name: &str, id: Uuid) -> Self {
        Self {
            name: name.to_string(),
            id,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> Uuid {
        self.id
    }
}

impl std::fmt::Display for MeshGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_name_same_id() {
        let a = MeshGroup::from_name("campus-fm");
        let b = MeshGroup::from_name("campus-fm");
        assert_eq!(a, b);
        assert_eq!(a.id(), b.id());
    }

    #[test]
    fn test_different_names_differ() {
        let a = MeshGroup::from_name("campus-fm");
        let b = MeshGroup::from_name("campus-am");
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_display_carries_name() {
        let group = MeshGroup::from_name("campus-fm");
        assert!(group.to_string().contains("campus-fm"));
    }
}
