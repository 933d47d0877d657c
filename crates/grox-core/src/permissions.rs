//! # Permissions
//!
//! Role claims arrive from the authentication layer as a flat list of
//! strings. They are kept as a set of capability tags and checked by
//! membership; there is no role hierarchy.
//!
//! ```text
//!   claims: ["sales:create", "ledger:read"]
//!                │
//!                ▼
//!   PermissionSet ──require(Capability::CreateSale)──► Ok / Forbidden
//! ```
//!
//! The wildcard tag `*` grants everything (owner accounts).

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Tag that grants every capability.
pub const WILDCARD: &str = "*";

/// Capabilities checked by the services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    CreateSale,
    ManageSales,
    RecordReturn,
    ManageProducts,
    ManageSuppliers,
    ReceiveStock,
    AdjustStock,
    ViewLedger,
    ViewReports,
}

impl Capability {
    /// The claim string that grants this capability.
    pub const fn tag(&self) -> &'static str {
        match self {
            Capability::CreateSale => "sales:create",
            Capability::ManageSales => "sales:manage",
            Capability::RecordReturn => "sales:return",
            Capability::ManageProducts => "products:manage",
            Capability::ManageSuppliers => "suppliers:manage",
            Capability::ReceiveStock => "stock:receive",
            Capability::AdjustStock => "stock:adjust",
            Capability::ViewLedger => "ledger:read",
            Capability::ViewReports => "reports:read",
        }
    }
}

/// A set of capability tags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct PermissionSet(BTreeSet<String>);

impl From<Vec<String>> for PermissionSet {
    fn from(tags: Vec<String>) -> Self {
        PermissionSet::new(tags)
    }
}

impl From<PermissionSet> for Vec<String> {
    fn from(set: PermissionSet) -> Self {
        set.0.into_iter().collect()
    }
}

impl PermissionSet {
    pub fn new<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        PermissionSet(
            tags.into_iter()
                .map(|t| t.into().trim().to_ascii_lowercase())
                .filter(|t| !t.is_empty())
                .collect(),
        )
    }

    /// Everything allowed.
    pub fn all() -> Self {
        PermissionSet::new([WILDCARD])
    }

    pub fn allows(&self, capability: Capability) -> bool {
        self.0.contains(WILDCARD) || self.0.contains(capability.tag())
    }

    pub fn require(&self, capability: Capability) -> CoreResult<()> {
        if self.allows(capability) {
            Ok(())
        } else {
            Err(CoreError::Forbidden {
                capability: capability.tag().to_string(),
            })
        }
    }
}

/// The authenticated caller of a service operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// Name recorded as cashier / `recorded_by`.
    pub username: String,
    pub permissions: PermissionSet,
}

impl Actor {
    pub fn new(username: impl Into<String>, permissions: PermissionSet) -> Self {
        Actor {
            username: username.into(),
            permissions,
        }
    }

    /// Internal jobs (seeding, migrations of data).
    pub fn system() -> Self {
        Actor::new("system", PermissionSet::all())
    }

    #[inline]
    pub fn require(&self, capability: Capability) -> CoreResult<()> {
        self.permissions.require(capability)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_membership_check() {
        let cashier = PermissionSet::new(["sales:create", " Ledger:Read "]);
        assert!(cashier.allows(Capability::CreateSale));
        assert!(cashier.allows(Capability::ViewLedger));
        assert!(!cashier.allows(Capability::AdjustStock));
        assert!(matches!(
            cashier.require(Capability::ManageProducts),
            Err(CoreError::Forbidden { capability }) if capability == "products:manage"
        ));
    }

    #[test]
    fn test_wildcard_grants_everything() {
        let owner = Actor::system();
        assert!(owner.require(Capability::ViewReports).is_ok());
        assert!(owner.require(Capability::ReceiveStock).is_ok());
    }

    #[test]
    fn test_deserializes_from_claim_list() {
        let set: PermissionSet = serde_json::from_str(r#"["Sales:Return", ""]"#).unwrap();
        assert!(set.allows(Capability::RecordReturn));
        assert!(!set.allows(Capability::CreateSale));
        assert_eq!(serde_json::to_string(&set).unwrap(), r#"["sales:return"]"#);
    }
}
