//! Strongly typed identifier wrappers.
//!
//! The road network uses dense integer ids (`NodeId`, `EdgeId`) so CSR arrays
//! can be indexed directly.  Everything else — agents, buildings, packages,
//! sites — is identified by an opaque string, mirroring how they are created
//! (by a generator or an external `agent.create` action) rather than by
//! position in a dense array.

use std::fmt;
use std::sync::Arc;

/// Generate a typed ID wrapper around a dense primitive integer.
macro_rules! typed_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident($inner:ty);) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, serde::Serialize, serde::Deserialize)]
        $vis struct $name(pub $inner);

        impl $name {
            /// Sentinel meaning "no valid ID".
            pub const INVALID: $name = $name(<$inner>::MAX);

            #[inline(always)]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl Default for $name {
            #[inline(always)]
            fn default() -> Self {
                Self::INVALID
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl From<$name> for usize {
            #[inline(always)]
            fn from(id: $name) -> usize {
                id.0 as usize
            }
        }

        impl TryFrom<usize> for $name {
            type Error = std::num::TryFromIntError;
            fn try_from(n: usize) -> Result<$name, Self::Error> {
                <$inner>::try_from(n).map($name)
            }
        }
    };
}

typed_id! {
    /// Index of a road-network node. Max ~4.3 billion nodes.
    pub struct NodeId(u32);
}

typed_id! {
    /// Index of a directed road-network edge.
    pub struct EdgeId(u32);
}

impl NodeId {
    /// Dense index of the first node ever allocated.
    pub const FIRST: NodeId = NodeId(0);
}

/// Generate an opaque, string-backed ID wrapper.
///
/// The inner value is `Arc<str>` rather than `String` so cloning an id (which
/// happens constantly — every message, every route step, every queue entry)
/// is a refcount bump rather than an allocation.
macro_rules! opaque_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident;) => {
        $(#[$attr])*
        #[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, serde::Serialize, serde::Deserialize)]
        $vis struct $name(Arc<str>);

        impl $name {
            pub fn new(s: impl Into<Arc<str>>) -> Self {
                Self(s.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s.into())
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.into())
            }
        }
    };
}

opaque_id! {
    /// Identifies an agent (truck or broker) across the lifetime of a run.
    pub struct AgentId;
}

opaque_id! {
    /// Identifies a building. Shared address space with [`SiteId`]: every
    /// `SiteId` is also a valid `BuildingId` referring to the same record,
    /// since `Site` is a `Building` variant (see `dt-agent::Building`).
    pub struct BuildingId;
}

opaque_id! {
    /// Identifies a package for its entire lifecycle, including after
    /// delivery or expiry (retained in event records).
    pub struct PackageId;
}

opaque_id! {
    /// Identifies a site. A `SiteId` and the `BuildingId` of the same site
    /// carry identical text — callers needing the building side of a site
    /// use [`SiteId::as_building_id`].
    pub struct SiteId;
}

impl SiteId {
    pub fn as_building_id(&self) -> BuildingId {
        BuildingId::new(self.0.clone())
    }
}

impl BuildingId {
    pub fn as_site_id(&self) -> SiteId {
        SiteId::new(self.0.clone())
    }
}
