//! Schema descriptors stamped into registry snapshots.

use serde::{Deserialize, Serialize};

/// Semantic version describing the schema of serialized registry snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SchemaVersion {
    /// Major version incremented for breaking changes.
    pub major: u32,
    /// Minor version incremented for additive changes.
    pub minor: u32,
    /// Patch version incremented for bug fixes.
    pub patch: u32,
}

impl SchemaVersion {
    /// Snapshot schema written by this release.
    pub const CURRENT: SchemaVersion = SchemaVersion::new(1, 0, 0);

    /// Creates a new schema version descriptor.
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Returns whether a snapshot written with `other` can be read by this version.
    pub fn can_read(&self, other: &SchemaVersion) -> bool {
        self.major == other.major && self.minor >= other.minor
    }
}

impl Default for SchemaVersion {
    fn default() -> Self {
        Self::CURRENT
    }
}
