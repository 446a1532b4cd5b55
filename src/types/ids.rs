use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifies a census sector. Assigned sequentially at load time, in input order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SectorId(pub u32);

/// Identifies a seed point, as given by the input data.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SeedId(pub u32);

/// Identifies an aggregation unit within one district.
///
/// Ids start from `1`. The reserved sentinel `AcdpId::UNSET` marks a sector
/// that is not assigned to any unit, mirroring the `0 = unassigned` slot of a
/// partition's assignment vector.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AcdpId(pub u32);

impl AcdpId {
    /// Sentinel for "no unit".
    pub const UNSET: Self = Self(0);

    #[inline] pub fn is_unset(self) -> bool { self == Self::UNSET }
}

impl fmt::Display for SectorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sector#{}", self.0)
    }
}

impl fmt::Display for SeedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "seed#{}", self.0)
    }
}

impl fmt::Display for AcdpId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unset() {
            write!(f, "acdp#UNSET")
        } else {
            write!(f, "acdp#{}", self.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_sentinel_is_zero() {
        assert_eq!(AcdpId::UNSET.0, 0);
        assert!(AcdpId::UNSET.is_unset());
        assert!(!AcdpId(1).is_unset());
    }

    #[test]
    fn display() {
        assert_eq!(SectorId(7).to_string(), "sector#7");
        assert_eq!(SeedId(3).to_string(), "seed#3");
        assert_eq!(AcdpId(12).to_string(), "acdp#12");
        assert_eq!(AcdpId::UNSET.to_string(), "acdp#UNSET");
    }

    #[test]
    fn ordering() {
        assert!(AcdpId::UNSET < AcdpId(1));
        assert!(AcdpId(1) < AcdpId(2));
    }
}
