//! Detector geometry record.

use crate::hit::Subsystem;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// PMT capacity of each subsystem, read once from the geometry table.
///
/// Purely informational: hit tube ids are not checked against it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GeometryInfo {
    num_pmt: [i32; 2],
}

impl GeometryInfo {
    /// Creates a geometry record from ID and OD PMT counts.
    #[must_use]
    pub fn new(num_pmt_inner: i32, num_pmt_outer: i32) -> Self {
        Self {
            num_pmt: [num_pmt_inner, num_pmt_outer],
        }
    }

    /// Number of PMTs in a subsystem.
    #[inline]
    #[must_use]
    pub fn num_pmt(&self, subsystem: Subsystem) -> i32 {
        self.num_pmt[subsystem.index()]
    }
}
