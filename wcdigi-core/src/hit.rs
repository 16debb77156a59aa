//! Digitized hit and subsystem types.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Photomultiplier subsystem of a hybrid detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Subsystem {
    /// Inner detector (20-inch PMTs).
    Inner,
    /// Outer detector / veto (3-inch mPMTs).
    Outer,
}

impl Subsystem {
    /// Both subsystems in processing order.
    pub const ALL: [Subsystem; 2] = [Subsystem::Inner, Subsystem::Outer];

    /// Returns the geometry index (0 = ID, 1 = OD).
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Subsystem::Inner => 0,
            Subsystem::Outer => 1,
        }
    }

    /// Table-name suffix used in output stores.
    #[must_use]
    pub fn suffix(self) -> &'static str {
        match self {
            Subsystem::Inner => "20",
            Subsystem::Outer => "3",
        }
    }

    /// Tube id this subsystem records for a hit.
    ///
    /// The inner detector reports the primary tube id while the outer
    /// detector reports the id relative to its mPMT module.
    #[inline]
    #[must_use]
    pub fn tube_id_of(self, hit: &DigiHit) -> i32 {
        match self {
            Subsystem::Inner => hit.tube_id,
            Subsystem::Outer => hit.mpmt_pmt_id,
        }
    }
}

/// A single digitized photomultiplier pulse.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DigiHit {
    /// Primary tube id.
    pub tube_id: i32,
    /// Tube id relative to its mPMT module.
    pub mpmt_pmt_id: i32,
    /// Hit time (ns).
    pub t: f64,
    /// Digitized charge (p.e.).
    pub q: f64,
}

impl DigiHit {
    /// Creates a hit whose primary and mPMT-relative ids coincide.
    #[inline]
    #[must_use]
    pub fn new(tube_id: i32, t: f64, q: f64) -> Self {
        Self {
            tube_id,
            mpmt_pmt_id: tube_id,
            t,
            q,
        }
    }

    /// Sets the mPMT-relative id.
    #[inline]
    #[must_use]
    pub fn with_mpmt_pmt_id(mut self, id: i32) -> Self {
        self.mpmt_pmt_id = id;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subsystem_order_and_index() {
        assert_eq!(Subsystem::ALL, [Subsystem::Inner, Subsystem::Outer]);
        assert_eq!(Subsystem::Inner.index(), 0);
        assert_eq!(Subsystem::Outer.index(), 1);
    }

    #[test]
    fn test_tube_id_is_subsystem_specific() {
        let hit = DigiHit::new(1200, 10.0, 2.5).with_mpmt_pmt_id(7);
        assert_eq!(Subsystem::Inner.tube_id_of(&hit), 1200);
        assert_eq!(Subsystem::Outer.tube_id_of(&hit), 7);
    }

    #[test]
    fn test_suffixes() {
        assert_eq!(Subsystem::Inner.suffix(), "20");
        assert_eq!(Subsystem::Outer.suffix(), "3");
    }
}
