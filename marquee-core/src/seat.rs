use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// One seat within a showtime's roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeatId(pub u32);

impl SeatId {
    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for SeatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for SeatId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

/// The fixed seat roster of a showtime.
///
/// There is no mutation API: which seats are free is always derived from the
/// reservation ledger, never stored here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeatInventory {
    seats: BTreeSet<SeatId>,
}

impl SeatInventory {
    /// Seats `1..=capacity`.
    pub fn contiguous(capacity: u32) -> Self {
        Self {
            seats: (1..=capacity).map(SeatId).collect(),
        }
    }

    pub fn from_seats<I>(seats: I) -> Self
    where
        I: IntoIterator<Item = SeatId>,
    {
        Self {
            seats: seats.into_iter().collect(),
        }
    }

    pub fn capacity(&self) -> &BTreeSet<SeatId> {
        &self.seats
    }

    pub fn contains(&self, seat: SeatId) -> bool {
        self.seats.contains(&seat)
    }

    pub fn len(&self) -> usize {
        self.seats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seats.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = SeatId> + '_ {
        self.seats.iter().copied()
    }

    /// First seat of `requested`, in request order, that is not part of the roster.
    pub fn first_unknown(&self, requested: &[SeatId]) -> Option<SeatId> {
        requested.iter().copied().find(|seat| !self.contains(*seat))
    }

    /// Roster minus `taken`, ascending.
    pub fn available(&self, taken: &BTreeSet<SeatId>) -> Vec<SeatId> {
        self.seats.difference(taken).copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contiguous_roster() {
        let inventory = SeatInventory::contiguous(3);
        assert_eq!(inventory.len(), 3);
        assert!(inventory.contains(SeatId(1)));
        assert!(inventory.contains(SeatId(3)));
        assert!(!inventory.contains(SeatId(0)));
        assert!(!inventory.contains(SeatId(4)));
    }

    #[test]
    fn test_first_unknown_keeps_request_order() {
        let inventory = SeatInventory::contiguous(10);
        let requested = [SeatId(2), SeatId(99), SeatId(11)];
        assert_eq!(inventory.first_unknown(&requested), Some(SeatId(99)));
        assert_eq!(inventory.first_unknown(&[SeatId(1), SeatId(10)]), None);
    }

    #[test]
    fn test_available_excludes_taken() {
        let inventory = SeatInventory::from_seats([SeatId(5), SeatId(1), SeatId(3)]);
        let taken: BTreeSet<SeatId> = [SeatId(3)].into_iter().collect();
        assert_eq!(inventory.available(&taken), vec![SeatId(1), SeatId(5)]);
    }

    #[test]
    fn test_roster_serializes_as_plain_list() {
        let inventory = SeatInventory::contiguous(2);
        assert_eq!(serde_json::to_string(&inventory).unwrap(), "[1,2]");
    }
}
