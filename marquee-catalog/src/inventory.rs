use marquee_core::{BookingError, SeatId, SeatInventory, Theater};
use std::collections::BTreeSet;

/// Largest theater a roster can be built for.
pub const MAX_CAPACITY: u32 = 10_000;

pub fn validate_capacity(capacity: u32) -> Result<(), InventoryError> {
    if capacity > MAX_CAPACITY {
        return Err(InventoryError::CapacityTooLarge { capacity });
    }
    Ok(())
}

/// Builds the fixed seat roster for a new showtime.
///
/// Without an explicit list the roster is `1..=theater.capacity`. An explicit
/// list is deduplicated and must be non-empty; seat `0` is never valid.
pub fn build_roster(
    theater: &Theater,
    supplied: Option<&[SeatId]>,
) -> Result<SeatInventory, InventoryError> {
    validate_capacity(theater.capacity)?;

    let Some(seats) = supplied else {
        return Ok(SeatInventory::contiguous(theater.capacity));
    };

    if seats.is_empty() {
        return Err(InventoryError::EmptyRoster);
    }
    if seats.contains(&SeatId(0)) {
        return Err(InventoryError::InvalidSeat(SeatId(0)));
    }

    let unique: BTreeSet<SeatId> = seats.iter().copied().collect();
    if unique.len() > theater.capacity as usize {
        return Err(InventoryError::ExceedsCapacity {
            requested: unique.len(),
            capacity: theater.capacity,
        });
    }

    Ok(SeatInventory::from_seats(unique))
}

#[derive(Debug, thiserror::Error)]
pub enum InventoryError {
    #[error("Seat roster must not be empty")]
    EmptyRoster,

    #[error("Seat {0} is not a valid seat number")]
    InvalidSeat(SeatId),

    #[error("Seat roster of {requested} seats exceeds theater capacity {capacity}")]
    ExceedsCapacity { requested: usize, capacity: u32 },

    #[error("Capacity {capacity} exceeds the maximum of {max} seats", max = MAX_CAPACITY)]
    CapacityTooLarge { capacity: u32 },
}

impl From<InventoryError> for BookingError {
    fn from(err: InventoryError) -> Self {
        match err {
            InventoryError::CapacityTooLarge { .. } => BookingError::InvalidTheater(err.to_string()),
            _ => BookingError::InvalidSchedule(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn theater(capacity: u32) -> Theater {
        Theater {
            id: Uuid::new_v4(),
            name: "Roxy".to_string(),
            location: "Downtown".to_string(),
            capacity,
        }
    }

    #[test]
    fn test_default_roster_follows_capacity() {
        let roster = build_roster(&theater(10), None).unwrap();
        assert_eq!(roster.len(), 10);
        assert_eq!(roster.iter().next(), Some(SeatId(1)));
        assert_eq!(roster.iter().last(), Some(SeatId(10)));
    }

    #[test]
    fn test_supplied_roster_is_deduplicated() {
        let seats = [SeatId(12), SeatId(4), SeatId(12)];
        let roster = build_roster(&theater(10), Some(&seats)).unwrap();
        assert_eq!(roster.iter().collect::<Vec<_>>(), vec![SeatId(4), SeatId(12)]);
    }

    #[test]
    fn test_invalid_supplied_rosters() {
        assert!(matches!(
            build_roster(&theater(10), Some(&[])),
            Err(InventoryError::EmptyRoster)
        ));
        assert!(matches!(
            build_roster(&theater(10), Some(&[SeatId(0), SeatId(1)])),
            Err(InventoryError::InvalidSeat(SeatId(0)))
        ));
        assert!(matches!(
            build_roster(&theater(1), Some(&[SeatId(1), SeatId(2)])),
            Err(InventoryError::ExceedsCapacity { requested: 2, capacity: 1 })
        ));
    }

    #[test]
    fn test_capacity_is_bounded() {
        assert!(validate_capacity(MAX_CAPACITY).is_ok());
        assert!(build_roster(&theater(MAX_CAPACITY), None).is_ok());

        for capacity in [MAX_CAPACITY + 1, u32::MAX] {
            assert!(matches!(
                build_roster(&theater(capacity), None),
                Err(InventoryError::CapacityTooLarge { .. })
            ));
            assert!(matches!(
                build_roster(&theater(capacity), Some(&[SeatId(1)])),
                Err(InventoryError::CapacityTooLarge { .. })
            ));
        }
    }
}
