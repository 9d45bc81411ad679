//! Mic slot board: single-occupancy speaker slots within a room.

use std::collections::{BTreeMap, HashMap};

use crate::domain::error::RoomError;
use crate::domain::value_object::{DisplayName, SlotNumber};

/// Default number of mic slots per room
pub const DEFAULT_SLOT_COUNT: u8 = 10;

/// Result of a successful slot assignment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotAssignment {
    /// The name did not hold a slot before
    Joined { slot: u8 },
    /// The name held another slot, which was vacated as part of this call
    Moved { from: u8, to: u8 },
    /// The name already held exactly this slot; nothing changed
    AlreadyHeld { slot: u8 },
}

/// Per-room mic slot occupancy.
///
/// Invariant: `slots` (slot -> holder) and `holders` (holder -> slot) are
/// exact inverses at all times. A slot has at most one holder and a holder
/// has at most one slot.
#[derive(Debug, Clone)]
pub struct MicSlotBoard {
    slot_count: u8,
    slots: BTreeMap<u8, DisplayName>,
    holders: HashMap<DisplayName, u8>,
}

impl MicSlotBoard {
    pub fn new(slot_count: u8) -> Self {
        Self {
            slot_count,
            slots: BTreeMap::new(),
            holders: HashMap::new(),
        }
    }

    /// Assign `name` to `slot`.
    ///
    /// If `name` currently holds a different slot, that slot is vacated as
    /// an atomic step of the same call and the result reports the move. If
    /// the requested slot is held by a different name, the call fails with
    /// `SlotTaken` and no state changes. Re-assigning the held slot is a
    /// harmless no-op.
    pub fn assign(
        &mut self,
        slot: SlotNumber,
        name: &DisplayName,
    ) -> Result<SlotAssignment, RoomError> {
        let slot = self.checked(slot)?;

        if let Some(holder) = self.slots.get(&slot) {
            if holder == name {
                return Ok(SlotAssignment::AlreadyHeld { slot });
            }
            return Err(RoomError::SlotTaken {
                slot,
                holder: holder.as_str().to_string(),
            });
        }

        let previous = self.holders.get(name).copied();
        if let Some(from) = previous {
            self.slots.remove(&from);
        }
        self.slots.insert(slot, name.clone());
        self.holders.insert(name.clone(), slot);

        Ok(match previous {
            Some(from) => SlotAssignment::Moved { from, to: slot },
            None => SlotAssignment::Joined { slot },
        })
    }

    /// Release the slot held by `name`.
    ///
    /// With `slot` given, releases only if that exact slot is held by
    /// `name`; with `None`, releases whichever slot the name holds.
    /// Returns the freed slot number, or `None` if nothing was freed.
    pub fn release(
        &mut self,
        slot: Option<SlotNumber>,
        name: &DisplayName,
    ) -> Result<Option<u8>, RoomError> {
        let held = match self.holders.get(name).copied() {
            Some(held) => held,
            None => {
                // Still validate the requested slot so out-of-range input is reported
                if let Some(slot) = slot {
                    self.checked(slot)?;
                }
                return Ok(None);
            }
        };

        if let Some(slot) = slot {
            let slot = self.checked(slot)?;
            if slot != held {
                return Ok(None);
            }
        }

        self.slots.remove(&held);
        self.holders.remove(name);
        Ok(Some(held))
    }

    /// Slot currently held by `name`, if any
    pub fn slot_of(&self, name: &DisplayName) -> Option<u8> {
        self.holders.get(name).copied()
    }

    /// Holder of `slot`, if any
    pub fn holder_of(&self, slot: u8) -> Option<&DisplayName> {
        self.slots.get(&slot)
    }

    /// Full slot -> holder map, ordered by slot number
    pub fn occupancy(&self) -> BTreeMap<u8, DisplayName> {
        self.slots.clone()
    }

    /// Number of occupied slots
    pub fn active_count(&self) -> usize {
        self.slots.len()
    }

    pub fn slot_count(&self) -> u8 {
        self.slot_count
    }

    fn checked(&self, slot: SlotNumber) -> Result<u8, RoomError> {
        let value = slot.value();
        if value > self.slot_count {
            return Err(RoomError::InvalidSlot {
                slot: value,
                max: self.slot_count,
            });
        }
        Ok(value)
    }
}

impl Default for MicSlotBoard {
    fn default() -> Self {
        Self::new(DEFAULT_SLOT_COUNT)
    }
}
