//! Memory bank programming
//!
//! Programming is clear-then-write: every slot of the model's range is
//! emptied first, then the supplied records are written to consecutive
//! slots starting at 1. The resulting bank therefore never depends on
//! what was stored before.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{BankError, ConfigError};
use crate::memory::{ChannelMemory, MemoryRecord};

/// Inclusive slot range of a memory bank
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MemoryRange {
    pub lower: u32,
    pub upper: u32,
}

impl MemoryRange {
    pub const fn new(lower: u32, upper: u32) -> Self {
        Self { lower, upper }
    }

    /// Every addressable slot
    pub fn slots(&self) -> RangeInclusive<u32> {
        self.lower..=self.upper
    }

    /// Number of addressable slots
    pub fn len(&self) -> usize {
        if self.upper < self.lower {
            0
        } else {
            (self.upper - self.lower) as usize + 1
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, slot: u32) -> bool {
        self.slots().contains(&slot)
    }

    /// Slots records can be programmed into (from slot 1 upwards)
    pub fn programmable(&self) -> RangeInclusive<u32> {
        self.lower.max(1)..=self.upper
    }

    /// Number of records that fit
    pub fn capacity(&self) -> usize {
        let slots = self.programmable();
        if slots.is_empty() || *slots.start() > 1 {
            0
        } else {
            (slots.end() - slots.start()) as usize + 1
        }
    }

    /// Fails with [`BankError::SlotOutOfRange`] if `slot` is not addressable
    pub fn check(&self, slot: u32) -> Result<(), BankError> {
        if self.contains(slot) {
            Ok(())
        } else {
            Err(BankError::SlotOutOfRange {
                slot,
                lower: self.lower,
                upper: self.upper,
            })
        }
    }
}

impl std::fmt::Display for MemoryRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.lower, self.upper)
    }
}

/// Slot-level access to a radio's memory bank
pub trait MemoryBank {
    fn get(&self, slot: u32) -> Result<ChannelMemory, BankError>;
    fn set(&mut self, slot: u32, memory: ChannelMemory) -> Result<(), BankError>;
}

/// Clear `range` in `bank`, then write `records` into slots 1, 2, ...
///
/// Each record's `number` is overwritten with the slot it lands in. The
/// record count is checked against the range before anything is written,
/// so an oversized list leaves the bank untouched.
pub fn program<B>(
    bank: &mut B,
    range: MemoryRange,
    records: Vec<MemoryRecord>,
    verbose: bool,
) -> Result<usize, ConfigError>
where
    B: MemoryBank + ?Sized,
{
    let capacity = range.capacity();
    if records.len() > capacity {
        return Err(ConfigError::MemoryRangeExceeded {
            count: records.len(),
            capacity,
        });
    }

    info!("Clearing memory slots {}", range);
    clear(bank, range)?;

    info!("Programming {} memories", records.len());
    let count = records.len();
    for (slot, mut record) in (1u32..).zip(records) {
        record.number = slot;
        if verbose {
            info!("{}", record);
        } else {
            debug!("{}", record);
        }
        bank.set(slot, record.into())?;
    }

    Ok(count)
}

fn clear<B>(bank: &mut B, range: MemoryRange) -> Result<(), BankError>
where
    B: MemoryBank + ?Sized,
{
    for slot in range.slots() {
        let mut mem = bank.get(slot)?;
        mem.empty = true;
        bank.set(slot, mem)?;
    }
    Ok(())
}
