// Copyright The Rusted Firmware-A Contributors.
//
// SPDX-License-Identifier: BSD-3-Clause

//! Access to the eight IPC message registers shared with the host processor.
//!
//! The registers carry no hardware locking. Correctness relies on the half-duplex protocol
//! convention: the host writes the command and parameters and then signals the coprocessor, and
//! does not touch `STAT_ID` or the `PARAM*` registers again until it has observed a status report.
//! In particular the host must not modify the parameter registers between the coprocessor's read of
//! `STAT_ID` and its read of `PARAM4`; [`Mailbox::read_all`] reads them in index order.

use core::ptr::NonNull;
use num_enum::{IntoPrimitive, TryFromPrimitive};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// Number of IPC message registers.
pub const SLOT_COUNT: usize = 8;

/// The IPC message registers, by word index.
#[derive(Copy, Clone, Debug, Eq, PartialEq, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum Slot {
    /// Resume address / resume signal from the host.
    Resume = 0,
    /// Command id (bits 0-15, host) and status (bits 16-31, coprocessor).
    StatId = 1,
    /// First override word or command-specific parameter.
    Param1 = 2,
    /// Second override word or command-specific parameter.
    Param2 = 3,
    /// Board data: memory type, VTT toggle and VTT GPIO pin.
    Param3 = 4,
    /// I2C sleep script offset (bits 0-15) and wake script offset (bits 16-31).
    Param4 = 5,
    /// Wake reason (bits 0-7), written by the coprocessor.
    Trace = 6,
    /// Reserved for customer use.
    Cust = 7,
}

impl Slot {
    /// All slots in index order.
    pub const ALL: [Self; SLOT_COUNT] = [
        Self::Resume,
        Self::StatId,
        Self::Param1,
        Self::Param2,
        Self::Param3,
        Self::Param4,
        Self::Trace,
        Self::Cust,
    ];

    /// Returns the word index of the slot.
    pub fn index(self) -> usize {
        usize::from(u8::from(self))
    }
}

/// A copy of all eight registers taken at one point in the protocol.
#[derive(Clone, Debug, Default, Eq, PartialEq, FromBytes, Immutable, IntoBytes, KnownLayout)]
#[repr(C)]
pub struct IpcSnapshot {
    regs: [u32; SLOT_COUNT],
}

impl IpcSnapshot {
    /// Returns the value of the given slot.
    pub fn get(&self, slot: Slot) -> u32 {
        self.regs[slot.index()]
    }

    /// Sets the value of the given slot.
    pub fn set(&mut self, slot: Slot, value: u32) {
        self.regs[slot.index()] = value;
    }
}

/// Typed access to the IPC message registers.
///
/// Implementations perform exactly one memory transaction per call and no validation.
pub trait Mailbox {
    /// Reads one register.
    fn read(&mut self, slot: Slot) -> u32;

    /// Writes one register.
    fn write(&mut self, slot: Slot, value: u32);

    /// Reads every register, in index order.
    fn read_all(&mut self) -> IpcSnapshot {
        let mut snapshot = IpcSnapshot::default();
        for slot in Slot::ALL {
            snapshot.set(slot, self.read(slot));
        }
        snapshot
    }

    /// Writes every register, in index order.
    fn write_all(&mut self, snapshot: &IpcSnapshot) {
        for slot in Slot::ALL {
            self.write(slot, snapshot.get(slot));
        }
    }

    /// Zeroes every register.
    fn clear_all(&mut self) {
        self.write_all(&IpcSnapshot::default());
    }

    /// Replaces the bits of `slot` selected by `mask` with those of `value`, keeping the rest.
    fn modify(&mut self, slot: Slot, mask: u32, value: u32) {
        let old = self.read(slot);
        self.write(slot, (old & !mask) | (value & mask));
    }
}

/// A mailbox backed by the memory-mapped IPC message registers.
pub struct MmioMailbox {
    base: NonNull<u32>,
}

impl MmioMailbox {
    /// Creates a mailbox for the register window starting at `base`.
    ///
    /// # Safety
    ///
    /// `base` must point to `SLOT_COUNT` consecutive, word-aligned 32-bit registers which are valid
    /// for volatile reads and writes for the lifetime of the returned value, and nothing else in
    /// the coprocessor firmware may access them while it exists.
    pub const unsafe fn new(base: NonNull<u32>) -> Self {
        Self { base }
    }
}

// SAFETY: The mailbox only holds the address of device registers, which may be accessed from any
// context, and `MmioMailbox::new` requires exclusive use of them.
unsafe impl Send for MmioMailbox {}

impl Mailbox for MmioMailbox {
    fn read(&mut self, slot: Slot) -> u32 {
        // SAFETY: `slot.index()` is less than `SLOT_COUNT`, so by the contract of `new` the address
        // is a valid register.
        unsafe { self.base.add(slot.index()).read_volatile() }
    }

    fn write(&mut self, slot: Slot, value: u32) {
        // SAFETY: `slot.index()` is less than `SLOT_COUNT`, so by the contract of `new` the address
        // is a valid register which we have exclusive access to.
        unsafe { self.base.add(slot.index()).write_volatile(value) }
    }
}
