// Copyright The Rusted Firmware-A Contributors.
//
// SPDX-License-Identifier: BSD-3-Clause

//! Types and helpers for the words exchanged over the IPC mailbox.

use core::fmt::{self, Debug, Display, Formatter};
use num_enum::{IntoPrimitive, TryFromPrimitive};

const COMMAND_ID_MASK: u32 = 0x0000_ffff;
const STATUS_SHIFT: u8 = 16;

const MEM_TYPE_MASK: u32 = 0x7;
const MEM_TYPE_SHIFT: u8 = 0;
const VTT_STAT_MASK: u32 = 0x1 << VTT_STAT_SHIFT;
const VTT_STAT_SHIFT: u8 = 3;
const VTT_GPIO_PIN_MASK: u32 = 0x3f << VTT_GPIO_PIN_SHIFT;
const VTT_GPIO_PIN_SHIFT: u8 = 4;

const I2C_SLEEP_OFFSET_MASK: u32 = 0x0000_ffff;
const I2C_WAKE_OFFSET_SHIFT: u8 = 16;

const WAKE_REASON_MASK: u32 = 0xff;
const FIRMWARE_VERSION_MASK: u32 = 0x0000_ffff;

/// Both parameter words hold this value when the host wants the compiled-in default payload.
pub const DEFAULT_PAYLOAD_SENTINEL: u32 = 0xffff_ffff;

/// I2C script offset meaning that no script was loaded.
pub const NO_I2C_SCRIPT: u16 = 0xffff;

/// Upper bound (exclusive) of the command identifier space.
pub const COMMAND_ID_COUNT: u16 = 0x10;

/// Command identifiers understood by the firmware.
///
/// The gaps between the values are reserved and never valid.
#[derive(Copy, Clone, Debug, Eq, PartialEq, IntoPrimitive, TryFromPrimitive)]
#[repr(u16)]
pub enum CommandId {
    /// RTC-only mode, woken by the RTC alarm.
    Rtc = 0x1,
    /// RTC-only mode with the PLLs kept locked for a faster exit.
    RtcFast = 0x2,
    /// Deepest deep-sleep state.
    Ds0 = 0x3,
    /// Intermediate deep-sleep state.
    Ds1 = 0x5,
    /// Shallowest deep-sleep state.
    Ds2 = 0x7,
    /// Runs the standalone application.
    Standalone = 0x9,
    /// Standby, with the master oscillator kept on.
    Standby = 0xb,
    /// Re-arms the command state machine.
    ResetStateMachine = 0xe,
    /// Queries the firmware version.
    Version = 0xf,
}

impl CommandId {
    /// Returns whether this is a control command rather than a power transition.
    pub fn is_control(self) -> bool {
        matches!(self, Self::ResetStateMachine | Self::Version)
    }
}

impl Display for CommandId {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{:?} ({:#x})", self, u16::from(*self))
    }
}

/// Status codes written by the coprocessor into the upper half of `STAT_ID`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, IntoPrimitive, TryFromPrimitive)]
#[repr(u16)]
pub enum StatusCode {
    /// The command completed successfully.
    Pass = 0x0,
    /// The command was rejected or failed.
    Fail = 0x1,
    /// The command was accepted and the host must now provide the trigger.
    WaitForAck = 0x2,
}

/// The `STAT_ID` register: command id in bits 0-15, status in bits 16-31.
#[derive(Copy, Clone, Default, Eq, PartialEq)]
#[repr(transparent)]
pub struct StatId(pub u32);

impl StatId {
    /// Builds a `STAT_ID` value from its two halves.
    pub const fn new(command_id: u16, status: StatusCode) -> Self {
        Self(((status as u32) << STATUS_SHIFT) | command_id as u32)
    }

    /// Returns the raw command identifier written by the host.
    pub fn command_id(self) -> u16 {
        (self.0 & COMMAND_ID_MASK) as u16
    }

    /// Returns the raw status half.
    pub fn raw_status(self) -> u16 {
        (self.0 >> STATUS_SHIFT) as u16
    }

    /// Returns the decoded status, if it is one the protocol knows about.
    pub fn status(self) -> Option<StatusCode> {
        StatusCode::try_from(self.raw_status()).ok()
    }

    /// Returns a copy with the status half replaced and the command id echo kept.
    pub fn with_status(self, status: StatusCode) -> Self {
        Self((self.0 & COMMAND_ID_MASK) | (u32::from(u16::from(status)) << STATUS_SHIFT))
    }
}

impl Debug for StatId {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(
            f,
            "{:#010x} (command {:#x}, status {:?})",
            self.0,
            self.command_id(),
            self.status()
        )
    }
}

/// Type of external memory fitted to the board, from `PARAM3`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum MemoryType {
    /// DDR2 SDRAM.
    Ddr2 = 2,
    /// DDR3 SDRAM.
    Ddr3 = 3,
}

/// Board-specific data packed into `PARAM3`.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct BoardConfig {
    /// The external memory type, or `None` if the host sent an unknown value.
    pub memory_type: Option<MemoryType>,
    /// Whether the DDR VTT regulator must be toggled around deep sleep.
    pub vtt_toggle: bool,
    /// The GPIO0 pin controlling the VTT regulator.
    pub vtt_gpio_pin: u8,
}

impl BoardConfig {
    /// Decodes the packed `PARAM3` word.
    pub fn from_param3(value: u32) -> Self {
        let memory_type = ((value & (MEM_TYPE_MASK << MEM_TYPE_SHIFT)) >> MEM_TYPE_SHIFT) as u8;
        Self {
            memory_type: MemoryType::try_from(memory_type).ok(),
            vtt_toggle: value & VTT_STAT_MASK != 0,
            vtt_gpio_pin: ((value & VTT_GPIO_PIN_MASK) >> VTT_GPIO_PIN_SHIFT) as u8,
        }
    }
}

/// Offsets of the PMIC I2C scripts in the shared script area, packed into `PARAM4`.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct I2cScriptOffsets {
    /// Offset of the script run on the way into a low-power state.
    pub sleep: u16,
    /// Offset of the script run on the way out of a low-power state.
    pub wake: u16,
}

impl I2cScriptOffsets {
    /// Decodes the packed `PARAM4` word.
    pub fn from_param4(value: u32) -> Self {
        Self {
            sleep: (value & I2C_SLEEP_OFFSET_MASK) as u16,
            wake: (value >> I2C_WAKE_OFFSET_SHIFT) as u16,
        }
    }

    /// Returns the sleep script offset, unless no sleep script was loaded.
    pub fn sleep_script(&self) -> Option<u16> {
        (self.sleep != NO_I2C_SCRIPT).then_some(self.sleep)
    }

    /// Returns the wake script offset, unless no wake script was loaded.
    pub fn wake_script(&self) -> Option<u16> {
        (self.wake != NO_I2C_SCRIPT).then_some(self.wake)
    }
}

impl Default for I2cScriptOffsets {
    fn default() -> Self {
        Self {
            sleep: NO_I2C_SCRIPT,
            wake: NO_I2C_SCRIPT,
        }
    }
}

/// Returns `trace` with its wake-reason byte replaced by `reason`.
pub fn trace_with_wake_reason(trace: u32, reason: u8) -> u32 {
    (trace & !WAKE_REASON_MASK) | u32::from(reason)
}

/// Returns `param1` with its low half replaced by the firmware version.
pub fn param1_with_version(param1: u32, version: u16) -> u32 {
    (param1 & !FIRMWARE_VERSION_MASK) | u32::from(version)
}
