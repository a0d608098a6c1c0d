// Copyright The Rusted Firmware-A Contributors.
//
// SPDX-License-Identifier: BSD-3-Clause

//! The dispatch table, command classification and payload resolution.

pub mod handlers;

use crate::{
    payload::{
        DS_COUNT_DEFAULT, DeepSleepData, Payload, PowerDomainState, RTC_TIMEOUT_DEFAULT,
        RawOverride, RtcData,
    },
    platform::SocVariant,
    protocol::{
        BoardConfig, COMMAND_ID_COUNT, CommandId, DEFAULT_PAYLOAD_SENTINEL, I2cScriptOffsets,
        StatusCode,
    },
    sequencer::SequenceError,
    wake::WakeSources,
};
use core::fmt::{self, Display, Formatter};

/// Deep-sleep depths sharing the deep-sleep handler.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SleepDepth {
    /// DS0.
    Ds0,
    /// DS1.
    Ds1,
    /// DS2.
    Ds2,
    /// Standby.
    Standby,
}

impl SleepDepth {
    /// Returns whether the DDR I/O goes into retention and the PLLs into bypass at this depth.
    pub fn suspends_ddr(self) -> bool {
        !matches!(self, Self::Standby)
    }
}

/// The handler a command runs.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Handler {
    /// RTC-only mode; the fast variant keeps the PLLs locked.
    Rtc {
        /// Whether to skip the PLL bypass.
        fast: bool,
    },
    /// Deep sleep or standby at the given depth.
    DeepSleep(SleepDepth),
    /// The standalone application.
    Standalone,
    /// Re-arms the command state machine.
    ResetStateMachine,
    /// Reports the firmware version.
    Version,
}

/// One entry of the dispatch table.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct DispatchEntry {
    /// The command the entry is for.
    pub command: CommandId,
    /// The handler the command runs.
    pub handler: Handler,
    /// Default payload for general-purpose devices.
    pub gp_default: Option<Payload>,
    /// Default payload for other device types, if they need a different one.
    pub alt_default: Option<Payload>,
    /// Whether the host must provide a trigger before the command runs.
    pub needs_trigger: bool,
}

impl DispatchEntry {
    const fn power(
        command: CommandId,
        handler: Handler,
        gp_default: Option<Payload>,
        alt_default: Option<Payload>,
    ) -> Option<Self> {
        Some(Self {
            command,
            handler,
            gp_default,
            alt_default,
            needs_trigger: true,
        })
    }

    const fn control(command: CommandId, handler: Handler) -> Option<Self> {
        Some(Self {
            command,
            handler,
            gp_default: None,
            alt_default: None,
            needs_trigger: false,
        })
    }
}

/// Default RTC-mode record.
pub const RTC_DEFAULT: RtcData = RtcData::new(RTC_TIMEOUT_DEFAULT);

/// Default DS0 record: everything but PER off, OCMC RAM retained.
pub const DS0_DEFAULT: DeepSleepData = DeepSleepData::new()
    .with_oscillator(false)
    .with_deepsleep_count(DS_COUNT_DEFAULT)
    .with_mpu(PowerDomainState::Off, false, false, false)
    .with_per(PowerDomainState::Retention, false, false, true, false)
    .with_wake_sources(WakeSources::ALL_DEEP_SLEEP);

/// DS0 record for non-GP devices, which also keep the PER memories and OCMC bank 2 holding the
/// secure context.
pub const DS0_SECURE_DEFAULT: DeepSleepData =
    DS0_DEFAULT.with_per(PowerDomainState::Retention, false, true, true, true);

/// Default DS1 record: MPU off, PER kept on.
pub const DS1_DEFAULT: DeepSleepData = DeepSleepData::new()
    .with_oscillator(false)
    .with_deepsleep_count(DS_COUNT_DEFAULT)
    .with_mpu(PowerDomainState::Off, false, false, false)
    .with_per(PowerDomainState::On, false, false, false, false)
    .with_wake_sources(WakeSources::ALL_DEEP_SLEEP);

/// Default DS2 record: MPU in retention with its memories kept, PER on, oscillator running.
pub const DS2_DEFAULT: DeepSleepData = DeepSleepData::new()
    .with_oscillator(true)
    .with_deepsleep_count(DS_COUNT_DEFAULT)
    .with_mpu(PowerDomainState::Retention, true, true, true)
    .with_per(PowerDomainState::On, false, false, false, false)
    .with_wake_sources(WakeSources::ALL_DEEP_SLEEP);

/// Default standby record: MPU off, PER on, oscillator running, MPU wake allowed.
pub const STANDBY_DEFAULT: DeepSleepData = DeepSleepData::new()
    .with_oscillator(true)
    .with_deepsleep_count(DS_COUNT_DEFAULT)
    .with_mpu(PowerDomainState::Off, false, false, false)
    .with_per(PowerDomainState::On, false, false, false, false)
    .with_wake_sources(WakeSources::ALL_DEEP_SLEEP.union(WakeSources::MPU));

/// Standby record for non-GP devices: the MPU is kept in retention with its RAM and L2.
pub const STANDBY_SECURE_DEFAULT: DeepSleepData =
    STANDBY_DEFAULT.with_mpu(PowerDomainState::Retention, true, false, true);

/// The dispatch table, indexed by command identifier. `None` marks a reserved identifier.
pub static DISPATCH_TABLE: [Option<DispatchEntry>; COMMAND_ID_COUNT as usize] = [
    // 0x0
    None,
    DispatchEntry::power(
        CommandId::Rtc,
        Handler::Rtc { fast: false },
        Some(Payload::Rtc(RTC_DEFAULT)),
        None,
    ),
    DispatchEntry::power(
        CommandId::RtcFast,
        Handler::Rtc { fast: true },
        Some(Payload::Rtc(RTC_DEFAULT)),
        None,
    ),
    DispatchEntry::power(
        CommandId::Ds0,
        Handler::DeepSleep(SleepDepth::Ds0),
        Some(Payload::DeepSleep(DS0_DEFAULT)),
        Some(Payload::DeepSleep(DS0_SECURE_DEFAULT)),
    ),
    // 0x4
    None,
    DispatchEntry::power(
        CommandId::Ds1,
        Handler::DeepSleep(SleepDepth::Ds1),
        Some(Payload::DeepSleep(DS1_DEFAULT)),
        None,
    ),
    // 0x6
    None,
    DispatchEntry::power(
        CommandId::Ds2,
        Handler::DeepSleep(SleepDepth::Ds2),
        Some(Payload::DeepSleep(DS2_DEFAULT)),
        None,
    ),
    // 0x8
    None,
    DispatchEntry::power(CommandId::Standalone, Handler::Standalone, None, None),
    // 0xa
    None,
    DispatchEntry::power(
        CommandId::Standby,
        Handler::DeepSleep(SleepDepth::Standby),
        Some(Payload::DeepSleep(STANDBY_DEFAULT)),
        Some(Payload::DeepSleep(STANDBY_SECURE_DEFAULT)),
    ),
    // 0xc, 0xd
    None,
    None,
    DispatchEntry::control(CommandId::ResetStateMachine, Handler::ResetStateMachine),
    DispatchEntry::control(CommandId::Version, Handler::Version),
];

/// Errors which end a dispatch cycle with a `Fail` status.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum DispatchError {
    /// The identifier is out of range or has no handler.
    InvalidCommand(u16),
    /// The host asked for the default payload but none applies to this device.
    PayloadUnavailable(CommandId),
    /// The payload does not describe a valid transition for the command.
    InvalidPayload(CommandId),
    /// A wake was signalled without a transition having been entered.
    NoPendingWake,
    /// A trigger arrived without a command waiting for one.
    NoPendingTrigger,
    /// A trigger arrived but `STAT_ID` no longer names the command waiting for it.
    TriggerMismatch {
        /// The command held for the trigger.
        held: CommandId,
        /// The identifier now in `STAT_ID`.
        posted: u16,
    },
    /// The power sequencing routines reported a failure.
    Sequencing(SequenceError),
}

impl From<SequenceError> for DispatchError {
    fn from(e: SequenceError) -> Self {
        Self::Sequencing(e)
    }
}

impl From<DispatchError> for StatusCode {
    fn from(_: DispatchError) -> Self {
        StatusCode::Fail
    }
}

impl Display for DispatchError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::InvalidCommand(id) => write!(f, "invalid command id {id:#x}"),
            Self::PayloadUnavailable(command) => {
                write!(f, "no default payload for {command} on this device")
            }
            Self::InvalidPayload(command) => write!(f, "invalid payload for {command}"),
            Self::NoPendingWake => write!(f, "wake without a pending transition"),
            Self::NoPendingTrigger => write!(f, "trigger without a pending command"),
            Self::TriggerMismatch { held, posted } => {
                write!(f, "trigger for {held} but {posted:#x} was posted")
            }
            Self::Sequencing(e) => write!(f, "{e}"),
        }
    }
}

/// Per-dispatch state handed to a handler.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct CommandContext {
    /// The command being run.
    pub command: CommandId,
    /// The resolved payload; `None` for control commands.
    pub payload: Option<Payload>,
    /// Offsets of the PMIC I2C scripts.
    pub i2c_offsets: I2cScriptOffsets,
    /// Board data.
    pub board: BoardConfig,
}

/// Looks up the dispatch table entry for a raw command identifier.
///
/// The range is checked before the table so that identifiers beyond the table are never used to
/// index it; an in-range identifier with no entry is as invalid as an out-of-range one.
pub fn lookup(command_id: u16) -> Result<&'static DispatchEntry, DispatchError> {
    if command_id == 0 || command_id >= COMMAND_ID_COUNT {
        return Err(DispatchError::InvalidCommand(command_id));
    }
    DISPATCH_TABLE[usize::from(command_id)]
        .as_ref()
        .ok_or(DispatchError::InvalidCommand(command_id))
}

/// Returns whether the host must wait for a trigger handshake before `command` runs.
pub fn needs_trigger(command: CommandId) -> bool {
    DISPATCH_TABLE[usize::from(u16::from(command))]
        .as_ref()
        .is_some_and(|entry| entry.needs_trigger)
}

/// Chooses the payload a power-transition handler runs with.
///
/// If both parameter words hold the sentinel the host wants a compiled-in default: the alternate
/// one on non-GP devices when the command has one, otherwise the GP one. Any other pair of words
/// is passed through as a raw override whatever the device type.
pub fn resolve(
    entry: &DispatchEntry,
    param1: u32,
    param2: u32,
    variant: SocVariant,
) -> Result<Payload, DispatchError> {
    if param1 == DEFAULT_PAYLOAD_SENTINEL && param2 == DEFAULT_PAYLOAD_SENTINEL {
        let alternate = if variant.is_general_purpose() {
            None
        } else {
            entry.alt_default
        };
        alternate
            .or(entry.gp_default)
            .ok_or(DispatchError::PayloadUnavailable(entry.command))
    } else {
        Ok(Payload::Raw(RawOverride { param1, param2 }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SENTINEL: u32 = DEFAULT_PAYLOAD_SENTINEL;

    const VARIANTS: [SocVariant; 4] = [
        SocVariant::Test,
        SocVariant::Emulation,
        SocVariant::HighSecurity,
        SocVariant::GeneralPurpose,
    ];

    fn power_commands() -> impl Iterator<Item = &'static DispatchEntry> {
        DISPATCH_TABLE
            .iter()
            .flatten()
            .filter(|entry| !entry.command.is_control())
    }

    #[test]
    fn table_is_indexed_by_command_id() {
        for (index, entry) in DISPATCH_TABLE.iter().enumerate() {
            match (entry, CommandId::try_from(index as u16)) {
                (Some(entry), Ok(command)) => assert_eq!(entry.command, command),
                (None, Err(_)) => {}
                (entry, command) => panic!("Mismatch at {index:#x}: {entry:?} {command:?}"),
            }
        }
    }

    #[test]
    fn lookup_rejects_everything_outside_the_enumeration() {
        for raw in 0..=u16::MAX {
            let valid = matches!(raw, 0x1 | 0x2 | 0x3 | 0x5 | 0x7 | 0x9 | 0xb | 0xe | 0xf);
            match lookup(raw) {
                Ok(entry) => {
                    assert!(valid, "{raw:#x} should be invalid");
                    assert_eq!(u16::from(entry.command), raw);
                }
                Err(e) => {
                    assert!(!valid, "{raw:#x} should be valid");
                    assert_eq!(e, DispatchError::InvalidCommand(raw));
                }
            }
        }
    }

    #[test]
    fn only_control_commands_skip_the_trigger() {
        for entry in DISPATCH_TABLE.iter().flatten() {
            let expected = !matches!(
                entry.command,
                CommandId::Version | CommandId::ResetStateMachine
            );
            assert_eq!(needs_trigger(entry.command), expected, "{}", entry.command);
        }
    }

    #[test]
    fn control_commands_carry_no_payload() {
        for command in [CommandId::Version, CommandId::ResetStateMachine] {
            let entry = lookup(command.into()).unwrap();
            assert_eq!(entry.gp_default, None);
            assert_eq!(entry.alt_default, None);
        }
    }

    #[test]
    fn sentinel_selects_default_for_variant() {
        for entry in power_commands() {
            for variant in VARIANTS {
                let expected = match (variant.is_general_purpose(), entry.alt_default) {
                    (false, Some(alternate)) => Ok(alternate),
                    _ => entry
                        .gp_default
                        .ok_or(DispatchError::PayloadUnavailable(entry.command)),
                };
                assert_eq!(
                    resolve(entry, SENTINEL, SENTINEL, variant),
                    expected,
                    "{} on {variant:?}",
                    entry.command
                );
            }
        }
    }

    #[test]
    fn secure_variant_uses_alternate() {
        let ds0 = lookup(CommandId::Ds0.into()).unwrap();
        assert_eq!(
            resolve(ds0, SENTINEL, SENTINEL, SocVariant::HighSecurity),
            Ok(Payload::DeepSleep(DS0_SECURE_DEFAULT))
        );
        assert_eq!(
            resolve(ds0, SENTINEL, SENTINEL, SocVariant::GeneralPurpose),
            Ok(Payload::DeepSleep(DS0_DEFAULT))
        );

        // DS1 has no alternate, so every device type gets the GP default.
        let ds1 = lookup(CommandId::Ds1.into()).unwrap();
        assert_eq!(
            resolve(ds1, SENTINEL, SENTINEL, SocVariant::Emulation),
            Ok(Payload::DeepSleep(DS1_DEFAULT))
        );
    }

    #[test]
    fn standalone_has_no_default() {
        let standalone = lookup(CommandId::Standalone.into()).unwrap();
        assert_eq!(
            resolve(standalone, SENTINEL, SENTINEL, SocVariant::GeneralPurpose),
            Err(DispatchError::PayloadUnavailable(CommandId::Standalone))
        );
    }

    #[test]
    fn override_passed_through_for_every_variant() {
        let pairs = [
            (0x1234, 0x0),
            (SENTINEL, 0x0),
            (0x0, SENTINEL),
            (0xffff_fffe, SENTINEL),
        ];
        for entry in power_commands() {
            for variant in VARIANTS {
                for (param1, param2) in pairs {
                    assert_eq!(
                        resolve(entry, param1, param2, variant),
                        Ok(Payload::Raw(RawOverride { param1, param2 }))
                    );
                }
            }
        }
    }

    #[test]
    fn errors_report_fail() {
        assert_eq!(
            StatusCode::from(DispatchError::InvalidCommand(0xd)),
            StatusCode::Fail
        );
        assert_eq!(
            StatusCode::from(DispatchError::from(SequenceError::Pll)),
            StatusCode::Fail
        );
    }
}
