// Copyright The Rusted Firmware-A Contributors.
//
// SPDX-License-Identifier: BSD-3-Clause

//! Interface to the power sequencing routines which actually program the PRCM, PLLs, DDR PHY and
//! PMIC.
//!
//! The command handlers decide what to do and in which order; the platform provides an
//! implementation of [`PowerSequencer`] which does it.

use crate::{payload::PowerDomainState, wake::WakeSources};
use core::fmt::{self, Display, Formatter};
use num_enum::IntoPrimitive;

/// Power domains whose state the handlers control.
#[derive(Copy, Clone, Debug, Eq, PartialEq, IntoPrimitive)]
#[repr(u8)]
pub enum PowerDomain {
    /// The MPU subsystem.
    Mpu,
    /// The peripheral domain.
    Per,
}

/// Memory banks which may be placed in retention.
#[derive(Copy, Clone, Debug, Eq, PartialEq, IntoPrimitive)]
#[repr(u8)]
pub enum MemoryBank {
    /// MPU RAM.
    MpuRam,
    /// MPU L1 caches.
    MpuL1,
    /// MPU L2 cache.
    MpuL2,
    /// PRU-ICSS memory.
    PerIcss,
    /// Other PER memories.
    PerMem,
    /// OCMC RAM.
    PerOcmc,
    /// OCMC RAM bank 2.
    PerOcmc2,
}

/// A power sequencing step which failed.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SequenceError {
    /// Starting or stopping the master oscillator.
    Oscillator,
    /// Changing the state of a power domain.
    PowerDomain(PowerDomain),
    /// Changing the retention state of a memory bank.
    MemoryRetention(MemoryBank),
    /// A power domain did not reach the state it was programmed to.
    Transition(PowerDomain),
    /// Suspending or resuming the DDR I/O.
    DdrIo,
    /// Bypassing or relocking the PLLs.
    Pll,
    /// Scaling the MPU voltage.
    Voltage,
    /// Driving the VTT regulator enable.
    Vtt,
    /// Running a PMIC I2C script.
    I2cScript,
    /// Programming the RTC alarm.
    RtcAlarm,
    /// Running the standalone application.
    Standalone,
}

impl Display for SequenceError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::Oscillator => write!(f, "master oscillator control failed"),
            Self::PowerDomain(domain) => write!(f, "{domain:?} power state change failed"),
            Self::MemoryRetention(bank) => write!(f, "{bank:?} retention change failed"),
            Self::Transition(domain) => write!(f, "{domain:?} did not reach its target state"),
            Self::DdrIo => write!(f, "DDR I/O suspend or resume failed"),
            Self::Pll => write!(f, "PLL bypass or relock failed"),
            Self::Voltage => write!(f, "MPU voltage scaling failed"),
            Self::Vtt => write!(f, "VTT regulator control failed"),
            Self::I2cScript => write!(f, "PMIC I2C script failed"),
            Self::RtcAlarm => write!(f, "RTC alarm programming failed"),
            Self::Standalone => write!(f, "standalone application failed"),
        }
    }
}

/// Power sequencing operations the command handlers call.
///
/// Each fallible operation reports whether the hardware did what was asked; the handlers fold the
/// results into the status reported to the host.
pub trait PowerSequencer {
    /// Starts or stops the master oscillator in deep sleep.
    fn set_master_oscillator(&mut self, on: bool) -> Result<(), SequenceError>;

    /// Programs the number of oscillator clocks to see before leaving deep sleep.
    fn configure_deepsleep_count(&mut self, count: u16);

    /// Enables exactly the given wake sources.
    fn configure_wake_sources(&mut self, sources: WakeSources);

    /// Disables all wake sources.
    fn clear_wake_sources(&mut self);

    /// Returns the wake events latched since the wake sources were configured.
    fn pending_wake_events(&mut self) -> WakeSources;

    /// Programs the next state of a power domain.
    fn set_power_domain_state(
        &mut self,
        domain: PowerDomain,
        state: PowerDomainState,
    ) -> Result<(), SequenceError>;

    /// Restores a power domain to the state it had before the last transition.
    fn restore_power_domain(&mut self, domain: PowerDomain) -> Result<(), SequenceError>;

    /// Chooses whether a memory bank is retained or lost while its domain is in retention.
    fn set_memory_retention(
        &mut self,
        bank: MemoryBank,
        retained: bool,
    ) -> Result<(), SequenceError>;

    /// Checks that every power domain reached the state it was programmed to.
    fn verify_transitions(&mut self) -> Result<(), SequenceError>;

    /// Puts the DDR I/O into retention ahead of deep sleep.
    fn ddr_io_suspend(&mut self) -> Result<(), SequenceError>;

    /// Brings the DDR I/O out of retention.
    fn ddr_io_resume(&mut self) -> Result<(), SequenceError>;

    /// Puts the PLLs into bypass.
    fn pll_bypass(&mut self) -> Result<(), SequenceError>;

    /// Relocks the PLLs.
    fn pll_lock(&mut self) -> Result<(), SequenceError>;

    /// Lowers the MPU voltage to the given level in millivolts.
    fn set_mpu_voltage(&mut self, millivolts: u16) -> Result<(), SequenceError>;

    /// Returns the MPU voltage to its nominal level.
    fn restore_mpu_voltage(&mut self) -> Result<(), SequenceError>;

    /// Drives the DDR VTT regulator enable on the given GPIO0 pin.
    fn set_vtt(&mut self, gpio_pin: u8, high: bool) -> Result<(), SequenceError>;

    /// Arms the RTC alarm to fire after the given number of seconds.
    fn arm_rtc_alarm(&mut self, timeout_secs: u8) -> Result<(), SequenceError>;

    /// Runs the PMIC I2C script at the given offset in the shared script area.
    fn run_i2c_script(&mut self, offset: u16) -> Result<(), SequenceError>;

    /// Runs the standalone application with the two parameter words.
    fn run_standalone(&mut self, param1: u32, param2: u32) -> Result<(), SequenceError> {
        let _ = (param1, param2);
        Err(SequenceError::Standalone)
    }
}
