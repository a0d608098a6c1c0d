// Copyright The Rusted Firmware-A Contributors.
//
// SPDX-License-Identifier: BSD-3-Clause

//! The Cortex-M3 wakeup coprocessor of the TI AM335x.
//!
//! The PRCM, PLL, DDR PHY and PMIC programming lives in the board support routines linked in
//! alongside this crate; this module adapts them to [`PowerSequencer`] and provides the entry
//! points the reset and interrupt vectors call.

use super::{Platform, PlatformEngine, SocVariant};
use crate::{
    engine::Engine,
    logger::{self, LockedWriter, inmemory::MemoryLogger},
    mailbox::{Mailbox, MmioMailbox},
    payload::PowerDomainState,
    sequencer::{MemoryBank, PowerDomain, PowerSequencer, SequenceError},
    wake::WakeSources,
};
use core::ptr::NonNull;
use log::warn;
use spin::{Once, mutex::SpinMutex};

/// Base address of the IPC message registers in the control module.
const IPC_BASE: usize = 0x44e1_1328;
/// Address of the control module status register.
const CONTROL_STATUS: usize = 0x44e1_0040;

const TRACE_BUFFER_SIZE: usize = 2048;

static TRACE_LOG: LockedWriter<MemoryLogger<TRACE_BUFFER_SIZE>> =
    LockedWriter::new(MemoryLogger::new());

static ENGINE: Once<SpinMutex<PlatformEngine>> = Once::new();

unsafe extern "C" {
    safe fn pm_mosc_set(on: bool) -> i32;
    safe fn pm_ds_count_set(count: u16);
    safe fn pm_wake_sources_enable(sources: u16);
    safe fn pm_wake_sources_disable();
    safe fn pm_wake_events() -> u16;
    safe fn pm_domain_state_set(domain: u8, state: u8) -> i32;
    safe fn pm_domain_state_restore(domain: u8) -> i32;
    safe fn pm_mem_retention_set(bank: u8, retained: bool) -> i32;
    safe fn pm_domain_transitions_verify(domain: u8) -> i32;
    safe fn pm_ddr_io_suspend() -> i32;
    safe fn pm_ddr_io_resume() -> i32;
    safe fn pm_pll_bypass() -> i32;
    safe fn pm_pll_lock() -> i32;
    safe fn pm_vdd_mpu_set(millivolts: u16) -> i32;
    safe fn pm_vdd_mpu_restore() -> i32;
    safe fn pm_vtt_set(gpio_pin: u8, high: bool) -> i32;
    safe fn pm_rtc_alarm_arm(timeout_secs: u8) -> i32;
    safe fn pm_i2c_script_run(offset: u16) -> i32;
}

/// Converts the return code of a board support routine, where zero means success.
fn check(ret: i32, error: SequenceError) -> Result<(), SequenceError> {
    if ret == 0 {
        Ok(())
    } else {
        warn!("Board support routine returned {ret} ({error})");
        Err(error)
    }
}

/// The AM335x wakeup M3.
pub struct Am335x;

impl Platform for Am335x {
    type Mailbox = MmioMailbox;
    type Sequencer = Am335xSequencer;

    fn init() {
        // Only fails if a logger is already set, in which case that one is kept.
        let _ = logger::init(&TRACE_LOG);
    }

    fn soc_variant() -> SocVariant {
        // SAFETY: `CONTROL_STATUS` is the address of a readable device register, which reading has
        // no side effects.
        let status = unsafe { (CONTROL_STATUS as *const u32).read_volatile() };
        SocVariant::from_control_status(status)
    }

    unsafe fn create_mailbox() -> MmioMailbox {
        // SAFETY: `IPC_BASE` is the address of the eight IPC message registers, which are only
        // accessed through this mailbox since our caller promises to call this only once.
        unsafe { MmioMailbox::new(NonNull::new_unchecked(IPC_BASE as *mut u32)) }
    }

    fn create_sequencer() -> Am335xSequencer {
        Am335xSequencer
    }
}

/// Power sequencing through the board support routines.
pub struct Am335xSequencer;

impl PowerSequencer for Am335xSequencer {
    fn set_master_oscillator(&mut self, on: bool) -> Result<(), SequenceError> {
        check(pm_mosc_set(on), SequenceError::Oscillator)
    }

    fn configure_deepsleep_count(&mut self, count: u16) {
        pm_ds_count_set(count);
    }

    fn configure_wake_sources(&mut self, sources: WakeSources) {
        pm_wake_sources_enable(sources.bits());
    }

    fn clear_wake_sources(&mut self) {
        pm_wake_sources_disable();
    }

    fn pending_wake_events(&mut self) -> WakeSources {
        WakeSources::from_bits_truncate(pm_wake_events())
    }

    fn set_power_domain_state(
        &mut self,
        domain: PowerDomain,
        state: PowerDomainState,
    ) -> Result<(), SequenceError> {
        check(
            pm_domain_state_set(domain.into(), state.into()),
            SequenceError::PowerDomain(domain),
        )
    }

    fn restore_power_domain(&mut self, domain: PowerDomain) -> Result<(), SequenceError> {
        check(
            pm_domain_state_restore(domain.into()),
            SequenceError::PowerDomain(domain),
        )
    }

    fn set_memory_retention(
        &mut self,
        bank: MemoryBank,
        retained: bool,
    ) -> Result<(), SequenceError> {
        check(
            pm_mem_retention_set(bank.into(), retained),
            SequenceError::MemoryRetention(bank),
        )
    }

    fn verify_transitions(&mut self) -> Result<(), SequenceError> {
        for domain in [PowerDomain::Mpu, PowerDomain::Per] {
            check(
                pm_domain_transitions_verify(domain.into()),
                SequenceError::Transition(domain),
            )?;
        }
        Ok(())
    }

    fn ddr_io_suspend(&mut self) -> Result<(), SequenceError> {
        check(pm_ddr_io_suspend(), SequenceError::DdrIo)
    }

    fn ddr_io_resume(&mut self) -> Result<(), SequenceError> {
        check(pm_ddr_io_resume(), SequenceError::DdrIo)
    }

    fn pll_bypass(&mut self) -> Result<(), SequenceError> {
        check(pm_pll_bypass(), SequenceError::Pll)
    }

    fn pll_lock(&mut self) -> Result<(), SequenceError> {
        check(pm_pll_lock(), SequenceError::Pll)
    }

    fn set_mpu_voltage(&mut self, millivolts: u16) -> Result<(), SequenceError> {
        check(pm_vdd_mpu_set(millivolts), SequenceError::Voltage)
    }

    fn restore_mpu_voltage(&mut self) -> Result<(), SequenceError> {
        check(pm_vdd_mpu_restore(), SequenceError::Voltage)
    }

    fn set_vtt(&mut self, gpio_pin: u8, high: bool) -> Result<(), SequenceError> {
        check(pm_vtt_set(gpio_pin, high), SequenceError::Vtt)
    }

    fn arm_rtc_alarm(&mut self, timeout_secs: u8) -> Result<(), SequenceError> {
        check(pm_rtc_alarm_arm(timeout_secs), SequenceError::RtcAlarm)
    }

    fn run_i2c_script(&mut self, offset: u16) -> Result<(), SequenceError> {
        check(pm_i2c_script_run(offset), SequenceError::I2cScript)
    }
}

/// Sets up logging and the engine, and clears the IPC registers. Called once from the reset
/// handler.
#[unsafe(no_mangle)]
extern "C" fn wkup_m3_init() {
    Am335x::init();
    let engine = ENGINE.call_once(|| {
        // SAFETY: `call_once` runs this closure at most once.
        SpinMutex::new(unsafe { Engine::for_platform::<Am335x>() })
    });
    engine.lock().mailbox().clear_all();
}

/// Handles the IPC interrupt raised by the host after posting a command.
#[unsafe(no_mangle)]
extern "C" fn wkup_m3_ipc_handler() {
    if let Some(engine) = ENGINE.get() {
        engine.lock().accept();
    }
}

/// Handles the trigger for a held command, raised when the MPU reaches standby.
#[unsafe(no_mangle)]
extern "C" fn wkup_m3_trigger_handler() {
    if let Some(engine) = ENGINE.get() {
        engine.lock().on_trigger();
    }
}

/// Handles the wake interrupt after a power transition.
#[unsafe(no_mangle)]
extern "C" fn wkup_m3_wake_handler() {
    if let Some(engine) = ENGINE.get() {
        engine.lock().on_wake();
    }
}
