// Copyright The Rusted Firmware-A Contributors.
//
// SPDX-License-Identifier: BSD-3-Clause

//! Sleep and wake sequences for the power-transition commands.
//!
//! Entering a low-power state records a [`PendingWake`] which the wake path later uses to undo the
//! transition in reverse order.

use super::{CommandContext, DispatchError, SleepDepth};
use crate::{
    payload::{DeepSleepData, PowerDomainState, RawOverride, RtcData},
    protocol::{BoardConfig, CommandId, I2cScriptOffsets},
    sequencer::{MemoryBank, PowerDomain, PowerSequencer, SequenceError},
    wake::{WakeReasons, WakeSources},
};
use log::{debug, info, warn};

/// The low-power state entered by a handler.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Transition {
    /// RTC-only mode.
    Rtc {
        /// Whether the PLLs were left locked.
        fast: bool,
    },
    /// Deep sleep or standby.
    DeepSleep {
        /// The depth entered.
        depth: SleepDepth,
        /// The record the transition was programmed from.
        data: DeepSleepData,
    },
}

impl Transition {
    fn suspends_ddr(&self) -> bool {
        match self {
            Self::Rtc { .. } => true,
            Self::DeepSleep { depth, .. } => depth.suspends_ddr(),
        }
    }

    fn bypasses_plls(&self) -> bool {
        match self {
            Self::Rtc { fast } => !fast,
            Self::DeepSleep { depth, .. } => depth.suspends_ddr(),
        }
    }

    fn stops_oscillator(&self) -> bool {
        match self {
            Self::Rtc { .. } => true,
            Self::DeepSleep { data, .. } => !data.oscillator_on(),
        }
    }

    fn scaled_voltage(&self) -> Option<u16> {
        match self {
            Self::Rtc { .. } => None,
            Self::DeepSleep { data, .. } => data.mpu_voltage(),
        }
    }
}

/// What the wake path needs to know about a transition which has been entered.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct PendingWake {
    /// The command which entered the transition.
    pub command: CommandId,
    /// The transition entered.
    pub transition: Transition,
    /// Board data captured when the command was dispatched.
    pub board: BoardConfig,
    /// I2C script offsets captured when the command was dispatched.
    pub i2c_offsets: I2cScriptOffsets,
}

impl PendingWake {
    fn new(context: &CommandContext, transition: Transition) -> Self {
        Self {
            command: context.command,
            transition,
            board: context.board,
            i2c_offsets: context.i2c_offsets,
        }
    }
}

/// Enters RTC-only mode, with the alarm armed to fire after the record's timeout.
///
/// If a step fails, the steps already taken are backed out before the error is returned.
pub fn enter_rtc_mode(
    sequencer: &mut impl PowerSequencer,
    context: &CommandContext,
    data: RtcData,
    fast: bool,
) -> Result<PendingWake, DispatchError> {
    let transition = Transition::Rtc { fast };
    info!(
        "Entering RTC-only mode, alarm in {}s{}",
        data.timeout_secs(),
        if fast { ", PLLs locked" } else { "" }
    );

    let mut applied = Applied::default();
    let result = rtc_sleep_steps(sequencer, context, data, &transition, &mut applied);
    entered(sequencer, context, transition, &applied, result)
}

/// Enters deep sleep or standby as described by `data`.
///
/// Returns [`DispatchError::InvalidPayload`] without touching the hardware if either domain state
/// is the unused encoding. If a later step fails, the steps already taken are backed out before
/// the error is returned.
pub fn enter_deep_sleep(
    sequencer: &mut impl PowerSequencer,
    context: &CommandContext,
    data: DeepSleepData,
    depth: SleepDepth,
) -> Result<PendingWake, DispatchError> {
    let (Some(mpu_state), Some(per_state)) = (data.mpu_state(), data.per_state()) else {
        return Err(DispatchError::InvalidPayload(context.command));
    };
    let transition = Transition::DeepSleep { depth, data };
    info!("Entering {depth:?}: {data:?}");

    let mut applied = Applied::default();
    let result = deep_sleep_steps(
        sequencer,
        context,
        data,
        &transition,
        (mpu_state, per_state),
        &mut applied,
    );
    entered(sequencer, context, transition, &applied, result)
}

/// Runs the standalone application with the host's parameter words.
pub fn run_standalone(
    sequencer: &mut impl PowerSequencer,
    raw: RawOverride,
) -> Result<(), DispatchError> {
    info!(
        "Running standalone application with {:#010x} {:#010x}",
        raw.param1, raw.param2
    );
    sequencer.run_standalone(raw.param1, raw.param2)?;
    Ok(())
}

/// Undoes a transition after the coprocessor has been woken, flagging the sources which woke it.
///
/// The wake sources are disabled and the latched events collected even if restoring the hardware
/// fails part way, so that the host still learns why the system woke.
pub fn exit_low_power(
    sequencer: &mut impl PowerSequencer,
    pending: &PendingWake,
    reasons: &mut WakeReasons,
) -> Result<(), DispatchError> {
    let restored = restore(sequencer, pending);

    let events = sequencer.pending_wake_events();
    sequencer.clear_wake_sources();
    debug!("Woken from {} by {events:?}", pending.command);
    reasons.set(events);

    restored?;
    sequencer.verify_transitions()?;
    Ok(())
}

/// The sleep-side steps which have taken effect so far.
#[derive(Debug, Default)]
struct Applied {
    sleep_script: bool,
    wake_sources: bool,
    domains: bool,
    ddr_io: bool,
    vtt: bool,
    plls: bool,
    voltage: bool,
}

fn rtc_sleep_steps(
    sequencer: &mut impl PowerSequencer,
    context: &CommandContext,
    data: RtcData,
    transition: &Transition,
    applied: &mut Applied,
) -> Result<(), SequenceError> {
    sequencer.arm_rtc_alarm(data.timeout_secs())?;
    run_sleep_script(sequencer, context, applied)?;
    sequencer.configure_wake_sources(WakeSources::RTC_ALARM);
    applied.wake_sources = true;
    applied.domains = true;
    sequencer.set_power_domain_state(PowerDomain::Mpu, PowerDomainState::Off)?;
    sequencer.set_power_domain_state(PowerDomain::Per, PowerDomainState::Off)?;
    suspend_memory_and_clocks(sequencer, &context.board, transition, applied)?;
    sequencer.set_master_oscillator(false)
}

fn deep_sleep_steps(
    sequencer: &mut impl PowerSequencer,
    context: &CommandContext,
    data: DeepSleepData,
    transition: &Transition,
    (mpu_state, per_state): (PowerDomainState, PowerDomainState),
    applied: &mut Applied,
) -> Result<(), SequenceError> {
    run_sleep_script(sequencer, context, applied)?;
    sequencer.configure_wake_sources(data.wake_sources());
    applied.wake_sources = true;

    // Restoring a domain also drops its retention settings.
    applied.domains = true;
    for (bank, retained) in [
        (MemoryBank::MpuRam, data.mpu_ram_retained()),
        (MemoryBank::MpuL1, data.mpu_l1_retained()),
        (MemoryBank::MpuL2, data.mpu_l2_retained()),
        (MemoryBank::PerIcss, data.per_icss_retained()),
        (MemoryBank::PerMem, data.per_mem_retained()),
        (MemoryBank::PerOcmc, data.per_ocmc_retained()),
        (MemoryBank::PerOcmc2, data.per_ocmc2_retained()),
    ] {
        sequencer.set_memory_retention(bank, retained)?;
    }
    sequencer.set_power_domain_state(PowerDomain::Mpu, mpu_state)?;
    sequencer.set_power_domain_state(PowerDomain::Per, per_state)?;

    suspend_memory_and_clocks(sequencer, &context.board, transition, applied)?;
    if let Some(millivolts) = transition.scaled_voltage() {
        sequencer.set_mpu_voltage(millivolts)?;
        applied.voltage = true;
    }
    sequencer.configure_deepsleep_count(data.deepsleep_count());
    sequencer.set_master_oscillator(data.oscillator_on())
}

fn run_sleep_script(
    sequencer: &mut impl PowerSequencer,
    context: &CommandContext,
    applied: &mut Applied,
) -> Result<(), SequenceError> {
    if let Some(offset) = context.i2c_offsets.sleep_script() {
        sequencer.run_i2c_script(offset)?;
        applied.sleep_script = true;
    }
    Ok(())
}

fn suspend_memory_and_clocks(
    sequencer: &mut impl PowerSequencer,
    board: &BoardConfig,
    transition: &Transition,
    applied: &mut Applied,
) -> Result<(), SequenceError> {
    if transition.suspends_ddr() {
        sequencer.ddr_io_suspend()?;
        applied.ddr_io = true;
        if board.vtt_toggle {
            sequencer.set_vtt(board.vtt_gpio_pin, false)?;
            applied.vtt = true;
        }
    }
    if transition.bypasses_plls() {
        sequencer.pll_bypass()?;
        applied.plls = true;
    }
    Ok(())
}

/// Turns the outcome of the sleep-side steps into a [`PendingWake`], backing out on failure.
fn entered(
    sequencer: &mut impl PowerSequencer,
    context: &CommandContext,
    transition: Transition,
    applied: &Applied,
    result: Result<(), SequenceError>,
) -> Result<PendingWake, DispatchError> {
    match result {
        Ok(()) => Ok(PendingWake::new(context, transition)),
        Err(e) => {
            warn!(
                "{} failed part way ({e}), backing out {applied:?}",
                context.command
            );
            back_out(sequencer, context, applied);
            Err(e.into())
        }
    }
}

/// Undoes the sleep-side steps in `applied`, newest first.
///
/// A failure while backing out is logged and the remaining steps are still undone.
fn back_out(sequencer: &mut impl PowerSequencer, context: &CommandContext, applied: &Applied) {
    let board = &context.board;

    if applied.voltage {
        log_back_out_failure(sequencer.restore_mpu_voltage());
    }
    if applied.plls {
        log_back_out_failure(sequencer.pll_lock());
    }
    if applied.vtt {
        log_back_out_failure(sequencer.set_vtt(board.vtt_gpio_pin, true));
    }
    if applied.ddr_io {
        log_back_out_failure(sequencer.ddr_io_resume());
    }
    if applied.domains {
        log_back_out_failure(sequencer.restore_power_domain(PowerDomain::Per));
        log_back_out_failure(sequencer.restore_power_domain(PowerDomain::Mpu));
    }
    if applied.wake_sources {
        sequencer.clear_wake_sources();
    }
    let wake_script = context.i2c_offsets.wake_script();
    if let Some(offset) = wake_script.filter(|_| applied.sleep_script) {
        log_back_out_failure(sequencer.run_i2c_script(offset));
    }
}

fn log_back_out_failure(result: Result<(), SequenceError>) {
    if let Err(e) = result {
        warn!("Backing out: {e}");
    }
}

fn restore(
    sequencer: &mut impl PowerSequencer,
    pending: &PendingWake,
) -> Result<(), SequenceError> {
    let transition = &pending.transition;

    if transition.stops_oscillator() {
        sequencer.set_master_oscillator(true)?;
    }
    if transition.scaled_voltage().is_some() {
        sequencer.restore_mpu_voltage()?;
    }
    if transition.bypasses_plls() {
        sequencer.pll_lock()?;
    }
    if transition.suspends_ddr() {
        if pending.board.vtt_toggle {
            sequencer.set_vtt(pending.board.vtt_gpio_pin, true)?;
        }
        sequencer.ddr_io_resume()?;
    }
    sequencer.restore_power_domain(PowerDomain::Per)?;
    sequencer.restore_power_domain(PowerDomain::Mpu)?;
    if let Some(offset) = pending.i2c_offsets.wake_script() {
        sequencer.run_i2c_script(offset)?;
    }
    Ok(())
}
