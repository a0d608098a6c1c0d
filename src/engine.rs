// Copyright The Rusted Firmware-A Contributors.
//
// SPDX-License-Identifier: BSD-3-Clause

//! The command engine: classification, the dispatch cycle and the status/trigger protocol.

use crate::{
    dispatch::{
        self, CommandContext, DispatchEntry, DispatchError, Handler,
        handlers::{self, PendingWake},
    },
    mailbox::{Mailbox, Slot},
    payload::Payload,
    platform::{Platform, SocVariant},
    protocol::{
        BoardConfig, CommandId, I2cScriptOffsets, StatId, StatusCode, param1_with_version,
        trace_with_wake_reason,
    },
    sequencer::PowerSequencer,
    wake::WakeReasons,
};
use log::{debug, error, info, trace, warn};

/// States of the dispatch cycle.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum CycleState {
    /// Waiting for a command.
    Idle,
    /// Reading and validating the command identifier.
    Classifying,
    /// Choosing the payload.
    Resolving,
    /// Running the handler.
    Executing,
    /// Writing the status back to the host.
    Reporting,
}

/// What [`Engine::accept`] did with a newly signalled command.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Acceptance {
    /// The command identifier was invalid and `fail` was reported.
    Rejected,
    /// `wait-for-ack` was reported and the command will run on the next trigger.
    AwaitingTrigger(CommandId),
    /// The command ran immediately and reported the given status.
    Completed(StatusCode),
}

/// The coprocessor side of the IPC protocol.
///
/// The engine owns the mailbox and the power sequencer. Nothing in it blocks: the main loop calls
/// [`accept`](Self::accept) when the host signals a command, [`on_trigger`](Self::on_trigger) when
/// the trigger for a held command arrives and [`on_wake`](Self::on_wake) after a wake event.
pub struct Engine<M: Mailbox, S: PowerSequencer> {
    mailbox: M,
    sequencer: S,
    variant: SocVariant,
    firmware_version: u16,
    state: CycleState,
    awaiting_trigger: Option<CommandId>,
    pending_wake: Option<PendingWake>,
    wake_reasons: WakeReasons,
}

impl<M: Mailbox, S: PowerSequencer> Engine<M, S> {
    /// Creates an idle engine.
    pub fn new(mailbox: M, sequencer: S, variant: SocVariant, firmware_version: u16) -> Self {
        Self {
            mailbox,
            sequencer,
            variant,
            firmware_version,
            state: CycleState::Idle,
            awaiting_trigger: None,
            pending_wake: None,
            wake_reasons: WakeReasons::new(),
        }
    }

    /// Creates an idle engine with the platform's mailbox, sequencer and device type.
    ///
    /// # Safety
    ///
    /// This must only be called once, as it calls [`Platform::create_mailbox`].
    pub unsafe fn for_platform<P: Platform<Mailbox = M, Sequencer = S>>() -> Self {
        // SAFETY: Our caller promises that this is only called once.
        let mailbox = unsafe { P::create_mailbox() };
        let variant = P::soc_variant();
        info!(
            "IPC engine version {:#x} on {variant:?} device",
            P::FIRMWARE_VERSION
        );
        Self::new(mailbox, P::create_sequencer(), variant, P::FIRMWARE_VERSION)
    }

    /// Returns the current state of the dispatch cycle.
    pub fn state(&self) -> CycleState {
        self.state
    }

    /// Returns the command waiting for a trigger, if any.
    pub fn awaiting_trigger(&self) -> Option<CommandId> {
        self.awaiting_trigger
    }

    /// Returns the transition the wake path will undo, if any.
    pub fn pending_wake(&self) -> Option<&PendingWake> {
        self.pending_wake.as_ref()
    }

    /// Returns the mailbox.
    pub fn mailbox(&mut self) -> &mut M {
        &mut self.mailbox
    }

    /// Returns the power sequencer.
    pub fn sequencer(&mut self) -> &mut S {
        &mut self.sequencer
    }

    /// Returns the wake-reason vector.
    pub fn wake_reasons(&mut self) -> &mut WakeReasons {
        &mut self.wake_reasons
    }

    /// Reads `STAT_ID` and returns the command it names, or `None` if the identifier is invalid.
    pub fn classify(&mut self) -> Option<CommandId> {
        let command_id = self.read_command_id();
        dispatch::lookup(command_id).ok().map(|entry| entry.command)
    }

    /// Returns whether the host must wait for a trigger before `command` runs.
    pub fn needs_trigger(&self, command: CommandId) -> bool {
        dispatch::needs_trigger(command)
    }

    /// Writes `status` into the high half of `STAT_ID`, keeping the command echo in the low half.
    pub fn report_status(&mut self, status: StatusCode) {
        let stat_id = StatId(self.mailbox.read(Slot::StatId)).with_status(status);
        self.mailbox.write(Slot::StatId, stat_id.0);
    }

    /// Writes the wake-reason code into the low byte of `TRACE`, keeping the other bits.
    pub fn report_wake_reason(&mut self, reason: u8) {
        let trace = self.mailbox.read(Slot::Trace);
        self.mailbox
            .write(Slot::Trace, trace_with_wake_reason(trace, reason));
    }

    /// Handles a command the host has just signalled.
    ///
    /// Invalid commands are failed straight away. Commands which need a trigger are held with
    /// `wait-for-ack` reported; anything else is dispatched immediately.
    pub fn accept(&mut self) -> Acceptance {
        match dispatch::lookup(self.read_command_id()) {
            Err(e) => {
                error!("Rejecting command: {e}");
                self.report_status(e.into());
                Acceptance::Rejected
            }
            Ok(entry) if entry.needs_trigger => {
                debug!("{} waiting for trigger", entry.command);
                if let Some(previous) = self.awaiting_trigger.replace(entry.command) {
                    warn!(
                        "{previous} replaced by {} before its trigger",
                        entry.command
                    );
                }
                self.report_status(StatusCode::WaitForAck);
                Acceptance::AwaitingTrigger(entry.command)
            }
            Ok(_) => Acceptance::Completed(self.dispatch()),
        }
    }

    /// Runs the command held by [`accept`](Self::accept) now that its trigger has arrived.
    ///
    /// If `STAT_ID` no longer names the held command, because the host posted another one in the
    /// meantime, the held command is dropped and `fail` is reported.
    pub fn on_trigger(&mut self) -> StatusCode {
        let Some(held) = self.awaiting_trigger.take() else {
            return self.finish(Err(DispatchError::NoPendingTrigger));
        };
        let posted = self.read_command_id();
        if posted != u16::from(held) {
            return self.finish(Err(DispatchError::TriggerMismatch { held, posted }));
        }
        debug!("Trigger for {held}");
        self.dispatch()
    }

    /// Undoes the last power transition after a wake, reporting why the system woke.
    pub fn on_wake(&mut self) -> StatusCode {
        let Some(pending) = self.pending_wake.take() else {
            return self.finish(Err(DispatchError::NoPendingWake));
        };
        let result =
            handlers::exit_low_power(&mut self.sequencer, &pending, &mut self.wake_reasons);
        let reason = self.wake_reasons.dominant_code();
        info!("Wake from {}, reason {reason:#04x}", pending.command);
        self.report_wake_reason(reason);
        self.finish(result)
    }

    /// Runs one complete dispatch cycle for the command in `STAT_ID` and reports its status.
    pub fn dispatch(&mut self) -> StatusCode {
        self.wake_reasons.clear_all();
        self.set_state(CycleState::Classifying);
        let result = self.run_cycle();
        self.finish(result)
    }

    fn run_cycle(&mut self) -> Result<(), DispatchError> {
        let entry = dispatch::lookup(self.read_command_id())?;
        let context = if entry.command.is_control() {
            CommandContext {
                command: entry.command,
                payload: None,
                i2c_offsets: I2cScriptOffsets::default(),
                board: BoardConfig::default(),
            }
        } else {
            self.set_state(CycleState::Resolving);
            self.resolve(entry)?
        };
        self.set_state(CycleState::Executing);
        self.execute(entry.handler, &context)
    }

    fn resolve(&mut self, entry: &DispatchEntry) -> Result<CommandContext, DispatchError> {
        let param1 = self.mailbox.read(Slot::Param1);
        let param2 = self.mailbox.read(Slot::Param2);
        let board = BoardConfig::from_param3(self.mailbox.read(Slot::Param3));
        let i2c_offsets = I2cScriptOffsets::from_param4(self.mailbox.read(Slot::Param4));
        let payload = dispatch::resolve(entry, param1, param2, self.variant)?;
        debug!("{} with {payload:?}", entry.command);
        Ok(CommandContext {
            command: entry.command,
            payload: Some(payload),
            i2c_offsets,
            board,
        })
    }

    fn execute(
        &mut self,
        handler: Handler,
        context: &CommandContext,
    ) -> Result<(), DispatchError> {
        let invalid = DispatchError::InvalidPayload(context.command);
        match handler {
            Handler::Version => {
                self.report_version();
                Ok(())
            }
            Handler::ResetStateMachine => {
                self.reset_state_machine();
                Ok(())
            }
            Handler::Standalone => match context.payload {
                Some(Payload::Raw(raw)) => handlers::run_standalone(&mut self.sequencer, raw),
                _ => Err(invalid),
            },
            Handler::Rtc { fast } => {
                let data = context.payload.and_then(|p| p.rtc()).ok_or(invalid)?;
                let pending = handlers::enter_rtc_mode(&mut self.sequencer, context, data, fast)?;
                self.pending_wake = Some(pending);
                Ok(())
            }
            Handler::DeepSleep(depth) => {
                let data = context.payload.and_then(|p| p.deep_sleep()).ok_or(invalid)?;
                let pending =
                    handlers::enter_deep_sleep(&mut self.sequencer, context, data, depth)?;
                self.pending_wake = Some(pending);
                Ok(())
            }
        }
    }

    fn report_version(&mut self) {
        let param1 = self.mailbox.read(Slot::Param1);
        self.mailbox.write(
            Slot::Param1,
            param1_with_version(param1, self.firmware_version),
        );
    }

    fn reset_state_machine(&mut self) {
        info!("Resetting command state machine");
        self.awaiting_trigger = None;
        self.pending_wake = None;
        self.wake_reasons.clear_all();
    }

    fn finish(&mut self, result: Result<(), DispatchError>) -> StatusCode {
        self.set_state(CycleState::Reporting);
        let status = match result {
            Ok(()) => StatusCode::Pass,
            Err(e) => {
                error!("{e}");
                e.into()
            }
        };
        self.report_status(status);
        self.set_state(CycleState::Idle);
        status
    }

    fn read_command_id(&mut self) -> u16 {
        StatId(self.mailbox.read(Slot::StatId)).command_id()
    }

    fn set_state(&mut self, state: CycleState) {
        trace!("{:?} -> {state:?}", self.state);
        self.state = state;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dispatch::{DS0_DEFAULT, DS0_SECURE_DEFAULT, STANDBY_SECURE_DEFAULT},
        payload::{DeepSleepData, PowerDomainState},
        platform::{
            FIRMWARE_VERSION,
            test::{Call, FakeMailbox, FakeSequencer},
        },
        protocol::DEFAULT_PAYLOAD_SENTINEL,
        sequencer::SequenceError,
        wake::{NO_WAKE_REASON, WakeSources},
    };

    const SENTINEL: u32 = DEFAULT_PAYLOAD_SENTINEL;

    fn engine(variant: SocVariant) -> Engine<FakeMailbox, FakeSequencer> {
        Engine::new(
            FakeMailbox::new(),
            FakeSequencer::new(),
            variant,
            FIRMWARE_VERSION,
        )
    }

    fn post(engine: &mut Engine<FakeMailbox, FakeSequencer>, command_id: u32, params: [u32; 4]) {
        let mailbox = engine.mailbox();
        mailbox.write(Slot::StatId, command_id);
        mailbox.write(Slot::Param1, params[0]);
        mailbox.write(Slot::Param2, params[1]);
        mailbox.write(Slot::Param3, params[2]);
        mailbox.write(Slot::Param4, params[3]);
    }

    fn stat_id(engine: &mut Engine<FakeMailbox, FakeSequencer>) -> StatId {
        StatId(engine.mailbox().read(Slot::StatId))
    }

    #[test]
    fn classify_matches_lookup() {
        let mut engine = engine(SocVariant::GeneralPurpose);
        for raw in 0..0x20u16 {
            engine.mailbox().write(Slot::StatId, 0xabcd_0000 | u32::from(raw));
            assert_eq!(
                engine.classify(),
                dispatch::lookup(raw).ok().map(|entry| entry.command)
            );
        }
        // Classification only reads.
        assert_eq!(engine.mailbox().read(Slot::StatId), 0xabcd_001f);
        assert_eq!(engine.state(), CycleState::Idle);
    }

    #[test]
    fn report_status_keeps_command_echo() {
        let mut engine = engine(SocVariant::GeneralPurpose);
        engine.mailbox().write(Slot::StatId, 0x0002_0005);
        engine.report_status(StatusCode::Fail);
        assert_eq!(stat_id(&mut engine), StatId(0x0001_0005));
        engine.report_status(StatusCode::Pass);
        assert_eq!(stat_id(&mut engine), StatId(0x0000_0005));
    }

    #[test]
    fn report_wake_reason_keeps_upper_bits() {
        let mut engine = engine(SocVariant::GeneralPurpose);
        engine.mailbox().write(Slot::Trace, 0x1234_5678);
        for reason in [0x00, 0x0b, NO_WAKE_REASON] {
            engine.report_wake_reason(reason);
            let trace = engine.mailbox().read(Slot::Trace);
            assert_eq!(trace & 0xff, u32::from(reason));
            assert_eq!(trace & !0xff, 0x1234_5600);
        }
    }

    /// DS0 with sentinel parameters on a GP device runs the GP default.
    #[test]
    fn scenario_a_ds0_default_on_gp() {
        let mut engine = engine(SocVariant::GeneralPurpose);
        post(&mut engine, 0x3, [SENTINEL, SENTINEL, 0x3, SENTINEL]);

        assert_eq!(engine.classify(), Some(CommandId::Ds0));
        assert!(engine.needs_trigger(CommandId::Ds0));
        assert_eq!(engine.dispatch(), StatusCode::Pass);
        assert_eq!(stat_id(&mut engine).status(), Some(StatusCode::Pass));
        assert_eq!(stat_id(&mut engine).command_id(), 0x3);

        let pending = engine.pending_wake().copied().unwrap();
        assert_eq!(
            pending.transition,
            handlers::Transition::DeepSleep {
                depth: dispatch::SleepDepth::Ds0,
                data: DS0_DEFAULT,
            }
        );
    }

    /// The version query bypasses resolution and writes only the low half of `PARAM1`.
    #[test]
    fn scenario_b_version() {
        let mut engine = engine(SocVariant::GeneralPurpose);
        post(&mut engine, 0xf, [0xdead_0000, 0x1111, 0x2222, 0x3333]);

        assert!(!engine.needs_trigger(CommandId::Version));
        assert_eq!(engine.accept(), Acceptance::Completed(StatusCode::Pass));
        assert_eq!(
            engine.mailbox().read(Slot::Param1),
            0xdead_0000 | u32::from(FIRMWARE_VERSION)
        );
        assert_eq!(engine.mailbox().read(Slot::Param2), 0x1111);
        assert_eq!(stat_id(&mut engine), StatId(0x0000_000f));
        assert!(engine.sequencer().calls().is_empty());
    }

    /// An override is passed to the handler verbatim, whatever the device type.
    #[test]
    fn scenario_c_override() {
        for variant in [SocVariant::GeneralPurpose, SocVariant::HighSecurity] {
            let mut engine = engine(variant);
            post(&mut engine, 0x5, [0x1234, 0x0, 0, SENTINEL]);

            assert_eq!(engine.dispatch(), StatusCode::Pass);
            assert_eq!(stat_id(&mut engine), StatId(0x0000_0005));
            let pending = engine.pending_wake().copied().unwrap();
            assert_eq!(
                pending.transition,
                handlers::Transition::DeepSleep {
                    depth: dispatch::SleepDepth::Ds1,
                    data: DeepSleepData::from_words(0x1234, 0x0),
                }
            );
            let calls = engine.sequencer().calls();
            assert!(calls.contains(&Call::WakeSources(WakeSources::empty())));
            assert_eq!(calls.last(), Some(&Call::MasterOscillator(false)));
            assert!(calls.contains(&Call::DeepSleepCount(0x091a)));
        }
    }

    /// A record built field by field drives the sequence for the deepest sleep.
    #[test]
    fn built_record_drives_ds2() {
        let mut engine = engine(SocVariant::GeneralPurpose);
        let data = DeepSleepData::new()
            .with_mpu(PowerDomainState::Retention, true, true, false)
            .with_per(PowerDomainState::On, false, false, false, false)
            .with_wake_sources(WakeSources::UART0);
        let [param1, param2] = data.words();
        post(&mut engine, 0x7, [param1, param2, 0, SENTINEL]);

        assert_eq!(engine.dispatch(), StatusCode::Pass);
        let pending = engine.pending_wake().copied().unwrap();
        assert_eq!(
            pending.transition,
            handlers::Transition::DeepSleep {
                depth: dispatch::SleepDepth::Ds2,
                data,
            }
        );
        assert!(
            engine
                .sequencer()
                .calls()
                .contains(&Call::WakeSources(WakeSources::UART0))
        );
    }

    /// A reserved identifier inside the table range is failed without resolution.
    #[test]
    fn scenario_d_reserved_gap() {
        let mut engine = engine(SocVariant::GeneralPurpose);
        post(&mut engine, 0xd, [SENTINEL, SENTINEL, 0, 0]);

        assert_eq!(engine.classify(), None);
        assert_eq!(engine.accept(), Acceptance::Rejected);
        assert_eq!(stat_id(&mut engine), StatId(0x0001_000d));
        assert_eq!(engine.mailbox().read(Slot::Param1), SENTINEL);
        assert!(engine.sequencer().calls().is_empty());

        assert_eq!(engine.dispatch(), StatusCode::Fail);
        assert_eq!(engine.pending_wake(), None);
    }

    #[test]
    fn out_of_range_ids_fail() {
        let mut engine = engine(SocVariant::GeneralPurpose);
        for raw in [0x0, 0x10, 0x11, 0xffff] {
            post(&mut engine, raw, [SENTINEL; 4]);
            assert_eq!(engine.dispatch(), StatusCode::Fail);
            assert_eq!(stat_id(&mut engine), StatId(0x0001_0000 | raw));
        }
    }

    #[test]
    fn secure_device_gets_alternate_default() {
        let mut engine = engine(SocVariant::HighSecurity);
        post(&mut engine, 0x3, [SENTINEL, SENTINEL, 0, SENTINEL]);
        assert_eq!(engine.dispatch(), StatusCode::Pass);
        assert_eq!(
            engine.pending_wake().map(|pending| pending.transition),
            Some(handlers::Transition::DeepSleep {
                depth: dispatch::SleepDepth::Ds0,
                data: DS0_SECURE_DEFAULT,
            })
        );

        post(&mut engine, 0xb, [SENTINEL, SENTINEL, 0, SENTINEL]);
        assert_eq!(engine.dispatch(), StatusCode::Pass);
        assert_eq!(
            engine.pending_wake().map(|pending| pending.transition),
            Some(handlers::Transition::DeepSleep {
                depth: dispatch::SleepDepth::Standby,
                data: STANDBY_SECURE_DEFAULT,
            })
        );
    }

    #[test]
    fn standalone_without_override_fails() {
        let mut engine = engine(SocVariant::GeneralPurpose);
        post(&mut engine, 0x9, [SENTINEL, SENTINEL, 0, SENTINEL]);
        assert_eq!(engine.dispatch(), StatusCode::Fail);
        assert!(engine.sequencer().calls().is_empty());

        post(&mut engine, 0x9, [0x10, 0x20, 0, SENTINEL]);
        assert_eq!(engine.dispatch(), StatusCode::Pass);
        assert_eq!(engine.sequencer().calls(), [Call::Standalone(0x10, 0x20)]);
    }

    #[test]
    fn trigger_handshake() {
        let mut engine = engine(SocVariant::GeneralPurpose);
        post(&mut engine, 0x1, [SENTINEL, SENTINEL, 0, SENTINEL]);

        assert_eq!(engine.accept(), Acceptance::AwaitingTrigger(CommandId::Rtc));
        assert_eq!(stat_id(&mut engine), StatId(0x0002_0001));
        assert_eq!(engine.awaiting_trigger(), Some(CommandId::Rtc));
        assert!(engine.sequencer().calls().is_empty());

        assert_eq!(engine.on_trigger(), StatusCode::Pass);
        assert_eq!(stat_id(&mut engine), StatId(0x0000_0001));
        assert_eq!(engine.awaiting_trigger(), None);
        assert_eq!(engine.sequencer().calls().first(), Some(&Call::RtcAlarm(2)));

        // A second trigger has nothing to run.
        assert_eq!(engine.on_trigger(), StatusCode::Fail);
    }

    #[test]
    fn trigger_runs_only_the_held_command() {
        let mut engine = engine(SocVariant::GeneralPurpose);
        post(&mut engine, 0x1, [SENTINEL, SENTINEL, 0, SENTINEL]);
        assert_eq!(engine.accept(), Acceptance::AwaitingTrigger(CommandId::Rtc));

        // The host queries the version before triggering.
        post(&mut engine, 0xf, [0; 4]);
        assert_eq!(engine.accept(), Acceptance::Completed(StatusCode::Pass));
        assert_eq!(engine.awaiting_trigger(), Some(CommandId::Rtc));

        assert_eq!(engine.on_trigger(), StatusCode::Fail);
        assert_eq!(stat_id(&mut engine), StatId(0x0001_000f));
        assert_eq!(engine.awaiting_trigger(), None);
        assert_eq!(engine.pending_wake(), None);
        assert!(engine.sequencer().calls().is_empty());

        // Posting the command again runs it on the next trigger.
        post(&mut engine, 0x1, [SENTINEL, SENTINEL, 0, SENTINEL]);
        assert_eq!(engine.accept(), Acceptance::AwaitingTrigger(CommandId::Rtc));
        assert_eq!(engine.on_trigger(), StatusCode::Pass);
        assert_eq!(engine.sequencer().calls().first(), Some(&Call::RtcAlarm(2)));
    }

    #[test]
    fn wake_reports_dominant_reason() {
        let mut engine = engine(SocVariant::GeneralPurpose);
        post(&mut engine, 0x3, [SENTINEL, SENTINEL, 0, SENTINEL]);
        engine.mailbox().write(Slot::Trace, 0xaa00_0000);
        assert_eq!(engine.dispatch(), StatusCode::Pass);

        engine
            .sequencer()
            .latch_wake_events(WakeSources::GPIO0_WAKE1 | WakeSources::WDT1);
        assert_eq!(engine.on_wake(), StatusCode::Pass);
        assert_eq!(engine.mailbox().read(Slot::Trace), 0xaa00_0006);
        assert_eq!(engine.pending_wake(), None);
        assert!(engine.wake_reasons().is_set(WakeSources::WDT1));

        // Nothing left to wake from.
        assert_eq!(engine.on_wake(), StatusCode::Fail);

        // The next cycle starts with an empty vector.
        post(&mut engine, 0xf, [0; 4]);
        engine.dispatch();
        assert_eq!(engine.wake_reasons().dominant_code(), NO_WAKE_REASON);
    }

    #[test]
    fn wake_without_events_reports_none() {
        let mut engine = engine(SocVariant::GeneralPurpose);
        post(&mut engine, 0xb, [SENTINEL, SENTINEL, 0, SENTINEL]);
        assert_eq!(engine.dispatch(), StatusCode::Pass);
        assert_eq!(engine.on_wake(), StatusCode::Pass);
        assert_eq!(
            engine.mailbox().read(Slot::Trace) & 0xff,
            u32::from(NO_WAKE_REASON)
        );
    }

    #[test]
    fn sequencing_failure_reports_fail() {
        let mut engine = engine(SocVariant::GeneralPurpose);
        engine.sequencer().fail_on(SequenceError::DdrIo);
        post(&mut engine, 0x5, [SENTINEL, SENTINEL, 0, SENTINEL]);

        assert_eq!(engine.dispatch(), StatusCode::Fail);
        assert_eq!(stat_id(&mut engine), StatId(0x0001_0005));
        assert_eq!(engine.pending_wake(), None);
        assert_eq!(engine.state(), CycleState::Idle);
    }

    #[test]
    fn failed_sleep_is_backed_out() {
        let mut engine = engine(SocVariant::GeneralPurpose);
        engine.sequencer().fail_on(SequenceError::Pll);
        post(&mut engine, 0x3, [SENTINEL, SENTINEL, 0, SENTINEL]);

        assert_eq!(engine.dispatch(), StatusCode::Fail);
        assert_eq!(engine.pending_wake(), None);
        let calls = engine.sequencer().calls();
        let bypass = calls.iter().position(|c| *c == Call::PllBypass).unwrap();
        assert!(calls[bypass..].contains(&Call::DdrIoResume));
        assert_eq!(calls.last(), Some(&Call::ClearWakeSources));
    }

    #[test]
    fn reset_rearms_engine() {
        let mut engine = engine(SocVariant::GeneralPurpose);
        post(&mut engine, 0x5, [SENTINEL, SENTINEL, 0, SENTINEL]);
        assert_eq!(engine.dispatch(), StatusCode::Pass);
        post(&mut engine, 0x2, [SENTINEL, SENTINEL, 0, SENTINEL]);
        engine.accept();
        assert!(engine.pending_wake().is_some());
        assert!(engine.awaiting_trigger().is_some());

        post(&mut engine, 0xe, [0; 4]);
        assert_eq!(engine.accept(), Acceptance::Completed(StatusCode::Pass));
        assert_eq!(engine.pending_wake(), None);
        assert_eq!(engine.awaiting_trigger(), None);
        assert_eq!(engine.state(), CycleState::Idle);
        assert_eq!(engine.on_trigger(), StatusCode::Fail);
    }
}
