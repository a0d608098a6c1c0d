// Copyright The Rusted Firmware-A Contributors.
//
// SPDX-License-Identifier: BSD-3-Clause

//! Power-transition payloads.
//!
//! A payload is either one of the typed records, taken from the compiled-in defaults, or the two
//! raw parameter words supplied by the host. The raw words use the same layout as the typed
//! records, so a handler can interpret them through the record type of its command family.

use crate::wake::WakeSources;
use core::fmt::{self, Debug, Formatter};
use num_enum::{IntoPrimitive, TryFromPrimitive};

const RTC_TIMEOUT_MASK: u32 = 0xf;

// Word 0 of the deep-sleep record.
const MOSC_STATE_BIT: u32 = 1 << 0;
const DS_COUNT_SHIFT: u8 = 1;
const DS_COUNT_MASK: u32 = 0xffff << DS_COUNT_SHIFT;
const VDD_MPU_SHIFT: u8 = 17;
const VDD_MPU_MASK: u32 = 0x7fff << VDD_MPU_SHIFT;

// Word 1 of the deep-sleep record.
const PD_MPU_STATE_SHIFT: u8 = 0;
const PD_MPU_STATE_MASK: u32 = 0x3 << PD_MPU_STATE_SHIFT;
const PD_MPU_RAM_RET_BIT: u32 = 1 << 2;
const PD_MPU_L1_RET_BIT: u32 = 1 << 3;
const PD_MPU_L2_RET_BIT: u32 = 1 << 4;
const PD_PER_STATE_SHIFT: u8 = 7;
const PD_PER_STATE_MASK: u32 = 0x3 << PD_PER_STATE_SHIFT;
const PD_PER_ICSS_RET_BIT: u32 = 1 << 9;
const PD_PER_MEM_RET_BIT: u32 = 1 << 10;
const PD_PER_OCMC_RET_BIT: u32 = 1 << 11;
const PD_PER_OCMC2_RET_BIT: u32 = 1 << 12;
const WAKE_SOURCES_SHIFT: u8 = 18;
const WAKE_SOURCES_MASK: u32 = 0x1fff << WAKE_SOURCES_SHIFT;
const RESERVED_BIT: u32 = 1 << 31;

/// Default RTC alarm timeout, in seconds.
pub const RTC_TIMEOUT_DEFAULT: u8 = 0x2;

/// Largest RTC alarm timeout which fits the record, in seconds.
pub const RTC_TIMEOUT_MAX: u8 = 0xf;

/// Default number of oscillator clocks to see before leaving deep sleep.
pub const DS_COUNT_DEFAULT: u16 = 0x6a75;

/// Target state of a power domain.
#[derive(Copy, Clone, Debug, Eq, PartialEq, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum PowerDomainState {
    /// Powered off, contents lost.
    Off = 0x0,
    /// Retention: contents kept, no activity.
    Retention = 0x1,
    /// Powered on.
    On = 0x3,
}

/// The RTC-mode record: only the alarm timeout.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct RtcData(u32);

impl RtcData {
    /// Creates a record with the given timeout, truncated to the 4-bit field.
    pub const fn new(timeout_secs: u8) -> Self {
        Self(timeout_secs as u32 & RTC_TIMEOUT_MASK)
    }

    /// Interprets a raw parameter word as an RTC record.
    pub const fn from_word(word: u32) -> Self {
        Self(word)
    }

    /// Returns the RTC alarm timeout in seconds.
    pub fn timeout_secs(self) -> u8 {
        (self.0 & RTC_TIMEOUT_MASK) as u8
    }
}

/// The deep-sleep and standby record.
#[derive(Copy, Clone, Default, Eq, PartialEq)]
pub struct DeepSleepData {
    words: [u32; 2],
}

impl DeepSleepData {
    /// A record with every field zero: oscillator off, domains off, nothing retained, no wake
    /// sources.
    pub const fn new() -> Self {
        Self { words: [0, 0] }
    }

    /// Interprets the two raw parameter words as a deep-sleep record.
    pub const fn from_words(word0: u32, word1: u32) -> Self {
        Self {
            words: [word0, word1],
        }
    }

    /// Returns the two words of the record.
    pub fn words(self) -> [u32; 2] {
        self.words
    }

    /// Sets whether the master oscillator is kept running.
    pub const fn with_oscillator(mut self, on: bool) -> Self {
        self.words[0] = set_bit(self.words[0], MOSC_STATE_BIT, on);
        self
    }

    /// Sets the deep-sleep exit debounce count.
    pub const fn with_deepsleep_count(mut self, count: u16) -> Self {
        self.words[0] = set_field(self.words[0], DS_COUNT_MASK, DS_COUNT_SHIFT, count as u32);
        self
    }

    /// Sets the lowered MPU voltage in millivolts, or 0 to leave it unchanged.
    pub const fn with_mpu_voltage(mut self, millivolts: u16) -> Self {
        self.words[0] = set_field(self.words[0], VDD_MPU_MASK, VDD_MPU_SHIFT, millivolts as u32);
        self
    }

    /// Sets the target state of the MPU domain and which of its memories are retained.
    pub const fn with_mpu(
        mut self,
        state: PowerDomainState,
        ram_retained: bool,
        l1_retained: bool,
        l2_retained: bool,
    ) -> Self {
        let mut word = set_field(
            self.words[1],
            PD_MPU_STATE_MASK,
            PD_MPU_STATE_SHIFT,
            state as u32,
        );
        word = set_bit(word, PD_MPU_RAM_RET_BIT, ram_retained);
        word = set_bit(word, PD_MPU_L1_RET_BIT, l1_retained);
        self.words[1] = set_bit(word, PD_MPU_L2_RET_BIT, l2_retained);
        self
    }

    /// Sets the target state of the PER domain and which of its memories are retained.
    pub const fn with_per(
        mut self,
        state: PowerDomainState,
        icss_retained: bool,
        mem_retained: bool,
        ocmc_retained: bool,
        ocmc2_retained: bool,
    ) -> Self {
        let mut word = set_field(
            self.words[1],
            PD_PER_STATE_MASK,
            PD_PER_STATE_SHIFT,
            state as u32,
        );
        word = set_bit(word, PD_PER_ICSS_RET_BIT, icss_retained);
        word = set_bit(word, PD_PER_MEM_RET_BIT, mem_retained);
        word = set_bit(word, PD_PER_OCMC_RET_BIT, ocmc_retained);
        self.words[1] = set_bit(word, PD_PER_OCMC2_RET_BIT, ocmc2_retained);
        self
    }

    /// Sets the enabled wake sources.
    pub const fn with_wake_sources(mut self, sources: WakeSources) -> Self {
        self.words[1] = set_field(
            self.words[1],
            WAKE_SOURCES_MASK,
            WAKE_SOURCES_SHIFT,
            sources.bits() as u32,
        );
        self
    }

    /// Returns whether the master oscillator is kept running.
    pub fn oscillator_on(self) -> bool {
        self.words[0] & MOSC_STATE_BIT != 0
    }

    /// Returns the deep-sleep exit debounce count.
    pub fn deepsleep_count(self) -> u16 {
        ((self.words[0] & DS_COUNT_MASK) >> DS_COUNT_SHIFT) as u16
    }

    /// Returns the lowered MPU voltage in millivolts, if one was requested.
    pub fn mpu_voltage(self) -> Option<u16> {
        let millivolts = ((self.words[0] & VDD_MPU_MASK) >> VDD_MPU_SHIFT) as u16;
        (millivolts != 0).then_some(millivolts)
    }

    /// Returns the raw target state field of the MPU domain.
    pub fn mpu_state_raw(self) -> u8 {
        ((self.words[1] & PD_MPU_STATE_MASK) >> PD_MPU_STATE_SHIFT) as u8
    }

    /// Returns the raw target state field of the PER domain.
    pub fn per_state_raw(self) -> u8 {
        ((self.words[1] & PD_PER_STATE_MASK) >> PD_PER_STATE_SHIFT) as u8
    }

    /// Returns the target state of the MPU domain, or `None` if the field holds an unused encoding.
    pub fn mpu_state(self) -> Option<PowerDomainState> {
        PowerDomainState::try_from(self.mpu_state_raw()).ok()
    }

    /// Returns the target state of the PER domain, or `None` if the field holds an unused encoding.
    pub fn per_state(self) -> Option<PowerDomainState> {
        PowerDomainState::try_from(self.per_state_raw()).ok()
    }

    /// Returns whether the MPU RAM is retained.
    pub fn mpu_ram_retained(self) -> bool {
        self.words[1] & PD_MPU_RAM_RET_BIT != 0
    }

    /// Returns whether the MPU L1 caches are retained.
    pub fn mpu_l1_retained(self) -> bool {
        self.words[1] & PD_MPU_L1_RET_BIT != 0
    }

    /// Returns whether the MPU L2 cache is retained.
    pub fn mpu_l2_retained(self) -> bool {
        self.words[1] & PD_MPU_L2_RET_BIT != 0
    }

    /// Returns whether the ICSS memory is retained.
    pub fn per_icss_retained(self) -> bool {
        self.words[1] & PD_PER_ICSS_RET_BIT != 0
    }

    /// Returns whether the other PER memories are retained.
    pub fn per_mem_retained(self) -> bool {
        self.words[1] & PD_PER_MEM_RET_BIT != 0
    }

    /// Returns whether the OCMC RAM is retained.
    pub fn per_ocmc_retained(self) -> bool {
        self.words[1] & PD_PER_OCMC_RET_BIT != 0
    }

    /// Returns whether OCMC RAM bank 2 is retained.
    pub fn per_ocmc2_retained(self) -> bool {
        self.words[1] & PD_PER_OCMC2_RET_BIT != 0
    }

    /// Returns the enabled wake sources.
    pub fn wake_sources(self) -> WakeSources {
        WakeSources::from_bits_truncate(
            ((self.words[1] & WAKE_SOURCES_MASK) >> WAKE_SOURCES_SHIFT) as u16,
        )
    }

    /// Returns the bit reserved for internal use.
    pub fn reserved(self) -> bool {
        self.words[1] & RESERVED_BIT != 0
    }
}

impl Debug for DeepSleepData {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_struct("DeepSleepData")
            .field("oscillator_on", &self.oscillator_on())
            .field("deepsleep_count", &self.deepsleep_count())
            .field("mpu_voltage", &self.mpu_voltage())
            .field("mpu_state", &self.mpu_state_raw())
            .field("per_state", &self.per_state_raw())
            .field("wake_sources", &self.wake_sources())
            .finish_non_exhaustive()
    }
}

/// The two parameter words, exactly as the host wrote them.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct RawOverride {
    /// Contents of `PARAM1`.
    pub param1: u32,
    /// Contents of `PARAM2`.
    pub param2: u32,
}

/// The configuration a power-transition handler runs with.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Payload {
    /// A compiled-in RTC-mode record.
    Rtc(RtcData),
    /// A compiled-in deep-sleep or standby record.
    DeepSleep(DeepSleepData),
    /// A host-supplied override.
    Raw(RawOverride),
}

impl Payload {
    /// Returns the payload as an RTC record, or `None` if it is a record of another family.
    pub fn rtc(&self) -> Option<RtcData> {
        match self {
            Self::Rtc(data) => Some(*data),
            Self::Raw(raw) => Some(RtcData::from_word(raw.param1)),
            Self::DeepSleep(_) => None,
        }
    }

    /// Returns the payload as a deep-sleep record, or `None` if it is a record of another family.
    pub fn deep_sleep(&self) -> Option<DeepSleepData> {
        match self {
            Self::DeepSleep(data) => Some(*data),
            Self::Raw(raw) => Some(DeepSleepData::from_words(raw.param1, raw.param2)),
            Self::Rtc(_) => None,
        }
    }
}

const fn set_bit(word: u32, bit: u32, value: bool) -> u32 {
    if value { word | bit } else { word & !bit }
}

const fn set_field(word: u32, mask: u32, shift: u8, value: u32) -> u32 {
    (word & !mask) | ((value << shift) & mask)
}
