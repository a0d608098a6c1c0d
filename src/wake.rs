// Copyright The Rusted Firmware-A Contributors.
//
// SPDX-License-Identifier: BSD-3-Clause

//! Wake sources and the wake-reason vector reported back to the host.

use bitflags::bitflags;

/// Reason code reported when no wake source was recorded.
pub const NO_WAKE_REASON: u8 = 0xff;

bitflags! {
    /// Wake sources, in the bit order used by the deep-sleep payload.
    #[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
    #[repr(transparent)]
    pub struct WakeSources: u16 {
        /// USB.
        const USB = 1 << 0;
        /// I2C0.
        const I2C0 = 1 << 1;
        /// RTC alarm.
        const RTC_ALARM = 1 << 2;
        /// DMTIMER1.
        const TIMER1 = 1 << 3;
        /// UART0.
        const UART0 = 1 << 4;
        /// GPIO0 wake line 0.
        const GPIO0_WAKE0 = 1 << 5;
        /// GPIO0 wake line 1.
        const GPIO0_WAKE1 = 1 << 6;
        /// Watchdog timer 1.
        const WDT1 = 1 << 7;
        /// ADC / touchscreen controller.
        const ADTSC = 1 << 8;
        /// RTC timer, reserved and not used currently.
        const RTC_TIMER = 1 << 9;
        /// USB wake-out 0.
        const USBWOUT0 = 1 << 10;
        /// The MPU itself.
        const MPU = 1 << 11;
        /// USB wake-out 1.
        const USBWOUT1 = 1 << 12;
    }
}

impl WakeSources {
    /// Every source usable from the deep-sleep states, i.e. everything except the MPU.
    pub const ALL_DEEP_SLEEP: Self = Self::from_bits_retain(0x17ff);

    /// Width of the wake-source field in the deep-sleep payload.
    pub const FIELD_BITS: u32 = 13;
}

/// The wake-reason vector.
///
/// Wake handlers set the flag of every source which caused the last wake. The vector is cleared at
/// the start of each dispatch cycle and its dominant reason is flushed into the `TRACE` register
/// when wake processing completes.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct WakeReasons {
    sources: WakeSources,
}

impl WakeReasons {
    /// Creates an empty vector.
    pub const fn new() -> Self {
        Self {
            sources: WakeSources::empty(),
        }
    }

    /// Sets the flags of the given sources.
    pub fn set(&mut self, sources: WakeSources) {
        self.sources.insert(sources);
    }

    /// Clears the flags of the given sources.
    pub fn clear(&mut self, sources: WakeSources) {
        self.sources.remove(sources);
    }

    /// Returns whether all of the given sources are flagged.
    pub fn is_set(&self, sources: WakeSources) -> bool {
        self.sources.contains(sources)
    }

    /// Clears every flag.
    pub fn clear_all(&mut self) {
        self.sources = WakeSources::empty();
    }

    /// Returns the flagged sources.
    pub fn sources(&self) -> WakeSources {
        self.sources
    }

    /// Returns the code of the dominant wake reason: the bit index of the lowest flagged source,
    /// or [`NO_WAKE_REASON`] if nothing is flagged.
    pub fn dominant_code(&self) -> u8 {
        if self.sources.is_empty() {
            NO_WAKE_REASON
        } else {
            self.sources.bits().trailing_zeros() as u8
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_deep_sleep_excludes_mpu() {
        assert!(!WakeSources::ALL_DEEP_SLEEP.contains(WakeSources::MPU));
        assert_eq!(
            WakeSources::ALL_DEEP_SLEEP | WakeSources::MPU,
            WakeSources::all()
        );
        assert_eq!(WakeSources::all().bits() >> WakeSources::FIELD_BITS, 0);
    }

    #[test]
    fn set_and_clear() {
        let mut reasons = WakeReasons::new();
        assert_eq!(reasons.dominant_code(), NO_WAKE_REASON);

        reasons.set(WakeSources::UART0 | WakeSources::WDT1);
        assert!(reasons.is_set(WakeSources::UART0));
        assert!(reasons.is_set(WakeSources::WDT1));
        assert!(!reasons.is_set(WakeSources::USB));
        assert_eq!(reasons.dominant_code(), 4);

        reasons.clear(WakeSources::UART0);
        assert_eq!(reasons.sources(), WakeSources::WDT1);
        assert_eq!(reasons.dominant_code(), 7);

        reasons.set(WakeSources::USB);
        assert_eq!(reasons.dominant_code(), 0);
    }

    #[test]
    fn clear_all_is_idempotent() {
        let mut reasons = WakeReasons::new();
        reasons.set(WakeSources::all());
        reasons.clear_all();
        assert_eq!(reasons, WakeReasons::new());
        reasons.clear_all();
        assert_eq!(reasons, WakeReasons::new());
        assert_eq!(reasons.dominant_code(), NO_WAKE_REASON);
    }
}
