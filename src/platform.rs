// Copyright The Rusted Firmware-A Contributors.
//
// SPDX-License-Identifier: BSD-3-Clause

//! Platform selection and the interface each platform provides to the engine.

macro_rules! select_platform {
    (platform = $condition:literal, $mod:ident::$plat_impl:ident) => {
        #[cfg(platform = $condition)]
        pub mod $mod;

        #[cfg(platform = $condition)]
        pub use $mod::$plat_impl as PlatformImpl;
    };
    (test, $mod:ident::$plat_impl:ident) => {
        #[cfg(test)]
        pub mod $mod;

        #[cfg(test)]
        pub use $mod::$plat_impl as PlatformImpl;
    };
}

select_platform!(platform = "am335x", am335x::Am335x);
select_platform!(test, test::TestPlatform);

use crate::{mailbox::Mailbox, sequencer::PowerSequencer};
use num_enum::{IntoPrimitive, TryFromPrimitive};

/// The engine for the platform selected at build time.
#[cfg(any(test, platform = "am335x"))]
pub type PlatformEngine = crate::engine::Engine<
    <PlatformImpl as Platform>::Mailbox,
    <PlatformImpl as Platform>::Sequencer,
>;

/// Version of the IPC protocol implemented by this firmware, reported by the version command.
pub const FIRMWARE_VERSION: u16 = 0x24;

const DEVICE_TYPE_SHIFT: u32 = 8;
const DEVICE_TYPE_MASK: u32 = 0x3 << DEVICE_TYPE_SHIFT;

/// Silicon variant of the device, which decides between the GP and alternate default payloads.
#[derive(Copy, Clone, Debug, Eq, PartialEq, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum SocVariant {
    /// Test device.
    Test = 0,
    /// Emulation device.
    Emulation = 1,
    /// High-security device.
    HighSecurity = 2,
    /// General-purpose device.
    GeneralPurpose = 3,
}

impl SocVariant {
    /// Decodes the device-type field of the control module status register.
    pub fn from_control_status(status: u32) -> Self {
        match (status & DEVICE_TYPE_MASK) >> DEVICE_TYPE_SHIFT {
            0 => Self::Test,
            1 => Self::Emulation,
            2 => Self::HighSecurity,
            _ => Self::GeneralPurpose,
        }
    }

    /// Returns whether this is a general-purpose device.
    pub fn is_general_purpose(self) -> bool {
        self == Self::GeneralPurpose
    }
}

/// The hooks implemented by all platforms.
pub trait Platform {
    /// The protocol version reported to the host.
    const FIRMWARE_VERSION: u16 = FIRMWARE_VERSION;

    /// Platform dependent mailbox implementation type.
    type Mailbox: Mailbox;

    /// Platform dependent power sequencing implementation type.
    type Sequencer: PowerSequencer;

    /// Initialises the logger and anything else the platform needs before the engine is created.
    ///
    /// Any logs sent before this is called will be ignored.
    fn init();

    /// Returns the silicon variant of the device.
    fn soc_variant() -> SocVariant;

    /// Creates instance of the mailbox.
    ///
    /// # Safety
    ///
    /// This must only be called once, to avoid creating aliases of the IPC registers.
    unsafe fn create_mailbox() -> Self::Mailbox;

    /// Creates instance of the power sequencer.
    fn create_sequencer() -> Self::Sequencer;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_type_field() {
        assert_eq!(SocVariant::from_control_status(0x0000_0000), SocVariant::Test);
        assert_eq!(
            SocVariant::from_control_status(0x0000_0100),
            SocVariant::Emulation
        );
        assert_eq!(
            SocVariant::from_control_status(0xffff_fcff | 0x200),
            SocVariant::HighSecurity
        );
        assert_eq!(
            SocVariant::from_control_status(0x0040_0300),
            SocVariant::GeneralPurpose
        );
        for raw in 0..4u8 {
            let variant = SocVariant::try_from(raw).unwrap();
            assert_eq!(
                SocVariant::from_control_status(u32::from(raw) << 8),
                variant
            );
            assert_eq!(variant.is_general_purpose(), raw == 3);
        }
    }
}
