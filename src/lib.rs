// Copyright The Rusted Firmware-A Contributors.
//
// SPDX-License-Identifier: BSD-3-Clause

//! IPC command handling for the AM33xx wakeup power-management coprocessor.
//!
//! The host processor posts power-mode commands in eight shared message registers. This crate
//! classifies each command, chooses the power-transition payload it runs with, dispatches it to
//! its handler and reports the status, and the wake reason, back through the same registers.

#![cfg_attr(not(test), no_std)]

mod debug;
pub mod dispatch;
pub mod engine;
pub mod logger;
pub mod mailbox;
pub mod payload;
pub mod platform;
pub mod protocol;
pub mod sequencer;
pub mod wake;

pub use engine::{Acceptance, CycleState, Engine};
