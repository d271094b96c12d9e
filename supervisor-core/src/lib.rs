#![no_std]

// Control logic for the vehicle ignition supervisor.
//
// This crate stays portable across MCU firmware and host tooling by avoiding
// the Rust standard library. It owns the framed host protocol, the watchdog
// state machine, the ignition debounce filter, and the power sequencer; the
// firmware and emulator crates bind its traits to real or simulated I/O.

pub mod clock;
pub mod config;
pub mod console;
pub mod diag;
pub mod ignition;
pub mod power;
pub mod protocol;
pub mod supervisor;
pub mod watchdog;
