//! # wattnode433
//!
//! A portable, no_std Rust firmware core for battery-powered AC power-metering
//! sensor nodes that report over cheap 433 MHz ASK/OOK transmitters such as the FS1000A.
//!
//! The node wakes from deep sleep, samples voltage and current, integrates energy,
//! sends a short status frame over a one-way radio link and goes back to sleep.
//! This crate implements:
//! - `embedded-hal` based bit-banged transmission with strict per-cell timing
//! - Manchester, bit-serial and RadioHead-compatible (4b6b) line coding behind one
//!   [`FrameTransport`](crate::transport::FrameTransport) interface
//! - CRC-16 protected, length-prefixed framing with repetition
//! - RMS metering and energy integration
//! - wear-aware persistence of the energy total
//! - a watchdog-driven duty-cycle scheduler with an interrupt-safe wake flag
//!
//! ## Crate features
//! | Feature               | Description |
//! |-----------------------|-------------|
//! | `std`                 | Disables `#![no_std]` support (host builds and tests) |
//! | `delay-loop`          | Provides a blocking-delay stand-in for the watchdog sleep |
//! | `timer-isr` (default) | Masks interrupts with `critical_section::with` while a frame is on air, and exports the wake ISR macros |
//! | `defmt-0-3`           | Uses `defmt` logging |
//! | `log`                 | Uses `log` logging |
//!
//! ## Usage
//!
//! ```rust,ignore
//! use wattnode433::config::Config;
//! use wattnode433::scheduler::{Board, DutyCycleScheduler};
//! use wattnode433::transport::Transport;
//!
//! wattnode433::declare_wake_flag!(WAKE);
//!
//! #[interrupt]
//! fn WDT() {
//!     wattnode433::wake_isr!(WAKE);
//! }
//!
//! let config = Config::default();
//! let transport = Transport::from_config(tx_pin, &config);
//! let board = Board { adc, low_power, clock, indicator, delay };
//! let mut node = DutyCycleScheduler::boot(board, transport, eeprom, &WAKE, config);
//! node.run();
//! ```
//!
//! ## Integration Notes
//!
//! - The default bit rate is 1200 bit/s; Manchester cells are half a bit long
//! - Timing precision is critical; keep the `timer-isr` feature on so frames are sent
//!   with interrupts masked
//! - The watchdog ISR must do nothing but set the wake flag
//!
//! --
//! Designed for `#![no_std]` use in resource-constrained embedded environments.

#![deny(
    bad_style,
    dead_code,
    improper_ctypes,
    non_shorthand_field_patterns,
    no_mangle_generic_items,
    overflowing_literals,
    path_statements,
    patterns_in_fns_without_body,
    unconditional_recursion,
    unused,
    while_true,
    missing_debug_implementations,
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unused_extern_crates,
    unused_import_braces,
    unused_qualifications,
    unused_results
)]
#![cfg_attr(not(any(test, feature = "std")), no_std)]

#[cfg(feature = "timer-isr")]
pub use critical_section;

pub use heapless;

#[macro_use]
mod fmt;

pub mod board;
pub mod config;
pub mod consts;
pub mod crc;
pub mod encoding;
pub mod error;
pub mod frame;
pub mod measure;
pub mod payload;
pub mod scheduler;
pub mod store;
pub mod timer;
pub mod transmitter;
pub mod transport;

pub use error::Error;
