//! Fomu capacitive touch pads on the LiteX CSR bus
//!
//! The [`captouch`] crate implements the peripheral itself. This crate places it in the SoC: the
//! CSR bank layout and address map ([`csr`]), a simulated bank that serves CSR accesses from a
//! ticking peripheral ([`soc`]), the host side register driver ([`driver`]) and the runtime
//! settings applied through it ([`settings`]).
#![cfg_attr(not(test), no_std)]

pub use captouch;
pub use tristate;

pub mod csr;
pub mod driver;
pub mod settings;
pub mod soc;
