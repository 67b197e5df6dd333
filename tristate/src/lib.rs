#![cfg_attr(not(test), no_std)]

use core::convert::Infallible;
use embedded_hal::digital::{InputPin, OutputPin};

pub use embedded_hal::digital::ErrorType;

/// A bidirectional pad that can be driven to a level, released to high
/// impedance, or sensed.
///
/// The captouch core calls `drive()` or `release()` exactly once per tick,
/// followed by `sense()`.
pub trait TriState: ErrorType {
    /// Enable the output driver at `level`.
    fn drive(&mut self, level: bool) -> Result<(), Self::Error>;

    /// Disable the output driver.
    fn release(&mut self) -> Result<(), Self::Error>;

    /// Sample the pad level.
    fn sense(&mut self) -> Result<bool, Self::Error>;
}

/// A data pin behind an external output buffer.
///
/// `pin` carries the level in both directions, `oe` enables the buffer.
pub struct Buffered<P, OE> {
    pin: P,
    oe: OE,
}

impl<P, OE> Buffered<P, OE> {
    pub fn new(pin: P, oe: OE) -> Self {
        Self { pin, oe }
    }

    pub fn free(self) -> (P, OE) {
        (self.pin, self.oe)
    }
}

impl<P: ErrorType, OE> ErrorType for Buffered<P, OE> {
    type Error = P::Error;
}

impl<P, OE> TriState for Buffered<P, OE>
where
    P: OutputPin + InputPin,
    OE: OutputPin<Error = P::Error>,
{
    fn drive(&mut self, level: bool) -> Result<(), Self::Error> {
        // Set the level before enabling to avoid a glitch
        self.pin.set_state(level.into())?;
        self.oe.set_high()
    }

    fn release(&mut self) -> Result<(), Self::Error> {
        self.oe.set_low()
    }

    fn sense(&mut self) -> Result<bool, Self::Error> {
        self.pin.is_high()
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Charge {
    Driven(bool),
    /// Ticks spent floating since the last drive high
    Floating(u32),
    Discharged,
}

/// Simulated capacitive pad.
///
/// After being driven high and released the pad reads high for `decay`
/// ticks (or `touch_decay` ticks while touched) before falling below the
/// input threshold. With zero decay the pad mirrors whatever was driven.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RcPad {
    decay: u32,
    touch_decay: u32,
    touched: bool,
    charge: Charge,
}

impl Default for RcPad {
    fn default() -> Self {
        Self::new(0, 0)
    }
}

impl RcPad {
    pub fn new(decay: u32, touch_decay: u32) -> Self {
        Self {
            decay,
            touch_decay,
            touched: false,
            charge: Charge::Discharged,
        }
    }

    /// A pad that senses exactly what was last driven and reads low when released.
    pub fn loopback() -> Self {
        Self::default()
    }

    pub fn set_touched(&mut self, touched: bool) {
        if touched != self.touched {
            log::debug!("pad touched: {touched}");
        }
        self.touched = touched;
    }

    pub fn touched(&self) -> bool {
        self.touched
    }

    /// Whether the output driver is currently enabled.
    pub fn is_driven(&self) -> bool {
        matches!(self.charge, Charge::Driven(_))
    }

    /// Level currently driven, if any.
    pub fn driven(&self) -> Option<bool> {
        match self.charge {
            Charge::Driven(level) => Some(level),
            _ => None,
        }
    }

    fn decay(&self) -> u32 {
        if self.touched {
            self.touch_decay
        } else {
            self.decay
        }
    }
}

impl ErrorType for RcPad {
    type Error = Infallible;
}

impl TriState for RcPad {
    fn drive(&mut self, level: bool) -> Result<(), Self::Error> {
        self.charge = Charge::Driven(level);
        Ok(())
    }

    fn release(&mut self) -> Result<(), Self::Error> {
        self.charge = match self.charge {
            Charge::Driven(true) => Charge::Floating(0),
            Charge::Floating(t) => Charge::Floating(t.saturating_add(1)),
            Charge::Driven(false) | Charge::Discharged => Charge::Discharged,
        };
        Ok(())
    }

    fn sense(&mut self) -> Result<bool, Self::Error> {
        Ok(match self.charge {
            Charge::Driven(level) => level,
            Charge::Floating(t) => t < self.decay(),
            Charge::Discharged => false,
        })
    }
}
