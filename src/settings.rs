//! Touch Settings Management
//!
//! # Design
//! The runtime settings mirror the writable registers of the touch bank. They are a
//! [`miniconf::Tree`] so they can be addressed by path and transferred as JSON, and are
//! written to the peripheral through the host [`Touch`] driver.
use arbitrary_int::u2;
use captouch::{Pads, DEFAULT_PERIOD, PADS};
use miniconf::Tree;
use serde::{Deserialize, Serialize};

use crate::csr::CsrBus;
use crate::driver::{Error, Touch};

/// Runtime settings of the touch bank.
#[derive(Clone, Debug, PartialEq, Tree, Serialize, Deserialize)]
#[tree(meta(doc, typename))]
pub struct Settings {
    /// Capacitive sensing enable per pad
    #[tree(with=miniconf::leaf)]
    pub capen: [bool; PADS],

    /// Sample period in ticks. Counts are latched every `period + 1` ticks.
    pub period: u32,

    /// GPIO output level per pad
    #[tree(with=miniconf::leaf)]
    pub output: [bool; PADS],

    /// GPIO output enable per pad
    #[tree(with=miniconf::leaf)]
    pub output_enable: [bool; PADS],
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            capen: [false; PADS],
            period: DEFAULT_PERIOD,
            output: [false; PADS],
            output_enable: [false; PADS],
        }
    }
}

fn pads(bits: [bool; PADS]) -> Pads {
    bits.iter()
        .enumerate()
        .fold(Pads::default(), |p, (ch, b)| p.with(u2::new(ch as _), *b))
}

fn bools(pads: Pads) -> [bool; PADS] {
    core::array::from_fn(|ch| pads.get(u2::new(ch as _)))
}

impl Settings {
    /// Write the settings to the peripheral.
    ///
    /// GPIO levels are written before the capacitive enable so that pads leaving
    /// captouch mode never drive stale values.
    pub fn apply<B: CsrBus>(
        &self,
        touch: &mut Touch<B>,
    ) -> Result<(), Error<B::Error>> {
        touch.set_output(pads(self.output))?;
        touch.set_output_enable(pads(self.output_enable))?;
        touch.set_period(self.period)?;
        touch.set_capen(pads(self.capen))?;
        log::info!("Touch settings applied");
        Ok(())
    }

    /// Read back the current register state.
    pub fn load<B: CsrBus>(
        touch: &mut Touch<B>,
    ) -> Result<Self, Error<B::Error>> {
        Ok(Self {
            capen: bools(touch.capen()?),
            period: touch.period()?,
            output: bools(touch.output()?),
            output_enable: bools(touch.output_enable()?),
        })
    }
}
