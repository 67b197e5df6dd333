//! Simulated touch CSR bank
//!
//! Wraps the peripheral behind the byte-wide CSR bus the way the gateware
//! exposes it: subregister writes take effect immediately, writes to status
//! registers and unmapped addresses are dropped and unmapped reads return 0.
use core::convert::Infallible;

use captouch::{CapTouch, PADS};
use tristate::TriState;

use crate::csr::{CsrBus, Layout};

pub struct Soc<P> {
    touch: CapTouch<P>,
    base: u32,
    layout: Layout,
}

impl<P> Soc<P> {
    pub fn new(touch: CapTouch<P>, base: u32) -> Self {
        let layout = Layout::new(touch.config().period_width);
        Self {
            touch,
            base,
            layout,
        }
    }

    pub fn base(&self) -> u32 {
        self.base
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn touch(&self) -> &CapTouch<P> {
        &self.touch
    }

    pub fn touch_mut(&mut self) -> &mut CapTouch<P> {
        &mut self.touch
    }

    fn decode(&self, addr: u32) -> Option<(captouch::Register, u32)> {
        addr.checked_sub(self.base)
            .and_then(|offset| self.layout.decode(offset))
    }
}

impl<P: TriState> Soc<P> {
    /// Advance the peripheral by `ticks` clocks, returning the last latched counts.
    pub fn run(&mut self, ticks: u32) -> Result<Option<[u8; PADS]>, P::Error> {
        let mut latched = None;
        for _ in 0..ticks {
            latched = self.touch.tick()?.or(latched);
        }
        Ok(latched)
    }
}

impl<P> CsrBus for Soc<P> {
    type Error = Infallible;

    fn read8(&mut self, addr: u32) -> Result<u8, Infallible> {
        Ok(self
            .decode(addr)
            .map_or(0, |(reg, lane)| (self.touch.read(reg) >> (lane * 8)) as u8))
    }

    fn write8(&mut self, addr: u32, value: u8) -> Result<(), Infallible> {
        match self.decode(addr) {
            Some((reg, lane)) if reg.writable() => {
                let shift = lane * 8;
                let word = (self.touch.read(reg) & !(0xff << shift))
                    | ((value as u32) << shift);
                if let Err(e) = self.touch.write(reg, word) {
                    log::warn!("CSR write to {addr:#x} failed: {e}");
                }
            }
            _ => log::trace!("Dropping CSR write to {addr:#x}"),
        }
        Ok(())
    }
}
