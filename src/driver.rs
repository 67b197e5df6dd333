//! Host side access to the touch CSR bank
use arbitrary_int::u2;
use captouch::{Pads, Register, PADS};

use crate::csr::{CsrBus, Layout};

#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum Error<E> {
    #[error("CSR bus")]
    Bus(E),
}

impl<E> From<E> for Error<E> {
    fn from(value: E) -> Self {
        Self::Bus(value)
    }
}

pub struct Touch<B> {
    bus: B,
    base: u32,
    layout: Layout,
}

impl<B: CsrBus> Touch<B> {
    /// `period_width` must match the gateware, it determines the bank layout.
    pub fn new(
        bus: B,
        base: u32,
        period_width: u8,
    ) -> Result<Self, captouch::Error> {
        captouch::Config::validate_period_width(period_width)?;
        Ok(Self {
            bus,
            base,
            layout: Layout::new(period_width),
        })
    }

    fn read(&mut self, reg: Register) -> Result<u32, Error<B::Error>> {
        let addr = self.base.wrapping_add(self.layout.offset(reg));
        Ok(self.bus.read(addr, self.layout.bytes(reg))?)
    }

    fn write(
        &mut self,
        reg: Register,
        value: u32,
    ) -> Result<(), Error<B::Error>> {
        let addr = self.base.wrapping_add(self.layout.offset(reg));
        Ok(self.bus.write(addr, self.layout.bytes(reg), value)?)
    }

    pub fn set_output(&mut self, o: Pads) -> Result<(), Error<B::Error>> {
        self.write(Register::O, o.bits() as _)
    }

    pub fn output(&mut self) -> Result<Pads, Error<B::Error>> {
        Ok(Pads::from_bits(self.read(Register::O)? as _))
    }

    pub fn set_output_enable(
        &mut self,
        oe: Pads,
    ) -> Result<(), Error<B::Error>> {
        self.write(Register::Oe, oe.bits() as _)
    }

    pub fn output_enable(&mut self) -> Result<Pads, Error<B::Error>> {
        Ok(Pads::from_bits(self.read(Register::Oe)? as _))
    }

    /// GPIO input levels. Stale for pads in captouch mode.
    pub fn input(&mut self) -> Result<Pads, Error<B::Error>> {
        Ok(Pads::from_bits(self.read(Register::I)? as _))
    }

    pub fn set_capen(&mut self, capen: Pads) -> Result<(), Error<B::Error>> {
        log::debug!("Captouch enable {:#06b}", capen.bits());
        self.write(Register::Capen, capen.bits() as _)
    }

    pub fn capen(&mut self) -> Result<Pads, Error<B::Error>> {
        Ok(Pads::from_bits(self.read(Register::Capen)? as _))
    }

    /// Set the sample period. Takes effect at the next latch.
    pub fn set_period(&mut self, period: u32) -> Result<(), Error<B::Error>> {
        self.write(Register::Cper, period)
    }

    pub fn period(&mut self) -> Result<u32, Error<B::Error>> {
        self.read(Register::Cper)
    }

    /// Event count of a pad latched at the end of the last sample window
    pub fn count(&mut self, ch: u2) -> Result<u8, Error<B::Error>> {
        Ok(self.read(Register::count(ch))? as _)
    }

    pub fn counts(&mut self) -> Result<[u8; PADS], Error<B::Error>> {
        let mut counts = [0; PADS];
        for (ch, count) in counts.iter_mut().enumerate() {
            *count = self.count(u2::new(ch as _))?;
        }
        Ok(counts)
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    pub fn release(self) -> B {
        self.bus
    }
}
