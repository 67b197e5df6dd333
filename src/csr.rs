//! LiteX CSR bank of the touch peripheral
//!
//! The SoC is built with 8-bit CSR data. A register `w` bits wide is split into `ceil(w / 8)`
//! subregisters on consecutive 32-bit aligned words, most significant byte first. The bank
//! holds O, OE, I, CAPEN, CPER and C1..C4 in that order.
use captouch::Register;
use strum::IntoEnumIterator;

/// Base of the CSR region
pub const CSR_BASE: u32 = 0xe000_0000;
/// Address space per CSR bank
pub const CSR_BANK_SIZE: u32 = 0x800;
/// CSR bank id of the touch peripheral
pub const TOUCH_CSR_ID: u32 = 11;
pub const TOUCH_BASE: u32 = CSR_BASE + TOUCH_CSR_ID * CSR_BANK_SIZE;
/// Address increment between subregisters
pub const CSR_STRIDE: u32 = 4;

/// Byte-wide CSR access, e.g. a wishbone bridge or the simulated bank.
pub trait CsrBus {
    type Error;

    fn read8(&mut self, addr: u32) -> Result<u8, Self::Error>;

    fn write8(&mut self, addr: u32, value: u8) -> Result<(), Self::Error>;

    /// Read a CSR made of `bytes` subregisters.
    fn read(&mut self, addr: u32, bytes: u32) -> Result<u32, Self::Error> {
        let mut value = 0;
        for i in 0..bytes {
            let addr = addr.wrapping_add(i * CSR_STRIDE);
            value = (value << 8) | self.read8(addr)? as u32;
        }
        Ok(value)
    }

    /// Write a CSR made of `bytes` subregisters.
    ///
    /// The subregisters are written one by one, so the peripheral sees
    /// intermediate values if it ticks in between.
    fn write(
        &mut self,
        addr: u32,
        bytes: u32,
        value: u32,
    ) -> Result<(), Self::Error> {
        for i in 0..bytes {
            // Lanes beyond 32 bits are zero
            let lane = value.checked_shr((bytes - 1 - i) * 8).unwrap_or(0);
            self.write8(addr.wrapping_add(i * CSR_STRIDE), lane as u8)?;
        }
        Ok(())
    }
}

impl<T: CsrBus> CsrBus for &mut T {
    type Error = T::Error;

    fn read8(&mut self, addr: u32) -> Result<u8, Self::Error> {
        (**self).read8(addr)
    }

    fn write8(&mut self, addr: u32, value: u8) -> Result<(), Self::Error> {
        (**self).write8(addr, value)
    }
}

/// Register placement within the bank.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Layout {
    period_bytes: u32,
}

impl Default for Layout {
    fn default() -> Self {
        Self::new(32)
    }
}

impl Layout {
    /// `period_width` is clamped to 1 to 32 bits.
    pub fn new(period_width: u8) -> Self {
        Self {
            period_bytes: (period_width.clamp(1, 32) as u32).div_ceil(8),
        }
    }

    /// Number of subregisters
    pub fn bytes(&self, reg: Register) -> u32 {
        match reg {
            Register::Cper => self.period_bytes,
            _ => 1,
        }
    }

    /// Offset of the first subregister from the bank base
    pub fn offset(&self, reg: Register) -> u32 {
        Register::iter()
            .take_while(|r| *r != reg)
            .map(|r| self.bytes(r))
            .sum::<u32>()
            * CSR_STRIDE
    }

    /// Bank address space in use
    pub fn size(&self) -> u32 {
        Register::iter().map(|r| self.bytes(r)).sum::<u32>() * CSR_STRIDE
    }

    /// Register and byte lane (0 is the least significant) at an offset from the bank base
    pub fn decode(&self, offset: u32) -> Option<(Register, u32)> {
        if offset % CSR_STRIDE != 0 {
            return None;
        }
        let mut word = offset / CSR_STRIDE;
        for reg in Register::iter() {
            let bytes = self.bytes(reg);
            if word < bytes {
                return Some((reg, bytes - 1 - word));
            }
            word -= bytes;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn touch_bank() {
        assert_eq!(TOUCH_BASE, 0xe000_5800);
        let l = Layout::default();
        for (reg, offset) in [
            (Register::O, 0x00),
            (Register::Oe, 0x04),
            (Register::I, 0x08),
            (Register::Capen, 0x0c),
            (Register::Cper, 0x10),
            (Register::C1, 0x20),
            (Register::C2, 0x24),
            (Register::C3, 0x28),
            (Register::C4, 0x2c),
        ] {
            assert_eq!(l.offset(reg), offset, "{reg:?}");
            assert_eq!(l.decode(offset), Some((reg, l.bytes(reg) - 1)));
        }
        assert_eq!(l.size(), 0x30);
    }

    #[test]
    fn period_lanes() {
        let l = Layout::new(20);
        assert_eq!(l.bytes(Register::Cper), 3);
        assert_eq!(l.decode(0x10), Some((Register::Cper, 2)));
        assert_eq!(l.decode(0x18), Some((Register::Cper, 0)));
        assert_eq!(l.offset(Register::C1), 0x1c);
        assert_eq!(l.decode(0x2c), None);
        assert_eq!(l.decode(0x11), None);
    }

    #[test]
    fn period_width_clamped() {
        assert_eq!(Layout::new(40), Layout::new(32));
        assert_eq!(Layout::new(0).bytes(Register::Cper), 1);
    }

    /// Sparse byte memory
    #[derive(Default)]
    struct Mem(std::collections::BTreeMap<u32, u8>);

    impl CsrBus for Mem {
        type Error = core::convert::Infallible;

        fn read8(&mut self, addr: u32) -> Result<u8, Self::Error> {
            Ok(self.0.get(&addr).copied().unwrap_or(0))
        }

        fn write8(&mut self, addr: u32, value: u8) -> Result<(), Self::Error> {
            self.0.insert(addr, value);
            Ok(())
        }
    }

    #[test]
    fn top_of_address_space() {
        let mut m = Mem::default();
        let addr = u32::MAX - 3;
        m.write(addr, 3, 0x12_3456).unwrap();
        assert_eq!(
            m.0.iter().map(|(a, v)| (*a, *v)).collect::<Vec<_>>(),
            [(0, 0x34), (4, 0x56), (addr, 0x12)]
        );
        assert_eq!(m.read(addr, 3).unwrap(), 0x12_3456);
    }

    #[test]
    fn wide_write() {
        let mut m = Mem::default();
        m.write(0, 5, 0x1234_5678).unwrap();
        assert_eq!(m.read(0, 1).unwrap(), 0);
        assert_eq!(m.read(4, 4).unwrap(), 0x1234_5678);
    }
}
