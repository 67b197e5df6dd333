//! Fomu quad capacitive touch pad peripheral
//!
//! # Description
//! Fomu exposes four single-ended pads on its side. Each pad is either a plain GPIO controlled
//! through the O, OE and I registers, or a capacitive sensor when its CAPEN bit is set.
//!
//! In capacitive mode the pad is repeatedly driven high for one tick and then released. Once the
//! pad has decayed below the input threshold a discharge event is counted and the pad is charged
//! again. A touch adds capacitance and slows the decay, so fewer events fit into a sample window.
//!
//! A shared scheduler latches the live event counts of all pads into the C1..C4 registers every
//! `CPER + 1` ticks and clears them. The scheduler only runs while at least one pad has CAPEN set.
//!
//! # Design
//! The peripheral is synchronous: [`CapTouch::tick`] advances all registers by one clock. Pad
//! outputs are a function of the state held at the start of the tick, the pads are then sensed,
//! and the next state is computed only from values held at the start of the tick.
//!
//! # Host misuse
//! These are defined behaviors, not faults:
//! * I is not updated for pads in capacitive mode and holds its last GPIO value.
//! * CPER = 0 latches on every enabled tick.
#![cfg_attr(not(test), no_std)]

use arbitrary_int::{u2, u4};
use bitbybit::bitfield;
use serde::{Deserialize, Serialize};
use tristate::TriState;

mod channel;
pub use channel::{Channel, Phase, Scheduler};

/// Number of pads
pub const PADS: usize = 4;

/// Reset value of the sample period register
pub const DEFAULT_PERIOD: u32 = 524288;

/// One bit per pad, used for the O, OE, I and CAPEN registers.
#[bitfield(u4, default = 0x0)]
#[derive(Debug, PartialEq, Eq)]
pub struct Pads {
    #[bit(0, rw)]
    pad: [bool; 4],
}

impl Pads {
    /// Construct from the low four bits of `bits`.
    pub fn from_bits(bits: u8) -> Self {
        Self::new_with_raw_value(u4::new(bits & u4::MASK))
    }

    pub fn bits(&self) -> u8 {
        self.raw_value().value()
    }

    pub fn any(&self) -> bool {
        self.bits() != 0
    }

    pub fn get(&self, ch: u2) -> bool {
        self.pad(ch.value() as usize)
    }

    pub fn with(&self, ch: u2, value: bool) -> Self {
        self.with_pad(ch.value() as usize, value)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, strum::EnumIter)]
pub enum Register {
    /// GPIO output value
    O,
    /// GPIO output enable
    Oe,
    /// GPIO input value
    I,
    /// Capacitive sensing enable
    Capen,
    /// Sample period in ticks
    Cper,
    C1,
    C2,
    C3,
    C4,
}

impl Register {
    pub fn count(ch: u2) -> Self {
        [Self::C1, Self::C2, Self::C3, Self::C4][ch.value() as usize]
    }

    /// Pad channel of a count register
    pub fn channel(&self) -> Option<u2> {
        match self {
            Self::C1 => Some(u2::new(0)),
            Self::C2 => Some(u2::new(1)),
            Self::C3 => Some(u2::new(2)),
            Self::C4 => Some(u2::new(3)),
            _ => None,
        }
    }

    pub fn writable(&self) -> bool {
        matches!(self, Self::O | Self::Oe | Self::Capen | Self::Cper)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("Invalid sample period width {0}")]
    PeriodWidth(u8),
    #[error("Sample period {0} exceeds register width")]
    Period(u32),
    #[error("{0:?} is read-only")]
    ReadOnly(Register),
}

/// Construction time configuration of the peripheral.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Width of the sample period register and of the scheduler countdown in bits, 1 to 32
    pub period_width: u8,
    /// Reset value of the sample period register, and of the scheduler countdown outside
    /// legacy mode
    pub period: u32,
    /// Counting and scheduling quirks of the deployed gateware.
    ///
    /// The countdown resets to 0, so the first enabled tick latches. Pad 2 increments
    /// from the live count of pad 1, and a discharge on a latch tick survives the clear
    /// of the live count. The GPIO path is not affected: pads follow O and OE within the
    /// same tick, without the extra register stage of the gateware.
    pub legacy: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            period_width: 32,
            period: DEFAULT_PERIOD,
            legacy: false,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), Error> {
        Self::validate_period_width(self.period_width)?;
        if self.period & !self.period_mask() != 0 {
            return Err(Error::Period(self.period));
        }
        Ok(())
    }

    pub fn validate_period_width(width: u8) -> Result<(), Error> {
        if !(1..=32).contains(&width) {
            return Err(Error::PeriodWidth(width));
        }
        Ok(())
    }

    /// Scheduler countdown at reset
    pub fn countdown(&self) -> u32 {
        if self.legacy {
            0
        } else {
            self.period
        }
    }

    pub fn period_mask(&self) -> u32 {
        u32::MAX >> (32 - self.period_width.clamp(1, 32) as u32)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct Registers {
    o: Pads,
    oe: Pads,
    i: Pads,
    capen: Pads,
    cper: u32,
    c: [u8; PADS],
}

impl Registers {
    fn new(period: u32) -> Self {
        Self {
            o: Pads::default(),
            oe: Pads::default(),
            i: Pads::default(),
            capen: Pads::default(),
            cper: period,
            c: [0; PADS],
        }
    }
}

pub struct CapTouch<P> {
    pads: [P; PADS],
    config: Config,
    regs: Registers,
    scheduler: Scheduler,
    channels: [Channel; PADS],
}

impl<P> CapTouch<P> {
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Restore all registers and internal state to their reset values.
    pub fn reset(&mut self) {
        self.regs = Registers::new(self.config.period);
        self.scheduler = Scheduler::new(self.config.countdown());
        self.channels = Default::default();
    }

    /// Register width in bits
    pub fn width(&self, reg: Register) -> u32 {
        match reg {
            Register::O | Register::Oe | Register::I | Register::Capen => 4,
            Register::Cper => self.config.period_width as _,
            Register::C1 | Register::C2 | Register::C3 | Register::C4 => 8,
        }
    }

    /// Read a register. Reading has no side effects.
    pub fn read(&self, reg: Register) -> u32 {
        match reg {
            Register::O => self.regs.o.bits() as _,
            Register::Oe => self.regs.oe.bits() as _,
            Register::I => self.regs.i.bits() as _,
            Register::Capen => self.regs.capen.bits() as _,
            Register::Cper => self.regs.cper,
            Register::C1 | Register::C2 | Register::C3 | Register::C4 => {
                reg.channel().map_or(0, |ch| self.count(ch) as _)
            }
        }
    }

    /// Write a register, masking `value` to the register width.
    ///
    /// The new value is used from the next tick on. Writing CPER does not restart the
    /// countdown in progress.
    pub fn write(&mut self, reg: Register, value: u32) -> Result<(), Error> {
        let pads = Pads::from_bits(value as u8);
        match reg {
            Register::O => self.regs.o = pads,
            Register::Oe => self.regs.oe = pads,
            Register::Capen => {
                let changed = self.regs.capen.bits() ^ pads.bits();
                for ch in 0..PADS {
                    if changed & (1 << ch) != 0 {
                        log::debug!(
                            "Pad {} captouch {}",
                            ch + 1,
                            if pads.pad(ch) { "enabled" } else { "disabled" }
                        );
                    }
                }
                self.regs.capen = pads;
            }
            Register::Cper => self.regs.cper = value & self.config.period_mask(),
            _ => return Err(Error::ReadOnly(reg)),
        }
        Ok(())
    }

    pub fn capen(&self) -> Pads {
        self.regs.capen
    }

    pub fn input(&self) -> Pads {
        self.regs.i
    }

    /// Latched event count of a pad
    pub fn count(&self, ch: u2) -> u8 {
        self.regs.c[ch.value() as usize]
    }

    pub fn counts(&self) -> [u8; PADS] {
        self.regs.c
    }

    /// Live state of a pad in the current sample window
    pub fn channel(&self, ch: u2) -> &Channel {
        &self.channels[ch.value() as usize]
    }

    /// Ticks remaining until the next latch
    pub fn countdown(&self) -> u32 {
        self.scheduler.countdown()
    }

    pub fn pad(&self, ch: u2) -> &P {
        &self.pads[ch.value() as usize]
    }

    pub fn pad_mut(&mut self, ch: u2) -> &mut P {
        &mut self.pads[ch.value() as usize]
    }

    pub fn free(self) -> [P; PADS] {
        self.pads
    }
}

impl<P: TriState> CapTouch<P> {
    pub fn new(pads: [P; PADS], config: Config) -> Result<Self, Error> {
        config.validate()?;
        Ok(Self {
            pads,
            config,
            regs: Registers::new(config.period),
            scheduler: Scheduler::new(config.countdown()),
            channels: Default::default(),
        })
    }

    /// Advance one clock tick.
    ///
    /// Returns the freshly latched counts on a latch tick. A pad error aborts the tick
    /// before any register, channel or countdown state changes.
    pub fn tick(&mut self) -> Result<Option<[u8; PADS]>, P::Error> {
        let regs = self.regs;
        let channels = self.channels;

        for (ch, pad) in self.pads.iter_mut().enumerate() {
            let (o, oe) = if regs.capen.pad(ch) {
                (true, channels[ch].phase.output_enable())
            } else {
                (regs.o.pad(ch), regs.oe.pad(ch))
            };
            if oe {
                pad.drive(o)?;
            } else {
                pad.release()?;
            }
        }

        let mut level = [false; PADS];
        for (level, pad) in level.iter_mut().zip(self.pads.iter_mut()) {
            *level = pad.sense()?;
        }

        let latch = regs.capen.any() && self.scheduler.step(regs.cper);
        if latch {
            self.regs.c = channels.map(|ch| ch.count);
            for ch in self.channels.iter_mut() {
                ch.count = 0;
            }
            log::trace!("Latched counts {:?}", self.regs.c);
        }

        for (i, ch) in self.channels.iter_mut().enumerate() {
            if !regs.capen.pad(i) {
                self.regs.i = self.regs.i.with_pad(i, level[i]);
                ch.phase = Phase::follow(regs.oe.pad(i));
                continue;
            }
            let base = if self.config.legacy && i == 1 {
                channels[0].count
            } else {
                channels[i].count
            };
            let (phase, count) = channels[i].step(level[i], base);
            ch.phase = phase;
            if let Some(count) = count {
                if !latch || self.config.legacy {
                    ch.count = count;
                }
            }
        }

        Ok(latch.then_some(self.regs.c))
    }
}
