//! Per-pad charge/discharge state machine and the shared sample scheduler.

/// Drive phase of a pad in capacitive mode.
///
/// This is the output enable flip-flop of the pad: the pad is always
/// commanded high and only the enable toggles.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Phase {
    /// Output enabled, pad driven high.
    Charging,
    /// Output released, pad decaying towards the input threshold.
    #[default]
    Sensing,
}

impl Phase {
    pub fn output_enable(&self) -> bool {
        *self == Self::Charging
    }

    /// Phase tracking a host output enable while the pad is in GPIO mode.
    pub fn follow(oe: bool) -> Self {
        if oe {
            Self::Charging
        } else {
            Self::Sensing
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Channel {
    pub(crate) phase: Phase,
    /// Discharge events in the current sample window. Wraps.
    pub(crate) count: u8,
}

impl Channel {
    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn count(&self) -> u8 {
        self.count
    }

    /// Advance one tick in capacitive mode given the sensed `level`.
    ///
    /// Returns the next phase and, if a discharge completed, the incremented
    /// count. The increment is computed from `base`, which is the channel's own
    /// count unless the gateware's channel coupling is reproduced.
    pub fn step(&self, level: bool, base: u8) -> (Phase, Option<u8>) {
        match self.phase {
            // Just charged: release and let the pad decay
            Phase::Charging => (Phase::Sensing, None),
            Phase::Sensing if !level => {
                (Phase::Charging, Some(base.wrapping_add(1)))
            }
            Phase::Sensing => (Phase::Sensing, None),
        }
    }
}

/// Down-counter pacing the latch of live counts into the count registers.
///
/// The countdown visits zero, so latches are `period + 1` ticks apart.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Scheduler {
    countdown: u32,
}

impl Scheduler {
    pub fn new(countdown: u32) -> Self {
        Self { countdown }
    }

    pub fn countdown(&self) -> u32 {
        self.countdown
    }

    /// Advance one tick. Returns `true` on a latch tick, reloading from `period`.
    pub fn step(&mut self, period: u32) -> bool {
        match self.countdown.checked_sub(1) {
            Some(countdown) => {
                self.countdown = countdown;
                false
            }
            None => {
                self.countdown = period;
                true
            }
        }
    }
}
