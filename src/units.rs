//! Unit conversions and status-bit derivation.

/// Knots per metre per second.
pub const KNOTS_PER_MPS: f64 = 1.9438444924406;

/// Volts per millivolt.
pub const VOLTS_PER_MILLIVOLT: f64 = 0.001;

pub fn knots_from_mps(mps: f64) -> f64 {
    mps * KNOTS_PER_MPS
}

pub fn volts_from_millivolts(millivolts: i64) -> f64 {
    millivolts as f64 * VOLTS_PER_MILLIVOLT
}

/// Digital input lines decoded from the status bitmask.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputState {
    pub ignition: bool,
    pub input1: bool,
    pub input2: bool,
}

impl InputState {
    /// The hardware pulls lines low when active: a cleared bit means "on".
    /// Bit 0 is ignition, bits 1 and 2 are the two digital inputs.
    pub fn from_mask(mask: u32) -> Self {
        let active = |bit: u32| mask & (1 << bit) == 0;
        InputState {
            ignition: active(0),
            input1: active(1),
            input2: active(2),
        }
    }
}
