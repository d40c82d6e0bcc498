//! Normalized rounding-mode enumeration.
//!
//! Guest front-ends store rounding state in this representation and convert
//! to/from the native encoding only at the explicit load/store boundaries of
//! the guest's FP status register.

/// IR rounding mode. The discriminants are part of the IR contract: rounding
/// modes travel through generated code as integer constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RoundMode {
    Nearest = 0,
    NegInf = 1,
    PosInf = 2,
    Zero = 3,
}

impl RoundMode {
    /// Recovers a rounding mode from its IR integer encoding.
    #[must_use]
    pub fn from_bits(bits: u64) -> RoundMode {
        match bits {
            0 => RoundMode::Nearest,
            1 => RoundMode::NegInf,
            2 => RoundMode::PosInf,
            3 => RoundMode::Zero,
            _ => panic!("invalid IR rounding mode {bits}"),
        }
    }
}
