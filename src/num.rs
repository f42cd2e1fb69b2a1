use fastnum::{
    UD128, bint,
    decimal::{Context, RoundingMode, UnsignedDecimal},
};

/// Error converting a decimal amount to quantum units.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum QuantumError {
    /// The amount has more fractional digits than the asset supports.
    /// Financial amounts are never silently truncated.
    #[error("amount {amount} has more than {decimals} fractional digits")]
    PrecisionLoss { amount: String, decimals: u8 },

    #[error("amount {0} exceeds the quantum range")]
    Overflow(String),

    #[error("amount must be positive, got {0}")]
    NegativeAmount(String),
}

/// Decimal to fixed-point quantum converter.
///
/// A quantum is the smallest unit of an asset on the venue: the decimal
/// amount scaled by `10^decimals`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Quantizer {
    decimals: i32,
}

impl Quantizer {
    pub fn new(decimals: u8) -> Self {
        Self {
            decimals: decimals as i32,
        }
    }

    pub fn decimals(&self) -> u8 {
        self.decimals as u8
    }

    /// Convert a decimal amount to quantum units.
    ///
    /// Fails with [`QuantumError::PrecisionLoss`] if the amount does not fit
    /// the asset's scale exactly and with [`QuantumError::Overflow`] if the
    /// scaled amount does not fit `u64`.
    pub fn to_quantums(&self, amount: UD128) -> Result<u64, QuantumError> {
        let rescaled = amount.rescale(self.decimals as i16);
        if rescaled != amount {
            return Err(QuantumError::PrecisionLoss {
                amount: amount.to_string(),
                decimals: self.decimals as u8,
            });
        }
        let digits = rescaled.digits().to_radix_le(256);
        if digits.len() > size_of::<u64>() {
            return Err(QuantumError::Overflow(amount.to_string()));
        }
        let mut raw = [0u8; size_of::<u64>()];
        raw[..digits.len()].copy_from_slice(&digits);
        Ok(u64::from_le_bytes(raw))
    }

    /// Convert quantum units back to a decimal amount.
    pub fn from_quantums(&self, quantums: u64) -> UD128 {
        let unscaled = bint::UInt::<2>::from_le_slice(&quantums.to_le_bytes())
            .expect("Quantizer: u64 -> UInt::<2>");
        UnsignedDecimal::<2>::from_parts(
            unscaled,
            -self.decimals,
            Context::default().with_rounding_mode(RoundingMode::Floor),
        )
    }
}

#[cfg(test)]
mod tests {
    use fastnum::udec128;

    use super::*;

    #[test]
    fn test_to_quantums_exact() {
        assert_eq!(Quantizer::new(6).to_quantums(udec128!(1.23)), Ok(1_230_000));
        assert_eq!(Quantizer::new(6).to_quantums(udec128!(1)), Ok(1_000_000));
        assert_eq!(
            Quantizer::new(0).to_quantums(udec128!(1234567890)),
            Ok(1_234_567_890)
        );
        assert_eq!(Quantizer::new(6).to_quantums(udec128!(0.000001)), Ok(1));
    }

    #[test]
    fn test_to_quantums_precision_loss() {
        assert_eq!(
            Quantizer::new(6).to_quantums(udec128!(1.2345678)),
            Err(QuantumError::PrecisionLoss {
                amount: "1.2345678".to_string(),
                decimals: 6,
            })
        );
        assert!(matches!(
            Quantizer::new(0).to_quantums(udec128!(0.5)),
            Err(QuantumError::PrecisionLoss { .. })
        ));
    }

    #[test]
    fn test_to_quantums_overflow() {
        // 10^14 * 10^6 = 10^20 > u64::MAX
        assert!(matches!(
            Quantizer::new(6).to_quantums(udec128!(100000000000000)),
            Err(QuantumError::Overflow(_))
        ));
    }

    #[test]
    fn test_from_quantums() {
        assert_eq!(Quantizer::new(6).from_quantums(1_230_000), udec128!(1.23));
        assert_eq!(Quantizer::new(0).from_quantums(42), udec128!(42));
        assert_eq!(
            Quantizer::new(6).from_quantums(u64::MAX),
            udec128!(18446744073709.551615)
        );
    }

    #[test]
    fn test_round_trip() {
        let quantizer = Quantizer::new(6);
        for amount in [udec128!(0.000001), udec128!(1.5), udec128!(1000000)] {
            let quantums = quantizer.to_quantums(amount).unwrap();
            assert_eq!(quantizer.from_quantums(quantums), amount);
        }
    }
}
