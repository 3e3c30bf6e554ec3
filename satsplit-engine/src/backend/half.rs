//! Half-precision wire adapter
//!
//! Some model exports take the attention mask and return logits as IEEE 754
//! binary16. [`HalfPrecisionScorer`] keeps that format at the edge: the
//! kernel sees little-endian f16 bytes, everything above it sees f32.

use super::Scorer;
use crate::{
    cancel::CancelToken,
    error::{BackendError, EngineError, Result},
};

/// Binary16 encoding of 1.0
pub const F16_ONE: u16 = 0x3C00;

/// Widen a binary16 value to f32
pub fn f16_to_f32(bits: u16) -> f32 {
    let sign = u32::from(bits & 0x8000) << 16;
    let exponent = u32::from((bits >> 10) & 0x1F);
    let fraction = u32::from(bits & 0x03FF);

    match exponent {
        0 if fraction == 0 => f32::from_bits(sign),
        // subnormal: fraction * 2^-24
        0 => {
            let magnitude = fraction as f32 * f32::from_bits(0x3380_0000);
            if sign == 0 {
                magnitude
            } else {
                -magnitude
            }
        }
        0x1F if fraction == 0 => f32::from_bits(sign | 0x7F80_0000),
        0x1F => f32::from_bits(sign | 0x7FC0_0000 | (fraction << 13)),
        _ => f32::from_bits(sign | ((exponent + 112) << 23) | (fraction << 13)),
    }
}

/// Narrow an f32 to binary16, rounding to nearest even
pub fn f32_to_f16(value: f32) -> u16 {
    let bits = value.to_bits();
    let sign = ((bits >> 16) & 0x8000) as u16;
    let exponent = ((bits >> 23) & 0xFF) as i32;
    let mantissa = bits & 0x007F_FFFF;

    if exponent == 0xFF {
        let nan_bit = if mantissa != 0 { 0x0200 } else { 0 };
        return sign | 0x7C00 | nan_bit;
    }

    let half_exponent = exponent - 127 + 15;
    if half_exponent >= 0x1F {
        return sign | 0x7C00;
    }

    if half_exponent <= 0 {
        if half_exponent < -10 {
            return sign;
        }
        let full = mantissa | 0x0080_0000;
        let shift = (14 - half_exponent) as u32;
        let halfway = 1u32 << (shift - 1);
        let remainder = full & ((1u32 << shift) - 1);
        let mut out = full >> shift;
        if remainder > halfway || (remainder == halfway && out & 1 == 1) {
            out += 1;
        }
        return sign | out as u16;
    }

    let remainder = mantissa & 0x1FFF;
    let mut out = ((half_exponent as u32) << 10) | (mantissa >> 13);
    if remainder > 0x1000 || (remainder == 0x1000 && out & 1 == 1) {
        // may carry into the exponent, up to infinity
        out += 1;
    }
    sign | out as u16
}

/// Backend kernel speaking binary16
pub trait HalfKernel: Send {
    /// Run the kernel; `mask` holds one little-endian f16 per token and the
    /// result must hold one little-endian f16 logit per token
    fn run(&mut self, ids: &[i64], mask: &[u8]) -> std::result::Result<Vec<u8>, BackendError>;

    /// Release kernel resources
    fn close(&mut self) -> std::result::Result<(), BackendError> {
        Ok(())
    }
}

/// [`Scorer`] over a binary16 kernel
#[derive(Debug)]
pub struct HalfPrecisionScorer<K> {
    kernel: K,
}

impl<K: HalfKernel> HalfPrecisionScorer<K> {
    /// Wrap `kernel`
    pub fn new(kernel: K) -> Self {
        Self { kernel }
    }

    /// The wrapped kernel
    pub fn kernel(&self) -> &K {
        &self.kernel
    }
}

impl<K: HalfKernel> Scorer for HalfPrecisionScorer<K> {
    fn score(&mut self, ids: &[i64], mask: &[i64], cancel: &CancelToken) -> Result<Vec<f32>> {
        cancel.check()?;

        let mask_bytes: Vec<u8> = mask
            .iter()
            .flat_map(|&m| f32_to_f16(m as f32).to_le_bytes())
            .collect();
        let output = self.kernel.run(ids, &mask_bytes)?;

        if output.len() != ids.len() * 2 {
            return Err(EngineError::LogitCountMismatch {
                expected: ids.len(),
                actual: output.len() / 2,
            });
        }

        Ok(output
            .chunks_exact(2)
            .map(|pair| f16_to_f32(u16::from_le_bytes([pair[0], pair[1]])))
            .collect())
    }

    fn close(&mut self) -> Result<()> {
        Ok(self.kernel.close()?)
    }

    fn name(&self) -> &'static str {
        "half-precision"
    }
}
