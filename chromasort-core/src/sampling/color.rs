//! Normalized color vector

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The aggregate had zero magnitude and cannot be normalized
///
/// Either every sample in the batch was a sensor fault or every valid sample
/// read pure black. A triple with a NaN or infinite component has no
/// direction either and is rejected the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ZeroMagnitude;

/// Unit-length RGB vector
///
/// Only constructible through [`NormalizedColor::from_sum`], so the
/// Euclidean norm is always 1 (within float rounding).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct NormalizedColor {
    r: f32,
    g: f32,
    b: f32,
}

impl NormalizedColor {
    /// Normalize a summed (or single) RGB triple
    ///
    /// Fails with [`ZeroMagnitude`] when the norm is exactly zero or a
    /// component is not finite.
    pub fn from_sum(sum: [f32; 3]) -> Result<Self, ZeroMagnitude> {
        if sum.iter().any(|c| !c.is_finite()) {
            return Err(ZeroMagnitude);
        }

        // Scale by the largest component first so squaring cannot overflow
        let largest = sum.iter().fold(0.0f32, |max, c| max.max(c.abs()));
        if largest == 0.0 {
            return Err(ZeroMagnitude);
        }
        let [r, g, b] = sum.map(|c| c / largest);
        let norm = libm::sqrtf(r * r + g * g + b * b);

        Ok(Self {
            r: r / norm,
            g: g / norm,
            b: b / norm,
        })
    }

    /// Red component
    pub fn r(&self) -> f32 {
        self.r
    }

    /// Green component
    pub fn g(&self) -> f32 {
        self.g
    }

    /// Blue component
    pub fn b(&self) -> f32 {
        self.b
    }

    /// Components in R, G, B order
    pub fn components(&self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }

    /// Euclidean norm (1 up to rounding)
    pub fn magnitude(&self) -> f32 {
        libm::sqrtf(self.r * self.r + self.g * self.g + self.b * self.b)
    }
}

// Deserializing must re-normalize so the unit-norm invariant holds
#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for NormalizedColor {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let sum = <[f32; 3]>::deserialize(deserializer)?;
        Self::from_sum(sum).map_err(|_| serde::de::Error::custom("color has no finite direction"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_pythagorean() {
        let color = NormalizedColor::from_sum([3.0, 4.0, 0.0]).unwrap();
        assert_eq!(color.components(), [0.6, 0.8, 0.0]);
    }

    #[test]
    fn test_zero_magnitude() {
        assert_eq!(NormalizedColor::from_sum([0.0, 0.0, 0.0]), Err(ZeroMagnitude));
    }

    #[test]
    fn test_large_components_stay_unit() {
        let color = NormalizedColor::from_sum([f32::MAX, 1.0, 0.0]).unwrap();
        assert!((color.magnitude() - 1.0).abs() < 1e-6);
        assert_eq!(color.r(), 1.0);

        let color = NormalizedColor::from_sum([f32::MAX, f32::MAX, f32::MAX]).unwrap();
        assert!((color.magnitude() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_non_finite_rejected() {
        assert_eq!(
            NormalizedColor::from_sum([f32::NAN, 1.0, 0.0]),
            Err(ZeroMagnitude)
        );
        assert_eq!(
            NormalizedColor::from_sum([1.0, f32::INFINITY, 0.0]),
            Err(ZeroMagnitude)
        );
        assert_eq!(
            NormalizedColor::from_sum([0.0, 0.0, f32::NEG_INFINITY]),
            Err(ZeroMagnitude)
        );
    }

    #[test]
    fn test_brightness_invariant() {
        let dim = NormalizedColor::from_sum([10.0, 20.0, 30.0]).unwrap();
        let bright = NormalizedColor::from_sum([100.0, 200.0, 300.0]).unwrap();
        for (a, b) in dim.components().iter().zip(bright.components().iter()) {
            assert!((a - b).abs() < 1e-6);
        }
    }
}
