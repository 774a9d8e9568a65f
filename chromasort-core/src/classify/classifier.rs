//! Nearest-centroid classifier

use super::centroid::{CentroidTable, ColorLabel};
use crate::sampling::NormalizedColor;

/// Winning label and its squared distance
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ClassificationResult {
    pub label: ColorLabel,
    pub distance_sq: f32,
}

/// Maps a normalized color to the closest centroid
///
/// There is no confidence threshold: a label is always produced.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ColorClassifier {
    table: CentroidTable,
}

impl ColorClassifier {
    pub const fn new(table: CentroidTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &CentroidTable {
        &self.table
    }

    /// Classify a normalized color
    pub fn classify(&self, color: &NormalizedColor) -> ClassificationResult {
        self.classify_vector(color.components())
    }

    /// Classify a raw vector
    ///
    /// Ties resolve to the centroid that comes first in R, G, B, Y order.
    pub fn classify_vector(&self, v: [f32; 3]) -> ClassificationResult {
        let mut best = ClassificationResult {
            label: ColorLabel::Red,
            distance_sq: f32::INFINITY,
        };

        for centroid in self.table.iter() {
            let distance_sq = distance_sq(v, centroid.vector);
            // Strict comparison keeps the earlier centroid on ties
            if distance_sq < best.distance_sq {
                best = ClassificationResult {
                    label: centroid.label,
                    distance_sq,
                };
            }
        }

        best
    }
}

fn distance_sq(a: [f32; 3], b: [f32; 3]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_reference_examples() {
        let classifier = ColorClassifier::default();

        assert_eq!(
            classifier.classify_vector([0.95, 0.05, 0.05]).label,
            ColorLabel::Red
        );
        assert_eq!(
            classifier.classify_vector([0.1, 0.95, 0.1]).label,
            ColorLabel::Green
        );

        let blue = classifier.classify_vector([0.3, 0.6, 0.7]);
        assert_eq!(blue.label, ColorLabel::Blue);
        assert_eq!(blue.distance_sq, 0.0);
    }

    #[test]
    fn test_classify_normalized() {
        let classifier = ColorClassifier::default();
        let color = NormalizedColor::from_sum([200.0, 150.0, 0.0]).unwrap();
        assert_eq!(classifier.classify(&color).label, ColorLabel::Yellow);
    }

    #[test]
    fn test_tie_goes_to_earlier_centroid() {
        let classifier = ColorClassifier::new(CentroidTable::new([
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 5.0],
            [0.0, 0.0, 5.0],
        ]));

        let result = classifier.classify_vector([0.5, 0.5, 0.0]);
        assert_eq!(result.label, ColorLabel::Red);
        assert!((result.distance_sq - 0.5).abs() < 1e-6);

        // Identical B and Y centroids resolve to B
        assert_eq!(
            classifier.classify_vector([0.0, 0.0, 4.0]).label,
            ColorLabel::Blue
        );
    }

    fn unit_component() -> impl Strategy<Value = f32> {
        0.0f32..=1.0
    }

    proptest! {
        #[test]
        fn test_classify_deterministic_and_minimal(
            r in unit_component(),
            g in unit_component(),
            b in unit_component(),
        ) {
            let classifier = ColorClassifier::default();
            let v = [r, g, b];

            let first = classifier.classify_vector(v);
            let second = classifier.classify_vector(v);
            prop_assert_eq!(first, second);

            for centroid in classifier.table().iter() {
                prop_assert!(first.distance_sq <= distance_sq(v, centroid.vector));
            }
        }
    }
}
