//! Color labels and the reference centroid table

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Number of color labels
pub const LABEL_COUNT: usize = 4;

/// Output color labels
///
/// Declaration order is the centroid iteration order and decides ties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ColorLabel {
    Red,
    Green,
    Blue,
    Yellow,
}

impl ColorLabel {
    /// All labels in tie-break order
    pub const ALL: [ColorLabel; LABEL_COUNT] = [
        ColorLabel::Red,
        ColorLabel::Green,
        ColorLabel::Blue,
        ColorLabel::Yellow,
    ];

    /// Position in [`ColorLabel::ALL`]
    pub const fn index(self) -> usize {
        match self {
            ColorLabel::Red => 0,
            ColorLabel::Green => 1,
            ColorLabel::Blue => 2,
            ColorLabel::Yellow => 3,
        }
    }

    /// Single-letter code used in the readings log and config keys
    pub const fn as_char(self) -> char {
        match self {
            ColorLabel::Red => 'R',
            ColorLabel::Green => 'G',
            ColorLabel::Blue => 'B',
            ColorLabel::Yellow => 'Y',
        }
    }

    /// Parse a single-letter code (case-insensitive)
    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'R' => Some(ColorLabel::Red),
            'G' => Some(ColorLabel::Green),
            'B' => Some(ColorLabel::Blue),
            'Y' => Some(ColorLabel::Yellow),
            _ => None,
        }
    }

    /// Parse a letter code or a full color name
    pub fn parse(s: &str) -> Option<Self> {
        let mut chars = s.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            return Self::from_char(c);
        }

        Self::ALL
            .into_iter()
            .find(|label| s.eq_ignore_ascii_case(label.name()))
    }

    /// Lowercase color name
    pub const fn name(self) -> &'static str {
        match self {
            ColorLabel::Red => "red",
            ColorLabel::Green => "green",
            ColorLabel::Blue => "blue",
            ColorLabel::Yellow => "yellow",
        }
    }
}

/// Reference vector for one label
///
/// Vectors are not normalized; the rig tables are hand-tuned as-is.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ColorCentroid {
    pub label: ColorLabel,
    pub vector: [f32; 3],
}

/// Centroid table with one entry per label in fixed R, G, B, Y order
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CentroidTable {
    vectors: [[f32; 3]; LABEL_COUNT],
}

impl Default for CentroidTable {
    fn default() -> Self {
        Self::new([
            [1.0, 0.1, 0.1],
            [0.1, 1.0, 0.1],
            [0.3, 0.6, 0.7],
            [0.8, 0.6, 0.0],
        ])
    }
}

impl CentroidTable {
    /// Build a table from vectors in R, G, B, Y order
    pub const fn new(vectors: [[f32; 3]; LABEL_COUNT]) -> Self {
        Self { vectors }
    }

    /// Reference vector for a label
    pub fn vector(&self, label: ColorLabel) -> [f32; 3] {
        self.vectors[label.index()]
    }

    /// Replace the reference vector for a label
    pub fn set(&mut self, label: ColorLabel, vector: [f32; 3]) {
        self.vectors[label.index()] = vector;
    }

    /// Iterate centroids in tie-break order
    pub fn iter(&self) -> impl Iterator<Item = ColorCentroid> + '_ {
        ColorLabel::ALL.into_iter().map(move |label| ColorCentroid {
            label,
            vector: self.vector(label),
        })
    }
}
