//! This module defines the fixed-point output vectors used by the governor.
//!
//! All values are stored as integers scaled by 100, e.g. `250` means `2.5` food.
//! There are 2 kinds of vectors:
//! 1. [`PlotYield`], the raw yield of a plot: food, production and commerce.
//! 2. [`TotalOutput`], the city-level output: food, production, gold, research, culture and espionage.
//!
//! Both implement [`OutputVector`], so the ordering functors in [`value_functor`] work with either of them.

use std::{
    fmt,
    ops::{Add, AddAssign, Index, IndexMut, Neg, Sub, SubAssign},
};

use enum_map::{Enum, EnumMap, enum_map};
use serde::{Deserialize, Serialize};

pub mod value_functor;

pub use value_functor::*;

/// The scale of every fixed-point value in this crate.
pub const FIXED_POINT_SCALE: i32 = 100;

/// The dimensions of a [`PlotYield`].
#[derive(Enum, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize, Debug)]
pub enum YieldType {
    Food,
    Production,
    Commerce,
}

/// The dimensions of a [`TotalOutput`].
#[derive(Enum, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize, Debug)]
pub enum OutputType {
    Food,
    Production,
    Gold,
    Research,
    Culture,
    Espionage,
}

impl OutputType {
    /// The commerce outputs, i.e. every output a plot's commerce yield can be converted into.
    pub const COMMERCE_TYPES: [OutputType; 4] = [
        OutputType::Gold,
        OutputType::Research,
        OutputType::Culture,
        OutputType::Espionage,
    ];
}

/// Common behaviour of [`PlotYield`] and [`TotalOutput`].
pub trait OutputVector:
    Copy
    + Default
    + PartialEq
    + fmt::Debug
    + Add<Output = Self>
    + Sub<Output = Self>
    + AddAssign
    + SubAssign
{
    /// The enum indexing the dimensions of the vector.
    type Kind: Enum + Copy + PartialEq + fmt::Debug;

    /// The dimension holding food, which the governor treats specially.
    const FOOD: Self::Kind;

    /// Iterates over `(dimension, value)` pairs in declaration order.
    fn components(&self) -> impl Iterator<Item = (Self::Kind, i32)> + '_;

    fn get(&self, kind: Self::Kind) -> i32;

    fn set(&mut self, kind: Self::Kind, value: i32);

    /// Returns the food component.
    fn food(&self) -> i32 {
        self.get(Self::FOOD)
    }

    /// Weighted dot product, computed in `i64` so large weights cannot overflow.
    fn dot(&self, weights: &Self) -> i64 {
        self.components()
            .map(|(kind, value)| value as i64 * weights.get(kind) as i64)
            .sum()
    }

    /// Returns `true` if every component of `self` is `>=` the matching component of `other`,
    /// and at least one component is strictly greater.
    fn is_strictly_greater(&self, other: &Self) -> bool {
        let mut any_greater = false;
        for (kind, value) in self.components() {
            let other_value = other.get(kind);
            if value < other_value {
                return false;
            }
            any_greater |= value > other_value;
        }
        any_greater
    }

    /// Drops the sub-unit part of every component, truncating toward zero.
    ///
    /// For example, `250` becomes `200`. The result is still scaled by [`FIXED_POINT_SCALE`].
    fn to_whole_units(&self) -> Self {
        let mut whole = *self;
        for (kind, value) in self.components() {
            whole.set(kind, value / FIXED_POINT_SCALE * FIXED_POINT_SCALE);
        }
        whole
    }
}

/// The raw yield of a plot, scaled by 100.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Debug)]
#[serde(transparent)]
pub struct PlotYield(pub EnumMap<YieldType, i32>);

impl PlotYield {
    /// Creates a plot yield from values already scaled by 100.
    pub fn new(food: i32, production: i32, commerce: i32) -> Self {
        Self(enum_map! {
            YieldType::Food => food,
            YieldType::Production => production,
            YieldType::Commerce => commerce,
        })
    }

    /// Converts the yield into a city-level output.
    ///
    /// Commerce is split into gold, research, culture and espionage according to `commerce_split`,
    /// whose values are percentages. Rounding remainders are dropped, as the game does.
    pub fn to_total_output(&self, commerce_split: &CommerceSplit) -> TotalOutput {
        let mut output = TotalOutput::default();
        output[OutputType::Food] = self[YieldType::Food];
        output[OutputType::Production] = self[YieldType::Production];
        for output_type in OutputType::COMMERCE_TYPES {
            output[output_type] = self[YieldType::Commerce] * commerce_split.0[output_type] / 100;
        }
        output
    }
}

/// The output of a plot or a city, scaled by 100.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Debug)]
#[serde(transparent)]
pub struct TotalOutput(pub EnumMap<OutputType, i32>);

impl TotalOutput {
    /// Creates an output from values already scaled by 100.
    pub fn new(
        food: i32,
        production: i32,
        gold: i32,
        research: i32,
        culture: i32,
        espionage: i32,
    ) -> Self {
        Self(enum_map! {
            OutputType::Food => food,
            OutputType::Production => production,
            OutputType::Gold => gold,
            OutputType::Research => research,
            OutputType::Culture => culture,
            OutputType::Espionage => espionage,
        })
    }
}

/// Percentages used to convert commerce into gold, research, culture and espionage.
///
/// Only the commerce entries are read. They usually add up to 100.
#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Debug)]
#[serde(transparent)]
pub struct CommerceSplit(pub EnumMap<OutputType, i32>);

impl Default for CommerceSplit {
    fn default() -> Self {
        Self(enum_map! {
            OutputType::Gold => 40,
            OutputType::Research => 60,
            _ => 0,
        })
    }
}

impl OutputVector for PlotYield {
    type Kind = YieldType;

    const FOOD: YieldType = YieldType::Food;

    fn components(&self) -> impl Iterator<Item = (YieldType, i32)> + '_ {
        self.0.iter().map(|(kind, &value)| (kind, value))
    }

    fn get(&self, kind: YieldType) -> i32 {
        self.0[kind]
    }

    fn set(&mut self, kind: YieldType, value: i32) {
        self.0[kind] = value;
    }
}

impl OutputVector for TotalOutput {
    type Kind = OutputType;

    const FOOD: OutputType = OutputType::Food;

    fn components(&self) -> impl Iterator<Item = (OutputType, i32)> + '_ {
        self.0.iter().map(|(kind, &value)| (kind, value))
    }

    fn get(&self, kind: OutputType) -> i32 {
        self.0[kind]
    }

    fn set(&mut self, kind: OutputType, value: i32) {
        self.0[kind] = value;
    }
}

// `PlotYield` and `TotalOutput` only differ by their index enum, so the arithmetic is shared.
macro_rules! impl_output_arithmetic {
    ($vector:ident, $kind:ident) => {
        impl Index<$kind> for $vector {
            type Output = i32;

            fn index(&self, kind: $kind) -> &i32 {
                &self.0[kind]
            }
        }

        impl IndexMut<$kind> for $vector {
            fn index_mut(&mut self, kind: $kind) -> &mut i32 {
                &mut self.0[kind]
            }
        }

        impl AddAssign for $vector {
            fn add_assign(&mut self, rhs: Self) {
                for (kind, value) in self.0.iter_mut() {
                    *value += rhs.0[kind];
                }
            }
        }

        impl SubAssign for $vector {
            fn sub_assign(&mut self, rhs: Self) {
                for (kind, value) in self.0.iter_mut() {
                    *value -= rhs.0[kind];
                }
            }
        }

        impl Add for $vector {
            type Output = Self;

            fn add(mut self, rhs: Self) -> Self {
                self += rhs;
                self
            }
        }

        impl Sub for $vector {
            type Output = Self;

            fn sub(mut self, rhs: Self) -> Self {
                self -= rhs;
                self
            }
        }

        impl Neg for $vector {
            type Output = Self;

            fn neg(mut self) -> Self {
                self.0.values_mut().for_each(|value| *value = -*value);
                self
            }
        }

        impl std::iter::Sum for $vector {
            fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
                iter.fold(Self::default(), |total, item| total + item)
            }
        }

        impl fmt::Display for $vector {
            /// Formats the vector in whole units, e.g. `(2.50, 1.00, 0.00)`.
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "(")?;
                for (index, (_, &value)) in self.0.iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    let sign = if value < 0 { "-" } else { "" };
                    let value = value.unsigned_abs();
                    write!(f, "{sign}{}.{:02}", value / 100, value % 100)?;
                }
                write!(f, ")")
            }
        }
    };
}

impl_output_arithmetic!(PlotYield, YieldType);
impl_output_arithmetic!(TotalOutput, OutputType);
