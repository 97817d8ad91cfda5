//! This module computes the food range the city optimiser must reach.
//!
//! The range depends on how the city should grow, see [`GrowthType`]. When the caller doesn't know,
//! the growth type is derived from the city's happiness with [`derive_growth_type`].

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    city_data::CityData,
    output::FIXED_POINT_SCALE,
    settings::OptimiserSettings,
};

/// How the city should grow during the next turns.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Debug)]
pub enum GrowthType {
    /// Shrink as fast as the plots allow.
    MajorStarve,
    /// Shrink, but keep as much food as possible.
    MinorStarve,
    /// Neither grow nor shrink.
    FlatGrowth,
    /// Grow, with a small bias toward food.
    MinorGrowth,
    /// Grow as fast as the plots allow.
    MajorGrowth,
    /// Derive the growth type from the city's happiness.
    NotSet,
}

/// An interval over the city's total food, scaled by 100. `None` means the side is unbounded.
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
pub struct TargetYield {
    pub lower: Option<i32>,
    pub upper: Option<i32>,
}

impl TargetYield {
    pub const fn unbounded() -> Self {
        Self {
            lower: None,
            upper: None,
        }
    }

    pub const fn at_least(food: i32) -> Self {
        Self {
            lower: Some(food),
            upper: None,
        }
    }

    pub const fn at_most(food: i32) -> Self {
        Self {
            lower: None,
            upper: Some(food),
        }
    }

    pub const fn exact(food: i32) -> Self {
        Self {
            lower: Some(food),
            upper: Some(food),
        }
    }

    /// Returns `true` if `food` is below the lower bound.
    pub fn value_below(&self, food: i32) -> bool {
        self.lower.is_some_and(|lower| food < lower)
    }

    /// Returns `true` if `food` is above the upper bound.
    pub fn value_above(&self, food: i32) -> bool {
        self.upper.is_some_and(|upper| food > upper)
    }

    pub fn contains(&self, food: i32) -> bool {
        !self.value_below(food) && !self.value_above(food)
    }

    /// Returns how much `food` is above the upper bound, `0` if it is not.
    pub fn excess(&self, food: i32) -> i32 {
        self.upper.map_or(0, |upper| (food - upper).max(0))
    }
}

/// Derives the growth type from the city's happiness.
///
/// - More angry than happy citizens: growing would only add another angry citizen, so the city stays flat.
/// - Exactly one more happy than angry citizen: the city can afford one more citizen.
/// - Otherwise the city grows as fast as it can.
///
/// Starving is never derived, only a caller can ask for it.
pub fn derive_growth_type(city: &CityData) -> GrowthType {
    if city.angry_population >= city.happy_population {
        GrowthType::FlatGrowth
    } else if city.angry_population + 1 == city.happy_population {
        GrowthType::MinorGrowth
    } else {
        GrowthType::MajorGrowth
    }
}

/// Computes the food range the city must reach.
///
/// # Arguments
///
/// - `city`: the city to optimise.
/// - `growth_type`: how the city should grow. [`GrowthType::NotSet`] is derived with [`derive_growth_type`].
/// - `max_attainable_food`: the most food the city can produce, see [`crate::city_optimiser::CityOptimiser::max_food`].
/// - `settings`: provides the growth divisors.
///
/// # Growth bias
///
/// When the city wants to grow and can produce more food than it needs, the required food is raised by
/// `excess / divisor` whole food units, rounded up and at least 1 unit.
/// Otherwise the optimiser would happily stop at a surplus of `0.01` food.
pub fn calc_target_yield_surplus(
    city: &CityData,
    growth_type: GrowthType,
    max_attainable_food: i32,
    settings: &OptimiserSettings,
) -> TargetYield {
    let mut required_yield = city.required_food();

    let growth_type = match growth_type {
        GrowthType::NotSet => derive_growth_type(city),
        growth_type => growth_type,
    };

    let growth_divisor = match growth_type {
        GrowthType::MajorGrowth => Some(settings.major_growth_divisor),
        GrowthType::MinorGrowth => Some(settings.minor_growth_divisor),
        _ => None,
    };

    if let Some(divisor) = growth_divisor {
        let excess = max_attainable_food - required_yield;
        if excess > 0 {
            let bump_units = ((excess + divisor - 1) / divisor).max(1);
            required_yield += bump_units * FIXED_POINT_SCALE;
        }
    }

    let target = match growth_type {
        GrowthType::MajorStarve | GrowthType::MinorStarve => TargetYield::at_most(required_yield),
        // `NotSet` has been derived above, it can't reach here.
        GrowthType::FlatGrowth | GrowthType::NotSet => TargetYield::exact(required_yield),
        GrowthType::MinorGrowth | GrowthType::MajorGrowth => TargetYield::at_least(required_yield),
    };

    debug!(
        target: "governor.target",
        ?growth_type,
        required_yield,
        max_attainable_food,
        "Target yield calculated"
    );

    target
}
