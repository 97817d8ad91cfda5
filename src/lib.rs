pub mod city_data;
pub mod city_optimiser;
pub mod dot_map;
pub mod grid;
pub mod output;
pub mod settings;
pub mod target_yield;

pub use city_data::CityData;
pub use city_optimiser::{CityOptimiser, OptimiseStatus};
pub use dot_map::{DotMap, DotMapOptimiser};
pub use grid::*;
pub use settings::OptimiserSettings;
use target_yield::GrowthType;

/// Optimises a city with the default weights of `settings`, for the growth its happiness allows.
pub fn optimise_city(city: &mut CityData, settings: &OptimiserSettings) -> OptimiseStatus {
    let value_functor = output::ValueFunctor::weighted(settings.default_weights);
    CityOptimiser::new(city, settings).optimise_for_growth(&value_functor, GrowthType::NotSet)
}
