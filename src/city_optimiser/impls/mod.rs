//! The passes of [`super::CityOptimiser`]. Each file adds one pass to the optimiser.

mod assign_initial_plots;
mod correct_rounding;
mod fix_food_deficit;
mod fix_food_excess;
mod handle_free_specialist_slots;
mod juggle_plots;
mod round_robin;
