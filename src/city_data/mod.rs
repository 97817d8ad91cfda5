//! This module defines [`CityData`], the per-city state the governor reads and writes.
//!
//! The host game fills a [`CityData`] from its own city: population, happiness, the output of the city plot,
//! and one [`PlotData`] per workable tile and specialist slot. The governor then only toggles
//! the worked flag of those items. Everything else stays owned by the host game.

use std::collections::HashMap;

use crate::{
    output::{OutputVector, TotalOutput},
    settings::OptimiserSettings,
};

mod plot_data;
mod plot_inventory;

pub use plot_data::*;
pub use plot_inventory::*;

#[derive(Clone, PartialEq, Debug)]
pub struct CityData {
    pub population: i32,
    /// Citizens who can work a plot or a specialist slot. It is usually equal to population,
    /// minus the citizens who refuse to work.
    pub working_population: i32,
    pub happy_population: i32,
    pub angry_population: i32,
    /// The food one citizen eats each turn, scaled by 100.
    pub food_per_population: i32,
    /// Food lost each turn, e.g. to unhealthiness, scaled by 100.
    pub lost_food: i32,
    /// The output of the city plot, which is always worked for free.
    pub city_plot_output: TotalOutput,
    pub inventory: PlotInventory,
    pub specialist_helper: SpecialistHelper,
}

impl CityData {
    /// Creates a city with `population` working citizens and an empty inventory.
    pub fn new(population: i32, settings: &OptimiserSettings) -> Self {
        Self {
            population,
            working_population: population,
            happy_population: 0,
            angry_population: 0,
            food_per_population: settings.food_per_population,
            lost_food: 0,
            city_plot_output: TotalOutput::default(),
            inventory: PlotInventory::new(),
            specialist_helper: SpecialistHelper::default(),
        }
    }

    /// Returns the output of the city plot plus the actual output of every worked item.
    pub fn current_output(&self) -> TotalOutput {
        self.city_plot_output
            + self
                .inventory
                .worked()
                .map(|plot| plot.actual_output)
                .sum::<TotalOutput>()
    }

    /// Returns the food the city produces with its current assignment, before consumption.
    pub fn current_food(&self) -> i32 {
        self.current_output().food()
    }

    /// Returns the food the city needs each turn to neither grow nor starve.
    pub fn required_food(&self) -> i32 {
        self.population * self.food_per_population + self.lost_food
    }

    /// Returns the food surplus per turn with the current assignment. Negative means starving.
    pub fn food_surplus(&self) -> i32 {
        self.current_food() - self.required_food()
    }

    /// Returns the number of worked items, the city plot excluded.
    pub fn worked_count(&self) -> usize {
        self.inventory.worked().count()
    }
}

/// Specialist information of a city.
#[derive(Clone, Default, PartialEq, Debug)]
pub struct SpecialistHelper {
    /// Specialists the city gets without spending a citizen, e.g. from buildings or civics.
    pub free_specialist_slot_count: usize,
    /// The output of one specialist of each type, after the city's modifiers.
    pub specialist_outputs: HashMap<SpecialistType, TotalOutput>,
}

impl SpecialistHelper {
    pub fn total_free_specialist_slot_count(&self) -> usize {
        self.free_specialist_slot_count
    }

    pub fn specialist_output(&self, specialist_type: SpecialistType) -> Option<&TotalOutput> {
        self.specialist_outputs.get(&specialist_type)
    }
}
