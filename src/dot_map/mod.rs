//! This module defines the [`DotMap`], the candidate improvements of a city site which has not been founded yet.
//!
//! When the AI evaluates where to found a city, it can't run the [`crate::city_optimiser::CityOptimiser`]:
//! the city has no citizens and its tiles have no improvements yet. Instead, every tile around the site lists
//! the improvements it could get, and the [`DotMapOptimiser`] chooses one per tile with the same value functors.

use bitflags::bitflags;

use crate::{
    grid::OffsetCoordinate,
    output::{OutputVector, PlotYield, ValueFunctor},
    settings::OptimiserSettings,
};

mod optimiser;

pub use optimiser::DotMapOptimiser;

/// Index of an improvement in the game's improvement table, e.g. farm, mine, cottage.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct ImprovementType(pub usize);

/// One improvement a tile could get, with the yield the tile would have.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ImprovementOption {
    pub plot_yield: PlotYield,
    pub improvement: ImprovementType,
    /// `true` if this improvement makes a bonus resource already visible on the tile usable, e.g. a pasture on cows.
    pub enables_bonus_resource: bool,
}

impl ImprovementOption {
    pub fn new(plot_yield: PlotYield, improvement: ImprovementType) -> Self {
        Self {
            plot_yield,
            improvement,
            enables_bonus_resource: false,
        }
    }

    pub fn enabling_bonus_resource(mut self) -> Self {
        self.enables_bonus_resource = true;
        self
    }
}

bitflags! {
    /// The state of a [`DotMapPlot`] after an optimisation.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct DotMapPlotFlags: u8 {
        /// The tile is worked by one of the available citizens.
        const Selected = 0b00000001;
        /// The chosen improvement has been changed by a correction pass, so the pass won't change it again.
        const ImprovementChanged = 0b00000010;
    }
}

/// A tile around a candidate city site.
#[derive(Clone, PartialEq, Debug)]
pub struct DotMapPlot {
    pub coords: OffsetCoordinate,
    /// The improvements the tile could get, in the host game's order.
    pub options: Vec<ImprovementOption>,
    /// Index in `options` of the chosen improvement, `None` when the tile has no option.
    pub worked_improvement: Option<usize>,
    pub flags: DotMapPlotFlags,
}

impl DotMapPlot {
    pub fn new(coords: OffsetCoordinate, options: Vec<ImprovementOption>) -> Self {
        Self {
            coords,
            options,
            worked_improvement: None,
            flags: DotMapPlotFlags::empty(),
        }
    }

    /// Returns the yield of the chosen improvement, zero when there is none.
    pub fn current_yield(&self) -> PlotYield {
        self.current_option()
            .map_or_else(PlotYield::default, |option| option.plot_yield)
    }

    pub fn current_option(&self) -> Option<&ImprovementOption> {
        self.worked_improvement.map(|index| &self.options[index])
    }

    /// Returns the index of the first option which makes a visible bonus resource usable.
    pub fn bonus_option(&self) -> Option<usize> {
        self.options
            .iter()
            .position(|option| option.enables_bonus_resource)
    }

    pub fn enables_bonus_resource(&self) -> bool {
        self.bonus_option().is_some()
    }

    /// Returns `true` if a correction pass may change the chosen improvement:
    /// the tile has a real choice and is not locked to its bonus improvement.
    pub fn is_adjustable(&self) -> bool {
        self.options.len() >= 2 && !self.enables_bonus_resource()
    }

    pub fn is_selected(&self) -> bool {
        self.flags.contains(DotMapPlotFlags::Selected)
    }

    /// Returns the index of the best option according to `functor`. Ties keep the first option.
    pub fn best_option(&self, functor: &ValueFunctor<PlotYield>) -> Option<usize> {
        self.options
            .iter()
            .enumerate()
            .fold(None, |best: Option<(usize, PlotYield)>, (index, option)| match best {
                Some((_, best_yield)) if !functor.is_better(&option.plot_yield, &best_yield) => best,
                _ => Some((index, option.plot_yield)),
            })
            .map(|(index, _)| index)
    }
}

/// The candidate improvements of a city site.
#[derive(Clone, PartialEq, Debug)]
pub struct DotMap {
    pub city_coords: OffsetCoordinate,
    /// The population the site is evaluated for.
    pub population: i32,
    /// The food one citizen eats each turn, scaled by 100.
    pub food_per_population: i32,
    /// The yield of the city plot, which is always worked.
    pub city_plot_yield: PlotYield,
    pub plots: Vec<DotMapPlot>,
}

impl DotMap {
    pub fn new(city_coords: OffsetCoordinate, population: i32, settings: &OptimiserSettings) -> Self {
        Self {
            city_coords,
            population,
            food_per_population: settings.food_per_population,
            city_plot_yield: PlotYield::default(),
            plots: Vec::new(),
        }
    }

    pub fn push_plot(&mut self, plot: DotMapPlot) {
        self.plots.push(plot);
    }

    /// Returns the food the site's population eats each turn.
    pub fn target_food(&self) -> i32 {
        self.population * self.food_per_population
    }

    /// Returns the yield of the city plot plus the chosen improvement of every tile.
    pub fn total_yield(&self) -> PlotYield {
        self.city_plot_yield
            + self
                .plots
                .iter()
                .map(DotMapPlot::current_yield)
                .sum::<PlotYield>()
    }

    /// Returns the yield of the city plot plus the chosen improvement of every selected tile.
    pub fn selected_yield(&self) -> PlotYield {
        self.city_plot_yield
            + self
                .selected_plots()
                .map(DotMapPlot::current_yield)
                .sum::<PlotYield>()
    }

    #[must_use = "iterators are lazy and do nothing unless consumed"]
    pub fn selected_plots(&self) -> impl Iterator<Item = &DotMapPlot> + '_ {
        self.plots.iter().filter(|plot| plot.is_selected())
    }

    /// Returns the food of the selected tiles minus what the population eats.
    pub fn selected_food_surplus(&self) -> i32 {
        self.selected_yield().food() - self.target_food()
    }
}
