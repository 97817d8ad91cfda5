//! This module defines the [`CityOptimiser`], which decides which plots and specialist slots a city's citizens work.
//!
//! An optimisation call runs these passes in order:
//! 1. Reclaim the specialist slots excluded by the previous call, and clear every worked flag.
//! 2. Fill the free specialist slots, see [`CityOptimiser::handle_free_specialist_slots`].
//! 3. Work the best items according to a [`FoodAwareOrder`].
//! 4. Swap items one by one until the food is inside the [`TargetYield`], see the [`impls`] module.
//! 5. Juggle pairs of items to gain value without losing food.
//! 6. Give the lowest ranked worked item one last chance to be replaced.
//!
//! Every swap requires a strict improvement and every loop is bounded by the number of items,
//! so an optimisation always terminates.

use std::cmp::{Ordering, Reverse};

use tracing::debug;

use crate::{
    city_data::{CityData, Partition, PlotData, PlotHandle, SpecialistType},
    output::{
        FIXED_POINT_SCALE, FoodAwareOrder, FoodDirection, OutputType, OutputVector, TotalOutput,
        ValueFunctor,
    },
    settings::OptimiserSettings,
    target_yield::{GrowthType, TargetYield, calc_target_yield_surplus},
};

mod impls;

#[cfg(test)]
mod tests;

/// The result of an optimisation.
///
/// A failure is not fatal. The assignment is still the best the optimiser found,
/// e.g. a city which can't feed itself starves for a while.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum OptimiseStatus {
    Ok,
    /// The city produces less food than the target's lower bound.
    FailedInsufficientFood,
    /// The city produces more food than the target's upper bound.
    FailedExcessFood,
}

/// A swap made during one optimisation call.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct SwapRecord {
    pub now_worked: PlotHandle,
    pub now_unworked: PlotHandle,
}

/// Assigns a city's citizens to its plots and specialist slots.
///
/// The optimiser borrows the city mutably, so only one optimisation can run on a city at a time.
/// It only writes the worked flags of the city's items, and moves specialist slots between
/// [`Partition::Workable`] and [`Partition::Unworkable`].
pub struct CityOptimiser<'a> {
    city: &'a mut CityData,
    settings: &'a OptimiserSettings,
}

impl<'a> CityOptimiser<'a> {
    pub fn new(city: &'a mut CityData, settings: &'a OptimiserSettings) -> Self {
        Self { city, settings }
    }

    pub fn city(&self) -> &CityData {
        &*self.city
    }

    /// Optimises the city to maximise `value_functor` while keeping the food inside `target`.
    pub fn optimise(
        &mut self,
        value_functor: &ValueFunctor<TotalOutput>,
        target: TargetYield,
    ) -> OptimiseStatus {
        self.handle_free_specialist_slots(value_functor);

        if self.is_degenerate() {
            self.work_all_workable();
            debug!(
                target: "governor.optimiser",
                workable = self.workable_count(),
                working_population = self.city.working_population,
                "Nothing to optimise, working every plot"
            );
            return OptimiseStatus::Ok;
        }

        let order = FoodAwareOrder::new(
            value_functor,
            self.city.food_per_population,
            FoodDirection::MostFood,
        );
        self.assign_initial_plots(&order);

        let mut swaps = Vec::new();
        if target.value_below(self.city.current_food()) {
            self.fix_food_deficit(&order, target, &mut swaps);
        }
        if target.value_above(self.city.current_food()) {
            self.fix_food_excess(value_functor, target, &mut swaps);
        }

        self.juggle_plots(value_functor, target, &mut swaps);
        if let Some(swap) = self.correct_rounding(&order, target) {
            swaps.push(swap);
        }

        let status = self.status_for(target);
        debug!(
            target: "governor.optimiser",
            ?status,
            food = self.city.current_food(),
            lower = ?target.lower,
            upper = ?target.upper,
            swaps = swaps.len(),
            "City optimised"
        );
        status
    }

    /// Optimises the city with a food target derived from `growth_type`.
    pub fn optimise_for_growth(
        &mut self,
        value_functor: &ValueFunctor<TotalOutput>,
        growth_type: GrowthType,
    ) -> OptimiseStatus {
        let target = self.target_for_growth(growth_type);
        self.optimise(value_functor, target)
    }

    /// Optimises the city to produce as much of `output_type` as possible.
    pub fn optimise_for_output(
        &mut self,
        output_type: OutputType,
        growth_type: GrowthType,
    ) -> OptimiseStatus {
        let value_functor =
            ValueFunctor::emphasising(output_type, self.settings.default_weights);
        self.optimise_for_growth(&value_functor, growth_type)
    }

    /// Optimises the city in favour of what `specialist_type` produces.
    ///
    /// The specialist's output is added to the default weights, so plots and slots which produce the same
    /// outputs as the specialist rank higher. An unknown specialist type leaves the default weights unchanged.
    pub fn optimise_for_specialist(
        &mut self,
        specialist_type: SpecialistType,
        growth_type: GrowthType,
    ) -> OptimiseStatus {
        let mut weights = self.settings.default_weights;
        if let Some(&specialist_output) = self
            .city
            .specialist_helper
            .specialist_output(specialist_type)
        {
            for (output_type, value) in specialist_output.components() {
                // Convert the fixed-point output back to whole units, so it is on the same scale as the weights.
                weights[output_type] += value / FIXED_POINT_SCALE;
            }
        }
        self.optimise_for_growth(&ValueFunctor::weighted(weights), growth_type)
    }

    /// Optimises the city while it builds a unit which needs `extra_food` food per turn on top of what the citizens eat.
    pub fn optimise_for_unit_food(
        &mut self,
        value_functor: &ValueFunctor<TotalOutput>,
        extra_food: i32,
    ) -> OptimiseStatus {
        let target = TargetYield::at_least(self.city.required_food() + extra_food);
        self.optimise(value_functor, target)
    }

    /// Returns the most food the city could produce, without changing the current assignment.
    ///
    /// It is the food of the city plot, plus the food of the free specialist slots with the most food,
    /// plus the food of the `working_population` items with the most food. Each claimed free specialist
    /// leaves out one slot of the same specialist type, as [`CityOptimiser::handle_free_specialist_slots`] does.
    pub fn max_food(&self) -> i32 {
        let inventory = &self.city.inventory;

        let mut free_specialists: Vec<&PlotData> = inventory
            .iter()
            .filter(|&(_, partition, _)| partition == Partition::FreeSpecialist)
            .map(|(_, _, plot)| plot)
            .collect();
        free_specialists.sort_by_key(|plot| Reverse(plot.actual_output.food()));
        free_specialists.truncate(
            self.city
                .specialist_helper
                .total_free_specialist_slot_count(),
        );

        let mut candidates: Vec<&PlotData> = inventory
            .iter()
            .filter(|&(_, partition, _)| partition != Partition::FreeSpecialist)
            .map(|(_, _, plot)| plot)
            .collect();
        for specialist_type in free_specialists
            .iter()
            .filter_map(|plot| plot.specialist_type())
        {
            if let Some(index) = candidates
                .iter()
                .position(|plot| plot.specialist_type() == Some(specialist_type))
            {
                candidates.remove(index);
            }
        }

        let mut foods: Vec<i32> = candidates
            .iter()
            .map(|plot| plot.actual_output.food())
            .collect();
        foods.sort_unstable_by(|a, b| b.cmp(a));
        let plot_food: i32 = foods.into_iter().take(self.working_population()).sum();

        let free_specialist_food: i32 = free_specialists
            .iter()
            .map(|plot| plot.actual_output.food())
            .sum();

        self.city.city_plot_output.food() + free_specialist_food + plot_food
    }

    /// Computes the food target for `growth_type`, see [`calc_target_yield_surplus`].
    pub fn target_for_growth(&self, growth_type: GrowthType) -> TargetYield {
        calc_target_yield_surplus(&*self.city, growth_type, self.max_food(), self.settings)
    }

    fn working_population(&self) -> usize {
        self.city.working_population.max(0) as usize
    }

    fn workable_count(&self) -> usize {
        self.city.inventory.count(Partition::Workable)
    }

    /// Returns `true` if there is nothing to choose: every workable item will be worked anyway.
    fn is_degenerate(&self) -> bool {
        let workable_count = self.workable_count();
        workable_count < 2 || self.working_population() >= workable_count
    }

    fn work_all_workable(&mut self) {
        let handles: Vec<PlotHandle> = self.city.inventory.handles(Partition::Workable).collect();
        for handle in handles {
            self.city.inventory.set_worked(handle, true);
        }
    }

    /// Returns the workable items sorted best-first by `compare`.
    ///
    /// `compare` returns [`Ordering::Greater`] when its first argument is better.
    /// The sort is stable, so equal items keep their inventory order.
    fn rank_workable(&self, compare: impl Fn(&PlotData, &PlotData) -> Ordering) -> Vec<PlotHandle> {
        let inventory = &self.city.inventory;
        let mut ranked: Vec<PlotHandle> = inventory.handles(Partition::Workable).collect();
        ranked.sort_by(|&a, &b| compare(inventory.get(b), inventory.get(a)));
        ranked
    }

    /// Returns the workable items sorted best-first by a food aware order.
    fn rank_by_food(&self, order: &FoodAwareOrder<TotalOutput>) -> Vec<PlotHandle> {
        self.rank_workable(|a, b| order.compare(&a.output, &b.output))
    }

    fn is_worked(&self, handle: PlotHandle) -> bool {
        self.city.inventory.get(handle).is_worked()
    }

    fn actual_food(&self, handle: PlotHandle) -> i32 {
        self.city.inventory.get(handle).actual_output.food()
    }

    fn apply_swap(&mut self, swap: SwapRecord) {
        self.city.inventory.set_worked(swap.now_unworked, false);
        self.city.inventory.set_worked(swap.now_worked, true);
    }

    fn status_for(&self, target: TargetYield) -> OptimiseStatus {
        let food = self.city.current_food();
        if target.value_below(food) {
            OptimiseStatus::FailedInsufficientFood
        } else if target.value_above(food) {
            OptimiseStatus::FailedExcessFood
        } else {
            OptimiseStatus::Ok
        }
    }
}
