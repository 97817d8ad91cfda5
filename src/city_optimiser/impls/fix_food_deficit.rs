use tracing::debug;

use crate::{
    city_data::PlotHandle,
    city_optimiser::{CityOptimiser, SwapRecord},
    output::{FoodAwareOrder, TotalOutput},
    target_yield::TargetYield,
};

impl CityOptimiser<'_> {
    /// Raises the city's food toward the lower bound of `target` by swapping one item at a time.
    ///
    /// Each swap replaces the lowest ranked worked item which can be improved with the highest ranked unworked item
    /// which produces strictly more food. While `order` ignores food differences below subsistence,
    /// a gain between two items which both stay below subsistence doesn't count.
    /// When no swap is found, the rule is relaxed once and the items are ranked again.
    ///
    /// Each phase makes at most `workable_count - working_population` swaps. Food never decreases.
    pub(in crate::city_optimiser) fn fix_food_deficit(
        &mut self,
        order: &FoodAwareOrder<TotalOutput>,
        target: TargetYield,
        swaps: &mut Vec<SwapRecord>,
    ) {
        let max_swaps = self
            .workable_count()
            .saturating_sub(self.working_population());

        for phase_order in [*order, order.relaxed()] {
            let ranked = self.rank_by_food(&phase_order);
            let mut swap_count = 0;
            while swap_count < max_swaps && target.value_below(self.city.current_food()) {
                let Some(swap) = self.find_food_gain_swap(&ranked, &phase_order) else {
                    break;
                };
                debug!(
                    target: "governor.optimiser",
                    now_worked = swap.now_worked.index(),
                    now_unworked = swap.now_unworked.index(),
                    relaxed = !phase_order.ignore_below_subsistence,
                    "Swapped to fix food deficit"
                );
                self.apply_swap(swap);
                swaps.push(swap);
                swap_count += 1;
            }

            if !target.value_below(self.city.current_food()) {
                return;
            }
        }
    }

    /// Finds the first swap which gains food.
    ///
    /// Worked items are visited from the lowest ranked, unworked items from the highest ranked.
    fn find_food_gain_swap(
        &self,
        ranked: &[PlotHandle],
        order: &FoodAwareOrder<TotalOutput>,
    ) -> Option<SwapRecord> {
        for &worked in ranked.iter().rev().filter(|&&handle| self.is_worked(handle)) {
            let worked_food = self.actual_food(worked);
            let replacement = ranked.iter().copied().find(|&handle| {
                let food = self.actual_food(handle);
                !self.is_worked(handle)
                    && food > worked_food
                    && !order.ignores_food_difference(food, worked_food)
            });
            if let Some(now_worked) = replacement {
                return Some(SwapRecord {
                    now_worked,
                    now_unworked: worked,
                });
            }
        }
        None
    }
}
