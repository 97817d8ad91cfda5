use tracing::debug;

use crate::{
    city_data::PlotHandle,
    city_optimiser::{CityOptimiser, SwapRecord},
    output::{FoodAwareOrder, FoodDirection, TotalOutput, ValueFunctor},
    target_yield::TargetYield,
};

impl CityOptimiser<'_> {
    /// Lowers the city's food toward the upper bound of `target` by swapping one item at a time.
    ///
    /// It mirrors [`CityOptimiser::fix_food_deficit`] with an order where less food is better.
    /// A replacement must produce strictly less food than the item it replaces,
    /// but at least `max(0, removed food - current excess)`, so a swap never falls below the upper bound.
    ///
    /// At most `workable_count - working_population` swaps are made. Food never increases.
    pub(in crate::city_optimiser) fn fix_food_excess(
        &mut self,
        value_functor: &ValueFunctor<TotalOutput>,
        target: TargetYield,
        swaps: &mut Vec<SwapRecord>,
    ) {
        let order = FoodAwareOrder::new(
            value_functor,
            self.city.food_per_population,
            FoodDirection::LeastFood,
        );
        let ranked = self.rank_by_food(&order);

        let max_swaps = self
            .workable_count()
            .saturating_sub(self.working_population());

        for _ in 0..max_swaps {
            let excess = target.excess(self.city.current_food());
            if excess == 0 {
                return;
            }
            let Some(swap) = self.find_food_loss_swap(&ranked, excess) else {
                return;
            };
            debug!(
                target: "governor.optimiser",
                now_worked = swap.now_worked.index(),
                now_unworked = swap.now_unworked.index(),
                excess,
                "Swapped to fix food excess"
            );
            self.apply_swap(swap);
            swaps.push(swap);
        }
    }

    /// Finds the first swap which loses food without losing more than `excess`.
    ///
    /// Worked items are visited from the lowest ranked (the most food), unworked items from the highest ranked (the least food).
    fn find_food_loss_swap(&self, ranked: &[PlotHandle], excess: i32) -> Option<SwapRecord> {
        for &worked in ranked.iter().rev().filter(|&&handle| self.is_worked(handle)) {
            let worked_food = self.actual_food(worked);
            let min_food = (worked_food - excess).max(0);
            let replacement = ranked.iter().copied().find(|&handle| {
                let food = self.actual_food(handle);
                !self.is_worked(handle) && food < worked_food && food >= min_food
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
