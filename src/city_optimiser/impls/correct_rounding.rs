use tracing::debug;

use crate::{
    city_data::PlotHandle,
    city_optimiser::{CityOptimiser, SwapRecord},
    output::{FoodAwareOrder, OutputVector, TotalOutput},
    target_yield::TargetYield,
};

impl CityOptimiser<'_> {
    /// Gives the lowest ranked worked item one last chance to be replaced.
    ///
    /// The city's modifiers are applied to the whole output, so two assignments which look equal item by item
    /// may differ once the totals are truncated to whole units. This pass compares whole-unit totals:
    /// the lowest ranked worked item according to `order` is replaced by the unworked item whose hypothetical
    /// total scores best, if that total is strictly better than the current one and its food stays inside `target`.
    ///
    /// Only one swap is considered, this is a final nudge rather than another search.
    pub(in crate::city_optimiser) fn correct_rounding(
        &mut self,
        order: &FoodAwareOrder<TotalOutput>,
        target: TargetYield,
    ) -> Option<SwapRecord> {
        let ranked = self.rank_by_food(order);
        let &lowest_worked = ranked.iter().rev().find(|&&handle| self.is_worked(handle))?;

        let current_output = self.city.current_output();
        let base_output =
            current_output - self.city.inventory.get(lowest_worked).actual_output;

        let mut best: Option<(PlotHandle, TotalOutput)> = None;
        for &handle in ranked.iter().filter(|&&handle| !self.is_worked(handle)) {
            let output = base_output + self.city.inventory.get(handle).actual_output;
            if !target.contains(output.food()) {
                continue;
            }
            let best_output = best.map_or(current_output, |(_, best_output)| best_output);
            if order
                .value_functor
                .is_better(&output.to_whole_units(), &best_output.to_whole_units())
            {
                best = Some((handle, output));
            }
        }

        let (now_worked, output) = best?;
        let swap = SwapRecord {
            now_worked,
            now_unworked: lowest_worked,
        };
        debug!(
            target: "governor.optimiser",
            now_worked = now_worked.index(),
            now_unworked = lowest_worked.index(),
            output = %output,
            "Swapped to correct rounding"
        );
        self.apply_swap(swap);
        Some(swap)
    }
}
