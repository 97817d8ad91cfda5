use std::collections::HashSet;

use tracing::debug;

use crate::{
    city_data::{Partition, PlotHandle},
    city_optimiser::{CityOptimiser, SwapRecord},
    output::{OutputVector, TotalOutput, ValueFunctor},
    target_yield::TargetYield,
};

/// Two worked items replaced by two unworked items.
#[derive(Clone, Copy, Debug)]
struct Juggle {
    swaps: [SwapRecord; 2],
    /// Output gained by the juggle, i.e. the unworked pair's output minus the worked pair's output.
    gain: TotalOutput,
}

impl CityOptimiser<'_> {
    /// Swaps pairs of items when a single swap can't improve the city without losing food.
    ///
    /// For example, a worked farm and a worked mine may be replaced by two grassland cottages
    /// which together produce as much food and more value.
    ///
    /// A juggle is made when:
    /// - the unworked pair produces at least as much food as the worked pair, and doesn't push the food above
    ///   the upper bound of `target` when it was not already above;
    /// - the unworked pair's output is strictly better according to `value_functor`;
    /// - the replacements can be matched one to one so that no worked item is strictly better in every output
    ///   than the unworked item replacing it.
    ///
    /// Items touched by a previous swap of this call are left alone, so a swap is never undone.
    /// Juggling is skipped for small cities, see [`crate::settings::OptimiserSettings::min_juggling_items`].
    pub(in crate::city_optimiser) fn juggle_plots(
        &mut self,
        value_functor: &ValueFunctor<TotalOutput>,
        target: TargetYield,
        swaps: &mut Vec<SwapRecord>,
    ) {
        let workable_count = self.workable_count();
        if workable_count < self.settings.min_juggling_items
            || self.city.working_population < self.settings.min_juggling_population
        {
            return;
        }

        for _ in 0..workable_count {
            let Some(juggle) = self.find_best_juggle(value_functor, target, swaps) else {
                return;
            };
            debug!(
                target: "governor.optimiser",
                now_worked = ?juggle.swaps.map(|swap| swap.now_worked.index()),
                now_unworked = ?juggle.swaps.map(|swap| swap.now_unworked.index()),
                gain = %juggle.gain,
                "Juggled plots"
            );
            for swap in juggle.swaps {
                self.apply_swap(swap);
                swaps.push(swap);
            }
        }
    }

    fn find_best_juggle(
        &self,
        value_functor: &ValueFunctor<TotalOutput>,
        target: TargetYield,
        swaps: &[SwapRecord],
    ) -> Option<Juggle> {
        let touched: HashSet<PlotHandle> = swaps
            .iter()
            .flat_map(|swap| [swap.now_worked, swap.now_unworked])
            .collect();

        let (worked, unworked): (Vec<PlotHandle>, Vec<PlotHandle>) = self
            .city
            .inventory
            .handles(Partition::Workable)
            .filter(|handle| !touched.contains(handle))
            .partition(|&handle| self.is_worked(handle));

        let current_food = self.city.current_food();
        let inventory = &self.city.inventory;
        let output = |handle: PlotHandle| inventory.get(handle).output;
        // A worked item must not be strictly better in every output than its replacement.
        let is_regression =
            |removed: PlotHandle, added: PlotHandle| output(removed).is_strictly_greater(&output(added));

        let mut best: Option<Juggle> = None;
        for (i, &worked_a) in worked.iter().enumerate() {
            for &worked_b in &worked[i + 1..] {
                let worked_output = output(worked_a) + output(worked_b);
                let worked_food = self.actual_food(worked_a) + self.actual_food(worked_b);

                for (k, &unworked_a) in unworked.iter().enumerate() {
                    for &unworked_b in &unworked[k + 1..] {
                        let unworked_food =
                            self.actual_food(unworked_a) + self.actual_food(unworked_b);
                        if unworked_food < worked_food {
                            continue;
                        }
                        let new_food = current_food - worked_food + unworked_food;
                        if new_food > current_food && target.value_above(new_food) {
                            continue;
                        }

                        let unworked_output = output(unworked_a) + output(unworked_b);
                        if !value_functor.is_better(&unworked_output, &worked_output) {
                            continue;
                        }

                        let pairings = [
                            [(unworked_a, worked_a), (unworked_b, worked_b)],
                            [(unworked_b, worked_a), (unworked_a, worked_b)],
                        ];
                        let Some(pairing) = pairings.into_iter().find(|pairing| {
                            pairing
                                .iter()
                                .all(|&(added, removed)| !is_regression(removed, added))
                        }) else {
                            continue;
                        };

                        let gain = unworked_output - worked_output;
                        if best.is_some_and(|best| !value_functor.is_better(&gain, &best.gain)) {
                            continue;
                        }
                        best = Some(Juggle {
                            swaps: pairing.map(|(now_worked, now_unworked)| SwapRecord {
                                now_worked,
                                now_unworked,
                            }),
                            gain,
                        });
                    }
                }
            }
        }
        best
    }
}
