use tracing::debug;

use crate::{
    city_data::PlotHandle,
    city_optimiser::{CityOptimiser, OptimiseStatus, SwapRecord},
    output::{OutputVector, TotalOutput, ValueFunctor},
    target_yield::TargetYield,
};

/// One of the candidate lists walked by [`CityOptimiser::optimise_round_robin`].
struct CandidateList {
    /// Workable items sorted best-first by the list's own order.
    ranked: Vec<PlotHandle>,
    /// Items this list has claimed, in claim order. The last one is the list's trailing item.
    claimed: Vec<PlotHandle>,
    /// Index in `ranked` where the search for the next item starts.
    cursor: usize,
}

impl CandidateList {
    fn trailing(&self) -> Option<PlotHandle> {
        self.claimed.last().copied()
    }
}

impl CityOptimiser<'_> {
    /// Optimises the city for several value functors at once.
    ///
    /// Each functor ranks the workable items independently. When `mixed_specialists` is set, one more list ranks the items
    /// with the first functor, and puts items which generate great person points before items of equal value which don't.
    /// The lists then take turns: each turn a list works its best item which is not worked yet,
    /// until every working citizen has an item.
    ///
    /// If the food is below `target` afterwards, the list whose trailing item is strictly dominated by another list's
    /// trailing item gives its trailing item up for its best unworked item with more food.
    /// When no trailing item is dominated, the list whose trailing item has the least food gives it up.
    ///
    /// With no functor at all, this is [`CityOptimiser::optimise`] with the default weights.
    pub fn optimise_round_robin(
        &mut self,
        value_functors: &[ValueFunctor<TotalOutput>],
        mixed_specialists: bool,
        target: TargetYield,
    ) -> OptimiseStatus {
        let Some(first_functor) = value_functors.first() else {
            let value_functor = ValueFunctor::weighted(self.settings.default_weights);
            return self.optimise(&value_functor, target);
        };

        self.handle_free_specialist_slots(first_functor);

        if self.is_degenerate() {
            self.work_all_workable();
            return OptimiseStatus::Ok;
        }

        let mut lists: Vec<CandidateList> = value_functors
            .iter()
            .map(|value_functor| {
                self.rank_workable(|a, b| value_functor.compare(&a.output, &b.output))
            })
            .map(|ranked| CandidateList {
                ranked,
                claimed: Vec::new(),
                cursor: 0,
            })
            .collect();

        if mixed_specialists {
            let ranked = self.rank_workable(|a, b| {
                first_functor
                    .compare(&a.output, &b.output)
                    .then_with(|| {
                        (a.great_person_points() > 0).cmp(&(b.great_person_points() > 0))
                    })
            });
            lists.push(CandidateList {
                ranked,
                claimed: Vec::new(),
                cursor: 0,
            });
        }

        self.claim_round_robin(&mut lists);

        let swaps = self.repair_round_robin_food(&mut lists, target);

        let status = self.status_for(target);
        debug!(
            target: "governor.optimiser",
            ?status,
            lists = lists.len(),
            food = self.city.current_food(),
            swaps,
            "City optimised round robin"
        );
        status
    }

    /// Lets the lists take turns until `working_population` items are worked.
    fn claim_round_robin(&mut self, lists: &mut [CandidateList]) {
        let mut remaining = self.working_population();
        while remaining > 0 {
            let mut claimed_this_round = false;
            for list in lists.iter_mut() {
                if remaining == 0 {
                    break;
                }
                while list.cursor < list.ranked.len() {
                    let handle = list.ranked[list.cursor];
                    list.cursor += 1;
                    if !self.is_worked(handle) {
                        self.city.inventory.set_worked(handle, true);
                        list.claimed.push(handle);
                        remaining -= 1;
                        claimed_this_round = true;
                        break;
                    }
                }
            }
            // Every list has been walked to its end.
            if !claimed_this_round {
                return;
            }
        }
    }

    /// Swaps trailing items for items with more food until the food reaches `target`. Returns the number of swaps.
    fn repair_round_robin_food(&mut self, lists: &mut [CandidateList], target: TargetYield) -> usize {
        let max_swaps = self.workable_count();
        let mut swap_count = 0;

        while swap_count < max_swaps && target.value_below(self.city.current_food()) {
            let Some(list_index) = self.choose_list_to_give_up(lists) else {
                break;
            };
            let list = &mut lists[list_index];
            let Some(trailing) = list.trailing() else {
                break;
            };
            let trailing_food = self.actual_food(trailing);
            let Some(now_worked) = list.ranked.iter().copied().find(|&handle| {
                !self.is_worked(handle) && self.actual_food(handle) > trailing_food
            }) else {
                break;
            };

            let swap = SwapRecord {
                now_worked,
                now_unworked: trailing,
            };
            self.apply_swap(swap);
            list.claimed.pop();
            list.claimed.push(now_worked);
            swap_count += 1;
        }

        swap_count
    }

    /// Chooses the list whose trailing item should be given up.
    fn choose_list_to_give_up(&self, lists: &[CandidateList]) -> Option<usize> {
        let trailing: Vec<(usize, TotalOutput)> = lists
            .iter()
            .enumerate()
            .filter_map(|(index, list)| {
                list.trailing()
                    .map(|handle| (index, self.city.inventory.get(handle).output))
            })
            .collect();

        let dominated = trailing.iter().find(|&&(index, output)| {
            trailing
                .iter()
                .any(|&(other, other_output)| {
                    other != index && other_output.is_strictly_greater(&output)
                })
        });

        dominated
            .or_else(|| {
                trailing
                    .iter()
                    .min_by_key(|(_, output)| output.food())
            })
            .map(|&(index, _)| index)
    }
}
