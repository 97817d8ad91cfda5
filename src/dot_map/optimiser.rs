use std::cmp::Ordering;

use tracing::debug;

use crate::{
    dot_map::{DotMap, DotMapPlotFlags},
    output::{OutputPriority, OutputVector, PlotYield, ValueFunctor, YieldType},
};

/// Chooses one improvement per tile of a [`DotMap`].
pub struct DotMapOptimiser<'a> {
    dot_map: &'a mut DotMap,
    yield_functor: ValueFunctor<PlotYield>,
}

impl<'a> DotMapOptimiser<'a> {
    pub fn new(dot_map: &'a mut DotMap, yield_functor: ValueFunctor<PlotYield>) -> Self {
        Self {
            dot_map,
            yield_functor,
        }
    }

    pub fn dot_map(&self) -> &DotMap {
        &*self.dot_map
    }

    /// Chooses an improvement for every tile, then corrects the total food toward what the population eats.
    ///
    /// 1. Each tile gets its best option according to the yield functor. A tile with a single option gets it,
    ///    a tile without options gets none, and an option which makes a visible bonus resource usable always wins.
    /// 2. While the food is too low, the worst valued tile which has not been adjusted yet switches to
    ///    its best food option, if that option has more food.
    /// 3. While the food is too high, tiles switch to their best option according to `ignore_food_weights`
    ///    when it has less food, as long as the food doesn't fall below the target. The biggest gain goes first.
    ///
    /// Bonus tiles and tiles without a choice are never adjusted.
    pub fn optimise(&mut self, ignore_food_weights: PlotYield) {
        self.choose_initial_improvements();

        let target_food = self.dot_map.target_food();
        let food_functor = self.food_functor();
        let plot_count = self.dot_map.plots.len();

        for _ in 0..plot_count {
            if self.dot_map.total_yield().food() >= target_food {
                break;
            }
            let Some((plot_index, option_index)) = self.find_food_raise(&food_functor) else {
                break;
            };
            self.change_improvement(plot_index, option_index);
        }

        let ignore_food_functor = ValueFunctor::weighted(ignore_food_weights);
        for _ in 0..plot_count {
            let excess = self.dot_map.total_yield().food() - target_food;
            if excess <= 0 {
                break;
            }
            let Some((plot_index, option_index)) =
                self.find_food_reduction(&ignore_food_functor, excess)
            else {
                break;
            };
            self.change_improvement(plot_index, option_index);
        }

        debug!(
            target: "governor.dot_map",
            total_yield = %self.dot_map.total_yield(),
            target_food,
            "Dot map optimised"
        );
    }

    /// Chooses an improvement for every tile and selects the tiles `available_population` citizens would work.
    ///
    /// 1. Each tile gets its initial improvement as in [`DotMapOptimiser::optimise`].
    /// 2. Each tile prefers the yield type of `yield_types` its best option produces the most of.
    ///    Every yield type gets an equal share of the citizens. Types preferred by more tiles than their share
    ///    give up their worst tiles, and the citizens left are given to the best of those tiles.
    ///    Selected tiles switch to their best option for their yield type.
    /// 3. While the selected tiles don't feed the citizens, the best unselected food tile is selected,
    ///    replacing the worst selected tile when every citizen is busy. A new tile must at least feed
    ///    the citizen working it, and must have more food than the tile it replaces.
    pub fn optimise_for_yields(&mut self, yield_types: &[YieldType], available_population: usize) {
        self.choose_initial_improvements();
        self.apportion_yield_types(yield_types, available_population);
        self.top_up_selected_food(available_population);

        debug!(
            target: "governor.dot_map",
            ?yield_types,
            available_population,
            selected = self.dot_map.selected_plots().count(),
            selected_yield = %self.dot_map.selected_yield(),
            "Dot map optimised for yields"
        );
    }

    /// A functor which puts food first, then falls back to the yield functor's weights.
    fn food_functor(&self) -> ValueFunctor<PlotYield> {
        ValueFunctor::new(
            [OutputPriority::more(YieldType::Food)],
            self.yield_functor.weights,
        )
    }

    fn choose_initial_improvements(&mut self) {
        for plot in self.dot_map.plots.iter_mut() {
            plot.flags = DotMapPlotFlags::empty();
            plot.worked_improvement = match plot.options.len() {
                0 => None,
                1 => Some(0),
                _ => plot
                    .bonus_option()
                    .or_else(|| plot.best_option(&self.yield_functor)),
            };
        }
    }

    fn change_improvement(&mut self, plot_index: usize, option_index: usize) {
        let plot = &mut self.dot_map.plots[plot_index];
        plot.worked_improvement = Some(option_index);
        plot.flags.insert(DotMapPlotFlags::ImprovementChanged);
    }

    /// Finds the worst valued adjustable tile whose best food option has more food than its current choice.
    fn find_food_raise(&self, food_functor: &ValueFunctor<PlotYield>) -> Option<(usize, usize)> {
        let mut worst: Option<(usize, usize, PlotYield)> = None;
        for (plot_index, plot) in self.dot_map.plots.iter().enumerate() {
            if !plot.is_adjustable() || plot.flags.contains(DotMapPlotFlags::ImprovementChanged) {
                continue;
            }
            let current_yield = plot.current_yield();
            let Some(option_index) = plot.best_option(food_functor) else {
                continue;
            };
            if plot.options[option_index].plot_yield.food() <= current_yield.food() {
                continue;
            }
            if worst.is_some_and(|(_, _, worst_yield)| {
                !self.yield_functor.is_better(&worst_yield, &current_yield)
            }) {
                continue;
            }
            worst = Some((plot_index, option_index, current_yield));
        }
        worst.map(|(plot_index, option_index, _)| (plot_index, option_index))
    }

    /// Finds the adjustable tile which gains the most value by switching to its best non-food option,
    /// without losing more than `excess` food.
    fn find_food_reduction(
        &self,
        ignore_food_functor: &ValueFunctor<PlotYield>,
        excess: i32,
    ) -> Option<(usize, usize)> {
        let mut best: Option<(usize, usize, i64)> = None;
        for (plot_index, plot) in self.dot_map.plots.iter().enumerate() {
            if !plot.is_adjustable() || plot.flags.contains(DotMapPlotFlags::ImprovementChanged) {
                continue;
            }
            let current_yield = plot.current_yield();
            let Some(option_index) = plot.best_option(ignore_food_functor) else {
                continue;
            };
            let option_yield = plot.options[option_index].plot_yield;
            let food_loss = current_yield.food() - option_yield.food();
            if food_loss <= 0 || food_loss > excess {
                continue;
            }
            let gain =
                ignore_food_functor.value(&option_yield) - ignore_food_functor.value(&current_yield);
            if best.is_some_and(|(_, _, best_gain)| gain <= best_gain) {
                continue;
            }
            best = Some((plot_index, option_index, gain));
        }
        best.map(|(plot_index, option_index, _)| (plot_index, option_index))
    }

    /// Returns the option a tile uses when it is selected for `yield_type`.
    fn option_for_yield_type(&self, plot_index: usize, yield_type: YieldType) -> Option<usize> {
        let plot = &self.dot_map.plots[plot_index];
        if !plot.is_adjustable() {
            return plot.worked_improvement;
        }
        plot.best_option(&ValueFunctor::emphasising(
            yield_type,
            self.yield_functor.weights,
        ))
    }

    /// Compares two candidate tiles: the better yield first, then the tile closer to the city.
    fn compare_candidates(
        &self,
        functor: &ValueFunctor<PlotYield>,
        (a_index, a_yield): (usize, PlotYield),
        (b_index, b_yield): (usize, PlotYield),
    ) -> Ordering {
        let city_coords = self.dot_map.city_coords;
        let distance = |plot_index: usize| {
            self.dot_map.plots[plot_index]
                .coords
                .plot_distance(city_coords)
        };
        functor
            .compare(&a_yield, &b_yield)
            .then_with(|| distance(b_index).cmp(&distance(a_index)))
    }

    /// Shares the available citizens among `yield_types`, see [`DotMapOptimiser::optimise_for_yields`].
    fn apportion_yield_types(&mut self, yield_types: &[YieldType], available_population: usize) {
        // Every tile with at least one option is a candidate, tagged with the yield type it prefers.
        // Without yield types, every tile competes in a single group ranked by the yield functor.
        let group_count = yield_types.len().max(1);
        let mut groups: Vec<Vec<(usize, usize, PlotYield)>> = vec![Vec::new(); group_count];

        for plot_index in 0..self.dot_map.plots.len() {
            if self.dot_map.plots[plot_index].options.is_empty() {
                continue;
            }
            let preferred = yield_types
                .iter()
                .enumerate()
                .filter_map(|(group, &yield_type)| {
                    self.option_for_yield_type(plot_index, yield_type)
                        .map(|option_index| (group, yield_type, option_index))
                })
                .fold(None, |best: Option<(usize, YieldType, usize)>, candidate| {
                    let option_yield =
                        |(_, yield_type, option_index): (usize, YieldType, usize)| {
                            self.dot_map.plots[plot_index].options[option_index].plot_yield
                                [yield_type]
                        };
                    match best {
                        Some(best) if option_yield(candidate) <= option_yield(best) => Some(best),
                        _ => Some(candidate),
                    }
                });

            let (group, option_index) = match preferred {
                Some((group, _, option_index)) => (group, option_index),
                None => match self.dot_map.plots[plot_index].worked_improvement {
                    Some(option_index) => (0, option_index),
                    None => continue,
                },
            };
            let option_yield = self.dot_map.plots[plot_index].options[option_index].plot_yield;
            groups[group].push((plot_index, option_index, option_yield));
        }

        // Rank each group by its own yield type, and keep the group's share. The rest is surplus.
        let mut selected = Vec::new();
        let mut surplus = Vec::new();
        for (group, mut candidates) in groups.into_iter().enumerate() {
            let functor = match yield_types.get(group) {
                Some(&yield_type) => {
                    ValueFunctor::emphasising(yield_type, self.yield_functor.weights)
                }
                None => self.yield_functor.clone(),
            };
            candidates.sort_by(|&(a_index, _, a_yield), &(b_index, _, b_yield)| {
                self.compare_candidates(&functor, (b_index, b_yield), (a_index, a_yield))
            });

            let share = available_population / group_count
                + usize::from(group < available_population % group_count);
            let kept = share.min(candidates.len());
            surplus.extend(candidates.drain(kept..));
            selected.extend(candidates);
        }

        // Citizens left by under-represented yield types go to the best surplus tiles.
        let free_population = available_population.saturating_sub(selected.len());
        surplus.sort_by(|&(a_index, _, a_yield), &(b_index, _, b_yield)| {
            self.compare_candidates(&self.yield_functor, (b_index, b_yield), (a_index, a_yield))
        });
        selected.extend(surplus.into_iter().take(free_population));

        for (plot_index, option_index, _) in selected {
            let plot = &mut self.dot_map.plots[plot_index];
            if plot.worked_improvement != Some(option_index) {
                plot.worked_improvement = Some(option_index);
                plot.flags.insert(DotMapPlotFlags::ImprovementChanged);
            }
            plot.flags.insert(DotMapPlotFlags::Selected);
        }
    }

    /// Selects food tiles until the selected tiles feed `available_population` citizens.
    fn top_up_selected_food(&mut self, available_population: usize) {
        let food_per_population = self.dot_map.food_per_population;
        let target_food = available_population as i32 * food_per_population;
        let food_functor = self.food_functor();

        for _ in 0..self.dot_map.plots.len() {
            if self.dot_map.selected_yield().food() >= target_food {
                return;
            }

            let selected_count = self.dot_map.selected_plots().count();
            let worst_selected = if selected_count >= available_population {
                let worst = self
                    .dot_map
                    .plots
                    .iter()
                    .enumerate()
                    .filter(|(_, plot)| plot.is_selected())
                    .min_by(|(_, a), (_, b)| {
                        let (a_yield, b_yield) = (a.current_yield(), b.current_yield());
                        a_yield
                            .food()
                            .cmp(&b_yield.food())
                            .then_with(|| self.yield_functor.compare(&a_yield, &b_yield))
                    })
                    .map(|(plot_index, plot)| (plot_index, plot.current_yield().food()));
                match worst {
                    Some(worst) => Some(worst),
                    // No citizen at all.
                    None => return,
                }
            } else {
                None
            };

            let min_food = worst_selected.map_or(food_per_population, |(_, worst_food)| {
                food_per_population.max(worst_food + 1)
            });

            let candidate = self
                .dot_map
                .plots
                .iter()
                .enumerate()
                .filter(|(_, plot)| !plot.is_selected())
                .filter_map(|(plot_index, plot)| {
                    let option_index = if plot.is_adjustable() {
                        plot.best_option(&food_functor)
                    } else {
                        plot.worked_improvement
                    }?;
                    let option_yield = plot.options[option_index].plot_yield;
                    (option_yield.food() >= min_food).then_some((
                        plot_index,
                        option_index,
                        option_yield,
                    ))
                })
                .max_by(|&(a_index, _, a_yield), &(b_index, _, b_yield)| {
                    // `max_by` keeps the last maximum, so reverse the tile order to keep the first one.
                    self.compare_candidates(&food_functor, (a_index, a_yield), (b_index, b_yield))
                        .then_with(|| b_index.cmp(&a_index))
                });

            let Some((plot_index, option_index, _)) = candidate else {
                return;
            };

            if let Some((worst_index, _)) = worst_selected {
                self.dot_map.plots[worst_index]
                    .flags
                    .remove(DotMapPlotFlags::Selected);
            }
            let plot = &mut self.dot_map.plots[plot_index];
            if plot.worked_improvement != Some(option_index) {
                plot.worked_improvement = Some(option_index);
                plot.flags.insert(DotMapPlotFlags::ImprovementChanged);
            }
            plot.flags.insert(DotMapPlotFlags::Selected);
        }
    }
}
