use crate::{
    city_optimiser::CityOptimiser,
    output::{FoodAwareOrder, TotalOutput},
};

impl CityOptimiser<'_> {
    /// Works the first `working_population` workable items according to `order`.
    pub(in crate::city_optimiser) fn assign_initial_plots(
        &mut self,
        order: &FoodAwareOrder<TotalOutput>,
    ) {
        let ranked = self.rank_by_food(order);
        for &handle in ranked.iter().take(self.working_population()) {
            self.city.inventory.set_worked(handle, true);
        }
    }
}
