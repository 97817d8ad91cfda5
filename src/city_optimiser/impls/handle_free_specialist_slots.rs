use tracing::debug;

use crate::{
    city_data::{Partition, PlotHandle},
    city_optimiser::CityOptimiser,
    output::{TotalOutput, ValueFunctor},
};

impl CityOptimiser<'_> {
    /// Prepares the inventory and fills the city's free specialist slots.
    ///
    /// 1. The specialist slots excluded by the previous call are reclaimed, the exclusion never outlives a call.
    /// 2. Every workable and free specialist item is unworked.
    /// 3. The best free specialist slots according to `value_functor` are worked,
    ///    as many as [`crate::city_data::SpecialistHelper::total_free_specialist_slot_count`].
    ///    For each of them, one workable slot of the same specialist type is moved to [`Partition::Unworkable`],
    ///    so the same specialist is not counted again by the citizen assignment.
    pub fn handle_free_specialist_slots(&mut self, value_functor: &ValueFunctor<TotalOutput>) {
        let reclaimed = self.city.inventory.reclaim_unworkable();

        let resettable: Vec<PlotHandle> = self
            .city
            .inventory
            .iter()
            .filter(|&(_, partition, _)| partition != Partition::Unworkable)
            .map(|(handle, _, _)| handle)
            .collect();
        for handle in resettable {
            self.city.inventory.set_worked(handle, false);
        }

        let free_slot_count = self
            .city
            .specialist_helper
            .total_free_specialist_slot_count();
        if free_slot_count == 0 {
            return;
        }

        let inventory = &self.city.inventory;
        let mut free_specialist_slots: Vec<PlotHandle> =
            inventory.handles(Partition::FreeSpecialist).collect();
        free_specialist_slots.sort_by(|&a, &b| {
            value_functor.compare(&inventory.get(b).output, &inventory.get(a).output)
        });

        let mut excluded = 0;
        for &handle in free_specialist_slots.iter().take(free_slot_count) {
            self.city.inventory.set_worked(handle, true);
            if let Some(specialist_type) = self.city.inventory.get(handle).specialist_type() {
                excluded += self
                    .city
                    .inventory
                    .remove_to_unworkable(specialist_type)
                    .map_or(0, |_| 1);
            }
        }

        debug!(
            target: "governor.optimiser",
            reclaimed,
            free_slot_count,
            excluded,
            "Free specialist slots filled"
        );
    }
}
