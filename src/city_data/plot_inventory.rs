use super::plot_data::{PlotData, SpecialistType};

/// A stable handle to an item of a [`PlotInventory`]. It stays valid when items change partition.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct PlotHandle(usize);

impl PlotHandle {
    pub const fn index(self) -> usize {
        self.0
    }
}

/// The collection an item of a [`PlotInventory`] currently belongs to.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Partition {
    /// Candidates for the citizen assignment.
    Workable,
    /// Specialist slots temporarily excluded from the assignment, because a free specialist of the same type already fills them.
    Unworkable,
    /// Specialist slots filled by the city's free specialist allotment.
    FreeSpecialist,
}

/// All plots and specialist slots of a city.
///
/// Every item lives in exactly one [`Partition`]. The partition is stored next to the item,
/// so an item can never be in two collections at the same time, and moving it never copies it.
/// Items keep their insertion order inside a partition, which makes every sort in the governor stable.
#[derive(Clone, Default, PartialEq, Debug)]
pub struct PlotInventory {
    plots: Vec<PlotData>,
    /// The partition of each item. The index is equal to [`PlotHandle::index()`].
    partitions: Vec<Partition>,
}

impl PlotInventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a plot or a specialist slot which citizens can work.
    pub fn push_workable(&mut self, plot: PlotData) -> PlotHandle {
        self.push(plot, Partition::Workable)
    }

    /// Adds a specialist slot which the city's free specialists can fill.
    pub fn push_free_specialist(&mut self, plot: PlotData) -> PlotHandle {
        debug_assert!(!plot.is_actual_plot(), "free specialist slots can't be tiles");
        self.push(plot, Partition::FreeSpecialist)
    }

    fn push(&mut self, plot: PlotData, partition: Partition) -> PlotHandle {
        self.plots.push(plot);
        self.partitions.push(partition);
        PlotHandle(self.plots.len() - 1)
    }

    pub fn get(&self, handle: PlotHandle) -> &PlotData {
        &self.plots[handle.0]
    }

    /// Gives mutable access to an item, e.g. to refresh its output after a modifier changed.
    pub fn get_mut(&mut self, handle: PlotHandle) -> &mut PlotData {
        &mut self.plots[handle.0]
    }

    pub fn partition(&self, handle: PlotHandle) -> Partition {
        self.partitions[handle.0]
    }

    /// Returns the handles of every item in `partition`, in insertion order.
    #[must_use = "iterators are lazy and do nothing unless consumed"]
    pub fn handles(&self, partition: Partition) -> impl Iterator<Item = PlotHandle> + '_ {
        self.partitions
            .iter()
            .enumerate()
            .filter(move |&(_, &item_partition)| item_partition == partition)
            .map(|(index, _)| PlotHandle(index))
    }

    /// Returns the number of items in `partition`.
    pub fn count(&self, partition: Partition) -> usize {
        self.partitions
            .iter()
            .filter(|&&item_partition| item_partition == partition)
            .count()
    }

    /// Returns every item with its handle and partition.
    #[must_use = "iterators are lazy and do nothing unless consumed"]
    pub fn iter(&self) -> impl Iterator<Item = (PlotHandle, Partition, &PlotData)> + '_ {
        self.plots
            .iter()
            .zip(self.partitions.iter())
            .enumerate()
            .map(|(index, (plot, &partition))| (PlotHandle(index), partition, plot))
    }

    /// Returns every worked item, whatever its partition.
    #[must_use = "iterators are lazy and do nothing unless consumed"]
    pub fn worked(&self) -> impl Iterator<Item = &PlotData> + '_ {
        self.plots.iter().filter(|plot| plot.is_worked())
    }

    pub(crate) fn set_worked(&mut self, handle: PlotHandle, is_worked: bool) {
        self.plots[handle.0].set_worked(is_worked);
    }

    /// Moves every [`Partition::Unworkable`] item back to [`Partition::Workable`].
    /// Returns the number of moved items.
    pub fn reclaim_unworkable(&mut self) -> usize {
        let mut reclaimed = 0;
        for partition in self.partitions.iter_mut() {
            if *partition == Partition::Unworkable {
                *partition = Partition::Workable;
                reclaimed += 1;
            }
        }
        reclaimed
    }

    /// Moves the first workable specialist slot of `specialist_type` to [`Partition::Unworkable`].
    /// Returns its handle, or `None` if the city has no such workable slot.
    pub fn remove_to_unworkable(&mut self, specialist_type: SpecialistType) -> Option<PlotHandle> {
        let handle = self.handles(Partition::Workable).find(|&handle| {
            self.get(handle).specialist_type() == Some(specialist_type)
        })?;
        self.partitions[handle.0] = Partition::Unworkable;
        self.plots[handle.0].set_worked(false);
        Some(handle)
    }
}
