use crate::{
    grid::OffsetCoordinate,
    output::{OutputType, PlotYield, TotalOutput},
};

/// Index of a specialist in the game's specialist table, e.g. priest, engineer, scientist.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct SpecialistType(pub usize);

/// Where an item of the inventory lives.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum PlotLocation {
    /// A real tile of the map.
    Tile(OffsetCoordinate),
    /// A specialist slot. It is not a tile, but the governor treats it as a pseudo-plot
    /// which one citizen can work.
    Specialist(SpecialistType),
}

/// Great person points an item generates each turn.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct GreatPersonOutput {
    /// Index of the great person unit the points go to.
    pub unit_type: usize,
    /// Points per turn, scaled by 100.
    pub points: i32,
}

/// A plot or a specialist slot which a citizen can work.
#[derive(Clone, PartialEq, Debug)]
pub struct PlotData {
    pub location: PlotLocation,
    /// The raw yield of the plot.
    pub plot_yield: PlotYield,
    /// The output used to rank this item against others.
    pub output: TotalOutput,
    /// The output after the city's modifiers, which is what the city really gets when this item is worked.
    /// It is owned by the host game, the governor only reads it.
    pub actual_output: TotalOutput,
    pub great_person_output: Option<GreatPersonOutput>,
    /// Only the governor writes it, see [`crate::city_optimiser::CityOptimiser`].
    is_worked: bool,
}

impl PlotData {
    /// Creates an unworked tile whose actual output equals its output.
    pub fn plot(coords: OffsetCoordinate, plot_yield: PlotYield, output: TotalOutput) -> Self {
        Self {
            location: PlotLocation::Tile(coords),
            plot_yield,
            output,
            actual_output: output,
            great_person_output: None,
            is_worked: false,
        }
    }

    /// Creates an unworked specialist slot whose actual output equals its output.
    pub fn specialist(
        specialist_type: SpecialistType,
        output: TotalOutput,
        great_person_output: Option<GreatPersonOutput>,
    ) -> Self {
        let commerce = OutputType::COMMERCE_TYPES
            .iter()
            .map(|&output_type| output[output_type])
            .sum();
        Self {
            location: PlotLocation::Specialist(specialist_type),
            plot_yield: PlotYield::new(
                output[OutputType::Food],
                output[OutputType::Production],
                commerce,
            ),
            output,
            actual_output: output,
            great_person_output,
            is_worked: false,
        }
    }

    pub fn with_actual_output(mut self, actual_output: TotalOutput) -> Self {
        self.actual_output = actual_output;
        self
    }

    /// Returns `false` if this item is a specialist slot.
    pub fn is_actual_plot(&self) -> bool {
        matches!(self.location, PlotLocation::Tile(_))
    }

    /// Returns the specialist type if this item is a specialist slot.
    pub fn specialist_type(&self) -> Option<SpecialistType> {
        match self.location {
            PlotLocation::Tile(_) => None,
            PlotLocation::Specialist(specialist_type) => Some(specialist_type),
        }
    }

    pub fn is_worked(&self) -> bool {
        self.is_worked
    }

    pub(crate) fn set_worked(&mut self, is_worked: bool) {
        self.is_worked = is_worked;
    }

    /// Great person points per turn, `0` if the item generates none.
    pub fn great_person_points(&self) -> i32 {
        self.great_person_output
            .map_or(0, |great_person_output| great_person_output.points)
    }
}
