use glam::IVec2;

/// A coordinate in the offset coordinate system.
///
/// Offset coordinates address a tile by its column and row on the game map, with the map's left-bottom corner as origin.
/// The governor never interprets the values beyond equality and distance, so it works with both
/// wrapped and non-wrapped maps as long as the host game normalizes coordinates to `x ∈ [0, width)` and `y ∈ [0, height)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OffsetCoordinate(pub IVec2);

impl OffsetCoordinate {
    pub const fn new(x: i32, y: i32) -> Self {
        Self(IVec2::new(x, y))
    }

    /// Returns the plot distance between two coordinates.
    ///
    /// Plot distance is the number of rings between two tiles on a square-ish city radius,
    /// i.e. the larger of the two axis distances plus half the smaller one.
    /// A city's fat cross contains every tile with plot distance `<= 2`, excluding the corners.
    pub fn plot_distance(self, other: Self) -> i32 {
        let delta = (self.0 - other.0).abs();
        delta.max_element() + delta.min_element() / 2
    }
}

impl From<[i32; 2]> for OffsetCoordinate {
    fn from(value: [i32; 2]) -> Self {
        OffsetCoordinate::new(value[0], value[1])
    }
}
