mod offset_coordinate;

pub use offset_coordinate::OffsetCoordinate;
