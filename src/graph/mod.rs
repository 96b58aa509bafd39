//! Graph lane layout: the marker vocabulary and the engine assigning it.

mod lane;
mod lanes;

pub use lane::LaneType;
pub use lanes::Lanes;
