mod coord;
mod feature;

pub use coord::*;
pub use feature::*;
