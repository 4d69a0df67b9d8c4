#[macro_use]
extern crate serde_derive;

mod boost;
mod data;
mod error;
mod losses;
mod math;
mod matrix;
mod tree;

pub use crate::boost::*;
pub use crate::data::*;
pub use crate::error::*;
pub use crate::losses::*;
pub use crate::math::*;
pub use crate::matrix::*;
pub use crate::tree::*;

pub(crate) static DEFAULT_N_TREES: usize = 20;
pub(crate) static DEFAULT_N_LEAVES: usize = 5;
pub(crate) static DEFAULT_SHRINKAGE: f64 = 0.1;
pub(crate) static DEFAULT_MIN_OBS: usize = 10;
pub(crate) static DEFAULT_SUBSAMPLE: f64 = 0.5;
