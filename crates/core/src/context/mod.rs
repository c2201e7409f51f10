//! Request context models and envelope validation.

mod model;
mod validation;

pub use model::*;
pub use validation::*;
