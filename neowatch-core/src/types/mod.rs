//! Domain records flowing through the pipeline.

pub mod asteroid;
pub mod outcome;

pub use asteroid::*;
pub use outcome::*;
