//! Two-body orbit propagation.
//!
//! Angles enter this module in degrees (as they arrive on the wire) and are
//! converted to radians exactly once, inside [`resolve_state`], before any
//! trigonometric call. Every kernel function that touches `sin`/`cos`
//! takes radians.

pub mod body;
pub mod elements;
pub mod frame;
pub mod kepler;
pub mod search;
pub mod time;

pub use body::*;
pub use elements::*;
pub use frame::*;
pub use kepler::*;
pub use search::*;
pub use time::*;
