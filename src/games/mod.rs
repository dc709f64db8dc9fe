//! The six reference simulators.
//!
//! Each game implements [`Model`](crate::model::Model) on its own and shares
//! nothing with the others beyond the `core` types.

pub mod cellularena;
pub mod mars_lander;
pub mod no_spoon;
pub mod shadows;
pub mod the_fall;

pub use cellularena::Cellularena;
pub use mars_lander::MarsLander;
pub use no_spoon::ThereIsNoSpoon;
pub use shadows::{ShadowsOfTheKnight1, ShadowsOfTheKnight2};
pub use the_fall::TheFall;
