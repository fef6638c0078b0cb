//! Domain models for the warehouse stock service

mod movement;
mod product;
mod stock;
mod user;

pub use movement::*;
pub use product::*;
pub use stock::*;
pub use user::*;
