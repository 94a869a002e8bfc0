//! Model parameters: configuration input, the named quantity table derived
//! from it, and expressions over those names.

pub mod config;
pub mod expr;
pub mod quantity;
pub mod table;
pub mod units;

pub use config::CavernConfig;
pub use expr::Expr;
pub use quantity::{Quantity, Unit};
pub use table::{ParameterGroup, ParameterTable};
