pub mod display;

pub use display::{format_grouped, format_price};
