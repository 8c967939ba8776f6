pub mod fuzzy;
pub mod money;

pub use money::{format_brl, format_brl_compact};
