pub mod lead;
pub mod stage;

pub use lead::*;
pub use stage::*;
