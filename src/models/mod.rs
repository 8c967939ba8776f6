// Core data models for the lead pipeline
// These structs represent the domain entities

pub mod lead;
pub mod stage;

pub use lead::*;
pub use stage::*;
