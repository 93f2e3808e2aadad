pub mod cause;
pub mod state;
pub mod transition;
