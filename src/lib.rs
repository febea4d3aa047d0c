pub mod app;
pub mod core;
pub mod delivery;
pub mod queue;
