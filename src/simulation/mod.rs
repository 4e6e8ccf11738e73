// src/simulation/mod.rs

pub mod models;
pub mod tenderly;

pub use models::{SimulationRequest, SimulationResult};
pub use tenderly::{Simulator, TenderlyClient};
