// simulation_engine/mod.rs
pub mod connection;
pub mod simulation;

pub use connection::SimulatorConnection;
pub use simulation::SimulatedNetwork;
