pub mod advisors;
pub mod policy;
pub mod reports;
pub mod seeds;
pub mod simulation;
pub mod tester;

pub use advisors::AdvisorKind;
pub use policy::GameplayStrategy;
pub use seeds::resolve_seed_inputs;
pub use simulation::{SimulationPlan, SimulationSummary, Simulator};
pub use tester::*;
