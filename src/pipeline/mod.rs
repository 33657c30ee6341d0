pub mod inputs;
pub mod orchestrator;
pub mod report;

pub use inputs::{discover_inputs, input_dir_name, InputUnit};
pub use orchestrator::Orchestrator;
pub use report::{
    ConfigSnapshot, InputOutcome, InputStatus, PlannedArea, RunPlan, RunReport, Topology,
};
