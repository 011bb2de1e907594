pub mod bridge;
pub mod executor;
pub mod orchestrator;


// Re-export main types
pub use bridge::OutcomeBridge;
pub use executor::{ExecutionError, ExecutionStage, StepExecutor};
pub use orchestrator::{
    BuilderError, FlowOrchestrator, FlowOrchestratorBuilder, FlowStart, OrchestratorConfig,
    OrchestratorError, OutcomeEvent,
};
