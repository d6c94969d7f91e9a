use eq_path::PathProgress;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStage {
    LoadingScenario,
    BuildingSystem,
    SolvingEndpoints,
    TracingPath,
    Completed,
}

impl RunStage {
    pub fn label(&self) -> &'static str {
        match self {
            RunStage::LoadingScenario => "loading",
            RunStage::BuildingSystem => "building",
            RunStage::SolvingEndpoints => "endpoints",
            RunStage::TracingPath => "tracing",
            RunStage::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunProgressEvent {
    pub stage: RunStage,
    pub elapsed_wall_s: f64,
    /// Set while tracing the path
    pub path: Option<PathProgress>,
}
