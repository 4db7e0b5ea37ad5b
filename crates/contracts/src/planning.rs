//! Plan state produced by the planning engine and consumed step by step by
//! the decision engine.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlanStep {
    pub action_id: String,
    #[serde(default)]
    pub target_id: Option<String>,
    /// Why this step is in the plan, e.g. "prerequisite:fact:gate_open".
    #[serde(default)]
    pub tag: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PlanStatus {
    Active,
    Completed,
    Failed,
}

impl PlanStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, PlanStatus::Completed | PlanStatus::Failed)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PlanOrigin {
    #[serde(rename = "self")]
    SelfBuilt,
    Shared,
    Assigned,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Plan {
    pub plan_id: String,
    pub goal_id: String,
    pub steps: Vec<PlanStep>,
    /// Index of the next step to execute. Never exceeds `steps.len()`.
    pub cursor: usize,
    pub status: PlanStatus,
    pub origin: PlanOrigin,
    pub built_at_tick: u64,
    pub horizon: usize,
}

impl Plan {
    pub fn new(
        plan_id: impl Into<String>,
        goal_id: impl Into<String>,
        steps: Vec<PlanStep>,
        origin: PlanOrigin,
        built_at_tick: u64,
        horizon: usize,
    ) -> Self {
        Self {
            plan_id: plan_id.into(),
            goal_id: goal_id.into(),
            steps,
            cursor: 0,
            status: PlanStatus::Active,
            origin,
            built_at_tick,
            horizon,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.steps.len()
    }

    pub fn remaining(&self) -> &[PlanStep] {
        &self.steps[self.cursor.min(self.steps.len())..]
    }

    pub fn next_step(&self) -> Option<&PlanStep> {
        self.steps.get(self.cursor)
    }
}
