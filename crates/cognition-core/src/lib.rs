//! Cognition core for simulated agents: archetype identity with a shadow,
//! theory of mind, a Q-value decision engine and a shallow planner, driven one
//! deterministic tick at a time.

pub mod actions;
pub mod agent;
pub mod archetype;
pub mod behavior;
pub mod config;
pub mod decision;
pub mod distortion;
pub mod ensemble;
pub mod error;
pub mod numeric;
pub mod planning;
pub mod rng;
pub mod simulation;
pub mod tom;
pub mod trauma;

pub use actions::{
    is_hard_available, starter_action_catalog, starter_goal_catalog, ActionCatalog, GoalCatalog,
    FALLBACK_ACTION_ID,
};
pub use agent::{resolve_goals, Agent, AgentDef, TickContext};
pub use archetype::{starter_catalog, ArchetypeCatalog};
pub use behavior::{BehaviorProfile, IdentityProfiles};
pub use config::{
    ArchetypeTuning, CognitionConfig, DecisionTuning, PhaseThresholds, PlannerTuning, TomTuning,
    TraumaTuning,
};
pub use decision::{ActionHistory, Decision};
pub use distortion::{CopingProfile, DistortionProfile};
pub use ensemble::{EnsembleRun, EnsembleRunner, EnsembleSummary};
pub use error::{CognitionError, Result};
pub use planning::PlanAdvance;
pub use rng::{RngChannel, RngStreams};
pub use simulation::{ActionExecutor, EchoExecutor, Simulation, TickRecord};
pub use tom::{TomStore, TomView};
pub use trauma::TraumaLedger;
