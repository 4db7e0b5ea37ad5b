//! Archetype cognition: true and perceived vectors, the prototype catalog,
//! the identity triad and its phase machine.

pub mod catalog;
pub mod identity;
pub mod metrics;
pub mod phase;
pub mod self_image;

pub use catalog::{starter_catalog, starter_prototypes, ArchetypeCatalog};
pub use identity::{
    mixture, prototype_similarities, refresh_identity, select_shadow, smooth_mixture, viability,
    IdentityInputs,
};
pub use metrics::{true_vector, AxisWeights};
pub use phase::{shadow_activation, update_phase, PhaseSignals};
pub use self_image::{self_vector, AxisRule, DistortionFactor, SelfImageInputs};
