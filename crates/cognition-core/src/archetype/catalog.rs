//! Prototype catalog: registry of archetype prototypes in declaration order
//! with an id index.

use std::collections::BTreeMap;

use contracts::{ArchetypePrototype, AxisVector, BehaviorMode, StructuralLayer};
use tracing::warn;

use crate::error::{CognitionError, Result};

#[derive(Debug, Clone, Default)]
pub struct ArchetypeCatalog {
    prototypes: Vec<ArchetypePrototype>,
    by_id: BTreeMap<String, usize>,
}

impl ArchetypeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog, rejecting empty input and duplicate ids.
    pub fn from_prototypes(prototypes: Vec<ArchetypePrototype>) -> Result<Self> {
        if prototypes.is_empty() {
            return Err(CognitionError::EmptyCatalog("prototype"));
        }
        let mut catalog = Self::new();
        for prototype in prototypes {
            catalog.register(prototype)?;
        }
        Ok(catalog)
    }

    pub fn register(&mut self, prototype: ArchetypePrototype) -> Result<()> {
        if self.by_id.contains_key(&prototype.id) {
            return Err(CognitionError::DuplicateId {
                kind: "prototype",
                id: prototype.id,
            });
        }
        self.by_id.insert(prototype.id.clone(), self.prototypes.len());
        self.prototypes.push(prototype);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&ArchetypePrototype> {
        self.by_id.get(id).map(|idx| &self.prototypes[*idx])
    }

    /// Like [`get`](Self::get) but logs the miss.
    pub fn lookup(&self, id: &str) -> Option<&ArchetypePrototype> {
        let found = self.get(id);
        if found.is_none() && !id.is_empty() {
            warn!(prototype_id = id, "unknown archetype prototype");
        }
        found
    }

    pub fn iter(&self) -> impl Iterator<Item = &ArchetypePrototype> {
        self.prototypes.iter()
    }

    pub fn len(&self) -> usize {
        self.prototypes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prototypes.is_empty()
    }

    /// Euclidean nearest neighbour, optionally restricted to one layer. Ties
    /// resolve to the prototype declared first.
    pub fn closest_prototype(
        &self,
        vector: &AxisVector,
        layer_filter: Option<StructuralLayer>,
    ) -> Option<&ArchetypePrototype> {
        let mut best: Option<(&ArchetypePrototype, f64)> = None;
        for prototype in &self.prototypes {
            if layer_filter.is_some_and(|layer| prototype.layer != layer) {
                continue;
            }
            let distance = prototype.metrics.distance(vector);
            match best {
                Some((_, current)) if distance >= current => {}
                _ => best = Some((prototype, distance)),
            }
        }
        best.map(|(prototype, _)| prototype)
    }
}

fn prototype(
    id: &str,
    layer: StructuralLayer,
    function: u8,
    mode: BehaviorMode,
    metrics: [f64; 9],
) -> ArchetypePrototype {
    ArchetypePrototype {
        id: id.to_string(),
        layer,
        function,
        mode,
        metrics: AxisVector(metrics),
    }
}

/// Small illustrative catalog for hosts without their own prototype table.
///
/// Axis order: AGENCY, ACCEPT, ACTION, RADICAL, SCOPE, TRUTH, CARE, MANIP, FORMAL.
pub fn starter_prototypes() -> Vec<ArchetypePrototype> {
    use BehaviorMode::*;
    use StructuralLayer::*;
    vec![
        prototype(
            "arch:guardian",
            Dominant,
            1,
            StabilizingNorm,
            [0.6, 0.6, 0.5, 0.15, 0.5, 0.7, 0.7, 0.2, 0.8],
        ),
        prototype(
            "arch:caregiver",
            Dominant,
            2,
            ObjectiveNorm,
            [0.4, 0.8, 0.4, 0.1, 0.4, 0.7, 0.9, 0.15, 0.5],
        ),
        prototype(
            "arch:commander",
            Dominant,
            0,
            ObjectiveNorm,
            [0.9, 0.5, 0.7, 0.4, 0.8, 0.6, 0.5, 0.4, 0.6],
        ),
        prototype(
            "arch:follower",
            Dominant,
            7,
            StabilizingNorm,
            [0.2, 0.9, 0.3, 0.1, 0.2, 0.5, 0.5, 0.2, 0.7],
        ),
        prototype(
            "arch:sage",
            Objective,
            6,
            ObjectiveNorm,
            [0.5, 0.5, 0.3, 0.3, 0.9, 0.9, 0.6, 0.1, 0.5],
        ),
        prototype(
            "arch:zealot",
            Objective,
            4,
            ObjectiveRadical,
            [0.7, 0.4, 0.7, 0.85, 0.8, 0.3, 0.3, 0.5, 0.6],
        ),
        prototype(
            "arch:rebel",
            Other,
            3,
            SelfRadical,
            [0.8, 0.2, 0.8, 0.9, 0.6, 0.5, 0.3, 0.4, 0.2],
        ),
        prototype(
            "arch:trickster",
            Other,
            5,
            SelfRadical,
            [0.6, 0.4, 0.6, 0.6, 0.5, 0.2, 0.3, 0.9, 0.2],
        ),
    ]
}

pub fn starter_catalog() -> Result<ArchetypeCatalog> {
    ArchetypeCatalog::from_prototypes(starter_prototypes())
}
