use std::collections::BTreeMap;

use cognition_core::actions::ActionCatalog;
use cognition_core::archetype::{
    mixture, self_vector, smooth_mixture, starter_catalog, true_vector, update_phase,
    ArchetypeCatalog, PhaseSignals, SelfImageInputs,
};
use cognition_core::numeric::softmax;
use cognition_core::planning::{advance, PlanAdvance};
use cognition_core::{
    starter_goal_catalog, Agent, CognitionConfig, DistortionProfile, PhaseThresholds,
    TickContext, TomStore,
};
use contracts::{
    ActionTag, ArchetypePrototype, Axis, AxisVector, BehaviorMode, DomainEvent, IdentityPhase,
    Plan, PlanOrigin, PlanStep, StructuralLayer, TraitParams, TraumaLoad, WorldContext,
};
use proptest::prelude::*;

fn traits_from(values: [f64; 14]) -> TraitParams {
    let [
        assertiveness,
        ambition,
        conscientiousness,
        conformity,
        agreeableness,
        impulsivity,
        risk_tolerance,
        openness,
        honesty,
        empathy,
        machiavellianism,
        paranoia,
        neuroticism,
        trust_propensity,
    ] = values;
    TraitParams {
        assertiveness,
        ambition,
        conscientiousness,
        conformity,
        agreeableness,
        impulsivity,
        risk_tolerance,
        openness,
        honesty,
        empathy,
        machiavellianism,
        paranoia,
        neuroticism,
        trust_propensity,
    }
}

fn phase_strategy() -> impl Strategy<Value = IdentityPhase> {
    prop_oneof![
        Just(IdentityPhase::Normal),
        Just(IdentityPhase::Strain),
        Just(IdentityPhase::Break),
        Just(IdentityPhase::Radical),
        Just(IdentityPhase::Post),
    ]
}

fn tag_set_strategy() -> impl Strategy<Value = Vec<ActionTag>> {
    prop::sample::subsequence(
        vec![
            ActionTag::Support,
            ActionTag::Harm,
            ActionTag::Betrayal,
            ActionTag::Hierarchical,
            ActionTag::Care,
        ],
        0..=3,
    )
}

fn two_step_plan() -> Plan {
    let step = |action_id: &str| PlanStep {
        action_id: action_id.to_string(),
        target_id: None,
        tag: None,
    };
    Plan::new(
        "plan:prop",
        "goal:safety",
        vec![step("act:search_tools"), step("act:barricade")],
        PlanOrigin::SelfBuilt,
        0,
        2,
    )
}

fn prototype(id: &str, metrics: AxisVector) -> ArchetypePrototype {
    ArchetypePrototype {
        id: id.to_string(),
        layer: StructuralLayer::Dominant,
        function: 1,
        mode: BehaviorMode::StabilizingNorm,
        metrics,
    }
}

#[test]
fn prototypes_one_apart_on_one_axis_are_at_distance_one_and_ties_go_first() {
    let low = AxisVector::splat(0.0);
    let mut high = low;
    high.set(Axis::Radical, 1.0);
    assert!((low.distance(&high) - 1.0).abs() < 1e-12);

    let catalog = ArchetypeCatalog::from_prototypes(vec![
        prototype("arch:first", low),
        prototype("arch:second", high),
    ])
    .expect("catalog");
    let mut midpoint = low;
    midpoint.set(Axis::Radical, 0.5);
    let closest = catalog.closest_prototype(&midpoint, None).expect("closest");
    assert_eq!(closest.id, "arch:first");
}

#[test]
fn crushed_agency_under_self_blame_and_self_trauma() {
    let config = CognitionConfig::default();
    let distortion = DistortionProfile {
        self_blame: 0.8,
        ..DistortionProfile::default()
    };
    let trauma = TraumaLoad {
        self_image: 0.7,
        ..TraumaLoad::default()
    };
    let inputs = SelfImageInputs {
        trauma: Some(&trauma),
        ..SelfImageInputs::new(&distortion)
    };
    let mut vector = AxisVector::splat(0.5);
    vector.set(Axis::Agency, 0.9);
    let (perceived, _) = self_vector(
        &vector,
        &inputs,
        &config.archetype.self_rules,
        config.archetype.crush_report_below,
    );
    let agency = perceived.get(Axis::Agency);
    assert!(agency < 0.9 * (-2.5_f64 * 0.7).exp());
    let suppression = 1.0 - agency / 0.9;
    assert!((0.7..=0.9).contains(&suppression), "suppression {suppression}");
}

proptest! {
    #[test]
    fn mixture_is_a_distribution(
        traits in prop::array::uniform14(0.0_f64..=1.0),
        boosted in 0_usize..32,
        count in 0_u32..40,
        inertia in 0.0_f64..=1.0,
    ) {
        let config = CognitionConfig::default();
        let catalog = starter_catalog().expect("catalog");
        let vector = true_vector(&traits_from(traits), &config.archetype.axis_weights);

        let mut reinforcement = BTreeMap::new();
        let ids = catalog.iter().map(|p| p.id.clone()).collect::<Vec<_>>();
        reinforcement.insert(ids[boosted % ids.len()].clone(), count);

        let fresh = mixture(&vector, &catalog, &reinforcement, &config.archetype);
        prop_assert_eq!(fresh.len(), catalog.len());
        prop_assert!((fresh.values().sum::<f64>() - 1.0).abs() < 1e-9);
        prop_assert!(fresh.values().all(|w| (0.0..=1.0).contains(w)));

        let old = mixture(&AxisVector::splat(0.5), &catalog, &BTreeMap::new(), &config.archetype);
        let smoothed = smooth_mixture(&old, &fresh, inertia);
        prop_assert!((smoothed.values().sum::<f64>() - 1.0).abs() < 1e-9);
        prop_assert!(smoothed.values().all(|w| (0.0..=1.0).contains(w)));
    }

    #[test]
    fn self_vector_stays_in_the_unit_cube(
        axes in prop::array::uniform9(0.0_f64..=1.0),
        biases in prop::array::uniform9(0.0_f64..=1.0),
        trauma in prop::array::uniform4(0.0_f64..=1.0),
        dissonance in 0.0_f64..=1.0,
    ) {
        let config = CognitionConfig::default();
        let distortion = DistortionProfile {
            trust_bias: biases[0],
            threat_bias: biases[1],
            self_blame: biases[2],
            control_illusion: biases[3],
            black_white: biases[4],
            catastrophizing: biases[5],
            discount_positive: biases[6],
            personalization: biases[7],
            mind_reading: biases[8],
            ..DistortionProfile::default()
        };
        let load = TraumaLoad {
            self_image: trauma[0],
            others: trauma[1],
            world: trauma[2],
            system: trauma[3],
        };
        let inputs = SelfImageInputs {
            trauma: Some(&load),
            moral_dissonance: Some(dissonance),
            ..SelfImageInputs::new(&distortion)
        };
        let (perceived, _) = self_vector(
            &AxisVector(axes),
            &inputs,
            &config.archetype.self_rules,
            config.archetype.crush_report_below,
        );
        for (axis, value) in perceived.iter() {
            prop_assert!((0.0..=1.0).contains(&value), "{axis:?} = {value}");
        }
    }

    #[test]
    fn tom_traits_stay_bounded_and_consistent_evidence_settles_uncertainty(
        tags in tag_set_strategy(),
        action_index in 0_usize..6,
    ) {
        let config = CognitionConfig::default();
        let goals = starter_goal_catalog().expect("goals");
        let action_ids = [
            "act:help",
            "act:strike",
            "act:barricade",
            "act:incite",
            "act:idle",
            "act:comfort",
        ];
        let event = DomainEvent {
            actor_id: "npc:b".to_string(),
            target_id: Some("npc:a".to_string()),
            action_id: action_ids[action_index].to_string(),
            tags,
            success: 1.0,
            intensity: 1.0,
            tick: 0,
        };

        let mut store = TomStore::new();
        let mut start = None;
        for _ in 0..200 {
            store.observe(&event, goals.goals(), &config.tom);
            let entry = store.get("npc:b").expect("entry");
            if start.is_none() {
                start = Some(entry.uncertainty());
            }
            for belief in contracts::TraitBelief::ALL {
                let value = entry.traits.get(belief);
                prop_assert!((0.0..=1.0).contains(&value));
            }
        }
        let entry = store.get("npc:b").expect("entry");
        prop_assert!(entry.uncertainty() < 1e-3);
        prop_assert!(entry.uncertainty() <= start.expect("first observation"));
        prop_assert_eq!(entry.evidence, 200);
    }

    #[test]
    fn softmax_is_a_distribution(
        values in prop::collection::vec(-50.0_f64..50.0, 1..12),
        temperature in 0.0_f64..10.0,
    ) {
        let probabilities = softmax(&values, temperature, 1e-6);
        prop_assert_eq!(probabilities.len(), values.len());
        prop_assert!((probabilities.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        prop_assert!(probabilities.iter().all(|p| (0.0..=1.0).contains(p)));
    }

    #[test]
    fn zero_temperature_puts_all_mass_on_the_maximum(
        values in prop::collection::vec(-50.0_f64..50.0, 1..12),
    ) {
        let probabilities = softmax(&values, 0.0, 1e-6);
        let best = values
            .iter()
            .enumerate()
            .fold(0, |best, (idx, v)| if *v > values[best] { idx } else { best });
        prop_assert!((probabilities[best] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn plan_cursor_is_bounded_and_terminal_plans_stay_put(
        availability in prop::collection::vec(any::<bool>(), 1..10),
    ) {
        let mut plan = two_step_plan();
        let mut terminal = false;
        for available in availability {
            let before = plan.clone();
            let outcome = advance(&mut plan, |_| available);
            prop_assert!(plan.cursor <= plan.steps.len());
            if terminal {
                prop_assert_eq!(outcome, PlanAdvance::Terminal);
                prop_assert_eq!(&plan, &before);
            }
            terminal = plan.status.is_terminal();
        }
    }

    #[test]
    fn phase_moves_only_along_the_table(
        current in phase_strategy(),
        signals in prop::array::uniform7(0.0_f64..=1.0),
    ) {
        let signals = PhaseSignals {
            stress: signals[0],
            stability: signals[1],
            viability: signals[2],
            epistemic_stress: signals[3],
            trauma_max: signals[4],
            shadow_activation: signals[5],
            integration: signals[6],
        };
        let next = update_phase(current, &signals, &PhaseThresholds::default());
        prop_assert!(current.can_transition_to(next), "{current} -> {next}");
    }

    #[test]
    fn lone_fallback_is_chosen_with_certainty(seed in any::<u64>(), temperature in 0.0_f64..5.0) {
        let config = CognitionConfig::default();
        let archetypes = starter_catalog().expect("archetypes");
        let actions = ActionCatalog::from_actions(Vec::new()).expect("actions");
        let goals = starter_goal_catalog().expect("goals");
        let mut world = WorldContext::default();
        world.agents.insert("npc:a".to_string());
        let ctx = TickContext {
            world: &world,
            archetypes: &archetypes,
            actions: &actions,
            goals: &goals,
            config: &config,
        };
        let mut agent = Agent::new("npc:a", TraitParams::default(), seed, &config)
            .with_temperature(temperature);

        let decision = agent.tick(&ctx);
        prop_assert_eq!(&decision.intention.action_id, &actions.fallback().action_id);
        prop_assert_eq!(decision.breakdown.candidates.len(), 1);
        prop_assert_eq!(decision.breakdown.candidates[0].probability, 1.0);
    }
}
