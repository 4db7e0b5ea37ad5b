use cognition_core::{
    starter_action_catalog, starter_catalog, starter_goal_catalog, AgentDef, CognitionConfig,
    EchoExecutor, EnsembleRunner, EnsembleSummary, Simulation, TickRecord,
};
use contracts::{
    DecisionSource, GoalEcology, Order, PersonalGoal, SimulationConfig, TraitParams,
    WorldContext,
};

fn scene() -> WorldContext {
    let mut world = WorldContext {
        phase: "siege".to_string(),
        leader_id: Some("npc:captain".to_string()),
        legitimacy: 0.7,
        ..WorldContext::default()
    };
    world.roles.insert("npc:captain".to_string(), "leader".to_string());
    world.roles.insert("npc:medic".to_string(), "medic".to_string());
    world.counters.insert("wounded".to_string(), 3);
    world.social_pressure.insert("npc:recruit".to_string(), 0.6);
    world.orders.push(Order {
        order_id: "order:hold".to_string(),
        issuer_id: "npc:captain".to_string(),
        recipient_id: None,
        action_id: "act:barricade".to_string(),
        target_id: None,
        issued_tick: 0,
    });
    world
}

fn agent(agent_id: &str, goal_id: &str, traits: TraitParams) -> AgentDef {
    let mut def = AgentDef::new(agent_id);
    def.traits = traits;
    def.goals = GoalEcology::Personalized(vec![PersonalGoal {
        goal_id: goal_id.to_string(),
        priority: 0.9,
        active: true,
    }]);
    def
}

fn run(seed: u64, ticks: u64) -> Vec<TickRecord> {
    let sim_config = SimulationConfig {
        run_id: format!("run:{seed}"),
        seed,
        max_ticks: ticks,
        ..SimulationConfig::default()
    };
    let mut sim = Simulation::new(
        sim_config,
        CognitionConfig::default(),
        scene(),
        starter_catalog().expect("archetypes"),
        starter_action_catalog().expect("actions"),
        starter_goal_catalog().expect("goals"),
    )
    .expect("simulation");

    let bold = TraitParams {
        assertiveness: 0.9,
        ambition: 0.8,
        conformity: 0.2,
        ..TraitParams::default()
    };
    let anxious = TraitParams {
        neuroticism: 0.9,
        paranoia: 0.7,
        trust_propensity: 0.2,
        ..TraitParams::default()
    };
    for def in [
        agent("npc:recruit", "goal:bond", anxious),
        agent("npc:captain", "goal:safety", bold),
        agent("npc:medic", "goal:bond", TraitParams::default()),
    ] {
        sim.add_agent(&def).expect("agent");
    }

    let mut executor = EchoExecutor::new(starter_action_catalog().expect("actions"));
    sim.step_n(ticks, &mut executor)
}

#[test]
fn same_seed_reproduces_every_choice_and_breakdown() {
    let first = run(2024, 12);
    let second = run(2024, 12);
    assert_eq!(first.len(), 36);
    assert_eq!(first, second);

    let encoded = serde_json::to_value(&first[0]).expect("serialize");
    assert_eq!(encoded["agent_id"], "npc:captain");
    assert!(encoded["breakdown"].is_object());
}

#[test]
fn records_are_well_formed() {
    for record in run(7, 8) {
        assert_eq!(record.intention.agent_id, record.agent_id);
        assert_eq!(record.intention.tick, record.tick);
        match record.breakdown.source {
            DecisionSource::Reactive => {
                let chosen = record.breakdown.chosen_index.expect("reactive choice");
                assert!(chosen < record.breakdown.candidates.len());
                let mass = record
                    .breakdown
                    .candidates
                    .iter()
                    .map(|c| c.probability)
                    .sum::<f64>();
                assert!((mass - 1.0).abs() < 1e-9);
                assert!(record.breakdown.plan_id.is_none());
            }
            _ => {
                assert!(record.breakdown.candidates.is_empty());
                assert!(record.breakdown.plan_id.is_some());
            }
        }
        assert!((0.0..=1.0).contains(&record.breakdown.alpha));
    }
}

#[test]
fn ensemble_of_simulations_is_thread_count_independent() {
    let seeds = (1..=6).collect::<Vec<u64>>();
    let reactive_share = |seed: u64| {
        let records = run(seed, 6);
        let reactive = records
            .iter()
            .filter(|r| r.breakdown.source == DecisionSource::Reactive)
            .count();
        reactive as f64 / records.len() as f64
    };

    let sequential = EnsembleRunner::new(1).run(&seeds, reactive_share).expect("sequential");
    let parallel = EnsembleRunner::new(3).run(&seeds, reactive_share).expect("parallel");
    assert_eq!(sequential, parallel);

    let shares = parallel.iter().map(|run| run.output).collect::<Vec<_>>();
    let summary = EnsembleSummary::from_values(&shares, 0.2).expect("summary");
    assert_eq!(summary.count, 6);
    assert!(summary.p5 <= summary.p50 && summary.p50 <= summary.p95);
    assert!(summary.cvar <= summary.mean + 1e-12);
}
