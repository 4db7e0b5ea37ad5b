use contracts::{ActionDef, Targeting, WorldContext};

use crate::actions::{is_hard_available, ActionCatalog};

/// One scoreable option: an action and, for targeted actions, who it is aimed at.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate<'a> {
    pub action: &'a ActionDef,
    pub target_id: Option<String>,
}

/// Every hard-available action, expanded over the other agents present for
/// targeted actions. Falls back to the catalog's no-op when nothing else
/// qualifies, so the result is never empty.
pub fn generate<'a>(
    agent_id: &str,
    world: &WorldContext,
    catalog: &'a ActionCatalog,
) -> (Vec<Candidate<'a>>, bool) {
    let mut out = Vec::new();
    for action in catalog.iter() {
        if action.fallback || !is_hard_available(action, agent_id, world) {
            continue;
        }
        match action.targeting {
            Targeting::None => out.push(Candidate {
                action,
                target_id: None,
            }),
            Targeting::OtherAgent => {
                for other in world.agents.iter().filter(|other| *other != agent_id) {
                    out.push(Candidate {
                        action,
                        target_id: Some(other.clone()),
                    });
                }
            }
        }
    }

    let injected = out.is_empty();
    if injected {
        out.push(Candidate {
            action: catalog.fallback(),
            target_id: None,
        });
    }
    (out, injected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::{starter_action_catalog, FALLBACK_ACTION_ID};

    #[test]
    fn targeted_actions_expand_over_other_agents() {
        let catalog = starter_action_catalog().expect("catalog");
        let mut world = WorldContext::default();
        world.agents = ["npc:a", "npc:b", "npc:c"]
            .into_iter()
            .map(str::to_string)
            .collect();
        let (candidates, injected) = generate("npc:a", &world, &catalog);
        assert!(!injected);
        let helps = candidates
            .iter()
            .filter(|c| c.action.action_id == "act:help")
            .filter_map(|c| c.target_id.as_deref())
            .collect::<Vec<_>>();
        assert_eq!(helps, vec!["npc:b", "npc:c"]);
        assert!(candidates.iter().all(|c| c.action.action_id != "act:barricade"));
    }

    #[test]
    fn empty_candidate_set_injects_the_fallback() {
        let raw = r#"{"action_id":"act:hug","tags":["care"],"targeting":"other_agent"}"#;
        let lonely: ActionDef = serde_json::from_str(raw).expect("action json");
        let catalog = ActionCatalog::from_actions(vec![lonely]).expect("catalog");
        let (candidates, injected) = generate("npc:a", &WorldContext::default(), &catalog);
        assert!(injected);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].action.action_id, FALLBACK_ACTION_ID);
    }
}
