//! Trauma load per domain plus the running biography summary.

use contracts::{
    ActionTag, BiographyLatent, DomainEvent, LifeEvent, LifeEventKind, TraumaDomain, TraumaLoad,
};

use crate::config::TraumaTuning;
use crate::numeric::clip01;

const DOMAINS: [TraumaDomain; 4] = [
    TraumaDomain::SelfImage,
    TraumaDomain::Others,
    TraumaDomain::World,
    TraumaDomain::System,
];

/// Domain weights `[self, others, world, system]` per life-event kind.
fn domain_weights(kind: LifeEventKind) -> [f64; 4] {
    match kind {
        LifeEventKind::Betrayal => [0.2, 0.7, 0.1, 0.2],
        LifeEventKind::Loss => [0.3, 0.1, 0.6, 0.1],
        LifeEventKind::Humiliation => [0.7, 0.3, 0.0, 0.2],
        LifeEventKind::Violence => [0.3, 0.5, 0.6, 0.2],
        LifeEventKind::Upheaval => [0.1, 0.1, 0.4, 0.6],
        LifeEventKind::Achievement | LifeEventKind::Care => [0.0; 4],
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TraumaLedger {
    pub load: TraumaLoad,
    pub biography: BiographyLatent,
}

impl TraumaLedger {
    pub fn new(load: TraumaLoad, biography: BiographyLatent) -> Self {
        Self { load, biography }
    }

    pub fn record(&mut self, event: &LifeEvent, tuning: &TraumaTuning) {
        let severity = clip01(event.severity);
        let weights = domain_weights(event.kind);
        for (domain, weight) in DOMAINS.iter().zip(weights) {
            self.bump(*domain, weight * severity);
        }
        self.fold_biography(event.kind, severity, tuning.biography_rate);
    }

    /// Multiplicative decay over `ticks` ticks.
    pub fn decay(&mut self, ticks: u64, rate: f64) {
        if ticks == 0 {
            return;
        }
        let factor = (1.0 - clip01(rate)).powi(ticks.min(i32::MAX as u64) as i32);
        for domain in DOMAINS {
            let value = self.load.get_mut(domain);
            *value = (*value * factor).max(0.0);
        }
    }

    /// Therapeutic processing: removes `amount` of every domain proportionally.
    pub fn process(&mut self, amount: f64) {
        let amount = clip01(amount);
        let mut removed = 0.0;
        for domain in DOMAINS {
            let value = self.load.get_mut(domain);
            let delta = *value * amount;
            *value -= delta;
            removed += delta;
        }
        self.biography.processed += removed;
    }

    /// Trauma an observer takes from a domain event.
    pub fn absorb_event(&mut self, event: &DomainEvent, observer_id: &str, tuning: &TraumaTuning) {
        if event.actor_id == observer_id {
            return;
        }
        let severity = clip01(event.intensity) * clip01(event.success.max(0.0));
        if severity <= 0.0 {
            return;
        }

        let targeted = event.target_id.as_deref() == Some(observer_id);
        let harmed = event.has_tag(ActionTag::Harm);
        let betrayed = event.has_tag(ActionTag::Betrayal);
        let hierarchical = event.has_tag(ActionTag::Hierarchical);

        if targeted {
            if betrayed {
                self.bump(TraumaDomain::Others, 0.5 * severity);
                self.bump(TraumaDomain::SelfImage, 0.2 * severity);
                self.fold_biography(LifeEventKind::Betrayal, severity, tuning.biography_rate);
            }
            if harmed {
                self.bump(TraumaDomain::Others, 0.3 * severity);
                self.bump(TraumaDomain::SelfImage, 0.2 * severity);
                self.fold_biography(LifeEventKind::Violence, severity, tuning.biography_rate);
                if hierarchical {
                    self.bump(TraumaDomain::System, 0.4 * severity);
                }
            }
            if event.has_tag(ActionTag::Support) || event.has_tag(ActionTag::Care) {
                self.fold_biography(LifeEventKind::Care, severity, tuning.biography_rate);
            }
        } else if harmed || betrayed {
            self.bump(TraumaDomain::World, 0.2 * severity);
            if hierarchical {
                self.bump(TraumaDomain::System, 0.1 * severity);
            }
        }
    }

    /// Share of all trauma ever accumulated that has been processed.
    pub fn integration(&self) -> f64 {
        let total = self.biography.processed + self.biography.accumulated;
        if total <= f64::EPSILON {
            0.0
        } else {
            clip01(self.biography.processed / total)
        }
    }

    pub fn max_domain(&self) -> f64 {
        self.load.max_domain()
    }

    fn bump(&mut self, domain: TraumaDomain, amount: f64) {
        if amount <= 0.0 || !amount.is_finite() {
            return;
        }
        let value = self.load.get_mut(domain);
        let next = clip01(*value + amount);
        self.biography.accumulated += next - *value;
        *value = next;
    }

    fn fold_biography(&mut self, kind: LifeEventKind, severity: f64, rate: f64) {
        let rate = clip01(rate);
        let facet = match kind {
            LifeEventKind::Betrayal => &mut self.biography.betrayal,
            LifeEventKind::Loss => &mut self.biography.loss,
            LifeEventKind::Humiliation => &mut self.biography.humiliation,
            LifeEventKind::Violence => &mut self.biography.violence,
            LifeEventKind::Achievement => &mut self.biography.achievement,
            LifeEventKind::Care => &mut self.biography.care_received,
            LifeEventKind::Upheaval => &mut self.biography.instability,
        };
        *facet = clip01((1.0 - rate) * *facet + rate * severity);
    }
}
