//! Cognitive distortions and coping styles, derived on demand from traits,
//! biography, trauma and worldview. Nothing here is persisted.

use contracts::{BiographyLatent, TraitParams, TraumaLoad, Worldview};

use crate::numeric::clip01;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CopingProfile {
    pub avoidance: f64,
    pub hyper_control: f64,
    pub aggression: f64,
    pub self_harm: f64,
    pub helper: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DistortionProfile {
    pub trust_bias: f64,
    pub threat_bias: f64,
    pub self_blame: f64,
    pub control_illusion: f64,
    pub black_white: f64,
    pub catastrophizing: f64,
    pub discount_positive: f64,
    pub personalization: f64,
    pub mind_reading: f64,
    pub coping: CopingProfile,
}

impl DistortionProfile {
    pub fn derive(
        traits: &TraitParams,
        biography: &BiographyLatent,
        trauma: &TraumaLoad,
        worldview: &Worldview,
    ) -> Self {
        let t = traits;
        let b = biography;
        let w = worldview;

        let resilience = clip01(
            0.5 * (1.0 - t.neuroticism) + 0.3 * b.care_received + 0.2 * b.achievement,
        );

        let coping = CopingProfile {
            avoidance: clip01(
                0.4 * t.neuroticism
                    + 0.3 * (1.0 - t.assertiveness)
                    + 0.2 * trauma.max_domain()
                    + 0.1 * b.loss,
            ),
            hyper_control: clip01(
                0.45 * t.conscientiousness
                    + 0.25 * b.instability
                    + 0.2 * trauma.world
                    + 0.1 * t.paranoia,
            ),
            aggression: clip01(
                0.35 * (1.0 - t.agreeableness)
                    + 0.25 * t.impulsivity
                    + 0.2 * b.violence
                    + 0.2 * trauma.others,
            ),
            self_harm: clip01(
                0.1 + 0.4 * trauma.self_image + 0.3 * b.humiliation + 0.2 * t.neuroticism
                    - 0.5 * resilience,
            ),
            helper: clip01(
                0.45 * t.empathy
                    + 0.25 * t.agreeableness
                    + 0.2 * b.care_received
                    + 0.1 * trauma.others,
            ),
        };

        Self {
            trust_bias: clip01(
                0.5 * t.paranoia + 0.35 * b.betrayal + 0.25 * (1.0 - w.people_trust)
                    - 0.2 * t.trust_propensity,
            ),
            threat_bias: clip01(
                0.4 * t.neuroticism
                    + 0.3 * b.violence
                    + 0.3 * (1.0 - w.benevolence)
                    + 0.2 * t.paranoia
                    - 0.2,
            ),
            self_blame: clip01(
                0.4 * t.neuroticism
                    + 0.35 * b.humiliation
                    + 0.2 * b.loss
                    + 0.2 * trauma.self_image
                    + 0.1 * t.conscientiousness
                    - 0.2 * b.care_received,
            ),
            control_illusion: clip01(
                0.3 * t.assertiveness
                    + 0.3 * w.controllability
                    + 0.2 * t.ambition
                    + 0.2 * b.instability
                    - 0.1 * b.loss,
            ),
            black_white: clip01(
                0.35 * (1.0 - t.openness)
                    + 0.25 * t.paranoia
                    + 0.2 * trauma.system
                    + 0.15 * trauma.others
                    + 0.15 * t.impulsivity
                    - 0.1,
            ),
            catastrophizing: clip01(
                0.45 * t.neuroticism
                    + 0.25 * trauma.world
                    + 0.2 * b.instability
                    + 0.2 * (1.0 - w.controllability)
                    - 0.1,
            ),
            discount_positive: clip01(
                0.35 * t.neuroticism + 0.25 * b.humiliation + 0.2 * trauma.self_image
                    - 0.3 * b.achievement
                    + 0.1 * (1.0 - w.fairness),
            ),
            personalization: clip01(
                0.3 * t.neuroticism
                    + 0.3 * t.paranoia
                    + 0.2 * trauma.self_image
                    + 0.2 * b.humiliation
                    - 0.1,
            ),
            mind_reading: clip01(
                0.35 * t.paranoia
                    + 0.25 * (1.0 - t.openness)
                    + 0.2 * b.betrayal
                    + 0.2 * trauma.others
                    - 0.1,
            ),
            coping,
        }
    }

    /// Mean of the nine distortion scores.
    pub fn load(&self) -> f64 {
        (self.trust_bias
            + self.threat_bias
            + self.self_blame
            + self.control_illusion
            + self.black_white
            + self.catastrophizing
            + self.discount_positive
            + self.personalization
            + self.mind_reading)
            / 9.0
    }
}
