use burn::prelude::*;

use crate::A2cError;

#[derive(Config)]
pub struct AdvantageObjectiveConfig {
    #[config(default = 0.99)]
    pub discount_factor: f64,
}

impl AdvantageObjectiveConfig {
    pub fn init(&self) -> AdvantageObjective {
        self.assertions();
        AdvantageObjective {
            discount_factor: self.discount_factor,
        }
    }

    fn assertions(&self) {
        assert!(
            0.0 <= self.discount_factor && self.discount_factor <= 1.0,
            "The discount factor should be in the interval [0,1]. got {}",
            self.discount_factor
        )
    }
}

#[derive(Clone, Debug)]
pub struct AdvantageObjective {
    discount_factor: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct OneStepTargets {
    pub value: f64,
    pub advantage: f64,
}

impl AdvantageObjective {
    /// `value_after` is `None` for terminal transitions, which do not bootstrap.
    pub fn targets(
        &self,
        reward: f64,
        value_before: f64,
        value_after: Option<f64>,
    ) -> OneStepTargets {
        let value = match value_after {
            Some(value_after) => reward + self.discount_factor * value_after,
            None => reward,
        };
        OneStepTargets {
            value,
            advantage: value - value_before,
        }
    }
}

impl OneStepTargets {
    /// Actor target: zero everywhere except the taken action, which holds the advantage.
    pub fn policy_target(&self, action: usize, act_dim: usize) -> Result<Vec<f32>, A2cError> {
        if action >= act_dim {
            return Err(A2cError::ActionOutOfRange { action, act_dim });
        }
        let mut target = vec![0.0; act_dim];
        target[action] = self.advantage as f32;
        Ok(target)
    }
}
