use gym_rs::{
    core::Env,
    envs::classical_control::cartpole::CartPoleEnv,
    utils::renderer::RenderMode,
};

use super::{Done, Environment, Reward};

pub struct GymCartPole {
    env: CartPoleEnv,
}

impl GymCartPole {
    pub const OBSERVATION_DIM: usize = 4;
    pub const N_ACTIONS: usize = 2;

    pub fn new() -> Self {
        GymCartPole {
            env: CartPoleEnv::new(RenderMode::None),
        }
    }
}

impl Default for GymCartPole {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment for GymCartPole {
    type O = Vec<f64>;

    fn n_actions(&self) -> usize {
        Self::N_ACTIONS
    }

    fn reset(&mut self, seed: Option<u64>) -> Self::O {
        let (obs, _) = self.env.reset(seed, false, None);
        Vec::<f64>::from(obs)
    }

    fn step(&mut self, action: usize) -> (Self::O, Reward, Done) {
        let action_reward = self.env.step(action);
        (
            Vec::<f64>::from(action_reward.observation),
            action_reward.reward.into_inner(),
            action_reward.done,
        )
    }
}
