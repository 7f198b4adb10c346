use burn::nn::{Initializer, Linear, LinearConfig};
use burn::prelude::*;
use burn::tensor::activation::{log_softmax, softmax};

use super::feature_extractor::{FeatureExtractor, FeatureExtractorConfig};
use crate::module::component::{Actor, Regularized, Value};

#[derive(Config, Debug)]
pub struct ActorCriticConfig {
    pub extractor: FeatureExtractorConfig,
    pub act_dim: usize,
}

impl ActorCriticConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> ActorCritic<B> {
        assert!(
            self.act_dim > 0,
            "Unable to construct actor-critic. The action set must not be empty"
        );
        let features = self.extractor.output_dim();
        ActorCritic {
            trunk: self.extractor.init(device),
            actor: create_head(features, self.act_dim, device),
            critic: create_head(features, 1, device),
            act_dim: self.act_dim,
        }
    }
}

fn create_head<B: Backend>(input_size: usize, output_size: usize, device: &B::Device) -> Linear<B> {
    LinearConfig::new(input_size, output_size)
        .with_initializer(Initializer::XavierUniform { gain: 1.0 })
        .init(device)
}

#[derive(Module, Debug)]
pub struct ActorCritic<B: Backend> {
    trunk: FeatureExtractor<B>,
    actor: Linear<B>,
    critic: Linear<B>,
    act_dim: usize,
}

impl<B: Backend> ActorCritic<B> {
    pub fn act_dim(&self) -> usize {
        self.act_dim
    }

    pub fn trunk(&self) -> &FeatureExtractor<B> {
        &self.trunk
    }

    pub fn actor_head(&self) -> &Linear<B> {
        &self.actor
    }

    pub fn critic_head(&self) -> &Linear<B> {
        &self.critic
    }
}

impl<B: Backend> Actor<B> for ActorCritic<B> {
    fn policy_batch(&self, observations: Tensor<B, 2>) -> Tensor<B, 2> {
        softmax(self.actor.forward(self.trunk.forward(observations)), 1)
    }

    fn log_policy_batch(&self, observations: Tensor<B, 2>) -> Tensor<B, 2> {
        log_softmax(self.actor.forward(self.trunk.forward(observations)), 1)
    }
}

impl<B: Backend> Value<B> for ActorCritic<B> {
    fn v_batch(&self, observations: Tensor<B, 2>) -> Tensor<B, 1> {
        self.critic
            .forward(self.trunk.forward(observations))
            .squeeze(1)
    }
}

impl<B: Backend> Regularized<B> for ActorCritic<B> {
    fn penalty(&self) -> Option<Tensor<B, 1>> {
        self.trunk.penalty()
    }
}
