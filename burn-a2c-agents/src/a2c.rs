use std::marker::PhantomData;

use burn::{
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::{backend::AutodiffBackend, ElementConversion},
};
use burn_a2c::{
    data::util::{observation_batch, Transition},
    environment::Observation,
    module::{
        component::{Actor, Regularized, Value},
        exploration::sample_categorical,
        nn::actor_critic::{ActorCritic, ActorCriticConfig},
    },
    objective::{
        advantage::{AdvantageObjective, AdvantageObjectiveConfig, OneStepTargets},
        loss::{policy_cross_entropy, regularized, value_squared_error},
    },
    A2cError,
};
use rand::Rng;
use tracing::debug;

pub const CRITIC_LEARNING_RATE_SCALE: f64 = 5.0;
const ADAM_EPSILON: f32 = 1e-7;

#[derive(Config)]
pub struct A2cAgentConfig {
    pub network: ActorCriticConfig,
    #[config(default = 0.99)]
    pub discount_factor: f64,
    #[config(default = 0.001)]
    pub learning_rate: f64,
    /// Inverse-time decay applied per update: `lr / (1 + decay * updates)`.
    #[config(default = 1e-6)]
    pub learning_rate_decay: f64,
}

impl A2cAgentConfig {
    pub fn init<B, R>(
        &self,
        device: &B::Device,
        rng: R,
    ) -> A2cAgent<B, ActorCritic<B>, impl Optimizer<ActorCritic<B>, B>, R>
    where
        B: AutodiffBackend,
        R: Rng,
    {
        let model = self.network.init(device);
        let actor_optim = AdamConfig::new().with_epsilon(ADAM_EPSILON).init();
        let critic_optim = AdamConfig::new().with_epsilon(ADAM_EPSILON).init();
        A2cAgent::new(model, actor_optim, critic_optim, self.clone(), device, rng)
    }

    pub fn critic_learning_rate(&self) -> f64 {
        self.learning_rate * CRITIC_LEARNING_RATE_SCALE
    }

    fn assertions(&self) {
        assert!(
            self.learning_rate > 0.0,
            "The learning rate should be positive. got {}",
            self.learning_rate
        );
        assert!(
            self.learning_rate_decay >= 0.0,
            "The learning rate decay should be non-negative. got {}",
            self.learning_rate_decay
        );
    }
}

pub fn decayed_learning_rate(learning_rate: f64, decay: f64, updates: usize) -> f64 {
    learning_rate / (1.0 + decay * updates as f64)
}

pub struct A2cAgent<B: AutodiffBackend, M, O, R> {
    pub(crate) model: M,
    actor_optim: O,
    critic_optim: O,
    objective: AdvantageObjective,
    pub(crate) config: A2cAgentConfig,
    act_dim: usize,
    actor_updates: usize,
    critic_updates: usize,
    pub(crate) device: B::Device,
    rng: R,
    _phantom: PhantomData<B>,
}

impl<B: AutodiffBackend, M, O, R> A2cAgent<B, M, O, R> {
    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn config(&self) -> &A2cAgentConfig {
        &self.config
    }

    pub fn act_dim(&self) -> usize {
        self.act_dim
    }

    pub fn actor_updates(&self) -> usize {
        self.actor_updates
    }

    pub fn critic_updates(&self) -> usize {
        self.critic_updates
    }
}

impl<B, M, O, R> A2cAgent<B, M, O, R>
where
    B: AutodiffBackend,
    M: AutodiffModule<B> + Actor<B> + Value<B> + Regularized<B>,
    M::InnerModule: Actor<B::InnerBackend> + Value<B::InnerBackend>,
    O: Optimizer<M, B>,
    R: Rng,
{
    pub fn new(
        model: M,
        actor_optim: O,
        critic_optim: O,
        config: A2cAgentConfig,
        device: &B::Device,
        rng: R,
    ) -> Self {
        config.assertions();
        let objective = AdvantageObjectiveConfig::new()
            .with_discount_factor(config.discount_factor)
            .init();
        Self {
            model,
            actor_optim,
            critic_optim,
            objective,
            act_dim: config.network.act_dim,
            config,
            actor_updates: 0,
            critic_updates: 0,
            device: device.clone(),
            rng,
            _phantom: PhantomData,
        }
    }

    // Inference runs on the inner backend: dropout off, batch norm on running statistics.
    pub fn predict_policy<S: Observation>(&self, state: &S) -> Vec<f32> {
        let observations = observation_batch::<B::InnerBackend, _>(state, &self.device);
        self.model
            .valid()
            .policy_batch(observations)
            .into_data()
            .iter::<f32>()
            .collect()
    }

    pub fn predict_value<S: Observation>(&self, state: &S) -> f32 {
        let observations = observation_batch::<B::InnerBackend, _>(state, &self.device);
        self.model
            .valid()
            .v_batch(observations)
            .into_scalar()
            .elem::<f32>()
    }

    pub fn policy_action<S: Observation>(&mut self, state: &S) -> Result<usize, A2cError> {
        let policy = self.predict_policy(state);
        sample_categorical(&policy, &mut self.rng)
    }

    pub fn fit_actor<S: Observation>(&mut self, state: &S, target: &[f32]) {
        let observations = observation_batch::<B, _>(state, &self.device);
        let target = Tensor::<B, 1>::from_floats(target, &self.device).unsqueeze();
        let loss = policy_cross_entropy(self.model.log_policy_batch(observations), target);
        let loss = regularized(loss, self.model.penalty());

        let learning_rate = decayed_learning_rate(
            self.config.learning_rate,
            self.config.learning_rate_decay,
            self.actor_updates,
        );
        debug!(
            loss = loss.clone().into_scalar().elem::<f64>(),
            learning_rate, "actor update"
        );

        let grads = GradientsParams::from_grads(loss.backward(), &self.model);
        self.model = self
            .actor_optim
            .step(learning_rate, self.model.clone(), grads);
        self.actor_updates += 1;
    }

    pub fn fit_critic<S: Observation>(&mut self, state: &S, target: f32) {
        let observations = observation_batch::<B, _>(state, &self.device);
        let target = Tensor::<B, 1>::from_floats([target], &self.device);
        let loss = value_squared_error(self.model.v_batch(observations), target);
        let loss = regularized(loss, self.model.penalty());

        let learning_rate = decayed_learning_rate(
            self.config.critic_learning_rate(),
            self.config.learning_rate_decay,
            self.critic_updates,
        );
        debug!(
            loss = loss.clone().into_scalar().elem::<f64>(),
            learning_rate, "critic update"
        );

        let grads = GradientsParams::from_grads(loss.backward(), &self.model);
        self.model = self
            .critic_optim
            .step(learning_rate, self.model.clone(), grads);
        self.critic_updates += 1;
    }

    pub fn training_targets<S: Observation>(
        &self,
        transition: &Transition<S>,
    ) -> Result<(OneStepTargets, Vec<f32>), A2cError> {
        let value_before = self.predict_value(&transition.before) as f64;
        let value_after = match transition.done {
            true => None,
            false => Some(self.predict_value(&transition.after) as f64),
        };
        let targets = self
            .objective
            .targets(transition.reward, value_before, value_after);
        let policy_target = targets.policy_target(transition.action, self.act_dim)?;
        debug!(
            reward = transition.reward,
            done = transition.done,
            value_before,
            value_target = targets.value,
            advantage = targets.advantage,
            "a2c targets"
        );
        Ok((targets, policy_target))
    }

    // Targets are validated before any parameter moves.
    pub fn train<S: Observation>(&mut self, transition: &Transition<S>) -> Result<(), A2cError> {
        let (targets, policy_target) = self.training_targets(transition)?;
        self.fit_actor(&transition.before, &policy_target);
        self.fit_critic(&transition.before, targets.value as f32);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use burn::backend::{Autodiff, NdArray};
    use burn_a2c::module::nn::{
        feature_extractor::FeatureExtractorConfig, snapshot::ParameterSnapshot,
    };
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;

    type B = Autodiff<NdArray>;

    fn flat_config() -> A2cAgentConfig {
        A2cAgentConfig::new(ActorCriticConfig::new(FeatureExtractorConfig::flat(4), 3))
    }

    fn flat_agent(
        seed: u64,
    ) -> A2cAgent<B, ActorCritic<B>, impl Optimizer<ActorCritic<B>, B>, StdRng> {
        flat_config().init::<B, _>(&Default::default(), StdRng::seed_from_u64(seed))
    }

    const STATE: [f32; 4] = [0.3, -0.7, 1.2, 0.05];
    const NEXT_STATE: [f32; 4] = [0.25, -0.5, 1.0, 0.1];

    fn transition(action: usize, reward: f64, done: bool) -> Transition<[f32; 4]> {
        Transition {
            before: STATE,
            action,
            after: NEXT_STATE,
            reward,
            done,
        }
    }

    #[test]
    fn test_predictions() {
        let agent = flat_agent(0);
        let policy = agent.predict_policy(&STATE);
        assert_eq!(policy.len(), 3);
        assert!(policy.iter().all(|p| *p >= 0.0));
        assert!((policy.iter().sum::<f32>() - 1.0).abs() < 1e-5);
        assert!(agent.predict_value(&STATE).is_finite());

        assert_eq!(policy, agent.predict_policy(&STATE));
        assert_eq!(agent.predict_value(&STATE), agent.predict_value(&STATE));
    }

    #[test]
    fn test_policy_action() {
        let mut agent = flat_agent(0);
        for _ in 0..50 {
            assert!(agent.policy_action(&STATE).unwrap() < 3);
        }

        // Network initialization does not depend on the agent's sampler.
        let template = flat_agent(0);
        let actions = |seed| {
            let mut agent = A2cAgent::new(
                template.model().clone(),
                AdamConfig::new().init::<B, ActorCritic<B>>(),
                AdamConfig::new().init::<B, ActorCritic<B>>(),
                flat_config(),
                &Default::default(),
                StdRng::seed_from_u64(seed),
            );
            let mut rng = StdRng::seed_from_u64(seed);
            let mut agent_actions = Vec::new();
            for _ in 0..20 {
                let state = [rng.gen(), rng.gen(), rng.gen(), rng.gen()];
                agent_actions.push(agent.policy_action::<[f32; 4]>(&state).unwrap());
            }
            agent_actions
        };
        assert_eq!(actions(3), actions(3));
    }

    #[test]
    fn test_fit_actor_moves_shared_trunk_only_with_actor_head() {
        let mut agent = flat_agent(1);
        let trunk = ParameterSnapshot::of(agent.model().trunk());
        let actor = ParameterSnapshot::of(agent.model().actor_head());
        let critic = ParameterSnapshot::of(agent.model().critic_head());
        let value = agent.predict_value(&STATE);

        agent.fit_actor(&STATE, &[0.0, 1.0, 0.0]);

        assert!(!ParameterSnapshot::of(agent.model().trunk()).changed(&trunk).is_empty());
        assert!(!ParameterSnapshot::of(agent.model().actor_head()).changed(&actor).is_empty());
        assert!(ParameterSnapshot::of(agent.model().critic_head()).changed(&critic).is_empty());
        // The critic reads the updated trunk.
        assert_ne!(agent.predict_value(&STATE), value);
        assert_eq!(agent.actor_updates(), 1);
        assert_eq!(agent.critic_updates(), 0);
    }

    #[test]
    fn test_fit_critic_moves_shared_trunk_only_with_critic_head() {
        let mut agent = flat_agent(2);
        let trunk = ParameterSnapshot::of(agent.model().trunk());
        let actor = ParameterSnapshot::of(agent.model().actor_head());
        let critic = ParameterSnapshot::of(agent.model().critic_head());
        let policy = agent.predict_policy(&STATE);

        agent.fit_critic(&STATE, 10.0);

        assert!(!ParameterSnapshot::of(agent.model().trunk()).changed(&trunk).is_empty());
        assert!(ParameterSnapshot::of(agent.model().actor_head()).changed(&actor).is_empty());
        assert!(!ParameterSnapshot::of(agent.model().critic_head()).changed(&critic).is_empty());
        assert_ne!(agent.predict_policy(&STATE), policy);
        assert_eq!(agent.critic_updates(), 1);
    }

    // Adam's first step moves every parameter with a non-negligible gradient by about the learning rate.
    #[test]
    fn test_first_step_sizes_follow_learning_rates() {
        let mut agent = flat_agent(9);
        let actor = ParameterSnapshot::of(agent.model().actor_head());
        agent.fit_actor(&STATE, &[0.0, 0.0, 1.0]);
        let actor_step =
            ParameterSnapshot::of(agent.model().actor_head()).max_abs_difference(&actor);
        assert!((actor_step - 0.001).abs() < 2e-5, "actor step {actor_step}");

        let mut agent = flat_agent(9);
        let critic = ParameterSnapshot::of(agent.model().critic_head());
        agent.fit_critic(&STATE, 10.0);
        let critic_step =
            ParameterSnapshot::of(agent.model().critic_head()).max_abs_difference(&critic);
        assert!((critic_step - 0.005).abs() < 1e-4, "critic step {critic_step}");
    }

    #[test]
    fn test_decayed_learning_rate_reaches_optimizer() {
        let mut agent = flat_config()
            .with_learning_rate_decay(1e6)
            .init::<B, _>(&Default::default(), StdRng::seed_from_u64(10));
        let before = ParameterSnapshot::of(agent.model());
        agent.fit_actor(&STATE, &[1.0, 0.0, 0.0]);
        agent.fit_critic(&STATE, 1.0);
        let after_first = ParameterSnapshot::of(agent.model());
        assert!(after_first.max_abs_difference(&before) > 1e-4);

        // Second updates run at roughly 1e-9.
        agent.fit_actor(&STATE, &[1.0, 0.0, 0.0]);
        agent.fit_critic(&STATE, 1.0);
        assert!(ParameterSnapshot::of(agent.model()).max_abs_difference(&after_first) < 1e-6);
    }

    #[test]
    fn test_fit_critic_approaches_target() {
        let mut agent = flat_agent(3);
        let target = 5.0;
        let initial_error = (agent.predict_value(&STATE) - target).abs();
        for _ in 0..30 {
            agent.fit_critic(&STATE, target);
        }
        assert!((agent.predict_value(&STATE) - target).abs() < initial_error);
    }

    #[test]
    fn test_positive_advantage_reinforces_action() {
        let mut agent = flat_agent(4);
        let initial = agent.predict_policy(&STATE)[2];
        for _ in 0..20 {
            agent.fit_actor(&STATE, &[0.0, 0.0, 1.0]);
        }
        assert!(agent.predict_policy(&STATE)[2] > initial);
    }

    #[test]
    fn test_terminal_targets_do_not_bootstrap() {
        let agent = flat_agent(5);
        let value_before = agent.predict_value(&STATE) as f64;
        let (targets, policy_target) = agent.training_targets(&transition(1, 1.0, true)).unwrap();
        assert_eq!(targets.value, 1.0);
        assert!((targets.advantage - (1.0 - value_before)).abs() < 1e-9);
        assert_eq!(policy_target[0], 0.0);
        assert_eq!(policy_target[2], 0.0);
        assert!((policy_target[1] as f64 - (1.0 - value_before)).abs() < 1e-6);
    }

    #[test]
    fn test_bootstrapped_targets() {
        let agent = flat_agent(6);
        let value_before = agent.predict_value(&STATE) as f64;
        let value_after = agent.predict_value(&NEXT_STATE) as f64;
        let (targets, policy_target) = agent.training_targets(&transition(0, 0.0, false)).unwrap();
        assert!((targets.value - 0.99 * value_after).abs() < 1e-9);
        assert!((targets.advantage - (0.99 * value_after - value_before)).abs() < 1e-9);
        assert_eq!(&policy_target[1..], &[0.0, 0.0]);
    }

    #[test]
    fn test_train_updates_both_heads() {
        let mut agent = flat_agent(7);
        let trunk = ParameterSnapshot::of(agent.model().trunk());
        agent.train(&transition(2, 1.0, false)).unwrap();
        assert_eq!(agent.actor_updates(), 1);
        assert_eq!(agent.critic_updates(), 1);
        assert!(!ParameterSnapshot::of(agent.model().trunk()).changed(&trunk).is_empty());
    }

    #[test]
    fn test_rejected_transition_leaves_agent_intact() {
        let mut agent = flat_agent(8);
        let parameters = ParameterSnapshot::of(agent.model());
        let policy = agent.predict_policy(&STATE);

        assert!(matches!(
            agent.train(&transition(3, 1.0, true)),
            Err(A2cError::ActionOutOfRange {
                action: 3,
                act_dim: 3
            })
        ));
        assert!(ParameterSnapshot::of(agent.model()).changed(&parameters).is_empty());
        assert_eq!(agent.predict_policy(&STATE), policy);
        assert_eq!(agent.actor_updates(), 0);
        assert_eq!(agent.critic_updates(), 0);

        agent.train(&transition(2, 1.0, true)).unwrap();
        assert_eq!(agent.actor_updates(), 1);
        assert!(!ParameterSnapshot::of(agent.model()).changed(&parameters).is_empty());
    }

    #[test]
    fn test_image_agent() {
        let config = A2cAgentConfig::new(ActorCriticConfig::new(
            FeatureExtractorConfig::image(2, 8, 8),
            4,
        ));
        let mut agent = config.init::<B, _>(&Default::default(), StdRng::seed_from_u64(0));
        let mut rng = StdRng::seed_from_u64(0);
        let state: Vec<f32> = (0..128).map(|_| rng.gen()).collect();
        let next_state: Vec<f32> = (0..128).map(|_| rng.gen()).collect();

        let policy = agent.predict_policy(&state);
        assert_eq!(policy.len(), 4);
        assert!((policy.iter().sum::<f32>() - 1.0).abs() < 1e-5);
        assert_eq!(policy, agent.predict_policy(&state));

        let trunk = ParameterSnapshot::of(agent.model().trunk());
        agent
            .train(&Transition {
                before: state.clone(),
                action: 3,
                after: next_state,
                reward: -1.0,
                done: false,
            })
            .unwrap();
        assert!(!ParameterSnapshot::of(agent.model().trunk()).changed(&trunk).is_empty());
        assert!(agent.predict_value(&state).is_finite());
    }

    #[test]
    fn test_decayed_learning_rate() {
        assert_eq!(decayed_learning_rate(0.001, 1e-6, 0), 0.001);
        assert!((decayed_learning_rate(0.001, 1e-6, 1_000_000) - 0.0005).abs() < 1e-12);
        assert_eq!(decayed_learning_rate(0.01, 0.0, 42), 0.01);
        assert_eq!(flat_config().critic_learning_rate(), 0.005);
    }

    #[test]
    #[should_panic(expected = "The learning rate should be positive")]
    fn test_learning_rate_assertion() {
        flat_config()
            .with_learning_rate(0.0)
            .init::<B, _>(&Default::default(), StdRng::seed_from_u64(0));
    }

    #[test]
    #[should_panic(expected = "The discount factor should be in the interval [0,1]")]
    fn test_discount_factor_assertion() {
        flat_config()
            .with_discount_factor(-0.1)
            .init::<B, _>(&Default::default(), StdRng::seed_from_u64(0));
    }
}
