use std::marker::PhantomData;

use burn::config::Config;
use burn::module::AutodiffModule;
use burn::optim::Optimizer;
use burn::tensor::backend::AutodiffBackend;
use burn_a2c::data::util::collect_single;
use burn_a2c::environment::Environment;
use burn_a2c::logging::{evaluate_episode, EpisodeStatistics};
use burn_a2c::module::component::{Actor, Regularized, Value};
use burn_a2c::A2cError;
use rand::Rng;
use tqdm::tqdm;
use tracing::{debug, info};

use crate::a2c::A2cAgent;

#[derive(Config)]
pub struct OnPolicyAlgorithmConfig {
    pub training_episodes: usize,
    #[config(default = 500)]
    pub max_episode_steps: usize,
    #[config(default = 50)]
    pub evaluation_interval: usize,
    #[config(default = 100)]
    pub statistics_window: usize,
    #[config(default = 0)]
    pub seed: u64,
}

#[derive(Debug, Default, Clone)]
pub struct TrainingReport {
    pub episode_returns: Vec<f64>,
    pub evaluation_returns: Vec<f64>,
    pub moving_average: Option<f64>,
    pub steps: usize,
}

pub struct OnPolicyAlgorithm<B, E, M, O, R>
where
    B: AutodiffBackend,
    E: Environment,
{
    cfg: OnPolicyAlgorithmConfig,
    env: E,
    eval_env: E,
    agent: A2cAgent<B, M, O, R>,
    statistics: EpisodeStatistics,
    report: TrainingReport,
    seed: Option<u64>,
    _phantom: PhantomData<B>,
}

impl OnPolicyAlgorithmConfig {
    pub fn init<B, E, M, O, R>(
        &self,
        env: E,
        eval_env: E,
        agent: A2cAgent<B, M, O, R>,
    ) -> OnPolicyAlgorithm<B, E, M, O, R>
    where
        B: AutodiffBackend,
        E: Environment,
    {
        assert!(
            self.max_episode_steps > 0,
            "An episode must be allowed at least one step"
        );
        assert!(
            self.evaluation_interval > 0,
            "The evaluation interval must be positive"
        );
        for n_actions in [env.n_actions(), eval_env.n_actions()] {
            assert_eq!(
                n_actions,
                agent.act_dim(),
                "The environment has {} actions but the agent has {}",
                n_actions,
                agent.act_dim()
            );
        }
        OnPolicyAlgorithm {
            cfg: self.clone(),
            env,
            eval_env,
            agent,
            statistics: EpisodeStatistics::new(self.statistics_window),
            report: TrainingReport::default(),
            seed: Some(self.seed),
            _phantom: PhantomData,
        }
    }
}

impl<B, E, M, O, R> OnPolicyAlgorithm<B, E, M, O, R>
where
    B: AutodiffBackend,
    E: Environment,
{
    pub fn agent(&self) -> &A2cAgent<B, M, O, R> {
        &self.agent
    }

    pub fn report(&self) -> &TrainingReport {
        &self.report
    }

    pub fn into_parts(self) -> (A2cAgent<B, M, O, R>, TrainingReport) {
        (self.agent, self.report)
    }
}

impl<B, E, M, O, R> OnPolicyAlgorithm<B, E, M, O, R>
where
    B: AutodiffBackend,
    E: Environment,
    M: AutodiffModule<B> + Actor<B> + Value<B> + Regularized<B>,
    M::InnerModule: Actor<B::InnerBackend> + Value<B::InnerBackend>,
    O: Optimizer<M, B>,
    R: Rng,
{
    /// Plays `training_episodes` more episodes, training on every transition as it happens.
    pub fn train(&mut self) -> Result<(), A2cError> {
        let first_episode = self.report.episode_returns.len();
        for episode in tqdm(first_episode..first_episode + self.cfg.training_episodes) {
            let mut observation = Some(self.env.reset(self.seed.take()));
            let mut episode_return = 0.0;

            for _ in 0..self.cfg.max_episode_steps {
                let transition =
                    collect_single(&mut self.env, observation.take(), &mut |o: &E::O| {
                        self.agent.policy_action(o)
                    })?;
                self.agent.train(&transition)?;
                episode_return += transition.reward;
                self.report.steps += 1;

                if transition.done {
                    break;
                }
                observation = Some(transition.after);
            }

            self.statistics.push(episode_return);
            self.report.episode_returns.push(episode_return);
            self.report.moving_average = self.statistics.moving_average();
            debug!(episode, episode_return, "episode finished");

            if (episode + 1) % self.cfg.evaluation_interval == 0 {
                let evaluation_return = evaluate_episode(
                    &mut self.eval_env,
                    &mut |o: &E::O| self.agent.policy_action(o),
                    self.cfg.seed.wrapping_add(episode as u64),
                    self.cfg.max_episode_steps,
                )?;
                info!(
                    episode = episode + 1,
                    evaluation_return,
                    moving_average = ?self.statistics.moving_average(),
                    best = ?self.statistics.best(),
                    "evaluation"
                );
                self.report.evaluation_returns.push(evaluation_return);
            }
        }

        info!(
            episodes = self.statistics.episodes(),
            steps = self.report.steps,
            moving_average = ?self.report.moving_average,
            "training finished"
        );
        Ok(())
    }
}
