use std::path::PathBuf;

use anyhow::{Context, Result};
use burn::{
    backend::{Autodiff, NdArray},
    prelude::*,
};
use burn_a2c::{
    environment::gym_rs::GymCartPole,
    module::nn::{actor_critic::ActorCriticConfig, feature_extractor::FeatureExtractorConfig},
};
use burn_a2c_agents::{
    a2c::A2cAgentConfig, checkpoint::load_config, on_policy::OnPolicyAlgorithmConfig,
};
use clap::Parser;
use rand::{rngs::StdRng, SeedableRng};
use tracing::info;

/// Train an online advantage actor-critic agent on CartPole.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    #[arg(long, default_value_t = 500)]
    episodes: usize,
    #[arg(long, default_value_t = 500)]
    max_episode_steps: usize,
    #[arg(long, default_value_t = 0.99)]
    discount_factor: f64,
    /// Actor learning rate; the critic uses five times this value.
    #[arg(long, default_value_t = 0.001)]
    learning_rate: f64,
    #[arg(long, default_value_t = 50)]
    evaluation_interval: usize,
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Directory the trained agent is written to.
    #[arg(long)]
    checkpoint: Option<PathBuf>,
    /// Continue from the agent stored in `--checkpoint`.
    #[arg(long, requires = "checkpoint")]
    resume: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();
    info!("Running Advantage Actor-Critic Agent");

    type B = Autodiff<NdArray>;
    let device: &Device<B> = &Default::default();

    let config = match (&args.checkpoint, args.resume) {
        (Some(checkpoint), true) => load_config(checkpoint)
            .with_context(|| format!("reading config from {}", checkpoint.display()))?,
        _ => A2cAgentConfig::new(ActorCriticConfig::new(
            FeatureExtractorConfig::flat(GymCartPole::OBSERVATION_DIM),
            GymCartPole::N_ACTIONS,
        ))
        .with_discount_factor(args.discount_factor)
        .with_learning_rate(args.learning_rate),
    };
    let mut agent = config.init::<B, _>(device, StdRng::seed_from_u64(args.seed));
    if let (Some(checkpoint), true) = (&args.checkpoint, args.resume) {
        agent
            .load(checkpoint)
            .with_context(|| format!("loading agent from {}", checkpoint.display()))?;
    }

    let mut algorithm = OnPolicyAlgorithmConfig::new(args.episodes)
        .with_max_episode_steps(args.max_episode_steps)
        .with_evaluation_interval(args.evaluation_interval)
        .with_seed(args.seed)
        .init(GymCartPole::new(), GymCartPole::new(), agent);
    let result = algorithm.train();
    let (agent, report) = algorithm.into_parts();
    // The agent survives a failed run, so its progress is still written out.
    if let Some(checkpoint) = &args.checkpoint {
        agent
            .save(checkpoint)
            .with_context(|| format!("saving agent to {}", checkpoint.display()))?;
    }
    result.context("training failed")?;
    info!(
        steps = report.steps,
        moving_average = ?report.moving_average,
        evaluations = ?report.evaluation_returns,
        "done"
    );
    Ok(())
}
