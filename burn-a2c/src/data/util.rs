use burn::{prelude::Backend, tensor::Tensor};

use crate::environment::{Environment, Observation};

#[derive(Clone, Debug)]
pub struct Transition<O> {
    pub before: O,
    pub action: usize,
    pub after: O,
    pub reward: f64,
    pub done: bool,
}

pub fn collect_single<E, P, Err>(
    env: &mut E,
    observation: Option<E::O>,
    policy: &mut P,
) -> Result<Transition<E::O>, Err>
where
    E: Environment,
    P: FnMut(&E::O) -> Result<usize, Err>,
{
    let before = match observation {
        Some(observation) => observation,
        None => env.reset(None),
    };
    let action = policy(&before)?;
    let (after, reward, done) = env.step(action);
    Ok(Transition {
        before,
        action,
        after,
        reward,
        done,
    })
}

pub fn observation_batch<B: Backend, O: Observation>(
    observation: &O,
    device: &B::Device,
) -> Tensor<B, 2> {
    let features = observation.features();
    Tensor::<B, 1>::from_floats(features.as_slice(), device).unsqueeze()
}
