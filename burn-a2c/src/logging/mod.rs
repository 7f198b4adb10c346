use ringbuffer::{AllocRingBuffer, RingBuffer};

use crate::environment::Environment;

pub fn evaluate_episode<E, P, Err>(
    env: &mut E,
    policy: &mut P,
    seed: u64,
    max_steps: usize,
) -> Result<f64, Err>
where
    E: Environment,
    P: FnMut(&E::O) -> Result<usize, Err>,
{
    let mut episode_reward = 0.0;
    let mut before = env.reset(Some(seed));
    for _ in 0..max_steps {
        let action = policy(&before)?;
        let (after, reward, done) = env.step(action);
        episode_reward += reward;
        if done {
            break;
        }
        before = after;
    }
    Ok(episode_reward)
}

pub struct EpisodeStatistics {
    window: AllocRingBuffer<f64>,
    episodes: usize,
    last: Option<f64>,
    best: Option<f64>,
}

impl EpisodeStatistics {
    pub fn new(window: usize) -> Self {
        assert!(window > 0, "The statistics window must hold at least one episode");
        EpisodeStatistics {
            window: AllocRingBuffer::new(window),
            episodes: 0,
            last: None,
            best: None,
        }
    }

    pub fn push(&mut self, episode_return: f64) {
        self.window.push(episode_return);
        self.episodes += 1;
        self.last = Some(episode_return);
        self.best = Some(match self.best {
            Some(best) if best >= episode_return => best,
            _ => episode_return,
        });
    }

    pub fn episodes(&self) -> usize {
        self.episodes
    }

    pub fn last(&self) -> Option<f64> {
        self.last
    }

    pub fn best(&self) -> Option<f64> {
        self.best
    }

    pub fn moving_average(&self) -> Option<f64> {
        match self.window.len() {
            0 => None,
            n => Some(self.window.iter().sum::<f64>() / n as f64),
        }
    }
}
