pub type Reward = f64;
pub type Done = bool;

pub trait Environment {
    type O: Observation;

    fn n_actions(&self) -> usize;

    fn reset(&mut self, seed: Option<u64>) -> Self::O;

    fn step(&mut self, action: usize) -> (Self::O, Reward, Done);
}

pub trait Observation: Clone {
    fn features(&self) -> Vec<f32>;
}

impl Observation for Vec<f32> {
    fn features(&self) -> Vec<f32> {
        self.clone()
    }
}

impl Observation for Vec<f64> {
    fn features(&self) -> Vec<f32> {
        self.iter().map(|x| *x as f32).collect()
    }
}

impl<const N: usize> Observation for [f32; N] {
    fn features(&self) -> Vec<f32> {
        self.to_vec()
    }
}

pub mod gym_rs;
