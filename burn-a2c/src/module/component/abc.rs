use burn::{prelude::Backend, tensor::Tensor};

pub trait Actor<B: Backend> {
    fn policy_batch(&self, observations: Tensor<B, 2>) -> Tensor<B, 2>;

    fn log_policy_batch(&self, observations: Tensor<B, 2>) -> Tensor<B, 2>;
}

pub trait Value<B: Backend> {
    fn v_batch(&self, observations: Tensor<B, 2>) -> Tensor<B, 1>;
}

pub trait Regularized<B: Backend> {
    fn penalty(&self) -> Option<Tensor<B, 1>>;
}
