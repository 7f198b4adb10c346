use burn::{
    nn::loss::{MseLoss, Reduction},
    prelude::*,
};

/// Categorical cross-entropy `-Σ target_i · log π_i`, averaged over the batch.
pub fn policy_cross_entropy<B: Backend>(
    log_policy: Tensor<B, 2>,
    target: Tensor<B, 2>,
) -> Tensor<B, 1> {
    (target * log_policy).sum_dim(1).neg().mean()
}

pub fn value_squared_error<B: Backend>(value: Tensor<B, 1>, target: Tensor<B, 1>) -> Tensor<B, 1> {
    MseLoss::new().forward(value, target, Reduction::Mean)
}

pub fn regularized<B: Backend>(loss: Tensor<B, 1>, penalty: Option<Tensor<B, 1>>) -> Tensor<B, 1> {
    match penalty {
        Some(penalty) => loss + penalty,
        None => loss,
    }
}
