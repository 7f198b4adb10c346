use rand::{
    distributions::{Distribution, WeightedIndex},
    Rng,
};

use crate::A2cError;

/// Draws one action index from the categorical distribution `probabilities`.
pub fn sample_categorical<R: Rng + ?Sized>(
    probabilities: &[f32],
    rng: &mut R,
) -> Result<usize, A2cError> {
    let distribution = WeightedIndex::new(probabilities)?;
    Ok(distribution.sample(rng))
}
