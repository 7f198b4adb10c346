pub mod actor_critic;
pub mod feature_extractor;
pub mod snapshot;
