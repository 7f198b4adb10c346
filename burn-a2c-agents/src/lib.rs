pub mod a2c;
pub mod checkpoint;
pub mod on_policy;
