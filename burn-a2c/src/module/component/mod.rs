mod abc;

pub use abc::{Actor, Regularized, Value};
