use std::collections::HashMap;

use burn::{
    module::{ModuleVisitor, ParamId},
    prelude::*,
};

#[derive(Clone, Debug, Default)]
pub struct ParameterSnapshot {
    values: HashMap<ParamId, Vec<f32>>,
}

struct SnapshotCollector {
    values: HashMap<ParamId, Vec<f32>>,
}

impl<B: Backend> ModuleVisitor<B> for SnapshotCollector {
    fn visit_float<const D: usize>(&mut self, id: ParamId, tensor: &Tensor<B, D>) {
        self.values
            .insert(id, tensor.to_data().iter::<f32>().collect());
    }
}

impl ParameterSnapshot {
    pub fn of<B: Backend, M: Module<B>>(module: &M) -> Self {
        let mut collector = SnapshotCollector {
            values: HashMap::new(),
        };
        module.visit(&mut collector);
        ParameterSnapshot {
            values: collector.values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn changed(&self, other: &ParameterSnapshot) -> Vec<ParamId> {
        self.values
            .iter()
            .filter(|(id, values)| {
                other
                    .values
                    .get(*id)
                    .is_some_and(|other_values| other_values != *values)
            })
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn max_abs_difference(&self, other: &ParameterSnapshot) -> f32 {
        self.values
            .iter()
            .filter_map(|(id, values)| {
                other
                    .values
                    .get(id)
                    .map(|other_values| (values, other_values))
            })
            .flat_map(|(values, other_values)| values.iter().zip(other_values))
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f32::max)
    }
}
