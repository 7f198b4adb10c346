use std::fs;
use std::path::Path;

use burn::config::Config;
use burn::module::AutodiffModule;
use burn::optim::Optimizer;
use burn::record::{FullPrecisionSettings, NamedMpkFileRecorder};
use burn::tensor::backend::AutodiffBackend;
use burn_a2c::module::component::{Actor, Regularized, Value};
use burn_a2c::A2cError;
use rand::Rng;
use tracing::info;

use crate::a2c::{A2cAgent, A2cAgentConfig};

const CONFIG_FILE: &str = "config.json";
// The recorder appends the `.mpk` extension.
const MODEL_FILE: &str = "model";

fn recorder() -> NamedMpkFileRecorder<FullPrecisionSettings> {
    NamedMpkFileRecorder::new()
}

pub fn load_config<P: AsRef<Path>>(directory: P) -> Result<A2cAgentConfig, A2cError> {
    Ok(A2cAgentConfig::load(directory.as_ref().join(CONFIG_FILE))?)
}

impl<B, M, O, R> A2cAgent<B, M, O, R>
where
    B: AutodiffBackend,
    M: AutodiffModule<B> + Actor<B> + Value<B> + Regularized<B>,
    M::InnerModule: Actor<B::InnerBackend> + Value<B::InnerBackend>,
    O: Optimizer<M, B>,
    R: Rng,
{
    // Optimizer moments and update counters are not stored.
    pub fn save<P: AsRef<Path>>(&self, directory: P) -> Result<(), A2cError> {
        let directory = directory.as_ref();
        fs::create_dir_all(directory)?;
        self.config.save(directory.join(CONFIG_FILE))?;
        self.model
            .clone()
            .save_file(directory.join(MODEL_FILE), &recorder())?;
        info!(directory = %directory.display(), "saved checkpoint");
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(&mut self, directory: P) -> Result<(), A2cError> {
        let directory = directory.as_ref();
        self.model = self.model.clone().load_file(
            directory.join(MODEL_FILE),
            &recorder(),
            &self.device,
        )?;
        info!(directory = %directory.display(), "loaded checkpoint");
        Ok(())
    }
}
