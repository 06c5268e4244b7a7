use scada_common::RunId;
use scada_kernel::{Plant, StepReport};
use scada_layout::Layout;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::ServerConfig;
use crate::error::ServerError;

/// Shared handler state: the live plant behind a lock, plus the layout it
/// was built from (for the fields the simulation does not own).
#[derive(Clone)]
pub struct AppState {
    pub(crate) plant: Arc<RwLock<Plant>>,
    pub(crate) layout: Arc<Layout>,
    pub(crate) run_id: RunId,
    pub(crate) fingerprint: Arc<str>,
}

impl AppState {
    pub fn new(layout: Layout, config: &ServerConfig) -> Result<Self, ServerError> {
        let seed = config.resolve_seed();
        let plant = layout
            .build_plant(config.sim_params(), seed)?
            .with_event_capacity(config.event_capacity);
        let fingerprint = layout.fingerprint()?;
        let run_id = RunId::new();
        tracing::info!(%run_id, seed, layout = %fingerprint, "simulation run created");
        Ok(Self {
            plant: Arc::new(RwLock::new(plant)),
            layout: Arc::new(layout),
            run_id,
            fingerprint: fingerprint.into(),
        })
    }

    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    /// Advance the plant one tick.
    pub async fn step(&self) -> StepReport {
        let mut plant = match self.plant.try_write() {
            Ok(plant) => plant,
            Err(_) => {
                tracing::trace!("plant lock contended, waiting");
                self.plant.write().await
            }
        };
        plant.step()
    }

    /// Run `f` against a read-locked plant.
    pub async fn read<T>(&self, f: impl FnOnce(&Plant) -> T) -> T {
        let plant = self.plant.read().await;
        f(&plant)
    }
}
