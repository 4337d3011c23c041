// cm_slot.rs — the currently loaded map
//
// A map change builds the replacement completely before it is published.
// Readers clone the Arc and keep tracing against the model they got, even
// if a new map is swapped in meanwhile.

use std::sync::Arc;

use log::{debug, info};
use parking_lot::RwLock;
use qclip_common::qfiles::LumpData;

use crate::cmodel::CollisionModel;
use crate::config::CmodelConfig;
use crate::error::CmodelError;

#[derive(Debug, Clone)]
pub struct LoadedMap {
    pub name: String,
    pub model: Arc<CollisionModel>,
}

/// Holds at most one loaded map and swaps it atomically.
#[derive(Debug, Default)]
pub struct MapSlot {
    current: RwLock<Option<LoadedMap>>,
}

impl MapSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds `lumps` and makes it the current map.
    ///
    /// On error the previous map stays loaded. Loading the same name with
    /// an identical model keeps the existing instance.
    pub fn load(
        &self,
        name: &str,
        lumps: &LumpData,
        config: &CmodelConfig,
    ) -> Result<Arc<CollisionModel>, CmodelError> {
        let model = CollisionModel::build_with_config(lumps, config)?;

        let mut current = self.current.write();
        if let Some(loaded) = current.as_ref() {
            if loaded.name == name && loaded.model.checksum() == model.checksum() {
                debug!("CM_LoadMap: {} unchanged, keeping loaded model", name);
                return Ok(Arc::clone(&loaded.model));
            }
        }

        let model = Arc::new(model);
        info!(
            "CM_LoadMap: {} loaded ({} brushes, checksum {:08x})",
            name,
            model.brushes().len(),
            model.checksum()
        );
        *current = Some(LoadedMap {
            name: name.to_string(),
            model: Arc::clone(&model),
        });
        Ok(model)
    }

    pub fn current(&self) -> Option<Arc<CollisionModel>> {
        self.current.read().as_ref().map(|m| Arc::clone(&m.model))
    }

    pub fn current_name(&self) -> Option<String> {
        self.current.read().as_ref().map(|m| m.name.clone())
    }

    /// Drops the slot's reference to the current map.
    pub fn unload(&self) {
        if let Some(old) = self.current.write().take() {
            info!("CM_LoadMap: {} unloaded", old.name);
        }
    }
}
