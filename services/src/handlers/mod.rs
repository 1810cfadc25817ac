use std::sync::Arc;

use geoalgebra_datatypes::ProjTransformer;
use geoalgebra_operators::GdalSourceResolver;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::config::Settings;
use crate::memo::EvalMemo;
use crate::store::MapStore;

pub mod cache_info;
pub mod export;
pub mod index;
pub mod info;
pub mod map;
pub mod tiles;

/// The wire shape of every error response (spec §6/§7, matching the
/// source's exception handlers' `{code, detail}` JSON body exactly).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct ErrorResponse {
    pub code: u16,
    pub detail: String,
}

/// Wraps a success payload in `{"detail": ...}`, the envelope the
/// source's `/map` and `/info` handlers use (source `app.py`).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Detail<T> {
    pub detail: T,
}

impl<T> Detail<T> {
    pub fn new(detail: T) -> Self {
        Self { detail }
    }
}

/// Shared state every handler reaches through `web::Data`: the map
/// registry, the eval memo, a reusable raster-source resolver and CRS
/// transformer, and the loaded settings.
pub struct AppState {
    pub store: Arc<dyn MapStore>,
    pub memo: EvalMemo,
    pub resolver: GdalSourceResolver,
    pub transformer: ProjTransformer,
    pub settings: Settings,
}

impl AppState {
    pub fn new(store: Arc<dyn MapStore>, settings: Settings) -> Self {
        Self {
            store,
            memo: EvalMemo::new(settings.cache.eval_memo_capacity),
            resolver: GdalSourceResolver,
            transformer: ProjTransformer::default(),
            settings,
        }
    }
}
