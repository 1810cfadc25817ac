use serde::Deserialize;

use crate::error::Result;

/// Server settings, loaded from `config/default.toml`, an optional
/// `config/{RUN_MODE}.toml` overlay, and `GEOALGEBRA_*` environment
/// variables, in that order (later sources win).
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub web: Web,
    pub cache: Cache,
    #[serde(default)]
    pub export: Export,
    #[serde(default)]
    pub redis: Option<Redis>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Web {
    pub bind_address: String,
    pub external_address: Option<String>,
    pub tile_size: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Cache {
    pub eval_memo_capacity: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Redis {
    pub url: String,
}

/// Export-window streaming settings (spec §4.6): the edge length, in
/// pixels, of each window `export_to_cog` materializes and writes at a
/// time.
#[derive(Debug, Clone, Deserialize)]
pub struct Export {
    #[serde(default = "default_export_window_edge")]
    pub export_window_edge: i64,
}

fn default_export_window_edge() -> i64 {
    4096
}

impl Default for Export {
    fn default() -> Self {
        Self {
            export_window_edge: default_export_window_edge(),
        }
    }
}

impl Settings {
    pub fn new() -> Result<Self> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "default".to_string());

        let settings = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("geoalgebra").separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// The address tile/export URLs handed back to clients should point
    /// at, defaulting to `web.bind_address` when no external address is
    /// configured (e.g. behind no reverse proxy).
    pub fn public_address(&self) -> &str {
        self.web
            .external_address
            .as_deref()
            .unwrap_or(&self.web.bind_address)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            web: Web {
                bind_address: "127.0.0.1:3030".to_string(),
                external_address: None,
                tile_size: 256,
            },
            cache: Cache {
                eval_memo_capacity: 64,
            },
            export: Export::default(),
            redis: None,
        }
    }
}
