// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

pub mod catalog;
pub mod chain;
pub mod config;
pub mod focus;
pub mod geo;
pub mod rank;
pub mod render;
pub mod session;

use std::path::PathBuf;
use thiserror::Error;

pub use catalog::{Catalog, CatalogDocument, Target, TargetRecord};
pub use chain::{Chain, ChainSelector, ChainState, NodeRef};
pub use config::{ConfigManager, HeadingMode, HudConfig};
pub use focus::FocusController;
pub use geo::GeoPoint;
pub use render::{LogRouteSink, Marker, MarkerRole, RouteRequest, RouteSink};
pub use session::{ExpansionTicket, Session};

/// Environment variable that relocates the configuration root (used by tests and portable installs).
pub const CONFIG_DIR_ENV: &str = "OHUD_CONFIG_DIR";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum HudError {
    #[error("No candidate targets available")]
    EmptyCandidateSet,
    #[error("Duplicate target name: {0}")]
    DuplicateKey(String),
    #[error("Malformed coordinate for '{name}': lat={lat}, lon={lon}")]
    MalformedCoordinate { name: String, lat: f64, lon: f64 },
    #[error("Chain node not found: {0}")]
    NodeNotFound(NodeRef),
    #[error("Stale expansion: ticket generation {ticket}, chain generation {current}")]
    StaleExpansion { ticket: u64, current: u64 },
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Directory holding `config.json`.
///
/// `OHUD_CONFIG_DIR` wins when set; otherwise the platform config dir, falling
/// back to `.ohud` in the working directory.
pub fn get_config_root() -> PathBuf {
    if let Ok(dir) = std::env::var(CONFIG_DIR_ENV) {
        if !dir.trim().is_empty() {
            return PathBuf::from(dir);
        }
    }
    directories::ProjectDirs::from("org", "ohud", "Orient-HUD")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".ohud"))
}
