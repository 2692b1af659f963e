//! Strategy store backed by a directory of JSON files, `<dir>/<id>.json`.

use crate::domain::error::BacktestError;
use crate::domain::strategy::StrategyDefinition;
use crate::ports::strategy_port::StrategyPort;
use std::fs;
use std::path::{Path, PathBuf};

pub struct JsonStrategyAdapter {
    base_path: PathBuf,
}

impl JsonStrategyAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    /// Read a single definition from an explicit file path.
    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<StrategyDefinition, BacktestError> {
        let path = path.as_ref();
        let id = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let content = fs::read_to_string(path).map_err(|e| BacktestError::StrategyLoad {
            id: id.clone(),
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;
        parse_definition(&id, &content)
    }
}

fn parse_definition(id: &str, content: &str) -> Result<StrategyDefinition, BacktestError> {
    let mut definition: StrategyDefinition =
        serde_json::from_str(content).map_err(|e| BacktestError::StrategyLoad {
            id: id.to_string(),
            reason: format!("invalid strategy JSON: {}", e),
        })?;
    if definition.id.is_empty() {
        definition.id = id.to_string();
    }
    Ok(definition)
}

impl StrategyPort for JsonStrategyAdapter {
    fn load_strategy(&self, id: &str) -> Result<StrategyDefinition, BacktestError> {
        Self::load_file(self.base_path.join(format!("{}.json", id)))
    }
}
