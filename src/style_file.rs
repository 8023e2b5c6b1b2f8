use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::DrawResult;
use crate::registry::StyleRegistry;
use crate::style::{Attributes, UnknownField};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StyleBook {
    #[serde(default)]
    pub current: Option<String>,
    pub styles: BTreeMap<String, Map<String, Value>>,
}

impl StyleBook {
    pub fn from_registry(registry: &StyleRegistry) -> DrawResult<Self> {
        let mut styles = BTreeMap::new();
        for (name, style) in registry.iter() {
            styles.insert(name.to_string(), style.to_json()?);
        }
        Ok(Self {
            current: registry.current_name().map(str::to_string),
            styles,
        })
    }

    pub fn apply(&self, registry: &mut StyleRegistry) -> DrawResult<Vec<UnknownField>> {
        let mut unknown = Vec::new();
        for (name, fields) in &self.styles {
            let attributes = Attributes::from_json(Value::Object(fields.clone()))?;
            unknown.extend(registry.add(name, &attributes));
        }
        if let Some(current) = &self.current {
            registry.select(current);
        }
        Ok(unknown)
    }
}

pub fn default_path() -> Option<PathBuf> {
    let dirs = ProjectDirs::from("com", "fancymages", "fancymages")?;
    Some(dirs.config_dir().join("styles.json"))
}

pub fn load(path: &Path) -> DrawResult<StyleBook> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

pub fn save(path: &Path, book: &StyleBook) -> DrawResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(book)?)?;
    log::debug!(target: "style", "saved {} styles to {}", book.styles.len(), path.display());
    Ok(())
}
