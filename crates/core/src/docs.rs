//! Documentation overrides loaded from YAML.
//!
//! Files look like:
//!
//! ```yaml
//! notes.views.NoteListView:
//!   GET:
//!     operationId: notes_list
//!     summary: List notes
//!     description: >
//!       Long form description.
//!     x-code-samples:
//!       - lang: Shell
//!         label: cURL
//!         source: curl https://api.example.com/notes/
//! ```
//!
//! Every `*.yaml` file directly inside each configured directory is read and
//! the top-level mappings are merged, later files replacing earlier views.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Extension key for code samples.
pub const CODE_SAMPLES_KEY: &str = "x-code-samples";

/// Overrides for one view and HTTP method.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct OperationDocs {
    #[serde(rename = "operationId")]
    pub operation_id: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    /// Non-boolean values are dropped with a warning.
    #[serde(default, deserialize_with = "lenient_bool")]
    pub deprecated: Option<bool>,
    #[serde(rename = "x-code-samples")]
    pub code_samples: Option<Value>,
    /// Any other attribute, kept for vendor extensions.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl OperationDocs {
    /// Vendor extensions to attach to the operation: the code samples plus
    /// every other `x-` attribute.
    pub fn extensions(&self) -> BTreeMap<String, Value> {
        let mut extensions: BTreeMap<String, Value> = self
            .extra
            .iter()
            .filter(|(key, value)| key.starts_with("x-") && !value.is_null())
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        if let Some(samples) = self.code_samples.as_ref().filter(|v| !v.is_null()) {
            extensions.insert(CODE_SAMPLES_KEY.to_string(), samples.clone());
        }
        extensions
    }
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Bool(flag) => Ok(Some(flag)),
        Value::Null => Ok(None),
        other => {
            tracing::warn!(value = %other, "Ignoring non-boolean deprecated override");
            Ok(None)
        }
    }
}

/// `view id -> method -> docs` as written in a file. Blank entries are allowed.
type RawDocs = HashMap<String, Option<HashMap<String, Option<OperationDocs>>>>;

/// The merged override table.
#[derive(Debug, Clone, Default)]
pub struct Documentation {
    views: HashMap<String, HashMap<String, OperationDocs>>,
}

impl Documentation {
    /// Read every `*.yaml` file in `dirs`.
    ///
    /// Missing directories and unparsable files are logged and skipped.
    pub fn load<P: AsRef<Path>>(dirs: &[P]) -> Self {
        let mut documentation = Self::default();
        for path in yaml_paths(dirs) {
            let text = match std::fs::read_to_string(&path) {
                Ok(text) => text,
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "Failed to read docs file");
                    continue;
                }
            };
            match serde_yaml::from_str::<RawDocs>(&text) {
                Ok(raw) => documentation.merge(raw),
                Err(err) => {
                    tracing::info!(path = %path.display(), error = %err, "Skipping unparsable docs file");
                }
            }
        }
        tracing::debug!(views = documentation.views.len(), "Loaded documentation overrides");
        documentation
    }

    /// Parse a single YAML document.
    pub fn from_yaml_str(text: &str) -> Result<Self, serde_yaml::Error> {
        let mut documentation = Self::default();
        documentation.merge(serde_yaml::from_str::<RawDocs>(text)?);
        Ok(documentation)
    }

    fn merge(&mut self, raw: RawDocs) {
        for (view_id, methods) in raw {
            let methods = methods
                .unwrap_or_default()
                .into_iter()
                .filter_map(|(method, docs)| docs.map(|d| (method.to_ascii_uppercase(), d)))
                .collect();
            self.views.insert(view_id, methods);
        }
    }

    /// Overrides for a view identifier (`"<module>.<ViewClass>"`) and method.
    pub fn lookup(&self, view_id: &str, method: &str) -> Option<&OperationDocs> {
        self.views
            .get(view_id)
            .and_then(|methods| methods.get(&method.to_ascii_uppercase()))
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    pub fn view_count(&self) -> usize {
        self.views.len()
    }
}

/// `*.yaml` files directly inside each directory, sorted by name within a
/// directory so merges are deterministic.
fn yaml_paths<P: AsRef<Path>>(dirs: &[P]) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    for dir in dirs {
        let dir = dir.as_ref();
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(_) => {
                tracing::info!(dir = %dir.display(), "Directory not found");
                continue;
            }
        };
        let mut found: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "yaml"))
            .collect();
        found.sort();
        paths.extend(found);
    }
    paths
}

static GLOBAL_DOCUMENTATION: OnceLock<Documentation> = OnceLock::new();

/// The process-wide table, loaded from `dirs` on first use.
///
/// Later calls return the cached table regardless of `dirs`.
pub fn global<P: AsRef<Path>>(dirs: &[P]) -> &'static Documentation {
    GLOBAL_DOCUMENTATION.get_or_init(|| Documentation::load(dirs))
}
