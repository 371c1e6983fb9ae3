//! JSON templates with `{{KEY}}` placeholders.
//!
//! Templates live on disk under `<root>/<category>/<name>.json` so users can
//! edit them. The built-in set is compiled in and written out on demand.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::path::PathBuf;

use serde_json::Value as JsonValue;
use strum_macros::Display;
use strum_macros::EnumIter;
use tracing::debug;

use crate::error::MonitorErr;
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum TemplateCategory {
    Networks,
    Monitors,
    Triggers,
}

impl TemplateCategory {
    pub fn dir_name(self) -> &'static str {
        match self {
            TemplateCategory::Networks => "networks",
            TemplateCategory::Monitors => "monitors",
            TemplateCategory::Triggers => "triggers",
        }
    }
}

const BUILTIN_TEMPLATES: &[(TemplateCategory, &str, &str)] = &[
    (
        TemplateCategory::Networks,
        "stellar",
        include_str!("../../resources/templates/networks/stellar.json"),
    ),
    (
        TemplateCategory::Networks,
        "evm",
        include_str!("../../resources/templates/networks/evm.json"),
    ),
    (
        TemplateCategory::Monitors,
        "stellar",
        include_str!("../../resources/templates/monitors/stellar.json"),
    ),
    (
        TemplateCategory::Monitors,
        "evm",
        include_str!("../../resources/templates/monitors/evm.json"),
    ),
    (
        TemplateCategory::Triggers,
        "discord",
        include_str!("../../resources/templates/triggers/discord.json"),
    ),
    (
        TemplateCategory::Triggers,
        "slack",
        include_str!("../../resources/templates/triggers/slack.json"),
    ),
    (
        TemplateCategory::Triggers,
        "telegram",
        include_str!("../../resources/templates/triggers/telegram.json"),
    ),
];

/// Flat placeholder map. Ordered so rendering is reproducible.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateVars(BTreeMap<String, String>);

impl TemplateVars {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for TemplateVars {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

#[derive(Debug, Clone)]
pub struct TemplateStore {
    root: PathBuf,
}

impl TemplateStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, category: TemplateCategory, name: &str) -> PathBuf {
        self.root
            .join(category.dir_name())
            .join(format!("{name}.json"))
    }

    /// Writes every built-in template that is not already present. Existing
    /// files are left untouched. Returns how many files were written.
    pub fn install_builtin(&self) -> Result<usize> {
        let mut written = 0;
        for (category, name, contents) in BUILTIN_TEMPLATES {
            let path = self.path_for(*category, name);
            if path.exists() {
                continue;
            }
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, contents)?;
            written += 1;
        }
        if written > 0 {
            debug!("installed {written} template(s) into {}", self.root.display());
        }
        Ok(written)
    }

    /// Loads `<category>/<name>.json`, substitutes `vars` when given and
    /// parses the result. Every call goes back to disk.
    pub fn render(
        &self,
        category: TemplateCategory,
        name: &str,
        vars: Option<&TemplateVars>,
    ) -> Result<JsonValue> {
        let path = self.path_for(category, name);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(MonitorErr::TemplateNotFound { path });
            }
            Err(err) => return Err(err.into()),
        };
        let text = match vars {
            Some(vars) => substitute(&raw, vars),
            None => raw,
        };
        serde_json::from_str(&text).map_err(|source| MonitorErr::TemplateParse { path, source })
    }
}

/// Replaces every `{{KEY}}` occurrence for each key in `vars`. Values are
/// escaped for a JSON string context; unknown placeholders are left as is.
pub fn substitute(text: &str, vars: &TemplateVars) -> String {
    let mut out = text.to_string();
    for (key, value) in vars.iter() {
        let placeholder = format!("{{{{{key}}}}}");
        if out.contains(&placeholder) {
            out = out.replace(&placeholder, &escape_json_fragment(value));
        }
    }
    out
}

fn escape_json_fragment(value: &str) -> String {
    let quoted = JsonValue::String(value.to_string()).to_string();
    quoted[1..quoted.len() - 1].to_string()
}
