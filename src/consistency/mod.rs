//! Cross-checks the portingdb data files against the known Fedora packages.
//!
//! Every package named in the YAML datasets should exist in `fedora.json`,
//! except records explicitly marked as dropped.

use anyhow::{Context, Result, bail};
use log::debug;
use serde_yaml::Value;
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::runtime::Runtime;

pub const FEDORA_JSON: &str = "fedora.json";
pub const UPSTREAM_YAML: &str = "upstream.yaml";
pub const FEDORA_UPDATE_YAML: &str = "fedora-update.yaml";
pub const GROUPS_YAML: &str = "groups.yaml";

/// Default location of the data files, relative to the working directory.
pub const DEFAULT_DATA_DIR: &str = "data";

const DROPPED: &str = "dropped";

/// Names reported for one dataset, in input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub path: PathBuf,
    pub unknown: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsistencyReport {
    pub sections: Vec<Section>,
}

impl ConsistencyReport {
    pub fn findings(&self) -> usize {
        self.sections.iter().map(|s| s.unknown.len()).sum()
    }

    pub fn is_clean(&self) -> bool {
        self.findings() == 0
    }
}

impl fmt::Display for ConsistencyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for section in &self.sections {
            writeln!(f, "--- Result for {} ---", section.path.display())?;
            for name in &section.unknown {
                writeln!(f, "{}", name)?;
            }
        }
        Ok(())
    }
}

/// Known package names: the keys of a JSON object, or the strings of an array.
pub fn parse_reference(text: &str) -> Result<HashSet<String>> {
    let value: serde_json::Value = serde_json::from_str(text)?;
    match value {
        serde_json::Value::Object(map) => Ok(map.into_iter().map(|(k, _)| k).collect()),
        serde_json::Value::Array(items) => Ok(items
            .into_iter()
            .filter_map(|item| item.as_str().map(String::from))
            .collect()),
        other => bail!("Expected an object or an array of package names, got {}", other),
    }
}

fn key_name(key: &Value) -> Option<String> {
    match key {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Keys of a name → record mapping that are unknown and not dropped.
pub fn compare_keys(data: &Value, reference: &HashSet<String>) -> Result<Vec<String>> {
    let mapping = match data {
        Value::Null => return Ok(Vec::new()),
        Value::Mapping(m) => m,
        _ => bail!("Expected a mapping of package records"),
    };

    let mut unknown = Vec::new();
    for (key, record) in mapping {
        let Some(name) = key_name(key) else {
            debug!("Skipping non-scalar key {:?}", key);
            continue;
        };
        let dropped = record.get("status").and_then(Value::as_str) == Some(DROPPED);
        if !dropped && !reference.contains(&name) {
            unknown.push(name);
        }
    }
    Ok(unknown)
}

/// Group members that are unknown.
pub fn check_groups(data: &Value, reference: &HashSet<String>) -> Result<Vec<String>> {
    let groups = match data {
        Value::Null => return Ok(Vec::new()),
        Value::Mapping(m) => m,
        _ => bail!("Expected a mapping of groups"),
    };

    let mut unknown = Vec::new();
    for (group, body) in groups {
        let packages = match body.get("packages") {
            Some(Value::Sequence(packages)) => packages,
            Some(Value::Null) | None => {
                debug!("Group {:?} lists no packages", group);
                continue;
            }
            Some(_) => bail!("Packages of group {:?} are not a list", group),
        };
        for package in packages.iter().filter_map(key_name) {
            if !reference.contains(&package) {
                unknown.push(package);
            }
        }
    }
    Ok(unknown)
}

fn load_yaml<R: Runtime>(runtime: &R, path: &Path) -> Result<Value> {
    let text = runtime
        .read_to_string(path)
        .with_context(|| format!("Failed to read {:?}", path))?;
    serde_yaml::from_str(&text).with_context(|| format!("Failed to parse {:?}", path))
}

/// Check the datasets of `data_dir`: the keyed ones first, then the groups.
#[tracing::instrument(skip(runtime))]
pub fn check_data_dir<R: Runtime>(runtime: &R, data_dir: &Path) -> Result<ConsistencyReport> {
    let reference_path = data_dir.join(FEDORA_JSON);
    let reference_text = runtime
        .read_to_string(&reference_path)
        .with_context(|| format!("Failed to read {:?}", reference_path))?;
    let reference = parse_reference(&reference_text)
        .with_context(|| format!("Failed to parse {:?}", reference_path))?;
    debug!("{} known packages", reference.len());

    let mut report = ConsistencyReport::default();
    for name in [UPSTREAM_YAML, FEDORA_UPDATE_YAML] {
        let path = data_dir.join(name);
        let data = load_yaml(runtime, &path)?;
        let unknown = compare_keys(&data, &reference).with_context(|| format!("In {:?}", path))?;
        report.sections.push(Section { path, unknown });
    }

    let path = data_dir.join(GROUPS_YAML);
    let data = load_yaml(runtime, &path)?;
    let unknown = check_groups(&data, &reference).with_context(|| format!("In {:?}", path))?;
    report.sections.push(Section { path, unknown });

    Ok(report)
}
