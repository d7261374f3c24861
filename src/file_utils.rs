use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::errors::StoreError;
use crate::translation::{Unit, UnitStatus, UnitStore};
use crate::validation::{QaDetails, ValidationService};

// @module: File utilities and the JSON unit batch format

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_file()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.as_os_str().is_empty() && !path.exists() {
            fs::create_dir_all(path)?;
        }
        Ok(())
    }

    /// Read a file to a string
    pub fn read_to_string<P: AsRef<Path>>(path: P) -> Result<String> {
        fs::read_to_string(&path).with_context(|| format!("Failed to read file: {:?}", path.as_ref()))
    }

    /// Write a string to a file
    pub fn write_to_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
        // Ensure the parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            Self::ensure_dir(parent)?;
        }

        fs::write(&path, content).with_context(|| format!("Failed to write to file: {:?}", path.as_ref()))
    }
}

/// One unit of an input batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitRecord {
    /// Host identifier
    pub id: String,
    /// Raw source with inline markup
    pub source: String,
    /// Existing target in abstracted form, e.g. from a previous run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

/// Input batch: a stand-in for the host document layer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UnitFile {
    pub units: Vec<UnitRecord>,
}

impl UnitFile {
    /// Load a batch from JSON; a bare array of records is accepted too
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = FileManager::read_to_string(&path)?;
        Self::parse(&content).with_context(|| format!("Failed to parse unit file: {:?}", path.as_ref()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        if content.trim_start().starts_with('[') {
            let units: Vec<UnitRecord> = serde_json::from_str(content)?;
            return Ok(Self { units });
        }
        Ok(serde_json::from_str(content)?)
    }

    /// Abstract every source into a new store
    pub fn into_store(self, validation: ValidationService) -> Result<UnitStore, StoreError> {
        let mut store = UnitStore::new(validation);
        for record in self.units {
            let unit = Unit::new(record.id, record.source);
            let unit = match record.target {
                Some(target) => unit.with_target(target),
                None => unit,
            };
            store.insert(unit)?;
        }
        Ok(store)
    }
}

/// One unit of the output file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputRecord {
    pub id: String,
    pub status: UnitStatus,
    /// Exported raw target (the source for flagged or untranslated units)
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_abstracted: Option<String>,
    #[serde(default, skip_serializing_if = "QaDetails::is_empty")]
    pub qa: QaDetails,
}

/// Output file written after a run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputFile {
    pub units: Vec<OutputRecord>,
}

impl OutputFile {
    /// Combine exported targets with the unit states
    pub fn from_export(store: &UnitStore, exported: Vec<(String, String)>) -> Self {
        let units = store
            .units()
            .into_iter()
            .zip(exported)
            .map(|(unit, (_, target))| OutputRecord {
                id: unit.id,
                status: unit.status,
                target,
                target_abstracted: unit.target_abstracted,
                qa: unit.qa_details,
            })
            .collect();
        Self { units }
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self).context("Failed to serialize output")?;
        FileManager::write_to_file(path, &content)
    }
}
