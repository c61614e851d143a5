//! Named log-format descriptors.
//!
//! A [`FormatConfig`] describes one log family: separator, ordered columns,
//! datetime conventions, the historical layouts it may appear in and the
//! columns a row needs to be usable. A [`FormatRegistry`] holds them by name
//! and is injected into each engine, so engines with different schemas can
//! coexist and be tested in isolation.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::app::models::SchemaVariant;
use crate::app::services::row_parser::record::position_of;
use crate::constants::{
    FORMAT_CUSTOM, FORMAT_DEADSIDE, FORMAT_EXTENDED, FORMAT_LEGACY, ISO_DATETIME_FORMAT,
    PRIMARY_DATETIME_FORMAT, columns,
};
use crate::{Error, Result};

/// Override applied on top of a format for one historical layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaOverride {
    pub variant: SchemaVariant,
    pub separator: Option<char>,
    pub columns: Option<Vec<String>>,
    pub datetime_column: Option<String>,
    pub datetime_format: Option<String>,
}

impl SchemaOverride {
    /// Override that only replaces the column list
    pub fn columns(variant: SchemaVariant, columns: &[&str]) -> Self {
        Self {
            variant,
            separator: None,
            columns: Some(to_owned(columns)),
            datetime_column: None,
            datetime_format: None,
        }
    }

    /// Override that only replaces the separator
    pub fn separator(variant: SchemaVariant, separator: char) -> Self {
        Self {
            variant,
            separator: Some(separator),
            columns: None,
            datetime_column: None,
            datetime_format: None,
        }
    }
}

/// Descriptor of one log format. Immutable once registered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormatConfig {
    pub name: String,
    pub separator: char,
    pub columns: Vec<String>,
    pub datetime_format: String,
    pub datetime_column: String,
    /// Historical layouts, tried in order
    pub variants: Vec<SchemaOverride>,
    /// Canonical columns that must be non-empty for a row to be valid
    pub required_columns: Vec<String>,
}

/// A format with one variant's overrides applied
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSchema {
    pub variant: SchemaVariant,
    pub separator: char,
    pub columns: Vec<String>,
    pub datetime_column: String,
    pub datetime_format: String,
}

impl FormatConfig {
    /// Game-server death log: `;`-separated, extended layout by default
    pub fn deadside() -> Self {
        Self {
            name: FORMAT_DEADSIDE.to_string(),
            separator: ';',
            columns: to_owned(columns::EXTENDED),
            datetime_format: PRIMARY_DATETIME_FORMAT.to_string(),
            datetime_column: columns::TIMESTAMP.to_string(),
            variants: vec![
                SchemaOverride::columns(SchemaVariant::Extended, columns::EXTENDED),
                SchemaOverride::columns(SchemaVariant::Legacy, columns::LEGACY),
                SchemaOverride::separator(SchemaVariant::Default, ','),
            ],
            required_columns: to_owned(columns::REQUIRED),
        }
    }

    /// Post-update layout with platform columns
    pub fn extended() -> Self {
        Self {
            name: FORMAT_EXTENDED.to_string(),
            variants: vec![
                SchemaOverride::columns(SchemaVariant::Extended, columns::EXTENDED),
                SchemaOverride::columns(SchemaVariant::Legacy, columns::LEGACY),
            ],
            ..Self::deadside()
        }
    }

    /// Pre-update 7-column layout
    pub fn legacy() -> Self {
        Self {
            name: FORMAT_LEGACY.to_string(),
            columns: to_owned(columns::LEGACY),
            variants: vec![
                SchemaOverride::columns(SchemaVariant::Legacy, columns::LEGACY),
                SchemaOverride::columns(SchemaVariant::Extended, columns::EXTENDED),
            ],
            ..Self::deadside()
        }
    }

    /// Generic comma-separated event layout
    pub fn custom() -> Self {
        Self {
            name: FORMAT_CUSTOM.to_string(),
            separator: ',',
            columns: to_owned(columns::CUSTOM),
            datetime_format: ISO_DATETIME_FORMAT.to_string(),
            datetime_column: columns::TIMESTAMP.to_string(),
            variants: Vec::new(),
            required_columns: to_owned(columns::REQUIRED),
        }
    }

    /// Check the descriptor is usable
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::invalid_format(&self.name, "format name is empty"));
        }
        if self.columns.is_empty() {
            return Err(Error::invalid_format(&self.name, "column list is empty"));
        }
        if self.datetime_format.is_empty() {
            return Err(Error::invalid_format(&self.name, "datetime format is empty"));
        }
        if !self.columns.iter().any(|c| c == &self.datetime_column) {
            return Err(Error::invalid_format(
                &self.name,
                format!("datetime column '{}' is not a column", self.datetime_column),
            ));
        }
        if self.separator == '\n' || self.separator == '\r' || self.separator == '"' {
            return Err(Error::invalid_format(
                &self.name,
                format!("separator {:?} cannot delimit fields", self.separator),
            ));
        }
        if let Some(missing) = self
            .required_columns
            .iter()
            .find(|required| position_of(&self.columns, required).is_none())
        {
            return Err(Error::invalid_format(
                &self.name,
                format!("required column '{}' has no matching column", missing),
            ));
        }
        for variant in &self.variants {
            if let Some(columns) = &variant.columns {
                if columns.is_empty() {
                    return Err(Error::invalid_format(
                        &self.name,
                        format!("{} variant has an empty column list", variant.variant),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Apply the override registered for `variant`, if any.
    ///
    /// `Default` always resolves to the base layout; overrides tagged
    /// `Default` only take part in [`FormatConfig::candidates`].
    pub fn resolve(&self, variant: SchemaVariant) -> ResolvedSchema {
        let base = self.base();
        if variant == SchemaVariant::Default {
            return base;
        }

        match self.variants.iter().find(|o| o.variant == variant) {
            Some(over) => apply_override(base, over),
            None => ResolvedSchema { variant, ..base },
        }
    }

    /// Whether an override is registered for `variant`
    pub fn has_variant(&self, variant: SchemaVariant) -> bool {
        self.variants.iter().any(|o| o.variant == variant)
    }

    /// Base layout followed by every variant in registration order, skipping
    /// layouts identical to an earlier one
    pub fn candidates(&self) -> Vec<ResolvedSchema> {
        let mut candidates = vec![self.base()];
        for over in &self.variants {
            let resolved = apply_override(self.base(), over);
            if !candidates.iter().any(|c| c.same_layout(&resolved)) {
                candidates.push(resolved);
            }
        }
        candidates
    }

    fn base(&self) -> ResolvedSchema {
        ResolvedSchema {
            variant: SchemaVariant::Default,
            separator: self.separator,
            columns: self.columns.clone(),
            datetime_column: self.datetime_column.clone(),
            datetime_format: self.datetime_format.clone(),
        }
    }
}

impl ResolvedSchema {
    /// Equal apart from the variant tag
    pub fn same_layout(&self, other: &ResolvedSchema) -> bool {
        self.separator == other.separator
            && self.columns == other.columns
            && self.datetime_column == other.datetime_column
            && self.datetime_format == other.datetime_format
    }
}

fn apply_override(mut schema: ResolvedSchema, over: &SchemaOverride) -> ResolvedSchema {
    schema.variant = over.variant;
    if let Some(separator) = over.separator {
        schema.separator = separator;
    }
    if let Some(columns) = &over.columns {
        schema.columns = columns.clone();
    }
    if let Some(column) = &over.datetime_column {
        schema.datetime_column = column.clone();
    }
    if let Some(format) = &over.datetime_format {
        schema.datetime_format = format.clone();
    }
    schema
}

fn to_owned(columns: &[&str]) -> Vec<String> {
    columns.iter().map(|c| c.to_string()).collect()
}

/// Registry of named formats, shared read-only between engines
#[derive(Debug, Clone, Default)]
pub struct FormatRegistry {
    formats: HashMap<String, Arc<FormatConfig>>,
}

impl FormatRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the built-in formats
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for config in [
            FormatConfig::deadside(),
            FormatConfig::extended(),
            FormatConfig::legacy(),
            FormatConfig::custom(),
        ] {
            registry
                .formats
                .insert(config.name.clone(), Arc::new(config));
        }
        registry
    }

    /// Validate and add a format, replacing any format with the same name
    pub fn register(&mut self, config: FormatConfig) -> Result<()> {
        config.validate()?;
        debug!(
            "Registering format '{}' ({} columns, separator {:?})",
            config.name,
            config.columns.len(),
            config.separator
        );
        self.formats.insert(config.name.clone(), Arc::new(config));
        Ok(())
    }

    /// Look up a format by name
    pub fn get(&self, name: &str) -> Result<Arc<FormatConfig>> {
        self.formats
            .get(name)
            .cloned()
            .ok_or_else(|| Error::unknown_format(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.formats.contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.formats.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.formats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.formats.is_empty()
    }
}
