//! Historical-layout and header detection.
//!
//! Decides whether the first line of a log is a header and which column
//! layout (legacy 7-field or extended 9-field) the data rows follow.

use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, info};

use crate::app::models::SchemaVariant;
use crate::app::services::format_registry::{FormatConfig, ResolvedSchema};
use crate::app::services::row_parser::fields::split_fields;
use crate::config::EngineConfig;

/// Leading date shapes accepted as "this line is data"
static DATE_LIKE: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"^\d{4}[-./]\d{1,2}[-./]\d{1,2}",
        r"^\d{1,2}[-./]\d{1,2}[-./]\d{4}",
        r"^\d{8}([-_T]?\d{6})?$",
        r"^\d{10}$",
        r"^(?i)[a-z]{3,9} \d{1,2} \d{4}",
        r"^\d{1,2} (?i)[a-z]{3,9} \d{4}",
    ]
    .iter()
    .filter_map(|pattern| Regex::new(pattern).ok())
    .collect()
});

/// Whether a field starts like a timestamp
pub fn is_date_like(field: &str) -> bool {
    let field = field.trim().trim_start_matches('\u{feff}').trim_matches('"');
    DATE_LIKE.iter().any(|re| re.is_match(field))
}

/// Outcome of schema detection
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaDecision {
    /// Layout to map rows onto, separator set to the detected delimiter
    pub schema: ResolvedSchema,

    /// First line is a header and must not be emitted
    pub first_line_is_header: bool,

    /// Field count of the first data line, if there was one
    pub data_field_count: Option<usize>,

    /// Set when no historical layout matched
    pub warning: Option<String>,
}

impl SchemaDecision {
    pub fn variant(&self) -> SchemaVariant {
        self.schema.variant
    }
}

/// Layout detector driven by the engine's field thresholds
#[derive(Debug, Clone)]
pub struct SchemaDetector {
    required_min_fields: usize,
    extended_min_fields: usize,
}

impl SchemaDetector {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            required_min_fields: config.required_min_fields,
            extended_min_fields: config.extended_min_fields,
        }
    }

    /// Inspect the leading non-blank lines of a source.
    ///
    /// The first line is a header when its first field is not date-like; the
    /// layout is then chosen from the field count of the first data line.
    pub fn detect<'a>(
        &self,
        delimiter: char,
        mut lines: impl Iterator<Item = &'a str>,
        format: &FormatConfig,
    ) -> SchemaDecision {
        let mut lines = lines.by_ref().filter(|line| !line.trim().is_empty());

        let Some(first) = lines.next() else {
            return self.decide(delimiter, None, false, format);
        };

        let first_fields = split_fields(first, delimiter);
        let first_field = first_fields.first().map(String::as_str).unwrap_or("");
        let is_header = !is_date_like(first_field);

        if is_header {
            info!("First line appears to be a header: {}", preview(first));
            let data_fields = lines.next().map(|line| split_fields(line, delimiter).len());
            self.decide(delimiter, data_fields, true, format)
        } else {
            self.decide(delimiter, Some(first_fields.len()), false, format)
        }
    }

    /// Layout chosen for a data line with `field_count` fields
    pub fn variant_for(&self, field_count: usize) -> SchemaVariant {
        if field_count >= self.extended_min_fields {
            SchemaVariant::Extended
        } else if field_count >= self.required_min_fields {
            SchemaVariant::Legacy
        } else {
            SchemaVariant::Default
        }
    }

    fn decide(
        &self,
        delimiter: char,
        data_field_count: Option<usize>,
        first_line_is_header: bool,
        format: &FormatConfig,
    ) -> SchemaDecision {
        let variant = data_field_count
            .map(|count| self.variant_for(count))
            .unwrap_or(SchemaVariant::Default);

        let warning = match (variant, data_field_count) {
            (SchemaVariant::Default, Some(count)) => Some(format!(
                "first data line has {} fields, fewer than the {} of any known layout; using '{}' columns",
                count, self.required_min_fields, format.name
            )),
            (SchemaVariant::Default, None) => {
                Some("no data line to detect a layout from".to_string())
            }
            _ => None,
        };

        // formats without this historical layout keep their own columns
        let variant = if format.has_variant(variant) {
            variant
        } else {
            SchemaVariant::Default
        };

        let mut schema = format.resolve(variant);
        schema.separator = delimiter;

        debug!(
            "Schema decision: {} ({} columns, header: {})",
            variant,
            schema.columns.len(),
            first_line_is_header
        );

        SchemaDecision {
            schema,
            first_line_is_header,
            data_field_count,
            warning,
        }
    }
}

fn preview(line: &str) -> String {
    line.chars().take(100).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector() -> SchemaDetector {
        SchemaDetector::new(&EngineConfig::default())
    }

    #[test]
    fn test_date_like_fields() {
        assert!(is_date_like("2025.05.09-11.58.37"));
        assert!(is_date_like("2025-05-09 11:58:37"));
        assert!(is_date_like("09.05.2025-11.58.37"));
        assert!(is_date_like("20250509115837"));
        assert!(is_date_like("1746791917"));
        assert!(is_date_like("\"2025/05/09 11:58:37\""));
        assert!(!is_date_like("timestamp"));
        assert!(!is_date_like("Player1"));
        assert!(!is_date_like(""));
    }

    #[test]
    fn test_extended_layout() {
        let format = FormatConfig::deadside();
        let lines = ["2025.05.09-11.58.37;Player1;ID1;Player2;ID2;weapon;10;PS4;PS4;"];
        let decision = detector().detect(';', lines.into_iter(), &format);

        assert_eq!(decision.variant(), SchemaVariant::Extended);
        assert!(!decision.first_line_is_header);
        assert_eq!(decision.data_field_count, Some(10));
        assert!(decision.warning.is_none());
    }

    #[test]
    fn test_legacy_layout() {
        let format = FormatConfig::deadside();
        let lines = ["2025.03.27-10.42.18;Killer;K1;Victim;V1;AK-47;50"];
        let decision = detector().detect(';', lines.into_iter(), &format);

        assert_eq!(decision.variant(), SchemaVariant::Legacy);
        assert_eq!(decision.schema.columns.len(), 7);
    }

    #[test]
    fn test_header_is_detected_and_skipped_for_counting() {
        let format = FormatConfig::deadside();
        let lines = [
            "timestamp,killer,killer_id,victim,victim_id,weapon,distance",
            "",
            "2025-05-09 11:58:37,A,A1,B,B1,AK,10",
        ];
        let decision = detector().detect(',', lines.into_iter(), &format);

        assert!(decision.first_line_is_header);
        assert_eq!(decision.data_field_count, Some(7));
        assert_eq!(decision.variant(), SchemaVariant::Legacy);
        assert_eq!(decision.schema.separator, ',');
    }

    #[test]
    fn test_short_first_line_uses_default_with_warning() {
        let format = FormatConfig::deadside();
        let lines = ["2025.05.09-11.58.37;A;B;AK"];
        let decision = detector().detect(';', lines.into_iter(), &format);

        assert_eq!(decision.variant(), SchemaVariant::Default);
        assert_eq!(decision.schema.columns, format.columns);
        assert!(decision.warning.is_some());
    }

    #[test]
    fn test_format_without_variants_keeps_default() {
        let format = FormatConfig::custom();
        let lines = ["2025-05-09 11:58:37,kill,Alice,A1,Bob,B1,M4,north"];
        let decision = detector().detect(',', lines.into_iter(), &format);

        assert_eq!(decision.variant(), SchemaVariant::Default);
        assert_eq!(decision.schema.columns, format.columns);
        assert!(decision.warning.is_none());
    }

    #[test]
    fn test_header_only() {
        let format = FormatConfig::deadside();
        let decision = detector().detect(';', ["timestamp;killer;victim"].into_iter(), &format);

        assert!(decision.first_line_is_header);
        assert_eq!(decision.data_field_count, None);
        assert_eq!(decision.variant(), SchemaVariant::Default);
    }
}
