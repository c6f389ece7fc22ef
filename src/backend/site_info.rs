use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

pub const UNKNOWN: &str = "Unknown";

/// What a logger column holds, as recognised from its header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Timestamp,
    Depth,
    Flow,
    Velocity,
    Rainfall,
}

/// A classified column: its header, position, and the site id and channel
/// captured from a `<site>_<channel>|label|unit` header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnInfo {
    pub name: String,
    pub index: usize,
    pub site_id: Option<String>,
    pub channel: Option<String>,
}

pub type ColumnMapping = BTreeMap<ColumnKind, Vec<ColumnInfo>>;

/// First column of a kind, if the file has one.
pub fn first_column(mapping: &ColumnMapping, kind: ColumnKind) -> Option<&str> {
    mapping
        .get(&kind)
        .and_then(|columns| columns.first())
        .map(|column| column.name.as_str())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum MonitorType {
    Depth,
    Flow,
    Rainfall,
    #[default]
    Unknown,
}

impl MonitorType {
    /// Extension of the interchange file produced for this monitor.
    pub fn output_extension(self) -> &'static str {
        match self {
            MonitorType::Rainfall => "r",
            _ => "fdv",
        }
    }
}

impl fmt::Display for MonitorType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            MonitorType::Depth => "Depth",
            MonitorType::Flow => "Flow",
            MonitorType::Rainfall => "Rainfall",
            MonitorType::Unknown => UNKNOWN,
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
pub struct SiteInfo {
    site_id: String,
    site_name: String,
    monitor_type: MonitorType,
    sitename_regex: Regex,
    siteid_regex: Regex,
}

impl SiteInfo {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(SiteInfo {
            site_id: UNKNOWN.to_string(),
            site_name: UNKNOWN.to_string(),
            monitor_type: MonitorType::Unknown,
            sitename_regex: Regex::new(r"^([A-Za-z]+\d+)$")?,
            siteid_regex: Regex::new(r"^(\d+)$")?,
        })
    }

    pub fn extract_site_info(&mut self, filename: &str, column_mapping: &ColumnMapping) {
        self.extract_from_filename(filename);
        if self.site_id == UNKNOWN {
            self.extract_from_column_mapping(column_mapping);
        }
        self.determine_monitor_type(filename, column_mapping);
        self.finalize();
    }

    pub(crate) fn extract_from_filename(&mut self, filename: &str) {
        let Some(stem) = Path::new(filename).file_stem().and_then(|s| s.to_str()) else {
            log::warn!("Cannot read a site name from {}", filename);
            return;
        };

        if let Some(captures) = self.sitename_regex.captures(stem) {
            self.site_id = captures[1].to_string();
            self.site_name = captures[1].to_string();
        } else if let Some(captures) = self.siteid_regex.captures(stem) {
            self.site_id = captures[1].to_string();
        }
    }

    pub(crate) fn extract_from_column_mapping(&mut self, column_mapping: &ColumnMapping) {
        if let Some(id) = column_mapping
            .values()
            .flatten()
            .find_map(|column| column.site_id.clone())
        {
            self.site_id = id;
        }
    }

    /// Hints in the file name win over what the columns suggest.
    pub(crate) fn determine_monitor_type(&mut self, filename: &str, column_mapping: &ColumnMapping) {
        let stem = Path::new(filename)
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or(filename)
            .to_lowercase();
        self.monitor_type = if stem.contains("dm") || stem.contains("depth") {
            MonitorType::Depth
        } else if stem.contains("fm") || stem.contains("flow") {
            MonitorType::Flow
        } else if stem.contains("rg") || stem.contains("rain") {
            MonitorType::Rainfall
        } else {
            Self::monitor_type_from_columns(column_mapping)
        };
    }

    fn monitor_type_from_columns(column_mapping: &ColumnMapping) -> MonitorType {
        let has = |kind| column_mapping.contains_key(&kind);
        if has(ColumnKind::Rainfall) {
            MonitorType::Rainfall
        } else if has(ColumnKind::Flow) || (has(ColumnKind::Depth) && has(ColumnKind::Velocity)) {
            MonitorType::Flow
        } else if has(ColumnKind::Depth) {
            MonitorType::Depth
        } else {
            MonitorType::Unknown
        }
    }

    pub fn finalize(&mut self) {
        if self.site_name == UNKNOWN && self.site_id != UNKNOWN {
            self.site_name = self.site_id.clone();
        }
    }

    pub fn site_id(&self) -> &str {
        &self.site_id
    }

    pub fn site_name(&self) -> &str {
        &self.site_name
    }

    pub fn monitor_type(&self) -> MonitorType {
        self.monitor_type
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping_with(kinds: &[ColumnKind], site: Option<&str>) -> ColumnMapping {
        kinds
            .iter()
            .enumerate()
            .map(|(index, &kind)| {
                (
                    kind,
                    vec![ColumnInfo {
                        name: format!("{:?}", kind),
                        index,
                        site_id: site.map(String::from),
                        channel: Some("1".to_string()),
                    }],
                )
            })
            .collect()
    }

    #[test]
    fn alphanumeric_stem_names_the_site() {
        let mut info = SiteInfo::new().unwrap();
        info.extract_site_info("/data/Mill42.csv", &ColumnMapping::new());
        assert_eq!(info.site_id(), "Mill42");
        assert_eq!(info.site_name(), "Mill42");
    }

    #[test]
    fn numeric_stem_is_an_id_and_becomes_the_name() {
        let mut info = SiteInfo::new().unwrap();
        info.extract_site_info("12345.csv", &ColumnMapping::new());
        assert_eq!(info.site_id(), "12345");
        assert_eq!(info.site_name(), "12345");
    }

    #[test]
    fn id_falls_back_to_column_headers() {
        let mut info = SiteInfo::new().unwrap();
        let mapping = mapping_with(&[ColumnKind::Depth], Some("778"));
        info.extract_site_info("export - week 3.csv", &mapping);
        assert_eq!(info.site_id(), "778");
        assert_eq!(info.site_name(), "778");
        assert_eq!(info.monitor_type(), MonitorType::Depth);
    }

    #[test]
    fn nothing_recognisable_stays_unknown() {
        let mut info = SiteInfo::new().unwrap();
        info.extract_site_info("export.csv", &ColumnMapping::new());
        assert_eq!(info.site_id(), UNKNOWN);
        assert_eq!(info.site_name(), UNKNOWN);
        assert_eq!(info.monitor_type(), MonitorType::Unknown);
    }

    #[test]
    fn filename_hints_win() {
        let mapping = mapping_with(&[ColumnKind::Rainfall], None);
        let mut info = SiteInfo::new().unwrap();
        info.determine_monitor_type("site_FM03.csv", &mapping);
        assert_eq!(info.monitor_type(), MonitorType::Flow);
        info.determine_monitor_type("RG1.xlsx", &ColumnMapping::new());
        assert_eq!(info.monitor_type(), MonitorType::Rainfall);
        assert_eq!(info.monitor_type().output_extension(), "r");
    }

    #[test]
    fn columns_decide_without_hints() {
        let mut info = SiteInfo::new().unwrap();
        let mapping = mapping_with(&[ColumnKind::Depth, ColumnKind::Velocity], None);
        info.determine_monitor_type("export.csv", &mapping);
        assert_eq!(info.monitor_type(), MonitorType::Flow);
        assert_eq!(info.monitor_type().output_extension(), "fdv");
    }
}
