//! Query builder for the per-region crash report job.

use serde::Deserialize;

use super::Query;

/// Fixed report parameters shared by every target in a run.
///
/// Every field has a default matching the published report, so a config
/// file only needs to name the fields it changes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ReportTemplate {
    pub topic_num: u32,
    pub metric_num: u32,
    pub metrictype_num: u32,
    /// First crash year, inclusive.
    pub first_year: u16,
    /// Last crash year, inclusive.
    pub last_year: u16,
    /// `A_PTYPE` person-type filter.
    pub person_type: u32,
    /// `DRIMPAIR_A` driver-impairment filter.
    pub impairment: u32,
    pub table_rows: String,
    pub table_cols: String,
    /// Release label the service stamps on the report.
    pub release: String,
    pub report_type: u32,
}

impl Default for ReportTemplate {
    fn default() -> Self {
        Self {
            topic_num: 26,
            metric_num: 33,
            metrictype_num: 37,
            first_year: 2010,
            last_year: 2023,
            person_type: 1,
            impairment: 9,
            table_rows: "YEAR".to_string(),
            table_cols: "MONTH".to_string(),
            release: "Version 9.2.1, released Nov 13, 2025".to_string(),
            report_type: 1,
        }
    }
}

impl ReportTemplate {
    /// Builds the job query for one target.
    pub fn for_state(&self, state_id: &str) -> ReportQuery {
        ReportQuery {
            template: self.clone(),
            state: state_id.to_string(),
        }
    }
}

/// The fully rendered job query for a single target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportQuery {
    template: ReportTemplate,
    state: String,
}

impl ReportQuery {
    /// Overrides the crash year range (inclusive on both ends).
    pub fn with_years(mut self, first_year: u16, last_year: u16) -> Self {
        self.template.first_year = first_year;
        self.template.last_year = last_year;
        self
    }

    pub fn state(&self) -> &str {
        &self.state
    }

    fn crash_years(&self) -> String {
        // the service expects a trailing comma after every year
        (self.template.first_year..=self.template.last_year)
            .map(|year| format!("{},", year))
            .collect()
    }
}

impl Query for ReportQuery {
    fn pairs(&self) -> Vec<(&'static str, String)> {
        let t = &self.template;
        vec![
            ("topic_num", t.topic_num.to_string()),
            ("metric_num", t.metric_num.to_string()),
            ("metrictype_num", t.metrictype_num.to_string()),
            ("CrashYear", self.crash_years()),
            ("State", self.state.clone()),
            ("A_PTYPE", t.person_type.to_string()),
            ("DRIMPAIR_A", t.impairment.to_string()),
            ("TableRows", t.table_rows.clone()),
            ("TableCols", t.table_cols.clone()),
            ("ReleaseDate", t.release.clone()),
            ("ReportType", t.report_type.to_string()),
            (
                "Criteria",
                format!("Years: {}-{}", t.first_year, t.last_year),
            ),
        ]
    }
}
