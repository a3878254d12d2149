use cdan_api::{Query, ReportTemplate};

const CALIFORNIA_QUERY: &str = "&topic_num=26&metric_num=33&metrictype_num=37\
&CrashYear=2010,2011,2012,2013,2014,2015,2016,2017,2018,2019,2020,2021,2022,2023,\
&State=06&A_PTYPE=1&DRIMPAIR_A=9&TableRows=YEAR&TableCols=MONTH\
&ReleaseDate=Version 9.2.1, released Nov 13, 2025&ReportType=1&Criteria=Years: 2010-2023";

#[test]
fn default_template_matches_published_report() {
    let query = ReportTemplate::default().for_state("06");
    assert_eq!(query.to_query_string(), CALIFORNIA_QUERY);
}

#[test]
fn identical_target_yields_identical_query() {
    let template = ReportTemplate::default();
    let a = template.for_state("48").to_query_string();
    let b = template.for_state("48").to_query_string();
    assert_eq!(a, b);
    assert_ne!(a, template.for_state("06").to_query_string());
}

#[test]
fn state_is_encoded_once() {
    let query = ReportTemplate::default().for_state("17").to_query_string();
    assert_eq!(query.matches("&State=").count(), 1);
    assert!(query.contains("&State=17&"));
}

#[test]
fn year_range_drives_years_and_criteria() {
    let query = ReportTemplate::default()
        .for_state("06")
        .with_years(2020, 2022)
        .to_query_string();
    assert!(query.contains("&CrashYear=2020,2021,2022,&"));
    assert!(query.ends_with("&Criteria=Years: 2020-2022"));
}

#[test]
fn template_fields_are_overridable() {
    let template = ReportTemplate {
        impairment: 1,
        table_cols: "STATE".to_string(),
        ..ReportTemplate::default()
    };
    let query = template.for_state("06");
    assert_eq!(query.state(), "06");
    let pairs = query.pairs();
    assert!(pairs.contains(&("DRIMPAIR_A", "1".to_string())));
    assert!(pairs.contains(&("TableCols", "STATE".to_string())));
    assert_eq!(pairs.first().map(|p| p.0), Some("topic_num"));
}
