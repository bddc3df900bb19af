use std::fs;
use std::path::Path;

use anyhow::{Context as _, Result};
use chrono::{Datelike as _, NaiveDate};
use log::error;
use serde::Deserialize;
use serde_json::{json, Map, Value};

pub const GITHUB_API_URL: &str = "https://api.github.com/graphql";

/// Years the website renders, newest first. Archive key order follows this.
pub const TARGET_YEARS: [i32; 7] = [2026, 2025, 2024, 2023, 2022, 2021, 2020];

/// Destination consumed by the browser page as a global variable.
pub const OUTPUT_PATH: &str = "src/data/contributions.js";

const CONTRIBUTION_QUERY: &str = r"
query($userName:String!, $from:DateTime!, $to:DateTime!) {
  user(login: $userName) {
    contributionsCollection(from: $from, to: $to) {
      contributionCalendar {
        weeks {
          contributionDays {
            contributionCount
            date
          }
        }
      }
    }
  }
}
";

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    #[serde(default)]
    data: Option<ResponseData>,
    #[serde(default)]
    errors: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponseData {
    user: Option<User>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct User {
    contributions_collection: ContributionsCollection,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContributionsCollection {
    contribution_calendar: ContributionCalendar,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContributionCalendar {
    #[serde(default)]
    weeks: Vec<Week>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Week {
    #[serde(default)]
    contribution_days: Vec<ContributionDay>,
}

/// One day of the contribution calendar as returned by the API.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributionDay {
    pub date: String,
    pub contribution_count: u32,
}

pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

pub fn days_in_year(year: i32) -> usize {
    if is_leap_year(year) {
        366
    } else {
        365
    }
}

/// Maps API days onto a zero-filled array indexed by day-of-year.
///
/// Entries that fail to parse, fall outside `year`, or land out of bounds are
/// dropped without logging; the API can report boundary days in a neighboring
/// year's calendar.
pub fn map_days_to_year(days: &[ContributionDay], year: i32) -> Vec<u32> {
    let len = days_in_year(year);
    let mut counts = vec![0u32; len];
    let Some(jan_1) = NaiveDate::from_ymd_opt(year, 1, 1) else {
        return counts;
    };
    for day in days {
        let Ok(date) = NaiveDate::parse_from_str(&day.date, "%Y-%m-%d") else {
            continue;
        };
        if date.year() != year {
            continue;
        }
        let day_of_year = date.signed_duration_since(jan_1).num_days();
        if (0..len as i64).contains(&day_of_year) {
            counts[day_of_year as usize] = day.contribution_count;
        }
    }
    counts
}

/// Decodes a successful transport response body into per-day counts.
///
/// A structured `errors` payload is logged and yields an empty result, same
/// as a transport failure. A body that is not valid JSON for the expected
/// shape is a hard error.
fn counts_from_body(body: &str, year: i32) -> Result<Vec<u32>> {
    let parsed: GraphQlResponse = serde_json::from_str(body)
        .with_context(|| format!("malformed GraphQL response for {year}"))?;
    if let Some(errors) = parsed.errors {
        error!("GraphQL errors for {year}: {errors:?}");
        return Ok(Vec::new());
    }
    let weeks = parsed
        .data
        .and_then(|data| data.user)
        .map(|user| user.contributions_collection.contribution_calendar.weeks)
        .unwrap_or_default();
    let days: Vec<ContributionDay> = weeks
        .into_iter()
        .flat_map(|week| week.contribution_days)
        .collect();
    Ok(map_days_to_year(&days, year))
}

/// Fetches one calendar year of contribution counts.
///
/// HTTP failures and GraphQL error payloads are logged and return an empty
/// vec; only transport-level errors surface as `Err`, and the driver loop
/// treats those as empty too.
pub async fn fetch_year(
    client: &reqwest::Client,
    username: &str,
    year: i32,
    token: &str,
) -> Result<Vec<u32>> {
    fetch_year_from(client, GITHUB_API_URL, username, year, token).await
}

/// [`fetch_year`] against a specific endpoint.
pub async fn fetch_year_from(
    client: &reqwest::Client,
    endpoint: &str,
    username: &str,
    year: i32,
    token: &str,
) -> Result<Vec<u32>> {
    let body = json!({
        "query": CONTRIBUTION_QUERY,
        "variables": {
            "userName": username,
            "from": format!("{year}-01-01T00:00:00Z"),
            "to": format!("{year}-12-31T23:59:59Z"),
        },
    });

    let response = client
        .post(endpoint)
        .bearer_auth(token)
        .header("Content-Type", "application/json")
        .header("Accept", "application/vnd.github+json")
        .header("X-GitHub-Api-Version", "2022-11-28")
        .json(&body)
        .send()
        .await?;

    let status = response.status();
    let text = response.text().await?;
    if !status.is_success() {
        error!("error fetching data for {year}: HTTP {status}");
        error!("response: {text}");
        return Ok(Vec::new());
    }

    counts_from_body(&text, year)
}

const FILE_HEADER: &str = "// GitHub Contribution Data\n// Auto-generated by fetch-contributions; edits will be overwritten\n";

/// Per-year contribution counts keyed by year label, in insertion order.
#[derive(Debug, Default)]
pub struct ContributionArchive {
    years: Map<String, Value>,
}

impl ContributionArchive {
    pub fn insert(&mut self, year: i32, counts: Vec<u32>) {
        self.years.insert(year.to_string(), Value::from(counts));
    }

    pub fn len(&self) -> usize {
        self.years.len()
    }

    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }

    /// Renders the archive as a JS source file assigning a global variable.
    pub fn to_script(&self) -> Result<String> {
        let data = serde_json::to_string_pretty(&Value::Object(self.years.clone()))?;
        Ok(format!("{FILE_HEADER}window.contributionData = {data};\n"))
    }

    /// Writes the generated file, creating parent directories and replacing
    /// any previous contents.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
        }
        fs::write(path, self.to_script()?)
            .with_context(|| format!("failed to write {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(date: &str, count: u32) -> ContributionDay {
        ContributionDay {
            date: date.to_string(),
            contribution_count: count,
        }
    }

    #[test]
    fn year_lengths_follow_leap_rule() {
        assert_eq!(days_in_year(2023), 365);
        assert_eq!(days_in_year(2024), 366);
        assert_eq!(days_in_year(1900), 365); // century, not divisible by 400
        assert_eq!(days_in_year(2000), 366);
    }

    #[test]
    fn unwritten_indices_stay_zero() {
        let counts = map_days_to_year(&[day("2023-06-15", 4)], 2023);
        assert_eq!(counts.len(), 365);
        let written = counts.iter().filter(|&&c| c != 0).count();
        assert_eq!(written, 1);
    }

    #[test]
    fn day_of_year_indexing_spans_leap_day() {
        let counts = map_days_to_year(
            &[day("2024-01-01", 1), day("2024-03-01", 7), day("2024-12-31", 2)],
            2024,
        );
        assert_eq!(counts[0], 1);
        assert_eq!(counts[60], 7); // Jan (31) + Feb (29) days precede Mar 1
        assert_eq!(counts[365], 2);
    }

    #[test]
    fn cross_year_entries_are_dropped() {
        let counts = map_days_to_year(&[day("2023-12-31", 9), day("2025-01-01", 9)], 2024);
        assert!(counts.iter().all(|&c| c == 0));
    }

    #[test]
    fn unparseable_dates_are_dropped() {
        let counts = map_days_to_year(&[day("not-a-date", 3)], 2023);
        assert!(counts.iter().all(|&c| c == 0));
    }

    #[test]
    fn errors_payload_yields_empty_result() {
        let body = r#"{"data": null, "errors": [{"message": "bad credentials"}]}"#;
        let counts = counts_from_body(body, 2024).unwrap();
        assert!(counts.is_empty());
    }

    #[test]
    fn successful_body_is_flattened_and_mapped() {
        let body = r#"{
            "data": {
                "user": {
                    "contributionsCollection": {
                        "contributionCalendar": {
                            "weeks": [
                                {"contributionDays": [
                                    {"date": "2023-01-01", "contributionCount": 2},
                                    {"date": "2023-01-02", "contributionCount": 0}
                                ]},
                                {"contributionDays": [
                                    {"date": "2023-01-08", "contributionCount": 5}
                                ]}
                            ]
                        }
                    }
                }
            }
        }"#;
        let counts = counts_from_body(body, 2023).unwrap();
        assert_eq!(counts.len(), 365);
        assert_eq!(counts[0], 2);
        assert_eq!(counts[1], 0);
        assert_eq!(counts[7], 5);
    }

    #[test]
    fn malformed_body_is_an_error() {
        assert!(counts_from_body("<html>rate limited</html>", 2023).is_err());
    }

    #[test]
    fn script_framing_and_round_trip() {
        let mut archive = ContributionArchive::default();
        archive.insert(2024, vec![0; 366]);
        archive.insert(2023, vec![1; 365]);

        let script = archive.to_script().unwrap();
        let mut lines = script.lines();
        assert_eq!(lines.next(), Some("// GitHub Contribution Data"));
        assert!(lines.next().unwrap().starts_with("// Auto-generated by"));
        assert!(script.contains("window.contributionData = "));
        assert!(script.trim_end().ends_with(';'));

        let json = script
            .split_once("window.contributionData = ")
            .unwrap()
            .1
            .trim_end()
            .trim_end_matches(';');
        let value: Value = serde_json::from_str(json).unwrap();
        let object = value.as_object().unwrap();
        let keys: Vec<&String> = object.keys().collect();
        assert_eq!(keys, ["2024", "2023"]); // insertion order preserved
        assert_eq!(object["2024"].as_array().unwrap().len(), 366);
        assert_eq!(object["2023"].as_array().unwrap().len(), 365);
    }

    #[test]
    fn empty_years_are_not_inserted_by_driver_contract() {
        let archive = ContributionArchive::default();
        assert!(archive.is_empty());
        assert_eq!(archive.len(), 0);
    }
}
