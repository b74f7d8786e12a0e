//! Window discovery
//!
//! A window is one calendar day, `[start, start + 1 day)`. Before paging
//! through a site's rows, a cheap probe grouped by `date` finds the days
//! that have any data at all.
//!
//! The probe is a single unpaginated query. With the default 24-week
//! lookback it stays well below one page of results.

use super::dimension::Dimension;
use super::error::{ExtractResult, ShapeError};
use crate::client::{AnalyticsClient, QueryRequest};
use chrono::{Duration, NaiveDate};

/// Lookback used when there is neither a checkpoint nor a configured start date
pub const DEFAULT_LOOKBACK_WEEKS: i64 = 24;

/// Default first day to extract
pub fn default_start_date(today: NaiveDate) -> NaiveDate {
    today - Duration::weeks(DEFAULT_LOOKBACK_WEEKS)
}

/// A one-day extraction window, end exclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Window {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Window {
    /// Window covering a single day
    pub fn day(start: NaiveDate) -> Self {
        Self {
            start,
            end: start + Duration::days(1),
        }
    }
}

/// Days between `start_date` and `today` that have data, ascending
pub async fn discover_days(
    client: &dyn AnalyticsClient,
    site_url: &str,
    start_date: NaiveDate,
    today: NaiveDate,
) -> ExtractResult<Vec<NaiveDate>> {
    if start_date > today {
        tracing::debug!(site_url, %start_date, %today, "start date is in the future, nothing to probe");
        return Ok(Vec::new());
    }

    let request = QueryRequest {
        start_date,
        end_date: today,
        dimensions: vec![Dimension::Date],
        row_limit: None,
        start_row: None,
    };
    let response = client.query(site_url, &request).await?;

    let mut days = response
        .rows
        .iter()
        .map(|row| match row.keys.as_slice() {
            [key] => NaiveDate::parse_from_str(key, "%Y-%m-%d")
                .map_err(|_| ShapeError::InvalidDate(key.clone())),
            keys => Err(ShapeError::DimensionCount {
                expected: 1,
                actual: keys.len(),
            }),
        })
        .collect::<Result<Vec<_>, _>>()?;

    // The backend sorts by date already
    days.sort_unstable();
    days.dedup();

    Ok(days)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{ClientError, QueryResponse, SiteEntry};
    use crate::stream::ExtractError;
    use crate::testing::{day, page, ScriptedClient};

    fn client() -> ScriptedClient {
        ScriptedClient::new(vec![SiteEntry::new("https://example.com/", "siteOwner")])
    }

    #[test]
    fn test_default_start_date_is_24_weeks_back() {
        assert_eq!(default_start_date(day(2021, 6, 18)), day(2021, 1, 1));
    }

    #[test]
    fn test_window_is_one_day() {
        let window = Window::day(day(2020, 12, 31));
        assert_eq!(window.start, day(2020, 12, 31));
        assert_eq!(window.end, day(2021, 1, 1));
    }

    #[tokio::test]
    async fn test_probe_uses_date_dimension_over_full_span() {
        let client = client().on_query(|_, _| {
            Ok(page(vec![
                vec!["2021-01-01".to_string()],
                vec!["2021-01-02".to_string()],
            ]))
        });

        let days = discover_days(&client, "https://example.com/", day(2021, 1, 1), day(2021, 1, 10))
            .await
            .unwrap();
        assert_eq!(days, vec![day(2021, 1, 1), day(2021, 1, 2)]);

        let requests = client.requests();
        assert_eq!(requests.len(), 1);
        let (site, request) = &requests[0];
        assert_eq!(site, "https://example.com/");
        assert_eq!(request.start_date, day(2021, 1, 1));
        assert_eq!(request.end_date, day(2021, 1, 10));
        assert_eq!(request.dimensions, vec![Dimension::Date]);
        assert_eq!(request.start_row, None);
    }

    #[tokio::test]
    async fn test_days_come_back_ascending() {
        let client = client().on_query(|_, _| {
            Ok(page(vec![
                vec!["2021-01-03".to_string()],
                vec!["2021-01-01".to_string()],
                vec!["2021-01-03".to_string()],
            ]))
        });

        let days = discover_days(&client, "https://example.com/", day(2021, 1, 1), day(2021, 1, 10))
            .await
            .unwrap();
        assert_eq!(days, vec![day(2021, 1, 1), day(2021, 1, 3)]);
    }

    #[tokio::test]
    async fn test_no_rows_means_no_days() {
        let client = client().on_query(|_, _| Ok(QueryResponse::default()));
        let days = discover_days(&client, "https://example.com/", day(2021, 1, 1), day(2021, 1, 10))
            .await
            .unwrap();
        assert!(days.is_empty());
    }

    #[tokio::test]
    async fn test_future_start_skips_probe() {
        let client = client();
        let days = discover_days(&client, "https://example.com/", day(2021, 1, 11), day(2021, 1, 10))
            .await
            .unwrap();
        assert!(days.is_empty());
        assert!(client.requests().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_date_key() {
        let client = client().on_query(|_, _| Ok(page(vec![vec!["last tuesday".to_string()]])));
        let err = discover_days(&client, "https://example.com/", day(2021, 1, 1), day(2021, 1, 10))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ExtractError::Shape(ShapeError::InvalidDate(ref key)) if key == "last tuesday"
        ));
    }

    #[tokio::test]
    async fn test_adapter_failure_propagates() {
        let client = client().on_query(|_, _| Err(ClientError::Timeout));
        let err = discover_days(&client, "https://example.com/", day(2021, 1, 1), day(2021, 1, 10))
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::Adapter(ClientError::Timeout)));
    }
}
