//! Row pagination
//!
//! Pulls every row of one window by advancing `startRow` until a page
//! comes back shorter than the row limit.

use super::dimension::Dimension;
use super::windows::Window;
use crate::client::{AnalyticsClient, ClientError, QueryRequest, Row};

/// Rows requested per page
pub const ROW_LIMIT: u32 = 1000;

/// Pull-based pager over one site and window
pub struct Paginator<'a> {
    client: &'a dyn AnalyticsClient,
    site_url: &'a str,
    request: QueryRequest,
    row_limit: u32,
    exhausted: bool,
    pages_fetched: u32,
}

impl<'a> Paginator<'a> {
    pub fn new(
        client: &'a dyn AnalyticsClient,
        site_url: &'a str,
        window: Window,
        dimensions: &[Dimension],
    ) -> Self {
        Self::with_row_limit(client, site_url, window, dimensions, ROW_LIMIT)
    }

    /// Pager with a custom page size
    pub fn with_row_limit(
        client: &'a dyn AnalyticsClient,
        site_url: &'a str,
        window: Window,
        dimensions: &[Dimension],
        row_limit: u32,
    ) -> Self {
        Self {
            client,
            site_url,
            request: QueryRequest {
                start_date: window.start,
                end_date: window.end,
                dimensions: dimensions.to_vec(),
                row_limit: Some(row_limit),
                start_row: Some(0),
            },
            row_limit,
            exhausted: false,
            pages_fetched: 0,
        }
    }

    /// Fetch the next page, or `None` once the last page was returned
    pub async fn next_page(&mut self) -> Result<Option<Vec<Row>>, ClientError> {
        if self.exhausted {
            return Ok(None);
        }

        let response = self.client.query(self.site_url, &self.request).await?;
        let rows = response.rows;
        self.pages_fetched += 1;

        if rows.len() < self.row_limit as usize {
            self.exhausted = true;
        } else {
            let start_row = self.request.start_row.unwrap_or(0);
            match start_row.checked_add(self.row_limit) {
                Some(next) => self.request.start_row = Some(next),
                None => {
                    tracing::warn!(
                        site_url = self.site_url,
                        start_row,
                        "row offset limit reached, ending window"
                    );
                    self.exhausted = true;
                }
            }
        }

        tracing::trace!(
            site_url = self.site_url,
            start_date = %self.request.start_date,
            page = self.pages_fetched,
            rows = rows.len(),
            "fetched page"
        );

        Ok(Some(rows))
    }

    /// Drain every remaining page into one list
    #[cfg(test)]
    async fn collect_rows(mut self) -> Result<Vec<Row>, ClientError> {
        let mut all = Vec::new();
        while let Some(rows) = self.next_page().await? {
            all.extend(rows);
        }
        Ok(all)
    }

    pub fn pages_fetched(&self) -> u32 {
        self.pages_fetched
    }

    #[cfg(test)]
    fn is_exhausted(&self) -> bool {
        self.exhausted
    }
}
