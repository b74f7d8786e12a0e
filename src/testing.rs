//! Test doubles for the backend adapter and the sink

use crate::client::{AnalyticsClient, ClientError, QueryRequest, QueryResponse, Row, SiteEntry};
use crate::sink::{Sink, SinkError};
use crate::state::TapState;
use crate::stream::Record;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;
use std::sync::Mutex;

type QueryHandler =
    Box<dyn Fn(&str, &QueryRequest) -> Result<QueryResponse, ClientError> + Send + Sync>;

/// Backend answering queries from a closure and recording every request
pub(crate) struct ScriptedClient {
    sites: Vec<SiteEntry>,
    list_fails: bool,
    handler: QueryHandler,
    requests: Mutex<Vec<(String, QueryRequest)>>,
}

impl ScriptedClient {
    pub fn new(sites: Vec<SiteEntry>) -> Self {
        Self {
            sites,
            list_fails: false,
            handler: Box::new(|_, _| Ok(QueryResponse::default())),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn on_query<F>(mut self, handler: F) -> Self
    where
        F: Fn(&str, &QueryRequest) -> Result<QueryResponse, ClientError> + Send + Sync + 'static,
    {
        self.handler = Box::new(handler);
        self
    }

    pub fn failing_list(mut self) -> Self {
        self.list_fails = true;
        self
    }

    pub fn requests(&self) -> Vec<(String, QueryRequest)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl AnalyticsClient for ScriptedClient {
    async fn list_sites(&self) -> Result<Vec<SiteEntry>, ClientError> {
        if self.list_fails {
            return Err(ClientError::Unavailable);
        }
        Ok(self.sites.clone())
    }

    async fn query(
        &self,
        site_url: &str,
        request: &QueryRequest,
    ) -> Result<QueryResponse, ClientError> {
        self.requests
            .lock()
            .unwrap()
            .push((site_url.to_string(), request.clone()));
        (self.handler)(site_url, request)
    }
}

/// Sink keeping every message in memory
#[derive(Default)]
pub(crate) struct MemorySink {
    pub schemas: Vec<(String, Value, Vec<String>)>,
    pub records: Vec<(String, Record)>,
    pub states: Vec<Value>,
    pub flushed: bool,
    /// Fail the write of the record at this index
    pub fail_record_at: Option<usize>,
}

impl MemorySink {
    /// String values of one field across all records
    pub fn field_values(&self, field: &str) -> Vec<String> {
        self.records
            .iter()
            .filter_map(|(_, record)| record.get_str(field).map(str::to_string))
            .collect()
    }
}

impl Sink for MemorySink {
    fn write_schema(
        &mut self,
        stream_id: &str,
        schema: &Value,
        key_properties: &[String],
        _bookmark_properties: &[String],
    ) -> Result<(), SinkError> {
        self.schemas
            .push((stream_id.to_string(), schema.clone(), key_properties.to_vec()));
        Ok(())
    }

    fn write_record(
        &mut self,
        stream_id: &str,
        record: &Record,
        _time_extracted: DateTime<Utc>,
    ) -> Result<(), SinkError> {
        if self.fail_record_at == Some(self.records.len()) {
            return Err(SinkError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "reader went away",
            )));
        }
        self.records.push((stream_id.to_string(), record.clone()));
        Ok(())
    }

    fn write_state(&mut self, state: &TapState) -> Result<(), SinkError> {
        self.states.push(state.as_value().clone());
        Ok(())
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        self.flushed = true;
        Ok(())
    }
}

pub(crate) fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Response holding one row per key list
pub(crate) fn page<I, K>(rows: I) -> QueryResponse
where
    I: IntoIterator<Item = K>,
    K: IntoIterator<Item = String>,
{
    QueryResponse {
        rows: rows.into_iter().map(Row::from_keys).collect(),
        response_aggregation_type: None,
    }
}

/// Response holding `count` single-key rows named `{prefix}{n}`
pub(crate) fn numbered_page(prefix: &str, start: usize, count: usize) -> QueryResponse {
    page((start..start + count).map(|n| vec![format!("{prefix}{n}")]))
}
