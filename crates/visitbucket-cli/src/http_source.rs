//! HTTP client for the access-report service.

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::Client;
use tracing::debug;
use visitbucket_core::source::{record_from_json, records_from_json, timestamps_from_json};
use visitbucket_core::{AccessRecord, RecordCollection, RecordSource, Result, VisitBucketError};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct HttpSource {
    client: Client,
    host: String,
    token: String,
}

impl HttpSource {
    pub fn new(host: &str, token: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(transport_failure)?;

        Ok(Self {
            client,
            host: host.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    /// GET an API endpoint; anything but 200 is returned as a transport error
    /// carrying the raw status and body.
    fn get(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<String> {
        let url = format!("{}/api/v1/{}", self.host, endpoint);
        debug!(%url, ?params, "Requesting access reports");

        let response = self
            .client
            .get(&url)
            .query(&[("token", self.token.as_str())])
            .query(params)
            .send()
            .map_err(transport_failure)?;

        let status = response.status();
        let body = response.text().map_err(transport_failure)?;

        if status != StatusCode::OK {
            return Err(VisitBucketError::TransportError {
                status: Some(status.as_u16()),
                body,
            });
        }

        Ok(body)
    }
}

fn transport_failure(err: reqwest::Error) -> VisitBucketError {
    VisitBucketError::TransportError {
        status: err.status().map(|s| s.as_u16()),
        body: err.to_string(),
    }
}

impl RecordSource for HttpSource {
    fn fetch_timestamps_in_range(&self, start: &str, end: &str) -> Result<Vec<String>> {
        let body = self.get(
            "getAccessReportTimestamps",
            &[("start", start), ("end", end)],
        )?;
        timestamps_from_json(&body)
    }

    fn fetch_record_by_timestamp(&self, timestamp: &str) -> Result<AccessRecord> {
        let body = self.get("getAccessReportByTimestamp", &[("timestamp", timestamp)])?;
        record_from_json(timestamp, &body)
    }

    fn fetch_records_in_range(&self, start: &str, end: &str) -> Result<RecordCollection> {
        let body = self.get(
            "getAccessReportsByRange",
            &[("start", start), ("end", end)],
        )?;
        let records = records_from_json(&body)?;
        debug!(count = records.len(), "Fetched access reports");
        Ok(records)
    }
}
