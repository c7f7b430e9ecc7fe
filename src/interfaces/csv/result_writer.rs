use crate::domain::outcome::{DispatchResult, QueryResult};
use crate::domain::request::TransactionRequest;
use crate::error::Result;
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Serialize)]
struct ResultRecord<'a> {
    caller: &'a str,
    method: &'a str,
    status: &'static str,
    reference: String,
}

/// Writes one CSV row per dispatched request: `caller,method,status,reference`.
///
/// `reference` is the tx hash for `direct`, the submission id for `queued`,
/// the JSON response for `ok` (queries) and the failure cause for `failed`.
pub struct ResultWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> ResultWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_dispatch(
        &mut self,
        request: &TransactionRequest,
        result: &DispatchResult,
    ) -> Result<()> {
        let (status, reference) = match result {
            DispatchResult::Direct { tx_hash } => ("direct", tx_hash.to_string()),
            DispatchResult::Queued { submission_id } => ("queued", submission_id.to_string()),
            DispatchResult::Failed { cause } => ("failed", cause.to_string()),
        };
        self.write(request, status, reference)
    }

    pub fn write_query(&mut self, request: &TransactionRequest, result: &QueryResult) -> Result<()> {
        let (status, reference) = match result {
            Ok(response) => ("ok", response.to_string()),
            Err(cause) => ("failed", cause.to_string()),
        };
        self.write(request, status, reference)
    }

    fn write(
        &mut self,
        request: &TransactionRequest,
        status: &'static str,
        reference: String,
    ) -> Result<()> {
        self.writer.serialize(ResultRecord {
            caller: request.caller().as_str(),
            method: request.method().as_str(),
            status,
            reference,
        })?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
