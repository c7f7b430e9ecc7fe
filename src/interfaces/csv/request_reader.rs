use crate::domain::method::ChainMethod;
use crate::domain::request::{CallerId, TransactionRequest};
use crate::error::{DispatchError, Result};
use serde::Deserialize;
use serde_json::Value;
use std::io::Read;

/// One row of a request batch.
///
/// `params` holds a JSON array of positional params, or a JSON object used
/// as the request body.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct RequestRecord {
    pub caller: String,
    pub method: ChainMethod,
    #[serde(default)]
    pub force: Option<bool>,
    #[serde(default)]
    pub params: String,
}

impl TryFrom<RequestRecord> for TransactionRequest {
    type Error = DispatchError;

    fn try_from(record: RequestRecord) -> Result<Self> {
        if record.caller.is_empty() {
            return Err(DispatchError::InvalidRequest("caller is empty".to_string()));
        }

        let params = if record.params.is_empty() {
            Vec::new()
        } else {
            match serde_json::from_str(&record.params)? {
                Value::Array(values) => values,
                object @ Value::Object(_) => vec![object],
                other => {
                    return Err(DispatchError::InvalidRequest(format!(
                        "params must be a JSON array or object, got {}",
                        other
                    )));
                }
            }
        };

        Ok(
            TransactionRequest::new(record.method, params, CallerId::new(record.caller))
                .force_always(record.force.unwrap_or(false)),
        )
    }
}

/// Reads dispatch requests from a CSV source.
///
/// This reader wraps `csv::Reader` and provides an iterator over
/// `Result<TransactionRequest>`. It trims whitespace and tolerates short rows.
/// Quoted fields (such as JSON params) must start right after the comma.
pub struct RequestReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> RequestReader<R> {
    /// Creates a new `RequestReader` from any `Read` source (e.g., File, Stdin).
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Returns an iterator that lazily reads and converts requests.
    pub fn requests(self) -> impl Iterator<Item = Result<TransactionRequest>> {
        self.reader
            .into_deserialize::<RequestRecord>()
            .map(|result| TransactionRequest::try_from(result?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_reader_valid_stream() {
        let data = r#"caller,method,force,params
alice,createCar,false,"[""car1"",""Toyota"",""Corolla"",""Blue"",""Alice""]"
bob,createCar,true,"{""Key"":""car2""}"
carol,queryAllCars,,
"#;
        let reader = RequestReader::new(data.as_bytes());
        let results: Vec<Result<TransactionRequest>> = reader.requests().collect();

        assert_eq!(results.len(), 3);
        let first = results[0].as_ref().unwrap();
        assert_eq!(first.caller().as_str(), "alice");
        assert_eq!(first.params().len(), 5);
        assert!(!first.is_forced());

        let second = results[1].as_ref().unwrap();
        assert!(second.is_forced());
        assert_eq!(second.params(), &[json!({"Key": "car2"})]);

        let third = results[2].as_ref().unwrap();
        assert_eq!(third.method(), ChainMethod::QueryAllCars);
        assert!(third.params().is_empty());
    }

    #[test]
    fn test_reader_malformed_lines() {
        let data = r#"caller,method,force,params
alice,launchRocket,false,"[]"
alice,createCar,false,not-json
alice,createCar,false,"42"
,createCar,false,"[]"
"#;
        let reader = RequestReader::new(data.as_bytes());
        let results: Vec<Result<TransactionRequest>> = reader.requests().collect();

        assert_eq!(results.len(), 4);
        assert!(results.iter().all(|r| r.is_err()));
    }
}
