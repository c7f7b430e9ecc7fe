//! CSV batch interface: request rows in, one result row per request out.

pub mod request_reader;
pub mod result_writer;
