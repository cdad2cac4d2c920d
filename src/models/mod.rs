//! Data models for parsed requests and execution results.
//!
//! These types are shared by the parser, the executor, the notebook controller
//! and the group executor.

pub mod request;
pub mod response;

pub use request::{insert_header, HttpMethod, ParsedRequest};
pub use response::{ExecutionResult, ResponseData, Timing};
