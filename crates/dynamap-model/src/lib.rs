//! DynamoDB wire types for the dynamap object mapper.
//!
//! This crate holds the encoded side of the mapper: `AttributeValue`, the
//! write-request inputs a transport sends, and decoding of the error bodies it
//! gets back. Everything here is plain data with serde derives; the mapping
//! logic lives in `dynamap-core`.
#![allow(clippy::doc_markdown)]
#![allow(clippy::module_name_repetitions)]

pub mod attribute_value;
pub mod error;
pub mod request;

pub use attribute_value::AttributeValue;
pub use error::{DynamoDBError, DynamoDBErrorCode};
pub use request::{AttributeMap, DeleteItemInput, PutItemInput, ReturnValue, UpdateItemInput};
