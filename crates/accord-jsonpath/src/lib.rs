//! Accord JSON path engine.
//!
//! Turns a contract body into the ordered set of JSON path assertions a
//! generated test or a stub uses to verify a real payload.
//!
//! The pipeline:
//!
//! 1. [`remove_matched_paths`] deletes the values claimed by explicit
//!    [`Matcher`]s and collapses the containers they leave empty.
//! 2. [`JsonPathsConverter`] resolves the body for one [`Side`] and walks it
//!    with the traversal engine, producing [`JsonPaths`].
//! 3. [`to_filter_expression`] renders each explicit matcher as a filter
//!    expression; [`PathAssertion::to_filter`] does the same for emitted
//!    assertions.
//!
//! ```
//! use accord_jsonpath::{ContractBody, JsonPathsConverter};
//! use serde_json::json;
//!
//! let body = ContractBody::from(json!({"id": 1, "name": "Joe"}));
//! let paths = JsonPathsConverter::default().server_side_paths(&body).unwrap();
//! let rendered: Vec<String> = paths.iter().map(|p| p.to_filter()).collect();
//! assert_eq!(rendered, vec!["$[?(@.id == 1)]", "$[?(@.name == 'Joe')]"]);
//! ```

pub mod cleanup;
pub mod config;
pub mod converter;
pub mod cursor;
pub mod error;
pub mod filter;
pub mod generate;
pub mod model;
pub mod path;
pub mod traversal;
pub mod verify;

pub use cleanup::{remove_matched_paths, remove_matched_paths_with_limit};
pub use config::{ConverterConfig, DEFAULT_MAX_DEPTH};
pub use converter::{BodyParser, JsonBodyParser, JsonPaths, JsonPathsConverter, RawTextParser};
pub use cursor::{ArrayMode, Assertion, Cursor, PathAssertion};
pub use error::{EngineError, Result};
pub use filter::to_filter_expression;
pub use generate::generated_value_if_needed;
pub use model::{
    ContractBody, Interpolated, InterpolatedPart, Matcher, MatchingType, ObjectMap, Scalar, Side,
    ValueNode, ISO_DATE, ISO_DATE_TIME, ISO_TIME,
};
pub use path::{read_element, JsonPath, Read, Segment};
pub use traversal::Traversal;
