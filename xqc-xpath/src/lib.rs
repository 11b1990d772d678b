//! Compile XPath expressions once and run them against XML documents.
//!
//! ```rust
//! use xqc_xpath::{Documents, Queries};
//!
//! let mut documents = Documents::new();
//! let doc = documents.add_string("<root><a>1</a><a>2</a></root>").unwrap();
//! let queries = Queries::default();
//! let query = queries.sequence("count(/root/a)").unwrap();
//! let result = query.execute(&mut documents, doc).unwrap();
//! assert_eq!(documents.display(&result), "2");
//! ```
mod documents;
mod error;
mod pattern;
mod queries;
mod query;

pub use documents::{DocumentHandle, Documents, Itemable};
pub use error::{Error, Result};
pub use pattern::MatchPattern;
pub use queries::Queries;
pub use query::Query;

pub use xqc_ast::{
    Diagnostic, DiagnosticSink, Error as ErrorCode, OptimizerConfig, SequenceType,
    StaticContextBuilder,
};
pub use xqc_interpreter::{
    Atomic, DynamicContext, DynamicContextBuilder, Item, KeyResolver, Sequence,
};
pub use xqc_name::Name;
