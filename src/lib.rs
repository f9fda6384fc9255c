//! # facetql
//!
//! A small declarative query language for faceted browsing over graph
//! data. Expressions combine typed value collections with multi-hop graph
//! traversals:
//!
//! ```text
//! if(exists(.director), concat(.label, ' by ', .director . label), .label)
//! ```
//!
//! The crate provides the value model ([`Value`], [`ValueType`],
//! [`Collection`]), the expression tree ([`Expression`]) with its
//! [`Parser`], the [`Database`] trait the path walker traverses (plus an
//! in-memory implementation), and JSON conversion of results.
//!
//! ## Quick start
//!
//! ```
//! use facetql::{EvalContext, MemoryDatabase, Parser, RootValue, Value, ValueType};
//!
//! let mut db = MemoryDatabase::new();
//! db.define_property("age", ValueType::Number);
//! db.add_statement(Value::Item("ada".into()), "age", Value::Number(36.0));
//!
//! let ctx = EvalContext::with_single_root(
//!     "value",
//!     RootValue::Single(Value::Item("ada".into())),
//!     ValueType::Item,
//!     &db,
//! );
//! let expr = Parser::parse(".age * 2").unwrap();
//! let result = expr.evaluate(&ctx).unwrap();
//! assert!(result.contains(&Value::Number(72.0)));
//! ```

pub mod ast;
pub mod collection;
pub mod context;
pub mod controls;
pub mod database;
pub mod error;
pub mod evaluator;
pub mod functions;
pub mod lexer;
pub mod output;
pub mod parser;
pub mod path;
pub mod value;

pub use ast::{BinOp, Control, Expression, Token};
pub use collection::{Backing, Collection};
pub use context::{EvalContext, RootValue, VALUE_ROOT};
pub use database::{Database, MemoryDatabase, Property};
pub use error::{EvalError, ParseError};
pub use evaluator::evaluate;
pub use functions::Function;
pub use lexer::Lexer;
pub use output::{collection_to_json, to_json, to_json_pretty, value_to_json};
pub use parser::Parser;
pub use path::{Path, RangeResult, Segment};
pub use value::{Value, ValueType};
