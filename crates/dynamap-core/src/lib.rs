//! Object mapping core for DynamoDB items.
//!
//! This crate provides the pieces between an in-memory object and the write
//! requests a transport sends for it:
//!
//! - [`expression`]: the condition AST, its combinators, and rendering into
//!   expressions with placeholder tables.
//! - [`tracking`]: per-object pending changes and the last-synced snapshot.
//! - [`update`]: `SET`/`REMOVE` plans and the atomic (compare-and-swap)
//!   condition derived from tracking state.
//! - [`request`]: `UpdateItem`/`PutItem`/`DeleteItem` inputs built from the above.
//! - [`schema`], [`codec`], [`value`], [`item`]: the models, column codecs and
//!   values these operate on.
//!
//! Everything is synchronous and in-memory; no I/O happens here. Tracked
//! objects are `!Sync`, so a single object cannot be mutated from several
//! threads without a lock. Concurrent writers to the same remote item are
//! arbitrated by the store through the atomic condition, not locally.
//!
//! ```
//! use dynamap_core::codec;
//! use dynamap_core::item::Item;
//! use dynamap_core::schema::{Column, ModelMeta};
//! use dynamap_core::update::get_update;
//!
//! let meta = ModelMeta::builder("User")
//!     .column(Column::new("id", codec::string()).as_hash_key())
//!     .column(Column::new("email", codec::string()))
//!     .build()?;
//! let mut user = Item::new(meta);
//! user.set("id", "u1")?;
//! user.set("email", "a@b.com")?;
//!
//! let plan = get_update(&user);
//! assert_eq!(plan.set.len(), 1);
//! assert!(plan.remove.is_empty());
//! # Ok::<(), dynamap_core::DynamapError>(())
//! ```
#![allow(clippy::doc_markdown)]
#![allow(clippy::module_name_repetitions)]

pub mod codec;
pub mod config;
pub mod error;
pub mod expression;
pub mod item;
pub mod request;
pub mod schema;
pub mod tracking;
pub mod update;
pub mod value;

pub use config::MapperConfig;
pub use error::{DynamapError, DynamapResult};
pub use expression::{ColumnRef, CompareOp, Condition, ConditionValue, ExpressionRenderer};
pub use item::{Item, Tracked};
pub use schema::{Column, ModelMeta, ModelRegistry};
pub use tracking::{ModifyMode, Tracking};
pub use update::UpdatePlan;
pub use value::Value;
