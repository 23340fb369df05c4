//! Core data model for the insider-threat detection pipeline.
//!
//! Entities: [`Actor`], [`Document`], [`Event`], [`Alert`], [`Explanation`],
//! [`ModificationRecord`]. All are owned by the persistent store; the worker
//! only ever holds transient references while processing one event.

mod actor;
mod alert;
mod document;
mod enums;
mod event;
mod explanation;
mod modification;

pub use actor::*;
pub use alert::*;
pub use document::*;
pub use enums::*;
pub use event::*;
pub use explanation::*;
pub use modification::*;
