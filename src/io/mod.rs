//! JSON projection of graphs.
//!
//! The write path turns a graph (or a selection of it) into a [`NodeDocument`]. The read
//! path never touches a graph directly: [`PasteContext::plan`] turns a document into a
//! [`PastePlan`], an [`Action`](crate::action::Action) plus diagnostics, which the caller
//! executes through its undo stack. Load, paste and import all go through this one path.

mod document;
mod reader;
mod resolver;
mod writer;

pub use document::{BlindDataDocument, ConnectionDocument, NodeDocument, TypedValueDocument};
pub use reader::{PasteContext, PastePlan};
pub use resolver::{FsResolver, MemoryResolver, SourceResolver};
pub use writer::{write_graph, write_node};

const TRACING_TARGET: &str = "renketsu::io";
