//! Prelude module for convenient imports
//!
//! Re-exports the types most hosts need to register node types, edit a session and read
//! back its graph.
//!
//! ```rust,no_run
//! use renketsu::prelude::*;
//!
//! # fn run_example() -> Result<()> {
//! let mut session = Session::builder()
//!     .with_config(SessionConfig::from_file("renketsu.json")?)
//!     .build();
//! let diagnostics = session.load("graph.json")?;
//! for diagnostic in diagnostics.iter() {
//!     println!("{}", diagnostic);
//! }
//! # Ok(())
//! # }
//! ```

// Session and history
pub use crate::action::{
    Action, Command, Diagnostic, Diagnostics, Severity, UndoStack, ValueSource,
};
pub use crate::session::{PasteOutcome, Session, SessionBuilder, SessionConfig};

// Graph model
pub use crate::graph::{
    ConnectionPolicy, Graph, Metadata, MetadataHandle, MetadataRegistry, Node, NodeId, Port,
    PortCategory, PortRef, Selection,
};

// Values
pub use crate::value::{PortValue, Position, TypedValue, ValueRegistry};

// Serialization and evaluation
pub use crate::evaluator::{ComputeContext, Evaluator};
pub use crate::io::{NodeDocument, SourceResolver};

// Error types
pub use crate::error::{ConfigError, EvaluationError, GraphError, LoadError, ValueError};

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
