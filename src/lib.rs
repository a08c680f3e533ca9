//! # Renketsu - Node Graph Engine
//!
//! **Renketsu** holds a directed graph of computation nodes connected by typed ports,
//! mutates it transactionally with undo/redo, and projects it to and from JSON for save,
//! load and copy/paste. It does not know what a node computes: node types are registered
//! by the host as [`Metadata`](graph::Metadata) (a name, an ordered port list and an
//! optional compute callback).
//!
//! ## Core Workflow
//!
//! 1.  **Register Types**: Describe each node type with [`Metadata::builder`](graph::Metadata::builder)
//!     and register it on a [`SessionBuilder`](session::SessionBuilder). Custom value types
//!     implement [`PortValue`](value::PortValue).
//! 2.  **Edit**: Every operation of a [`Session`](session::Session) (create, connect, set a
//!     value, paste, ...) runs as one undoable [`Action`](action::Action).
//! 3.  **Persist**: Save and load the root graph, or copy a selection to the clipboard and
//!     paste it anywhere. Documents referencing missing node types still load everything
//!     else and report what was skipped as [`Diagnostics`](action::Diagnostics).
//! 4.  **Evaluate**: Pull values through the graph with [`Session::evaluate`](session::Session::evaluate).
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use renketsu::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let constant = Metadata::builder("source/constant")
//!         .input("value", 0.0f32)
//!         .output("out", 0.0f32)
//!         .compute(|ctx| {
//!             let value = *ctx.get::<f32>("value")?;
//!             ctx.set("out", value)
//!         })
//!         .build();
//!     let double = Metadata::builder("math/double")
//!         .input("a", 0.0f32)
//!         .output("out", 0.0f32)
//!         .compute(|ctx| {
//!             let a = *ctx.get::<f32>("a")?;
//!             ctx.set("out", a * 2.0)
//!         })
//!         .build();
//!
//!     let mut session = Session::builder()
//!         .with_metadata(constant.clone())
//!         .with_metadata(double.clone())
//!         .build();
//!
//!     let source = session.create_node(None, &constant, "five", TypedValue::empty())?;
//!     let target = session.create_node(None, &double, "double", TypedValue::empty())?;
//!     session.set_value(source, "value", TypedValue::new(5.0f32));
//!     session.connect_by_name(source, "out", target, "a");
//!
//!     session.evaluate(target)?;
//!     let out = session.graph().node(target).and_then(|n| n.find_port("out"));
//!     println!("{:?}", out.map(|p| p.value().to_string()));
//!
//!     // One undo step per operation.
//!     session.undo()?;
//!     session.save("graph.json")?;
//!     Ok(())
//! }
//! ```

pub mod action;
pub mod error;
pub mod evaluator;
pub mod graph;
pub mod io;
pub mod prelude;
pub mod session;
pub mod value;
