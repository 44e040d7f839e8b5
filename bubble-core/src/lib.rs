//! Layout core for architectural bubble diagrams.
//!
//! Spaces are circles sized by area, joined by `necessary` or `ideal` adjacency
//! links. A force simulation arranges them while physics is on; a static collision
//! resolver keeps them apart while it is paused.

pub mod conflicts;
pub mod document;
pub mod graph;
pub mod interaction;
pub mod layout;
pub mod output;
pub mod parser;

mod diagram;
mod wasm;

pub use conflicts::{Conflicts, MissingPair};
pub use diagram::Diagram;
pub use document::{DiagramDocument, DocumentError, Settings};
pub use graph::{GraphStore, LinkChoice, LinkId, LinkKind, NodeId, NodeSpec, Point};
pub use interaction::{Interaction, InteractionController, Mode, Modifiers};
pub use layout::{Simulation, SimulationConfig};
pub use wasm::{DiagramHandle, init_logging};
