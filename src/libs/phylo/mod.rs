pub mod build;
pub mod cut;
pub mod error;
pub mod node;
pub mod parser;
pub mod tree;

pub use build::LeafHeight;
pub use error::TreeError;
pub use node::{Node, NodeId, NodeKind};
pub use tree::Tree;
