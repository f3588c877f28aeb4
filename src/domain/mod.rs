//! Domain layer: navigation data model and tree logic
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod error;
pub mod literal;
pub mod loader;
pub mod serialize;

pub use arena::{NavTree, NodeData, NodeRef, Shape, TreeNode};
pub use error::{DomainError, DomainResult};
pub use literal::{is_navigation_script, parse_literal, Binding, Literal, Script, MAX_NESTING};
pub use loader::{
    load, load_str, FragmentResolver, NavTreeLoader, NoFragments, MAX_DEPTH, ROOT_BINDING,
};
pub use serialize::{to_expanded_literal, to_literal, to_script};
