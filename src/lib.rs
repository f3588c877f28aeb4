//! Load, query and render Doxygen navigation trees.
//!
//! ```
//! let tree = navtree::domain::load_str(r#"[["A","a.html",null]]"#).unwrap();
//! let top = tree.children_of(tree.root()).unwrap()[0];
//! assert_eq!(tree.label_of(top).unwrap(), "A");
//! assert_eq!(tree.link_of(top).unwrap(), "a.html");
//! ```

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod tree_traits;
pub mod util;
