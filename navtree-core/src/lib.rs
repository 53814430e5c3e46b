pub mod ancestry;
pub mod api;
pub mod data;
pub mod error;
pub mod model;
pub mod mutation;
pub mod pages;
pub mod reorder;
pub mod repo;
pub mod tree;
pub mod validation;

pub use data::Database;
pub use error::{MenuError, Result};
pub use model::{ItemChanges, Link, LinkType, Menu, MenuItem, MenuLocation, NewMenuItem, Page};
pub use mutation::MenuEditor;
pub use pages::{PageRegistry, PageSet};
pub use reorder::{ReorderEntry, ReorderOutcome};
pub use tree::TreeNode;
