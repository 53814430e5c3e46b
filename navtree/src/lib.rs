// Include handlers module directly from handlers.rs
#[path = "handlers.rs"]
pub mod handlers;

pub mod commands;

// Re-export commonly used handler functions for convenience
pub use handlers::{
    Session, changes_from_args, expand_path, load_reorder_batch, payload_from_args, read_body,
    render_error, resolve_json_arg,
};
