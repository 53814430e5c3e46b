use thiserror::Error;

#[derive(Error, Debug)]
pub enum MenuError {
    #[error("Invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("Item {item_id} belongs to menu {other_menu_id}, not menu {menu_id}")]
    CrossMenuReference {
        item_id: i64,
        menu_id: i64,
        other_menu_id: i64,
    },

    #[error("Item {parent_id} is item {item_id} or one of its descendants")]
    CycleDetected { item_id: i64, parent_id: i64 },

    #[error("Reorder rejected at item {item_id}: {cause}")]
    ReorderRejected { item_id: i64, cause: Box<MenuError> },

    #[error("Item {item_id} references parent {parent_id} outside its menu tree")]
    OrphanReference { item_id: i64, parent_id: i64 },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl MenuError {
    pub fn validation(field: &str, reason: impl Into<String>) -> Self {
        MenuError::Validation {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        MenuError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn rejected(item_id: i64, cause: MenuError) -> Self {
        MenuError::ReorderRejected {
            item_id,
            cause: Box::new(cause),
        }
    }

    /// Stable machine-readable code used in error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            MenuError::Validation { .. } => "validation_error",
            MenuError::NotFound { .. } => "not_found",
            MenuError::CrossMenuReference { .. } => "cross_menu_reference",
            MenuError::CycleDetected { .. } => "cycle_detected",
            MenuError::ReorderRejected { .. } => "reorder_rejected",
            MenuError::OrphanReference { .. } => "orphan_reference",
            MenuError::Database(_) | MenuError::Serialization(_) => "internal",
        }
    }

    /// HTTP-equivalent status for the router in front of the engine.
    pub fn status_code(&self) -> u16 {
        match self {
            MenuError::Validation { .. } => 400,
            MenuError::NotFound { .. } => 404,
            MenuError::CrossMenuReference { .. } | MenuError::CycleDetected { .. } => 409,
            MenuError::ReorderRejected { .. } => 422,
            MenuError::OrphanReference { .. }
            | MenuError::Database(_)
            | MenuError::Serialization(_) => 500,
        }
    }

    /// The innermost error, looking through `ReorderRejected` wrappers.
    pub fn root_cause(&self) -> &MenuError {
        match self {
            MenuError::ReorderRejected { cause, .. } => cause.root_cause(),
            other => other,
        }
    }

    /// Orphans and storage failures mean corrupted state, not a bad request.
    pub fn is_internal(&self) -> bool {
        self.status_code() >= 500
    }
}

pub type Result<T> = std::result::Result<T, MenuError>;
