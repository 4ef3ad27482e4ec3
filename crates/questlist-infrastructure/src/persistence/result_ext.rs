use questlist_domain::shared::DomainError;

/// Maps sqlx failures into `DomainError::Repository` with an operation
/// label, logging once at the mapping site.
pub trait ResultExt<T> {
    fn map_repo_error(self, context: &str) -> Result<T, DomainError>;
}

impl<T> ResultExt<T> for Result<T, sqlx::Error> {
    fn map_repo_error(self, context: &str) -> Result<T, DomainError> {
        self.map_err(|e| {
            tracing::error!(operation = context, error = %e, "Database operation failed");
            DomainError::Repository(format!("{}: {}", context, e))
        })
    }
}
