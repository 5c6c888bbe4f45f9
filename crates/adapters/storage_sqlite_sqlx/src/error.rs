//! Storage-specific error type wrapping sqlx errors.

use gardenhub_domain::error::GardenHubError;

/// Errors originating from the `SQLite` storage layer.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// A query or connection failed.
    #[error("database error")]
    Database(#[from] sqlx::Error),

    /// Failed to run migrations.
    #[error("migration error")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl StorageError {
    /// Convert into a [`GardenHubError::Storage`].
    pub fn into_domain(self) -> GardenHubError {
        GardenHubError::Storage(Box::new(self))
    }
}

impl From<StorageError> for GardenHubError {
    fn from(err: StorageError) -> Self {
        err.into_domain()
    }
}

/// Wrap a column conversion failure as a sqlx decode error.
pub(crate) fn decode(err: impl std::error::Error + Send + Sync + 'static) -> sqlx::Error {
    sqlx::Error::Decode(Box::new(err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_convert_database_error_to_storage_error() {
        let err: GardenHubError = StorageError::from(sqlx::Error::RowNotFound).into();
        assert!(matches!(err, GardenHubError::Storage(_)));
    }
}
