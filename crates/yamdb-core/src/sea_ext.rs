use sea_orm::{DbErr, SqlErr};

/// Classify storage errors that map to client-visible outcomes.
pub trait DbErrExt {
    /// A unique index or primary key rejected the write.
    fn is_unique_violation(&self) -> bool;
}

impl DbErrExt for DbErr {
    fn is_unique_violation(&self) -> bool {
        matches!(self.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
    }
}
