use thiserror::Error;

/// Classified MySQL server error numbers, per spec §7's mapping table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MysqlErrorCode {
    UnknownColumn,
    UnknownTable,
    SyntaxError,
    GroupByViolation,
    DuplicateColumn,
    DuplicateKey,
    FkConstraintFailed,
    Other(u16),
}

impl MysqlErrorCode {
    pub fn from_errno(errno: u16) -> Self {
        match errno {
            1054 => MysqlErrorCode::UnknownColumn,
            1146 => MysqlErrorCode::UnknownTable,
            1064 => MysqlErrorCode::SyntaxError,
            1055 => MysqlErrorCode::GroupByViolation,
            1060 => MysqlErrorCode::DuplicateColumn,
            1061 => MysqlErrorCode::DuplicateKey,
            1822 => MysqlErrorCode::FkConstraintFailed,
            other => MysqlErrorCode::Other(other),
        }
    }

    /// A short, user-facing message for this error code, independent of the
    /// raw driver message.
    pub fn user_message(&self) -> &'static str {
        match self {
            MysqlErrorCode::UnknownColumn => "Unknown column specified. Check spelling/tables.",
            MysqlErrorCode::UnknownTable => "Table does not exist.",
            MysqlErrorCode::SyntaxError => "Syntax error in SQL. Check query builder logic.",
            MysqlErrorCode::GroupByViolation => "GROUP BY clause is incompatible with the selected columns.",
            MysqlErrorCode::DuplicateColumn => "Column already exists.",
            MysqlErrorCode::DuplicateKey => "Constraint name already exists.",
            MysqlErrorCode::FkConstraintFailed => "Foreign key constraint could not be created.",
            MysqlErrorCode::Other(_) => "Database error.",
        }
    }
}

/// The error taxonomy of the SQL construction layer (spec §7).
#[derive(Debug, Error)]
pub enum SqlError {
    #[error("{0}")]
    InputValidation(String),

    #[error("table '{0}' not found")]
    UnknownTable(String),

    #[error("{0}")]
    SchemaIntrospection(String),

    #[error("functional dependency error: {0}")]
    FdInconsistency(#[from] normform_core::error::FdError),

    #[error("decomposition invariant violated: {0}")]
    DecompositionInvariant(String),

    #[error("database error ({code:?}): {message} (sql: {sql_attempted:?})")]
    Database {
        code: MysqlErrorCode,
        message: String,
        sql_attempted: Option<String>,
    },

    #[error("database connection failed: {0}")]
    ConnectionFailure(String),
}

impl SqlError {
    pub fn database(errno: u16, message: impl Into<String>, sql_attempted: Option<String>) -> Self {
        let code = MysqlErrorCode::from_errno(errno);
        SqlError::Database {
            code,
            message: message.into(),
            sql_attempted,
        }
    }
}
