use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("database error: {0}")]
    Sqlx(sqlx::Error),

    #[error("record not found")]
    NotFound,

    #[error("conflicting record already exists")]
    Duplicate,
}

impl From<sqlx::Error> for DatabaseError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => DatabaseError::NotFound,
            sqlx::Error::Database(db_err) => {
                // 23505 unique_violation, 23P01 exclusion_violation
                match db_err.code().as_deref() {
                    Some("23505") | Some("23P01") => DatabaseError::Duplicate,
                    _ => DatabaseError::Sqlx(err),
                }
            }
            _ => DatabaseError::Sqlx(err),
        }
    }
}
