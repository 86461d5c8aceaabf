pub mod customers;
pub mod products;
pub mod users;

/// Constraint name reported by a unique violation, if `err` is one.
pub fn unique_violation(err: &sqlx::Error) -> Option<&str> {
    match err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            Some(db_err.constraint().unwrap_or_default())
        }
        _ => None,
    }
}
