//! Field checks. Each check reports its own [`FieldError`]; [`both`] runs two
//! of them so a request gets all of its field errors at once.

use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;

use crate::error::FieldError;

static PASSWORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9A-Za-z_-]{8,60}$").unwrap());

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap());

/// Upper bound (exclusive) of a NUMERIC(12,2) column.
static MAX_PRICE: LazyLock<Decimal> = LazyLock::new(|| Decimal::from(10_000_000_000_i64));

pub const PASSWORD_MESSAGE: &str = "The password is invalid. It must be 8 to 60 characters long \
     and contain only letters, digits, \"-\" or \"_\".";

pub const ALREADY_USED: &str = "This value is already used.";

pub type Checked<T> = Result<T, FieldError>;

/// Combine two checks, keeping every failure.
pub fn both<A, B>(a: Checked<A>, b: Checked<B>) -> Result<(A, B), Vec<FieldError>> {
    match (a, b) {
        (Ok(a), Ok(b)) => Ok((a, b)),
        (a, b) => Err(a.err().into_iter().chain(b.err()).collect()),
    }
}

/// Require a non-blank value no longer than `max` characters. Returns the
/// trimmed value.
pub fn required<'a>(field: &str, value: Option<&'a str>, max: usize) -> Checked<&'a str> {
    match value.map(str::trim) {
        None | Some("") => Err(FieldError::new(field, format!("The {field} is required."))),
        Some(v) if v.chars().count() > max => Err(FieldError::new(
            field,
            format!("The {field} cannot be longer than {max} characters."),
        )),
        Some(v) => Ok(v),
    }
}

pub fn email(value: Option<&str>) -> Checked<&str> {
    let email = required("email", value, 180)?;
    if EMAIL_RE.is_match(email) {
        Ok(email)
    } else {
        Err(FieldError::new("email", format!("The email {email} is not a valid email.")))
    }
}

pub fn password(value: Option<&str>) -> Checked<&str> {
    match value {
        None | Some("") => Err(FieldError::new("password", "The password is required.")),
        Some(v) if PASSWORD_RE.is_match(v) => Ok(v),
        Some(_) => Err(FieldError::new("password", PASSWORD_MESSAGE)),
    }
}

/// An optional password: absent or blank means "keep the current one".
pub fn new_password(value: Option<&str>) -> Checked<Option<&str>> {
    match value {
        Some(v) if !v.trim().is_empty() => password(Some(v)).map(Some),
        _ => Ok(None),
    }
}

pub fn price(value: Option<&str>) -> Checked<Decimal> {
    let raw = required("price", value, 32)?;
    let invalid = |message: &str| Err(FieldError::new("price", message));

    match Decimal::from_str(raw) {
        Ok(price) if price.is_sign_negative() => invalid("The price cannot be negative."),
        Ok(price) if price >= *MAX_PRICE => invalid("The price is too large."),
        Ok(price) if price.scale() > 2 => {
            invalid("The price cannot have more than 2 decimal places.")
        }
        Ok(price) => Ok(price),
        Err(_) => invalid("The price must be a decimal number."),
    }
}
