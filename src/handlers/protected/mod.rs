// handlers/protected - every handler here runs behind jwt_auth_middleware and
// tenant_context_middleware and receives the caller's TenantContext

pub mod catalog_items;
pub mod graphql;
pub mod notifications;
pub mod resources;

use std::fmt::Display;
use std::str::FromStr;

use crate::validation::ValidationErrors;

/// Parses an optional query parameter, recording a field error on failure.
/// Blank values count as absent.
pub(crate) fn parse_param<T>(errors: &mut ValidationErrors, field: &str, raw: Option<&str>) -> Option<T>
where
    T: FromStr,
    T::Err: Display,
{
    let raw = raw.map(str::trim).filter(|v| !v.is_empty())?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(e) => {
            errors.add(field, e.to_string());
            None
        }
    }
}
