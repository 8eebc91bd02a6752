//! `{BASE_PATH}` placeholder substitution for `env` values (§4.3).
//!
//! Unknown placeholders pass through verbatim; only `{BASE_PATH}` is recognized. This is a
//! deliberately narrower engine than the teacher's `${env:}`/`${secret:}` regex substitution —
//! the catalog schema in §6 has no secret-store token syntax, so there is nothing to resolve
//! beyond the one documented placeholder.

const BASE_PATH_TOKEN: &str = "{BASE_PATH}";

/// Substitutes `{BASE_PATH}` with `base_path` in a single value. Any other `{...}` token is left
/// untouched.
pub fn interpolate_value(value: &str, base_path: &str) -> String {
    value.replace(BASE_PATH_TOKEN, base_path)
}
