//! Parameter-path derivation
//!
//! Maps a caller-supplied parameter name to the construct id and the
//! persisted path shared by `create_parameter` and `load_parameter`:
//!
//! | input | base | leaf |
//! |---|---|---|
//! | `region` | stack name | `region` |
//! | `config/region` | `config` | `region` |
//! | `config/region/extra` | `config` | `region` (rest ignored) |
//!
//! id: `{base}{leaf}Parameter`, path: `/{identity}/{base}/{leaf}`.

use crate::error::StackError;

/// Separator between parameter name segments
pub const SEGMENT_SEPARATOR: char = '/';

/// Derived id and path for a parameter name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParsedParameterName {
    /// Construct id, unique within the stack's scope
    pub id: String,
    /// Persisted parameter path
    pub parameter_name: String,
    /// First path component under the identity
    pub base_name: String,
    /// Second path component under the identity
    pub leaf_name: String,
    /// Number of trailing segments that were dropped
    pub ignored_segments: usize,
}

/// Derive id and path for `full_name` on the stack `stack_name` with `identity`
///
/// Pure: the same inputs always give the same output.
///
/// # Errors
/// Returns [`StackError::InvalidParameterName`] if `full_name` is empty or
/// its base or leaf segment is empty
pub fn parse_parameter_name(
    full_name: &str,
    stack_name: &str,
    identity: &str,
) -> Result<ParsedParameterName, StackError> {
    let invalid = |reason: &'static str| StackError::InvalidParameterName {
        name: full_name.to_string(),
        reason,
    };

    if full_name.is_empty() {
        return Err(invalid("name is empty"));
    }

    let segments: Vec<&str> = full_name.split(SEGMENT_SEPARATOR).collect();
    let (base_name, leaf_name) = match segments.as_slice() {
        [leaf] => (stack_name, *leaf),
        [base, leaf, ..] => (*base, *leaf),
        [] => return Err(invalid("name is empty")),
    };

    if base_name.is_empty() {
        return Err(invalid("base segment is empty"));
    }
    if leaf_name.is_empty() {
        return Err(invalid("leaf segment is empty"));
    }

    let ignored_segments = segments.len().saturating_sub(2);
    if ignored_segments > 0 {
        tracing::warn!(
            name = %full_name,
            ignored = ignored_segments,
            "Parameter name has more than two segments; only '{}/{}' is used",
            base_name,
            leaf_name
        );
    }

    Ok(ParsedParameterName {
        id: format!("{base_name}{leaf_name}Parameter"),
        parameter_name: format!("/{identity}/{base_name}/{leaf_name}"),
        base_name: base_name.to_string(),
        leaf_name: leaf_name.to_string(),
        ignored_segments,
    })
}
