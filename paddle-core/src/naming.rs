//! Identifier normalization
//!
//! Free-form names (pipelines, steps, branches, versions) end up in pod names,
//! labels and object keys. All of them go through [`sanitize_name`] first.

/// Normalizes a name into a manifest-safe token
///
/// Lowercases the input and replaces every `_` and `/` with `-`.
/// Total and idempotent.
pub fn sanitize_name(name: &str) -> String {
    name.to_lowercase().replace(['_', '/'], "-")
}
