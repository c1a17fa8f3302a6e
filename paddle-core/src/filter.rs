//! Object key filter
//!
//! Selects which listed objects satisfy a data retrieval request.

use std::collections::{HashMap, HashSet};

use crate::domain::data::{StoragePath, StoredObject};
use crate::error::LookupError;

/// Filters a listing down to the objects a retrieval asked for
///
/// With no requested keys, every object under `location.path` is selected.
/// Otherwise each requested key must match exactly one object whose key is
/// `location.path + key`; matching is plain string equality.
///
/// # Errors
/// Returns [`LookupError::MissingKeys`] naming every unresolved key. No
/// partial selection is ever returned.
pub fn filter_objects(
    location: &StoragePath,
    objects: &[StoredObject],
    keys: &[String],
) -> Result<Vec<StoredObject>, LookupError> {
    if keys.is_empty() {
        return Ok(objects
            .iter()
            .filter(|object| object.key.starts_with(&location.path))
            .cloned()
            .collect());
    }

    let by_key: HashMap<&str, &StoredObject> = objects
        .iter()
        .map(|object| (object.key.as_str(), object))
        .collect();

    let mut seen = HashSet::new();
    let mut selected = Vec::with_capacity(keys.len());
    let mut missing = Vec::new();

    for key in keys {
        if !seen.insert(key.as_str()) {
            continue;
        }

        match by_key.get(location.key(key).as_str()) {
            Some(object) => selected.push((*object).clone()),
            None => missing.push(key.clone()),
        }
    }

    if !missing.is_empty() {
        return Err(LookupError::MissingKeys {
            location: location.to_string(),
            keys: missing,
        });
    }

    Ok(selected)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn objects(keys: &[&str]) -> Vec<StoredObject> {
        keys.iter().map(|k| StoredObject::new(*k, 0)).collect()
    }

    fn keys(keys: &[&str]) -> Vec<String> {
        keys.iter().map(|k| k.to_string()).collect()
    }

    #[test]
    fn test_filter_objects() {
        let listed = objects(&["path/file1.csv", "path/file2.csv", "path/folder/file3.csv"]);
        let location = StoragePath::new("bucket", "path/");

        let result = filter_objects(
            &location,
            &listed,
            &keys(&["file1.csv", "file2.csv", "folder/file3.csv"]),
        )
        .unwrap();

        assert_eq!(result.len(), 3);
        assert_eq!(result[2].key, "path/folder/file3.csv");
    }

    #[test]
    fn test_filter_objects_with_no_keys() {
        let listed = objects(&["path/file.csv"]);
        let location = StoragePath::new("bucket", "path/");

        let result = filter_objects(&location, &listed, &[]).unwrap();

        assert_eq!(result, listed);
    }

    #[test]
    fn test_filter_objects_with_no_keys_skips_other_prefixes() {
        let listed = objects(&["path/a", "path/b/c", "other/d"]);
        let location = StoragePath::new("bucket", "path/");

        let result = filter_objects(&location, &listed, &[]).unwrap();

        assert_eq!(result.len(), 2);
    }

    #[test]
    fn test_filter_objects_using_non_existent_keys() {
        let listed = objects(&["path/f1.csv"]);
        let location = StoragePath::new("bucket", "path/");

        let err = filter_objects(&location, &listed, &keys(&["f2.csv", "f3.csv"])).unwrap_err();

        assert_eq!(
            err,
            LookupError::MissingKeys {
                location: "bucket/path/".to_string(),
                keys: keys(&["f2.csv", "f3.csv"]),
            }
        );
        assert!(err.to_string().contains("f2.csv, f3.csv"));
    }

    #[test]
    fn test_filter_objects_discards_partial_matches() {
        let listed = objects(&["path/f1.csv", "path/f2.csv"]);
        let location = StoragePath::new("bucket", "path/");

        let result = filter_objects(&location, &listed, &keys(&["f1.csv", "missing.csv"]));

        match result {
            Err(LookupError::MissingKeys { keys, .. }) => assert_eq!(keys, vec!["missing.csv"]),
            Ok(selected) => panic!("expected lookup failure, got {:?}", selected),
        }
    }

    #[test]
    fn test_filter_objects_is_not_a_pattern_match() {
        let listed = objects(&["path/file1.csv"]);
        let location = StoragePath::new("bucket", "path/");

        assert!(filter_objects(&location, &listed, &keys(&["file*.csv"])).is_err());
        assert!(filter_objects(&location, &listed, &keys(&["file1"])).is_err());
    }

    #[test]
    fn test_filter_objects_collapses_repeated_keys() {
        let listed = objects(&["path/f1.csv"]);
        let location = StoragePath::new("bucket", "path/");

        let result = filter_objects(&location, &listed, &keys(&["f1.csv", "f1.csv"])).unwrap();

        assert_eq!(result.len(), 1);
    }
}
