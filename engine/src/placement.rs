//! Suffix-based destination lookup.

use crate::config::{FolderMap, FolderRule};

/// Find the destination folder for `file_name`.
///
/// Folders are tried in configuration order and the first one with a matching
/// suffix wins. Matching is a case-sensitive tail match.
pub fn resolve<'a>(file_name: &str, folders: &'a FolderMap) -> Option<&'a FolderRule> {
    folders.iter().find(|rule| rule.matches(file_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn folders(rules: Vec<(&str, Vec<&str>)>) -> FolderMap {
        let mut map = FolderMap::default();
        for (name, suffixes) in rules {
            map.push(name, suffixes.into_iter().map(str::to_string).collect());
        }
        map
    }

    #[test]
    fn test_first_match_wins() {
        let map = folders(vec![("A", vec![".txt"]), ("B", vec![".txt", ".md"])]);
        assert_eq!(resolve("x.txt", &map).map(|r| r.name.as_str()), Some("A"));
        assert_eq!(resolve("x.md", &map).map(|r| r.name.as_str()), Some("B"));
    }

    #[test]
    fn test_no_match_returns_none() {
        let map = folders(vec![("Docs", vec![".pdf"])]);
        assert!(resolve("song.mp3", &map).is_none());
    }

    #[test]
    fn test_matching_is_case_sensitive() {
        let map = folders(vec![("Docs", vec![".pdf"])]);
        assert!(resolve("REPORT.PDF", &map).is_none());
    }

    #[test]
    fn test_multi_part_suffix() {
        let map = folders(vec![("Archives", vec![".tar.gz"]), ("Gzip", vec![".gz"])]);
        assert_eq!(
            resolve("backup.tar.gz", &map).map(|r| r.name.as_str()),
            Some("Archives")
        );
        assert_eq!(resolve("log.gz", &map).map(|r| r.name.as_str()), Some("Gzip"));
    }

    #[test]
    fn test_empty_suffix_list_never_matches() {
        let map = folders(vec![("Empty", vec![]), ("Docs", vec![".pdf"])]);
        assert_eq!(resolve("a.pdf", &map).map(|r| r.name.as_str()), Some("Docs"));
    }

    #[test]
    fn test_no_glob_semantics() {
        let map = folders(vec![("Any", vec!["*.txt"])]);
        assert!(resolve("notes.txt", &map).is_none());
        assert!(resolve("notes*.txt", &map).is_some());
    }
}
