//! Custom assertions for integration tests

use std::path::Path;
use syndication_client::DownloadResult;

/// Assert that `path` holds exactly `expected`
pub fn assert_file_contents(path: &Path, expected: &[u8]) {
    let actual = std::fs::read(path)
        .unwrap_or_else(|e| panic!("failed to read {}: {}", path.display(), e));
    assert_eq!(
        actual,
        expected,
        "unexpected contents in {}",
        path.display()
    );
}

/// Assert that `dir` contains exactly the files named in `expected`
pub fn assert_dir_files(dir: &Path, expected: &[&str]) {
    let mut actual: Vec<String> = std::fs::read_dir(dir)
        .unwrap_or_else(|e| panic!("failed to list {}: {}", dir.display(), e))
        .map(|entry| {
            entry
                .expect("failed to read directory entry")
                .file_name()
                .to_string_lossy()
                .into_owned()
        })
        .collect();
    actual.sort();

    let mut expected: Vec<String> = expected.iter().map(|name| name.to_string()).collect();
    expected.sort();

    assert_eq!(actual, expected, "unexpected files in {}", dir.display());
}

/// Sorted file names of a set of download results
pub fn file_names(results: &[DownloadResult]) -> Vec<String> {
    let mut names: Vec<String> = results
        .iter()
        .filter_map(|result| result.file_name().map(str::to_string))
        .collect();
    names.sort();
    names
}
