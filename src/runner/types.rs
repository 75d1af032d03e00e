use std::path::{Path, PathBuf};

use crate::catalog::RequestDefinition;
use crate::report::{Report, RunResult};

/// What a run produced, complete or cut short.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunOutcome {
    pub result: RunResult,
    pub report: Report,

    /// Executed requests and variants
    pub executed: usize,

    /// Inactive definitions that were skipped
    pub skipped: usize,

    /// The run stopped early on a shutdown signal
    pub cancelled: bool,
}

/// Output file of a request or one of its variants.
///
/// `<output_dir>/<source path>` with `-test-case-NN` inserted before the extension, where
/// `NN` is `00` for the primary request and the test case index plus one otherwise. When the
/// source file holds several definitions the id goes in front of the suffix, so each one keeps
/// its own output.
pub fn output_path(
    output_dir: &Path,
    def: &RequestDefinition,
    test_case_index: Option<usize>,
) -> PathBuf {
    let source_file = def.source_file.as_path();
    let number = test_case_index.map_or(0, |index| index + 1);
    let suffix = if def.shares_source_file {
        format!("-{}-test-case-{:02}", def.id, number)
    } else {
        format!("-test-case-{:02}", number)
    };

    let stem = source_file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let file_name = match source_file.extension() {
        Some(ext) => format!("{}{}.{}", stem, suffix, ext.to_string_lossy()),
        None => format!("{}{}", stem, suffix),
    };

    match source_file.parent() {
        Some(parent) => output_dir.join(parent).join(file_name),
        None => output_dir.join(file_name),
    }
}
