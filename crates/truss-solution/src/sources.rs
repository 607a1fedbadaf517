use camino::Utf8Path;
use camino::Utf8PathBuf;
use ignore::WalkBuilder;

/// Discover a project's compilable sources.
///
/// Walks the project directory honoring ignore files, keeping files with
/// the given extension. Sorted so document order is deterministic across
/// platforms and runs.
#[must_use]
pub fn enumerate_sources(project_dir: &Utf8Path, extension: &str) -> Vec<Utf8PathBuf> {
    let mut sources: Vec<Utf8PathBuf> = WalkBuilder::new(project_dir)
        .build()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_some_and(|file_type| file_type.is_file()))
        .filter_map(|entry| Utf8PathBuf::from_path_buf(entry.into_path()).ok())
        .filter(|path| path.extension() == Some(extension))
        .collect();

    sources.sort();
    sources
}
