/// Name prefix EOS gives the folder holding a file's previous versions.
pub const VERSIONS_PREFIX: &str = ".sys.v#.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathClassification {
    /// The share already targets a version folder.
    AlreadyVersionPointer,
    /// The file lives outside the managed home tree.
    OutsideManagedTree,
    /// The file is one of the versions; its parent is the version folder.
    PointsIntoExistingVersionFolder,
    /// A sibling version folder has to be looked up or created.
    NeedsVersionFolder,
}

/// Decide what to do with a share pointing at `path`. First matching rule wins.
pub fn classify(path: &str, home_prefix: &str) -> PathClassification {
    if is_version_folder(path) {
        PathClassification::AlreadyVersionPointer
    } else if !path.starts_with(home_prefix) {
        PathClassification::OutsideManagedTree
    } else if is_version_folder(parent_dir(path)) {
        PathClassification::PointsIntoExistingVersionFolder
    } else {
        PathClassification::NeedsVersionFolder
    }
}

pub fn is_version_folder(path: &str) -> bool {
    base_name(path).starts_with(VERSIONS_PREFIX)
}

/// Last element of a slash separated path, ignoring trailing slashes.
pub fn base_name(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return if path.is_empty() { "." } else { "/" };
    }
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}

/// Everything but the last element, ignoring trailing slashes.
pub fn parent_dir(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(0) => "/",
        Some(idx) => &trimmed[..idx],
        None if path.starts_with('/') => "/",
        None => ".",
    }
}

/// Where the version folder of the file at `path` lives.
pub fn version_folder_path(path: &str) -> String {
    let parent = parent_dir(path);
    let name = format!("{}{}", VERSIONS_PREFIX, base_name(path));
    if parent.ends_with('/') {
        format!("{}{}", parent, name)
    } else {
        format!("{}/{}", parent, name)
    }
}
