//! Slash-delimited secret path helpers.

/// Marker that ends a subfolder name in a listing.
pub const FOLDER_SEPARATOR: char = '/';

/// Normalise a configured store path: no leading slash, exactly one
/// trailing slash. An empty (or all-slash) path stays empty.
pub fn normalize_store_path(path: &str) -> String {
    let trimmed = path.trim().trim_matches(FOLDER_SEPARATOR);
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{}/", trimmed)
    }
}

/// True when a listing name denotes a subfolder.
pub fn is_folder(name: &str) -> bool {
    name.ends_with(FOLDER_SEPARATOR)
}

/// Join a folder path and a child name with exactly one separator.
///
/// The parent's leading slash (if any) is preserved so callers get back
/// paths in the same shape they passed in.
pub fn join_path(parent: &str, child: &str) -> String {
    let child = child.trim_start_matches(FOLDER_SEPARATOR);
    if parent.is_empty() {
        child.to_string()
    } else if parent.ends_with(FOLDER_SEPARATOR) {
        format!("{}{}", parent, child)
    } else {
        format!("{}{}{}", parent, FOLDER_SEPARATOR, child)
    }
}

/// Path of the secret itself, for store paths that name a container secret.
pub fn secret_path(path: &str) -> &str {
    path.trim_end_matches(FOLDER_SEPARATOR)
}

/// Last non-empty segment of a path (`"certs/web/"` → `"web"`).
pub fn last_segment(path: &str) -> &str {
    secret_path(path).rsplit(FOLDER_SEPARATOR).next().unwrap_or_default()
}

/// Make `path` relative to `root` when it lives underneath it.
pub fn relative_to<'a>(root: &str, path: &'a str) -> &'a str {
    let root = root.trim_start_matches(FOLDER_SEPARATOR);
    let path_trimmed = path.trim_start_matches(FOLDER_SEPARATOR);
    path_trimmed.strip_prefix(root).unwrap_or(path_trimmed)
}
