//! Slash-delimited relative path strings.
//!
//! The navigation stack never deals in [`std::path::Path`]: every path it
//! stores is a string relative to the gateway root, with no leading or
//! trailing slash. The empty string is the gateway root itself. Everything
//! here composes from [`clean`].

/// Strips exactly one leading and one trailing `/`, if present.
///
/// ```
/// use millerfm_core::path::clean;
///
/// assert_eq!(clean("/home/user/"), "home/user");
/// assert_eq!(clean("docs"), "docs");
/// assert_eq!(clean("/"), "");
/// ```
pub fn clean(path: &str) -> &str {
    let path = path.strip_prefix('/').unwrap_or(path);
    path.strip_suffix('/').unwrap_or(path)
}

/// Joins two fragments with a single `/`.
///
/// Both sides are cleaned first; if either is empty the other is returned.
pub fn join(a: &str, b: &str) -> String {
    let (a, b) = (clean(a), clean(b));
    if a.is_empty() {
        return b.to_string();
    }
    if b.is_empty() {
        return a.to_string();
    }
    format!("{a}/{b}")
}

/// Returns everything after the last `/`, or the whole cleaned path.
pub fn last_path_fragment(path: &str) -> &str {
    let path = clean(path);
    match path.rfind('/') {
        Some(i) => &path[i + 1..],
        None => path,
    }
}

/// Returns everything before the last `/`, or `""` when there is none.
pub fn parent(path: &str) -> &str {
    let path = clean(path);
    match path.rfind('/') {
        Some(i) => &path[..i],
        None => "",
    }
}

/// Splits a cleaned path into its fragments.
///
/// An empty path yields a single empty fragment, matching `str::split`.
pub fn fragments(path: &str) -> Vec<&str> {
    clean(path).split('/').collect()
}

/// Replaces the first occurrence of `search` in `path` with `replacement`.
///
/// All three arguments are cleaned before matching.
pub fn replace(path: &str, search: &str, replacement: &str) -> String {
    clean(path).replacen(clean(search), clean(replacement), 1)
}

/// Running joins over a fragment list: `[a, a/b, a/b/c, ...]`.
pub fn cumulative<S: AsRef<str>>(fragments: &[S]) -> Vec<String> {
    let mut accum = String::new();
    fragments
        .iter()
        .map(|fragment| {
            accum = join(&accum, fragment.as_ref());
            accum.clone()
        })
        .collect()
}

/// Index of the first fragment whose running join equals `target`.
pub fn position_of<S: AsRef<str>>(fragments: &[S], target: &str) -> Option<usize> {
    let target = clean(target);
    cumulative(fragments).iter().position(|p| p == target)
}
