//! URL helpers for the archive directory layout
//!
//! Every catalog node derives its address from its parent's with [`url_join`],
//! and fetches its listing from the sibling file returned by [`url_json_file`].

use crate::constants::files;

/// Joins `segments` onto `base` with single `/` separators.
///
/// Runs of slashes inside the joined suffix collapse to one, and exactly one
/// slash separates `base` from the suffix. The base itself (including any
/// `scheme://`) is left untouched.
pub fn url_join<S: AsRef<str>>(base: &str, segments: &[S]) -> String {
    let joined = segments
        .iter()
        .map(|s| s.as_ref())
        .collect::<Vec<_>>()
        .join("/");
    let suffix = collapse_slashes(&joined);
    let suffix = suffix.trim_start_matches('/');

    if base.ends_with('/') {
        format!("{base}{suffix}")
    } else {
        format!("{base}/{suffix}")
    }
}

/// Returns the listing URL for a directory: one trailing `/` stripped, `.json` appended
pub fn url_json_file(url: &str) -> String {
    let trimmed = url.strip_suffix('/').unwrap_or(url);
    format!("{trimmed}{}", files::JSON_SUFFIX)
}

/// Last non-empty path segment of a URL, ignoring query and fragment
pub fn last_segment(url: &str) -> Option<&str> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    path.rsplit('/').find(|s| !s.is_empty())
}

fn collapse_slashes(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut previous_slash = false;
    for c in value.chars() {
        if c == '/' {
            if !previous_slash {
                out.push(c);
            }
            previous_slash = true;
        } else {
            out.push(c);
            previous_slash = false;
        }
    }
    out
}
