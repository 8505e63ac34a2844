//! Turns untrusted client filenames into safe, collision-free names.
//!
//! A client name is reduced to a base made of alphanumerics, `_` and `-`.
//! Collisions are resolved by appending `-1`, `-2`, ... before the extension;
//! the smallest free suffix wins.

const FALLBACK_BASE: &str = "file";
/// Keeps room for a suffix and extension under the common 255-byte name limit.
const MAX_BASE_BYTES: usize = 200;

/// Drops the final extension from the last path component of `name`.
///
/// Leading dots never start an extension, so `.hidden` is kept whole. Only
/// `/` separates path components.
fn strip_extension(name: &str) -> &str {
    let component_start = name.rfind('/').map(|idx| idx + 1).unwrap_or(0);
    let component = &name[component_start..];
    let Some(dot) = component.rfind('.') else {
        return name;
    };
    if component[..dot].chars().all(|ch| ch == '.') {
        return name;
    }
    &name[..component_start + dot]
}

/// Reduces a client filename to a safe base name without extension.
pub fn sanitize_base(client_filename: &str) -> String {
    let mut base: String = strip_extension(client_filename)
        .replace(' ', "_")
        .chars()
        .filter(|ch| ch.is_alphanumeric() || *ch == '_' || *ch == '-')
        .collect();
    if base.len() > MAX_BASE_BYTES {
        let mut end = MAX_BASE_BYTES;
        while !base.is_char_boundary(end) {
            end -= 1;
        }
        base.truncate(end);
    }
    if base.is_empty() {
        FALLBACK_BASE.to_string()
    } else {
        base
    }
}

/// Formats the candidate for a given suffix index; index 0 carries no suffix.
pub fn candidate_name(base: &str, index: u64, extension: &str) -> String {
    if index == 0 {
        format!("{base}{extension}")
    } else {
        format!("{base}-{index}{extension}")
    }
}

/// Candidate names for `base` in the order they are tried.
pub fn candidates<'a>(base: &'a str, extension: &'a str) -> impl Iterator<Item = String> + 'a {
    (0..=u64::MAX).map(move |index| candidate_name(base, index, extension))
}

/// Returns the first candidate for `client_filename` that `exists` reports free.
pub fn resolve<F>(client_filename: &str, extension: &str, mut exists: F) -> String
where
    F: FnMut(&str) -> bool,
{
    let base = sanitize_base(client_filename);
    candidates(&base, extension)
        .find(|name| !exists(name))
        .unwrap_or_else(|| candidate_name(&base, u64::MAX, extension))
}
