//! Entity id helpers.

use unicode_normalization::UnicodeNormalization;

/// Turn a display name into an object id.
///
/// Accented letters are folded to their base letter (`"Café"` becomes
/// `"cafe"`). Spaces become underscores, ASCII letters are lowercased, digits
/// and underscores are kept and everything else is dropped:
/// `"My Router!"` becomes `"my_router"`.
pub fn slugify(text: &str) -> String {
    text.nfkd()
        .filter_map(|c| match c {
            ' ' => Some('_'),
            c if c.is_ascii_alphanumeric() || c == '_' => Some(c.to_ascii_lowercase()),
            _ => None,
        })
        .collect()
}

/// Return `preferred` if unused, otherwise the first free `preferred_N` for N >= 2.
pub fn ensure_unique_string(preferred: &str, existing: &[String]) -> String {
    if !existing.iter().any(|s| s == preferred) {
        return preferred.to_string();
    }

    let mut n = 2;
    loop {
        let candidate = format!("{}_{}", preferred, n);
        if !existing.iter().any(|s| *s == candidate) {
            return candidate;
        }
        n += 1;
    }
}

/// Build a unique `domain.object_id` entity id from a display name.
///
/// Returns `None` when the name has no characters usable in an object id.
pub fn generate_entity_id(domain: &str, name: &str, existing: &[String]) -> Option<String> {
    let object_id = slugify(name);
    if object_id.is_empty() {
        return None;
    }

    Some(ensure_unique_string(
        &format!("{}.{}", domain, object_id),
        existing,
    ))
}
