//! URL slugs for categories and products.

/// Turn a display name into a URL slug.
///
/// Lowercases ASCII letters, keeps digits, and collapses every other run of
/// characters into a single `-`. Leading and trailing dashes are dropped.
///
/// ```
/// use sonic_core::slugify;
///
/// assert_eq!(slugify("Sonic Pro 2000 (Black)"), "sonic-pro-2000-black");
/// assert_eq!(slugify("  --Wet & Dry--  "), "wet-dry");
/// ```
#[must_use]
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;

    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    slug
}

/// Whether `s` is already a well-formed slug.
#[must_use]
pub fn is_valid_slug(s: &str) -> bool {
    !s.is_empty() && slugify(s) == s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Air Purifiers"), "air-purifiers");
        assert_eq!(slugify("Heavy-Duty   Vacuum!!"), "heavy-duty-vacuum");
        assert_eq!(slugify("Ünïcode Only"), "n-code-only");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn test_is_valid_slug() {
        assert!(is_valid_slug("air-purifiers"));
        assert!(!is_valid_slug("Air-Purifiers"));
        assert!(!is_valid_slug("air--purifiers"));
        assert!(!is_valid_slug(""));
    }
}
