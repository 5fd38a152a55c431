//! String helpers shared by registries and integrations

/// Slugify a display name into an object_id (matches HA's `util.slugify`)
///
/// Runs of non-alphanumeric characters collapse into a single underscore,
/// apostrophes are dropped, and leading/trailing separators are trimmed.
/// An input with nothing left after slugifying yields `"unknown"`.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if c == '\'' || c == '\u{2019}' {
            continue;
        } else if !slug.is_empty() && !slug.ends_with('_') {
            slug.push('_');
        }
    }
    let trimmed = slug.trim_end_matches('_');
    if trimmed.is_empty() {
        "unknown".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_device_and_entity_name() {
        assert_eq!(
            slugify("Pentair DD-EE-FF Saturation Index"),
            "pentair_dd_ee_ff_saturation_index"
        );
    }

    #[test]
    fn test_slugify_collapses_separators() {
        assert_eq!(slugify("  Pool -- Low   Pump "), "pool_low_pump");
        assert_eq!(slugify("Pool's Heater"), "pools_heater");
    }

    #[test]
    fn test_slugify_empty() {
        assert_eq!(slugify(""), "unknown");
        assert_eq!(slugify("°°°"), "unknown");
    }
}
