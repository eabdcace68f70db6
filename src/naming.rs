//! Title → identifier helpers shared by the lowering pass and the emitter.

/// Turn a free-text title into a PascalCase identifier.
///
/// Whitespace separates segments; anything that is not an ASCII letter or
/// digit is dropped; each segment gets its first character upper-cased.
/// A result that starts with a digit is prefixed with `_`. An empty result
/// stays empty and must be rejected by the caller.
pub fn to_definition_name(title: &str) -> String {
    let name: String = title
        .split_whitespace()
        .map(|segment| {
            let segment: String = segment.chars().filter(char::is_ascii_alphanumeric).collect();
            capitalize(&segment)
        })
        .collect();

    match name.chars().next() {
        Some(c) if !c.is_ascii_alphabetic() => format!("_{name}"),
        _ => name,
    }
}

/// Upper-case the first character, leave the rest alone.
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().chain(chars).collect(),
    }
}

/// Derive an element name from a plural property name.
///
/// Rules are checked in order: `ies` → `y`, `ses` → drop `es`, `s` → drop `s`.
pub fn singularize(s: &str) -> String {
    if let Some(stem) = s.strip_suffix("ies") {
        return format!("{stem}y");
    }
    if let Some(stem) = s.strip_suffix("ses") {
        return format!("{stem}s");
    }
    if let Some(stem) = s.strip_suffix('s') {
        return stem.to_string();
    }
    s.to_string()
}

/// Escape text for a C# regular string literal.
pub fn escape_literal(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn definition_names() {
        assert_eq!(to_definition_name("first name"), "FirstName");
        assert_eq!(to_definition_name("123abc"), "_123abc");
        assert_eq!(to_definition_name("  shipping\taddress "), "ShippingAddress");
        assert_eq!(to_definition_name("e-mail (primary)"), "EmailPrimary");
        assert_eq!(to_definition_name("already Pascal"), "AlreadyPascal");
        assert_eq!(to_definition_name("pet.json"), "Petjson");
    }

    #[test]
    fn empty_titles_stay_empty() {
        assert_eq!(to_definition_name(""), "");
        assert_eq!(to_definition_name("  -- !! "), "");
    }

    #[test]
    fn singular_forms() {
        assert_eq!(singularize("Categories"), "Category");
        assert_eq!(singularize("Cities"), "City");
        assert_eq!(singularize("Buses"), "Bus");
        assert_eq!(singularize("Addresses"), "Address");
        assert_eq!(singularize("Dogs"), "Dog");
        assert_eq!(singularize("Data"), "Data");
        assert_eq!(singularize("s"), "");
    }

    #[test]
    fn literal_escaping() {
        assert_eq!(escape_literal(r#"a"b\c"#), r#"a\"b\\c"#);
        assert_eq!(escape_literal("plain"), "plain");
    }
}
