/// Link schemes allowed in rendered `href`s.
const ALLOWED_SCHEMES: [&str; 3] = ["http://", "https://", "mailto:"];

pub(crate) fn escape_into(text: &str, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
}

/// Escapes `text`, turning each line break into `<br>`.
pub(crate) fn escape_with_breaks(text: &str, out: &mut String) {
    let normalized = text.replace("\r\n", "\n");
    for (index, line) in normalized.split('\n').enumerate() {
        if index > 0 {
            out.push_str("<br>");
        }
        escape_into(line, out);
    }
}

/// Returns the link target when its scheme is allowlisted.
pub(crate) fn safe_link_target(url: &str) -> Option<&str> {
    let url = url.trim();
    let allowed = ALLOWED_SCHEMES.iter().any(|scheme| {
        url.get(..scheme.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
    });
    allowed.then_some(url)
}

/// Language names become a `language-*` class only when they are plain
/// identifiers.
pub(crate) fn safe_language(lang: &str) -> Option<&str> {
    let lang = lang.trim();
    let valid = !lang.is_empty()
        && lang.len() <= 32
        && lang
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '_' | '+' | '-'));
    valid.then_some(lang)
}
