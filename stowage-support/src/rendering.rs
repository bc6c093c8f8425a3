//! Text rendering utilities for human-friendly error messages.
//!
//! Provides helpers to format resolution chains, type names,
//! and "did you mean?" suggestions in error output.

/// Renders a resolution chain as a readable string.
///
/// # Examples
/// ```
/// use stowage_support::rendering::render_chain;
///
/// let chain = vec!["IPageStore", "IRouterStore", "IPageStore"];
/// let rendered = render_chain(&chain);
/// assert_eq!(rendered, "IPageStore → IRouterStore → IPageStore");
/// ```
pub fn render_chain(chain: &[impl AsRef<str>]) -> String {
    chain
        .iter()
        .map(|s| s.as_ref())
        .collect::<Vec<_>>()
        .join(" → ")
}

/// Shortens a fully qualified type name for display.
///
/// ```
/// use stowage_support::rendering::shorten_type_name;
///
/// let short = shorten_type_name("my_app::stores::router::RouterStore");
/// assert_eq!(short, "RouterStore");
///
/// let short = shorten_type_name("alloc::sync::Arc<dyn my_app::stores::SiteMapStore>");
/// assert_eq!(short, "Arc<dyn SiteMapStore>");
/// ```
pub fn shorten_type_name(full_name: &str) -> String {
    let mut result = String::with_capacity(full_name.len());
    let mut chars = full_name.chars().peekable();
    let mut current_segment = String::new();

    while let Some(ch) = chars.next() {
        match ch {
            ':' if chars.peek() == Some(&':') => {
                chars.next();
                current_segment.clear();
            }
            '<' | '>' | ',' | ' ' | '(' | ')' | '[' | ']' | ';' => {
                result.push_str(&current_segment);
                result.push(ch);
                current_segment.clear();
            }
            _ => {
                current_segment.push(ch);
            }
        }
    }

    result.push_str(&current_segment);
    result
}

/// Suggests registered keys that look like the requested one.
///
/// Keys are plain strings (`"IRouterStore"`, `"PageUrl"`), so matching is
/// case-insensitive and ignores a leading interface `I` marker. Results are
/// ordered best match first.
///
/// ```
/// use stowage_support::rendering::suggest_similar;
///
/// let available = ["IRouterStore", "ISiteMapStore", "PageUrl"];
/// let suggestions = suggest_similar("RouterStore", &available, 3);
/// assert_eq!(suggestions, vec!["IRouterStore".to_string()]);
/// ```
pub fn suggest_similar(
    requested: &str,
    available: &[&str],
    max_suggestions: usize,
) -> Vec<String> {
    let requested_lower = requested.to_lowercase();
    let requested_bare = strip_interface_marker(requested).to_lowercase();

    let mut scored: Vec<(&str, usize)> = available
        .iter()
        .filter(|&&name| name != requested)
        .filter_map(|&name| {
            let name_lower = name.to_lowercase();
            let name_bare = strip_interface_marker(name).to_lowercase();

            if name_lower == requested_lower || name_bare == requested_bare {
                return Some((name, 120));
            }

            if name_lower.contains(&requested_lower)
                || requested_lower.contains(&name_lower)
            {
                return Some((name, 100));
            }

            // Common prefix
            let common = name_bare
                .chars()
                .zip(requested_bare.chars())
                .take_while(|(a, b)| a == b)
                .count();

            if common >= 4 {
                return Some((name, common * 10));
            }

            None
        })
        .collect();

    scored.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    scored
        .into_iter()
        .take(max_suggestions)
        .map(|(name, _)| name.to_string())
        .collect()
}

fn strip_interface_marker(name: &str) -> &str {
    let mut chars = name.chars();
    match (chars.next(), chars.next()) {
        (Some('I'), Some(second)) if second.is_ascii_uppercase() => &name[1..],
        _ => name,
    }
}
