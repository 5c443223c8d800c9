use crate::escape;

/// Whether `current` matches any of `patterns`.
///
/// A pattern ending in `*` matches when the current path contains the part
/// before the star; other patterns must be equal. With no patterns, the
/// current path must equal `default`.
pub fn is_active(current: Option<&str>, default: Option<&str>, patterns: &[&str]) -> bool {
    if patterns.is_empty() {
        return current == default;
    }

    patterns.iter().any(|pattern| match pattern.strip_suffix('*') {
        Some(prefix) => current.is_some_and(|path| path.contains(prefix)),
        None => current == Some(*pattern),
    })
}

/// `sidebar:header(title)`.
pub fn sidebar_header(title: &str) -> String {
    format!("<li class=\"header\">{}</li>", escape(title))
}

/// `sidebar:link(title, path, icon)`.
pub fn sidebar_link(title: &str, path: &str, icon: Option<&str>, current: Option<&str>) -> String {
    let active = if is_active(current, Some(path), &[]) {
        "active"
    } else {
        ""
    };
    let icon = icon
        .map(|i| format!("<i class=\"fa fa-{}\"></i> ", escape(i)))
        .unwrap_or_default();
    format!(
        "<li class=\"{active}\"><a href=\"{}\">{icon}{}</a></li>",
        escape(path),
        escape(title)
    )
}

/// `sidebar:container(title, icon, patterns...)` around already rendered links.
pub fn sidebar_container(
    title: &str,
    icon: Option<&str>,
    patterns: &[&str],
    current: Option<&str>,
    links: &str,
) -> String {
    let active = if is_active(current, None, patterns) {
        " active menu-open"
    } else {
        ""
    };
    let icon = icon
        .map(|i| format!("<i class=\"{}\"></i> ", escape(i)))
        .unwrap_or_default();
    format!(
        "<li class=\"treeview{active}\"><a href=\"#\">{icon}<span>{}</span>\
         <span class=\"pull-right-container\"><i class=\"fa fa-angle-left pull-right\"></i></span></a>\
         <ul class=\"treeview-menu\">{links}</ul></li>",
        escape(title)
    )
}
