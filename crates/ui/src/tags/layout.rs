use crate::escape;

/// `box(title, type)`: a complete box around an already rendered body.
pub fn box_wrap(title: Option<&str>, kind: Option<&str>, body: &str) -> String {
    let mut html = format!("<div class=\"box box-{}\">", escape(kind.unwrap_or("default")));
    if let Some(title) = title {
        html.push_str(&format!(
            "<div class=\"box-header with-border\"><h3 class=\"box-title\">{}</h3></div>",
            escape(title)
        ));
    }
    html.push_str("<div class=\"box-body\">");
    html.push_str(body);
    html.push_str("</div></div>");
    html
}

/// `solidbox(title, type)`: a solid-header box around an already rendered body.
pub fn solid_box(title: Option<&str>, kind: Option<&str>, body: &str) -> String {
    let mut html = format!(
        "<div class=\"box box-solid box-{}\">",
        escape(kind.unwrap_or("default"))
    );
    if let Some(title) = title {
        html.push_str(&format!(
            "<div class=\"box-header with-border\"><h3 class=\"box-title\">{}</h3></div>",
            escape(title)
        ));
    }
    html.push_str("<div class=\"box-body\">");
    html.push_str(body);
    html.push_str("</div></div>");
    html
}

/// `box:open(title, type, boxType)`. Close with [`box_close`] twice when a
/// title was given (header tools plus the box itself).
pub fn box_open(title: Option<&str>, kind: Option<&str>, box_type: Option<&str>) -> String {
    let solid = box_type
        .map(|t| format!("box-{} ", escape(t)))
        .unwrap_or_default();
    let mut html = format!(
        "<div class=\"box {solid}box-{}\">",
        escape(kind.unwrap_or("default"))
    );
    if let Some(title) = title {
        html.push_str(&format!(
            "<div class=\"box-header with-border\"><h3 class=\"box-title\">{}</h3><div class=\"box-tools pull-right\">",
            escape(title)
        ));
    }
    html
}

pub fn box_body(body: &str) -> String {
    format!("<div class=\"box-body\">{body}</div>")
}

pub fn box_footer(body: &str) -> String {
    format!("<div class=\"box-footer\">{body}</div>")
}

pub fn box_close() -> &'static str {
    "</div>"
}

/// `label(text, type)`.
pub fn label(text: &str, kind: Option<&str>) -> String {
    format!(
        "<span class=\"label label-{}\">{}</span>",
        escape(kind.unwrap_or("default")),
        escape(text)
    )
}

/// `image:round(path, classes, attributes)`.
pub fn image_round(path: &str, classes: Option<&str>, attributes: &[(&str, &str)]) -> String {
    format!(
        "<img src=\"{}\" class=\"img-circle {}\"{}>",
        escape(path),
        escape(classes.unwrap_or("")),
        attrs(attributes)
    )
}

/// `infobox(title, number, colour, icon)`.
pub fn infobox(title: &str, number: &str, colour: Option<&str>, icon: Option<&str>) -> String {
    [
        "<div class=\"info-box\">".to_string(),
        format!(
            "<span class=\"info-box-icon bg-{}\"><i class=\"{}\"></i></span>",
            escape(colour.unwrap_or("blue")),
            escape(icon.unwrap_or("star"))
        ),
        "<div class=\"info-box-content\">".to_string(),
        format!("<span class=\"info-box-text\">{}</span>", escape(title)),
        format!("<span class=\"info-box-number\">{}</span>", escape(number)),
        "</div>\n</div>".to_string(),
    ]
    .join("\n")
}

/// `menu:toggle(icon, header, label, labelClass)` wrapping already rendered items.
pub fn menu_toggle(
    icon: &str,
    header: &str,
    badge: Option<(&str, Option<&str>)>,
    items: &str,
) -> String {
    let mut lines = vec![
        "<li class=\"dropdown messages-menu\">".to_string(),
        "<a href=\"#\" class=\"dropdown-toggle\" data-toggle=\"dropdown\">".to_string(),
        format!("<i class=\"fa fa-{}\"></i>", escape(icon)),
        "</a>".to_string(),
        "<ul class=\"dropdown-menu\">".to_string(),
        format!("<li class=\"header\">{}</li>", escape(header)),
    ];
    if let Some((text, class)) = badge {
        lines.insert(
            2,
            format!(
                "<span class=\"label label-{}\">{}</span>",
                escape(class.unwrap_or("default")),
                escape(text)
            ),
        );
    }
    lines.push(items.to_string());
    lines.push("</ul></li>".to_string());
    lines.join("\n")
}

/// `menu:footer(text, path)`.
pub fn menu_footer(text: &str, path: &str) -> String {
    format!(
        "<li class=\"footer\"><a href=\"{}\">{}</a></li>",
        escape(path),
        escape(text)
    )
}

/// `button:delete(path, title, message)`: a confirm-on-click delete link.
pub fn button_delete(path: &str, title: Option<&str>, message: Option<&str>) -> String {
    format!(
        "<a href=\"{}\" class=\"btn btn-box-tool\" data-toggle=\"tooltip\" data-delete=\"true\" \
         data-title=\"Delete\" data-header=\"{}\" data-text=\"{}\"><span class=\"fa fa-times\"></span>\
         <span class=\"sr-only\">Delete</span></a>",
        escape(path),
        escape(title.unwrap_or("")),
        escape(message.unwrap_or(""))
    )
}

/// `table(headers...)` around already rendered cells, one `Vec` per row.
pub fn table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut html = String::from("<table class=\"table\"><tbody><tr>");
    for header in headers {
        html.push_str(&format!("<th>{}</th>", escape(header)));
    }
    html.push_str("</tr>");
    for row in rows {
        html.push_str("<tr>");
        for cell in row {
            html.push_str(&format!("<td>{cell}</td>"));
        }
        html.push_str("</tr>");
    }
    html.push_str("</tbody></table>");
    html
}

/// `table:rows(items)`: one `<tr>` per item, cells rendered by `row` from the
/// zero-based index and the item.
pub fn table_rows<T>(items: &[T], row: impl Fn(usize, &T) -> String) -> String {
    items
        .iter()
        .enumerate()
        .map(|(index, item)| format!("<tr>{}</tr>", row(index, item)))
        .collect::<Vec<_>>()
        .join("\n")
}

pub(crate) fn attrs(attributes: &[(&str, &str)]) -> String {
    attributes
        .iter()
        .map(|(k, v)| format!(" {}=\"{}\"", escape(k), escape(v)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn box_with_title() {
        assert_eq!(
            box_wrap(Some("Users"), Some("primary"), "<p>x</p>"),
            "<div class=\"box box-primary\"><div class=\"box-header with-border\">\
             <h3 class=\"box-title\">Users</h3></div><div class=\"box-body\"><p>x</p></div></div>"
        );
    }

    #[test]
    fn box_open_defaults() {
        assert_eq!(box_open(None, None, None), "<div class=\"box box-default\">");
        assert!(box_open(Some("T"), Some("info"), Some("solid")).starts_with("<div class=\"box box-solid box-info\">"));
    }

    #[test]
    fn label_escapes_text() {
        assert_eq!(
            label("<admin>", Some("danger")),
            "<span class=\"label label-danger\">&lt;admin&gt;</span>"
        );
    }

    #[test]
    fn infobox_uses_defaults() {
        let html = infobox("Users", "3", None, None);
        assert!(html.contains("bg-blue"));
        assert!(html.contains("<i class=\"star\">"));
        assert!(html.contains("<span class=\"info-box-number\">3</span>"));
    }

    #[test]
    fn menu_toggle_places_badge_inside_anchor() {
        let html = menu_toggle("bell", "Notifications", Some(("4", Some("warning"))), "");
        let lines: Vec<_> = html.lines().collect();
        assert_eq!(lines[2], "<span class=\"label label-warning\">4</span>");
        assert!(html.ends_with("</ul></li>"));
    }

    #[test]
    fn table_renders_headers_and_rows() {
        let html = table(&["Name", "Email"], &[vec!["A".into(), "a@x.io".into()]]);
        assert_eq!(
            html,
            "<table class=\"table\"><tbody><tr><th>Name</th><th>Email</th></tr>\
             <tr><td>A</td><td>a@x.io</td></tr></tbody></table>"
        );
    }

    #[test]
    fn solid_box_escapes_title() {
        assert_eq!(
            solid_box(Some("<Stats>"), Some("success"), "<p>1</p>"),
            "<div class=\"box box-solid box-success\"><div class=\"box-header with-border\">\
             <h3 class=\"box-title\">&lt;Stats&gt;</h3></div><div class=\"box-body\"><p>1</p></div></div>"
        );
        assert!(solid_box(None, None, "").starts_with("<div class=\"box box-solid box-default\"><div class=\"box-body\">"));
    }

    #[test]
    fn table_rows_wrap_each_item() {
        let names = ["Ann", "<Bob>"];
        let html = table_rows(&names, |i, name| format!("<td>{}</td><td>{}</td>", i + 1, escape(name)));
        assert_eq!(
            html,
            "<tr><td>1</td><td>Ann</td></tr>\n<tr><td>2</td><td>&lt;Bob&gt;</td></tr>"
        );
        assert_eq!(table_rows::<&str>(&[], |_, _| String::new()), "");
    }

    #[test]
    fn delete_button_escapes_message() {
        let html = button_delete("/users/1/delete", Some("Delete"), Some("Really \"delete\"?"));
        assert!(html.contains("data-text=\"Really &quot;delete&quot;?\""));
    }
}
