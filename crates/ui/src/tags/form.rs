//! Form tags driven by a [`FieldState`] from the validated fieldset.
//!
//! The fieldset supplies the label, the previously submitted value and any
//! validation messages; a group with messages gets the `has-error` class and
//! one `help-block` per message.

use adminpanel_auth::FieldState;
use serde_json::Value;

use super::layout::attrs;
use crate::escape;

/// `form:open(path, method, isFileUpload)`.
pub fn form_open(path: &str, method: &str, file_upload: bool) -> String {
    let enctype = if file_upload {
        " enctype=\"multipart/form-data\""
    } else {
        ""
    };
    format!(
        "<form method=\"{}\" action=\"{}\"{enctype}>",
        escape(method),
        escape(path)
    )
}

pub fn form_close() -> &'static str {
    "</form>"
}

pub fn text_group(
    key: &str,
    default: &str,
    field: Option<&FieldState>,
    classes: Option<&str>,
    attributes: &[(&str, &str)],
) -> String {
    input_group("text", key, default, field, classes, attributes)
}

pub fn email_group(
    key: &str,
    default: &str,
    field: Option<&FieldState>,
    classes: Option<&str>,
    attributes: &[(&str, &str)],
) -> String {
    input_group("email", key, default, field, classes, attributes)
}

/// Password inputs never render a value.
pub fn password_group(
    key: &str,
    field: Option<&FieldState>,
    classes: Option<&str>,
    attributes: &[(&str, &str)],
) -> String {
    input_group("password", key, "", field, classes, attributes)
}

pub fn textarea_group(
    key: &str,
    default: &str,
    field: Option<&FieldState>,
    classes: Option<&str>,
    attributes: &[(&str, &str)],
) -> String {
    format!(
        "{}<label class=\"control-label\" for=\"{k}\">{}</label>\
         <textarea class=\"form-control {}\" id=\"{k}\" name=\"{k}\"{}>{}</textarea>{}</div>",
        open_group(field),
        escape(&label_text(key, field)),
        escape(classes.unwrap_or("")),
        attrs(attributes),
        escape(&string_value(field, default)),
        help_blocks(field),
        k = escape(key),
    )
}

pub fn checkbox_group(
    key: &str,
    default: bool,
    field: Option<&FieldState>,
    classes: Option<&str>,
) -> String {
    let checked = field
        .and_then(|f| f.value.as_bool())
        .unwrap_or(default);
    format!(
        "{}<div class=\"checkbox\"><label><input class=\"{}\" type=\"checkbox\" id=\"{k}\" name=\"{k}\" \
         value=\"true\"{}>{}</label></div>{}</div>",
        open_group(field),
        escape(classes.unwrap_or("")),
        if checked { " checked" } else { "" },
        escape(&label_text(key, field)),
        help_blocks(field),
        k = escape(key),
    )
}

/// `form:selectgroup(options, key, default, fieldset)`. The submitted value
/// wins over `default`.
pub fn select_group(
    options: &[&str],
    key: &str,
    default: Option<&str>,
    field: Option<&FieldState>,
    classes: Option<&str>,
) -> String {
    let selected = string_value(field, default.unwrap_or(""));
    let mut html = format!(
        "{}<label class=\"control-label\" for=\"{k}\">{}</label>\
         <select class=\"form-control {}\" id=\"{k}\" name=\"{k}\">",
        open_group(field),
        escape(&label_text(key, field)),
        escape(classes.unwrap_or("")),
        k = escape(key),
    );
    for option in options {
        html.push_str(&format!(
            "<option value=\"{o}\"{}>{o}</option>",
            if *option == selected { " selected" } else { "" },
            o = escape(option),
        ));
    }
    html.push_str("</select>");
    html.push_str(&help_blocks(field));
    html.push_str("</div>");
    html
}

/// `form:dategroup(key, default, fieldset, dateFormat, startDate, attributes)`:
/// a datepicker-ready text input. Picker behaviour lives in the page scripts.
pub fn date_group(
    key: &str,
    default: &str,
    field: Option<&FieldState>,
    date_format: Option<&str>,
    start_date: Option<&str>,
    attributes: &[(&str, &str)],
) -> String {
    format!(
        "{}{}<div class=\"input-group date\" data-provide=\"datepicker\" data-date-format=\"{}\" \
         data-date-start-date=\"{}\"><input type=\"text\" class=\"form-control\" id=\"{k}\" name=\"{k}\" \
         value=\"{}\"{}><div class=\"input-group-addon\"><span class=\"glyphicon glyphicon-th\"></span>\
         </div></div>{}</div>",
        open_group(field),
        default_label(key, field),
        escape(date_format.unwrap_or("dd/mm/yyyy")),
        escape(start_date.unwrap_or("")),
        escape(&string_value(field, default)),
        attrs(attributes),
        help_blocks(field),
        k = escape(key),
    )
}

/// `form:colorgroup(key, default, fieldset)`: a colorpicker-ready text input.
pub fn color_group(key: &str, default: &str, field: Option<&FieldState>) -> String {
    format!(
        "{}{}<div id=\"{k}-cp\" class=\"input-group colorpicker-component\">\
         <input type=\"text\" class=\"form-control\" id=\"{k}\" name=\"{k}\" value=\"{}\">\
         <span class=\"input-group-addon\"><i></i></span></div>{}</div>\
         <script>$(function() {{ $('#{k}-cp').colorpicker(); }});</script>",
        open_group(field),
        default_label(key, field),
        escape(&string_value(field, default)),
        help_blocks(field),
        k = script_safe_key(key),
    )
}

/// `form:wysiwyg(key, default, fieldset)`: a textarea upgraded to a rich-text
/// editor by the page scripts.
pub fn wysiwyg(key: &str, default: &str, field: Option<&FieldState>) -> String {
    format!(
        "{}{}<textarea class=\"textarea form-control\" id=\"{k}-ta\" name=\"{k}\">{}</textarea>{}</div>\
         <script>$(function() {{ $('#{k}-ta').wysihtml5(); }});</script>",
        open_group(field),
        default_label(key, field),
        escape(&string_value(field, default)),
        help_blocks(field),
        k = script_safe_key(key),
    )
}

/// Keys end up inside a jQuery selector; anything but `[A-Za-z0-9_-]` is dropped.
fn script_safe_key(key: &str) -> String {
    key.chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-'))
        .collect()
}

fn input_group(
    kind: &str,
    key: &str,
    default: &str,
    field: Option<&FieldState>,
    classes: Option<&str>,
    attributes: &[(&str, &str)],
) -> String {
    let value = if kind == "password" {
        String::new()
    } else {
        format!(" value=\"{}\"", escape(&string_value(field, default)))
    };
    format!(
        "{}{}<input class=\"form-control {}\" type=\"{kind}\" id=\"{k}\" name=\"{k}\"{value}{} />{}</div>",
        open_group(field),
        default_label(key, field),
        escape(classes.unwrap_or("")),
        attrs(attributes),
        help_blocks(field),
        k = escape(key),
    )
}

fn open_group(field: Option<&FieldState>) -> String {
    let has_errors = field.is_some_and(|f| !f.errors.is_empty());
    format!(
        "<div class=\"form-group {}\">",
        if has_errors { "has-error" } else { "" }
    )
}

fn default_label(key: &str, field: Option<&FieldState>) -> String {
    format!(
        "<label class=\"control-label\" for=\"{}\">{}</label>",
        escape(key),
        escape(&label_text(key, field))
    )
}

fn label_text(key: &str, field: Option<&FieldState>) -> String {
    field
        .map(|f| f.label.clone())
        .unwrap_or_else(|| key.to_string())
}

fn string_value(field: Option<&FieldState>, default: &str) -> String {
    match field.map(|f| &f.value) {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        _ => default.to_string(),
    }
}

fn help_blocks(field: Option<&FieldState>) -> String {
    field
        .map(|f| {
            f.errors
                .iter()
                .map(|e| format!("<span class=\"help-block\">{}</span>", escape(e)))
                .collect()
        })
        .unwrap_or_default()
}
