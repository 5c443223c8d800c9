//! Reusable HTML fragments ("tags").
//!
//! Every tag is a pure function of its arguments. Tags that wrap content come
//! in pairs (`box_open` / `box_close`) or take the rendered body directly.
//! All interpolated text is escaped.

pub mod form;
pub mod layout;
pub mod logic;
pub mod sidebar;

pub use form::{
    checkbox_group, color_group, date_group, email_group, form_close, form_open, password_group,
    select_group, text_group, textarea_group, wysiwyg,
};
pub use layout::{
    box_body, box_close, box_footer, box_open, box_wrap, button_delete, image_round, infobox,
    label, menu_footer, menu_toggle, solid_box, table, table_rows,
};
pub use logic::{gate_allow, if_not_empty, time_since};
pub use sidebar::{is_active, sidebar_container, sidebar_header, sidebar_link};
