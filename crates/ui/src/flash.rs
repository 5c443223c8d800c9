use serde::{Deserialize, Serialize};

use crate::escape;

/// Severity of a one-shot message shown on the next rendered page.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Success,
    Info,
    Warning,
    Error,
}

impl FlashLevel {
    /// AdminLTE alert class.
    pub fn css_class(self) -> &'static str {
        match self {
            FlashLevel::Success => "alert-success",
            FlashLevel::Info => "alert-info",
            FlashLevel::Warning => "alert-warning",
            FlashLevel::Error => "alert-danger",
        }
    }
}

/// Optional link rendered after the message (e.g. "Undo").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashLink {
    pub href: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<FlashLink>,
}

impl Flash {
    pub fn new(level: FlashLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            link: None,
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(FlashLevel::Success, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(FlashLevel::Info, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(FlashLevel::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(FlashLevel::Error, message)
    }

    pub fn with_link(mut self, href: impl Into<String>, label: impl Into<String>) -> Self {
        self.link = Some(FlashLink {
            href: href.into(),
            label: label.into(),
        });
        self
    }

    pub fn to_html(&self) -> String {
        let link = match &self.link {
            Some(link) => format!(
                " <a href=\"{}\">{}</a>",
                escape(&link.href),
                escape(&link.label)
            ),
            None => String::new(),
        };
        format!(
            "<div class=\"alert {} alert-dismissible\">{}{}</div>",
            self.level.css_class(),
            escape(&self.message),
            link
        )
    }
}
