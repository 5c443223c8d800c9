//! `adminpanel-ui`: HTML fragments and page rendering for the admin panel.
//!
//! Tags are pure functions returning escaped HTML. Pages and emails are
//! rendered through the [`Renderer`] seam so hosts can plug in their own
//! templates.

pub mod error;
pub mod escape;
pub mod flash;
pub mod pages;
pub mod render;
pub mod tags;

pub use error::RenderError;
pub use escape::escape;
pub use flash::{Flash, FlashLevel, FlashLink};
pub use render::{PanelRenderer, Renderer, templates};
