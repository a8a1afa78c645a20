//! Los Libros Reader
//!
//! Core of the e-book reading surface: pagination over an embedded HTML
//! rendering engine, content geometry, and highlight anchoring.
//!
//! # Modules
//!
//! - `geometry`: content dimensions read from the rendering surface
//! - `pagination`: pages, offsets and the content frame per scroll-axis mode
//! - `highlights`: re-anchoring stored highlights in chapter text, building
//!   records from selections, persistence
//! - `surface`: rendering-surface contract, two-step queries, scripts
//! - `navigation`: custom URL schemes raised by the document
//! - `menu`: highlight interaction state and menu contents
//! - `session`: book-wide reader state shared by pages
//! - `page`: the per-page controller tying these together

pub mod config;
pub mod error;
pub mod geometry;
pub mod highlights;
pub mod menu;
pub mod navigation;
pub mod page;
pub mod pagination;
pub mod session;
pub mod surface;

pub use config::{Config, ReaderConfig};
pub use error::{ReaderError, Result};
pub use page::{ReaderHost, ReaderPage};
pub use session::{BookContext, SessionContext, SessionEvent};
