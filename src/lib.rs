//! Cosmetic enhancements for server-rendered admin and story pages
//!
//! Pages are loaded into an in-memory [`dom::Document`] and wrapped in a
//! [`page::Page`], which owns the listeners and virtual-time scheduler the
//! enhancers attach to. [`admin::init_admin`] and [`public::init_public`] are
//! the two page-load entry points.

pub mod admin;
pub mod animation;
pub mod config;
pub mod dom;
pub mod error;
pub mod markup;
pub mod page;
pub mod public;
pub mod scheduler;

pub use config::EnhancerConfig;
pub use error::{Error, Result};
pub use page::{Host, Page, ScriptedHost};
