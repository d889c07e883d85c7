//! Autograph Field Library
//!
//! Binds a [`autograph_render::SignaturePad`] to a form field: submitted
//! state, commit and confirmation, action gating, themes and downloads.

pub mod cli;
pub mod config;
pub mod field;

pub use config::{Action, ConfigError, DownloadFormat, FieldConfig, Labels, Theme};
pub use field::{Download, FieldError, FieldResult, SignatureField};
