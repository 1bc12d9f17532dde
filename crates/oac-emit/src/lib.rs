//! Turns resolved OpenAPI documents into gateway routing and documentation.
//!
//! Two targets are supported: Nginx `location` blocks that proxy each path to
//! the document's first server, and VitePress pages for `vitepress-openapi`.
//! [`Converter`] runs the whole pipeline for one input file.

pub mod convert;
pub mod error;
pub mod nginx;
pub mod templates;
pub mod vitepress;

pub use convert::{Conversion, ConvertOptions, Converter};
pub use error::EmitError;
pub use nginx::{nginx_configuration, render_location, RouteDescriptor};
pub use vitepress::{icon_for_title, spec_json, upsert_feature, Feature, VitePressWriter};
