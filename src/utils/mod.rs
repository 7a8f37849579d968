//! Small shared helpers: process execution, HTML escaping, MIME types, paths.

pub mod exec;
pub mod html;
pub mod mime;
pub mod path;
