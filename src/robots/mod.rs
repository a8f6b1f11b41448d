//! Robots.txt handling module
//!
//! Only `Sitemap:` directives are of interest here: they name the sitemap roots
//! a site advertises. Fetching robots.txt is left to the caller.

mod parser;

pub use parser::extract_sitemap_directives;
