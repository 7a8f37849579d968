//! Configuration section definitions.
//!
//! Each module corresponds to a section in `kiln.toml`:
//!
//! | Module  | TOML Section        | Purpose                                   |
//! |---------|---------------------|-------------------------------------------|
//! | `site`  | `[site]`            | Document defaults (title, lang, head tags) |
//! | `build` | `[build]`           | Pages/cache/tools dirs, esbuild settings  |
//! | `css`   | `[css]`             | Tailwind processing                       |
//! | `serve` | `[serve]`           | Dev server and hot reload ports           |
//! | `pages` | `[pages."<route>"]` | Per-route overrides                       |

mod build;
mod css;
mod pages;
mod serve;
mod site;

pub use build::BuildConfig;
pub use css::CssConfig;
pub use pages::PageSection;
pub use serve::ServeConfig;
pub use site::SiteConfig;
