//! Profile documents and application settings.
//!
//! Profiles are page trees stored as JSON or YAML. Application settings
//! live in a separate TOML file.

mod loader;
mod path;
pub mod schema;
mod settings;

pub use loader::{ProfileFormat, load_profile, parse_profile, render_profile, save_profile};
pub use path::{home_dir, home_expand, parse_page_path, resolve_icon_file, to_file_uri};
pub use schema::{BindingDocument, IconDocument, PageDocument, ProfileDocument};
pub use settings::DeckSettings;
