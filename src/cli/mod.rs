//! CLI argument definitions.

mod session;

pub use session::{KeyView, Session};

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::device::DeviceModel;
use crate::image_ops::ResizeStrategy;

/// Deck page editor - bind actions, icons and folders to programmable keys.
///
/// Robot Mode: Use --robot or --format=json for machine-parseable output.
#[derive(Parser, Debug)]
#[command(name = "deck", version, about, long_about = None)]
#[command(propagate_version = true)]
#[allow(clippy::struct_excessive_bools)] // CLI flags naturally use multiple bools
pub struct Cli {
    /// Output format (text for humans, json for agents/scripts)
    #[arg(
        long,
        short = 'f',
        default_value = "text",
        global = true,
        env = "DECK_FORMAT"
    )]
    pub format: OutputFormat,

    /// Robot mode: equivalent to --format=json
    #[arg(long, global = true)]
    pub robot: bool,

    /// Verbose output (repeat for more detail)
    #[arg(long, short = 'v', global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress non-essential output)
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Disable colored output (any non-empty NO_COLOR except "0"/"false")
    #[arg(
        long,
        global = true,
        env = "NO_COLOR",
        value_parser = clap::builder::FalseyValueParser::new()
    )]
    pub no_color: bool,

    /// Settings file (defaults to the platform config dir)
    #[arg(long, global = true, env = "DECK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Device model, overriding the settings file
    #[arg(long, short = 'm', global = true, env = "DECK_MODEL")]
    pub model: Option<DeviceModel>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Output format selection.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text with optional color
    #[default]
    Text,
    /// JSON output for scripts and agents
    Json,
    /// Compact JSON (single line)
    JsonCompact,
}

impl Cli {
    /// Returns true if output should be JSON (robot mode or explicit --format=json).
    pub const fn use_json(&self) -> bool {
        self.robot || matches!(self.format, OutputFormat::Json | OutputFormat::JsonCompact)
    }

    /// Returns true if output should be compact JSON.
    pub const fn use_compact_json(&self) -> bool {
        matches!(self.format, OutputFormat::JsonCompact)
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    // === Discovery ===
    /// List the action kinds that can be bound
    Kinds,

    // === Profiles ===
    /// Create an empty profile
    Init(InitArgs),

    /// Show the keys of a page
    Show(ShowArgs),

    // === Editing ===
    /// Bind a new action to a key
    Bind(BindArgs),

    /// Remove the action and custom icon from a key
    Unbind(KeyArgs),

    /// Swap two keys, as if one was dragged onto the other
    Swap(SwapArgs),

    /// Set a custom icon on a key
    Icon(IconArgs),

    /// Change a preference of the action bound to a key
    Pref(PrefArgs),

    /// Press and release a key
    Press(KeyArgs),

    // === Output ===
    /// Render every key of a page to PNG files
    Render(RenderArgs),

    // === Utilities ===
    /// Show version and build information
    Version,

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// === Argument Structs ===

/// Profile file plus the folder path to enter.
#[derive(Parser, Debug)]
pub struct PageArgs {
    /// Profile file (.json, .yaml); defaults to the settings' default profile
    pub profile: Option<PathBuf>,

    /// Folder keys to enter from the root, e.g. "3/5"
    #[arg(long, short = 'p', default_value = "")]
    pub path: String,
}

#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Profile file to create
    pub profile: PathBuf,

    /// Profile display name
    #[arg(long, short = 'n', default_value = "Default")]
    pub name: String,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

#[derive(Parser, Debug)]
pub struct ShowArgs {
    #[command(flatten)]
    pub page: PageArgs,
}

#[derive(Parser, Debug)]
pub struct KeyArgs {
    #[command(flatten)]
    pub page: PageArgs,

    /// Key index (0-based, left-to-right, top-to-bottom)
    #[arg(long, short = 'k')]
    pub key: u8,
}

#[derive(Parser, Debug)]
pub struct BindArgs {
    #[command(flatten)]
    pub target: KeyArgs,

    /// Action kind id (see `deck kinds`)
    #[arg(long)]
    pub kind: String,
}

#[derive(Parser, Debug)]
pub struct SwapArgs {
    #[command(flatten)]
    pub page: PageArgs,

    /// Key being dragged
    #[arg(long)]
    pub from: u8,

    /// Key it is dropped on
    #[arg(long)]
    pub to: u8,
}

#[derive(Parser, Debug)]
pub struct IconArgs {
    #[command(flatten)]
    pub target: KeyArgs,

    /// Label drawn on the key
    #[arg(long)]
    pub text: Option<String>,

    /// Background color (#RRGGBB, #RRGGBBAA or a color name)
    #[arg(long)]
    pub background: Option<String>,

    /// Foreground color
    #[arg(long)]
    pub color: Option<String>,

    /// Symbolic icon name
    #[arg(long)]
    pub icon_name: Option<String>,

    /// Image file (PNG, JPEG, BMP, GIF)
    #[arg(long)]
    pub image: Option<PathBuf>,

    /// Layer opacity (0.0-1.0)
    #[arg(long)]
    pub opacity: Option<f32>,

    /// Remove the custom icon instead
    #[arg(long, conflicts_with_all = ["text", "background", "color", "icon_name", "image", "opacity"])]
    pub clear: bool,
}

#[derive(Parser, Debug)]
pub struct PrefArgs {
    #[command(flatten)]
    pub target: KeyArgs,

    /// Preference key, as listed by `deck show --robot`
    #[arg(long)]
    pub name: String,

    /// New value: a choice index or a number
    #[arg(long)]
    pub value: f64,
}

#[derive(Parser, Debug)]
pub struct RenderArgs {
    #[command(flatten)]
    pub page: PageArgs,

    /// Output directory for key-<N>.png files
    #[arg(long, short = 'o')]
    pub out: PathBuf,

    /// Resize strategy for image layers
    #[arg(long, default_value = "fit")]
    pub resize: ResizeStrategy,
}

#[derive(Parser, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
