//! Deck page editor - bind actions, icons and folders to programmable keys.
//!
//! Provides both human-friendly and agent-friendly (robot mode) interfaces.
#![forbid(unsafe_code)]

use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};

use clap::Parser;
use console::style;
use serde::Serialize;

use deck::actions::{ActionFactory, ActionRegistry};
use deck::cli::{self, Cli, Commands, KeyView, Session};
use deck::config::{self, DeckSettings, ProfileDocument};
use deck::device::{ChannelDevice, spawn_render_worker};
use deck::error::{DeckError, Result, ResultExt};
use deck::logging;
use deck::model::{Deck, IconContents, Rgba};
use deck::persistence::DebouncedSave;

/// Build information embedded at compile time.
mod build_info {
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");

    pub fn git_sha() -> &'static str {
        option_env!("VERGEN_GIT_SHA").unwrap_or("unknown")
    }

    pub fn git_dirty() -> &'static str {
        option_env!("VERGEN_GIT_DIRTY").unwrap_or("false")
    }

    pub fn build_timestamp() -> &'static str {
        option_env!("VERGEN_BUILD_TIMESTAMP").unwrap_or("unknown")
    }

    pub fn rustc_semver() -> &'static str {
        option_env!("VERGEN_RUSTC_SEMVER").unwrap_or("unknown")
    }

    pub fn target() -> &'static str {
        option_env!("VERGEN_CARGO_TARGET_TRIPLE").unwrap_or("unknown")
    }
}

fn main() {
    let cli = Cli::parse();

    if cli.no_color || !io::stdout().is_terminal() {
        console::set_colors_enabled(false);
        console::set_colors_enabled_stderr(false);
    }

    logging::init_logging(cli.robot, cli.verbose, cli.quiet);

    if let Err(e) = run(&cli) {
        output_error(&cli, &e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let mut settings = DeckSettings::load(cli.config.as_deref())?;
    if let Some(model) = cli.model {
        settings.model = model;
    }

    match &cli.command {
        None => print_quick_start(cli),
        Some(Commands::Kinds) => cmd_kinds(cli),
        Some(Commands::Init(args)) => cmd_init(cli, args),
        Some(Commands::Show(args)) => cmd_show(cli, &settings, args),
        Some(Commands::Bind(args)) => cmd_bind(cli, &settings, args),
        Some(Commands::Unbind(args)) => cmd_unbind(cli, &settings, args),
        Some(Commands::Swap(args)) => cmd_swap(cli, &settings, args),
        Some(Commands::Icon(args)) => cmd_icon(cli, &settings, args),
        Some(Commands::Pref(args)) => cmd_pref(cli, &settings, args),
        Some(Commands::Press(args)) => cmd_press(cli, &settings, args),
        Some(Commands::Render(args)) => cmd_render(cli, &settings, args),
        Some(Commands::Version) => cmd_version(cli),
        Some(Commands::Completions(args)) => cmd_completions(cli, args),
    }
}

// === Quick Start (Robot Mode Optimized) ===

#[allow(clippy::unnecessary_wraps)] // Consistent return type with other commands
fn print_quick_start(cli: &Cli) -> Result<()> {
    if cli.use_json() {
        output_json(
            cli,
            &RobotQuickStart {
                tool: "deck",
                version: build_info::VERSION,
                description: "Edit key bindings, icons and folders of deck profiles",
                commands: &[
                    "deck kinds --robot",
                    "deck init <PROFILE>",
                    "deck show <PROFILE> [--path 3/5] --robot",
                    "deck bind <PROFILE> --key <N> --kind <KIND>",
                    "deck unbind <PROFILE> --key <N>",
                    "deck swap <PROFILE> --from <A> --to <B>",
                    "deck icon <PROFILE> --key <N> [--text T] [--background C]",
                    "deck pref <PROFILE> --key <N> --name <PREF> --value <V>",
                    "deck press <PROFILE> --key <N>",
                    "deck render <PROFILE> --out <DIR>",
                ],
                key_layout: "Keys indexed left-to-right, top-to-bottom; key 0 of a folder navigates up",
                output_modes: OutputModes {
                    human: "--format=text (default)",
                    robot: "--robot or --format=json",
                    compact: "--format=json-compact",
                },
            },
        );
    } else {
        println!(
            "{} {} - deck page editor\n",
            style("deck").bold().cyan(),
            build_info::VERSION
        );
        println!("{}", style("QUICK START").bold().underlined());
        println!();
        println!("  {}  Create a profile", style("deck init main.json").green());
        println!("  {}  Show the root page", style("deck show main.json").green());
        println!(
            "  {}  Add a folder",
            style("deck bind main.json -k 3 --kind navigation").green()
        );
        println!(
            "  {}  Edit inside it",
            style("deck bind main.json -p 3 -k 1 --kind brightness").green()
        );
        println!(
            "  {}  Move a key",
            style("deck swap main.json --from 1 --to 4").green()
        );
        println!();
        println!("Run {} for full help", style("deck --help").yellow());
    }
    Ok(())
}

#[derive(Serialize)]
struct RobotQuickStart {
    tool: &'static str,
    version: &'static str,
    description: &'static str,
    commands: &'static [&'static str],
    key_layout: &'static str,
    output_modes: OutputModes,
}

#[derive(Serialize)]
struct OutputModes {
    human: &'static str,
    robot: &'static str,
    compact: &'static str,
}

// === Command Implementations ===

#[allow(clippy::unnecessary_wraps)] // Consistent return type with other commands
fn cmd_kinds(cli: &Cli) -> Result<()> {
    let kinds = ActionRegistry::with_builtin().list_kinds();
    if cli.use_json() {
        output_json(cli, &kinds);
    } else {
        for kind in &kinds {
            println!(
                "{:<12} {} ({})",
                style(&kind.id).green(),
                kind.display_name,
                style(&kind.icon_name).dim()
            );
        }
    }
    Ok(())
}

fn cmd_init(cli: &Cli, args: &cli::InitArgs) -> Result<()> {
    if args.profile.exists() && !args.force {
        return Err(DeckError::Other(format!(
            "{} already exists (use --force to overwrite)",
            args.profile.display()
        )));
    }
    let profile = ProfileDocument::new(&args.name);
    config::save_profile(&profile, &args.profile)?;

    if cli.use_json() {
        output_json(
            cli,
            &serde_json::json!({
                "profile": args.profile.display().to_string(),
                "id": profile.id,
                "name": profile.name,
                "ok": true
            }),
        );
    } else if !cli.quiet {
        println!("Created {} ({})", args.profile.display(), profile.name);
    }
    Ok(())
}

fn cmd_show(cli: &Cli, settings: &DeckSettings, args: &cli::ShowArgs) -> Result<()> {
    let session = open_session(settings, &args.page)?;
    let keys = session.keys();

    if cli.use_json() {
        output_json(
            cli,
            &PageView {
                profile: session.deck().profile_name(),
                model: session.deck().model().to_string(),
                path: session.folders(),
                brightness: session.deck().brightness(),
                keys: &keys,
            },
        );
    } else {
        print_page(&session, &keys);
    }
    Ok(())
}

#[derive(Serialize)]
struct PageView<'a> {
    profile: &'a str,
    model: String,
    path: &'a [u8],
    brightness: u8,
    keys: &'a [KeyView],
}

fn print_page(session: &Session, keys: &[KeyView]) {
    let deck = session.deck();
    let path = session
        .folders()
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("/");
    println!(
        "{} {} [{}] brightness {}%",
        style(deck.profile_name()).bold(),
        style(format!("/{path}")).cyan(),
        deck.model().display_name(),
        deck.brightness()
    );

    let (cols, _) = deck.model().layout();
    for row in keys.chunks(usize::from(cols)) {
        let cells: Vec<String> = row.iter().map(key_label).collect();
        println!("  {}", cells.join(" "));
    }
}

fn key_label(key: &KeyView) -> String {
    let label = key
        .text
        .clone()
        .or_else(|| key.name.clone())
        .unwrap_or_else(|| "-".to_string());
    let cell = format!("[{:>2}] {:<10}", key.position, truncate(&label, 10));
    if key.reserved {
        style(cell).dim().to_string()
    } else if key.folder {
        style(cell).yellow().to_string()
    } else if key.kind.is_some() {
        style(cell).green().to_string()
    } else {
        cell
    }
}

fn truncate(text: &str, width: usize) -> String {
    text.chars().take(width).collect()
}

fn cmd_bind(cli: &Cli, settings: &DeckSettings, args: &cli::BindArgs) -> Result<()> {
    let mut session = open_session(settings, &args.target.page)?;
    session.bind(args.target.key, &args.kind)?;
    finish_edit(cli, session, args.target.key, &format!("bound to {}", args.kind))
}

fn cmd_unbind(cli: &Cli, settings: &DeckSettings, args: &cli::KeyArgs) -> Result<()> {
    let mut session = open_session(settings, &args.page)?;
    session.unbind(args.key)?;
    finish_edit(cli, session, args.key, "cleared")
}

fn cmd_swap(cli: &Cli, settings: &DeckSettings, args: &cli::SwapArgs) -> Result<()> {
    let mut session = open_session(settings, &args.page)?;
    session.swap(args.from, args.to)?;
    let saved = session.finish()?;

    if cli.use_json() {
        output_json(
            cli,
            &serde_json::json!({ "from": args.from, "to": args.to, "saved": saved, "ok": true }),
        );
    } else if !cli.quiet {
        println!("Swapped keys {} and {}", args.from, args.to);
    }
    Ok(())
}

fn cmd_icon(cli: &Cli, settings: &DeckSettings, args: &cli::IconArgs) -> Result<()> {
    let mut session = open_session(settings, &args.target.page)?;
    let contents = if args.clear {
        None
    } else {
        Some(icon_contents(args)?)
    };
    session.set_icon(args.target.key, contents)?;
    let what = if args.clear { "icon removed" } else { "icon set" };
    finish_edit(cli, session, args.target.key, what)
}

fn icon_contents(args: &cli::IconArgs) -> Result<IconContents> {
    let mut contents = IconContents {
        text: args.text.clone(),
        icon_name: args.icon_name.clone(),
        opacity: args.opacity,
        ..IconContents::default()
    };
    if let Some(background) = &args.background {
        contents.background = Rgba::parse(background)?;
    }
    if let Some(color) = &args.color {
        contents.color = Some(Rgba::parse(color)?);
    }
    if let Some(image) = &args.image {
        if !image.is_file() {
            return Err(DeckError::ImageProcessing(format!(
                "image not found: {}",
                image.display()
            )));
        }
        contents.file = Some(config::to_file_uri(image)?);
    }
    if !contents.opacity_is_valid() {
        return Err(DeckError::Other("Opacity must be between 0.0 and 1.0".to_string()));
    }
    Ok(contents)
}

fn cmd_pref(cli: &Cli, settings: &DeckSettings, args: &cli::PrefArgs) -> Result<()> {
    let mut session = open_session(settings, &args.target.page)?;
    session.set_preference(args.target.key, &args.name, args.value)?;
    finish_edit(
        cli,
        session,
        args.target.key,
        &format!("{} set to {}", args.name, args.value),
    )
}

fn cmd_press(cli: &Cli, settings: &DeckSettings, args: &cli::KeyArgs) -> Result<()> {
    let mut session = open_session(settings, &args.page)?;
    session.press(args.key)?;
    let brightness = session.deck().brightness();
    let saved = session.finish()?;

    if cli.use_json() {
        output_json(
            cli,
            &serde_json::json!({
                "key": args.key,
                "brightness": brightness,
                "saved": saved,
                "ok": true
            }),
        );
    } else if !cli.quiet {
        println!("Pressed key {} (brightness {}%)", args.key, brightness);
    }
    Ok(())
}

fn cmd_render(cli: &Cli, settings: &DeckSettings, args: &cli::RenderArgs) -> Result<()> {
    let path = profile_path(settings, args.page.profile.as_deref())?;
    let folders = config::parse_page_path(&args.page.path)?;
    std::fs::create_dir_all(&args.out)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let keys = runtime.block_on(async {
        let (device, rx) = ChannelDevice::new();
        let (frames, worker) = spawn_render_worker(rx, args.resize, Some(args.out.clone()));

        let builder = Deck::builder(settings.model)
            .device(device)
            .persistence(DebouncedSave::new(settings.save_delay()));
        let mut session = Session::open_with(&path, builder, settings.save_delay())?;
        session.enter(&folders)?;

        // Dropping the deck closes the channel and lets the worker finish.
        drop(session.into_deck());
        worker
            .await
            .with_context(|| "render worker")?
            .map_err(|e| DeckError::ImageProcessing(format!("{e:#}")))?;
        Ok::<_, DeckError>(frames.positions())
    })?;

    if cli.use_json() {
        output_json(
            cli,
            &serde_json::json!({
                "out": args.out.display().to_string(),
                "keys": keys,
                "ok": true
            }),
        );
    } else if !cli.quiet {
        println!("Rendered {} keys to {}", keys.len(), args.out.display());
    }
    Ok(())
}

#[allow(clippy::unnecessary_wraps)] // Consistent return type with other commands
fn cmd_version(cli: &Cli) -> Result<()> {
    if cli.use_json() {
        output_json(
            cli,
            &serde_json::json!({
                "version": build_info::VERSION,
                "git_sha": build_info::git_sha(),
                "git_dirty": build_info::git_dirty() == "true",
                "build_timestamp": build_info::build_timestamp(),
                "rustc_version": build_info::rustc_semver(),
                "target": build_info::target(),
            }),
        );
    } else {
        println!("deck {}", build_info::VERSION);
        println!(
            "git: {}{}",
            build_info::git_sha(),
            if build_info::git_dirty() == "true" {
                " (dirty)"
            } else {
                ""
            }
        );
        println!("built: {}", build_info::build_timestamp());
        println!("rustc: {}", build_info::rustc_semver());
        println!("target: {}", build_info::target());
    }
    Ok(())
}

#[allow(clippy::unnecessary_wraps)] // Consistent return type with other commands
fn cmd_completions(_cli: &Cli, args: &cli::CompletionsArgs) -> Result<()> {
    use clap::CommandFactory;
    clap_complete::generate(args.shell, &mut Cli::command(), "deck", &mut io::stdout());
    Ok(())
}

// === Utility Functions ===

fn profile_path(settings: &DeckSettings, given: Option<&Path>) -> Result<PathBuf> {
    given
        .map(Path::to_path_buf)
        .or_else(|| settings.default_profile.clone())
        .ok_or_else(|| {
            DeckError::Other(
                "No profile given and no default_profile in the settings file".to_string(),
            )
        })
}

fn open_session(settings: &DeckSettings, page: &cli::PageArgs) -> Result<Session> {
    let path = profile_path(settings, page.profile.as_deref())?;
    let folders = config::parse_page_path(&page.path)?;
    let mut session = Session::open(&path, settings)?;
    session.enter(&folders)?;
    Ok(session)
}

fn finish_edit(cli: &Cli, session: Session, key: u8, what: &str) -> Result<()> {
    let path = session.path().display().to_string();
    let saved = session.finish()?;

    if cli.use_json() {
        output_json(
            cli,
            &serde_json::json!({ "key": key, "profile": path, "saved": saved, "ok": true }),
        );
    } else if !cli.quiet {
        println!("Key {key} {what}");
    }
    Ok(())
}

fn output_json<T: Serialize>(cli: &Cli, data: &T) {
    let json = if cli.use_compact_json() {
        serde_json::to_string(data)
    } else {
        serde_json::to_string_pretty(data)
    };
    match json {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("failed to encode output: {e}"),
    }
}

fn output_error(cli: &Cli, error: &DeckError) {
    if cli.use_json() {
        let json = serde_json::json!({
            "error": true,
            "message": error.to_string(),
            "suggestion": error.suggestion(),
            "recoverable": error.is_user_recoverable(),
        });
        eprintln!("{json:#}");
    } else {
        eprintln!("{}: {}", style("Error").red().bold(), error);
        if let Some(suggestion) = error.suggestion() {
            eprintln!("{}: {}", style("Hint").yellow(), suggestion);
        }
    }
}
