use clap::{Parser, Subcommand};
use orca::editor::{LayerEditor, LayerTransform, Point};
use orca::imaging::{ExportFormat, Quality};
use orca::rename::{CommitPolicy, IgnoreSet, RenameRule, commit_plan, compile_plan, list_files};
use orca::scrape::{ScrapeRequest, Scraper};
use orca::{config, output};
use std::path::PathBuf;

fn version_string() -> &'static str {
    let on_tag = env!("ORCA_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("ORCA_GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "orca")]
#[command(about = "Layer compositing, rule-based renaming and image scraping")]
#[command(long_about = "\
Layer compositing, rule-based renaming and image scraping

Rename rules are JSON or TOML files:

  case = \"lower\"
  replace = [{ pattern = \"^IMG_\", replacement = \"\" }]
  skip_if_matches = [\"^keep\"]

  [numbering]
  enabled = true
  prefix = \"holiday_\"
  padding = 2

'orca rename' only prints the plan; pass --apply to rename on disk.

Scraping saves the largest real photos found on a page. Logos, icons,
banners and duplicates are filtered out. Set RUST_LOG=debug to see why
each candidate was skipped.

Run 'orca gen-config' to generate a documented orca.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Directory containing orca.toml
    #[arg(long, default_value = ".", global = true)]
    config_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Plan (and optionally apply) a rule-based rename of a folder
    Rename {
        folder: PathBuf,
        /// Rule file (.json or .toml)
        #[arg(long)]
        rule: PathBuf,
        /// Rename files on disk instead of only printing the plan
        #[arg(long)]
        apply: bool,
        /// With --apply, skip entries whose target exists instead of aborting
        #[arg(long)]
        skip_existing: bool,
        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
    },
    /// Download the main images of a web page into a folder
    Scrape {
        url: String,
        folder: PathBuf,
        /// Maximum number of images to save (default from config)
        #[arg(long)]
        limit: Option<usize>,
    },
    /// List scored image candidates of a page without downloading
    Candidates {
        url: String,
        #[arg(long)]
        json: bool,
    },
    /// Stack overlays on a base image and export the base region
    Compose {
        base: PathBuf,
        /// Overlay image, repeatable; drawn in the order given
        #[arg(long = "overlay")]
        overlays: Vec<PathBuf>,
        /// Overlay placement as X,Y (top-left, scene pixels), one per overlay
        #[arg(long = "at", value_parser = parse_point)]
        positions: Vec<Point>,
        /// Opacity applied to every overlay (0.0-1.0)
        #[arg(long)]
        opacity: Option<f64>,
        /// Output file (.png or .jpg)
        #[arg(short, long)]
        output: PathBuf,
        /// JPEG quality 1-100 (default from config)
        #[arg(long)]
        quality: Option<u32>,
    },
    /// Print a stock orca.toml with all options documented
    GenConfig,
}

fn parse_point(s: &str) -> Result<Point, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y, got `{s}`"))?;
    let x: f64 = x.trim().parse().map_err(|_| format!("bad X in `{s}`"))?;
    let y: f64 = y.trim().parse().map_err(|_| format!("bad Y in `{s}`"))?;
    Ok(Point::new(x, y))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Rename {
            folder,
            rule,
            apply,
            skip_existing,
            json,
        } => {
            let toolkit = config::load_config(&cli.config_dir)?;
            let rule = RenameRule::load(&rule)?;
            let ignore = IgnoreSet::new(&toolkit.rename.ignore)?;
            let names = list_files(&folder, &ignore)?;
            let plan = compile_plan(&names, &rule)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&plan)?);
            } else {
                output::print_plan(&plan);
            }

            if apply {
                let policy = if skip_existing {
                    CommitPolicy::SkipExisting
                } else {
                    CommitPolicy::AllOrNothing
                };
                let report = commit_plan(&folder, &plan, policy)?;
                output::print_commit_report(&report);
            }
        }
        Command::Scrape { url, folder, limit } => {
            let toolkit = config::load_config(&cli.config_dir)?;
            let request = ScrapeRequest {
                url,
                folder,
                limit: limit.unwrap_or(toolkit.scraper.limit),
            };
            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    for line in output::format_scrape_event(&event) {
                        println!("{}", line);
                    }
                }
            });
            let scraper = Scraper::with_config(toolkit.scraper).with_events(tx);
            let result = scraper.run(&request);
            // Dropping the scraper closes the channel so the printer can finish
            drop(scraper);
            printer.join().unwrap();
            result?;
        }
        Command::Candidates { url, json } => {
            let toolkit = config::load_config(&cli.config_dir)?;
            let scraper = Scraper::with_config(toolkit.scraper);
            let candidates = scraper.candidates(&url)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&candidates)?);
            } else {
                output::print_candidates(&candidates);
            }
        }
        Command::Compose {
            base,
            overlays,
            positions,
            opacity,
            output: out_path,
            quality,
        } => {
            let toolkit = config::load_config(&cli.config_dir)?;
            init_thread_pool(&toolkit.processing);
            let format = ExportFormat::from_path(&out_path)
                .ok_or_else(|| format!("unsupported output type: {}", out_path.display()))?;
            let quality = Quality::new(quality.unwrap_or(toolkit.editor.export_quality));

            let mut editor = LayerEditor::with_config(toolkit.editor);
            editor.set_base_image(&std::fs::read(&base)?)?;
            for (i, overlay) in overlays.iter().enumerate() {
                let Some(id) = editor.add_overlay(&std::fs::read(overlay)?)? else {
                    continue;
                };
                if let Some(position) = positions.get(i) {
                    editor.move_layer(id, *position)?;
                }
                if let Some(opacity) = opacity {
                    editor.transform_layer(id, LayerTransform::opacity(opacity))?;
                }
                editor.commit();
            }

            let bytes = editor.export(format, Some(quality))?;
            std::fs::write(&out_path, bytes)?;
            let size = editor.export_size().unwrap_or_default();
            output::print_compose_output(&editor.layers(), &out_path, size);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; the config can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
