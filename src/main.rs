use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ArgAction, Parser};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use wolf_extractor::error::{Result, WolfError};
use wolf_extractor::graphics::Palette;
use wolf_extractor::output::{OutputOptions, RunSummary, ScaleMode};
use wolf_extractor::profile::GameProfile;
use wolf_extractor::runner::{extract_title, RunConfig};
use wolf_extractor::title::{self, DetectedTitle, Platform, Title};

#[derive(Parser)]
#[command(name = "wolf_extractor", version)]
#[command(about = "Extracts Wolfenstein 3D, Spear of Destiny and other Wolf3D-engine game assets", long_about = None)]
struct Cli {
    /// Directory holding the game data
    #[arg(long, default_value = ".")]
    input: PathBuf,

    /// Where to write the assets
    #[arg(long, default_value = "./output")]
    output: PathBuf,

    /// Upscaling for page-file walls and sprites
    #[arg(long, value_enum, default_value_t = ScaleMode::Scale2x)]
    scale: ScaleMode,

    /// Keep chunk numbers instead of the redux names and remapping
    #[arg(long)]
    raw_names: bool,

    /// Also write PNG previews
    #[arg(long)]
    png: bool,

    /// Optimise the PNG previews with oxipng
    #[arg(long)]
    optimise_png: bool,

    /// 768-byte game palette, needed for PC images
    #[arg(long)]
    palette: Option<PathBuf>,

    /// Read --palette as 6-bit VGA DAC values
    #[arg(long)]
    vga_palette: bool,

    /// JSON chunk profile replacing the built-in one
    #[arg(long)]
    profile: Option<PathBuf>,

    /// Only extract this title (wl6, wl1, sod, sd1-sd3, sdm, mac, jaguar, bs6, bs1, vsi, co7, dmo,
    /// n3d, bc)
    #[arg(long)]
    title: Option<String>,

    /// Progress JSON file, rewritten after every asset
    #[arg(long)]
    progress: Option<PathBuf>,

    /// More logging; repeat for trace output
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn set_up_tracing(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn load_palette(path: &Path, vga: bool) -> Result<Palette> {
    let data = fs::read(path)?;
    if vga {
        Palette::from_vga(&data)
    } else {
        Palette::from_bytes(&data)
    }
}

/// Titles to extract: everything found, or just the one asked for.
fn select_titles(input: &Path, wanted: Option<&str>) -> Result<Vec<DetectedTitle>> {
    let found = title::scan(input)?;
    let Some(name) = wanted else {
        return Ok(found);
    };
    let title = Title::from_name(name)
        .ok_or_else(|| WolfError::format(format!("Unknown title \"{}\"", name)))?;
    Ok(found.into_iter().filter(|d| d.title == title).collect())
}

fn run(cli: &Cli) -> Result<RunSummary> {
    let titles = select_titles(&cli.input, cli.title.as_deref())?;
    if titles.is_empty() {
        return Err(WolfError::format(format!(
            "No game data found in {}",
            cli.input.display()
        )));
    }

    let palette = cli
        .palette
        .as_deref()
        .map(|path| load_palette(path, cli.vga_palette))
        .transpose()?;
    if palette.is_none() && titles.iter().any(|d| d.title.platform() == Platform::Pc) {
        warn!("No --palette given; PC pictures, walls and sprites will be skipped");
    }

    let config = RunConfig {
        output: cli.output.clone(),
        options: OutputOptions {
            png: cli.png || cli.optimise_png,
            optimise_png: cli.optimise_png,
            scale: cli.scale,
            raw_names: cli.raw_names,
            progress: cli.progress.clone(),
        },
        palette,
        profile: cli.profile.as_deref().map(GameProfile::load).transpose()?,
    };

    let mut total = RunSummary::default();
    for detected in &titles {
        match extract_title(detected, &cli.input, &config) {
            Ok(summary) => total.merge(summary),
            Err(e) => {
                error!("{}: {}", detected.file.display(), e);
                total.aborted_containers += 1;
            }
        }
    }
    Ok(total)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    set_up_tracing(cli.verbose);

    match run(&cli) {
        Ok(summary) => {
            info!(
                "Done: {} files written, {} failed, {} containers aborted",
                summary.written, summary.failed, summary.aborted_containers
            );
            if summary.is_clean() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
