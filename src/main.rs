use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use texture_adder::config::{self, AppConfig, DeliveryMode};
use texture_adder::export::ExportSettings;
use texture_adder::imaging::{EncodeParams, ImageBackend, Quality, RustBackend};
use texture_adder::loader::{TEXTURES, resolve_texture};
use texture_adder::output;
use texture_adder::session::Session;
use texture_adder::types::{BlendMode, OutputFormat, SizePreset};
use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt};

/// Look flags shared by `export` and `preview`. Each one overrides the
/// matching config value.
#[derive(clap::Args, Clone, Debug)]
struct TuneArgs {
    /// Texture name, with or without extension
    #[arg(long)]
    texture: Option<String>,

    /// Blend mode for the texture layer
    #[arg(long, value_enum)]
    blend: Option<BlendMode>,

    /// Texture opacity, percent (0-100)
    #[arg(long, value_name = "PERCENT")]
    opacity: Option<f32>,

    /// Brightness, percent (100 = unchanged)
    #[arg(long, value_name = "PERCENT", allow_negative_numbers = true)]
    brightness: Option<f32>,

    /// Contrast, percent (100 = unchanged)
    #[arg(long, value_name = "PERCENT", allow_negative_numbers = true)]
    contrast: Option<f32>,

    /// Saturation, percent (100 = unchanged)
    #[arg(long, value_name = "PERCENT", allow_negative_numbers = true)]
    saturation: Option<f32>,
}

impl TuneArgs {
    fn apply(&self, config: &mut AppConfig) {
        if let Some(texture) = &self.texture {
            config.composite.texture = texture.clone();
        }
        if let Some(blend) = self.blend {
            config.composite.blend_mode = blend;
        }
        if let Some(opacity) = self.opacity {
            config.composite.opacity = opacity;
        }
        if let Some(brightness) = self.brightness {
            config.tone.brightness = brightness;
        }
        if let Some(contrast) = self.contrast {
            config.tone.contrast = contrast;
        }
        if let Some(saturation) = self.saturation {
            config.tone.saturation = saturation;
        }
    }
}

/// Output flags shared by `export` and `plan`.
#[derive(clap::Args, Clone, Debug)]
struct OutputArgs {
    /// Cap on the longer edge
    #[arg(long, value_enum)]
    size: Option<SizePreset>,

    /// Output format
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// Lossy quality, 0.5-1.0 (ignored for png)
    #[arg(long)]
    quality: Option<f32>,

    /// Render at the configured device pixel ratio
    #[arg(long)]
    device_pixel_ratio: bool,
}

impl OutputArgs {
    fn apply(&self, config: &mut AppConfig) {
        if let Some(size) = self.size {
            config.output.size = size;
        }
        if let Some(format) = self.format {
            config.output.format = format;
        }
        if let Some(quality) = self.quality {
            config.output.quality = quality;
        }
        if self.device_pixel_ratio {
            config.output.use_device_pixel_ratio = true;
        }
    }
}

#[derive(Parser)]
#[command(name = "texture-adder")]
#[command(about = "Blend a photo with a texture, adjust tone, and export")]
#[command(long_about = "\
Blend a photo with a texture, adjust tone, and export

The photo is drawn first, then the texture is blended on top with the chosen
blend mode and opacity. Brightness, contrast and saturation are applied to
the blended result, in that order.

Textures:
  magazine, vinyl-bleed, 60s-mustard, royal-navy, tonor, heavy-grain

Settings come from texture-adder.toml (all keys optional); flags override
them. Run 'texture-adder gen-config' to print a documented config file.")]
#[command(version)]
struct Cli {
    /// Config file
    #[arg(long, default_value = "texture-adder.toml", global = true)]
    config: PathBuf,

    /// Increase log verbosity (repeatable)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Blend, adjust and export a photo
    Export {
        /// Photo to texture
        #[arg(long)]
        photo: PathBuf,

        #[command(flatten)]
        tune: TuneArgs,

        #[command(flatten)]
        out: OutputArgs,

        /// Directory exports are written to
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// How to hand off the finished file
        #[arg(long, value_enum)]
        delivery: Option<DeliveryMode>,
    },
    /// Render a downscaled preview through the same pipeline
    Preview {
        /// Photo to texture
        #[arg(long)]
        photo: PathBuf,

        /// Where to write the preview (format follows the extension)
        #[arg(long)]
        out: PathBuf,

        /// Cap on the preview's longer edge
        #[arg(long, default_value_t = 1024, value_parser = clap::value_parser!(u32).range(1..))]
        max_edge: u32,

        #[command(flatten)]
        tune: TuneArgs,
    },
    /// Show the export plan for a photo size without rendering
    Plan {
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        width: u32,

        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        height: u32,

        #[command(flatten)]
        out: OutputArgs,

        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the bundled textures
    Textures,
    /// Print a stock texture-adder.toml with all options documented
    GenConfig,
}

fn init_tracing(verbosity: u8) -> Result<(), Box<dyn std::error::Error>> {
    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let filter = EnvFilter::from_default_env().add_directive(format!("texture_adder={level}").parse()?);
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    if let Command::GenConfig = cli.command {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }

    let mut config = config::load_config(&cli.config)?;

    match cli.command {
        Command::Export {
            photo,
            tune,
            out,
            output_dir,
            delivery,
        } => {
            tune.apply(&mut config);
            out.apply(&mut config);
            if let Some(dir) = output_dir {
                config.delivery.output_dir = dir;
            }
            if let Some(mode) = delivery {
                config.delivery.mode = mode;
            }
            config.validate()?;

            let mut session = Session::from_config(&config);
            session.select_texture(&config.composite.texture).await?;
            session.load_photo_path(&photo).await?;

            let settings = ExportSettings::from_config(&config);
            output::print_settings(session.texture(), &settings);

            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    output::print_event(&event);
                }
            });
            let result = session.export(&settings, Some(&tx)).await;
            drop(tx);
            printer
                .join()
                .map_err(|_| "progress printer panicked")?;

            output::print_export_summary(&result?);
        }
        Command::Preview {
            photo,
            out,
            max_edge,
            tune,
        } => {
            tune.apply(&mut config);
            config.validate()?;

            let mut session = Session::from_config(&config);
            session.select_texture(&config.composite.texture).await?;
            session.load_photo_path(&photo).await?;

            let settings = ExportSettings::from_config(&config);
            output::print_settings(session.texture(), &settings);
            let surface = session.preview(&settings, max_edge).await?;

            let format = image::ImageFormat::from_path(&out)
                .ok()
                .and_then(OutputFormat::from_image_format)
                .unwrap_or(OutputFormat::Png);
            let name = out
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let encoded = RustBackend::new().encode(
                &surface,
                &EncodeParams::new(format, Some(Quality::new(config.output.quality)), name),
            )?;
            std::fs::write(&out, &encoded.bytes)?;
            println!(
                "Preview {}x{} \u{2192} {}",
                surface.width(),
                surface.height(),
                out.display()
            );
        }
        Command::Plan {
            width,
            height,
            out,
            json,
        } => {
            out.apply(&mut config);
            config.validate()?;
            let plan = ExportSettings::from_config(&config).plan((width, height))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&plan)?);
            } else {
                output::print_plan(&plan);
            }
        }
        Command::Textures => {
            let selected = resolve_texture(&config.composite.texture).unwrap_or_default();
            output::print_texture_list(TEXTURES, selected, &config.assets.textures_dir);
        }
        Command::GenConfig => {}
    }

    Ok(())
}
