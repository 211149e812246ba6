use anyhow::Context;
use clap::Parser;
use polygon_yolo::{config, start_app};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Convert a polygon annotation into a YOLO bounding-box label.
#[derive(Parser)]
#[command(name = "polygon_yolo")]
#[command(version)]
struct Cli {
    /// Path to the input image.
    image: PathBuf,

    /// Path to the polygon label file.
    label: PathBuf,

    /// Path to write the YOLO label to [default: output.txt].
    output: Option<PathBuf>,

    /// Write the image with the box drawn on it to this path.
    #[arg(long)]
    preview: Option<PathBuf>,

    /// Convert every non-blank line instead of only the first one.
    #[arg(long)]
    all_lines: bool,

    /// Outline thickness in pixels.
    #[arg(long)]
    thickness: Option<u32>,

    /// Directory holding base.yaml and <environment>.yaml.
    #[arg(long, default_value = "configuration")]
    config_dir: PathBuf,
}

impl Cli {
    fn into_overrides(self) -> config::Overrides {
        config::Overrides {
            config_dir: self.config_dir,
            image: Some(self.image),
            label: Some(self.label),
            output: self.output,
            preview: self.preview,
            all_lines: self.all_lines,
            thickness: self.thickness,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config =
        config::get_configuration(&cli.into_overrides()).context("failed to load config")?;
    let log_level = config.log_level.as_str();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with(tracing_subscriber::fmt::layer().json().with_level(true))
        .init();

    match start_app(&config) {
        Ok(report) => {
            for line in &report.lines {
                println!("{}", line);
            }
            Ok(())
        }
        Err(e) => {
            tracing::error!(kind = %e.kind(), "An error occurred: {}", e);
            Err(e.into())
        }
    }
}
