//! Command-line interface for label rendering.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};

use rotulo::{Composer, Config, FontStore, LabelContext, RotuloError, Template, media};

#[derive(Parser)]
#[command(name = "rotulo")]
#[command(about = "Template-driven label rendering and printing")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the HTTP server
    Serve {
        /// Configuration file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Listen address override, e.g. 0.0.0.0:8013
        #[arg(long)]
        listen: Option<String>,
    },
    /// Render a template to a PNG file
    Render {
        /// Template name (in the template directory) or a path to a file
        template: String,
        /// Output file
        #[arg(long, default_value = "label.png")]
        out: PathBuf,
        /// Context parameter, repeatable: --param label_size=62x29
        #[arg(long = "param", value_name = "KEY=VALUE")]
        params: Vec<String>,
        /// JSON file with the render payload
        #[arg(long)]
        payload: Option<PathBuf>,
        /// Configuration file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// List known templates, fonts, or media sizes
    List {
        #[arg(value_enum, default_value = "templates")]
        target: ListTarget,
        /// Configuration file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ListTarget {
    Templates,
    Fonts,
    Media,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), RotuloError> {
    match cli.command {
        Command::Serve { config, listen } => {
            let mut config = Config::load_or_default(config.as_deref())?;
            if let Some(listen) = listen {
                config.listen_addr = listen;
            }
            rotulo::server::serve(config).await
        }
        Command::Render {
            template,
            out,
            params,
            payload,
            config,
        } => {
            let config = Config::load_or_default(config.as_deref())?;
            let result = tokio::task::spawn_blocking(move || {
                render(&template, &out, &params, payload.as_deref(), &config)
            })
            .await
            .map_err(|e| RotuloError::Template(format!("render task failed: {}", e)))?;
            result
        }
        Command::List { target, config } => {
            let config = Config::load_or_default(config.as_deref())?;
            list(target, &config);
            Ok(())
        }
    }
}

fn render(
    template: &str,
    out: &Path,
    params: &[String],
    payload: Option<&Path>,
    config: &Config,
) -> Result<(), RotuloError> {
    let template_path = if Path::new(template).is_file() {
        PathBuf::from(template)
    } else {
        config.template_dir.join(format!("{}.json", template))
    };
    let template = Template::load(&template_path)?;

    let params = parse_params(params)?;
    let mut payload = match payload {
        Some(path) => {
            let data = std::fs::read_to_string(path)?;
            serde_json::from_str(&data)
                .map_err(|e| RotuloError::Template(format!("invalid payload: {}", e)))?
        }
        None => serde_json::Map::new(),
    };

    let fonts = FontStore::discover(&config.font_dirs);
    let ctx = LabelContext::from_params(&params, config, &fonts)?;
    let composer = Composer::new(fonts);
    let canvas = composer.render_template(&template, &ctx, &mut payload)?;
    std::fs::write(out, canvas.to_png()?)?;
    println!("Wrote {} ({}x{})", out.display(), canvas.width(), canvas.height());
    Ok(())
}

fn parse_params(params: &[String]) -> Result<HashMap<String, String>, RotuloError> {
    params
        .iter()
        .map(|p| {
            p.split_once('=')
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .ok_or_else(|| {
                    RotuloError::Template(format!("parameter '{}' is not KEY=VALUE", p))
                })
        })
        .collect()
}

fn list(target: ListTarget, config: &Config) {
    match target {
        ListTarget::Templates => {
            let mut names: Vec<String> = std::fs::read_dir(&config.template_dir)
                .into_iter()
                .flatten()
                .flatten()
                .map(|e| e.path())
                .filter(|p| {
                    matches!(
                        p.extension().and_then(|e| e.to_str()),
                        Some("json") | Some("lbl")
                    )
                })
                .filter_map(|p| p.file_stem().and_then(|s| s.to_str()).map(String::from))
                .collect();
            names.sort();
            for name in names {
                println!("{}", name);
            }
        }
        ListTarget::Fonts => {
            for (family, styles) in FontStore::discover(&config.font_dirs).families() {
                println!("{} ({})", family, styles.join(", "));
            }
        }
        ListTarget::Media => {
            for m in media::MEDIA {
                match m.dots.1 {
                    0 => println!("{:>8}  {} dots wide, endless", m.name, m.dots.0),
                    h => println!("{:>8}  {}x{} dots", m.name, m.dots.0, h),
                }
            }
        }
    }
}
