//! cvforge CLI - Compose documents and warm the icon cache
//!
//! Commands: compose, icon, renderers
//! Outputs JSON to stdout
//! Returns non-zero when config or content fail to load

use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use cvforge_core::{
    compute_input_hash, load_config, load_content, Composer, IconPipeline, JsonBackend,
    RendererRegistry,
};

#[derive(Parser)]
#[command(name = "cvforge-cli")]
#[command(about = "cvforge CLI - Document Composition Engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compose a document into a JSON row stream
    Compose {
        /// Path to the config JSON
        #[arg(short, long)]
        config: PathBuf,

        /// Path to the content JSON
        #[arg(short = 'i', long)]
        content: PathBuf,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Embed icon PNGs as base64 in the output
        #[arg(long, default_value_t = false)]
        embed_images: bool,
    },

    /// Convert (or look up) one cached icon
    Icon {
        /// Path to the config JSON
        #[arg(short, long)]
        config: PathBuf,

        /// Icon key from the config's icon mappings
        #[arg(short, long)]
        key: String,

        /// Pixel size (config default when omitted)
        #[arg(short, long)]
        size: Option<u32>,

        /// Color name or hex (config default when omitted)
        #[arg(long)]
        color: Option<String>,
    },

    /// List renderer tags
    Renderers,
}

fn main() -> ExitCode {
    if std::env::var("RUST_LOG").is_err() {
        env_logger::Builder::new()
            .parse_filters("cvforge_core=info")
            .target(env_logger::Target::Stderr)
            .init();
    } else {
        env_logger::init();
    }

    let cli = Cli::parse();

    match cli.command {
        Commands::Compose { config, content, output, embed_images } => {
            let config = match load_config(&config) {
                Ok(c) => c,
                Err(e) => return fail(&format!("Failed to load config: {}", e)),
            };
            let content = match load_content(&content) {
                Ok(c) => c,
                Err(e) => return fail(&format!("Failed to load content: {}", e)),
            };

            let writer: Box<dyn Write> = match &output {
                Some(path) => match File::create(path) {
                    Ok(f) => Box::new(BufWriter::new(f)),
                    Err(e) => return fail(&format!("Failed to create {}: {}", path.display(), e)),
                },
                None => Box::new(io::stdout().lock()),
            };

            let mut backend = JsonBackend::new(writer).embed_images(embed_images);
            match compute_input_hash(&config, &content, cvforge_core::ENGINE_VERSION) {
                Ok(hash) => backend = backend.with_input_hash(hash),
                Err(e) => log::warn!("could not hash inputs: {}", e),
            }

            let mut composer = Composer::new(&config);
            match composer.compose_into(&content, &mut backend) {
                Ok(summary) => {
                    if let Some(path) = &output {
                        let report = serde_json::json!({
                            "success": true,
                            "output": path,
                            "summary": summary,
                        });
                        print_json(&report);
                    }
                    ExitCode::SUCCESS
                }
                Err(e) => fail(&e.to_string()),
            }
        }

        Commands::Icon { config, key, size, color } => {
            let config = match load_config(&config) {
                Ok(c) => c,
                Err(e) => return fail(&format!("Failed to load config: {}", e)),
            };

            let mut pipeline = IconPipeline::from_document(&config);
            let size = size.unwrap_or(pipeline.default_size());
            let color = color.unwrap_or_else(|| pipeline.default_color().to_string());
            let path = pipeline.ensure(&key, size, &color);

            print_json(&serde_json::json!({
                "key": key,
                "path": path,
                "stats": pipeline.stats(),
            }));
            if path.is_some() { ExitCode::SUCCESS } else { ExitCode::from(2) }
        }

        Commands::Renderers => {
            let registry = RendererRegistry::default();
            let tags: Vec<_> = registry
                .tags()
                .map(|(tag, kind)| serde_json::json!({"tag": tag, "renderer": kind}))
                .collect();
            print_json(&tags);
            ExitCode::SUCCESS
        }
    }
}

fn print_json(value: &impl serde::Serialize) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{}", s),
        Err(e) => eprintln!("failed to serialize output: {}", e),
    }
}

fn fail(message: &str) -> ExitCode {
    let output = serde_json::json!({
        "success": false,
        "error": message,
    });
    println!("{}", output);
    ExitCode::FAILURE
}
