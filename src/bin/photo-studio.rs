//! CLI for Photo Studio - restyled product photography.

use clap::{Args, Parser, Subcommand, ValueEnum};
use photo_studio::{
    AspectRatio, CameraPerspective, GeminiClient, GenerationResult, ImageAsset, LightingStyle,
    Session, StyleParameters,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "photo-studio")]
#[command(about = "Restyle a product photo from a reference image or keywords (Gemini)")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Enable debug logging (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a styled product photo
    Generate(GenerateArgs),

    /// List the composition and lighting options
    Options,

    /// Verify the API key and image model
    Check,
}

#[derive(Args)]
struct GenerateArgs {
    /// Product image (PNG, JPEG, or WEBP)
    #[arg(short, long)]
    product: PathBuf,

    /// Style reference image (PNG, JPEG, or WEBP)
    #[arg(short, long)]
    style: Option<PathBuf>,

    /// Style prompt or keywords, e.g. "dark and moody, dramatic shadows"
    #[arg(long)]
    prompt: Option<String>,

    /// Aspect ratio
    #[arg(long, value_enum, default_value = "1:1")]
    aspect_ratio: AspectRatioArg,

    /// Lighting style
    #[arg(long, value_enum, ignore_case = true, default_value = "studio")]
    lighting: LightingArg,

    /// Camera perspective
    #[arg(long, value_enum, ignore_case = true, default_value = "eye-level")]
    perspective: PerspectiveArg,

    /// Output file path (default: generated-image.<ext>)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print the result as a data URI instead of writing a file (a
    /// `data_uri` field with --json)
    #[arg(long)]
    data_uri: bool,

    /// Print the composed prompt to stderr
    #[arg(long)]
    show_prompt: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum AspectRatioArg {
    #[value(name = "1:1")]
    Square,
    #[value(name = "4:3")]
    Standard,
    #[value(name = "3:4")]
    StandardPortrait,
    #[value(name = "16:9")]
    Landscape,
    #[value(name = "9:16")]
    Portrait,
}

impl From<AspectRatioArg> for AspectRatio {
    fn from(arg: AspectRatioArg) -> Self {
        match arg {
            AspectRatioArg::Square => AspectRatio::Square,
            AspectRatioArg::Standard => AspectRatio::Standard,
            AspectRatioArg::StandardPortrait => AspectRatio::StandardPortrait,
            AspectRatioArg::Landscape => AspectRatio::Landscape,
            AspectRatioArg::Portrait => AspectRatio::Portrait,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LightingArg {
    Studio,
    Natural,
    Dramatic,
    Soft,
    Cinematic,
    HighKey,
}

impl From<LightingArg> for LightingStyle {
    fn from(arg: LightingArg) -> Self {
        match arg {
            LightingArg::Studio => LightingStyle::Studio,
            LightingArg::Natural => LightingStyle::Natural,
            LightingArg::Dramatic => LightingStyle::Dramatic,
            LightingArg::Soft => LightingStyle::Soft,
            LightingArg::Cinematic => LightingStyle::Cinematic,
            LightingArg::HighKey => LightingStyle::HighKey,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PerspectiveArg {
    EyeLevel,
    HighAngle,
    LowAngle,
    DutchAngle,
    Overhead,
    CloseUp,
}

impl From<PerspectiveArg> for CameraPerspective {
    fn from(arg: PerspectiveArg) -> Self {
        match arg {
            PerspectiveArg::EyeLevel => CameraPerspective::EyeLevel,
            PerspectiveArg::HighAngle => CameraPerspective::HighAngle,
            PerspectiveArg::LowAngle => CameraPerspective::LowAngle,
            PerspectiveArg::DutchAngle => CameraPerspective::DutchAngle,
            PerspectiveArg::Overhead => CameraPerspective::Overhead,
            PerspectiveArg::CloseUp => CameraPerspective::CloseUp,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Generate(args) => {
            generate(args, cli.json).await?;
        }
        Commands::Options => {
            list_options(cli.json)?;
        }
        Commands::Check => {
            check(cli.json).await?;
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("photo_studio=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn generate(args: GenerateArgs, json_output: bool) -> anyhow::Result<()> {
    // Missing key fails here, before any file is read or request sent.
    let client = GeminiClient::builder().build()?;
    let session = Session::new(Arc::new(client));

    session.set_product_image(ImageAsset::from_path(&args.product).await?)?;
    if let Some(ref style) = args.style {
        session.set_style_image(ImageAsset::from_path(style).await?)?;
    }
    if let Some(ref prompt) = args.prompt {
        session.set_keywords(prompt.as_str());
    }
    session.set_params(StyleParameters::new(
        args.aspect_ratio.into(),
        args.lighting.into(),
        args.perspective.into(),
    ));

    let result = session.submit().await?;

    if args.show_prompt {
        eprintln!("{}\n", result.prompt);
    }
    if let Some(ref text) = result.model_text {
        tracing::info!("model says: {text}");
    }

    if args.data_uri {
        if json_output {
            let summary = data_uri_summary(&result, session.params());
            println!("{}", serde_json::to_string_pretty(&summary)?);
        } else {
            println!("{}", result.image);
        }
        return Ok(());
    }

    let output = args
        .output
        .unwrap_or_else(|| PathBuf::from(result.image.default_file_name()));
    let size = result.image.save(&output).await?;

    if json_output {
        let summary = serde_json::json!({
            "success": true,
            "output": output.display().to_string(),
            "size_bytes": size,
            "mime_type": result.image.mime_type(),
            "params": session.params(),
            "prompt": result.prompt.as_str(),
            "model_text": result.model_text,
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!(
            "Generated image: {} ({} bytes, {})",
            output.display(),
            size,
            result.image.mime_type()
        );
    }

    Ok(())
}

fn data_uri_summary(result: &GenerationResult, params: StyleParameters) -> serde_json::Value {
    serde_json::json!({
        "success": true,
        "data_uri": result.image.to_string(),
        "mime_type": result.image.mime_type(),
        "params": params,
        "prompt": result.prompt.as_str(),
        "model_text": result.model_text,
    })
}

async fn check(json_output: bool) -> anyhow::Result<()> {
    let client = GeminiClient::builder().build()?;
    client.health_check().await?;

    if json_output {
        let result = serde_json::json!({
            "success": true,
            "text_model": client.config().text_model,
            "image_model": client.config().image_model,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!(
            "OK: API key accepted, image model {} available",
            client.config().image_model
        );
    }
    Ok(())
}

fn list_options(json_output: bool) -> anyhow::Result<()> {
    let aspect: Vec<&str> = AspectRatio::ALL.iter().map(|v| v.as_str()).collect();
    let lighting: Vec<&str> = LightingStyle::ALL.iter().map(|v| v.as_str()).collect();
    let perspective: Vec<&str> = CameraPerspective::ALL.iter().map(|v| v.as_str()).collect();

    if json_output {
        let result = serde_json::json!({
            "aspect_ratio": aspect,
            "lighting": lighting,
            "perspective": perspective,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("Aspect ratio (--aspect-ratio):  {}", aspect.join(", "));
        println!("Lighting (--lighting):          {}", lighting.join(", "));
        println!("Perspective (--perspective):    {}", perspective.join(", "));
    }
    Ok(())
}
