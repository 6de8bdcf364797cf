use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use scene::canvas::{self, CanvasError, CanvasSize, PRESETS};
use scene::doc::{Color, FontStyle, FontWeight, Layer, Payload, ShapeKind, ShapePayload};
use scene::export::{ExportError, ExportFormat};
use scene::generate::{AspectRatio, GenerationError, ImageClient};
use scene::geom::Bounds;
use scene::session::{GenerationOutcome, Session, SessionError};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Canvas(#[from] CanvasError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error(transparent)]
    Generation(#[from] GenerationError),
    #[error("{path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },
    #[error("--width and --height must be given together")]
    PartialSize,
    #[error("image generation failed")]
    GenerationFailed,
}

#[derive(Parser, Debug)]
#[command(name = "studio", about = "Compose layered designs and export them")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the canvas preset catalog.
    Presets,
    /// Build a document from flags and export it.
    Compose(ComposeArgs),
    /// Generate an image from a prompt and export it.
    Generate(GenerateArgs),
}

#[derive(Args, Debug)]
struct CanvasArgs {
    /// Named preset, e.g. "Instagram Post".
    #[arg(long, conflicts_with_all = ["width", "height"])]
    preset: Option<String>,
    #[arg(long)]
    width: Option<u32>,
    #[arg(long)]
    height: Option<u32>,
}

#[derive(Args, Debug)]
struct OutputArgs {
    #[arg(long, short)]
    out: PathBuf,
    /// png or jpeg.
    #[arg(long, default_value = "png")]
    format: String,
    /// JPEG quality, 1-100.
    #[arg(long, default_value_t = 92)]
    quality: u8,
}

#[derive(Args, Debug)]
struct ComposeArgs {
    #[command(flatten)]
    canvas: CanvasArgs,
    /// Image file to place, scaled to fit. Repeatable.
    #[arg(long)]
    image: Vec<PathBuf>,
    /// Rectangle as X,Y,W,H[,#RRGGBB]. Repeatable.
    #[arg(long, value_parser = parse_shape)]
    rect: Vec<ShapeArg>,
    /// Circle inscribed in X,Y,W,H[,#RRGGBB]. Repeatable.
    #[arg(long, value_parser = parse_shape)]
    circle: Vec<ShapeArg>,
    /// Line across X,Y,W,H[,#RRGGBB]. Repeatable.
    #[arg(long, value_parser = parse_shape)]
    line: Vec<ShapeArg>,
    /// Text block placed with default geometry. Repeatable.
    #[arg(long)]
    text: Vec<String>,
    /// Font face as FAMILY=PATH. Repeatable.
    #[arg(long, value_parser = parse_font)]
    font: Vec<(String, PathBuf)>,
    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Args, Debug)]
struct GenerateArgs {
    #[arg(long)]
    prompt: String,
    #[arg(long, default_value = "1:1")]
    aspect: AspectRatio,
    /// Regenerate once more with this modifier appended to the prompt.
    #[arg(long)]
    iterate: Option<String>,
    #[command(flatten)]
    canvas: CanvasArgs,
    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Debug, Clone, Copy)]
struct ShapeArg {
    bounds: Bounds,
    fill: Option<Color>,
}

fn parse_shape(raw: &str) -> Result<ShapeArg, String> {
    let parts: Vec<&str> = raw.split(',').map(str::trim).collect();
    if parts.len() != 4 && parts.len() != 5 {
        return Err(format!("expected X,Y,W,H[,COLOR], got `{raw}`"));
    }
    let mut nums = [0.0_f64; 4];
    for (slot, part) in nums.iter_mut().zip(&parts) {
        *slot = part
            .parse::<f64>()
            .map_err(|e| format!("`{part}`: {e}"))?;
    }
    let fill = match parts.get(4) {
        Some(color) => Some(color.parse::<Color>().map_err(|e| e.to_string())?),
        None => None,
    };
    Ok(ShapeArg { bounds: Bounds::new(nums[0], nums[1], nums[2], nums[3]), fill })
}

fn parse_font(raw: &str) -> Result<(String, PathBuf), String> {
    let (family, path) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected FAMILY=PATH, got `{raw}`"))?;
    Ok((family.trim().to_owned(), PathBuf::from(path.trim())))
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match cli.command {
        Command::Presets => {
            run_presets();
            Ok(())
        }
        Command::Compose(args) => run_compose(args),
        Command::Generate(args) => run_generate(args).await,
    }
}

fn run_presets() {
    for preset in PRESETS {
        println!("{:<20} {}x{}", preset.name, preset.width, preset.height);
    }
}

fn run_compose(args: ComposeArgs) -> Result<(), CliError> {
    let mut session = Session::new(canvas_size(&args.canvas)?);

    for (family, path) in &args.font {
        let bytes = read(path)?;
        session.register_font(family, FontWeight::Normal, FontStyle::Normal, &bytes)?;
    }
    for path in &args.image {
        let bytes = read(path)?;
        let name = path
            .file_stem()
            .map_or_else(|| "Image".to_owned(), |s| s.to_string_lossy().into_owned());
        session.import_image(name, &bytes)?;
    }
    let shapes = [(ShapeKind::Rectangle, &args.rect), (ShapeKind::Circle, &args.circle), (ShapeKind::Line, &args.line)];
    for (kind, specs) in shapes {
        for spec in specs {
            let fill = spec
                .fill
                .or_else(|| session.brand().primary_color())
                .unwrap_or(Color::BLACK);
            let payload = ShapePayload {
                shape: kind,
                fill,
                stroke: fill,
                stroke_width: if kind == ShapeKind::Line { spec.bounds.height.max(1.0) } else { 0.0 },
            };
            session.add_layer(Layer::new(format!("{kind:?}"), spec.bounds, Payload::Shape(payload)));
        }
    }
    for text in &args.text {
        session.add_text(text.as_str());
    }

    write_output(&session, &args.output)
}

async fn run_generate(args: GenerateArgs) -> Result<(), CliError> {
    let client = ImageClient::from_env()?;
    tracing::info!(model = client.model(), prompt = %args.prompt, aspect = %args.aspect, "generating");

    let mut session = Session::new(canvas_size_for(&args.canvas, args.aspect)?).with_generator(Arc::new(client));
    session.generate(&args.prompt, args.aspect)?;
    await_success(&mut session).await?;

    if let Some(modifier) = &args.iterate {
        session.iterate(modifier)?;
        await_success(&mut session).await?;
    }

    write_output(&session, &args.output)
}

async fn await_success(session: &mut Session) -> Result<(), CliError> {
    match session.next_generation().await {
        Some(GenerationOutcome::Added { .. } | GenerationOutcome::Replaced { .. }) => Ok(()),
        _ => Err(CliError::GenerationFailed),
    }
}

fn canvas_size(args: &CanvasArgs) -> Result<CanvasSize, CliError> {
    if let Some(name) = &args.preset {
        return Ok(canvas::preset(name)?.size());
    }
    match (args.width, args.height) {
        (Some(w), Some(h)) => Ok(CanvasSize::new(w, h)?),
        (None, None) => Ok(CanvasSize::default()),
        _ => Err(CliError::PartialSize),
    }
}

/// Without explicit canvas flags, size the canvas to the requested ratio.
fn canvas_size_for(args: &CanvasArgs, aspect: AspectRatio) -> Result<CanvasSize, CliError> {
    if args.preset.is_some() || args.width.is_some() || args.height.is_some() {
        return canvas_size(args);
    }
    let (w, h) = match aspect {
        AspectRatio::Square => (1024, 1024),
        AspectRatio::Portrait => (768, 1024),
        AspectRatio::Landscape => (1024, 768),
        AspectRatio::Tall => (576, 1024),
        AspectRatio::Wide => (1024, 576),
    };
    Ok(CanvasSize::new(w, h)?)
}

fn write_output(session: &Session, output: &OutputArgs) -> Result<(), CliError> {
    let format = match output.format.parse::<ExportFormat>()? {
        ExportFormat::Jpeg { .. } => ExportFormat::Jpeg { quality: output.quality.clamp(1, 100) },
        ExportFormat::Png => ExportFormat::Png,
    };
    let bytes = session.export(format)?;
    std::fs::write(&output.out, &bytes).map_err(|source| CliError::Io { path: output.out.clone(), source })?;
    println!("wrote {} ({} bytes, {})", output.out.display(), bytes.len(), format.mime_type());
    Ok(())
}

fn read(path: &Path) -> Result<Vec<u8>, CliError> {
    std::fs::read(path).map_err(|source| CliError::Io { path: path.to_owned(), source })
}
