use anyhow::{Context, Result};
use clap::Parser;
use cutout::config::Config;
use cutout::input::{FileUpload, UploadSource};
use cutout::mask::{BrushMode, BrushStroke};
use cutout::output::{OutputSink, PngFile};
use cutout::segmentation::{self, MaskInterpreter, PointLabel, PromptPoint};
use cutout::session::EditingSession;
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Image to cut out
    #[arg(short, long)]
    input: String,

    /// Where to write the PNG result
    #[arg(short, long, default_value = "removed-background.png")]
    output: String,

    /// Segmentation service base URL (overrides SEGMENTATION_API_URL)
    #[arg(long)]
    backend_url: Option<String>,

    /// Prompt point "x,y,label" in image pixels; label 1 = subject, 0 = background
    #[arg(long = "point", value_parser = parse_point)]
    points: Vec<PromptPoint>,

    /// Erase dab "x,y,radius" in image pixels, applied after segmentation
    #[arg(long = "erase", value_parser = parse_erase)]
    erase: Vec<BrushStroke>,

    /// Restore dab "x,y,radius" in image pixels, applied after erasing
    #[arg(long = "restore", value_parser = parse_restore)]
    restore: Vec<BrushStroke>,

    /// Feather the cutout edge with a gaussian of this sigma
    #[arg(long)]
    feather: Option<f32>,

    /// Skip the remote call and only apply manual edits
    #[arg(long)]
    manual_only: bool,

    /// Write the mask as a grayscale image instead of the cutout
    #[arg(long)]
    show_mask: bool,

    /// Write the untouched original (compare view)
    #[arg(long)]
    compare: bool,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

fn parse_floats<const N: usize>(s: &str) -> Result<[f32; N], String> {
    let parts: Vec<f32> = s
        .split(',')
        .map(|p| p.trim().parse::<f32>().map_err(|e| format!("'{p}': {e}")))
        .collect::<Result<_, _>>()?;
    parts
        .try_into()
        .map_err(|_| format!("expected {N} comma-separated numbers, got '{s}'"))
}

fn parse_point(s: &str) -> Result<PromptPoint, String> {
    let [x, y, label] = parse_floats::<3>(s)?;
    let label = match label as i32 {
        1 => PointLabel::Foreground,
        0 => PointLabel::Background,
        other => return Err(format!("label must be 0 or 1, got {other}")),
    };
    Ok(PromptPoint::new(x, y, label))
}

fn parse_stroke(s: &str, mode: BrushMode) -> Result<BrushStroke, String> {
    let [x, y, radius] = parse_floats::<3>(s)?;
    Ok(BrushStroke::new(x, y, radius, mode))
}

fn parse_erase(s: &str) -> Result<BrushStroke, String> {
    parse_stroke(s, BrushMode::Erase)
}

fn parse_restore(s: &str) -> Result<BrushStroke, String> {
    parse_stroke(s, BrushMode::Restore)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    let mut config = Config::from_env().context("Failed to load configuration")?;
    if let Some(url) = &args.backend_url {
        config.api_url = url.clone();
    }

    tracing::info!("Cutout starting");
    tracing::info!("Input: {}", args.input);
    tracing::info!("Output: {}", args.output);

    let mut session = EditingSession::new(MaskInterpreter::new(config.accept_opaque_fallback));

    let upload = FileUpload::new(&args.input)
        .read_upload()
        .context("Failed to read input")?;
    session.load(upload).context("Failed to load image")?;

    for point in &args.points {
        session.add_point(*point);
    }

    if !args.manual_only {
        let client = segmentation::create_default_client(&config)
            .context("Failed to create segmentation client")?;

        let started = Instant::now();
        let kind = session
            .segment(&client, |warning| {
                tracing::warn!("{} - this may take up to 2 minutes on the first run", warning);
            })
            .await
            .context("Background removal failed")?;
        tracing::info!(
            "Segmentation finished in {:.1}s ({:?})",
            started.elapsed().as_secs_f32(),
            kind
        );
    } else {
        tracing::info!("Running in manual mode (no segmentation)");
    }

    if !args.erase.is_empty() || !args.restore.is_empty() {
        session.begin_stroke()?;
        for stroke in args.erase.iter().chain(&args.restore) {
            session.stroke(*stroke).context("Failed to apply brush stroke")?;
        }
        session.end_stroke();
        tracing::info!(
            "Applied {} erase and {} restore dabs",
            args.erase.len(),
            args.restore.len()
        );
    }

    if let Some(sigma) = args.feather {
        session.feather(sigma)?;
    }

    session.set_compare(args.compare);

    let frame = if args.show_mask {
        session.mask().preview()
    } else {
        session.render()?
    };

    let mut output = PngFile::new(&args.output);
    output.write_frame(&frame).context("Failed to write output")?;

    Ok(())
}
