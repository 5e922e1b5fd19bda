//! Send an image to an object-detection service, print what it found
//! and write the image back with labeled bounding boxes.

mod client;

use std::path::PathBuf;
use std::time::Duration;

use boxsight_core::response::parse_body;
use boxsight_core::{
    DEFAULT_ENDPOINT, ImageSource, RenderStyle, Session, SessionConfig, Trigger, list_entry,
    render_to_pixmap,
};
use clap::Parser;

/// Detect objects in an image and draw labeled boxes around them.
#[derive(Parser)]
#[command(version)]
struct Args {
    /// Input image path (PNG, JPEG, BMP or WebP).
    image: PathBuf,

    /// Output path for the annotated PNG.
    #[arg(short, long)]
    output: PathBuf,

    /// Detection endpoint URL.
    #[arg(long, env = "BOXSIGHT_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    endpoint: String,

    /// Read a saved detection response body from this file instead of
    /// contacting the endpoint.
    #[arg(long, value_name = "FILE")]
    response: Option<PathBuf>,

    /// Request timeout in seconds.
    #[arg(long, value_name = "SECS", default_value_t = 30)]
    timeout: u64,

    /// Log state transitions and requests (same as `RUST_LOG=debug`).
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let level = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    eprintln!("Reading image from {}", args.image.display());
    let bytes = std::fs::read(&args.image)?;
    let name = args
        .image
        .file_name()
        .map_or_else(|| "image".to_owned(), |n| n.to_string_lossy().into_owned());
    let source = ImageSource::new(name, bytes, args.image.display().to_string());

    let mut session = Session::new(SessionConfig::default());
    session.select_file(source);
    let request = match session.trigger_detect() {
        Trigger::Issued { request, .. } => request,
        Trigger::Rejected(err) => return Err(err.into()),
    };

    let outcome = if let Some(path) = &args.response {
        eprintln!("Reading detection response from {}", path.display());
        parse_body(&std::fs::read_to_string(path)?)
    } else {
        eprintln!("Sending to {}...", args.endpoint);
        let agent = client::agent(Duration::from_secs(args.timeout));
        client::detect(&agent, &args.endpoint, request.image())
    };
    session.resolve(request.generation(), outcome);

    if let Some(message) = session.error_message() {
        return Err(message.into());
    }

    let detections = session.detections();
    if detections.is_empty() {
        eprintln!("No objects detected.");
    }
    for detection in detections {
        println!("{}", list_entry(detection));
    }

    let Some(image) = session.image() else {
        return Err("no image selected".into());
    };
    eprintln!("Rendering {} annotations...", detections.len());
    let surface = render_to_pixmap(
        image,
        detections,
        session.reported_dimensions(),
        &RenderStyle::default(),
    )?;

    eprintln!("Saving to {}", args.output.display());
    std::fs::write(&args.output, surface.encode_png()?)?;

    eprintln!("Done.");
    Ok(())
}
