use clap::Parser;
use commonvoice::init_logging;
use commonvoice::video::{
    read_video, write_report, Auth, VideoIntelligence, DEFAULT_POLL_INTERVAL, DEFAULT_TIMEOUT,
};
use std::path::PathBuf;
use std::time::Duration;

/// Detects text in a local video with Google Video Intelligence.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    video: PathBuf,

    /// Seconds to wait for the annotation to finish.
    #[arg(long, default_value_t = DEFAULT_TIMEOUT.as_secs())]
    timeout: u64,

    /// Seconds between operation status checks.
    #[arg(long, default_value_t = DEFAULT_POLL_INTERVAL.as_secs())]
    poll_interval: u64,

    #[arg(short, long)]
    quiet: bool,

    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.debug, args.quiet);

    let client = VideoIntelligence::new(Auth::from_env()?);
    let input_content = read_video(&args.video).await?;
    log::info!("Read {} bytes from {}", input_content.len(), args.video.display());

    println!("\nProcessing video for text detection.");
    let response = client
        .detect_text(
            &input_content,
            Duration::from_secs(args.timeout),
            Duration::from_secs(args.poll_interval),
        )
        .await?;

    let result = response.first_result()?;
    write_report(result, &mut std::io::stdout().lock())?;

    Ok(())
}
