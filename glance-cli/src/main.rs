//! Glance CLI
//!
//! Finds desktop icons by their captions and drives Notepad with them.
//!
//! Usage:
//!   glance run --posts 10              # Write 10 posts through Notepad
//!   glance ground --label Notepad      # Ground once on the live desktop and annotate
//!   glance locate shot.png Notepad     # Ground a label in a saved screenshot

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use glance::annotate::{
    annotate_screenshot, deliverable_caption, deliverable_path, AnnotationStyle,
};
use glance::{Config, Glance, GroundingError, GroundingResult, ScreenCapture};
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info, warn};

mod notepad;
mod posts;

use notepad::{NotepadWorkflow, NOTEPAD_LABEL};
use posts::{PostsClient, POSTS_URL};

/// How many unmatched labels to show when grounding fails.
const LABELS_SHOWN: usize = 10;

#[derive(Parser)]
#[command(name = "glance")]
#[command(about = "Vision-based desktop automation with OCR icon grounding")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch posts and write each one to a file through Notepad
    Run(RunArgs),
    /// Capture the desktop once, ground a label and save an annotated screenshot
    Ground(GroundArgs),
    /// Ground a label in an existing screenshot
    Locate(LocateArgs),
}

#[derive(Parser, Debug)]
struct RunArgs {
    /// Number of posts to process
    #[clap(long, short = 'n', default_value_t = 10)]
    posts: usize,

    /// Posts endpoint
    #[clap(long, env = "GLANCE_POSTS_URL", default_value = POSTS_URL)]
    api_url: String,
}

#[derive(Parser, Debug)]
struct GroundArgs {
    /// Caption of the icon to find
    #[clap(long, short, default_value = NOTEPAD_LABEL)]
    label: String,
}

#[derive(Parser, Debug)]
struct LocateArgs {
    /// Screenshot to search
    image: PathBuf,

    /// Caption of the element to find
    label: String,

    /// Save a copy of the screenshot with the result marked
    #[clap(long)]
    annotate: bool,

    /// Print the result as JSON
    #[clap(long)]
    json: bool,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    init_logging();

    let cli = Cli::parse();
    let outcome = tokio::select! {
        result = execute(cli) => result,
        _ = tokio::signal::ctrl_c() => {
            println!("\n\nInterrupted by user.");
            std::process::exit(1);
        }
    };

    if let Err(e) = outcome {
        report_failure(&e);
        std::process::exit(1);
    }
}

async fn execute(cli: Cli) -> Result<()> {
    let config = Config::from_env().context("Invalid configuration")?;
    let glance = Glance::from_config(&config);

    match cli.command {
        Commands::Run(args) => run_automation(args, config, glance).await,
        Commands::Ground(args) => {
            tokio::task::spawn_blocking(move || ground_live(&glance, &config, &args.label))
                .await
                .context("Grounding task panicked")?
        }
        Commands::Locate(args) => {
            tokio::task::spawn_blocking(move || locate_offline(&glance, &args))
                .await
                .context("Grounding task panicked")?
        }
    }
}

async fn run_automation(args: RunArgs, config: Config, glance: Glance) -> Result<()> {
    println!("Vision-Based Desktop Automation");
    println!("  Output Directory: {}", config.output_dir.display());
    println!(
        "  Screen Resolution: {}x{}",
        config.screen_width, config.screen_height
    );
    println!("  Max Retries: {}", config.max_retries);

    match glance::capture::screen_size() {
        Ok(live) if !config.matches_resolution(live) => warn!(
            "Live resolution {}x{} differs from configured {}x{}",
            live.0, live.1, config.screen_width, config.screen_height
        ),
        Ok(_) => {}
        Err(e) => warn!("Could not read screen resolution: {e}"),
    }

    println!("\nFetching {} posts from {}...", args.posts, args.api_url);
    let client = PostsClient::new(args.api_url, posts::api_retry_policy(config.max_retries)?)?;
    let posts = client.fetch(args.posts).await?;
    println!("  Retrieved {} posts", posts.len());

    let count = posts.len();
    let output_dir = config.output_dir.clone();
    tokio::task::spawn_blocking(move || -> Result<()> {
        let mut workflow = NotepadWorkflow::new(glance, &config)?;
        for (i, post) in posts.iter().enumerate() {
            println!("\nProcessing post {}/{}: ID={}", i + 1, count, post.id);
            let path = workflow.process(post)?;
            println!("  Saved: {}", path.display());
        }
        Ok(())
    })
    .await
    .context("Automation task panicked")??;

    println!("\nAutomation complete");
    println!("  Processed: {count} posts");
    println!("  Output: {}", output_dir.display());
    Ok(())
}

fn ground_live(glance: &Glance, config: &Config, label: &str) -> Result<()> {
    glance::input::show_desktop()?;
    std::thread::sleep(Duration::from_millis(500));

    let capture = ScreenCapture::new(&config.screenshots_dir);
    let screenshot = capture.capture_to(Some("grounding_test.png"))?;
    println!("Captured: {}", screenshot.display());

    let result = glance.ground_icon(&screenshot, label)?;
    print_result(&result);

    let output = deliverable_path(&config.screenshots_dir, "test");
    let annotated = annotate_screenshot(
        &screenshot,
        result.x,
        result.y,
        &deliverable_caption(label, "test"),
        Some(&output),
        &AnnotationStyle::default(),
    )?;
    println!("  Annotated screenshot: {}", annotated.display());
    Ok(())
}

fn locate_offline(glance: &Glance, args: &LocateArgs) -> Result<()> {
    let result = glance.ground_icon(&args.image, &args.label)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_result(&result);
    }

    if args.annotate {
        let annotated = annotate_screenshot(
            &args.image,
            result.x,
            result.y,
            &result.matched_text,
            None,
            &AnnotationStyle::default(),
        )?;
        info!("Annotated screenshot saved to {}", annotated.display());
    }
    Ok(())
}

fn print_result(result: &GroundingResult) {
    println!("✓ Found '{}'", result.matched_text);
    println!("  Icon at: ({}, {})", result.x, result.y);
    println!("  Confidence: {:.2}", result.confidence);
}

fn report_failure(e: &anyhow::Error) {
    error!("{e:#}");
    println!("\n✗ FAILED: {e:#}");

    let labels = e
        .chain()
        .find_map(|cause| cause.downcast_ref::<GroundingError>())
        .map(GroundingError::available_labels)
        .unwrap_or_default();
    if !labels.is_empty() {
        let shown = &labels[..labels.len().min(LABELS_SHOWN)];
        println!("  Available labels: {shown:?}");
    }
}

fn init_logging() {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let log_dir = env::var("GLANCE_LOG_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::data_local_dir()
                .unwrap_or_else(env::temp_dir)
                .join("glance")
                .join("logs")
        });

    let file_layer = match std::fs::create_dir_all(&log_dir) {
        Ok(()) => Some(
            fmt::layer()
                .with_writer(tracing_appender::rolling::daily(&log_dir, "glance.log"))
                .with_ansi(false),
        ),
        Err(e) => {
            eprintln!("Failed to create log directory {}: {e}", log_dir.display());
            None
        }
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();
}
