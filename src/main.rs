use clap::{Parser, Subcommand};
use lang_tour::client::UiContext;
use lang_tour::config::{self, SiteConfig};
use lang_tour::playground::{
    CompileMode, OutputPane, OutputStatus, PlaygroundOptions, PlaygroundRuntime, ProcessCompiler,
    ProcessRunner,
};
use lang_tour::template::Template;
use lang_tour::types::{Locale, page_href};
use lang_tour::{generate, output, scan};
use std::error::Error;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt as _, util::SubscriberInitExt as _};
use url::Url;

#[derive(Parser)]
#[command(name = "lang-tour")]
#[command(about = "Static generator and playground for an interactive language tour")]
#[command(long_about = "\
Static generator and playground for an interactive language tour

Your filesystem is the data source. Numbered directories become chapters and
lessons, each lesson is a markdown explanation next to a runnable code sample.

Content structure:

  tour/
  ├── config.toml              # Tour config (optional)
  ├── template.html            # Page template (optional, built-in otherwise)
  ├── index.md                 # English landing page
  ├── index.mbt                # Landing page code sample
  ├── 01_intro/                # Chapter \"intro\"
  │   ├── 01_hello/            # Lesson \"hello\" → /intro/hello/index.html
  │   │   ├── index.md
  │   │   └── index.mbt
  │   └── 02_types/
  └── zh/                      # Chinese locale, same layout → /zh/...

Every page is written as index.html and as index.json, the route state the
client fetches to swap pages in place.

Run 'lang-tour gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Tour content directory
    #[arg(long, default_value = "tour", global = true)]
    source: PathBuf,

    /// Output directory
    #[arg(long, default_value = "dist", global = true)]
    output: PathBuf,

    /// Log pipeline details to stderr (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan the content directory and list chapters and lessons
    Scan,
    /// Validate content and template without writing anything
    Check,
    /// Run the full pipeline: scan → generate → write
    Build,
    /// Compile and run one lesson's code sample through the playground workers
    Run {
        /// Lesson slug, e.g. intro/hello or zh/intro/hello; empty for the landing page
        #[arg(default_value = "")]
        slug: String,
        /// Use the full debug compile instead of the fast path
        #[arg(long)]
        debug: bool,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Scan => {
            let config = config::load_config(&cli.source)?;
            let tour = scan::scan(&cli.source, &config)?;
            output::print_scan_output(&tour, &cli.source);
        }
        Command::Check => {
            println!("==> Checking {}", cli.source.display());
            let config = config::load_config(&cli.source)?;
            let tour = scan::scan(&cli.source, &config)?;
            let pages = generate::collect(&tour, &config)?;
            Template::load(&cli.source, &config)?;
            println!("{}", output::format_check_output(&tour, &pages));
        }
        Command::Build => {
            let config = config::load_config(&cli.source)?;

            println!("==> Stage 1: Scanning {}", cli.source.display());
            let tour = scan::scan(&cli.source, &config)?;
            output::print_scan_output(&tour, &cli.source);

            println!("==> Stage 2: Generating pages → {}", cli.output.display());
            let pages = generate::collect(&tour, &config)?;
            let template = Template::load(&cli.source, &config)?;
            generate::write_site(&pages, &template, &cli.output)?;
            output::print_generate_output(&pages);

            println!("==> Build complete: {}", cli.output.display());
        }
        Command::Run { slug, debug } => {
            let config = config::load_config(&cli.source)?;
            let tour = scan::scan(&cli.source, &config)?;
            let slug = slug.trim_matches('/').to_string();
            let code = lesson_code(&tour, &slug)
                .ok_or_else(|| format!("no lesson with slug \"{slug}\""))?;
            let mode = if debug {
                CompileMode::Debug
            } else {
                CompileMode::Trace
            };

            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;
            let pane = runtime.block_on(run_lesson(&config, &slug, code, mode))?;
            if let OutputStatus::Failed(_) = pane.status {
                for line in output::format_pane(&pane) {
                    eprintln!("{}", line);
                }
                std::process::exit(1);
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "lang_tour=debug"
    } else {
        "lang_tour=warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Code sample of a lesson, or of a locale's landing page.
fn lesson_code(tour: &lang_tour::types::Tour, slug: &str) -> Option<String> {
    for locale in Locale::ALL {
        if slug == locale.prefixed("") {
            return tour.locale(locale).map(|t| t.intro.code.clone());
        }
    }
    tour.find_lesson(slug).map(|l| l.code.clone())
}

/// Drive one playground compile/run and echo output lines as they stream in.
async fn run_lesson(
    config: &SiteConfig,
    slug: &str,
    code: String,
    mode: CompileMode,
) -> Result<OutputPane, Box<dyn Error>> {
    let compiler = ProcessCompiler::from_command(&config.playground.compiler)?;
    let runner = ProcessRunner::from_command(&config.playground.runner)?;
    let ctx = UiContext::new(Url::parse(&format!("http://localhost{}", page_href(slug)))?);
    let playground = PlaygroundRuntime::new(
        &ctx,
        compiler,
        runner,
        PlaygroundOptions::from_config(config),
        code,
    )?;

    let mut updates = playground.subscribe_output();
    playground.run_now(mode);

    let mut printed = 0;
    loop {
        updates.changed().await?;
        let pane = updates.borrow_and_update().clone();
        for line in pane.lines.iter().skip(printed) {
            println!("{}", line);
        }
        printed = pane.lines.len();
        if matches!(pane.status, OutputStatus::Finished | OutputStatus::Failed(_)) {
            return Ok(pane);
        }
    }
}
