//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use questionbuilder_core::{
    BuildMode, ProgressReporter, build_catalog, inject_applicant_data, load_candidate,
    load_candidate_files, load_protocol, template_variables, validate_catalog_json,
};
use questionbuilder_llm::{
    ChatClient, Extractor, FixtureExtractor, FixtureFlowSynthesizer, FlowSynthesizer,
    OpenAiExtractor, OpenAiFlowSynthesizer,
};
use questionbuilder_shared::{
    AppConfig, CatalogConfig, QuestionCatalog, init_config, load_config, resolve_api_key,
};

const DEFAULT_OUTPUT: &str = "output/questions.json";
const DEFAULT_TEMPLATE_OUTPUT: &str = "output/questions_template.json";

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// QuestionBuilder: compile interview-question catalogs from conversation protocols.
#[derive(Parser)]
#[command(
    name = "questionbuilder",
    version,
    about = "Compile interview-question catalogs from conversation protocols.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Build a question catalog from a protocol and applicant profile.
    Build {
        /// Directory holding the protocol and profile files.
        #[arg(default_value = "input")]
        input_dir: PathBuf,

        /// Emit `{{placeholder}}` tokens instead of applicant values.
        #[arg(long)]
        template: bool,

        /// Output file (defaults to output/questions.json or
        /// output/questions_template.json).
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Use a recorded extraction result instead of calling the LLM.
        #[arg(long)]
        extract_fixture: Option<PathBuf>,

        /// Use recorded flow proposals instead of calling the LLM.
        #[arg(long, conflicts_with = "no_flows")]
        flows_fixture: Option<PathBuf>,

        /// Skip conversational flow synthesis.
        #[arg(long)]
        no_flows: bool,
    },

    /// Resolve the placeholders of a templated catalog for one applicant.
    Inject {
        /// Templated catalog.
        #[arg(long)]
        template: PathBuf,

        /// Applicant profile (personal part, or a single file with address).
        #[arg(long)]
        profile: PathBuf,

        /// Address part of the profile.
        #[arg(long)]
        address: Option<PathBuf>,

        /// Output file (defaults to output/questions.json).
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Check an existing catalog against the catalog schema.
    Validate {
        /// Catalog file.
        file: PathBuf,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "questionbuilder=info",
        1 => "questionbuilder=debug",
        _ => "questionbuilder=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Build {
            input_dir,
            template,
            out,
            extract_fixture,
            flows_fixture,
            no_flows,
        } => {
            let sources = Sources {
                extract_fixture,
                flows_fixture,
                no_flows,
            };
            cmd_build(&input_dir, template, out, &sources).await
        }
        Command::Inject {
            template,
            profile,
            address,
            out,
        } => cmd_inject(&template, &profile, address.as_deref(), out),
        Command::Validate { file } => cmd_validate(&file),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(),
        },
    }
}

// ---------------------------------------------------------------------------
// build
// ---------------------------------------------------------------------------

/// Where the two LLM-backed collaborators come from.
struct Sources {
    extract_fixture: Option<PathBuf>,
    flows_fixture: Option<PathBuf>,
    no_flows: bool,
}

/// Lazily created chat client, so the API key is only required when a
/// networked collaborator is actually used.
struct LazyClient<'a> {
    config: &'a AppConfig,
    client: Option<ChatClient>,
}

impl LazyClient<'_> {
    fn get(&mut self) -> Result<ChatClient> {
        if let Some(client) = &self.client {
            return Ok(client.clone());
        }
        let key = resolve_api_key(self.config)?;
        let client = ChatClient::from_config(self.config, key)?;
        self.client = Some(client.clone());
        Ok(client)
    }
}

fn collaborators(
    config: &AppConfig,
    sources: &Sources,
) -> Result<(Box<dyn Extractor>, Box<dyn FlowSynthesizer>)> {
    let mut client = LazyClient {
        config,
        client: None,
    };

    let extractor: Box<dyn Extractor> = match &sources.extract_fixture {
        Some(path) => Box::new(FixtureExtractor::from_file(path)?),
        None => Box::new(OpenAiExtractor::from_config(client.get()?, config)),
    };

    let synthesizer: Box<dyn FlowSynthesizer> = match (&sources.flows_fixture, sources.no_flows) {
        (_, true) => Box::new(FixtureFlowSynthesizer::unavailable()),
        (Some(path), false) => Box::new(FixtureFlowSynthesizer::from_file(path)?),
        (None, false) => Box::new(OpenAiFlowSynthesizer::from_config(client.get()?, config)),
    };

    Ok((extractor, synthesizer))
}

async fn cmd_build(
    input_dir: &Path,
    template: bool,
    out: Option<PathBuf>,
    sources: &Sources,
) -> Result<()> {
    let start = Instant::now();
    let config = load_config()?;
    let catalog_config = CatalogConfig::from(&config);

    let protocol = load_protocol(input_dir, &config.input)?;
    let mode = if template {
        BuildMode::Templated
    } else {
        BuildMode::Literal(load_candidate(input_dir, &config.input)?)
    };

    let (extractor, synthesizer) = collaborators(&config, sources)?;

    info!(
        input_dir = %input_dir.display(),
        template,
        no_flows = sources.no_flows,
        "building question catalog"
    );

    let reporter = CliProgress::new();
    let catalog = build_catalog(
        protocol,
        &mode,
        extractor.as_ref(),
        synthesizer.as_ref(),
        &catalog_config,
        &reporter,
    )
    .await;
    // The spinner must not outlive a failed build.
    reporter.spinner.finish_and_clear();
    let catalog = catalog?;

    let default_out = if template {
        DEFAULT_TEMPLATE_OUTPUT
    } else {
        DEFAULT_OUTPUT
    };
    let out = out.unwrap_or_else(|| PathBuf::from(default_out));
    write_catalog(&out, &catalog)?;

    println!();
    println!("  Question catalog written!");
    println!("  Questions:      {}", catalog.questions.len());
    println!("  Conversational: {}", catalog.conversational_count());
    if template {
        println!("  Variables:      {}", template_variables(&catalog).join(", "));
    }
    println!("  Path:           {}", out.display());
    println!("  Time:           {:.1}s", start.elapsed().as_secs_f64());
    println!();

    Ok(())
}

// ---------------------------------------------------------------------------
// inject / validate
// ---------------------------------------------------------------------------

fn read_catalog(path: &Path) -> Result<QuestionCatalog> {
    let content = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("cannot read catalog {}", path.display()))?;
    Ok(validate_catalog_json(&content)?)
}

fn write_catalog(path: &Path, catalog: &QuestionCatalog) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .wrap_err_with(|| format!("cannot create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(catalog)?;
    std::fs::write(path, json).wrap_err_with(|| format!("cannot write {}", path.display()))?;
    info!(path = %path.display(), "catalog written");
    Ok(())
}

fn cmd_inject(
    template: &Path,
    profile: &Path,
    address: Option<&Path>,
    out: Option<PathBuf>,
) -> Result<()> {
    let catalog = read_catalog(template)?;
    let (personal, address) = load_candidate_files(profile, address)?;

    let (resolved, replacements) = inject_applicant_data(&catalog, &personal, Some(&address));
    let remaining = template_variables(&resolved);

    let out = out.unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT));
    write_catalog(&out, &resolved)?;

    println!("Injected {replacements} values into {}", out.display());
    if !remaining.is_empty() {
        println!("Unresolved variables: {}", remaining.join(", "));
    }
    Ok(())
}

fn cmd_validate(file: &Path) -> Result<()> {
    let catalog = read_catalog(file).wrap_err_with(|| format!("{} is invalid", file.display()))?;
    println!(
        "{} is valid: {} questions, {} conversational",
        file.display(),
        catalog.questions.len(),
        catalog.conversational_count()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        spinner.set_style(style);
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn done(&self, _catalog: &QuestionCatalog) {
        self.spinner.finish_and_clear();
    }
}

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}
