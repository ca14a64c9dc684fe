use anyhow::{Context, bail};
use clap::{Args as ClapArgs, Parser, Subcommand};
use slidepilot_engine::backend::Backend;
use slidepilot_engine::config::{ConfigLoader, SlidePilotConfig};
use slidepilot_engine::formatter::format_report;
use slidepilot_engine::snapshot::DirectorySnapshotSink;
use slidepilot_engine::workflow::Workflow;
use slidepilot_h::HeadlessBackend;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "slidepilot",
    version,
    about = "Turn a chat answer into a rendered slide deck"
)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Configuration file (defaults to ./slidepilot.yaml, then ~/.slidepilot/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Launch browsers in visible mode (not headless)
    #[arg(long, global = true)]
    visible: bool,

    /// Knowledge collection to attach before sending the prompt
    #[arg(long, global = true)]
    knowledge_tag: Option<String>,

    /// Deck template to select
    #[arg(long, global = true)]
    template: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Ask the chat, then build and render the presentation
    Run(PromptArgs),
    /// Ask the chat and print the extracted answer
    Extract(PromptArgs),
    /// Print the resolved configuration as YAML
    CheckConfig,
}

#[derive(ClapArgs)]
#[group(required = true, multiple = false)]
struct PromptArgs {
    /// Prompt text
    #[arg(long)]
    prompt: Option<String>,

    /// Read the prompt from a file
    #[arg(long)]
    prompt_file: Option<PathBuf>,
}

impl PromptArgs {
    async fn resolve(&self) -> anyhow::Result<String> {
        let prompt = match (&self.prompt, &self.prompt_file) {
            (Some(text), _) => text.clone(),
            (None, Some(path)) => tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("reading prompt file {}", path.display()))?,
            (None, None) => bail!("either --prompt or --prompt-file is required"),
        };
        let prompt = prompt.trim().to_string();
        if prompt.is_empty() {
            bail!("prompt is empty");
        }
        Ok(prompt)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries the report.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut config = ConfigLoader::load(args.config.as_deref())
        .await
        .context("loading configuration")?;
    if let Some(tag) = args.knowledge_tag {
        config.workflow.knowledge_tag = Some(tag);
    }
    if let Some(template) = args.template {
        config.workflow.template_name = Some(template);
    }

    match args.command {
        Command::CheckConfig => {
            print!("{}", serde_yaml::to_string(&config)?);
            Ok(())
        }
        Command::Extract(prompt) => {
            let prompt = prompt.resolve().await?;
            extract(config, args.visible, &prompt).await
        }
        Command::Run(prompt) => {
            let prompt = prompt.resolve().await?;
            run(config, args.visible, &prompt).await
        }
    }
}

fn browser(visible: bool, profile: &str) -> HeadlessBackend {
    HeadlessBackend::new_with_visibility(visible).with_profile(profile)
}

async fn close(backend: &mut HeadlessBackend) {
    if let Err(e) = backend.close().await {
        tracing::warn!("Failed to close browser: {}", e);
    }
}

fn print_snapshots(snapshots: &[String]) {
    if !snapshots.is_empty() {
        eprintln!("Snapshots:");
        for path in snapshots {
            eprintln!("- {}", path);
        }
    }
}

async fn extract(config: SlidePilotConfig, visible: bool, prompt: &str) -> anyhow::Result<()> {
    let sink = DirectorySnapshotSink::new(&config.workflow.snapshot_dir);
    let mut workflow = Workflow::new(config, sink);

    let mut chat = browser(visible, "chat");
    chat.launch().await.context("launching chat browser")?;
    let result = workflow.run_extraction(&mut chat, prompt).await;
    close(&mut chat).await;

    match result {
        Ok(report) => {
            if let Some(response) = &report.response {
                println!("{}", response.text);
            }
            eprintln!("{}", format_report(&report));
            Ok(())
        }
        Err(e) => {
            print_snapshots(workflow.snapshots());
            Err(e).context("extraction failed")
        }
    }
}

async fn run(config: SlidePilotConfig, visible: bool, prompt: &str) -> anyhow::Result<()> {
    let sink = DirectorySnapshotSink::new(&config.workflow.snapshot_dir);
    let mut workflow = Workflow::new(config, sink);

    let mut chat = browser(visible, "chat");
    chat.launch().await.context("launching chat browser")?;
    let mut deck = browser(visible, "deck");
    if let Err(e) = deck.launch().await {
        close(&mut chat).await;
        return Err(e).context("launching deck browser");
    }

    let result = workflow.run(&mut chat, &mut deck, prompt).await;
    close(&mut chat).await;
    close(&mut deck).await;

    match result {
        Ok(report) => {
            println!("{}", format_report(&report));
            Ok(())
        }
        Err(e) => {
            print_snapshots(workflow.snapshots());
            Err(e).context("workflow aborted")
        }
    }
}
