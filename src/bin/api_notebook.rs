//! Command line front end for API notebooks.
//!
//! ```text
//! api-notebook run users.apinb --environment staging
//! api-notebook import requests.http
//! api-notebook export users.apinb
//! api-notebook compare users.apinb --cell 3 --target dev --target prod
//! ```
//!
//! Logging goes to stderr through `env_logger`; set `RUST_LOG=debug` for
//! request level detail.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use api_notebook::config::load_config_file;
use api_notebook::environment::FileResolver;
use api_notebook::executor::{ExecutionConfig, RequestExecutor};
use api_notebook::group::{GroupExecutor, GroupStatus, RequestTemplate};
use api_notebook::notebook::{
    convert_text_to_notebook, deserialize, export_to_http_file, serialize, CellExecution,
    CellLanguage, CellOutput, NotebookController, NotebookDocument,
};
use api_notebook::secrets::SecretStore;
use clap::{Parser, Subcommand};

/// File extension of notebook documents.
const NOTEBOOK_EXTENSION: &str = "apinb";

#[derive(Parser, Debug)]
#[command(
    name = "api-notebook",
    version,
    about = "Run HTTP request notebooks and compare responses across environments",
    disable_help_subcommand = true
)]
struct Cli {
    /// JSON settings file with an "api-notebook" section
    #[arg(short, long, global = true)]
    settings: Option<PathBuf>,

    /// Environment file (defaults to .api-notebook-env.json found from the
    /// current directory)
    #[arg(short, long, global = true)]
    env_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Execute every cell of a notebook in order
    Run {
        /// Notebook file
        #[arg(value_name = "NOTEBOOK")]
        notebook: PathBuf,
        /// Environment to run HTTP cells against
        #[arg(long)]
        environment: Option<String>,
        /// Append executed requests to this JSONL history file
        #[arg(long)]
        history: Option<PathBuf>,
    },
    /// Convert a plain .http file into a notebook
    Import {
        /// Plain text request file
        #[arg(value_name = "FILE")]
        file: PathBuf,
        /// Output notebook (defaults to the input with the notebook extension)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Convert a notebook into a plain .http file
    Export {
        /// Notebook file
        #[arg(value_name = "NOTEBOOK")]
        notebook: PathBuf,
        /// Output file (defaults to the input with the .http extension)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Run one HTTP cell, then replay it across environments
    Compare {
        /// Notebook file
        #[arg(value_name = "NOTEBOOK")]
        notebook: PathBuf,
        /// Index of the HTTP cell, counting every cell from 0
        #[arg(long)]
        cell: usize,
        /// Environment the cell first runs against
        #[arg(long)]
        environment: Option<String>,
        /// Target environment ids
        #[arg(long = "target", required = true)]
        targets: Vec<String>,
        /// Workspace root receiving the comparisons directory
        #[arg(long)]
        workspace: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    if let Some(settings) = &cli.settings {
        load_config_file(settings).context("loading settings")?;
    }

    match cli.command {
        Commands::Run {
            ref notebook,
            ref environment,
            ref history,
        } => {
            let executor = build_executor(cli.env_file.as_deref())?;
            let document = read_notebook(notebook)?;
            let mut controller = controller(executor, notebook, environment.as_deref());
            if let Some(history) = history {
                controller = controller.with_history_file(history);
            }

            let executions = controller.execute_all(&document.cells).await;
            for execution in &executions {
                print_execution(execution);
            }

            let failed = executions.iter().filter(|e| !e.success).count();
            if failed > 0 {
                bail!("{} of {} cell(s) failed", failed, executions.len());
            }
        }
        Commands::Import { ref file, ref out } => {
            let text = std::fs::read_to_string(file)
                .with_context(|| format!("reading {}", file.display()))?;
            let cells = convert_text_to_notebook(&text, CellLanguage::Markdown);
            let target = out
                .clone()
                .unwrap_or_else(|| file.with_extension(NOTEBOOK_EXTENSION));
            std::fs::write(&target, serialize(&NotebookDocument::new(cells)))
                .with_context(|| format!("writing {}", target.display()))?;
            println!("Wrote {}", target.display());
        }
        Commands::Export {
            ref notebook,
            ref out,
        } => {
            let document = read_notebook(notebook)?;
            let target = out.clone().unwrap_or_else(|| notebook.with_extension("http"));
            std::fs::write(&target, export_to_http_file(&document.cells))
                .with_context(|| format!("writing {}", target.display()))?;
            println!("Wrote {}", target.display());
        }
        Commands::Compare {
            ref notebook,
            cell,
            ref environment,
            ref targets,
            ref workspace,
        } => {
            let executor = build_executor(cli.env_file.as_deref())?;
            let document = read_notebook(notebook)?;
            if cell >= document.cells.len() {
                bail!("cell {} does not exist, the notebook has {} cell(s)", cell, document.cells.len());
            }
            if document.cells[cell].language != CellLanguage::Http {
                bail!("cell {} is not an HTTP cell", cell);
            }

            // Earlier cells set up the variables the request needs.
            let mut controller = controller(executor.clone(), notebook, environment.as_deref());
            let (execution, entry) = controller
                .capture_request(&document.cells, cell)
                .await
                .with_context(|| format!("cell {} does not exist", cell))?;
            let Some(entry) = entry else {
                print_execution(&execution);
                bail!("cell {} did not send a request", cell);
            };
            let template = RequestTemplate::from_history_entry(&entry.sanitized());

            let workspace = match workspace {
                Some(path) => path.clone(),
                None => std::env::current_dir()?,
            };
            let group = GroupExecutor::new(executor, &workspace);
            let mut progress = |current: usize, total: usize, name: &str| {
                println!("[{}/{}] {}", current, total, name);
            };
            let result = group
                .execute_across_environments(&template, targets, Some(&mut progress))
                .await;

            for entry in &result.results {
                let outcome = match &entry.error {
                    Some(error) => format!("error: {}", error),
                    None => entry.result.status_line(),
                };
                println!("{}: {}", entry.environment_name, outcome);
                if let Some(path) = &entry.artifact {
                    println!("  {}", path.display());
                }
            }
            println!(
                "{} succeeded, {} failed in {} ms",
                result.summary.successful_executions,
                result.summary.failed_executions,
                result.summary.total_duration
            );

            if result.status == GroupStatus::Failed {
                bail!("every environment failed");
            }
        }
    }

    Ok(())
}

fn build_executor(env_file: Option<&Path>) -> Result<Arc<RequestExecutor>> {
    let resolver = match env_file {
        Some(path) => FileResolver::load(path)?,
        None => FileResolver::load_from_workspace(&std::env::current_dir()?)?,
    };
    let executor = RequestExecutor::with_reqwest(ExecutionConfig::default(), SecretStore::default())?
        .with_resolver(Arc::new(resolver));
    Ok(Arc::new(executor))
}

fn controller(executor: Arc<RequestExecutor>, notebook: &Path, environment: Option<&str>) -> NotebookController {
    let mut controller = NotebookController::new(executor).with_document(notebook.display().to_string());
    if let Some(environment) = environment {
        controller = controller.with_environment(environment, None);
    }
    controller
}

fn read_notebook(path: &Path) -> Result<NotebookDocument> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    Ok(deserialize(&bytes))
}

fn print_execution(execution: &CellExecution) {
    if execution.outputs.is_empty() {
        return;
    }
    let status = if execution.success { "ok" } else { "failed" };
    println!("--- cell {} ({}, {} ms) ---", execution.index, status, execution.duration_ms);
    for output in &execution.outputs {
        match output {
            CellOutput::Markdown(text) | CellOutput::Text(text) => println!("{}", text),
            CellOutput::Json(_) => {}
            CellOutput::Error { name, message } => eprintln!("{}: {}", name, message),
        }
    }
}
