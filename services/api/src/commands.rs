use clap::Args;
use grants_ui::config::AppConfig;
use grants_ui::error::AppError;
use grants_ui::tasklist::{
    FileTasklistStore, TasklistConfig, TasklistGenerator, TasklistLoader, TasklistView,
};
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct RenderArgs {
    /// Tasklist id, e.g. `example` for `example-tasklist.yaml`
    pub(crate) tasklist_id: String,
    /// JSON file of saved answers keyed by subsection id
    #[arg(long)]
    pub(crate) data: Option<PathBuf>,
    /// Comma-separated subsection ids the applicant has opened
    #[arg(long, value_delimiter = ',')]
    pub(crate) visited: Vec<String>,
    /// Override the directory tasklist documents are read from
    #[arg(long)]
    pub(crate) config_dir: Option<PathBuf>,
    /// Print the render model as JSON instead of a summary
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct ValidateArgs {
    /// Tasklist id to check
    pub(crate) tasklist_id: String,
    /// Override the directory tasklist documents are read from
    #[arg(long)]
    pub(crate) config_dir: Option<PathBuf>,
    /// Print the summary as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ValidationSummary {
    pub(crate) tasklist_id: String,
    pub(crate) title: String,
    pub(crate) sections: usize,
    pub(crate) subsections: usize,
    pub(crate) conditions: usize,
    pub(crate) status_rules: usize,
    pub(crate) enabled_in_prod: bool,
}

impl ValidationSummary {
    fn from_config(tasklist_id: &str, config: &TasklistConfig) -> Self {
        Self {
            tasklist_id: tasklist_id.to_string(),
            title: config.tasklist.title.clone(),
            sections: config.tasklist.sections.len(),
            subsections: config.subsections().count(),
            conditions: config.conditions.len(),
            status_rules: config.status_rules.iter().count(),
            enabled_in_prod: config.metadata.enabled_in_prod == Some(true),
        }
    }
}

pub(crate) fn run_render(args: RenderArgs) -> Result<(), AppError> {
    let RenderArgs {
        tasklist_id,
        data,
        visited,
        config_dir,
        json,
    } = args;

    let loader = loader(config_dir)?;
    let config = loader.load_config(&tasklist_id)?;
    let data = match data {
        Some(path) => read_answers(&path)?,
        None => Value::Null,
    };

    let view = TasklistGenerator::new(&config).generate_tasklist(&data, &visited)?;

    if json {
        println!("{}", to_pretty_json(&view)?);
    } else {
        print_view(&view);
    }
    Ok(())
}

pub(crate) fn run_validate(args: ValidateArgs) -> Result<(), AppError> {
    let ValidateArgs {
        tasklist_id,
        config_dir,
        json,
    } = args;

    let config = loader(config_dir)?.load_config(&tasklist_id)?;
    let summary = ValidationSummary::from_config(&tasklist_id, &config);

    if json {
        println!("{}", to_pretty_json(&summary)?);
    } else {
        println!("Tasklist '{}' is valid: {}", summary.tasklist_id, summary.title);
        println!(
            "- {} sections | {} subsections | {} conditions | {} status rules",
            summary.sections, summary.subsections, summary.conditions, summary.status_rules
        );
        println!(
            "- {}",
            if summary.enabled_in_prod {
                "enabled in production"
            } else {
                "not enabled in production"
            }
        );
    }
    Ok(())
}

fn loader(config_dir: Option<PathBuf>) -> Result<TasklistLoader<FileTasklistStore>, AppError> {
    let config = AppConfig::load()?;
    let root = config_dir.unwrap_or(config.tasklists.config_dir);
    Ok(TasklistLoader::new(
        Arc::new(FileTasklistStore::new(root)),
        config.environment,
    ))
}

fn read_answers(path: &Path) -> Result<Value, AppError> {
    let raw = std::fs::read_to_string(path)?;
    serde_json::from_str(&raw).map_err(|err| AppError::Io(err.into()))
}

fn to_pretty_json<T: Serialize>(value: &T) -> Result<String, AppError> {
    serde_json::to_string_pretty(value).map_err(|err| AppError::Io(err.into()))
}

fn print_view(view: &TasklistView) {
    println!("{}", view.page_heading);
    if let Some(closing_date) = &view.closing_date {
        println!("Closing date: {closing_date}");
    }
    if let Some(help_text) = &view.help_text {
        println!("{help_text}");
    }

    for section in &view.sections {
        println!("\n{}", section.title);
        for subsection in &section.subsections {
            match &subsection.href {
                Some(href) => println!(
                    "  - {}: {} -> {}",
                    subsection.title.text,
                    subsection.status.label(),
                    href
                ),
                None => println!(
                    "  - {}: {}",
                    subsection.title.text,
                    subsection.status.label()
                ),
            }
        }
    }
}
