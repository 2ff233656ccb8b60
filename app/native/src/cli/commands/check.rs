//! `tagtile check`: build the configuration and report what was found.

use serde::Serialize;
use tabled::Tabled;

use crate::cli::output;
use crate::config::{self, ConfigIssue, LoadedModel};
use crate::engine::ConfigModel;
use crate::error::EngineError;

#[derive(Debug, Serialize)]
struct IssueReport {
    kind: &'static str,
    message: String,
}

impl From<&ConfigIssue> for IssueReport {
    fn from(issue: &ConfigIssue) -> Self { Self { kind: issue.kind(), message: issue.to_string() } }
}

#[derive(Debug, Default, PartialEq, Eq, Serialize)]
struct Summary {
    tags: usize,
    views: usize,
    gravities: usize,
    grabs: usize,
    sublets: usize,
    screens: usize,
    hooks: usize,
}

impl Summary {
    fn of(model: &ConfigModel) -> Self {
        Self {
            tags: model.tags().len(),
            views: model.views().len(),
            gravities: model.gravities().len(),
            grabs: model.grabs().len(),
            sublets: model.sublets().len(),
            screens: model.configured_screens(),
            hooks: model.hooks().len(),
        }
    }
}

#[derive(Debug, Serialize)]
struct CheckReport {
    path: Option<String>,
    summary: Summary,
    issues: Vec<IssueReport>,
}

fn report(loaded: &LoadedModel) -> CheckReport {
    CheckReport {
        path: loaded.path.as_ref().map(|path| path.display().to_string()),
        summary: Summary::of(&loaded.model),
        issues: loaded.issues.iter().map(IssueReport::from).collect(),
    }
}

/// Execute `tagtile check`.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded or has issues.
pub fn execute(json: bool) -> Result<(), EngineError> {
    let loaded = config::load_model(None)?;
    let report = report(&loaded);

    if json {
        output::print_json(&report)?;
    } else {
        print_report(&report);
    }

    if report.issues.is_empty() {
        Ok(())
    } else {
        Err(EngineError::ConfigError(format!(
            "{} issue(s) found",
            report.issues.len()
        )))
    }
}

fn print_report(report: &CheckReport) {
    #[derive(Tabled)]
    struct SummaryRow {
        #[tabled(rename = "Tags")]
        tags: usize,
        #[tabled(rename = "Views")]
        views: usize,
        #[tabled(rename = "Gravities")]
        gravities: usize,
        #[tabled(rename = "Grabs")]
        grabs: usize,
        #[tabled(rename = "Sublets")]
        sublets: usize,
        #[tabled(rename = "Screens")]
        screens: usize,
        #[tabled(rename = "Hooks")]
        hooks: usize,
    }

    #[derive(Tabled)]
    struct IssueRow<'a> {
        #[tabled(rename = "Kind")]
        kind: &'static str,
        #[tabled(rename = "Issue")]
        message: &'a str,
    }

    match &report.path {
        Some(path) => println!("Configuration: {path}\n"),
        None => println!("Configuration: stock\n"),
    }

    let summary = &report.summary;
    println!(
        "{}",
        output::table([SummaryRow {
            tags: summary.tags,
            views: summary.views,
            gravities: summary.gravities,
            grabs: summary.grabs,
            sublets: summary.sublets,
            screens: summary.screens,
            hooks: summary.hooks,
        }])
    );

    if report.issues.is_empty() {
        println!("\n{} No issues found.", output::format_bool(true));
        return;
    }

    println!();
    output::heading("Issues", report.issues.len());
    let rows = report.issues.iter().map(|issue| IssueRow { kind: issue.kind, message: &issue.message });
    println!("{}", output::table(rows));
}
