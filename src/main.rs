//
// Copyright (c) The armor-rs Core Contributors
//
// SPDX-License-Identifier: MIT
//

//! Command-line driver: resolves header pairs, runs the diff pipeline
//! once per header and writes the report files.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};

use armor::builder::TreeBuilder;
use armor::context::NormalizedContext;
use armor::describe::describe;
use armor::diff::diff_contexts;
use armor::frontend::{
    DiagnosticSeverity, Index, ParseFlags, TranslationUnit,
};
use armor::logging::{self, LogLevel};
use armor::report;
use armor::{Error, Result};

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
enum ReportFormat {
    Html,
    Json,
}

#[derive(Debug, Parser)]
#[command(
    name = "armor",
    about = "Compare two revisions of a C/C++ header and report API changes",
    version
)]
struct Cli {
    /// Base revision: a header file, or a directory root when header
    /// names are given.
    base: PathBuf,

    /// Head revision: a header file, or a directory root when header
    /// names are given.
    head: PathBuf,

    /// Header names resolved against both revisions.
    headers: Vec<String>,

    /// Directory, relative to each revision root, in which the named
    /// headers live.
    #[arg(long = "header-dir", value_name = "DIR")]
    header_dir: Option<PathBuf>,

    /// Report format; `json` emits the JSON report in addition to HTML.
    #[arg(short = 'r', long = "report", value_enum, default_value = "html")]
    report: ReportFormat,

    /// Front-end resource directory.
    #[arg(short = 'p', long = "resource-path", value_name = "DIR")]
    resource_path: Option<PathBuf>,

    /// Additional include directory, forwarded to the front-end.
    #[arg(short = 'I', value_name = "DIR")]
    include: Vec<String>,

    /// Macro definition, forwarded to the front-end (e.g. `-DNDEBUG`).
    #[arg(short = 'm', value_name = "MACRO")]
    macros: Vec<String>,

    /// Qualified name excluded from diff reporting.
    #[arg(long = "exclude", value_name = "NAME")]
    exclude: Vec<String>,

    /// Additionally write the raw difference tree.
    #[arg(long = "dump-ast-diff")]
    dump_ast_diff: bool,

    #[arg(
        long = "log-level",
        value_enum,
        default_value = "LOG",
        ignore_case = true
    )]
    log_level: LogLevel,
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.log_level);

    if let Err(e) = run(&cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let index = Index::new()?;
    let args = frontend_args(cli);
    let excluded: HashSet<String> = cli.exclude.iter().cloned().collect();

    for (base, head, header) in jobs(cli) {
        process_header(&index, &args, &excluded, &base, &head, &header, cli)?;
    }

    Ok(())
}

/// Header pairs to process: either the two positional paths directly, or
/// every named header resolved against both revision roots.
fn jobs(cli: &Cli) -> Vec<(PathBuf, PathBuf, String)> {
    if cli.headers.is_empty() {
        let header = cli
            .head
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "header".to_string());
        return vec![(cli.base.clone(), cli.head.clone(), header)];
    }

    cli.headers
        .iter()
        .map(|name| {
            (
                resolve(&cli.base, cli.header_dir.as_deref(), name),
                resolve(&cli.head, cli.header_dir.as_deref(), name),
                name.clone(),
            )
        })
        .collect()
}

fn resolve(root: &Path, dir: Option<&Path>, name: &str) -> PathBuf {
    match dir {
        Some(dir) => root.join(dir).join(name),
        None => root.join(name),
    }
}

fn frontend_args(cli: &Cli) -> Vec<String> {
    let mut args = Vec::new();
    for include in &cli.include {
        args.push(format!("-I{}", include));
    }
    args.extend(cli.macros.iter().cloned());
    if let Some(resource) = &cli.resource_path {
        args.push(format!("-resource-dir={}", resource.display()));
    }
    args
}

/// Parse one header revision into a normalized context.
fn parse_context(
    index: &Index,
    path: &Path,
    args: &[String],
    excluded: &HashSet<String>,
) -> Result<NormalizedContext> {
    let flags = ParseFlags::DETAILED_PREPROCESSING_RECORD
        | ParseFlags::SKIP_FUNCTION_BODIES
        | ParseFlags::KEEP_GOING
        | ParseFlags::INCOMPLETE;
    let tu = TranslationUnit::parse(index, path, args, flags)?;

    let mut fatal = false;
    for diag in tu.diagnostics() {
        if diag.severity >= DiagnosticSeverity::Warning {
            log::warn!("{}: {}", path.display(), diag.message);
        } else {
            log::debug!("{}: {}", path.display(), diag.message);
        }
        fatal |= diag.severity == DiagnosticSeverity::Fatal;
    }
    if fatal {
        return Err(Error::from_parse(armor::ffi::CXError_Failure, path));
    }

    let mut ctx = NormalizedContext::new(excluded.clone());
    TreeBuilder::new(&mut ctx).build(&tu);
    Ok(ctx)
}

fn process_header(
    index: &Index,
    args: &[String],
    excluded: &HashSet<String>,
    base: &Path,
    head: &Path,
    header: &str,
    cli: &Cli,
) -> Result<()> {
    log::info!("processing header '{}'", header);

    // A header either side fails to parse is skipped without failing
    // the run.
    let base_ctx = match parse_context(index, base, args, excluded) {
        Ok(ctx) => ctx,
        Err(err) => {
            log::warn!("skipping '{}': {}", header, err);
            return Ok(());
        }
    };
    let head_ctx = match parse_context(index, head, args, excluded) {
        Ok(ctx) => ctx,
        Err(err) => {
            log::warn!("skipping '{}': {}", header, err);
            return Ok(());
        }
    };
    log::debug!(
        "parsed {} base nodes, {} head nodes",
        base_ctx.len(),
        head_ctx.len()
    );

    let diff = diff_contexts(&base_ctx, &head_ctx);
    let tag = file_tag(header);

    if cli.dump_ast_diff {
        let path = PathBuf::from(format!("ast_diff_output_{}.json", tag));
        write_report(&path, &report::render_diff_json(&diff)?)?;
    }

    let records = describe(&diff, header);
    let groups = report::group_records(&records);

    let html = PathBuf::from(format!("api_diff_report_{}.html", tag));
    write_report(&html, &report::render_html(&groups))?;

    if cli.report == ReportFormat::Json {
        let json = PathBuf::from(format!("api_diff_report_{}.json", tag));
        write_report(&json, &report::render_json(&groups)?)?;
    }

    Ok(())
}

/// File-name tag for a header: `usage.h` becomes `usage_h`.
fn file_tag(header: &str) -> String {
    header
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

fn write_report(path: &Path, contents: &str) -> Result<()> {
    log::info!("writing {}", path.display());
    fs::write(path, contents).map_err(|err| Error::io(err, path))
}
