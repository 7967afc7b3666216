use std::{
    io::{self, Read},
    path::PathBuf,
    process::ExitCode,
};

use anyhow::Result;
use clap::{Arg, ArgAction, ArgMatches, Command};
use ilx_core::{driver::hook, init_tracing, init_tracing_to_file, IlxConfig};
use tracing::{info, warn};

mod commands;

fn path_arg(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name)
        .value_name("PATH")
        .help(help)
        .value_parser(clap::value_parser!(PathBuf))
        .required(true)
        .index(1)
}

fn signatures_arg() -> Arg {
    Arg::new("signatures")
        .long("signatures")
        .value_name("FILE")
        .help("Signature table (JSON) consulted for type tags")
        .value_parser(clap::value_parser!(PathBuf))
}

fn cli() -> Command {
    Command::new("ilx")
        .version(ilx_core::VERSION)
        .about("Compile parsed source and markup trees into ILX")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("FILE")
                .help("Settings file (JSON)")
                .value_parser(clap::value_parser!(PathBuf))
                .global(true),
        )
        .arg(
            Arg::new("output-dir")
                .long("output-dir")
                .value_name("DIR")
                .help("Output directory, relative to the project root")
                .value_parser(clap::value_parser!(PathBuf))
                .global(true),
        )
        .arg(
            Arg::new("sequential")
                .long("sequential")
                .help("Convert units one at a time")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .subcommand(
            Command::new("ast")
                .about("Emit the generic graph line for a source tree")
                .arg(path_arg("tree", "Parsed source tree (JSON)"))
                .arg(signatures_arg())
                .arg(
                    Arg::new("unit")
                        .long("unit")
                        .value_name("NAME")
                        .help("Unit name used in provenance"),
                )
                .arg(
                    Arg::new("source")
                        .long("source")
                        .help("Print approximate source text instead of ILX")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("domain")
                .about("Emit domain ILX for a source tree or a directory of them")
                .arg(path_arg("path", "Source tree (JSON) or directory"))
                .arg(signatures_arg()),
        )
        .subcommand(
            Command::new("view")
                .about("Emit view ILX for a markup tree or a directory of them")
                .arg(path_arg("path", "Markup tree (JSON) or directory")),
        )
        .subcommand(
            Command::new("batch")
                .about("Convert every unit of a project")
                .arg(path_arg("root", "Project root")),
        )
        .subcommand(
            Command::new("hook")
                .about("Editor hook: read a tool event on stdin and regenerate ILX")
                .arg(
                    Arg::new("log")
                        .long("log")
                        .value_name("FILE")
                        .help("Diagnostic log")
                        .value_parser(clap::value_parser!(PathBuf))
                        .default_value(hook::DEFAULT_LOG),
                ),
        )
}

/// Settings file first, then flag overrides
fn load_config(matches: &ArgMatches) -> Result<IlxConfig> {
    let mut config = match matches.get_one::<PathBuf>("config") {
        Some(path) => IlxConfig::load(path)?,
        None => IlxConfig::default(),
    };
    if let Some(output_dir) = matches.get_one::<PathBuf>("output-dir") {
        config.output_dir = output_dir.clone();
    }
    if matches.get_flag("sequential") {
        config.parallel = false;
    }
    Ok(config)
}

fn main() -> ExitCode {
    let matches = cli().get_matches();

    if let Some(("hook", sub)) = matches.subcommand() {
        run_hook(sub);
        // The editor proceeds whatever happened here
        return ExitCode::SUCCESS;
    }

    init_tracing();
    match run(&matches) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run_hook(sub: &ArgMatches) {
    if let Some(log) = sub.get_one::<PathBuf>("log") {
        // Without a log there is nowhere to report; carry on silently
        let _ = init_tracing_to_file(log);
    }
    let config = match load_config(sub) {
        Ok(config) => config,
        Err(e) => {
            warn!(error = %format!("{e:#}"), "falling back to default settings");
            IlxConfig::default()
        }
    };
    let mut payload = String::new();
    if let Err(e) = io::stdin().read_to_string(&mut payload) {
        warn!(error = %e, "could not read hook input");
        return;
    }
    let action = commands::run_hook(&payload, &config);
    info!(?action, "hook finished");
}

fn run(matches: &ArgMatches) -> Result<ExitCode> {
    let Some((name, sub)) = matches.subcommand() else {
        anyhow::bail!("a subcommand is required");
    };
    // Global flags land in the subcommand's matches
    let config = load_config(sub)?;
    match name {
        "ast" => {
            let tree = required_path(sub, "tree")?;
            let output = if sub.get_flag("source") {
                commands::emit_source(tree)?
            } else {
                commands::emit_graph(
                    tree,
                    sub.get_one::<String>("unit").map(String::as_str),
                    sub.get_one::<PathBuf>("signatures").map(PathBuf::as_path),
                )?
            };
            println!("{output}");
        }
        "domain" => {
            let output = commands::emit_domain(
                required_path(sub, "path")?,
                sub.get_one::<PathBuf>("signatures").map(PathBuf::as_path),
                &config,
            )?;
            println!("{output}");
        }
        "view" => {
            println!("{}", commands::emit_view(required_path(sub, "path")?, &config)?);
        }
        "batch" => {
            let root = required_path(sub, "root")?;
            println!("ILX Batch Conversion");
            println!("Project: {}", root.display());
            let (summary, report) = commands::run_batch(root, &config)?;
            println!("{report}");
            // Per-unit failures are part of the report, not of the exit status
            info!(success_rate = summary.success_rate(), "batch finished");
        }
        other => anyhow::bail!("unknown subcommand {other}"),
    }
    Ok(ExitCode::SUCCESS)
}

fn required_path<'a>(matches: &'a ArgMatches, name: &str) -> Result<&'a std::path::Path> {
    matches
        .get_one::<PathBuf>(name)
        .map(PathBuf::as_path)
        .ok_or_else(|| anyhow::anyhow!("missing argument <{name}>"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_consistent() {
        cli().debug_assert();
    }

    #[test]
    fn test_flags_override_config() {
        let matches = cli()
            .try_get_matches_from(["ilx", "batch", "/tmp/project", "--sequential", "--output-dir", "out"])
            .unwrap();
        let (_, sub) = matches.subcommand().unwrap();
        let config = load_config(sub).unwrap();
        assert!(!config.parallel);
        assert_eq!(config.output_dir, PathBuf::from("out"));
    }
}
