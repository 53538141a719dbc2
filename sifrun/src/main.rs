//! sifrun: compile task files into container runtime invocations and run them.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use serde::Serialize;

use sifrun::compile::compile_path;
use sifrun::core::command::CompiledCommand;
use sifrun::error::InvokeError;
use sifrun::exit_codes;
use sifrun::io::config::{DEFAULT_CONFIG_FILE, SifrunConfig, load_config, write_config};
use sifrun::io::host::HostFilesystem;
use sifrun::io::invoker::{InvocationOutput, ProcessInvoker};
use sifrun::io::task_file::TaskFile;
use sifrun::logging;
use sifrun::run::run_task;
use sifrun::tasks::Registry;

#[derive(Parser)]
#[command(
    name = "sifrun",
    version,
    about = "Compile declarative tool parameters into container runtime invocations"
)]
struct Cli {
    /// Path to the sifrun config file.
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,
    /// Log sifrun events at info level (overridden by `RUST_LOG`).
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write a default config file if missing.
    Init {
        /// Overwrite an existing config file.
        #[arg(short, long)]
        force: bool,
    },
    /// List built-in task types.
    Tasks,
    /// Print a task type's merged parameter table (positions after merge).
    Describe {
        /// Built-in task type name.
        task: String,
    },
    /// Compile a task file and print the command line.
    Compile {
        /// Task file (TOML).
        task_file: PathBuf,
        /// Print the compiled command as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Compile a task file and run the container command.
    Run {
        /// Task file (TOML).
        task_file: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{:#}", err);
            std::process::exit(exit_codes::INVALID);
        }
    }
}

fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Command::Init { force } => cmd_init(&cli.config, force),
        Command::Tasks => cmd_tasks(),
        Command::Describe { task } => cmd_describe(&task),
        Command::Compile { task_file, json } => cmd_compile(&cli.config, &task_file, json),
        Command::Run { task_file } => cmd_run(&cli.config, &task_file),
    }
}

fn cmd_init(config_path: &Path, force: bool) -> Result<i32> {
    if !force && config_path.exists() {
        println!(
            "{} exists (use --force to overwrite)",
            config_path.display()
        );
        return Ok(exit_codes::OK);
    }
    write_config(config_path, &SifrunConfig::default())
        .with_context(|| format!("write {}", config_path.display()))?;
    println!("wrote {}", config_path.display());
    Ok(exit_codes::OK)
}

fn cmd_tasks() -> Result<i32> {
    let registry = Registry::builtin().context("build task registry")?;
    for task in registry.tasks() {
        println!("{}\t{}", task.name, task.summary);
    }
    Ok(exit_codes::OK)
}

fn cmd_describe(name: &str) -> Result<i32> {
    let registry = Registry::builtin().context("build task registry")?;
    let task = registry
        .get(name)
        .ok_or_else(|| anyhow!("unknown task type '{name}'"))?;
    let merged = task
        .merged_schema(registry.base())
        .with_context(|| format!("merge task '{name}'"))?;
    println!("{}: {}", task.name, task.summary);
    if let Some(command) = &task.container_command {
        println!("command: {command}");
    }
    for param in merged.params() {
        let position = param
            .position
            .map_or_else(|| "-".to_string(), |position| position.to_string());
        let argstr = param.argstr.as_ref().map_or("-", |argstr| argstr.as_str());
        let mut notes = Vec::new();
        if param.mandatory {
            notes.push("mandatory".to_string());
        }
        if param.is_container_path {
            notes.push("container-path".to_string());
        }
        if param.exists_required {
            notes.push("exists".to_string());
        }
        if let (Some(source), Some(template)) = (&param.name_source, &param.name_template) {
            notes.push(format!("from {source} as {}", template.as_str()));
        }
        if !param.requires.is_empty() {
            notes.push(format!("requires {}", param.requires.join(",")));
        }
        println!(
            "  {:<26} {:<9} {:<9} {:>3}  {:<28} {}",
            param.name,
            param.kind.label(),
            param.position_class().label(),
            position,
            argstr,
            notes.join(" ")
        );
        if !param.desc.is_empty() {
            println!("      {}", param.desc);
        }
    }
    Ok(exit_codes::OK)
}

/// JSON shape printed by `sifrun compile --json`.
#[derive(Serialize)]
struct CompileReport<'a> {
    task: &'a str,
    cmdline: String,
    argv: Vec<String>,
    redirect: Option<&'a str>,
    command: &'a CompiledCommand,
}

fn cmd_compile(config_path: &Path, task_file: &Path, json: bool) -> Result<i32> {
    let config = load_config(config_path)?;
    let registry = Registry::builtin().context("build task registry")?;
    let outcome = compile_path(task_file, &config, &registry, HostFilesystem)?;
    if json {
        let report = CompileReport {
            task: &outcome.task,
            cmdline: outcome.command.cmdline(),
            argv: outcome.command.argv(),
            redirect: outcome.command.redirect_target(),
            command: &outcome.command,
        };
        let payload = serde_json::to_string_pretty(&report).context("serialize json")?;
        println!("{payload}");
    } else {
        println!("{}", outcome.command.cmdline());
    }
    Ok(exit_codes::OK)
}

fn cmd_run(config_path: &Path, task_file: &Path) -> Result<i32> {
    let config = load_config(config_path)?;
    let registry = Registry::builtin().context("build task registry")?;
    let task = TaskFile::load(task_file)?;
    let invoker = ProcessInvoker::new(config.output_limit_bytes);
    match run_task(&task, &config, &registry, HostFilesystem, &invoker) {
        Ok(outcome) => {
            forward_output(&outcome.output)?;
            if let Some(log_path) = &outcome.output.log_path {
                eprintln!("output written to {}", log_path.display());
            }
            Ok(exit_codes::OK)
        }
        Err(err) => match err.downcast_ref::<InvokeError>() {
            Some(InvokeError::ExecutionFailed {
                exit_code,
                stdout,
                stderr,
            }) => {
                write_streams(stdout, stderr)?;
                match exit_code {
                    Some(code) => eprintln!("container command exited with code {code}"),
                    None => eprintln!("container command terminated by signal"),
                }
                Ok(exit_codes::EXECUTION_FAILED)
            }
            _ => Err(err),
        },
    }
}

fn forward_output(output: &InvocationOutput) -> Result<()> {
    write_streams(&output.stdout, &output.stderr)?;
    if output.stdout_truncated > 0 {
        eprintln!("[stdout truncated {} bytes]", output.stdout_truncated);
    }
    if output.stderr_truncated > 0 {
        eprintln!("[stderr truncated {} bytes]", output.stderr_truncated);
    }
    Ok(())
}

fn write_streams(stdout: &[u8], stderr: &[u8]) -> Result<()> {
    std::io::stdout()
        .write_all(stdout)
        .context("forward stdout")?;
    std::io::stderr()
        .write_all(stderr)
        .context("forward stderr")?;
    Ok(())
}
