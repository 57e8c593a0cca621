//! SE-026: CLI subcommands: init, validate, exec, operations, version, editor, run.

use crate::core::config::{self, HostConfig, CONFIG_FILE, DEFAULT_ENGINE_PATH};
use crate::core::orchestrator::Orchestrator;
use crate::core::types::{Operation, OperationRequest, OperationResult};
use clap::Subcommand;
use std::path::{Path, PathBuf};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a default scenectl.yaml
    Init {
        /// Directory to initialize (default: current)
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Validate scenectl.yaml
    Validate {
        /// Path to scenectl.yaml
        #[arg(short, long, default_value = CONFIG_FILE)]
        config: PathBuf,
    },

    /// Run one operation against a project
    Exec {
        /// Project directory (contains project.godot)
        #[arg(short, long, default_value = ".")]
        project: PathBuf,

        /// Operation name, e.g. create_scene
        operation: String,

        /// Parameters as a JSON object (default: {})
        params: Option<String>,

        /// Path to scenectl.yaml
        #[arg(short, long, default_value = CONFIG_FILE)]
        config: PathBuf,
    },

    /// List supported operations and their required parameters
    Operations,

    /// Print the engine version
    Version {
        /// Path to scenectl.yaml
        #[arg(short, long, default_value = CONFIG_FILE)]
        config: PathBuf,
    },

    /// Open the project in the editor
    Editor {
        /// Project directory
        #[arg(short, long, default_value = ".")]
        project: PathBuf,

        /// Path to scenectl.yaml
        #[arg(short, long, default_value = CONFIG_FILE)]
        config: PathBuf,
    },

    /// Run the project, optionally from a specific scene
    Run {
        /// Project directory
        #[arg(short, long, default_value = ".")]
        project: PathBuf,

        /// Scene to start from (res:// path)
        #[arg(short, long)]
        scene: Option<String>,

        /// Path to scenectl.yaml
        #[arg(short, long, default_value = CONFIG_FILE)]
        config: PathBuf,
    },
}

pub fn dispatch(cmd: Commands) -> Result<(), String> {
    match cmd {
        Commands::Init { path } => cmd_init(&path),
        Commands::Validate { config } => cmd_validate(&config),
        Commands::Exec {
            project,
            operation,
            params,
            config,
        } => cmd_exec(&config, &project, &operation, params.as_deref()),
        Commands::Operations => {
            cmd_operations();
            Ok(())
        }
        Commands::Version { config } => cmd_version(&config),
        Commands::Editor { project, config } => {
            let orchestrator = orchestrator(&config)?;
            report(orchestrator.launch_editor(&project))
        }
        Commands::Run {
            project,
            scene,
            config,
        } => {
            let orchestrator = orchestrator(&config)?;
            report(orchestrator.run_project(&project, scene.as_deref()))
        }
    }
}

/// Prefer an engine binary installed next to this executable when the
/// configured path is the bare default.
fn resolve_engine_path(config: &mut HostConfig) {
    if config.engine_path != DEFAULT_ENGINE_PATH {
        return;
    }
    let sibling = std::env::current_exe().ok().and_then(|exe| {
        let candidate = exe.with_file_name(DEFAULT_ENGINE_PATH);
        candidate.is_file().then_some(candidate)
    });
    if let Some(path) = sibling {
        config.engine_path = path.display().to_string();
    }
}

fn load_config(path: &Path) -> Result<HostConfig, String> {
    let mut config = config::load(path)?;
    let errors = config::validate_config(&config);
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("  ERROR: {}", e);
        }
        return Err(format!("{} validation error(s) in {}", errors.len(), path.display()));
    }
    resolve_engine_path(&mut config);
    Ok(config)
}

fn orchestrator(config_path: &Path) -> Result<Orchestrator, String> {
    load_config(config_path).map(Orchestrator::new)
}

fn runtime() -> Result<tokio::runtime::Runtime, String> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("failed to start runtime: {}", e))
}

/// Print the result as JSON; a failed result becomes the command's error.
fn report(result: OperationResult) -> Result<(), String> {
    let text = serde_json::to_string_pretty(&result.to_json())
        .map_err(|e| format!("failed to render result: {}", e))?;
    println!("{}", text);
    if result.success {
        Ok(())
    } else {
        Err(format!(
            "{} error: {}",
            result.error_kind.map(|k| k.to_string()).unwrap_or_default(),
            result.error.unwrap_or_default()
        ))
    }
}

fn cmd_init(path: &Path) -> Result<(), String> {
    let config_path = path.join(CONFIG_FILE);
    if config_path.exists() {
        return Err(format!("{} already exists", config_path.display()));
    }
    let yaml = serde_yaml_ng::to_string(&HostConfig::default())
        .map_err(|e| format!("failed to render config: {}", e))?;
    std::fs::write(&config_path, yaml)
        .map_err(|e| format!("cannot write {}: {}", config_path.display(), e))?;
    println!("Initialized {}", config_path.display());
    Ok(())
}

fn cmd_validate(file: &Path) -> Result<(), String> {
    let config = config::parse_config_file(file)?;
    let errors = config::validate_config(&config);

    if errors.is_empty() {
        println!(
            "OK: engine {} (timeout {}s, {} extra args)",
            config.engine_path,
            config.timeout_secs,
            config.extra_args.len()
        );
        Ok(())
    } else {
        for e in &errors {
            eprintln!("  ERROR: {}", e);
        }
        Err(format!("{} validation error(s)", errors.len()))
    }
}

fn cmd_exec(config: &Path, project: &Path, operation: &str, params: Option<&str>) -> Result<(), String> {
    let request = OperationRequest::from_args(Some(operation), params).map_err(|e| e.to_string())?;
    let orchestrator = orchestrator(config)?;
    let result = runtime()?.block_on(orchestrator.execute_request(project, &request));
    report(result)
}

fn cmd_operations() {
    for op in Operation::ALL {
        let required = op.required_params();
        let marker = if op.is_mutating() { "*" } else { " " };
        if required.is_empty() {
            println!("{} {}", marker, op);
        } else {
            println!("{} {} ({})", marker, op, required.join(", "));
        }
    }
    println!();
    println!("* writes to the project");
}

fn cmd_version(config: &Path) -> Result<(), String> {
    let orchestrator = orchestrator(config)?;
    let result = runtime()?.block_on(orchestrator.engine_version());
    match result.get("version").and_then(|v| v.as_str()) {
        Some(version) => {
            println!("{}", version);
            Ok(())
        }
        None => report(result),
    }
}
