use clap::{Parser, Subcommand};
use serde_json::json;
use sm_app::{
    load_config, AppError, AppResult, DirectoryFileStore, InMemoryOperations, ProcessorConfig,
    SimulationProcessor,
};
use sm_fmu::{bouncing_ball, load_component_anonymous, BackendRegistry, Instance};
use sm_model::{load_environment, parse_properties, save_json, save_yaml};
use sm_sim::{run_steps_with_progress, RecordMode, RunOptions, StepInputs, StepProgress};
use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sm-cli")]
#[command(about = "Co-simulation components for twin models", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the variables of a component package
    Inspect {
        /// Path to the component package
        package: PathBuf,
    },
    /// Run a component package for a number of steps
    Run {
        /// Path to the component package
        package: PathBuf,
        /// Step size in seconds
        #[arg(long)]
        dt: f64,
        /// Number of steps
        #[arg(long)]
        steps: u32,
        /// Start time in seconds
        #[arg(long, default_value_t = 0.0)]
        t0: f64,
        /// key=value parameter file
        #[arg(long)]
        params: Option<PathBuf>,
        /// Only print the outputs after the last step
        #[arg(long)]
        final_only: bool,
    },
    /// Register simulation operations for every simulation-models submodel
    Process {
        /// Path to the twin model (YAML or JSON)
        model: PathBuf,
        /// Directory that model file paths are resolved against
        #[arg(long)]
        files: PathBuf,
        /// Processor configuration file
        #[arg(long)]
        config: Option<PathBuf>,
        /// Write the extended model here
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Write the bundled bouncing-ball package
    ExportBall {
        /// Output package path
        output: PathBuf,
    },
}

fn main() -> AppResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Inspect { package } => cmd_inspect(&package),
        Commands::Run {
            package,
            dt,
            steps,
            t0,
            params,
            final_only,
        } => {
            let record = if final_only {
                RecordMode::FinalOnly
            } else {
                RecordMode::EveryStep
            };
            let opts = RunOptions {
                start_time: t0,
                step_size: dt,
                step_count: steps,
                record,
            };
            cmd_run(&package, &opts, params.as_deref())
        }
        Commands::Process {
            model,
            files,
            config,
            output,
        } => cmd_process(&model, &files, config.as_deref(), output.as_deref()),
        Commands::ExportBall { output } => cmd_export_ball(&output),
    }
}

fn read_file(path: &Path) -> AppResult<Vec<u8>> {
    std::fs::read(path).map_err(|source| AppError::FileRead {
        path: path.to_path_buf(),
        source,
    })
}

fn cmd_inspect(package: &Path) -> AppResult<()> {
    let bytes = read_file(package)?;
    let descriptor = load_component_anonymous(&bytes, &BackendRegistry::with_builtin())?;
    let description = descriptor.description();

    println!(
        "{} (FMI {}, identifier {})",
        description.model_name, description.fmi_version, description.model_identifier
    );
    println!("  digest: {}", descriptor.digest());
    if let Some(experiment) = &description.default_experiment {
        println!(
            "  default experiment: start={:?} stop={:?} step={:?}",
            experiment.start_time, experiment.stop_time, experiment.step_size
        );
    }
    println!("Variables:");
    for variable in description.variables() {
        println!(
            "  [{:>3}] {:<12} {:<9} {:<8} {:<9?} start={}",
            variable.value_reference,
            variable.name,
            variable.causality,
            variable.native_type,
            variable.variability,
            variable.start.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}

fn cmd_run(package: &Path, opts: &RunOptions, params: Option<&Path>) -> AppResult<()> {
    let bytes = read_file(package)?;
    let descriptor = Arc::new(load_component_anonymous(
        &bytes,
        &BackendRegistry::with_builtin(),
    )?);
    let parameters = match params {
        Some(path) => parse_properties(&String::from_utf8_lossy(&read_file(path)?)),
        None => BTreeMap::new(),
    };

    let governor = ProcessorConfig::default().governor();
    let name = descriptor.name().to_string();
    let mut instance = Instance::create(&name, descriptor, &parameters, governor)?;

    let mut last_emit = Instant::now();
    let result = run_steps_with_progress(
        &mut instance,
        opts,
        &StepInputs::new(),
        Some(&mut |event| {
            if event.step == event.step_count || last_emit.elapsed().as_millis() >= 100 {
                render_progress(&event);
                last_emit = Instant::now();
            }
        }),
    );
    instance.destroy();
    eprintln!();
    let record = result?;

    let steps: Vec<_> = record
        .steps
        .iter()
        .map(|s| json!({ "step": s.step, "values": s.values }))
        .collect();
    let report = json!({ "end_time": record.end_time, "steps": steps });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn render_progress(event: &StepProgress) {
    let width = 28usize;
    let filled = ((event.fraction_complete * width as f64).round() as usize).min(width);
    eprint!(
        "\r[{}{}] {:>6.2}%  t={:.4}s  step={}/{}",
        "#".repeat(filled),
        "-".repeat(width.saturating_sub(filled)),
        event.fraction_complete * 100.0,
        event.sim_time,
        event.step,
        event.step_count
    );
    let _ = io::stderr().flush();
}

fn cmd_process(
    model: &Path,
    files: &Path,
    config: Option<&Path>,
    output: Option<&Path>,
) -> AppResult<()> {
    let config = match config {
        Some(path) => load_config(path)?,
        None => ProcessorConfig::default(),
    };
    let mut environment = load_environment(model)?;
    let operations = Arc::new(InMemoryOperations::new());
    let processor = SimulationProcessor::new(
        config,
        BackendRegistry::with_builtin(),
        Arc::new(DirectoryFileStore::new(files)),
        operations.clone(),
    );

    let mut modified = false;
    for submodel in &mut environment.submodels {
        if processor.accept(submodel) {
            println!("Processing submodel: {}", submodel.id);
            modified |= processor.process(submodel);
        }
    }

    let references = operations.references();
    if references.is_empty() {
        println!("No operations registered");
    } else {
        println!("Registered operations:");
        for reference in references {
            println!("  {reference}");
        }
    }

    if let Some(path) = output {
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            save_json(path, &environment)?;
        } else {
            save_yaml(path, &environment)?;
        }
        println!(
            "✓ Model written to {} ({})",
            path.display(),
            if modified { "extended" } else { "unchanged" }
        );
    }
    Ok(())
}

fn cmd_export_ball(output: &Path) -> AppResult<()> {
    let bytes = bouncing_ball::package()?;
    std::fs::write(output, bytes).map_err(|source| AppError::FileWrite {
        path: output.to_path_buf(),
        source,
    })?;
    println!("✓ Wrote {}", output.display());
    Ok(())
}
