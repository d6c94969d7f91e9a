use clap::{Parser, Subcommand};
use eq_app::{AppResult, RunOptions, RunProgressEvent, RunRequest, RunResponse, RunStage};
use eq_solver::ActivityModelKind;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "eq-cli")]
#[command(about = "Aqueous equilibrium and equilibrium path calculations", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate scenario file syntax and structure
    Validate {
        /// Path to the scenario file (YAML or JSON)
        scenario_path: PathBuf,
    },
    /// List the species of a scenario's chemical system
    Species {
        /// Path to the scenario file (YAML or JSON)
        scenario_path: PathBuf,
        /// Also list the property queries usable in plots and outputs
        #[arg(long)]
        queries: bool,
    },
    /// Solve a single equilibrium problem
    Equilibrate {
        /// Path to the scenario file (YAML or JSON)
        scenario_path: PathBuf,
        /// Problem ID to solve
        problem_id: String,
        /// Activity model replacing the scenario's (davies, ideal)
        #[arg(long)]
        activity_model: Option<ActivityModelKind>,
    },
    /// Trace the equilibrium path of a scenario
    Run {
        /// Path to the scenario file (YAML or JSON)
        scenario_path: PathBuf,
        /// Directory receiving every output and plot file
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
        /// Activity model replacing the scenario's (davies, ideal)
        #[arg(long)]
        activity_model: Option<ActivityModelKind>,
    },
    /// Run the built-in CO2 titration demo
    Demo {
        /// Output table file
        #[arg(short, long, default_value = "result.txt")]
        output: PathBuf,
    },
}

fn main() -> AppResult<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { scenario_path } => cmd_validate(&scenario_path),
        Commands::Species {
            scenario_path,
            queries,
        } => cmd_species(&scenario_path, queries),
        Commands::Equilibrate {
            scenario_path,
            problem_id,
            activity_model,
        } => cmd_equilibrate(&scenario_path, &problem_id, activity_model),
        Commands::Run {
            scenario_path,
            output_dir,
            activity_model,
        } => cmd_run(
            &scenario_path,
            RunOptions {
                output_dir,
                activity_model,
            },
        ),
        Commands::Demo { output } => cmd_demo(&output),
    }
}

fn cmd_validate(scenario_path: &Path) -> AppResult<()> {
    println!("Validating scenario: {}", scenario_path.display());
    let scenario = eq_app::load_scenario(scenario_path)?;
    eq_app::validate_scenario(&scenario)?;
    println!("✓ Scenario '{}' is valid", scenario.name);

    for problem in eq_app::list_problems(&scenario) {
        println!(
            "  {} - {} substances{}{}",
            problem.id,
            problem.substance_count,
            problem
                .temperature
                .map(|t| format!(" at {}", t))
                .unwrap_or_default(),
            if problem.is_path_endpoint {
                " (path endpoint)"
            } else {
                ""
            }
        );
    }
    Ok(())
}

fn cmd_species(scenario_path: &Path, queries: bool) -> AppResult<()> {
    let species = eq_app::list_species(scenario_path)?;
    println!("Species ({}):", species.len());
    for s in species {
        println!(
            "  {:<14} {:<12} z={:>+2}  {}",
            s.name,
            s.formula,
            s.charge,
            if s.is_master {
                "master".to_string()
            } else {
                format!("log_k={:.3}", s.log_k)
            }
        );
    }

    if queries {
        println!("Queries:");
        for (usage, description) in eq_app::list_queries() {
            println!("  {:<38} {}", usage, description);
        }
    }
    Ok(())
}

fn cmd_equilibrate(
    scenario_path: &Path,
    problem_id: &str,
    activity_model: Option<ActivityModelKind>,
) -> AppResult<()> {
    let options = RunOptions {
        output_dir: None,
        activity_model,
    };
    let summary = eq_app::equilibrate(scenario_path, problem_id, &options)?;

    println!(
        "✓ Problem '{}' converged in {} iterations",
        summary.problem_id, summary.iterations
    );
    println!(
        "  T = {:.2} °C, P = {:.3} bar",
        summary.temperature_c, summary.pressure_bar
    );
    if let Some(ph) = summary.ph {
        println!("  pH = {:.4}", ph);
    }
    println!("  Ionic strength = {:.4e} molal", summary.ionic_strength);
    println!("  Water = {:.6} kg", summary.solvent_mass_kg);
    println!(
        "  {:<14} {:>14} {:>14} {:>10}",
        "species", "amount [mol]", "molality", "gamma"
    );
    for row in &summary.species {
        println!(
            "  {:<14} {:>14.6e} {:>14.6e} {:>10.4}",
            row.name, row.amount_mol, row.molality, row.activity_coefficient
        );
    }
    Ok(())
}

fn cmd_run(scenario_path: &Path, options: RunOptions) -> AppResult<()> {
    println!("Tracing equilibrium path: {}", scenario_path.display());

    let request = RunRequest {
        scenario_path,
        options,
    };

    let mut last_emit = Instant::now();
    let response = eq_app::run_with_progress(
        &request,
        Some(&mut |event| throttled_progress(&event, &mut last_emit)),
    )?;
    clear_progress_line();

    print_run_summary(&response);
    Ok(())
}

fn cmd_demo(output: &Path) -> AppResult<()> {
    println!("Running CO2 titration demo");

    let mut last_emit = Instant::now();
    let response = eq_app::run_demo(
        output,
        Some(&mut |event| throttled_progress(&event, &mut last_emit)),
    )?;
    clear_progress_line();

    print_run_summary(&response);
    Ok(())
}

fn throttled_progress(event: &RunProgressEvent, last_emit: &mut Instant) {
    let stage_change = event.path.is_none();
    if stage_change || last_emit.elapsed().as_millis() >= 100 {
        render_cli_progress(event);
        *last_emit = Instant::now();
    }
}

fn print_run_summary(response: &RunResponse) {
    println!("✓ Path traced: {}", response.scenario);
    println!(
        "  Steps: {} accepted, {} rejected, {} Newton iterations",
        response.steps, response.rejected_steps, response.total_iterations
    );
    if let (Some(first), Some(last)) = (response.initial_ph, response.final_ph) {
        println!("  pH: {:.3} -> {:.3}", first, last);
    }
    for file in &response.files {
        println!("  Wrote {}", file.display());
    }
    println!("  Elapsed: {:.3} s", response.elapsed_s);
}

fn clear_progress_line() {
    print!("\r{}\r", " ".repeat(100));
    let _ = io::stdout().flush();
}

fn render_cli_progress(event: &RunProgressEvent) {
    match (event.stage, &event.path) {
        (RunStage::TracingPath, Some(p)) => {
            let width = 28usize;
            let filled = ((p.t * width as f64).round() as usize).min(width);
            let bar = format!(
                "{}{}",
                "#".repeat(filled),
                "-".repeat(width.saturating_sub(filled))
            );
            print!(
                "\r[{}] {:>6.2}%  t={:.4}  step={}  rejected={}  elapsed={:.1}s",
                bar,
                p.t * 100.0,
                p.t,
                p.step,
                p.rejected,
                event.elapsed_wall_s
            );
        }
        _ => {
            print!(
                "\r{}  elapsed={:.2}s{}",
                event.stage.label(),
                event.elapsed_wall_s,
                " ".repeat(40)
            );
        }
    }
    let _ = io::stdout().flush();
}
