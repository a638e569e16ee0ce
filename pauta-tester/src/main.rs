mod logic;
mod scenario;
mod util;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;
use std::time::Instant;

use logic::{AdvisorKind, LogicTester, Simulator, resolve_seed_inputs};
use scenario::{get_scenario, list_scenarios};
use util::split_csv;

#[derive(Debug, Parser)]
#[command(name = "pauta-tester", version = "0.1.0")]
#[command(about = "Automated logic QA for Brasil em Pauta - scripted full games with invariant checks")]
struct Args {
    /// Scenarios to run (comma-separated, or `all`)
    #[arg(long, default_value = "smoke")]
    scenarios: String,

    /// List all available scenarios and exit
    #[arg(long)]
    list_scenarios: bool,

    /// Seeds to run (comma-separated integers or game codes)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Number of iterations per scenario and seed
    #[arg(long, default_value_t = 10)]
    iterations: usize,

    /// Players seated at each table, unless a scenario fixes its own
    #[arg(long, default_value_t = 4)]
    players: usize,

    /// Win-condition advisor behind every table
    #[arg(long, value_enum, default_value_t = AdvisorKind::Local)]
    advisor: AdvisorKind,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["json", "markdown", "console"])]
    report: String,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if maybe_list_scenarios(&args)? {
        return Ok(());
    }

    announce_banner();

    let start_time = Instant::now();
    let scenarios = expand_scenarios(&args.scenarios);
    let seed_tokens = split_csv(&args.seeds);
    let seed_infos = resolve_seed_inputs(&seed_tokens)?;
    let seeds: Vec<u64> = seed_infos.iter().map(|s| s.seed).collect();
    for info in &seed_infos {
        if let Some(code) = &info.code {
            log::info!("seed {} taken from game code {code}", info.seed);
        }
    }

    let simulator = Simulator::try_new(args.advisor, args.players)?;
    let tester = LogicTester::new(simulator, args.verbose);
    let results = run_logic_scenarios(&args, &scenarios, &seeds, &tester).await;

    write_reports(&args, &results, start_time)?;

    if results.iter().any(|r| !r.passed) {
        std::process::exit(1);
    }

    Ok(())
}

fn maybe_list_scenarios(args: &Args) -> Result<bool> {
    if !args.list_scenarios {
        return Ok(false);
    }
    let mut output_target = OutputTarget::new(args.output.clone())?;
    writeln!(output_target.writer(), "Available scenarios:")?;
    for (key, description) in list_scenarios() {
        writeln!(output_target.writer(), "  {key:25} - {description}")?;
    }
    output_target.flush_inner()?;
    Ok(true)
}

fn announce_banner() {
    println!("{}", "🎮 Brasil em Pauta Automated Tester".bright_cyan().bold());
    println!("{}", "====================================".cyan());
}

fn expand_scenarios(scenarios_arg: &str) -> Vec<String> {
    let mut scenarios = split_csv(scenarios_arg);
    if scenarios.iter().any(|s| s.eq_ignore_ascii_case("all")) {
        scenarios.retain(|s| !s.eq_ignore_ascii_case("all"));
        for (key, _) in list_scenarios() {
            if !scenarios.iter().any(|s| s == key) {
                scenarios.push(key.to_string());
            }
        }
    }
    scenarios
}

async fn run_logic_scenarios(
    args: &Args,
    scenarios: &[String],
    seeds: &[u64],
    tester: &LogicTester,
) -> Vec<logic::ScenarioResult> {
    let mut results: Vec<logic::ScenarioResult> = Vec::new();

    println!(
        "{} {}",
        "🧠 Running Logic Tests".bright_yellow().bold(),
        format!("(advisor: {})", args.advisor).yellow()
    );
    println!("{}", "-".repeat(30).yellow());

    for scenario_name in scenarios {
        if let Some(scenario) = get_scenario(scenario_name) {
            let scenario_results = tester
                .run_scenario(&scenario, seeds, args.iterations)
                .await;
            results.extend(scenario_results);
        } else {
            eprintln!("⚠️  Unknown scenario: {}", scenario_name.yellow());
        }
    }

    results
}

fn write_reports(
    args: &Args,
    results: &[logic::ScenarioResult],
    start_time: Instant,
) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;

    match args.report.as_str() {
        "json" => {
            if results.is_empty() {
                writeln!(&mut output_target, "[]")?;
            } else {
                logic::reports::generate_json_report(&mut output_target, results)?;
            }
        }
        "markdown" => {
            if results.is_empty() {
                writeln!(
                    &mut output_target,
                    "# Brasil em Pauta Logic Test Results\n\n_No scenarios executed._"
                )?;
            } else {
                logic::reports::generate_markdown_report(&mut output_target, results)?;
            }
        }
        _ => {
            let duration = start_time.elapsed();
            if results.is_empty() {
                writeln!(&mut output_target, "No logic scenarios executed.")?;
            } else {
                logic::reports::generate_console_report(&mut output_target, results, duration)?;
            }
            writeln!(&mut output_target)?;
            writeln!(&mut output_target, "🏁 Total time: {duration:?}")?;
        }
    }

    output_target.flush_inner()?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn base_args() -> Args {
        Args {
            scenarios: "smoke".to_string(),
            list_scenarios: false,
            seeds: "1337".to_string(),
            iterations: 1,
            players: 4,
            advisor: AdvisorKind::Local,
            report: "json".to_string(),
            verbose: false,
            output: None,
        }
    }

    fn temp_path(label: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "pauta-main-{label}-{}",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        ))
    }

    fn sample_result() -> logic::ScenarioResult {
        logic::ScenarioResult {
            scenario_name: "Smoke Test".to_string(),
            seed: 1337,
            advisor: "local".to_string(),
            passed: true,
            iterations_run: 1,
            successful_iterations: 1,
            failures: Vec::new(),
            average_duration: Duration::from_millis(2),
            performance_data: vec![Duration::from_millis(2)],
        }
    }

    #[test]
    fn all_expands_to_every_scenario_once() {
        let scenarios = expand_scenarios("smoke,all");
        assert_eq!(scenarios.len(), list_scenarios().len());
        assert_eq!(scenarios[0], "smoke");
        assert!(scenarios.iter().any(|s| s == "concurrency"));
    }

    #[test]
    fn list_scenarios_writes_to_file() {
        let path = temp_path("list");
        let args = Args {
            list_scenarios: true,
            output: Some(path.clone()),
            ..base_args()
        };
        assert!(maybe_list_scenarios(&args).unwrap());
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("Available scenarios:"));
        assert!(content.contains("boss-gate"));
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn reports_write_each_format() {
        for (format, marker) in [
            ("json", "\"scenario_name\""),
            ("markdown", "## Detailed Results"),
            ("console", "Total time"),
        ] {
            let path = temp_path(format);
            let args = Args {
                report: format.to_string(),
                output: Some(path.clone()),
                ..base_args()
            };
            write_reports(&args, &[sample_result()], Instant::now()).unwrap();
            let content = std::fs::read_to_string(&path).unwrap();
            assert!(content.contains(marker), "{format}: {content}");
            let _ = std::fs::remove_file(path);
        }
    }

    #[test]
    fn empty_json_report_is_an_empty_array() {
        let path = temp_path("empty");
        let args = Args {
            output: Some(path.clone()),
            ..base_args()
        };
        write_reports(&args, &[], Instant::now()).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap().trim(), "[]");
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn args_parse_advisor_and_players() {
        let args = Args::try_parse_from([
            "pauta-tester",
            "--advisor",
            "flaky",
            "--players",
            "2",
            "--report",
            "markdown",
        ])
        .unwrap();
        assert_eq!(args.advisor, AdvisorKind::Flaky);
        assert_eq!(args.players, 2);
        assert!(Args::try_parse_from(["pauta-tester", "--report", "csv"]).is_err());
    }
}
