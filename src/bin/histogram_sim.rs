use anyhow::{bail, Context, Result};
use grid_localization_core::{Localization, SimulationConfig};
use std::collections::HashMap;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Default)]
struct Args {
    config_path: Option<String>,
    steps: Option<usize>,
    seed: Option<u64>,
    overrides: HashMap<String, f64>,
}

fn print_usage() {
    println!("histogram_sim - grid localization with a histogram filter");
    println!();
    println!("USAGE:");
    println!("    histogram_sim [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    -c, --config <FILE>     Configuration file (default: configs/simulation.toml)");
    println!("    -n, --steps <N>         Number of sense/move steps");
    println!("    -s, --seed <SEED>       Random seed");
    println!("        --blur <BLUR>       Motion blur factor");
    println!("        --p-hit <P_HIT>     Sensor hit weight");
    println!("    -h, --help              Print this help");
}

fn parse_value<T>(flag: &str, raw: Option<&String>) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw = raw.with_context(|| format!("{} needs a value", flag))?;
    raw.parse()
        .with_context(|| format!("invalid value for {}: {}", flag, raw))
}

fn parse_args(argv: &[String]) -> Result<Option<Args>> {
    let mut args = Args::default();
    let mut iter = argv.iter();

    while let Some(flag) = iter.next() {
        match flag.as_str() {
            "-h" | "--help" => return Ok(None),
            "-c" | "--config" => {
                let path = iter.next().context("--config needs a file path")?;
                args.config_path = Some(path.clone());
            }
            // integers are parsed as such so large seeds stay exact
            "-n" | "--steps" => args.steps = Some(parse_value(flag, iter.next())?),
            "-s" | "--seed" => args.seed = Some(parse_value(flag, iter.next())?),
            "--blur" => {
                let blur = parse_value(flag, iter.next())?;
                args.overrides.insert("blur".to_string(), blur);
            }
            "--p-hit" => {
                let p_hit = parse_value(flag, iter.next())?;
                args.overrides.insert("p_hit".to_string(), p_hit);
            }
            other => bail!("unknown argument: {}", other),
        }
    }

    Ok(Some(args))
}

fn load_config(args: &Args) -> Result<SimulationConfig> {
    let mut config = match &args.config_path {
        Some(path) => {
            let config = SimulationConfig::load(Path::new(path))
                .with_context(|| format!("failed to load config {}", path))?;
            log::info!("Loaded config from {}", path);
            config
        }
        None => SimulationConfig::load_default()?,
    };
    config.configure(&args.overrides)?;
    if let Some(steps) = args.steps {
        config.steps = steps;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    Ok(config)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] {} - {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();

    let argv: Vec<String> = std::env::args().skip(1).collect();
    let Some(args) = parse_args(&argv)? else {
        print_usage();
        return Ok(());
    };
    let config = load_config(&args)?;

    let mut sim = config.build()?;
    log::info!(
        "Running {} steps on a {} world (blur={}, p_hit={}, seed={})",
        config.steps,
        sim.world().shape(),
        config.blur,
        config.p_hit,
        config.seed
    );
    log::info!("Start pose: {}", sim.true_pose());

    sim.run(config.steps)?;

    for row in sim.beliefs().to_rows() {
        let cells: Vec<String> = row.iter().map(|p| format!("{:.3}", p)).collect();
        println!("{}", cells.join(" "));
    }

    match sim.localization() {
        Localization::Correct(pose) => {
            println!("Localized at {} (true pose {})", pose, sim.true_pose())
        }
        Localization::Incorrect(pose) => println!(
            "Confident but wrong: believes {}, true pose {}",
            pose,
            sim.true_pose()
        ),
        Localization::Indeterminate(pose) => println!(
            "Not localized yet; best guess {}, true pose {}",
            pose,
            sim.true_pose()
        ),
        Localization::NoEstimate => println!("No belief mass left"),
    }

    Ok(())
}
