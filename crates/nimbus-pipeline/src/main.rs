use anyhow::Context;
use clap::{value_parser, Arg, Command};
use nimbus_pipeline::{Pipeline, PipelineConfig, Stage, State};
use nimbus_table::{Column, Dataset};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Command::new("nimbus")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Nimbus tabular transformation pipeline")
        .arg_required_else_help(true)
        .subcommand(
            Command::new("demo")
                .about("Run a synthetic dataset through the full pipeline")
                .arg(
                    Arg::new("pattern")
                        .long("pattern")
                        .default_value("trend")
                        .value_parser(["trend", "cyclic", "random"])
                        .help("Shape of the synthetic numeric column"),
                )
                .arg(
                    Arg::new("rows")
                        .long("rows")
                        .default_value("120")
                        .value_parser(value_parser!(usize))
                        .help("Number of rows to generate"),
                ),
        );

    let matches = cli.get_matches();

    match matches.subcommand() {
        Some(("demo", args)) => {
            let pattern = args
                .get_one::<String>("pattern")
                .map(String::as_str)
                .unwrap_or("trend");
            let rows = *args
                .get_one::<usize>("rows")
                .context("missing --rows value")?;
            run_demo(pattern, rows).await
        }
        _ => Ok(()),
    }
}

async fn run_demo(pattern: &str, rows: usize) -> anyhow::Result<()> {
    let pipeline = Pipeline::with_default_renderer(PipelineConfig::default());

    let dataset = synthetic_dataset(pattern, rows);
    let id = pipeline.submit(dataset);
    println!("session: {id}");

    let state = pipeline
        .run(id)
        .await
        .context("pipeline run did not start")?;
    println!("final state: {state}");

    let status = pipeline.status(id)?;
    if let Some(failure) = status.failure {
        println!("failed during {}: {}", failure.during, failure.error);
        std::process::exit(1);
    }

    if state == State::Completed {
        let summary = pipeline.summary(id)?;
        println!("summary:");
        println!("{}", serde_json::to_string_pretty(&summary)?);

        println!("artifacts:");
        for stage in Stage::ALL {
            let result = pipeline.get_stage(id, stage)?;
            let size = result.artifact.map_or(0, |a| a.len());
            println!(
                "  {:<6} {} series x {} rows, {} bytes",
                stage,
                result.matrix.width(),
                result.matrix.rows(),
                size
            );
        }
    }

    Ok(())
}

/// Build a small dataset with one column of the requested shape, one mixed
/// column, and a categorical tag column.
fn synthetic_dataset(pattern: &str, rows: usize) -> Dataset {
    let shaped: Vec<f64> = (0..rows).map(|i| sample(pattern, i)).collect();
    let ramp: Vec<f64> = (0..rows).map(|i| 2.0 + 0.25 * i as f64).collect();
    let tags: Vec<Option<String>> = (0..rows)
        .map(|i| Some(if i % 2 == 0 { "even" } else { "odd" }.to_string()))
        .collect();

    Dataset::new(vec![
        Column::numeric_dense("signal", shaped),
        Column::numeric_dense("baseline", ramp),
        Column::categorical("parity", tags),
    ])
}

fn sample(pattern: &str, i: usize) -> f64 {
    let x = i as f64;
    match pattern {
        "cyclic" => 10.0 * (x * std::f64::consts::TAU / 20.0).sin(),
        // Deterministic index hash so no trend or cycle survives.
        "random" => (scramble(i as u64) % 1000) as f64 / 100.0,
        _ => 0.5 * x + ((x * 78.233).sin() * 10_000.0).fract(),
    }
}

/// splitmix64 finalizer, used to generate reproducible noise.
fn scramble(i: u64) -> u64 {
    let mut z = i.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
