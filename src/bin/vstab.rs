use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use vstab::plot::write_plot;
use vstab::report::print_report;
use vstab::{lookup, Alg, Metric, PfOpt, Session, Solver, Sweep, SweepOpt, NETWORKS};

/// Voltage stability indices along a load sweep.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sweep the load of a reference network until collapse
    Run(RunArgs),

    /// List the reference networks
    List,
}

#[derive(Args)]
struct RunArgs {
    /// Network name (twobus, ieee123, star) or "all"
    #[arg(required = true)]
    network: String,

    /// Number of load multipliers sampled.
    #[arg(short = 'n', long, default_value_t = 200)]
    points: usize,

    /// First load multiplier.
    #[arg(long, default_value_t = 1.0)]
    lam_min: f64,

    /// Last load multiplier [default: the network's known maximum].
    #[arg(long)]
    lam_max: Option<f64>,

    /// Metrics to evaluate [default: all].
    #[arg(long, value_delimiter = ',')]
    metrics: Vec<Metric>,

    /// AC power flow algorithm.
    #[arg(long)]
    alg: Option<Alg>,

    /// Termination tolerance on per unit P & Q mismatch.
    #[arg(long)]
    tol: Option<f64>,

    /// Maximum number of iterations.
    #[arg(long)]
    max_it: Option<usize>,

    /// Bisection steps after the first non-converged multiplier.
    #[arg(long, default_value_t = 0)]
    refine: usize,

    /// Directory containing <network>.toml files.
    #[arg(long, default_value = "networks")]
    networks_dir: PathBuf,

    /// Directory the plots are written to.
    #[arg(short, long, default_value = ".")]
    out_dir: PathBuf,

    /// Do not write plots.
    #[arg(long, default_value_t = false)]
    no_plot: bool,
}

fn main() {
    env_logger::Builder::from_default_env()
        .format_level(false)
        .format_target(false)
        .format_timestamp(None)
        .init();

    let cli = Cli::parse();

    match execute(&cli) {
        Ok(_) => {
            std::process::exit(0);
        }
        Err(err) => {
            eprintln!("error: {:#}", err);
            std::process::exit(2);
        }
    }
}

fn execute(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::List => {
            for n in NETWORKS.iter() {
                println!(
                    "{:<8} {:<26} max load multiplier {}",
                    n.name, n.description, n.max_load_multiplier
                );
            }
            Ok(())
        }
        Commands::Run(args) => run(args),
    }
}

fn pf_opt(args: &RunArgs) -> PfOpt {
    let mut opt = PfOpt::default();
    if let Some(alg) = args.alg {
        opt.algorithm = alg;
    }
    if let Some(tol) = args.tol {
        opt.tolerance = tol;
    }
    if let Some(max_it) = args.max_it {
        match opt.algorithm {
            Alg::NR => {
                opt.max_it_nr = max_it;
            }
            Alg::SUM => {
                opt.max_it_sum = max_it;
            }
        }
    }
    opt
}

fn run(args: &RunArgs) -> Result<()> {
    let networks = lookup(&args.network)?;
    let sweep_opt = SweepOpt {
        points: args.points,
        lam_min: args.lam_min,
        lam_max: args.lam_max,
        refine: args.refine,
        metrics: if args.metrics.is_empty() {
            Metric::ALL.to_vec()
        } else {
            args.metrics.clone()
        },
    };
    let solver = Solver::new(pf_opt(args));

    // validate everything before the first sweep starts
    let mut jobs = Vec::with_capacity(networks.len());
    for known in networks {
        let multipliers = sweep_opt.multipliers(known.max_load_multiplier)?;
        let net = known
            .load(&args.networks_dir)
            .with_context(|| format!("loading network '{}'", known.name))?;
        let session = Session::new(net).with_context(|| format!("network '{}'", known.name))?;
        jobs.push((known, session, multipliers));
    }

    for (known, session, multipliers) in jobs {
        let mut sweep = Sweep::new(
            &session,
            &solver,
            multipliers,
            &sweep_opt.metrics,
            sweep_opt.refine,
        )?;
        let outcome = sweep
            .run()
            .with_context(|| format!("sweep of '{}' aborted", known.name))?;

        print_report(known, &session, &outcome)?;
        if !args.no_plot {
            write_plot(&args.out_dir, known, &outcome, session.case().nl())?;
        }
        println!();
    }
    Ok(())
}
