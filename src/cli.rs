use crate::args::{Args, Command};

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Subcommand)]
enum SubCommands {
    #[command(about = "Search profiles against target sequences, using alignment seeds")]
    Align {
        /// Profile file
        #[arg(value_name = "PROFILES.json")]
        profiles: String,
        /// Target file
        #[arg(value_name = "TARGETS.fasta")]
        targets: String,
        /// Alignment seeds from an upstream filter
        #[arg(value_name = "SEEDS.json")]
        seeds: String,
        /// Only report hits with an E-value below this value
        #[arg(short = 'E', default_value_t = 10.0)]
        evalue_cutoff: f64,
        /// Where to place the results
        #[arg(short, long, default_value = "results.tsv")]
        output_file: String,
        /// The number of threads to use
        #[arg(short, long, default_value_t = 1usize, value_name = "n")]
        threads: usize,
        /// Cloud pruning: per-antidiagonal drop below the running maximum
        #[arg(long, default_value_t = 12.0)]
        alpha: f32,
        /// Cloud pruning: drop below the running maximum that ends a sweep
        #[arg(long, default_value_t = 20.0)]
        beta: f32,
        /// Cloud pruning: antidiagonals computed before pruning starts
        #[arg(long, default_value_t = 5usize)]
        gamma: usize,
        /// Domain definition: occupancy that opens a region
        #[arg(long, default_value_t = 0.25)]
        rt1: f32,
        /// Domain definition: occupancy that closes a region
        #[arg(long, default_value_t = 0.10)]
        rt2: f32,
    },
}

#[derive(Debug, Parser)]
#[command(name = "cloudseqs")]
#[command(
    about = "Using alignment seeds from a fast filter, perform bounded profile HMM sequence alignment"
)]
pub struct Cli {
    #[command(subcommand)]
    command: SubCommands,
}

impl Cli {
    pub fn args(self) -> anyhow::Result<Args> {
        let mut args = Args::default();
        match self.command {
            SubCommands::Align {
                profiles,
                targets,
                seeds,
                evalue_cutoff,
                output_file,
                threads,
                alpha,
                beta,
                gamma,
                rt1,
                rt2,
            } => {
                args.command = Command::Align;

                args.paths.profiles = PathBuf::from(profiles);
                args.paths.targets = PathBuf::from(targets);
                args.paths.seeds = PathBuf::from(seeds);
                args.paths.results = PathBuf::from(output_file);

                args.threads = threads;
                args.evalue_cutoff = evalue_cutoff;
                args.alpha = alpha;
                args.beta = beta;
                args.gamma = gamma;
                args.rt1 = rt1;
                args.rt2 = rt2;
            }
        }
        Ok(args)
    }
}
