use crate::args::Args;

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Write};
use std::sync::Mutex;

use anyhow::Context;
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use thread_local::ThreadLocal;

use cloudseqs::align::bounded::structs::{CloudSearchParams, DomainParams, Seed};
use cloudseqs::output::output_tabular::write_tabular_output;
use cloudseqs::output::path_buf_ext::PathBufExt;
use cloudseqs::search::{SearchOutcome, SearchParams, Worker};
use cloudseqs::structs::{Alignment, Profile, Sequence};

pub type SeedMap = HashMap<String, Vec<Seed>>;

fn read_profiles(args: &Args) -> anyhow::Result<Vec<Profile>> {
    let mut profiles_string = String::new();
    File::open(&args.paths.profiles)
        .context(format!(
            "failed to open profile file: {}",
            &args.paths.profiles.to_string_lossy(),
        ))?
        .read_to_string(&mut profiles_string)
        .context(format!(
            "failed to read profile file: {}",
            &args.paths.profiles.to_string_lossy(),
        ))?;
    serde_json::from_str(&profiles_string).context(format!(
        "failed to parse profile file: {}",
        &args.paths.profiles.to_string_lossy(),
    ))
}

fn read_seed_map(args: &Args) -> anyhow::Result<SeedMap> {
    let mut seeds_string = String::new();
    File::open(&args.paths.seeds)
        .context(format!(
            "failed to open alignment seeds file: {}",
            &args.paths.seeds.to_string_lossy(),
        ))?
        .read_to_string(&mut seeds_string)
        .context(format!(
            "failed to read alignment seeds file: {}",
            &args.paths.seeds.to_string_lossy(),
        ))?;
    serde_json::from_str(&seeds_string).context(format!(
        "failed to parse alignment seeds file: {}",
        &args.paths.seeds.to_string_lossy(),
    ))
}

fn search_params(args: &Args, target_count: usize) -> SearchParams {
    SearchParams {
        cloud: CloudSearchParams {
            alpha: args.alpha,
            beta: args.beta,
            gamma: args.gamma,
        },
        domain: DomainParams {
            rt1: args.rt1,
            rt2: args.rt2,
        },
        target_count,
    }
}

pub fn align(args: &Args) -> anyhow::Result<()> {
    {
        // quickly make sure we can write the results
        args.paths.results.open(true)?;
    }

    let profiles = read_profiles(args)?;
    let seed_map = read_seed_map(args)?;

    let targets = Sequence::amino_from_fasta(&args.paths.targets)?;
    let params = search_params(args, targets.len());

    let mut target_map: HashMap<String, Sequence> = HashMap::new();
    for target in targets {
        target_map.insert(target.name.clone(), target);
    }

    if args.threads > 1 {
        align_threaded(args, profiles, seed_map, &target_map, params)
    } else {
        align_serial(args, profiles, seed_map, &target_map, params)
    }
}

fn align_serial(
    args: &Args,
    profiles: Vec<Profile>,
    seed_map: SeedMap,
    target_map: &HashMap<String, Sequence>,
    params: SearchParams,
) -> anyhow::Result<()> {
    let mut profile_map: HashMap<String, Profile> = HashMap::new();
    for profile in profiles {
        profile_map.insert(profile.name.clone(), profile);
    }

    let mut worker = Worker::new();
    let mut alignments: Vec<Alignment> = vec![];

    let mut profile_names: Vec<&String> = seed_map.keys().collect();
    profile_names.sort();

    for profile_name in profile_names {
        let profile = profile_map
            .get_mut(profile_name)
            .context(format!("no profile named: {profile_name}"))?;
        let seeds = seed_map.get(profile_name).unwrap();
        for seed in seeds {
            let target = target_map
                .get(&seed.target_name)
                .context(format!("no target named: {}", seed.target_name))?;

            match worker.search(profile, target, seed, &params)? {
                SearchOutcome::Complete(result) => {
                    alignments.push(result.alignment);
                }
                SearchOutcome::EmptyCloud => {
                    // the fast filter's own report stands for this seed
                    println!(
                        "empty cloud: {} vs {}",
                        profile_name, seed.target_name
                    );
                }
            }
        }
    }

    alignments = alignments
        .drain(..)
        .filter(|a| a.evalue <= args.evalue_cutoff)
        .collect();

    write_tabular_output(&alignments, &mut args.paths.results.open(true)?)?;

    Ok(())
}

/// Each thread gets a copy of all the profiles and a share of the seeds
///
/// DP structs initialized once in a thread
///
/// Mutex on the writer counter; one output file per thread
fn align_threaded(
    args: &Args,
    profiles: Vec<Profile>,
    mut seed_map: SeedMap,
    target_map: &HashMap<String, Sequence>,
    params: SearchParams,
) -> anyhow::Result<()> {
    let mut thread_seed_maps: Vec<SeedMap> = vec![HashMap::new(); args.threads];
    let mut thread_idx: usize = 0;

    for profile in &profiles {
        let seeds = match seed_map.remove(&profile.name) {
            Some(seeds) => seeds,
            None => {
                continue;
            }
        };

        for seed in seeds {
            match thread_seed_maps[thread_idx].get_mut(&profile.name) {
                None => {
                    thread_seed_maps[thread_idx].insert(profile.name.clone(), vec![seed]);
                }
                Some(vec) => {
                    vec.push(seed);
                }
            }
            thread_idx += 1;
            if thread_idx >= args.threads {
                thread_idx = 0;
            }
        }
    }

    let thread_writer: ThreadLocal<RefCell<File>> = ThreadLocal::new();
    let thread_count = Mutex::new(0);

    thread_seed_maps.into_par_iter().for_each_with(
        (profiles, target_map, params),
        |(profiles, target_map, params), seed_map| {
            let mut worker = Worker::new();

            for profile in profiles.iter_mut() {
                let seeds = match seed_map.get(&profile.name) {
                    Some(seeds) => seeds,
                    None => {
                        continue;
                    }
                };

                for seed in seeds {
                    let target = match target_map.get(&seed.target_name) {
                        Some(target) => target,
                        None => {
                            println!("no target named: {}", seed.target_name);
                            continue;
                        }
                    };

                    let outcome = match worker.search(profile, target, seed, params) {
                        Ok(outcome) => outcome,
                        Err(err) => {
                            println!(
                                "search failed for {} vs {}: {err}",
                                profile.name, seed.target_name
                            );
                            continue;
                        }
                    };

                    let result = match outcome {
                        SearchOutcome::Complete(result) => result,
                        SearchOutcome::EmptyCloud => {
                            println!("empty cloud: {} vs {}", profile.name, seed.target_name);
                            continue;
                        }
                    };

                    if result.alignment.evalue <= args.evalue_cutoff {
                        let mut writer = thread_writer
                            .get_or(|| {
                                let mut cnt = thread_count.lock().unwrap();
                                *cnt += 1;

                                RefCell::new(
                                    args.paths
                                        .results
                                        .with_extension(format!("{cnt}"))
                                        .open(true)
                                        .unwrap(),
                                )
                            })
                            .borrow_mut();

                        let _ = writeln!(writer, "{}", result.alignment.tab_string());
                    }
                }
            }
        },
    );

    Ok(())
}
