use std::path::PathBuf;

#[derive(Default)]
pub struct Paths {
    /// The profile HMM file (JSON) provided at the command line
    pub profiles: PathBuf,
    /// The target sequence file (fasta) provided at the command line
    pub targets: PathBuf,
    /// The alignment seeds used to anchor the cloud search
    pub seeds: PathBuf,
    /// The path that results will be written to
    pub results: PathBuf,
}

#[derive(Default, PartialEq, Eq)]
pub enum Command {
    Align,
    #[default]
    NotSet,
}

#[derive(Default)]
/// The arguments that are passed throughout the pipeline
pub struct Args {
    pub command: Command,
    pub paths: Paths,
    pub threads: usize,
    pub evalue_cutoff: f64,
    pub alpha: f32,
    pub beta: f32,
    pub gamma: usize,
    pub rt1: f32,
    pub rt2: f32,
}
