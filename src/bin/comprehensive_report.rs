use clap::Parser;
use gbm_outcomes_analysis::{analytics, Cohort, PatientId};
use qu::ick_use::*;
use std::{fs, path::PathBuf};

#[derive(Parser)]
struct Opt {
    /// Restrict to these patient ids (comma separated). Default: everyone.
    #[clap(long, value_delimiter = ',')]
    patients: Vec<PatientId>,
    /// Write the report here instead of stdout.
    #[clap(long, short)]
    out: Option<PathBuf>,
    /// Emit single-line JSON rather than pretty-printed.
    #[clap(long)]
    compact: bool,
}

#[qu::ick]
pub fn main(opt: Opt) -> Result {
    let cohort = Cohort::load()?.restrict(&opt.patients);
    let report = analytics::comprehensive_report(&cohort);
    let json = if opt.compact {
        serde_json::to_string(&report)?
    } else {
        serde_json::to_string_pretty(&report)?
    };
    match &opt.out {
        Some(path) => {
            fs::write(path, json)?;
            event!(Level::INFO, "wrote report to \"{}\"", path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}
