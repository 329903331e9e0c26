use clap::Parser;
use gbm_outcomes_analysis::seed;
use qu::ick_use::*;

#[derive(Parser)]
struct Opt {
    /// Number of patients to generate.
    #[clap(long, short, default_value = "150")]
    count: usize,
    /// RNG seed. The same seed and count always produce the same cohort.
    #[clap(long, short, default_value = "0")]
    seed: u64,
}

#[qu::ick]
pub fn main(opt: Opt) -> Result {
    let cohort = seed::generate(opt.count, opt.seed);
    println!(
        "generated {} patients, {} surgeries, {} pathology reports, {} treatments, {} visits",
        cohort.patients.len(),
        cohort.surgeries.len(),
        cohort.pathologies.len(),
        cohort.treatments.len(),
        cohort.visits.len()
    );
    cohort.save()?;
    Ok(())
}
