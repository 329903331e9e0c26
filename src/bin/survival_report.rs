use clap::Parser;
use gbm_outcomes_analysis::{analytics, fmt_opt_days, header, Cohort, PatientId};
use qu::ick_use::*;
use term_data_table::{Cell, Row, Table};

#[derive(Parser)]
struct Opt {
    /// Restrict to these patient ids (comma separated). Default: everyone.
    #[clap(long, value_delimiter = ',')]
    patients: Vec<PatientId>,
    /// Also print the per-patient endpoint table.
    #[clap(long)]
    per_patient: bool,
}

#[qu::ick]
pub fn main(opt: Opt) -> Result {
    let cohort = Cohort::load()?.restrict(&opt.patients);
    let summary = analytics::survival_summary(&cohort);

    header("Cohort");
    println!("total patients: {}", summary.total_patients);
    println!("alive at last follow-up: {}", summary.alive_patients);
    println!("with documented progression: {}", summary.progressed_patients);
    println!("progression rate: {:.1}%", summary.progression_rate * 100.0);

    header("Survival endpoints (days from diagnosis)");
    let mut table = Table::new().with_row(
        Row::new()
            .with_cell(Cell::from("Endpoint"))
            .with_cell(Cell::from("Patients with data"))
            .with_cell(Cell::from("Mean"))
            .with_cell(Cell::from("Median")),
    );
    let endpoints = [
        ("time to progression", &summary.time_to_progression),
        ("overall survival", &summary.overall_survival),
        ("progression-free survival", &summary.progression_free_survival),
    ];
    for (label, endpoint) in endpoints {
        table.add_row(
            Row::new()
                .with_cell(Cell::from(label))
                .with_cell(Cell::from(endpoint.count.to_string()))
                .with_cell(Cell::from(fmt_opt_days(endpoint.mean_days)))
                .with_cell(Cell::from(fmt_opt_days(endpoint.median_days))),
        );
    }
    println!("{}", table);

    if opt.per_patient {
        header("Per-patient endpoints");
        let records = analytics::survival_records(&cohort);
        println!("{}", Table::from_serde(&records)?);
    }
    Ok(())
}
