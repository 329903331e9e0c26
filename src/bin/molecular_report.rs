use clap::Parser;
use gbm_outcomes_analysis::{analytics, fmt_opt_days, header, percent, Cohort, PatientId};
use qu::ick_use::*;
use term_data_table::{Cell, Row, Table};

#[derive(Parser)]
struct Opt {
    /// Restrict to these patient ids (comma separated). Default: everyone.
    #[clap(long, value_delimiter = ',')]
    patients: Vec<PatientId>,
}

#[qu::ick]
pub fn main(opt: Opt) -> Result {
    let cohort = Cohort::load()?.restrict(&opt.patients);
    let summary = analytics::molecular_summary(&cohort);
    let total = summary.total_patients_with_molecular_data;

    header("Molecular markers");
    println!("patients with pathology data: {}", total);

    header("IDH status");
    let mut table = distribution_table("IDH status");
    for (status, count) in &summary.idh_distribution {
        add_distribution_row(&mut table, &status.to_string(), *count, total);
    }
    println!("{}", table);

    header("MGMT status");
    let mut table = distribution_table("MGMT status");
    for (status, count) in &summary.mgmt_distribution {
        add_distribution_row(&mut table, &status.to_string(), *count, total);
    }
    println!("{}", table);

    header("WHO grade");
    let mut table = distribution_table("Grade");
    for (label, count) in &summary.grade_distribution {
        add_distribution_row(&mut table, label, *count, total);
    }
    println!("{}", table);

    header("Survival and response by marker combination");
    let mut table = Table::new().with_row(
        Row::new()
            .with_cell(Cell::from("Combination"))
            .with_cell(Cell::from("Patients"))
            .with_cell(Cell::from("Mean OS"))
            .with_cell(Cell::from("Median OS"))
            .with_cell(Cell::from("Progression rate"))
            .with_cell(Cell::from("Response rate")),
    );
    for group in &summary.correlations {
        table.add_row(
            Row::new()
                .with_cell(Cell::from(group.combination.to_string()))
                .with_cell(Cell::from(group.patient_count.to_string()))
                .with_cell(Cell::from(fmt_opt_days(group.mean_survival_days)))
                .with_cell(Cell::from(fmt_opt_days(group.median_survival_days)))
                .with_cell(Cell::from(format!("{:.1}%", group.progression_rate * 100.0)))
                .with_cell(Cell::from(format!("{:.1}%", group.response_rate * 100.0))),
        );
    }
    println!("{}", table);
    Ok(())
}

fn distribution_table(label: &str) -> Table<'static> {
    Table::new().with_row(
        Row::new()
            .with_cell(Cell::from(label.to_string()))
            .with_cell(Cell::from("Patients"))
            .with_cell(Cell::from("Percentage")),
    )
}

fn add_distribution_row(table: &mut Table, label: &str, count: usize, total: usize) {
    table.add_row(
        Row::new()
            .with_cell(Cell::from(label.to_string()))
            .with_cell(Cell::from(count.to_string()))
            .with_cell(Cell::from(percent(count, total))),
    );
}
