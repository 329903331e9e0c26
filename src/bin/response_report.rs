use clap::Parser;
use gbm_outcomes_analysis::{analytics, header, Cohort, PatientId};
use qu::ick_use::*;
use term_data_table::{Cell, Row, Table};

#[derive(Parser)]
struct Opt {
    /// Restrict to these patient ids (comma separated). Default: everyone.
    #[clap(long, value_delimiter = ',')]
    patients: Vec<PatientId>,
    /// Also print the per-treatment response table.
    #[clap(long)]
    per_treatment: bool,
}

#[qu::ick]
pub fn main(opt: Opt) -> Result {
    let cohort = Cohort::load()?.restrict(&opt.patients);
    let summary = analytics::response_summary(&cohort);

    header("Treatment response");
    println!("evaluable treatments: {}", summary.total_treatments);
    println!(
        "objective response rate (CR + PR): {:.1}%",
        summary.overall_response_rate * 100.0
    );
    println!(
        "disease control rate (CR + PR + SD): {:.1}%",
        summary.disease_control_rate * 100.0
    );

    header("Best response distribution");
    let mut table = Table::new().with_row(
        Row::new()
            .with_cell(Cell::from("Best response"))
            .with_cell(Cell::from("Treatments")),
    );
    for (response, count) in &summary.response_distribution {
        table.add_row(
            Row::new()
                .with_cell(Cell::from(response.to_string()))
                .with_cell(Cell::from(count.to_string())),
        );
    }
    println!("{}", table);

    header("By treatment type");
    let mut table = Table::new().with_row(
        Row::new()
            .with_cell(Cell::from("Treatment type"))
            .with_cell(Cell::from("Evaluable"))
            .with_cell(Cell::from("Response rate")),
    );
    for (ty, group) in &summary.by_treatment_type {
        table.add_row(
            Row::new()
                .with_cell(Cell::from(ty.to_string()))
                .with_cell(Cell::from(group.count.to_string()))
                .with_cell(Cell::from(format!("{:.1}%", group.response_rate * 100.0))),
        );
    }
    println!("{}", table);

    if opt.per_treatment {
        header("Per-treatment responses");
        let records = analytics::response_records(&cohort);
        println!("{}", Table::from_serde(&records)?);
    }
    Ok(())
}
