use chrono::Datelike;
use clap::Parser;
use gbm_outcomes_analysis::{date_of_extract, header, percent, Cohort, PatientId};
use qu::ick_use::*;
use std::collections::BTreeMap;
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
    let total = cohort.patients.len();

    header("Data stats");
    println!("total patients: {}", total);
    println!("total surgeries: {}", cohort.surgeries.len());
    println!("total pathology reports: {}", cohort.pathologies.len());
    println!("total treatments: {}", cohort.treatments.len());
    println!("total follow-up visits: {}", cohort.visits.len());
    if let Some(date) = cohort.visits.iter().map(|v| v.visit_date).max() {
        println!("latest follow-up date: {}", date);
    }

    header("Gender");
    let mut table = count_table_header("Gender");
    for (label, count) in cohort.patients.count_genders() {
        add_count_row(&mut table, &label.to_string(), count, total);
    }
    println!("{}", table);

    header("Age at diagnosis");
    let bands = [
        ("0 - 40", 0, 40),
        ("40 - 55", 40, 55),
        ("55 - 65", 55, 65),
        ("65 - 75", 65, 75),
        ("75+", 75, i32::MAX),
    ];
    let mut counts = vec![0usize; bands.len()];
    let mut missing = 0usize;
    for pat in cohort.patients.iter_ref() {
        let Some(dx) = pat.initial_diagnosis_date else {
            missing += 1;
            continue;
        };
        let age = pat.age_at(dx);
        for (idx, (_, lo, hi)) in bands.iter().enumerate() {
            if age >= *lo && age < *hi {
                counts[idx] += 1;
            }
        }
    }
    let mut table = count_table_header("Age range");
    for ((label, _, _), count) in bands.iter().zip(counts) {
        add_count_row(&mut table, label, count, total);
    }
    add_count_row(&mut table, "missing diagnosis date", missing, total);
    println!("{}", table);

    header("Year of diagnosis");
    let mut years: BTreeMap<i32, usize> = BTreeMap::new();
    for pat in cohort.patients.iter_ref() {
        if let Some(dx) = pat.initial_diagnosis_date {
            *years.entry(dx.year()).or_default() += 1;
        }
    }
    let mut table = count_table_header("Year");
    for (year, count) in years {
        add_count_row(&mut table, &year.to_string(), count, total);
    }
    println!("{}", table);

    header("WHO grade");
    // Earliest pathology per patient, to match the molecular report.
    let mut grades: BTreeMap<String, usize> = BTreeMap::new();
    let mut with_pathology = 0usize;
    for pat in cohort.patients.iter_ref() {
        let Some(path) = cohort.pathologies.earliest_for_patient(pat.patient_id) else {
            continue;
        };
        with_pathology += 1;
        let label = match path.who_grade {
            Some(grade) => grade.to_string(),
            None => "unknown".to_string(),
        };
        *grades.entry(label).or_default() += 1;
    }
    println!("patients with pathology data: {}", with_pathology);
    let mut table = count_table_header("Grade");
    for (label, count) in grades {
        add_count_row(&mut table, &label, count, with_pathology);
    }
    println!("{}", table);

    println!("\ndata extracted on {}", date_of_extract());
    Ok(())
}

fn count_table_header(label: &str) -> Table<'static> {
    Table::new().with_row(
        Row::new()
            .with_cell(Cell::from(label.to_string()))
            .with_cell(Cell::from("Count"))
            .with_cell(Cell::from("Percentage")),
    )
}

fn add_count_row(table: &mut Table, label: &str, count: usize, total: usize) {
    table.add_row(
        Row::new()
            .with_cell(Cell::from(label.to_string()))
            .with_cell(Cell::from(count.to_string()))
            .with_cell(Cell::from(percent(count, total))),
    );
}
