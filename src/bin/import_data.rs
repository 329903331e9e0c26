use gbm_outcomes_analysis::{Pathologies, Patients, Surgeries, Treatments, Visits};
use qu::ick_use::*;

#[qu::ick]
fn main() -> Result {
    let patients = Patients::load_orig("patients.csv")?;
    patients.save("patients.bin")?;

    let surgeries = Surgeries::load_orig("surgeries.csv")?;
    surgeries.save("surgeries.bin")?;

    let pathologies = Pathologies::load_orig("pathologies.csv")?;
    pathologies.save("pathologies.bin")?;

    let treatments = Treatments::load_orig("treatments.csv")?;
    treatments.save("treatments.bin")?;

    let visits = Visits::load_orig("follow_up_visits.csv")?;
    visits.save("visits.bin")?;

    println!(
        "imported {} patients, {} surgeries, {} pathology reports, {} treatments, {} visits",
        patients.len(),
        surgeries.len(),
        pathologies.len(),
        treatments.len(),
        visits.len()
    );
    Ok(())
}
