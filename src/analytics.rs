//! Survival, treatment-response, and molecular-marker analytics.
//!
//! Everything in this module is a pure scan over an in-memory [`Cohort`]
//! snapshot: derived records are recomputed on every call and nothing is
//! cached. Undefined values stay `None` all the way to the output; they are
//! never folded into denominators.

use crate::{
    Cohort, IdhStatus, ImagingResponse, MgmtStatus, PatientId, Treatment, TreatmentType, WhoGrade,
};
use chrono::NaiveDate;
use serde::Serialize;
use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
};

/// Per-patient survival endpoints.
///
/// Durations can go negative on corrupt input (a visit recorded before the
/// diagnosis date); they are passed through untouched rather than clamped,
/// so data-entry errors stay visible in the reports.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SurvivalRecord {
    pub patient_id: PatientId,
    pub diagnosis_date: Option<NaiveDate>,
    pub last_follow_up_date: Option<NaiveDate>,
    pub progression_date: Option<NaiveDate>,
    pub time_to_progression_days: Option<i64>,
    pub overall_survival_days: Option<i64>,
    pub progression_free_survival_days: Option<i64>,
    pub progressed: bool,
}

/// Derive the survival endpoints for every patient in the cohort.
pub fn survival_records(cohort: &Cohort) -> Vec<SurvivalRecord> {
    cohort
        .patients
        .iter_ref()
        .map(|pat| {
            let diagnosis_date = pat.initial_diagnosis_date;
            let last_follow_up_date = cohort.visits.last_visit_date(pat.patient_id);
            let progression_date = cohort.visits.first_progression_date(pat.patient_id);
            let progressed = progression_date.is_some();

            let time_to_progression_days = match (diagnosis_date, progression_date) {
                (Some(dx), Some(prog)) => Some((prog - dx).num_days()),
                _ => None,
            };
            let overall_survival_days = match (diagnosis_date, last_follow_up_date) {
                (Some(dx), Some(last)) => Some((last - dx).num_days()),
                _ => None,
            };
            // PFS: event time if progression was observed, otherwise
            // right-censored at the last follow-up.
            let progression_free_survival_days = if progressed {
                time_to_progression_days
            } else {
                overall_survival_days
            };

            SurvivalRecord {
                patient_id: pat.patient_id,
                diagnosis_date,
                last_follow_up_date,
                progression_date,
                time_to_progression_days,
                overall_survival_days,
                progression_free_survival_days,
                progressed,
            }
        })
        .collect()
}

/// Mean/median/count over the patients with a defined value for one
/// endpoint. `count == 0` leaves the mean and median undefined.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EndpointSummary {
    pub mean_days: Option<f64>,
    pub median_days: Option<f64>,
    pub count: usize,
}

impl EndpointSummary {
    fn from_values(mut values: Vec<i64>) -> Self {
        if values.is_empty() {
            return EndpointSummary {
                mean_days: None,
                median_days: None,
                count: 0,
            };
        }
        values.sort_unstable();
        let count = values.len();
        let mean = values.iter().sum::<i64>() as f64 / count as f64;
        let median = if count % 2 == 1 {
            values[count / 2] as f64
        } else {
            (values[count / 2 - 1] + values[count / 2]) as f64 / 2.
        };
        EndpointSummary {
            mean_days: Some(mean),
            median_days: Some(median),
            count,
        }
    }
}

/// Cohort-level survival statistics.
#[derive(Debug, Clone, Serialize)]
pub struct SurvivalSummary {
    pub total_patients: usize,
    /// No death field is modelled in the registry, so this always equals
    /// `total_patients`.
    pub alive_patients: usize,
    pub progressed_patients: usize,
    /// 0 when the cohort is empty.
    pub progression_rate: f64,
    pub time_to_progression: EndpointSummary,
    pub overall_survival: EndpointSummary,
    pub progression_free_survival: EndpointSummary,
}

pub fn survival_summary(cohort: &Cohort) -> SurvivalSummary {
    let records = survival_records(cohort);

    let ttp = records
        .iter()
        .filter_map(|r| r.time_to_progression_days)
        .collect();
    let os = records
        .iter()
        .filter_map(|r| r.overall_survival_days)
        .collect();
    let pfs = records
        .iter()
        .filter_map(|r| r.progression_free_survival_days)
        .collect();

    let total_patients = records.len();
    let progressed_patients = records.iter().filter(|r| r.progressed).count();
    let progression_rate = if total_patients == 0 {
        0.
    } else {
        progressed_patients as f64 / total_patients as f64
    };

    SurvivalSummary {
        total_patients,
        alive_patients: total_patients,
        progressed_patients,
        progression_rate,
        time_to_progression: EndpointSummary::from_values(ttp),
        overall_survival: EndpointSummary::from_values(os),
        progression_free_survival: EndpointSummary::from_values(pfs),
    }
}

/// Best response over one treatment episode.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseRecord {
    pub patient_id: PatientId,
    pub treatment_type: TreatmentType,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub best_response: ImagingResponse,
    /// Treatment start to the first visit achieving the best response.
    /// Only defined when the best response is CR or PR.
    pub time_to_response_days: Option<i64>,
    /// Best-response visit to the next progression, else right-censored at
    /// the last assessed visit in the treatment window.
    pub duration_of_response_days: Option<i64>,
}

/// Derive a response record for every evaluable treatment episode.
///
/// A treatment is evaluable when at least one visit in its window (start
/// date to end date, or open-ended while ongoing) carries an imaging
/// assessment. Unassessed visits never contribute a best response.
pub fn response_records(cohort: &Cohort) -> Vec<ResponseRecord> {
    cohort
        .treatments
        .iter()
        .filter_map(|treatment| response_record(cohort, &treatment))
        .collect()
}

fn response_record(cohort: &Cohort, treatment: &Treatment) -> Option<ResponseRecord> {
    // Assessed visits in the treatment window, in date order.
    let mut visits: Vec<(NaiveDate, ImagingResponse)> = cohort
        .visits
        .for_patient(treatment.patient_id)
        .filter(|v| v.visit_date >= treatment.start_date)
        .filter(|v| treatment.end_date.map_or(true, |end| v.visit_date <= end))
        .filter_map(|v| v.imaging_response.map(|r| (v.visit_date, r)))
        .collect();
    visits.sort_by_key(|(date, _)| *date);

    let best_response = visits.iter().map(|(_, r)| *r).max_by_key(|r| r.priority())?;

    let mut time_to_response_days = None;
    let mut duration_of_response_days = None;
    if best_response.is_objective_response() {
        let (response_date, _) = *visits
            .iter()
            .find(|(_, r)| *r == best_response)
            .expect("best response came from this list");
        time_to_response_days = Some((response_date - treatment.start_date).num_days());

        let end = visits
            .iter()
            .find(|(date, r)| {
                *date > response_date && *r == ImagingResponse::ProgressiveDisease
            })
            .map(|(date, _)| *date)
            .or_else(|| visits.last().map(|(date, _)| *date));
        duration_of_response_days = end.map(|end| (end - response_date).num_days());
    }

    Some(ResponseRecord {
        patient_id: treatment.patient_id,
        treatment_type: treatment.treatment_type,
        start_date: treatment.start_date,
        end_date: treatment.end_date,
        best_response,
        time_to_response_days,
        duration_of_response_days,
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct TypeResponse {
    pub count: usize,
    pub response_rate: f64,
}

/// Cohort-level treatment-response statistics.
#[derive(Debug, Clone, Serialize)]
pub struct ResponseSummary {
    /// Evaluable treatment episodes (the rate denominator).
    pub total_treatments: usize,
    /// (CR + PR) / evaluable.
    pub overall_response_rate: f64,
    /// (CR + PR + SD) / evaluable.
    pub disease_control_rate: f64,
    pub response_distribution: BTreeMap<ImagingResponse, usize>,
    pub by_treatment_type: BTreeMap<TreatmentType, TypeResponse>,
}

pub fn response_summary(cohort: &Cohort) -> ResponseSummary {
    let records = response_records(cohort);
    let total = records.len();

    // B Tree so we get a predictable ordering. Manually insert to make sure
    // all categories are included.
    let mut distribution = BTreeMap::new();
    distribution.insert(ImagingResponse::CompleteResponse, 0);
    distribution.insert(ImagingResponse::PartialResponse, 0);
    distribution.insert(ImagingResponse::StableDisease, 0);
    distribution.insert(ImagingResponse::ProgressiveDisease, 0);
    for rec in &records {
        *distribution.entry(rec.best_response).or_insert(0) += 1;
    }

    let responders = records
        .iter()
        .filter(|r| r.best_response.is_objective_response())
        .count();
    let controlled = records
        .iter()
        .filter(|r| r.best_response != ImagingResponse::ProgressiveDisease)
        .count();
    let rate = |n: usize| if total == 0 { 0. } else { n as f64 / total as f64 };
    let overall_response_rate = rate(responders);
    let disease_control_rate = rate(controlled);

    let mut grouped: BTreeMap<TreatmentType, Vec<&ResponseRecord>> = BTreeMap::new();
    for rec in &records {
        grouped.entry(rec.treatment_type).or_default().push(rec);
    }
    let mut by_treatment_type = BTreeMap::new();
    for (ty, group) in grouped {
        let responders = group
            .iter()
            .filter(|r| r.best_response.is_objective_response())
            .count();
        by_treatment_type.insert(
            ty,
            TypeResponse {
                count: group.len(),
                // Groups are never empty, so the rate is well defined.
                response_rate: responders as f64 / group.len() as f64,
            },
        );
    }

    ResponseSummary {
        total_treatments: total,
        overall_response_rate,
        disease_control_rate,
        response_distribution: distribution,
        by_treatment_type,
    }
}

/// A molecular marker combination. Unknown statuses are first-class
/// categories; an all-unknown combination forms its own bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct MarkerCombination {
    pub idh_status: IdhStatus,
    pub mgmt_status: MgmtStatus,
    pub who_grade: Option<WhoGrade>,
}

impl fmt::Display for MarkerCombination {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "IDH-{}/MGMT-{}/Grade-{}",
            self.idh_status,
            self.mgmt_status,
            grade_label(self.who_grade)
        )
    }
}

fn grade_label(grade: Option<WhoGrade>) -> String {
    match grade {
        Some(grade) => grade.to_string(),
        None => "unknown".into(),
    }
}

/// One correlation bucket: a marker combination and its outcome rates.
///
/// The rates reuse the survival and response engines on the id-filtered
/// sub-cohort, so their definitions cannot drift from the cohort-level ones.
#[derive(Debug, Clone, Serialize)]
pub struct MarkerGroup {
    pub combination: MarkerCombination,
    pub patient_count: usize,
    pub mean_survival_days: Option<f64>,
    pub median_survival_days: Option<f64>,
    pub progression_rate: f64,
    pub response_rate: f64,
}

/// Marker distributions and per-combination outcome correlations.
#[derive(Debug, Clone, Serialize)]
pub struct MolecularSummary {
    pub total_patients_with_molecular_data: usize,
    pub idh_distribution: BTreeMap<IdhStatus, usize>,
    pub mgmt_distribution: BTreeMap<MgmtStatus, usize>,
    pub grade_distribution: BTreeMap<String, usize>,
    pub correlations: Vec<MarkerGroup>,
}

pub fn molecular_summary(cohort: &Cohort) -> MolecularSummary {
    // Group patients by the marker combination of their earliest pathology
    // report, so each patient occupies exactly one bucket and the marginal
    // distributions sum to the number of patients with pathology data.
    let mut groups: BTreeMap<MarkerCombination, BTreeSet<PatientId>> = BTreeMap::new();
    for pat in cohort.patients.iter_ref() {
        let Some(path) = cohort.pathologies.earliest_for_patient(pat.patient_id) else {
            continue;
        };
        let key = MarkerCombination {
            idh_status: path.idh_status,
            mgmt_status: path.mgmt_status,
            who_grade: path.who_grade,
        };
        groups.entry(key).or_default().insert(pat.patient_id);
    }

    let total = groups.values().map(|ids| ids.len()).sum();

    let mut idh_distribution = BTreeMap::new();
    idh_distribution.insert(IdhStatus::Wildtype, 0);
    idh_distribution.insert(IdhStatus::Mutant, 0);
    idh_distribution.insert(IdhStatus::Unknown, 0);
    let mut mgmt_distribution = BTreeMap::new();
    mgmt_distribution.insert(MgmtStatus::Methylated, 0);
    mgmt_distribution.insert(MgmtStatus::Unmethylated, 0);
    mgmt_distribution.insert(MgmtStatus::Unknown, 0);
    let mut grade_distribution = BTreeMap::new();

    let mut correlations = Vec::with_capacity(groups.len());
    for (combination, ids) in &groups {
        *idh_distribution.entry(combination.idh_status).or_insert(0) += ids.len();
        *mgmt_distribution.entry(combination.mgmt_status).or_insert(0) += ids.len();
        *grade_distribution
            .entry(grade_label(combination.who_grade))
            .or_insert(0) += ids.len();

        let sub = cohort.filter_by_patient_ids(ids);
        let survival = survival_summary(&sub);
        let response = response_summary(&sub);
        correlations.push(MarkerGroup {
            combination: *combination,
            patient_count: ids.len(),
            mean_survival_days: survival.overall_survival.mean_days,
            median_survival_days: survival.overall_survival.median_days,
            progression_rate: survival.progression_rate,
            response_rate: response.overall_response_rate,
        });
    }

    MolecularSummary {
        total_patients_with_molecular_data: total,
        idh_distribution,
        mgmt_distribution,
        grade_distribution,
        correlations,
    }
}

/// Everything at once, over the identical patient snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct ComprehensiveReport {
    pub survival_analysis: SurvivalSummary,
    pub treatment_response: ResponseSummary,
    pub molecular_correlations: MolecularSummary,
    pub patient_cohort_size: usize,
}

/// Pure composition: fan the same cohort out to all three analyzers so the
/// totals agree across sub-reports.
pub fn comprehensive_report(cohort: &Cohort) -> ComprehensiveReport {
    ComprehensiveReport {
        survival_analysis: survival_summary(cohort),
        treatment_response: response_summary(cohort),
        molecular_correlations: molecular_summary(cohort),
        patient_cohort_size: cohort.patients.len(),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        Gender, Patient, Pathologies, Pathology, Patients, Surgeries, Treatments, Visit, Visits,
    };
    use chrono::NaiveDate;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn patient(id: PatientId, dx: Option<NaiveDate>) -> Patient {
        Patient {
            patient_id: id,
            mrn: format!("MRN{:06}", id).into(),
            date_of_birth: d(1960, 1, 1),
            gender: Gender::Male,
            initial_diagnosis_date: dx,
            primary_location: None,
        }
    }

    fn visit(id: PatientId, date: NaiveDate, response: Option<ImagingResponse>) -> Visit {
        Visit {
            patient_id: id,
            visit_date: date,
            imaging_response: response,
            neurological_status: None,
            kps_score: None,
        }
    }

    fn pathology(
        id: PatientId,
        idh: IdhStatus,
        mgmt: MgmtStatus,
        grade: Option<WhoGrade>,
    ) -> Pathology {
        Pathology {
            patient_id: id,
            specimen_date: d(2020, 1, 10),
            histologic_diagnosis: "Glioblastoma".into(),
            who_grade: grade,
            idh_status: idh,
            mgmt_status: mgmt,
        }
    }

    fn treatment(id: PatientId, ty: TreatmentType, start: NaiveDate) -> Treatment {
        Treatment {
            patient_id: id,
            treatment_type: ty,
            start_date: start,
            end_date: None,
            cycles_planned: None,
            cycles_delivered: None,
        }
    }

    fn cohort(
        patients: Vec<Patient>,
        pathologies: Vec<Pathology>,
        treatments: Vec<Treatment>,
        visits: Vec<Visit>,
    ) -> Cohort {
        Cohort {
            patients: Patients::new(patients),
            surgeries: Surgeries::new(vec![]),
            pathologies: Pathologies::new(pathologies),
            treatments: Treatments::new(treatments),
            visits: Visits::new(visits),
        }
    }

    #[test]
    fn progression_defines_all_endpoints() {
        let dx = d(2020, 1, 1);
        let c = cohort(
            vec![patient(1, Some(dx))],
            vec![],
            vec![],
            vec![visit(
                1,
                dx + chrono::Duration::days(100),
                Some(ImagingResponse::ProgressiveDisease),
            )],
        );
        let records = survival_records(&c);
        assert_eq!(records.len(), 1);
        let rec = &records[0];
        assert!(rec.progressed);
        assert_eq!(rec.time_to_progression_days, Some(100));
        assert_eq!(rec.overall_survival_days, Some(100));
        assert_eq!(rec.progression_free_survival_days, Some(100));

        let summary = survival_summary(&c);
        assert_eq!(summary.total_patients, 1);
        assert_eq!(summary.progressed_patients, 1);
        assert_eq!(summary.progression_rate, 1.);
        assert_eq!(summary.time_to_progression.count, 1);
        assert_eq!(summary.time_to_progression.mean_days, Some(100.));
        assert_eq!(summary.time_to_progression.median_days, Some(100.));
    }

    #[test]
    fn no_progression_censors_pfs_at_last_visit() {
        let dx = d(2020, 1, 1);
        let c = cohort(
            vec![patient(1, Some(dx))],
            vec![],
            vec![],
            vec![
                visit(
                    1,
                    dx + chrono::Duration::days(50),
                    Some(ImagingResponse::StableDisease),
                ),
                visit(
                    1,
                    dx + chrono::Duration::days(200),
                    Some(ImagingResponse::StableDisease),
                ),
            ],
        );
        let rec = &survival_records(&c)[0];
        assert!(!rec.progressed);
        assert_eq!(rec.time_to_progression_days, None);
        assert_eq!(rec.overall_survival_days, Some(200));
        assert_eq!(rec.progression_free_survival_days, Some(200));
    }

    #[test]
    fn missing_diagnosis_date_excluded_from_endpoints() {
        let c = cohort(
            vec![patient(1, None)],
            vec![],
            vec![],
            vec![visit(
                1,
                d(2020, 6, 1),
                Some(ImagingResponse::ProgressiveDisease),
            )],
        );
        let summary = survival_summary(&c);
        // Counts in the total (and progression rate), but no endpoint values.
        assert_eq!(summary.total_patients, 1);
        assert_eq!(summary.progressed_patients, 1);
        assert_eq!(summary.time_to_progression.count, 0);
        assert_eq!(summary.overall_survival.count, 0);
        assert_eq!(summary.progression_free_survival.count, 0);
        assert_eq!(summary.overall_survival.mean_days, None);
        assert_eq!(summary.overall_survival.median_days, None);
    }

    #[test]
    fn negative_durations_pass_through() {
        let c = cohort(
            vec![patient(1, Some(d(2020, 5, 1)))],
            vec![],
            vec![],
            vec![visit(
                1,
                d(2020, 4, 1),
                Some(ImagingResponse::ProgressiveDisease),
            )],
        );
        let rec = &survival_records(&c)[0];
        assert_eq!(rec.time_to_progression_days, Some(-30));
    }

    #[test]
    fn empty_cohort_rates_are_defined_zeros() {
        let c = cohort(vec![], vec![], vec![], vec![]);
        let survival = survival_summary(&c);
        assert_eq!(survival.total_patients, 0);
        assert_eq!(survival.progression_rate, 0.);
        assert_eq!(survival.overall_survival.count, 0);
        let response = response_summary(&c);
        assert_eq!(response.total_treatments, 0);
        assert_eq!(response.overall_response_rate, 0.);
        assert_eq!(response.disease_control_rate, 0.);
        let molecular = molecular_summary(&c);
        assert_eq!(molecular.total_patients_with_molecular_data, 0);
        assert!(molecular.correlations.is_empty());
    }

    #[test]
    fn median_is_order_invariant_and_bounded() {
        let a = EndpointSummary::from_values(vec![300, 100, 200, 50]);
        let b = EndpointSummary::from_values(vec![50, 300, 100, 200]);
        assert_eq!(a, b);
        // Even count: average of the two middle values.
        assert_eq!(a.median_days, Some(150.));
        let median = a.median_days.unwrap();
        assert!(median >= 50. && median <= 300.);
        assert_eq!(
            EndpointSummary::from_values(vec![5, 1, 3]).median_days,
            Some(3.)
        );
    }

    #[test]
    fn best_response_uses_recist_priority() {
        let start = d(2020, 2, 1);
        let c = cohort(
            vec![patient(1, Some(d(2020, 1, 1)))],
            vec![],
            vec![treatment(1, TreatmentType::Chemotherapy, start)],
            vec![
                visit(
                    1,
                    start + chrono::Duration::days(10),
                    Some(ImagingResponse::StableDisease),
                ),
                visit(
                    1,
                    start + chrono::Duration::days(30),
                    Some(ImagingResponse::PartialResponse),
                ),
                visit(
                    1,
                    start + chrono::Duration::days(60),
                    Some(ImagingResponse::ProgressiveDisease),
                ),
            ],
        );
        let records = response_records(&c);
        assert_eq!(records.len(), 1);
        let rec = &records[0];
        assert_eq!(rec.best_response, ImagingResponse::PartialResponse);
        assert_eq!(rec.time_to_response_days, Some(30));
        // PR at day 30, progression at day 60.
        assert_eq!(rec.duration_of_response_days, Some(30));

        let summary = response_summary(&c);
        assert_eq!(summary.total_treatments, 1);
        assert_eq!(summary.overall_response_rate, 1.);
        assert_eq!(summary.disease_control_rate, 1.);
        assert_eq!(
            summary.response_distribution[&ImagingResponse::PartialResponse],
            1
        );
        let by_type = &summary.by_treatment_type[&TreatmentType::Chemotherapy];
        assert_eq!(by_type.count, 1);
        assert_eq!(by_type.response_rate, 1.);
    }

    #[test]
    fn duration_of_response_censors_at_last_visit() {
        let start = d(2020, 2, 1);
        let c = cohort(
            vec![patient(1, Some(d(2020, 1, 1)))],
            vec![],
            vec![treatment(1, TreatmentType::Radiation, start)],
            vec![
                visit(
                    1,
                    start + chrono::Duration::days(10),
                    Some(ImagingResponse::PartialResponse),
                ),
                visit(
                    1,
                    start + chrono::Duration::days(40),
                    Some(ImagingResponse::StableDisease),
                ),
            ],
        );
        let rec = &response_records(&c)[0];
        assert_eq!(rec.time_to_response_days, Some(10));
        assert_eq!(rec.duration_of_response_days, Some(30));
    }

    #[test]
    fn unassessed_window_is_not_evaluable() {
        let start = d(2020, 2, 1);
        let c = cohort(
            vec![patient(1, Some(d(2020, 1, 1)))],
            vec![],
            vec![treatment(1, TreatmentType::Chemotherapy, start)],
            // One visit before the window, one unassessed visit inside it.
            vec![
                visit(
                    1,
                    start - chrono::Duration::days(5),
                    Some(ImagingResponse::StableDisease),
                ),
                visit(1, start + chrono::Duration::days(20), None),
            ],
        );
        assert!(response_records(&c).is_empty());
        let summary = response_summary(&c);
        assert_eq!(summary.total_treatments, 0);
        assert_eq!(summary.overall_response_rate, 0.);
    }

    #[test]
    fn stable_disease_counts_for_disease_control_only() {
        let start = d(2020, 2, 1);
        let c = cohort(
            vec![patient(1, Some(d(2020, 1, 1)))],
            vec![],
            vec![treatment(1, TreatmentType::Chemotherapy, start)],
            vec![visit(
                1,
                start + chrono::Duration::days(20),
                Some(ImagingResponse::StableDisease),
            )],
        );
        let summary = response_summary(&c);
        assert_eq!(summary.overall_response_rate, 0.);
        assert_eq!(summary.disease_control_rate, 1.);
        let rec = &response_records(&c)[0];
        // SD is not an objective response, so no response timing.
        assert_eq!(rec.time_to_response_days, None);
        assert_eq!(rec.duration_of_response_days, None);
    }

    #[test]
    fn marginal_distributions_sum_to_patients_with_pathology() {
        let c = cohort(
            vec![
                patient(1, Some(d(2020, 1, 1))),
                patient(2, Some(d(2020, 1, 1))),
                patient(3, Some(d(2020, 1, 1))),
                // No pathology data; must not appear anywhere.
                patient(4, Some(d(2020, 1, 1))),
            ],
            vec![
                pathology(
                    1,
                    IdhStatus::Wildtype,
                    MgmtStatus::Methylated,
                    Some(WhoGrade::Iv),
                ),
                pathology(
                    2,
                    IdhStatus::Wildtype,
                    MgmtStatus::Unmethylated,
                    Some(WhoGrade::Iv),
                ),
                // All-unknown markers form their own bucket.
                pathology(3, IdhStatus::Unknown, MgmtStatus::Unknown, None),
            ],
            vec![],
            vec![],
        );
        let summary = molecular_summary(&c);
        assert_eq!(summary.total_patients_with_molecular_data, 3);
        assert_eq!(summary.idh_distribution.values().sum::<usize>(), 3);
        assert_eq!(summary.mgmt_distribution.values().sum::<usize>(), 3);
        assert_eq!(summary.grade_distribution.values().sum::<usize>(), 3);
        assert_eq!(summary.idh_distribution[&IdhStatus::Wildtype], 2);
        assert_eq!(summary.idh_distribution[&IdhStatus::Unknown], 1);
        let unknown_bucket = summary
            .correlations
            .iter()
            .find(|g| {
                g.combination
                    == MarkerCombination {
                        idh_status: IdhStatus::Unknown,
                        mgmt_status: MgmtStatus::Unknown,
                        who_grade: None,
                    }
            })
            .unwrap();
        assert_eq!(unknown_bucket.patient_count, 1);
    }

    #[test]
    fn correlation_rates_are_scoped_to_the_bucket() {
        let dx = d(2020, 1, 1);
        let c = cohort(
            vec![patient(1, Some(dx)), patient(2, Some(dx))],
            vec![
                pathology(
                    1,
                    IdhStatus::Wildtype,
                    MgmtStatus::Methylated,
                    Some(WhoGrade::Iv),
                ),
                pathology(
                    2,
                    IdhStatus::Mutant,
                    MgmtStatus::Methylated,
                    Some(WhoGrade::Iv),
                ),
            ],
            vec![],
            vec![
                visit(
                    1,
                    dx + chrono::Duration::days(90),
                    Some(ImagingResponse::ProgressiveDisease),
                ),
                visit(
                    2,
                    dx + chrono::Duration::days(90),
                    Some(ImagingResponse::StableDisease),
                ),
            ],
        );
        let summary = molecular_summary(&c);
        let rate_for = |idh: IdhStatus| {
            summary
                .correlations
                .iter()
                .find(|g| g.combination.idh_status == idh)
                .unwrap()
                .progression_rate
        };
        assert_eq!(rate_for(IdhStatus::Wildtype), 1.);
        assert_eq!(rate_for(IdhStatus::Mutant), 0.);
        let wildtype = summary
            .correlations
            .iter()
            .find(|g| g.combination.idh_status == IdhStatus::Wildtype)
            .unwrap();
        assert_eq!(wildtype.mean_survival_days, Some(90.));
    }

    #[test]
    fn comprehensive_report_totals_agree() {
        let dx = d(2020, 1, 1);
        let c = cohort(
            vec![patient(1, Some(dx)), patient(2, None)],
            vec![pathology(
                1,
                IdhStatus::Wildtype,
                MgmtStatus::Methylated,
                Some(WhoGrade::Iv),
            )],
            vec![treatment(1, TreatmentType::Radiation, dx)],
            vec![visit(
                1,
                dx + chrono::Duration::days(60),
                Some(ImagingResponse::PartialResponse),
            )],
        );
        let report = comprehensive_report(&c);
        assert_eq!(
            report.patient_cohort_size,
            report.survival_analysis.total_patients
        );
        assert_eq!(report.patient_cohort_size, 2);
    }

    #[test]
    fn filtering_commutes_with_computation() {
        let dx = d(2020, 1, 1);
        let mut patients = vec![];
        let mut visits = vec![];
        for id in 1..=8u64 {
            patients.push(patient(id, Some(dx)));
            let response = if id % 2 == 0 {
                ImagingResponse::ProgressiveDisease
            } else {
                ImagingResponse::StableDisease
            };
            visits.push(visit(
                id,
                dx + chrono::Duration::days(30 * id as i64),
                Some(response),
            ));
        }
        let full = cohort(patients, vec![], vec![], visits);

        let subset: BTreeSet<PatientId> = [2, 3, 5, 7, 8].into_iter().collect();
        let filtered = full.filter_by_patient_ids(&subset);

        let direct = survival_records(&filtered);
        let discarded: Vec<_> = survival_records(&full)
            .into_iter()
            .filter(|rec| subset.contains(&rec.patient_id))
            .collect();
        assert_eq!(direct, discarded);
    }
}
