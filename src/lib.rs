pub mod analytics;
pub mod seed;
mod util;

pub use anyhow::{Context, Error};
use chrono::{Datelike, NaiveDate};
use itertools::Either;
use qu::ick_use::*;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    collections::{BTreeMap, BTreeSet},
    fmt, fs, io, iter,
    ops::Deref,
    path::{Path, PathBuf},
    sync::Arc,
};

pub use crate::util::{fmt_opt_days, header, percent};
use crate::util::{idh_or_unknown, mgmt_or_unknown, optional_string};

/// The registry snapshot is a point-in-time extract; follow-up windows and
/// ages are measured against this date.
pub fn date_of_extract() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()
}

pub type ArcStr = Arc<str>;
pub type Result<T = (), E = anyhow::Error> = std::result::Result<T, E>;
pub type PatientId = u64;

#[derive(Debug, Clone, Deserialize)]
struct PatientRaw {
    #[serde(rename = "PatID")]
    patient_id: PatientId,
    #[serde(rename = "MRN")]
    mrn: ArcStr,
    #[serde(rename = "DateOfBirth")]
    date_of_birth: NaiveDate,
    #[serde(rename = "Gender")]
    gender: Gender,
    #[serde(rename = "InitialDiagnosisDate")]
    initial_diagnosis_date: Option<NaiveDate>,
    #[serde(rename = "PrimaryLocation", deserialize_with = "optional_string")]
    primary_location: Option<ArcStr>,
}

/// A row in the patients table.
///
/// In this and the other tables, `patient_id` (PatID) always identifies the
/// same patient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    pub patient_id: PatientId,
    pub mrn: ArcStr,
    pub date_of_birth: NaiveDate,
    pub gender: Gender,
    /// Date of the histologically confirmed diagnosis. Missing for patients
    /// whose diagnosis predates the registry.
    pub initial_diagnosis_date: Option<NaiveDate>,
    pub primary_location: Option<ArcStr>,
}

impl From<PatientRaw> for Patient {
    fn from(from: PatientRaw) -> Self {
        Self {
            patient_id: from.patient_id,
            mrn: from.mrn,
            date_of_birth: from.date_of_birth,
            gender: from.gender,
            initial_diagnosis_date: from.initial_diagnosis_date,
            primary_location: from.primary_location,
        }
    }
}

impl Patient {
    pub fn age_at(&self, date: impl Datelike) -> i32 {
        date.year() - self.date_of_birth.year()
    }
}

/// The parsed list of patients, with a pre-built index for the `patient_id`
/// field.
pub struct Patients {
    els: Arc<Vec<Patient>>,
    id_idx: BTreeMap<PatientId, usize>,
}

impl Patients {
    pub fn load_orig(path: impl AsRef<Path>) -> Result<Self> {
        let raw: Vec<PatientRaw> = load_orig(path)?;
        Ok(Self::new(raw.into_iter().map(Into::into).collect()))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(load(path)?))
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result {
        save(&self.els, path)
    }

    pub fn find_by_id(&self, id: PatientId) -> Option<&Patient> {
        let idx = self.id_idx.get(&id)?;
        self.els.get(*idx)
    }

    pub fn all_ids(&self) -> BTreeSet<PatientId> {
        self.els.iter().map(|pat| pat.patient_id).collect()
    }

    pub fn count_genders(&self) -> BTreeMap<Gender, usize> {
        // B Tree so we get a predictable ordering. Manually insert to make
        // sure all categories are included.
        let mut map = BTreeMap::new();
        map.insert(Gender::Male, 0);
        map.insert(Gender::Female, 0);
        map.insert(Gender::Other, 0);
        map.insert(Gender::Unknown, 0);
        for el in self.els.iter() {
            *map.entry(el.gender).or_insert(0) += 1;
        }
        map
    }

    pub fn iter(&self) -> impl Iterator<Item = Patient> + '_ {
        self.els.iter().cloned()
    }

    pub fn iter_ref(&self) -> impl Iterator<Item = &Patient> + '_ {
        self.els.iter()
    }

    pub fn filter(&self, f: impl Fn(&Patient) -> bool) -> Self {
        Self::new(self.iter().filter(f).collect())
    }

    pub fn retain(&mut self, f: impl Fn(&Patient) -> bool) {
        Arc::make_mut(&mut self.els).retain(f);
        self.rebuild_index();
    }

    pub(crate) fn new(els: Vec<Patient>) -> Self {
        let mut this = Patients {
            els: els.into(),
            id_idx: BTreeMap::new(),
        };
        this.rebuild_index();
        this
    }

    fn rebuild_index(&mut self) {
        self.id_idx.clear();
        for (idx, el) in self.els.iter().enumerate() {
            self.id_idx.insert(el.patient_id, idx);
        }
    }
}

impl Deref for Patients {
    type Target = [Patient];
    fn deref(&self) -> &Self::Target {
        &self.els
    }
}

impl FromIterator<Patient> for Patients {
    fn from_iter<T: IntoIterator<Item = Patient>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[derive(Debug, Clone, Deserialize)]
struct SurgeryRaw {
    #[serde(rename = "PatID")]
    patient_id: PatientId,
    #[serde(rename = "SurgeryDate")]
    surgery_date: NaiveDate,
    #[serde(rename = "SurgeryType")]
    surgery_type: SurgeryType,
    #[serde(rename = "ExtentOfResection", deserialize_with = "optional_string")]
    extent_of_resection: Option<ArcStr>,
}

/// A row in the surgeries table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Surgery {
    pub patient_id: PatientId,
    pub surgery_date: NaiveDate,
    pub surgery_type: SurgeryType,
    pub extent_of_resection: Option<ArcStr>,
}

impl From<SurgeryRaw> for Surgery {
    fn from(from: SurgeryRaw) -> Self {
        Self {
            patient_id: from.patient_id,
            surgery_date: from.surgery_date,
            surgery_type: from.surgery_type,
            extent_of_resection: from.extent_of_resection,
        }
    }
}

/// The parsed list of surgeries, with a pre-built index for the `patient_id`
/// field.
pub struct Surgeries {
    els: Arc<Vec<Surgery>>,
    id_idx: BTreeMap<PatientId, Vec<usize>>,
}

impl Surgeries {
    pub fn load_orig(path: impl AsRef<Path>) -> Result<Self> {
        let raw: Vec<SurgeryRaw> = load_orig(path)?;
        Ok(Self::new(raw.into_iter().map(Into::into).collect()))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(load(path)?))
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result {
        save(&self.els, path)
    }

    pub fn for_patient(&self, id: PatientId) -> impl Iterator<Item = &Surgery> + Clone + '_ {
        indexed_for_patient(&self.id_idx, &self.els, id)
    }

    pub fn iter(&self) -> impl Iterator<Item = Surgery> + '_ {
        self.els.iter().cloned()
    }

    pub fn filter(&self, f: impl Fn(&Surgery) -> bool) -> Self {
        Self::new(self.iter().filter(f).collect())
    }

    pub fn retain(&mut self, f: impl Fn(&Surgery) -> bool) {
        Arc::make_mut(&mut self.els).retain(f);
        self.rebuild_index();
    }

    pub(crate) fn new(els: Vec<Surgery>) -> Self {
        let mut this = Surgeries {
            els: Arc::new(els),
            id_idx: BTreeMap::new(),
        };
        this.rebuild_index();
        this
    }

    fn rebuild_index(&mut self) {
        self.id_idx.clear();
        for (idx, el) in self.els.iter().enumerate() {
            self.id_idx.entry(el.patient_id).or_default().push(idx);
        }
    }
}

impl Deref for Surgeries {
    type Target = [Surgery];
    fn deref(&self) -> &Self::Target {
        &self.els
    }
}

#[derive(Debug, Clone, Deserialize)]
struct PathologyRaw {
    #[serde(rename = "PatID")]
    patient_id: PatientId,
    #[serde(rename = "SpecimenDate")]
    specimen_date: NaiveDate,
    #[serde(rename = "HistologicDiagnosis")]
    histologic_diagnosis: ArcStr,
    #[serde(rename = "WHOGrade")]
    who_grade: Option<WhoGrade>,
    #[serde(rename = "IDHStatus", deserialize_with = "idh_or_unknown")]
    idh_status: IdhStatus,
    #[serde(rename = "MGMTStatus", deserialize_with = "mgmt_or_unknown")]
    mgmt_status: MgmtStatus,
}

/// A row in the pathologies table.
///
/// Molecular marker fields map missing values to the explicit `Unknown`
/// category so that correlation buckets can carry them rather than dropping
/// the patient. WHO grade has no unknown category in the source data, so it
/// stays optional.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pathology {
    pub patient_id: PatientId,
    pub specimen_date: NaiveDate,
    pub histologic_diagnosis: ArcStr,
    pub who_grade: Option<WhoGrade>,
    pub idh_status: IdhStatus,
    pub mgmt_status: MgmtStatus,
}

impl From<PathologyRaw> for Pathology {
    fn from(from: PathologyRaw) -> Self {
        Self {
            patient_id: from.patient_id,
            specimen_date: from.specimen_date,
            histologic_diagnosis: from.histologic_diagnosis,
            who_grade: from.who_grade,
            idh_status: from.idh_status,
            mgmt_status: from.mgmt_status,
        }
    }
}

/// The parsed list of pathology reports, with a pre-built index for the
/// `patient_id` field.
pub struct Pathologies {
    els: Arc<Vec<Pathology>>,
    id_idx: BTreeMap<PatientId, Vec<usize>>,
}

impl Pathologies {
    pub fn load_orig(path: impl AsRef<Path>) -> Result<Self> {
        let raw: Vec<PathologyRaw> = load_orig(path)?;
        Ok(Self::new(raw.into_iter().map(Into::into).collect()))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(load(path)?))
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result {
        save(&self.els, path)
    }

    pub fn for_patient(&self, id: PatientId) -> impl Iterator<Item = &Pathology> + Clone + '_ {
        indexed_for_patient(&self.id_idx, &self.els, id)
    }

    /// The pathology report used for molecular grouping: the earliest by
    /// specimen date, so each patient lands in exactly one marker bucket.
    pub fn earliest_for_patient(&self, id: PatientId) -> Option<&Pathology> {
        self.for_patient(id).min_by_key(|path| path.specimen_date)
    }

    pub fn iter(&self) -> impl Iterator<Item = Pathology> + '_ {
        self.els.iter().cloned()
    }

    pub fn filter(&self, f: impl Fn(&Pathology) -> bool) -> Self {
        Self::new(self.iter().filter(f).collect())
    }

    pub fn retain(&mut self, f: impl Fn(&Pathology) -> bool) {
        Arc::make_mut(&mut self.els).retain(f);
        self.rebuild_index();
    }

    pub(crate) fn new(els: Vec<Pathology>) -> Self {
        let mut this = Pathologies {
            els: Arc::new(els),
            id_idx: BTreeMap::new(),
        };
        this.rebuild_index();
        this
    }

    fn rebuild_index(&mut self) {
        self.id_idx.clear();
        for (idx, el) in self.els.iter().enumerate() {
            self.id_idx.entry(el.patient_id).or_default().push(idx);
        }
    }
}

impl Deref for Pathologies {
    type Target = [Pathology];
    fn deref(&self) -> &Self::Target {
        &self.els
    }
}

#[derive(Debug, Clone, Deserialize)]
struct TreatmentRaw {
    #[serde(rename = "PatID")]
    patient_id: PatientId,
    #[serde(rename = "TreatmentType")]
    treatment_type: TreatmentType,
    #[serde(rename = "StartDate")]
    start_date: NaiveDate,
    #[serde(rename = "EndDate")]
    end_date: Option<NaiveDate>,
    #[serde(rename = "CyclesPlanned")]
    cycles_planned: Option<u16>,
    #[serde(rename = "CyclesDelivered")]
    cycles_delivered: Option<u16>,
}

/// A row in the treatments table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Treatment {
    pub patient_id: PatientId,
    pub treatment_type: TreatmentType,
    pub start_date: NaiveDate,
    /// Missing while the treatment is ongoing.
    pub end_date: Option<NaiveDate>,
    pub cycles_planned: Option<u16>,
    pub cycles_delivered: Option<u16>,
}

impl From<TreatmentRaw> for Treatment {
    fn from(from: TreatmentRaw) -> Self {
        Self {
            patient_id: from.patient_id,
            treatment_type: from.treatment_type,
            start_date: from.start_date,
            end_date: from.end_date,
            cycles_planned: from.cycles_planned,
            cycles_delivered: from.cycles_delivered,
        }
    }
}

/// The parsed list of treatments, with a pre-built index for the
/// `patient_id` field.
pub struct Treatments {
    els: Arc<Vec<Treatment>>,
    id_idx: BTreeMap<PatientId, Vec<usize>>,
}

impl Treatments {
    pub fn load_orig(path: impl AsRef<Path>) -> Result<Self> {
        let raw: Vec<TreatmentRaw> = load_orig(path)?;
        Ok(Self::new(raw.into_iter().map(Into::into).collect()))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(load(path)?))
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result {
        save(&self.els, path)
    }

    pub fn for_patient(&self, id: PatientId) -> impl Iterator<Item = &Treatment> + Clone + '_ {
        indexed_for_patient(&self.id_idx, &self.els, id)
    }

    pub fn iter(&self) -> impl Iterator<Item = Treatment> + '_ {
        self.els.iter().cloned()
    }

    pub fn filter(&self, f: impl Fn(&Treatment) -> bool) -> Self {
        Self::new(self.iter().filter(f).collect())
    }

    pub fn retain(&mut self, f: impl Fn(&Treatment) -> bool) {
        Arc::make_mut(&mut self.els).retain(f);
        self.rebuild_index();
    }

    pub(crate) fn new(els: Vec<Treatment>) -> Self {
        let mut this = Treatments {
            els: Arc::new(els),
            id_idx: BTreeMap::new(),
        };
        this.rebuild_index();
        this
    }

    fn rebuild_index(&mut self) {
        self.id_idx.clear();
        for (idx, el) in self.els.iter().enumerate() {
            self.id_idx.entry(el.patient_id).or_default().push(idx);
        }
    }
}

impl Deref for Treatments {
    type Target = [Treatment];
    fn deref(&self) -> &Self::Target {
        &self.els
    }
}

#[derive(Debug, Clone, Deserialize)]
struct VisitRaw {
    #[serde(rename = "PatID")]
    patient_id: PatientId,
    #[serde(rename = "VisitDate")]
    visit_date: NaiveDate,
    #[serde(rename = "ImagingResponse")]
    imaging_response: Option<ImagingResponse>,
    #[serde(rename = "NeurologicalStatus")]
    neurological_status: Option<NeurologicalStatus>,
    #[serde(rename = "KPSScore")]
    kps_score: Option<u8>,
}

/// A row in the follow-up visits table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Visit {
    pub patient_id: PatientId,
    pub visit_date: NaiveDate,
    /// `None` when no imaging assessment was made at this visit.
    pub imaging_response: Option<ImagingResponse>,
    pub neurological_status: Option<NeurologicalStatus>,
    /// Karnofsky performance status, 0-100.
    pub kps_score: Option<u8>,
}

impl From<VisitRaw> for Visit {
    fn from(from: VisitRaw) -> Self {
        Self {
            patient_id: from.patient_id,
            visit_date: from.visit_date,
            imaging_response: from.imaging_response,
            neurological_status: from.neurological_status,
            kps_score: from.kps_score,
        }
    }
}

/// The parsed list of follow-up visits, with a pre-built index for the
/// `patient_id` field.
pub struct Visits {
    els: Arc<Vec<Visit>>,
    id_idx: BTreeMap<PatientId, Vec<usize>>,
}

impl Visits {
    pub fn load_orig(path: impl AsRef<Path>) -> Result<Self> {
        let raw: Vec<VisitRaw> = load_orig(path)?;
        Ok(Self::new(raw.into_iter().map(Into::into).collect()))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(load(path)?))
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result {
        save(&self.els, path)
    }

    pub fn for_patient(&self, id: PatientId) -> impl Iterator<Item = &Visit> + Clone + '_ {
        indexed_for_patient(&self.id_idx, &self.els, id)
    }

    /// "Last follow-up" in the survival sense: the maximum visit date
    /// recorded for the patient.
    pub fn last_visit_date(&self, id: PatientId) -> Option<NaiveDate> {
        self.for_patient(id).map(|v| v.visit_date).max()
    }

    /// The date of the first visit showing progressive disease, if any.
    pub fn first_progression_date(&self, id: PatientId) -> Option<NaiveDate> {
        self.for_patient(id)
            .filter(|v| v.imaging_response == Some(ImagingResponse::ProgressiveDisease))
            .map(|v| v.visit_date)
            .min()
    }

    pub fn iter(&self) -> impl Iterator<Item = Visit> + '_ {
        self.els.iter().cloned()
    }

    pub fn filter(&self, f: impl Fn(&Visit) -> bool) -> Self {
        Self::new(self.iter().filter(f).collect())
    }

    pub fn retain(&mut self, f: impl Fn(&Visit) -> bool) {
        Arc::make_mut(&mut self.els).retain(f);
        self.rebuild_index();
    }

    pub(crate) fn new(els: Vec<Visit>) -> Self {
        let mut this = Visits {
            els: Arc::new(els),
            id_idx: BTreeMap::new(),
        };
        this.rebuild_index();
        this
    }

    fn rebuild_index(&mut self) {
        self.id_idx.clear();
        for (idx, el) in self.els.iter().enumerate() {
            self.id_idx.entry(el.patient_id).or_default().push(idx);
        }
    }
}

impl Deref for Visits {
    type Target = [Visit];
    fn deref(&self) -> &Self::Target {
        &self.els
    }
}

/// Shared lookup for tables indexed by patient id.
fn indexed_for_patient<'a, T>(
    idx: &'a BTreeMap<PatientId, Vec<usize>>,
    els: &'a [T],
    id: PatientId,
) -> impl Iterator<Item = &'a T> + Clone + 'a {
    let idxs = match idx.get(&id) {
        Some(idxs) => idxs,
        None => return Either::Left(iter::empty()),
    };
    Either::Right(
        idxs.iter()
            .map(move |i| els.get(*i).expect("inconsistent patient_id index")),
    )
}

/// The full registry snapshot: every table, loaded into memory.
///
/// Analytics always run against a `Cohort` so that the nested tables are
/// guaranteed to describe the same set of patients.
pub struct Cohort {
    pub patients: Patients,
    pub surgeries: Surgeries,
    pub pathologies: Pathologies,
    pub treatments: Treatments,
    pub visits: Visits,
}

impl Cohort {
    /// Load the standard snapshot files from the output directory.
    pub fn load() -> Result<Self> {
        Ok(Cohort {
            patients: Patients::load("patients.bin")?,
            surgeries: Surgeries::load("surgeries.bin")?,
            pathologies: Pathologies::load("pathologies.bin")?,
            treatments: Treatments::load("treatments.bin")?,
            visits: Visits::load("visits.bin")?,
        })
    }

    pub fn save(&self) -> Result {
        self.patients.save("patients.bin")?;
        self.surgeries.save("surgeries.bin")?;
        self.pathologies.save("pathologies.bin")?;
        self.treatments.save("treatments.bin")?;
        self.visits.save("visits.bin")?;
        Ok(())
    }

    /// Restrict every table to the given patient ids.
    ///
    /// Ids not present in the registry are ignored; an empty set produces an
    /// empty cohort.
    pub fn filter_by_patient_ids(&self, ids: &BTreeSet<PatientId>) -> Self {
        Cohort {
            patients: self.patients.filter(|pat| ids.contains(&pat.patient_id)),
            surgeries: self.surgeries.filter(|s| ids.contains(&s.patient_id)),
            pathologies: self.pathologies.filter(|p| ids.contains(&p.patient_id)),
            treatments: self.treatments.filter(|t| ids.contains(&t.patient_id)),
            visits: self.visits.filter(|v| ids.contains(&v.patient_id)),
        }
    }

    /// Apply the optional id filter that report programs take on the command
    /// line. An empty list means "all patients".
    pub fn restrict(self, ids: &[PatientId]) -> Self {
        if ids.is_empty() {
            return self;
        }
        let ids = ids.iter().copied().collect();
        let filtered = self.filter_by_patient_ids(&ids);
        event!(
            Level::INFO,
            "restricted cohort to {} of {} patients",
            filtered.patients.len(),
            self.patients.len()
        );
        filtered
    }
}

// Categorical fields. Serde names match the registry extract encoding.

/// Ordering is arbitrary (used for stable table ordering only).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Gender {
    #[serde(rename = "male")]
    Male,
    #[serde(rename = "female")]
    Female,
    #[serde(rename = "other")]
    Other,
    #[serde(rename = "unknown")]
    Unknown,
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Gender::Male => f.write_str("male"),
            Gender::Female => f.write_str("female"),
            Gender::Other => f.write_str("other"),
            Gender::Unknown => f.write_str("unknown"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum WhoGrade {
    #[serde(rename = "I")]
    I,
    #[serde(rename = "II")]
    Ii,
    #[serde(rename = "III")]
    Iii,
    #[serde(rename = "IV")]
    Iv,
}

impl fmt::Display for WhoGrade {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            WhoGrade::I => f.write_str("I"),
            WhoGrade::Ii => f.write_str("II"),
            WhoGrade::Iii => f.write_str("III"),
            WhoGrade::Iv => f.write_str("IV"),
        }
    }
}

/// IDH mutation status. Missing extract values become `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum IdhStatus {
    #[serde(rename = "wildtype")]
    Wildtype,
    #[serde(rename = "mutant")]
    Mutant,
    #[serde(rename = "unknown")]
    Unknown,
}

impl fmt::Display for IdhStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            IdhStatus::Wildtype => f.write_str("wildtype"),
            IdhStatus::Mutant => f.write_str("mutant"),
            IdhStatus::Unknown => f.write_str("unknown"),
        }
    }
}

/// MGMT promoter methylation status. Missing extract values become `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MgmtStatus {
    #[serde(rename = "methylated")]
    Methylated,
    #[serde(rename = "unmethylated")]
    Unmethylated,
    #[serde(rename = "unknown")]
    Unknown,
}

impl fmt::Display for MgmtStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MgmtStatus::Methylated => f.write_str("methylated"),
            MgmtStatus::Unmethylated => f.write_str("unmethylated"),
            MgmtStatus::Unknown => f.write_str("unknown"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SurgeryType {
    #[serde(rename = "biopsy")]
    Biopsy,
    #[serde(rename = "partial_resection")]
    PartialResection,
    #[serde(rename = "subtotal_resection")]
    SubtotalResection,
    #[serde(rename = "gross_total_resection")]
    GrossTotalResection,
}

impl fmt::Display for SurgeryType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SurgeryType::Biopsy => f.write_str("biopsy"),
            SurgeryType::PartialResection => f.write_str("partial resection"),
            SurgeryType::SubtotalResection => f.write_str("subtotal resection"),
            SurgeryType::GrossTotalResection => f.write_str("gross total resection"),
        }
    }
}

/// Ordering is arbitrary (used for stable table ordering only).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TreatmentType {
    #[serde(rename = "radiation")]
    Radiation,
    #[serde(rename = "chemotherapy")]
    Chemotherapy,
    #[serde(rename = "immunotherapy")]
    Immunotherapy,
    #[serde(rename = "targeted_therapy")]
    TargetedTherapy,
    #[serde(rename = "combination")]
    Combination,
}

impl fmt::Display for TreatmentType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TreatmentType::Radiation => f.write_str("radiation"),
            TreatmentType::Chemotherapy => f.write_str("chemotherapy"),
            TreatmentType::Immunotherapy => f.write_str("immunotherapy"),
            TreatmentType::TargetedTherapy => f.write_str("targeted therapy"),
            TreatmentType::Combination => f.write_str("combination"),
        }
    }
}

/// RECIST-style imaging response category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ImagingResponse {
    #[serde(rename = "complete_response")]
    CompleteResponse,
    #[serde(rename = "partial_response")]
    PartialResponse,
    #[serde(rename = "stable_disease")]
    StableDisease,
    #[serde(rename = "progressive_disease")]
    ProgressiveDisease,
}

impl ImagingResponse {
    /// CR > PR > SD > PD. An unassessed visit (`None` in the record) never
    /// competes, so 0 is reserved for it implicitly.
    pub fn priority(self) -> u8 {
        match self {
            ImagingResponse::CompleteResponse => 4,
            ImagingResponse::PartialResponse => 3,
            ImagingResponse::StableDisease => 2,
            ImagingResponse::ProgressiveDisease => 1,
        }
    }

    /// An objective response in the RECIST sense.
    pub fn is_objective_response(self) -> bool {
        matches!(
            self,
            ImagingResponse::CompleteResponse | ImagingResponse::PartialResponse
        )
    }
}

impl fmt::Display for ImagingResponse {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ImagingResponse::CompleteResponse => f.write_str("complete response"),
            ImagingResponse::PartialResponse => f.write_str("partial response"),
            ImagingResponse::StableDisease => f.write_str("stable disease"),
            ImagingResponse::ProgressiveDisease => f.write_str("progressive disease"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum NeurologicalStatus {
    #[serde(rename = "stable")]
    Stable,
    #[serde(rename = "improved")]
    Improved,
    #[serde(rename = "declined")]
    Declined,
}

impl fmt::Display for NeurologicalStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            NeurologicalStatus::Stable => f.write_str("stable"),
            NeurologicalStatus::Improved => f.write_str("improved"),
            NeurologicalStatus::Declined => f.write_str("declined"),
        }
    }
}

/// Load data into memory.
fn load<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<Vec<T>> {
    fn inner<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
        let reader = io::BufReader::new(fs::File::open(path)?);
        bincode::deserialize_from(reader).map_err(Into::into)
    }
    let path = output_path(path.as_ref());
    check_extension(&path, "bin")?;

    inner(&path).with_context(|| format!("unable to load data from \"{}\"", path.display()))
}

/// Save data to disk.
fn save<T: Serialize>(contents: &[T], path: impl AsRef<Path>) -> Result {
    fn inner<T: Serialize>(contents: &[T], path: &Path) -> Result {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("could not create parent")?;
        }
        if util::path_exists(path)? {
            event!(
                Level::WARN,
                "overwriting existing file at \"{}\"",
                path.display()
            );
        }
        let mut out = io::BufWriter::new(fs::File::create(path)?);
        bincode::serialize_into(&mut out, contents)?;
        Ok(())
    }
    let path = output_path(path.as_ref());
    check_extension(&path, "bin")?;

    inner(contents, &path).with_context(|| format!("unable to save data to \"{}\"", path.display()))
}

/// Load data into memory from the original registry extract.
fn load_orig<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<Vec<T>> {
    let path = orig_path(path.as_ref());
    csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(&path)?
        .into_deserialize()
        .collect::<Result<Vec<T>, _>>()
        .with_context(|| format!("while loading \"{}\"", path.display()))
}

/// Note: No protection from escaping the root directory.
pub fn orig_path(input: &Path) -> PathBuf {
    Path::new("data/registry").join(input)
}

/// Note: No protection from escaping the root directory.
pub fn output_path(input: &Path) -> PathBuf {
    Path::new("data/output").join(input)
}

pub fn check_extension(path: &Path, ext: &str) -> Result<()> {
    ensure!(
        matches!(path.extension(), Some(p) if p == ext),
        "filename should end with `.{}`",
        ext
    );
    Ok(())
}
