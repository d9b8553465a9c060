//! Subject extraction: FHIR patients to phenopacket individuals and back.

use crate::constants::{PATO_SYSTEM, PATO_VERSION};
use crate::registry::CodingRegistry;
use chrono::{DateTime, Utc};
use fhir::{AdministrativeGender, Patient};
use phenopackets::{Individual, Resource, Sex};

/// Administrative gender to phenotypic sex.
pub fn to_sex(gender: AdministrativeGender) -> Sex {
    match gender {
        AdministrativeGender::Male => Sex::Male,
        AdministrativeGender::Female => Sex::Female,
        AdministrativeGender::Other => Sex::OtherSex,
        AdministrativeGender::Unknown => Sex::UnknownSex,
    }
}

/// Phenotypic sex to administrative gender.
pub fn to_gender(sex: Sex) -> AdministrativeGender {
    match sex {
        Sex::Male => AdministrativeGender::Male,
        Sex::Female => AdministrativeGender::Female,
        Sex::OtherSex => AdministrativeGender::Other,
        Sex::UnknownSex => AdministrativeGender::Unknown,
    }
}

/// Convert a patient into an individual with no features.
///
/// An absent gender leaves `sex` unset; an explicit `unknown` becomes [`Sex::UnknownSex`].
pub fn extract_individual(patient: &Patient) -> Individual {
    let mut individual = Individual::new(patient.id_str());
    merge_patient(&mut individual, patient);
    individual
}

/// Fold another patient resource describing the same person into `individual`.
///
/// Fields present on `patient` overwrite earlier values; absent fields leave them alone.
/// Features are never touched.
pub fn merge_patient(individual: &mut Individual, patient: &Patient) {
    if let Some(birth_date) = patient.birth_date {
        individual.date_of_birth = whole_seconds(birth_date);
    }
    if let Some(gender) = patient.gender {
        individual.sex = Some(to_sex(gender));
    }
}

/// Convert an individual back into a patient resource. Features are not carried.
pub fn to_patient(individual: &Individual) -> Patient {
    Patient {
        id: (!individual.id.is_empty()).then(|| individual.id.clone()),
        birth_date: individual.date_of_birth,
        gender: individual.sex.map(to_gender),
    }
}

/// Provenance resource for the ontology the sex concept comes from.
///
/// Uses the namespace table entry when PATO is registered, otherwise the built-in PATO release.
pub fn sex_resource(registry: &CodingRegistry<'_>, sex: Sex) -> Resource {
    let curie = sex.ontology_class().id;
    if registry.system_for(&curie).is_some() {
        registry.resource_for_curie(&curie)
    } else {
        registry.register_or_lookup(PATO_SYSTEM, &curie, Some(PATO_VERSION))
    }
}

/// Drop sub-second precision.
pub(crate) fn whole_seconds(instant: DateTime<Utc>) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(instant.timestamp(), 0)
}
