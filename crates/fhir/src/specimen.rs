//! FHIR-aligned specimen resource and wire translation helpers.

use crate::datatypes::{CodeableConcept, Reference};
use serde::{Deserialize, Serialize};

/// Domain-level specimen resource.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Specimen {
    pub id: Option<String>,

    /// Kind of material that forms the specimen.
    pub specimen_type: Option<CodeableConcept>,

    /// Where the specimen came from.
    pub subject: Option<Reference>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub(crate) struct SpecimenWire {
    #[serde(rename = "resourceType")]
    pub resource_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub specimen_type: Option<CodeableConcept>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<Reference>,
}

pub(crate) fn wire_to_domain(wire: SpecimenWire) -> Specimen {
    Specimen {
        id: wire.id,
        specimen_type: wire.specimen_type,
        subject: wire.subject,
    }
}

pub(crate) fn domain_to_wire(specimen: &Specimen) -> SpecimenWire {
    SpecimenWire {
        resource_type: "Specimen".to_string(),
        id: specimen.id.clone(),
        specimen_type: specimen.specimen_type.clone(),
        subject: specimen.subject.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatypes::Coding;

    #[test]
    fn type_uses_reserved_wire_name() {
        let specimen = Specimen {
            id: Some("S1".into()),
            specimen_type: Some(CodeableConcept::from_coding(Coding::new(
                "http://snomed.info/sct",
                "119297000",
                "Blood specimen",
            ))),
            subject: Some(Reference::new("P1")),
        };

        let json = serde_json::to_value(domain_to_wire(&specimen)).expect("serialise");
        assert_eq!(json["resourceType"], "Specimen");
        assert_eq!(json["type"]["coding"][0]["code"], "119297000");
        assert_eq!(json["subject"]["reference"], "P1");

        let wire: SpecimenWire = serde_json::from_value(json).expect("deserialise");
        assert_eq!(wire_to_domain(wire), specimen);
    }
}
