//! Typed form draft edited by the dispatcher.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::pricing::services::PricingInput;

/// Vehicle chosen on the form (from the registry lookup or typed by hand)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VehicleSelection {
    pub plate: String,
    /// Pricing category key (private, motorcycle, heavy, machinery)
    pub category: Option<String>,
    pub manufacturer: String,
    pub model: String,
    pub color: String,
    pub year: Option<u16>,
}

/// Address as typed, plus the resolved address picked from autocomplete
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AddressInput {
    pub text: String,
    pub physical_address: Option<String>,
}

impl AddressInput {
    /// Address to send to the distance provider
    pub fn for_lookup(&self) -> &str {
        match self.physical_address.as_deref().map(str::trim) {
            Some(resolved) if !resolved.is_empty() => resolved,
            _ => self.text.trim(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContactDetails {
    pub name: String,
    pub phone: String,
}

/// Everything the dispatcher has entered so far
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FormDraft {
    pub vehicle: VehicleSelection,
    pub source: AddressInput,
    pub destination: AddressInput,
    pub contact: ContactDetails,
    /// Planned job time; `None` means "now"
    pub planned_at: Option<NaiveDateTime>,
    pub outskirts: bool,
    pub notes: String,
}

impl FormDraft {
    pub fn pricing_input(&self) -> PricingInput {
        PricingInput {
            category: self.vehicle.category.clone(),
            source: self.source.for_lookup().to_string(),
            destination: self.destination.for_lookup().to_string(),
            outskirts: self.outskirts,
        }
    }

    /// New values of the fields that require a full recalculation, for
    /// each one that differs from `previous`.
    pub fn pricing_edits(&self, previous: &FormDraft) -> Vec<String> {
        let mut edits = Vec::new();
        if self.vehicle.category != previous.vehicle.category {
            edits.push(self.vehicle.category.clone().unwrap_or_default());
        }
        if self.source.for_lookup() != previous.source.for_lookup() {
            edits.push(self.source.for_lookup().to_string());
        }
        if self.destination.for_lookup() != previous.destination.for_lookup() {
            edits.push(self.destination.for_lookup().to_string());
        }
        edits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(source: &str, destination: &str) -> FormDraft {
        FormDraft {
            vehicle: VehicleSelection {
                category: Some("private".to_string()),
                ..VehicleSelection::default()
            },
            source: AddressInput {
                text: source.to_string(),
                physical_address: None,
            },
            destination: AddressInput {
                text: destination.to_string(),
                physical_address: None,
            },
            ..FormDraft::default()
        }
    }

    #[test]
    fn test_lookup_prefers_resolved_address() {
        let address = AddressInput {
            text: "herzl 12".to_string(),
            physical_address: Some("Herzl St 12, Haifa, Israel".to_string()),
        };
        assert_eq!(address.for_lookup(), "Herzl St 12, Haifa, Israel");

        let address = AddressInput {
            text: " herzl 12 ".to_string(),
            physical_address: Some("  ".to_string()),
        };
        assert_eq!(address.for_lookup(), "herzl 12");
    }

    #[test]
    fn test_pricing_edits_reports_changed_fields_only() {
        let before = draft("Haifa", "Acre");
        let mut after = before.clone();
        after.contact.name = "Dana".to_string();
        after.notes = "gate code 1234".to_string();
        assert!(after.pricing_edits(&before).is_empty());

        after.destination.text = "Nahariya".to_string();
        assert_eq!(after.pricing_edits(&before), vec!["Nahariya".to_string()]);
    }

    #[test]
    fn test_pricing_input_uses_draft_fields() {
        let mut form = draft("Haifa", "Acre");
        form.outskirts = true;
        let input = form.pricing_input();
        assert_eq!(input.category.as_deref(), Some("private"));
        assert_eq!(input.source, "Haifa");
        assert!(input.outskirts);
    }

    #[test]
    fn test_draft_deserializes_camel_case_with_defaults() {
        let form: FormDraft = serde_json::from_value(serde_json::json!({
            "vehicle": {"plate": "12-345-67", "category": "heavy"},
            "source": {"text": "Haifa port", "physicalAddress": "Haifa Port, Israel"},
            "plannedAt": "2024-06-04T10:00:00"
        }))
        .unwrap();

        assert_eq!(form.vehicle.category.as_deref(), Some("heavy"));
        assert_eq!(form.source.for_lookup(), "Haifa Port, Israel");
        assert!(form.planned_at.is_some());
        assert!(form.destination.text.is_empty());
    }
}
