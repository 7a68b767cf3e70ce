use serde::Deserialize;

use crate::users::ProfileFields;

#[derive(Debug, Default, Deserialize)]
pub struct CompleteProfileRequest {
    #[serde(default)]
    pub committee: String,
    #[serde(default)]
    pub portfolio: String,
    #[serde(default)]
    pub class: String,
    #[serde(default)]
    pub school: String,
}

impl CompleteProfileRequest {
    /// Trimmed attributes, or `None` if any of them is blank.
    pub fn into_fields(self) -> Option<ProfileFields> {
        let fields = ProfileFields {
            committee: self.committee.trim().to_string(),
            portfolio: self.portfolio.trim().to_string(),
            class: self.class.trim().to_string(),
            school: self.school.trim().to_string(),
        };
        let blank = [&fields.committee, &fields.portfolio, &fields.class, &fields.school]
            .iter()
            .any(|v| v.is_empty());
        (!blank).then_some(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(committee: &str, portfolio: &str, class: &str, school: &str) -> CompleteProfileRequest {
        CompleteProfileRequest {
            committee: committee.into(),
            portfolio: portfolio.into(),
            class: class.into(),
            school: school.into(),
        }
    }

    #[test]
    fn trims_every_attribute() {
        let fields = request(" UNSC ", "France", " 11 ", "Central High ").into_fields().unwrap();
        assert_eq!(fields.committee, "UNSC");
        assert_eq!(fields.class, "11");
        assert_eq!(fields.school, "Central High");
    }

    #[test]
    fn blank_attribute_is_rejected() {
        assert!(request("UNSC", "France", "   ", "Central High").into_fields().is_none());
        assert!(CompleteProfileRequest::default().into_fields().is_none());
    }
}
