use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Raw profile fields as submitted by the candidate. Every field is optional on the wire;
/// `missing_fields` decides whether the form can start a session.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProfileForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub experience: u32,
    pub position: String,
    pub location: String,
    pub tech_stack: String,
}

impl ProfileForm {
    /// Labels of the required fields that are blank after trimming.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("name", &self.name),
            ("email", &self.email),
            ("tech_stack", &self.tech_stack),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(label, _)| label)
        .collect()
    }

    pub fn into_profile(self, created_at: DateTime<Utc>) -> CandidateProfile {
        CandidateProfile {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: self.phone.trim().to_string(),
            experience: self.experience,
            position: self.position.trim().to_string(),
            location: self.location.trim().to_string(),
            tech_stack: self.tech_stack.trim().to_string(),
            created_at,
        }
    }
}

/// A submitted candidate profile. Immutable for the life of a session and persisted
/// exactly once, with the record keys below.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CandidateProfile {
    pub name: String,
    pub email: String,
    pub phone: String,
    /// Years of experience.
    pub experience: u32,
    pub position: String,
    pub location: String,
    pub tech_stack: String,
    #[serde(rename = "timestamp")]
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_lists_every_blank_required_field() {
        let form = ProfileForm {
            name: "  ".to_string(),
            phone: "555-0100".to_string(),
            ..Default::default()
        };
        assert_eq!(form.missing_fields(), vec!["name", "email", "tech_stack"]);
    }

    #[test]
    fn test_missing_fields_empty_when_required_present() {
        let form = ProfileForm {
            name: "Ana".to_string(),
            email: "a@x.com".to_string(),
            tech_stack: "Python, Docker".to_string(),
            ..Default::default()
        };
        assert!(form.missing_fields().is_empty());
    }

    #[test]
    fn test_profile_serializes_with_record_keys() {
        let form = ProfileForm {
            name: " Ana ".to_string(),
            email: "a@x.com".to_string(),
            experience: 3,
            tech_stack: "Python, Docker".to_string(),
            ..Default::default()
        };
        let profile = form.into_profile(Utc::now());
        assert_eq!(profile.name, "Ana");

        let value = serde_json::to_value(&profile).unwrap();
        let mut keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        keys.sort();
        assert_eq!(
            keys,
            vec![
                "email",
                "experience",
                "location",
                "name",
                "phone",
                "position",
                "tech_stack",
                "timestamp"
            ]
        );
        assert_eq!(value["experience"], 3);
    }

    #[test]
    fn test_profile_form_rejects_negative_experience() {
        let result: Result<ProfileForm, _> =
            serde_json::from_value(serde_json::json!({"name": "Ana", "experience": -1}));
        assert!(result.is_err());
    }
}
