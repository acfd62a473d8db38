//! Directory users shown in the "Local Users" table.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use backoffice_core::{Email, FieldErrors, Gender, UserId};

use super::de::string_or_number;

/// A persisted directory user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub age: i32,
    pub gender: Gender,
    pub email: Email,
    pub phone: String,
    pub date_of_birth: NaiveDate,
    #[serde(default = "Utc::now", skip_serializing)]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now", skip_serializing)]
    pub updated_at: DateTime<Utc>,
}

impl User {
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// The editable fields, e.g. to prefill the edit dialog.
    #[must_use]
    pub fn to_form(&self) -> UserForm {
        UserForm {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            age: self.age.to_string(),
            gender: self.gender.to_string(),
            email: self.email.to_string(),
            phone: self.phone.clone(),
            date_of_birth: self.date_of_birth.format("%Y-%m-%d").to_string(),
        }
    }
}

/// Validated input for creating or replacing a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserDraft {
    pub first_name: String,
    pub last_name: String,
    pub age: i32,
    pub gender: Gender,
    pub email: Email,
    pub phone: String,
    pub date_of_birth: NaiveDate,
}

impl From<User> for UserDraft {
    fn from(user: User) -> Self {
        Self {
            first_name: user.first_name,
            last_name: user.last_name,
            age: user.age,
            gender: user.gender,
            email: user.email,
            phone: user.phone,
            date_of_birth: user.date_of_birth,
        }
    }
}

/// Raw user input from the add/edit dialog or the JSON API.
///
/// Every field is kept as text so a form can be re-rendered exactly as typed
/// when validation fails.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserForm {
    pub first_name: String,
    pub last_name: String,
    #[serde(deserialize_with = "string_or_number")]
    pub age: String,
    pub gender: String,
    pub email: String,
    pub phone: String,
    pub date_of_birth: String,
}

impl UserForm {
    /// Validate into a [`UserDraft`].
    ///
    /// # Errors
    ///
    /// Returns every failing field with its message.
    pub fn validate(&self) -> Result<UserDraft, FieldErrors> {
        let mut errors = FieldErrors::new();

        let first_name = self.first_name.trim();
        errors.check(first_name.is_empty(), "firstName", "First name is required");

        let last_name = self.last_name.trim();
        errors.check(last_name.is_empty(), "lastName", "Last name is required");

        let age_raw = self.age.trim();
        errors.check(age_raw.is_empty(), "age", "Age is required");
        let age = age_raw.parse::<i32>().ok().filter(|a| *a > 0);
        errors.check(age.is_none(), "age", "Age must be a positive number");

        let gender = self.gender.parse::<Gender>().ok();
        errors.check(gender.is_none(), "gender", "Gender is required");

        let email = Email::parse(&self.email).ok();
        errors.check(email.is_none(), "email", "Invalid email address");

        let phone = self.phone.trim();
        errors.check(phone.is_empty(), "phone", "Phone is required");

        let dob_raw = self.date_of_birth.trim();
        errors.check(dob_raw.is_empty(), "dateOfBirth", "Date of birth is required");
        let date_of_birth = NaiveDate::parse_from_str(dob_raw, "%Y-%m-%d").ok();
        errors.check(
            date_of_birth.is_none(),
            "dateOfBirth",
            "Date of birth must be YYYY-MM-DD",
        );

        match (age, gender, email, date_of_birth) {
            (Some(age), Some(gender), Some(email), Some(date_of_birth)) if errors.is_empty() => {
                Ok(UserDraft {
                    first_name: first_name.to_string(),
                    last_name: last_name.to_string(),
                    age,
                    gender,
                    email,
                    phone: phone.to_string(),
                    date_of_birth,
                })
            }
            _ => Err(errors),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn valid_form() -> UserForm {
        UserForm {
            first_name: "Emily".to_string(),
            last_name: "Johnson".to_string(),
            age: "28".to_string(),
            gender: "Female".to_string(),
            email: "Emily.Johnson@x.dummyjson.com".to_string(),
            phone: "+81 965-431-3024".to_string(),
            date_of_birth: "1996-05-30".to_string(),
        }
    }

    #[test]
    fn test_valid_form_normalizes() {
        let draft = valid_form().validate().unwrap();
        assert_eq!(draft.age, 28);
        assert_eq!(draft.gender, Gender::Female);
        assert_eq!(draft.email.as_str(), "emily.johnson@x.dummyjson.com");
        assert_eq!(draft.date_of_birth, NaiveDate::from_ymd_opt(1996, 5, 30).unwrap());
    }

    #[test]
    fn test_empty_form_reports_every_field() {
        let errors = UserForm::default().validate().unwrap_err();
        assert_eq!(errors.get("firstName"), Some("First name is required"));
        assert_eq!(errors.get("lastName"), Some("Last name is required"));
        assert_eq!(errors.get("age"), Some("Age is required"));
        assert_eq!(errors.get("gender"), Some("Gender is required"));
        assert_eq!(errors.get("email"), Some("Invalid email address"));
        assert_eq!(errors.get("phone"), Some("Phone is required"));
        assert_eq!(errors.get("dateOfBirth"), Some("Date of birth is required"));
        assert_eq!(errors.len(), 7);
    }

    #[test]
    fn test_age_must_be_positive_integer() {
        for bad in ["0", "-4", "abc", "12.5"] {
            let form = UserForm {
                age: bad.to_string(),
                ..valid_form()
            };
            let errors = form.validate().unwrap_err();
            assert_eq!(errors.get("age"), Some("Age must be a positive number"), "{bad}");
        }
    }

    #[test]
    fn test_date_of_birth_format() {
        let form = UserForm {
            date_of_birth: "30/05/1996".to_string(),
            ..valid_form()
        };
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.get("dateOfBirth"), Some("Date of birth must be YYYY-MM-DD"));
    }

    #[test]
    fn test_json_accepts_numeric_age() {
        let form: UserForm = serde_json::from_value(serde_json::json!({
            "firstName": "Michael",
            "lastName": "Williams",
            "age": 35,
            "gender": "male",
            "email": "michael.williams@x.dummyjson.com",
            "phone": "+49 258-627-6644",
            "dateOfBirth": "1989-08-10"
        }))
        .unwrap();
        assert_eq!(form.age, "35");
        assert!(form.validate().is_ok());
    }

    #[test]
    fn test_user_json_is_camel_case_without_timestamps() {
        let draft = valid_form().validate().unwrap();
        let user = User {
            id: UserId::new(4),
            first_name: draft.first_name,
            last_name: draft.last_name,
            age: draft.age,
            gender: draft.gender,
            email: draft.email,
            phone: draft.phone,
            date_of_birth: draft.date_of_birth,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["firstName"], "Emily");
        assert_eq!(json["dateOfBirth"], "1996-05-30");
        assert!(json.get("createdAt").is_none());

        let back: User = serde_json::from_value(json).unwrap();
        assert_eq!(back.id, user.id);
        assert_eq!(back.to_form().age, "28");
    }
}
