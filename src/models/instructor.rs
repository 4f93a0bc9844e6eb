//! Instructor model.

use serde::{Deserialize, Serialize};

use crate::validator::Validator;

/// Sort keys an instructor listing may be ordered by.
pub const INSTRUCTOR_SORT_SAFE_LIST: &[&str] = &["id", "first_name", "last_name", "age"];

pub const MAX_NAME_BYTES: usize = 500;
pub const MAX_AGE: i32 = 150;

/// An instructor who teaches courses.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Instructor {
    pub id: i64,
    #[serde(skip)]
    pub created_at: String,
    pub first_name: String,
    pub last_name: String,
    pub age: i32,
    pub version: i64,
}

/// Request body for creating an instructor.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateInstructorRequest {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub age: i32,
}

impl From<CreateInstructorRequest> for Instructor {
    fn from(request: CreateInstructorRequest) -> Self {
        Self {
            id: 0,
            created_at: String::new(),
            first_name: request.first_name,
            last_name: request.last_name,
            age: request.age,
            version: 0,
        }
    }
}

/// Request body for a partial instructor update.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateInstructorRequest {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub age: Option<i32>,
    /// Version the client last read
    #[serde(default)]
    pub expected_version: Option<i64>,
}

impl Instructor {
    pub fn apply(&mut self, changes: UpdateInstructorRequest) {
        if let Some(first_name) = changes.first_name {
            self.first_name = first_name;
        }
        if let Some(last_name) = changes.last_name {
            self.last_name = last_name;
        }
        if let Some(age) = changes.age {
            self.age = age;
        }
    }
}

pub fn validate_instructor(v: &mut Validator, instructor: &Instructor) {
    v.check(
        !instructor.first_name.is_empty(),
        "first_name",
        "must be provided",
    );
    v.check(
        instructor.first_name.len() <= MAX_NAME_BYTES,
        "first_name",
        "must not be more than 500 bytes long",
    );
    v.check(
        !instructor.last_name.is_empty(),
        "last_name",
        "must be provided",
    );
    v.check(
        instructor.last_name.len() <= MAX_NAME_BYTES,
        "last_name",
        "must not be more than 500 bytes long",
    );
    v.check(instructor.age > 0, "age", "must be greater than zero");
    v.check(instructor.age <= MAX_AGE, "age", "must not be more than 150");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_instructor() {
        let mut instructor = Instructor::from(CreateInstructorRequest {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            age: 36,
        });
        let mut v = Validator::new();
        validate_instructor(&mut v, &instructor);
        assert!(v.valid());

        instructor.first_name.clear();
        instructor.age = 0;
        let mut v = Validator::new();
        validate_instructor(&mut v, &instructor);
        let errors = v.finish().unwrap_err();
        assert_eq!(errors["first_name"], "must be provided");
        assert_eq!(errors["age"], "must be greater than zero");
        assert!(!errors.contains_key("last_name"));
    }

    #[test]
    fn test_apply() {
        let mut instructor = Instructor::from(CreateInstructorRequest {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            age: 36,
        });
        instructor.apply(UpdateInstructorRequest {
            age: Some(37),
            ..Default::default()
        });
        assert_eq!(instructor.age, 37);
        assert_eq!(instructor.first_name, "Ada");
    }
}
