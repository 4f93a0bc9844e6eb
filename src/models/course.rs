//! Course model and its validation rules.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::validator::{unique, Validator};

/// Sort keys a course listing may be ordered by.
pub const COURSE_SORT_SAFE_LIST: &[&str] = &["id", "title", "published_date", "runtime"];

pub const MAX_TITLE_BYTES: usize = 500;
pub const MAX_LECTURES: usize = 5;

/// Course length in minutes. Travels over JSON as `"<n> mins"`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Runtime(pub i32);

impl Runtime {
    pub fn minutes(&self) -> i32 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

/// Returned when a runtime string is not of the form `"<n> mins"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidRuntimeFormat;

impl fmt::Display for InvalidRuntimeFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("invalid runtime format")
    }
}

impl std::error::Error for InvalidRuntimeFormat {}

impl FromStr for Runtime {
    type Err = InvalidRuntimeFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(' ');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(minutes), Some("mins"), None) => minutes
                .parse::<i32>()
                .map(Runtime)
                .map_err(|_| InvalidRuntimeFormat),
            _ => Err(InvalidRuntimeFormat),
        }
    }
}

impl fmt::Display for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} mins", self.0)
    }
}

impl Serialize for Runtime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Runtime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// A course in the catalogue.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Course {
    pub id: i64,
    #[serde(skip)]
    pub created_at: String,
    pub title: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub published_date: String,
    #[serde(skip_serializing_if = "Runtime::is_zero")]
    pub runtime: Runtime,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub lectures: Vec<String>,
    /// Optimistic concurrency token, bumped on every update
    pub version: i64,
}

/// Request body for creating a course.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateCourseRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub published_date: String,
    #[serde(default)]
    pub runtime: Runtime,
    #[serde(default)]
    pub lectures: Option<Vec<String>>,
}

impl CreateCourseRequest {
    /// Build an unsaved course, recording a failure if `lectures` was omitted.
    pub fn into_course(self, v: &mut Validator) -> Course {
        v.check(self.lectures.is_some(), "lectures", "must be provided");
        Course {
            id: 0,
            created_at: String::new(),
            title: self.title,
            published_date: self.published_date,
            runtime: self.runtime,
            lectures: self.lectures.unwrap_or_default(),
            version: 0,
        }
    }
}

/// Request body for a partial course update. Absent fields are left as-is.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateCourseRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub published_date: Option<String>,
    #[serde(default)]
    pub runtime: Option<Runtime>,
    #[serde(default)]
    pub lectures: Option<Vec<String>>,
    /// Version the client last read
    #[serde(default)]
    pub expected_version: Option<i64>,
}

impl Course {
    /// Merge the present fields of `changes` into this course.
    pub fn apply(&mut self, changes: UpdateCourseRequest) {
        if let Some(title) = changes.title {
            self.title = title;
        }
        if let Some(published_date) = changes.published_date {
            self.published_date = published_date;
        }
        if let Some(runtime) = changes.runtime {
            self.runtime = runtime;
        }
        if let Some(lectures) = changes.lectures {
            self.lectures = lectures;
        }
    }
}

/// Check a course before it is written.
pub fn validate_course(v: &mut Validator, course: &Course) {
    v.check(!course.title.is_empty(), "title", "must be provided");
    v.check(
        course.title.len() <= MAX_TITLE_BYTES,
        "title",
        "must not be more than 500 bytes long",
    );

    v.check(
        !course.published_date.is_empty(),
        "published_date",
        "must be provided",
    );

    v.check(!course.runtime.is_zero(), "runtime", "must be provided");
    v.check(course.runtime.0 > 0, "runtime", "must be a positive integer");

    v.check(
        !course.lectures.is_empty(),
        "lectures",
        "must contain at least 1 lecture",
    );
    v.check(
        course.lectures.len() <= MAX_LECTURES,
        "lectures",
        "must not contain more than 5 lectures",
    );
    v.check(
        unique(&course.lectures),
        "lectures",
        "must not contain duplicate values",
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn course() -> Course {
        Course {
            id: 1,
            created_at: String::new(),
            title: "Rust for Beginners".to_string(),
            published_date: "2023-01-15".to_string(),
            runtime: Runtime(95),
            lectures: vec!["intro".to_string(), "ownership".to_string()],
            version: 1,
        }
    }

    #[test]
    fn test_runtime_round_trip() {
        let json = serde_json::to_string(&Runtime(102)).unwrap();
        assert_eq!(json, "\"102 mins\"");
        let parsed: Runtime = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, Runtime(102));
    }

    #[test]
    fn test_runtime_rejects_bad_shapes() {
        for raw in ["\"102\"", "\"102 minutes\"", "\"abc mins\"", "\"1 2 mins\"", "102"] {
            let result: Result<Runtime, _> = serde_json::from_str(raw);
            assert!(result.is_err(), "{raw} should not parse");
        }
    }

    #[test]
    fn test_valid_course_passes() {
        let mut v = Validator::new();
        validate_course(&mut v, &course());
        assert!(v.valid());
    }

    #[test]
    fn test_empty_lectures_rejected() {
        let mut c = course();
        c.lectures.clear();
        let mut v = Validator::new();
        validate_course(&mut v, &c);
        assert_eq!(v.errors()["lectures"], "must contain at least 1 lecture");
    }

    #[test]
    fn test_missing_lectures_reported_as_missing() {
        let request: CreateCourseRequest = serde_json::from_value(serde_json::json!({
            "title": "Rust",
            "published_date": "2023",
            "runtime": "10 mins"
        }))
        .unwrap();
        let mut v = Validator::new();
        let c = request.into_course(&mut v);
        validate_course(&mut v, &c);
        assert_eq!(v.errors()["lectures"], "must be provided");
    }

    #[test]
    fn test_lecture_limits() {
        let mut c = course();
        c.lectures = (0..6).map(|i| format!("l{i}")).collect();
        let mut v = Validator::new();
        validate_course(&mut v, &c);
        assert_eq!(v.errors()["lectures"], "must not contain more than 5 lectures");

        c.lectures = vec!["a".into(), "a".into()];
        let mut v = Validator::new();
        validate_course(&mut v, &c);
        assert_eq!(v.errors()["lectures"], "must not contain duplicate values");
    }

    #[test]
    fn test_title_and_runtime_rules() {
        let mut c = course();
        c.title = "x".repeat(501);
        c.runtime = Runtime(-5);
        c.published_date.clear();
        let mut v = Validator::new();
        validate_course(&mut v, &c);
        let errors = v.finish().unwrap_err();
        assert_eq!(errors["title"], "must not be more than 500 bytes long");
        assert_eq!(errors["runtime"], "must be a positive integer");
        assert_eq!(errors["published_date"], "must be provided");
    }

    #[test]
    fn test_apply_only_touches_present_fields() {
        let mut c = course();
        c.apply(UpdateCourseRequest {
            title: Some("Advanced Rust".into()),
            ..Default::default()
        });
        assert_eq!(c.title, "Advanced Rust");
        assert_eq!(c.runtime, Runtime(95));
        assert_eq!(c.lectures.len(), 2);
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let result: Result<UpdateCourseRequest, _> =
            serde_json::from_value(serde_json::json!({ "titel": "typo" }));
        assert!(result.is_err());
    }

    #[test]
    fn test_created_at_not_serialized() {
        let json = serde_json::to_value(course()).unwrap();
        assert!(json.get("created_at").is_none());
        assert_eq!(json["runtime"], "95 mins");
        assert_eq!(json["version"], 1);
    }
}
