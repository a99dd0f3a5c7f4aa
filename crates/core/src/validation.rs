//! Request validation. Checks shape only; schedules are validated by parsing.

use crate::api::{CreateDogRequest, CreateIdeaRequest};
use crate::error::{Error, Result};

/// Collected violations for one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationOutcome {
    pub violations: Vec<String>,
}

impl ValidationOutcome {
    pub fn ok() -> Self {
        Self::default()
    }

    pub fn reject(mut self, msg: impl Into<String>) -> Self {
        self.violations.push(msg.into());
        self
    }

    pub fn is_ok(&self) -> bool {
        self.violations.is_empty()
    }

    /// `Err(Validation)` listing every violation, or `Ok(())`.
    pub fn into_result(self) -> Result<()> {
        if self.is_ok() {
            Ok(())
        } else {
            Err(Error::Validation(self.violations.join("; ")))
        }
    }
}

pub fn validate_create_dog(req: &CreateDogRequest) -> ValidationOutcome {
    let mut out = ValidationOutcome::ok();
    if req.idea_id.trim().is_empty() {
        out = out.reject("ideaId must not be empty");
    }
    if req.schedule_type.trim().is_empty() {
        out = out.reject("scheduleType must not be empty");
    }
    if req.schedule.is_null() {
        out = out.reject("schedule must not be empty");
    }
    out
}

pub fn validate_create_idea(req: &CreateIdeaRequest) -> ValidationOutcome {
    if req.text.is_empty() {
        return ValidationOutcome::ok().reject("empty idea is not allowed");
    }
    ValidationOutcome::ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn complete_dog_request_passes() {
        let req = CreateDogRequest {
            idea_id: "I1".into(),
            schedule_type: "cron".into(),
            schedule: json!("0 9 * * *"),
        };
        assert!(validate_create_dog(&req).is_ok());
    }

    #[test]
    fn empty_dog_request_lists_every_field() {
        let out = validate_create_dog(&CreateDogRequest::default());
        assert_eq!(out.violations.len(), 3);
        let err = out.into_result().unwrap_err();
        assert!(matches!(err, Error::Validation(ref msg) if msg.contains("ideaId")));
    }

    #[test]
    fn content_ref_is_an_alias_for_idea_id() {
        let req: CreateDogRequest = serde_json::from_value(json!({
            "contentRef": "I1",
            "scheduleType": "cron",
            "schedule": "0 9 * * *"
        }))
        .unwrap();
        assert_eq!(req.idea_id, "I1");
    }

    #[test]
    fn empty_idea_is_rejected() {
        let out = validate_create_idea(&CreateIdeaRequest { text: String::new() });
        assert_eq!(out.violations, vec!["empty idea is not allowed".to_string()]);
    }
}
