use crate::error::FieldError;
use crate::validation::is_valid_email;

use super::dto::{CreateResourceRequest, UpdateResourceRequest};
use super::repo::{Department, ResourceStatus};

/// Enum fields parsed out of a valid create request.
#[derive(Debug, Clone, Copy)]
pub struct ValidatedEnums {
    pub department: Department,
    pub status: ResourceStatus,
}

/// Checks a create request and returns either the parsed enum fields or the
/// full list of field violations. Nothing is written before this passes.
pub fn validate_create(req: &CreateResourceRequest) -> Result<ValidatedEnums, Vec<FieldError>> {
    let mut errors = Vec::new();

    if req.employee_code.trim().is_empty() {
        errors.push(FieldError::new("employeeCode", "Employee code is required"));
    }
    if req.name.trim().is_empty() {
        errors.push(FieldError::new("name", "Name is required"));
    }
    if !is_valid_email(&req.email) {
        errors.push(FieldError::new("email", "A valid email is required"));
    }
    let department = Department::parse(&req.department);
    if department.is_none() {
        errors.push(FieldError::new("department", "Invalid department"));
    }
    if req.job_title.trim().is_empty() {
        errors.push(FieldError::new("jobTitle", "Job title is required"));
    }
    if req.skills.is_empty() || req.skills.iter().all(|s| s.trim().is_empty()) {
        errors.push(FieldError::new("skills", "At least one skill is required"));
    }
    if req.experience.trim().is_empty() {
        errors.push(FieldError::new("experience", "Experience is required"));
    }
    if !req.rate.is_finite() || req.rate < 0.0 {
        errors.push(FieldError::new("rate", "Rate must be a non-negative number"));
    }
    let status = match req.status.as_deref() {
        None => Some(ResourceStatus::Available),
        Some(s) => {
            let parsed = ResourceStatus::parse(s);
            if parsed.is_none() {
                errors.push(FieldError::new("status", "Invalid status"));
            }
            parsed
        }
    };

    match (department, status) {
        (Some(department), Some(status)) if errors.is_empty() => Ok(ValidatedEnums {
            department,
            status,
        }),
        _ => Err(errors),
    }
}

/// Enum fields parsed out of a valid update request; `None` where the
/// request leaves the field untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedUpdateEnums {
    pub department: Option<Department>,
    pub status: Option<ResourceStatus>,
}

/// Checks only the fields an update request actually carries.
pub fn validate_update(
    req: &UpdateResourceRequest,
) -> Result<ValidatedUpdateEnums, Vec<FieldError>> {
    let mut errors = Vec::new();
    let mut parsed = ValidatedUpdateEnums::default();

    if let Some(ref name) = req.name {
        if name.trim().is_empty() {
            errors.push(FieldError::new("name", "Name cannot be empty"));
        }
    }
    if let Some(ref email) = req.email {
        if !is_valid_email(email) {
            errors.push(FieldError::new("email", "A valid email is required"));
        }
    }
    if let Some(ref department) = req.department {
        parsed.department = Department::parse(department);
        if parsed.department.is_none() {
            errors.push(FieldError::new("department", "Invalid department"));
        }
    }
    if let Some(ref job_title) = req.job_title {
        if job_title.trim().is_empty() {
            errors.push(FieldError::new("jobTitle", "Job title cannot be empty"));
        }
    }
    if let Some(ref skills) = req.skills {
        if skills.is_empty() || skills.iter().all(|s| s.trim().is_empty()) {
            errors.push(FieldError::new("skills", "At least one skill is required"));
        }
    }
    if let Some(ref experience) = req.experience {
        if experience.trim().is_empty() {
            errors.push(FieldError::new("experience", "Experience cannot be empty"));
        }
    }
    if let Some(rate) = req.rate {
        if !rate.is_finite() || rate < 0.0 {
            errors.push(FieldError::new("rate", "Rate must be a non-negative number"));
        }
    }
    if let Some(ref status) = req.status {
        parsed.status = ResourceStatus::parse(status);
        if parsed.status.is_none() {
            errors.push(FieldError::new("status", "Invalid status"));
        }
    }

    if errors.is_empty() {
        Ok(parsed)
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn valid_request() -> CreateResourceRequest {
        CreateResourceRequest {
            employee_code: "EMP-0042".into(),
            name: "Jane Doe".into(),
            email: "jane.doe@example.com".into(),
            phone: None,
            department: "IT".into(),
            job_title: "Backend Engineer".into(),
            skills: vec!["Go".into(), "SQL".into()],
            experience: "6 years of service development".into(),
            rate: 95.0,
            status: Some("Available".into()),
            idle_from: datetime!(2025-05-01 00:00 UTC),
            notes: None,
        }
    }

    #[test]
    fn valid_request_parses_enums() {
        let parsed = validate_create(&valid_request()).expect("valid");
        assert_eq!(parsed.department, Department::IT);
        assert_eq!(parsed.status, ResourceStatus::Available);
    }

    #[test]
    fn status_defaults_to_available() {
        let mut req = valid_request();
        req.status = None;
        let parsed = validate_create(&req).expect("valid");
        assert_eq!(parsed.status, ResourceStatus::Available);
    }

    #[test]
    fn missing_required_fields_are_all_reported() {
        let mut req = valid_request();
        req.employee_code = "  ".into();
        req.name = String::new();
        req.skills = vec![];
        req.rate = -1.0;
        let errors = validate_create(&req).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["employeeCode", "name", "skills", "rate"]);
    }

    #[test]
    fn unknown_enum_values_are_field_errors() {
        let mut req = valid_request();
        req.department = "Sales".into();
        req.status = Some("Idle".into());
        let errors = validate_create(&req).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["department", "status"]);
    }

    #[test]
    fn update_checks_only_present_fields() {
        let req = UpdateResourceRequest::default();
        let parsed = validate_update(&req).expect("empty update is valid");
        assert!(parsed.department.is_none());
        assert!(parsed.status.is_none());

        let req = UpdateResourceRequest {
            status: Some("On Hold".into()),
            rate: Some(f64::NAN),
            ..Default::default()
        };
        let errors = validate_update(&req).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "rate");
    }
}
