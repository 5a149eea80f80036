use shared_types::AppError;

/// Map a unique-constraint name to a message a caller can act on.
fn unique_violation_message(constraint: &str) -> &'static str {
    match constraint {
        "uq_legal_cases_open_loan_account" => {
            "An open case already exists for this loan account and case type"
        }
        "uq_lawyer_allocations_active_case" => "Case already has an active lawyer allocation",
        "uq_lawyers_email" => "A lawyer with this email already exists",
        "uq_lawyers_bar_registration_number" => {
            "A lawyer with this bar registration number already exists"
        }
        "uq_case_documents_checksum" => "This document is already attached to the case",
        "uq_sms_templates_code_language" => {
            "An SMS template with this code already exists for the language"
        }
        _ => "A record with this value already exists",
    }
}

/// Convert a sqlx::Error into an AppError.
pub fn sqlx_to_app_error(err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::RowNotFound => AppError::not_found("Resource not found"),
        sqlx::Error::Database(db_err) => match db_err.code().as_deref() {
            // PostgreSQL unique constraint violation
            Some("23505") => {
                AppError::conflict(unique_violation_message(db_err.constraint().unwrap_or("")))
            }
            // Foreign key violation
            Some("23503") => AppError::bad_request("Referenced record does not exist"),
            // Check constraint violation
            Some("23514") => AppError::bad_request(format!(
                "Value violates constraint {}",
                db_err.constraint().unwrap_or("unknown")
            )),
            _ => {
                tracing::error!(error = %err, "database error");
                AppError::database(err.to_string())
            }
        },
        _ => {
            tracing::error!(error = %err, "database error");
            AppError::database(err.to_string())
        }
    }
}

/// Extension trait providing `.into_app_error()` on sqlx::Error.
pub trait SqlxErrorExt {
    fn into_app_error(self) -> AppError;
}

impl SqlxErrorExt for sqlx::Error {
    fn into_app_error(self) -> AppError {
        sqlx_to_app_error(self)
    }
}

/// Trait for validating request DTOs before processing.
pub trait ValidateRequest {
    fn validate_request(&self) -> Result<(), AppError>;
}

impl<T: validator::Validate> ValidateRequest for T {
    fn validate_request(&self) -> Result<(), AppError> {
        self.validate().map_err(AppError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::AppErrorKind;

    #[test]
    fn row_not_found_maps_to_404_kind() {
        let err = sqlx_to_app_error(sqlx::Error::RowNotFound);
        assert_eq!(err.kind, AppErrorKind::NotFound);
    }

    #[test]
    fn known_constraints_get_friendly_messages() {
        assert!(unique_violation_message("uq_lawyers_email").contains("email"));
        assert!(unique_violation_message("uq_legal_cases_open_loan_account").contains("loan account"));
        assert_eq!(
            unique_violation_message("something_else"),
            "A record with this value already exists"
        );
    }

    #[test]
    fn pool_errors_are_database_errors() {
        let err = sqlx_to_app_error(sqlx::Error::PoolTimedOut);
        assert_eq!(err.kind, AppErrorKind::DatabaseError);
    }
}
