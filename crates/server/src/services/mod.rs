pub mod allocation;
pub mod cases;
pub mod communication;
pub mod compliance;
pub mod documents;
pub mod masking;
pub mod notice;
pub mod template;
pub mod triggers;
pub mod validation;

/// Row fixtures shared by service unit tests.
#[cfg(test)]
pub(crate) mod tests_support {
    use chrono::Utc;
    use shared_types::LegalCase;
    use uuid::Uuid;

    pub fn legal_case(status: &str) -> LegalCase {
        LegalCase {
            id: Uuid::new_v4(),
            case_id: "LC-20261018-0001".to_string(),
            loan_account_number: "LN0000123456".to_string(),
            borrower_name: "Ravi Kumar".to_string(),
            borrower_mobile: "9876543210".to_string(),
            borrower_email: Some("ravi@example.com".to_string()),
            borrower_address: "12 MG Road, Pune".to_string(),
            state_code: "MH".to_string(),
            product_code: "PL".to_string(),
            language_code: "en".to_string(),
            dpd: 120,
            outstanding_amount: 250000.5,
            case_type: "section_138".to_string(),
            status: status.to_string(),
            court_name: None,
            court_case_number: None,
            filing_date: None,
            next_hearing_date: None,
            closed_date: None,
            remarks: None,
            assigned_lawyer_id: None,
            is_deleted: false,
            created_by: "system".to_string(),
            updated_by: "system".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }
}
