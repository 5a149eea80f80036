pub mod allocation;
pub mod communication;
pub mod document;
pub mod dpd_bucket;
pub mod lawyer;
pub mod legal_case;
pub mod master_data;
pub mod notice;
pub mod sms_template;
pub mod trigger;
pub mod validation_rule;

use axum::{
    routing::{get, patch, post},
    Router,
};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use shared_types::{AppError, LegalCase};

use crate::db::AppState;

pub(crate) fn parse_uuid(id: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(id).map_err(|_| AppError::bad_request("Invalid UUID format"))
}

/// Look up a non-deleted case by its UUID path segment.
pub(crate) async fn load_case(pool: &Pool<Postgres>, id: &str) -> Result<LegalCase, AppError> {
    let uuid = parse_uuid(id)?;
    crate::repo::legal_case::find_by_id(pool, uuid)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Case {} not found", id)))
}

/// Build the REST API router.
pub fn api_router() -> Router<AppState> {
    Router::new()
        // Master data
        .route("/api/states", get(master_data::list_states).post(master_data::create_state))
        .route(
            "/api/states/{id}",
            get(master_data::get_state)
                .put(master_data::update_state)
                .delete(master_data::delete_state),
        )
        .route("/api/products", get(master_data::list_products).post(master_data::create_product))
        .route(
            "/api/products/{id}",
            get(master_data::get_product)
                .put(master_data::update_product)
                .delete(master_data::delete_product),
        )
        .route("/api/languages", get(master_data::list_languages).post(master_data::create_language))
        .route(
            "/api/languages/{id}",
            get(master_data::get_language)
                .put(master_data::update_language)
                .delete(master_data::delete_language),
        )
        // DPD buckets
        .route("/api/dpd-buckets", get(dpd_bucket::list_buckets).post(dpd_bucket::create_bucket))
        .route("/api/dpd-buckets/resolve/{days}", get(dpd_bucket::resolve_bucket))
        .route(
            "/api/dpd-buckets/{id}",
            get(dpd_bucket::get_bucket)
                .put(dpd_bucket::update_bucket)
                .delete(dpd_bucket::delete_bucket),
        )
        // Lawyers
        .route("/api/lawyers", get(lawyer::list_lawyers).post(lawyer::create_lawyer))
        .route("/api/lawyers/workload", get(lawyer::all_workloads))
        .route(
            "/api/lawyers/{id}",
            get(lawyer::get_lawyer)
                .put(lawyer::update_lawyer)
                .delete(lawyer::delete_lawyer),
        )
        .route("/api/lawyers/{id}/cases", get(lawyer::lawyer_cases))
        .route("/api/lawyers/{id}/workload", get(lawyer::lawyer_workload))
        // Cases
        .route("/api/cases", get(legal_case::search_cases).post(legal_case::create_case))
        .route("/api/cases/statistics", get(legal_case::case_statistics))
        .route("/api/cases/by-case-id/{case_id}", get(legal_case::get_case_by_case_id))
        .route(
            "/api/cases/{id}",
            get(legal_case::get_case)
                .put(legal_case::update_case)
                .delete(legal_case::delete_case),
        )
        .route("/api/cases/{id}/status", patch(legal_case::update_case_status))
        .route(
            "/api/cases/{id}/hearings",
            get(legal_case::list_hearings).post(legal_case::add_hearing),
        )
        .route("/api/cases/{id}/history", get(legal_case::status_history))
        // Allocation
        .route("/api/cases/{id}/allocation", post(allocation::allocate_lawyer))
        .route("/api/cases/{id}/allocation/auto", post(allocation::auto_allocate))
        .route("/api/cases/{id}/allocation/reassign", post(allocation::reassign_lawyer))
        .route("/api/cases/{id}/allocation/deallocate", post(allocation::deallocate_lawyer))
        .route("/api/cases/{id}/allocations", get(allocation::allocation_history))
        // Documents
        .route(
            "/api/cases/{id}/documents",
            get(document::list_documents).post(document::upload_document),
        )
        .route(
            "/api/documents/{id}",
            get(document::get_document).delete(document::delete_document),
        )
        .route("/api/documents/{id}/download", get(document::download_document))
        // SMS templates and communications
        .route(
            "/api/sms-templates",
            get(sms_template::list_sms_templates).post(sms_template::create_sms_template),
        )
        .route(
            "/api/sms-templates/{id}",
            get(sms_template::get_sms_template)
                .put(sms_template::update_sms_template)
                .delete(sms_template::delete_sms_template),
        )
        .route("/api/sms-templates/{id}/preview", post(sms_template::preview_sms_template))
        .route("/api/cases/{id}/communications", get(communication::list_communications))
        .route("/api/cases/{id}/communications/sms", post(communication::send_case_sms))
        // Notices
        .route(
            "/api/notice-templates",
            get(notice::list_notice_templates).post(notice::create_notice_template),
        )
        .route(
            "/api/notice-templates/{id}",
            get(notice::get_notice_template)
                .put(notice::update_notice_template)
                .delete(notice::delete_notice_template),
        )
        .route("/api/notice-templates/{id}/preview", post(notice::preview_notice))
        .route(
            "/api/cases/{id}/notices",
            get(notice::list_notices).post(notice::generate_notice),
        )
        .route("/api/notices/{id}", get(notice::get_notice))
        .route("/api/notices/{id}/download", get(notice::download_notice))
        // Triggers
        .route(
            "/api/trigger-rules",
            get(trigger::list_trigger_rules).post(trigger::create_trigger_rule),
        )
        .route(
            "/api/trigger-rules/{id}",
            get(trigger::get_trigger_rule)
                .put(trigger::update_trigger_rule)
                .delete(trigger::delete_trigger_rule),
        )
        .route("/api/triggers/run", post(trigger::run_triggers))
        .route("/api/cases/{id}/triggers", get(trigger::detect_case_triggers))
        .route("/api/cases/{id}/trigger-events", get(trigger::list_trigger_events))
        // Validation rules
        .route(
            "/api/validation-rules",
            get(validation_rule::list_validation_rules).post(validation_rule::create_validation_rule),
        )
        .route("/api/validation-rules/evaluate", post(validation_rule::evaluate_validation_rules))
        .route(
            "/api/validation-rules/{id}",
            get(validation_rule::get_validation_rule)
                .put(validation_rule::update_validation_rule)
                .delete(validation_rule::delete_validation_rule),
        )
}
