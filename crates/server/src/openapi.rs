use axum::Router;
use shared_types::{
    // Common
    AppError, AppErrorKind, PaginationMeta,
    // Master data
    CreateLanguageRequest, CreateProductRequest, CreateStateRequest, LanguageResponse,
    ProductResponse, StateResponse, UpdateLanguageRequest, UpdateProductRequest,
    UpdateStateRequest,
    // DPD buckets
    CreateDpdBucketRequest, DpdBucketResponse, UpdateDpdBucketRequest,
    // Lawyers and allocation
    AllocateLawyerRequest, AllocationResponse, CreateLawyerRequest, DeallocateLawyerRequest,
    LawyerResponse, LawyerWorkload, ReassignLawyerRequest, UpdateLawyerRequest,
    // Cases
    AddHearingRequest, CaseHearingResponse, CaseStatistics, CaseStatusHistoryResponse,
    CreateLegalCaseRequest, GroupCount, LegalCaseResponse, UpdateCaseStatusRequest,
    UpdateLegalCaseRequest,
    // Documents
    CaseDocumentResponse, UploadDocumentRequest,
    // SMS
    CommunicationResponse, CreateSmsTemplateRequest, SendSmsRequest, SmsPreviewRequest,
    SmsPreviewResponse, SmsTemplateResponse, UpdateSmsTemplateRequest,
    // Notices
    CreateNoticeTemplateRequest, GenerateNoticeRequest, GeneratedNoticeResponse,
    NoticePreviewRequest, NoticePreviewResponse, NoticeTemplateResponse,
    UpdateNoticeTemplateRequest,
    // Triggers
    CreateTriggerRuleRequest, DetectedTrigger, TriggerEventResponse, TriggerRuleResponse,
    TriggerRunRequest, TriggerRunSummary, UpdateTriggerRuleRequest,
    // Validation rules
    CreateValidationRuleRequest, EvaluateValidationRequest, EvaluateValidationResponse,
    RuleViolation, UpdateValidationRuleRequest, ValidationRuleResponse,
};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::db::AppState;
use crate::{health, rest};

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        // Master data
        rest::master_data::create_state,
        rest::master_data::list_states,
        rest::master_data::get_state,
        rest::master_data::update_state,
        rest::master_data::delete_state,
        rest::master_data::create_product,
        rest::master_data::list_products,
        rest::master_data::get_product,
        rest::master_data::update_product,
        rest::master_data::delete_product,
        rest::master_data::create_language,
        rest::master_data::list_languages,
        rest::master_data::get_language,
        rest::master_data::update_language,
        rest::master_data::delete_language,
        // DPD buckets
        rest::dpd_bucket::create_bucket,
        rest::dpd_bucket::list_buckets,
        rest::dpd_bucket::get_bucket,
        rest::dpd_bucket::update_bucket,
        rest::dpd_bucket::delete_bucket,
        rest::dpd_bucket::resolve_bucket,
        // Lawyers
        rest::lawyer::create_lawyer,
        rest::lawyer::list_lawyers,
        rest::lawyer::get_lawyer,
        rest::lawyer::update_lawyer,
        rest::lawyer::delete_lawyer,
        rest::lawyer::lawyer_cases,
        rest::lawyer::lawyer_workload,
        rest::lawyer::all_workloads,
        // Cases
        rest::legal_case::create_case,
        rest::legal_case::search_cases,
        rest::legal_case::case_statistics,
        rest::legal_case::get_case_by_case_id,
        rest::legal_case::get_case,
        rest::legal_case::update_case,
        rest::legal_case::delete_case,
        rest::legal_case::update_case_status,
        rest::legal_case::add_hearing,
        rest::legal_case::list_hearings,
        rest::legal_case::status_history,
        // Allocation
        rest::allocation::allocate_lawyer,
        rest::allocation::auto_allocate,
        rest::allocation::reassign_lawyer,
        rest::allocation::deallocate_lawyer,
        rest::allocation::allocation_history,
        // Documents
        rest::document::upload_document,
        rest::document::list_documents,
        rest::document::get_document,
        rest::document::download_document,
        rest::document::delete_document,
        // SMS templates and communications
        rest::sms_template::create_sms_template,
        rest::sms_template::list_sms_templates,
        rest::sms_template::get_sms_template,
        rest::sms_template::update_sms_template,
        rest::sms_template::delete_sms_template,
        rest::sms_template::preview_sms_template,
        rest::communication::send_case_sms,
        rest::communication::list_communications,
        // Notices
        rest::notice::create_notice_template,
        rest::notice::list_notice_templates,
        rest::notice::get_notice_template,
        rest::notice::update_notice_template,
        rest::notice::delete_notice_template,
        rest::notice::preview_notice,
        rest::notice::generate_notice,
        rest::notice::list_notices,
        rest::notice::get_notice,
        rest::notice::download_notice,
        // Triggers
        rest::trigger::create_trigger_rule,
        rest::trigger::list_trigger_rules,
        rest::trigger::get_trigger_rule,
        rest::trigger::update_trigger_rule,
        rest::trigger::delete_trigger_rule,
        rest::trigger::detect_case_triggers,
        rest::trigger::run_triggers,
        rest::trigger::list_trigger_events,
        // Validation rules
        rest::validation_rule::create_validation_rule,
        rest::validation_rule::list_validation_rules,
        rest::validation_rule::get_validation_rule,
        rest::validation_rule::update_validation_rule,
        rest::validation_rule::delete_validation_rule,
        rest::validation_rule::evaluate_validation_rules,
    ),
    components(schemas(
        AppError, AppErrorKind, PaginationMeta,
        StateResponse, CreateStateRequest, UpdateStateRequest,
        ProductResponse, CreateProductRequest, UpdateProductRequest,
        LanguageResponse, CreateLanguageRequest, UpdateLanguageRequest,
        DpdBucketResponse, CreateDpdBucketRequest, UpdateDpdBucketRequest,
        LawyerResponse, CreateLawyerRequest, UpdateLawyerRequest, LawyerWorkload,
        AllocationResponse, AllocateLawyerRequest, ReassignLawyerRequest, DeallocateLawyerRequest,
        LegalCaseResponse, CreateLegalCaseRequest, UpdateLegalCaseRequest,
        UpdateCaseStatusRequest, AddHearingRequest, CaseHearingResponse,
        CaseStatusHistoryResponse, CaseStatistics, GroupCount,
        CaseDocumentResponse, UploadDocumentRequest,
        SmsTemplateResponse, CreateSmsTemplateRequest, UpdateSmsTemplateRequest,
        SmsPreviewRequest, SmsPreviewResponse, SendSmsRequest, CommunicationResponse,
        NoticeTemplateResponse, CreateNoticeTemplateRequest, UpdateNoticeTemplateRequest,
        NoticePreviewRequest, NoticePreviewResponse, GenerateNoticeRequest,
        GeneratedNoticeResponse,
        TriggerRuleResponse, CreateTriggerRuleRequest, UpdateTriggerRuleRequest,
        TriggerEventResponse, DetectedTrigger, TriggerRunRequest, TriggerRunSummary,
        ValidationRuleResponse, CreateValidationRuleRequest, UpdateValidationRuleRequest,
        EvaluateValidationRequest, EvaluateValidationResponse, RuleViolation,
        health::HealthResponse,
    )),
    tags(
        (name = "master-data", description = "States, loan products and languages"),
        (name = "dpd-buckets", description = "Days-past-due bucket configuration"),
        (name = "lawyers", description = "Panel lawyer management and workload"),
        (name = "cases", description = "Legal case lifecycle, hearings and history"),
        (name = "allocations", description = "Lawyer allocation to cases"),
        (name = "documents", description = "Case document storage"),
        (name = "sms-templates", description = "SMS template management"),
        (name = "communications", description = "Borrower communications"),
        (name = "notices", description = "Legal notice templates and generated notices"),
        (name = "triggers", description = "Automated trigger rules and runs"),
        (name = "validation-rules", description = "Configurable case validation rules"),
        (name = "health", description = "Health check endpoint")
    ),
    info(
        title = "Legal Case API",
        description = "Loan recovery legal case management API",
        version = "1.0.0"
    )
)]
pub struct ApiDoc;

/// Build an Axum router that serves the API docs at `/docs`
/// and the REST API at `/api/*`.
pub fn api_router(state: AppState) -> Router {
    Router::new()
        .merge(rest::api_router())
        .route("/health", axum::routing::get(health::health_check))
        .with_state(state)
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_lists_every_tag_in_use() {
        let doc = ApiDoc::openapi();
        let tags: Vec<String> = doc
            .tags
            .unwrap_or_default()
            .into_iter()
            .map(|t| t.name)
            .collect();
        for path in doc.paths.paths.values() {
            for op in [&path.get, &path.post, &path.put, &path.patch, &path.delete]
                .into_iter()
                .flatten()
            {
                for tag in op.tags.iter().flatten() {
                    assert!(tags.contains(tag), "undeclared tag {tag}");
                }
            }
        }
    }

    #[test]
    fn static_case_routes_are_documented() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/cases/statistics"));
        assert!(doc.paths.paths.contains_key("/api/dpd-buckets/resolve/{days}"));
        assert!(doc.paths.paths.contains_key("/api/triggers/run"));
    }
}
