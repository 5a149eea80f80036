pub mod allocation;
pub mod communication;
pub mod document;
pub mod dpd_bucket;
pub mod generated_notice;
pub mod hearing;
pub mod language;
pub mod lawyer;
pub mod legal_case;
pub mod notice_template;
pub mod product;
pub mod sms_template;
pub mod state;
pub mod trigger_event;
pub mod trigger_rule;
pub mod validation_rule;
