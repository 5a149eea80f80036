pub mod error;
pub mod feature_flags;

// Domain modules
pub mod common;
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

pub use error::*;
pub use feature_flags::*;

pub use common::*;
pub use communication::*;
pub use document::*;
pub use dpd_bucket::*;
pub use lawyer::*;
pub use legal_case::*;
pub use master_data::*;
pub use notice::*;
pub use sms_template::*;
pub use trigger::*;
pub use validation_rule::*;
