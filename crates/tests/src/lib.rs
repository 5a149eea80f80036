#[cfg(test)]
mod common;

#[cfg(test)]
mod case_tests;
#[cfg(test)]
mod document_tests;
#[cfg(test)]
mod dpd_bucket_tests;
#[cfg(test)]
mod lawyer_allocation_tests;
#[cfg(test)]
mod master_data_tests;
#[cfg(test)]
mod notice_tests;
#[cfg(test)]
mod sms_tests;
#[cfg(test)]
mod trigger_tests;
#[cfg(test)]
mod validation_rule_tests;
