//! PII masking applied to notice contexts and stored recipients.

use serde_json::Value;

/// Keep the last four digits: `9876543210` -> `XXXXXX3210`.
pub fn mask_mobile(mobile: &str) -> String {
    mask_keep_last(mobile, 4)
}

/// Keep the last four characters of a loan account number.
pub fn mask_account(account: &str) -> String {
    mask_keep_last(account, 4)
}

/// Keep the first character of the local part: `jane@example.com` -> `j***@example.com`.
pub fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() => {
            let first: String = local.chars().take(1).collect();
            format!("{}***@{}", first, domain)
        }
        _ => "****".to_string(),
    }
}

fn mask_keep_last(value: &str, keep: usize) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= keep {
        return "X".repeat(chars.len());
    }
    let hidden = chars.len() - keep;
    let tail: String = chars[hidden..].iter().collect();
    format!("{}{}", "X".repeat(hidden), tail)
}

/// Mask one value according to the field it came from.
pub fn mask_field(field: &str, value: &str) -> String {
    let leaf = field.rsplit('.').next().unwrap_or(field);
    if leaf.ends_with("mobile") || leaf.ends_with("phone") {
        mask_mobile(value)
    } else if leaf.ends_with("email") {
        mask_email(value)
    } else if leaf.ends_with("account_number") {
        mask_account(value)
    } else {
        "****".to_string()
    }
}

/// Replace every configured field found in `context`.
///
/// Field names match keys at any depth, so `borrower_mobile` masks both
/// `case.borrower_mobile` and a top-level `borrower_mobile`. Non-string
/// values are replaced with `****`. Returns the number of values masked.
pub fn mask_context(context: &mut Value, fields: &[String]) -> usize {
    let mut count = 0;
    mask_value(context, fields, &mut count);
    count
}

fn mask_value(value: &mut Value, fields: &[String], count: &mut usize) {
    match value {
        Value::Object(map) => {
            for (key, v) in map.iter_mut() {
                if fields.iter().any(|f| f == key) {
                    match v {
                        Value::Null => {}
                        Value::String(s) if s.is_empty() => {}
                        Value::String(s) => {
                            *s = mask_field(key, s);
                            *count += 1;
                        }
                        other => {
                            *other = Value::String("****".to_string());
                            *count += 1;
                        }
                    }
                } else {
                    mask_value(v, fields, count);
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                mask_value(item, fields, count);
            }
        }
        _ => {}
    }
}
