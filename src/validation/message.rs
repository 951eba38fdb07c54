use super::{is_e164, ValidationErrors};
use crate::config::StorageConfig;
use crate::notify::{SendWhatsAppRequest, WhatsAppMessage};

pub const MAX_RECIPIENTS: usize = 100;

pub fn validate_whatsapp(
    req: SendWhatsAppRequest,
    default_language: &str,
) -> Result<WhatsAppMessage, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let recipients: Vec<String> = req
        .recipients
        .unwrap_or_default()
        .iter()
        .map(|r| r.trim().to_string())
        .collect();
    if recipients.is_empty() {
        errors.add("recipients", "at least one recipient is required");
    } else if recipients.len() > MAX_RECIPIENTS {
        errors.add("recipients", format!("at most {} recipients per message", MAX_RECIPIENTS));
    } else if let Some(bad) = recipients.iter().find(|r| !is_e164(r)) {
        errors.add("recipients", format!("'{}' is not an E.164 phone number", bad));
    }

    let template_name = req.template_name.as_deref().map(str::trim).unwrap_or_default().to_string();
    if template_name.is_empty() {
        errors.add("template_name", "is required");
    } else if !template_name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
    {
        errors.add("template_name", "may only contain lowercase letters, digits and '_'");
    }

    let language = req
        .language
        .as_deref()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .unwrap_or(default_language)
        .to_string();
    if !is_language_code(&language) {
        errors.add("language", "must look like 'en' or 'en_US'");
    }

    errors.into_result(WhatsAppMessage {
        recipients,
        template_name,
        language,
        variables: req.variables.unwrap_or_default(),
    })
}

/// Checks an image upload and returns the file extension to store it under
pub fn validate_upload(
    content_type: Option<&str>,
    size: usize,
    config: &StorageConfig,
) -> Result<&'static str, ValidationErrors> {
    let mut errors = ValidationErrors::new();
    if size == 0 {
        errors.add("file", "must not be empty");
    } else if size > config.max_upload_bytes {
        errors.add("file", format!("must be at most {} bytes", config.max_upload_bytes));
    }

    let content_type = content_type.map(|ct| ct.trim().to_ascii_lowercase()).unwrap_or_default();
    let allowed = config.allowed_content_types.iter().any(|ct| ct.eq_ignore_ascii_case(&content_type));
    let extension = match extension_for(&content_type) {
        Some(ext) if allowed => ext,
        _ => {
            errors.add(
                "content_type",
                format!("must be one of: {}", config.allowed_content_types.join(", ")),
            );
            ""
        }
    };
    errors.into_result(extension)
}

fn extension_for(content_type: &str) -> Option<&'static str> {
    Some(match content_type {
        "image/jpeg" | "image/jpg" => "jpg",
        "image/png" => "png",
        "image/webp" => "webp",
        "image/gif" => "gif",
        _ => return None,
    })
}

fn is_language_code(code: &str) -> bool {
    let mut parts = code.split('_');
    let lang = parts.next().unwrap_or_default();
    let region = parts.next();
    if parts.next().is_some() || lang.len() != 2 || !lang.chars().all(|c| c.is_ascii_lowercase()) {
        return false;
    }
    region.map_or(true, |r| r.len() == 2 && r.chars().all(|c| c.is_ascii_uppercase()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use std::collections::BTreeMap;

    fn request() -> SendWhatsAppRequest {
        SendWhatsAppRequest {
            recipients: Some(vec!["+919876543210".into()]),
            template_name: Some("booking_confirmed".into()),
            language: None,
            variables: Some(BTreeMap::from([("body_1".to_string(), "Anita".to_string())])),
        }
    }

    #[test]
    fn accepts_template_and_defaults_language() {
        let msg = validate_whatsapp(request(), "en").unwrap();
        assert_eq!(msg.language, "en");
        assert_eq!(msg.variables["body_1"], "Anita");
    }

    #[test]
    fn rejects_bad_recipients_template_and_language() {
        let mut req = request();
        req.recipients = Some(vec!["12345".into()]);
        req.template_name = Some("Booking Confirmed".into());
        req.language = Some("english".into());
        let errors = validate_whatsapp(req, "en").unwrap_err();
        assert!(errors.contains("recipients"));
        assert!(errors.contains("template_name"));
        assert!(errors.contains("language"));

        let mut req = request();
        req.recipients = Some(vec!["+919876543210".into(); MAX_RECIPIENTS + 1]);
        assert!(validate_whatsapp(req, "en").unwrap_err().contains("recipients"));
    }

    #[test]
    fn language_codes() {
        assert!(is_language_code("en"));
        assert!(is_language_code("en_US"));
        assert!(!is_language_code("EN"));
        assert!(!is_language_code("en_us"));
        assert!(!is_language_code("en_US_x"));
    }

    #[test]
    fn upload_checks_type_and_size() {
        let config = AppConfig::development().storage;
        assert_eq!(validate_upload(Some("image/png"), 10, &config).unwrap(), "png");
        assert!(validate_upload(Some("application/pdf"), 10, &config).unwrap_err().contains("content_type"));
        assert!(validate_upload(Some("image/png"), 0, &config).unwrap_err().contains("file"));
        assert!(validate_upload(Some("image/png"), config.max_upload_bytes + 1, &config)
            .unwrap_err()
            .contains("file"));
    }
}
