use rust_decimal::Decimal;

use super::{check_amount, clearable_text, is_e164, max_amount, optional_text, required_text, ValidationErrors};
use crate::models::{
    CreateResourceRequest, LinkResourceRequest, NewResource, NewResourceLink, ResourcePatch,
    UpdateResourceRequest,
};

const NAME_MAX: usize = 255;
const DESCRIPTION_MAX: usize = 5000;
const EMAIL_MAX: usize = 254;

pub fn validate_create_resource(req: CreateResourceRequest) -> Result<NewResource, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let name = required_text(&mut errors, "name", req.name.as_deref(), NAME_MAX);
    let description = optional_text(&mut errors, "description", req.description.as_deref(), DESCRIPTION_MAX);
    let contact_email = email(&mut errors, req.contact_email.as_deref()).flatten();
    let contact_phone = phone(&mut errors, req.contact_phone.as_deref()).flatten();
    if req.resource_type.is_none() {
        errors.add("resource_type", "is required");
    }
    if let Some(cost) = req.hourly_cost {
        check_hourly_cost(&mut errors, cost);
    }
    if let Some(capacity) = req.capacity {
        check_capacity(&mut errors, capacity);
    }

    let (Some(name), Some(resource_type)) = (name, req.resource_type) else {
        return Err(errors);
    };
    errors.into_result(NewResource {
        name,
        description,
        resource_type,
        status: req.status.unwrap_or_default(),
        contact_email,
        contact_phone,
        hourly_cost: req.hourly_cost,
        capacity: req.capacity,
    })
}

pub fn validate_update_resource(req: UpdateResourceRequest) -> Result<ResourcePatch, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let name = match req.name.as_deref() {
        Some(raw) => required_text(&mut errors, "name", Some(raw), NAME_MAX),
        None => None,
    };
    let patch = ResourcePatch {
        name,
        description: clearable_text(&mut errors, "description", req.description.as_deref(), DESCRIPTION_MAX),
        resource_type: req.resource_type,
        status: req.status,
        contact_email: email(&mut errors, req.contact_email.as_deref()),
        contact_phone: phone(&mut errors, req.contact_phone.as_deref()),
        hourly_cost: req.hourly_cost.map(|cost| {
            check_hourly_cost(&mut errors, cost);
            Some(cost)
        }),
        capacity: req.capacity.map(|capacity| {
            check_capacity(&mut errors, capacity);
            Some(capacity)
        }),
    };

    if errors.is_empty() && patch.is_empty() {
        errors.add("body", "at least one field must be provided");
    }
    errors.into_result(patch)
}

pub fn validate_link(req: LinkResourceRequest) -> Result<NewResourceLink, ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let quantity = req.quantity.unwrap_or(1);
    if quantity < 1 {
        errors.add("quantity", "must be at least 1");
    }
    let Some(resource_id) = req.resource_id else {
        errors.add("resource_id", "is required");
        return Err(errors);
    };
    errors.into_result(NewResourceLink {
        resource_id,
        quantity,
        is_required: req.is_required.unwrap_or(true),
    })
}

fn check_hourly_cost(errors: &mut ValidationErrors, cost: Decimal) {
    check_amount(errors, "hourly_cost", cost, max_amount());
}

fn check_capacity(errors: &mut ValidationErrors, capacity: i32) {
    if capacity < 1 {
        errors.add("capacity", "must be at least 1");
    }
}

fn email(errors: &mut ValidationErrors, raw: Option<&str>) -> Option<Option<String>> {
    let value = clearable_text(errors, "contact_email", raw, EMAIL_MAX)?;
    if let Some(address) = &value {
        if !looks_like_email(address) {
            errors.add("contact_email", "must be a valid email address");
            return None;
        }
    }
    Some(value)
}

fn phone(errors: &mut ValidationErrors, raw: Option<&str>) -> Option<Option<String>> {
    let value = clearable_text(errors, "contact_phone", raw, 16)?;
    if let Some(number) = &value {
        if !is_e164(number) {
            errors.add("contact_phone", "must be in E.164 format, e.g. +919876543210");
            return None;
        }
    }
    Some(value)
}

fn looks_like_email(address: &str) -> bool {
    let Some((local, domain)) = address.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !address.chars().any(char::is_whitespace)
        && !domain.contains('@')
        && domain
            .rsplit_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && tld.len() >= 2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ResourceStatus, ResourceType};
    use uuid::Uuid;

    #[test]
    fn create_defaults_status() {
        let resource = validate_create_resource(CreateResourceRequest {
            name: Some("Anita".into()),
            resource_type: Some(ResourceType::Staff),
            contact_email: Some("anita@spa.example".into()),
            contact_phone: Some("+919876543210".into()),
            capacity: Some(3),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(resource.status, ResourceStatus::Available);
        assert_eq!(resource.contact_email.as_deref(), Some("anita@spa.example"));
    }

    #[test]
    fn create_reports_all_problems() {
        let errors = validate_create_resource(CreateResourceRequest {
            contact_email: Some("not-an-email".into()),
            contact_phone: Some("98765".into()),
            hourly_cost: Some(Decimal::from(-5)),
            capacity: Some(0),
            ..Default::default()
        })
        .unwrap_err();
        for field in ["name", "resource_type", "contact_email", "contact_phone", "hourly_cost", "capacity"] {
            assert!(errors.contains(field), "missing error for {}", field);
        }
    }

    #[test]
    fn hourly_cost_fits_its_column() {
        let base = || CreateResourceRequest {
            name: Some("Sauna".into()),
            resource_type: Some(ResourceType::Equipment),
            ..Default::default()
        };

        let ok = validate_create_resource(CreateResourceRequest {
            hourly_cost: Some(Decimal::new(9_999_999_999, 2)),
            ..base()
        })
        .unwrap();
        assert_eq!(ok.hourly_cost, Some(Decimal::new(9_999_999_999, 2)));

        let errors = validate_create_resource(CreateResourceRequest {
            hourly_cost: Some(Decimal::new(10_000_000_000, 2)),
            ..base()
        })
        .unwrap_err();
        assert_eq!(errors.fields()["hourly_cost"], "must be at most 99999999.99");

        let errors = validate_create_resource(CreateResourceRequest {
            hourly_cost: Some(Decimal::new(1_000_000_000_001, 3)),
            ..base()
        })
        .unwrap_err();
        assert!(errors.contains("hourly_cost"));

        let errors = validate_update_resource(UpdateResourceRequest {
            hourly_cost: Some(Decimal::new(12_505, 3)),
            ..Default::default()
        })
        .unwrap_err();
        assert_eq!(errors.fields()["hourly_cost"], "must have at most 2 decimal places");
    }

    #[test]
    fn email_shapes() {
        assert!(looks_like_email("a@b.co"));
        assert!(!looks_like_email("a@b"));
        assert!(!looks_like_email("@b.co"));
        assert!(!looks_like_email("a b@c.co"));
        assert!(!looks_like_email("a@b@c.co"));
    }

    #[test]
    fn update_can_clear_contact() {
        let patch = validate_update_resource(UpdateResourceRequest {
            contact_phone: Some(String::new()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(patch.contact_phone, Some(None));
        assert!(validate_update_resource(UpdateResourceRequest::default()).is_err());
    }

    #[test]
    fn link_defaults_and_bounds() {
        let id = Uuid::new_v4();
        let link = validate_link(LinkResourceRequest { resource_id: Some(id), ..Default::default() }).unwrap();
        assert_eq!(link.quantity, 1);
        assert!(link.is_required);

        let errors = validate_link(LinkResourceRequest { quantity: Some(0), ..Default::default() }).unwrap_err();
        assert!(errors.contains("quantity"));
        assert!(errors.contains("resource_id"));
    }
}
