//! Request validation from per-endpoint field rules.

use crate::config::{FieldKind, FieldRule};
use crate::error::AppError;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;

pub struct RequestValidator;

impl RequestValidator {
    /// Validate body against field rules. All required fields must be present and non-null.
    /// Fields without a rule are ignored.
    pub fn validate(body: &HashMap<String, Value>, rules: &[FieldRule]) -> Result<(), AppError> {
        for rule in rules {
            match body.get(rule.name) {
                None | Some(Value::Null) if rule.required => {
                    return Err(AppError::Validation(format!("{} is required", rule.name)));
                }
                None | Some(Value::Null) => {}
                Some(v) => validate_field(rule, v)?,
            }
        }
        Ok(())
    }

    /// Validate, then deserialize the object into a typed body.
    pub fn parse<T: DeserializeOwned>(body: HashMap<String, Value>, rules: &[FieldRule]) -> Result<T, AppError> {
        Self::validate(&body, rules)?;
        let obj: serde_json::Map<String, Value> = body.into_iter().collect();
        serde_json::from_value(Value::Object(obj)).map_err(|e| AppError::Validation(format!("invalid body: {}", e)))
    }
}

fn validate_field(rule: &FieldRule, v: &Value) -> Result<(), AppError> {
    let col = rule.name;
    match rule.kind {
        FieldKind::Text => {
            let s = v
                .as_str()
                .ok_or_else(|| AppError::Validation(format!("{} must be a string", col)))?;
            check_text(rule, s)?;
        }
        FieldKind::Json => {
            let empty = match v {
                Value::Object(m) => m.is_empty(),
                Value::Array(a) => a.is_empty(),
                _ => return Err(AppError::Validation(format!("{} must be an object or a list", col))),
            };
            if empty {
                return Err(AppError::Validation(format!("{} can't be empty", col)));
            }
        }
        FieldKind::Id => match v.as_i64() {
            Some(n) if n > 0 => {}
            _ => return Err(AppError::Validation(format!("{} must be a positive integer", col))),
        },
        FieldKind::TextList => {
            let items = v
                .as_array()
                .ok_or_else(|| AppError::Validation(format!("{} must be a list of strings", col)))?;
            for item in items {
                let s = item
                    .as_str()
                    .ok_or_else(|| AppError::Validation(format!("{} must be a list of strings", col)))?;
                check_text(rule, s)?;
            }
        }
    }
    Ok(())
}

fn check_text(rule: &FieldRule, s: &str) -> Result<(), AppError> {
    if s.trim().is_empty() {
        return Err(AppError::Validation(format!("{} can't be empty", rule.name)));
    }
    if let Some(max) = rule.max_length {
        if s.chars().count() > max {
            return Err(AppError::Validation(format!(
                "{} must be at most {} characters",
                rule.name, max
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LINK_TEMPLATE_FIELDS, TEMPLATES, USERS, USER_TEMPLATE_FIELDS, WORKSPACES};
    use serde::Deserialize;
    use serde_json::json;

    fn body(v: Value) -> HashMap<String, Value> {
        match v {
            Value::Object(m) => m.into_iter().collect(),
            _ => panic!("test body must be an object"),
        }
    }

    fn reason(r: Result<(), AppError>) -> String {
        match r {
            Err(AppError::Validation(m)) => m,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn required_fields() {
        assert_eq!(reason(RequestValidator::validate(&body(json!({"nick": "x"})), USERS.fields)), "name is required");
        assert_eq!(reason(RequestValidator::validate(&body(json!({"name": null})), USERS.fields)), "name is required");
        assert!(RequestValidator::validate(&body(json!({"name": "Ann"})), USERS.fields).is_ok());
    }

    #[test]
    fn text_rules() {
        assert_eq!(reason(RequestValidator::validate(&body(json!({"name": "  "})), USERS.fields)), "name can't be empty");
        assert_eq!(reason(RequestValidator::validate(&body(json!({"name": 5})), USERS.fields)), "name must be a string");
        let long = "x".repeat(101);
        assert_eq!(
            reason(RequestValidator::validate(&body(json!({"name": long})), USERS.fields)),
            "name must be at most 100 characters"
        );
    }

    #[test]
    fn template_config_must_be_non_empty() {
        for empty in [json!({}), json!([])] {
            let r = RequestValidator::validate(&body(json!({"config": empty, "type": "Home"})), TEMPLATES.fields);
            assert_eq!(reason(r), "config can't be empty");
        }
        assert!(RequestValidator::validate(&body(json!({"config": [{"key": "value"}]})), TEMPLATES.fields).is_ok());
        assert!(RequestValidator::validate(&body(json!({"config": {"a": 1}, "type": null})), TEMPLATES.fields).is_ok());
    }

    #[test]
    fn template_config_rejects_scalars() {
        for scalar in [json!(0), json!(false), json!(5), json!(""), json!("dark"), json!(true)] {
            let r = RequestValidator::validate(&body(json!({"config": scalar.clone()})), TEMPLATES.fields);
            assert_eq!(reason(r), "config must be an object or a list");
            let r = RequestValidator::validate(&body(json!({"config": scalar})), USER_TEMPLATE_FIELDS);
            assert_eq!(reason(r), "config must be an object or a list");
        }
    }

    #[test]
    fn template_types_list() {
        let ok = body(json!({"name": "W", "template_types": ["Home", "Office"]}));
        assert!(RequestValidator::validate(&ok, WORKSPACES.fields).is_ok());
        let bad = body(json!({"name": "W", "template_types": "Home"}));
        assert_eq!(
            reason(RequestValidator::validate(&bad, WORKSPACES.fields)),
            "template_types must be a list of strings"
        );
        let blank = body(json!({"name": "W", "template_types": ["Home", ""]}));
        assert_eq!(
            reason(RequestValidator::validate(&blank, WORKSPACES.fields)),
            "template_types can't be empty"
        );
    }

    #[test]
    fn ids() {
        assert!(RequestValidator::validate(&body(json!({"template": 2})), LINK_TEMPLATE_FIELDS).is_ok());
        assert_eq!(
            reason(RequestValidator::validate(&body(json!({"template": "2"})), LINK_TEMPLATE_FIELDS)),
            "template must be a positive integer"
        );
        assert!(RequestValidator::validate(&body(json!({"template": 0})), LINK_TEMPLATE_FIELDS).is_err());
    }

    #[test]
    fn parse_into_typed_body() {
        #[derive(Deserialize)]
        struct Link {
            template: i64,
        }
        let link: Link = RequestValidator::parse(body(json!({"template": 3, "extra": true})), LINK_TEMPLATE_FIELDS).unwrap();
        assert_eq!(link.template, 3);
    }
}
