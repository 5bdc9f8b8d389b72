//! Declared attribute schema of an event resource.
//!
//! The orchestrator validates configurations against this schema and the
//! provider re-checks every configuration before touching the remote API.

use serde::Serialize;
use serde_json::{Map, Value, json};

use crate::error::{ValidationError, VkgError, VkgResult};
use crate::event::{EventAttributes, Transparency, Visibility};
use crate::validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeKind {
    String,
    Bool,
    Set,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Presence {
    Required,
    Optional,
    /// Written by the provider only.
    Computed,
}

/// Extra check run on a string attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Check {
    None,
    DateTime,
    OneOf(&'static [&'static str]),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attribute {
    pub name: &'static str,
    pub kind: AttributeKind,
    pub presence: Presence,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_values: Option<&'static [&'static str]>,
    #[serde(skip)]
    pub check: Check,
    /// Element schema of a set attribute.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub elem: Vec<Attribute>,
}

impl Attribute {
    fn new(name: &'static str, kind: AttributeKind, presence: Presence) -> Self {
        Attribute {
            name,
            kind,
            presence,
            default: None,
            allowed_values: None,
            check: Check::None,
            elem: Vec::new(),
        }
    }

    fn required(name: &'static str, kind: AttributeKind) -> Self {
        Self::new(name, kind, Presence::Required)
    }

    fn optional(name: &'static str, kind: AttributeKind) -> Self {
        Self::new(name, kind, Presence::Optional)
    }

    fn computed(name: &'static str) -> Self {
        Self::new(name, AttributeKind::String, Presence::Computed)
    }

    fn default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    fn check(mut self, check: Check) -> Self {
        if let Check::OneOf(values) = check {
            self.allowed_values = Some(values);
        }
        self.check = check;
        self
    }

    fn elem(mut self, elem: Vec<Attribute>) -> Self {
        self.elem = elem;
        self
    }
}

/// Schema shared by every event resource variant.
pub fn event_schema() -> Vec<Attribute> {
    use AttributeKind as K;

    vec![
        Attribute::required("start", K::String).check(Check::DateTime),
        Attribute::required("end", K::String).check(Check::DateTime),
        Attribute::optional("location", K::String),
        Attribute::optional("description", K::String),
        Attribute::optional("transparency", K::String)
            .default(json!("transparent"))
            .check(Check::OneOf(Transparency::VALUES)),
        Attribute::optional("visibility", K::String)
            .default(json!("public"))
            .check(Check::OneOf(Visibility::VALUES)),
        Attribute::optional("guests_can_invite_others", K::Bool).default(json!(true)),
        Attribute::optional("guests_can_modify", K::Bool).default(json!(true)),
        Attribute::optional("guests_can_see_other_guests", K::Bool).default(json!(true)),
        Attribute::optional("send_notifications", K::Bool).default(json!(true)),
        Attribute::optional("attendee", K::Set).elem(vec![
            Attribute::required("email", K::String),
            Attribute::optional("optional", K::Bool).default(json!(false)),
        ]),
        Attribute::computed("summary"),
        Attribute::computed("event_id"),
        Attribute::computed("hangout_link"),
        Attribute::computed("html_link"),
    ]
}

/// Validate a declared configuration, collecting every failure.
pub fn validate(config: &Map<String, Value>) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    check_object(&event_schema(), config, "", &mut errors);
    errors
}

/// Validate a declared configuration and convert it into typed attributes.
pub fn parse_attributes(resource: &str, config: &Map<String, Value>) -> VkgResult<EventAttributes> {
    let errors = validate(config);
    if !errors.is_empty() {
        return Err(VkgError::Invalid {
            resource: resource.to_string(),
            errors,
        });
    }

    // An explicit null means "not set".
    let declared: Map<String, Value> = config
        .iter()
        .filter(|(_, value)| !value.is_null())
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    serde_json::from_value(Value::Object(declared))
        .map_err(|e| VkgError::Serialization(e.to_string()))
}

fn check_object(
    schema: &[Attribute],
    object: &Map<String, Value>,
    prefix: &str,
    errors: &mut Vec<ValidationError>,
) {
    for key in object.keys() {
        if key == "id" {
            errors.push(ValidationError::new(
                format!("{prefix}{key}"),
                "id is assigned by Google and cannot be set",
            ));
        } else if !schema.iter().any(|a| a.name == key.as_str()) {
            errors.push(ValidationError::new(
                format!("{prefix}{key}"),
                "unknown attribute",
            ));
        }
    }

    for attribute in schema {
        let path = format!("{prefix}{}", attribute.name);
        check_attribute(attribute, object.get(attribute.name), &path, errors);
    }
}

fn check_attribute(
    attribute: &Attribute,
    value: Option<&Value>,
    path: &str,
    errors: &mut Vec<ValidationError>,
) {
    let value = match (attribute.presence, value) {
        (Presence::Computed, None | Some(Value::Null)) => return,
        (Presence::Computed, Some(_)) => {
            errors.push(ValidationError::new(path, "computed attribute cannot be set"));
            return;
        }
        (Presence::Required, None | Some(Value::Null)) => {
            errors.push(ValidationError::new(path, "required attribute is missing"));
            return;
        }
        (Presence::Optional, None | Some(Value::Null)) => return,
        (_, Some(value)) => value,
    };

    let result = match (attribute.kind, attribute.check) {
        (AttributeKind::String, Check::DateTime) => validate::datetime(value, path).map(|_| ()),
        (AttributeKind::String, Check::OneOf(allowed)) => validate::one_of(value, path, allowed),
        (AttributeKind::String, Check::None) => validate::string(value, path),
        (AttributeKind::Bool, _) => validate::boolean(value, path),
        (AttributeKind::Set, _) => {
            check_set(&attribute.elem, value, path, errors);
            Ok(())
        }
    };

    if let Err(e) = result {
        errors.push(e);
    }
}

fn check_set(elem: &[Attribute], value: &Value, path: &str, errors: &mut Vec<ValidationError>) {
    let Some(items) = value.as_array() else {
        errors.push(validate::type_error(path, "set"));
        return;
    };

    for (i, item) in items.iter().enumerate() {
        let item_path = format!("{path}.{i}");
        match item.as_object() {
            Some(object) => check_object(elem, object, &format!("{item_path}."), errors),
            None => errors.push(validate::type_error(&item_path, "object")),
        }
    }
}
