//! Registry-driven schema validator
//!
//! Checks an untyped document structurally (required fields, field types)
//! and semantically (every `templateKind`, node `kind`, and behavior key
//! must exist in its registry; the registries are the single source of
//! truth for "valid identifier").
//!
//! The walk accumulates every issue it finds, each tagged with its path from
//! the document root. Unknown extra fields on a node are tolerated for
//! forward compatibility unless strict mode is on.

use serde_json::Value;
use std::sync::Arc;
use tracing::debug;
use trellis_core::{DocPath, PageConfig, RegistrySet, ValidationIssue};

/// Stable machine-readable issue codes.
pub mod codes {
    /// A required field is absent.
    pub const MISSING_FIELD: &str = "missing_field";
    /// A field holds a value of the wrong type.
    pub const INVALID_TYPE: &str = "invalid_type";
    /// `templateKind` is not in the template registry.
    pub const UNKNOWN_TEMPLATE: &str = "unknown_template";
    /// A node `kind` is not in the kind registry.
    pub const UNKNOWN_KIND: &str = "unknown_kind";
    /// A behavior reference is not in the behavior registry.
    pub const UNKNOWN_BEHAVIOR: &str = "unknown_behavior";
    /// An unexpected field was found (strict mode only).
    pub const UNKNOWN_FIELD: &str = "unknown_field";
    /// The document root is not an object, or could not be typed.
    pub const INVALID_DOCUMENT: &str = "invalid_document";
}

const NODE_FIELDS: &[&str] = &["kind", "props", "children", "on", "key"];

/// Validates untyped page documents against a registry set.
#[derive(Debug, Clone)]
pub struct Validator {
    registries: Arc<RegistrySet>,
    strict: bool,
}

impl Validator {
    /// Creates a validator backed by the given registries.
    pub fn new(registries: Arc<RegistrySet>) -> Self {
        Self {
            registries,
            strict: false,
        }
    }

    /// In strict mode, unknown extra fields on a node are rejected instead
    /// of tolerated.
    #[must_use]
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Validates a document into a typed [`PageConfig`].
    ///
    /// All issues found in one pass are returned together; a typed tree is
    /// produced only when there are none.
    pub fn validate(&self, document: &Value) -> Result<PageConfig, Vec<ValidationIssue>> {
        let mut issues = Vec::new();
        let root = DocPath::root();

        let Some(object) = document.as_object() else {
            return Err(vec![ValidationIssue::new(
                root,
                "document must be an object",
                codes::INVALID_DOCUMENT,
            )]);
        };

        self.check_metadata(object.get("metadata"), &root.field("metadata"), &mut issues);
        self.check_template_kind(
            object.get("templateKind"),
            &root.field("templateKind"),
            &mut issues,
        );
        self.check_slots(object.get("slots"), &root.field("slots"), &mut issues);
        if let Some(global) = object.get("globalBehaviors") {
            self.check_global_behaviors(global, &root.field("globalBehaviors"), &mut issues);
        }
        if let Some(sources) = object.get("dataSources") {
            self.check_data_sources(sources, &root.field("dataSources"), &mut issues);
        }

        if !issues.is_empty() {
            debug!(issues = issues.len(), "document failed validation");
            return Err(issues);
        }

        match serde_json::from_value::<PageConfig>(document.clone()) {
            Ok(config) => {
                debug!(template = %config.template_kind, "document validated");
                Ok(config)
            }
            // Unreachable when the checks above are complete; kept as a
            // guard so a walk/model mismatch surfaces as an issue instead
            // of a panic.
            Err(err) => Err(vec![ValidationIssue::new(
                DocPath::root(),
                format!("document could not be typed: {}", err),
                codes::INVALID_DOCUMENT,
            )]),
        }
    }

    fn check_metadata(&self, value: Option<&Value>, path: &DocPath, issues: &mut Vec<ValidationIssue>) {
        let Some(value) = value else {
            issues.push(ValidationIssue::new(
                path.clone(),
                "metadata is required",
                codes::MISSING_FIELD,
            ));
            return;
        };
        let Some(metadata) = value.as_object() else {
            issues.push(ValidationIssue::new(
                path.clone(),
                "metadata must be an object",
                codes::INVALID_TYPE,
            ));
            return;
        };

        match metadata.get("title") {
            None => issues.push(ValidationIssue::new(
                path.field("title"),
                "metadata.title is required",
                codes::MISSING_FIELD,
            )),
            Some(title) if !title.is_string() => issues.push(ValidationIssue::new(
                path.field("title"),
                "title must be a string",
                codes::INVALID_TYPE,
            )),
            Some(_) => {}
        }

        for field in ["description", "version"] {
            if let Some(v) = metadata.get(field) {
                if !v.is_string() {
                    issues.push(ValidationIssue::new(
                        path.field(field),
                        format!("{} must be a string", field),
                        codes::INVALID_TYPE,
                    ));
                }
            }
        }

        if let Some(tags) = metadata.get("tags") {
            match tags.as_array() {
                Some(items) => {
                    for (i, tag) in items.iter().enumerate() {
                        if !tag.is_string() {
                            issues.push(ValidationIssue::new(
                                path.field("tags").index(i),
                                "tags must be strings",
                                codes::INVALID_TYPE,
                            ));
                        }
                    }
                }
                None => issues.push(ValidationIssue::new(
                    path.field("tags"),
                    "tags must be an array",
                    codes::INVALID_TYPE,
                )),
            }
        }
    }

    fn check_template_kind(
        &self,
        value: Option<&Value>,
        path: &DocPath,
        issues: &mut Vec<ValidationIssue>,
    ) {
        let Some(value) = value else {
            issues.push(ValidationIssue::new(
                path.clone(),
                "templateKind is required",
                codes::MISSING_FIELD,
            ));
            return;
        };
        let Some(kind) = value.as_str() else {
            issues.push(ValidationIssue::new(
                path.clone(),
                "templateKind must be a string",
                codes::INVALID_TYPE,
            ));
            return;
        };
        if !self.registries.templates.contains(kind) {
            issues.push(ValidationIssue::new(
                path.clone(),
                unknown_key_message("template kind", kind, self.registries.templates.keys()),
                codes::UNKNOWN_TEMPLATE,
            ));
        }
    }

    fn check_slots(&self, value: Option<&Value>, path: &DocPath, issues: &mut Vec<ValidationIssue>) {
        let Some(value) = value else {
            issues.push(ValidationIssue::new(
                path.clone(),
                "slots is required",
                codes::MISSING_FIELD,
            ));
            return;
        };
        let Some(slots) = value.as_object() else {
            issues.push(ValidationIssue::new(
                path.clone(),
                "slots must be a map from slot name to node or node sequence",
                codes::INVALID_TYPE,
            ));
            return;
        };
        for (name, content) in slots {
            self.check_slot_content(content, &path.field(name), issues);
        }
    }

    fn check_slot_content(&self, value: &Value, path: &DocPath, issues: &mut Vec<ValidationIssue>) {
        match value {
            Value::Object(_) => self.check_node(value, path, issues),
            Value::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    self.check_node(item, &path.index(i), issues);
                }
            }
            _ => issues.push(ValidationIssue::new(
                path.clone(),
                "slot content must be a node or a sequence of nodes",
                codes::INVALID_TYPE,
            )),
        }
    }

    fn check_node(&self, value: &Value, path: &DocPath, issues: &mut Vec<ValidationIssue>) {
        let Some(node) = value.as_object() else {
            issues.push(ValidationIssue::new(
                path.clone(),
                "node must be an object",
                codes::INVALID_TYPE,
            ));
            return;
        };

        match node.get("kind") {
            None => issues.push(ValidationIssue::new(
                path.field("kind"),
                "node kind is required",
                codes::MISSING_FIELD,
            )),
            Some(kind) => match kind.as_str() {
                None => issues.push(ValidationIssue::new(
                    path.field("kind"),
                    "node kind must be a string",
                    codes::INVALID_TYPE,
                )),
                Some(kind) if !self.registries.kinds.contains(kind) => {
                    issues.push(ValidationIssue::new(
                        path.field("kind"),
                        unknown_key_message("node kind", kind, self.registries.kinds.keys()),
                        codes::UNKNOWN_KIND,
                    ));
                }
                Some(_) => {}
            },
        }

        if let Some(props) = node.get("props") {
            if !props.is_object() {
                issues.push(ValidationIssue::new(
                    path.field("props"),
                    "props must be an object",
                    codes::INVALID_TYPE,
                ));
            }
        }

        if let Some(children) = node.get("children") {
            let children_path = path.field("children");
            match children {
                Value::Array(items) => {
                    for (i, child) in items.iter().enumerate() {
                        self.check_node(child, &children_path.index(i), issues);
                    }
                }
                Value::Object(slots) => {
                    for (name, content) in slots {
                        self.check_slot_content(content, &children_path.field(name), issues);
                    }
                }
                Value::Null => {}
                _ => issues.push(ValidationIssue::new(
                    children_path,
                    "children must be a sequence of nodes or a slot map",
                    codes::INVALID_TYPE,
                )),
            }
        }

        if let Some(on) = node.get("on") {
            let on_path = path.field("on");
            match on.as_object() {
                Some(bindings) => {
                    for (event, binding) in bindings {
                        self.check_behavior_ref(binding, &on_path.field(event), issues);
                    }
                }
                None => issues.push(ValidationIssue::new(
                    on_path,
                    "on must be a map from event name to behavior reference",
                    codes::INVALID_TYPE,
                )),
            }
        }

        if let Some(key) = node.get("key") {
            if !key.is_string() {
                issues.push(ValidationIssue::new(
                    path.field("key"),
                    "key must be a string",
                    codes::INVALID_TYPE,
                ));
            }
        }

        if self.strict {
            for field in node.keys() {
                if !NODE_FIELDS.contains(&field.as_str()) {
                    issues.push(ValidationIssue::new(
                        path.field(field),
                        format!("unknown node field '{}'", field),
                        codes::UNKNOWN_FIELD,
                    ));
                }
            }
        }
    }

    fn check_behavior_ref(&self, value: &Value, path: &DocPath, issues: &mut Vec<ValidationIssue>) {
        match value {
            Value::String(key) => self.check_behavior_key(key, path, issues),
            Value::Object(reference) => {
                match reference.get("behavior") {
                    None => issues.push(ValidationIssue::new(
                        path.clone(),
                        "behavior reference requires a 'behavior' key",
                        codes::MISSING_FIELD,
                    )),
                    Some(Value::String(key)) => {
                        self.check_behavior_key(key, &path.field("behavior"), issues)
                    }
                    Some(_) => issues.push(ValidationIssue::new(
                        path.field("behavior"),
                        "behavior key must be a string",
                        codes::INVALID_TYPE,
                    )),
                }
                if let Some(params) = reference.get("params") {
                    if !params.is_array() {
                        issues.push(ValidationIssue::new(
                            path.field("params"),
                            "params must be an array",
                            codes::INVALID_TYPE,
                        ));
                    }
                }
            }
            _ => issues.push(ValidationIssue::new(
                path.clone(),
                "behavior reference must be a key or {behavior, params}",
                codes::INVALID_TYPE,
            )),
        }
    }

    fn check_behavior_key(&self, key: &str, path: &DocPath, issues: &mut Vec<ValidationIssue>) {
        if !self.registries.behaviors.contains(key) {
            issues.push(ValidationIssue::new(
                path.clone(),
                unknown_key_message("behavior", key, self.registries.behaviors.keys()),
                codes::UNKNOWN_BEHAVIOR,
            ));
        }
    }

    fn check_global_behaviors(
        &self,
        value: &Value,
        path: &DocPath,
        issues: &mut Vec<ValidationIssue>,
    ) {
        let Some(bindings) = value.as_object() else {
            issues.push(ValidationIssue::new(
                path.clone(),
                "globalBehaviors must be a map from name to behavior key",
                codes::INVALID_TYPE,
            ));
            return;
        };
        for (name, key) in bindings {
            match key.as_str() {
                Some(key) => self.check_behavior_key(key, &path.field(name), issues),
                None => issues.push(ValidationIssue::new(
                    path.field(name),
                    "behavior key must be a string",
                    codes::INVALID_TYPE,
                )),
            }
        }
    }

    fn check_data_sources(&self, value: &Value, path: &DocPath, issues: &mut Vec<ValidationIssue>) {
        let Some(sources) = value.as_array() else {
            issues.push(ValidationIssue::new(
                path.clone(),
                "dataSources must be an array",
                codes::INVALID_TYPE,
            ));
            return;
        };
        for (i, source) in sources.iter().enumerate() {
            let source_path = path.index(i);
            match source.as_object() {
                Some(object) => match object.get("name") {
                    Some(name) if name.is_string() => {}
                    Some(_) => issues.push(ValidationIssue::new(
                        source_path.field("name"),
                        "data source name must be a string",
                        codes::INVALID_TYPE,
                    )),
                    None => issues.push(ValidationIssue::new(
                        source_path.field("name"),
                        "data source name is required",
                        codes::MISSING_FIELD,
                    )),
                },
                None => issues.push(ValidationIssue::new(
                    source_path,
                    "data source must be an object",
                    codes::INVALID_TYPE,
                )),
            }
        }
    }
}

fn unknown_key_message(what: &str, key: &str, known: Vec<&str>) -> String {
    if known.is_empty() {
        format!("unknown {} '{}' (none registered)", what, key)
    } else {
        format!("unknown {} '{}' (must be one of: {})", what, key, known.join(", "))
    }
}
