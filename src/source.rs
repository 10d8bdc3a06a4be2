//! Resolution of `(objectType, attribute)` pairs into dotted source keys and host query fields.
//!
//! The same resolver backs config validation (is this column readable?), row aggregation (which
//! record attribute feeds this column?) and predicate building (which queryable field does this
//! filter target?).

use crate::error::SourceError;
use crate::types::ObjectType;

const PHASE_PREFIX: &str = "phase.";
const PART_PREFIX: &str = "part.";
const ASSEMBLY_PREFIX: &str = "assembly.";
const BOLT_PREFIX: &str = "bolt.";
const USER_ATTRIBUTE_PREFIX: &str = "ua.";

const PHASE_ATTRIBUTES: [&str; 2] = ["number", "name"];
const PART_ATTRIBUTES: [&str; 5] = ["profile", "material", "class", "name", "finish"];

/// A resolved model source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSource {
    /// Attribute as stored in a validated config (`profile`, `ua.PT_INFO`, `ASSEMBLY.MAINPART.X`).
    pub attribute: String,
    /// Dotted lookup key into [`crate::aggregation::ObjectRecord::attributes`] (`part.profile`).
    pub key: String,
}

/// Resolve `attribute` on `object_type` into a [`ModelSource`].
///
/// Phase and Part attributes are lower-cased; Part also accepts `ua.<name>` with the user attribute
/// name kept verbatim. Assembly and Bolt attributes are opaque host field names and only trimmed.
pub fn resolve(object_type: ObjectType, attribute: &str) -> Result<ModelSource, SourceError> {
    match object_type {
        ObjectType::Phase => {
            let attribute = attribute.trim().to_ascii_lowercase();
            if !PHASE_ATTRIBUTES.contains(&attribute.as_str()) {
                return Err(SourceError::UnsupportedPhaseAttribute);
            }
            Ok(source(PHASE_PREFIX, attribute))
        }
        ObjectType::Part => resolve_part(attribute),
        ObjectType::Assembly => resolve_opaque(ASSEMBLY_PREFIX, attribute),
        ObjectType::Bolt => resolve_opaque(BOLT_PREFIX, attribute),
    }
}

/// Host query field name for a string-valued attribute, if one is known.
///
/// Part attributes map to upper-case template fields (`profile` → `PROFILE`); user attributes
/// have no template field. Assembly and Bolt attributes already are host field names.
pub fn template_field(object_type: ObjectType, attribute: &str) -> Option<String> {
    let resolved = resolve(object_type, attribute).ok()?;
    if starts_with_ignore_case(&resolved.attribute, USER_ATTRIBUTE_PREFIX) {
        return None;
    }

    match object_type {
        ObjectType::Part => {
            let field = match resolved.attribute.as_str() {
                "profile" => "PROFILE",
                "material" => "MATERIAL",
                "class" => "CLASS",
                "name" => "NAME",
                "finish" => "FINISH",
                _ => return None,
            };
            Some(field.to_string())
        }
        ObjectType::Assembly | ObjectType::Bolt => Some(resolved.attribute),
        ObjectType::Phase => None,
    }
}

/// The Part-scoped key an Assembly source falls back to when the main-part value is missing.
pub fn part_fallback_key(source: &ModelSource) -> String {
    format!("{PART_PREFIX}{}", source.attribute)
}

fn resolve_part(attribute: &str) -> Result<ModelSource, SourceError> {
    let attribute = attribute.trim();
    if attribute.is_empty() {
        return Err(SourceError::EmptyAttribute);
    }

    if starts_with_ignore_case(attribute, USER_ATTRIBUTE_PREFIX) {
        let name = attribute[USER_ATTRIBUTE_PREFIX.len()..].trim();
        if name.is_empty() {
            return Err(SourceError::EmptyUserAttribute);
        }
        return Ok(source(PART_PREFIX, format!("{USER_ATTRIBUTE_PREFIX}{name}")));
    }

    let simple = attribute.to_ascii_lowercase();
    if !PART_ATTRIBUTES.contains(&simple.as_str()) {
        return Err(SourceError::UnsupportedPartAttribute);
    }
    Ok(source(PART_PREFIX, simple))
}

fn resolve_opaque(prefix: &str, attribute: &str) -> Result<ModelSource, SourceError> {
    let attribute = attribute.trim();
    if attribute.is_empty() {
        return Err(SourceError::EmptyAttribute);
    }
    Ok(source(prefix, attribute.to_string()))
}

fn source(prefix: &str, attribute: String) -> ModelSource {
    ModelSource {
        key: format!("{prefix}{attribute}"),
        attribute,
    }
}

fn starts_with_ignore_case(text: &str, prefix: &str) -> bool {
    text.len() >= prefix.len()
        && text.is_char_boundary(prefix.len())
        && text[..prefix.len()].eq_ignore_ascii_case(prefix)
}
