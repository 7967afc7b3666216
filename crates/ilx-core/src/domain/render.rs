//! Domain ILX text
//!
//! ```text
//! @app
//! Post{title!,author:Author,status∈(draft|published)}
//!   ⇉Comment:comments
//!   ⟲before_save:normalize_title
//!   #publish(at?)→Post|ready?⟹PostMailer.deliver_later
//! ```

use super::{
    CallbackRecord, Direction, DomainModel, Entity, Feature, Field, FieldSlot, Relationship,
};

pub const ROOT_MARKER: &str = "@app";
const INDENT: &str = "  ";

const OWNS_MANY: &str = "⇉";
const OWNS_ONE: &str = "⇀";
const OWNERSHIP: &str = "◆";
const CALLBACK: &str = "⟲";
const CUSTOM_CHECK: &str = "✓";
const FEATURE: &str = "#";
const RESULT: &str = "→";
const CONSTRAINTS: char = '|';
const TRIGGERS: &str = "⟹";
const AND: &str = "∧";

pub fn to_ilx(model: &DomainModel) -> String {
    let mut lines = vec![ROOT_MARKER.to_string()];
    for entity in model.entities.values() {
        lines.push(entity_line(entity));
        lines.extend(
            entity
                .relationships
                .iter()
                .filter_map(relationship_line)
                .map(indent),
        );
        lines.extend(entity.callbacks.iter().map(callback_line).map(indent));
        lines.extend(
            entity
                .validations
                .iter()
                .filter(|v| v.is_custom())
                .flat_map(|v| v.attributes.iter())
                .map(|method| indent(format!("{CUSTOM_CHECK}{method}"))),
        );
        lines.extend(
            model
                .features
                .iter()
                .filter(|feature| feature.owner == entity.name)
                .map(feature_line)
                .map(indent),
        );
    }
    lines.join("\n")
}

fn indent(line: String) -> String {
    format!("{INDENT}{line}")
}

fn entity_line(entity: &Entity) -> String {
    let fields: Vec<String> = entity.fields.iter().map(field_text).collect();
    format!("{}{{{}}}", entity.name, fields.join(","))
}

fn field_text(field: &Field) -> String {
    match &field.slot {
        FieldSlot::Scalar { required: true } => format!("{}!", field.name),
        FieldSlot::Scalar { required: false } => format!("{}?", field.name),
        FieldSlot::Enumerated { values } => format!("{}∈({})", field.name, values.join("|")),
        FieldSlot::Reference { target, optional } => {
            format!("{}:{}{}", field.name, target, optional_mark(*optional))
        }
    }
}

fn optional_mark(optional: bool) -> &'static str {
    if optional {
        "?"
    } else {
        ""
    }
}

/// Belongs-to relations only appear inline in the entity line
fn relationship_line(relationship: &Relationship) -> Option<String> {
    let arrow = match relationship.direction {
        Direction::OwnsMany => OWNS_MANY,
        Direction::OwnsOne => OWNS_ONE,
        Direction::BelongsTo => return None,
    };
    let ownership = if relationship.dependent { OWNERSHIP } else { "" };
    Some(format!(
        "{ownership}{arrow}{}:{}{}",
        relationship.target,
        relationship.name,
        optional_mark(relationship.optional)
    ))
}

fn callback_line(callback: &CallbackRecord) -> String {
    if callback.targets.is_empty() {
        format!("{CALLBACK}{}", callback.hook)
    } else {
        format!("{CALLBACK}{}:{}", callback.hook, callback.targets.join(","))
    }
}

fn feature_line(feature: &Feature) -> String {
    let mut line = format!("{FEATURE}{}", feature.name);
    if !feature.params.is_empty() {
        let params: Vec<String> = feature
            .params
            .iter()
            .map(|param| format!("{}{}", param.name, optional_mark(!param.required)))
            .collect();
        line.push_str(&format!("({})", params.join(",")));
    }
    line.push_str(RESULT);
    line.push_str(&feature.result);
    if !feature.constraints.is_empty() {
        line.push(CONSTRAINTS);
        line.push_str(&join_segment(&feature.constraints));
    }
    if !feature.triggers.is_empty() {
        line.push_str(TRIGGERS);
        line.push_str(&join_segment(&feature.triggers));
    }
    line
}

/// Join items with `∧`, backslash-escaping any delimiter the items carry
fn join_segment(items: &[String]) -> String {
    items
        .iter()
        .map(|item| escape_delimiters(item))
        .collect::<Vec<_>>()
        .join(AND)
}

fn escape_delimiters(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if c == '\\' || c == CONSTRAINTS || TRIGGERS.starts_with(c) || AND.starts_with(c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FeatureParam, ValidationRecord, CUSTOM_VALIDATION};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_model_is_just_the_root() {
        assert_eq!(to_ilx(&DomainModel::default()), "@app");
    }

    #[test]
    fn test_full_entity_block() {
        let mut post = Entity::new("Post");
        post.add_scalar("title", true);
        post.set_slot(
            "author",
            FieldSlot::Reference {
                target: "Author".into(),
                optional: true,
            },
        );
        post.relationships.push(Relationship {
            direction: Direction::BelongsTo,
            target: "Author".into(),
            name: "author".into(),
            optional: true,
            dependent: false,
        });
        post.relationships.push(Relationship {
            direction: Direction::OwnsMany,
            target: "Tag".into(),
            name: "tags".into(),
            optional: false,
            dependent: true,
        });
        post.callbacks.push(CallbackRecord {
            hook: "before_save".into(),
            targets: vec!["a".into(), "b".into()],
        });
        post.validations.push(ValidationRecord {
            attributes: vec!["check_dates".into()],
            kinds: vec![CUSTOM_VALIDATION.into()],
        });

        let mut model = DomainModel::default();
        model.entities.insert("Post".into(), post);
        model.features.push(Feature {
            name: "publish".into(),
            owner: "Post".into(),
            params: vec![FeatureParam {
                name: "at".into(),
                required: false,
            }],
            result: "Post".into(),
            constraints: vec!["a > 1".into(), "!(b)".into()],
            triggers: vec!["M.deliver".into()],
        });

        assert_eq!(
            to_ilx(&model),
            "@app\n\
             Post{title!,author:Author?}\n  \
             ◆⇉Tag:tags\n  \
             ⟲before_save:a,b\n  \
             ✓check_dates\n  \
             #publish(at?)→Post|a > 1∧!(b)⟹M.deliver"
        );
    }

    #[test]
    fn test_feature_segments_escape_delimiters() {
        let feature = Feature {
            name: "ship".into(),
            owner: "Order".into(),
            params: vec![],
            result: "Order".into(),
            constraints: vec!["paid? || comped?".into(), "a ∧ b".into()],
            triggers: vec!["notify_all".into()],
        };
        assert_eq!(
            feature_line(&feature),
            r"#ship→Order|paid? \|\| comped?∧a \∧ b⟹notify_all"
        );
    }
}
