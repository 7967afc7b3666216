//! Name tables for the domain pass. Matching is literal; nothing here looks
//! at what a call resolves to.

use once_cell::sync::Lazy;
use regex::Regex;

/// Superclasses that mark a class as a data model
pub const DEFAULT_MODEL_SUPERCLASSES: &[&str] = &["ApplicationRecord", "ActiveRecord::Base"];

pub const BELONGS_TO: &str = "belongs_to";
pub const HAS_ONE: &str = "has_one";
pub const HAS_MANY: &str = "has_many";
pub const VALIDATES: &str = "validates";
pub const VALIDATE: &str = "validate";
pub const ENUM: &str = "enum";

const CALLBACK_PREFIXES: &[&str] = &["before_", "after_", "around_"];
const CALLBACK_EVENTS: &[&str] = &["validation", "save", "create", "update", "destroy", "commit"];

/// Bare calls that change the visibility of the defs that follow
pub const HIDING_VISIBILITY: &[&str] = &["private", "protected"];
pub const PUBLIC_VISIBILITY: &str = "public";

/// Side-effect call names: mail delivery, background jobs, broadcasts,
/// notifications, outbound sends and queueing.
static TRIGGER_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(deliver\w*|perform_(later|async|now)|broadcast\w*|notify\w*|send_\w+|enqueue\w*|\w*_mail|mail|\w*mailer\w*|\w*job\w*)!?$",
    )
    .expect("trigger pattern compiles")
});

/// Constants whose every call is a side effect: `UserMailer`, `Billing::ExportJob`
static TRIGGER_RECEIVER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(Mailer|Job)$").expect("trigger receiver pattern compiles"));

/// `validates_presence_of` → `presence`
static CLASSIC_VALIDATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^validates_(\w+)_of$").expect("validation pattern compiles"));

pub fn is_callback(name: &str) -> bool {
    CALLBACK_PREFIXES.iter().any(|prefix| {
        name.strip_prefix(prefix)
            .is_some_and(|event| CALLBACK_EVENTS.contains(&event))
    })
}

pub fn is_trigger(name: &str) -> bool {
    TRIGGER_PATTERN.is_match(name)
}

pub fn is_trigger_receiver(constant: &str) -> bool {
    TRIGGER_RECEIVER.is_match(constant)
}

/// Validation kind carried by a classic `validates_*_of` name
pub fn classic_validation_kind(name: &str) -> Option<&str> {
    CLASSIC_VALIDATION
        .captures(name)
        .and_then(|caps| caps.get(1))
        .map(|kind| kind.as_str())
}

/// `author` → `Author`, `line_item` → `LineItem`
pub fn classify(name: &str) -> String {
    name.split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

/// Minimal English singularization for has-many targets
pub fn singularize(name: &str) -> String {
    if let Some(stem) = name.strip_suffix("ies") {
        return format!("{stem}y");
    }
    if name.ends_with("sses") {
        return name[..name.len() - 2].to_string();
    }
    match name.strip_suffix('s') {
        Some(stem) if !name.ends_with("ss") => stem.to_string(),
        _ => name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_callback_names() {
        assert!(is_callback("before_save"));
        assert!(is_callback("after_commit"));
        assert!(is_callback("around_update"));
        assert!(!is_callback("before_action"));
        assert!(!is_callback("save"));
    }

    #[test]
    fn test_trigger_vocabulary() {
        for name in [
            "deliver_later",
            "deliver",
            "deliver_now!",
            "perform_later",
            "perform_async",
            "broadcast_replace_to",
            "notify_subscribers",
            "send_invoice",
            "enqueue",
            "welcome_mail",
            "mail",
            "mailer",
            "notify_mailer",
            "schedule_job",
            "enqueue_jobs!",
        ] {
            assert!(is_trigger(name), "{name}");
        }
        for name in ["save", "perform", "send", "update!", "jot"] {
            assert!(!is_trigger(name), "{name}");
        }
    }

    #[test]
    fn test_trigger_receivers() {
        assert!(is_trigger_receiver("UserMailer"));
        assert!(is_trigger_receiver("Billing::ExportJob"));
        assert!(!is_trigger_receiver("Order"));
        assert!(!is_trigger_receiver("JobBoard"));
    }

    #[test]
    fn test_classic_validation_kind() {
        assert_eq!(classic_validation_kind("validates_presence_of"), Some("presence"));
        assert_eq!(
            classic_validation_kind("validates_uniqueness_of"),
            Some("uniqueness")
        );
        assert_eq!(classic_validation_kind("validates"), None);
    }

    #[test]
    fn test_inflection() {
        assert_eq!(classify("author"), "Author");
        assert_eq!(classify("line_item"), "LineItem");
        assert_eq!(singularize("comments"), "comment");
        assert_eq!(singularize("categories"), "category");
        assert_eq!(singularize("addresses"), "address");
        assert_eq!(singularize("glass"), "glass");
        assert_eq!(singularize("staff"), "staff");
    }
}
