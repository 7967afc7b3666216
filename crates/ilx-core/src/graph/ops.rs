//! Operator and primitive symbol table
//!
//! Call names are folded onto short symbols. Names missing from the table
//! fall back to their first two characters, so `save_draft` and `sanitize`
//! both become `sa`. That collision is accepted and never reported; the table
//! exists so the frequent names get distinct symbols.

use super::TypeTag;

/// Symbol used for the interpolation concatenation
pub const CONCAT: &str = "++";
/// Symbol for logical negation
pub const NOT: &str = "!";
/// Symbol for case-equality used by case/when lowering
pub const CASE_EQ: &str = "===";
/// Symbol for logical or used to join several `when` values
pub const OR: &str = "||";
/// Instance variable read / write
pub const IVAR_READ: &str = "iv";
pub const IVAR_WRITE: &str = "iw";

/// (call name, symbol, result tag). `None` leaves the tag to the caller.
static OPERATORS: &[(&str, &str, Option<TypeTag>)] = &[
    // Arithmetic
    ("+", "+", Some(TypeTag::Int)),
    ("-", "-", Some(TypeTag::Int)),
    ("*", "*", Some(TypeTag::Int)),
    ("/", "/", Some(TypeTag::Int)),
    ("%", "%", Some(TypeTag::Int)),
    ("**", "^", Some(TypeTag::Int)),
    ("-@", "neg", Some(TypeTag::Int)),
    // Comparison
    ("==", "==", Some(TypeTag::Bool)),
    ("!=", "!=", Some(TypeTag::Bool)),
    ("<", "<", Some(TypeTag::Bool)),
    (">", ">", Some(TypeTag::Bool)),
    ("<=", "<=", Some(TypeTag::Bool)),
    (">=", ">=", Some(TypeTag::Bool)),
    ("===", "===", Some(TypeTag::Bool)),
    ("=~", "=~", Some(TypeTag::Bool)),
    ("<=>", "<=>", Some(TypeTag::Int)),
    // Logic
    ("!", "!", Some(TypeTag::Bool)),
    ("&&", "&&", Some(TypeTag::Bool)),
    ("||", "||", Some(TypeTag::Bool)),
    // Indexing and collections
    ("[]", "[]", None),
    ("[]=", "[]=", None),
    ("<<", "<<", Some(TypeTag::Array)),
    ("++", "++", Some(TypeTag::Str)),
    ("iv", "iv", None),
    ("iw", "iw", None),
    // Primitives
    ("puts", "pr", Some(TypeTag::Unit)),
    ("print", "pr", Some(TypeTag::Unit)),
    ("p", "pr", Some(TypeTag::Unit)),
    ("each", "ea", Some(TypeTag::Array)),
    ("map", "mp", Some(TypeTag::Array)),
    ("collect", "mp", Some(TypeTag::Array)),
    ("select", "sl", Some(TypeTag::Array)),
    ("filter", "sl", Some(TypeTag::Array)),
    ("reject", "rj", Some(TypeTag::Array)),
    ("reduce", "rd", None),
    ("inject", "rd", None),
    ("new", "nw", None),
    ("to_s", "ts", Some(TypeTag::Str)),
    ("to_i", "ti", Some(TypeTag::Int)),
    ("size", "ln", Some(TypeTag::Int)),
    ("length", "ln", Some(TypeTag::Int)),
    ("count", "ln", Some(TypeTag::Int)),
    ("include?", "in", Some(TypeTag::Bool)),
    ("nil?", "nl", Some(TypeTag::Bool)),
    ("empty?", "em", Some(TypeTag::Bool)),
    ("raise", "rz", Some(TypeTag::Unit)),
    ("send", "sn", None),
    ("public_send", "sn", None),
    ("find", "fd", None),
    ("where", "wh", Some(TypeTag::Array)),
    ("save", "sv", Some(TypeTag::Bool)),
    ("update", "up", Some(TypeTag::Bool)),
    ("call", "cl", None),
];

/// Resolved symbol for a call name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operator {
    pub symbol: String,
    pub tag: Option<TypeTag>,
}

/// Look a call name up in the table, falling back to two-character truncation
pub fn resolve(name: &str) -> Operator {
    match OPERATORS.iter().find(|(call, _, _)| *call == name) {
        Some((_, symbol, tag)) => Operator {
            symbol: symbol.to_string(),
            tag: *tag,
        },
        None => Operator {
            symbol: truncate(name),
            tag: None,
        },
    }
}

/// Two-character fallback symbol
pub fn truncate(name: &str) -> String {
    name.chars().take(2).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_takes_precedence() {
        assert_eq!(resolve("select").symbol, "sl");
        assert_eq!(resolve("send").symbol, "sn");
        assert_eq!(resolve("+").tag, Some(TypeTag::Int));
        assert_eq!(resolve("==").tag, Some(TypeTag::Bool));
    }

    #[test]
    fn test_fallback_truncates_and_collides() {
        let first = resolve("sanitize");
        let second = resolve("save_draft");
        assert_eq!(first.symbol, "sa");
        assert_eq!(first, second);
        assert_eq!(first.tag, None);
        assert_eq!(resolve("x").symbol, "x");
    }
}
