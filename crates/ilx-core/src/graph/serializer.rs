//! ILX line rendering for a node store, plus the small reader used to check
//! references in emitted text.

use super::{radix, LiteralValue, Node, NodeKind, NodeStore, Provenance, Ref};
use crate::{IlxError, Result};

const RECORD_SEPARATOR: char = ';';
const SENTINEL: &str = "*";
const PROVENANCE_MARKER: char = '@';
const NO_BODY: &str = "_";

/// Render the whole store as a single line.
///
/// Provenance is run-length compressed: a function record only carries its
/// `@unit:line:name ` prefix when it differs from the last one written.
pub fn to_ilx(store: &NodeStore) -> String {
    let mut records: Vec<String> = Vec::with_capacity(store.len() + 1);
    let mut last_provenance: Option<&Provenance> = None;

    for (_, node) in store.iter() {
        let mut record = String::new();
        if let Some(provenance) = &node.provenance {
            if last_provenance != Some(provenance) {
                record.push_str(&provenance_prefix(provenance));
                last_provenance = Some(provenance);
            }
        }
        record.push_str(&render_node(node));
        records.push(record);
    }

    if records.is_empty() {
        return String::new();
    }
    records.push(SENTINEL.to_string());
    records.join(&RECORD_SEPARATOR.to_string())
}

fn provenance_prefix(provenance: &Provenance) -> String {
    format!(
        "{PROVENANCE_MARKER}{}:{}:{} ",
        escape_field(&provenance.unit),
        provenance.line,
        escape_field(&provenance.name)
    )
}

/// Percent-escape the bytes that would end a provenance field or a record
fn escape_field(field: &str) -> String {
    let mut escaped = String::with_capacity(field.len());
    for c in field.chars() {
        match c {
            '%' | ' ' | ':' | RECORD_SEPARATOR => escaped.push_str(&format!("%{:02X}", c as u32)),
            c if c.is_control() && (c as u32) < 0x80 => {
                escaped.push_str(&format!("%{:02X}", c as u32))
            }
            c => escaped.push(c),
        }
    }
    escaped
}

fn unescape_field(field: &str) -> Result<String> {
    let bytes = field.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let byte = field
                .get(i + 1..i + 3)
                .and_then(|hex| u8::from_str_radix(hex, 16).ok())
                .ok_or_else(|| IlxError::invalid_reference(field, "bad escape in provenance"))?;
            decoded.push(byte);
            i += 3;
        } else {
            decoded.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(decoded)
        .map_err(|_| IlxError::invalid_reference(field, "provenance is not UTF-8"))
}

/// Split a record into its decoded provenance prefix, if any, and the rest
pub fn parse_provenance(record: &str) -> Result<(Option<Provenance>, &str)> {
    let Some(rest) = record.strip_prefix(PROVENANCE_MARKER) else {
        return Ok((None, record));
    };
    let (prefix, body) = rest
        .split_once(' ')
        .ok_or_else(|| IlxError::invalid_reference(record, "unterminated provenance"))?;
    let mut fields = prefix.splitn(3, ':');
    let (Some(unit), Some(line), Some(name)) = (fields.next(), fields.next(), fields.next())
    else {
        return Err(IlxError::invalid_reference(prefix, "provenance needs unit:line:name"));
    };
    let line = line
        .parse()
        .map_err(|_| IlxError::invalid_reference(prefix, "provenance line is not a number"))?;
    let provenance = Provenance {
        unit: unescape_field(unit)?,
        line,
        name: unescape_field(name)?,
    };
    Ok((Some(provenance), body))
}

/// Record text for one node, without provenance
pub fn render_node(node: &Node) -> String {
    let letter = node.kind.letter();
    let tag = node.type_tag.letter();
    let payload = match &node.kind {
        NodeKind::Literal(value) => render_literal(value),
        NodeKind::Function { body, input, .. } => {
            let body = body.map(radix::ref_token);
            format!("{}{}", input.letter(), body.as_deref().unwrap_or(NO_BODY))
        }
        NodeKind::Apply { op, args } => format!("{op}({})", radix::encode_list(args)),
        NodeKind::Branch {
            condition,
            then_ref,
            else_ref,
        } => radix::encode_fixed(&[*condition, *then_ref, *else_ref]),
        NodeKind::Loop { condition, body } => radix::encode_fixed(&[*condition, *body]),
        NodeKind::RecordArray(elements) => radix::encode_list(elements),
        NodeKind::MapTable(pairs) => pairs
            .iter()
            .map(|(key, value)| format!("{}:{}", radix::ref_token(*key), radix::ref_token(*value)))
            .collect::<Vec<_>>()
            .join(","),
        NodeKind::Range { from, to } => radix::encode_fixed(&[*from, *to]),
    };
    format!("{letter}{tag}{payload}")
}

fn render_literal(value: &LiteralValue) -> String {
    match value {
        LiteralValue::Str(s) => quote(s),
        LiteralValue::Symbol(name) if needs_quoting(name) => format!(":{}", quote(name)),
        LiteralValue::Symbol(name) => format!(":{name}"),
        LiteralValue::Int(n) => n.to_string(),
        LiteralValue::Bool(true) => "1".to_string(),
        LiteralValue::Bool(false) => "0".to_string(),
        LiteralValue::Unit => String::new(),
    }
}

fn needs_quoting(name: &str) -> bool {
    name.chars()
        .any(|c| c == RECORD_SEPARATOR || c == '"' || c.is_control())
}

/// JSON string quoting with the record separator escaped
fn quote(s: &str) -> String {
    serde_json::to_string(s)
        .unwrap_or_else(|_| "\"\"".to_string())
        .replace(RECORD_SEPARATOR, "\\u003b")
}

/// Split a line into records, dropping the end sentinel
pub fn split_records(line: &str) -> Vec<&str> {
    line.split(RECORD_SEPARATOR)
        .filter(|record| !record.is_empty() && *record != SENTINEL)
        .collect()
}

/// References held by a single rendered record
pub fn parse_references(record: &str) -> Result<Vec<Ref>> {
    let (_, record) = parse_provenance(record)?;

    let mut chars = record.chars();
    let (Some(letter), Some(_tag)) = (chars.next(), chars.next()) else {
        return Err(IlxError::invalid_reference(record, "record too short"));
    };
    let payload = chars.as_str();

    match letter {
        'L' => Ok(Vec::new()),
        'F' => {
            let body = payload.get(1..).unwrap_or_default();
            if body == NO_BODY || body.is_empty() {
                Ok(Vec::new())
            } else {
                Ok(vec![radix::parse_ref(body)?])
            }
        }
        'A' => {
            let open = payload
                .find('(')
                .ok_or_else(|| IlxError::invalid_reference(record, "missing argument list"))?;
            let args = payload[open + 1..]
                .strip_suffix(')')
                .ok_or_else(|| IlxError::invalid_reference(record, "unclosed argument list"))?;
            radix::decode_list(args)
        }
        'B' => radix::decode_fixed(payload, 3),
        'W' | 'R' => radix::decode_fixed(payload, 2),
        'V' => radix::decode_list(payload),
        'M' => {
            let mut refs = Vec::new();
            for pair in payload.split(',').filter(|pair| !pair.is_empty()) {
                let (key, value) = pair
                    .split_once(':')
                    .ok_or_else(|| IlxError::invalid_reference(pair, "pair without ':'"))?;
                refs.push(radix::parse_ref(key)?);
                refs.push(radix::parse_ref(value)?);
            }
            Ok(refs)
        }
        _ => Err(IlxError::invalid_reference(record, "unknown record kind")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::TypeTag;
    use pretty_assertions::assert_eq;

    fn lit(value: LiteralValue) -> Node {
        Node::literal(value)
    }

    #[test]
    fn test_empty_store_renders_nothing() {
        assert_eq!(to_ilx(&NodeStore::new()), "");
    }

    #[test]
    fn test_literal_payloads() {
        assert_eq!(render_node(&lit(LiteralValue::Int(-12))), "LI-12");
        assert_eq!(render_node(&lit(LiteralValue::Bool(true))), "LB1");
        assert_eq!(render_node(&lit(LiteralValue::Unit)), "LU");
        assert_eq!(render_node(&lit(LiteralValue::Symbol("draft".into()))), "LS:draft");
        assert_eq!(
            render_node(&lit(LiteralValue::Str("say \"hi\"; bye".into()))),
            r#"LS"say \"hi\"\u003b bye""#
        );
    }

    #[test]
    fn test_provenance_only_when_changed() {
        let mut store = NodeStore::new();
        let prov = Provenance::new("a.rb", 3, "go");
        store.append(lit(LiteralValue::Int(1)));
        store.append(
            Node::new(
                NodeKind::Function {
                    body: Some(Ref::Node(0)),
                    input: TypeTag::Unit,
                    output: TypeTag::Unit,
                },
                TypeTag::Unit,
            )
            .with_provenance(prov.clone()),
        );
        store.append(
            Node::new(
                NodeKind::Function {
                    body: None,
                    input: TypeTag::Unit,
                    output: TypeTag::Unit,
                },
                TypeTag::Unit,
            )
            .with_provenance(prov),
        );
        assert_eq!(to_ilx(&store), "LI1;@a.rb:3:go FUU0;FUU_;*");
    }

    #[test]
    fn test_parse_references_per_kind() {
        assert_eq!(parse_references("LS\"(x)\"").unwrap(), Vec::<Ref>::new());
        assert_eq!(parse_references("@u.rb:1:m FUA3").unwrap(), vec![Ref::Node(3)]);
        assert_eq!(parse_references("FUU_").unwrap(), Vec::<Ref>::new());
        assert_eq!(
            parse_references("AI+(0,$1)").unwrap(),
            vec![Ref::Node(0), Ref::Param(1)]
        );
        assert_eq!(
            parse_references("BI010203").unwrap(),
            vec![Ref::Node(1), Ref::Node(2), Ref::Node(3)]
        );
        assert_eq!(
            parse_references("MH0:1,2:3").unwrap(),
            vec![Ref::Node(0), Ref::Node(1), Ref::Node(2), Ref::Node(3)]
        );
        assert!(parse_references("Q").is_err());
    }

    fn function_with(provenance: Provenance) -> Node {
        Node::new(
            NodeKind::Function {
                body: Some(Ref::Node(0)),
                input: TypeTag::Unit,
                output: TypeTag::Unit,
            },
            TypeTag::Unit,
        )
        .with_provenance(provenance)
    }

    #[test]
    fn test_symbol_with_separator_stays_one_record() {
        let mut store = NodeStore::new();
        store.append(lit(LiteralValue::Symbol("a;b".into())));
        store.append(Node::new(
            NodeKind::Apply {
                op: "pr".to_string(),
                args: vec![Ref::Node(0)],
            },
            TypeTag::Unit,
        ));
        let line = to_ilx(&store);
        assert_eq!(line, r#"LS:"a\u003bb";AUpr(0);*"#);

        let records = split_records(&line);
        assert_eq!(records.len(), store.len());
        assert_eq!(parse_references(records[0]).unwrap(), Vec::<Ref>::new());
        assert_eq!(parse_references(records[1]).unwrap(), vec![Ref::Node(0)]);
    }

    #[test]
    fn test_unit_with_space_and_separator() {
        let mut store = NodeStore::new();
        store.append(lit(LiteralValue::Int(1)));
        store.append(function_with(Provenance::new("my app/post;1.rb", 3, "go")));
        let line = to_ilx(&store);
        assert_eq!(line, "LI1;@my%20app/post%3B1.rb:3:go FUU0;*");

        let records = split_records(&line);
        assert_eq!(records.len(), store.len());
        assert_eq!(parse_references(records[1]).unwrap(), vec![Ref::Node(0)]);
        let (provenance, body) = parse_provenance(records[1]).unwrap();
        assert_eq!(provenance, Some(Provenance::new("my app/post;1.rb", 3, "go")));
        assert_eq!(body, "FUU0");
    }

    #[test]
    fn test_plain_provenance_is_unchanged() {
        let (provenance, body) = parse_provenance("@app/models/post.rb:4:title_for FUA_").unwrap();
        assert_eq!(provenance, Some(Provenance::new("app/models/post.rb", 4, "title_for")));
        assert_eq!(body, "FUA_");
        assert!(parse_provenance("@a.rb:x:go FUU0").is_err());
        assert!(parse_provenance("@a%2.rb:1:go FUU0").is_err());
    }

    #[test]
    fn test_split_records_drops_sentinel() {
        assert_eq!(split_records("LI1;LI2;*"), vec!["LI1", "LI2"]);
        assert!(split_records("").is_empty());
    }
}
