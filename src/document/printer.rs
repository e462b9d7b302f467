//! YAML printing.
//!
//! Printing concatenates every prefix and token held by the tree, so a tree
//! that was parsed and not modified prints back to its original source.

use super::node::{
    Alias, Anchor, Block, Document, Documents, Mapping, MappingEntry, Scalar, ScalarStyle,
    Sequence, SequenceEntry,
};

/// Prints a full YAML stream.
///
/// # Example
///
/// ```
/// use yamlrewrite::document::parser::parse_yaml;
/// use yamlrewrite::document::printer::print_yaml;
///
/// let source = "# services\nsubjects:\n  kind: Service # inline\n";
/// let documents = parse_yaml(source).unwrap();
/// assert_eq!(print_yaml(&documents), source);
/// ```
pub fn print_yaml(documents: &Documents) -> String {
    let mut out = String::new();
    for document in documents.documents() {
        print_document(document, &mut out);
    }
    out.push_str(documents.suffix());
    out
}

/// Prints a single block (and everything below it), including its prefix.
pub fn print_block(block: &Block) -> String {
    let mut out = String::new();
    write_block(block, &mut out);
    out
}

fn print_document(document: &Document, out: &mut String) {
    out.push_str(document.prefix());
    if document.is_explicit() {
        out.push_str("---");
    }
    write_block(document.block(), out);
    out.push_str(document.end().prefix());
    if document.end().is_explicit() {
        out.push_str("...");
    }
}

fn write_block(block: &Block, out: &mut String) {
    match block {
        Block::Mapping(mapping) => write_mapping(mapping, out),
        Block::Sequence(sequence) => write_sequence(sequence, out),
        Block::Scalar(scalar) => write_scalar(scalar, out),
        Block::Alias(alias) => write_alias(alias, out),
    }
}

fn write_anchor(anchor: Option<&Anchor>, out: &mut String) {
    if let Some(anchor) = anchor {
        out.push('&');
        out.push_str(anchor.key());
        out.push_str(anchor.postfix());
    }
}

fn write_mapping(mapping: &Mapping, out: &mut String) {
    out.push_str(mapping.prefix());
    write_anchor(mapping.anchor(), out);
    if mapping.is_flow() {
        out.push('{');
    }
    for entry in mapping.entries() {
        write_mapping_entry(entry, out);
    }
    if let Some(closing) = mapping.closing_brace_prefix() {
        out.push_str(closing);
        out.push('}');
    }
}

fn write_mapping_entry(entry: &MappingEntry, out: &mut String) {
    out.push_str(entry.prefix());
    write_scalar(entry.key(), out);
    out.push_str(entry.before_mapping_value_indicator());
    out.push(':');
    write_block(entry.value(), out);
    write_trailing_comma(entry.trailing_comma_prefix(), out);
}

fn write_sequence(sequence: &Sequence, out: &mut String) {
    out.push_str(sequence.prefix());
    write_anchor(sequence.anchor(), out);
    if sequence.is_flow() {
        out.push('[');
    }
    for entry in sequence.entries() {
        write_sequence_entry(entry, out);
    }
    if let Some(closing) = sequence.closing_bracket_prefix() {
        out.push_str(closing);
        out.push(']');
    }
}

fn write_sequence_entry(entry: &SequenceEntry, out: &mut String) {
    out.push_str(entry.prefix());
    if entry.is_dash() {
        out.push('-');
    }
    write_block(entry.block(), out);
    write_trailing_comma(entry.trailing_comma_prefix(), out);
}

fn write_trailing_comma(prefix: Option<&str>, out: &mut String) {
    if let Some(prefix) = prefix {
        out.push_str(prefix);
        out.push(',');
    }
}

fn write_scalar(scalar: &Scalar, out: &mut String) {
    out.push_str(scalar.prefix());
    write_anchor(scalar.anchor(), out);
    match scalar.style() {
        ScalarStyle::Plain => out.push_str(scalar.value()),
        ScalarStyle::SingleQuoted => {
            out.push('\'');
            out.push_str(scalar.value());
            out.push('\'');
        }
        ScalarStyle::DoubleQuoted => {
            out.push('"');
            out.push_str(scalar.value());
            out.push('"');
        }
        ScalarStyle::Literal => {
            out.push('|');
            out.push_str(scalar.value());
        }
        ScalarStyle::Folded => {
            out.push('>');
            out.push_str(scalar.value());
        }
    }
}

fn write_alias(alias: &Alias, out: &mut String) {
    out.push_str(alias.prefix());
    out.push('*');
    out.push_str(alias.name());
}
