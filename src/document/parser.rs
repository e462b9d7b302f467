//! Lossless YAML parsing.
//!
//! The parser builds a [`Documents`] tree in which every byte of the input is
//! kept, either as a token (keys, scalar text, indicators) or inside the
//! formatting prefix of the node that follows it. The supported subset covers
//! what configuration files use in practice: block and flow collections,
//! plain, quoted and block scalars, comments, anchors, aliases, directives and
//! multi-document streams. Tags, complex (`?`) keys, flow keys without a
//! value (`{a}`) and single-pair mappings in flow sequences (`[a: 1]`) are
//! rejected.
//!
//! The parser checks structure, not full YAML validity; callers that need
//! strict validation run the input through a conforming YAML parser first
//! (see `file::loader`).
//!
//! # Example
//!
//! ```
//! use yamlrewrite::document::parser::parse_yaml;
//!
//! let documents = parse_yaml("subjects:\n  kind: Service\n").unwrap();
//! let root = documents.documents()[0].block().as_mapping().unwrap();
//! assert_eq!(root.entries()[0].key().value(), "subjects");
//! ```

use std::sync::Arc;

use thiserror::Error;

use super::node::{
    Alias, Anchor, Block, Document, DocumentEnd, Documents, Mapping, MappingEntry, Scalar,
    ScalarStyle, Sequence, SequenceEntry,
};

/// A structural error in the YAML source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}, column {column}: {message}")]
pub struct ParseError {
    /// 1-based line number
    pub line: usize,
    /// 1-based column number, in characters
    pub column: usize,
    pub message: String,
}

/// Parses a YAML stream into a lossless tree.
///
/// # Errors
///
/// Returns a [`ParseError`] when the source uses unsupported constructs (tags,
/// complex keys) or is structurally malformed (unterminated quotes or flow
/// collections, content after the document root, and so on).
pub fn parse_yaml(source: &str) -> Result<Documents, ParseError> {
    Parser::new(source).parse_stream()
}

/// Where a block node appears; decides which same-line forms are legal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Context {
    Root,
    MappingValue,
    SequenceItem,
}

/// Result of looking ahead over trivia without consuming it.
#[derive(Debug, Clone, Copy)]
struct Lookahead {
    end: usize,
    column: usize,
    newline: bool,
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
    /// Length of a leading byte order mark, which takes up no column.
    bom: usize,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        let bom = if src.starts_with('\u{feff}') {
            '\u{feff}'.len_utf8()
        } else {
            0
        };
        Self { src, pos: bom, bom }
    }

    fn parse_stream(mut self) -> Result<Documents, ParseError> {
        let src = self.src;
        let mut documents = Vec::new();
        let mut suffix = String::new();

        loop {
            // the byte order mark stays in the first document's prefix
            let start = if documents.is_empty() { 0 } else { self.pos };
            let end = self.skip_directives(self.pos);

            if end == self.src.len() {
                if documents.is_empty() {
                    documents.push(Arc::new(Document::new(
                        &src[start..end],
                        false,
                        Block::empty(),
                        DocumentEnd::new("", false),
                    )));
                } else {
                    suffix = src[start..end].to_string();
                }
                self.pos = end;
                break;
            }

            let explicit = self.is_document_marker(end, b"---");
            let prefix = &src[start..end];
            self.pos = end;
            if explicit {
                self.pos += 3;
            }

            let block = self.parse_block(-1, Context::Root)?;

            let next = self.peek_trivia(self.pos);
            let end_prefix = &src[self.pos..next.end];
            let document_end = if next.end == self.src.len() {
                self.pos = next.end;
                DocumentEnd::new(end_prefix, false)
            } else if self.is_document_marker(next.end, b"...") {
                self.pos = next.end + 3;
                DocumentEnd::new(end_prefix, true)
            } else if self.is_document_marker(next.end, b"---") {
                self.pos = next.end;
                DocumentEnd::new(end_prefix, false)
            } else {
                return Err(self.error_at(next.end, "unexpected content after the document root"));
            };

            documents.push(Arc::new(Document::new(prefix, explicit, block, document_end)));
        }

        let mut documents = Documents::new(documents);
        documents.suffix = suffix;
        Ok(documents)
    }

    // Block context

    /// Parses the block that follows the current position, or returns an
    /// empty scalar (consuming nothing) when the next content does not belong
    /// to it.
    fn parse_block(&mut self, parent_indent: isize, context: Context) -> Result<Block, ParseError> {
        let next = self.peek_trivia(self.pos);

        if next.end == self.src.len() {
            return Ok(Block::empty());
        }
        if next.newline && !self.block_continues(next, parent_indent, context) {
            return Ok(Block::empty());
        }

        let prefix = self.src[self.pos..next.end].to_string();
        self.pos = next.end;
        self.parse_block_content(prefix, parent_indent, next.column, context, !next.newline)
    }

    /// True when a node starting on a new line at `next` is nested under the
    /// parent at `parent_indent`.
    fn block_continues(&self, next: Lookahead, parent_indent: isize, context: Context) -> bool {
        if self.is_any_document_marker(next.end) {
            return false;
        }
        let column = next.column as isize;
        column > parent_indent
            || (context == Context::MappingValue
                && column == parent_indent
                && self.is_sequence_indicator(next.end))
    }

    fn parse_block_content(
        &mut self,
        prefix: String,
        parent_indent: isize,
        column: usize,
        context: Context,
        same_line: bool,
    ) -> Result<Block, ParseError> {
        let start = self.pos;
        let nested_on_key_line = context == Context::MappingValue && same_line;

        match self.byte(start) {
            Some(b'&') if !self.is_mapping_key(start) => {
                self.parse_anchored_block(prefix, parent_indent, context)
            }
            Some(b'*') => Ok(Block::Alias(Arc::new(self.parse_alias(prefix)))),
            Some(b'!') => Err(self.error_at(start, "tags are not supported")),
            Some(b'?') if self.is_blank_or_end(start + 1) => {
                Err(self.error_at(start, "complex mapping keys are not supported"))
            }
            Some(b'[') | Some(b'{') => self.parse_flow_content(prefix),
            Some(b'|') => Ok(self.parse_block_scalar(prefix, ScalarStyle::Literal, parent_indent)),
            Some(b'>') => Ok(self.parse_block_scalar(prefix, ScalarStyle::Folded, parent_indent)),
            Some(b'"') | Some(b'\'') if !self.is_mapping_key(start) => {
                Ok(Block::Scalar(Arc::new(self.parse_quoted(prefix)?)))
            }
            _ if self.is_sequence_indicator(start) => {
                if nested_on_key_line {
                    return Err(self.error_at(
                        start,
                        "a block sequence cannot start on the same line as its key",
                    ));
                }
                let indentless =
                    context == Context::MappingValue && column as isize == parent_indent;
                self.parse_block_sequence(prefix, column, indentless)
            }
            _ if self.is_mapping_key(start) => {
                if nested_on_key_line {
                    return Err(self.error_at(
                        start,
                        "a nested mapping cannot start on the same line as its key",
                    ));
                }
                self.parse_block_mapping(prefix, column)
            }
            _ => Ok(Block::Scalar(Arc::new(
                self.parse_plain_block(prefix, parent_indent),
            ))),
        }
    }

    fn parse_anchored_block(
        &mut self,
        prefix: String,
        parent_indent: isize,
        context: Context,
    ) -> Result<Block, ParseError> {
        let anchor_start = self.pos;
        let key = self.parse_anchor_name()?;

        let next = self.peek_trivia(self.pos);
        let empty = next.end == self.src.len()
            || (next.newline && !self.block_continues(next, parent_indent, context))
            || (!next.newline && self.is_flow_terminator(next.end));
        if empty {
            let scalar = Scalar::plain(prefix, "").with_anchor(Some(Anchor::new(key, "")));
            return Ok(Block::Scalar(Arc::new(scalar)));
        }

        let anchor = Anchor::new(key, &self.src[self.pos..next.end]);
        self.pos = next.end;
        let block = self.parse_block_content(
            String::new(),
            parent_indent,
            next.column,
            context,
            !next.newline,
        )?;

        attach_anchor(block, prefix, anchor).map_err(|message| self.error_at(anchor_start, message))
    }

    fn parse_block_mapping(&mut self, prefix: String, indent: usize) -> Result<Block, ParseError> {
        let mut entries = Vec::new();
        let mut entry_prefix = String::new();

        loop {
            let key = self.parse_mapping_key()?;
            let before_indicator = self.take_inline_space();
            if self.byte(self.pos) != Some(b':') {
                return Err(self.error_at(self.pos, "expected ':' after mapping key"));
            }
            self.pos += 1;

            let value = self.parse_block(indent as isize, Context::MappingValue)?;
            entries.push(Arc::new(MappingEntry::new(
                std::mem::take(&mut entry_prefix),
                key,
                before_indicator,
                value,
            )));

            let next = self.peek_trivia(self.pos);
            if next.end == self.src.len()
                || !next.newline
                || next.column != indent
                || self.is_any_document_marker(next.end)
                || !self.is_mapping_key(next.end)
            {
                break;
            }
            entry_prefix = self.src[self.pos..next.end].to_string();
            self.pos = next.end;
        }

        Ok(Block::Mapping(Arc::new(Mapping::block(prefix, entries))))
    }

    fn parse_block_sequence(
        &mut self,
        prefix: String,
        indent: usize,
        indentless: bool,
    ) -> Result<Block, ParseError> {
        let mut entries = Vec::new();
        let mut entry_prefix = String::new();

        loop {
            // the '-' indicator
            self.pos += 1;
            let block = self.parse_block(indent as isize, Context::SequenceItem)?;
            entries.push(Arc::new(SequenceEntry::new(
                std::mem::take(&mut entry_prefix),
                true,
                block,
            )));

            let next = self.peek_trivia(self.pos);
            if next.end == self.src.len()
                || !next.newline
                || next.column != indent
                || !self.is_sequence_indicator(next.end)
            {
                break;
            }
            entry_prefix = self.src[self.pos..next.end].to_string();
            self.pos = next.end;
        }

        let mut sequence = Sequence::block(prefix, entries);
        sequence.indentless = indentless;
        Ok(Block::Sequence(Arc::new(sequence)))
    }

    /// Parses a mapping key (optionally anchored), stopping before any
    /// whitespace that precedes the `:` indicator.
    fn parse_mapping_key(&mut self) -> Result<Scalar, ParseError> {
        let anchor = if self.byte(self.pos) == Some(b'&') {
            let key = self.parse_anchor_name()?;
            Some(Anchor::new(key, self.take_inline_space()))
        } else {
            None
        };

        let scalar = match self.byte(self.pos) {
            Some(b'"') | Some(b'\'') => self.parse_quoted(String::new())?,
            _ => {
                let start = self.pos;
                let mut i = start;
                while let Some(b) = self.byte(i) {
                    if b == b'\n' || (b == b':' && self.is_blank_or_end(i + 1)) {
                        break;
                    }
                    i += 1;
                }
                let end = start + self.src[start..i].trim_end_matches([' ', '\t']).len();
                if end == start {
                    return Err(self.error_at(start, "empty mapping key"));
                }
                self.pos = end;
                Scalar::plain("", &self.src[start..end])
            }
        };

        Ok(scalar.with_anchor(anchor))
    }

    /// Parses a `|` or `>` scalar. The stored value is everything after the
    /// indicator up to the end of the last content line.
    fn parse_block_scalar(&mut self, prefix: String, style: ScalarStyle, parent_indent: isize) -> Block {
        let start = self.pos + 1;
        let mut content_end = self.line_end(start);
        let mut cursor = content_end;

        while cursor < self.src.len() {
            let line_start = cursor + 1;
            let line_end = self.line_end(line_start);
            let line = &self.src[line_start..line_end];
            cursor = line_end;

            if line.trim().is_empty() {
                continue;
            }
            let indent = line.len() - line.trim_start_matches(' ').len();
            if indent as isize <= parent_indent || self.is_any_document_marker(line_start) {
                break;
            }
            content_end = line_end;
        }

        self.pos = content_end;
        Block::Scalar(Arc::new(Scalar::new(
            prefix,
            style,
            &self.src[start..content_end],
        )))
    }

    /// Parses a plain scalar in block context, following continuation lines
    /// indented deeper than the parent.
    fn parse_plain_block(&mut self, prefix: String, parent_indent: isize) -> Scalar {
        let start = self.pos;
        let mut end = self.plain_line_end(start);

        loop {
            let mut i = end;
            while matches!(self.byte(i), Some(b' ') | Some(b'\t') | Some(b'\r')) {
                i += 1;
            }
            if self.byte(i) != Some(b'\n') {
                break;
            }

            // next non-blank line
            let mut line_start = i + 1;
            let mut line_end = self.line_end(line_start);
            while self.src[line_start..line_end].trim().is_empty() && line_end < self.src.len() {
                line_start = line_end + 1;
                line_end = self.line_end(line_start);
            }
            let line = &self.src[line_start..line_end];
            if line.trim().is_empty() {
                break;
            }

            let indent = line.len() - line.trim_start_matches(' ').len();
            let first = line_start + indent;
            if indent as isize <= parent_indent
                || self.byte(first) == Some(b'#')
                || self.is_any_document_marker(line_start)
                || self.is_mapping_key(first)
            {
                break;
            }
            end = self.plain_line_end(first);
        }

        self.pos = end;
        Scalar::plain(prefix, &self.src[start..end])
    }

    // Flow context

    fn parse_flow_node(&mut self) -> Result<Block, ParseError> {
        let end = self.trivia_end(self.pos);
        let prefix = self.src[self.pos..end].to_string();
        self.pos = end;
        self.parse_flow_content(prefix)
    }

    fn parse_flow_content(&mut self, prefix: String) -> Result<Block, ParseError> {
        let start = self.pos;
        match self.byte(start) {
            None => Err(self.error_at(start, "unexpected end of input inside a flow collection")),
            Some(b'{') => self.parse_flow_mapping(prefix),
            Some(b'[') => self.parse_flow_sequence(prefix),
            Some(b'"') | Some(b'\'') => Ok(Block::Scalar(Arc::new(self.parse_quoted(prefix)?))),
            Some(b'*') => Ok(Block::Alias(Arc::new(self.parse_alias(prefix)))),
            Some(b'!') => Err(self.error_at(start, "tags are not supported")),
            Some(b'&') => {
                let key = self.parse_anchor_name()?;
                let end = self.trivia_end(self.pos);
                if self.is_flow_terminator(end) {
                    let scalar = Scalar::plain(prefix, "").with_anchor(Some(Anchor::new(key, "")));
                    return Ok(Block::Scalar(Arc::new(scalar)));
                }
                let anchor = Anchor::new(key, &self.src[self.pos..end]);
                self.pos = end;
                let block = self.parse_flow_content(String::new())?;
                attach_anchor(block, prefix, anchor).map_err(|message| self.error_at(start, message))
            }
            Some(b',') | Some(b'}') | Some(b']') => Ok(Block::Scalar(Arc::new(Scalar::plain(prefix, "")))),
            _ => {
                let end = self.plain_flow_end(start);
                self.pos = end;
                Ok(Block::Scalar(Arc::new(Scalar::plain(prefix, &self.src[start..end]))))
            }
        }
    }

    fn parse_flow_mapping(&mut self, prefix: String) -> Result<Block, ParseError> {
        let open = self.pos;
        self.pos += 1;
        let mut entries = Vec::new();

        loop {
            let end = self.trivia_end(self.pos);
            match self.byte(end) {
                None => return Err(self.error_at(open, "unterminated flow mapping")),
                Some(b'}') => {
                    let closing = self.src[self.pos..end].to_string();
                    self.pos = end + 1;
                    let mapping = Mapping::flow(prefix, entries, closing);
                    return Ok(Block::Mapping(Arc::new(mapping)));
                }
                _ => {}
            }

            let entry_prefix = self.src[self.pos..end].to_string();
            self.pos = end;

            let key = self.parse_flow_key()?;
            let before_indicator = self.take_inline_space();
            match self.byte(self.pos) {
                Some(b':') => {}
                Some(b',') | Some(b'}') => {
                    return Err(self.error_at(
                        self.pos,
                        "flow mapping keys without a value are not supported",
                    ))
                }
                _ => return Err(self.error_at(self.pos, "expected ':' after flow mapping key")),
            }
            self.pos += 1;
            let value = self.parse_flow_node()?;

            let trailing_comma_prefix = self.flow_separator(b'}')?;
            let mut entry = MappingEntry::new(entry_prefix, key, before_indicator, value);
            entry.trailing_comma_prefix = trailing_comma_prefix;
            entries.push(Arc::new(entry));
        }
    }

    fn parse_flow_sequence(&mut self, prefix: String) -> Result<Block, ParseError> {
        let open = self.pos;
        self.pos += 1;
        let mut entries = Vec::new();

        loop {
            let end = self.trivia_end(self.pos);
            match self.byte(end) {
                None => return Err(self.error_at(open, "unterminated flow sequence")),
                Some(b']') => {
                    let closing = self.src[self.pos..end].to_string();
                    self.pos = end + 1;
                    let sequence = Sequence::flow(prefix, entries, closing);
                    return Ok(Block::Sequence(Arc::new(sequence)));
                }
                _ => {}
            }

            let block = self.parse_flow_node()?;
            let end = self.trivia_end(self.pos);
            if self.byte(end) == Some(b':') {
                return Err(self.error_at(
                    end,
                    "single-pair mappings inside flow sequences are not supported",
                ));
            }
            let trailing_comma_prefix = self.flow_separator(b']')?;
            let mut entry = SequenceEntry::new("", false, block);
            entry.trailing_comma_prefix = trailing_comma_prefix;
            entries.push(Arc::new(entry));
        }
    }

    /// Consumes a `,` after a flow entry and returns the whitespace before it.
    /// Leaves the position untouched when the collection closes instead.
    fn flow_separator(&mut self, close: u8) -> Result<Option<String>, ParseError> {
        let end = self.trivia_end(self.pos);
        match self.byte(end) {
            Some(b',') => {
                let comma_prefix = self.src[self.pos..end].to_string();
                self.pos = end + 1;
                Ok(Some(comma_prefix))
            }
            Some(b) if b == close => Ok(None),
            _ => Err(self.error_at(
                end,
                format!("expected ',' or '{}' in flow collection", close as char),
            )),
        }
    }

    fn parse_flow_key(&mut self) -> Result<Scalar, ParseError> {
        let anchor = if self.byte(self.pos) == Some(b'&') {
            let key = self.parse_anchor_name()?;
            Some(Anchor::new(key, self.take_inline_space()))
        } else {
            None
        };

        let scalar = match self.byte(self.pos) {
            Some(b'"') | Some(b'\'') => self.parse_quoted(String::new())?,
            Some(b'[') | Some(b'{') => {
                return Err(self.error_at(self.pos, "complex mapping keys are not supported"))
            }
            _ => {
                let start = self.pos;
                let end = self.plain_flow_end(start);
                if end == start {
                    return Err(self.error_at(start, "empty mapping key"));
                }
                self.pos = end;
                Scalar::plain("", &self.src[start..end])
            }
        };

        Ok(scalar.with_anchor(anchor))
    }

    // Tokens

    fn parse_quoted(&mut self, prefix: String) -> Result<Scalar, ParseError> {
        let open = self.pos;
        let quote = self.src.as_bytes()[open];
        let mut i = open + 1;

        loop {
            match self.byte(i) {
                None => {
                    let message = if quote == b'"' {
                        "unterminated double-quoted scalar"
                    } else {
                        "unterminated single-quoted scalar"
                    };
                    return Err(self.error_at(open, message));
                }
                Some(b'\\') if quote == b'"' => i += 2,
                Some(b'\'') if quote == b'\'' && self.byte(i + 1) == Some(b'\'') => i += 2,
                Some(b) if b == quote => break,
                Some(_) => i += 1,
            }
        }

        let style = if quote == b'"' {
            ScalarStyle::DoubleQuoted
        } else {
            ScalarStyle::SingleQuoted
        };
        self.pos = i + 1;
        Ok(Scalar::new(prefix, style, &self.src[open + 1..i]))
    }

    fn parse_alias(&mut self, prefix: String) -> Alias {
        let start = self.pos + 1;
        let end = self.name_end(start);
        self.pos = end;
        Alias::new(prefix, &self.src[start..end])
    }

    fn parse_anchor_name(&mut self) -> Result<String, ParseError> {
        let start = self.pos + 1;
        let end = self.name_end(start);
        if end == start {
            return Err(self.error_at(self.pos, "anchor without a name"));
        }
        self.pos = end;
        Ok(self.src[start..end].to_string())
    }

    fn name_end(&self, start: usize) -> usize {
        let mut i = start;
        while let Some(b) = self.byte(i) {
            if b.is_ascii_whitespace() || matches!(b, b',' | b'[' | b']' | b'{' | b'}') {
                break;
            }
            i += 1;
        }
        i
    }

    /// End of a plain scalar on the current line in block context, excluding
    /// trailing whitespace and comments.
    fn plain_line_end(&self, start: usize) -> usize {
        let mut i = start;
        while let Some(b) = self.byte(i) {
            if b == b'\n' || (matches!(b, b' ' | b'\t') && self.byte(i + 1) == Some(b'#')) {
                break;
            }
            i += 1;
        }
        start + self.src[start..i].trim_end_matches([' ', '\t', '\r']).len()
    }

    /// End of a plain scalar in flow context.
    fn plain_flow_end(&self, start: usize) -> usize {
        let mut i = start;
        while let Some(b) = self.byte(i) {
            let stop = match b {
                b'\n' | b',' | b'[' | b']' | b'{' | b'}' => true,
                b':' => self.is_blank_or_end(i + 1) || self.is_flow_terminator(i + 1),
                b' ' | b'\t' => self.byte(i + 1) == Some(b'#'),
                _ => false,
            };
            if stop {
                break;
            }
            i += 1;
        }
        start + self.src[start..i].trim_end_matches([' ', '\t', '\r']).len()
    }

    fn take_inline_space(&mut self) -> String {
        let start = self.pos;
        while matches!(self.byte(self.pos), Some(b' ') | Some(b'\t')) {
            self.pos += 1;
        }
        self.src[start..self.pos].to_string()
    }

    // Lookahead

    /// True when a mapping key (optionally anchored) followed by `:` starts
    /// at `start` on the current line.
    fn is_mapping_key(&self, start: usize) -> bool {
        let mut i = start;
        if self.byte(i) == Some(b'&') {
            i = self.name_end(i + 1);
            while matches!(self.byte(i), Some(b' ') | Some(b'\t')) {
                i += 1;
            }
        }

        match self.byte(i) {
            None => false,
            Some(quote @ (b'"' | b'\'')) => {
                let mut j = i + 1;
                loop {
                    match self.byte(j) {
                        None | Some(b'\n') => return false,
                        Some(b'\\') if quote == b'"' => j += 2,
                        Some(b'\'') if quote == b'\'' && self.byte(j + 1) == Some(b'\'') => j += 2,
                        Some(b) if b == quote => break,
                        Some(_) => j += 1,
                    }
                }
                j += 1;
                while matches!(self.byte(j), Some(b' ') | Some(b'\t')) {
                    j += 1;
                }
                self.byte(j) == Some(b':') && self.is_blank_or_end(j + 1)
            }
            Some(b'[' | b'{' | b'|' | b'>' | b'*' | b'!' | b'#' | b'\n' | b'&') => false,
            Some(b'?') if self.is_blank_or_end(i + 1) => false,
            Some(_) if self.is_sequence_indicator(i) => false,
            Some(_) => {
                let mut j = i;
                while let Some(b) = self.byte(j) {
                    match b {
                        b'\n' => return false,
                        b':' if self.is_blank_or_end(j + 1) => return true,
                        b' ' | b'\t' if self.byte(j + 1) == Some(b'#') => return false,
                        _ => j += 1,
                    }
                }
                false
            }
        }
    }

    fn is_sequence_indicator(&self, i: usize) -> bool {
        self.byte(i) == Some(b'-') && self.is_blank_or_end(i + 1)
    }

    fn is_document_marker(&self, i: usize, marker: &[u8; 3]) -> bool {
        self.column(i) == 0
            && self.src.as_bytes()[i..].starts_with(marker)
            && self.is_blank_or_end(i + 3)
    }

    fn is_any_document_marker(&self, i: usize) -> bool {
        self.is_document_marker(i, b"---") || self.is_document_marker(i, b"...")
    }

    fn is_blank_or_end(&self, i: usize) -> bool {
        matches!(
            self.byte(i),
            None | Some(b' ') | Some(b'\t') | Some(b'\r') | Some(b'\n')
        )
    }

    fn is_flow_terminator(&self, i: usize) -> bool {
        matches!(self.byte(i), Some(b',') | Some(b'}') | Some(b']'))
    }

    /// Skips whitespace, newlines and comments starting at `start`.
    fn trivia_end(&self, start: usize) -> usize {
        let mut i = start;
        while let Some(b) = self.byte(i) {
            match b {
                b' ' | b'\t' | b'\r' | b'\n' => i += 1,
                b'#' => i = self.line_end(i),
                _ => break,
            }
        }
        i
    }

    fn peek_trivia(&self, start: usize) -> Lookahead {
        let end = self.trivia_end(start);
        Lookahead {
            end,
            column: self.column(end),
            newline: self.src[start..end].contains('\n'),
        }
    }

    /// Skips trivia and `%` directive lines before a document.
    fn skip_directives(&self, start: usize) -> usize {
        let mut i = self.trivia_end(start);
        while self.column(i) == 0 && self.byte(i) == Some(b'%') {
            i = self.trivia_end(self.line_end(i));
        }
        i
    }

    fn line_end(&self, start: usize) -> usize {
        self.src[start..]
            .find('\n')
            .map(|offset| start + offset)
            .unwrap_or(self.src.len())
    }

    fn column(&self, i: usize) -> usize {
        let line_start = self.src[..i].rfind('\n').map(|p| p + 1).unwrap_or(self.bom);
        i.saturating_sub(line_start)
    }

    fn byte(&self, i: usize) -> Option<u8> {
        self.src.as_bytes().get(i).copied()
    }

    fn error_at(&self, i: usize, message: impl Into<String>) -> ParseError {
        let i = i.min(self.src.len());
        let before = &self.src[..i];
        let line = before.matches('\n').count() + 1;
        let line_start = before.rfind('\n').map(|p| p + 1).unwrap_or(self.bom).min(i);
        ParseError {
            line,
            column: self.src[line_start..i].chars().count() + 1,
            message: message.into(),
        }
    }
}

/// Moves `prefix` and `anchor` onto a freshly parsed block.
fn attach_anchor(block: Block, prefix: String, anchor: Anchor) -> Result<Block, &'static str> {
    Ok(match block {
        Block::Mapping(mapping) => {
            let mut mapping = mapping.with_anchor(Some(anchor));
            mapping.prefix = prefix;
            Block::Mapping(Arc::new(mapping))
        }
        Block::Sequence(sequence) => {
            let mut sequence = sequence.with_anchor(Some(anchor));
            sequence.prefix = prefix;
            Block::Sequence(Arc::new(sequence))
        }
        Block::Scalar(scalar) => {
            let mut scalar = scalar.with_anchor(Some(anchor));
            scalar.prefix = prefix;
            Block::Scalar(Arc::new(scalar))
        }
        Block::Alias(_) => return Err("an alias cannot carry an anchor"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::printer::print_yaml;

    fn roundtrip(source: &str) {
        let documents = parse_yaml(source)
            .unwrap_or_else(|e| panic!("failed to parse {:?}: {}", source, e));
        assert_eq!(print_yaml(&documents), source);
    }

    fn root(documents: &Documents) -> &Block {
        documents.documents()[0].block()
    }

    #[test]
    fn test_roundtrip_block_mapping() {
        roundtrip("name: Test\ncount: 42\nenabled: true\n");
        roundtrip("a:\n  b:\n    c: 1\n  d: 2\ne: 3");
    }

    #[test]
    fn test_roundtrip_comments() {
        roundtrip("# header\nsubjects: # trailing\n  # own line\n  kind: Service   # inline\n\n# footer\n");
    }

    #[test]
    fn test_roundtrip_sequences() {
        roundtrip("- Alice\n- Bob\n- Carol\n");
        roundtrip("items:\n- kind: a\n  name: x\n- kind: b\nother: 1\n");
        roundtrip("items:\n  - - nested\n    - seq\n  -\n  - last\n");
    }

    #[test]
    fn test_roundtrip_flow_collections() {
        roundtrip("subjects: {kind: Service}\n");
        roundtrip("a: {b: {c: 1}}\n");
        roundtrip("list: [ 1, 2 ,3, ]\nmap: { a: 1 , \"b\":2, c: }\n");
        roundtrip("x: [\n  a,\n  b\n]\n");
    }

    #[test]
    fn test_roundtrip_scalars() {
        roundtrip("a: 'it''s'\nb: \"esc \\\" quote\"\nc: plain text here\n");
        roundtrip("script: |\n  echo one\n\n  echo two\nnext: >-\n  folded\n  text\n");
        roundtrip("long: this is\n  continued\n  over lines\nnext: 1\n");
    }

    #[test]
    fn test_roundtrip_anchors_and_aliases() {
        roundtrip("base: &base\n  image: nginx\nderived:\n  <<: *base\n  tag: &t latest\n");
        roundtrip("list: [&a 1, *a]\n");
    }

    #[test]
    fn test_roundtrip_multiple_documents() {
        roundtrip("---\na: 1\n---\nb: 2\n...\n");
        roundtrip("%YAML 1.2\n---\na: 1\n...\n# trailing\n");
        roundtrip("a: 1\n---\n");
    }

    #[test]
    fn test_roundtrip_empty_and_comment_only() {
        roundtrip("");
        roundtrip("# only a comment\n");
        roundtrip("key:\n");
    }

    #[test]
    fn test_roundtrip_windows_line_endings() {
        roundtrip("a: 1\r\nb:\r\n  c: 2\r\n");
    }

    #[test]
    fn test_parse_structure() {
        let documents = parse_yaml("subjects:\n  kind: Service\n").unwrap();
        let mapping = root(&documents).as_mapping().unwrap();
        let subjects = mapping.get("subjects").unwrap();
        let inner = subjects.value().as_mapping().unwrap();

        assert_eq!(subjects.value().prefix(), "\n  ");
        let kind = inner.get("kind").unwrap();
        assert_eq!(kind.value().as_scalar().unwrap().value(), "Service");
        assert_eq!(kind.value().prefix(), " ");
    }

    #[test]
    fn test_parse_empty_value() {
        let documents = parse_yaml("a:\nb: 1\n").unwrap();
        let mapping = root(&documents).as_mapping().unwrap();
        let a = mapping.get("a").unwrap();

        assert_eq!(a.value().as_scalar().unwrap().value(), "");
        assert_eq!(a.value().prefix(), "");
        assert_eq!(mapping.entries().len(), 2);
    }

    #[test]
    fn test_parse_sequence_at_key_indent() {
        let documents = parse_yaml("items:\n- a\n- b\nnext: 1\n").unwrap();
        let mapping = root(&documents).as_mapping().unwrap();
        let items = mapping.get("items").unwrap().value().as_sequence().unwrap();

        assert_eq!(items.entries().len(), 2);
        assert!(items.entries()[0].is_dash());
        assert!(items.is_indentless());
        assert!(mapping.get("next").is_some());
    }

    #[test]
    fn test_indented_sequence_is_not_indentless() {
        let documents = parse_yaml("items:
  - a
list:
  - - b
").unwrap();
        let mapping = root(&documents).as_mapping().unwrap();
        let items = mapping.get("items").unwrap().value().as_sequence().unwrap();
        assert!(!items.is_indentless());

        let documents = parse_yaml("- a
- b
").unwrap();
        assert!(!root(&documents).as_sequence().unwrap().is_indentless());
    }

    #[test]
    fn test_byte_order_mark_kept_in_prefix() {
        let source = "\u{feff}kind: Service\nspec:\n  replicas: 1\n";
        roundtrip(source);

        let documents = parse_yaml(source).unwrap();
        assert_eq!(documents.documents()[0].prefix(), "\u{feff}");
        let mapping = root(&documents).as_mapping().unwrap();
        assert_eq!(mapping.entries()[0].key().value(), "kind");
        assert_eq!(mapping.entries().len(), 2);
    }

    #[test]
    fn test_byte_order_mark_before_comments_and_markers() {
        roundtrip("\u{feff}# header\n---\na: 1\n");
        roundtrip("\u{feff}---\na: 1\n");
        roundtrip("\u{feff}");
    }

    #[test]
    fn test_parse_quoted_key() {
        let documents = parse_yaml("\"a/b\": 1\n'c': 2\n").unwrap();
        let mapping = root(&documents).as_mapping().unwrap();

        assert_eq!(mapping.entries()[0].key().value(), "a/b");
        assert_eq!(mapping.entries()[0].key().style(), ScalarStyle::DoubleQuoted);
        assert_eq!(mapping.entries()[1].key().style(), ScalarStyle::SingleQuoted);
    }

    #[test]
    fn test_parse_anchor_on_mapping() {
        let documents = parse_yaml("base: &base\n  image: nginx\n").unwrap();
        let mapping = root(&documents).as_mapping().unwrap();
        let base = mapping.get("base").unwrap().value().as_mapping().unwrap();

        assert_eq!(base.anchor().unwrap().key(), "base");
        assert_eq!(base.prefix(), " ");
        assert_eq!(base.entries()[0].key().value(), "image");
    }

    #[test]
    fn test_parse_multiple_documents() {
        let documents = parse_yaml("---\na: 1\n---\nb: 2\n").unwrap();
        assert_eq!(documents.documents().len(), 2);
        assert!(documents.documents()[0].is_explicit());
        assert!(documents.documents()[1].is_explicit());
    }

    #[test]
    fn test_reject_tags() {
        let err = parse_yaml("a: !!str 1\n").unwrap_err();
        assert_eq!(err.line, 1);
        assert_eq!(err.column, 4);
        assert!(err.message.contains("tags"));
    }

    #[test]
    fn test_reject_unterminated_constructs() {
        assert!(parse_yaml("a: \"open\n").is_err());
        assert!(parse_yaml("a: [1, 2\n").is_err());
        assert!(parse_yaml("a: {b: 1\n").is_err());
    }

    #[test]
    fn test_reject_content_after_root() {
        let err = parse_yaml("a: 1\n- b\n").unwrap_err();
        assert_eq!(err.line, 2);
    }

    #[test]
    fn test_reject_unsupported_flow_forms() {
        let err = parse_yaml("a: {b, c: 1}\n").unwrap_err();
        assert_eq!(err.column, 6);
        assert!(err.message.contains("without a value"));

        let err = parse_yaml("a: [b: 1]\n").unwrap_err();
        assert_eq!(err.column, 6);
        assert!(err.message.contains("single-pair"));
    }

    #[test]
    fn test_reject_nested_mapping_on_key_line() {
        assert!(parse_yaml("a: b: c\n").is_err());
    }
}
