//! Lossless HCL documents
//!
//! Parses the HCL object-list syntax (`key = value`, `block "label" { ... }`,
//! lists, heredocs, and `#`, `//`, `/* */` comments) into a light tree that
//! remembers where every string literal lives in the source. Rendering copies
//! the source through untouched and only splices in the string leaves that
//! were replaced, so unrelated formatting, comments, and ordering survive.

use std::iter::Peekable;
use std::ops::Range;
use std::str::Chars;

use crate::document::{Document, ItemId, LeafId};
use crate::error::{ConfsealError, ErrorCategory, ErrorKind, Result};

/// A parsed HCL document that re-renders byte-for-byte.
#[derive(Debug, Clone)]
pub struct HclDocument {
    source: String,
    top: Vec<ItemId>,
    items: Vec<Item>,
    leaves: Vec<Leaf>,
}

#[derive(Debug, Clone, Default)]
struct Item {
    labels: Vec<String>,
    children: Vec<ItemId>,
    leaves: Vec<LeafId>,
}

#[derive(Debug, Clone)]
struct Leaf {
    span: Range<usize>,
    value: String,
    replacement: Option<String>,
}

impl HclDocument {
    /// Parse HCL source text.
    pub fn parse(source: &str) -> Result<Self> {
        let tokens = Lexer::new(source).tokenize()?;
        let mut parser = Parser {
            src: source,
            tokens,
            pos: 0,
            items: Vec::new(),
            leaves: Vec::new(),
        };
        let top = parser.parse_document()?;
        Ok(Self {
            source: source.to_string(),
            top,
            items: parser.items,
            leaves: parser.leaves,
        })
    }
}

impl Document for HclDocument {
    fn top_level(&self) -> &[ItemId] {
        &self.top
    }

    fn labels(&self, item: ItemId) -> &[String] {
        &self.items[item.0].labels
    }

    fn children(&self, item: ItemId) -> &[ItemId] {
        &self.items[item.0].children
    }

    fn leaves(&self, item: ItemId) -> &[LeafId] {
        &self.items[item.0].leaves
    }

    fn leaf_value(&self, leaf: LeafId) -> &str {
        &self.leaves[leaf.0].value
    }

    fn set_leaf_value(&mut self, leaf: LeafId, value: &str) {
        let leaf = &mut self.leaves[leaf.0];
        leaf.value = value.to_string();
        leaf.replacement = Some(quote(value));
    }

    fn render(&self) -> String {
        let mut out = String::with_capacity(self.source.len());
        let mut cursor = 0;
        // Leaves are stored in source order and never overlap.
        for leaf in &self.leaves {
            if let Some(replacement) = &leaf.replacement {
                out.push_str(&self.source[cursor..leaf.span.start]);
                out.push_str(replacement);
                cursor = leaf.span.end;
            }
        }
        out.push_str(&self.source[cursor..]);
        out
    }
}

/// Render a value as a quoted HCL string literal.
fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Decode the body of a quoted string literal.
///
/// Recognised escapes are `\a \b \f \n \r \t \v \\ \" \'`, `\xHH`, octal
/// `\ooo`, `\uXXXX` and `\UXXXXXXXX`. Interpolations (`${ ... }`) are copied
/// through as written.
fn unescape(raw: &str) -> std::result::Result<String, String> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '$' if chars.peek() == Some(&'{') => copy_interpolation(&mut chars, &mut out),
            '\\' => out.push(unescape_one(&mut chars)?),
            c => out.push(c),
        }
    }
    Ok(out)
}

/// Copy `${ ... }` verbatim, including string literals nested inside it.
fn copy_interpolation(chars: &mut Peekable<Chars<'_>>, out: &mut String) {
    out.push('$');
    let mut depth = 0usize;
    let mut in_string = false;
    while let Some(c) = chars.next() {
        out.push(c);
        match c {
            '\\' => {
                if let Some(next) = chars.next() {
                    out.push(next);
                }
            }
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return;
                }
            }
            _ => {}
        }
    }
}

fn unescape_one(chars: &mut Peekable<Chars<'_>>) -> std::result::Result<char, String> {
    let Some(c) = chars.next() else {
        return Err("string ends with a lone backslash".to_string());
    };
    let decoded = match c {
        'a' => '\u{07}',
        'b' => '\u{08}',
        'f' => '\u{0c}',
        'n' => '\n',
        'r' => '\r',
        't' => '\t',
        'v' => '\u{0b}',
        '\\' | '"' | '\'' => c,
        'x' => code_point(chars.by_ref().take(2).collect(), 2, 16, c)?,
        'u' => code_point(chars.by_ref().take(4).collect(), 4, 16, c)?,
        'U' => code_point(chars.by_ref().take(8).collect(), 8, 16, c)?,
        '0'..='7' => {
            let mut digits = String::from(c);
            digits.extend(chars.by_ref().take(2));
            code_point(digits, 3, 8, c)?
        }
        other => return Err(format!("unknown escape sequence \\{}", other)),
    };
    Ok(decoded)
}

fn code_point(digits: String, len: usize, radix: u32, escape: char) -> std::result::Result<char, String> {
    if digits.chars().count() != len || !digits.chars().all(|d| d.is_digit(radix)) {
        return Err(format!("malformed \\{} escape", escape));
    }
    u32::from_str_radix(&digits, radix)
        .ok()
        .filter(|&v| radix != 8 || v <= 0xff)
        .and_then(char::from_u32)
        .ok_or_else(|| format!("invalid code point in \\{} escape", escape))
}

fn parse_error(src: &str, offset: usize, msg: impl AsRef<str>) -> ConfsealError {
    let before = &src[..offset.min(src.len())];
    let line = before.matches('\n').count() + 1;
    let column = before
        .rsplit('\n')
        .next()
        .map_or(0, |l| l.chars().count())
        + 1;
    ConfsealError::with_kind(
        ErrorCategory::User,
        ErrorKind::Parse,
        format!("line {}, column {}: {}", line, column, msg.as_ref()),
    )
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum TokenKind {
    /// Identifiers, numbers, and booleans.
    Bare(String),
    Str(String),
    Heredoc(String),
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Assign,
    Comma,
}

#[derive(Debug, Clone)]
struct Token {
    kind: TokenKind,
    span: Range<usize>,
}

struct Lexer<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

fn is_bare(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'.' | b'+')
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            bytes: src.as_bytes(),
            pos: 0,
        }
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    fn tokenize(mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        while let Some(b) = self.peek_at(0) {
            let start = self.pos;
            let kind = match b {
                b' ' | b'\t' | b'\r' | b'\n' => {
                    self.pos += 1;
                    continue;
                }
                b'#' => {
                    self.skip_line();
                    continue;
                }
                b'/' if self.peek_at(1) == Some(b'/') => {
                    self.skip_line();
                    continue;
                }
                b'/' if self.peek_at(1) == Some(b'*') => {
                    self.skip_block_comment()?;
                    continue;
                }
                b'{' => self.punct(TokenKind::LBrace),
                b'}' => self.punct(TokenKind::RBrace),
                b'[' => self.punct(TokenKind::LBracket),
                b']' => self.punct(TokenKind::RBracket),
                b',' => self.punct(TokenKind::Comma),
                b'=' | b':' => self.punct(TokenKind::Assign),
                b'"' => self.string()?,
                b'<' if self.peek_at(1) == Some(b'<') => self.heredoc()?,
                b if is_bare(b) => {
                    while self.peek_at(0).is_some_and(is_bare) {
                        self.pos += 1;
                    }
                    TokenKind::Bare(self.src[start..self.pos].to_string())
                }
                _ => {
                    let c = self.src[start..].chars().next().unwrap_or('?');
                    return Err(parse_error(
                        self.src,
                        start,
                        format!("unexpected character {:?}", c),
                    ));
                }
            };
            tokens.push(Token {
                kind,
                span: start..self.pos,
            });
        }
        Ok(tokens)
    }

    fn punct(&mut self, kind: TokenKind) -> TokenKind {
        self.pos += 1;
        kind
    }

    fn skip_line(&mut self) {
        while self.peek_at(0).is_some_and(|b| b != b'\n') {
            self.pos += 1;
        }
    }

    fn skip_block_comment(&mut self) -> Result<()> {
        let start = self.pos;
        match self.src[start + 2..].find("*/") {
            Some(end) => {
                self.pos = start + 2 + end + 2;
                Ok(())
            }
            None => Err(parse_error(self.src, start, "unterminated block comment")),
        }
    }

    fn string(&mut self) -> Result<TokenKind> {
        let start = self.pos;
        self.pos += 1;
        // Depth of `${ ... }` interpolations; quotes inside them open nested literals.
        let mut depth = 0usize;
        loop {
            match self.peek_at(0) {
                None => return Err(parse_error(self.src, start, "unterminated string")),
                Some(b'\n') if depth == 0 => {
                    return Err(parse_error(self.src, start, "unterminated string"));
                }
                Some(b'\\') => self.pos += 2,
                Some(b'$') if self.peek_at(1) == Some(b'{') => {
                    depth += 1;
                    self.pos += 2;
                }
                Some(b'}') if depth > 0 => {
                    depth -= 1;
                    self.pos += 1;
                }
                Some(b'"') if depth == 0 => {
                    self.pos += 1;
                    break;
                }
                Some(b'"') => self.skip_nested_string(start)?,
                Some(_) => self.pos += 1,
            }
        }
        let value = unescape(&self.src[start + 1..self.pos - 1])
            .map_err(|msg| parse_error(self.src, start, msg))?;
        Ok(TokenKind::Str(value))
    }

    /// Skip a string literal inside an interpolation; `start` is the outer string.
    fn skip_nested_string(&mut self, start: usize) -> Result<()> {
        self.pos += 1;
        loop {
            match self.peek_at(0) {
                None | Some(b'\n') => {
                    return Err(parse_error(self.src, start, "unterminated string"));
                }
                Some(b'\\') => self.pos += 2,
                Some(b'"') => {
                    self.pos += 1;
                    return Ok(());
                }
                Some(_) => self.pos += 1,
            }
        }
    }

    fn heredoc(&mut self) -> Result<TokenKind> {
        let start = self.pos;
        self.pos += 2;
        let indented = self.peek_at(0) == Some(b'-');
        if indented {
            self.pos += 1;
        }

        let anchor_start = self.pos;
        while self
            .peek_at(0)
            .is_some_and(|b| b.is_ascii_alphanumeric() || b == b'_')
        {
            self.pos += 1;
        }
        let anchor = &self.src[anchor_start..self.pos];
        if anchor.is_empty() {
            return Err(parse_error(self.src, start, "heredoc is missing its anchor"));
        }

        match self.src[self.pos..].find('\n') {
            Some(nl) if self.src[self.pos..self.pos + nl].trim().is_empty() => {
                self.pos += nl + 1;
            }
            _ => {
                return Err(parse_error(
                    self.src,
                    start,
                    "heredoc anchor must be followed by a newline",
                ));
            }
        }

        let mut lines: Vec<&str> = Vec::new();
        loop {
            if self.pos >= self.bytes.len() {
                return Err(parse_error(
                    self.src,
                    start,
                    format!("heredoc not terminated by {:?}", anchor),
                ));
            }
            let rest = &self.src[self.pos..];
            let line_len = rest.find('\n').unwrap_or(rest.len());
            let line = rest[..line_len].trim_end_matches('\r');
            let trimmed = line.trim_start();
            if trimmed.trim_end() == anchor && (indented || trimmed.len() == line.len()) {
                let indent = line.len() - trimmed.len();
                self.pos += indent + anchor.len();
                break;
            }
            lines.push(line);
            self.pos += (line_len + 1).min(rest.len());
        }

        let strip = if indented {
            lines
                .iter()
                .filter(|l| !l.trim().is_empty())
                .map(|l| l.len() - l.trim_start_matches([' ', '\t']).len())
                .min()
                .unwrap_or(0)
        } else {
            0
        };
        let mut value = String::new();
        for line in lines {
            value.push_str(line.get(strip..).unwrap_or(""));
            value.push('\n');
        }
        Ok(TokenKind::Heredoc(value))
    }
}

struct Parser<'a> {
    src: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    items: Vec<Item>,
    leaves: Vec<Leaf>,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn error_here(&self, msg: &str) -> ConfsealError {
        let offset = self.peek().map_or(self.src.len(), |t| t.span.start);
        parse_error(self.src, offset, msg)
    }

    /// Top-level items. A body wrapped in a single `{ ... }` is accepted too.
    fn parse_document(&mut self) -> Result<Vec<ItemId>> {
        if matches!(self.peek().map(|t| &t.kind), Some(TokenKind::LBrace)) {
            self.pos += 1;
            let top = self.parse_object_list(true)?;
            if self.peek().is_some() {
                return Err(self.error_here("unexpected content after closing '}'"));
            }
            return Ok(top);
        }
        self.parse_object_list(false)
    }

    /// Parse items until end of input, or until the closing `}` when `nested`.
    fn parse_object_list(&mut self, nested: bool) -> Result<Vec<ItemId>> {
        let mut ids = Vec::new();
        loop {
            match self.peek().map(|t| &t.kind) {
                Some(TokenKind::Comma) => self.pos += 1,
                Some(TokenKind::RBrace) if nested => {
                    self.pos += 1;
                    return Ok(ids);
                }
                Some(TokenKind::RBrace) => return Err(self.error_here("unexpected '}'")),
                None if nested => return Err(self.error_here("expected '}'")),
                None => return Ok(ids),
                Some(_) => ids.push(self.parse_item()?),
            }
        }
    }

    fn parse_item(&mut self) -> Result<ItemId> {
        let mut item = Item::default();
        // Labels keep their source spelling, quotes included.
        while let Some(token) = self.peek() {
            match &token.kind {
                TokenKind::Bare(_) | TokenKind::Str(_) => {
                    item.labels.push(self.src[token.span.clone()].to_string());
                    self.pos += 1;
                }
                _ => break,
            }
        }
        if item.labels.is_empty() {
            return Err(self.error_here("expected a key"));
        }

        match self.peek().map(|t| &t.kind) {
            Some(TokenKind::Assign) => {
                self.pos += 1;
                self.parse_value(&mut item)?;
            }
            Some(TokenKind::LBrace) => self.parse_value(&mut item)?,
            _ => return Err(self.error_here("expected '=' or '{' after key")),
        }

        self.items.push(item);
        Ok(ItemId(self.items.len() - 1))
    }

    /// Parse one value, attaching its leaves and nested items to `owner`.
    fn parse_value(&mut self, owner: &mut Item) -> Result<()> {
        let Some(token) = self.tokens.get(self.pos).cloned() else {
            return Err(self.error_here("expected a value"));
        };
        match token.kind {
            TokenKind::Str(value) | TokenKind::Heredoc(value) => {
                self.pos += 1;
                self.leaves.push(Leaf {
                    span: token.span,
                    value,
                    replacement: None,
                });
                owner.leaves.push(LeafId(self.leaves.len() - 1));
            }
            // Numbers and bools are never encrypted, so they are not leaves.
            TokenKind::Bare(_) => self.pos += 1,
            TokenKind::LBrace => {
                self.pos += 1;
                let children = self.parse_object_list(true)?;
                owner.children.extend(children);
            }
            TokenKind::LBracket => {
                self.pos += 1;
                loop {
                    match self.peek().map(|t| &t.kind) {
                        Some(TokenKind::Comma) => self.pos += 1,
                        Some(TokenKind::RBracket) => {
                            self.pos += 1;
                            break;
                        }
                        None => return Err(self.error_here("expected ']'")),
                        Some(_) => self.parse_value(owner)?,
                    }
                }
            }
            _ => return Err(self.error_here("expected a value")),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET_HCL: &str = r#"secret "test" {
  path = "secret/test"

  data {
    value  = "test_value1"
    value2 = "test_value2"
  }
}
"#;

    fn find(doc: &HclDocument, items: &[ItemId], label: &str) -> Vec<ItemId> {
        items
            .iter()
            .copied()
            .filter(|&i| doc.has_label(i, label))
            .collect()
    }

    #[test]
    fn test_render_untouched_is_identical() {
        let inputs = [
            "",
            "\n\n",
            SECRET_HCL,
            "a = 1\nb = true\nc = \"x\"\n",
            "# comment\n// other\n/* block\n comment */\nx = \"y\" # trailing\n",
            "list = [\"a\", \"b\",\n  \"c\",\n]\n",
            "obj = { a = \"1\", b = \"2\" }\n",
            "text = <<EOF\nhello\nworld\nEOF\nafter = \"z\"\n",
            "mount \"secret\" { type = \"generic\" }\r\n",
            "a: \"colon\"\n",
        ];
        for input in inputs {
            let doc = HclDocument::parse(input).unwrap();
            assert_eq!(doc.render(), input);
        }
    }

    #[test]
    fn test_labels_and_nesting() {
        let doc = HclDocument::parse(SECRET_HCL).unwrap();

        let top = doc.top_level().to_vec();
        assert_eq!(top.len(), 1);
        assert_eq!(doc.labels(top[0]), ["secret", "\"test\""]);
        assert!(doc.has_label(top[0], "\"test\""));
        assert!(!doc.has_label(top[0], "test"));

        let children = doc.children(top[0]).to_vec();
        assert_eq!(children.len(), 2);
        assert_eq!(doc.labels(children[0]), ["path"]);
        assert_eq!(doc.leaf_value(doc.leaves(children[0])[0]), "secret/test");

        let data = find(&doc, &children, "data");
        assert_eq!(data.len(), 1);
        let values = doc.children(data[0]).to_vec();
        let leaves: Vec<&str> = values
            .iter()
            .flat_map(|&i| doc.leaves(i).iter().map(|&l| doc.leaf_value(l)))
            .collect();
        assert_eq!(leaves, ["test_value1", "test_value2"]);
    }

    #[test]
    fn test_list_elements() {
        let doc = HclDocument::parse("keys = [\"a\", 1, \"b\", { inner = \"c\" }]\n").unwrap();
        let item = doc.top_level()[0];

        let leaves: Vec<&str> = doc.leaves(item).iter().map(|&l| doc.leaf_value(l)).collect();
        assert_eq!(leaves, ["a", "b"]);

        let children = doc.children(item);
        assert_eq!(children.len(), 1);
        assert_eq!(doc.labels(children[0]), ["inner"]);
    }

    #[test]
    fn test_non_string_values_have_no_leaves() {
        let doc = HclDocument::parse("ttl = 3600\nenabled = false\nratio = -1.5\n").unwrap();
        for &item in doc.top_level() {
            assert!(doc.leaves(item).is_empty());
            assert!(doc.children(item).is_empty());
        }
    }

    #[test]
    fn test_escapes_decoded_and_reencoded() {
        let mut doc = HclDocument::parse(r#"v = "a \"quoted\" \\ value\n""#).unwrap();
        let leaf = doc.leaves(doc.top_level()[0])[0];
        assert_eq!(doc.leaf_value(leaf), "a \"quoted\" \\ value\n");

        let value = doc.leaf_value(leaf).to_string();
        doc.set_leaf_value(leaf, &value);
        assert_eq!(doc.render(), r#"v = "a \"quoted\" \\ value\n""#);
    }

    #[test]
    fn test_interpolation_with_inner_quotes() {
        let src = "v = \"${lookup(var.map, \"key\")}\"\n";
        let doc = HclDocument::parse(src).unwrap();
        let leaf = doc.leaves(doc.top_level()[0])[0];
        assert_eq!(doc.leaf_value(leaf), "${lookup(var.map, \"key\")}");
        assert_eq!(doc.render(), src);
    }

    #[test]
    fn test_interpolation_with_brace_in_inner_string() {
        let src = "v = \"${lookup(m, \"}\")}\"\nafter = \"x\"\n";
        let doc = HclDocument::parse(src).unwrap();
        let leaf = doc.leaves(doc.top_level()[0])[0];
        assert_eq!(doc.leaf_value(leaf), "${lookup(m, \"}\")}");
        assert_eq!(doc.labels(doc.top_level()[1]), ["after"]);
        assert_eq!(doc.render(), src);
    }

    #[test]
    fn test_full_escape_set_decoded() {
        let src = r#"v = "caf\u00e9 \x41\101 \a\b\f\v \U0001F600 \'""#;
        let doc = HclDocument::parse(src).unwrap();
        let leaf = doc.leaves(doc.top_level()[0])[0];
        assert_eq!(
            doc.leaf_value(leaf),
            "caf\u{e9} AA \u{07}\u{08}\u{0c}\u{0b} \u{1F600} '"
        );
        assert_eq!(doc.render(), src);
    }

    #[test]
    fn test_control_characters_requoted() {
        let mut doc = HclDocument::parse("v = \"x\"\n").unwrap();
        let leaf = doc.leaves(doc.top_level()[0])[0];
        doc.set_leaf_value(leaf, "bell\u{07}caf\u{e9}");
        let rendered = doc.render();
        assert_eq!(rendered, "v = \"bell\\u0007caf\u{e9}\"\n");

        let reparsed = HclDocument::parse(&rendered).unwrap();
        let leaf = reparsed.leaves(reparsed.top_level()[0])[0];
        assert_eq!(reparsed.leaf_value(leaf), "bell\u{07}caf\u{e9}");
    }

    #[test]
    fn test_heredoc_value() {
        let doc = HclDocument::parse("policy = <<EOF\npath \"x\" {}\nEOF\n").unwrap();
        let leaf = doc.leaves(doc.top_level()[0])[0];
        assert_eq!(doc.leaf_value(leaf), "path \"x\" {}\n");
    }

    #[test]
    fn test_indented_heredoc() {
        let src = "a {\n  b = <<-EOT\n    one\n      two\n    EOT\n}\n";
        let doc = HclDocument::parse(src).unwrap();
        let b = doc.children(doc.top_level()[0])[0];
        assert_eq!(doc.leaf_value(doc.leaves(b)[0]), "one\n  two\n");
        assert_eq!(doc.render(), src);
    }

    #[test]
    fn test_set_leaf_only_touches_that_span() {
        let mut doc = HclDocument::parse(SECRET_HCL).unwrap();
        let secret = doc.top_level()[0];
        let data = find(&doc, doc.children(secret), "data")[0];
        let value2 = doc.children(data)[1];
        let leaf = doc.leaves(value2)[0];

        doc.set_leaf_value(leaf, "replaced");

        let expected = SECRET_HCL.replace("\"test_value2\"", "\"replaced\"");
        assert_eq!(doc.render(), expected);
        assert_eq!(doc.leaf_value(leaf), "replaced");
    }

    #[test]
    fn test_heredoc_replaced_with_quoted_string() {
        let mut doc = HclDocument::parse("x = <<EOF\nline\nEOF\ny = 1\n").unwrap();
        let leaf = doc.leaves(doc.top_level()[0])[0];
        doc.set_leaf_value(leaf, "flat");
        assert_eq!(doc.render(), "x = \"flat\"\ny = 1\n");
    }

    #[test]
    fn test_braced_document_body() {
        let src = "{ secret \"x\" { data { value = \"hello\" } } }";
        let doc = HclDocument::parse(src).unwrap();
        let secret = find(&doc, doc.top_level(), "secret");
        assert_eq!(secret.len(), 1);
        assert_eq!(doc.labels(secret[0]), ["secret", "\"x\""]);
        assert_eq!(doc.render(), src);

        let err = HclDocument::parse("{ a = 1 } b = 2").expect_err("trailing item");
        assert_eq!(err.kind, Some(ErrorKind::Parse));
    }

    #[test]
    fn test_parse_errors() {
        let cases = [
            ("a = \"unterminated\n", 1, 5),
            ("a {\n  b = \"x\"\n", 3, 1),
            ("}\n", 1, 1),
            ("a = \n", 2, 1),
            ("a \"b\"\n", 2, 1),
            ("x = <<EOF\nno end\n", 1, 5),
            ("/* open", 1, 1),
            ("a = @\n", 1, 5),
            ("a = \"bad \\q\"\n", 1, 5),
            ("a = \"\\u12\"\n", 1, 5),
            ("a = \"\\UFFFFFFFF\"\n", 1, 5),
            ("a = \"${f(\"x)}\"\n", 1, 5),
        ];
        for (input, line, column) in cases {
            let err = HclDocument::parse(input).expect_err("expected parse error");
            assert_eq!(err.kind, Some(ErrorKind::Parse), "input: {:?}", input);
            let prefix = format!("line {}, column {}:", line, column);
            assert!(
                err.message().starts_with(&prefix),
                "input {:?}: {:?} does not start with {:?}",
                input,
                err.message(),
                prefix
            );
        }
    }
}
