/// # Train info page markup handling
///
/// The live train info pages are served as markup whose timetable rows are
/// the only part with a stable shape: a table row of exactly five
/// table-data cells. This module extracts those rows and flattens each cell
/// into its logical text.
///
/// A cell is modeled as a small node tree (text, children, tail) so that
/// line-break markup inside a cell can be kept apart from ordinary inline
/// markup. Tree construction is a tolerant local scanner over known blocks,
/// with case-insensitive tag detection and entity normalization; it is
/// deliberately not a general markup parser.
use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{take_till, take_till1, take_while1},
    character::complete::char,
    combinator::{map, opt},
    multi::many0,
};

use crate::parsing::helpers::normalize_whitespace;

/// Number of table-data cells a timetable row carries. Rows of any other
/// shape (headers, separators, decorations) are not timetable rows.
const TIMETABLE_ROW_CELLS: usize = 5;

/// Tags that never carry content of their own.
const VOID_TAGS: [&str; 7] = ["br", "hr", "img", "input", "link", "meta", "wbr"];

// ------------------------------------------------------------------------------------------------
// --- CellNode
// ------------------------------------------------------------------------------------------------

/// One node of a cell's markup tree: the text before its first child, the
/// children themselves, and the tail text between its closing tag and the
/// next sibling. Line-break nodes are the only structurally meaningful
/// markup inside a cell.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CellNode {
    line_break: bool,
    text: String,
    children: Vec<CellNode>,
    tail: String,
}

impl CellNode {
    /// Inline node with the given text content.
    pub fn inline(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Line-break node; closes the current logical line.
    pub fn line_break() -> Self {
        Self {
            line_break: true,
            ..Self::default()
        }
    }

    pub fn with_tail(mut self, tail: impl Into<String>) -> Self {
        self.tail = tail.into();
        self
    }

    pub fn with_children(mut self, children: Vec<CellNode>) -> Self {
        self.children = children;
        self
    }

    pub fn is_line_break(&self) -> bool {
        self.line_break
    }
}

/// Flattens a cell into its logical text. A line-break child ends the
/// current line and starts the next from the break's tail; every other node
/// contributes its own text and tail inline. Each segment has its
/// whitespace runs collapsed to single spaces before concatenation, so the
/// only newline source in the result is line-break markup — the row
/// grammars rely on exactly that.
pub fn cell_text(cell: &CellNode) -> String {
    let mut out = String::new();
    visit(cell, &mut out);
    out
}

fn visit(node: &CellNode, out: &mut String) {
    if node.is_line_break() {
        out.push('\n');
        out.push_str(&normalize_whitespace(&node.tail));
        return;
    }
    out.push_str(&normalize_whitespace(&node.text));
    for child in &node.children {
        visit(child, out);
    }
    out.push_str(&normalize_whitespace(&node.tail));
}

// ------------------------------------------------------------------------------------------------
// --- Tokenizer
// ------------------------------------------------------------------------------------------------

#[derive(Debug)]
enum Token {
    Text(String),
    Open(String),
    Close(String),
    Void(String),
}

fn tag_combinator(input: &str) -> IResult<&str, Token> {
    let (rest, _) = char('<').parse(input)?;
    let (rest, closing) = opt(char('/')).parse(rest)?;
    let (rest, name) = take_while1(|c: char| c.is_ascii_alphanumeric()).parse(rest)?;
    let (rest, attributes) = take_till(|c| c == '>').parse(rest)?;
    let (rest, _) = char('>').parse(rest)?;

    let name = name.to_ascii_lowercase();
    let token = if closing.is_some() {
        Token::Close(name)
    } else if attributes.trim_end().ends_with('/') || VOID_TAGS.contains(&name.as_str()) {
        Token::Void(name)
    } else {
        Token::Open(name)
    };
    Ok((rest, token))
}

fn text_combinator(input: &str) -> IResult<&str, Token> {
    map(take_till1(|c| c == '<'), |text: &str| {
        Token::Text(decode_entities(text))
    })
    .parse(input)
}

// A '<' that does not start a tag is kept as text.
fn stray_combinator(input: &str) -> IResult<&str, Token> {
    map(char('<'), |c: char| Token::Text(c.to_string())).parse(input)
}

fn tokens_combinator(input: &str) -> IResult<&str, Vec<Token>> {
    many0(alt((tag_combinator, text_combinator, stray_combinator))).parse(input)
}

/// Decodes the handful of entities the live pages actually emit. The
/// non-breaking space becomes ordinary whitespace for the normalization
/// pass.
fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", "\u{a0}")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

// ------------------------------------------------------------------------------------------------
// --- Tree construction
// ------------------------------------------------------------------------------------------------

/// Builds the markup tree of one table cell's inner markup.
pub(crate) fn parse_cell(inner: &str) -> CellNode {
    let mut root = CellNode::default();
    if let Ok((_, tokens)) = tokens_combinator(inner) {
        let mut tokens = tokens.into_iter();
        build(&mut tokens, &mut root, None);
    }
    root
}

fn build(tokens: &mut std::vec::IntoIter<Token>, node: &mut CellNode, scope: Option<&str>) {
    while let Some(token) = tokens.next() {
        match token {
            Token::Text(text) => append_text(node, &text),
            Token::Void(name) => {
                if name == "br" {
                    node.children.push(CellNode::line_break());
                } else {
                    node.children.push(CellNode::default());
                }
            }
            Token::Open(name) => {
                let mut child = CellNode::default();
                build(tokens, &mut child, Some(name.as_str()));
                node.children.push(child);
            }
            Token::Close(name) => {
                if Some(name.as_str()) == scope {
                    return;
                }
                // Unmatched closing tag; tolerated and dropped.
            }
        }
    }
}

fn append_text(node: &mut CellNode, text: &str) {
    match node.children.last_mut() {
        Some(last) => last.tail.push_str(text),
        None => node.text.push_str(text),
    }
}

// ------------------------------------------------------------------------------------------------
// --- Row extraction
// ------------------------------------------------------------------------------------------------

/// Extracts the timetable rows of a live train info page: every table row
/// with exactly five table-data cells, each cell parsed into its markup
/// tree.
pub fn timetable_rows(document: &str) -> Vec<Vec<CellNode>> {
    let document = strip_comments(document);
    blocks(&document, "tr")
        .into_iter()
        .map(|row| {
            blocks(row, "td")
                .into_iter()
                .map(parse_cell)
                .collect::<Vec<_>>()
        })
        .filter(|cells| cells.len() == TIMETABLE_ROW_CELLS)
        .collect()
}

/// Returns the inner markup of every `<name ...>...</name>` block, scanning
/// case-insensitively and tolerating a missing closing tag at the end of
/// the document.
fn blocks<'a>(html: &'a str, name: &str) -> Vec<&'a str> {
    let lower = html.to_ascii_lowercase();
    let open = format!("<{name}");
    let close = format!("</{name}");
    let mut out = Vec::new();
    let mut cursor = 0;
    while let Some(found) = lower[cursor..].find(&open) {
        let tag_start = cursor + found;
        let after_name = tag_start + open.len();
        // "<tr" must not match "<track": the tag name has to end here.
        match lower[after_name..].chars().next() {
            Some(c) if c.is_ascii_alphanumeric() => {
                cursor = after_name;
                continue;
            }
            None => break,
            _ => {}
        }
        let Some(gt) = lower[after_name..].find('>') else {
            break;
        };
        let inner_start = after_name + gt + 1;
        let inner_end = lower[inner_start..]
            .find(&close)
            .map(|i| inner_start + i)
            .unwrap_or(lower.len());
        out.push(&html[inner_start..inner_end]);
        cursor = inner_end;
    }
    out
}

fn strip_comments(document: &str) -> String {
    let mut out = String::with_capacity(document.len());
    let mut rest = document;
    while let Some(start) = rest.find("<!--") {
        out.push_str(&rest[..start]);
        match rest[start..].find("-->") {
            Some(end) => rest = &rest[start + end + 3..],
            None => return out,
        }
    }
    out.push_str(rest);
    out
}
