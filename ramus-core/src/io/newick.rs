//! Newick tree text
//!
//! Parser and writer for n-ary Newick trees with optional names, branch
//! lengths, and support values. Square-bracket comments and quoted labels
//! are handled; the trailing semicolon is optional on input.
//!
//! Labels on internal nodes follow the common convention that a numeric
//! label is a support value, not a name. Leaf labels are always names.
//! The writer inverts that rule: an internal node with a support value
//! writes the support in its label position, otherwise its name.

use std::path::Path;

use anyhow::Result;
use thiserror::Error;

use crate::tree::TreeNode;

#[derive(Debug, Error, PartialEq)]
pub enum NewickError {
    #[error("Empty input")]
    Empty,
    #[error("Unexpected end of input at byte {0}")]
    UnexpectedEnd(usize),
    #[error("Unexpected character '{ch}' at byte {pos}")]
    UnexpectedChar { ch: char, pos: usize },
    #[error("Invalid branch length '{text}' at byte {pos}")]
    InvalidBranchLength { text: String, pos: usize },
    #[error("Unterminated quoted label starting at byte {0}")]
    UnterminatedQuote(usize),
    #[error("Unterminated comment starting at byte {0}")]
    UnterminatedComment(usize),
    #[error("Trailing content after tree at byte {0}")]
    TrailingContent(usize),
}

pub type NewickResult<T> = Result<T, NewickError>;

/// Characters that end an unquoted label.
const LABEL_DELIMITERS: &[u8] = b"(),:;[]' \t\r\n";

/// Parse a single Newick tree from text.
pub fn parse(text: &str) -> NewickResult<TreeNode> {
    let mut scanner = Scanner::new(text);
    scanner.skip_trivia()?;
    if scanner.at_end() {
        return Err(NewickError::Empty);
    }
    let tree = scanner.parse_tree()?;
    scanner.skip_trivia()?;
    scanner.consume_if(b';');
    scanner.skip_trivia()?;
    if !scanner.at_end() {
        return Err(NewickError::TrailingContent(scanner.pos));
    }
    Ok(tree)
}

/// Serialize a tree to Newick text, with a trailing semicolon.
pub fn write(tree: &TreeNode) -> String {
    enum Frame<'a> {
        Open(&'a TreeNode),
        Close(&'a TreeNode),
        Comma,
    }

    let mut out = String::new();
    let mut stack = vec![Frame::Open(tree)];
    while let Some(frame) = stack.pop() {
        match frame {
            Frame::Open(node) => {
                if node.is_terminal() {
                    push_leaf(&mut out, node);
                } else {
                    out.push('(');
                    stack.push(Frame::Close(node));
                    for (index, child) in node.children.iter().enumerate().rev() {
                        stack.push(Frame::Open(child));
                        if index > 0 {
                            stack.push(Frame::Comma);
                        }
                    }
                }
            }
            Frame::Close(node) => {
                out.push(')');
                push_internal_label(&mut out, node);
                push_branch_length(&mut out, node);
            }
            Frame::Comma => out.push(','),
        }
    }
    out.push(';');
    out
}

/// Read and parse a Newick file.
pub fn read_file<P: AsRef<Path>>(path: P) -> Result<TreeNode> {
    let text = std::fs::read_to_string(path)?;
    Ok(parse(&text)?)
}

/// Write a tree to a Newick file.
pub fn write_file<P: AsRef<Path>>(path: P, tree: &TreeNode) -> Result<()> {
    std::fs::write(path, write(tree))?;
    Ok(())
}

fn push_leaf(out: &mut String, node: &TreeNode) {
    if let Some(name) = &node.name {
        push_label(out, name);
    }
    push_branch_length(out, node);
}

fn push_internal_label(out: &mut String, node: &TreeNode) {
    if let Some(support) = node.support {
        out.push_str(&support.to_string());
    } else if let Some(name) = &node.name {
        push_label(out, name);
    }
}

fn push_branch_length(out: &mut String, node: &TreeNode) {
    if let Some(length) = node.branch_length {
        out.push(':');
        out.push_str(&length.to_string());
    }
}

/// Write a label, quoting it when it contains structural characters.
fn push_label(out: &mut String, label: &str) {
    let needs_quoting =
        label.is_empty() || label.bytes().any(|b| LABEL_DELIMITERS.contains(&b));
    if !needs_quoting {
        out.push_str(label);
        return;
    }
    out.push('\'');
    for c in label.chars() {
        if c == '\'' {
            out.push('\'');
        }
        out.push(c);
    }
    out.push('\'');
}

struct Scanner<'a> {
    text: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            bytes: text.as_bytes(),
            pos: 0,
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn consume_if(&mut self, byte: u8) -> bool {
        if self.peek() == Some(byte) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn current_char(&self) -> char {
        self.text[self.pos..].chars().next().unwrap_or('\u{0}')
    }

    /// Skip whitespace and square-bracket comments.
    fn skip_trivia(&mut self) -> NewickResult<()> {
        loop {
            match self.peek() {
                Some(b) if b.is_ascii_whitespace() => self.pos += 1,
                Some(b'[') => {
                    let start = self.pos;
                    while let Some(b) = self.peek() {
                        self.pos += 1;
                        if b == b']' {
                            break;
                        }
                    }
                    if self.bytes.get(self.pos - 1) != Some(&b']') {
                        return Err(NewickError::UnterminatedComment(start));
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    /// Parse one tree without recursing, so input nesting depth is bounded
    /// only by memory. `open` holds the child lists of unclosed subtrees.
    fn parse_tree(&mut self) -> NewickResult<TreeNode> {
        let mut open: Vec<Vec<TreeNode>> = Vec::new();

        'element: loop {
            self.skip_trivia()?;
            while self.peek() == Some(b'(') {
                self.pos += 1;
                open.push(Vec::new());
                self.skip_trivia()?;
            }
            let mut current = self.parse_leaf()?;

            loop {
                self.skip_trivia()?;
                match self.peek() {
                    Some(b',') => {
                        self.pos += 1;
                        match open.last_mut() {
                            Some(children) => children.push(current),
                            None => {
                                return Err(NewickError::UnexpectedChar {
                                    ch: ',',
                                    pos: self.pos - 1,
                                })
                            }
                        }
                        continue 'element;
                    }
                    Some(b')') => {
                        self.pos += 1;
                        let mut children = match open.pop() {
                            Some(children) => children,
                            None => {
                                return Err(NewickError::UnexpectedChar {
                                    ch: ')',
                                    pos: self.pos - 1,
                                })
                            }
                        };
                        children.push(current);
                        current = self.parse_internal(children)?;
                    }
                    Some(_) if open.is_empty() => return Ok(current),
                    Some(_) => {
                        return Err(NewickError::UnexpectedChar {
                            ch: self.current_char(),
                            pos: self.pos,
                        })
                    }
                    None if open.is_empty() => return Ok(current),
                    None => return Err(NewickError::UnexpectedEnd(self.pos)),
                }
            }
        }
    }

    fn parse_leaf(&mut self) -> NewickResult<TreeNode> {
        let label = self.parse_label()?;
        let branch_length = self.parse_branch_length()?;
        let mut node = TreeNode::default();
        if !label.is_empty() {
            node.name = Some(label);
        }
        node.branch_length = branch_length;
        Ok(node)
    }

    fn parse_internal(&mut self, children: Vec<TreeNode>) -> NewickResult<TreeNode> {
        self.skip_trivia()?;
        let label = self.parse_label()?;
        let branch_length = self.parse_branch_length()?;

        let mut node = TreeNode::internal(children);
        if !label.is_empty() {
            // Numeric internal labels are support values.
            match label.parse::<f64>() {
                Ok(support) => node.support = Some(support),
                Err(_) => node.name = Some(label),
            }
        }
        node.branch_length = branch_length;
        Ok(node)
    }

    /// An optionally quoted label. Returns an empty string when the next
    /// character cannot start a label.
    fn parse_label(&mut self) -> NewickResult<String> {
        if self.peek() == Some(b'\'') {
            return self.parse_quoted_label();
        }
        let start = self.pos;
        while let Some(b) = self.peek() {
            if LABEL_DELIMITERS.contains(&b) {
                break;
            }
            self.pos += 1;
        }
        Ok(self.text[start..self.pos].to_string())
    }

    /// A single-quoted label; a doubled quote escapes a literal quote.
    fn parse_quoted_label(&mut self) -> NewickResult<String> {
        let opened_at = self.pos;
        self.pos += 1;
        let mut label = String::new();
        let mut segment_start = self.pos;
        loop {
            match self.peek() {
                None => return Err(NewickError::UnterminatedQuote(opened_at)),
                Some(b'\'') => {
                    label.push_str(&self.text[segment_start..self.pos]);
                    self.pos += 1;
                    if self.peek() == Some(b'\'') {
                        label.push('\'');
                        self.pos += 1;
                        segment_start = self.pos;
                    } else {
                        return Ok(label);
                    }
                }
                Some(_) => self.pos += 1,
            }
        }
    }

    /// `:<float>` if present, allowing scientific notation.
    fn parse_branch_length(&mut self) -> NewickResult<Option<f64>> {
        self.skip_trivia()?;
        if !self.consume_if(b':') {
            return Ok(None);
        }
        self.skip_trivia()?;
        let start = self.pos;
        while let Some(b) = self.peek() {
            if b.is_ascii_digit() || matches!(b, b'.' | b'-' | b'+' | b'e' | b'E') {
                self.pos += 1;
            } else {
                break;
            }
        }
        let text = &self.text[start..self.pos];
        match text.parse::<f64>() {
            Ok(length) => Ok(Some(length)),
            Err(_) => Err(NewickError::InvalidBranchLength {
                text: text.to_string(),
                pos: start,
            }),
        }
    }
}
