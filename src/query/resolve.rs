//! Navigation resolver
//!
//! Turns a base selector (attribute suffix already removed) into one of two
//! traversal dialects:
//!
//! - **Operator chain**: `a.test<.product_pod>h3+p`, where every operator is a
//!   traversal step (`<` closest ancestor, `>` first descendant, `+` next
//!   sibling then first descendant). A selector without `<` is a one-step chain
//!   and is handed to the document untouched, CSS combinators included.
//! - **Compact parent chain**: `.hasan<div<div>h1`, where the tokens between the
//!   first and last `<` are bare tag names that only count parent hops.

use crate::error::{Result, ScrapeError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A traversal step between two selections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    /// `<`: nearest ancestor-or-self matching the next selection
    Ancestor,
    /// `>`: first descendant matching the next selection
    Descendant,
    /// `+`: next sibling element, then its first descendant matching the next selection
    Sibling,
}

impl Operator {
    /// Map an operator character to its variant
    pub fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            '<' => Some(Self::Ancestor),
            '>' => Some(Self::Descendant),
            '+' => Some(Self::Sibling),
            _ => None,
        }
    }

    /// The character this operator is written as
    pub fn symbol(self) -> char {
        match self {
            Self::Ancestor => '<',
            Self::Descendant => '>',
            Self::Sibling => '+',
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// An ordered chain of selections joined by operators
///
/// Always holds at least one selection and exactly one operator fewer than
/// selections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawQueryPlan")]
pub struct QueryPlan {
    selections: Vec<String>,
    operators: Vec<Operator>,
}

/// Unchecked serialized form of a [`QueryPlan`]
#[derive(Deserialize)]
struct RawQueryPlan {
    selections: Vec<String>,
    operators: Vec<Operator>,
}

impl TryFrom<RawQueryPlan> for QueryPlan {
    type Error = String;

    fn try_from(raw: RawQueryPlan) -> std::result::Result<Self, Self::Error> {
        if raw.selections.is_empty() {
            return Err("a query plan needs at least one selection".to_string());
        }
        if raw.operators.len() + 1 != raw.selections.len() {
            return Err(format!(
                "{} selection(s) need {} operator(s), got {}",
                raw.selections.len(),
                raw.selections.len() - 1,
                raw.operators.len()
            ));
        }
        Ok(Self { selections: raw.selections, operators: raw.operators })
    }
}

impl QueryPlan {
    /// A plan consisting of a single selection and no steps
    pub fn single(selector: impl Into<String>) -> Self {
        Self { selections: vec![selector.into()], operators: Vec::new() }
    }

    /// Tokenize a full operator chain such as `a.test<.product_pod<section>div.alert>strong`.
    ///
    /// Whitespace and the operator characters split tokens, except inside
    /// `[...]`, `(...)` and quoted strings. Selections and operators must
    /// alternate, starting and ending with a selection.
    pub fn parse_chain(notation: &str) -> Result<Self> {
        let mut selections = Vec::new();
        let mut operators = Vec::new();
        let mut expect_selection = true;

        for token in tokenize(notation)? {
            match token {
                Token::Selection(selection) if expect_selection => {
                    selections.push(selection);
                    expect_selection = false;
                }
                Token::Operator(op) if !expect_selection => {
                    operators.push(op);
                    expect_selection = true;
                }
                Token::Selection(selection) => {
                    return Err(ScrapeError::notation(
                        notation,
                        format!("missing operator before '{}'", selection),
                    ));
                }
                Token::Operator(op) => {
                    return Err(ScrapeError::notation(notation, format!("operator '{}' has no left-hand selection", op)));
                }
            }
        }

        if selections.is_empty() {
            return Err(ScrapeError::notation(notation, "empty operator chain"));
        }
        if expect_selection {
            return Err(ScrapeError::notation(notation, "dangling operator at end of chain"));
        }

        debug_assert_eq!(operators.len() + 1, selections.len());
        Ok(Self { selections, operators })
    }

    /// All selections, in order
    pub fn selections(&self) -> &[String] {
        &self.selections
    }

    /// All operators, in order
    pub fn operators(&self) -> &[Operator] {
        &self.operators
    }

    /// The selection resolved before any step is taken
    pub fn first(&self) -> &str {
        &self.selections[0]
    }

    /// `(operator, selection)` pairs applied after the first selection
    pub fn steps(&self) -> impl Iterator<Item = (Operator, &str)> {
        self.operators.iter().copied().zip(self.selections[1..].iter().map(String::as_str))
    }
}

impl fmt::Display for QueryPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.first())?;
        for (op, selection) in self.steps() {
            write!(f, " {} {}", op, selection)?;
        }
        Ok(())
    }
}

/// Legacy `<`-joined chain: find `start`, climb `parent_hops` parents, then match `target` below
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompactChainPlan {
    pub start_selector: String,
    pub target_selector: String,
    pub parent_hops: usize,
}

impl CompactChainPlan {
    /// Split a compact chain on `<`.
    ///
    /// Every token between the first and the last one counts as a hop without
    /// being matched. A `>` inside the last token adds the parts before the
    /// final target as further hops.
    pub fn parse(notation: &str) -> Result<Self> {
        let parts: Vec<&str> = notation.split('<').map(str::trim).collect();
        if parts.len() < 2 {
            return Err(ScrapeError::notation(notation, "compact chain needs at least one '<'"));
        }
        if parts.iter().any(|part| part.is_empty()) {
            return Err(ScrapeError::notation(notation, "empty token in compact chain"));
        }

        let start_selector = parts[0].to_string();
        let mut parent_hops = parts.len() - 2;

        let last = parts[parts.len() - 1];
        let target_parts: Vec<&str> = last.split('>').map(str::trim).collect();
        if target_parts.iter().any(|part| part.is_empty()) {
            return Err(ScrapeError::notation(notation, "empty token after '>'"));
        }
        parent_hops += target_parts.len() - 1;
        let target_selector = target_parts[target_parts.len() - 1].to_string();

        Ok(Self { start_selector, target_selector, parent_hops })
    }
}

/// A resolved traversal in one of the two dialects
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Navigation {
    Chain(QueryPlan),
    Compact(CompactChainPlan),
}

impl Navigation {
    /// Classify a base selector and build its plan.
    ///
    /// The compact dialect is chosen only when there is at least one token
    /// between the first and last `<`, all such tokens are bare tag names, and
    /// no `>` or `+` appears before the last `<`. Anything else containing `<`
    /// is an operator chain.
    pub fn resolve(selector: &str) -> Result<Self> {
        let selector = selector.trim();
        if selector.is_empty() {
            return Err(ScrapeError::notation(selector, "empty selector"));
        }

        if !selector.contains('<') {
            return Ok(Self::Chain(QueryPlan::single(selector)));
        }

        if is_compact_chain(selector) {
            return CompactChainPlan::parse(selector).map(Self::Compact);
        }

        QueryPlan::parse_chain(selector).map(Self::Chain)
    }

    /// The selector matched before any traversal step
    pub fn start_selector(&self) -> &str {
        match self {
            Self::Chain(plan) => plan.first(),
            Self::Compact(plan) => &plan.start_selector,
        }
    }
}

fn is_compact_chain(selector: &str) -> bool {
    let parts: Vec<&str> = selector.split('<').map(str::trim).collect();
    if parts.len() < 3 {
        return false;
    }

    let head = &parts[..parts.len() - 1];
    if head.iter().any(|part| part.contains('>') || part.contains('+')) {
        return false;
    }

    parts[1..parts.len() - 1].iter().all(|part| is_bare_tag(part))
}

fn is_bare_tag(token: &str) -> bool {
    if token == "*" {
        return true;
    }
    let mut chars = token.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic()) && chars.all(|c| c.is_ascii_alphanumeric() || c == '-')
}

#[derive(Debug, PartialEq)]
enum Token {
    Selection(String),
    Operator(Operator),
}

fn tokenize(notation: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut brackets: usize = 0;
    let mut parens: usize = 0;
    let mut quote: Option<char> = None;

    let flush = |current: &mut String, tokens: &mut Vec<Token>| {
        if !current.is_empty() {
            tokens.push(Token::Selection(std::mem::take(current)));
        }
    };

    for ch in notation.chars() {
        if let Some(open) = quote {
            current.push(ch);
            if ch == open {
                quote = None;
            }
            continue;
        }

        match ch {
            '"' | '\'' => {
                quote = Some(ch);
                current.push(ch);
            }
            '[' => {
                brackets += 1;
                current.push(ch);
            }
            ']' => {
                brackets = brackets.saturating_sub(1);
                current.push(ch);
            }
            '(' => {
                parens += 1;
                current.push(ch);
            }
            ')' => {
                parens = parens.saturating_sub(1);
                current.push(ch);
            }
            _ if brackets > 0 || parens > 0 => current.push(ch),
            c if c.is_whitespace() => flush(&mut current, &mut tokens),
            c => match Operator::from_symbol(c) {
                Some(op) => {
                    flush(&mut current, &mut tokens);
                    tokens.push(Token::Operator(op));
                }
                None => current.push(c),
            },
        }
    }

    if quote.is_some() || brackets > 0 || parens > 0 {
        return Err(ScrapeError::notation(notation, "unterminated quote or bracket"));
    }
    flush(&mut current, &mut tokens);

    Ok(tokens)
}
