use serde::{Deserialize, Deserializer, Serialize};

use super::catalog::is_placeholder;

/// A package's declared license: one id, or a set the consumer may choose from.
///
/// `MIT OR Apache-2.0` becomes `Alternatives(["MIT", "Apache-2.0"])`.
/// An `AND` conjunction stays one alternative; the catalog reduces it to its
/// most restrictive member.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum LicenseExpr {
    Single(String),
    Alternatives(Vec<String>),
}

impl LicenseExpr {
    /// Parse a raw license string.
    ///
    /// Handles `OR` (and the `/` shorthand some ecosystems use), wrapping
    /// parentheses, and `WITH` exception clauses, which are dropped.
    /// Placeholders such as `N/A` stay whole.
    pub fn parse(raw: &str) -> Self {
        if is_placeholder(raw) {
            return LicenseExpr::Single(raw.trim().to_string());
        }

        let mut alternatives = Vec::new();
        for group in split_alternatives(&tokenize(&raw.replace('/', " OR "))) {
            let text = render(&group);
            if !text.is_empty() && !alternatives.contains(&text) {
                alternatives.push(text);
            }
        }

        match alternatives.len() {
            0 => LicenseExpr::Single(String::new()),
            1 => LicenseExpr::Single(alternatives.remove(0)),
            _ => LicenseExpr::Alternatives(alternatives),
        }
    }

    /// The alternatives to evaluate, in declaration order. Never empty.
    pub fn alternatives(&self) -> Vec<&str> {
        match self {
            LicenseExpr::Single(id) => vec![id.as_str()],
            LicenseExpr::Alternatives(ids) if ids.is_empty() => vec![""],
            LicenseExpr::Alternatives(ids) => ids.iter().map(String::as_str).collect(),
        }
    }

    pub fn is_choice(&self) -> bool {
        matches!(self, LicenseExpr::Alternatives(ids) if ids.len() > 1)
    }
}

impl Default for LicenseExpr {
    fn default() -> Self {
        LicenseExpr::Single(String::new())
    }
}

impl std::fmt::Display for LicenseExpr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LicenseExpr::Single(id) => write!(f, "{}", id),
            LicenseExpr::Alternatives(ids) => write!(f, "{}", ids.join(" OR ")),
        }
    }
}

impl From<&str> for LicenseExpr {
    fn from(raw: &str) -> Self {
        LicenseExpr::parse(raw)
    }
}

impl From<String> for LicenseExpr {
    fn from(raw: String) -> Self {
        LicenseExpr::parse(&raw)
    }
}

impl From<Vec<&str>> for LicenseExpr {
    fn from(ids: Vec<&str>) -> Self {
        LicenseExpr::from(ids.into_iter().map(str::to_string).collect::<Vec<_>>())
    }
}

impl From<Vec<String>> for LicenseExpr {
    fn from(ids: Vec<String>) -> Self {
        let mut alternatives: Vec<String> = Vec::new();
        for id in ids {
            for alt in LicenseExpr::parse(&id).alternatives() {
                if !alt.is_empty() && !alternatives.iter().any(|a| a == alt) {
                    alternatives.push(alt.to_string());
                }
            }
        }
        match alternatives.len() {
            0 => LicenseExpr::Single(String::new()),
            1 => LicenseExpr::Single(alternatives.remove(0)),
            _ => LicenseExpr::Alternatives(alternatives),
        }
    }
}

/// Accepts either a string expression or an explicit list of alternatives.
/// `null` is read as an undeclared license.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawLicense {
    Text(String),
    List(Vec<String>),
}

impl<'de> Deserialize<'de> for LicenseExpr {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Option::<RawLicense>::deserialize(deserializer)? {
            Some(RawLicense::Text(text)) => LicenseExpr::parse(&text),
            Some(RawLicense::List(ids)) => LicenseExpr::from(ids),
            None => LicenseExpr::default(),
        })
    }
}

// ---------------------------------------------------------------------------
// Tokenizer
// ---------------------------------------------------------------------------

#[derive(Debug, PartialEq, Clone)]
enum Token {
    Id(String),
    And,
    Or,
    With,
    LParen,
    RParen,
}

fn tokenize(expr: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut chars = expr.chars().peekable();
    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        if c == '(' {
            tokens.push(Token::LParen);
            chars.next();
        } else if c == ')' {
            tokens.push(Token::RParen);
            chars.next();
        } else {
            let mut s = String::new();
            while let Some(&c) = chars.peek() {
                if c.is_whitespace() || c == '(' || c == ')' {
                    break;
                }
                s.push(c);
                chars.next();
            }
            let token = match s.as_str() {
                "AND" | "and" => Token::And,
                "OR" | "or" => Token::Or,
                "WITH" | "with" => Token::With,
                _ => Token::Id(s),
            };
            tokens.push(token);
        }
    }
    tokens
}

/// Split a token stream on `OR` operators that sit outside parentheses.
///
/// A parenthesised group that is itself a pure disjunction, e.g. the
/// `(MIT OR Apache-2.0)` in `(MIT OR Apache-2.0) OR ISC`, is flattened.
fn split_alternatives(tokens: &[Token]) -> Vec<Vec<Token>> {
    let mut groups = Vec::new();
    let mut current = Vec::new();
    let mut depth = 0usize;

    for token in tokens {
        match token {
            Token::LParen => {
                depth += 1;
                current.push(token.clone());
            }
            Token::RParen => {
                depth = depth.saturating_sub(1);
                current.push(token.clone());
            }
            Token::Or if depth == 0 => groups.push(std::mem::take(&mut current)),
            _ => current.push(token.clone()),
        }
    }
    groups.push(current);

    groups
        .into_iter()
        .flat_map(|group| match strip_parens(&group) {
            Some(inner) if inner.iter().any(|t| *t == Token::Or) => split_alternatives(inner),
            _ => vec![group],
        })
        .collect()
}

/// Inner tokens when the whole group is wrapped in one matching pair of parens.
fn strip_parens(group: &[Token]) -> Option<&[Token]> {
    if group.len() < 2 || group[0] != Token::LParen || group[group.len() - 1] != Token::RParen {
        return None;
    }
    let mut depth = 0usize;
    for (i, token) in group.iter().enumerate() {
        match token {
            Token::LParen => depth += 1,
            Token::RParen => {
                depth -= 1;
                if depth == 0 && i != group.len() - 1 {
                    return None;
                }
            }
            _ => {}
        }
    }
    Some(&group[1..group.len() - 1])
}

/// Render one alternative back to text, dropping `WITH` exceptions and
/// redundant wrapping parentheses.
fn render(group: &[Token]) -> String {
    let mut group = group;
    while let Some(inner) = strip_parens(group) {
        group = inner;
    }

    let mut out = String::new();
    let mut skip_exception = false;
    for token in group {
        if skip_exception {
            skip_exception = false;
            continue;
        }
        let piece = match token {
            Token::Id(id) => id.as_str(),
            Token::And => "AND",
            Token::Or => "OR",
            Token::With => {
                skip_exception = true;
                continue;
            }
            Token::RParen => {
                out.push(')');
                continue;
            }
            Token::LParen => "(",
        };
        if !out.is_empty() && !out.ends_with('(') {
            out.push(' ');
        }
        out.push_str(piece);
    }
    out
}

/// Split one alternative on top-level `AND`, e.g.
/// `(MIT OR GPL-3.0) AND BSD-3-Clause` → `["MIT OR GPL-3.0", "BSD-3-Clause"]`.
pub fn conjuncts(alternative: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = Vec::new();
    let mut depth = 0usize;

    for token in tokenize(alternative) {
        match token {
            Token::LParen => {
                depth += 1;
                current.push(token);
            }
            Token::RParen => {
                depth = depth.saturating_sub(1);
                current.push(token);
            }
            Token::And if depth == 0 => parts.push(std::mem::take(&mut current)),
            _ => current.push(token),
        }
    }
    parts.push(current);

    parts
        .iter()
        .map(|p| render(p))
        .filter(|p| !p.is_empty())
        .collect()
}
