//! CSS selector subset: type, universal, `#id`, `.class`, `[attr]`, `[attr=value]`,
//! descendant and child combinators, and comma-separated selector lists.

use super::tree::Tree;
use super::NodeId;
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
struct AttrFilter {
    name: String,
    value: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    ids: Vec<String>,
    classes: Vec<String>,
    attrs: Vec<AttrFilter>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

/// One complex selector: `compounds[i]` and `compounds[i + 1]` are joined by `combinators[i]`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Complex {
    compounds: Vec<Compound>,
    combinators: Vec<Combinator>,
}

/// A parsed selector list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    source: String,
    alternatives: Vec<Complex>,
}

impl Selector {
    pub fn parse(input: &str) -> Result<Self> {
        let mut parser = Parser {
            chars: input.chars().collect(),
            pos: 0,
            source: input,
        };
        let alternatives = parser.selector_list()?;
        Ok(Selector {
            source: input.to_string(),
            alternatives,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub(crate) fn matches(&self, tree: &Tree, node: NodeId) -> bool {
        self.alternatives
            .iter()
            .any(|complex| match_at(tree, complex, node, complex.compounds.len() - 1))
    }
}

impl std::str::FromStr for Selector {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Selector::parse(s)
    }
}

fn match_at(tree: &Tree, complex: &Complex, node: NodeId, idx: usize) -> bool {
    if !compound_matches(tree, &complex.compounds[idx], node) {
        return false;
    }
    if idx == 0 {
        return true;
    }
    match complex.combinators[idx - 1] {
        Combinator::Child => tree
            .parent(node)
            .is_some_and(|p| match_at(tree, complex, p, idx - 1)),
        Combinator::Descendant => {
            let mut current = tree.parent(node);
            while let Some(ancestor) = current {
                if match_at(tree, complex, ancestor, idx - 1) {
                    return true;
                }
                current = tree.parent(ancestor);
            }
            false
        }
    }
}

fn compound_matches(tree: &Tree, compound: &Compound, node: NodeId) -> bool {
    let Some(element) = tree.get(node) else {
        return false;
    };
    if let Some(tag) = &compound.tag {
        if !element.tag.eq_ignore_ascii_case(tag) {
            return false;
        }
    }
    if !compound
        .ids
        .iter()
        .all(|id| element.attribute("id") == Some(id.as_str()))
    {
        return false;
    }
    if !compound.classes.iter().all(|c| element.has_class(c)) {
        return false;
    }
    compound.attrs.iter().all(|f| match (&f.value, element.attribute(&f.name)) {
        (_, None) => false,
        (None, Some(_)) => true,
        (Some(want), Some(have)) => want == have,
    })
}

struct Parser<'a> {
    chars: Vec<char>,
    pos: usize,
    source: &'a str,
}

impl Parser<'_> {
    fn error(&self, what: &str) -> Error {
        Error::InvalidSelector(format!("{} at offset {} in {:?}", what, self.pos, self.source))
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn skip_ws(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
        self.pos > start
    }

    fn selector_list(&mut self) -> Result<Vec<Complex>> {
        let mut list = Vec::new();
        loop {
            self.skip_ws();
            list.push(self.complex()?);
            self.skip_ws();
            match self.peek() {
                None => break,
                Some(',') => self.pos += 1,
                Some(_) => return Err(self.error("unexpected character")),
            }
        }
        Ok(list)
    }

    fn complex(&mut self) -> Result<Complex> {
        let mut compounds = vec![self.compound()?];
        let mut combinators = Vec::new();
        loop {
            let had_ws = self.skip_ws();
            let combinator = match self.peek() {
                Some('>') => {
                    self.pos += 1;
                    self.skip_ws();
                    Combinator::Child
                }
                None | Some(',') => break,
                Some(_) if had_ws => Combinator::Descendant,
                Some(_) => return Err(self.error("unexpected character")),
            };
            combinators.push(combinator);
            compounds.push(self.compound()?);
        }
        Ok(Complex {
            compounds,
            combinators,
        })
    }

    fn compound(&mut self) -> Result<Compound> {
        let mut compound = Compound::default();
        let mut any = false;
        match self.peek() {
            Some('*') => {
                self.pos += 1;
                any = true;
            }
            Some(c) if is_ident_char(c) => {
                compound.tag = Some(self.ident()?);
                any = true;
            }
            _ => {}
        }
        loop {
            match self.peek() {
                Some('#') => {
                    self.pos += 1;
                    compound.ids.push(self.ident()?);
                }
                Some('.') => {
                    self.pos += 1;
                    compound.classes.push(self.ident()?);
                }
                Some('[') => {
                    self.pos += 1;
                    compound.attrs.push(self.attribute()?);
                }
                _ => break,
            }
            any = true;
        }
        if !any {
            return Err(self.error("expected a simple selector"));
        }
        Ok(compound)
    }

    fn attribute(&mut self) -> Result<AttrFilter> {
        self.skip_ws();
        let name = self.ident()?;
        self.skip_ws();
        let value = match self.peek() {
            Some('=') => {
                self.pos += 1;
                self.skip_ws();
                let v = match self.peek() {
                    Some(q @ ('"' | '\'')) => self.quoted(q)?,
                    _ => self.ident()?,
                };
                self.skip_ws();
                Some(v)
            }
            _ => None,
        };
        if self.peek() != Some(']') {
            return Err(self.error("expected ']'"));
        }
        self.pos += 1;
        Ok(AttrFilter { name, value })
    }

    fn quoted(&mut self, quote: char) -> Result<String> {
        self.pos += 1;
        let mut out = String::new();
        loop {
            match self.peek() {
                None => return Err(self.error("unterminated string")),
                Some(c) if c == quote => {
                    self.pos += 1;
                    return Ok(out);
                }
                Some(c) => {
                    out.push(c);
                    self.pos += 1;
                }
            }
        }
    }

    fn ident(&mut self) -> Result<String> {
        let start = self.pos;
        while self.peek().is_some_and(is_ident_char) {
            self.pos += 1;
        }
        if self.pos == start {
            return Err(self.error("expected an identifier"));
        }
        Ok(self.chars[start..self.pos].iter().collect())
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_' || !c.is_ascii()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_compound_and_combinators() {
        let s = Selector::parse("div.ux-item-action > button#dl[type=button]").unwrap();
        assert_eq!(s.alternatives.len(), 1);
        let complex = &s.alternatives[0];
        assert_eq!(complex.compounds.len(), 2);
        assert_eq!(complex.combinators, vec![Combinator::Child]);
        assert_eq!(complex.compounds[0].tag.as_deref(), Some("div"));
        assert_eq!(complex.compounds[0].classes, vec!["ux-item-action"]);
        assert_eq!(complex.compounds[1].ids, vec!["dl"]);
        assert_eq!(
            complex.compounds[1].attrs,
            vec![AttrFilter {
                name: "type".into(),
                value: Some("button".into())
            }]
        );
    }

    #[test]
    fn parse_selector_list_and_descendant() {
        let s = Selector::parse(" .a .b , [data-x='1 2'] ").unwrap();
        assert_eq!(s.alternatives.len(), 2);
        assert_eq!(s.alternatives[0].combinators, vec![Combinator::Descendant]);
        assert_eq!(
            s.alternatives[1].compounds[0].attrs[0].value.as_deref(),
            Some("1 2")
        );
    }

    #[test]
    fn parse_rejects_garbage() {
        for bad in ["", ".", "div >", "a,,b", "[x", "a:hover", "[x='y]"] {
            assert!(
                matches!(Selector::parse(bad), Err(Error::InvalidSelector(_))),
                "{bad:?} should be rejected"
            );
        }
    }
}
