//! Template interpreter for static lesson files.
//!
//! Static template files are plain text with two kinds of markers:
//!
//! ```text
//! <%= title %>                               variable substitution
//!
//! <% if lang es %>Volver arriba              language branches
//! <% elif lang fr %>Haut de la page
//! <% else %>Back to top<% endif %>
//!
//! <% if variant standard %>…<% endif %>      template-variant set
//! <% if feature glossary %>…<% endif %>      feature flag (or `framework`)
//! ```
//!
//! Each block is replaced with exactly one branch (or nothing), with the
//! markers and the unselected branches dropped and the kept branch trimmed.
//! Blocks may nest. A condition may list several values
//! (`<% if lang es fr %>`, `<% if variant legacy standard %>`).
//!
//! ## Leniency
//!
//! Rendering never fails. Anything the interpreter does not understand is
//! left in the output as-is and reported as a [`TemplateIssue`]:
//!
//! - unknown variables (`<%= titel %>` stays in the text),
//! - unknown condition kinds, variants or feature names,
//! - `elif`/`else`/`endif` without an open block, and `if` without `endif`
//!   (the whole block is left as dead text, markers included).

use crate::config::{Feature, LessonConfig, TemplateVariant};
use crate::variables::{Variable, Variables};
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

static TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<%(=)?(.*?)%>").expect("tag pattern must compile"));

/// Something in a template the interpreter left untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateIssue {
    UnknownVariable(String),
    UnknownCondition(String),
    UnknownDirective(String),
    UnmatchedMarker(String),
}

impl fmt::Display for TemplateIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateIssue::UnknownVariable(name) => write!(f, "unknown variable `{name}`"),
            TemplateIssue::UnknownCondition(tag) => write!(f, "unknown condition in `{tag}`"),
            TemplateIssue::UnknownDirective(tag) => write!(f, "unknown directive `{tag}`"),
            TemplateIssue::UnmatchedMarker(tag) => write!(f, "unmatched marker `{tag}`"),
        }
    }
}

/// A branch selector.
#[derive(Debug, Clone, PartialEq)]
enum Condition {
    /// Lowercase primary language codes.
    Language(Vec<String>),
    Variant(Vec<TemplateVariant>),
    Feature(Feature),
}

impl Condition {
    fn parse(kind: &str, args: &[&str]) -> Option<Self> {
        if args.is_empty() {
            return None;
        }
        match kind {
            "lang" => Some(Condition::Language(
                args.iter().map(|a| a.to_ascii_lowercase()).collect(),
            )),
            "variant" => args
                .iter()
                .map(|a| TemplateVariant::parse(a))
                .collect::<Option<Vec<_>>>()
                .map(Condition::Variant),
            "feature" if args.len() == 1 => Feature::parse(args[0]).map(Condition::Feature),
            _ => None,
        }
    }

    fn holds(&self, config: &LessonConfig, variables: &Variables) -> bool {
        match self {
            Condition::Language(codes) => codes.iter().any(|c| c == variables.language().code()),
            Condition::Variant(set) => set.contains(&config.variant),
            Condition::Feature(feature) => feature.enabled_in(config),
        }
    }
}

#[derive(Debug)]
enum Token<'a> {
    Text(&'a str),
    Var(Variable),
    If(Condition, &'a str),
    Elif(Condition, &'a str),
    Else(&'a str),
    EndIf(&'a str),
}

#[derive(Debug, Clone, PartialEq)]
enum Node<'a> {
    Text(&'a str),
    Var(Variable),
    Block(Vec<Branch<'a>>),
}

#[derive(Debug, Clone, PartialEq)]
struct Branch<'a> {
    /// `None` for the `else` branch.
    condition: Option<Condition>,
    nodes: Vec<Node<'a>>,
}

/// An open `if` block while building the tree.
struct Frame<'a> {
    markers: Vec<&'a str>,
    branches: Vec<Branch<'a>>,
    seen_else: bool,
}

/// A parsed template, reusable across renders.
#[derive(Debug, Clone, PartialEq)]
pub struct Template<'a> {
    nodes: Vec<Node<'a>>,
    issues: Vec<TemplateIssue>,
}

/// Output of a render: the text plus everything that was left untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub text: String,
    pub issues: Vec<TemplateIssue>,
}

impl<'a> Template<'a> {
    pub fn parse(source: &'a str) -> Self {
        let mut issues = Vec::new();
        let tokens = tokenize(source, &mut issues);
        let nodes = build_tree(tokens, &mut issues);
        Self { nodes, issues }
    }

    /// Issues found while parsing.
    pub fn issues(&self) -> &[TemplateIssue] {
        &self.issues
    }

    pub fn render(&self, config: &LessonConfig, variables: &Variables) -> Rendered {
        let mut text = String::new();
        render_nodes(&self.nodes, config, variables, &mut text);
        Rendered {
            text,
            issues: self.issues.clone(),
        }
    }
}

/// Parse and render in one step.
pub fn render(source: &str, config: &LessonConfig, variables: &Variables) -> Rendered {
    Template::parse(source).render(config, variables)
}

fn tokenize<'a>(source: &'a str, issues: &mut Vec<TemplateIssue>) -> Vec<Token<'a>> {
    let mut tokens = Vec::new();
    let mut last = 0;

    for caps in TAG.captures_iter(source) {
        let Some(whole) = caps.get(0) else { continue };
        if whole.start() > last {
            tokens.push(Token::Text(&source[last..whole.start()]));
        }
        last = whole.end();

        let raw = whole.as_str();
        let body = caps.get(2).map_or("", |m| m.as_str()).trim();

        if caps.get(1).is_some() {
            match Variable::parse(body) {
                Some(variable) => tokens.push(Token::Var(variable)),
                None => {
                    issues.push(TemplateIssue::UnknownVariable(body.to_string()));
                    tokens.push(Token::Text(raw));
                }
            }
            continue;
        }

        let words: Vec<&str> = body
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|w| !w.is_empty())
            .collect();
        let token = match words.as_slice() {
            ["if", kind, args @ ..] | ["elif", kind, args @ ..] => {
                match Condition::parse(kind, args) {
                    Some(cond) if words[0] == "if" => Token::If(cond, raw),
                    Some(cond) => Token::Elif(cond, raw),
                    None => {
                        issues.push(TemplateIssue::UnknownCondition(raw.to_string()));
                        Token::Text(raw)
                    }
                }
            }
            ["else"] => Token::Else(raw),
            ["endif"] => Token::EndIf(raw),
            _ => {
                issues.push(TemplateIssue::UnknownDirective(raw.to_string()));
                Token::Text(raw)
            }
        };
        tokens.push(token);
    }

    if last < source.len() {
        tokens.push(Token::Text(&source[last..]));
    }
    tokens
}

fn build_tree<'a>(tokens: Vec<Token<'a>>, issues: &mut Vec<TemplateIssue>) -> Vec<Node<'a>> {
    let mut root: Vec<Node<'a>> = Vec::new();
    let mut stack: Vec<Frame<'a>> = Vec::new();

    fn current<'a, 'b>(root: &'b mut Vec<Node<'a>>, stack: &'b mut [Frame<'a>]) -> &'b mut Vec<Node<'a>> {
        match stack.last_mut().and_then(|f| f.branches.last_mut()) {
            Some(branch) => &mut branch.nodes,
            None => root,
        }
    }

    for token in tokens {
        match token {
            Token::Text(text) => current(&mut root, &mut stack).push(Node::Text(text)),
            Token::Var(variable) => current(&mut root, &mut stack).push(Node::Var(variable)),
            Token::If(condition, raw) => stack.push(Frame {
                markers: vec![raw],
                branches: vec![Branch {
                    condition: Some(condition),
                    nodes: Vec::new(),
                }],
                seen_else: false,
            }),
            Token::Elif(condition, raw) => match stack.last_mut().filter(|f| !f.seen_else) {
                Some(frame) => {
                    frame.markers.push(raw);
                    frame.branches.push(Branch {
                        condition: Some(condition),
                        nodes: Vec::new(),
                    });
                }
                None => {
                    issues.push(TemplateIssue::UnmatchedMarker(raw.to_string()));
                    current(&mut root, &mut stack).push(Node::Text(raw));
                }
            },
            Token::Else(raw) => match stack.last_mut().filter(|f| !f.seen_else) {
                Some(frame) => {
                    frame.markers.push(raw);
                    frame.branches.push(Branch {
                        condition: None,
                        nodes: Vec::new(),
                    });
                    frame.seen_else = true;
                }
                None => {
                    issues.push(TemplateIssue::UnmatchedMarker(raw.to_string()));
                    current(&mut root, &mut stack).push(Node::Text(raw));
                }
            },
            Token::EndIf(raw) => match stack.pop() {
                Some(frame) => {
                    current(&mut root, &mut stack).push(Node::Block(frame.branches));
                }
                None => {
                    issues.push(TemplateIssue::UnmatchedMarker(raw.to_string()));
                    current(&mut root, &mut stack).push(Node::Text(raw));
                }
            },
        }
    }

    // Unclosed blocks become dead text, markers and all.
    while let Some(frame) = stack.pop() {
        issues.push(TemplateIssue::UnmatchedMarker(frame.markers[0].to_string()));
        let target = current(&mut root, &mut stack);
        for (marker, branch) in frame.markers.into_iter().zip(frame.branches) {
            target.push(Node::Text(marker));
            target.extend(branch.nodes);
        }
    }

    root
}

fn render_nodes(nodes: &[Node<'_>], config: &LessonConfig, variables: &Variables, out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Var(variable) => out.push_str(&variables.text(*variable)),
            Node::Block(branches) => {
                let selected = branches.iter().find(|b| {
                    b.condition
                        .as_ref()
                        .is_none_or(|c| c.holds(config, variables))
                });
                if let Some(branch) = selected {
                    let mut inner = String::new();
                    render_nodes(&branch.nodes, config, variables, &mut inner);
                    out.push_str(inner.trim());
                }
            }
        }
    }
}
