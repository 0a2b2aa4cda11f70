//! Lexer for Tin source text.
//!
//! The lexer walks a cursor over the source, skipping whitespace and
//! probing a pattern table in declaration order; the first pattern whose
//! match begins at the cursor wins and its factory builds the token. The
//! builtin half of the table is fixed and shared; user definitions
//! (`|BODY|→|NAME|`) extend the session's `TokenTable` at lex time, so
//! NAME is recognised by the rest of this program and by any later
//! program compiled against the same table.
//!
//! Blocks `⟨…⟩` are compiled here too, by recursively lexing the
//! interior; the non-greedy pattern forbids nested angle brackets.

use crate::error::TinError;
use crate::token::{Intrinsic, MetaOp, Program, Token};
use crate::value::Value;
use lazy_static::lazy_static;
use regex::Regex;
use std::rc::Rc;
use tracing::debug;

/// Token factory selector for the builtin pattern table.
#[derive(Debug, Clone)]
enum Rule {
    Int,
    Str,
    Meta(MetaOp),
    BindVar,
    UnbindVar,
    FetchVar,
    Block,
    Define,
    Intrinsic(Intrinsic),
}

fn rule(pattern: &str, rule: Rule) -> (Regex, Rule) {
    (
        Regex::new(pattern).expect("builtin pattern compiles"),
        rule,
    )
}

lazy_static! {
    /// The builtin pattern table. Declaration order is normative: earlier
    /// patterns win ties.
    static ref BUILTIN_RULES: Vec<(Regex, Rule)> = vec![
        // Literals
        rule(r"\d+", Rule::Int),
        rule(r"'.+?'", Rule::Str),

        // Meta
        rule(r"!", Rule::Meta(MetaOp::Dup)),
        rule(r"↷", Rule::Meta(MetaOp::Copy)),
        rule(r"↶", Rule::Meta(MetaOp::Swap)),

        rule(r"\?", Rule::Meta(MetaOp::SkipFalse)),
        rule(r"◊", Rule::Meta(MetaOp::SkipFalsePeek)),
        rule(r":", Rule::Meta(MetaOp::SkipTrue)),
        rule(r"\[", Rule::Meta(MetaOp::BranchOpen)),
        rule(r"\]", Rule::Meta(MetaOp::BranchClose)),
        rule(r"\{", Rule::Meta(MetaOp::LoopOpen)),
        rule(r"\}", Rule::Meta(MetaOp::LoopClose)),
        rule(r"\(", Rule::Meta(MetaOp::StoreOpen)),
        rule(r"\)", Rule::Meta(MetaOp::StoreClose)),

        rule(r"→[a-z_]+", Rule::BindVar),
        rule(r"←[a-z_]+", Rule::UnbindVar),
        rule(r"\.[a-z_]+", Rule::FetchVar),

        rule(r"⟨[^⟨⟩]+⟩", Rule::Block),

        rule(r"\|.+\|→\|.+?\|", Rule::Define),

        rule(r"∇", Rule::Meta(MetaOp::SelfRef)),

        // Functions
        rule(r"\+", Rule::Intrinsic(Intrinsic::Add)),
        rule(r"-", Rule::Intrinsic(Intrinsic::Sub)),
        rule(r"·", Rule::Intrinsic(Intrinsic::Mul)),
        rule(r"/", Rule::Intrinsic(Intrinsic::Div)),
        rule(r"%", Rule::Intrinsic(Intrinsic::Rem)),

        rule(r"⊳", Rule::Intrinsic(Intrinsic::Inc)),
        rule(r"⊲", Rule::Intrinsic(Intrinsic::Dec)),

        rule(r"𝔹", Rule::Intrinsic(Intrinsic::ToBool)),

        rule(r"<", Rule::Intrinsic(Intrinsic::Lt)),
        rule(r">", Rule::Intrinsic(Intrinsic::Gt)),
        rule(r"∃", Rule::Intrinsic(Intrinsic::Any)),
        rule(r"∄", Rule::Intrinsic(Intrinsic::NoneOf)),
        rule(r"∀", Rule::Intrinsic(Intrinsic::All)),

        rule(r"\$", Rule::Intrinsic(Intrinsic::Print)),

        // Array operations
        rule(r"ι", Rule::Intrinsic(Intrinsic::Range)),
        rule(r"□", Rule::Intrinsic(Intrinsic::Wrap)),
        rule(r"R", Rule::Intrinsic(Intrinsic::Replicate)),
        rule(r"↓", Rule::Intrinsic(Intrinsic::Index)),
        rule(r"↑", Rule::Intrinsic(Intrinsic::Assign)),

        rule(r"∑", Rule::Intrinsic(Intrinsic::Sum)),
        rule(r"∏", Rule::Intrinsic(Intrinsic::Product)),

        rule(r"`", Rule::Intrinsic(Intrinsic::DropFirst)),
        rule(r"´", Rule::Intrinsic(Intrinsic::DropLast)),

        rule(r"⍴", Rule::Intrinsic(Intrinsic::Length)),
        rule(r"#", Rule::Intrinsic(Intrinsic::Count)),
    ];

    /// Splits a matched definition into BODY and NAME.
    static ref DEF_PARTS: Regex =
        Regex::new(r"^\|(.+)\|→\|(.+)\|$").expect("builtin pattern compiles");
}

/// User definitions installed by `|BODY|→|NAME|`, in insertion order.
/// Builtin patterns always win over definitions; among definitions the
/// earliest installed wins, and re-installing a name replaces its body.
#[derive(Debug, Clone, Default)]
pub struct TokenTable {
    defs: Vec<(Regex, Rc<Program>)>,
}

impl TokenTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register NAME (itself a regex) to run `body`.
    pub fn install(&mut self, pattern: &str, body: Rc<Program>) -> Result<(), TinError> {
        let re = Regex::new(pattern).map_err(|e| {
            TinError::Malformed(format!("definition name `{}` is not a valid pattern: {}", pattern, e))
        })?;
        debug!(name = pattern, "installed definition");
        if let Some(entry) = self.defs.iter_mut().find(|(r, _)| r.as_str() == pattern) {
            entry.1 = body;
        } else {
            self.defs.push((re, body));
        }
        Ok(())
    }

    /// Installed definition name patterns, oldest first.
    pub fn definitions(&self) -> impl Iterator<Item = &str> {
        self.defs.iter().map(|(re, _)| re.as_str())
    }
}

/// Compile source text into a program, extending `table` with any
/// definitions encountered on the way.
pub fn compile(source: &str, table: &mut TokenTable) -> Result<Program, TinError> {
    let mut tokens = Vec::new();
    let mut i = 0usize;

    while i < source.len() {
        let c = source[i..].chars().next().expect("cursor sits on a char boundary");
        if c.is_whitespace() {
            i += c.len_utf8();
            continue;
        }

        let mut step: Option<(usize, Token)> = None;
        for (re, r) in BUILTIN_RULES.iter() {
            if let Some(m) = re.find_at(source, i) {
                if m.start() == i {
                    step = Some((m.end(), build(r, m.as_str(), table)?));
                    break;
                }
            }
        }
        if step.is_none() {
            for (re, body) in table.defs.iter() {
                if let Some(m) = re.find_at(source, i) {
                    if m.start() == i {
                        let word = Token::Word {
                            name: re.as_str().to_string(),
                            body: Rc::clone(body),
                        };
                        step = Some((m.end(), word));
                        break;
                    }
                }
            }
        }

        match step {
            Some((end, token)) => {
                tokens.push(token);
                i = end;
            }
            None => {
                let snippet: String = source[i..].chars().take(12).collect();
                return Err(TinError::Lex(snippet));
            }
        }
    }

    debug!(tokens = tokens.len(), "compiled program");
    Ok(Program { tokens })
}

fn strip_sigil(rep: &str) -> String {
    rep.chars().skip(1).collect()
}

fn build(rule: &Rule, rep: &str, table: &mut TokenTable) -> Result<Token, TinError> {
    match rule {
        Rule::Int => rep
            .parse::<i64>()
            .map(|n| Token::Literal(Value::Int(n)))
            .map_err(|_| TinError::Lex(rep.to_string())),
        Rule::Str => Ok(Token::Literal(Value::Str(rep[1..rep.len() - 1].to_string()))),
        Rule::Meta(m) => Ok(Token::Meta(m.clone())),
        Rule::BindVar => Ok(Token::Meta(MetaOp::Bind(strip_sigil(rep)))),
        Rule::UnbindVar => Ok(Token::Meta(MetaOp::Unbind(strip_sigil(rep)))),
        Rule::FetchVar => Ok(Token::Meta(MetaOp::Fetch(strip_sigil(rep)))),
        Rule::Intrinsic(op) => Ok(Token::Intrinsic(*op)),
        Rule::Block => {
            let open = '⟨'.len_utf8();
            let close = '⟩'.len_utf8();
            let inner = &rep[open..rep.len() - close];
            Ok(Token::Block(Rc::new(compile(inner, table)?)))
        }
        Rule::Define => {
            let caps = DEF_PARTS
                .captures(rep)
                .ok_or_else(|| TinError::Malformed(format!("unparsable definition `{}`", rep)))?;
            let body_src = caps.get(1).expect("group 1 always captures").as_str();
            let name = caps.get(2).expect("group 2 always captures").as_str();
            let body = Rc::new(compile(body_src, table)?);
            table.install(name, Rc::clone(&body))?;
            Ok(Token::Definition {
                name: name.to_string(),
            })
        }
    }
}
