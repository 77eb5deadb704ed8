use pest::error::{Error as PestError, LineColLocation};
use pest::iterators::Pair;
use pest::Parser as _;
use thiserror::Error;

use super::model::{ByteRange, MachineDecl, Model, Name, StateDecl, TransitionDecl};
use crate::inject::{Dependencies, InjectError, Injectable};

#[derive(pest_derive::Parser)]
#[grammar = "language/fsm.pest"]
struct FsmGrammar;

/// A syntax error. Line and column are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("syntax error at {line}:{column}: {message}")]
pub struct ParseError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl From<PestError<Rule>> for ParseError {
    fn from(error: PestError<Rule>) -> Self {
        let error = error.renamed_rules(describe_rule);
        let (line, column) = match error.line_col {
            LineColLocation::Pos(pos) => pos,
            LineColLocation::Span(start, _) => start,
        };
        Self {
            message: error.variant.message().into_owned(),
            line,
            column,
        }
    }
}

fn describe_rule(rule: &Rule) -> String {
    let description = match rule {
        Rule::EOI => "end of input",
        Rule::ident => "a name",
        Rule::string => "a quoted string",
        Rule::kw_machine => "`machine`",
        Rule::kw_state => "`state`",
        Rule::kw_transition => "`transition`",
        Rule::kw_from => "`from`",
        Rule::kw_to => "`to`",
        Rule::kw_initial => "`initial`",
        Rule::kw_when => "`when`",
        other => return format!("{other:?}"),
    };
    description.to_string()
}

/// Turns source text into a [`Model`].
pub trait Parser: Send + Sync {
    fn parse(&self, source: &str) -> Result<Model, ParseError>;
}

/// The pest-backed parser for the notation.
#[derive(Debug, Default)]
pub struct GrammarParser;

impl Parser for GrammarParser {
    fn parse(&self, source: &str) -> Result<Model, ParseError> {
        let mut pairs = FsmGrammar::parse(Rule::program, source)?;
        let mut model = Model::default();
        let Some(program) = pairs.next() else {
            return Ok(model);
        };

        for pair in program.into_inner() {
            match pair.as_rule() {
                Rule::machine_decl => model.machine = Some(machine_decl(pair)),
                Rule::state_decl => model.states.push(state_decl(pair)),
                Rule::transition_decl => model.transitions.push(transition_decl(pair)),
                _ => {}
            }
        }
        Ok(model)
    }
}

impl Injectable for GrammarParser {
    fn construct(_: &Dependencies) -> Result<Self, InjectError> {
        Ok(GrammarParser)
    }
}

crate::provides!(GrammarParser => dyn Parser);

fn range_of(pair: &Pair<'_, Rule>) -> ByteRange {
    let span = pair.as_span();
    ByteRange::new(span.start(), span.end())
}

fn name_of(pair: &Pair<'_, Rule>) -> Name {
    Name {
        text: pair.as_str().to_string(),
        range: range_of(pair),
    }
}

fn idents<'a>(pair: &Pair<'a, Rule>) -> impl Iterator<Item = Pair<'a, Rule>> {
    pair.clone()
        .into_inner()
        .filter(|inner| inner.as_rule() == Rule::ident)
}

fn machine_decl(pair: Pair<'_, Rule>) -> MachineDecl {
    let range = range_of(&pair);
    // The grammar guarantees exactly one name.
    let name = idents(&pair)
        .next()
        .map(|p| name_of(&p))
        .unwrap_or_else(|| Name {
            text: String::new(),
            range,
        });
    MachineDecl { name, range }
}

fn state_decl(pair: Pair<'_, Rule>) -> StateDecl {
    let range = range_of(&pair);
    let mut name = None;
    let mut initial = false;
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::ident => name = Some(name_of(&inner)),
            Rule::initial_flag => initial = true,
            _ => {}
        }
    }
    StateDecl {
        name: name.unwrap_or_else(|| Name {
            text: String::new(),
            range,
        }),
        initial,
        range,
    }
}

fn transition_decl(pair: Pair<'_, Rule>) -> TransitionDecl {
    let range = range_of(&pair);
    let mut names = idents(&pair).map(|p| name_of(&p));
    let mut next_name = || {
        names.next().unwrap_or_else(|| Name {
            text: String::new(),
            range,
        })
    };
    let name = next_name();
    let source = next_name();
    let target = next_name();

    let guard = pair
        .into_inner()
        .find(|inner| inner.as_rule() == Rule::guard)
        .and_then(|guard| {
            guard
                .into_inner()
                .find(|inner| inner.as_rule() == Rule::string)
        })
        .and_then(|string| string.into_inner().next())
        .map(|inner| inner.as_str().to_string());

    TransitionDecl {
        name,
        source,
        target,
        guard,
        range,
    }
}
