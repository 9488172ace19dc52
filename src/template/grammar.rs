//! Template parser using chumsky
//!
//! Builds the segment tree once from template source. Conditionals hold only
//! flat fragments, so a nested `@IF` is rejected here rather than at expansion.

use chumsky::input::{Stream, ValueInput};
use chumsky::prelude::*;

use super::lexer::{lex, Token};
use super::{Fragment, Segment, TemplateError};

/// Parse template source into segments
pub fn parse(name: &str, source: &str) -> Result<Vec<Segment>, TemplateError> {
    let len = source.len();

    let token_iter = lex(source).map(|(tok, span)| (tok, span.into()));
    let token_stream = Stream::from_iter(token_iter).map((len..len).into(), |(t, s): (_, _)| (t, s));

    template_parser()
        .parse(token_stream)
        .into_result()
        .map_err(|errs| {
            errs.into_iter()
                .next()
                .map(|e| syntax_error(name, e.found(), e.span().into_range().start))
                .unwrap_or_else(|| syntax_error(name, None, len))
        })
}

fn syntax_error(name: &str, found: Option<&Token>, offset: usize) -> TemplateError {
    let message = match found {
        Some(Token::If(key)) => format!("nested @IF({}) is not supported", key),
        Some(Token::Else) => "@ELSE outside of @IF".to_string(),
        Some(Token::End) => "@END outside of @IF".to_string(),
        Some(other) => format!("unexpected {:?}", other),
        None => "unterminated @IF".to_string(),
    };
    TemplateError::Syntax {
        template: name.to_string(),
        offset,
        message,
    }
}

fn template_parser<'a, I>() -> impl Parser<'a, I, Vec<Segment>, extra::Err<Rich<'a, Token>>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = SimpleSpan>,
{
    let fragment = select! {
        Token::Text(s) => Fragment::Literal(s),
        Token::Symbol(s) => Fragment::Literal(s),
        Token::Space(s) => Fragment::Literal(s),
        Token::Placeholder(key) => Fragment::Placeholder(key),
    };

    let branch = fragment.clone().repeated().collect::<Vec<_>>();

    let conditional = select! { Token::If(key) => key }
        .then(branch.clone())
        .then(just(Token::Else).ignore_then(branch).or_not())
        .then_ignore(just(Token::End))
        .map(|((key, then_branch), else_branch)| Segment::Conditional {
            key,
            then_branch,
            else_branch: else_branch.unwrap_or_default(),
        });

    choice((conditional, fragment.map(Segment::Plain)))
        .repeated()
        .collect::<Vec<_>>()
        .then_ignore(end())
}
