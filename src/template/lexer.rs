//! Lexer for glue-code templates using logos

use logos::Logos;

/// Byte range in template source
pub type Span = std::ops::Range<usize>;

#[derive(Logos, Debug, Clone, PartialEq)]
pub enum Token {
    // Directives (the condition key may carry a leading `$`)
    #[regex(r"@IF\(\$?[A-Za-z_][A-Za-z0-9_]*\)", |lex| {
        let s = lex.slice();
        s[4..s.len() - 1].trim_start_matches('$').to_string()
    })]
    If(String),
    #[token("@ELSE")]
    Else,
    #[token("@END")]
    End,

    // `$` followed by the whole identifier run; the run is matched against
    // table keys at expansion time
    #[regex(r"\$[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice()[1..].to_string())]
    Placeholder(String),

    // Runs spanning a line break collapse to a single space so expanded
    // templates stay on one line
    #[regex(r"[ \t\r\n]+", |lex| {
        let s = lex.slice();
        if s.contains(['\n', '\r']) {
            " ".to_string()
        } else {
            s.to_string()
        }
    })]
    Space(String),

    #[regex(r"[^$@ \t\r\n]+", |lex| lex.slice().to_string())]
    Text(String),

    // A lone `$` or `@` that starts no directive or placeholder
    #[regex(r"[$@]", |lex| lex.slice().to_string())]
    Symbol(String),
}

/// Lex template source into tokens with spans
pub fn lex(input: &str) -> impl Iterator<Item = (Token, Span)> + '_ {
    Token::lexer(input)
        .spanned()
        .filter_map(|(tok, span)| tok.ok().map(|t| (t, span)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &str) -> Vec<Token> {
        lex(input).map(|(t, _)| t).collect()
    }

    #[test]
    fn test_placeholder_takes_whole_identifier_run() {
        assert_eq!(
            tokens("_R_$CLASS_$CL_x"),
            vec![
                Token::Text("_R_".to_string()),
                Token::Placeholder("CLASS_".to_string()),
                Token::Placeholder("CL_x".to_string()),
            ]
        );
    }

    #[test]
    fn test_directives() {
        assert_eq!(
            tokens("@IF($RET_VOID)a@ELSE b@END"),
            vec![
                Token::If("RET_VOID".to_string()),
                Token::Text("a".to_string()),
                Token::Else,
                Token::Space(" ".to_string()),
                Token::Text("b".to_string()),
                Token::End,
            ]
        );
        assert_eq!(tokens("@IF(TPL)"), vec![Token::If("TPL".to_string())]);
    }

    #[test]
    fn test_line_breaks_collapse_into_one_space() {
        assert_eq!(
            tokens("a \n\t  b"),
            vec![
                Token::Text("a".to_string()),
                Token::Space(" ".to_string()),
                Token::Text("b".to_string()),
            ]
        );
    }

    #[test]
    fn test_inline_whitespace_kept_verbatim() {
        assert_eq!(
            tokens("a  b"),
            vec![
                Token::Text("a".to_string()),
                Token::Space("  ".to_string()),
                Token::Text("b".to_string()),
            ]
        );
    }

    #[test]
    fn test_lone_symbols_are_literal() {
        assert_eq!(
            tokens("x = $ 1 @ y"),
            vec![
                Token::Text("x".to_string()),
                Token::Space(" ".to_string()),
                Token::Text("=".to_string()),
                Token::Space(" ".to_string()),
                Token::Symbol("$".to_string()),
                Token::Space(" ".to_string()),
                Token::Text("1".to_string()),
                Token::Space(" ".to_string()),
                Token::Symbol("@".to_string()),
                Token::Space(" ".to_string()),
                Token::Text("y".to_string()),
            ]
        );
    }
}
