// src/rewrite/stylesheet.rs
// =============================================================================
// A lenient CSS rule scanner.
//
// We don't need a full CSS object model, only the places where a stylesheet
// points at another resource:
// - @import "x.css" / @import url(x.css)
// - url(...) tokens inside declarations, at any nesting depth of
//   @media / @supports / @layer / @container blocks
// - declaration blocks of @font-face and @page
//
// The scanner produces a small rule tree; uri_references() walks it.
// Unknown constructs are skipped rather than rejected. The hard errors are
// an unterminated comment or string, and blocks nested deeper than
// MAX_NESTING (the scanner recurses once per block).
// =============================================================================

/// A value token inside a declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// The unquoted contents of `url(...)`
    Uri(String),
    /// A quoted string, without its quotes
    Str(String),
    /// Anything else, kept verbatim
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub name: String,
    pub value: Vec<Token>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    Import { uri: String },
    /// A conditional group rule holding nested rules (@media and friends)
    Group { name: String, rules: Vec<Rule> },
    /// A style rule, or an at-rule with a declaration block (@font-face)
    Style { prelude: String, declarations: Vec<Declaration> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stylesheet {
    pub rules: Vec<Rule>,
}

// At-rules whose block contains rules rather than declarations
const GROUP_RULES: &[&str] = &["media", "supports", "document", "-moz-document", "layer", "container"];

// Deepest block nesting accepted; real stylesheets stay in single digits
const MAX_NESTING: usize = 64;

impl Stylesheet {
    // Every resource reference in document order, duplicates included
    pub fn uri_references(&self) -> Vec<String> {
        let mut uris = Vec::new();
        collect_uris(&self.rules, &mut uris);
        uris
    }
}

fn collect_uris(rules: &[Rule], out: &mut Vec<String>) {
    for rule in rules {
        match rule {
            Rule::Group { rules, .. } => collect_uris(rules, out),
            Rule::Import { uri } => out.push(uri.clone()),
            Rule::Style { declarations, .. } => {
                for declaration in declarations {
                    for token in &declaration.value {
                        if let Token::Uri(uri) = token {
                            out.push(uri.clone());
                        }
                    }
                }
            }
        }
    }
}

// Parses a stylesheet into rules
//
// Returns Err(reason) for unterminated comments or strings and for
// runaway block nesting.
pub fn parse_stylesheet(source: &str) -> Result<Stylesheet, String> {
    let mut scanner = Scanner::new(source);
    let rules = scanner.rules(false)?;
    Ok(Stylesheet { rules })
}

struct Scanner {
    chars: Vec<char>,
    pos: usize,
    depth: usize,
}

impl Scanner {
    fn new(source: &str) -> Self {
        Scanner {
            chars: source.chars().collect(),
            pos: 0,
            depth: 0,
        }
    }

    // Runs `parse` one block deeper, refusing to go past MAX_NESTING
    fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<T, String>,
    ) -> Result<T, String> {
        if self.depth >= MAX_NESTING {
            return Err("nesting too deep".to_string());
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn at_comment(&self) -> bool {
        self.peek() == Some('/') && self.peek_at(1) == Some('*')
    }

    fn skip_comment(&mut self) -> Result<(), String> {
        self.pos += 2;
        while self.pos < self.chars.len() {
            if self.peek() == Some('*') && self.peek_at(1) == Some('/') {
                self.pos += 2;
                return Ok(());
            }
            self.pos += 1;
        }
        Err("unterminated comment".to_string())
    }

    fn skip_whitespace_and_comments(&mut self) -> Result<(), String> {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => self.pos += 1,
                Some('/') if self.at_comment() => self.skip_comment()?,
                _ => return Ok(()),
            }
        }
    }

    // Reads a quoted string; the cursor is on the opening quote
    fn string(&mut self) -> Result<String, String> {
        let quote = self.chars[self.pos];
        self.pos += 1;
        let mut value = String::new();
        while let Some(c) = self.peek() {
            self.pos += 1;
            match c {
                '\\' => {
                    if let Some(escaped) = self.peek() {
                        value.push('\\');
                        value.push(escaped);
                        self.pos += 1;
                    }
                }
                '\n' => return Err("unterminated string".to_string()),
                c if c == quote => return Ok(value),
                c => value.push(c),
            }
        }
        Err("unterminated string".to_string())
    }

    fn at_url_function(&self) -> bool {
        let word: String = self.chars[self.pos..]
            .iter()
            .take(4)
            .collect::<String>()
            .to_ascii_lowercase();
        word == "url("
    }

    // Reads url(...); the cursor is on the 'u'
    fn url_function(&mut self) -> Result<String, String> {
        self.pos += 4;
        self.skip_whitespace_and_comments()?;
        let value = match self.peek() {
            Some('"') | Some('\'') => {
                let quoted = self.string()?;
                // skip anything up to the closing paren
                while let Some(c) = self.peek() {
                    self.pos += 1;
                    if c == ')' {
                        break;
                    }
                }
                quoted
            }
            _ => {
                let mut raw = String::new();
                while let Some(c) = self.peek() {
                    self.pos += 1;
                    if c == ')' {
                        break;
                    }
                    raw.push(c);
                }
                raw.trim().to_string()
            }
        };
        Ok(value)
    }

    fn identifier(&mut self) -> String {
        let mut name = String::new();
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                name.push(c);
                self.pos += 1;
            } else {
                break;
            }
        }
        name
    }

    // Tokenizes until one of `stops` at paren depth 0 (the stop char is not consumed)
    fn tokens_until(&mut self, stops: &[char]) -> Result<Vec<Token>, String> {
        let mut tokens = Vec::new();
        let mut text = String::new();
        let mut depth = 0usize;

        while let Some(c) = self.peek() {
            if depth == 0 && stops.contains(&c) {
                break;
            }
            match c {
                '/' if self.at_comment() => self.skip_comment()?,
                '"' | '\'' => {
                    flush_text(&mut text, &mut tokens);
                    let value = self.string()?;
                    tokens.push(Token::Str(value));
                }
                'u' | 'U' if self.at_url_function() && !ends_identifier(&text) => {
                    flush_text(&mut text, &mut tokens);
                    let value = self.url_function()?;
                    tokens.push(Token::Uri(value));
                }
                '(' => {
                    depth += 1;
                    text.push(c);
                    self.pos += 1;
                }
                ')' => {
                    depth = depth.saturating_sub(1);
                    text.push(c);
                    self.pos += 1;
                }
                _ => {
                    text.push(c);
                    self.pos += 1;
                }
            }
        }

        flush_text(&mut text, &mut tokens);
        Ok(tokens)
    }

    // Parses rules until EOF, or until the closing '}' when `nested`
    fn rules(&mut self, nested: bool) -> Result<Vec<Rule>, String> {
        let mut rules = Vec::new();

        loop {
            self.skip_whitespace_and_comments()?;
            match self.peek() {
                None => break,
                Some('}') => {
                    self.pos += 1;
                    if nested {
                        break;
                    }
                    // stray close brace at top level
                }
                Some(';') => self.pos += 1,
                Some('@') => {
                    self.pos += 1;
                    if let Some(rule) = self.at_rule()? {
                        rules.push(rule);
                    }
                }
                Some(_) => {
                    let prelude = self.tokens_until(&['{', ';', '}'])?;
                    match self.peek() {
                        Some('{') => {
                            self.pos += 1;
                            let declarations = self.nested(Self::declarations)?;
                            rules.push(Rule::Style {
                                prelude: tokens_text(&prelude).trim().to_string(),
                                declarations,
                            });
                        }
                        // a selector with no block is dropped, like a browser would
                        Some(';') => self.pos += 1,
                        _ => {}
                    }
                }
            }
        }

        Ok(rules)
    }

    // The cursor is just past '@'
    fn at_rule(&mut self) -> Result<Option<Rule>, String> {
        let name = self.identifier().to_ascii_lowercase();
        let prelude = self.tokens_until(&['{', ';', '}'])?;

        match self.peek() {
            Some('{') => {
                self.pos += 1;
                if GROUP_RULES.contains(&name.as_str()) {
                    let rules = self.nested(|scanner| scanner.rules(true))?;
                    Ok(Some(Rule::Group { name, rules }))
                } else {
                    let declarations = self.nested(Self::declarations)?;
                    Ok(Some(Rule::Style {
                        prelude: format!("@{} {}", name, tokens_text(&prelude).trim()),
                        declarations,
                    }))
                }
            }
            stop => {
                if stop == Some(';') {
                    self.pos += 1;
                }
                if name != "import" {
                    return Ok(None);
                }
                let uri = prelude.into_iter().find_map(|token| match token {
                    Token::Uri(uri) | Token::Str(uri) => Some(uri),
                    Token::Text(_) => None,
                });
                Ok(uri.map(|uri| Rule::Import { uri }))
            }
        }
    }

    // Parses `name: value;` pairs up to and including the closing '}'
    fn declarations(&mut self) -> Result<Vec<Declaration>, String> {
        let mut declarations = Vec::new();

        loop {
            self.skip_whitespace_and_comments()?;
            match self.peek() {
                None => break,
                Some('}') => {
                    self.pos += 1;
                    break;
                }
                Some(';') => self.pos += 1,
                Some('{') => {
                    // nested block (CSS nesting); keep its url() tokens
                    self.pos += 1;
                    declarations.extend(self.nested(Self::declarations)?);
                }
                Some(_) => {
                    let name = self.tokens_until(&[':', ';', '{', '}'])?;
                    let name = tokens_text(&name).trim().to_string();
                    // a nested selector's '{' is handled on the next turn;
                    // a bare name without a value is dropped
                    if self.peek() == Some(':') {
                        self.pos += 1;
                        let value = self.tokens_until(&[';', '}'])?;
                        declarations.push(Declaration { name, value });
                    }
                }
            }
        }

        Ok(declarations)
    }
}

fn flush_text(text: &mut String, tokens: &mut Vec<Token>) {
    if !text.is_empty() {
        tokens.push(Token::Text(std::mem::take(text)));
    }
}

// "background-url(" must not be read as url(
fn ends_identifier(text: &str) -> bool {
    text.chars()
        .last()
        .map(|c| c.is_alphanumeric() || c == '-' || c == '_')
        .unwrap_or(false)
}

fn tokens_text(tokens: &[Token]) -> String {
    tokens
        .iter()
        .map(|token| match token {
            Token::Text(t) => t.clone(),
            Token::Str(s) => format!("\"{}\"", s),
            Token::Uri(u) => format!("url({})", u),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declaration_urls() {
        let css = r#"
            body { background: #fff url("img/bg.png") no-repeat; color: red }
            .logo { background-image: url(/logo.svg) }
        "#;
        let sheet = parse_stylesheet(css).unwrap();
        assert_eq!(sheet.rules.len(), 2);
        assert_eq!(sheet.uri_references(), vec!["img/bg.png", "/logo.svg"]);
    }

    #[test]
    fn test_import_forms() {
        let css = r#"@import "reset.css"; @import url('theme.css') screen; a { color: blue }"#;
        let sheet = parse_stylesheet(css).unwrap();
        assert_eq!(sheet.uri_references(), vec!["reset.css", "theme.css"]);
        assert_eq!(
            sheet.rules[0],
            Rule::Import {
                uri: "reset.css".to_string()
            }
        );
    }

    #[test]
    fn test_nested_media_blocks() {
        let css = r#"
            @media screen {
                @media (min-width: 600px) {
                    .hero { background: url(hero-wide.jpg) }
                }
                .hero { background: url(hero.jpg) }
            }
            footer { background: url(footer.png) }
        "#;
        let sheet = parse_stylesheet(css).unwrap();
        assert_eq!(
            sheet.uri_references(),
            vec!["hero-wide.jpg", "hero.jpg", "footer.png"]
        );
        match &sheet.rules[0] {
            Rule::Group { name, rules } => {
                assert_eq!(name, "media");
                assert_eq!(rules.len(), 2);
            }
            other => panic!("expected media group, got {:?}", other),
        }
    }

    #[test]
    fn test_font_face_and_comments() {
        let css = r#"
            /* url(commented.png) should be ignored */
            @font-face { font-family: X; src: url(fonts/x.woff2) format("woff2"), url(fonts/x.woff); }
        "#;
        let sheet = parse_stylesheet(css).unwrap();
        assert_eq!(sheet.uri_references(), vec!["fonts/x.woff2", "fonts/x.woff"]);
    }

    #[test]
    fn test_strings_are_not_urls() {
        let css = r#"a::after { content: "url(nope.png)"; }"#;
        let sheet = parse_stylesheet(css).unwrap();
        assert!(sheet.uri_references().is_empty());
    }

    #[test]
    fn test_unterminated_comment_is_an_error() {
        assert!(parse_stylesheet("a { color: red } /* oops").is_err());
    }

    #[test]
    fn test_runaway_nesting_is_an_error() {
        let css = format!("a{}", "{".repeat(100_000));
        assert_eq!(parse_stylesheet(&css), Err("nesting too deep".to_string()));

        let css = format!("{}a {{ b: url(x.png) }}{}", "@media screen {".repeat(100_000), "}".repeat(100_000));
        assert!(parse_stylesheet(&css).is_err());
    }

    #[test]
    fn test_moderate_nesting_is_accepted() {
        let css = format!(
            "{}.x {{ background: url(deep.png) }}{}",
            "@media screen { ".repeat(10),
            "} ".repeat(10)
        );
        let sheet = parse_stylesheet(&css).unwrap();
        assert_eq!(sheet.uri_references(), vec!["deep.png"]);
    }
}
