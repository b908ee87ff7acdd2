use super::{
    game_object::{GameObjectMap, GameString, SaveFileValue},
    tokens::{tokenize, Token, TokenKind},
};

/// A named section of the save file, cut out of the raw text by the
/// section reader. `body` covers the `{...}` block, braces included.
/// It is the largest unit of data handed to the tree parser; parsing a
/// section never touches the rest of the document.
pub struct Section<'a> {
    name: String,
    body: &'a str,
}

impl<'a> Section<'a> {
    pub fn new(name: String, body: &'a str) -> Self {
        Section { name, body }
    }

    pub fn get_name(&self) -> &str {
        &self.name
    }

    /// Parse the section body into an object tree. Best effort: this
    /// never fails, malformed stretches are skipped over.
    pub fn parse(&self) -> GameObjectMap {
        let tokens = tokenize(self.body);
        let mut parser = Parser::new(&tokens);
        if parser.peek(TokenKind::LBrace) {
            parser.parse_object()
        } else {
            // not a block at all, salvage what we can
            parser.parse_root()
        }
    }
}

/// Parse a whole snippet of save text into its top level object.
/// Like [Section::parse] this is best effort and never fails.
pub fn parse_root(text: &str) -> GameObjectMap {
    let tokens = tokenize(text);
    Parser::new(&tokens).parse_root()
}

/// Signal that a value could not be parsed at the current token.
/// Purely local: the object loops catch it, discard the attempt and
/// resume scanning, so no malformed stretch ever aborts a parse.
struct ValueError;

/// The recursive descent state over a token stream.
///
/// The grammar is loose and real saves drift from it, so every decision
/// is made from the current and next token and anything unexpected is
/// skipped. Termination is guaranteed: every loop either consumes a
/// token or advances the cursor by one.
struct Parser<'a, 'b> {
    tokens: &'b [Token<'a>],
    p: usize,
}

impl<'a, 'b> Parser<'a, 'b> {
    fn new(tokens: &'b [Token<'a>]) -> Self {
        Parser { tokens, p: 0 }
    }

    fn current(&self) -> &Token<'a> {
        // the EndOfInput terminator makes this index always valid
        &self.tokens[self.p.min(self.tokens.len() - 1)]
    }

    fn peek(&self, kind: TokenKind) -> bool {
        self.current().kind == kind
    }

    fn peek_next(&self, kind: TokenKind) -> bool {
        match self.tokens.get(self.p + 1) {
            Some(t) => t.kind == kind,
            None => false,
        }
    }

    fn advance(&mut self) -> &Token<'a> {
        let t = &self.tokens[self.p.min(self.tokens.len() - 1)];
        self.p += 1;
        t
    }

    /// Parse assignments until the end of input. The top level of a
    /// document is an object without braces.
    fn parse_root(&mut self) -> GameObjectMap {
        let mut root = GameObjectMap::new();
        while !self.peek(TokenKind::EndOfInput) {
            if self.try_assignment(&mut root) {
                continue;
            }
            // defensive skip
            self.p += 1;
        }
        root
    }

    /// Parse one `{...}` block. The opening brace is the current token.
    /// Terminates on the matching `}` (consumed) or on end of input, in
    /// which case the partial object is returned as is.
    fn parse_object(&mut self) -> GameObjectMap {
        self.advance(); // {
        let mut obj = GameObjectMap::new();
        while !self.peek(TokenKind::RBrace) && !self.peek(TokenKind::EndOfInput) {
            if self.try_assignment(&mut obj) {
                continue;
            }
            // a bare value directly inside a block goes to the
            // anonymous items list
            if matches!(
                self.current().kind,
                TokenKind::LBrace | TokenKind::String | TokenKind::Number | TokenKind::Ident
            ) {
                match self.parse_value() {
                    Ok(val) => obj.push_anonymous(val),
                    Err(ValueError) => {
                        self.p += 1;
                    }
                }
                continue;
            }
            // defensive skip
            self.p += 1;
        }
        if self.peek(TokenKind::RBrace) {
            self.advance();
        }
        obj
    }

    /// If the cursor sits on `key=`, consume the assignment and fold it
    /// into `obj`. Keys may be identifiers or numbers. Returns whether
    /// an attempt was made; a failed value parse still counts as an
    /// attempt (the partial assignment is discarded).
    fn try_assignment(&mut self, obj: &mut GameObjectMap) -> bool {
        let keyed = matches!(self.current().kind, TokenKind::Ident | TokenKind::Number)
            && self.peek_next(TokenKind::Equals);
        if !keyed {
            return false;
        }
        let key = self.advance().text.clone().into_owned();
        self.advance(); // =
        if let Ok(val) = self.parse_value() {
            obj.insert(key, val);
        }
        true
    }

    /// Parse a single value at the cursor. Any token that cannot begin
    /// a value is a local failure handed back to the recovery paths.
    fn parse_value(&mut self) -> Result<SaveFileValue, ValueError> {
        // a key-like token followed by `=` is the next assignment's
        // key, not a value; the dangling assignment before it is
        // discarded and scanning resumes at that key
        if matches!(self.current().kind, TokenKind::Ident | TokenKind::Number)
            && self.peek_next(TokenKind::Equals)
        {
            return Err(ValueError);
        }
        match self.current().kind {
            TokenKind::LBrace => Ok(SaveFileValue::Object(self.parse_object())),
            TokenKind::String => {
                let text = self.advance().text.clone().into_owned();
                Ok(SaveFileValue::String(GameString::new(text)))
            }
            TokenKind::Number => {
                let token = self.advance();
                match token.text.parse::<f64>() {
                    Ok(num) => Ok(SaveFileValue::Real(num)),
                    Err(_) => Err(ValueError),
                }
            }
            TokenKind::Ident => {
                let text = self.advance().text.as_ref();
                if text.eq_ignore_ascii_case("yes") {
                    Ok(SaveFileValue::Boolean(true))
                } else if text.eq_ignore_ascii_case("no") {
                    Ok(SaveFileValue::Boolean(false))
                } else {
                    Ok(SaveFileValue::String(GameString::new(text.to_owned())))
                }
            }
            _ => Err(ValueError),
        }
    }
}
