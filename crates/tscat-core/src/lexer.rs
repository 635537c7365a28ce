use crate::ParseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub line: u32,
    pub column: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    StartTag {
        name: String,
        attributes: Vec<Attribute>,
        self_closing: bool,
    },
    EndTag {
        name: String,
    },
    /// Character data with entities already expanded. CDATA sections arrive
    /// here verbatim.
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn attribute(&self, name: &str) -> Option<&str> {
        match &self.kind {
            TokenKind::StartTag { attributes, .. } => attributes
                .iter()
                .find(|attribute| attribute.name == name)
                .map(|attribute| attribute.value.as_str()),
            _ => None,
        }
    }
}

/// Splits a catalog document into tags and text. Declarations, doctypes and
/// comments are consumed without producing tokens.
pub struct Lexer<'a> {
    input: &'a str,
    bytes: &'a [u8],
    offset: usize,
    line: u32,
    column: u32,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            bytes: input.as_bytes(),
            offset: 0,
            line: 1,
            column: 1,
        }
    }

    pub fn lex_all(mut self) -> Result<Vec<Token>, ParseError> {
        let mut tokens = Vec::new();
        while self.offset < self.bytes.len() {
            if self.bytes[self.offset] == b'<' {
                self.lex_markup(&mut tokens)?;
            } else {
                self.lex_text(&mut tokens)?;
            }
        }
        Ok(tokens)
    }

    fn lex_text(&mut self, tokens: &mut Vec<Token>) -> Result<(), ParseError> {
        let span = self.span();
        let start = self.offset;
        while self.offset < self.bytes.len() && self.bytes[self.offset] != b'<' {
            self.advance_byte();
        }
        let raw = &self.input[start..self.offset];
        let value = unescape(raw, span)?;
        tokens.push(Token {
            kind: TokenKind::Text(value),
            span,
        });
        Ok(())
    }

    fn lex_markup(&mut self, tokens: &mut Vec<Token>) -> Result<(), ParseError> {
        let span = self.span();
        if self.starts_with("<?") {
            return self.lex_declaration(span);
        }
        if self.starts_with("<!--") {
            return self.skip_past("-->", span, "unterminated comment");
        }
        if self.starts_with("<![CDATA[") {
            self.advance_by("<![CDATA[".len());
            let start = self.offset;
            let end = self.find("]]>").ok_or_else(|| {
                ParseError::malformed("unterminated CDATA section", span.line, span.column)
            })?;
            let value = self.input[start..end].to_string();
            self.advance_to(end + "]]>".len());
            tokens.push(Token {
                kind: TokenKind::Text(value),
                span,
            });
            return Ok(());
        }
        if self.starts_with("<!") {
            return self.skip_doctype(span);
        }
        if self.starts_with("</") {
            self.advance_by(2);
            let name = self.lex_name()?;
            self.skip_whitespace();
            self.expect_byte(b'>', "expected '>' after closing tag name")?;
            tokens.push(Token {
                kind: TokenKind::EndTag { name },
                span,
            });
            return Ok(());
        }

        self.advance_byte();
        let name = self.lex_name()?;
        let attributes = self.lex_attributes()?;
        let self_closing = if self.current() == Some(b'/') {
            self.advance_byte();
            true
        } else {
            false
        };
        self.expect_byte(b'>', "expected '>' to close tag")?;
        tokens.push(Token {
            kind: TokenKind::StartTag {
                name,
                attributes,
                self_closing,
            },
            span,
        });
        Ok(())
    }

    fn lex_declaration(&mut self, span: Span) -> Result<(), ParseError> {
        self.advance_by(2);
        let target = self.lex_name()?;
        if target.eq_ignore_ascii_case("xml") {
            let attributes = self.lex_attributes()?;
            if let Some(encoding) = attributes
                .iter()
                .find(|attribute| attribute.name == "encoding")
            {
                let label = encoding.value.to_ascii_lowercase();
                if label != "utf-8" && label != "utf8" {
                    return Err(ParseError::encoding(
                        format!("unsupported declared encoding `{}`", encoding.value),
                        span.line,
                        span.column,
                    ));
                }
            }
        }
        self.skip_past("?>", span, "unterminated declaration")
    }

    fn skip_doctype(&mut self, span: Span) -> Result<(), ParseError> {
        let mut depth = 0usize;
        while let Some(byte) = self.current() {
            self.advance_byte();
            match byte {
                b'[' => depth += 1,
                b']' => depth = depth.saturating_sub(1),
                b'>' if depth == 0 => return Ok(()),
                _ => {}
            }
        }
        Err(ParseError::malformed(
            "unterminated doctype",
            span.line,
            span.column,
        ))
    }

    fn lex_attributes(&mut self) -> Result<Vec<Attribute>, ParseError> {
        let mut attributes = Vec::new();
        loop {
            self.skip_whitespace();
            match self.current() {
                None => {
                    let span = self.span();
                    return Err(ParseError::malformed(
                        "unexpected end of document inside tag",
                        span.line,
                        span.column,
                    ));
                }
                Some(b'>') | Some(b'/') | Some(b'?') => return Ok(attributes),
                Some(_) => {}
            }
            let name = self.lex_name()?;
            self.skip_whitespace();
            self.expect_byte(b'=', "expected '=' after attribute name")?;
            self.skip_whitespace();
            let span = self.span();
            let quote = match self.current() {
                Some(quote @ (b'"' | b'\'')) => quote,
                _ => {
                    return Err(ParseError::malformed(
                        "attribute value must be quoted",
                        span.line,
                        span.column,
                    ));
                }
            };
            self.advance_byte();
            let start = self.offset;
            while self.current().is_some_and(|byte| byte != quote) {
                self.advance_byte();
            }
            if self.current().is_none() {
                return Err(ParseError::malformed(
                    "unterminated attribute value",
                    span.line,
                    span.column,
                ));
            }
            let value = unescape(&self.input[start..self.offset], span)?;
            self.advance_byte();
            attributes.push(Attribute { name, value });
        }
    }

    fn lex_name(&mut self) -> Result<String, ParseError> {
        let span = self.span();
        let start = self.offset;
        while self.current().is_some_and(is_name_byte) {
            self.advance_byte();
        }
        if self.offset == start {
            return Err(ParseError::malformed(
                "expected a name",
                span.line,
                span.column,
            ));
        }
        Ok(self.input[start..self.offset].to_string())
    }

    fn skip_past(
        &mut self,
        terminator: &str,
        span: Span,
        message: &str,
    ) -> Result<(), ParseError> {
        let end = self
            .find(terminator)
            .ok_or_else(|| ParseError::malformed(message, span.line, span.column))?;
        self.advance_to(end + terminator.len());
        Ok(())
    }

    fn skip_whitespace(&mut self) {
        while self
            .current()
            .is_some_and(|byte| matches!(byte, b' ' | b'\t' | b'\r' | b'\n'))
        {
            self.advance_byte();
        }
    }

    fn expect_byte(&mut self, expected: u8, message: &str) -> Result<(), ParseError> {
        if self.current() == Some(expected) {
            self.advance_byte();
            Ok(())
        } else {
            let span = self.span();
            Err(ParseError::malformed(message, span.line, span.column))
        }
    }

    fn find(&self, needle: &str) -> Option<usize> {
        self.input[self.offset..]
            .find(needle)
            .map(|relative| self.offset + relative)
    }

    fn starts_with(&self, prefix: &str) -> bool {
        self.input[self.offset..].starts_with(prefix)
    }

    fn current(&self) -> Option<u8> {
        self.bytes.get(self.offset).copied()
    }

    fn advance_by(&mut self, count: usize) {
        for _ in 0..count {
            self.advance_byte();
        }
    }

    fn advance_to(&mut self, offset: usize) {
        while self.offset < offset && self.offset < self.bytes.len() {
            self.advance_byte();
        }
    }

    fn advance_byte(&mut self) {
        let byte = self.bytes[self.offset];
        self.offset += 1;
        if byte == b'\n' {
            self.line += 1;
            self.column = 1;
        } else if byte & 0xC0 != 0x80 {
            self.column += 1;
        }
    }

    fn span(&self) -> Span {
        Span {
            line: self.line,
            column: self.column,
        }
    }
}

fn is_name_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'_' | b'-' | b'.' | b':') || byte >= 0x80
}

/// Expands character and entity references once. The output is never
/// rescanned, so `&amp;lt;` becomes `&lt;`.
pub fn unescape(raw: &str, span: Span) -> Result<String, ParseError> {
    if !raw.contains('&') {
        return Ok(raw.to_string());
    }
    let mut output = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        output.push_str(&rest[..amp]);
        let after = &rest[amp + 1..];
        let semi = after.find(';').ok_or_else(|| {
            ParseError::malformed("unterminated entity reference", span.line, span.column)
        })?;
        let entity = &after[..semi];
        output.push(decode_entity(entity, span)?);
        rest = &after[semi + 1..];
    }
    output.push_str(rest);
    Ok(output)
}

fn decode_entity(entity: &str, span: Span) -> Result<char, ParseError> {
    match entity {
        "amp" => return Ok('&'),
        "lt" => return Ok('<'),
        "gt" => return Ok('>'),
        "quot" => return Ok('"'),
        "apos" => return Ok('\''),
        _ => {}
    }
    let code = if let Some(hex) = entity
        .strip_prefix("#x")
        .or_else(|| entity.strip_prefix("#X"))
    {
        u32::from_str_radix(hex, 16).ok()
    } else if let Some(decimal) = entity.strip_prefix('#') {
        decimal.parse::<u32>().ok()
    } else {
        return Err(ParseError::malformed(
            format!("unknown entity `&{entity};`"),
            span.line,
            span.column,
        ));
    };
    code.and_then(char::from_u32).ok_or_else(|| {
        ParseError::malformed(
            format!("invalid character reference `&{entity};`"),
            span.line,
            span.column,
        )
    })
}
