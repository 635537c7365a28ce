use crate::lexer::{Lexer, Span, Token, TokenKind};
use crate::{Catalog, Context, Entry, EntryStatus, LocaleTag, Location, ParseError};

/// Decodes a Linguist `.ts` document. The whole document must be valid; a
/// single structural error rejects the catalog.
pub fn parse(bytes: &[u8]) -> Result<Catalog, ParseError> {
    if bytes.starts_with(&[0xFF, 0xFE]) || bytes.starts_with(&[0xFE, 0xFF]) {
        return Err(ParseError::encoding(
            "UTF-16 catalogs are not supported",
            1,
            1,
        ));
    }
    let bytes = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(bytes);
    let input = std::str::from_utf8(bytes).map_err(|err| {
        let (line, column) = position_of(bytes, err.valid_up_to());
        ParseError::encoding("invalid UTF-8 sequence", line, column)
    })?;
    parse_str(input)
}

pub fn parse_str(input: &str) -> Result<Catalog, ParseError> {
    let tokens = Lexer::new(input).lex_all()?;
    let mut parser = Parser::new(tokens);
    parser.parse_document()
}

fn position_of(bytes: &[u8], offset: usize) -> (u32, u32) {
    let mut line = 1u32;
    let mut column = 1u32;
    for byte in &bytes[..offset] {
        if *byte == b'\n' {
            line += 1;
            column = 1;
        } else if byte & 0xC0 != 0x80 {
            column += 1;
        }
    }
    (line, column)
}

struct Parser {
    tokens: std::vec::IntoIter<Token>,
    last_span: Span,
}

#[derive(Default)]
struct MessageParts {
    source: Option<String>,
    comment: Option<String>,
    extra_comment: Option<String>,
    locations: Vec<Location>,
    status: Option<EntryStatus>,
    forms: Vec<String>,
    numerus: bool,
    span: Option<Span>,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens: tokens.into_iter(),
            last_span: Span {
                line: 1,
                column: 1,
            },
        }
    }

    fn parse_document(&mut self) -> Result<Catalog, ParseError> {
        let root = self.next_significant()?.ok_or_else(|| {
            ParseError::malformed("document has no root element", 1, 1)
        })?;
        let self_closing = match &root.kind {
            TokenKind::StartTag {
                name, self_closing, ..
            } if name == "TS" => *self_closing,
            _ => return Err(self.unexpected(&root, "expected <TS> root element")),
        };

        let language = locale_attribute(&root, "language")?;
        let source_language = locale_attribute(&root, "sourcelanguage")?;
        let mut catalog = Catalog::new(language, source_language);

        if !self_closing {
            loop {
                let token = self.expect_significant("TS")?;
                match &token.kind {
                    TokenKind::StartTag { name, .. } if name == "context" => {
                        let context = self.parse_context(&token)?;
                        catalog.push_context(context);
                    }
                    TokenKind::StartTag { .. } => self.skip_element(&token)?,
                    TokenKind::EndTag { name } if name == "TS" => break,
                    _ => return Err(self.unexpected(&token, "unexpected content in <TS>")),
                }
            }
        }

        if let Some(token) = self.next_significant()? {
            return Err(self.unexpected(&token, "content after </TS>"));
        }
        Ok(catalog)
    }

    fn parse_context(&mut self, start: &Token) -> Result<Context, ParseError> {
        if is_self_closing(start) {
            return Err(at(start.span, "<context> without <name>"));
        }
        let mut name = None;
        let mut messages = Vec::new();
        loop {
            let token = self.expect_significant("context")?;
            match &token.kind {
                TokenKind::StartTag { name: tag, .. } => match tag.as_str() {
                    "name" => name = Some(self.read_text_element(&token)?),
                    "message" => messages.push(self.parse_message(&token)?),
                    _ => self.skip_element(&token)?,
                },
                TokenKind::EndTag { name: tag } if tag == "context" => break,
                _ => return Err(self.unexpected(&token, "unexpected content in <context>")),
            }
        }

        let name = name.ok_or_else(|| at(start.span, "<context> without <name>"))?;
        let mut entries = Vec::with_capacity(messages.len());
        for parts in messages {
            entries.push(build_entry(&name, parts)?);
        }
        Ok(Context { name, entries })
    }

    fn parse_message(&mut self, start: &Token) -> Result<MessageParts, ParseError> {
        let mut parts = MessageParts {
            numerus: start.attribute("numerus") == Some("yes"),
            span: Some(start.span),
            ..MessageParts::default()
        };
        if is_self_closing(start) {
            return Ok(parts);
        }
        loop {
            let token = self.expect_significant("message")?;
            match &token.kind {
                TokenKind::StartTag { name, .. } => match name.as_str() {
                    "source" => parts.source = Some(self.read_text_element(&token)?),
                    "comment" => parts.comment = Some(self.read_text_element(&token)?),
                    "extracomment" => {
                        parts.extra_comment = Some(self.read_text_element(&token)?)
                    }
                    "location" => {
                        parts.locations.push(Location {
                            filename: token.attribute("filename").map(str::to_string),
                            line: token.attribute("line").map(str::to_string),
                        });
                        self.skip_element(&token)?;
                    }
                    "translation" => self.parse_translation(&token, &mut parts)?,
                    _ => self.skip_element(&token)?,
                },
                TokenKind::EndTag { name } if name == "message" => break,
                _ => return Err(self.unexpected(&token, "unexpected content in <message>")),
            }
        }
        Ok(parts)
    }

    fn parse_translation(
        &mut self,
        start: &Token,
        parts: &mut MessageParts,
    ) -> Result<(), ParseError> {
        let type_attr = start.attribute("type");
        let status = EntryStatus::from_type_attr(type_attr).ok_or_else(|| {
            at(
                start.span,
                format!("unknown translation type `{}`", type_attr.unwrap_or_default()),
            )
        })?;
        parts.status = Some(status);
        if is_self_closing(start) {
            return Ok(());
        }

        let mut text = String::new();
        let mut forms = Vec::new();
        let mut seen_variant = false;
        loop {
            let token = self.next_token("translation")?;
            match &token.kind {
                TokenKind::Text(value) => text.push_str(value),
                TokenKind::StartTag { name, .. } => match name.as_str() {
                    "numerusform" => forms.push(self.read_text_element(&token)?),
                    "byte" => text.push(self.read_byte(&token)?),
                    "lengthvariant" => {
                        let variant = self.read_text_element(&token)?;
                        if !seen_variant {
                            text.push_str(&variant);
                            seen_variant = true;
                        }
                    }
                    _ => {
                        return Err(self.unexpected(&token, "unexpected element in <translation>"));
                    }
                },
                TokenKind::EndTag { name } if name == "translation" => break,
                TokenKind::EndTag { .. } => {
                    return Err(self.unexpected(&token, "mismatched closing tag in <translation>"));
                }
            }
        }

        if forms.is_empty() {
            // Whitespace between numerusforms is layout, but a plain
            // translation keeps its text verbatim.
            parts.forms = vec![text];
        } else {
            parts.forms = forms;
            parts.numerus = true;
        }
        Ok(())
    }

    /// Collects the character data of a leaf element such as `<source>`.
    /// `<byte>` escapes decode in place; of several `<lengthvariant>`s only
    /// the first is kept.
    fn read_text_element(&mut self, start: &Token) -> Result<String, ParseError> {
        let element = tag_name(start);
        let mut text = String::new();
        if is_self_closing(start) {
            return Ok(text);
        }
        let mut seen_variant = false;
        loop {
            let token = self.next_token(&element)?;
            match &token.kind {
                TokenKind::Text(value) => text.push_str(value),
                TokenKind::StartTag { name, .. } if name == "byte" => {
                    text.push(self.read_byte(&token)?);
                }
                TokenKind::StartTag { name, .. } if name == "lengthvariant" => {
                    let variant = self.read_text_element(&token)?;
                    if !seen_variant {
                        text.push_str(&variant);
                        seen_variant = true;
                    }
                }
                TokenKind::EndTag { name } if *name == element => return Ok(text),
                _ => {
                    return Err(self.unexpected(
                        &token,
                        &format!("unexpected markup inside <{element}>"),
                    ));
                }
            }
        }
    }

    fn read_byte(&mut self, start: &Token) -> Result<char, ParseError> {
        let raw = start
            .attribute("value")
            .ok_or_else(|| at(start.span, "<byte> without value"))?;
        let code = match raw.strip_prefix('x').or_else(|| raw.strip_prefix('X')) {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => raw.parse::<u32>().ok(),
        };
        let ch = code
            .and_then(char::from_u32)
            .ok_or_else(|| at(start.span, format!("invalid <byte> value `{raw}`")))?;
        if !is_self_closing(start) {
            let token = self.next_token("byte")?;
            if !matches!(&token.kind, TokenKind::EndTag { name } if name == "byte") {
                return Err(self.unexpected(&token, "<byte> must be empty"));
            }
        }
        Ok(ch)
    }

    fn skip_element(&mut self, start: &Token) -> Result<(), ParseError> {
        if is_self_closing(start) {
            return Ok(());
        }
        let element = tag_name(start);
        let mut open = vec![element.clone()];
        while let Some(expected) = open.last().cloned() {
            let token = self.next_token(&element)?;
            match &token.kind {
                TokenKind::StartTag {
                    name,
                    self_closing: false,
                    ..
                } => open.push(name.clone()),
                TokenKind::EndTag { name } if *name == expected => {
                    open.pop();
                }
                TokenKind::EndTag { .. } => {
                    return Err(self.unexpected(
                        &token,
                        &format!("mismatched closing tag, expected </{expected}>"),
                    ));
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn next_token(&mut self, element: &str) -> Result<Token, ParseError> {
        let token = self.tokens.next().ok_or_else(|| {
            at(
                self.last_span,
                format!("unexpected end of document inside <{element}>"),
            )
        })?;
        self.last_span = token.span;
        Ok(token)
    }

    fn expect_significant(&mut self, element: &str) -> Result<Token, ParseError> {
        self.next_significant()?.ok_or_else(|| {
            at(
                self.last_span,
                format!("unexpected end of document inside <{element}>"),
            )
        })
    }

    /// Next token that is not whitespace-only text. Other text between
    /// structural elements is an error.
    fn next_significant(&mut self) -> Result<Option<Token>, ParseError> {
        for token in self.tokens.by_ref() {
            self.last_span = token.span;
            match &token.kind {
                TokenKind::Text(value) if value.trim().is_empty() => continue,
                TokenKind::Text(_) => {
                    return Err(at(token.span, "unexpected text between elements"));
                }
                _ => return Ok(Some(token)),
            }
        }
        Ok(None)
    }

    fn unexpected(&self, token: &Token, message: &str) -> ParseError {
        let found = match &token.kind {
            TokenKind::StartTag { name, .. } => format!("<{name}>"),
            TokenKind::EndTag { name } => format!("</{name}>"),
            TokenKind::Text(_) => "text".to_string(),
        };
        at(token.span, format!("{message}, found {found}"))
    }
}

fn build_entry(context: &str, parts: MessageParts) -> Result<Entry, ParseError> {
    let span = parts.span.unwrap_or(Span {
        line: 1,
        column: 1,
    });
    let source = parts
        .source
        .ok_or_else(|| at(span, "<message> without <source>"))?;

    let mut entry = Entry::new(context, source)
        .with_disambiguation(parts.comment.unwrap_or_default())
        .with_status(parts.status.unwrap_or(EntryStatus::Unfinished));
    if parts.numerus {
        entry = entry.with_plural_forms(parts.forms);
    } else if let Some(text) = parts.forms.into_iter().next() {
        entry = entry.with_translation(text);
    }
    if let Some(note) = parts.extra_comment {
        entry = entry.with_extra_comment(note);
    }
    for location in parts.locations {
        entry = entry.with_location(location);
    }
    Ok(entry.normalize_status())
}

fn locale_attribute(token: &Token, name: &str) -> Result<Option<LocaleTag>, ParseError> {
    match token.attribute(name) {
        None => Ok(None),
        Some(value) if value.trim().is_empty() => Ok(None),
        Some(value) => LocaleTag::parse(value)
            .map(Some)
            .map_err(|_| at(token.span, format!("invalid {name} attribute `{value}`"))),
    }
}

fn tag_name(token: &Token) -> String {
    match &token.kind {
        TokenKind::StartTag { name, .. } | TokenKind::EndTag { name } => name.clone(),
        TokenKind::Text(_) => String::new(),
    }
}

fn is_self_closing(token: &Token) -> bool {
    matches!(
        token.kind,
        TokenKind::StartTag {
            self_closing: true,
            ..
        }
    )
}

fn at(span: Span, message: impl Into<String>) -> ParseError {
    ParseError::malformed(message, span.line, span.column)
}

#[cfg(test)]
mod tests {
    use super::{parse, parse_str};
    use crate::{CatalogIndex, EntryStatus, LocaleTag, ParseErrorKind};

    const RU_SAMPLE: &str = r#"<?xml version="1.0" ?><!DOCTYPE TS><TS language="ru_RU" sourcelanguage="en" version="2.1">
<context>
    <name>Account</name>
    <message>
        <location filename="../src/account.cpp" line="270"/>
        <source>Ready</source>
        <translation>Готов</translation>
    </message>
    <message>
        <location filename="../src/account.cpp" line="281"/>
        <source>Trying...</source>
        <extracomment>Account state</extracomment>
        <translation type="unfinished"/>
    </message>
</context>
<context>
    <name>TlsMethodModel</name>
    <message>
        <source>Default</source>
        <comment>Default TLS protocol version</comment>
        <translation>Умолчание</translation>
    </message>
    <message>
        <source>TLS is disabled, the negotiation won&apos;t be encrypted</source>
        <translation type="vanished">TLS отключен</translation>
    </message>
</context>
</TS>
"#;

    #[test]
    fn parses_header_and_contexts() {
        let catalog = parse(RU_SAMPLE.as_bytes()).expect("parse");
        assert_eq!(catalog.language().map(|tag| tag.normalized()), Some("ru_RU"));
        assert_eq!(
            catalog.source_language().map(|tag| tag.normalized()),
            Some("en")
        );
        assert_eq!(catalog.contexts().len(), 2);
        assert_eq!(catalog.contexts()[0].name, "Account");
        assert_eq!(catalog.contexts()[0].entries.len(), 2);
    }

    #[test]
    fn parses_message_fields() {
        let catalog = parse(RU_SAMPLE.as_bytes()).expect("parse");
        let ready = &catalog.contexts()[0].entries[0];
        assert_eq!(ready.context(), "Account");
        assert_eq!(ready.source(), "Ready");
        assert_eq!(ready.translations(), ["Готов"]);
        assert_eq!(ready.status(), EntryStatus::Finished);
        assert_eq!(ready.locations()[0].line.as_deref(), Some("270"));

        let trying = &catalog.contexts()[0].entries[1];
        assert_eq!(trying.status(), EntryStatus::Unfinished);
        assert_eq!(trying.translations(), [""]);
        assert_eq!(trying.extra_comment(), Some("Account state"));
        assert_eq!(trying.disambiguation(), None);

        let default = &catalog.contexts()[1].entries[0];
        assert_eq!(default.disambiguation(), Some("Default TLS protocol version"));

        let vanished = &catalog.contexts()[1].entries[1];
        assert_eq!(vanished.status(), EntryStatus::Vanished);
        assert_eq!(
            vanished.source(),
            "TLS is disabled, the negotiation won't be encrypted"
        );
    }

    #[test]
    fn parses_numerus_forms() {
        let input = r#"<TS language="ru_RU"><context><name>Call</name>
            <message numerus="yes">
                <source>%n call(s)</source>
                <translation>
                    <numerusform>%n звонок</numerusform>
                    <numerusform>%n звонка</numerusform>
                    <numerusform>%n звонков</numerusform>
                </translation>
            </message></context></TS>"#;
        let catalog = parse_str(input).expect("parse");
        let entry = &catalog.contexts()[0].entries[0];
        assert!(entry.is_numerus());
        assert_eq!(entry.translations(), ["%n звонок", "%n звонка", "%n звонков"]);
        assert_eq!(entry.status(), EntryStatus::Finished);
    }

    #[test]
    fn message_without_translation_is_unfinished() {
        let input = "<TS><context><name>A</name><message><source>Hi</source></message></context></TS>";
        let catalog = parse_str(input).expect("parse");
        let entry = &catalog.contexts()[0].entries[0];
        assert_eq!(entry.status(), EntryStatus::Unfinished);
        assert_eq!(entry.translations(), [""]);
    }

    #[test]
    fn empty_finished_translation_is_unfinished() {
        let input = "<TS><context><name>A</name><message><source>Hi</source><translation></translation></message></context></TS>";
        let catalog = parse_str(input).expect("parse");
        assert_eq!(
            catalog.contexts()[0].entries[0].status(),
            EntryStatus::Unfinished
        );
    }

    #[test]
    fn decodes_byte_elements() {
        let input = r#"<TS><context><name>A</name><message><source>a<byte value="x1b"/>b</source><translation>c<byte value="9"/>d</translation></message></context></TS>"#;
        let catalog = parse_str(input).expect("parse");
        let entry = &catalog.contexts()[0].entries[0];
        assert_eq!(entry.source(), "a\u{1b}b");
        assert_eq!(entry.translations(), ["c\td"]);
    }

    #[test]
    fn keeps_first_length_variant() {
        let input = r#"<TS><context><name>A</name><message><source>Long</source><translation variants="yes"><lengthvariant>Longer text</lengthvariant><lengthvariant>Short</lengthvariant></translation></message></context></TS>"#;
        let catalog = parse_str(input).expect("parse");
        assert_eq!(catalog.contexts()[0].entries[0].translations(), ["Longer text"]);
    }

    #[test]
    fn skips_unknown_elements() {
        let input = r#"<TS><defaultcodec>UTF-8</defaultcodec><context><name>A</name><message><source>Hi</source><oldsource>Hello</oldsource><userdata><x/></userdata><translation>Salut</translation></message></context></TS>"#;
        let catalog = parse_str(input).expect("parse");
        assert_eq!(catalog.contexts()[0].entries[0].translations(), ["Salut"]);
    }

    #[test]
    fn rejects_context_without_name() {
        let input = "<TS><context><message><source>Hi</source></message></context></TS>";
        let err = parse_str(input).expect_err("missing name");
        assert_eq!(err.kind, ParseErrorKind::MalformedStructure);
        assert!(err.message.contains("<name>"));
    }

    #[test]
    fn rejects_message_without_source() {
        let input = "<TS><context><name>A</name><message><translation>x</translation></message></context></TS>";
        let err = parse_str(input).expect_err("missing source");
        assert_eq!(err.kind, ParseErrorKind::MalformedStructure);
        assert!(err.message.contains("<source>"));
    }

    #[test]
    fn rejects_mismatched_tags() {
        let input = "<TS><context><name>A</name></message></TS>";
        let err = parse_str(input).expect_err("mismatched");
        assert_eq!(err.kind, ParseErrorKind::MalformedStructure);
    }

    #[test]
    fn rejects_truncated_document() {
        let input = "<TS><context><name>A</name><message><source>Hi</source>";
        let err = parse_str(input).expect_err("truncated");
        assert_eq!(err.kind, ParseErrorKind::MalformedStructure);
    }

    #[test]
    fn rejects_wrong_root() {
        let err = parse_str("<xliff/>").expect_err("wrong root");
        assert_eq!(err.kind, ParseErrorKind::MalformedStructure);
    }

    #[test]
    fn rejects_unknown_translation_type() {
        let input = r#"<TS><context><name>A</name><message><source>Hi</source><translation type="draft">x</translation></message></context></TS>"#;
        let err = parse_str(input).expect_err("unknown type");
        assert_eq!(err.kind, ParseErrorKind::MalformedStructure);
    }

    #[test]
    fn rejects_invalid_utf8_with_position() {
        let mut bytes = b"<TS>\n<context>".to_vec();
        bytes.extend_from_slice(&[0xC3, 0x28]);
        let err = parse(&bytes).expect_err("invalid utf-8");
        assert_eq!(err.kind, ParseErrorKind::EncodingError);
        assert_eq!(err.line, 2);
    }

    #[test]
    fn rejects_utf16_bom() {
        let err = parse(&[0xFF, 0xFE, b'<', 0]).expect_err("utf-16");
        assert_eq!(err.kind, ParseErrorKind::EncodingError);
    }

    #[test]
    fn accepts_utf8_bom() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice(b"<TS language=\"fa_IR\"/>");
        let catalog = parse(&bytes).expect("parse");
        assert!(catalog.contexts().is_empty());
    }

    #[test]
    fn parses_shipped_russian_catalog() {
        let catalog = parse(include_bytes!("../fixtures/lrc_ru_RU.ts")).expect("parse");
        let stats = catalog.stats();
        assert_eq!(stats.finished, 174);
        assert_eq!(stats.unfinished, 73);
        assert_eq!(stats.vanished, 0);

        let locale = LocaleTag::parse("ru_RU").expect("tag");
        let index = CatalogIndex::build(locale, catalog);
        assert_eq!(index.len(), 247);
        let ready = index.lookup("Account", "Ready", None).expect("entry");
        assert_eq!(ready.translations(), ["Готов"]);
    }

    #[test]
    fn parses_shipped_persian_catalog() {
        let catalog = parse(include_bytes!("../fixtures/lrc_fa_IR.ts")).expect("parse");
        assert_eq!(catalog.language().map(|tag| tag.normalized()), Some("fa_IR"));
        let stats = catalog.stats();
        assert_eq!(stats.finished, 32);
        assert_eq!(stats.unfinished, 215);

        let locale = LocaleTag::parse("fa_IR").expect("tag");
        let index = CatalogIndex::build(locale, catalog);
        assert_eq!(index.len(), 247);
        let ready = index.lookup("Account", "Ready", None).expect("entry");
        assert_eq!(ready.status(), EntryStatus::Finished);
        assert_eq!(ready.translations(), ["آماده"]);
        assert_eq!(ready.extra_comment(), Some("Account state"));
    }
}
