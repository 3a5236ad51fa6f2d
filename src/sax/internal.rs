#![allow(non_snake_case)]

use std::ops::Range;

use nom::{
    branch::alt,
    bytes::streaming::{is_not, tag, take_until, take_while, take_while1, take_while_m_n},
    character::{
        complete::multispace1 as complete_multispace1,
        is_alphabetic, is_digit, is_hex_digit,
        streaming::{char, multispace0, multispace1},
    },
    combinator::{map, opt, recognize, verify},
    error::{Error, ErrorKind, ParseError},
    multi::many0,
    sequence::{delimited, pair, preceded, tuple},
    Err, IResult, InputLength, Needed, Offset, Parser,
};

// https://tools.ietf.org/html/rfc3629
static UTF8_CHAR_WIDTH: [u8; 256] = [
    1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1,
    1, /* 0x1F */
    1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1,
    1, /* 0x3F */
    1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1,
    1, /* 0x5F */
    1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1,
    1, /* 0x7F */
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    0, /* 0x9F */
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    0, /* 0xBF */
    0, 0, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2,
    2, /* 0xDF */
    3, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3, /* 0xEF */
    4, 4, 4, 4, 4, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, /* 0xFF */
];

/// Given a first byte, determine how many bytes are in this UTF-8 character
#[inline]
fn utf8_char_width(b: u8) -> usize {
    UTF8_CHAR_WIDTH[b as usize] as usize
}

// [2] Char ::= #x9 | #xA | #xD | [#x20-#xD7FF] | [#xE000-#xFFFD] | [#x10000-#x10FFFF]
#[inline]
pub(crate) fn is_xml_char_t(chr: char) -> bool {
    chr == '\u{9}'
        || chr == '\u{A}'
        || chr == '\u{D}'
        || ('\u{20}'..='\u{D7FF}').contains(&chr)
        || ('\u{E000}'..='\u{FFFD}').contains(&chr)
        || ('\u{10000}'..='\u{10FFFF}').contains(&chr)
}

// [4] NameStartChar ::= ":" | [A-Z] | "_" | [a-z] | [#xC0-#xD6] | [#xD8-#xF6] |
// [#xF8-#x2FF] | [#x370-#x37D] | [#x37F-#x1FFF] | [#x200C-#x200D] | [#x2070-#x218F] |
// [#x2C00-#x2FEF] | [#x3001-#xD7FF] | [#xF900-#xFDCF] | [#xFDF0-#xFFFD] | [#x10000-#xEFFFF]
#[inline]
fn is_namestart_char_t(chr: char) -> bool {
    chr == ':' || is_nc_namestart_char_t(chr)
}

// [6] NCNameStartChar ::= NameStartChar - ':'
#[inline]
fn is_nc_namestart_char_t(chr: char) -> bool {
    chr.is_ascii_alphabetic()
        || chr == '_'
        || ('\u{C0}'..='\u{D6}').contains(&chr)
        || ('\u{D8}'..='\u{F6}').contains(&chr)
        || ('\u{F8}'..='\u{2FF}').contains(&chr)
        || ('\u{370}'..='\u{37D}').contains(&chr)
        || ('\u{37F}'..='\u{1FFF}').contains(&chr)
        || ('\u{200C}'..='\u{200D}').contains(&chr)
        || ('\u{2070}'..='\u{218F}').contains(&chr)
        || ('\u{2C00}'..='\u{2FEF}').contains(&chr)
        || ('\u{3001}'..='\u{D7FF}').contains(&chr)
        || ('\u{F900}'..='\u{FDCF}').contains(&chr)
        || ('\u{FDF0}'..='\u{FFFD}').contains(&chr)
        || ('\u{10000}'..='\u{EFFFF}').contains(&chr)
}

// [4a] NameChar ::= NameStartChar | "-" | "." | [0-9] | #xB7 | [#x0300-#x036F] | [#x203F-#x2040]
#[inline]
fn is_namechar_t(chr: char) -> bool {
    chr == ':' || is_nc_namechar_t(chr)
}

// [5] NCNameChar ::= NameChar - ':'
#[inline]
fn is_nc_namechar_t(chr: char) -> bool {
    is_nc_namestart_char_t(chr)
        || chr.is_ascii_digit()
        || ('\u{0300}'..='\u{036F}').contains(&chr)
        || ('\u{203F}'..='\u{2040}').contains(&chr)
        || chr == '-'
        || chr == '.'
        || chr == '\u{B7}'
}

/// Complete check of an XML `Name`, used to validate names before writing.
pub(crate) fn is_name(text: &str) -> bool {
    let mut chars = text.chars();
    matches!(chars.next(), Some(c) if is_namestart_char_t(c)) && chars.all(is_namechar_t)
}

/// Complete check of an `NCName` (a `Name` without colons).
pub(crate) fn is_nc_name(text: &str) -> bool {
    let mut chars = text.chars();
    matches!(chars.next(), Some(c) if is_nc_namestart_char_t(c)) && chars.all(is_nc_namechar_t)
}

/// Splits a qualified name into `(prefix, local)`; the prefix is empty when
/// absent. `None` when the name does not conform to the QName production.
// [7] QName ::= PrefixedName | UnprefixedName
// [8] PrefixedName ::= Prefix ':' LocalPart
pub(crate) fn split_qname(name: &str) -> Option<(&str, &str)> {
    match name.split_once(':') {
        Some((prefix, local)) if is_nc_name(prefix) && is_nc_name(local) => Some((prefix, local)),
        Some(_) => None,
        None if is_nc_name(name) => Some(("", name)),
        None => None,
    }
}

fn single_char(input: &[u8], accept: fn(char) -> bool) -> IResult<&[u8], &[u8]> {
    if input.is_empty() {
        return Err(Err::Incomplete(Needed::new(1)));
    }
    let width = utf8_char_width(input[0]);
    if width == 0 {
        return Err(Err::Error(Error::new(input, ErrorKind::Char)));
    }
    if input.len() < width {
        return Err(Err::Incomplete(Needed::new(width - input.len())));
    }

    match std::str::from_utf8(&input[..width])
        .ok()
        .and_then(|s| s.chars().next())
    {
        Some(c) if accept(c) => Ok((&input[width..], &input[..width])),
        _ => Err(Err::Error(Error::new(input, ErrorKind::Char))),
    }
}

fn namestart_char(input: &[u8]) -> IResult<&[u8], &[u8]> {
    single_char(input, is_namestart_char_t)
}

fn namechar(input: &[u8]) -> IResult<&[u8], &[u8]> {
    single_char(input, is_namechar_t)
}

//means streaming in nom's terminology
fn many0_custom_trycomplete<I, O, E, F>(mut f: F) -> impl FnMut(I) -> IResult<I, (), E>
where
    I: Clone + InputLength,
    F: Parser<I, O, E>,
    E: ParseError<I>,
{
    move |mut i: I| loop {
        let len = i.input_len();
        match f.parse(i.clone()) {
            Err(Err::Error(_)) => return Ok((i, ())),
            Err(e) => return Err(e), //returns incomplete here
            Ok((i1, _o)) => {
                // infinite loop check: the parser must always consume
                if i1.input_len() == len {
                    return Err(Err::Error(E::from_error_kind(i, ErrorKind::Many0)));
                }
                i = i1;
            }
        }
    }
}

// [5] Name ::= NameStartChar (NameChar)*
fn name(input: &[u8]) -> IResult<&[u8], &[u8]> {
    recognize(pair(namestart_char, many0_custom_trycomplete(namechar)))(input)
}

// [66] CharRef ::= '&#' [0-9]+ ';' | '&#x' [0-9a-fA-F]+ ';'
fn CharRef(input: &[u8]) -> IResult<&[u8], &[u8]> {
    alt((
        recognize(tuple((tag("&#x"), take_while1(is_hex_digit), char(';')))),
        recognize(tuple((tag("&#"), take_while1(is_digit), char(';')))),
    ))(input)
}

// [68] EntityRef ::= '&' Name ';'
fn EntityRef(input: &[u8]) -> IResult<&[u8], &[u8]> {
    recognize(tuple((char('&'), name, char(';'))))(input)
}

// [67] Reference ::= EntityRef | CharRef
fn Reference(input: &[u8]) -> IResult<&[u8], &[u8]> {
    alt((CharRef, EntityRef))(input)
}

// [10] AttValue ::= '"' ([^<&"] | Reference)* '"' | "'" ([^<&'] | Reference)* "'"
fn AttValue(input: &[u8]) -> IResult<&[u8], &[u8]> {
    alt((
        delimited(
            char('"'),
            recognize(many0_custom_trycomplete(alt((is_not("<&\""), Reference)))),
            char('"'),
        ),
        delimited(
            char('\''),
            recognize(many0_custom_trycomplete(alt((is_not("<&'"), Reference)))),
            char('\''),
        ),
    ))(input)
}

// [25] Eq ::= S? '=' S?
fn Eq(input: &[u8]) -> IResult<&[u8], &[u8]> {
    recognize(tuple((multispace0, char('='), multispace0)))(input)
}

/// Byte ranges of one attribute inside the parser's string buffer.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct AttributeRange {
    pub value: Range<usize>,
    pub name: Range<usize>,
    // namespace aware
    pub local_name: Range<usize>,
    pub prefix: Range<usize>,
    pub namespace: Range<usize>,
}

// [41] Attribute ::= Name Eq AttValue
fn Attribute(input: &[u8]) -> IResult<&[u8], (&[u8], &[u8])> {
    map(tuple((name, Eq, AttValue)), |(name, _, value)| (name, value))(input)
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StartTag<'a> {
    pub name: &'a [u8],
    pub attributes: Vec<(&'a [u8], &'a [u8])>,
    pub is_empty: bool,
}

// [40] STag ::= '<' Name (S Attribute)* S? '>'
// [44] EmptyElemTag ::= '<' Name (S Attribute)* S? '/>'
fn STag(input: &[u8]) -> IResult<&[u8], StartTag> {
    map(
        tuple((
            char('<'),
            name,
            many0(preceded(multispace1, Attribute)),
            multispace0,
            alt((tag(">"), tag("/>"))),
        )),
        |(_, name, attributes, _, close)| StartTag {
            name,
            attributes,
            is_empty: close == b"/>",
        },
    )(input)
}

// [42] ETag ::= '</' Name S? '>'
fn ETag(input: &[u8]) -> IResult<&[u8], &[u8]> {
    delimited(tag("</"), name, pair(multispace0, char('>')))(input)
}

// [14] CharData ::= [^<&]* - ([^<&]* ']]>' [^<&]*)
// our implementation requires at least one char. When the buffer ends before a
// '<' or '&' we hand out what we have (ref#streamcut), holding back an
// unfinished UTF-8 sequence, trailing ']' that may start a ']]>' and a
// trailing '\r' that may be the first half of a line break.
fn CharData(input: &[u8]) -> IResult<&[u8], &[u8]> {
    let delimiter = input.iter().position(|b| *b == b'<' || *b == b'&');
    let cut = match delimiter {
        Some(pos) => pos,
        None => {
            let mut cut = input.len();
            let mut lead = cut;
            while lead > 0 && input[lead - 1] & 0xC0 == 0x80 {
                lead -= 1;
            }
            if lead > 0 && lead - 1 + utf8_char_width(input[lead - 1]) > input.len() {
                cut = lead - 1;
            }
            while cut > 0 && input[cut - 1] == b']' {
                cut -= 1;
            }
            if cut > 0 && input[cut - 1] == b'\r' {
                cut -= 1;
            }
            cut
        }
    };

    if cut == 0 {
        return match delimiter {
            Some(_) => Err(Err::Error(Error::new(input, ErrorKind::Char))),
            None => Err(Err::Incomplete(Needed::Unknown)),
        };
    }

    let chunk = &input[..cut];
    match std::str::from_utf8(chunk) {
        Ok(text) if !text.contains("]]>") && text.chars().all(is_xml_char_t) => {
            Ok((&input[cut..], chunk))
        }
        _ => Err(Err::Failure(Error::new(input, ErrorKind::Char))),
    }
}

// [15] Comment ::= '<!--' ((Char - '-') | ('-' (Char - '-')))* '-->'
fn Comment(input: &[u8]) -> IResult<&[u8], &[u8]> {
    delimited(tag("<!--"), take_until("--"), tag("-->"))(input)
}

// [18] CDSect ::= CDStart CData CDEnd
// [19] CDStart ::= '<![CDATA['
// [20] CData ::= (Char* - (Char* ']]>' Char*))
// [21] CDEnd ::= ']]>'
fn CDSect(input: &[u8]) -> IResult<&[u8], &[u8]> {
    delimited(tag("<![CDATA["), take_until("]]>"), tag("]]>"))(input)
}

// [17] PITarget ::= Name - (('X' | 'x') ('M' | 'm') ('L' | 'l'))
fn PITarget(input: &[u8]) -> IResult<&[u8], &[u8]> {
    verify(name, |target: &[u8]| !target.eq_ignore_ascii_case(b"xml"))(input)
}

// [16] PI ::= '<?' PITarget (S (Char* - (Char* '?>' Char*)))? '?>'
fn PI(input: &[u8]) -> IResult<&[u8], &[u8]> {
    recognize(tuple((
        tag("<?"),
        PITarget,
        alt((
            tag("?>"),
            recognize(tuple((multispace1, take_until("?>"), tag("?>")))),
        )),
    )))(input)
}

// [26] VersionNum ::= '1.' [0-9]+
fn VersionNum(input: &[u8]) -> IResult<&[u8], &[u8]> {
    recognize(pair(tag("1."), take_while1(is_digit)))(input)
}

// [24] VersionInfo ::= S 'version' Eq ("'" VersionNum "'" | '"' VersionNum '"')
fn VersionInfo(input: &[u8]) -> IResult<&[u8], &[u8]> {
    preceded(
        tuple((multispace1, tag("version"), Eq)),
        alt((
            delimited(char('\''), VersionNum, char('\'')),
            delimited(char('"'), VersionNum, char('"')),
        )),
    )(input)
}

// [81] EncName ::= [A-Za-z] ([A-Za-z0-9._] | '-')*
fn EncName(input: &[u8]) -> IResult<&[u8], &[u8]> {
    recognize(pair(
        take_while_m_n(1, 1, is_alphabetic),
        take_while(|c: u8| c.is_ascii_alphanumeric() || c == b'.' || c == b'_' || c == b'-'),
    ))(input)
}

// [80] EncodingDecl ::= S 'encoding' Eq ('"' EncName '"' | "'" EncName "'" )
fn EncodingDecl(input: &[u8]) -> IResult<&[u8], &[u8]> {
    preceded(
        tuple((multispace1, tag("encoding"), Eq)),
        alt((
            delimited(char('"'), EncName, char('"')),
            delimited(char('\''), EncName, char('\'')),
        )),
    )(input)
}

// [32] SDDecl ::= S 'standalone' Eq (("'" ('yes' | 'no') "'") | ('"' ('yes' | 'no') '"'))
fn SDDecl(input: &[u8]) -> IResult<&[u8], &[u8]> {
    preceded(
        tuple((multispace1, tag("standalone"), Eq)),
        alt((
            delimited(char('"'), yes_no, char('"')),
            delimited(char('\''), yes_no, char('\'')),
        )),
    )(input)
}

fn yes_no(input: &[u8]) -> IResult<&[u8], &[u8]> {
    alt((tag("yes"), tag("no")))(input)
}

// [23] XMLDecl ::= '<?xml' VersionInfo EncodingDecl? SDDecl? S? '?>'
fn XMLDecl(input: &[u8]) -> IResult<&[u8], &[u8]> {
    recognize(tuple((
        tag("<?xml"),
        VersionInfo,
        opt(EncodingDecl),
        opt(SDDecl),
        multispace0,
        tag("?>"),
    )))(input)
}

// [28] doctypedecl ::= '<!DOCTYPE' S Name (S ExternalID)? S? ('[' intSubset ']' S?)? '>'
// the internal subset is skipped, never interpreted
fn doctypedecl(input: &[u8]) -> IResult<&[u8], &[u8]> {
    let (rest, _) = tuple((tag("<!DOCTYPE"), multispace1, name))(input)?;
    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    for (i, b) in rest.iter().enumerate() {
        match (quote, *b) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, b'"') | (None, b'\'') => quote = Some(*b),
            (None, b'[') => depth += 1,
            (None, b']') => depth = depth.saturating_sub(1),
            (None, b'>') if depth == 0 => {
                let end = input.offset(rest) + i + 1;
                return Ok((&input[end..], &input[..end]));
            }
            _ => {}
        }
    }
    Err(Err::Incomplete(Needed::Unknown))
}

// [43] content ::= CharData? ((element | Reference | CDSect | PI | Comment) CharData?)*
//we will use state machine instead of this rule to make it streamable
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ContentRelaxed<'a> {
    CharData(&'a [u8]),
    StartElement(StartTag<'a>),
    EndElement(&'a [u8]),
    Reference(&'a [u8]),
    Cdata(&'a [u8]),
    Comment(&'a [u8]),
    PI(&'a [u8]),
}

// [custom] relaxed ::= CharData | STag | EmptyElemTag | ETag | Reference | CDSect | Comment | PI
pub fn content_relaxed(input: &[u8]) -> IResult<&[u8], ContentRelaxed> {
    alt((
        map(CharData, ContentRelaxed::CharData),
        map(STag, ContentRelaxed::StartElement),
        map(ETag, ContentRelaxed::EndElement),
        map(Reference, ContentRelaxed::Reference),
        map(CDSect, ContentRelaxed::Cdata),
        map(Comment, ContentRelaxed::Comment),
        map(PI, ContentRelaxed::PI),
    ))(input)
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Misc<'a> {
    XmlDecl(&'a [u8]),
    DocType(&'a [u8]),
    Comment(&'a [u8]),
    PI(&'a [u8]),
    Whitespace(&'a [u8]),
}

// [27] Misc ::= Comment | PI | S
pub fn misc(input: &[u8]) -> IResult<&[u8], Misc> {
    alt((
        map(Comment, Misc::Comment),
        map(PI, Misc::PI),
        map(complete_multispace1, Misc::Whitespace),
    ))(input)
}

// [22] prolog ::= XMLDecl? Misc* (doctypedecl Misc*)?
pub fn misc_before_doctype(input: &[u8]) -> IResult<&[u8], Misc> {
    alt((map(doctypedecl, Misc::DocType), misc))(input)
}

pub fn misc_before_xmldecl(input: &[u8]) -> IResult<&[u8], Misc> {
    alt((map(XMLDecl, Misc::XmlDecl), misc_before_doctype))(input)
}

#[test]
fn test_names() {
    assert!(is_name("fp:book"));
    assert!(is_name("a.abc-ab1çroot"));
    assert!(!is_name("1abc"));
    assert!(!is_name(""));
    assert!(is_nc_name("book"));
    assert!(!is_nc_name("fp:book"));
    // combining marks are name characters but not start characters
    assert!(is_name("a\u{0301}"));
    assert!(!is_name("\u{0301}a"));
    assert!(!is_name("a\u{0400}\u{037E}"));

    assert_eq!(split_qname("fp:book"), Some(("fp", "book")));
    assert_eq!(split_qname("book"), Some(("", "book")));
    assert_eq!(split_qname("a:b:c"), None);
    assert_eq!(split_qname(":b"), None);
}

#[test]
fn test_stag() {
    let (rest, tag) = STag(br#"<A a="b"  c = 'd'></A>"#).unwrap();
    assert_eq!(rest, b"</A>");
    assert_eq!(tag.name, b"A");
    assert_eq!(
        tag.attributes,
        vec![(&b"a"[..], &b"b"[..]), (&b"c"[..], &b"d"[..])]
    );
    assert!(!tag.is_empty);

    let (_, tag) = STag(b"<B b='1&amp;2' />").unwrap();
    assert!(tag.is_empty);
    assert_eq!(tag.attributes, vec![(&b"b"[..], &b"1&amp;2"[..])]);

    assert!(matches!(STag(b"<B b='1'"), Err(Err::Incomplete(_))));
    assert!(matches!(STag(b"<B b='1'c='2'>"), Err(Err::Error(_))));
}

#[test]
fn test_etag() {
    assert_eq!(ETag(b"</A >tail"), Ok((&b"tail"[..], &b"A"[..])));
    assert!(matches!(ETag(b"</A"), Err(Err::Incomplete(_))));
}

#[test]
fn test_chardata() {
    assert_eq!(CharData(b"abc<"), Ok((&b"<"[..], &b"abc"[..])));
    assert_eq!(CharData(b"a&amp;"), Ok((&b"&amp;"[..], &b"a"[..])));
    assert!(matches!(CharData(b"<a>"), Err(Err::Error(_))));

    //see ref#streamcut
    assert_eq!(CharData(b"abc"), Ok((&b""[..], &b"abc"[..])));
    assert_eq!(CharData(b"abc]]"), Ok((&b"]]"[..], &b"abc"[..])));
    assert_eq!(CharData(b"]]"), Err(Err::Incomplete(Needed::Unknown)));
    assert!(matches!(CharData(b"a]]>b<"), Err(Err::Failure(_))));
    assert_eq!(CharData(b"ab\r"), Ok((&b"\r"[..], &b"ab"[..])));

    // "kī" cut in the middle of the two byte sequence for ī
    let data = "kī".as_bytes();
    assert_eq!(CharData(&data[..2]), Ok((&data[1..2], &data[..1])));
}

#[test]
fn test_comment_and_cdata() {
    assert_eq!(Comment(b"<!-- hi -->x"), Ok((&b"x"[..], &b" hi "[..])));
    assert_eq!(Comment(b"<!---->"), Ok((&b""[..], &b""[..])));
    assert!(matches!(Comment(b"<!-- a --->"), Err(Err::Error(_))));
    assert!(matches!(Comment(b"<!-- open"), Err(Err::Incomplete(_))));

    assert_eq!(
        CDSect(b"<![CDATA[ <&> ]]>"),
        Ok((&b""[..], &b" <&> "[..]))
    );
}

#[test]
fn test_prolog() {
    let decl = br#"<?xml version="1.0" encoding="UTF-8" standalone='yes'?>"#;
    assert_eq!(misc_before_xmldecl(decl), Ok((&b""[..], Misc::XmlDecl(&decl[..]))));

    let doctype = b"<!DOCTYPE root [<!ENTITY a \"x>y\">]><root/>";
    assert_eq!(
        misc_before_doctype(doctype),
        Ok((&b"<root/>"[..], Misc::DocType(&doctype[..doctype.len() - 7])))
    );

    assert_eq!(
        misc(b"<?pi data?>"),
        Ok((&b""[..], Misc::PI(&b"<?pi data?>"[..])))
    );
    assert_eq!(misc(b" \n"), Ok((&b""[..], Misc::Whitespace(&b" \n"[..]))));
    assert!(matches!(misc(b"<root>"), Err(Err::Error(_))));
}

#[test]
fn test_content_relaxed() {
    assert_eq!(
        content_relaxed(b"&#x3C;rest"),
        Ok((&b"rest"[..], ContentRelaxed::Reference(&b"&#x3C;"[..])))
    );
    assert_eq!(
        content_relaxed(b"</a>"),
        Ok((&b""[..], ContentRelaxed::EndElement(&b"a"[..])))
    );
    assert_eq!(
        content_relaxed(b"<?target?>"),
        Ok((&b""[..], ContentRelaxed::PI(&b"<?target?>"[..])))
    );
    assert!(matches!(content_relaxed(b"<!--"), Err(Err::Incomplete(_))));
}
