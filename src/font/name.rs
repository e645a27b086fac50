//! Font display-name parsing.
//!
//! Installed fonts are described by free-form names: registry entries such
//! as `"Arial Bold Italic (TrueType)"`, DirectWrite `family + face` strings,
//! or bare file stems like `"DejaVuSansMono-BoldOblique"`. This module turns
//! such a name into a family guess plus bold/italic flags, and folds family
//! names into comparable keys.

/// Registry-style type suffixes that never belong to a family name.
const TYPE_SUFFIXES: &[&str] = &["(TrueType)", "(OpenType)", "(All res)", "(VGA res)"];

/// Characters that separate words in a font name.
const SEPARATORS: &[char] = &[' ', '-', '_', ',', '.', '+'];

/// Result of parsing a font display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedFontName {
    /// Family guess with style words removed (display form).
    pub family: String,
    pub bold: bool,
    pub italic: bool,
    /// Name carries a light/thin weight word.
    pub light: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenKind {
    Bold,
    Italic,
    BoldItalic,
    Light,
    /// Weight words that say nothing about bold/italic ("Regular", "Book").
    Neutral,
    /// "Semi", "Extra", ... only meaningful in front of a weight word.
    Modifier,
    Family,
}

fn classify(token: &str) -> TokenKind {
    match token.to_lowercase().as_str() {
        "bold" | "heavy" | "black" | "bd" | "boldface" | "extrabold" | "ultrabold"
        | "semibold" | "demibold" => TokenKind::Bold,
        "italic" | "oblique" | "slanted" | "slant" | "it" | "ital" | "kursiv" => {
            TokenKind::Italic
        }
        "bolditalic" | "boldoblique" | "bi" => TokenKind::BoldItalic,
        "light" | "thin" | "hairline" | "extralight" | "ultralight" | "semilight"
        | "demilight" => TokenKind::Light,
        "regular" | "normal" | "book" | "roman" | "plain" | "medium" => TokenKind::Neutral,
        "semi" | "demi" | "extra" | "ultra" => TokenKind::Modifier,
        _ => TokenKind::Family,
    }
}

/// A word of a font name together with the separator-delimited segment it
/// came from, so family words can be glued back the way they were written.
struct Token<'a> {
    text: &'a str,
    segment: usize,
}

/// Split a name into words on separators and CamelCase boundaries.
fn tokenize(name: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();

    for (segment, part) in name
        .split(|c| SEPARATORS.contains(&c))
        .filter(|p| !p.is_empty())
        .enumerate()
    {
        let chars: Vec<(usize, char)> = part.char_indices().collect();
        let mut start = 0;

        for i in 1..chars.len() {
            let (idx, cur) = chars[i];
            let prev = chars[i - 1].1;
            let next_is_lower = chars.get(i + 1).is_some_and(|(_, c)| c.is_lowercase());

            // "SansMono" -> "Sans" | "Mono", "XMLFont" -> "XML" | "Font"
            let boundary = (prev.is_lowercase() && cur.is_uppercase())
                || (prev.is_uppercase() && cur.is_uppercase() && next_is_lower)
                || (prev.is_ascii_digit() != cur.is_ascii_digit()
                    && prev.is_alphanumeric()
                    && cur.is_alphanumeric()
                    && cur.is_ascii_digit());

            if boundary {
                tokens.push(Token {
                    text: &part[start..idx],
                    segment,
                });
                start = idx;
            }
        }

        tokens.push(Token {
            text: &part[start..],
            segment,
        });
    }

    tokens
}

/// Strip registry decorations: `(TrueType)` suffixes and compound
/// `"A & B"` names (only the first name is kept).
fn strip_decorations(name: &str) -> &str {
    let mut name = name.split('&').next().unwrap_or(name).trim();

    for suffix in TYPE_SUFFIXES {
        if let Some(stripped) = name.strip_suffix(suffix) {
            name = stripped.trim_end();
        }
    }

    name
}

/// Parse a font display name into family and style flags.
///
/// Style words are matched case-insensitively as whole words. Light and thin
/// weights never count as bold, even when combined with a bold word.
pub fn parse_display_name(name: &str) -> ParsedFontName {
    let cleaned = strip_decorations(name);
    let tokens = tokenize(cleaned);

    let mut bold = false;
    let mut italic = false;
    let mut light = false;
    let mut family_words: Vec<(usize, &str)> = Vec::new();

    for (i, token) in tokens.iter().enumerate() {
        match classify(token.text) {
            TokenKind::Bold => bold = true,
            TokenKind::Italic => italic = true,
            TokenKind::BoldItalic => {
                bold = true;
                italic = true;
            }
            TokenKind::Light => light = true,
            TokenKind::Neutral => {}
            TokenKind::Modifier => {
                let qualifies_weight = tokens
                    .get(i + 1)
                    .is_some_and(|next| classify(next.text) != TokenKind::Family);
                if !qualifies_weight {
                    family_words.push((token.segment, token.text));
                }
            }
            TokenKind::Family => family_words.push((token.segment, token.text)),
        }
    }

    let mut family = String::new();
    let mut last_segment = None;
    for (segment, word) in family_words {
        if last_segment.is_some_and(|s| s != segment) {
            family.push(' ');
        }
        family.push_str(word);
        last_segment = Some(segment);
    }

    if family.is_empty() {
        family = cleaned.to_string();
    }

    ParsedFontName {
        family,
        bold: bold && !light,
        italic,
        light,
    }
}

/// Fold a family name into a lookup key: lowercase, with whitespace and
/// punctuation removed. Non-Latin letters are kept as-is.
pub fn normalize_family(name: &str) -> String {
    name.trim()
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}
