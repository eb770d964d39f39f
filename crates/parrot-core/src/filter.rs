//! Text admission checks.
//!
//! Everything here is a pure function over its arguments. Learn-eligibility
//! gates what a brain may learn from; send-eligibility gates what it may say.

/// Messages starting with this are bot commands and are never learned.
pub const COMMAND_PREFIX: char = '!';

const LINK_PATTERNS: &[&str] = &[
    "http://", "https://", "www.", ".com", ".org", ".net", ".tv", ".gg", ".io", ".co", ".me",
    ".be", ".ru", ".xyz", ".info", ".link", ".click", ".site", ".online", ".top", ".ly", ".gl",
    ".to", ".live", ".stream", ".uk", ".de", ".fr", ".shop", ".store",
];

/// Inclusive code point ranges treated as emoji. Overlaps are harmless.
const EMOJI_RANGES: &[(u32, u32)] = &[
    (0x1F300, 0x1F9FF), // misc symbols and pictographs, supplemental symbols
    (0x2600, 0x26FF),   // misc symbols
    (0x2700, 0x27BF),   // dingbats
    (0x1F600, 0x1F64F), // emoticons
    (0x1F680, 0x1F6FF), // transport and map
    (0x1F1E0, 0x1F1FF), // regional indicator flags
    (0x231A, 0x231B),   // watch, hourglass
    (0x23E9, 0x23F3),   // media controls
    (0x25AA, 0x25AB),
    (0x25B6, 0x25C0),
    (0x25FB, 0x25FE),
    (0x2614, 0x2615),
    (0x2648, 0x2653), // zodiac
    (0x267F, 0x267F),
    (0x2934, 0x2935),
    (0x2B05, 0x2B07),
    (0x2B1B, 0x2B1C),
    (0x2B50, 0x2B50),
    (0x2B55, 0x2B55),
    (0x3030, 0x3030),
    (0x303D, 0x303D),
    (0x3297, 0x3299),
    (0xFE0F, 0xFE0F), // variation selector 16
    (0x200D, 0x200D), // zero width joiner
];

const PUNCTUATION_MAP: &[(char, &str)] = &[
    ('\u{2018}', "'"),
    ('\u{2019}', "'"),
    ('\u{201A}', "'"),
    ('\u{201B}', "'"),
    ('\u{2032}', "'"),
    ('\u{2035}', "'"),
    ('\u{201C}', "\""),
    ('\u{201D}', "\""),
    ('\u{201E}', "\""),
    ('\u{201F}', "\""),
    ('\u{2033}', "\""),
    ('\u{2036}', "\""),
    ('\u{2010}', "-"),
    ('\u{2011}', "-"),
    ('\u{2012}', "-"),
    ('\u{2013}', "-"),
    ('\u{2014}', "-"),
    ('\u{2015}', "-"),
    ('\u{2026}', "..."),
    ('\u{00A0}', " "),
    ('\u{2002}', " "),
    ('\u{2003}', " "),
    ('\u{2009}', " "),
];

pub fn is_command(text: &str) -> bool {
    text.starts_with(COMMAND_PREFIX)
}

/// Permissive link detection. False positives (e.g. "hello.to") are accepted.
pub fn contains_link(text: &str) -> bool {
    let lower = text.to_lowercase();
    LINK_PATTERNS.iter().any(|p| lower.contains(p))
}

pub fn is_emoji(c: char) -> bool {
    let cp = c as u32;
    EMOJI_RANGES.iter().any(|&(lo, hi)| cp >= lo && cp <= hi)
}

/// True for a character above ASCII that is not on the emoji whitelist.
pub fn is_foreign_char(c: char) -> bool {
    !c.is_ascii() && !is_emoji(c)
}

pub fn contains_non_ascii(token: &str) -> bool {
    token.chars().any(is_foreign_char)
}

/// Every character is ASCII or emoji.
pub fn is_mostly_english(text: &str) -> bool {
    !contains_non_ascii(text)
}

/// Blacklist check used both before learning and before sending.
///
/// Entries containing a space are phrases and match as a case-insensitive
/// substring of the whole message. Single words only match a whole
/// whitespace-delimited token.
pub fn contains_blacklisted_content<S: AsRef<str>>(text: &str, blacklist: &[S]) -> bool {
    let lower = text.to_lowercase();
    let tokens: Vec<&str> = lower.split_whitespace().collect();

    blacklist.iter().any(|entry| {
        let entry = entry.as_ref().trim().to_lowercase();
        if entry.is_empty() {
            return false;
        }
        if entry.contains(' ') {
            lower.contains(&entry)
        } else {
            tokens.iter().any(|t| *t == entry)
        }
    })
}

pub fn normalize_unicode_punctuation(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match PUNCTUATION_MAP.iter().find(|(from, _)| *from == c) {
            Some((_, to)) => out.push_str(to),
            None => out.push(c),
        }
    }
    out
}

/// Content-only learn gate. Sender and channel checks live in the brain.
pub fn is_learnable<S: AsRef<str>>(text: &str, blacklist: &[S]) -> bool {
    !is_command(text)
        && !contains_link(text)
        && is_mostly_english(text)
        && !contains_blacklisted_content(text, blacklist)
}

/// Generated text is built from already-filtered vocabulary, so only the
/// blacklist (which may have grown since learning) is rechecked.
pub fn is_sendable<S: AsRef<str>>(text: &str, blacklist: &[S]) -> bool {
    !contains_blacklisted_content(text, blacklist)
}
