//! Prompt detection and output normalization.
//!
//! The matcher always runs on the normalized view of the buffer (terminal
//! escape sequences and carriage returns removed), which is also the view
//! handed back to callers, so detection and returned text never disagree.

use std::ops::Range;

use memchr::memmem;
use regex::bytes::Regex;

/// Device identifier of the default switch family.
pub const DEFAULT_DEVICE_ID: &str = "SG2210XMP-M2";

/// Cue the switch prints when an elevation command wants the enable password.
pub const DEFAULT_SECONDARY_PROMPT: &str = "Password:";

/// Remove terminal escape sequences.
///
/// Runs the bytes through a VT parser and keeps only printed text and line
/// feeds, so any well-formed or truncated sequence (CSI with private
/// parameters, OSC, charset selection, a lone ESC) is dropped whole. Tabs
/// are kept as spaces. The output never contains ESC, which makes stripping
/// idempotent.
pub fn strip_ansi(data: &[u8]) -> Vec<u8> {
    if !data.iter().any(|&b| b == 0x1b || b == b'\t') {
        return data.to_vec();
    }
    let spaced: Vec<u8> = data
        .iter()
        .map(|&b| if b == b'\t' { b' ' } else { b })
        .collect();
    strip_ansi_escapes::strip(spaced)
}

/// Strip escape sequences and carriage returns.
pub fn normalize(data: &[u8]) -> Vec<u8> {
    let mut cleaned = strip_ansi(data);
    cleaned.retain(|&b| b != b'\r');
    cleaned
}

/// Strategy for recognizing a settled shell prompt.
///
/// Swapping the implementation changes the device family without touching
/// the read-cycle state machine.
pub trait PromptMatcher: Send + Sync {
    /// Produce the normalized view of a raw buffer.
    fn normalize(&self, raw: &[u8]) -> Vec<u8> {
        normalize(raw)
    }

    /// Byte range of the prompt if the normalized buffer ends in one.
    fn find_prompt(&self, normalized: &[u8]) -> Option<Range<usize>>;

    /// Whether the normalized buffer contains a secondary credential request.
    fn is_secondary_prompt(&self, normalized: &[u8]) -> bool;

    /// Check if the normalized buffer ends in a prompt.
    fn is_match(&self, normalized: &[u8]) -> bool {
        self.find_prompt(normalized).is_some()
    }
}

/// Regex prompt pattern plus a literal secondary prompt cue.
#[derive(Debug, Clone)]
pub struct PromptPattern {
    /// Prompt regex; capture group 1, when present, is the prompt itself.
    prompt: Regex,

    /// Literal secondary prompt cue.
    secondary: Vec<u8>,
}

impl PromptPattern {
    /// Prompt pattern for the default switch family.
    pub fn tplink() -> Self {
        Self::for_device(DEFAULT_DEVICE_ID).expect("escaped device id is a valid regex")
    }

    /// Prompt pattern for a device identifier of the same CLI family.
    ///
    /// Matches `<id>[-N<digits>][(<mode>)]` followed by `>` or `#` at the very
    /// end of the buffer, optionally preceded by line breaks.
    pub fn for_device(device_id: &str) -> Result<Self, regex::Error> {
        let pattern = format!(
            r"\n*({}(?:-N\d+)?(?:\([^)]*\))?[>#])\s*\z",
            regex::escape(device_id)
        );
        Self::custom(&pattern, DEFAULT_SECONDARY_PROMPT)
    }

    /// Arbitrary prompt regex and secondary cue.
    ///
    /// Patterns without an end anchor get `\s*\z` appended so a prompt only
    /// counts when it is the last thing received.
    pub fn custom(pattern: &str, secondary: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            prompt: compile_prompt_pattern(pattern)?,
            secondary: secondary.as_bytes().to_vec(),
        })
    }

    /// Get a reference to the underlying regex.
    pub fn regex(&self) -> &Regex {
        &self.prompt
    }
}

impl Default for PromptPattern {
    fn default() -> Self {
        Self::tplink()
    }
}

impl PromptMatcher for PromptPattern {
    fn find_prompt(&self, normalized: &[u8]) -> Option<Range<usize>> {
        let caps = self.prompt.captures(normalized)?;
        caps.get(1).or_else(|| caps.get(0)).map(|m| m.range())
    }

    fn is_secondary_prompt(&self, normalized: &[u8]) -> bool {
        !self.secondary.is_empty() && memmem::find(normalized, &self.secondary).is_some()
    }
}

/// Compile a prompt pattern, anchoring it to the end of the buffer.
pub fn compile_prompt_pattern(pattern: &str) -> Result<Regex, regex::Error> {
    let pattern = if pattern.ends_with(r"\z") || pattern.ends_with('$') {
        pattern.to_string()
    } else {
        format!(r"{}\s*\z", pattern)
    };

    Regex::new(&pattern)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_ansi() {
        assert_eq!(strip_ansi(b"\x1b[32mGreen\x1b[0m text"), b"Green text");
        assert_eq!(strip_ansi(b"\x1b[1;31mx\x1b[K"), b"x");
    }

    #[test]
    fn test_strip_private_mode_sequences() {
        let cleaned = normalize(b"\x1b[?25lrow\r\n\x1b[?25hSG2210XMP-M2#");
        assert!(!cleaned.contains(&0x1b));
        assert_eq!(cleaned, b"row\nSG2210XMP-M2#");
        assert!(PromptPattern::tplink().is_match(&cleaned));
    }

    #[test]
    fn test_strip_non_csi_sequences() {
        assert_eq!(strip_ansi(b"\x1b]0;title\x07a\x1b(Bb\x1b=c"), b"abc");
    }

    #[test]
    fn test_strip_malformed_input_is_idempotent() {
        for input in [
            &b"row\x1b\x1b[0m[0m\n"[..],
            b"\x1b\x1b\x1b[1mx",
            b"trailing\x1b",
            b"a\x1b[\x1b[31mb",
        ] {
            let once = strip_ansi(input);
            assert!(!once.contains(&0x1b), "{:?}", input);
            assert_eq!(strip_ansi(&once), once, "{:?}", input);
        }
    }

    #[test]
    fn test_strip_keeps_tabs_as_spaces() {
        assert_eq!(strip_ansi(b"Tw1/0/1\t4.2\x1b[0m"), b"Tw1/0/1 4.2");
    }

    #[test]
    fn test_strip_is_idempotent() {
        let once = strip_ansi(b"a\x1b[2Jb\x1b[0;1mc");
        assert_eq!(strip_ansi(&once), once);
    }

    #[test]
    fn test_normalize_drops_carriage_returns() {
        assert_eq!(normalize(b"line1\r\nline2\r\n\x1b[0m"), b"line1\nline2\n");
    }

    #[test]
    fn test_prompt_shapes() {
        let p = PromptPattern::tplink();
        assert!(p.is_match(b"SG2210XMP-M2>"));
        assert!(p.is_match(b"output\nSG2210XMP-M2#"));
        assert!(p.is_match(b"\nSG2210XMP-M2(config)# "));
        assert!(p.is_match(b"\nSG2210XMP-M2-N3(config-if)#"));
        assert!(!p.is_match(b"OtherSwitch#"));
    }

    #[test]
    fn test_prompt_must_be_at_end() {
        let p = PromptPattern::tplink();
        assert!(!p.is_match(b"SG2210XMP-M2>enable\n"));
        assert!(!p.is_match(b"SG2210XMP-M2#\nmore output"));
    }

    #[test]
    fn test_partial_prompt_does_not_match() {
        let p = PromptPattern::tplink();
        let full = b"\nSG2210XMP-M2(config)#";
        for end in 0..full.len() {
            assert!(!p.is_match(&full[..end]), "prefix {:?}", &full[..end]);
        }
        assert!(p.is_match(full));
    }

    #[test]
    fn test_find_prompt_range() {
        let p = PromptPattern::tplink();
        let data = b"show x\nrow\nSG2210XMP-M2# ";
        let range = p.find_prompt(data).unwrap();
        assert_eq!(&data[range], b"SG2210XMP-M2#");
    }

    #[test]
    fn test_for_device_escapes_identifier() {
        let p = PromptPattern::for_device("core.sw1").unwrap();
        assert!(p.is_match(b"core.sw1>"));
        assert!(!p.is_match(b"coreXsw1>"));
    }

    #[test]
    fn test_secondary_prompt() {
        let p = PromptPattern::tplink();
        assert!(p.is_secondary_prompt(b"enable\nPassword:"));
        assert!(!p.is_secondary_prompt(b"enable\n"));
    }

    #[test]
    fn test_custom_pattern_is_anchored() {
        let p = PromptPattern::custom(r"router#", "assword").unwrap();
        assert!(p.is_match(b"x\nrouter# "));
        assert!(!p.is_match(b"router#\nx"));
        assert!(p.is_secondary_prompt(b"Password:"));
    }
}
