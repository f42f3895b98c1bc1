//! Beat kinds and the cyclic beat pattern.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// What happens on one beat.
///
/// The ordinal order (Normal, Silence, Accent, Medium) is the wire order shared
/// with hosts and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BeatKind {
    Normal,
    Silence,
    Accent,
    Medium,
}

impl BeatKind {
    pub const ALL: [BeatKind; 4] = [
        BeatKind::Normal,
        BeatKind::Silence,
        BeatKind::Accent,
        BeatKind::Medium,
    ];

    pub fn ordinal(self) -> u8 {
        match self {
            BeatKind::Normal => 0,
            BeatKind::Silence => 1,
            BeatKind::Accent => 2,
            BeatKind::Medium => 3,
        }
    }

    pub fn from_ordinal(ordinal: u8) -> Option<Self> {
        Self::ALL.get(ordinal as usize).copied()
    }

    /// Next kind when a user taps a beat: Normal, Silence, Accent, Medium, Normal.
    pub fn next(self) -> Self {
        match self {
            BeatKind::Normal => BeatKind::Silence,
            BeatKind::Silence => BeatKind::Accent,
            BeatKind::Accent => BeatKind::Medium,
            BeatKind::Medium => BeatKind::Normal,
        }
    }

    pub fn is_audible(self) -> bool {
        self != BeatKind::Silence
    }

    /// Single-letter form used by the CLI pattern syntax.
    pub fn symbol(self) -> char {
        match self {
            BeatKind::Normal => 'N',
            BeatKind::Silence => 'S',
            BeatKind::Accent => 'A',
            BeatKind::Medium => 'M',
        }
    }

    pub fn from_symbol(symbol: char) -> Option<Self> {
        match symbol.to_ascii_uppercase() {
            'N' => Some(BeatKind::Normal),
            'S' | '-' => Some(BeatKind::Silence),
            'A' => Some(BeatKind::Accent),
            'M' => Some(BeatKind::Medium),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            BeatKind::Normal => "normal",
            BeatKind::Silence => "silence",
            BeatKind::Accent => "accent",
            BeatKind::Medium => "medium",
        }
    }
}

impl fmt::Display for BeatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Ordered beat kinds, played cyclically.
///
/// An empty pattern is representable; the scheduler refuses to start on one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BeatPattern {
    beats: Vec<BeatKind>,
}

impl BeatPattern {
    pub fn new(beats: Vec<BeatKind>) -> Self {
        Self { beats }
    }

    pub fn len(&self) -> usize {
        self.beats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.beats.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<BeatKind> {
        self.beats.get(index).copied()
    }

    pub fn beats(&self) -> &[BeatKind] {
        &self.beats
    }
}

impl From<Vec<BeatKind>> for BeatPattern {
    fn from(beats: Vec<BeatKind>) -> Self {
        Self::new(beats)
    }
}

impl fmt::Display for BeatPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for beat in &self.beats {
            write!(f, "{}", beat.symbol())?;
        }
        Ok(())
    }
}

/// Unknown letter in a textual pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsePatternError {
    pub symbol: char,
    pub position: usize,
}

impl fmt::Display for ParsePatternError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid beat symbol '{}' at position {} (expected A, N, M, S or -)",
            self.symbol, self.position
        )
    }
}

impl std::error::Error for ParsePatternError {}

impl FromStr for BeatPattern {
    type Err = ParsePatternError;

    /// Parses letters like `"ANNM"`; whitespace is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.chars()
            .filter(|c| !c.is_whitespace())
            .enumerate()
            .map(|(position, symbol)| {
                BeatKind::from_symbol(symbol).ok_or(ParsePatternError { symbol, position })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(BeatPattern::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordinal_order() {
        for (i, kind) in BeatKind::ALL.iter().enumerate() {
            assert_eq!(kind.ordinal() as usize, i);
            assert_eq!(BeatKind::from_ordinal(i as u8), Some(*kind));
        }
        assert_eq!(BeatKind::from_ordinal(4), None);
    }

    #[test]
    fn test_cycle_returns_to_start() {
        let mut kind = BeatKind::Normal;
        let mut seen = Vec::new();
        for _ in 0..4 {
            seen.push(kind);
            kind = kind.next();
        }
        assert_eq!(kind, BeatKind::Normal);
        assert_eq!(
            seen,
            vec![
                BeatKind::Normal,
                BeatKind::Silence,
                BeatKind::Accent,
                BeatKind::Medium
            ]
        );
    }

    #[test]
    fn test_parse_pattern() {
        let pattern: BeatPattern = "A n m -S".parse().unwrap();
        assert_eq!(
            pattern.beats(),
            &[
                BeatKind::Accent,
                BeatKind::Normal,
                BeatKind::Medium,
                BeatKind::Silence,
                BeatKind::Silence
            ]
        );
        assert_eq!(pattern.to_string(), "ANMSS");
    }

    #[test]
    fn test_parse_rejects_unknown_symbol() {
        let err = "ANX".parse::<BeatPattern>().unwrap_err();
        assert_eq!(
            err,
            ParsePatternError {
                symbol: 'X',
                position: 2
            }
        );
    }

    #[test]
    fn test_empty_pattern_parses() {
        let pattern: BeatPattern = "".parse().unwrap();
        assert!(pattern.is_empty());
        assert_eq!(pattern.get(0), None);
    }

    #[test]
    fn test_serde_transparent() {
        let pattern = BeatPattern::new(vec![BeatKind::Accent, BeatKind::Normal]);
        let json = serde_json::to_string(&pattern).unwrap();
        assert_eq!(json, r#"["Accent","Normal"]"#);
        let parsed: BeatPattern = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, pattern);
    }
}
