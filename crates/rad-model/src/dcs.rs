//! Digital-coded squelch tables

use serde::{Deserialize, Serialize};

/// The 104 standard DCS codes, in ascending octal-digit order
pub static DCS_CODES: &[u16] = &[
    23, 25, 26, 31, 32, 36, 43, 47, 51, 53, 54, 65, 71, 72, 73, 74, 114, 115, 116, 122, 125, 131,
    132, 134, 143, 145, 152, 155, 156, 162, 165, 172, 174, 205, 212, 223, 225, 226, 243, 244, 245,
    246, 251, 252, 255, 261, 263, 265, 266, 271, 274, 306, 311, 315, 325, 331, 332, 343, 346, 351,
    356, 364, 365, 371, 411, 412, 413, 423, 431, 432, 445, 446, 452, 454, 455, 462, 464, 465, 466,
    503, 506, 516, 523, 526, 532, 546, 565, 606, 612, 624, 627, 631, 632, 654, 662, 664, 703, 712,
    723, 731, 732, 734, 743, 754,
];

/// Code used when a memory does not name one
pub const DEFAULT_DCS_CODE: u16 = 23;

/// Returns whether `code` is one of the standard DCS codes
pub fn is_standard_code(code: u16) -> bool {
    DCS_CODES.binary_search(&code).is_ok()
}

/// Transmit/receive inversion of a DCS code pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DcsPolarity {
    /// Normal transmit, normal receive
    #[default]
    NN,
    /// Normal transmit, reversed receive
    NR,
    /// Reversed transmit, normal receive
    RN,
    /// Reversed transmit, reversed receive
    RR,
}

impl DcsPolarity {
    /// Every polarity combination
    pub const ALL: [DcsPolarity; 4] = [Self::NN, Self::NR, Self::RN, Self::RR];

    /// Two-letter form used in memory files and CSV exports
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NN => "NN",
            Self::NR => "NR",
            Self::RN => "RN",
            Self::RR => "RR",
        }
    }
}

impl std::fmt::Display for DcsPolarity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Format a code the way radios display it (`23` -> `023`)
pub fn format_code(code: u16) -> String {
    format!("{:03}", code)
}
