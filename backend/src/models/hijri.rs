//! Months of the Islamic (Hijri) calendar.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A Hijri calendar month, numbered 1 (Muharram) to 12 (Dhu al-Hijjah).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IslamicMonth {
    Muharram,
    Safar,
    RabiAlAwwal,
    RabiAlThani,
    JumadaAlUla,
    JumadaAlAkhirah,
    Rajab,
    Shaban,
    Ramadan,
    Shawwal,
    DhuAlQadah,
    DhuAlHijjah,
}

impl IslamicMonth {
    pub const ALL: [IslamicMonth; 12] = [
        IslamicMonth::Muharram,
        IslamicMonth::Safar,
        IslamicMonth::RabiAlAwwal,
        IslamicMonth::RabiAlThani,
        IslamicMonth::JumadaAlUla,
        IslamicMonth::JumadaAlAkhirah,
        IslamicMonth::Rajab,
        IslamicMonth::Shaban,
        IslamicMonth::Ramadan,
        IslamicMonth::Shawwal,
        IslamicMonth::DhuAlQadah,
        IslamicMonth::DhuAlHijjah,
    ];

    pub fn from_number(number: u8) -> Option<Self> {
        number
            .checked_sub(1)
            .and_then(|idx| Self::ALL.get(idx as usize))
            .copied()
    }

    pub fn number(self) -> u8 {
        self as u8 + 1
    }

    /// Transliterated name, ASCII only.
    pub fn name(self) -> &'static str {
        match self {
            IslamicMonth::Muharram => "Muharram",
            IslamicMonth::Safar => "Safar",
            IslamicMonth::RabiAlAwwal => "Rabi al-Awwal",
            IslamicMonth::RabiAlThani => "Rabi al-Thani",
            IslamicMonth::JumadaAlUla => "Jumada al-Ula",
            IslamicMonth::JumadaAlAkhirah => "Jumada al-Akhirah",
            IslamicMonth::Rajab => "Rajab",
            IslamicMonth::Shaban => "Shaban",
            IslamicMonth::Ramadan => "Ramadan",
            IslamicMonth::Shawwal => "Shawwal",
            IslamicMonth::DhuAlQadah => "Dhu al-Qadah",
            IslamicMonth::DhuAlHijjah => "Dhu al-Hijjah",
        }
    }
}

impl fmt::Display for IslamicMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_numbering() {
        assert_eq!(IslamicMonth::from_number(1), Some(IslamicMonth::Muharram));
        assert_eq!(IslamicMonth::from_number(9), Some(IslamicMonth::Ramadan));
        assert_eq!(IslamicMonth::from_number(12), Some(IslamicMonth::DhuAlHijjah));
        assert_eq!(IslamicMonth::from_number(0), None);
        assert_eq!(IslamicMonth::from_number(13), None);

        for (idx, month) in IslamicMonth::ALL.iter().enumerate() {
            assert_eq!(month.number() as usize, idx + 1);
            assert!(month.name().is_ascii());
        }
    }
}
