use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed table of workflow phases a service is scheduled into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowPhase {
    Vorbereitung,
    Schutz,
    Untergrund,
    Grundierung,
    #[default]
    Beschichtung,
    Nacharbeit,
    Reinigung,
}

impl WorkflowPhase {
    pub const ALL: [Self; 7] = [
        Self::Vorbereitung,
        Self::Schutz,
        Self::Untergrund,
        Self::Grundierung,
        Self::Beschichtung,
        Self::Nacharbeit,
        Self::Reinigung,
    ];

    /// Key as stored in the catalog.
    pub fn key(self) -> &'static str {
        match self {
            Self::Vorbereitung => "vorbereitung",
            Self::Schutz => "schutz",
            Self::Untergrund => "untergrund",
            Self::Grundierung => "grundierung",
            Self::Beschichtung => "beschichtung",
            Self::Nacharbeit => "nacharbeit",
            Self::Reinigung => "reinigung",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Vorbereitung => "Vorbereitung",
            Self::Schutz => "Abdecken & Schützen",
            Self::Untergrund => "Untergrundbehandlung",
            Self::Grundierung => "Grundierung",
            Self::Beschichtung => "Beschichtung",
            Self::Nacharbeit => "Nacharbeiten",
            Self::Reinigung => "Reinigung",
        }
    }

    /// Position in the working day sequence, starting at 1.
    pub fn order(self) -> u8 {
        match self {
            Self::Vorbereitung => 1,
            Self::Schutz => 2,
            Self::Untergrund => 3,
            Self::Grundierung => 4,
            Self::Beschichtung => 5,
            Self::Nacharbeit => 6,
            Self::Reinigung => 7,
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        let key = key.trim();
        Self::ALL
            .into_iter()
            .find(|phase| phase.key().eq_ignore_ascii_case(key))
    }
}

impl fmt::Display for WorkflowPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// How material cost is added on top of labour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaterialType {
    None,
    #[default]
    Percent,
    Fixed,
}

impl MaterialType {
    pub const ALL: [Self; 3] = [Self::None, Self::Percent, Self::Fixed];

    pub fn key(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Percent => "percent",
            Self::Fixed => "fixed",
        }
    }

    /// Accepts the stored keys plus the German words used in the price sheets.
    pub fn from_key(key: &str) -> Option<Self> {
        match key.trim().to_lowercase().as_str() {
            "none" | "keine" | "kein" => Some(Self::None),
            "percent" | "prozent" | "%" => Some(Self::Percent),
            "fixed" | "fest" | "pauschal" => Some(Self::Fixed),
            _ => None,
        }
    }
}

impl fmt::Display for MaterialType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}
