use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ModelError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difficulty::Beginner => write!(f, "beginner"),
            Difficulty::Intermediate => write!(f, "intermediate"),
            Difficulty::Advanced => write!(f, "advanced"),
        }
    }
}

impl FromStr for Difficulty {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "beginner" => Ok(Difficulty::Beginner),
            "intermediate" => Ok(Difficulty::Intermediate),
            "advanced" => Ok(Difficulty::Advanced),
            _ => Err(ModelError::InvalidDifficulty(s.to_string())),
        }
    }
}

/// Who can see a shared plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Private,
    Friends,
    Public,
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Visibility::Private => write!(f, "private"),
            Visibility::Friends => write!(f, "friends"),
            Visibility::Public => write!(f, "public"),
        }
    }
}

impl FromStr for Visibility {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "private" => Ok(Visibility::Private),
            "friends" => Ok(Visibility::Friends),
            "public" => Ok(Visibility::Public),
            _ => Err(ModelError::InvalidVisibility(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_difficulty_display() {
        assert_eq!(format!("{}", Difficulty::Beginner), "beginner");
        assert_eq!(format!("{}", Difficulty::Intermediate), "intermediate");
        assert_eq!(format!("{}", Difficulty::Advanced), "advanced");
    }

    #[test]
    fn test_difficulty_from_str() {
        assert_eq!(
            Difficulty::from_str("ADVANCED").unwrap(),
            Difficulty::Advanced
        );
        assert!(Difficulty::from_str("expert").is_err());
    }

    #[test]
    fn test_visibility_from_str() {
        assert_eq!(Visibility::from_str("Public").unwrap(), Visibility::Public);
        assert_eq!(
            Visibility::from_str("friends").unwrap(),
            Visibility::Friends
        );
        assert!(Visibility::from_str("").is_err());
    }

    #[test]
    fn test_visibility_json() {
        let json = serde_json::to_string(&Visibility::Friends).unwrap();
        assert_eq!(json, "\"friends\"");
    }
}
