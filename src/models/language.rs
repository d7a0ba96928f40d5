use serde::{ Deserialize, Serialize };
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Es,
    Fr,
    De,
}

impl Language {
    pub const ALL: [Language; 4] = [Language::En, Language::Es, Language::Fr, Language::De];

    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Es => "es",
            Language::Fr => "fr",
            Language::De => "de",
        }
    }

    /// Native label shown in the language menu.
    pub fn label(&self) -> &'static str {
        match self {
            Language::En => "English",
            Language::Es => "Español",
            Language::Fr => "Français",
            Language::De => "Deutsch",
        }
    }

    pub fn flag(&self) -> &'static str {
        match self {
            Language::En => "🇺🇸",
            Language::Es => "🇪🇸",
            Language::Fr => "🇫🇷",
            Language::De => "🇩🇪",
        }
    }

    /// English name, used when instructing the model.
    pub fn english_name(&self) -> &'static str {
        match self {
            Language::En => "English",
            Language::Es => "Spanish",
            Language::Fr => "French",
            Language::De => "German",
        }
    }

    pub fn is_default(&self) -> bool {
        *self == Language::default()
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unsupported language code: '{0}'")]
pub struct ParseLanguageError(String);

impl FromStr for Language {
    type Err = ParseLanguageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "en" => Ok(Language::En),
            "es" => Ok(Language::Es),
            "fr" => Ok(Language::Fr),
            "de" => Ok(Language::De),
            _ => Err(ParseLanguageError(s.to_string())),
        }
    }
}

/// Serializable entry for the language menu.
#[derive(Debug, Clone, Serialize)]
pub struct LanguageOption {
    pub code: Language,
    pub label: &'static str,
    pub flag: &'static str,
}

pub fn language_options() -> Vec<LanguageOption> {
    Language::ALL.iter()
        .map(|lang| LanguageOption {
            code: *lang,
            label: lang.label(),
            flag: lang.flag(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_codes_case_insensitively() {
        assert_eq!("ES".parse::<Language>(), Ok(Language::Es));
        assert_eq!(" de ".parse::<Language>(), Ok(Language::De));
        assert!("it".parse::<Language>().is_err());
    }

    #[test]
    fn unknown_code_error_names_the_input() {
        let err = "pt".parse::<Language>().unwrap_err();
        assert_eq!(err.to_string(), "Unsupported language code: 'pt'");
    }

    #[test]
    fn english_is_the_default() {
        assert!(Language::default().is_default());
        assert!(!Language::Fr.is_default());
        assert_eq!(serde_json::to_string(&Language::Fr).unwrap(), "\"fr\"");
    }
}
