//! Template variable resolution.
//!
//! Turns a [`LessonConfig`] into the flat set of values that `<%= name %>`
//! tokens are replaced with. Every variable has a fallback, so resolution
//! never fails:
//!
//! ```text
//! title        → "Untitled Lesson"
//! description  → "An interactive online lesson."
//! keywords     → "lesson, education, training"
//! copyright_year, year → current year
//! month        → current month name
//! created, modified    → today (YYYY-MM-DD)
//! ```
//!
//! Localized chrome text (copyright notice, "produced by", "back to top",
//! legal notices) comes from [`Phrases`] for the lesson [`Language`]. Only
//! English, Spanish and French are supported; every other language code
//! resolves to English.

use crate::config::LessonConfig;
use chrono::{Datelike, Local, NaiveDate};
use std::collections::BTreeMap;
use std::fmt;

pub const DEFAULT_TITLE: &str = "Untitled Lesson";
pub const DEFAULT_DESCRIPTION: &str = "An interactive online lesson.";
pub const DEFAULT_KEYWORDS: &str = "lesson, education, training";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Language {
    #[default]
    English,
    Spanish,
    French,
}

impl Language {
    pub const ALL: [Language; 3] = [Language::English, Language::Spanish, Language::French];

    /// Resolve a language code. Only the primary subtag matters
    /// (`es-MX` is Spanish); unknown codes are English.
    pub fn from_code(code: &str) -> Self {
        let primary = code.trim().split(['-', '_']).next().unwrap_or_default();
        Self::ALL
            .into_iter()
            .find(|lang| lang.code().eq_ignore_ascii_case(primary))
            .unwrap_or_default()
    }

    pub fn code(self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Spanish => "es",
            Language::French => "fr",
        }
    }

    pub fn phrases(self) -> &'static Phrases {
        match self {
            Language::English => &ENGLISH,
            Language::Spanish => &SPANISH,
            Language::French => &FRENCH,
        }
    }
}

/// Fixed, language-specific chrome text.
#[derive(Debug, PartialEq, Eq)]
pub struct Phrases {
    pub copyright_notice: &'static str,
    pub produced_by: &'static str,
    pub back_to_top: &'static str,
    pub legal_notices_text: &'static str,
    pub legal_notices_url: &'static str,
    /// Shown in generated pages where authored content is not embedded.
    pub content_placeholder: &'static str,
    pub months: [&'static str; 12],
}

static ENGLISH: Phrases = Phrases {
    copyright_notice: "All rights reserved.",
    produced_by: "Produced by",
    back_to_top: "Back to top",
    legal_notices_text: "Legal notices",
    legal_notices_url: "https://creativecommons.org/licenses/by-nc-sa/4.0/deed.en",
    content_placeholder: "Unit content goes here.",
    months: [
        "January", "February", "March", "April", "May", "June", "July", "August",
        "September", "October", "November", "December",
    ],
};

static SPANISH: Phrases = Phrases {
    copyright_notice: "Todos los derechos reservados.",
    produced_by: "Producido por",
    back_to_top: "Volver arriba",
    legal_notices_text: "Avisos legales",
    legal_notices_url: "https://creativecommons.org/licenses/by-nc-sa/4.0/deed.es",
    content_placeholder: "El contenido de la unidad va aquí.",
    months: [
        "enero", "febrero", "marzo", "abril", "mayo", "junio", "julio", "agosto",
        "septiembre", "octubre", "noviembre", "diciembre",
    ],
};

static FRENCH: Phrases = Phrases {
    copyright_notice: "Tous droits réservés.",
    produced_by: "Produit par",
    back_to_top: "Haut de la page",
    legal_notices_text: "Avis juridiques",
    legal_notices_url: "https://creativecommons.org/licenses/by-nc-sa/4.0/deed.fr",
    content_placeholder: "Le contenu de l'unité va ici.",
    months: [
        "janvier", "février", "mars", "avril", "mai", "juin", "juillet", "août",
        "septembre", "octobre", "novembre", "décembre",
    ],
};

/// Every variable a template may reference with `<%= name %>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Variable {
    Title,
    Description,
    Keywords,
    Language,
    LessonId,
    Path,
    Theme,
    Month,
    Year,
    Version,
    Created,
    Modified,
    CopyrightYear,
    CoverCredit,
    CustomPageTitle,
    Variant,
    UnitCount,
    CopyrightNotice,
    ProducedBy,
    BackToTop,
    LegalNoticesText,
    LegalNoticesUrl,
}

impl Variable {
    pub const ALL: [Variable; 22] = [
        Variable::Title,
        Variable::Description,
        Variable::Keywords,
        Variable::Language,
        Variable::LessonId,
        Variable::Path,
        Variable::Theme,
        Variable::Month,
        Variable::Year,
        Variable::Version,
        Variable::Created,
        Variable::Modified,
        Variable::CopyrightYear,
        Variable::CoverCredit,
        Variable::CustomPageTitle,
        Variable::Variant,
        Variable::UnitCount,
        Variable::CopyrightNotice,
        Variable::ProducedBy,
        Variable::BackToTop,
        Variable::LegalNoticesText,
        Variable::LegalNoticesUrl,
    ];

    /// Token name as written in templates.
    pub fn name(self) -> &'static str {
        match self {
            Variable::Title => "title",
            Variable::Description => "description",
            Variable::Keywords => "keywords",
            Variable::Language => "language",
            Variable::LessonId => "lesson_id",
            Variable::Path => "path",
            Variable::Theme => "theme",
            Variable::Month => "month",
            Variable::Year => "year",
            Variable::Version => "version",
            Variable::Created => "created",
            Variable::Modified => "modified",
            Variable::CopyrightYear => "copyright_year",
            Variable::CoverCredit => "cover_credit",
            Variable::CustomPageTitle => "custom_page_title",
            Variable::Variant => "variant",
            Variable::UnitCount => "unit_count",
            Variable::CopyrightNotice => "copyright_notice",
            Variable::ProducedBy => "produced_by",
            Variable::BackToTop => "back_to_top",
            Variable::LegalNoticesText => "legal_notices_text",
            Variable::LegalNoticesUrl => "legal_notices_url",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.name() == name)
    }
}

/// A resolved variable value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Text(String),
    Number(i64),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => f.write_str(s),
            Value::Number(n) => write!(f, "{n}"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

/// The fully-resolved variable set for one export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variables {
    language: Language,
    values: BTreeMap<Variable, Value>,
}

impl Variables {
    pub fn get(&self, variable: Variable) -> &Value {
        // resolve_variables_at inserts every Variable
        &self.values[&variable]
    }

    /// Display string of a variable.
    pub fn text(&self, variable: Variable) -> String {
        self.get(variable).to_string()
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn phrases(&self) -> &'static Phrases {
        self.language.phrases()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Variable, &Value)> {
        self.values.iter().map(|(k, v)| (*k, v))
    }

    /// Every variable as a JSON object keyed by token name.
    ///
    /// Server-side templates read values from this instead of having them
    /// pasted into string literals.
    pub fn to_json(&self) -> serde_json::Value {
        let map = self
            .iter()
            .map(|(variable, value)| {
                let json = match value {
                    Value::Text(s) => serde_json::Value::from(s.as_str()),
                    Value::Number(n) => serde_json::Value::from(*n),
                };
                (variable.name().to_string(), json)
            })
            .collect::<serde_json::Map<_, _>>();
        serde_json::Value::Object(map)
    }
}

/// Resolve every variable using today's local date for defaults.
pub fn resolve_variables(config: &LessonConfig) -> Variables {
    resolve_variables_at(config, Local::now().date_naive())
}

/// Resolve every variable with an explicit "today".
pub fn resolve_variables_at(config: &LessonConfig, today: NaiveDate) -> Variables {
    let language = Language::from_code(&config.language);
    let phrases = language.phrases();
    let publication = &config.publication;
    let today_iso = today.format("%Y-%m-%d").to_string();
    let current_year = i64::from(today.year());

    let or = |value: &str, fallback: &str| -> Value {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            fallback.into()
        } else {
            trimmed.into()
        }
    };

    let year = match publication.year.trim().parse::<i64>() {
        Ok(y) => Value::Number(y),
        Err(_) if publication.year.trim().is_empty() => Value::Number(current_year),
        Err(_) => publication.year.trim().into(),
    };
    let month_name = phrases.months[today.month0() as usize];

    let mut values = BTreeMap::new();
    let mut set = |variable: Variable, value: Value| {
        values.insert(variable, value);
    };

    set(Variable::Title, or(&config.title, DEFAULT_TITLE));
    set(Variable::Description, or(&config.description, DEFAULT_DESCRIPTION));
    set(Variable::Keywords, or(&config.keywords, DEFAULT_KEYWORDS));
    set(Variable::Language, language.code().into());
    set(Variable::LessonId, or(&config.lesson_id, "lesson"));
    set(Variable::Path, or(&config.path, "./"));
    set(Variable::Theme, or(&config.theme, "default"));
    set(Variable::Month, or(&publication.month, month_name));
    set(Variable::Year, year);
    set(Variable::Version, or(&publication.version, "1.0"));
    set(Variable::Created, or(&publication.created, &today_iso));
    set(Variable::Modified, or(&publication.modified, &today_iso));
    set(
        Variable::CopyrightYear,
        Value::Number(config.copyright_year.map_or(current_year, i64::from)),
    );
    set(
        Variable::CoverCredit,
        or(config.cover_credit.as_deref().unwrap_or_default(), ""),
    );
    set(
        Variable::CustomPageTitle,
        or(config.custom_page_title.as_deref().unwrap_or_default(), "Custom Page"),
    );
    set(Variable::Variant, config.variant.as_str().into());
    set(Variable::UnitCount, Value::Number(config.pages.pages().len() as i64));
    set(Variable::CopyrightNotice, phrases.copyright_notice.into());
    set(Variable::ProducedBy, phrases.produced_by.into());
    set(Variable::BackToTop, phrases.back_to_top.into());
    set(Variable::LegalNoticesText, phrases.legal_notices_text.into());
    set(Variable::LegalNoticesUrl, phrases.legal_notices_url.into());

    Variables { language, values }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TemplateVariant;
    use crate::test_helpers::{page_tree, sample_config};

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 14).unwrap()
    }

    #[test]
    fn json_keeps_quotes_and_numbers() {
        let config = LessonConfig {
            title: "L'onde de tempête".into(),
            language: "fr".into(),
            ..LessonConfig::default()
        };
        let json = resolve_variables_at(&config, day()).to_json();
        assert_eq!(json["title"], "L'onde de tempête");
        assert_eq!(json["year"], 2025);
        assert_eq!(json["language"], "fr");
        assert_eq!(json.as_object().unwrap().len(), Variable::ALL.len());
    }

    #[test]
    fn every_variable_is_resolved() {
        let vars = resolve_variables_at(&LessonConfig::default(), day());
        for variable in Variable::ALL {
            // Indexing panics on a missing variable
            let _ = vars.get(variable);
        }
        assert_eq!(vars.iter().count(), Variable::ALL.len());
    }

    #[test]
    fn variable_names_round_trip() {
        for variable in Variable::ALL {
            assert_eq!(Variable::parse(variable.name()), Some(variable));
        }
        assert_eq!(Variable::parse("Title"), None);
    }

    #[test]
    fn empty_config_uses_fallbacks() {
        let vars = resolve_variables_at(&LessonConfig::default(), day());
        assert_eq!(vars.text(Variable::Title), DEFAULT_TITLE);
        assert_eq!(vars.text(Variable::Description), DEFAULT_DESCRIPTION);
        assert_eq!(vars.text(Variable::Keywords), DEFAULT_KEYWORDS);
        assert_eq!(vars.get(Variable::CopyrightYear), &Value::Number(2025));
        assert_eq!(vars.get(Variable::Year), &Value::Number(2025));
        assert_eq!(vars.text(Variable::Month), "March");
        assert_eq!(vars.text(Variable::Created), "2025-03-14");
        assert_eq!(vars.text(Variable::Modified), "2025-03-14");
        assert_eq!(vars.text(Variable::Language), "en");
        assert_eq!(vars.text(Variable::CustomPageTitle), "Custom Page");
        assert_eq!(vars.text(Variable::CoverCredit), "");
    }

    #[test]
    fn copyright_year_defaults_to_current_year() {
        let vars = resolve_variables(&LessonConfig::default());
        let year = i64::from(Local::now().year());
        assert_eq!(vars.get(Variable::CopyrightYear), &Value::Number(year));
    }

    #[test]
    fn whitespace_only_fields_use_fallbacks() {
        let mut config = LessonConfig::default();
        config.title = "  ".into();
        let vars = resolve_variables_at(&config, day());
        assert_eq!(vars.text(Variable::Title), DEFAULT_TITLE);
    }

    #[test]
    fn configured_values_win() {
        let mut config = sample_config();
        config.copyright_year = Some(2019);
        config.publication.year = "2020".into();
        config.publication.month = "June".into();
        config.variant = TemplateVariant::Standard;
        let vars = resolve_variables_at(&config, day());
        assert_eq!(vars.text(Variable::Title), "Storm Surge Basics");
        assert_eq!(vars.get(Variable::CopyrightYear), &Value::Number(2019));
        assert_eq!(vars.get(Variable::Year), &Value::Number(2020));
        assert_eq!(vars.text(Variable::Month), "June");
        assert_eq!(vars.text(Variable::Variant), "standard");
    }

    #[test]
    fn non_numeric_year_kept_as_text() {
        let mut config = LessonConfig::default();
        config.publication.year = "2024-2025".into();
        let vars = resolve_variables_at(&config, day());
        assert_eq!(vars.get(Variable::Year), &Value::Text("2024-2025".into()));
    }

    #[test]
    fn unit_count_counts_top_level_pages() {
        let mut config = LessonConfig::default();
        config.pages = page_tree(&[("A", &["A1"]), ("B", &[])]);
        let vars = resolve_variables_at(&config, day());
        assert_eq!(vars.get(Variable::UnitCount), &Value::Number(2));
    }

    #[test]
    fn language_codes() {
        assert_eq!(Language::from_code("es"), Language::Spanish);
        assert_eq!(Language::from_code("es-MX"), Language::Spanish);
        assert_eq!(Language::from_code("FR"), Language::French);
        assert_eq!(Language::from_code("fr_CA"), Language::French);
        assert_eq!(Language::from_code("de"), Language::English);
        assert_eq!(Language::from_code(""), Language::English);
    }

    #[test]
    fn localized_phrases() {
        let mut config = LessonConfig::default();
        config.language = "fr".into();
        let vars = resolve_variables_at(&config, day());
        assert_eq!(vars.text(Variable::BackToTop), "Haut de la page");
        assert_eq!(vars.text(Variable::Month), "mars");
        assert_eq!(vars.text(Variable::Language), "fr");

        config.language = "es".into();
        let vars = resolve_variables_at(&config, day());
        assert_eq!(vars.text(Variable::ProducedBy), "Producido por");
        assert!(vars.text(Variable::LegalNoticesUrl).ends_with("deed.es"));
    }

    #[test]
    fn unknown_language_falls_back_to_english() {
        let mut config = LessonConfig::default();
        config.language = "pt".into();
        let vars = resolve_variables_at(&config, day());
        assert_eq!(vars.language(), Language::English);
        assert_eq!(vars.text(Variable::CopyrightNotice), "All rights reserved.");
    }

    #[test]
    fn value_display() {
        assert_eq!(Value::Number(2025).to_string(), "2025");
        assert_eq!(Value::from("x").to_string(), "x");
    }
}
