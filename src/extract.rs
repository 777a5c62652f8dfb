use std::sync::LazyLock;

use regex::Regex;
use scraper::Selector;

use crate::formats::Outcome;
use crate::page::ParsedPage;

static STATUS_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("Статус защиты").expect("valid status label"));
static COMMITTEE_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("Диссертационный совет:").expect("valid committee label"));
static SPECIALITY_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("Специальность:").expect("valid speciality label"));
static UPLOAD_DATE_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new("Дата размещения диссертации:").expect("valid upload date label")
});
static DEFENCE_DATE_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("Дата защиты:").expect("valid defence date label"));
static DOWNLOAD_TEXT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("(?i)скачать").expect("valid download text"));

const WRAPPER: &str = "div.dissertation__wrapper";
const DESCRIPTION: &str = "section.dissertation-description";
const HEADING: &str = "h2.dissertation-heading";
const PERSON_CARD: &str = "h3.person__card-heading";

static WRAPPER_SELECTOR: LazyLock<Selector> = LazyLock::new(|| selector(WRAPPER));
static DESCRIPTION_SELECTOR: LazyLock<Selector> = LazyLock::new(|| selector(DESCRIPTION));
static HEADING_SELECTOR: LazyLock<Selector> = LazyLock::new(|| selector(HEADING));
static PERSON_CARD_SELECTOR: LazyLock<Selector> = LazyLock::new(|| selector(PERSON_CARD));

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("valid structural selector")
}

pub const STATUS_SUCCESSFUL: &str = "успешная";
pub const STATUS_NEGATIVE: &str = "отрицательное решение";

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("page has no `{element}` inside `{section}`")]
    MissingElement {
        section: &'static str,
        element: &'static str,
    },

    #[error("unknown defence status: {0:?}")]
    UnknownStatus(String),
}

/// Maps the status label through the closed vocabulary.
pub fn status(page: &mut ParsedPage) -> Result<Outcome, ExtractError> {
    match page.take_labelled(&STATUS_LABEL).as_deref() {
        None | Some("") => Ok(Outcome::Unknown),
        Some(STATUS_SUCCESSFUL) => Ok(Outcome::Successful),
        Some(STATUS_NEGATIVE) => Ok(Outcome::Unsuccessful),
        Some(other) => Err(ExtractError::UnknownStatus(other.to_owned())),
    }
}

/// Short code of the committee, i.e. the last space-delimited token.
pub fn committee(page: &mut ParsedPage) -> Option<String> {
    let raw = page.take_labelled(&COMMITTEE_LABEL)?;
    raw.rsplit(' ').next().map(str::to_owned)
}

/// Classification code: the first line, without a trailing period.
pub fn speciality(page: &mut ParsedPage) -> Option<String> {
    let raw = page.take_labelled(&SPECIALITY_LABEL)?;
    let first_line = raw.split('\n').next().unwrap_or_default().trim_end();
    Some(
        first_line
            .strip_suffix('.')
            .unwrap_or(first_line)
            .to_owned(),
    )
}

pub fn upload_date(page: &mut ParsedPage) -> Option<String> {
    page.take_labelled(&UPLOAD_DATE_LABEL)
}

pub fn defence_date(page: &mut ParsedPage) -> Option<String> {
    page.take_labelled(&DEFENCE_DATE_LABEL)
}

pub fn title(page: &ParsedPage) -> Result<String, ExtractError> {
    page.structural_text(&WRAPPER_SELECTOR, &HEADING_SELECTOR)
        .map(|text| capitalize(&text))
        .ok_or(ExtractError::MissingElement {
            section: WRAPPER,
            element: HEADING,
        })
}

pub fn author(page: &ParsedPage) -> Result<String, ExtractError> {
    page.structural_text(&DESCRIPTION_SELECTOR, &PERSON_CARD_SELECTOR)
        .ok_or(ExtractError::MissingElement {
            section: DESCRIPTION,
            element: PERSON_CARD,
        })
}

pub fn supervisor(page: &ParsedPage) -> Result<String, ExtractError> {
    page.structural_text(&WRAPPER_SELECTOR, &PERSON_CARD_SELECTOR)
        .ok_or(ExtractError::MissingElement {
            section: WRAPPER,
            element: PERSON_CARD,
        })
}

/// First-stage download link as written on the record page (may be relative).
pub fn download_link(page: &ParsedPage) -> Option<String> {
    page.find_link(|text, href| {
        DOWNLOAD_TEXT.is_match(text) || href.to_ascii_lowercase().ends_with(".pdf")
    })
}

/// Second-stage link: the second `"`-delimited field of the last script.
pub fn script_link(page: &ParsedPage) -> Option<String> {
    let script = page.last_script_text()?;
    let link = script.split('"').nth(1)?.trim();
    (!link.is_empty()).then(|| link.to_owned())
}

/// Upper-cases the first character and lower-cases the rest.
pub fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(body: &str) -> ParsedPage {
        ParsedPage::parse(&format!("<!doctype html><html><body>{body}</body></html>"))
    }

    #[test]
    fn status_maps_closed_vocabulary() {
        let mut ok = page("<p><strong>Статус защиты:</strong> успешная</p>");
        assert_eq!(status(&mut ok).ok(), Some(Outcome::Successful));

        let mut negative = page("<p><strong>Статус защиты:</strong> отрицательное решение</p>");
        assert_eq!(status(&mut negative).ok(), Some(Outcome::Unsuccessful));

        let mut empty = page("<p><strong>Статус защиты:</strong> </p>");
        assert_eq!(status(&mut empty).ok(), Some(Outcome::Unknown));

        let mut absent = page("<p>nothing here</p>");
        assert_eq!(status(&mut absent).ok(), Some(Outcome::Unknown));
    }

    #[test]
    fn status_outside_vocabulary_is_an_error() {
        let mut odd = page("<p><strong>Статус защиты:</strong> перенесена</p>");
        let err = status(&mut odd).expect_err("unknown status must fail");
        assert!(matches!(err, ExtractError::UnknownStatus(ref value) if value == "перенесена"));
    }

    #[test]
    fn committee_keeps_trailing_code() {
        let mut p = page("<p><strong>Диссертационный совет:</strong> ABC 24.05.03</p>");
        assert_eq!(committee(&mut p), Some("24.05.03".to_owned()));
        assert_eq!(committee(&mut p), None);
    }

    #[test]
    fn speciality_keeps_first_line_without_period() {
        let mut p = page("<p><strong>Специальность:</strong> 05.13.17.\n(other text)</p>");
        assert_eq!(speciality(&mut p), Some("05.13.17".to_owned()));

        let mut plain = page("<p><strong>Специальность:</strong> 2.3.5</p>");
        assert_eq!(speciality(&mut plain), Some("2.3.5".to_owned()));
    }

    #[test]
    fn dates_are_returned_raw() {
        let mut p = page(
            "<p><strong>Дата размещения диссертации:</strong> 01.01.2020</p>\
             <p><strong>Дата защиты:</strong> 15.01.2020</p>",
        );
        assert_eq!(upload_date(&mut p), Some("01.01.2020".to_owned()));
        assert_eq!(defence_date(&mut p), Some("15.01.2020".to_owned()));
    }

    #[test]
    fn structural_fields_follow_their_sections() -> anyhow::Result<()> {
        let p = page(
            r#"<div class="dissertation__wrapper">
                 <h2 class="dissertation-heading">  on something </h2>
                 <h3 class="person__card-heading">Petrov P. P.</h3>
               </div>
               <section class="dissertation-description">
                 <h3 class="person__card-heading">Ivanov I. I.</h3>
               </section>"#,
        );
        assert_eq!(title(&p)?, "On something");
        assert_eq!(supervisor(&p)?, "Petrov P. P.");
        assert_eq!(author(&p)?, "Ivanov I. I.");
        Ok(())
    }

    #[test]
    fn missing_structural_field_is_hard_failure() {
        let p = page("<div class=\"dissertation__wrapper\"></div>");
        assert!(matches!(
            title(&p),
            Err(ExtractError::MissingElement { element: HEADING, .. })
        ));
        assert!(author(&p).is_err());
    }

    #[test]
    fn download_links_resolve_in_two_stages() {
        let record_page = page(r#"<a href="/about">About</a><a href="/files/42">Скачать диссертацию</a>"#);
        assert_eq!(download_link(&record_page), Some("/files/42".to_owned()));

        let redirect_page = page(
            r#"<script>init();</script><script>location.href = "https://cdn.example/42.pdf";</script>"#,
        );
        assert_eq!(
            script_link(&redirect_page),
            Some("https://cdn.example/42.pdf".to_owned())
        );
        assert_eq!(script_link(&page("<script>noop()</script>")), None);
    }

    #[test]
    fn capitalize_matches_sentence_case() {
        assert_eq!(capitalize("on something"), "On something");
        assert_eq!(capitalize("МЕТОДЫ анализа"), "Методы анализа");
        assert_eq!(capitalize(""), "");
    }
}
