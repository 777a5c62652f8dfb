use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

static LABEL_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("strong").expect("valid label selector"));
static ANCHOR_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("valid anchor selector"));
static SCRIPT_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("script").expect("valid script selector"));

/// One registry page parsed into a queryable tree.
///
/// Labelled values are read with [`ParsedPage::take_labelled`], which removes
/// the label node from the tree. A label can therefore be read once per page.
pub struct ParsedPage {
    html: Html,
}

impl ParsedPage {
    pub fn parse(markup: &str) -> Self {
        Self {
            html: Html::parse_document(markup),
        }
    }

    /// Finds the first `<strong>` label whose text matches `label`, detaches it
    /// from its container and returns the container's remaining trimmed text.
    ///
    /// Returns `None` when no label matches, including when the label was
    /// already consumed by an earlier call.
    pub fn take_labelled(&mut self, label: &Regex) -> Option<String> {
        let (label_id, container_id) = {
            let node = self
                .html
                .select(&LABEL_SELECTOR)
                .find(|el| label.is_match(&el.text().collect::<String>()))?;
            (node.id(), node.parent()?.id())
        };

        self.html.tree.get_mut(label_id)?.detach();

        let container = ElementRef::wrap(self.html.tree.get(container_id)?)?;
        Some(container.text().collect::<String>().trim().to_owned())
    }

    /// Trimmed text of the first `element` inside the first `section`.
    pub fn structural_text(&self, section: &Selector, element: &Selector) -> Option<String> {
        let section = self.html.select(section).next()?;
        let element = section.select(element).next()?;
        Some(element.text().collect::<String>().trim().to_owned())
    }

    /// `href` of the first anchor accepted by `accept(text, href)`.
    pub fn find_link(&self, accept: impl Fn(&str, &str) -> bool) -> Option<String> {
        self.html.select(&ANCHOR_SELECTOR).find_map(|anchor| {
            let href = anchor.value().attr("href")?;
            let text = anchor.text().collect::<String>();
            accept(text.trim(), href).then(|| href.trim().to_owned())
        })
    }

    /// Raw text of the last `<script>` element on the page.
    pub fn last_script_text(&self) -> Option<String> {
        self.html
            .select(&SCRIPT_SELECTOR)
            .last()
            .map(|script| script.text().collect::<String>())
    }
}
