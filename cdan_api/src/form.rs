//! Detection and extraction of the auto-submitting progress form.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

static FORM_BY_NAME: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"form[name="ProgressForm"]"#).expect("static form selector is valid")
});
static FORM_BY_ID: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("form#ProgressForm").expect("static form selector is valid")
});
static FIELD_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("input, textarea").expect("static field selector is valid")
});

/// A progress form the service embeds to chain a job to its result page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntermediateForm {
    /// The form's `action` attribute, unresolved. `None` when absent, in
    /// which case the form posts back to the job endpoint.
    pub action: Option<String>,
    /// Named fields in document order. A repeated name keeps its first
    /// position and its last value.
    pub fields: Vec<(String, String)>,
}

impl IntermediateForm {
    /// Finds the progress form in `html`, matching by `name` first and by
    /// `id` second. Returns `None` when the page carries no such form.
    pub fn extract(html: &str) -> Option<Self> {
        let doc = Html::parse_document(html);
        let form = doc
            .select(&FORM_BY_NAME)
            .next()
            .or_else(|| doc.select(&FORM_BY_ID).next())?;

        let action = form
            .value()
            .attr("action")
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .map(str::to_string);

        let mut fields: Vec<(String, String)> = Vec::new();
        for element in form.select(&FIELD_SELECTOR) {
            let Some(name) = element.value().attr("name").filter(|n| !n.is_empty()) else {
                continue;
            };
            let value = field_value(&element);
            match fields.iter_mut().find(|(existing, _)| existing == name) {
                Some(slot) => slot.1 = value,
                None => fields.push((name.to_string(), value)),
            }
        }

        Some(Self { action, fields })
    }

    /// Value of a named field, if the form carries it.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

fn field_value(element: &ElementRef<'_>) -> String {
    if element.value().name() == "textarea" {
        element.text().collect()
    } else {
        element.value().attr("value").unwrap_or_default().to_string()
    }
}
