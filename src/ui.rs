use crate::FieldKey;
use serde::Serialize;

/// One autocomplete candidate from the provider. `value` is what lands in
/// the input when chosen, `display_label` is what the dropdown shows.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SuggestionEntry {
    pub display_label: String,
    pub value: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// Transient toast-style notification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub text: String,
    pub level: NoticeLevel,
    pub timeout_ms: Option<u64>,
}

impl Notice {
    pub fn info(text: impl Into<String>, timeout_ms: u64) -> Self {
        Notice {
            text: text.into(),
            level: NoticeLevel::Info,
            timeout_ms: Some(timeout_ms),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Notice {
            text: text.into(),
            level: NoticeLevel::Error,
            timeout_ms: None,
        }
    }
}

/// One selectable row of the route alternatives list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RouteListItem {
    pub index: usize,
    /// 1-based label, "Route 3".
    pub label: String,
    pub distance: String,
    pub duration: String,
    pub active: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RouteListView {
    pub items: Vec<RouteListItem>,
}

/// Rendering side of the widget. Implementations draw into whatever hosts
/// the controls; the controller only pushes view models and never reads the
/// DOM back.
pub trait UiSink {
    fn set_field_text(&mut self, field: FieldKey, text: &str);
    fn render_dropdown(&mut self, field: FieldKey, entries: &[SuggestionEntry]);
    fn hide_dropdown(&mut self, field: FieldKey);
    fn render_route_list(&mut self, view: &RouteListView);
    fn clear_route_list(&mut self);
    fn notify(&mut self, notice: Notice);
}

/// Escapes text interpolated into popup or dropdown HTML.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<b>"A & B"</b>"#),
            "&lt;b&gt;&quot;A &amp; B&quot;&lt;/b&gt;"
        );
        assert_eq!(escape_html("plain"), "plain");
    }

    #[test]
    fn test_notice_constructors() {
        let info = Notice::info("Route built", 2000);
        assert_eq!(info.level, NoticeLevel::Info);
        assert_eq!(info.timeout_ms, Some(2000));
        let error = Notice::error("boom");
        assert_eq!(error.level, NoticeLevel::Error);
        assert_eq!(error.timeout_ms, None);
    }
}
