use super::{Color, DatabaseId, PageId};
use serde::{Deserialize, Serialize};

/// The kind of rich text content.
///
/// Serialized in the upstream shape: a `type` discriminator next to a
/// payload object of the same name (`{"type": "text", "text": {...}}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RichTextType {
    Text { text: TextContent },
    Mention { mention: Mention },
    Equation { equation: EquationData },
}

/// Inline styled text span.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RichTextItem {
    #[serde(flatten)]
    pub text_type: RichTextType,
    pub annotations: Annotations,
    pub plain_text: String,
    pub href: Option<String>,
}

impl RichTextItem {
    /// Create a plain text item, the most common rich text variant.
    pub fn plain_text(text: &str) -> Self {
        Self {
            text_type: RichTextType::Text {
                text: TextContent {
                    content: text.to_string(),
                    link: None,
                },
            },
            annotations: Annotations::default(),
            plain_text: text.to_string(),
            href: None,
        }
    }

    /// Create an inline equation span that has not been rendered yet.
    pub fn equation(expression: &str) -> Self {
        Self {
            text_type: RichTextType::Equation {
                equation: EquationData {
                    expression: expression.to_string(),
                    markup: None,
                },
            },
            annotations: Annotations::default(),
            plain_text: expression.to_string(),
            href: None,
        }
    }

    /// Mutable access to the equation payload when this span is an equation.
    pub fn equation_mut(&mut self) -> Option<&mut EquationData> {
        match &mut self.text_type {
            RichTextType::Equation { equation } => Some(equation),
            _ => None,
        }
    }
}

/// Concatenates the plain text of a rich text array.
pub fn plain_text_of(items: &[RichTextItem]) -> String {
    items.iter().map(|item| item.plain_text.as_str()).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextContent {
    pub content: String,
    pub link: Option<Link>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Annotations {
    pub bold: bool,
    pub italic: bool,
    pub strikethrough: bool,
    pub underline: bool,
    pub code: bool,
    pub color: Color,
}

/// Inline reference to another object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Mention {
    User { name: Option<String> },
    Page { id: PageId },
    Database { id: DatabaseId },
    Date { start: String, end: Option<String> },
    /// Link previews, link mentions and anything else that only has a URL.
    Link { url: String },
}

/// LaTeX source plus its pre-rendered markup.
///
/// `markup` stays `None` until rendering succeeds; the renderer shows an
/// error marker in its place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquationData {
    pub expression: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub markup: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_serializes_in_upstream_shape() {
        let item = RichTextItem::plain_text("hello");
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["type"], "text");
        assert_eq!(json["text"]["content"], "hello");
        assert_eq!(json["plain_text"], "hello");
        assert_eq!(json["annotations"]["color"], "default");

        let back: RichTextItem = serde_json::from_value(json).unwrap();
        assert_eq!(back, item);
    }

    #[test]
    fn test_equation_span_access() {
        let mut item = RichTextItem::equation("x^2");
        item.equation_mut().unwrap().markup = Some("<math/>".to_string());
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["equation"]["markup"], "<math/>");
        assert!(RichTextItem::plain_text("x").equation_mut().is_none());
    }

    #[test]
    fn test_plain_text_of_concatenates() {
        let items = vec![
            RichTextItem::plain_text("Hello, "),
            RichTextItem::plain_text("world"),
        ];
        assert_eq!(plain_text_of(&items), "Hello, world");
        assert_eq!(plain_text_of(&[]), "");
    }
}
