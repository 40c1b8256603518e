// src/enrich/equation.rs
use super::{EnrichError, EquationRenderer};
use latex2mathml::{latex_to_mathml, DisplayStyle};

/// Renders LaTeX to MathML, which browsers display natively.
#[derive(Debug, Clone, Copy, Default)]
pub struct MathMlRenderer;

impl EquationRenderer for MathMlRenderer {
    fn render(&self, latex: &str, display: bool) -> Result<String, EnrichError> {
        let style = if display {
            DisplayStyle::Block
        } else {
            DisplayStyle::Inline
        };
        latex_to_mathml(latex, style).map_err(|e| EnrichError::Render(format!("{latex}: {e}")))
    }
}
