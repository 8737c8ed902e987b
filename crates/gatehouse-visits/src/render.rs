//! Pass rendering contract.
//!
//! The engine treats rendering as an opaque `url -> artifact` function;
//! the default implementation produces an SVG QR code of the scan URL.

use qrcode::QrCode;
use qrcode::render::svg;

use gatehouse_core::{GatehouseError, GatehouseResult};

pub trait PassRenderer: Send + Sync {
    /// Render a scannable artifact for the given URL.
    fn render(&self, url: &str) -> GatehouseResult<String>;
}

/// Renders the scan URL as an SVG QR code.
#[derive(Debug, Clone)]
pub struct QrSvgRenderer {
    min_dimension: u32,
}

impl QrSvgRenderer {
    pub fn new(min_dimension: u32) -> Self {
        Self { min_dimension }
    }
}

impl Default for QrSvgRenderer {
    fn default() -> Self {
        Self::new(300)
    }
}

impl PassRenderer for QrSvgRenderer {
    fn render(&self, url: &str) -> GatehouseResult<String> {
        let code = QrCode::new(url.as_bytes())
            .map_err(|e| GatehouseError::Internal(format!("QR encode: {e}")))?;
        let svg = code
            .render::<svg::Color>()
            .min_dimensions(self.min_dimension, self.min_dimension)
            .dark_color(svg::Color("#000000"))
            .light_color(svg::Color("#ffffff"))
            .build();
        Ok(svg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_svg_markup() {
        let artifact = QrSvgRenderer::default()
            .render("https://app.example.com/scan/vv:id:mac")
            .unwrap();
        assert!(artifact.contains("<svg"));
    }
}
