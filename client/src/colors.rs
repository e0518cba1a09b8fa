use trajview_shared::AlgorithmId;
use trajview_shared::colors::path_rgb;

/// Format RGBA as a CSS color string.
pub fn rgba_css(r: u8, g: u8, b: u8, a: f64) -> String {
    format!("rgba({r},{g},{b},{a})")
}

/// Path color of an algorithm at the given opacity.
pub fn path_css(id: AlgorithmId, alpha: f64) -> String {
    let (r, g, b) = path_rgb(id);
    rgba_css(r, g, b, alpha)
}
