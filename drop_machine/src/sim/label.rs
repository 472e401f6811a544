//! Block height labels handed to the texture renderer.

/// Ask the renderer to redraw the dynamic texture owned by block slot
/// `texture_slot` with `text`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LabelRequest {
    pub texture_slot: usize,
    pub text: String,
}

/// `1234567` → `"1,234,567"`.
pub fn format_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Heights arrive as magnitudes; round to the nearest whole block.
pub fn height_label(magnitude: f64) -> String {
    format_thousands(magnitude.max(0.0).round() as u64)
}
