use eframe::egui::Color32;

pub trait ColorExt {
    fn parse_hex(hex: &str) -> Option<Self>
    where
        Self: Sized;
}

impl ColorExt for Color32 {
    /// Accepts `#rrggbb` and the CSS shorthand `#rgb`.
    fn parse_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim().trim_start_matches('#');
        if !hex.is_ascii() {
            return None;
        }
        let expanded: String = match hex.len() {
            3 => hex.chars().flat_map(|c| [c, c]).collect(),
            6 => hex.to_string(),
            _ => return None,
        };

        let r = u8::from_str_radix(&expanded[0..2], 16).ok()?;
        let g = u8::from_str_radix(&expanded[2..4], 16).ok()?;
        let b = u8::from_str_radix(&expanded[4..6], 16).ok()?;

        Some(Color32::from_rgb(r, g, b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_shorthand_and_full_forms() {
        assert_eq!(Color32::parse_hex("#d33"), Some(Color32::from_rgb(0xdd, 0x33, 0x33)));
        assert_eq!(Color32::parse_hex("a159e1"), Some(Color32::from_rgb(161, 89, 225)));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(Color32::parse_hex("#12"), None);
        assert_eq!(Color32::parse_hex("#zzzzzz"), None);
    }
}
