use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub font_family: String,
    pub background: String,
    pub card_background: String,
    pub card_stroke: String,
    pub photo_placeholder: String,
    pub separator: String,
    pub link_color: String,
    pub union_dot: String,
    pub text_strong: String,
    pub text_soft: String,
    pub accent: String,
    pub pin_ring: String,
    pub badge_background: String,
    pub badge_text: String,
}

impl Theme {
    pub fn parchment() -> Self {
        Self {
            font_family: "system-ui, -apple-system, Segoe UI, Roboto, Arial, sans-serif"
                .to_string(),
            background: "#F6EFE3".to_string(),
            card_background: "#FFFBF4".to_string(),
            card_stroke: "#CDB89A".to_string(),
            photo_placeholder: "#E9DCC6".to_string(),
            separator: "rgba(78,57,40,0.18)".to_string(),
            link_color: "#8A6E52".to_string(),
            union_dot: "#6B4F36".to_string(),
            text_strong: "#3B2A1C".to_string(),
            text_soft: "#7A6450".to_string(),
            accent: "#A0522D".to_string(),
            pin_ring: "#FFFFFF".to_string(),
            badge_background: "#6B4F36".to_string(),
            badge_text: "#FFFFFF".to_string(),
        }
    }

    pub fn dusk() -> Self {
        Self {
            font_family: "Inter, Segoe UI, system-ui, -apple-system, sans-serif".to_string(),
            background: "#1E1B18".to_string(),
            card_background: "#2A2621".to_string(),
            card_stroke: "#4A4238".to_string(),
            photo_placeholder: "#3A342C".to_string(),
            separator: "rgba(240,225,200,0.14)".to_string(),
            link_color: "#B89B7A".to_string(),
            union_dot: "#D8C3A5".to_string(),
            text_strong: "#F2E8D8".to_string(),
            text_soft: "#BFAE96".to_string(),
            accent: "#D98C5F".to_string(),
            pin_ring: "#2A2621".to_string(),
            badge_background: "#D8C3A5".to_string(),
            badge_text: "#1E1B18".to_string(),
        }
    }
}
