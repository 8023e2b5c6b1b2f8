use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::color::Color;
use crate::error::{DrawError, DrawResult};
use crate::suggest::{suggest, MAX_SUGGESTIONS};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StyleField {
    LineColor,
    LineThickness,
    LineStyle,
    TextColor,
    TextFillColor,
    TextFontSize,
    TextFont,
    PointsColor,
    PointsSize,
    PointsOutlineColor,
    PointsOutlineThickness,
    BoxFillColor,
    BoxTextAnchor,
    BoxTextInside,
    ArrowColor,
    ArrowThickness,
    ArrowAngle,
    ArrowFillColor,
    MaskColor,
}

impl StyleField {
    pub const ALL: [StyleField; 19] = [
        Self::LineColor,
        Self::LineThickness,
        Self::LineStyle,
        Self::TextColor,
        Self::TextFillColor,
        Self::TextFontSize,
        Self::TextFont,
        Self::PointsColor,
        Self::PointsSize,
        Self::PointsOutlineColor,
        Self::PointsOutlineThickness,
        Self::BoxFillColor,
        Self::BoxTextAnchor,
        Self::BoxTextInside,
        Self::ArrowColor,
        Self::ArrowThickness,
        Self::ArrowAngle,
        Self::ArrowFillColor,
        Self::MaskColor,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Self::LineColor => "line_color",
            Self::LineThickness => "line_thickness",
            Self::LineStyle => "line_style",
            Self::TextColor => "text_color",
            Self::TextFillColor => "text_fill_color",
            Self::TextFontSize => "text_font_size",
            Self::TextFont => "text_font",
            Self::PointsColor => "points_color",
            Self::PointsSize => "points_size",
            Self::PointsOutlineColor => "points_outline_color",
            Self::PointsOutlineThickness => "points_outline_thickness",
            Self::BoxFillColor => "box_fill_color",
            Self::BoxTextAnchor => "box_text_anchor",
            Self::BoxTextInside => "box_text_inside",
            Self::ArrowColor => "arrow_color",
            Self::ArrowThickness => "arrow_thickness",
            Self::ArrowAngle => "arrow_angle",
            Self::ArrowFillColor => "arrow_fill_color",
            Self::MaskColor => "mask_color",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::LineColor => "line color",
            Self::LineThickness => "line thickness",
            Self::LineStyle => "line style",
            Self::TextColor => "text color",
            Self::TextFillColor => "text fill color",
            Self::TextFontSize => "text font size",
            Self::TextFont => "text font",
            Self::PointsColor => "points color",
            Self::PointsSize => "points size",
            Self::PointsOutlineColor => "points outline color",
            Self::PointsOutlineThickness => "points outline thickness",
            Self::BoxFillColor => "box fill color",
            Self::BoxTextAnchor => "box text anchor",
            Self::BoxTextInside => "box text inside",
            Self::ArrowColor => "arrow color",
            Self::ArrowThickness => "arrow thickness",
            Self::ArrowAngle => "arrow angle",
            Self::ArrowFillColor => "arrow fill color",
            Self::MaskColor => "mask color",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        let normalized = normalize_key(key);
        Self::ALL
            .into_iter()
            .find(|field| field.key() == normalized)
    }
}

fn normalize_key(key: &str) -> String {
    key.trim().split_whitespace().collect::<Vec<_>>().join("_")
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Unset,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Color(Color),
}

impl AttrValue {
    fn is_transparent_sentinel(&self) -> bool {
        matches!(self, Self::Text(text) if text == "transparent")
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for AttrValue {
    fn from(value: i32) -> Self {
        Self::Int(value as i64)
    }
}

impl From<u32> for AttrValue {
    fn from(value: u32) -> Self {
        Self::Int(value as i64)
    }
}

impl From<f64> for AttrValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<f32> for AttrValue {
    fn from(value: f32) -> Self {
        Self::Float(value as f64)
    }
}

impl From<Color> for AttrValue {
    fn from(value: Color) -> Self {
        Self::Color(value)
    }
}

impl From<(u8, u8, u8)> for AttrValue {
    fn from(value: (u8, u8, u8)) -> Self {
        Self::Color(value.into())
    }
}

impl From<(u8, u8, u8, u8)> for AttrValue {
    fn from(value: (u8, u8, u8, u8)) -> Self {
        Self::Color(value.into())
    }
}

impl<T: Into<AttrValue>> From<Option<T>> for AttrValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Unset, Into::into)
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Attributes(Vec<(String, AttrValue)>);

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, key: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.0.push((key.into(), value.into()));
        self
    }

    pub fn from_json(value: Value) -> DrawResult<Self> {
        let Value::Object(map) = value else {
            return Err(DrawError::InvalidValue {
                field: "attributes",
                reason: "expected a JSON object".to_string(),
            });
        };
        let mut entries = Vec::with_capacity(map.len());
        for (key, raw) in map {
            let value: AttrValue = serde_json::from_value(raw)?;
            entries.push((key, value));
        }
        Ok(Self(entries))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
        self.0.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<AttrValue>> FromIterator<(K, V)> for Attributes {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownField {
    pub key: String,
    pub suggestions: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct StyleParameters {
    name: String,
    line_color: Option<AttrValue>,
    line_thickness: Option<AttrValue>,
    line_style: Option<AttrValue>,
    text_color: Option<AttrValue>,
    text_fill_color: Option<AttrValue>,
    text_font_size: Option<AttrValue>,
    text_font: Option<AttrValue>,
    points_color: Option<AttrValue>,
    points_size: Option<AttrValue>,
    points_outline_color: Option<AttrValue>,
    points_outline_thickness: Option<AttrValue>,
    box_fill_color: Option<AttrValue>,
    box_text_anchor: Option<AttrValue>,
    box_text_inside: Option<AttrValue>,
    arrow_color: Option<AttrValue>,
    arrow_thickness: Option<AttrValue>,
    arrow_angle: Option<AttrValue>,
    arrow_fill_color: Option<AttrValue>,
    mask_color: Option<AttrValue>,
}

impl StyleParameters {
    pub fn new(name: impl Into<String>, attributes: &Attributes) -> (Self, Vec<UnknownField>) {
        let mut style = Self {
            name: name.into(),
            ..Self::default()
        };
        let unknown = style.update(attributes);
        (style, unknown)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Merges `attributes` into the style. Fields not named keep their value.
    pub fn update(&mut self, attributes: &Attributes) -> Vec<UnknownField> {
        let mut unknown = Vec::new();
        for (key, value) in attributes.iter() {
            let value = if value.is_transparent_sentinel() {
                AttrValue::Color(Color::TRANSPARENT)
            } else {
                value.clone()
            };

            match StyleField::from_key(key) {
                Some(field) => {
                    *self.slot_mut(field) = match value {
                        AttrValue::Unset => None,
                        other => Some(other),
                    };
                }
                None => {
                    let suggestions = suggest_fields(key);
                    log::warn!(target: "style", "field {key} not found");
                    log::warn!(target: "style", "maybe you meant: {}", suggestions.join(", "));
                    unknown.push(UnknownField {
                        key: key.to_string(),
                        suggestions,
                    });
                }
            }
        }
        unknown
    }

    pub fn get(&self, field: StyleField) -> Option<&AttrValue> {
        self.slot(field).as_ref()
    }

    pub fn is_set(&self, field: StyleField) -> bool {
        self.slot(field).is_some()
    }

    pub fn color(&self, field: StyleField) -> DrawResult<Option<Color>> {
        match self.get(field) {
            None => Ok(None),
            Some(AttrValue::Color(color)) => Ok(Some(*color)),
            Some(AttrValue::Text(name)) => Color::named(name)
                .map(Some)
                .ok_or_else(|| invalid(field, format!("unknown color '{name}'"))),
            Some(other) => Err(invalid(field, format!("expected a color, got {other:?}"))),
        }
    }

    pub fn integer(&self, field: StyleField) -> DrawResult<Option<u32>> {
        match self.get(field) {
            None => Ok(None),
            Some(AttrValue::Int(value)) => u32::try_from(*value)
                .map(Some)
                .map_err(|_| invalid(field, format!("expected a non-negative integer, got {value}"))),
            Some(AttrValue::Float(value)) if *value >= 0.0 && value.fract() == 0.0 => {
                Ok(Some(*value as u32))
            }
            Some(other) => Err(invalid(
                field,
                format!("expected a non-negative integer, got {other:?}"),
            )),
        }
    }

    pub fn number(&self, field: StyleField) -> DrawResult<Option<f32>> {
        match self.get(field) {
            None => Ok(None),
            Some(AttrValue::Int(value)) => Ok(Some(*value as f32)),
            Some(AttrValue::Float(value)) => Ok(Some(*value as f32)),
            Some(other) => Err(invalid(field, format!("expected a number, got {other:?}"))),
        }
    }

    pub fn flag(&self, field: StyleField) -> DrawResult<Option<bool>> {
        match self.get(field) {
            None => Ok(None),
            Some(AttrValue::Bool(value)) => Ok(Some(*value)),
            Some(other) => Err(invalid(field, format!("expected true/false, got {other:?}"))),
        }
    }

    pub fn text(&self, field: StyleField) -> DrawResult<Option<&str>> {
        match self.get(field) {
            None => Ok(None),
            Some(AttrValue::Text(value)) => Ok(Some(value.as_str())),
            Some(other) => Err(invalid(field, format!("expected text, got {other:?}"))),
        }
    }

    pub fn to_json(&self) -> DrawResult<Map<String, Value>> {
        let mut map = Map::new();
        for field in StyleField::ALL {
            if let Some(value) = self.get(field) {
                map.insert(field.label().to_string(), serde_json::to_value(value)?);
            }
        }
        Ok(map)
    }

    fn slot(&self, field: StyleField) -> &Option<AttrValue> {
        match field {
            StyleField::LineColor => &self.line_color,
            StyleField::LineThickness => &self.line_thickness,
            StyleField::LineStyle => &self.line_style,
            StyleField::TextColor => &self.text_color,
            StyleField::TextFillColor => &self.text_fill_color,
            StyleField::TextFontSize => &self.text_font_size,
            StyleField::TextFont => &self.text_font,
            StyleField::PointsColor => &self.points_color,
            StyleField::PointsSize => &self.points_size,
            StyleField::PointsOutlineColor => &self.points_outline_color,
            StyleField::PointsOutlineThickness => &self.points_outline_thickness,
            StyleField::BoxFillColor => &self.box_fill_color,
            StyleField::BoxTextAnchor => &self.box_text_anchor,
            StyleField::BoxTextInside => &self.box_text_inside,
            StyleField::ArrowColor => &self.arrow_color,
            StyleField::ArrowThickness => &self.arrow_thickness,
            StyleField::ArrowAngle => &self.arrow_angle,
            StyleField::ArrowFillColor => &self.arrow_fill_color,
            StyleField::MaskColor => &self.mask_color,
        }
    }

    fn slot_mut(&mut self, field: StyleField) -> &mut Option<AttrValue> {
        match field {
            StyleField::LineColor => &mut self.line_color,
            StyleField::LineThickness => &mut self.line_thickness,
            StyleField::LineStyle => &mut self.line_style,
            StyleField::TextColor => &mut self.text_color,
            StyleField::TextFillColor => &mut self.text_fill_color,
            StyleField::TextFontSize => &mut self.text_font_size,
            StyleField::TextFont => &mut self.text_font,
            StyleField::PointsColor => &mut self.points_color,
            StyleField::PointsSize => &mut self.points_size,
            StyleField::PointsOutlineColor => &mut self.points_outline_color,
            StyleField::PointsOutlineThickness => &mut self.points_outline_thickness,
            StyleField::BoxFillColor => &mut self.box_fill_color,
            StyleField::BoxTextAnchor => &mut self.box_text_anchor,
            StyleField::BoxTextInside => &mut self.box_text_inside,
            StyleField::ArrowColor => &mut self.arrow_color,
            StyleField::ArrowThickness => &mut self.arrow_thickness,
            StyleField::ArrowAngle => &mut self.arrow_angle,
            StyleField::ArrowFillColor => &mut self.arrow_fill_color,
            StyleField::MaskColor => &mut self.mask_color,
        }
    }
}

fn suggest_fields(key: &str) -> Vec<String> {
    let normalized = normalize_key(key);
    suggest(
        StyleField::ALL.iter().map(|field| field.key()),
        &normalized,
        MAX_SUGGESTIONS,
    )
    .into_iter()
    .map(|name| name.replace('_', " ").trim().to_string())
    .collect()
}

fn invalid(field: StyleField, reason: String) -> DrawError {
    DrawError::InvalidValue {
        field: field.label(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{AttrValue, Attributes, StyleField, StyleParameters};
    use crate::color::Color;

    fn sample() -> StyleParameters {
        let attributes = Attributes::new()
            .set("line color", "blue")
            .set("line_thickness", 3)
            .set("text font size", 20);
        let (style, unknown) = StyleParameters::new("first", &attributes);
        assert!(unknown.is_empty());
        style
    }

    #[test]
    fn space_and_underscore_spellings_match() {
        let style = sample();
        assert_eq!(style.color(StyleField::LineColor).unwrap(), Some(Color::rgb(0, 0, 255)));
        assert_eq!(style.integer(StyleField::LineThickness).unwrap(), Some(3));
        assert!(!style.is_set(StyleField::BoxFillColor));
    }

    #[test]
    fn update_merges_named_fields_only() {
        let mut style = sample();
        let before = style.clone();
        style.update(&Attributes::new().set("text color", "yellow"));

        for field in StyleField::ALL {
            if field == StyleField::TextColor {
                continue;
            }
            assert_eq!(style.get(field), before.get(field), "{field:?} changed");
        }
        assert_eq!(
            style.get(StyleField::TextColor),
            Some(&AttrValue::Text("yellow".to_string()))
        );
    }

    #[test]
    fn unset_clears_a_field() {
        let mut style = sample();
        style.update(&Attributes::new().set("line color", None::<&str>));
        assert!(!style.is_set(StyleField::LineColor));
    }

    #[test]
    fn transparent_is_normalized_for_every_field() {
        let attributes: Attributes = StyleField::ALL
            .iter()
            .map(|field| (field.label(), "transparent"))
            .collect();
        let (style, unknown) = StyleParameters::new("clear", &attributes);
        assert!(unknown.is_empty());
        for field in StyleField::ALL {
            assert_eq!(
                style.get(field),
                Some(&AttrValue::Color(Color::TRANSPARENT)),
                "{field:?}"
            );
        }
    }

    #[test]
    fn unknown_field_is_dropped_with_suggestions() {
        let mut style = sample();
        let before = style.clone();
        let unknown = style.update(&Attributes::new().set("line colr", "red"));

        assert_eq!(style, before);
        assert_eq!(unknown.len(), 1);
        assert_eq!(unknown[0].key, "line colr");
        assert!(unknown[0].suggestions.len() <= 3);
        assert_eq!(unknown[0].suggestions[0], "line color");
        for suggestion in &unknown[0].suggestions {
            assert!(StyleField::from_key(suggestion).is_some());
        }
    }

    #[test]
    fn malformed_values_fail_on_read() {
        let (style, _) = StyleParameters::new(
            "bad",
            &Attributes::new()
                .set("line color", 4)
                .set("line thickness", -2)
                .set("text color", "no-such-color"),
        );
        assert!(style.color(StyleField::LineColor).is_err());
        assert!(style.integer(StyleField::LineThickness).is_err());
        assert!(style.color(StyleField::TextColor).is_err());
    }

    #[test]
    fn json_attributes_round_trip_through_set_fields() {
        let attributes = Attributes::from_json(json!({
            "mask color": [0, 220, 0],
            "box text inside": true,
            "points size": 2.5,
            "box fill color": null,
        }))
        .expect("json attributes");
        let (style, _) = StyleParameters::new("json", &attributes);

        assert_eq!(style.color(StyleField::MaskColor).unwrap(), Some(Color::rgb(0, 220, 0)));
        assert_eq!(style.flag(StyleField::BoxTextInside).unwrap(), Some(true));
        assert_eq!(style.number(StyleField::PointsSize).unwrap(), Some(2.5));

        let dumped = style.to_json().expect("dump");
        assert_eq!(dumped.len(), 3);
        assert!(!dumped.contains_key("box fill color"));
    }
}
