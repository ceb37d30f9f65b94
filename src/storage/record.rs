//! Game Records
//!
//! The stored shape of a game, as served by the game API and as kept in
//! local files: camelCase keys, `_id`, missions under `steps`. Authored data
//! is loose (numbers sometimes arrive as strings, text fields as null), so
//! these types accept that and `Game::from` turns them into the strict
//! snapshot used by the session.

use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

use crate::game::{Game, GameMap, GpsFields, Hint, Mission, MissionContent, MissionType, TriggerMethod};
use crate::map::{MapPos, Size};

// ============================================================================
// Lenient field helpers
// ============================================================================

struct LooseNumber;

impl<'de> Visitor<'de> for LooseNumber {
    type Value = Option<f64>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a number, a numeric string or null")
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        Ok(Some(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(Some(v as f64))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(Some(v as f64))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        Ok(v.trim().parse().ok())
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_some<D: Deserializer<'de>>(self, d: D) -> Result<Self::Value, D::Error> {
        d.deserialize_any(LooseNumber)
    }
}

struct LooseText;

impl<'de> Visitor<'de> for LooseText {
    type Value = String;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a string or null")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        Ok(v.to_string())
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
        Ok(v)
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(String::new())
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(String::new())
    }

    fn visit_some<D: Deserializer<'de>>(self, d: D) -> Result<Self::Value, D::Error> {
        d.deserialize_any(LooseText)
    }
}

/// Number, numeric string, or null/missing
fn loose_f64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    d.deserialize_any(LooseNumber)
}

/// Text, with null read as empty
fn loose_string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    d.deserialize_any(LooseText)
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.filter(|s| !s.trim().is_empty())
}

// ============================================================================
// Records
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GameRecord {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(deserialize_with = "loose_string")]
    pub title: String,
    #[serde(deserialize_with = "loose_string")]
    pub intro: String,
    pub cover_image: Option<String>,
    pub map: Option<MapRecord>,
    pub steps: Vec<StepRecord>,
    #[serde(deserialize_with = "loose_string")]
    pub final_message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MapRecord {
    #[serde(deserialize_with = "loose_string")]
    pub image_url: String,
    /// 0 or missing when the builder never measured the image
    #[serde(deserialize_with = "loose_f64")]
    pub width: Option<f64>,
    #[serde(deserialize_with = "loose_f64")]
    pub height: Option<f64>,
}

/// How a stored pin position should be read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MapPosKind {
    Normalized,
    Pixel,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapPosRecord {
    #[serde(deserialize_with = "loose_f64")]
    pub x: Option<f64>,
    #[serde(deserialize_with = "loose_f64")]
    pub y: Option<f64>,
    /// Written by migrated data; older records leave it out and are
    /// classified by value range.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<MapPosKind>,
}

impl MapPosRecord {
    pub fn to_map_pos(&self) -> Option<MapPos> {
        let (x, y) = (self.x?, self.y?);
        if !x.is_finite() || !y.is_finite() {
            return None;
        }
        match self.kind {
            Some(MapPosKind::Normalized) => Some(MapPos::Normalized { x, y }),
            Some(MapPosKind::Pixel) => Some(MapPos::LegacyPixel { x, y }),
            None => MapPos::classify(x, y),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GpsRecord {
    #[serde(deserialize_with = "loose_f64")]
    pub lat: Option<f64>,
    #[serde(deserialize_with = "loose_f64")]
    pub lon: Option<f64>,
    #[serde(deserialize_with = "loose_f64")]
    pub radius: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StepRecord {
    #[serde(deserialize_with = "loose_string")]
    pub title: String,
    pub map_pos: Option<MapPosRecord>,
    #[serde(deserialize_with = "loose_string")]
    pub hint_text: String,
    pub hint_image_url: Option<String>,
    pub info_image_url: Option<String>,
    pub question_image_url: Option<String>,
    #[serde(deserialize_with = "loose_string")]
    pub question: String,
    #[serde(deserialize_with = "loose_string")]
    pub correct_answer: String,
    #[serde(deserialize_with = "loose_string")]
    pub correct_message: String,
    #[serde(deserialize_with = "loose_string")]
    pub wrong_message: String,
    #[serde(deserialize_with = "loose_string")]
    pub qr_code: String,
    #[serde(deserialize_with = "loose_string")]
    pub message: String,
    /// "short-answer" | "information" | "multiple-choice"
    #[serde(deserialize_with = "loose_string")]
    pub mission_type: String,
    /// "QR" | "GPS" | "AR"
    #[serde(deserialize_with = "loose_string")]
    pub trigger_method: String,
    pub gps: Option<GpsRecord>,
    #[serde(deserialize_with = "loose_f64")]
    pub ar_target_index: Option<f64>,
    pub ar_image_url: Option<String>,
}

// ============================================================================
// Conversion into the session snapshot
// ============================================================================

fn trigger_method(s: &str) -> TriggerMethod {
    match s.trim().to_ascii_uppercase().as_str() {
        "GPS" => TriggerMethod::Gps,
        "AR" => TriggerMethod::Ar,
        _ => TriggerMethod::Qr,
    }
}

fn mission_type(s: &str) -> MissionType {
    match s.trim() {
        "information" => MissionType::Information,
        "multiple-choice" => MissionType::MultipleChoice,
        _ => MissionType::ShortAnswer,
    }
}

/// Whole, non-negative target indices only
fn target_index(v: Option<f64>) -> Option<u32> {
    v.filter(|v| v.fract() == 0.0 && *v >= 0.0 && *v <= u32::MAX as f64)
        .map(|v| v as u32)
}

impl StepRecord {
    pub fn into_mission(self, index: usize) -> Mission {
        Mission {
            index,
            title: self.title,
            trigger_method: trigger_method(&self.trigger_method),
            qr_code: self.qr_code,
            gps: self.gps.map(|g| GpsFields {
                lat: g.lat,
                lon: g.lon,
                radius_m: g.radius,
            }),
            ar_target_index: target_index(self.ar_target_index),
            ar_image_url: non_empty(self.ar_image_url),
            map_pos: self.map_pos.as_ref().and_then(MapPosRecord::to_map_pos),
            mission_type: mission_type(&self.mission_type),
            content: MissionContent {
                message: self.message,
                info_image_url: non_empty(self.info_image_url),
                question: self.question,
                question_image_url: non_empty(self.question_image_url),
                correct_answer: self.correct_answer,
                correct_message: self.correct_message,
                wrong_message: self.wrong_message,
            },
            hint: Hint {
                text: self.hint_text,
                image_url: non_empty(self.hint_image_url),
            },
        }
    }
}

impl MapRecord {
    fn into_game_map(self) -> Option<GameMap> {
        if self.image_url.trim().is_empty() {
            return None;
        }
        let natural_size = match (self.width, self.height) {
            (Some(w), Some(h)) if w > 0.0 && h > 0.0 => Some(Size::new(w, h)),
            _ => None,
        };
        Some(GameMap {
            image_url: self.image_url,
            natural_size,
        })
    }
}

impl From<GameRecord> for Game {
    fn from(record: GameRecord) -> Self {
        Game {
            id: non_empty(record.id),
            title: record.title,
            intro: record.intro,
            cover_image: non_empty(record.cover_image),
            map: record.map.and_then(MapRecord::into_game_map),
            missions: record
                .steps
                .into_iter()
                .enumerate()
                .map(|(i, step)| step.into_mission(i))
                .collect(),
            final_message: record.final_message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SERVER_JSON: &str = r#"{
        "_id": "65f0c0ffee",
        "title": "Campus Hunt",
        "intro": null,
        "coverImage": "",
        "map": { "imageUrl": "https://cdn/map.png", "width": 0, "height": 0 },
        "steps": [
            {
                "title": "Fountain",
                "triggerMethod": "GPS",
                "gps": { "lat": "10", "lon": 10, "radius": "50" },
                "mapPos": { "x": 0.5, "y": 0.25 },
                "missionType": "information",
                "message": "Look up"
            },
            {
                "triggerMethod": "QR",
                "qrCode": "ABC123",
                "mapPos": { "x": null, "y": null },
                "correctAnswer": "Blue"
            },
            {
                "triggerMethod": "AR",
                "arTargetIndex": 2,
                "mapPos": { "x": 640, "y": 480 }
            }
        ],
        "finalMessage": "Bye",
        "createdAt": "2024-03-01T00:00:00Z"
    }"#;

    #[test]
    fn test_server_shape() {
        let record: GameRecord = serde_json::from_str(SERVER_JSON).unwrap();
        let game = Game::from(record);

        assert_eq!(game.id.as_deref(), Some("65f0c0ffee"));
        assert_eq!(game.intro, "");
        assert_eq!(game.cover_image, None);
        let map = game.map.as_ref().unwrap();
        assert_eq!(map.natural_size, None);
        assert_eq!(game.mission_count(), 3);

        let fountain = &game.missions[0];
        assert_eq!(fountain.trigger_method, TriggerMethod::Gps);
        assert_eq!(fountain.mission_type, MissionType::Information);
        let fence = fountain.geofence().unwrap();
        assert!((fence.lat - 10.0).abs() < 1e-12);
        assert!((fence.radius_m - 50.0).abs() < 1e-12);
        assert_eq!(fountain.map_pos, Some(MapPos::Normalized { x: 0.5, y: 0.25 }));

        let qr = &game.missions[1];
        assert_eq!(qr.qr_code, "ABC123");
        assert_eq!(qr.map_pos, None);
        assert_eq!(qr.mission_type, MissionType::ShortAnswer);
        assert_eq!(qr.display_title(), "Mission 2");

        let ar = &game.missions[2];
        assert_eq!(ar.ar_target(), 2);
        assert_eq!(ar.map_pos, Some(MapPos::LegacyPixel { x: 640.0, y: 480.0 }));
    }

    #[test]
    fn test_explicit_pos_kind() {
        let rec: MapPosRecord = serde_json::from_str(r#"{"x": 1, "y": 1, "kind": "pixel"}"#).unwrap();
        assert_eq!(rec.to_map_pos(), Some(MapPos::LegacyPixel { x: 1.0, y: 1.0 }));

        let rec: MapPosRecord = serde_json::from_str(r#"{"x": 1, "y": 1}"#).unwrap();
        assert_eq!(rec.to_map_pos(), Some(MapPos::Normalized { x: 1.0, y: 1.0 }));
    }

    #[test]
    fn test_bad_numbers_are_missing() {
        let gps: GpsRecord = serde_json::from_str(r#"{"lat": "abc", "lon": null}"#).unwrap();
        assert_eq!(gps.lat, None);
        assert_eq!(gps.lon, None);
        assert_eq!(gps.radius, None);
    }

    #[test]
    fn test_fractional_target_index_falls_back() {
        let step: StepRecord = serde_json::from_str(r#"{"arTargetIndex": 1.5}"#).unwrap();
        let m = step.into_mission(7);
        assert_eq!(m.ar_target_index, None);
        assert_eq!(m.ar_target(), 7);
    }

    #[test]
    fn test_map_size_kept_when_measured() {
        let rec: MapRecord = serde_json::from_str(r#"{"imageUrl": "m.png", "width": 1600, "height": 1200}"#).unwrap();
        let map = rec.into_game_map().unwrap();
        assert_eq!(map.natural_size, Some(Size::new(1600.0, 1200.0)));
    }

    #[test]
    fn test_ron_record() {
        let src = r#"(
            title: "Park",
            steps: [
                (title: "Gate", triggerMethod: "QR", qrCode: "GATE"),
            ],
        )"#;
        let record: GameRecord = ron::from_str(src).unwrap();
        let game = Game::from(record);
        assert_eq!(game.title, "Park");
        assert_eq!(game.missions[0].qr_code, "GATE");
    }
}
