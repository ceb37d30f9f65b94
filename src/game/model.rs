//! Game Snapshot
//!
//! Read-only view of a game as fetched at session start. Records coming
//! from storage are converted into these types once; after that nothing in
//! the session mutates them.

use crate::geo::distance_meters;
use crate::map::{MapPos, Size};

/// How a mission gets unlocked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TriggerMethod {
    #[default]
    Qr,
    Gps,
    Ar,
}

impl TriggerMethod {
    pub fn label(&self) -> &'static str {
        match self {
            TriggerMethod::Qr => "QR",
            TriggerMethod::Gps => "GPS",
            TriggerMethod::Ar => "AR",
        }
    }
}

/// What the mission card shows once unlocked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissionType {
    /// Read-only message
    Information,
    /// Free-text question
    #[default]
    ShortAnswer,
    /// Question with listed choices, answered by typing the choice
    MultipleChoice,
}

impl MissionType {
    pub fn is_answerable(&self) -> bool {
        !matches!(self, MissionType::Information)
    }
}

/// Stored gps fields. Any of them may be missing in authored data.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GpsFields {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub radius_m: Option<f64>,
}

/// A complete geofence
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geofence {
    pub lat: f64,
    pub lon: f64,
    pub radius_m: f64,
}

impl GpsFields {
    /// All three fields present, finite and non-zero.
    ///
    /// Zero counts as missing: authored data uses 0 for "not set", which
    /// also rules out targets exactly on the equator or prime meridian.
    pub fn geofence(&self) -> Option<Geofence> {
        let usable = |v: Option<f64>| v.filter(|v| v.is_finite() && *v != 0.0);
        Some(Geofence {
            lat: usable(self.lat)?,
            lon: usable(self.lon)?,
            radius_m: usable(self.radius_m)?,
        })
    }
}

impl Geofence {
    pub fn distance_from(&self, lat: f64, lon: f64) -> f64 {
        distance_meters(lat, lon, self.lat, self.lon)
    }
}

/// Hint shown on a locked mission card
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Hint {
    pub text: String,
    pub image_url: Option<String>,
}

/// Card content once unlocked
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MissionContent {
    /// Information missions
    pub message: String,
    pub info_image_url: Option<String>,
    /// Answerable missions
    pub question: String,
    pub question_image_url: Option<String>,
    pub correct_answer: String,
    pub correct_message: String,
    pub wrong_message: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Mission {
    /// Position in the game
    pub index: usize,
    pub title: String,
    pub trigger_method: TriggerMethod,
    /// Exact payload a QR scan must decode to
    pub qr_code: String,
    pub gps: Option<GpsFields>,
    pub ar_target_index: Option<u32>,
    pub ar_image_url: Option<String>,
    /// No position means no pin on the map
    pub map_pos: Option<MapPos>,
    pub mission_type: MissionType,
    pub content: MissionContent,
    pub hint: Hint,
}

impl Mission {
    /// Title, or "Mission N" (1-based) when untitled
    pub fn display_title(&self) -> String {
        if self.title.trim().is_empty() {
            format!("Mission {}", self.index + 1)
        } else {
            self.title.clone()
        }
    }

    pub fn geofence(&self) -> Option<Geofence> {
        self.gps.and_then(|g| g.geofence())
    }

    /// Target index inside the compiled AR descriptor. Missions compiled
    /// before per-mission indices existed use their own position.
    pub fn ar_target(&self) -> u32 {
        self.ar_target_index.unwrap_or(self.index as u32)
    }
}

/// Map image of a game
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GameMap {
    pub image_url: String,
    /// Natural pixel size; `None` until probed from the image itself
    pub natural_size: Option<Size>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Game {
    pub id: Option<String>,
    pub title: String,
    pub intro: String,
    pub cover_image: Option<String>,
    pub map: Option<GameMap>,
    pub missions: Vec<Mission>,
    pub final_message: String,
}

impl Game {
    pub fn mission(&self, index: usize) -> Option<&Mission> {
        self.missions.get(index)
    }

    pub fn mission_count(&self) -> usize {
        self.missions.len()
    }

    pub fn has_gps_missions(&self) -> bool {
        self.missions.iter().any(|m| m.trigger_method == TriggerMethod::Gps)
    }

    /// Missions unlocked by walking into a geofence
    pub fn gps_missions(&self) -> impl Iterator<Item = &Mission> {
        self.missions
            .iter()
            .filter(|m| m.trigger_method == TriggerMethod::Gps)
    }

    /// First mission whose QR code equals the payload exactly
    pub fn find_by_qr(&self, payload: &str) -> Option<usize> {
        self.missions.iter().position(|m| m.qr_code == payload)
    }
}
