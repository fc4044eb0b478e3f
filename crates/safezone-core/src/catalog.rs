//! Built-in content: the fallback report set, safe spots and safety tips.

use chrono::{DateTime, Duration, Utc};

use crate::models::{
    Coordinate, RawReport, ReportDocument, ReportLocation, ReportRecord, SafeSpot, SafeSpotKind,
    SafetyTip,
};

struct SampleReport {
    id: &'static str,
    category: &'static str,
    place: &'static str,
    minutes_ago: i64,
    description: &'static str,
    verified: bool,
}

const SAMPLE_REPORTS: [SampleReport; 3] = [
    SampleReport {
        id: "1",
        category: "Stalking",
        place: "Near Metro Station",
        minutes_ago: 12,
        description: "A man followed me aggressively on the platform.",
        verified: true,
    },
    SampleReport {
        id: "2",
        category: "Harassment",
        place: "Cafe Lane",
        minutes_ago: 30,
        description: "Verbal abuse reported by 2 users.",
        verified: false,
    },
    SampleReport {
        id: "3",
        category: "Catcalling",
        place: "Park Entrance",
        minutes_ago: 60,
        description: "Two men whistled and shouted at a jogger.",
        verified: true,
    },
];

/// Sample documents relative to `now`, newest first.
pub fn sample_documents(now: DateTime<Utc>) -> Vec<ReportDocument> {
    SAMPLE_REPORTS
        .iter()
        .map(|sample| {
            ReportDocument::new(
                sample.id,
                RawReport {
                    kind: Some(sample.category.to_string()),
                    location: Some(ReportLocation::Place(sample.place.to_string())),
                    description: Some(sample.description.to_string()),
                    verified: Some(sample.verified),
                    timestamp: Some(now - Duration::minutes(sample.minutes_ago)),
                },
            )
        })
        .collect()
}

/// The fixed set shown when live synchronization fails.
pub fn fallback_reports(now: DateTime<Utc>) -> Vec<ReportRecord> {
    sample_documents(now)
        .into_iter()
        .map(|document| ReportRecord::from_document(document, now))
        .collect()
}

/// Nearby safe spots.
pub fn safe_spots() -> Vec<SafeSpot> {
    vec![
        SafeSpot {
            name: "Women Police Station".to_string(),
            kind: SafeSpotKind::Police,
            distance: "1.2 km".to_string(),
            status: "Open 24/7".to_string(),
            coordinate: Coordinate::new(28.6304, 77.2177),
        },
        SafeSpot {
            name: "Safe Shelter Home".to_string(),
            kind: SafeSpotKind::Shelter,
            distance: "0.8 km".to_string(),
            status: "Available".to_string(),
            coordinate: Coordinate::new(28.6219, 77.2090),
        },
        SafeSpot {
            name: "Women Help Center".to_string(),
            kind: SafeSpotKind::HelpCenter,
            distance: "2.1 km".to_string(),
            status: "Open".to_string(),
            coordinate: Coordinate::new(28.6400, 77.2300),
        },
    ]
}

/// General safety advice.
pub fn safety_tips() -> Vec<SafetyTip> {
    [
        (
            "Share Live Location",
            "Keep trusted contacts updated about your whereabouts",
            "location",
        ),
        (
            "Stay Connected",
            "Keep your phone charged and always on",
            "battery-charging",
        ),
        (
            "Use Safe Routes",
            "Stick to well-lit and populated areas",
            "map",
        ),
    ]
    .into_iter()
    .map(|(title, description, icon)| SafetyTip {
        title: title.to_string(),
        description: description.to_string(),
        icon: icon.to_string(),
    })
    .collect()
}
