//! Audit trail event vocabulary.
//!
//! Each event type carries its own typed metadata. The stored form is the
//! pair (`event_type` TEXT, `metadata` JSONB); [`AuditEventKind`] converts
//! between the two with serde's adjacently tagged representation.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::harvest::HarvestType;
use crate::plant::GrowthPhase;
use crate::types::{DbId, Grams};

text_enum! {
    /// Entity an audit event belongs to.
    TrackableType as "trackable type" {
        Harvest => "harvest",
        PlantBatch => "plant_batch",
        Plant => "plant",
    }
}

/// Every audit event the subsystem records, with its metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event_type", content = "metadata", rename_all = "snake_case")]
pub enum AuditEventKind {
    HarvestCreated {
        plant_count: i64,
        harvest_type: HarvestType,
        strain_name: Option<String>,
    },
    HarvestPlantsAdded {
        plant_count: i64,
    },
    HarvestWetWeightRecorded {
        wet_weight_grams: Grams,
    },
    HarvestDryingStarted {
        drying_room: Option<String>,
    },
    HarvestStrainWeightRecorded {
        strain_name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        wet_weight_grams: Option<Grams>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        dry_weight_grams: Option<Grams>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        flower_weight_grams: Option<Grams>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        shake_weight_grams: Option<Grams>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        waste_weight_grams: Option<Grams>,
    },
    HarvestWasteRecorded {
        waste_weight_grams: Grams,
    },
    HarvestDryingFinished {
        days_elapsed: i64,
    },
    HarvestTrimmingStarted {
        days_elapsed: i64,
    },
    HarvestTrimmingFinished {
        days_elapsed: i64,
    },
    HarvestCuringFinished {
        days_elapsed: i64,
    },
    HarvestAdminReviewed {},
    BatchCreated {
        plant_count: i64,
        batch_uid: String,
    },
    PlantMoved {
        from_tray_id: Option<DbId>,
        to_tray_id: DbId,
    },
    PlantPhaseChanged {
        from: GrowthPhase,
        to: GrowthPhase,
    },
    PlantTagged {
        tag: String,
        previous_tag: Option<String>,
    },
    PlantDestroyed {
        reason: Option<String>,
    },
    PlantRemoved {
        reason: Option<String>,
    },
    NoteAdded {},
}

impl AuditEventKind {
    /// The `event_type` column value.
    pub fn event_type(&self) -> &'static str {
        match self {
            AuditEventKind::HarvestCreated { .. } => "harvest_created",
            AuditEventKind::HarvestPlantsAdded { .. } => "harvest_plants_added",
            AuditEventKind::HarvestWetWeightRecorded { .. } => "harvest_wet_weight_recorded",
            AuditEventKind::HarvestDryingStarted { .. } => "harvest_drying_started",
            AuditEventKind::HarvestStrainWeightRecorded { .. } => "harvest_strain_weight_recorded",
            AuditEventKind::HarvestWasteRecorded { .. } => "harvest_waste_recorded",
            AuditEventKind::HarvestDryingFinished { .. } => "harvest_drying_finished",
            AuditEventKind::HarvestTrimmingStarted { .. } => "harvest_trimming_started",
            AuditEventKind::HarvestTrimmingFinished { .. } => "harvest_trimming_finished",
            AuditEventKind::HarvestCuringFinished { .. } => "harvest_curing_finished",
            AuditEventKind::HarvestAdminReviewed {} => "harvest_admin_reviewed",
            AuditEventKind::BatchCreated { .. } => "batch_created",
            AuditEventKind::PlantMoved { .. } => "plant_moved",
            AuditEventKind::PlantPhaseChanged { .. } => "plant_phase_changed",
            AuditEventKind::PlantTagged { .. } => "plant_tagged",
            AuditEventKind::PlantDestroyed { .. } => "plant_destroyed",
            AuditEventKind::PlantRemoved { .. } => "plant_removed",
            AuditEventKind::NoteAdded {} => "note_added",
        }
    }

    /// The `metadata` column value.
    pub fn metadata(&self) -> Value {
        match serde_json::to_value(self) {
            Ok(Value::Object(mut map)) => map.remove("metadata").unwrap_or(Value::Null),
            _ => Value::Null,
        }
    }

    /// Rebuild a typed event from stored columns. `None` when the event
    /// type is unknown or the metadata does not fit it.
    pub fn from_parts(event_type: &str, metadata: &Value) -> Option<Self> {
        let metadata = match metadata {
            Value::Null => Value::Object(Default::default()),
            other => other.clone(),
        };
        serde_json::from_value(serde_json::json!({
            "event_type": event_type,
            "metadata": metadata,
        }))
        .ok()
    }

    /// Short title for timelines.
    pub fn label(&self) -> &'static str {
        match self {
            AuditEventKind::HarvestCreated { .. } => "Harvest created",
            AuditEventKind::HarvestPlantsAdded { .. } => "Plants added",
            AuditEventKind::HarvestWetWeightRecorded { .. } => "Wet weight recorded",
            AuditEventKind::HarvestDryingStarted { .. } => "Drying started",
            AuditEventKind::HarvestStrainWeightRecorded { .. } => "Strain weights recorded",
            AuditEventKind::HarvestWasteRecorded { .. } => "Waste recorded",
            AuditEventKind::HarvestDryingFinished { .. } => "Drying finished",
            AuditEventKind::HarvestTrimmingStarted { .. } => "Trimming started",
            AuditEventKind::HarvestTrimmingFinished { .. } => "Trimming finished",
            AuditEventKind::HarvestCuringFinished { .. } => "Curing finished",
            AuditEventKind::HarvestAdminReviewed {} => "Reviewed by admin",
            AuditEventKind::BatchCreated { .. } => "Batch created",
            AuditEventKind::PlantMoved { .. } => "Plant moved",
            AuditEventKind::PlantPhaseChanged { .. } => "Phase changed",
            AuditEventKind::PlantTagged { .. } => "Plant tagged",
            AuditEventKind::PlantDestroyed { .. } => "Plant destroyed",
            AuditEventKind::PlantRemoved { .. } => "Plant removed",
            AuditEventKind::NoteAdded {} => "Note added",
        }
    }

    /// Human-readable detail line, if the event has one.
    pub fn detail(&self) -> Option<String> {
        match self {
            AuditEventKind::HarvestCreated {
                plant_count,
                harvest_type,
                strain_name,
            } => {
                let kind = match harvest_type {
                    HarvestType::WholePlant => "whole plant",
                    HarvestType::Partial => "partial",
                };
                let plural = if *plant_count == 1 { "" } else { "s" };
                Some(match strain_name {
                    Some(strain) => format!("{plant_count} plant{plural} of {strain} ({kind})"),
                    None => format!("{plant_count} plant{plural} ({kind})"),
                })
            }
            AuditEventKind::HarvestPlantsAdded { plant_count } => {
                Some(format!("{plant_count} more plant(s) added"))
            }
            AuditEventKind::HarvestWetWeightRecorded { wet_weight_grams } => {
                Some(format!("Wet weight: {}", format_grams(*wet_weight_grams)))
            }
            AuditEventKind::HarvestDryingStarted { drying_room } => {
                drying_room.as_ref().map(|room| format!("Drying in {room}"))
            }
            AuditEventKind::HarvestStrainWeightRecorded {
                strain_name,
                wet_weight_grams,
                dry_weight_grams,
                flower_weight_grams,
                shake_weight_grams,
                waste_weight_grams,
            } => {
                let parts: Vec<String> = [
                    ("wet", wet_weight_grams),
                    ("dry", dry_weight_grams),
                    ("flower", flower_weight_grams),
                    ("shake", shake_weight_grams),
                    ("waste", waste_weight_grams),
                ]
                .into_iter()
                .filter_map(|(name, grams)| grams.map(|g| format!("{name} {}", format_grams(g))))
                .collect();
                Some(format!("{strain_name}: {}", parts.join(", ")))
            }
            AuditEventKind::HarvestWasteRecorded { waste_weight_grams } => {
                Some(format!("Waste: {}", format_grams(*waste_weight_grams)))
            }
            AuditEventKind::HarvestDryingFinished { days_elapsed } => {
                Some(format!("Dried for {}", format_days(*days_elapsed)))
            }
            AuditEventKind::HarvestTrimmingStarted { days_elapsed } => Some(format!(
                "Started {} after drying",
                format_days(*days_elapsed)
            )),
            AuditEventKind::HarvestTrimmingFinished { days_elapsed } => {
                Some(format!("Trimmed over {}", format_days(*days_elapsed)))
            }
            AuditEventKind::HarvestCuringFinished { days_elapsed } => {
                Some(format!("Cured for {}", format_days(*days_elapsed)))
            }
            AuditEventKind::HarvestAdminReviewed {} => None,
            AuditEventKind::BatchCreated {
                plant_count,
                batch_uid,
            } => Some(format!("{batch_uid} with {plant_count} plant(s)")),
            AuditEventKind::PlantMoved {
                from_tray_id,
                to_tray_id,
            } => Some(match from_tray_id {
                Some(from) => format!("Tray {from} → Tray {to_tray_id}"),
                None => format!("Placed in Tray {to_tray_id}"),
            }),
            AuditEventKind::PlantPhaseChanged { from, to } => Some(format!("{from} → {to}")),
            AuditEventKind::PlantTagged { tag, previous_tag } => Some(match previous_tag {
                Some(prev) => format!("{tag} (replaces {prev})"),
                None => tag.clone(),
            }),
            AuditEventKind::PlantDestroyed { reason } | AuditEventKind::PlantRemoved { reason } => {
                reason.clone()
            }
            AuditEventKind::NoteAdded {} => None,
        }
    }
}

/// Timeline text for a stored event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedEvent {
    pub label: Option<&'static str>,
    pub detail: Option<String>,
}

/// Render a stored event. Unknown event types and malformed metadata render
/// with neither label nor detail rather than failing.
pub fn render_event(event_type: &str, metadata: &Value) -> RenderedEvent {
    match AuditEventKind::from_parts(event_type, metadata) {
        Some(kind) => RenderedEvent {
            label: Some(kind.label()),
            detail: kind.detail(),
        },
        None => RenderedEvent::default(),
    }
}

fn format_grams(grams: Grams) -> String {
    if grams >= 1000.0 {
        format!("{:.2} kg", grams / 1000.0)
    } else {
        format!("{grams:.1} g")
    }
}

fn format_days(days: i64) -> String {
    if days == 1 {
        "1 day".to_string()
    } else {
        format!("{days} days")
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn event_type_matches_serde_tag() {
        let events = [
            AuditEventKind::HarvestCreated {
                plant_count: 1,
                harvest_type: HarvestType::WholePlant,
                strain_name: Some("Blue Dream".into()),
            },
            AuditEventKind::HarvestAdminReviewed {},
            AuditEventKind::PlantPhaseChanged {
                from: GrowthPhase::Vegetative,
                to: GrowthPhase::Flowering,
            },
            AuditEventKind::NoteAdded {},
        ];
        for event in events {
            let value = serde_json::to_value(&event).unwrap();
            assert_eq!(value["event_type"], event.event_type());
        }
    }

    #[test]
    fn metadata_is_the_variant_payload() {
        let event = AuditEventKind::HarvestCreated {
            plant_count: 1,
            harvest_type: HarvestType::WholePlant,
            strain_name: Some("Blue Dream".into()),
        };
        assert_eq!(
            event.metadata(),
            json!({"plant_count": 1, "harvest_type": "whole_plant", "strain_name": "Blue Dream"})
        );
    }

    #[test]
    fn stored_columns_rebuild_the_event() {
        let kind = AuditEventKind::from_parts("harvest_drying_finished", &json!({"days_elapsed": 9}));
        assert_eq!(kind, Some(AuditEventKind::HarvestDryingFinished { days_elapsed: 9 }));

        let reviewed = AuditEventKind::from_parts("harvest_admin_reviewed", &Value::Null);
        assert_eq!(reviewed, Some(AuditEventKind::HarvestAdminReviewed {}));
    }

    #[test]
    fn unknown_events_render_without_detail() {
        assert_eq!(render_event("label_printed", &json!({"copies": 3})), RenderedEvent::default());
        assert_eq!(
            render_event("harvest_drying_finished", &json!({"days": "x"})),
            RenderedEvent::default()
        );

        let reviewed = render_event("harvest_admin_reviewed", &Value::Null);
        assert_eq!(reviewed.label, Some("Reviewed by admin"));
        assert_eq!(reviewed.detail, None);
    }

    #[test]
    fn details_are_rendered_per_event() {
        let detail = |event_type: &str, metadata: Value| render_event(event_type, &metadata).detail;

        assert_eq!(
            detail(
                "harvest_created",
                json!({"plant_count": 1, "harvest_type": "whole_plant", "strain_name": "Blue Dream"})
            )
            .as_deref(),
            Some("1 plant of Blue Dream (whole plant)")
        );
        assert_eq!(
            detail("harvest_wet_weight_recorded", json!({"wet_weight_grams": 2500.0})).as_deref(),
            Some("Wet weight: 2.50 kg")
        );
        assert_eq!(
            detail(
                "harvest_strain_weight_recorded",
                json!({"strain_name": "OG Kush", "dry_weight_grams": 300.0})
            )
            .as_deref(),
            Some("OG Kush: dry 300.0 g")
        );
        assert_eq!(
            detail("harvest_curing_finished", json!({"days_elapsed": 1})).as_deref(),
            Some("Cured for 1 day")
        );
        assert_eq!(
            detail(
                "plant_tagged",
                json!({"tag": "1A4000000000000000002", "previous_tag": "1A4000000000000000001"})
            )
            .as_deref(),
            Some("1A4000000000000000002 (replaces 1A4000000000000000001)")
        );
    }

    #[test]
    fn trackable_type_round_trips_text() {
        assert_eq!("plant_batch".parse::<TrackableType>().unwrap(), TrackableType::PlantBatch);
        assert_eq!(TrackableType::Harvest.as_str(), "harvest");
    }
}
