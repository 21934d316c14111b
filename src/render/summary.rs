//! Structured summaries built from narrowed checklist payloads.

use serde::Serialize;

use super::locale::RenderContext;
use super::payload::{
    ChecklistPayload, HygieneLog, OilChangeLog, PizzaLog, ProductionLog, TemperatureLog,
};
use crate::reports::{percentage, rounded_percent};

/// Shown in place of an absent value.
pub const PLACEHOLDER: &str = "-";

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum StatusMarker {
    Done,
    Pending,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ProbeStatus {
    Recorded,
    Missing,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OilChangeEntry {
    pub date: String,
    pub shift: String,
    pub quantity: String,
    pub oil_type: String,
    pub signature: String,
    pub marker: StatusMarker,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProbeEntry {
    pub probe: String,
    pub status: ProbeStatus,
    /// Reading with unit, e.g. `4°C`; absent when missing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TemperatureBlockView {
    pub date: String,
    pub probes: Vec<ProbeEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inspector: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PizzaSlotView {
    pub time_slot: String,
    pub count: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PizzaTypeView {
    pub pizza_type: String,
    pub slots: Vec<PizzaSlotView>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProductionEntry {
    pub number: String,
    pub weight: String,
    pub batch_number: String,
    pub used_before: String,
    pub delivery: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ZoneView {
    pub name: String,
    pub areas: Vec<String>,
}

/// Presentation-ready summary of one submission.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(
    tag = "layout",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ChecklistSummary {
    OilChangeLog {
        entries: Vec<OilChangeEntry>,
    },
    TemperatureGrid {
        blocks: Vec<TemperatureBlockView>,
    },
    PizzaBatches {
        pizzas: Vec<PizzaTypeView>,
        #[serde(skip_serializing_if = "Option::is_none")]
        total_pizzas: Option<String>,
    },
    ProductionBatches {
        entries: Vec<ProductionEntry>,
    },
    HygieneChecklist {
        zones: Vec<ZoneView>,
        completed_tasks: usize,
        total_tasks: usize,
        completion_percent: u32,
        #[serde(skip_serializing_if = "Option::is_none")]
        manager: Option<String>,
    },
    RawDump {
        json: String,
    },
}

impl ChecklistSummary {
    /// Build the summary for a narrowed payload.
    pub fn build(payload: &ChecklistPayload, ctx: &RenderContext) -> Self {
        match payload {
            ChecklistPayload::OilChange(log) => oil_change(log, ctx),
            ChecklistPayload::Refrigeration(log) => temperature_grid(log, ctx),
            ChecklistPayload::Pizza(log) => pizza_batches(log),
            ChecklistPayload::Production(log) => production_batches(log, ctx),
            ChecklistPayload::Hygiene(log) => hygiene(log),
            ChecklistPayload::Raw(value) => ChecklistSummary::RawDump {
                json: serde_json::to_string_pretty(value).unwrap_or_else(|_| "null".to_string()),
            },
        }
    }

    /// True when there is nothing to show besides the "no entries" notice.
    pub fn is_empty(&self) -> bool {
        match self {
            ChecklistSummary::OilChangeLog { entries } => entries.is_empty(),
            ChecklistSummary::TemperatureGrid { blocks } => blocks.is_empty(),
            ChecklistSummary::PizzaBatches { pizzas, .. } => pizzas.is_empty(),
            ChecklistSummary::ProductionBatches { entries } => entries.is_empty(),
            ChecklistSummary::HygieneChecklist {
                zones, total_tasks, ..
            } => zones.is_empty() && *total_tasks == 0,
            ChecklistSummary::RawDump { json } => matches!(json.as_str(), "null" | "{}" | "[]"),
        }
    }
}

fn or_placeholder(value: Option<&String>) -> String {
    value.cloned().unwrap_or_else(|| PLACEHOLDER.to_string())
}

fn date_or_placeholder(value: Option<&String>, ctx: &RenderContext) -> String {
    value
        .map(|raw| ctx.format_date(raw))
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

fn oil_change(log: &OilChangeLog, ctx: &RenderContext) -> ChecklistSummary {
    let entries = log
        .records
        .iter()
        .map(|record| OilChangeEntry {
            date: date_or_placeholder(record.date.as_ref(), ctx),
            shift: or_placeholder(record.shift.as_ref()),
            quantity: or_placeholder(record.quantity.as_ref()),
            oil_type: or_placeholder(record.oil_type.as_ref()),
            signature: or_placeholder(record.name_signature.as_ref()),
            marker: if record.completed {
                StatusMarker::Done
            } else {
                StatusMarker::Pending
            },
        })
        .collect();

    ChecklistSummary::OilChangeLog { entries }
}

fn temperature_grid(log: &TemperatureLog, ctx: &RenderContext) -> ChecklistSummary {
    let blocks = log
        .blocks
        .iter()
        .map(|block| TemperatureBlockView {
            date: date_or_placeholder(block.date.as_ref(), ctx),
            probes: block
                .readings
                .iter()
                .map(|(probe, reading)| match reading {
                    Some(value) => ProbeEntry {
                        probe: probe.clone(),
                        status: ProbeStatus::Recorded,
                        display: Some(format!("{}°C", value)),
                    },
                    None => ProbeEntry {
                        probe: probe.clone(),
                        status: ProbeStatus::Missing,
                        display: None,
                    },
                })
                .collect(),
            inspector: block.inspector.clone(),
        })
        .collect();

    ChecklistSummary::TemperatureGrid { blocks }
}

fn pizza_batches(log: &PizzaLog) -> ChecklistSummary {
    let pizzas = log
        .pizzas
        .iter()
        .map(|pizza| PizzaTypeView {
            pizza_type: pizza.pizza_type.clone(),
            slots: pizza
                .slots
                .iter()
                .map(|slot| PizzaSlotView {
                    time_slot: slot.time_slot.clone(),
                    count: slot.count.clone(),
                    temperature: slot.temperature.as_ref().map(|t| format!("{}°C", t)),
                })
                .collect(),
        })
        .collect();

    ChecklistSummary::PizzaBatches {
        pizzas,
        total_pizzas: log.total_pizzas.clone(),
    }
}

fn production_batches(log: &ProductionLog, ctx: &RenderContext) -> ChecklistSummary {
    let entries = log
        .records
        .iter()
        .map(|record| ProductionEntry {
            number: or_placeholder(record.number.as_ref()),
            weight: or_placeholder(record.weight.as_ref()),
            batch_number: or_placeholder(record.batch_number.as_ref()),
            used_before: date_or_placeholder(record.used_before.as_ref(), ctx),
            delivery: date_or_placeholder(record.delivery_date_time.as_ref(), ctx),
        })
        .collect();

    ChecklistSummary::ProductionBatches { entries }
}

fn hygiene(log: &HygieneLog) -> ChecklistSummary {
    let completed_tasks = log.completion.iter().filter(|(_, done)| *done).count();
    let total_tasks = log.completion.len();

    ChecklistSummary::HygieneChecklist {
        zones: log
            .zones
            .iter()
            .map(|zone| ZoneView {
                name: zone.name.clone(),
                areas: zone.areas.clone(),
            })
            .collect(),
        completed_tasks,
        total_tasks,
        completion_percent: rounded_percent(percentage(completed_tasks, total_tasks)),
        manager: log.manager.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TemplateKind;
    use crate::render::Locale;
    use serde_json::json;

    fn summarize(kind: TemplateKind, data: serde_json::Value) -> ChecklistSummary {
        ChecklistSummary::build(
            &ChecklistPayload::narrow(kind, &data),
            &RenderContext::new(Locale::En),
        )
    }

    #[test]
    fn test_temperature_grid_marks_missing_probe() {
        let summary = summarize(
            TemplateKind::Refrigeration,
            json!({
                "dateBlocks": [{
                    "date": "2025-01-10",
                    "readings": { "1": "4", "2": "", "inspector_name": "Ivan" }
                }]
            }),
        );

        let ChecklistSummary::TemperatureGrid { blocks } = summary else {
            panic!("expected temperature grid");
        };
        assert_eq!(blocks.len(), 1);
        let probes = &blocks[0].probes;
        assert_eq!(probes.len(), 2);
        assert_eq!(probes[0].probe, "1");
        assert_eq!(probes[0].status, ProbeStatus::Recorded);
        assert_eq!(probes[0].display.as_deref(), Some("4°C"));
        assert_eq!(probes[1].probe, "2");
        assert_eq!(probes[1].status, ProbeStatus::Missing);
        assert_eq!(blocks[0].inspector.as_deref(), Some("Ivan"));
    }

    #[test]
    fn test_hygiene_completion_ratio_rounds() {
        let summary = summarize(
            TemplateKind::Hygiene,
            json!({
                "zones": [{ "name": "Kitchen", "areas": [{ "name": "Floor" }, { "name": "Hood" }] }],
                "completionData": { "a": true, "b": true, "c": false },
                "manager": "Olga"
            }),
        );

        let ChecklistSummary::HygieneChecklist {
            zones,
            completed_tasks,
            total_tasks,
            completion_percent,
            manager,
        } = summary
        else {
            panic!("expected hygiene checklist");
        };
        assert_eq!((completed_tasks, total_tasks), (2, 3));
        assert_eq!(completion_percent, 67);
        assert_eq!(zones[0].areas, vec!["Floor", "Hood"]);
        assert_eq!(manager.as_deref(), Some("Olga"));
    }

    #[test]
    fn test_production_uses_placeholder_and_locale_dates() {
        let summary = summarize(
            TemplateKind::Production,
            json!({
                "productions": [{
                    "number": 1,
                    "weight": "2.5",
                    "batchNumber": "B-77",
                    "usedBefore": "2025-01-12"
                }]
            }),
        );

        let ChecklistSummary::ProductionBatches { entries } = summary else {
            panic!("expected production batches");
        };
        assert_eq!(entries[0].number, "1");
        assert_eq!(entries[0].weight, "2.5");
        assert_eq!(entries[0].batch_number, "B-77");
        assert_eq!(entries[0].used_before, "01/12/2025");
        assert_eq!(entries[0].delivery, PLACEHOLDER);
    }

    #[test]
    fn test_well_formed_payloads_keep_every_value() {
        let oil = summarize(
            TemplateKind::OilChange,
            json!({ "records": [{ "date": "2025-01-10", "shift": "late", "quantity": 20,
                "oilType": "Rapeseed", "nameSignature": "Ali", "completed": true }] }),
        );
        let json = serde_json::to_string(&oil).unwrap();
        for literal in ["01/10/2025", "late", "20", "Rapeseed", "Ali", "done"] {
            assert!(json.contains(literal), "{} missing from {}", literal, json);
        }

        let pizza = summarize(
            TemplateKind::Pizza,
            json!({
                "pizzaCounts": { "Margherita": { "11:00": 4 } },
                "temperatures": { "Margherita": { "11:00": 92 } },
                "metadata": { "total_pizzas": 4 }
            }),
        );
        let json = serde_json::to_string(&pizza).unwrap();
        for literal in ["Margherita", "11:00", "\"4\"", "92°C", "totalPizzas"] {
            assert!(json.contains(literal), "{} missing from {}", literal, json);
        }
    }

    #[test]
    fn test_degraded_payloads_render_empty() {
        for data in [json!(null), json!({}), json!({ "unrelated": [1, 2] })] {
            for kind in [
                TemplateKind::OilChange,
                TemplateKind::Refrigeration,
                TemplateKind::Pizza,
                TemplateKind::Production,
                TemplateKind::Hygiene,
            ] {
                assert!(summarize(kind, data.clone()).is_empty());
            }
        }

        assert!(summarize(TemplateKind::Generic, json!(null)).is_empty());
        let raw = summarize(TemplateKind::Generic, json!({ "note": "ok" }));
        assert!(!raw.is_empty());
        assert!(matches!(raw, ChecklistSummary::RawDump { ref json } if json.contains("\"note\": \"ok\"")));
    }
}
