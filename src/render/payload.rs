//! Narrowing of free-form submission payloads into known checklist shapes.
//!
//! Narrowing never fails: a missing or malformed substructure becomes an
//! empty collection, so every payload yields some shape.

use serde_json::{Map, Value};

use crate::models::TemplateKind;

/// Submission payload narrowed to the shape its template kind implies.
#[derive(Debug, Clone, PartialEq)]
pub enum ChecklistPayload {
    OilChange(OilChangeLog),
    Refrigeration(TemperatureLog),
    Pizza(PizzaLog),
    Production(ProductionLog),
    Hygiene(HygieneLog),
    Raw(Value),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OilChangeLog {
    pub records: Vec<OilChangeRecord>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OilChangeRecord {
    pub date: Option<String>,
    pub shift: Option<String>,
    pub quantity: Option<String>,
    pub oil_type: Option<String>,
    pub name_signature: Option<String>,
    pub completed: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemperatureLog {
    pub blocks: Vec<TemperatureBlock>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemperatureBlock {
    pub date: Option<String>,
    /// Probe identifier and reading, ordered by probe number
    pub readings: Vec<(String, Option<String>)>,
    pub inspector: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PizzaLog {
    pub pizzas: Vec<PizzaTypeLog>,
    pub total_pizzas: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PizzaTypeLog {
    pub pizza_type: String,
    pub slots: Vec<PizzaSlot>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PizzaSlot {
    pub time_slot: String,
    pub count: String,
    pub temperature: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductionLog {
    pub records: Vec<ProductionRecord>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductionRecord {
    pub number: Option<String>,
    pub weight: Option<String>,
    pub batch_number: Option<String>,
    pub used_before: Option<String>,
    pub delivery_date_time: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HygieneLog {
    pub zones: Vec<HygieneZone>,
    pub completion: Vec<(String, bool)>,
    pub manager: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HygieneZone {
    pub name: String,
    pub areas: Vec<String>,
}

impl ChecklistPayload {
    /// Narrow `data` to the shape of `kind`.
    pub fn narrow(kind: TemplateKind, data: &Value) -> Self {
        match kind {
            TemplateKind::OilChange => ChecklistPayload::OilChange(narrow_oil_change(data)),
            TemplateKind::Refrigeration => {
                ChecklistPayload::Refrigeration(narrow_temperatures(data))
            }
            TemplateKind::Pizza => ChecklistPayload::Pizza(narrow_pizza(data)),
            TemplateKind::Production => ChecklistPayload::Production(narrow_production(data)),
            TemplateKind::Hygiene => ChecklistPayload::Hygiene(narrow_hygiene(data)),
            TemplateKind::Generic => ChecklistPayload::Raw(data.clone()),
        }
    }
}

fn narrow_oil_change(data: &Value) -> OilChangeLog {
    let records = array_at(data, "records")
        .iter()
        .filter_map(Value::as_object)
        .map(|record| OilChangeRecord {
            date: text_at(record, "date"),
            shift: text_at(record, "shift"),
            quantity: text_at(record, "quantity"),
            oil_type: text_at(record, "oilType"),
            name_signature: text_at(record, "nameSignature"),
            completed: truthy(record.get("completed")),
        })
        .filter(|record| record.date.is_some() || record.quantity.is_some())
        .collect();

    OilChangeLog { records }
}

fn narrow_temperatures(data: &Value) -> TemperatureLog {
    let blocks = array_at(data, "dateBlocks")
        .iter()
        .filter_map(Value::as_object)
        .map(|block| {
            let readings = block.get("readings").and_then(Value::as_object);
            let mut probes: Vec<(String, Option<String>)> = readings
                .map(|readings| {
                    readings
                        .iter()
                        .filter(|(key, _)| is_probe_key(key))
                        .map(|(key, value)| (key.clone(), scalar_text(value)))
                        .collect()
                })
                .unwrap_or_default();
            probes.sort_by(|(a, _), (b, _)| probe_order(a).cmp(&probe_order(b)).then(a.cmp(b)));

            TemperatureBlock {
                date: text_at(block, "date"),
                readings: probes,
                inspector: readings.and_then(|r| text_at(r, "inspector_name")),
            }
        })
        .collect();

    TemperatureLog { blocks }
}

/// Probe readings are keyed by identifiers that start with a digit ("1", "2a").
fn is_probe_key(key: &str) -> bool {
    key.chars().next().is_some_and(|c| c.is_ascii_digit())
}

fn probe_order(key: &str) -> u64 {
    let digits: String = key.chars().take_while(char::is_ascii_digit).collect();
    digits.parse().unwrap_or(u64::MAX)
}

fn narrow_pizza(data: &Value) -> PizzaLog {
    let counts = data.get("pizzaCounts").and_then(Value::as_object);
    let temperatures = data.get("temperatures").and_then(Value::as_object);

    let pizzas = counts
        .map(|counts| {
            counts
                .iter()
                .filter_map(|(pizza_type, slots)| {
                    let slots = slots.as_object()?;
                    let slot_temps = temperatures
                        .and_then(|t| t.get(pizza_type))
                        .and_then(Value::as_object);
                    let slots: Vec<PizzaSlot> = slots
                        .iter()
                        .filter_map(|(time_slot, count)| {
                            let count = scalar_text(count).filter(|c| !is_zero(c))?;
                            Some(PizzaSlot {
                                time_slot: time_slot.clone(),
                                count,
                                temperature: slot_temps.and_then(|t| text_at(t, time_slot)),
                            })
                        })
                        .collect();
                    Some(PizzaTypeLog {
                        pizza_type: pizza_type.clone(),
                        slots,
                    })
                })
                .filter(|pizza| !pizza.slots.is_empty())
                .collect()
        })
        .unwrap_or_default();

    let total_pizzas = data
        .get("metadata")
        .and_then(Value::as_object)
        .and_then(|m| text_at(m, "total_pizzas"));

    PizzaLog {
        pizzas,
        total_pizzas,
    }
}

fn narrow_production(data: &Value) -> ProductionLog {
    let records = array_at(data, "productions")
        .iter()
        .filter_map(Value::as_object)
        .map(|record| ProductionRecord {
            number: text_at(record, "number"),
            weight: text_at(record, "weight"),
            batch_number: text_at(record, "batchNumber"),
            used_before: text_at(record, "usedBefore"),
            delivery_date_time: text_at(record, "deliveryDateTime"),
        })
        .collect();

    ProductionLog { records }
}

fn narrow_hygiene(data: &Value) -> HygieneLog {
    let zones = array_at(data, "zones")
        .iter()
        .filter_map(|zone| {
            let zone = zone.as_object()?;
            let areas = zone
                .get("areas")
                .and_then(Value::as_array)
                .map(|areas| areas.iter().filter_map(name_of).collect())
                .unwrap_or_default();
            Some(HygieneZone {
                name: text_at(zone, "name").unwrap_or_default(),
                areas,
            })
        })
        .collect();

    let completion = data
        .get("completionData")
        .and_then(Value::as_object)
        .map(|entries| {
            entries
                .iter()
                .map(|(key, value)| (key.clone(), value.as_bool() == Some(true)))
                .collect()
        })
        .unwrap_or_default();

    HygieneLog {
        zones,
        completion,
        manager: data.as_object().and_then(|d| text_at(d, "manager")),
    }
}

fn name_of(value: &Value) -> Option<String> {
    match value {
        Value::Object(map) => text_at(map, "name"),
        other => scalar_text(other),
    }
}

fn array_at<'a>(data: &'a Value, key: &str) -> &'a [Value] {
    data.get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn text_at(map: &Map<String, Value>, key: &str) -> Option<String> {
    map.get(key).and_then(scalar_text)
}

/// Text form of a scalar. Empty strings, nulls and containers count as unset.
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn truthy(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => matches!(s.trim(), "true" | "yes" | "1"),
        Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
        _ => false,
    }
}

fn is_zero(count: &str) -> bool {
    count.parse::<f64>().is_ok_and(|n| n == 0.0)
}
