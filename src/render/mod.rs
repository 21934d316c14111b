//! Checklist payload rendering.
//!
//! A submission's layout comes from its template's stable type code. Templates
//! without a code fall back to keyword markers in the template name.

mod locale;
mod payload;
mod summary;

pub use locale::*;
pub use payload::*;
pub use summary::*;

use serde::Serialize;

use crate::models::TemplateKind;

/// How a template's layout was determined.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum KindSource {
    TypeCode,
    NameMarker,
    Fallback,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedKind {
    pub kind: TemplateKind,
    pub resolved_by: KindSource,
}

/// Legacy name markers, checked in order. A marker matches anywhere in the
/// lowercased template name, including inside compound words.
const NAME_MARKERS: &[(TemplateKind, &[&str])] = &[
    (
        TemplateKind::OilChange,
        &["oil", "grease", "fett", "öl", "масл", "фритюр"],
    ),
    (
        TemplateKind::Refrigeration,
        &["refrigerat", "fridge", "freezer", "kühl", "холод"],
    ),
    (TemplateKind::Pizza, &["pizza", "пицц"]),
    (
        TemplateKind::Production,
        &["production", "produktion", "производ"],
    ),
    (
        TemplateKind::Hygiene,
        &["sanitation", "sanitary", "hygiene", "reinigung", "санитар", "гигиен"],
    ),
];

/// Words that contain a marker without meaning it. Blanked out before matching.
const MARKER_EXCEPTIONS: &[&str] = &["toilet", "boil", "foil", "soil", "spoil", "coil"];

/// Infer a layout from a template name alone.
pub fn kind_from_name(template_name: &str) -> Option<TemplateKind> {
    let mut lowered = template_name.to_lowercase();
    for exception in MARKER_EXCEPTIONS {
        lowered = lowered.replace(exception, " ");
    }

    NAME_MARKERS
        .iter()
        .find(|(_, markers)| markers.iter().any(|marker| lowered.contains(marker)))
        .map(|(kind, _)| *kind)
}

/// Pick the layout for a template.
pub fn resolve_kind(type_code: Option<TemplateKind>, template_name: &str) -> ResolvedKind {
    if let Some(kind) = type_code {
        return ResolvedKind {
            kind,
            resolved_by: KindSource::TypeCode,
        };
    }
    match kind_from_name(template_name) {
        Some(kind) => ResolvedKind {
            kind,
            resolved_by: KindSource::NameMarker,
        },
        None => ResolvedKind {
            kind: TemplateKind::Generic,
            resolved_by: KindSource::Fallback,
        },
    }
}

/// Render a submission payload. Never fails; degraded input renders empty.
pub fn render_payload(
    resolved: ResolvedKind,
    data: &serde_json::Value,
    ctx: &RenderContext,
) -> ChecklistSummary {
    let payload = ChecklistPayload::narrow(resolved.kind, data);
    let summary = ChecklistSummary::build(&payload, ctx);
    if summary.is_empty() && resolved.kind != TemplateKind::Generic {
        tracing::debug!(
            "Payload rendered empty for layout {}",
            resolved.kind.as_str()
        );
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_name_markers_follow_table_order() {
        assert_eq!(kind_from_name("Frying Oil Change"), Some(TemplateKind::OilChange));
        assert_eq!(kind_from_name("Refrigeration temps"), Some(TemplateKind::Refrigeration));
        assert_eq!(kind_from_name("Pizza Production"), Some(TemplateKind::Pizza));
        assert_eq!(kind_from_name("Doner production"), Some(TemplateKind::Production));
        assert_eq!(kind_from_name("Daily Hygiene Round"), Some(TemplateKind::Hygiene));
        assert_eq!(kind_from_name("Toilet hygiene"), Some(TemplateKind::Hygiene));
        assert_eq!(kind_from_name("Opening checklist"), None);
    }

    #[test]
    fn test_markers_match_inside_compound_words() {
        assert_eq!(kind_from_name("Frittieröl-Wechsel"), Some(TemplateKind::OilChange));
        assert_eq!(
            kind_from_name("Tiefkühlraum Temperaturen"),
            Some(TemplateKind::Refrigeration)
        );
        assert_eq!(kind_from_name("Minipizza Log"), Some(TemplateKind::Pizza));
        assert_eq!(kind_from_name("DailyRefrigeration"), Some(TemplateKind::Refrigeration));
        assert_eq!(kind_from_name("Toiletten-Reinigung"), Some(TemplateKind::Hygiene));
        assert_eq!(kind_from_name("Boiler room walk"), None);
    }

    #[test]
    fn test_type_code_wins_over_name() {
        let resolved = resolve_kind(Some(TemplateKind::Hygiene), "Pizza temperatures");
        assert_eq!(resolved.kind, TemplateKind::Hygiene);
        assert_eq!(resolved.resolved_by, KindSource::TypeCode);

        let resolved = resolve_kind(None, "Pizza temperatures");
        assert_eq!(resolved.kind, TemplateKind::Pizza);
        assert_eq!(resolved.resolved_by, KindSource::NameMarker);

        let resolved = resolve_kind(None, "Opening checklist");
        assert_eq!(resolved.kind, TemplateKind::Generic);
        assert_eq!(resolved.resolved_by, KindSource::Fallback);
    }

    #[test]
    fn test_unknown_template_dumps_raw_json() {
        let resolved = resolve_kind(None, "Opening checklist");
        let summary = render_payload(
            resolved,
            &json!({ "doorsUnlocked": true }),
            &RenderContext::default(),
        );
        match summary {
            ChecklistSummary::RawDump { json } => assert!(json.contains("doorsUnlocked")),
            other => panic!("expected raw dump, got {:?}", other),
        }
    }
}
