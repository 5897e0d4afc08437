//! Location formatter
//!
//! Renders resolved placements into location strings, QR payloads and label
//! text. A confidential item's QR payload is only its identifying link: no
//! name, number or location may appear in anything scannable.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::entity::{Cabinet, StorageItem};
use crate::placement::{resolve_placement, unresolved_placement, ResolvedPlacement};

/// Placeholder for a dangling cabinet reference
pub const UNKNOWN_CABINET: &str = "Unknown Cabinet";

/// Builds the identifying links embedded in printed labels.
///
/// Shape: `{origin}/{prefix}/file/{id}` and `{origin}/{prefix}/cabinet/{id}`.
/// Existing labels depend on it, so it must not change.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LinkBuilder {
    origin: String,
    prefix: String,
}

impl LinkBuilder {
    pub fn new(origin: &str, prefix: &str) -> Self {
        Self {
            origin: origin.trim_end_matches('/').to_string(),
            prefix: prefix.trim_matches('/').to_string(),
        }
    }

    fn link(&self, kind: &str, id: &str) -> String {
        if self.prefix.is_empty() {
            format!("{}/{}/{}", self.origin, kind, id)
        } else {
            format!("{}/{}/{}/{}", self.origin, self.prefix, kind, id)
        }
    }

    pub fn item_link(&self, item_id: &str) -> String {
        self.link("file", item_id)
    }

    pub fn cabinet_link(&self, cabinet_id: &str) -> String {
        self.link("cabinet", cabinet_id)
    }
}

/// Cabinet name, or the placeholder when the reference dangles
pub fn cabinet_name(cabinet: Option<&Cabinet>) -> &str {
    cabinet.map(|c| c.name.as_str()).unwrap_or(UNKNOWN_CABINET)
}

/// Placement of an item within an optional cabinet
pub fn placement_for(item: &StorageItem, cabinet: Option<&Cabinet>) -> ResolvedPlacement {
    match cabinet {
        Some(cabinet) => resolve_placement(cabinet, item),
        None => unresolved_placement(item),
    }
}

/// Human readable location within a cabinet.
///
/// The cabinet name is not part of the string. Callers that show it render
/// [`cabinet_name`] alongside.
pub fn format_location(placement: &ResolvedPlacement) -> String {
    match (placement.is_locker, placement.column) {
        (true, Some(column)) => format!("Locker (Level {}, Col {})", placement.level, column),
        (true, None) => format!("Locker Storage (Level {})", placement.level),
        (false, column) => format!(
            "Level {}, Column {}",
            placement.level,
            column.unwrap_or(1)
        ),
    }
}

/// Compact location for small printed labels
pub fn format_location_short(placement: &ResolvedPlacement) -> String {
    match (placement.is_locker, placement.column) {
        (true, Some(column)) => format!("Locker (L{} C{})", placement.level, column),
        (true, None) => format!("Locker (L{})", placement.level),
        (false, column) => format!("L{} C{}", placement.level, column.unwrap_or(1)),
    }
}

/// Text encoded into an item's QR code
pub fn build_qr_payload(
    item: &StorageItem,
    cabinet: Option<&Cabinet>,
    placement: &ResolvedPlacement,
    links: &LinkBuilder,
) -> String {
    let link = links.item_link(&item.id);
    if item.is_confidential {
        return link;
    }

    format!(
        "Name: {}\nNo: {}\nCabinet: {}\nLocation: {}\n\n{}",
        item.name,
        item.number_with_year(),
        cabinet_name(cabinet),
        format_location(placement),
        link
    )
}

/// Text printed next to the QR code of a label
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum TextLabel {
    #[serde(rename_all = "camelCase")]
    Full {
        number: String,
        cabinet: String,
        location: String,
        confidential: bool,
        printed_on: NaiveDate,
    },
    /// Details withheld for a confidential item
    #[serde(rename_all = "camelCase")]
    Redacted { printed_on: NaiveDate },
}

/// Build label text, redacted for confidential items when requested
pub fn build_text_label(
    item: &StorageItem,
    cabinet_name: &str,
    placement: &ResolvedPlacement,
    hide_confidential_details: bool,
    printed_on: NaiveDate,
) -> TextLabel {
    if item.is_confidential && hide_confidential_details {
        return TextLabel::Redacted { printed_on };
    }
    TextLabel::Full {
        number: item.number_with_year(),
        cabinet: cabinet_name.to_string(),
        location: format_location_short(placement),
        confidential: item.is_confidential,
        printed_on,
    }
}

/// Removable identification strip of a confidential label
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TearOffStrip {
    pub name: String,
    pub number: String,
    pub details_hidden: bool,
    pub printed_on: NaiveDate,
}

pub fn tear_off_strip(
    item: &StorageItem,
    details_hidden: bool,
    printed_on: NaiveDate,
) -> Option<TearOffStrip> {
    item.is_confidential.then(|| TearOffStrip {
        name: item.name.clone(),
        number: item.number_with_year(),
        details_hidden,
        printed_on,
    })
}

/// Options of a printed label sheet
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LabelOptions {
    pub include_qr: bool,
    pub include_details: bool,
    /// Print only the QR code for confidential items
    pub hide_confidential_details: bool,
}

impl Default for LabelOptions {
    fn default() -> Self {
        Self {
            include_qr: true,
            include_details: true,
            hide_confidential_details: true,
        }
    }
}

/// One label of a printed sheet
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelCard {
    pub item_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qr_payload: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<TextLabel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tear_off: Option<TearOffStrip>,
}

pub fn build_label(
    item: &StorageItem,
    cabinet: Option<&Cabinet>,
    options: &LabelOptions,
    links: &LinkBuilder,
    printed_on: NaiveDate,
) -> LabelCard {
    let placement = placement_for(item, cabinet);
    let hidden = item.is_confidential && options.hide_confidential_details;

    let qr_payload = options
        .include_qr
        .then(|| build_qr_payload(item, cabinet, &placement, links));
    let text = (options.include_details && !hidden).then(|| {
        build_text_label(
            item,
            cabinet_name(cabinet),
            &placement,
            options.hide_confidential_details,
            printed_on,
        )
    });

    LabelCard {
        item_id: item.id.clone(),
        qr_payload,
        text,
        tear_off: tear_off_strip(item, hidden, printed_on),
    }
}

/// Whether a password opens an item's details
pub fn unlock(item: &StorageItem, password: &str) -> bool {
    if !item.is_confidential {
        return true;
    }
    item.password.as_deref() == Some(password)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{FileRecord, ItemLocation, LockerDecl};

    fn links() -> LinkBuilder {
        LinkBuilder::new("https://records.example.org/", "#")
    }

    fn payroll(is_confidential: bool) -> StorageItem {
        StorageItem::from(&FileRecord {
            id: "f1".to_string(),
            file_number: "F-77".to_string(),
            financial_year: "2024-2025".to_string(),
            file_name: "Payroll".to_string(),
            location: ItemLocation::new("c1", 2, 1, false),
            is_confidential,
            password: is_confidential.then(|| "s3cret".to_string()),
            ..Default::default()
        })
    }

    fn placement(level: i64, column: Option<i64>, is_locker: bool) -> ResolvedPlacement {
        ResolvedPlacement {
            level,
            column,
            is_locker,
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    #[test]
    fn test_links() {
        assert_eq!(links().item_link("f1"), "https://records.example.org/#/file/f1");
        assert_eq!(links().cabinet_link("c1"), "https://records.example.org/#/cabinet/c1");
        let plain = LinkBuilder::new("http://localhost:8080", "");
        assert_eq!(plain.item_link("x"), "http://localhost:8080/file/x");
        let nested = LinkBuilder::new("http://host", "/records/");
        assert_eq!(nested.cabinet_link("c"), "http://host/records/cabinet/c");
    }

    #[test]
    fn test_format_location() {
        assert_eq!(
            format_location(&placement(2, Some(3), true)),
            "Locker (Level 2, Col 3)"
        );
        assert_eq!(
            format_location(&placement(4, None, true)),
            "Locker Storage (Level 4)"
        );
        assert_eq!(
            format_location(&placement(1, Some(2), false)),
            "Level 1, Column 2"
        );
        assert_eq!(format_location_short(&placement(1, Some(2), false)), "L1 C2");
        assert_eq!(
            format_location_short(&placement(2, Some(3), true)),
            "Locker (L2 C3)"
        );
    }

    #[test]
    fn test_format_location_omits_cabinet_name() {
        let cabinet = Cabinet::new("Main A1", 3, 2);
        let item = payroll(false);
        let location = format_location(&placement_for(&item, Some(&cabinet)));
        assert_eq!(location, "Level 2, Column 1");
        assert_eq!(cabinet_name(Some(&cabinet)), "Main A1");
        assert_eq!(cabinet_name(None), UNKNOWN_CABINET);
    }

    #[test]
    fn test_qr_payload_full() {
        let cabinet = Cabinet::new("Main A1", 3, 2);
        let payload = build_qr_payload(
            &payroll(false),
            Some(&cabinet),
            &placement(2, Some(1), false),
            &links(),
        );
        assert_eq!(
            payload,
            "Name: Payroll\nNo: F-77/2024-2025\nCabinet: Main A1\nLocation: Level 2, Column 1\n\nhttps://records.example.org/#/file/f1"
        );
    }

    #[test]
    fn test_qr_payload_unknown_cabinet() {
        let payload = build_qr_payload(
            &payroll(false),
            None,
            &placement(2, Some(1), false),
            &links(),
        );
        assert!(payload.contains("Cabinet: Unknown Cabinet"));
    }

    #[test]
    fn test_confidential_qr_payload_is_bare_link() {
        let item = payroll(true);
        let cabinet = Cabinet::new("Secret Room", 3, 2).with_locker(LockerDecl::whole_level(2));
        let placement = placement_for(&item, Some(&cabinet));
        let payload = build_qr_payload(&item, Some(&cabinet), &placement, &links());

        assert_eq!(payload, "https://records.example.org/#/file/f1");
        assert!(!payload.contains("Payroll"));
        assert!(!payload.contains("F-77"));
        assert!(!payload.contains(&format_location(&placement)));
        assert!(!payload.contains("Secret Room"));
    }

    #[test]
    fn test_text_label_redaction() {
        let item = payroll(true);
        let placement = placement(2, Some(1), false);
        assert_eq!(
            build_text_label(&item, "Main A1", &placement, true, date()),
            TextLabel::Redacted { printed_on: date() }
        );
        match build_text_label(&item, "Main A1", &placement, false, date()) {
            TextLabel::Full {
                number,
                location,
                confidential,
                ..
            } => {
                assert_eq!(number, "F-77/2024-2025");
                assert_eq!(location, "L2 C1");
                assert!(confidential);
            }
            other => panic!("unexpected label {:?}", other),
        }

        // The flag only affects confidential items
        assert!(matches!(
            build_text_label(&payroll(false), "Main A1", &placement, true, date()),
            TextLabel::Full { .. }
        ));
    }

    #[test]
    fn test_build_label_confidential() {
        let item = payroll(true);
        let cabinet = Cabinet::new("Main A1", 3, 2);
        let card = build_label(&item, Some(&cabinet), &LabelOptions::default(), &links(), date());

        assert_eq!(card.qr_payload.as_deref(), Some("https://records.example.org/#/file/f1"));
        assert!(card.text.is_none());
        let strip = card.tear_off.unwrap();
        assert_eq!(strip.name, "Payroll");
        assert!(strip.details_hidden);
    }

    #[test]
    fn test_build_label_plain() {
        let options = LabelOptions {
            include_qr: false,
            ..Default::default()
        };
        let card = build_label(&payroll(false), None, &options, &links(), date());
        assert!(card.qr_payload.is_none());
        assert!(card.tear_off.is_none());
        match card.text {
            Some(TextLabel::Full { cabinet, .. }) => assert_eq!(cabinet, UNKNOWN_CABINET),
            other => panic!("unexpected label {:?}", other),
        }
    }

    #[test]
    fn test_unlock() {
        assert!(unlock(&payroll(false), ""));
        assert!(unlock(&payroll(true), "s3cret"));
        assert!(!unlock(&payroll(true), "guess"));

        let mut no_password = payroll(true);
        no_password.password = None;
        assert!(!unlock(&no_password, ""));
    }
}
