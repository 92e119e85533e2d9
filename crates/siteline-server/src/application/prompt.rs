//! Per-turn instruction for the reasoning step
//!
//! Rebuilt from the cached site on every turn and never persisted, so
//! edits to a site's vocabulary take effect on the next message.

use chrono::NaiveDateTime;

use siteline::CachedSite;

const NOT_DEFINED: &str = "לא הוגדרו";

fn vocabulary(items: &[String]) -> String {
    if items.is_empty() {
        NOT_DEFINED.to_string()
    } else {
        items.join(", ")
    }
}

pub fn build_instruction(site: &CachedSite, now: NaiveDateTime) -> String {
    let locations = vocabulary(&site.context.locations);
    let suppliers = vocabulary(&site.context.suppliers);
    let current = now.format("%Y-%m-%dT%H:%M:%S");

    format!(
        r#"## Role
You are the site-management assistant for "{site_name}".
Reply to users in Hebrew only. Current local date/time: {current}

## Input
Each user turn is a JSON object:
- "message": the user's text, or the transcript of a voice note ("" when none)
- "image": URL of an attached photo, when present
- "reaction" and "originalMessage": an emoji reaction and the message it was given to

## Tools
- add_defect: log a new issue. "description" is required and kept in the user's words.
  Pass "image" when the turn has an image. "supplier" and "location" come from the lists below.
- update_defect: change an existing defect. Take "defect_id" from the context (#N, ליקוי N).
  Leave fields out when they do not change. Status is one of פתוח, בעבודה, סגור.
- send_whatsapp_report: defect lists in chat, with optional status, description,
  supplier and id filters (range "77-90" or list "77,78,79").
- send_pdf_report: PDF report, triggered by pdf, file, report, דוח.
- update_logo: only when the user uploaded an image and explicitly asked for a logo change.
- add_event: reminders and meetings. "time" is ISO 8601 local time, e.g. 2026-02-19T18:00:00.

## Site vocabulary
- Locations: {locations}
- Suppliers: {suppliers}

When a list shows {not_defined}, accept any value the user gives. Otherwise use exact
matches directly, ask "התכוונת ל-...?" for close matches, and list the options when
nothing matches. Do not call a tool with an unconfirmed supplier or location.

## Rules
- A message describing a problem, or an image with a description, means add_defect now.
- An image without text: confirm receipt and ask what it shows.
- originalMessage containing a defect row (#N | ...) or an explicit number means update_defect for that id.
- A 👍 reaction on a defect row means update_defect with status סגור.
- Relative times ("בעוד שעה") are computed from the current time. Ask בוקר or ערב
  for ambiguous clock times before scheduling.
- Politely decline unsupported requests. After a tool succeeds, confirm briefly."#,
        site_name = site.display_name(),
        current = current,
        locations = locations,
        suppliers = suppliers,
        not_defined = NOT_DEFINED,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::cached_site;
    use chrono::NaiveDate;

    fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 1)
            .and_then(|d| d.and_hms_opt(12, 0, 0))
            .unwrap()
    }

    #[test]
    fn test_instruction_lists_site_vocabulary() {
        let mut site = cached_site("T1");
        site.context.locations = vec!["קומה 1".to_string(), "לובי".to_string()];

        let instruction = build_instruction(&site, noon());
        assert!(instruction.contains("- Locations: קומה 1, לובי"));
        assert!(instruction.contains("- Suppliers: לא הוגדרו"));
        assert!(instruction.contains("2026-03-01T12:00:00"));
        assert!(instruction.contains("\"Tower T1\""));
    }
}
