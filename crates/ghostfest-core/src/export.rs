//! CSV export of every submission.

use crate::config::DashboardConfig;
use crate::entries::{boat_label, export_cell, gender_label};
use crate::models::Submission;

const BASE_COLUMNS: [&str; 12] = [
    "Timestamp",
    "Order ID",
    "Boat",
    "Gender",
    "Chinese Name",
    "English Name",
    "Phone",
    "Payment Method",
    "Total",
    "Paid",
    "Paid Amt",
    "Remarks",
];

/// Download name for the export.
pub const EXPORT_FILE_NAME: &str = "ghostfest-spirits.csv";

// Cells a spreadsheet would evaluate as a formula. A leading `+` or `-`
// followed by digits is a phone number or amount and stays as is.
fn should_neutralize(value: &str) -> bool {
    let mut chars = value.chars();
    match chars.next() {
        Some('=') | Some('@') | Some('\t') | Some('\r') => true,
        Some('+') | Some('-') => !chars.all(|c| c.is_ascii_digit() || c == ' '),
        _ => false,
    }
}

fn csv_escape(value: &str) -> String {
    let safe = if should_neutralize(value) {
        format!("'{value}")
    } else {
        value.to_string()
    };
    if safe.contains(',') || safe.contains('"') || safe.contains('\n') || safe.contains('\r') {
        format!("\"{}\"", safe.replace('"', "\"\""))
    } else {
        safe
    }
}

fn push_row(out: &mut String, cells: &[String]) {
    let line: Vec<String> = cells.iter().map(|c| csv_escape(c)).collect();
    out.push_str(&line.join(","));
    out.push_str("\r\n");
}

/// Render submissions as CSV, one row each, in the order given.
///
/// The header carries `Entry N` columns up to the widest record; shorter
/// records leave the trailing cells empty.
pub fn render_csv(submissions: &[Submission]) -> String {
    let widest = submissions.iter().map(|s| s.entries.len()).max().unwrap_or(0);

    let mut header: Vec<String> = BASE_COLUMNS.iter().map(|c| c.to_string()).collect();
    header.extend((1..=widest).map(|i| format!("Entry {i}")));

    let mut out = String::new();
    push_row(&mut out, &header);

    for s in submissions {
        let mut row = vec![
            s.date.format(DashboardConfig::ROW_DATE_FORMAT).to_string(),
            s.order_id.clone(),
            boat_label(s.boat).to_string(),
            gender_label(&s.gender),
            s.name_cn.clone(),
            s.name_en.clone(),
            s.phone.clone(),
            s.payment_method.export_label().to_string(),
            s.total.to_string(),
            if s.paid { "Yes" } else { "No" }.to_string(),
            s.payment_amount.to_string(),
            s.remarks.clone(),
        ];
        row.extend(s.entries.iter().map(export_cell));
        row.resize(header.len(), String::new());
        push_row(&mut out, &row);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BoatChoice, PaymentMethod, SpiritEntry};

    fn submission(entries: Vec<SpiritEntry>, remarks: &str) -> Submission {
        Submission {
            id: 1,
            order_id: "6789".into(),
            date: chrono::DateTime::parse_from_rfc3339("2025-08-01T09:05:00+08:00").unwrap(),
            boat: BoatChoice::Yes,
            gender: "female".into(),
            name_cn: "李美".into(),
            name_en: "Mei Lee".into(),
            phone: "+60123456789".into(),
            payment_method: PaymentMethod::BankTransfer,
            count: entries.len() as u32,
            total: 0,
            paid: true,
            entries,
            payment_amount: 0,
            remarks: remarks.into(),
        }
    }

    fn ancestor() -> SpiritEntry {
        SpiritEntry {
            option: "祖先".into(),
            name_cn: "李公".into(),
            gender: "male".into(),
            calendar: "lunar".into(),
            year: "1950".into(),
            month: "3".into(),
            day: "12".into(),
        }
    }

    #[test]
    fn test_csv_escape() {
        assert_eq!(csv_escape("plain"), "plain");
        assert_eq!(csv_escape("a,b"), "\"a,b\"");
        assert_eq!(csv_escape("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(csv_escape("=SUM(A1)"), "'=SUM(A1)");
        assert_eq!(csv_escape("+60 123456789"), "+60 123456789");
        assert_eq!(csv_escape("-cmd"), "'-cmd");
    }

    #[test]
    fn test_render_header_grows_with_widest_record() {
        let csv = render_csv(&[
            submission(vec![ancestor()], ""),
            submission(vec![ancestor(), ancestor()], "note, with comma"),
        ]);
        let lines: Vec<&str> = csv.split("\r\n").collect();
        assert!(lines[0].ends_with("Paid Amt,Remarks,Entry 1,Entry 2"));
        assert_eq!(
            lines[1],
            "2025-08-01 09:05,6789,是 / Yes,女 / Female,李美,Mei Lee,+60123456789,BANK,0,Yes,0,,\
             祖先 (Ancestor) - 李公 (男) 1950年 3月 12日（农历）,"
        );
        assert!(lines[2].contains(",\"note, with comma\","));
        assert_eq!(lines[3], "");
    }

    #[test]
    fn test_render_empty() {
        let csv = render_csv(&[]);
        assert_eq!(
            csv,
            "Timestamp,Order ID,Boat,Gender,Chinese Name,English Name,Phone,Payment Method,\
             Total,Paid,Paid Amt,Remarks\r\n"
        );
    }
}
