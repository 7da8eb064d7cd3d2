//! Printable HTML report for approved drafts.
//!
//! Produces one self-contained RTL document: styles inline, the sample
//! image embedded as a data URI. Every interpolated value is escaped.

use chrono::{DateTime, Local};

use crate::error::{AppError, AppResult};
use crate::models::{DraftRecord, DraftStatus};

const PLATFORM_AR: &str = "منصة أرشفة الدرفت والتقارير المعملية";
const PLATFORM_EN: &str = "Lab Draft & Reports Archive Platform";
const TITLE_AR: &str = "تقرير اختبار معتمد";
const TITLE_EN: &str = "Approved Test Report";
const FOOTER_OWNER: &str = "© 2024 - مختبرات مواد البناء";

const STYLE: &str = r#"
* { margin: 0; padding: 0; box-sizing: border-box; }
body { font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif; padding: 40px; direction: rtl; background: white; }
.header { text-align: center; border-bottom: 3px solid #1e40af; padding-bottom: 20px; margin-bottom: 30px; }
.logo { font-size: 24px; font-weight: bold; color: #1e40af; margin-bottom: 5px; }
.logo-en, .report-title-en { font-size: 12px; color: #6b7280; }
.report-title { font-size: 20px; font-weight: bold; margin-top: 20px; color: #1f2937; }
.content { display: grid; grid-template-columns: 1fr 1fr; gap: 30px; }
.image-section img { width: 100%; border: 2px solid #e5e7eb; border-radius: 8px; }
.image-caption { font-size: 11px; color: #6b7280; margin-top: 5px; text-align: center; }
.details-section { display: flex; flex-direction: column; gap: 15px; }
.detail-row { display: flex; border-bottom: 1px solid #e5e7eb; padding-bottom: 10px; }
.detail-label { font-weight: bold; color: #374151; width: 120px; flex-shrink: 0; }
.detail-label-en, .notes-title-en { font-size: 10px; color: #9ca3af; display: block; }
.sample-id { font-weight: bold; color: #2563eb; }
.notes-section { margin-top: 20px; padding: 15px; background: #f3f4f6; border-radius: 8px; }
.notes-title { font-weight: bold; color: #374151; margin-bottom: 8px; }
.notes-content { color: #4b5563; font-size: 14px; white-space: pre-wrap; }
.engineer-notes { background: #ecfdf5; border: 1px solid #a7f3d0; }
.engineer-notes .notes-title, .engineer-notes .notes-content { color: #166534; }
.status-approved { display: inline-block; background: #dcfce7; color: #166534; padding: 5px 15px; border-radius: 20px; font-weight: bold; }
.signature-section { margin-top: 50px; display: grid; grid-template-columns: 1fr 1fr; gap: 50px; }
.signature-box { border-top: 2px solid #1f2937; padding-top: 10px; text-align: center; }
.signature-en { font-size: 10px; color: #9ca3af; }
.footer { margin-top: 40px; padding-top: 20px; border-top: 2px solid #e5e7eb; display: flex; justify-content: space-between; font-size: 12px; color: #6b7280; }
@media print { body { padding: 20px; } }
"#;

/// Escape text for HTML element content and double-quoted attributes.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn detail_row(arabic: &str, english: &str, value_html: &str) -> String {
    format!(
        r#"<div class="detail-row"><div class="detail-label">{}<span class="detail-label-en">{}</span></div><div class="detail-value">{}</div></div>"#,
        arabic, english, value_html
    )
}

fn notes_block(class: &str, arabic: &str, english: &str, notes: &str) -> String {
    format!(
        r#"<div class="{}"><div class="notes-title">{}<span class="notes-title-en">{}</span></div><div class="notes-content">{}</div></div>"#,
        class,
        arabic,
        english,
        escape_html(notes)
    )
}

/// Render the report for an approved draft, stamped with the current time.
pub fn render(draft: &DraftRecord) -> AppResult<String> {
    render_at(draft, Local::now())
}

/// Render the report with an explicit print time.
pub fn render_at(draft: &DraftRecord, printed_at: DateTime<Local>) -> AppResult<String> {
    if draft.status != DraftStatus::Approved {
        return Err(AppError::InvalidState(format!(
            "draft {} is {}; only approved drafts can be printed",
            draft.id, draft.status
        )));
    }

    let test_type = draft.test_type.label();
    let uploaded_at = draft.uploaded_at.with_timezone(&Local);

    let mut html = String::with_capacity(4096 + draft.image.len() * 4 / 3);
    html.push_str("<!DOCTYPE html>\n<html dir=\"rtl\" lang=\"ar\">\n<head>\n<meta charset=\"UTF-8\">\n");
    html.push_str(&format!(
        "<title>تقرير العينة {}</title>\n<style>{}</style>\n</head>\n<body>\n",
        escape_html(&draft.sample_id),
        STYLE
    ));

    html.push_str(&format!(
        r#"<div class="header"><div class="logo">{}</div><div class="logo-en">{}</div><div class="report-title">{}</div><div class="report-title-en">{}</div></div>"#,
        PLATFORM_AR,
        escape_html(PLATFORM_EN),
        TITLE_AR,
        TITLE_EN
    ));
    html.push('\n');

    html.push_str(r#"<div class="content">"#);
    html.push_str(&format!(
        r#"<div class="image-section"><img src="{}" alt="صورة الدرفت" /><div class="image-caption">{}</div></div>"#,
        escape_html(&draft.image.to_data_uri()),
        escape_html(&draft.image.name)
    ));

    html.push_str(r#"<div class="details-section">"#);
    html.push_str(&detail_row(
        "رقم العينة",
        "Sample ID",
        &format!(
            r#"<span class="sample-id">{}</span>"#,
            escape_html(&draft.sample_id)
        ),
    ));
    html.push_str(&detail_row("نوع الاختبار", "Test Type", &test_type.to_string()));
    html.push_str(&detail_row(
        "الفني",
        "Technician",
        &escape_html(&draft.uploaded_by),
    ));
    html.push_str(&detail_row(
        "تاريخ الرفع",
        "Upload Date",
        &uploaded_at.format("%Y-%m-%d %H:%M").to_string(),
    ));
    html.push_str(&detail_row(
        "الحالة",
        "Status",
        r#"<span class="status-approved">تم الاعتماد ✓</span>"#,
    ));
    if let Some(ref reviewer) = draft.reviewed_by {
        html.push_str(&detail_row(
            "المهندس المعتمِد",
            "Approved By",
            &escape_html(reviewer),
        ));
    }
    html.push_str("</div></div>\n");

    if let Some(ref notes) = draft.notes {
        html.push_str(&notes_block(
            "notes-section",
            "ملاحظات الفني",
            "Technician Notes",
            notes,
        ));
        html.push('\n');
    }

    if let Some(ref engineer_notes) = draft.engineer_notes {
        html.push_str(&notes_block(
            "notes-section engineer-notes",
            "ملاحظات المهندس المعتمِد",
            "Engineer Approval Notes",
            engineer_notes,
        ));
        html.push('\n');
    }

    html.push_str(concat!(
        r#"<div class="signature-section">"#,
        r#"<div class="signature-box"><div>توقيع الفني</div><div class="signature-en">Technician Signature</div></div>"#,
        r#"<div class="signature-box"><div>توقيع المهندس المعتمِد</div><div class="signature-en">Engineer Approval Signature</div></div>"#,
        "</div>\n"
    ));

    html.push_str(&format!(
        r#"<div class="footer"><div>تاريخ الطباعة: {}</div><div>{}</div></div>"#,
        printed_at.format("%Y-%m-%d"),
        FOOTER_OWNER
    ));
    html.push_str("\n</body>\n</html>\n");

    Ok(html)
}
