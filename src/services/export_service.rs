use crate::error::Result;
use crate::models::attempt::{AttemptRecord, AttemptResult};
use crate::utils::time::{now, report_stamp};
use rust_xlsxwriter::*;

pub struct ExportService;

impl ExportService {
    fn option_letter(index: usize) -> String {
        u8::try_from(index)
            .ok()
            .filter(|i| *i < 26)
            .map(|i| char::from(b'A' + i).to_string())
            .unwrap_or_else(|| "?".to_string())
    }

    fn format_options(options: &[String]) -> String {
        options
            .iter()
            .enumerate()
            .map(|(i, o)| format!("{}. {}", Self::option_letter(i), o))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Safe file-name fragment for a subject, e.g. "Data Structures" -> "Data_Structures".
    pub fn file_fragment(subject: &str) -> String {
        subject
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
            .collect()
    }
}

impl ExportService {
    /// Build a styled XLSX workbook from attempt history.
    pub fn generate_attempts_xlsx(attempts: &[AttemptRecord], title: &str) -> Result<Vec<u8>> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name("Attempts")?;

        // ── Color palette ──
        let primary_color = Color::RGB(0x1E293B);
        let header_bg = Color::RGB(0x0F172A);
        let header_text = Color::White;
        let alt_row_1 = Color::RGB(0xF8FAFC);
        let alt_row_2 = Color::White;
        let border_color = Color::RGB(0xE2E8F0);
        let correct_color = Color::RGB(0x10B981);
        let wrong_color = Color::RGB(0xEF4444);

        let columns = [
            ("#", 6.0),
            ("Subject", 22.0),
            ("Question", 60.0),
            ("Options", 45.0),
            ("Selected", 10.0),
            ("Correct", 10.0),
            ("Result", 12.0),
            ("Explanation", 60.0),
            ("Recorded", 20.0),
        ];
        let last_col = (columns.len() - 1) as u16;

        for (i, (_, width)) in columns.iter().enumerate() {
            worksheet.set_column_width(i as u16, *width)?;
        }

        // ── Title row ──
        let title_format = Format::new()
            .set_font_size(16)
            .set_bold()
            .set_font_color(header_text)
            .set_background_color(primary_color)
            .set_align(FormatAlign::CenterAcross)
            .set_align(FormatAlign::VerticalCenter);
        worksheet.set_row_height(0, 36)?;
        worksheet.merge_range(0, 0, 0, last_col, title, &title_format)?;

        // ── Subtitle row ──
        let subtitle_format = Format::new()
            .set_font_size(10)
            .set_italic()
            .set_font_color(Color::RGB(0x94A3B8))
            .set_background_color(primary_color)
            .set_align(FormatAlign::CenterAcross)
            .set_align(FormatAlign::VerticalCenter);
        worksheet.set_row_height(1, 22)?;
        let subtitle_text = format!(
            "Exported: {}  •  Attempts: {}",
            report_stamp(now()),
            attempts.len()
        );
        worksheet.merge_range(1, 0, 1, last_col, &subtitle_text, &subtitle_format)?;

        // ── Header row ──
        let header_format = Format::new()
            .set_bold()
            .set_font_size(10)
            .set_font_color(header_text)
            .set_background_color(header_bg)
            .set_align(FormatAlign::Center)
            .set_align(FormatAlign::VerticalCenter)
            .set_text_wrap()
            .set_border(FormatBorder::Thin)
            .set_border_color(border_color);

        let header_row = 2;
        worksheet.set_row_height(header_row, 26)?;
        for (i, (name, _)) in columns.iter().enumerate() {
            worksheet.write_string_with_format(header_row, i as u16, *name, &header_format)?;
        }

        let data_start_row = 3;
        if attempts.is_empty() {
            let empty_fmt = Format::new()
                .set_italic()
                .set_font_size(11)
                .set_align(FormatAlign::Center)
                .set_align(FormatAlign::VerticalCenter);
            worksheet.set_row_height(data_start_row, 28)?;
            worksheet.merge_range(
                data_start_row,
                0,
                data_start_row,
                last_col,
                "No attempted questions yet. Start practicing to build your report.",
                &empty_fmt,
            )?;
            return Ok(workbook.save_to_buffer()?);
        }

        // ── Data rows ──
        for (idx, attempt) in attempts.iter().enumerate() {
            let row = data_start_row + idx as u32;
            let bg = if idx % 2 == 0 { alt_row_1 } else { alt_row_2 };

            let base_fmt = Format::new()
                .set_font_size(10)
                .set_background_color(bg)
                .set_align(FormatAlign::VerticalCenter)
                .set_border(FormatBorder::Thin)
                .set_border_color(border_color);
            let center_fmt = base_fmt.clone().set_align(FormatAlign::Center);
            let wrap_fmt = base_fmt.clone().set_text_wrap();

            worksheet.write_number_with_format(row, 0, (idx + 1) as f64, &center_fmt)?;
            worksheet.write_string_with_format(row, 1, &attempt.subject, &base_fmt)?;
            worksheet.write_string_with_format(row, 2, &attempt.question, &wrap_fmt)?;
            worksheet.write_string_with_format(row, 3, Self::format_options(&attempt.options), &wrap_fmt)?;
            worksheet.write_string_with_format(row, 4, Self::option_letter(attempt.selected_option), &center_fmt)?;
            worksheet.write_string_with_format(row, 5, Self::option_letter(attempt.correct_option), &center_fmt)?;

            let result_color = match attempt.result {
                AttemptResult::Correct => correct_color,
                AttemptResult::Wrong => wrong_color,
            };
            let result_fmt = Format::new()
                .set_font_size(10)
                .set_bold()
                .set_font_color(Color::White)
                .set_background_color(result_color)
                .set_align(FormatAlign::Center)
                .set_align(FormatAlign::VerticalCenter)
                .set_border(FormatBorder::Thin)
                .set_border_color(border_color);
            worksheet.write_string_with_format(row, 6, attempt.result.as_str(), &result_fmt)?;

            let explanation: &str = if attempt.explanation.is_empty() { "—" } else { &attempt.explanation };
            worksheet.write_string_with_format(row, 7, explanation, &wrap_fmt)?;
            worksheet.write_string_with_format(row, 8, report_stamp(attempt.recorded_at), &center_fmt)?;
        }

        // ── Summary row ──
        let total_row = data_start_row + attempts.len() as u32 + 1;
        let summary_fmt = Format::new()
            .set_bold()
            .set_font_size(10)
            .set_font_color(primary_color)
            .set_background_color(Color::RGB(0xE0E7FF))
            .set_align(FormatAlign::Center)
            .set_align(FormatAlign::VerticalCenter)
            .set_border(FormatBorder::Thin)
            .set_border_color(border_color);

        let correct = attempts
            .iter()
            .filter(|a| a.result == AttemptResult::Correct)
            .count();
        let wrong = attempts.len() - correct;
        let accuracy = correct as f64 * 100.0 / attempts.len() as f64;
        let summary = format!(
            "Total: {}  |  Correct: {}  |  Wrong: {}  |  Accuracy: {:.0}%",
            attempts.len(),
            correct,
            wrong,
            accuracy
        );
        worksheet.set_row_height(total_row, 24)?;
        worksheet.merge_range(total_row, 0, total_row, last_col, &summary, &summary_fmt)?;

        worksheet.set_freeze_panes(3, 0)?;
        worksheet.autofilter(
            header_row,
            0,
            data_start_row + attempts.len() as u32 - 1,
            last_col,
        )?;

        let buffer = workbook.save_to_buffer()?;
        Ok(buffer)
    }
}
