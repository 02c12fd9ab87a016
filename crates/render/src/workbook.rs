//! Workbook assembly.
//!
//! The workbook is built entirely in memory and returned as bytes; the
//! caller writes it to disk in one operation, so an aborted run never
//! leaves a half-written artifact behind.

use adperf_analytics::{AggregateRow, CrossRow, CrossSection, PeriodDelta, ReportTables};
use adperf_core::{BusinessRecord, CampaignRecord, ReportError, ReportResult};
use chrono::NaiveDate;
use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, Workbook, Worksheet};
use tracing::info;

// Report palette, carried over from the original report styling.
const PRIMARY: u32 = 0x1E3A5F;
const SECONDARY: u32 = 0x2E86AB;
const JN_BLUE: u32 = 0x2F5496;
const GREEN: u32 = 0x22C55E;
const ORANGE: u32 = 0xF97316;
const RED: u32 = 0xEF4444;
const GRAY_TEXT: u32 = 0x6B7280;

/// Renders a [`ReportTables`] set into the multi-sheet XLSX workbook.
pub struct WorkbookRenderer {
    /// Row cap for the raw-data sheets (Excel Online compatibility).
    pub raw_row_cap: usize,
}

impl Default for WorkbookRenderer {
    fn default() -> Self {
        Self {
            raw_row_cap: 10_000,
        }
    }
}

impl WorkbookRenderer {
    pub fn new(raw_row_cap: usize) -> Self {
        Self { raw_row_cap }
    }

    /// Build the workbook and return its bytes.
    pub fn render_to_bytes(
        &self,
        tables: &ReportTables,
        records: &[CampaignRecord],
        business: Option<&[BusinessRecord]>,
    ) -> ReportResult<Vec<u8>> {
        let mut workbook = Workbook::new();
        let formats = ReportFormats::new();

        self.add_summary_sheet(&mut workbook, tables, &formats)?;
        self.add_monthly_sheet(&mut workbook, tables, &formats)?;
        self.add_weekly_sheet(&mut workbook, tables, &formats)?;
        self.add_segment_sheet(&mut workbook, tables, &formats)?;
        self.add_portfolio_sheet(&mut workbook, tables, &formats)?;
        if tables.has_business_data() {
            self.add_organic_sheet(&mut workbook, tables, &formats)?;
        }
        self.add_campaign_data_sheet(&mut workbook, records, &formats)?;
        if let Some(business) = business {
            self.add_business_data_sheet(&mut workbook, business, &formats)?;
        }

        let buffer = workbook.save_to_buffer().map_err(render_err)?;
        info!(bytes = buffer.len(), "Workbook rendered");
        Ok(buffer)
    }

    fn add_summary_sheet(
        &self,
        workbook: &mut Workbook,
        tables: &ReportTables,
        formats: &ReportFormats,
    ) -> ReportResult<()> {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Executive Summary").map_err(render_err)?;

        sheet
            .merge_range(0, 0, 0, 7, "CAMPAIGN PERFORMANCE REPORT", &formats.title)
            .map_err(render_err)?;

        if let (Some(min), Some(max)) = (tables.date_min, tables.date_max) {
            let range = format!("Date Range: {} - {}", long_date(min), long_date(max));
            sheet
                .write_with_format(1, 0, range.as_str(), &formats.subtitle)
                .map_err(render_err)?;
        }
        let stamp = format!(
            "Generated: {}",
            chrono::Local::now().format("%b %d, %Y %H:%M")
        );
        sheet
            .write_with_format(2, 0, stamp.as_str(), &formats.stamp)
            .map_err(render_err)?;

        sheet
            .write_with_format(4, 0, "OVERALL PERFORMANCE", &formats.section)
            .map_err(render_err)?;

        let overall = &tables.overall;
        let (total_sales, tacos) = tables
            .overall_business
            .as_ref()
            .map(|b| (b.total_sales, b.tacos))
            .unwrap_or((0.0, 0.0));

        let cards = [
            ("Ad Spend", currency_label(overall.totals.spend)),
            ("Ad Sales", currency_label(overall.totals.sales)),
            ("ROAS", format!("{:.2}x", overall.metrics.roas)),
            ("ACoS", format!("{:.1}%", overall.metrics.acos)),
            ("Total Sales", currency_label(total_sales)),
            ("TACOS", format!("{:.1}%", tacos)),
            ("Orders", count_label(overall.totals.orders)),
            ("Clicks", count_label(overall.totals.clicks)),
            ("CVR", format!("{:.1}%", overall.metrics.cvr)),
        ];
        for (i, (label, value)) in cards.iter().enumerate() {
            let row = 5 + (i as u32 / 3) * 2;
            let col = (i as u16 % 3) * 2;
            sheet
                .write_with_format(row, col, *label, &formats.card_label)
                .map_err(render_err)?;
            sheet
                .write_with_format(row + 1, col, value.as_str(), &formats.card_value)
                .map_err(render_err)?;
        }

        let mut row = 13u32;
        row = self.write_breakdown_table(
            sheet,
            row,
            "PORTFOLIO BREAKDOWN",
            "Portfolio",
            &tables.by_portfolio,
            &formats.header_primary,
            formats,
        )?;
        row += 2;
        self.write_breakdown_table(
            sheet,
            row,
            "SEGMENT BREAKDOWN",
            "Segment",
            &tables.by_segment,
            &formats.header_branded,
            formats,
        )?;

        for (col, width) in [15.0, 14.0, 14.0, 10.0, 10.0, 12.0, 12.0, 12.0]
            .iter()
            .enumerate()
        {
            sheet.set_column_width(col as u16, *width).map_err(render_err)?;
        }
        Ok(())
    }

    /// Shared spend/sales/ROAS/ACoS/orders breakdown used twice on the
    /// summary sheet. Returns the row after the table.
    #[allow(clippy::too_many_arguments)]
    fn write_breakdown_table(
        &self,
        sheet: &mut Worksheet,
        mut row: u32,
        title: &str,
        key_header: &str,
        rows: &[AggregateRow],
        header_format: &Format,
        formats: &ReportFormats,
    ) -> ReportResult<u32> {
        sheet
            .write_with_format(row, 0, title, &formats.section)
            .map_err(render_err)?;
        row += 1;

        let headers = [key_header, "Spend", "Sales", "ROAS", "ACoS", "Orders"];
        for (col, header) in headers.iter().enumerate() {
            sheet
                .write_with_format(row, col as u16, *header, header_format)
                .map_err(render_err)?;
        }

        for group in rows {
            row += 1;
            sheet
                .write_with_format(row, 0, group.label.as_str(), &formats.bold)
                .map_err(render_err)?;
            sheet
                .write_with_format(row, 1, group.totals.spend, &formats.currency)
                .map_err(render_err)?;
            sheet
                .write_with_format(row, 2, group.totals.sales, &formats.currency)
                .map_err(render_err)?;
            sheet
                .write_with_format(row, 3, group.metrics.roas, &formats.decimal)
                .map_err(render_err)?;
            sheet
                .write_with_format(row, 4, group.metrics.acos / 100.0, &formats.percent)
                .map_err(render_err)?;
            sheet
                .write_with_format(row, 5, group.totals.orders as f64, &formats.integer)
                .map_err(render_err)?;
        }
        Ok(row + 1)
    }

    fn add_monthly_sheet(
        &self,
        workbook: &mut Workbook,
        tables: &ReportTables,
        formats: &ReportFormats,
    ) -> ReportResult<()> {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Monthly Performance").map_err(render_err)?;

        sheet
            .write_with_format(0, 0, "MONTHLY PERFORMANCE", &formats.heading)
            .map_err(render_err)?;

        let with_business = tables.has_business_data();
        let mut headers = vec![
            "Month", "Spend", "Sales", "ROAS", "ACoS", "Orders", "Clicks", "CVR",
        ];
        if with_business {
            headers.extend(["Total Sales", "Organic", "TACOS"]);
        }
        for (col, header) in headers.iter().enumerate() {
            sheet
                .write_with_format(2, col as u16, *header, &formats.header_primary)
                .map_err(render_err)?;
        }

        for (i, month) in tables.by_month.iter().enumerate() {
            let row = 3 + i as u32;
            sheet
                .write_with_format(row, 0, month.label.as_str(), &formats.text)
                .map_err(render_err)?;
            sheet
                .write_with_format(row, 1, month.totals.spend, &formats.currency)
                .map_err(render_err)?;
            sheet
                .write_with_format(row, 2, month.totals.sales, &formats.currency)
                .map_err(render_err)?;
            sheet
                .write_with_format(row, 3, month.metrics.roas, &formats.decimal)
                .map_err(render_err)?;
            sheet
                .write_with_format(row, 4, month.metrics.acos / 100.0, &formats.percent)
                .map_err(render_err)?;
            sheet
                .write_with_format(row, 5, month.totals.orders as f64, &formats.integer)
                .map_err(render_err)?;
            sheet
                .write_with_format(row, 6, month.totals.clicks as f64, &formats.integer)
                .map_err(render_err)?;
            sheet
                .write_with_format(row, 7, month.metrics.cvr / 100.0, &formats.percent2)
                .map_err(render_err)?;

            if let Some(figures) = &month.business {
                sheet
                    .write_with_format(row, 8, figures.total_sales, &formats.currency)
                    .map_err(render_err)?;
                sheet
                    .write_with_format(row, 9, figures.organic_sales, &formats.currency)
                    .map_err(render_err)?;
                sheet
                    .write_with_format(row, 10, figures.tacos / 100.0, &formats.percent)
                    .map_err(render_err)?;
            }
        }

        // Month-over-month changes below the main table.
        let start = tables.by_month.len() as u32 + 5;
        sheet
            .write_with_format(start, 0, "MONTH-OVER-MONTH CHANGES", &formats.section)
            .map_err(render_err)?;
        self.write_delta_table(sheet, start + 1, "Month", &tables.mom_changes, formats)?;

        for col in 0..11u16 {
            sheet.set_column_width(col, 14).map_err(render_err)?;
        }
        Ok(())
    }

    fn write_delta_table(
        &self,
        sheet: &mut Worksheet,
        start_row: u32,
        key_header: &str,
        deltas: &[PeriodDelta],
        formats: &ReportFormats,
    ) -> ReportResult<()> {
        let headers = [key_header, "Spend %", "Sales %", "ROAS %"];
        for (col, header) in headers.iter().enumerate() {
            sheet
                .write_with_format(start_row, col as u16, *header, &formats.header_secondary)
                .map_err(render_err)?;
        }
        for (i, delta) in deltas.iter().enumerate() {
            let row = start_row + 1 + i as u32;
            sheet
                .write_with_format(row, 0, delta.label.as_str(), &formats.text)
                .map_err(render_err)?;
            for (col, value) in [
                (1u16, delta.spend_pct),
                (2, delta.sales_pct),
                (3, delta.roas_pct),
            ] {
                let format = if value >= 0.0 {
                    &formats.percent_up
                } else {
                    &formats.percent_down
                };
                sheet
                    .write_with_format(row, col, value / 100.0, format)
                    .map_err(render_err)?;
            }
        }
        Ok(())
    }

    fn add_weekly_sheet(
        &self,
        workbook: &mut Workbook,
        tables: &ReportTables,
        formats: &ReportFormats,
    ) -> ReportResult<()> {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Weekly Performance").map_err(render_err)?;

        sheet
            .write_with_format(0, 0, "WEEKLY PERFORMANCE", &formats.heading)
            .map_err(render_err)?;

        let headers = ["Week", "Spend", "Sales", "ROAS", "ACoS", "Orders", "Clicks"];
        for (col, header) in headers.iter().enumerate() {
            sheet
                .write_with_format(2, col as u16, *header, &formats.header_primary)
                .map_err(render_err)?;
        }

        for (i, week) in tables.by_week.iter().enumerate() {
            let row = 3 + i as u32;
            sheet
                .write_with_format(row, 0, week.label.as_str(), &formats.text)
                .map_err(render_err)?;
            sheet
                .write_with_format(row, 1, week.totals.spend, &formats.currency)
                .map_err(render_err)?;
            sheet
                .write_with_format(row, 2, week.totals.sales, &formats.currency)
                .map_err(render_err)?;
            sheet
                .write_with_format(row, 3, week.metrics.roas, &formats.decimal)
                .map_err(render_err)?;
            sheet
                .write_with_format(row, 4, week.metrics.acos / 100.0, &formats.percent)
                .map_err(render_err)?;
            sheet
                .write_with_format(row, 5, week.totals.orders as f64, &formats.integer)
                .map_err(render_err)?;
            sheet
                .write_with_format(row, 6, week.totals.clicks as f64, &formats.integer)
                .map_err(render_err)?;
        }

        // Week-over-week changes below the main table.
        let start = tables.by_week.len() as u32 + 5;
        sheet
            .write_with_format(start, 0, "WEEK-OVER-WEEK CHANGES", &formats.section)
            .map_err(render_err)?;
        self.write_delta_table(sheet, start + 1, "Week", &tables.wow_changes, formats)?;

        for col in 0..7u16 {
            sheet.set_column_width(col, 14).map_err(render_err)?;
        }
        Ok(())
    }

    fn add_segment_sheet(
        &self,
        workbook: &mut Workbook,
        tables: &ReportTables,
        formats: &ReportFormats,
    ) -> ReportResult<()> {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Segment Analysis").map_err(render_err)?;

        sheet
            .write_with_format(0, 0, "SEGMENT PERFORMANCE BY MONTH", &formats.heading)
            .map_err(render_err)?;

        let groups: Vec<&str> = adperf_core::Segment::all()
            .iter()
            .map(|s| s.as_str())
            .collect::<Vec<_>>();
        let section = &tables.segment_by_month;

        let mut row = 2u32;
        row = self.write_month_matrix(
            sheet,
            row,
            "SPEND BY SEGMENT",
            "Segment",
            &groups,
            section,
            |cell| cell.totals.spend,
            &formats.header_primary,
            &formats.currency,
            false,
            formats,
        )?;
        row = self.write_month_matrix(
            sheet,
            row + 2,
            "SALES BY SEGMENT",
            "Segment",
            &groups,
            section,
            |cell| cell.totals.sales,
            &formats.header_jn,
            &formats.currency,
            false,
            formats,
        )?;
        self.write_month_matrix(
            sheet,
            row + 2,
            "ROAS BY SEGMENT",
            "Segment",
            &groups,
            section,
            |cell| cell.metrics.roas,
            &formats.header_branded,
            &formats.decimal,
            false,
            formats,
        )?;

        sheet.set_column_width(0, 14).map_err(render_err)?;
        for col in 1..=section.months.len() as u16 {
            sheet.set_column_width(col, 12).map_err(render_err)?;
        }
        Ok(())
    }

    fn add_portfolio_sheet(
        &self,
        workbook: &mut Workbook,
        tables: &ReportTables,
        formats: &ReportFormats,
    ) -> ReportResult<()> {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Portfolio Analysis").map_err(render_err)?;

        sheet
            .write_with_format(0, 0, "PORTFOLIO PERFORMANCE BY MONTH", &formats.heading)
            .map_err(render_err)?;

        let groups: Vec<&str> = adperf_core::PortfolioType::all()
            .iter()
            .map(|p| p.as_str())
            .collect::<Vec<_>>();
        let section = &tables.portfolio_by_month;

        let mut row = 2u32;
        row = self.write_month_matrix(
            sheet,
            row,
            "SPEND BY PORTFOLIO",
            "Portfolio",
            &groups,
            section,
            |cell| cell.totals.spend,
            &formats.header_primary,
            &formats.currency,
            true,
            formats,
        )?;
        row = self.write_month_matrix(
            sheet,
            row + 2,
            "SALES BY PORTFOLIO",
            "Portfolio",
            &groups,
            section,
            |cell| cell.totals.sales,
            &formats.header_jn,
            &formats.currency,
            true,
            formats,
        )?;
        // No total column for ROAS; a sum of ratios means nothing.
        self.write_month_matrix(
            sheet,
            row + 2,
            "ROAS BY PORTFOLIO",
            "Portfolio",
            &groups,
            section,
            |cell| cell.metrics.roas,
            &formats.header_branded,
            &formats.decimal,
            false,
            formats,
        )?;

        sheet.set_column_width(0, 12).map_err(render_err)?;
        for col in 1..=(section.months.len() + 1) as u16 {
            sheet.set_column_width(col, 12).map_err(render_err)?;
        }
        Ok(())
    }

    /// One groups × months matrix. Returns the row after the matrix.
    #[allow(clippy::too_many_arguments)]
    fn write_month_matrix(
        &self,
        sheet: &mut Worksheet,
        mut row: u32,
        title: &str,
        key_header: &str,
        groups: &[&str],
        section: &CrossSection,
        value_of: fn(&CrossRow) -> f64,
        header_format: &Format,
        value_format: &Format,
        with_total: bool,
        formats: &ReportFormats,
    ) -> ReportResult<u32> {
        sheet
            .write_with_format(row, 0, title, &formats.section)
            .map_err(render_err)?;
        row += 1;

        sheet
            .write_with_format(row, 0, key_header, header_format)
            .map_err(render_err)?;
        for (i, month) in section.months.iter().enumerate() {
            sheet
                .write_with_format(row, 1 + i as u16, month.as_str(), header_format)
                .map_err(render_err)?;
        }
        if with_total {
            sheet
                .write_with_format(row, 1 + section.months.len() as u16, "Total", header_format)
                .map_err(render_err)?;
        }

        for group in groups {
            row += 1;
            sheet
                .write_with_format(row, 0, *group, &formats.bold)
                .map_err(render_err)?;
            let mut total = 0.0;
            for (i, month) in section.months.iter().enumerate() {
                let value = section.cell(group, month).map(value_of).unwrap_or(0.0);
                total += value;
                sheet
                    .write_with_format(row, 1 + i as u16, value, value_format)
                    .map_err(render_err)?;
            }
            if with_total {
                sheet
                    .write_with_format(
                        row,
                        1 + section.months.len() as u16,
                        total,
                        value_format,
                    )
                    .map_err(render_err)?;
            }
        }
        Ok(row + 1)
    }

    fn add_organic_sheet(
        &self,
        workbook: &mut Workbook,
        tables: &ReportTables,
        formats: &ReportFormats,
    ) -> ReportResult<()> {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Organic vs Paid").map_err(render_err)?;

        sheet
            .write_with_format(0, 0, "ORGANIC VS PAID ANALYSIS", &formats.heading)
            .map_err(render_err)?;

        let figures = match &tables.overall_business {
            Some(figures) => figures,
            None => return Ok(()),
        };
        let ad_sales = tables.overall.totals.sales;
        let total = figures.total_sales;

        sheet
            .write_with_format(2, 0, "OVERALL SUMMARY", &formats.section)
            .map_err(render_err)?;

        let summary: [(&str, f64, &Format); 5] = [
            ("Total Sales", total, &formats.currency_bold),
            ("Ad Sales", ad_sales, &formats.currency_bold),
            ("Organic Sales", figures.organic_sales, &formats.currency_bold),
            (
                "Ad %",
                if total > 0.0 { ad_sales / total } else { 0.0 },
                &formats.percent_bold,
            ),
            (
                "Organic %",
                if total > 0.0 {
                    figures.organic_sales / total
                } else {
                    0.0
                },
                &formats.percent_bold,
            ),
        ];
        for (col, (label, value, format)) in summary.iter().enumerate() {
            sheet
                .write_with_format(3, col as u16, *label, &formats.header_competitor)
                .map_err(render_err)?;
            sheet
                .write_with_format(4, col as u16, *value, format)
                .map_err(render_err)?;
        }

        sheet
            .write_with_format(7, 0, "MONTHLY BREAKDOWN", &formats.section)
            .map_err(render_err)?;

        let headers = [
            "Month",
            "Total Sales",
            "Ad Sales",
            "Organic Sales",
            "Ad %",
            "Organic %",
            "TACOS",
        ];
        for (col, header) in headers.iter().enumerate() {
            sheet
                .write_with_format(8, col as u16, *header, &formats.header_competitor)
                .map_err(render_err)?;
        }

        for (i, month) in tables.organic_by_month.iter().enumerate() {
            let row = 9 + i as u32;
            sheet
                .write_with_format(row, 0, month.month.as_str(), &formats.text)
                .map_err(render_err)?;
            sheet
                .write_with_format(row, 1, month.total_sales, &formats.currency)
                .map_err(render_err)?;
            sheet
                .write_with_format(row, 2, month.ad_sales, &formats.currency)
                .map_err(render_err)?;
            sheet
                .write_with_format(row, 3, month.organic_sales, &formats.currency)
                .map_err(render_err)?;
            sheet
                .write_with_format(row, 4, month.ad_share, &formats.percent)
                .map_err(render_err)?;
            sheet
                .write_with_format(row, 5, month.organic_share, &formats.percent)
                .map_err(render_err)?;
            sheet
                .write_with_format(row, 6, month.tacos / 100.0, &formats.percent)
                .map_err(render_err)?;
        }

        for col in 0..7u16 {
            sheet.set_column_width(col, 14).map_err(render_err)?;
        }
        Ok(())
    }

    fn add_campaign_data_sheet(
        &self,
        workbook: &mut Workbook,
        records: &[CampaignRecord],
        formats: &ReportFormats,
    ) -> ReportResult<()> {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Campaign Data").map_err(render_err)?;

        let headers = [
            "Date",
            "Portfolio",
            "Campaign",
            "Spend",
            "Sales",
            "Orders",
            "Clicks",
            "Impressions",
            "Portfolio Type",
            "Segment",
            "Month",
        ];
        for (col, header) in headers.iter().enumerate() {
            sheet
                .write_with_format(0, col as u16, *header, &formats.header_primary)
                .map_err(render_err)?;
        }

        let shown = records.len().min(self.raw_row_cap);
        for (i, record) in records.iter().take(shown).enumerate() {
            let row = 1 + i as u32;
            sheet
                .write_with_format(row, 0, iso_date(record.date).as_str(), &formats.text)
                .map_err(render_err)?;
            sheet
                .write_with_format(row, 1, record.portfolio_name.as_str(), &formats.text)
                .map_err(render_err)?;
            sheet
                .write_with_format(row, 2, record.campaign_name.as_str(), &formats.text)
                .map_err(render_err)?;
            sheet
                .write_with_format(row, 3, record.spend, &formats.currency)
                .map_err(render_err)?;
            sheet
                .write_with_format(row, 4, record.sales, &formats.currency)
                .map_err(render_err)?;
            sheet
                .write_with_format(row, 5, record.orders as f64, &formats.integer)
                .map_err(render_err)?;
            sheet
                .write_with_format(row, 6, record.clicks as f64, &formats.integer)
                .map_err(render_err)?;
            sheet
                .write_with_format(row, 7, record.impressions as f64, &formats.integer)
                .map_err(render_err)?;
            sheet
                .write_with_format(row, 8, record.portfolio_type.as_str(), &formats.text)
                .map_err(render_err)?;
            sheet
                .write_with_format(row, 9, record.segment.as_str(), &formats.text)
                .map_err(render_err)?;
            sheet
                .write_with_format(row, 10, record.month_label().as_str(), &formats.text)
                .map_err(render_err)?;
        }
        self.write_cap_note(sheet, shown, records.len(), headers.len())?;

        for col in 0..headers.len() as u16 {
            sheet.set_column_width(col, 15).map_err(render_err)?;
        }
        Ok(())
    }

    fn add_business_data_sheet(
        &self,
        workbook: &mut Workbook,
        records: &[BusinessRecord],
        formats: &ReportFormats,
    ) -> ReportResult<()> {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Business Data").map_err(render_err)?;

        let headers = ["Date", "Total Sales", "Units", "Sessions", "Month"];
        for (col, header) in headers.iter().enumerate() {
            sheet
                .write_with_format(0, col as u16, *header, &formats.header_primary)
                .map_err(render_err)?;
        }

        let shown = records.len().min(self.raw_row_cap);
        for (i, record) in records.iter().take(shown).enumerate() {
            let row = 1 + i as u32;
            sheet
                .write_with_format(row, 0, iso_date(record.date).as_str(), &formats.text)
                .map_err(render_err)?;
            sheet
                .write_with_format(row, 1, record.total_sales, &formats.currency)
                .map_err(render_err)?;
            sheet
                .write_with_format(row, 2, record.units_ordered as f64, &formats.integer)
                .map_err(render_err)?;
            sheet
                .write_with_format(row, 3, record.sessions as f64, &formats.integer)
                .map_err(render_err)?;
            sheet
                .write_with_format(row, 4, record.month_label().as_str(), &formats.text)
                .map_err(render_err)?;
        }
        self.write_cap_note(sheet, shown, records.len(), headers.len())?;

        for col in 0..headers.len() as u16 {
            sheet.set_column_width(col, 15).map_err(render_err)?;
        }
        Ok(())
    }

    fn write_cap_note(
        &self,
        sheet: &mut Worksheet,
        shown: usize,
        total: usize,
        _columns: usize,
    ) -> ReportResult<()> {
        if shown < total {
            let note = format!("Note: Showing first {shown} of {total} rows");
            sheet
                .write(shown as u32 + 2, 0, note.as_str())
                .map_err(render_err)?;
        }
        Ok(())
    }
}

/// Reusable cell formats for the whole workbook.
struct ReportFormats {
    title: Format,
    heading: Format,
    section: Format,
    subtitle: Format,
    stamp: Format,
    card_label: Format,
    card_value: Format,
    header_primary: Format,
    header_secondary: Format,
    header_jn: Format,
    header_branded: Format,
    header_competitor: Format,
    bold: Format,
    text: Format,
    currency: Format,
    currency_bold: Format,
    decimal: Format,
    integer: Format,
    percent: Format,
    percent2: Format,
    percent_bold: Format,
    percent_up: Format,
    percent_down: Format,
}

impl ReportFormats {
    fn new() -> Self {
        let header = |color: u32| {
            Format::new()
                .set_bold()
                .set_font_color(0xFFFFFF)
                .set_font_size(11)
                .set_background_color(color)
                .set_align(FormatAlign::Center)
                .set_align(FormatAlign::VerticalCenter)
                .set_border(FormatBorder::Thin)
        };

        Self {
            title: Format::new().set_bold().set_font_size(20).set_font_color(PRIMARY),
            heading: Format::new().set_bold().set_font_size(16).set_font_color(PRIMARY),
            section: Format::new().set_bold().set_font_size(14).set_font_color(PRIMARY),
            subtitle: Format::new().set_font_size(12).set_font_color(GRAY_TEXT),
            stamp: Format::new()
                .set_font_size(10)
                .set_italic()
                .set_font_color(GRAY_TEXT),
            card_label: Format::new().set_font_size(9).set_font_color(GRAY_TEXT),
            card_value: Format::new().set_bold().set_font_size(16),
            header_primary: header(PRIMARY),
            header_secondary: header(SECONDARY),
            header_jn: header(JN_BLUE),
            header_branded: header(GREEN),
            header_competitor: header(ORANGE),
            bold: Format::new().set_bold(),
            text: Format::new(),
            currency: Format::new().set_num_format("$#,##0"),
            currency_bold: Format::new().set_bold().set_font_size(14).set_num_format("$#,##0"),
            decimal: Format::new().set_num_format("0.00"),
            integer: Format::new().set_num_format("#,##0"),
            percent: Format::new().set_num_format("0.0%"),
            percent2: Format::new().set_num_format("0.00%"),
            percent_bold: Format::new().set_bold().set_font_size(14).set_num_format("0.0%"),
            percent_up: Format::new().set_num_format("0.0%").set_font_color(GREEN),
            percent_down: Format::new().set_num_format("0.0%").set_font_color(RED),
        }
    }
}

fn render_err(e: rust_xlsxwriter::XlsxError) -> ReportError {
    ReportError::Render(e.to_string())
}

fn long_date(date: NaiveDate) -> String {
    date.format("%b %d, %Y").to_string()
}

fn iso_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// "$12,345" style label for metric cards.
fn currency_label(value: f64) -> String {
    format!("${}", group_thousands(value.round() as i64))
}

fn count_label(value: u64) -> String {
    group_thousands(value as i64)
}

fn group_thousands(value: i64) -> String {
    let digits = value.abs().to_string();
    let mut grouped = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if value < 0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adperf_core::{PortfolioType, Segment};

    fn record(day: u32, segment: Segment, spend: f64, sales: f64) -> CampaignRecord {
        CampaignRecord {
            date: NaiveDate::from_ymd_opt(2024, 9, day).unwrap(),
            portfolio_name: "JN-US".to_string(),
            campaign_name: "Acme campaign".to_string(),
            impressions: 2000,
            clicks: 80,
            spend,
            sales,
            orders: 6,
            portfolio_type: PortfolioType::Jn,
            segment,
        }
    }

    fn business(day: u32, total_sales: f64) -> BusinessRecord {
        BusinessRecord {
            date: NaiveDate::from_ymd_opt(2024, 9, day).unwrap(),
            total_sales,
            units_ordered: 30,
            sessions: 400,
        }
    }

    fn fixture() -> (Vec<CampaignRecord>, Vec<BusinessRecord>) {
        let records = vec![
            record(1, Segment::Branded, 40.0, 160.0),
            record(8, Segment::Competitor, 25.0, 50.0),
            record(15, Segment::NonBranded, 10.0, 5.0),
        ];
        let biz = vec![business(2, 600.0), business(9, 450.0)];
        (records, biz)
    }

    #[test]
    fn renders_a_valid_workbook_with_business_data() {
        let (records, biz) = fixture();
        let tables = ReportTables::build(&records, Some(&biz));
        let bytes = WorkbookRenderer::default()
            .render_to_bytes(&tables, &records, Some(&biz))
            .unwrap();
        // XLSX is a ZIP container.
        assert!(bytes.len() > 100);
        assert_eq!(&bytes[0..2], b"PK");
    }

    #[test]
    fn renders_without_business_data() {
        let (records, _) = fixture();
        let tables = ReportTables::build(&records, None);
        let bytes = WorkbookRenderer::default()
            .render_to_bytes(&tables, &records, None)
            .unwrap();
        assert_eq!(&bytes[0..2], b"PK");
    }

    #[test]
    fn raw_sheet_cap_does_not_break_rendering() {
        let (records, biz) = fixture();
        let tables = ReportTables::build(&records, Some(&biz));
        let bytes = WorkbookRenderer::new(1)
            .render_to_bytes(&tables, &records, Some(&biz))
            .unwrap();
        assert_eq!(&bytes[0..2], b"PK");
    }

    #[test]
    fn thousands_grouping() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1_000), "1,000");
        assert_eq!(group_thousands(1_234_567), "1,234,567");
        assert_eq!(currency_label(12345.6), "$12,346");
    }
}
