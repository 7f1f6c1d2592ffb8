//! Grouped report builder: partitions records by grouping columns, blanks
//! repeated group values, injects subtotal rows and assigns row styles.

use tracing::debug;

use crate::spec::{
    EnumGroupOrder, EnumPrintRowKind, EnumRecordValue, Record, ReportError, SpecBuildOptions,
    SpecCellFormat, SpecGroupSpec, SpecPrintRow, SpecRecordSchema, SpecReportStyles, SpecRowStyle,
};
use crate::util::{
    apply_column_blankout, derive_run_border, partition_records_by_column, sum_total_column,
};

/// Alternating stripe counter shared by every data row of one build.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SpecStripeState {
    /// Stripe index of the next data row.
    pub n_idx_current: usize,
}

impl SpecStripeState {
    /// Return the fill of the next data row and advance the counter.
    pub fn next_fill<'a>(&mut self, styles: &'a SpecReportStyles) -> &'a SpecCellFormat {
        let fmt = if self.n_idx_current % 2 == 0 {
            &styles.stripe_even
        } else {
            &styles.stripe_odd
        };
        self.n_idx_current += 1;
        fmt
    }
}

/// Builds styled print rows out of flat records.
///
/// The builder is immutable; every [`Self::build`] call allocates its own
/// state, so one builder may serve concurrent exports.
#[derive(Debug, Clone, Default)]
pub struct GroupedReportBuilder {
    schema: Option<SpecRecordSchema>,
    styles: SpecReportStyles,
    options: SpecBuildOptions,
}

struct SpecBuildLevel<'a> {
    column: &'a str,
    title: Option<&'a str>,
}

struct SpecBuildContext<'a> {
    l_levels: Vec<SpecBuildLevel<'a>>,
    l_total_columns: Vec<&'a str>,
    record_zero: Record,
    styles: &'a SpecReportStyles,
    rule_order: EnumGroupOrder,
}

impl GroupedReportBuilder {
    /// Builder with default styles, reversed innermost ordering and a schema
    /// inferred from the first record of each build.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare the record schema used for subtotal zero-value templates.
    pub fn with_schema(mut self, schema: SpecRecordSchema) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Replace style presets.
    pub fn with_styles(mut self, styles: SpecReportStyles) -> Self {
        self.styles = styles;
        self
    }

    /// Replace builder options.
    pub fn with_options(mut self, options: SpecBuildOptions) -> Self {
        self.options = options;
        self
    }

    /// Style presets in use.
    pub fn styles(&self) -> &SpecReportStyles {
        &self.styles
    }

    /// Build print rows.
    ///
    /// `group_columns` lists grouping levels outermost first; each must have a
    /// matching entry in `group_specs`. Configuration is validated before any
    /// row is produced. Empty `records` yield an empty output.
    pub fn build<S, T>(
        &self,
        records: &[Record],
        group_columns: &[S],
        group_specs: &[SpecGroupSpec],
        total_columns: &[T],
    ) -> Result<Vec<SpecPrintRow>, ReportError>
    where
        S: AsRef<str>,
        T: AsRef<str>,
    {
        let l_levels = resolve_build_levels(group_columns, group_specs)?;
        if records.is_empty() {
            return Ok(vec![]);
        }

        let record_zero = match &self.schema {
            Some(schema) => schema.derive_zero_record(),
            None => SpecRecordSchema::infer_from_record(&records[0]).derive_zero_record(),
        };
        let n_levels = l_levels.len();
        let ctx = SpecBuildContext {
            l_levels,
            l_total_columns: total_columns.iter().map(|column| column.as_ref()).collect(),
            record_zero,
            styles: &self.styles,
            rule_order: self.options.rule_order,
        };

        let mut state = SpecStripeState::default();
        let l_records = records.to_vec();
        let l_rows = if n_levels == 0 {
            l_records
                .into_iter()
                .map(|record| ctx.create_data_row(record, &mut state))
                .collect()
        } else {
            ctx.build_level(l_records, 0, &mut state)
        };

        debug!(
            n_records = records.len(),
            n_levels,
            n_rows = l_rows.len(),
            "built grouped report rows"
        );
        Ok(l_rows)
    }
}

/// Build print rows with default builder settings.
///
/// See [`GroupedReportBuilder::build`].
pub fn build_grouped_rows<S, T>(
    records: &[Record],
    group_columns: &[S],
    group_specs: &[SpecGroupSpec],
    total_columns: &[T],
) -> Result<Vec<SpecPrintRow>, ReportError>
where
    S: AsRef<str>,
    T: AsRef<str>,
{
    GroupedReportBuilder::new().build(records, group_columns, group_specs, total_columns)
}

fn resolve_build_levels<'a, S>(
    group_columns: &'a [S],
    group_specs: &'a [SpecGroupSpec],
) -> Result<Vec<SpecBuildLevel<'a>>, ReportError>
where
    S: AsRef<str>,
{
    if group_columns.is_empty() && !group_specs.is_empty() {
        return Err(ReportError::MissingGroupColumns {
            n_specs: group_specs.len(),
        });
    }

    group_columns
        .iter()
        .map(|column| {
            let column = column.as_ref();
            let spec = group_specs
                .iter()
                .find(|spec| spec.column == column)
                .ok_or_else(|| ReportError::GroupSpecNotFound {
                    column: column.to_string(),
                })?;
            Ok(SpecBuildLevel {
                column,
                title: spec.derive_title(),
            })
        })
        .collect()
}

impl SpecBuildContext<'_> {
    fn build_level(
        &self,
        records: Vec<Record>,
        n_level: usize,
        state: &mut SpecStripeState,
    ) -> Vec<SpecPrintRow> {
        if n_level + 1 == self.l_levels.len() {
            return self.build_innermost_level(records, n_level, state);
        }

        let level = &self.l_levels[n_level];
        let mut l_rows = Vec::with_capacity(records.len());
        for l_partition in partition_records_by_column(records, level.column) {
            let mut l_block = self.build_level(l_partition, n_level + 1, state);
            apply_column_blankout(&mut l_block, level.column);

            if let Some(title) = level.title {
                let l_records_data: Vec<&Record> = l_block
                    .iter()
                    .filter(|row| row.is_data())
                    .map(|row| &row.data)
                    .collect();
                let row_subtotal =
                    self.create_subtotal_row(&l_records_data, level.column, title, n_level);
                l_block.push(row_subtotal);
            }

            if n_level == 0 {
                self.apply_outer_highlight(&mut l_block, level.column);
            }
            l_rows.extend(l_block);
        }
        l_rows
    }

    fn build_innermost_level(
        &self,
        records: Vec<Record>,
        n_level: usize,
        state: &mut SpecStripeState,
    ) -> Vec<SpecPrintRow> {
        let level = &self.l_levels[n_level];
        let mut l_rows: Vec<SpecPrintRow> = Vec::with_capacity(records.len());

        for l_partition in partition_records_by_column(records, level.column) {
            let mut l_block = Vec::with_capacity(l_partition.len() + 1);
            for (n_idx, mut record) in l_partition.into_iter().enumerate() {
                if n_idx > 0 {
                    record.insert(level.column.to_string(), EnumRecordValue::blank());
                }
                l_block.push(self.create_data_row(record, state));
            }

            if let Some(title) = level.title {
                let l_records_data: Vec<&Record> = l_block.iter().map(|row| &row.data).collect();
                let row_subtotal =
                    self.create_subtotal_row(&l_records_data, level.column, title, n_level);
                l_block.push(row_subtotal);
            }

            match self.rule_order {
                EnumGroupOrder::Reversed => {
                    l_block.append(&mut l_rows);
                    l_rows = l_block;
                }
                EnumGroupOrder::FirstSeen => l_rows.append(&mut l_block),
            }
        }
        l_rows
    }

    fn create_data_row(&self, record: Record, state: &mut SpecStripeState) -> SpecPrintRow {
        SpecPrintRow {
            data: record,
            style: SpecRowStyle::from_row(state.next_fill(self.styles).clone()),
            kind: EnumPrintRowKind::Data,
        }
    }

    fn create_subtotal_row(
        &self,
        records: &[&Record],
        column: &str,
        title: &str,
        n_level: usize,
    ) -> SpecPrintRow {
        let mut record = self.record_zero.clone();
        record.insert(column.to_string(), EnumRecordValue::from(title));
        for col_total in &self.l_total_columns {
            record.insert(
                col_total.to_string(),
                EnumRecordValue::Number(sum_total_column(records, col_total)),
            );
        }

        SpecPrintRow {
            data: record,
            style: SpecRowStyle::from_row(self.styles.subtotal_row.clone())
                .with_column(column, &self.styles.subtotal_col),
            kind: EnumPrintRowKind::Subtotal { level: n_level },
        }
    }

    fn apply_outer_highlight(&self, rows: &mut [SpecPrintRow], column: &str) {
        let n_rows = rows.len();
        for (n_idx, row) in rows.iter_mut().enumerate() {
            let fmt = self
                .styles
                .highlight_col
                .merge(&derive_run_border(n_idx, n_rows).to_format());
            row.style.merge_column(column, &fmt);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conf::{C_COLOR_HIGHLIGHT, N_BORDER_NONE, N_BORDER_THIN};

    fn make_record(pairs: &[(&str, EnumRecordValue)]) -> Record {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.clone()))
            .collect()
    }

    fn make_region_amt(region: &str, amt: f64) -> Record {
        make_record(&[("region", region.into()), ("amt", amt.into())])
    }

    fn make_region_office_amt(region: &str, office: &str, amt: f64) -> Record {
        make_record(&[
            ("region", region.into()),
            ("office", office.into()),
            ("amt", amt.into()),
        ])
    }

    fn scenario_records() -> Vec<Record> {
        vec![
            make_region_amt("E", 10.0),
            make_region_amt("E", 5.0),
            make_region_amt("W", 7.0),
        ]
    }

    fn text(value: &str) -> EnumRecordValue {
        EnumRecordValue::from(value)
    }

    #[test]
    fn test_single_level_titled_reverses_partition_blocks() {
        let l_rows = build_grouped_rows(
            &scenario_records(),
            &["region"],
            &[SpecGroupSpec::titled("region", "Subtotal")],
            &["amt"],
        )
        .expect("build");

        assert_eq!(l_rows.len(), 5);

        assert_eq!(l_rows[0].value("region"), &text("W"));
        assert_eq!(l_rows[0].value("amt"), &EnumRecordValue::Number(7.0));
        assert_eq!(l_rows[1].kind, EnumPrintRowKind::Subtotal { level: 0 });
        assert_eq!(l_rows[1].value("region"), &text("Subtotal"));
        assert_eq!(l_rows[1].value("amt"), &EnumRecordValue::Number(7.0));

        assert_eq!(l_rows[2].value("region"), &text("E"));
        assert_eq!(l_rows[3].value("region"), &EnumRecordValue::blank());
        assert_eq!(l_rows[3].value("amt"), &EnumRecordValue::Number(5.0));
        assert_eq!(l_rows[4].value("region"), &text("Subtotal"));
        assert_eq!(l_rows[4].value("amt"), &EnumRecordValue::Number(15.0));
    }

    #[test]
    fn test_single_level_first_seen_order() {
        let builder = GroupedReportBuilder::new().with_options(SpecBuildOptions {
            rule_order: EnumGroupOrder::FirstSeen,
        });
        let l_rows = builder
            .build(
                &scenario_records(),
                &["region"],
                &[SpecGroupSpec::titled("region", "Subtotal")],
                &["amt"],
            )
            .expect("build");

        let l_regions: Vec<&EnumRecordValue> = l_rows.iter().map(|row| row.value("region")).collect();
        assert_eq!(
            l_regions,
            vec![
                &text("E"),
                &EnumRecordValue::blank(),
                &text("Subtotal"),
                &text("W"),
                &text("Subtotal"),
            ]
        );
    }

    #[test]
    fn test_single_level_untitled_emits_no_subtotal() {
        let l_rows = build_grouped_rows(
            &scenario_records(),
            &["region"],
            &[SpecGroupSpec::untitled("region")],
            &["amt"],
        )
        .expect("build");

        assert_eq!(l_rows.len(), 3);
        assert!(l_rows.iter().all(SpecPrintRow::is_data));
        let n_blank = l_rows
            .iter()
            .filter(|row| row.value("region").is_blank())
            .count();
        assert_eq!(n_blank, 1);
        assert_eq!(l_rows[2].value("region"), &EnumRecordValue::blank());
    }

    #[test]
    fn test_empty_title_counts_as_untitled() {
        let l_rows = build_grouped_rows(
            &scenario_records(),
            &["region"],
            &[SpecGroupSpec::titled("region", "")],
            &["amt"],
        )
        .expect("build");
        assert_eq!(l_rows.len(), 3);
    }

    #[test]
    fn test_empty_records_yield_empty_output() {
        let l_rows = build_grouped_rows(
            &[],
            &["region"],
            &[SpecGroupSpec::titled("region", "Subtotal")],
            &["amt"],
        )
        .expect("build");
        assert!(l_rows.is_empty());
    }

    #[test]
    fn test_missing_total_column_sums_as_zero() {
        let records = vec![
            make_region_amt("E", 4.0),
            make_record(&[("region", "E".into())]),
            make_record(&[("region", "E".into()), ("amt", "3.5".into())]),
        ];

        let l_rows = build_grouped_rows(
            &records,
            &["region"],
            &[SpecGroupSpec::titled("region", "Total")],
            &["amt"],
        )
        .expect("build");

        let row_subtotal = l_rows.last().expect("subtotal row");
        assert_eq!(row_subtotal.value("amt"), &EnumRecordValue::Number(7.5));
    }

    #[test]
    fn test_group_column_without_spec_is_configuration_error() {
        let err = build_grouped_rows(
            &scenario_records(),
            &["region", "office"],
            &[SpecGroupSpec::titled("region", "Subtotal")],
            &["amt"],
        )
        .expect_err("office has no spec");
        assert_eq!(
            err,
            ReportError::GroupSpecNotFound {
                column: "office".to_string()
            }
        );
    }

    #[test]
    fn test_specs_without_group_columns_is_configuration_error() {
        let l_columns: [&str; 0] = [];
        let err = build_grouped_rows(
            &[],
            &l_columns,
            &[SpecGroupSpec::titled("region", "Subtotal")],
            &["amt"],
        )
        .expect_err("no group columns");
        assert_eq!(err, ReportError::MissingGroupColumns { n_specs: 1 });
    }

    #[test]
    fn test_ungrouped_rows_alternate_fill() {
        let l_columns: [&str; 0] = [];
        let l_totals: [&str; 0] = [];
        let l_rows = build_grouped_rows(&scenario_records(), &l_columns, &[], &l_totals)
            .expect("build");

        let styles = SpecReportStyles::default();
        assert_eq!(l_rows.len(), 3);
        assert_eq!(l_rows[0].style.row, styles.stripe_even);
        assert_eq!(l_rows[1].style.row, styles.stripe_odd);
        assert_eq!(l_rows[2].style.row, styles.stripe_even);
    }

    #[test]
    fn test_stripe_alternation_is_not_reset_per_partition() {
        let builder = GroupedReportBuilder::new().with_options(SpecBuildOptions {
            rule_order: EnumGroupOrder::FirstSeen,
        });
        let l_rows = builder
            .build(
                &scenario_records(),
                &["region"],
                &[SpecGroupSpec::untitled("region")],
                &["amt"],
            )
            .expect("build");

        let styles = builder.styles();
        assert_eq!(l_rows[0].style.row, styles.stripe_even);
        assert_eq!(l_rows[1].style.row, styles.stripe_odd);
        assert_eq!(l_rows[2].style.row, styles.stripe_even);
    }

    #[test]
    fn test_subtotal_row_uses_zero_template_and_centered_group_column() {
        let records = vec![make_record(&[
            ("region", "E".into()),
            ("note", "keep out".into()),
            ("flag", true.into()),
            ("amt", 2.0.into()),
        ])];

        let l_rows = build_grouped_rows(
            &records,
            &["region"],
            &[SpecGroupSpec::titled("region", "Sum")],
            &["amt"],
        )
        .expect("build");

        let row_subtotal = &l_rows[1];
        assert_eq!(row_subtotal.value("note"), &EnumRecordValue::blank());
        assert_eq!(row_subtotal.value("flag"), &EnumRecordValue::Bool(false));
        assert_eq!(row_subtotal.style.row.bold, Some(true));
        assert_eq!(row_subtotal.style.row.top, Some(N_BORDER_THIN));
        assert_eq!(row_subtotal.style.row.bottom, Some(N_BORDER_THIN));
        assert_eq!(
            row_subtotal.style.resolve_cell("region").align.as_deref(),
            Some("center")
        );
        assert!(row_subtotal.style.resolve_cell("note").align.is_none());
    }

    #[test]
    fn test_declared_schema_drives_subtotal_shape() {
        use crate::spec::EnumValueKind;

        let schema = SpecRecordSchema::new([
            ("region", EnumValueKind::String),
            ("amt", EnumValueKind::Number),
            ("count", EnumValueKind::Number),
        ]);
        let l_rows = GroupedReportBuilder::new()
            .with_schema(schema)
            .build(
                &[make_region_amt("E", 1.0)],
                &["region"],
                &[SpecGroupSpec::titled("region", "Sum")],
                &["amt"],
            )
            .expect("build");

        assert_eq!(l_rows[1].value("count"), &EnumRecordValue::Number(0.0));
    }

    #[test]
    fn test_two_levels_nest_subtotals_and_highlight_outer_column() {
        let records = vec![
            make_region_office_amt("E", "NY", 1.0),
            make_region_office_amt("E", "NY", 2.0),
            make_region_office_amt("E", "BOS", 4.0),
            make_region_office_amt("W", "LA", 8.0),
        ];

        let l_rows = build_grouped_rows(
            &records,
            &["region", "office"],
            &[
                SpecGroupSpec::titled("region", "Region total"),
                SpecGroupSpec::titled("office", "Office total"),
            ],
            &["amt"],
        )
        .expect("build");

        // E: BOS(1) + BOS subtotal + NY(2) + NY subtotal + E subtotal,
        // W: LA(1) + LA subtotal + W subtotal.
        assert_eq!(l_rows.len(), 9);

        assert_eq!(l_rows[0].value("region"), &text("E"));
        assert_eq!(l_rows[0].value("office"), &text("BOS"));
        assert_eq!(l_rows[1].kind, EnumPrintRowKind::Subtotal { level: 1 });
        assert_eq!(l_rows[1].value("office"), &text("Office total"));
        assert_eq!(l_rows[1].value("amt"), &EnumRecordValue::Number(4.0));
        assert_eq!(l_rows[2].value("office"), &text("NY"));
        assert_eq!(l_rows[2].value("region"), &EnumRecordValue::blank());
        assert_eq!(l_rows[3].value("office"), &EnumRecordValue::blank());
        assert_eq!(l_rows[4].value("amt"), &EnumRecordValue::Number(3.0));

        let row_region_e = &l_rows[5];
        assert_eq!(row_region_e.kind, EnumPrintRowKind::Subtotal { level: 0 });
        assert_eq!(row_region_e.value("region"), &text("Region total"));
        assert_eq!(row_region_e.value("amt"), &EnumRecordValue::Number(7.0));

        assert_eq!(l_rows[6].value("region"), &text("W"));
        assert_eq!(l_rows[8].value("amt"), &EnumRecordValue::Number(8.0));
        assert_eq!(l_rows[8].kind, EnumPrintRowKind::Subtotal { level: 0 });

        for row in &l_rows {
            let fmt_region = row.style.resolve_cell("region");
            assert_eq!(fmt_region.bg_color.as_deref(), Some(C_COLOR_HIGHLIGHT));
            assert_eq!(fmt_region.bold, Some(true));
            assert_ne!(
                row.style.resolve_cell("office").bg_color.as_deref(),
                Some(C_COLOR_HIGHLIGHT)
            );
        }
    }

    #[test]
    fn test_outer_highlight_borders_close_each_block() {
        let records = vec![
            make_region_office_amt("E", "NY", 1.0),
            make_region_office_amt("E", "BOS", 2.0),
        ];

        let l_rows = build_grouped_rows(
            &records,
            &["region", "office"],
            &[
                SpecGroupSpec::titled("region", "Region total"),
                SpecGroupSpec::untitled("office"),
            ],
            &["amt"],
        )
        .expect("build");

        assert_eq!(l_rows.len(), 3);
        let fmt_first = l_rows[0].style.resolve_cell("region");
        let fmt_mid = l_rows[1].style.resolve_cell("region");
        let fmt_last = l_rows[2].style.resolve_cell("region");
        assert_eq!(fmt_first.top, Some(N_BORDER_THIN));
        assert_eq!(fmt_first.bottom, Some(N_BORDER_NONE));
        assert_eq!(fmt_mid.top, Some(N_BORDER_NONE));
        assert_eq!(fmt_mid.bottom, Some(N_BORDER_NONE));
        assert_eq!(fmt_last.bottom, Some(N_BORDER_THIN));
    }

    #[test]
    fn test_row_count_property_over_three_levels() {
        let mut records = Vec::new();
        for region in ["E", "W"] {
            for office in ["A", "B", "C"] {
                for team in ["x", "y"] {
                    records.push(make_record(&[
                        ("region", region.into()),
                        ("office", office.into()),
                        ("team", team.into()),
                        ("amt", 1.0.into()),
                    ]));
                }
            }
        }

        let l_rows = build_grouped_rows(
            &records,
            &["region", "office", "team"],
            &[
                SpecGroupSpec::titled("region", "R"),
                SpecGroupSpec::untitled("office"),
                SpecGroupSpec::titled("team", "T"),
            ],
            &["amt"],
        )
        .expect("build");

        let n_data = l_rows.iter().filter(|row| row.is_data()).count();
        assert_eq!(n_data, records.len());
        // 2 region subtotals + 12 team subtotals, no office subtotals.
        assert_eq!(l_rows.len(), records.len() + 2 + 12);

        let row_region_total = l_rows
            .iter()
            .find(|row| row.kind == EnumPrintRowKind::Subtotal { level: 0 })
            .expect("region subtotal");
        assert_eq!(row_region_total.value("amt"), &EnumRecordValue::Number(6.0));
    }

    #[test]
    fn test_build_does_not_mutate_input() {
        let records = scenario_records();
        let records_before = records.clone();
        let _ = build_grouped_rows(
            &records,
            &["region"],
            &[SpecGroupSpec::titled("region", "Subtotal")],
            &["amt"],
        )
        .expect("build");
        assert_eq!(records, records_before);
    }
}
