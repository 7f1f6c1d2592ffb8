//! Style constants and default preset factories.

use crate::spec::{SpecCellFormat, SpecReportStyles};

/// Thin border style code.
pub const N_BORDER_THIN: i64 = 1;
/// No-border style code.
pub const N_BORDER_NONE: i64 = 0;

/// Data-row stripe fills.
pub const C_COLOR_STRIPE_EVEN: &str = "#FFFFFF";
pub const C_COLOR_STRIPE_ODD: &str = "#F2F2F2";
/// Subtotal row fill.
pub const C_COLOR_SUBTOTAL: &str = "#DDEBF7";
/// Outermost grouping-column fill.
pub const C_COLOR_HIGHLIGHT: &str = "#FCE4D6";
/// Header fill.
pub const C_COLOR_HEADER: &str = "#D9D9D9";

/// Build default style presets used by [`crate::builder::GroupedReportBuilder`].
pub fn derive_default_report_styles() -> SpecReportStyles {
    let cfg_base_fmt_spec = SpecCellFormat {
        border: Some(N_BORDER_THIN),
        valign: Some("vcenter".to_string()),
        ..Default::default()
    };

    SpecReportStyles {
        stripe_even: cfg_base_fmt_spec.with_(SpecCellFormat {
            bg_color: Some(C_COLOR_STRIPE_EVEN.to_string()),
            ..Default::default()
        }),
        stripe_odd: cfg_base_fmt_spec.with_(SpecCellFormat {
            bg_color: Some(C_COLOR_STRIPE_ODD.to_string()),
            ..Default::default()
        }),
        subtotal_row: cfg_base_fmt_spec.with_(SpecCellFormat {
            bold: Some(true),
            bg_color: Some(C_COLOR_SUBTOTAL.to_string()),
            top: Some(N_BORDER_THIN),
            bottom: Some(N_BORDER_THIN),
            ..Default::default()
        }),
        subtotal_col: SpecCellFormat {
            align: Some("center".to_string()),
            ..Default::default()
        },
        highlight_col: SpecCellFormat {
            bold: Some(true),
            bg_color: Some(C_COLOR_HIGHLIGHT.to_string()),
            ..Default::default()
        },
        header: cfg_base_fmt_spec.with_(SpecCellFormat {
            bold: Some(true),
            align: Some("center".to_string()),
            bg_color: Some(C_COLOR_HEADER.to_string()),
            ..Default::default()
        }),
    }
}
