use crate::draft::DraftLine;
use crate::money::{normalize_price, normalize_quantity};

/// Amount of one draft line from its raw text fields. Never negative.
pub fn line_amount(line: &DraftLine) -> f64 {
    normalize_quantity(&line.quantity) as f64 * normalize_price(&line.unit_price)
}

/// Sum of every line amount, recomputed from scratch on each call.
pub fn invoice_total(lines: &[DraftLine]) -> f64 {
    lines.iter().map(line_amount).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(quantity: &str, unit_price: &str) -> DraftLine {
        DraftLine::new(quantity, unit_price, "item")
    }

    #[test]
    fn widget_scenario_totals_one_thousand() {
        let lines = vec![DraftLine::new("2", "500", "Widget")];
        assert_eq!(invoice_total(&lines), 1000.0);
    }

    #[test]
    fn empty_draft_totals_zero() {
        assert_eq!(invoice_total(&[]), 0.0);
    }

    #[test]
    fn invalid_fields_contribute_nothing() {
        let lines = vec![line("3", "10"), line("abc", "10"), line("2", ""), line("-1", "5")];
        assert_eq!(line_amount(&lines[1]), 0.0);
        assert_eq!(line_amount(&lines[2]), 0.0);
        assert_eq!(line_amount(&lines[3]), 0.0);
        assert_eq!(invoice_total(&lines), 30.0);
    }

    #[test]
    fn total_follows_edits() {
        let mut lines = vec![line("1", "100")];
        assert_eq!(invoice_total(&lines), 100.0);
        lines[0].quantity = "4".into();
        assert_eq!(invoice_total(&lines), 400.0);
        lines.push(line("1", "50"));
        assert_eq!(invoice_total(&lines), 450.0);
    }
}
