//! Residual land value: revenue less build, soft, finance and margin.

const FINANCE_RATE: f64 = 0.05;
const DEVELOPER_MARGIN: f64 = 0.15;

/// `None` unless both revenue and build cost are known.
pub fn residual_land_value(
    sales_revenue: Option<f64>,
    build_cost: Option<f64>,
    soft_costs: Option<f64>,
) -> Option<f64> {
    let revenue = sales_revenue?;
    let build = build_cost?;
    let soft = soft_costs.unwrap_or(0.0);
    let finance = FINANCE_RATE * (build + soft);
    let margin = DEVELOPER_MARGIN * revenue;
    Some(revenue - (build + soft + finance + margin))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn residual_formula() {
        let r = residual_land_value(Some(3_000_000.0), Some(1_500_000.0), Some(200_000.0)).unwrap();
        assert!((r - (3_000_000.0 - (1_700_000.0 + 85_000.0 + 450_000.0))).abs() < 1e-6);
    }

    #[test]
    fn needs_revenue_and_build() {
        assert_eq!(residual_land_value(None, Some(1.0), None), None);
        assert_eq!(residual_land_value(Some(1.0), None, Some(1.0)), None);
    }
}
