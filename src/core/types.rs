use serde::Serialize;

/// Repayment policy simulated against the card balance.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentType {
    /// Pay only the minimum floor each month.
    Minimum,
    /// Pay a fixed amount each month, never below the floor.
    Fixed,
    /// Pay the annuity amount that clears the balance in `target_months`.
    Timeline,
}

/// Caller-validated inputs for one payoff calculation.
///
/// `apr` and `minimum_payment_percent` are percentages (`18.99` means 18.99%).
/// `fixed_payment` only matters for [`PaymentType::Fixed`] and `target_months`
/// only for [`PaymentType::Timeline`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayoffInput {
    pub balance: f64,
    pub apr: f64,
    pub payment_type: PaymentType,
    pub minimum_payment_percent: f64,
    pub fixed_payment: f64,
    pub target_months: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayoffResult {
    pub monthly_payment: f64,
    pub total_interest: f64,
    pub total_payment: f64,
    pub months_to_payoff: u32,
    pub years_to_payoff: f64,
    pub minimum_payment_amount: f64,
    pub interest_savings: f64,
    pub time_savings: u32,
    pub min_payment_months: u32,
    pub min_payment_total_interest: f64,
    pub min_payment_total_paid: f64,
}

/// Totals from one run of the month-stepping simulator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationOutcome {
    pub months: u32,
    pub total_interest: f64,
    pub total_payment: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleMonth {
    pub month: u32,
    pub payment: f64,
    pub interest: f64,
    pub principal: f64,
    pub end_balance: f64,
}
