use tracing::debug;

use super::types::{PaymentType, PayoffInput, PayoffResult, ScheduleMonth, SimulationOutcome};

/// Flat issuer minimum applied when the percentage floor is smaller.
pub const MINIMUM_PAYMENT_FLOOR: f64 = 25.0;
/// Simulation cap (50 years). Outcomes at the cap mean "did not pay off".
pub const MAX_MONTHS: u32 = 600;
/// Remaining balance at or below this is treated as paid off.
pub const PAYOFF_EPSILON: f64 = 0.01;

#[derive(Debug, Clone, Copy)]
struct MonthStep {
    interest: f64,
    payment: f64,
    end_balance: f64,
}

pub fn monthly_rate(apr: f64) -> f64 {
    (apr / 100.0 / 12.0).max(0.0)
}

/// Floor payment for a given outstanding balance: `max(balance * pct / 100, 25)`.
pub fn minimum_payment(balance: f64, minimum_payment_percent: f64) -> f64 {
    (balance * (minimum_payment_percent / 100.0)).max(MINIMUM_PAYMENT_FLOOR)
}

/// Target monthly payment for the chosen strategy, before per-month clamping.
pub fn resolve_target_payment(input: &PayoffInput) -> f64 {
    let floor = minimum_payment(input.balance, input.minimum_payment_percent);
    match input.payment_type {
        PaymentType::Minimum => floor,
        PaymentType::Fixed => input.fixed_payment.max(floor),
        PaymentType::Timeline => {
            timeline_payment(input.balance, monthly_rate(input.apr), input.target_months).max(floor)
        }
    }
}

fn timeline_payment(balance: f64, rate: f64, target_months: u32) -> f64 {
    let months = target_months as f64;
    if rate == 0.0 {
        return balance / months;
    }
    let factor = (1.0 + rate).powf(months);
    balance * (rate * factor) / (factor - 1.0)
}

/// Steps the balance month by month until it is paid off or [`MAX_MONTHS`]
/// is reached. The minimum floor is re-evaluated against the remaining
/// balance every month.
pub fn simulate_payoff(
    balance: f64,
    monthly_rate: f64,
    payment: f64,
    minimum_payment_percent: f64,
) -> SimulationOutcome {
    run_simulation(balance, monthly_rate, payment, minimum_payment_percent, None)
}

/// Month-by-month trace of the same loop [`simulate_payoff`] runs.
pub fn run_monthly_schedule(
    balance: f64,
    monthly_rate: f64,
    payment: f64,
    minimum_payment_percent: f64,
) -> Vec<ScheduleMonth> {
    let mut schedule = Vec::new();
    let _ = run_simulation(
        balance,
        monthly_rate,
        payment,
        minimum_payment_percent,
        Some(&mut schedule),
    );
    schedule
}

pub fn calculate_payoff(input: &PayoffInput) -> PayoffResult {
    let rate = monthly_rate(input.apr);
    let minimum_payment_amount = minimum_payment(input.balance, input.minimum_payment_percent);
    let monthly_payment = resolve_target_payment(input);

    let chosen = simulate_payoff(
        input.balance,
        rate,
        monthly_payment,
        input.minimum_payment_percent,
    );
    let baseline = simulate_payoff(
        input.balance,
        rate,
        minimum_payment_amount,
        input.minimum_payment_percent,
    );

    PayoffResult {
        monthly_payment,
        total_interest: chosen.total_interest,
        total_payment: chosen.total_payment,
        months_to_payoff: chosen.months,
        years_to_payoff: chosen.months as f64 / 12.0,
        minimum_payment_amount,
        interest_savings: (baseline.total_interest - chosen.total_interest).max(0.0),
        time_savings: baseline.months.saturating_sub(chosen.months),
        min_payment_months: baseline.months,
        min_payment_total_interest: baseline.total_interest,
        min_payment_total_paid: baseline.total_payment,
    }
}

fn run_simulation(
    balance: f64,
    monthly_rate: f64,
    payment: f64,
    minimum_payment_percent: f64,
    mut trace: Option<&mut Vec<ScheduleMonth>>,
) -> SimulationOutcome {
    let mut remaining = balance;
    let mut total_interest = 0.0;
    let mut total_payment = 0.0;
    let mut months = 0;

    while remaining > PAYOFF_EPSILON && months < MAX_MONTHS {
        let step = step_month(remaining, monthly_rate, payment, minimum_payment_percent);
        total_interest += step.interest;
        total_payment += step.payment;
        remaining = step.end_balance;
        months += 1;

        if let Some(rows) = trace.as_deref_mut() {
            rows.push(ScheduleMonth {
                month: months,
                payment: step.payment,
                interest: step.interest,
                principal: step.payment - step.interest,
                end_balance: step.end_balance,
            });
        }

        // Payments never outpace interest: the balance cannot amortize.
        if step.payment <= step.interest && remaining >= balance {
            debug!(
                target: "payoff.engine",
                month = months,
                interest = step.interest,
                payment = step.payment,
                "stall guard fired"
            );
            months = MAX_MONTHS;
            break;
        }
    }

    SimulationOutcome {
        months,
        total_interest,
        total_payment,
    }
}

fn step_month(
    remaining: f64,
    monthly_rate: f64,
    payment: f64,
    minimum_payment_percent: f64,
) -> MonthStep {
    let interest = remaining * monthly_rate;
    let floor = minimum_payment(remaining, minimum_payment_percent);
    // max then min: the floor can exceed what is owed on a small balance.
    let actual = payment.max(floor).min(remaining + interest);
    MonthStep {
        interest,
        payment: actual,
        end_balance: remaining + interest - actual,
    }
}
