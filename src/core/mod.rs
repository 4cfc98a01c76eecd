mod engine;
mod types;

pub use engine::{
    MAX_MONTHS, MINIMUM_PAYMENT_FLOOR, PAYOFF_EPSILON, calculate_payoff, minimum_payment,
    monthly_rate, resolve_target_payment, run_monthly_schedule, simulate_payoff,
};
pub use types::{PaymentType, PayoffInput, PayoffResult, ScheduleMonth, SimulationOutcome};
