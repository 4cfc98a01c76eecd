pub mod format;

use axum::{
    Router,
    extract::{Json, Query},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::core::{
    PaymentType, PayoffInput, PayoffResult, ScheduleMonth, calculate_payoff, monthly_rate,
    run_monthly_schedule,
};
use format::{format_duration_long, format_duration_short, format_money, show_savings};

const INDEX_HTML: &str = include_str!("../../web/index.html");
const STYLES_CSS: &str = include_str!("../../web/styles.css");
const APP_JS: &str = include_str!("../../web/app.js");

/// Caller-contract violations caught before the engine runs.
#[derive(Debug, Error, PartialEq)]
pub enum InputError {
    #[error("--balance must be a finite amount >= 0 (got {0})")]
    Balance(f64),
    #[error("--apr must be a finite percentage >= 0 (got {0})")]
    Apr(f64),
    #[error("--minimum-payment-percent must be a finite percentage > 0 (got {0})")]
    MinimumPaymentPercent(f64),
    #[error("--fixed-payment must be a finite amount >= 0 (got {0})")]
    FixedPayment(f64),
    #[error("--target-months must be >= 1 for timeline payoff")]
    TargetMonths,
}

#[derive(Debug, Error)]
pub enum CalcError {
    #[error(transparent)]
    Args(#[from] clap::Error),
    #[error(transparent)]
    Input(#[from] InputError),
    #[error("failed to encode result: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliPaymentType {
    Minimum,
    Fixed,
    Timeline,
}

impl From<CliPaymentType> for PaymentType {
    fn from(value: CliPaymentType) -> Self {
        match value {
            CliPaymentType::Minimum => PaymentType::Minimum,
            CliPaymentType::Fixed => PaymentType::Fixed,
            CliPaymentType::Timeline => PaymentType::Timeline,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ApiPaymentType {
    #[serde(alias = "min", alias = "minimum-only", alias = "minimumOnly")]
    Minimum,
    #[serde(alias = "fixed-payment", alias = "fixedPayment")]
    Fixed,
    #[serde(alias = "target-date", alias = "targetDate")]
    Timeline,
}

impl From<ApiPaymentType> for CliPaymentType {
    fn from(value: ApiPaymentType) -> Self {
        match value {
            ApiPaymentType::Minimum => CliPaymentType::Minimum,
            ApiPaymentType::Fixed => CliPaymentType::Fixed,
            ApiPaymentType::Timeline => CliPaymentType::Timeline,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct PayoffPayload {
    balance: Option<f64>,
    apr: Option<f64>,
    payment_type: Option<ApiPaymentType>,
    minimum_payment_percent: Option<f64>,
    fixed_payment: Option<f64>,
    target_months: Option<u32>,
    include_schedule: Option<bool>,
}

#[derive(Parser, Debug)]
#[command(
    name = "payoff calc",
    about = "Credit card payoff estimator (minimum, fixed, or target-date repayment)"
)]
struct Cli {
    #[arg(long, default_value_t = 5_000.0, help = "Current card balance")]
    balance: f64,
    #[arg(long, default_value_t = 18.99, help = "Annual interest rate in percent")]
    apr: f64,
    #[arg(long, value_enum, default_value_t = CliPaymentType::Minimum)]
    payment_type: CliPaymentType,
    #[arg(
        long,
        default_value_t = 2.0,
        help = "Minimum payment as percent of balance (floored at $25)"
    )]
    minimum_payment_percent: f64,
    #[arg(long, default_value_t = 200.0, help = "Monthly payment for --payment-type fixed")]
    fixed_payment: f64,
    #[arg(long, default_value_t = 36, help = "Payoff horizon for --payment-type timeline")]
    target_months: u32,
    #[arg(long, help = "Print the result as JSON")]
    json: bool,
    #[arg(long, help = "Include the month-by-month schedule")]
    schedule: bool,
}

#[derive(Debug)]
struct ApiRequest {
    input: PayoffInput,
    include_schedule: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DisplaySummary {
    monthly_payment: String,
    minimum_payment: String,
    starting_balance: String,
    total_interest: String,
    total_payment: String,
    time_to_payoff: String,
    time_to_payoff_short: String,
    total_months: String,
    min_payment_time: String,
    min_payment_total_interest: String,
    interest_savings: String,
    time_savings: String,
    show_savings: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PayoffResponse {
    input: PayoffInput,
    result: PayoffResult,
    display: DisplaySummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    schedule: Option<Vec<ScheduleMonth>>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn build_input(cli: &Cli) -> Result<PayoffInput, InputError> {
    if !cli.balance.is_finite() || cli.balance < 0.0 {
        return Err(InputError::Balance(cli.balance));
    }
    if !cli.apr.is_finite() || cli.apr < 0.0 {
        return Err(InputError::Apr(cli.apr));
    }
    if !cli.minimum_payment_percent.is_finite() || cli.minimum_payment_percent <= 0.0 {
        return Err(InputError::MinimumPaymentPercent(
            cli.minimum_payment_percent,
        ));
    }
    if !cli.fixed_payment.is_finite() || cli.fixed_payment < 0.0 {
        return Err(InputError::FixedPayment(cli.fixed_payment));
    }
    if cli.payment_type == CliPaymentType::Timeline && cli.target_months == 0 {
        return Err(InputError::TargetMonths);
    }

    Ok(PayoffInput {
        balance: cli.balance,
        apr: cli.apr,
        payment_type: cli.payment_type.into(),
        minimum_payment_percent: cli.minimum_payment_percent,
        fixed_payment: cli.fixed_payment,
        target_months: cli.target_months,
    })
}

/// Runs the `calc` subcommand and returns what should be printed on stdout.
pub fn run_calc_command<I, T>(args: I) -> Result<String, CalcError>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = Cli::try_parse_from(args)?;
    let input = build_input(&cli)?;
    let response = build_payoff_response(input, cli.schedule);

    if cli.json {
        return Ok(serde_json::to_string_pretty(&response)?);
    }
    Ok(render_text_summary(&response))
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "payoff HTTP API listening");
    info!("local access: http://127.0.0.1:{port}/");

    axum::serve(listener, router()).await
}

fn router() -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/index.html", get(index_handler))
        .route("/styles.css", get(styles_handler))
        .route("/app.js", get(app_js_handler))
        .route(
            "/api/payoff",
            get(payoff_get_handler).post(payoff_post_handler),
        )
        .fallback(not_found_handler)
}

async fn index_handler() -> impl IntoResponse {
    with_cache_control(Html(INDEX_HTML))
}

async fn styles_handler() -> impl IntoResponse {
    with_cache_control((
        [(header::CONTENT_TYPE, "text/css; charset=utf-8")],
        STYLES_CSS,
    ))
}

async fn app_js_handler() -> impl IntoResponse {
    with_cache_control((
        [(
            header::CONTENT_TYPE,
            "application/javascript; charset=utf-8",
        )],
        APP_JS,
    ))
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn payoff_get_handler(Query(payload): Query<PayoffPayload>) -> Response {
    payoff_handler_impl(payload)
}

async fn payoff_post_handler(Json(payload): Json<PayoffPayload>) -> Response {
    payoff_handler_impl(payload)
}

fn payoff_handler_impl(payload: PayoffPayload) -> Response {
    let request = match api_request_from_payload(payload) {
        Ok(request) => request,
        Err(err) => {
            warn!(error = %err, "rejected payoff request");
            return error_response(StatusCode::BAD_REQUEST, &err.to_string());
        }
    };

    let response = build_payoff_response(request.input, request.include_schedule);
    json_response(StatusCode::OK, response)
}

fn with_cache_control<R: IntoResponse>(response: R) -> Response {
    let mut response = response.into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    with_cache_control((status, Json(body)))
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
fn api_request_from_json(json: &str) -> Result<ApiRequest, String> {
    let payload = serde_json::from_str::<PayoffPayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    api_request_from_payload(payload).map_err(|e| e.to_string())
}

fn api_request_from_payload(payload: PayoffPayload) -> Result<ApiRequest, InputError> {
    let mut cli = default_cli_for_api();

    if let Some(v) = payload.balance {
        cli.balance = v;
    }
    if let Some(v) = payload.apr {
        cli.apr = v;
    }
    if let Some(v) = payload.payment_type {
        cli.payment_type = v.into();
    }
    if let Some(v) = payload.minimum_payment_percent {
        cli.minimum_payment_percent = v;
    }
    if let Some(v) = payload.fixed_payment {
        cli.fixed_payment = v;
    }
    if let Some(v) = payload.target_months {
        cli.target_months = v;
    }

    let input = build_input(&cli)?;
    Ok(ApiRequest {
        input,
        include_schedule: payload.include_schedule.unwrap_or(false),
    })
}

fn default_cli_for_api() -> Cli {
    Cli {
        balance: 5_000.0,
        apr: 18.99,
        payment_type: CliPaymentType::Minimum,
        minimum_payment_percent: 2.0,
        fixed_payment: 200.0,
        target_months: 36,
        json: true,
        schedule: false,
    }
}

fn build_payoff_response(input: PayoffInput, include_schedule: bool) -> PayoffResponse {
    let result = calculate_payoff(&input);
    debug!(
        payment_type = ?input.payment_type,
        monthly_payment = result.monthly_payment,
        months = result.months_to_payoff,
        "payoff calculated"
    );

    let schedule = include_schedule.then(|| {
        run_monthly_schedule(
            input.balance,
            monthly_rate(input.apr),
            result.monthly_payment,
            input.minimum_payment_percent,
        )
    });

    PayoffResponse {
        input,
        result,
        display: build_display_summary(&input, &result),
        schedule,
    }
}

fn build_display_summary(input: &PayoffInput, result: &PayoffResult) -> DisplaySummary {
    DisplaySummary {
        monthly_payment: format_money(result.monthly_payment, 2),
        minimum_payment: format_money(result.minimum_payment_amount, 2),
        starting_balance: format_money(input.balance, 2),
        total_interest: format_money(result.total_interest, 2),
        total_payment: format_money(result.total_payment, 2),
        time_to_payoff: format_duration_long(result.months_to_payoff),
        time_to_payoff_short: format_duration_short(result.months_to_payoff),
        total_months: format!("{} months", result.months_to_payoff),
        min_payment_time: format_duration_long(result.min_payment_months),
        min_payment_total_interest: format_money(result.min_payment_total_interest, 2),
        interest_savings: format_money(result.interest_savings, 0),
        time_savings: format!("{} months", result.time_savings),
        show_savings: show_savings(input, result),
    }
}

fn render_text_summary(response: &PayoffResponse) -> String {
    let display = &response.display;
    let mut rows = vec![
        ("Estimated Monthly Payment", display.monthly_payment.clone()),
        ("Estimated Minimum Payment", display.minimum_payment.clone()),
        ("Starting Balance", display.starting_balance.clone()),
        ("Estimated Total Interest", display.total_interest.clone()),
        ("Estimated Total Amount Paid", display.total_payment.clone()),
        ("Estimated Time to Pay Off", display.time_to_payoff.clone()),
        ("Total Months", display.total_months.clone()),
    ];
    if display.show_savings {
        rows.push(("Interest Saved vs Minimum", display.interest_savings.clone()));
        rows.push(("Time Saved vs Minimum", display.time_savings.clone()));
    }

    let label_width = rows.iter().map(|(label, _)| label.len()).max().unwrap_or(0);
    let mut out = String::new();
    for (label, value) in rows {
        out.push_str(&format!("{label:<label_width$}  {value:>14}\n"));
    }

    if let Some(schedule) = &response.schedule {
        out.push('\n');
        out.push_str(&format!(
            "{:>5}  {:>12}  {:>12}  {:>12}  {:>14}\n",
            "Month", "Payment", "Interest", "Principal", "Balance"
        ));
        for month in schedule {
            out.push_str(&format!(
                "{:>5}  {:>12}  {:>12}  {:>12}  {:>14}\n",
                month.month,
                format_money(month.payment, 2),
                format_money(month.interest, 2),
                format_money(month.principal, 2),
                format_money(month.end_balance, 2),
            ));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::MAX_MONTHS;

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn sample_cli() -> Cli {
        default_cli_for_api()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body should be readable");
        serde_json::from_slice(&bytes).expect("body should be JSON")
    }

    #[test]
    fn build_input_accepts_defaults() {
        let input = build_input(&sample_cli()).expect("valid input");
        assert_approx(input.balance, 5_000.0);
        assert_approx(input.apr, 18.99);
        assert_eq!(input.payment_type, PaymentType::Minimum);
        assert_eq!(input.target_months, 36);
    }

    #[test]
    fn build_input_rejects_negative_balance() {
        let mut cli = sample_cli();
        cli.balance = -1.0;
        let err = build_input(&cli).expect_err("must reject negative balance");
        assert_eq!(err, InputError::Balance(-1.0));
        assert!(err.to_string().contains("--balance"));
    }

    #[test]
    fn build_input_rejects_non_finite_apr() {
        let mut cli = sample_cli();
        cli.apr = f64::NAN;
        let err = build_input(&cli).expect_err("must reject NaN apr");
        assert!(err.to_string().contains("--apr"));
    }

    #[test]
    fn build_input_rejects_zero_minimum_percent() {
        let mut cli = sample_cli();
        cli.minimum_payment_percent = 0.0;
        let err = build_input(&cli).expect_err("must reject zero percent");
        assert_eq!(err, InputError::MinimumPaymentPercent(0.0));
    }

    #[test]
    fn build_input_rejects_zero_target_months_only_for_timeline() {
        let mut cli = sample_cli();
        cli.target_months = 0;
        assert!(build_input(&cli).is_ok());

        cli.payment_type = CliPaymentType::Timeline;
        let err = build_input(&cli).expect_err("must reject zero horizon");
        assert_eq!(err, InputError::TargetMonths);
    }

    #[test]
    fn api_request_from_json_parses_web_keys() {
        let json = r#"{
          "balance": 7500,
          "apr": 24.5,
          "paymentType": "timeline",
          "minimumPaymentPercent": 3,
          "fixedPayment": 350,
          "targetMonths": 24,
          "includeSchedule": true
        }"#;
        let request = api_request_from_json(json).expect("json should parse");
        let input = request.input;

        assert_approx(input.balance, 7_500.0);
        assert_approx(input.apr, 24.5);
        assert_eq!(input.payment_type, PaymentType::Timeline);
        assert_approx(input.minimum_payment_percent, 3.0);
        assert_approx(input.fixed_payment, 350.0);
        assert_eq!(input.target_months, 24);
        assert!(request.include_schedule);
    }

    #[test]
    fn api_request_from_json_fills_missing_keys_with_defaults() {
        let request = api_request_from_json(r#"{ "paymentType": "fixedPayment" }"#)
            .expect("json should parse");
        assert_eq!(request.input.payment_type, PaymentType::Fixed);
        assert_approx(request.input.balance, 5_000.0);
        assert_approx(request.input.fixed_payment, 200.0);
        assert!(!request.include_schedule);
    }

    #[test]
    fn api_request_from_json_rejects_unknown_payment_type() {
        let err = api_request_from_json(r#"{ "paymentType": "snowball" }"#)
            .expect_err("must reject unknown strategy");
        assert!(err.contains("Invalid API JSON payload"));
    }

    #[test]
    fn api_request_from_json_reports_validation_errors() {
        let err = api_request_from_json(r#"{ "paymentType": "timeline", "targetMonths": 0 }"#)
            .expect_err("must reject zero horizon");
        assert!(err.contains("--target-months"));
    }

    #[test]
    fn response_serializes_result_in_camel_case() {
        let input = build_input(&sample_cli()).expect("valid input");
        let response = build_payoff_response(input, false);
        let value = serde_json::to_value(&response).expect("serializable");

        assert_eq!(value["input"]["paymentType"], "minimum");
        assert!(value["result"]["monthsToPayoff"].is_u64());
        assert!(value["result"]["minPaymentTotalPaid"].is_f64());
        assert_eq!(value["display"]["showSavings"], false);
        assert!(value.get("schedule").is_none());
    }

    #[test]
    fn response_schedule_matches_summary() {
        let mut cli = sample_cli();
        cli.payment_type = CliPaymentType::Fixed;
        let input = build_input(&cli).expect("valid input");
        let response = build_payoff_response(input, true);

        let schedule = response.schedule.as_ref().expect("schedule requested");
        assert_eq!(schedule.len() as u32, response.result.months_to_payoff);
        let paid: f64 = schedule.iter().map(|m| m.payment).sum();
        assert!((paid - response.result.total_payment).abs() <= 1e-6);
    }

    #[test]
    fn display_summary_formats_zero_rate_timeline() {
        let input = PayoffInput {
            balance: 3_000.0,
            apr: 0.0,
            payment_type: PaymentType::Timeline,
            minimum_payment_percent: 2.0,
            fixed_payment: 0.0,
            target_months: 12,
        };
        let response = build_payoff_response(input, false);
        let display = &response.display;

        assert_eq!(display.monthly_payment, "$250.00");
        assert_eq!(display.starting_balance, "$3,000.00");
        assert_eq!(display.total_interest, "$0.00");
        assert_eq!(display.total_payment, "$3,000.00");
        assert_eq!(display.time_to_payoff, "1 years");
        assert_eq!(display.time_to_payoff_short, "1 yr");
        assert_eq!(display.total_months, "12 months");
        assert!(!display.show_savings);
    }

    #[test]
    fn display_summary_marks_stalled_debt() {
        let input = PayoffInput {
            balance: 100.0,
            apr: 999.0,
            payment_type: PaymentType::Minimum,
            minimum_payment_percent: 0.1,
            fixed_payment: 0.0,
            target_months: 12,
        };
        let response = build_payoff_response(input, false);
        assert_eq!(response.result.months_to_payoff, MAX_MONTHS);
        assert_eq!(response.display.time_to_payoff, "50+ years");
    }

    #[test]
    fn calc_command_prints_text_summary() {
        let out = run_calc_command([
            "payoff calc",
            "--balance",
            "5000",
            "--apr",
            "20",
            "--payment-type",
            "fixed",
            "--fixed-payment",
            "200",
        ])
        .expect("calc should succeed");

        assert!(out.contains("Estimated Monthly Payment"));
        assert!(out.contains("$200.00"));
        assert!(out.contains("2 years, 9 months"));
        assert!(out.contains("Interest Saved vs Minimum"));
    }

    #[test]
    fn calc_command_emits_json_with_schedule() {
        let out = run_calc_command([
            "payoff calc",
            "--balance",
            "1000",
            "--apr",
            "0",
            "--payment-type",
            "fixed",
            "--fixed-payment",
            "300",
            "--json",
            "--schedule",
        ])
        .expect("calc should succeed");

        let value: serde_json::Value = serde_json::from_str(&out).expect("valid JSON");
        assert_eq!(value["result"]["monthsToPayoff"], 4);
        assert_eq!(value["schedule"].as_array().map(Vec::len), Some(4));
    }

    #[test]
    fn calc_command_surfaces_validation_errors() {
        let err = run_calc_command(["payoff calc", "--minimum-payment-percent", "0"])
            .expect_err("must reject zero percent");
        assert!(matches!(
            err,
            CalcError::Input(InputError::MinimumPaymentPercent(_))
        ));
    }

    #[test]
    fn calc_command_rejects_unknown_flags() {
        let err = run_calc_command(["payoff calc", "--snowball"]).expect_err("unknown flag");
        assert!(matches!(err, CalcError::Args(_)));
    }

    #[tokio::test]
    async fn payoff_handler_returns_result_json() {
        let payload = PayoffPayload {
            balance: Some(5_000.0),
            apr: Some(20.0),
            payment_type: Some(ApiPaymentType::Fixed),
            fixed_payment: Some(200.0),
            ..PayoffPayload::default()
        };
        let response = payoff_handler_impl(payload);
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CACHE_CONTROL),
            Some(&header::HeaderValue::from_static("no-store"))
        );

        let body = body_json(response).await;
        assert_eq!(body["result"]["monthsToPayoff"], 33);
        assert_eq!(body["display"]["showSavings"], true);
    }

    #[tokio::test]
    async fn payoff_handler_rejects_invalid_input() {
        let payload = PayoffPayload {
            balance: Some(-10.0),
            ..PayoffPayload::default()
        };
        let response = payoff_handler_impl(payload);
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert!(
            body["error"]
                .as_str()
                .is_some_and(|msg| msg.contains("--balance"))
        );
    }

    #[tokio::test]
    async fn unknown_routes_return_json_404() {
        let response = not_found_handler().await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Not found");
    }
}
