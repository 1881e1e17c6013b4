use axum::{
    Router,
    extract::{Json, Query},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::core::{
    CalculationError, CalculationMode, CalculationResult, Frequency, MAX_SOLVED_YEARS,
    ScenarioInput, calculate,
};

const NEUTRAL_FAILURE: &str = "Cannot compute with current inputs.";

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliFrequency {
    Monthly,
    Annually,
}

impl From<CliFrequency> for Frequency {
    fn from(value: CliFrequency) -> Self {
        match value {
            CliFrequency::Monthly => Frequency::Monthly,
            CliFrequency::Annually => Frequency::Annually,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliMode {
    EndAmount,
    AdditionalContribution,
    InvestmentLength,
}

impl From<CliMode> for CalculationMode {
    fn from(value: CliMode) -> Self {
        match value {
            CliMode::EndAmount => CalculationMode::EndAmount,
            CliMode::AdditionalContribution => CalculationMode::AdditionalContribution,
            CliMode::InvestmentLength => CalculationMode::InvestmentLength,
        }
    }
}

impl From<CalculationMode> for CliMode {
    fn from(value: CalculationMode) -> Self {
        match value {
            CalculationMode::EndAmount => CliMode::EndAmount,
            CalculationMode::AdditionalContribution => CliMode::AdditionalContribution,
            CalculationMode::InvestmentLength => CliMode::InvestmentLength,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ApiFrequency {
    #[serde(alias = "Monthly", alias = "month")]
    Monthly,
    #[serde(alias = "Annually", alias = "annual", alias = "yearly", alias = "year")]
    Annually,
}

impl From<ApiFrequency> for CliFrequency {
    fn from(value: ApiFrequency) -> Self {
        match value {
            ApiFrequency::Monthly => CliFrequency::Monthly,
            ApiFrequency::Annually => CliFrequency::Annually,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct CalculatePayload {
    #[serde(alias = "initialAmount")]
    starting_amount: Option<f64>,
    #[serde(alias = "monthlyContribution", alias = "contribution")]
    periodic_contribution: Option<f64>,
    years: Option<f64>,
    #[serde(alias = "interestRate", alias = "rate")]
    annual_rate_percent: Option<f64>,
    #[serde(alias = "contributionFrequency")]
    frequency: Option<ApiFrequency>,
    #[serde(alias = "target")]
    target_amount: Option<f64>,
    mode: Option<String>,
}

#[derive(Parser, Debug)]
#[command(
    name = "compound",
    about = "Compound growth projector: end balance, required contribution, or time to target"
)]
struct Cli {
    #[arg(long, default_value_t = 10_000.0, allow_hyphen_values = true)]
    starting_amount: f64,
    #[arg(
        long,
        default_value_t = 500.0,
        allow_hyphen_values = true,
        help = "Contribution per month; annual scenarios deposit twelve times this once a year"
    )]
    contribution: f64,
    #[arg(
        long,
        default_value_t = 20.0,
        allow_hyphen_values = true,
        help = "Investment horizon in years"
    )]
    years: f64,
    #[arg(
        long,
        default_value_t = 7.0,
        allow_hyphen_values = true,
        help = "Nominal annual interest rate in percent, e.g. 7"
    )]
    rate: f64,
    #[arg(long, value_enum, default_value_t = CliFrequency::Monthly)]
    frequency: CliFrequency,
    #[arg(
        long,
        default_value_t = 1_000_000.0,
        allow_hyphen_values = true,
        help = "Goal balance used by the contribution and length solvers"
    )]
    target: f64,
    #[arg(long, value_enum, default_value_t = CliMode::EndAmount)]
    mode: CliMode,
}

#[derive(Debug)]
struct ApiRequest {
    scenario: ScenarioInput,
    mode: CalculationMode,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CalculateResponse {
    mode: CalculationMode,
    frequency: Frequency,
    result: CalculationResult,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    kind: Option<&'static str>,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

fn build_scenario(cli: &Cli) -> Result<ScenarioInput, String> {
    let amounts = [
        ("--starting-amount", cli.starting_amount),
        ("--contribution", cli.contribution),
        ("--years", cli.years),
        ("--rate", cli.rate),
        ("--target", cli.target),
    ];
    for (flag, value) in amounts {
        if !value.is_finite() {
            return Err(format!("{flag} must be a finite number"));
        }
    }

    if cli.years < 0.0 {
        return Err("--years must be >= 0".to_string());
    }

    if cli.years > MAX_SOLVED_YEARS {
        return Err(format!("--years must be <= {MAX_SOLVED_YEARS}"));
    }

    Ok(ScenarioInput {
        starting_amount: cli.starting_amount,
        periodic_contribution: cli.contribution,
        years: cli.years,
        annual_rate_percent: cli.rate,
        frequency: cli.frequency.into(),
        target_amount: cli.target,
    })
}

fn default_cli_for_api() -> Cli {
    let defaults = ScenarioInput::default();
    Cli {
        starting_amount: defaults.starting_amount,
        contribution: defaults.periodic_contribution,
        years: defaults.years,
        rate: defaults.annual_rate_percent,
        frequency: CliFrequency::Monthly,
        target: defaults.target_amount,
        mode: CliMode::EndAmount,
    }
}

fn api_request_from_payload(payload: CalculatePayload) -> Result<ApiRequest, String> {
    let mut cli = default_cli_for_api();

    if let Some(v) = payload.starting_amount {
        cli.starting_amount = v;
    }
    if let Some(v) = payload.periodic_contribution {
        cli.contribution = v;
    }
    if let Some(v) = payload.years {
        cli.years = v;
    }
    if let Some(v) = payload.annual_rate_percent {
        cli.rate = v;
    }
    if let Some(v) = payload.frequency {
        cli.frequency = v.into();
    }
    if let Some(v) = payload.target_amount {
        cli.target = v;
    }
    if let Some(key) = payload.mode.as_deref() {
        let mode = key
            .parse::<CalculationMode>()
            .map_err(|e: CalculationError| e.to_string())?;
        cli.mode = mode.into();
    }

    let scenario = build_scenario(&cli)?;
    Ok(ApiRequest {
        scenario,
        mode: cli.mode.into(),
    })
}

/// Parses command-line flags, runs one calculation and returns the JSON
/// rendering of the response.
pub fn run_cli<I, T>(args: I) -> Result<String, String>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = Cli::try_parse_from(args).map_err(|e| e.to_string())?;
    let scenario = build_scenario(&cli)?;
    let mode: CalculationMode = cli.mode.into();

    let result = calculate(&scenario, mode).map_err(|e| format!("{NEUTRAL_FAILURE} ({e})"))?;
    let response = CalculateResponse {
        mode,
        frequency: scenario.frequency,
        result,
    };
    serde_json::to_string_pretty(&response).map_err(|e| format!("Failed to encode result: {e}"))
}

pub fn router() -> Router {
    Router::new()
        .route("/api/health", get(health_handler))
        .route(
            "/api/calculate",
            get(calculate_get_handler).post(calculate_post_handler),
        )
        .fallback(not_found_handler)
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "compound HTTP API listening");
    info!("local access: http://127.0.0.1:{port}/api/calculate");

    axum::serve(listener, router()).await
}

async fn health_handler() -> Response {
    json_response(StatusCode::OK, HealthResponse { status: "ok" })
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found", None)
}

async fn calculate_get_handler(Query(payload): Query<CalculatePayload>) -> Response {
    calculate_handler_impl(payload).await
}

async fn calculate_post_handler(Json(payload): Json<CalculatePayload>) -> Response {
    calculate_handler_impl(payload).await
}

async fn calculate_handler_impl(payload: CalculatePayload) -> Response {
    let request = match api_request_from_payload(payload) {
        Ok(request) => request,
        Err(msg) => {
            debug!(error = %msg, "rejected calculate request");
            return error_response(StatusCode::BAD_REQUEST, &msg, None);
        }
    };

    debug!(mode = ?request.mode, frequency = ?request.scenario.frequency, "calculate request");
    match calculate(&request.scenario, request.mode) {
        Ok(result) => json_response(
            StatusCode::OK,
            CalculateResponse {
                mode: request.mode,
                frequency: request.scenario.frequency,
                result,
            },
        ),
        Err(err) => {
            warn!(mode = ?request.mode, error = %err, "calculation failed");
            error_response(
                StatusCode::UNPROCESSABLE_ENTITY,
                NEUTRAL_FAILURE,
                Some(err.kind()),
            )
        }
    }
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str, kind: Option<&'static str>) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
            kind,
        },
    )
}

#[cfg(test)]
fn api_request_from_json(json: &str) -> Result<ApiRequest, String> {
    let payload = serde_json::from_str::<CalculatePayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    api_request_from_payload(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use tower::ServiceExt;

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

    async fn send(request: Request<Body>) -> (StatusCode, serde_json::Value, Response) {
        let response = router().oneshot(request).await.expect("router is infallible");
        let status = response.status();
        let (parts, body) = response.into_parts();
        let bytes = to_bytes(body, usize::MAX).await.expect("body should read");
        let json = serde_json::from_slice(&bytes).expect("response should be json");
        (status, json, Response::from_parts(parts, Body::empty()))
    }

    #[test]
    fn build_scenario_maps_flags() {
        let mut cli = sample_cli();
        cli.frequency = CliFrequency::Annually;
        cli.contribution = -25.0;

        let scenario = build_scenario(&cli).expect("valid scenario");
        assert_eq!(scenario.frequency, Frequency::Annually);
        assert_approx(scenario.periodic_contribution, -25.0);
        assert_approx(scenario.starting_amount, 10_000.0);
        assert_approx(scenario.annual_rate_percent, 7.0);
    }

    #[test]
    fn build_scenario_rejects_negative_years() {
        let mut cli = sample_cli();
        cli.years = -1.0;
        let err = build_scenario(&cli).expect_err("must reject negative years");
        assert!(err.contains("--years"));
    }

    #[test]
    fn build_scenario_rejects_non_finite_amounts() {
        let mut cli = sample_cli();
        cli.target = f64::NAN;
        let err = build_scenario(&cli).expect_err("must reject NaN target");
        assert!(err.contains("--target"));
    }

    #[test]
    fn build_scenario_rejects_excessive_horizon() {
        let mut cli = sample_cli();
        cli.years = 5_000.0;
        let err = build_scenario(&cli).expect_err("must reject long horizon");
        assert!(err.contains("--years must be <="));
    }

    #[test]
    fn api_request_from_json_parses_legacy_keys() {
        let json = r#"{
          "initialAmount": 2500,
          "monthlyContribution": 150,
          "years": 12,
          "interestRate": 5.5,
          "contributionFrequency": "Annually",
          "targetAmount": 90000,
          "mode": "AdditionalContribution"
        }"#;
        let request = api_request_from_json(json).expect("json should parse");
        let scenario = request.scenario;

        assert_approx(scenario.starting_amount, 2_500.0);
        assert_approx(scenario.periodic_contribution, 150.0);
        assert_approx(scenario.years, 12.0);
        assert_approx(scenario.annual_rate_percent, 5.5);
        assert_eq!(scenario.frequency, Frequency::Annually);
        assert_approx(scenario.target_amount, 90_000.0);
        assert_eq!(request.mode, CalculationMode::AdditionalContribution);
    }

    #[test]
    fn api_request_from_json_fills_defaults() {
        let request = api_request_from_json("{}").expect("json should parse");
        assert_eq!(request.scenario, ScenarioInput::default());
        assert_eq!(request.mode, CalculationMode::EndAmount);
    }

    #[test]
    fn api_request_from_json_rejects_unknown_mode() {
        let err = api_request_from_json(r#"{"mode": "retire-early"}"#)
            .expect_err("must reject unknown mode");
        assert!(err.contains("invalid calculation mode: retire-early"));
    }

    #[test]
    fn run_cli_renders_json_result() {
        let json = run_cli([
            "compound",
            "--rate",
            "0",
            "--years",
            "10",
            "--mode",
            "end-amount",
        ])
        .expect("cli should succeed");
        let value: serde_json::Value = serde_json::from_str(&json).expect("valid json");
        assert_eq!(value["mode"], "EndAmount");
        assert_eq!(value["frequency"], "Monthly");
        assert_eq!(value["result"]["endBalance"], 70_000.0);
        assert_eq!(
            value["result"]["yearlyBreakdown"]
                .as_array()
                .expect("breakdown array")
                .len(),
            10
        );
    }

    #[test]
    fn run_cli_reports_failures_neutrally() {
        let err = run_cli([
            "compound",
            "--target",
            "5",
            "--mode",
            "additional-contribution",
        ])
        .expect_err("target below start must fail");
        assert!(err.starts_with(NEUTRAL_FAILURE));
    }

    #[test]
    fn run_cli_rejects_negative_years_by_flag_name() {
        let err = run_cli(["compound", "--years", "-1"]).expect_err("negative years must fail");
        assert!(err.contains("--years must be >= 0"));
    }

    #[test]
    fn run_cli_returns_parse_errors_instead_of_exiting() {
        let err = run_cli(["compound", "--horizon", "5"]).expect_err("unknown flag must fail");
        assert!(err.contains("--horizon"));

        let err = run_cli(["compound", "--rate", "seven"]).expect_err("bad number must fail");
        assert!(err.contains("--rate"));
    }

    #[tokio::test]
    async fn health_endpoint_returns_ok() {
        let request = Request::get("/api/health")
            .body(Body::empty())
            .expect("valid request");
        let (status, json, _) = send(request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn calculate_post_returns_solved_contribution() {
        let body = r#"{"startingAmount": 10000, "years": 20, "annualRatePercent": 7,
                       "targetAmount": 1000000, "mode": "additional-contribution"}"#;
        let request = Request::post("/api/calculate")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .expect("valid request");
        let (status, json, response) = send(request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            response.headers()[header::CACHE_CONTROL],
            header::HeaderValue::from_static("no-store")
        );
        assert_eq!(json["mode"], "AdditionalContribution");
        assert!(json["result"]["solvedContribution"].as_f64().is_some());
        assert!(json["result"].get("solvedYears").is_none());
        let end_balance = json["result"]["endBalance"].as_f64().expect("end balance");
        assert!((end_balance - 1_000_000.0).abs() < 1e-3);
    }

    #[tokio::test]
    async fn calculate_get_accepts_query_string() {
        let request = Request::get(
            "/api/calculate?mode=InvestmentLength&annualRatePercent=0&periodicContribution=500&targetAmount=70000",
        )
        .body(Body::empty())
        .expect("valid request");
        let (status, json, _) = send(request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["result"]["solvedYears"], 10.0);
        assert!(
            json["result"]["summaryMessage"]
                .as_str()
                .expect("summary")
                .contains("$70,000.00")
        );
    }

    #[tokio::test]
    async fn calculate_failure_is_neutral_with_error_kind() {
        let body = r#"{"targetAmount": 100, "mode": "investment-length"}"#;
        let request = Request::post("/api/calculate")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .expect("valid request");
        let (status, json, _) = send(request).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(json["error"], NEUTRAL_FAILURE);
        assert_eq!(json["kind"], "invalid-target");
    }

    #[tokio::test]
    async fn calculate_rejects_invalid_inputs_with_bad_request() {
        let request = Request::get("/api/calculate?years=-3")
            .body(Body::empty())
            .expect("valid request");
        let (status, json, _) = send(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].as_str().expect("error").contains("--years"));
        assert!(json.get("kind").is_none());
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let request = Request::get("/nope")
            .body(Body::empty())
            .expect("valid request");
        let (status, json, _) = send(request).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"], "Not found");
    }
}
