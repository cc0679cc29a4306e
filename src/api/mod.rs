use axum::{
    Router,
    extract::{Json, Query},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::core::{
    BuyParams, ComparisonReport, ComparisonSummary, GeneralParams, InputBundle, RentParams,
    SellingParams, YearlyBuyRecord, YearlyInvestmentRecord, YearlyRentRecord, run_comparison,
};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
enum Verdict {
    Buy,
    Rent,
    Tie,
}

fn verdict_for(difference_in_net_worth: f64) -> Verdict {
    if difference_in_net_worth > 0.0 {
        Verdict::Buy
    } else if difference_in_net_worth < 0.0 {
        Verdict::Rent
    } else {
        Verdict::Tie
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ComparePayload {
    analysis_years: Option<u32>,
    inflation_rate: Option<f64>,
    savings_interest_rate: Option<f64>,
    house_appreciation_rate: Option<f64>,
    rent_increase_rate: Option<f64>,

    current_monthly_rent: Option<f64>,
    annual_renters_insurance: Option<f64>,

    cash_price: Option<f64>,
    downpayment: Option<f64>,
    closing_costs: Option<f64>,
    mortgage_rate: Option<f64>,
    mortgage_term_years: Option<u32>,
    interest_deduction_rate: Option<f64>,
    monthly_car_lease: Option<f64>,

    base_insurance: Option<f64>,
    base_maintenance: Option<f64>,
    base_renovations: Option<f64>,
    community_ownership_cost: Option<f64>,

    property_value_tax_rate_below_threshold: Option<f64>,
    property_value_tax_rate_above_threshold: Option<f64>,
    property_tax_threshold: Option<f64>,
    taxable_value_haircut: Option<f64>,
    land_tax_rate: Option<f64>,
    tax_authority_property_value: Option<f64>,
    tax_authority_land_value: Option<f64>,
    annual_revaluation_rate: Option<f64>,

    agent_commission_rate: Option<f64>,
    capital_gains_tax_rate: Option<f64>,
}

#[derive(Parser, Debug)]
#[command(
    name = "tenure",
    about = "Rent-vs-buy net-worth calculator (amortization, taxes, and rent-and-invest simulation)"
)]
struct Cli {
    #[arg(long, default_value_t = 30, help = "Analysis term in years (1-50)")]
    analysis_years: u32,
    #[arg(
        long,
        default_value_t = 2.5,
        help = "Annual inflation applied to ownership costs, in percent"
    )]
    inflation_rate: f64,
    #[arg(
        long,
        default_value_t = 3.5,
        help = "Annual return on the renter's invested capital, in percent"
    )]
    savings_interest_rate: f64,
    #[arg(
        long,
        default_value_t = 2.5,
        help = "Annual house market appreciation in percent"
    )]
    house_appreciation_rate: f64,
    #[arg(long, default_value_t = 1.5, help = "Annual rent increase in percent")]
    rent_increase_rate: f64,
    #[arg(long, default_value_t = 17_654.0)]
    current_monthly_rent: f64,
    #[arg(long, default_value_t = 0.0)]
    annual_renters_insurance: f64,
    #[arg(long, default_value_t = 6_200_000.0)]
    cash_price: f64,
    #[arg(long, default_value_t = 1_200_000.0)]
    downpayment: f64,
    #[arg(long, default_value_t = 200_000.0, help = "One-time upfront closing costs")]
    closing_costs: f64,
    #[arg(
        long,
        default_value_t = 5.03,
        help = "Annual mortgage interest rate in percent"
    )]
    mortgage_rate: f64,
    #[arg(long, default_value_t = 30)]
    mortgage_term_years: u32,
    #[arg(
        long,
        default_value_t = 33.0,
        help = "Share of mortgage interest deducted from taxes, in percent"
    )]
    interest_deduction_rate: f64,
    #[arg(long, default_value_t = 0.0)]
    monthly_car_lease: f64,
    #[arg(long, default_value_t = 30_000.0, help = "Home insurance in year 1")]
    base_insurance: f64,
    #[arg(long, default_value_t = 5_000.0, help = "Maintenance in year 1")]
    base_maintenance: f64,
    #[arg(long, default_value_t = 10_000.0, help = "Renovations in year 1")]
    base_renovations: f64,
    #[arg(
        long,
        default_value_t = 5_609.0,
        help = "Monthly community ownership fee in year 1"
    )]
    community_ownership_cost: f64,
    #[arg(
        long,
        default_value_t = 0.51,
        help = "Property value tax rate below the bracket threshold, in percent"
    )]
    property_value_tax_rate_below_threshold: f64,
    #[arg(
        long,
        default_value_t = 1.40,
        help = "Property value tax rate above the bracket threshold, in percent"
    )]
    property_value_tax_rate_above_threshold: f64,
    #[arg(
        long,
        default_value_t = 9_200_000.0,
        help = "Bracket threshold on the haircut assessed value"
    )]
    property_tax_threshold: f64,
    #[arg(
        long,
        default_value_t = 20.0,
        help = "Statutory discount on tax-authority valuations, in percent"
    )]
    taxable_value_haircut: f64,
    #[arg(long, default_value_t = 0.51, help = "Land tax rate in percent")]
    land_tax_rate: f64,
    #[arg(long, default_value_t = 6_822_000.0)]
    tax_authority_property_value: f64,
    #[arg(long, default_value_t = 3_869_000.0)]
    tax_authority_land_value: f64,
    #[arg(
        long,
        default_value_t = 1.5,
        help = "Annual growth of the tax-authority valuations, in percent"
    )]
    annual_revaluation_rate: f64,
    #[arg(
        long,
        default_value_t = 2.0,
        help = "Agent commission at sale, in percent of the final house value"
    )]
    agent_commission_rate: f64,
    #[arg(
        long,
        default_value_t = 0.0,
        help = "Capital gains tax at sale, in percent of the appreciation"
    )]
    capital_gains_tax_rate: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CompareResponse {
    analysis_years: u32,
    verdict: Verdict,
    summary: ComparisonSummary,
    rent_years: Vec<YearlyRentRecord>,
    buy_years: Vec<YearlyBuyRecord>,
    investment_years: Vec<YearlyInvestmentRecord>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn build_inputs(cli: Cli) -> Result<InputBundle, String> {
    if cli.analysis_years == 0 || cli.analysis_years > 50 {
        return Err("--analysis-years must be between 1 and 50".to_string());
    }

    if cli.mortgage_term_years == 0 {
        return Err("--mortgage-term-years must be > 0".to_string());
    }

    for (name, rate) in [
        ("--inflation-rate", cli.inflation_rate),
        ("--savings-interest-rate", cli.savings_interest_rate),
        ("--house-appreciation-rate", cli.house_appreciation_rate),
        ("--rent-increase-rate", cli.rent_increase_rate),
    ] {
        if !(0.0..=10.0).contains(&rate) {
            return Err(format!("{name} must be between 0 and 10"));
        }
    }

    if !(0.0..=15.0).contains(&cli.mortgage_rate) {
        return Err("--mortgage-rate must be between 0 and 15".to_string());
    }

    if !(0.0..=50.0).contains(&cli.interest_deduction_rate) {
        return Err("--interest-deduction-rate must be between 0 and 50".to_string());
    }

    if !(0.0..=5.0).contains(&cli.annual_revaluation_rate) {
        return Err("--annual-revaluation-rate must be between 0 and 5".to_string());
    }

    if !(0.0..=10.0).contains(&cli.agent_commission_rate) {
        return Err("--agent-commission-rate must be between 0 and 10".to_string());
    }

    if !(0.0..=50.0).contains(&cli.capital_gains_tax_rate) {
        return Err("--capital-gains-tax-rate must be between 0 and 50".to_string());
    }

    if !(0.0..=100.0).contains(&cli.taxable_value_haircut) {
        return Err("--taxable-value-haircut must be between 0 and 100".to_string());
    }

    for (name, rate) in [
        (
            "--property-value-tax-rate-below-threshold",
            cli.property_value_tax_rate_below_threshold,
        ),
        (
            "--property-value-tax-rate-above-threshold",
            cli.property_value_tax_rate_above_threshold,
        ),
        ("--land-tax-rate", cli.land_tax_rate),
    ] {
        if rate < 0.0 {
            return Err(format!("{name} must be >= 0"));
        }
    }

    for (name, amount) in [
        ("--current-monthly-rent", cli.current_monthly_rent),
        ("--annual-renters-insurance", cli.annual_renters_insurance),
        ("--cash-price", cli.cash_price),
        ("--downpayment", cli.downpayment),
        ("--closing-costs", cli.closing_costs),
        ("--monthly-car-lease", cli.monthly_car_lease),
        ("--base-insurance", cli.base_insurance),
        ("--base-maintenance", cli.base_maintenance),
        ("--base-renovations", cli.base_renovations),
        ("--community-ownership-cost", cli.community_ownership_cost),
        ("--property-tax-threshold", cli.property_tax_threshold),
        (
            "--tax-authority-property-value",
            cli.tax_authority_property_value,
        ),
        ("--tax-authority-land-value", cli.tax_authority_land_value),
    ] {
        if !amount.is_finite() || amount < 0.0 {
            return Err(format!("{name} must be >= 0"));
        }
    }

    if cli.downpayment > cli.cash_price {
        return Err("--downpayment cannot exceed --cash-price".to_string());
    }

    Ok(InputBundle {
        general: GeneralParams {
            analysis_years: cli.analysis_years,
            inflation_rate: cli.inflation_rate / 100.0,
            savings_interest_rate: cli.savings_interest_rate / 100.0,
            house_appreciation_rate: cli.house_appreciation_rate / 100.0,
            rent_increase_rate: cli.rent_increase_rate / 100.0,
        },
        rent: RentParams {
            current_monthly_rent: cli.current_monthly_rent,
            annual_renters_insurance: cli.annual_renters_insurance,
        },
        buy: BuyParams {
            cash_price: cli.cash_price,
            downpayment: cli.downpayment,
            closing_costs: cli.closing_costs,
            mortgage_rate: cli.mortgage_rate / 100.0,
            mortgage_term_years: cli.mortgage_term_years,
            interest_deduction_rate: cli.interest_deduction_rate / 100.0,
            monthly_car_lease: cli.monthly_car_lease,
            base_insurance: cli.base_insurance,
            base_maintenance: cli.base_maintenance,
            base_renovations: cli.base_renovations,
            community_ownership_cost: cli.community_ownership_cost,
            property_value_tax_rate_below_threshold: cli.property_value_tax_rate_below_threshold
                / 100.0,
            property_value_tax_rate_above_threshold: cli.property_value_tax_rate_above_threshold
                / 100.0,
            property_tax_threshold: cli.property_tax_threshold,
            taxable_value_haircut: cli.taxable_value_haircut / 100.0,
            land_tax_rate: cli.land_tax_rate / 100.0,
            tax_authority_property_value: cli.tax_authority_property_value,
            tax_authority_land_value: cli.tax_authority_land_value,
            annual_revaluation_rate: cli.annual_revaluation_rate / 100.0,
        },
        selling: SellingParams {
            agent_commission_rate: cli.agent_commission_rate / 100.0,
            capital_gains_tax_rate: cli.capital_gains_tax_rate / 100.0,
        },
    })
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = Router::new()
        .route(
            "/api/compare",
            get(compare_get_handler).post(compare_post_handler),
        )
        .fallback(not_found_handler);

    let listener = TcpListener::bind(addr).await?;
    log::info!("rent-vs-buy API listening on http://{addr}");

    axum::serve(listener, app).await
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn compare_get_handler(Query(payload): Query<ComparePayload>) -> Response {
    compare_handler_impl(payload).await
}

async fn compare_post_handler(Json(payload): Json<ComparePayload>) -> Response {
    compare_handler_impl(payload).await
}

async fn compare_handler_impl(payload: ComparePayload) -> Response {
    let inputs = match inputs_from_payload(payload) {
        Ok(inputs) => inputs,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };

    let report = match run_comparison(&inputs) {
        Ok(report) => report,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, &e.to_string()),
    };

    log::debug!(
        "compared {} years: net-worth difference {:.2}",
        inputs.general.analysis_years,
        report.summary.difference_in_net_worth
    );

    json_response(StatusCode::OK, build_compare_response(&inputs, report))
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        "no-store".parse().expect("valid header"),
    );
    response
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
fn compare_request_from_json(json: &str) -> Result<InputBundle, String> {
    let payload = serde_json::from_str::<ComparePayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    inputs_from_payload(payload)
}

fn inputs_from_payload(payload: ComparePayload) -> Result<InputBundle, String> {
    let mut cli = default_cli_for_api();

    if let Some(v) = payload.analysis_years {
        cli.analysis_years = v;
    }
    if let Some(v) = payload.inflation_rate {
        cli.inflation_rate = v;
    }
    if let Some(v) = payload.savings_interest_rate {
        cli.savings_interest_rate = v;
    }
    if let Some(v) = payload.house_appreciation_rate {
        cli.house_appreciation_rate = v;
    }
    if let Some(v) = payload.rent_increase_rate {
        cli.rent_increase_rate = v;
    }

    if let Some(v) = payload.current_monthly_rent {
        cli.current_monthly_rent = v;
    }
    if let Some(v) = payload.annual_renters_insurance {
        cli.annual_renters_insurance = v;
    }

    if let Some(v) = payload.cash_price {
        cli.cash_price = v;
    }
    if let Some(v) = payload.downpayment {
        cli.downpayment = v;
    }
    if let Some(v) = payload.closing_costs {
        cli.closing_costs = v;
    }
    if let Some(v) = payload.mortgage_rate {
        cli.mortgage_rate = v;
    }
    if let Some(v) = payload.mortgage_term_years {
        cli.mortgage_term_years = v;
    }
    if let Some(v) = payload.interest_deduction_rate {
        cli.interest_deduction_rate = v;
    }
    if let Some(v) = payload.monthly_car_lease {
        cli.monthly_car_lease = v;
    }

    if let Some(v) = payload.base_insurance {
        cli.base_insurance = v;
    }
    if let Some(v) = payload.base_maintenance {
        cli.base_maintenance = v;
    }
    if let Some(v) = payload.base_renovations {
        cli.base_renovations = v;
    }
    if let Some(v) = payload.community_ownership_cost {
        cli.community_ownership_cost = v;
    }

    if let Some(v) = payload.property_value_tax_rate_below_threshold {
        cli.property_value_tax_rate_below_threshold = v;
    }
    if let Some(v) = payload.property_value_tax_rate_above_threshold {
        cli.property_value_tax_rate_above_threshold = v;
    }
    if let Some(v) = payload.property_tax_threshold {
        cli.property_tax_threshold = v;
    }
    if let Some(v) = payload.taxable_value_haircut {
        cli.taxable_value_haircut = v;
    }
    if let Some(v) = payload.land_tax_rate {
        cli.land_tax_rate = v;
    }
    if let Some(v) = payload.tax_authority_property_value {
        cli.tax_authority_property_value = v;
    }
    if let Some(v) = payload.tax_authority_land_value {
        cli.tax_authority_land_value = v;
    }
    if let Some(v) = payload.annual_revaluation_rate {
        cli.annual_revaluation_rate = v;
    }

    if let Some(v) = payload.agent_commission_rate {
        cli.agent_commission_rate = v;
    }
    if let Some(v) = payload.capital_gains_tax_rate {
        cli.capital_gains_tax_rate = v;
    }

    build_inputs(cli)
}

fn default_cli_for_api() -> Cli {
    Cli {
        analysis_years: 30,
        inflation_rate: 2.5,
        savings_interest_rate: 3.5,
        house_appreciation_rate: 2.5,
        rent_increase_rate: 1.5,
        current_monthly_rent: 17_654.0,
        annual_renters_insurance: 0.0,
        cash_price: 6_200_000.0,
        downpayment: 1_200_000.0,
        closing_costs: 200_000.0,
        mortgage_rate: 5.03,
        mortgage_term_years: 30,
        interest_deduction_rate: 33.0,
        monthly_car_lease: 0.0,
        base_insurance: 30_000.0,
        base_maintenance: 5_000.0,
        base_renovations: 10_000.0,
        community_ownership_cost: 5_609.0,
        property_value_tax_rate_below_threshold: 0.51,
        property_value_tax_rate_above_threshold: 1.40,
        property_tax_threshold: 9_200_000.0,
        taxable_value_haircut: 20.0,
        land_tax_rate: 0.51,
        tax_authority_property_value: 6_822_000.0,
        tax_authority_land_value: 3_869_000.0,
        annual_revaluation_rate: 1.5,
        agent_commission_rate: 2.0,
        capital_gains_tax_rate: 0.0,
    }
}

fn build_compare_response(inputs: &InputBundle, report: ComparisonReport) -> CompareResponse {
    CompareResponse {
        analysis_years: inputs.general.analysis_years,
        verdict: verdict_for(report.summary.difference_in_net_worth),
        summary: report.summary,
        rent_years: report.rent_years,
        buy_years: report.buy_years,
        investment_years: report.investment_years,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn sample_cli() -> Cli {
        default_cli_for_api()
    }

    #[test]
    fn build_inputs_converts_percent_units_to_fractions() {
        let inputs = build_inputs(sample_cli()).expect("valid inputs");
        assert_approx(inputs.general.inflation_rate, 0.025);
        assert_approx(inputs.general.savings_interest_rate, 0.035);
        assert_approx(inputs.general.rent_increase_rate, 0.015);
        assert_approx(inputs.buy.mortgage_rate, 0.0503);
        assert_approx(inputs.buy.interest_deduction_rate, 0.33);
        assert_approx(inputs.buy.taxable_value_haircut, 0.20);
        assert_approx(inputs.buy.property_value_tax_rate_below_threshold, 0.0051);
        assert_approx(inputs.buy.property_value_tax_rate_above_threshold, 0.014);
        assert_approx(inputs.selling.agent_commission_rate, 0.02);
    }

    #[test]
    fn build_inputs_rejects_horizon_outside_slider_range() {
        let mut cli = sample_cli();
        cli.analysis_years = 51;
        let err = build_inputs(cli).expect_err("must reject");
        assert!(err.contains("--analysis-years"));
    }

    #[test]
    fn build_inputs_rejects_zero_mortgage_term() {
        let mut cli = sample_cli();
        cli.mortgage_term_years = 0;
        let err = build_inputs(cli).expect_err("must reject");
        assert!(err.contains("--mortgage-term-years"));
    }

    #[test]
    fn build_inputs_rejects_out_of_range_mortgage_rate() {
        let mut cli = sample_cli();
        cli.mortgage_rate = 15.1;
        let err = build_inputs(cli).expect_err("must reject");
        assert!(err.contains("--mortgage-rate"));
    }

    #[test]
    fn build_inputs_rejects_negative_rent() {
        let mut cli = sample_cli();
        cli.current_monthly_rent = -1.0;
        let err = build_inputs(cli).expect_err("must reject");
        assert!(err.contains("--current-monthly-rent"));
    }

    #[test]
    fn build_inputs_rejects_downpayment_above_price() {
        let mut cli = sample_cli();
        cli.cash_price = 1_000_000.0;
        cli.downpayment = 1_100_000.0;
        let err = build_inputs(cli).expect_err("must reject");
        assert!(err.contains("--downpayment"));
    }

    #[test]
    fn compare_request_from_json_parses_web_keys() {
        let json = r#"{
          "analysisYears": 10,
          "inflationRate": 2.0,
          "currentMonthlyRent": 12000,
          "cashPrice": 3000000,
          "downpayment": 600000,
          "closingCosts": 100000,
          "mortgageRate": 4.0,
          "mortgageTermYears": 20,
          "interestDeductionRate": 25.0,
          "propertyTaxThreshold": 8000000,
          "taxableValueHaircut": 15.0,
          "capitalGainsTaxRate": 10.0
        }"#;
        let inputs = compare_request_from_json(json).expect("json should parse");

        assert_eq!(inputs.general.analysis_years, 10);
        assert_approx(inputs.general.inflation_rate, 0.02);
        assert_approx(inputs.rent.current_monthly_rent, 12_000.0);
        assert_approx(inputs.buy.cash_price, 3_000_000.0);
        assert_approx(inputs.buy.downpayment, 600_000.0);
        assert_approx(inputs.buy.closing_costs, 100_000.0);
        assert_approx(inputs.buy.mortgage_rate, 0.04);
        assert_eq!(inputs.buy.mortgage_term_years, 20);
        assert_approx(inputs.buy.interest_deduction_rate, 0.25);
        assert_approx(inputs.buy.property_tax_threshold, 8_000_000.0);
        assert_approx(inputs.buy.taxable_value_haircut, 0.15);
        assert_approx(inputs.selling.capital_gains_tax_rate, 0.10);
        // Untouched fields keep their defaults.
        assert_approx(inputs.general.savings_interest_rate, 0.035);
        assert_approx(inputs.buy.tax_authority_property_value, 6_822_000.0);
    }

    #[test]
    fn compare_request_from_json_rejects_invalid_overrides() {
        let err = compare_request_from_json(r#"{"analysisYears": 0}"#).expect_err("must reject");
        assert!(err.contains("--analysis-years"));
    }

    #[test]
    fn verdict_follows_the_difference_sign() {
        assert_eq!(verdict_for(1.0), Verdict::Buy);
        assert_eq!(verdict_for(-1.0), Verdict::Rent);
        assert_eq!(verdict_for(0.0), Verdict::Tie);
        assert_eq!(
            serde_json::to_string(&Verdict::Rent).expect("must serialize"),
            "\"rent\""
        );
    }

    #[test]
    fn compare_response_serialization_contains_expected_fields() {
        let inputs = build_inputs(sample_cli()).expect("valid inputs");
        let report = run_comparison(&inputs).expect("valid inputs");
        let response = build_compare_response(&inputs, report);
        let json = serde_json::to_string(&response).expect("response should serialize");

        assert!(json.contains("\"verdict\""));
        assert!(json.contains("\"summary\""));
        assert!(json.contains("\"rentYears\""));
        assert!(json.contains("\"buyYears\""));
        assert!(json.contains("\"investmentYears\""));
        assert!(json.contains("\"differenceInNetWorth\""));
        assert!(json.contains("\"finalNetEquityBuying\""));
        assert!(json.contains("\"finalRentNetWorth\""));
        assert!(json.contains("\"monthlyRent\""));
        assert!(json.contains("\"mortgageBalanceEnd\""));
        assert!(json.contains("\"investmentEnd\""));
    }
}
