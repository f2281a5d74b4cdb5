use napi::Result as NapiResult;
use napi_derive::napi;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Amortization
// ---------------------------------------------------------------------------

#[napi]
pub fn project_balance(input_json: String) -> NapiResult<String> {
    let input: payoff_core::amortization::projector::ProjectionInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = payoff_core::amortization::projector::project(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn compare_scenarios(input_json: String) -> NapiResult<String> {
    let input: payoff_core::amortization::comparator::ComparisonInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = payoff_core::amortization::comparator::compare_scenarios(&input)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Card calculators
// ---------------------------------------------------------------------------

#[napi]
pub fn balance_transfer(input_json: String) -> NapiResult<String> {
    let input: payoff_core::card::balance_transfer::BalanceTransferInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = payoff_core::card::balance_transfer::analyze_balance_transfer(&input)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn minimum_payment(input_json: String) -> NapiResult<String> {
    let input: payoff_core::card::minimum_payment::MinimumPaymentInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = payoff_core::card::minimum_payment::analyze_minimum_payment(&input)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn late_fee(input_json: String) -> NapiResult<String> {
    let input: payoff_core::card::late_fee::LateFeeInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        payoff_core::card::late_fee::analyze_late_fee(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Time value
// ---------------------------------------------------------------------------

/// Level monthly payment that clears `balance` in `months` at `annual_rate`.
/// Decimal arguments are passed as strings to keep full precision.
#[napi]
pub fn payment_for_months(balance: String, annual_rate: String, months: u32) -> NapiResult<String> {
    let ceiling = payoff_core::amortization::projector::MAX_MONTHS_CEILING;
    if months > ceiling {
        return Err(napi::Error::from_reason(format!(
            "months must not exceed {ceiling}"
        )));
    }
    let balance: rust_decimal::Decimal = balance.parse().map_err(to_napi_error)?;
    let annual_rate: rust_decimal::Decimal = annual_rate.parse().map_err(to_napi_error)?;
    let payment = payoff_core::time_value::pmt(
        payoff_core::monthly_rate(annual_rate),
        months,
        balance,
        rust_decimal::Decimal::ZERO,
    )
    .map_err(to_napi_error)?;
    Ok((-payment).round_dp(2).to_string())
}
