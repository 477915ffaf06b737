use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::ProFormaError;
use crate::types::{Money, Multiple, Rate};
use crate::ProFormaResult;

const MIN_RATE: Decimal = dec!(-0.99);
const MAX_RATE: Decimal = dec!(100);

/// Newton-Raphson solver settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IrrSettings {
    /// Starting rate (0.10 = 10%)
    pub guess: Rate,
    /// Stop once the step between iterates is smaller than this
    pub tolerance: Decimal,
    pub max_iterations: u32,
}

impl Default for IrrSettings {
    fn default() -> Self {
        Self {
            guess: dec!(0.10),
            tolerance: dec!(0.00001),
            max_iterations: 100,
        }
    }
}

/// Outcome of an IRR solve. A non-converged result still carries the last
/// iterate so callers can report it alongside the flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrrResult {
    pub rate: Rate,
    pub iterations: u32,
    pub converged: bool,
}

/// Net Present Value of period-indexed cash flows: Σ amount / (1+r)^period
pub fn npv(rate: Rate, flows: &[(u32, Money)]) -> ProFormaResult<Money> {
    if rate <= dec!(-1) {
        return Err(ProFormaError::InvalidInput {
            field: "rate".into(),
            reason: "Discount rate must be greater than -100%".into(),
        });
    }

    npv_with_derivative(rate, flows)
        .map(|(value, _)| value)
        .ok_or_else(|| ProFormaError::DivisionByZero {
            context: format!("NPV discount factor at rate {rate}"),
        })
}

/// NPV and its first derivative with respect to the rate. `None` when a
/// discount factor overflows or underflows the decimal range.
fn npv_with_derivative(rate: Rate, flows: &[(u32, Money)]) -> Option<(Money, Decimal)> {
    let one_plus_r = Decimal::ONE + rate;
    let mut value = Decimal::ZERO;
    let mut derivative = Decimal::ZERO;

    for &(period, amount) in flows {
        let discount = one_plus_r.checked_powu(u64::from(period))?;
        if discount.is_zero() {
            return None;
        }
        value = value.checked_add(amount.checked_div(discount)?)?;

        if period > 0 {
            let t = Decimal::from(period);
            let next_discount = discount.checked_mul(one_plus_r)?;
            let term = t.checked_mul(amount)?.checked_div(next_discount)?;
            derivative = derivative.checked_sub(term)?;
        }
    }

    Some((value, derivative))
}

/// Internal Rate of Return over period-indexed cash flows using Newton-Raphson.
///
/// Iterates `r ← r − NPV(r)/NPV'(r)` from `settings.guess` until the step is
/// below `settings.tolerance` or `settings.max_iterations` is reached. Running
/// out of iterations, a flat derivative, or a decimal overflow all return the
/// last iterate with `converged = false`.
pub fn irr(flows: &[(u32, Money)], settings: &IrrSettings) -> ProFormaResult<IrrResult> {
    if flows.len() < 2 {
        return Err(ProFormaError::InvalidInput {
            field: "cash_flows".into(),
            reason: "IRR requires at least 2 cash flows".into(),
        });
    }

    let mut rate = settings.guess;

    for i in 0..settings.max_iterations {
        let Some((npv_val, dnpv)) = npv_with_derivative(rate, flows) else {
            log::warn!("IRR: discount factor out of range at rate {rate} after {i} iterations");
            return Ok(IrrResult {
                rate,
                iterations: i,
                converged: false,
            });
        };

        let step = match npv_val.checked_div(dnpv) {
            Some(step) if !dnpv.is_zero() => step,
            _ => {
                log::warn!("IRR: flat derivative at rate {rate} after {i} iterations");
                return Ok(IrrResult {
                    rate,
                    iterations: i,
                    converged: false,
                });
            }
        };

        let Some(next) = rate.checked_sub(step) else {
            log::warn!("IRR: step {step} out of range at rate {rate} after {i} iterations");
            return Ok(IrrResult {
                rate,
                iterations: i,
                converged: false,
            });
        };

        // Guard against divergence
        rate = next.clamp(MIN_RATE, MAX_RATE);

        if step.abs() < settings.tolerance {
            log::debug!("IRR converged to {rate} in {} iterations", i + 1);
            return Ok(IrrResult {
                rate,
                iterations: i + 1,
                converged: true,
            });
        }
    }

    log::warn!(
        "IRR did not converge after {} iterations (last rate {rate})",
        settings.max_iterations
    );
    Ok(IrrResult {
        rate,
        iterations: settings.max_iterations,
        converged: false,
    })
}

/// Equity multiple: Σ positive amounts / |Σ negative amounts|.
/// `None` when nothing was invested or the sums leave `Decimal` range.
pub fn equity_multiple(amounts: impl IntoIterator<Item = Money>) -> Option<Multiple> {
    let (inflows, outflows) = amounts
        .into_iter()
        .try_fold((Decimal::ZERO, Decimal::ZERO), |(inn, out), a| {
            if a > Decimal::ZERO {
                Some((inn.checked_add(a)?, out))
            } else {
                Some((inn, out.checked_add(a)?))
            }
        })?;

    if outflows.is_zero() {
        None
    } else {
        inflows.checked_div(outflows.abs())
    }
}

/// Level monthly payment on a fully amortising loan:
/// P * r / (1 - (1+r)^-n) with r the monthly rate.
pub fn monthly_payment(principal: Money, annual_rate: Rate, years: u32) -> ProFormaResult<Money> {
    if years == 0 {
        return Err(ProFormaError::InvalidInput {
            field: "amortization_years".into(),
            reason: "Amortization term must be at least 1 year".into(),
        });
    }

    let months = years
        .checked_mul(12)
        .ok_or_else(|| ProFormaError::InvalidInput {
            field: "amortization_years".into(),
            reason: format!("Amortization term of {years} years is out of range"),
        })?;
    let monthly_rate = annual_rate / dec!(12);

    if monthly_rate.is_zero() {
        return Ok(principal / Decimal::from(months));
    }

    let factor = (Decimal::ONE + monthly_rate)
        .checked_powu(u64::from(months))
        .ok_or_else(|| ProFormaError::InvalidInput {
            field: "permanent_loan_rate".into(),
            reason: format!("Rate {annual_rate} over {years} years overflows the payment factor"),
        })?;

    let denominator = factor - Decimal::ONE;
    if denominator.is_zero() {
        return Err(ProFormaError::DivisionByZero {
            context: "monthly payment annuity factor".into(),
        });
    }

    principal
        .checked_mul(monthly_rate)
        .and_then(|p| p.checked_mul(factor))
        .and_then(|p| p.checked_div(denominator))
        .ok_or_else(|| ProFormaError::InvalidInput {
            field: "permanent_loan_rate".into(),
            reason: format!("Payment on {principal} at {annual_rate} is out of range"),
        })
}
