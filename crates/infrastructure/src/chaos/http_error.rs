//! HTTP error injection

use application::ports::Exchange;
use async_trait::async_trait;
use domain::Parameters;
use parking_lot::Mutex;
use rand::{Rng, SeedableRng, rngs::StdRng};
use serde_json::{Value, json};
use tracing::debug;

use super::{ChaosError, Injector};

const TYPE: &str = "error";

/// Short-circuits the exchange with an error status drawn from `error_codes`
///
/// The body is `custom_body` when given as a non-empty string, otherwise a
/// JSON error document describing the status.
#[derive(Debug)]
pub struct ErrorInjector {
    rng: Mutex<StdRng>,
}

impl Default for ErrorInjector {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorInjector {
    /// Create an injector seeded from the OS
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    /// Create an injector with a fixed seed
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    fn error_codes(params: &Parameters) -> Result<Vec<u16>, ChaosError> {
        let codes = params
            .get("error_codes")
            .and_then(Value::as_array)
            .ok_or_else(|| ChaosError::invalid_parameters(TYPE, "error_codes must be a list"))?;
        if codes.is_empty() {
            return Err(ChaosError::invalid_parameters(
                TYPE,
                "error_codes must not be empty",
            ));
        }

        codes.iter().map(parse_code).collect()
    }
}

#[allow(clippy::cast_possible_truncation)]
fn parse_code(value: &Value) -> Result<u16, ChaosError> {
    let code = value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.fract() == 0.0)
            .map(|f| f as i64)
    });
    code.filter(|c| (400..=599).contains(c))
        .and_then(|c| u16::try_from(c).ok())
        .ok_or_else(|| {
            ChaosError::invalid_parameters(
                TYPE,
                format!("error code {value} is not an HTTP error status (400-599)"),
            )
        })
}

fn custom_body(params: &Parameters) -> Option<&str> {
    params
        .get("custom_body")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

/// Default JSON error document for a status code
pub(crate) fn default_body(code: u16) -> String {
    let (error, message) = match code {
        400 => ("Bad Request", "The request could not be understood by the server"),
        401 => ("Unauthorized", "Authentication is required"),
        403 => ("Forbidden", "Access to this resource is denied"),
        404 => ("Not Found", "The requested resource was not found"),
        408 => ("Request Timeout", "The server timed out waiting for the request"),
        429 => ("Too Many Requests", "Rate limit exceeded"),
        500 => ("Internal Server Error", "The server encountered an unexpected condition"),
        502 => ("Bad Gateway", "The upstream server returned an invalid response"),
        503 => ("Service Unavailable", "The service is temporarily unavailable"),
        504 => ("Gateway Timeout", "The upstream server did not respond in time"),
        _ => {
            return json!({
                "error": format!("HTTP Error {code}"),
                "message": format!("HTTP Error {code}"),
                "status": code,
            })
            .to_string();
        },
    };
    json!({ "error": error, "message": message, "status": code }).to_string()
}

#[async_trait]
impl Injector for ErrorInjector {
    fn injector_type(&self) -> &'static str {
        TYPE
    }

    fn validate(&self, params: &Parameters) -> Result<(), ChaosError> {
        Self::error_codes(params).map(|_| ())
    }

    async fn inject(
        &self,
        exchange: &mut dyn Exchange,
        params: &Parameters,
    ) -> Result<(), ChaosError> {
        let codes = Self::error_codes(params)?;
        let code = codes[self.rng.lock().random_range(0..codes.len())];

        let body = custom_body(params).map_or_else(|| default_body(code), str::to_string);

        debug!(path = %exchange.path(), status = code, "Injecting error response");
        exchange.set_response_status(code);
        exchange.set_response_header("content-type", "application/json");
        exchange.write_response_body(body.as_bytes());
        Ok(())
    }
}
