use std::{fmt::Debug, str::FromStr, time::Duration};

use async_trait::async_trait;
use ethers::providers::{
    Http, HttpClientError, JsonRpcClient, JsonRpcError, ProviderError, RpcError,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, info, instrument, trace, warn};

/// Requests that prompt the user or change state. Retrying them could show a
/// second wallet prompt or send a transaction twice.
const METHODS_TO_NOT_RETRY: &[&str] = &[
    "eth_requestAccounts",
    "eth_estimateGas",
    "eth_sendTransaction",
    "eth_sendRawTransaction",
];

/// An HTTP Provider with a simple naive exponential backoff built-in
#[derive(Debug, Clone)]
pub struct RetryingProvider<P> {
    inner: P,
    max_requests: u32,
    base_retry_ms: u64,
}

impl<P> RetryingProvider<P> {
    /// Instantiate a RetryingProvider
    pub fn new(inner: P, max_requests: Option<u32>, base_retry_ms: Option<u64>) -> Self {
        Self {
            inner,
            max_requests: max_requests.unwrap_or(6).max(1),
            base_retry_ms: base_retry_ms.unwrap_or(50).max(1),
        }
    }

    /// Get the max_requests
    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    /// Get the base retry duration in ms.
    pub fn base_retry_ms(&self) -> u64 {
        self.base_retry_ms
    }
}

/// Delay before the attempt after `attempt`, doubling each time and
/// saturating instead of overflowing for long retry chains.
fn retry_delay_ms(base_retry_ms: u64, attempt: u32) -> u64 {
    base_retry_ms.saturating_mul(2u64.saturating_pow(attempt.saturating_sub(1)))
}

/// How to handle the result from the underlying provider
enum HandleMethod<R, PE> {
    Accept(R),
    Halt(PE),
    Retry(PE),
}

impl<P> RetryingProvider<P>
where
    P: JsonRpcClient,
{
    /// The retrying provider logic which accepts a matcher function that can
    /// handle specific cases for different underlying provider
    /// implementations.
    #[instrument(level = "error", skip_all, fields(method = %method))]
    async fn request_with_retry<T, R>(
        &self,
        method: &str,
        params: T,
        matcher: impl Fn(
            // result from the provider request
            Result<R, P::Error>,
            // which attempt this is
            u32,
            // what the next backoff will be in ms
            u64,
        ) -> HandleMethod<R, P::Error>,
    ) -> Result<R, RetryingProviderError<P>>
    where
        T: Debug + Serialize + Send + Sync,
        R: DeserializeOwned + Send,
    {
        let params = serde_json::to_value(params).map_err(RetryingProviderError::Params)?;

        let mut last_err;
        let mut i = 1;
        loop {
            let backoff_ms = retry_delay_ms(self.base_retry_ms, i);
            trace!(params = %params, "Dispatching request with params");
            debug!(attempt = i, "Dispatching request");

            let res = match params {
                Value::Null => self.inner.request(method, ()).await,
                _ => self.inner.request(method, &params).await,
            };

            match matcher(res, i, backoff_ms) {
                HandleMethod::Accept(v) => {
                    return Ok(v);
                }
                HandleMethod::Halt(e) => {
                    return Err(RetryingProviderError::JsonRpcClientError(e));
                }
                HandleMethod::Retry(e) => {
                    last_err = e;
                }
            }

            i += 1;
            if i <= self.max_requests {
                trace!(backoff_ms, "Retrying provider going to sleep.");
                sleep(Duration::from_millis(backoff_ms)).await;
            } else {
                trace!(
                    requests_made = self.max_requests,
                    "Retrying provider reached max requests."
                );
                return Err(RetryingProviderError::MaxRequests(last_err));
            }
        }
    }
}

/// Error type for the RetryingProvider
#[derive(Error, Debug)]
pub enum RetryingProviderError<P>
where
    P: JsonRpcClient,
{
    /// An internal error in the JSON RPC Client which we did not want to retry
    /// on.
    #[error(transparent)]
    JsonRpcClientError(P::Error),
    /// Hit max requests
    #[error("Hit max requests")]
    MaxRequests(P::Error),
    /// Request parameters could not be serialized
    #[error("Invalid request params: {0}")]
    Params(serde_json::Error),
}

impl<P> RpcError for RetryingProviderError<P>
where
    P: JsonRpcClient,
{
    fn as_error_response(&self) -> Option<&JsonRpcError> {
        match self {
            Self::JsonRpcClientError(e) | Self::MaxRequests(e) => e.as_error_response(),
            Self::Params(_) => None,
        }
    }

    fn as_serde_error(&self) -> Option<&serde_json::Error> {
        match self {
            Self::JsonRpcClientError(e) | Self::MaxRequests(e) => e.as_serde_error(),
            Self::Params(e) => Some(e),
        }
    }
}

impl<P> From<RetryingProviderError<P>> for ProviderError
where
    P: JsonRpcClient + 'static,
    <P as JsonRpcClient>::Error: Send + Sync,
{
    fn from(src: RetryingProviderError<P>) -> Self {
        ProviderError::JsonRpcClientError(Box::new(src))
    }
}

#[async_trait]
impl JsonRpcClient for RetryingProvider<Http> {
    type Error = RetryingProviderError<Http>;

    #[instrument(level = "error", skip(self), fields(provider_host = %self.inner.url().host_str().unwrap_or("unknown")))]
    async fn request<T, R>(&self, method: &str, params: T) -> Result<R, Self::Error>
    where
        T: Debug + Serialize + Send + Sync,
        R: DeserializeOwned + Send,
    {
        self.request_with_retry::<T, R>(method, params, |res, attempt, next_backoff_ms| match res {
            Ok(res) => HandleMethod::Accept(res),
            Err(HttpClientError::ReqwestError(e)) => {
                if METHODS_TO_NOT_RETRY.contains(&method) {
                    warn!(attempt, error = %e, "ReqwestError in http provider; not retrying.");
                    HandleMethod::Halt(HttpClientError::ReqwestError(e))
                } else {
                    info!(
                        next_backoff_ms,
                        retries_remaining = self.max_requests - attempt,
                        error = %e,
                        "ReqwestError in http provider.",
                    );
                    HandleMethod::Retry(HttpClientError::ReqwestError(e))
                }
            }
            Err(HttpClientError::JsonRpcError(e)) => {
                // An error object means the node (or wallet) answered; asking
                // again will not change a rejection or a revert.
                warn!(attempt, error = %e, "JsonRpcError in http provider; not retrying.");
                HandleMethod::Halt(HttpClientError::JsonRpcError(e))
            }
            Err(HttpClientError::SerdeJson { err, text }) => {
                info!(attempt, next_backoff_ms, error = %err, text = text, "SerdeJson error in http provider");
                HandleMethod::Retry(HttpClientError::SerdeJson { err, text })
            }
        })
        .await
    }
}

impl<P> FromStr for RetryingProvider<P>
where
    P: JsonRpcClient + FromStr,
{
    type Err = <P as FromStr>::Err;

    fn from_str(src: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(src.parse()?, None, None))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn prompting_methods_are_never_retried() {
        assert!(METHODS_TO_NOT_RETRY.contains(&"eth_requestAccounts"));
        assert!(METHODS_TO_NOT_RETRY.contains(&"eth_sendTransaction"));
        assert!(!METHODS_TO_NOT_RETRY.contains(&"eth_call"));
    }

    #[test]
    fn parses_from_url_with_defaults() {
        let provider: RetryingProvider<Http> = "http://localhost:8545".parse().unwrap();
        assert_eq!(provider.max_requests(), 6);
        assert_eq!(provider.base_retry_ms(), 50);
    }

    #[test]
    fn backoff_doubles_and_saturates() {
        assert_eq!(retry_delay_ms(50, 1), 50);
        assert_eq!(retry_delay_ms(50, 4), 400);
        assert_eq!(retry_delay_ms(50, 65), u64::MAX);
        assert_eq!(retry_delay_ms(u64::MAX, 2), u64::MAX);
    }

    #[test]
    fn zero_limits_are_clamped() {
        let provider: RetryingProvider<Http> =
            RetryingProvider::new("http://localhost:8545".parse().unwrap(), Some(0), Some(0));
        assert_eq!(provider.max_requests(), 1);
        assert_eq!(provider.base_retry_ms(), 1);
    }
}
