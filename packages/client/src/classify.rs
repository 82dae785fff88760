//! Turning raw HTTP responses into typed etcd outcomes.
//!
//! Classification runs in two tiers. The HTTP status is checked first
//! against the statuses an operation accepts; then the parsed body's
//! `errorCode` is checked against the service codes it accepts. Both are
//! needed because a single condition such as a missing key arrives as
//! HTTP 404 *and* error code 100, while distinct conditions (missing key,
//! failed compare, malformed request) can share one HTTP status.

use etcdv2_http::HttpResponse;
use tracing::{debug, warn};

use crate::error::Error;
use crate::model::{EtcdResult, EtcdResultList};
use crate::status::ErrorCode;

const OK: u16 = 200;
const CREATED: u16 = 201;
const ACCEPTED: u16 = 202;
const BAD_REQUEST: u16 = 400;
const NOT_FOUND: u16 = 404;
const PRECONDITION_FAILED: u16 = 412;

/// What an operation accepts from the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expectation {
    pub statuses: &'static [u16],
    pub error_codes: &'static [ErrorCode],
}

impl Expectation {
    pub const GET: Expectation = Expectation {
        statuses: &[OK, NOT_FOUND],
        error_codes: &[ErrorCode::KeyNotFound],
    };
    pub const DELETE: Expectation = Expectation {
        statuses: &[OK, NOT_FOUND],
        error_codes: &[],
    };
    pub const SET: Expectation = Expectation {
        statuses: &[OK, CREATED],
        error_codes: &[],
    };
    pub const CREATE_DIRECTORY: Expectation = Expectation::SET;
    pub const LIST_CHILDREN: Expectation = Expectation {
        statuses: &[OK],
        error_codes: &[],
    };
    pub const DELETE_DIRECTORY: Expectation = Expectation {
        statuses: &[ACCEPTED],
        error_codes: &[],
    };
    pub const CAS: Expectation = Expectation {
        statuses: &[OK, PRECONDITION_FAILED],
        error_codes: &[ErrorCode::TestFailed],
    };
    pub const WATCH: Expectation = Expectation {
        statuses: &[OK],
        error_codes: &[],
    };
    pub const VERSION: Expectation = Expectation {
        statuses: &[OK],
        error_codes: &[],
    };
}

/// A classified response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A well-formed result with no error code.
    Success(EtcdResult),
    /// An error envelope whose code the operation declared acceptable.
    ExpectedError(ErrorCode, EtcdResult),
    /// The server sent no body.
    Empty,
}

impl Outcome {
    /// The parsed result, error or not. `None` only for [`Outcome::Empty`].
    pub fn into_result(self) -> Option<EtcdResult> {
        match self {
            Outcome::Success(result) | Outcome::ExpectedError(_, result) => Some(result),
            Outcome::Empty => None,
        }
    }
}

/// Tier one: decide from the status whether there is a body worth parsing.
///
/// An unexpected status is a transport-level failure unless it is a 400
/// that carries a body, since etcd reports malformed requests that way.
pub fn extract(response: HttpResponse, statuses: &[u16]) -> Result<Option<String>, Error> {
    let HttpResponse {
        status,
        status_text,
        body,
        ..
    } = response;

    if !statuses.contains(&status) && (status != BAD_REQUEST || body.is_none()) {
        warn!(status, reason = %status_text, "unexpected response status");
        return Err(Error::Http {
            status,
            reason: status_text,
        });
    }

    Ok(body)
}

/// Tier two: parse a body and check its error code.
pub fn to_outcome(body: Option<String>, error_codes: &[ErrorCode]) -> Result<Outcome, Error> {
    let Some(body) = body else {
        return Ok(Outcome::Empty);
    };

    let result: EtcdResult = serde_json::from_str(&body)?;

    match result.error_code {
        None => Ok(Outcome::Success(result)),
        Some(code) if error_codes.contains(&code) => {
            debug!(%code, "expected service condition");
            Ok(Outcome::ExpectedError(code, result))
        }
        Some(code) => {
            warn!(%code, message = ?result.message, "service error");
            Err(Error::service(result))
        }
    }
}

/// Both tiers.
pub fn classify(response: HttpResponse, expectation: &Expectation) -> Result<Outcome, Error> {
    let body = extract(response, expectation.statuses)?;
    to_outcome(body, expectation.error_codes)
}

/// Plain-text body of a non-envelope endpoint. Any status outside the
/// expected set is an error, body or not.
pub fn text(response: HttpResponse, statuses: &[u16]) -> Result<String, Error> {
    if !statuses.contains(&response.status) {
        warn!(status = response.status, "unexpected response status");
        return Err(Error::Http {
            status: response.status,
            reason: response.status_text,
        });
    }
    Ok(response.body.unwrap_or_default())
}

/// Decode a bulk `{"resultList": [...]}` response. Anything but 200 with a
/// body is reported as a service error built from that body.
///
/// No [`EtcdClient`](crate::EtcdClient) operation returns this envelope. It
/// is exposed for callers issuing bulk requests through their own
/// [`Transport`](etcdv2_http::Transport) calls.
pub fn parse_result_list(response: HttpResponse) -> Result<Option<Vec<EtcdResult>>, Error> {
    let status = response.status;
    let Some(body) = extract(response, &[OK])? else {
        return Ok(None);
    };

    if status != OK {
        let result: EtcdResult = serde_json::from_str(&body)?;
        return Err(Error::service(result));
    }

    let list: EtcdResultList = serde_json::from_str(&body)?;
    Ok(Some(list.result_list))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16, body: Option<&str>) -> HttpResponse {
        HttpResponse::new(status, body.map(str::to_string))
    }

    const NOT_FOUND_BODY: &str =
        r#"{"errorCode":100,"message":"Key not found","cause":"/missing","index":5}"#;
    const TEST_FAILED_BODY: &str =
        r#"{"errorCode":101,"message":"Compare failed","cause":"[world != hello]","index":8}"#;
    const SET_BODY: &str =
        r#"{"action":"set","node":{"key":"/a","value":"1","modifiedIndex":3,"createdIndex":3}}"#;

    #[test]
    fn success_body_is_parsed() {
        let outcome = classify(response(200, Some(SET_BODY)), &Expectation::SET).unwrap();

        match outcome {
            Outcome::Success(result) => assert_eq!(result.value(), Some("1")),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn expected_error_code_is_returned_as_data() {
        let outcome = classify(response(404, Some(NOT_FOUND_BODY)), &Expectation::GET).unwrap();

        match outcome {
            Outcome::ExpectedError(code, result) => {
                assert_eq!(code, ErrorCode::KeyNotFound);
                assert_eq!(result.cause.as_deref(), Some("/missing"));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn unexpected_error_code_is_service_error() {
        let err = classify(response(404, Some(NOT_FOUND_BODY)), &Expectation::DELETE).unwrap_err();

        assert!(err.is_etcd_error(ErrorCode::KeyNotFound));
        assert_eq!(err.to_string(), "Key not found");
        assert_eq!(err.etcd_result().unwrap().index, 5);
    }

    #[test]
    fn cas_mismatch_is_expected() {
        let outcome = classify(response(412, Some(TEST_FAILED_BODY)), &Expectation::CAS).unwrap();
        let result = outcome.into_result().unwrap();

        assert!(result.is_error());
        assert_eq!(result.error_code(), Some(ErrorCode::TestFailed));
    }

    #[test]
    fn unexpected_status_without_body_is_http_error() {
        let err = classify(response(500, None), &Expectation::GET).unwrap_err();

        assert!(err.is_http_error(500));
        assert_eq!(
            err.to_string(),
            "Error response from etcd: Internal Server Error (500)"
        );
    }

    #[test]
    fn unexpected_status_with_body_is_not_parsed() {
        let err = classify(response(503, Some("not json at all")), &Expectation::GET).unwrap_err();
        assert!(matches!(err, Error::Http { status: 503, .. }));
    }

    #[test]
    fn bad_request_with_body_is_parsed() {
        let body = r#"{"errorCode":202,"message":"The given TTL in POST form is not a number","cause":"Update","index":0}"#;

        let err = classify(response(400, Some(body)), &Expectation::SET).unwrap_err();

        assert!(err.is_etcd_error(ErrorCode::TtlNaN));
        assert!(err.http_status().is_none());
    }

    #[test]
    fn bad_request_without_body_is_http_error() {
        let err = classify(response(400, None), &Expectation::SET).unwrap_err();
        assert!(err.is_http_error(400));
    }

    #[test]
    fn missing_body_is_empty() {
        let outcome = classify(response(200, None), &Expectation::DELETE).unwrap();
        assert_eq!(outcome, Outcome::Empty);
        assert!(outcome.into_result().is_none());
    }

    #[test]
    fn malformed_json_is_parse_error() {
        let err = classify(response(200, Some("{not json")), &Expectation::GET).unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn expectation_table() {
        assert_eq!(Expectation::GET.statuses, &[200, 404]);
        assert_eq!(Expectation::CAS.error_codes, &[ErrorCode::TestFailed]);
        assert_eq!(Expectation::DELETE_DIRECTORY.statuses, &[202]);
        assert!(Expectation::WATCH.error_codes.is_empty());
        assert_eq!(Expectation::CREATE_DIRECTORY, Expectation::SET);
    }

    #[test]
    fn text_returns_raw_body() {
        let body = text(response(200, Some("etcd 2.0.0")), Expectation::VERSION.statuses).unwrap();
        assert_eq!(body, "etcd 2.0.0");
    }

    #[test]
    fn text_rejects_bad_request_even_with_body() {
        let err = text(response(400, Some("oops")), Expectation::VERSION.statuses).unwrap_err();
        assert!(err.is_http_error(400));
    }

    #[test]
    fn result_list_success() {
        let body = r#"{"resultList":[{"action":"get","node":{"key":"/a","value":"1"}}]}"#;

        let list = parse_result_list(response(200, Some(body))).unwrap().unwrap();

        assert_eq!(list.len(), 1);
        assert_eq!(list[0].value(), Some("1"));
    }

    #[test]
    fn result_list_bad_request_is_service_error() {
        let body = r#"{"errorCode":203,"message":"The given index in POST form is not a number"}"#;

        let err = parse_result_list(response(400, Some(body))).unwrap_err();

        assert!(err.is_etcd_error(ErrorCode::IndexNaN));
    }

    #[test]
    fn result_list_empty_body() {
        assert!(parse_result_list(response(200, None)).unwrap().is_none());
    }
}
