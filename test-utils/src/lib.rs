//! `test-utils` is used for testing in both `novelgate-lib` and `novelgate-bin`.
//! This crate does not depend on `novelgate-lib` or `novelgate-bin`, else we would get dependency cycles.
//! Macros are used instead, so that the importer is responsible for providing the dependencies.

/// Create a mock web server, which responds with a predefined status when
/// handling a matching request
#[macro_export]
macro_rules! mock_server {
    ($status:expr $(, $func:tt ($($arg:expr),*))*) => {{
        let mock_server = wiremock::MockServer::start().await;
        let response_template = wiremock::ResponseTemplate::new(http::StatusCode::from($status));
        let template = response_template$(.$func($($arg),*))*;
        wiremock::Mock::given(wiremock::matchers::method("GET")).respond_with(template).mount(&mock_server).await;
        mock_server
    }};
}

/// Serve `$body` at `$path` on `$server`, expecting exactly `$times` requests.
///
/// The expectation is verified when the server is dropped.
#[macro_export]
macro_rules! mock_artifact {
    ($server:expr, $path:expr, $body:expr, $times:expr $(,)?) => {
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path($path))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string($body))
            .expect($times)
            .mount(&$server)
            .await
    };
}

/// Gets the "main" binary command (e.g. `novelgate`)
#[macro_export]
macro_rules! main_command {
    () => {
        assert_cmd::cargo::cargo_bin_cmd!()
    };
}
