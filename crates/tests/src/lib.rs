//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 合约快照测试（wire 格式）
//! - Mock registry e2e 测试（无需真实 registry）

#[cfg(test)]
mod contract_tests {
    use contracts::{
        ConfigVersion, DeviceAddress, DispatchError, DispatchResult, ErrorKind, RemoteError,
    };

    #[test]
    fn test_default_profile_version() {
        assert_eq!(
            contracts::DispatchProfile::default().version,
            ConfigVersion::V1
        );
    }

    #[test]
    fn test_outcome_record_wire_format() {
        let result = DispatchResult::failed(
            DeviceAddress::new("proj1", "us-central1", "reg1", "dev1"),
            Some("projects/proj1/locations/us-central1/registries/reg1/devices/dev1".into()),
            DispatchError::Remote(RemoteError::Unauthenticated("token expired".into())),
            1,
        );

        let json = serde_json::to_value(result.to_record()).unwrap();
        assert_eq!(json["deviceAddress"]["projectId"], "proj1");
        assert_eq!(json["deviceAddress"]["registryId"], "reg1");
        assert_eq!(json["success"], false);
        assert_eq!(json["attempts"], 1);
        assert_eq!(json["error"]["kind"], "unauthenticated");
        assert!(json["timestamp"].is_string());
    }

    #[test]
    fn test_error_kind_names() {
        let kinds = [
            (ErrorKind::InvalidAddress, "\"invalid_address\""),
            (ErrorKind::NotFound, "\"not_found\""),
            (ErrorKind::Cancelled, "\"cancelled\""),
        ];
        for (kind, expected) in kinds {
            assert_eq!(serde_json::to_string(&kind).unwrap(), expected);
        }
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::time::Duration;

    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{
        DeviceAddress, DispatchRequest, ErrorKind, FanConfig, PayloadEncoder, RegistryKind,
        RemoteError,
    };
    use dispatcher::{
        aggregate_status, CancellationToken, ConsoleSink, DispatchEngine, HttpReportSink,
        ResultSink,
    };
    use observability::DispatchSummaryAggregator;
    use registry_client::{MockConfig, MockRegistryClient, RegistryBackend};

    const PROFILE: &str = r#"
[engine]
concurrency = 3

[engine.retry]
max_attempts = 3
base_delay_ms = 10
max_delay_ms = 40

[registry]
kind = "mock"

[registry.mock]
not_found = ["ghost"]

[registry.mock.flaky]
dev-flaky = 1
"#;

    const REQUESTS: &str = r#"
[[requests]]
payload = { on = true, speed = 40 }
[requests.deviceAddress]
projectId = "proj1"
location = "us-central1"
registryId = "reg1"
deviceId = "dev1"

[[requests]]
payload = { on = false, speed = 0 }
[requests.deviceAddress]
projectId = "proj1"
location = "us-central1"
registryId = "reg1"
deviceId = "ghost"

[[requests]]
payload = { on = true, speed = 75 }
[requests.deviceAddress]
projectId = "proj1"
location = "us-central1"
registryId = "reg1"
deviceId = "dev-flaky"
"#;

    fn fan_request(device: &str, speed: i64) -> DispatchRequest {
        DispatchRequest::new(
            DeviceAddress::new("proj1", "us-central1", "reg1", device),
            FanConfig::new(true, speed).unwrap(),
        )
    }

    /// End-to-end test: fan config -> DispatchEngine -> MockRegistryClient
    ///
    /// 验证完整的数据流：
    /// 1. FanConfig 编码为 canonical JSON + base64
    /// 2. 设备地址解析为资源路径
    /// 3. registry 恰好收到一次调用
    #[tokio::test]
    async fn test_e2e_fan_config_push() {
        let engine =
            DispatchEngine::new(MockRegistryClient::new(), &Default::default()).unwrap();

        let result = engine.dispatch_one(fan_request("dev1", 40)).await;

        assert!(result.success());
        let calls = engine.client().calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0].path,
            "projects/proj1/locations/us-central1/registries/reg1/devices/dev1"
        );

        let payload = PayloadEncoder::decode(&calls[0].encoded_payload).unwrap();
        let canonical = PayloadEncoder::canonical_bytes(&payload).unwrap();
        assert_eq!(&canonical[..], br#"{"on":true,"speed":40}"#);
    }

    /// Profile + request file -> RegistryBackend -> sinks
    #[tokio::test(start_paused = true)]
    async fn test_e2e_profile_driven_batch() {
        let profile = ConfigLoader::load_from_str(PROFILE, ConfigFormat::Toml).unwrap();
        assert_eq!(profile.registry.kind, RegistryKind::Mock);

        let requests = ConfigLoader::load_requests_from_str(REQUESTS, ConfigFormat::Toml).unwrap();
        assert_eq!(requests.len(), 3);

        let backend = RegistryBackend::from_settings(&profile.registry).unwrap();
        let engine = DispatchEngine::new(backend, &profile.engine).unwrap();
        let results = engine
            .dispatch_many(requests, &CancellationToken::new())
            .await;

        let devices: Vec<&str> = results
            .iter()
            .map(|r| r.address().device_id.as_str())
            .collect();
        assert_eq!(devices, vec!["dev1", "ghost", "dev-flaky"]);
        assert!(results[0].success());
        assert_eq!(results[1].error().map(|e| e.kind()), Some(ErrorKind::NotFound));
        assert!(results[2].success());
        assert_eq!(results[2].attempts(), 2);

        // Console report
        let mut console = ConsoleSink::new(Vec::new());
        let summary = console.render(&results);
        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.exit_code(), 1);
        let output = String::from_utf8(console.into_inner()).unwrap();
        assert!(output.contains("FAIL projects/proj1/locations/us-central1/registries/reg1/devices/ghost: not_found"));

        // HTTP report
        let report = HttpReportSink::new().render(&results);
        assert_eq!(report.status, 207);
        assert_eq!(report.body.len(), 3);

        // Aggregated stats
        let mut aggregator = DispatchSummaryAggregator::new();
        aggregator.extend(&results);
        let stats = aggregator.summary();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.retried, 1);

        let metrics = engine.metrics();
        assert_eq!(metrics.attempts, 4);
        assert_eq!(metrics.retries, 1);
    }

    #[tokio::test]
    async fn test_e2e_order_with_middle_failure() {
        for concurrency in [1, 2, 8] {
            let client = MockRegistryClient::with_config(
                MockConfig::default()
                    .fail_device("b", RemoteError::Unauthenticated("no access".into()))
                    .with_latency(Duration::from_millis(2)),
            );
            let mut settings = contracts::EngineSettings::default();
            settings.concurrency = concurrency;
            let engine = DispatchEngine::new(client, &settings).unwrap();

            let results = engine
                .dispatch_many(
                    vec![fan_request("a", 10), fan_request("b", 20), fan_request("c", 30)],
                    &CancellationToken::new(),
                )
                .await;

            let success: Vec<bool> = results.iter().map(|r| r.success()).collect();
            assert_eq!(success, vec![true, false, true], "concurrency = {concurrency}");
            assert_eq!(aggregate_status(&results), 207);
            // Unauthenticated is never retried
            assert_eq!(engine.client().calls_for("b"), 1);
        }
    }

    #[tokio::test]
    async fn test_e2e_cancelled_batch() {
        let engine =
            DispatchEngine::new(MockRegistryClient::new(), &Default::default()).unwrap();
        let token = CancellationToken::new();
        token.cancel();

        let results = engine
            .dispatch_many(vec![fan_request("a", 10), fan_request("b", 20)], &token)
            .await;

        assert!(results.iter().all(|r| r.is_cancelled()));
        assert_eq!(engine.client().call_count(), 0);
        assert_eq!(HttpReportSink::new().render(&results).status, 500);
    }

    #[tokio::test]
    async fn test_e2e_invalid_address_is_bad_request() {
        let engine =
            DispatchEngine::new(MockRegistryClient::new(), &Default::default()).unwrap();
        let request = DispatchRequest::new(
            DeviceAddress::new("", "loc", "reg", "dev"),
            FanConfig::new(true, 10).unwrap(),
        );

        let results = engine
            .dispatch_many(vec![request], &CancellationToken::new())
            .await;

        assert_eq!(
            results[0].error().map(|e| e.kind()),
            Some(ErrorKind::InvalidAddress)
        );
        assert_eq!(aggregate_status(&results), 400);
        assert_eq!(engine.client().call_count(), 0);
    }
}
