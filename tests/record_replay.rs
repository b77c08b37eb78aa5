//! Record-replay round-trip integration test.
//!
//! Proves that the record/replay system works end-to-end:
//! 1. Record a session through a stand-in for the live service.
//! 2. Replay the cassette with a fresh session in replay mode.
//! 3. Assert identical outputs between recording and replaying.
//! 4. Replay a second time and assert determinism.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use davreplay::cassette::{CassetteSession, Mode, RecorderConfig, StorageStrategy};
use davreplay::ports::{
    RequestContext, RequestOptions, Transport, TransportFuture, TransportResponse,
};
use davreplay::CassetteError;

/// Stand-in for the storage service: answers a fixed script of responses.
struct ScriptedService {
    calls: AtomicUsize,
}

impl ScriptedService {
    fn new() -> Self {
        Self { calls: AtomicUsize::new(0) }
    }

    fn script(call: usize) -> TransportResponse {
        match call {
            0 => TransportResponse {
                status: 201,
                headers: vec![],
                body: String::new(),
            },
            1 => TransportResponse {
                status: 207,
                headers: vec![("Content-Type".into(), "application/xml; charset=utf-8".into())],
                body: concat!(
                    r#"<?xml version="1.0"?><d:multistatus xmlns:d="DAV:">"#,
                    "<d:response><d:href>/remote.php/dav/files/admin/Photos/</d:href></d:response>",
                    "</d:multistatus>"
                )
                .into(),
            },
            _ => TransportResponse {
                status: 200,
                headers: vec![
                    ("Content-Type".into(), "application/json".into()),
                    ("Content-Location".into(), "/ocs/v2.php/cloud/user".into()),
                ],
                body: r#"{"ocs":{"data":{"id":"admin"}}}"#.into(),
            },
        }
    }
}

impl Transport for ScriptedService {
    fn exchange<'a>(
        &'a self,
        _url: &'a str,
        _options: &'a RequestOptions,
        _context: &'a RequestContext,
    ) -> TransportFuture<'a> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        Box::pin(async move { Ok(Self::script(call)) })
    }
}

const ORIGIN: &str = "https://cloud.example.com";

/// Exercises the transport the way a resource client would, returning a
/// snapshot of every response for comparison.
async fn exercise(transport: &dyn Transport) -> Vec<TransportResponse> {
    let mut responses = Vec::new();

    let mkcol = RequestOptions::method("MKCOL");
    responses.push(
        transport
            .send(
                &format!("{ORIGIN}/remote.php/dav/files/admin/Photos"),
                &mkcol,
                &[201],
                &RequestContext::new("create folder"),
            )
            .await
            .unwrap(),
    );

    let propfind = RequestOptions::method("PROPFIND")
        .with_header("Depth", "1")
        .with_body(r#"<d:propfind xmlns:d="DAV:"><d:allprop/></d:propfind>"#);
    responses.push(
        transport
            .send(
                &format!("{ORIGIN}/remote.php/dav/files/admin/Photos"),
                &propfind,
                &[207],
                &RequestContext::new("list folder"),
            )
            .await
            .unwrap(),
    );

    responses.push(
        transport
            .send(
                &format!("{ORIGIN}/ocs/v2.php/cloud/user"),
                &RequestOptions::default(),
                &[200],
                &RequestContext::new("get user"),
            )
            .await
            .unwrap(),
    );

    responses
}

fn config(base: &Path, strategy: StorageStrategy) -> RecorderConfig {
    RecorderConfig {
        base_directory: base.to_path_buf(),
        strategy,
        origin: Some(ORIGIN.into()),
        ..RecorderConfig::default()
    }
}

async fn round_trip(strategy: StorageStrategy) {
    let dir = tempfile::tempdir().unwrap();
    let context = "Folder suite/should create: a folder";

    // --- Phase 1: Record against the scripted service ---
    let recording = CassetteSession::open(config(dir.path(), strategy), Mode::Record);
    recording.begin(context).unwrap();
    let transport = recording.transport_over(Box::new(ScriptedService::new())).unwrap();
    let recorded = exercise(transport.as_ref()).await;
    recording.reset();

    // --- Phase 2: Replay and verify identical outputs ---
    let replaying = CassetteSession::open(config(dir.path(), strategy), Mode::Replay);
    replaying.begin(context).unwrap();
    let replayed = exercise(replaying.transport().unwrap().as_ref()).await;

    assert_eq!(recorded.len(), replayed.len());
    for (live, replay) in recorded.iter().zip(&replayed) {
        assert_eq!(live.status, replay.status, "{strategy:?}: status mismatch");
        assert_eq!(live.body, replay.body, "{strategy:?}: body mismatch");
        assert_eq!(live.header("content-type"), replay.header("content-type"));
        assert_eq!(live.header("content-location"), replay.header("content-location"));
    }

    // --- Phase 3: Replay a second time, determinism check ---
    let again = exercise(replaying.transport().unwrap().as_ref()).await;
    assert_eq!(replayed, again, "{strategy:?}: replays differ");

    // Recorded URLs are service-relative.
    let entries = replaying.store().lock().unwrap().entries().unwrap();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0].request.url, "/remote.php/dav/files/admin/Photos");
    assert_eq!(entries[0].request.method, "MKCOL");
    assert_eq!(entries[2].request.method, "GET");
    assert_eq!(
        entries[1].response.decoded_body.as_ref().unwrap()["multistatus"]["response"]["href"],
        "/remote.php/dav/files/admin/Photos/"
    );
}

#[tokio::test]
async fn single_file_log_round_trip() {
    round_trip(StorageStrategy::Log).await;
}

#[tokio::test]
async fn numbered_files_round_trip() {
    round_trip(StorageStrategy::Numbered).await;
}

#[tokio::test]
async fn cassette_files_land_where_documented() {
    let dir = tempfile::tempdir().unwrap();

    for strategy in [StorageStrategy::Log, StorageStrategy::Numbered] {
        let session = CassetteSession::open(config(dir.path(), strategy), Mode::Record);
        session.begin("Tag suite/assign: v1.2").unwrap();
        let transport = session.transport_over(Box::new(ScriptedService::new())).unwrap();
        exercise(transport.as_ref()).await;
    }

    let log = dir.path().join("Tag_suite").join("assign__v1_2.json");
    let parsed: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&log).unwrap()).unwrap();
    assert_eq!(parsed.as_array().unwrap().len(), 3);

    let numbered = dir.path().join("Tag_suite").join("assign__v1_2");
    for n in 1001..=1003 {
        assert!(numbered.join(format!("{n}.json")).is_file(), "missing {n}.json");
    }
    assert!(!numbered.join("1004.json").exists());
}

#[tokio::test]
async fn replay_with_extra_calls_exhausts_the_queue() {
    let dir = tempfile::tempdir().unwrap();
    let recording = CassetteSession::open(config(dir.path(), StorageStrategy::Log), Mode::Record);
    recording.begin("short").unwrap();
    let transport = recording.transport_over(Box::new(ScriptedService::new())).unwrap();
    transport
        .send("/x", &RequestOptions::default(), &[201], &RequestContext::new("only call"))
        .await
        .unwrap();

    let replaying = CassetteSession::open(config(dir.path(), StorageStrategy::Log), Mode::Replay);
    replaying.begin("short").unwrap();
    let transport = replaying.transport().unwrap();
    transport
        .send("/x", &RequestOptions::default(), &[201], &RequestContext::new("only call"))
        .await
        .unwrap();

    let err = transport
        .send("/y", &RequestOptions::default(), &[200], &RequestContext::new("extra call"))
        .await
        .unwrap_err();
    assert!(matches!(err, CassetteError::QueueExhausted { .. }));
}

#[tokio::test]
async fn replayed_status_mismatch_matches_live_error_shape() {
    let dir = tempfile::tempdir().unwrap();
    let recording = CassetteSession::open(config(dir.path(), StorageStrategy::Log), Mode::Record);
    recording.begin("mismatch").unwrap();
    let live = recording.transport_over(Box::new(ScriptedService::new())).unwrap();
    let live_err = live
        .send("/x", &RequestOptions::default(), &[200], &RequestContext::new("create"))
        .await
        .unwrap_err();

    let replaying = CassetteSession::open(config(dir.path(), StorageStrategy::Log), Mode::Replay);
    replaying.begin("mismatch").unwrap();
    let replay_err = replaying
        .transport()
        .unwrap()
        .send("/x", &RequestOptions::default(), &[200], &RequestContext::new("create"))
        .await
        .unwrap_err();

    assert_eq!(live_err.to_string(), replay_err.to_string());
    assert!(matches!(replay_err, CassetteError::UnexpectedStatus { status: 201, .. }));
}

#[tokio::test]
async fn re_recording_with_fewer_calls_replaces_the_cassette() {
    for strategy in [StorageStrategy::Log, StorageStrategy::Numbered] {
        let dir = tempfile::tempdir().unwrap();
        let context = "Share suite/re-recorded";

        let first = CassetteSession::open(config(dir.path(), strategy), Mode::Record);
        first.begin(context).unwrap();
        exercise(first.transport_over(Box::new(ScriptedService::new())).unwrap().as_ref()).await;

        let second = CassetteSession::open(config(dir.path(), strategy), Mode::Record);
        second.begin(context).unwrap();
        second
            .transport_over(Box::new(ScriptedService::new()))
            .unwrap()
            .send("/x", &RequestOptions::default(), &[201], &RequestContext::new("only call"))
            .await
            .unwrap();

        let replaying = CassetteSession::open(config(dir.path(), strategy), Mode::Replay);
        replaying.begin(context).unwrap();
        let transport = replaying.transport().unwrap();
        transport
            .send("/x", &RequestOptions::default(), &[201], &RequestContext::new("only call"))
            .await
            .unwrap();
        let err = transport
            .send("/y", &RequestOptions::default(), &[207], &RequestContext::new("stale call"))
            .await
            .unwrap_err();
        assert!(matches!(err, CassetteError::QueueExhausted { .. }), "{strategy:?}: {err}");
    }
}
