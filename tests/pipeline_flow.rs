use std::fs;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use litch::{
    CatalogConfig, CatalogPipeline, ChannelSubscriber, EventLog, EventReporter, FetchState,
    HttpTransport, Record, RecordCollection, TransportFailure, UreqTransport,
};

fn record(key: &str, desc: &str) -> Record {
    Record {
        key: key.to_string(),
        name: key.replace('-', " "),
        desc: desc.to_string(),
        ..Record::default()
    }
}

fn keys(records: &[Record]) -> Vec<&str> {
    records.iter().map(|record| record.key.as_str()).collect()
}

fn write_collection(path: &Path, records: &[Record]) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, serde_json::to_vec_pretty(records).unwrap()).unwrap();
}

fn wait_until(timeout: Duration, mut done: impl FnMut() -> bool) -> bool {
    let start = Instant::now();
    while start.elapsed() < timeout {
        if done() {
            return true;
        }
        thread::sleep(Duration::from_millis(10));
    }
    done()
}

/// Serves one response per route, in any order, then exits.
fn spawn_page_server(
    build_routes: impl FnOnce(&str) -> Vec<(String, String)>,
) -> (String, thread::JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let routes = build_routes(&base);
    let handle = thread::spawn(move || {
        let mut served = Vec::new();
        for _ in 0..routes.len() {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = Vec::new();
            let mut chunk = [0u8; 1024];
            while !request.windows(4).any(|window| window == b"\r\n\r\n") {
                let read = stream.read(&mut chunk).unwrap();
                if read == 0 {
                    break;
                }
                request.extend_from_slice(&chunk[..read]);
            }
            let request = String::from_utf8_lossy(&request);
            let target = request
                .lines()
                .next()
                .and_then(|line| line.split_whitespace().nth(1))
                .unwrap_or("")
                .to_string();
            let (status, body) = match routes.iter().find(|(path, _)| *path == target) {
                Some((_, body)) => ("200 OK", body.clone()),
                None => ("404 Not Found", String::new()),
            };
            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).unwrap();
            let _ = stream.flush();
            served.push(target);
        }
        served
    });
    (base, handle)
}

#[derive(Default)]
struct CountingTransport {
    calls: AtomicUsize,
}

impl HttpTransport for CountingTransport {
    fn get(&self, url: &str) -> Result<String, TransportFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(TransportFailure(format!("unexpected request for {url}")))
    }
}

struct PanickingTransport;

impl HttpTransport for PanickingTransport {
    fn get(&self, _url: &str) -> Result<String, TransportFailure> {
        panic!("transport exploded");
    }
}

struct StaticTransport(&'static str);

impl HttpTransport for StaticTransport {
    fn get(&self, _url: &str) -> Result<String, TransportFailure> {
        Ok(self.0.to_string())
    }
}

#[test]
fn remote_pages_merge_with_custom_records_and_refresh_cache() {
    let temp = tempfile::tempdir().unwrap();
    let config = CatalogConfig::new(temp.path());
    write_collection(
        &config.local_dir().join("spells.json"),
        &[record("acid-splash", "custom")],
    );

    let (base, server) = spawn_page_server(|base| {
        vec![
            (
                "/spells/".to_string(),
                format!(
                    r#"{{"count": 4, "next": "{base}/spells/?page=2", "results": [
                        {{"slug": "confusion", "name": "Confusion", "level_int": 4, "concentration": "yes"}},
                        {{"slug": "acid-arrow", "name": "Acid Arrow", "level_int": 2, "dnd_class": "Druid, Wizard"}}
                    ]}}"#
                ),
            ),
            (
                "/spells/?page=2".to_string(),
                r#"{"count": 4, "next": null, "results": [
                    {"slug": "cone-of-cold", "name": "Cone of Cold", "level_int": 5},
                    {"slug": "acid-splash", "name": "Acid Splash", "desc": "remote", "level_int": 0}
                ]}"#
                .to_string(),
            ),
        ]
    });
    let config = config.with_remote_endpoint(format!("{base}/spells/"));
    let cache_path = config.cache_dir().join("spells.json");

    let (subscriber, statuses) = ChannelSubscriber::channel();
    let log_path = config.log_path();
    let reporter = Arc::new(EventReporter::with_subscriber(
        EventLog::create(&log_path).unwrap(),
        subscriber,
    ));
    let (pipeline, snapshots) =
        CatalogPipeline::new(config, Arc::clone(&reporter), Arc::new(UreqTransport::new()));

    assert!(pipeline.request_fetch(false));
    let snapshot = snapshots.recv_timeout(Duration::from_secs(10)).unwrap();
    assert!(!snapshot.force);
    assert_eq!(
        keys(&snapshot.records),
        vec!["acid-arrow", "acid-splash", "cone-of-cold", "confusion"]
    );
    assert_eq!(snapshot.records[1].desc, "custom");
    assert!(snapshot.records[3].concentration);

    let served = server.join().unwrap();
    assert_eq!(served, vec!["/spells/", "/spells/?page=2"]);

    assert!(wait_until(Duration::from_secs(5), || {
        fs::read_to_string(&cache_path)
            .ok()
            .and_then(|raw| serde_json::from_str::<RecordCollection>(&raw).ok())
            .is_some_and(|cached| cached.len() == 4)
    }));
    let cached: RecordCollection =
        serde_json::from_str(&fs::read_to_string(&cache_path).unwrap()).unwrap();
    assert_eq!(cached[1].desc, "remote");

    assert!(wait_until(Duration::from_secs(5), || pipeline.state() == FetchState::Idle));
    let seen: Vec<String> = statuses.try_iter().collect();
    assert_eq!(seen.first().map(String::as_str), Some("Loading spells..."));
    assert!(seen.iter().any(|status| status == "Loaded offline cache for custom spells"));
    assert!(seen.iter().any(|status| status == "Done"));

    reporter.flush();
    let log = fs::read_to_string(&log_path).unwrap();
    assert!(log.starts_with("[INFO] Started loading spells...\n"));
    assert!(!log.contains("[ERR]"));
}

#[test]
fn present_cache_is_used_without_contacting_remote() {
    let temp = tempfile::tempdir().unwrap();
    let config = CatalogConfig::new(temp.path()).with_remote_endpoint("http://remote.invalid/");
    write_collection(
        &config.cache_dir().join("spells.json"),
        &[record("confusion", "cached"), record("acid-arrow", "cached")],
    );
    let transport = Arc::new(CountingTransport::default());
    let reporter = Arc::new(EventReporter::silent());
    let (pipeline, snapshots) = CatalogPipeline::new(config, reporter, transport.clone());

    assert!(pipeline.request_fetch(false));
    let snapshot = snapshots.recv_timeout(Duration::from_secs(10)).unwrap();
    assert_eq!(keys(&snapshot.records), vec!["acid-arrow", "confusion"]);
    assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn forced_fetch_bypasses_present_cache() {
    let temp = tempfile::tempdir().unwrap();
    let config = CatalogConfig::new(temp.path()).with_remote_endpoint("http://remote.invalid/");
    write_collection(
        &config.cache_dir().join("spells.json"),
        &[record("acid-arrow", "cached")],
    );
    let transport = Arc::new(CountingTransport::default());
    let reporter = Arc::new(EventReporter::silent());
    let (pipeline, snapshots) =
        CatalogPipeline::new(config, Arc::clone(&reporter), transport.clone());

    assert!(pipeline.request_fetch(true));
    let snapshot = snapshots.recv_timeout(Duration::from_secs(10)).unwrap();
    assert!(snapshot.force);
    assert!(snapshot.records.is_empty());
    assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    assert_eq!(reporter.counts().error, 1);
}

#[test]
fn sources_without_data_deliver_empty_catalog() {
    let temp = tempfile::tempdir().unwrap();
    let config = CatalogConfig::new(temp.path()).with_remote_endpoint("");
    let reporter = Arc::new(EventReporter::silent());
    let (pipeline, snapshots) = CatalogPipeline::new(
        config,
        Arc::clone(&reporter),
        Arc::new(CountingTransport::default()),
    );

    assert!(pipeline.request_fetch(false));
    let snapshot = snapshots.recv_timeout(Duration::from_secs(10)).unwrap();
    assert!(snapshot.records.is_empty());
    assert!(temp.path().join("cache").is_dir());
    assert!(temp.path().join("local").is_dir());

    assert!(wait_until(Duration::from_secs(5), || pipeline.state() == FetchState::Idle));
    let counts = reporter.counts();
    assert_eq!(counts.warn, 0);
    assert_eq!(counts.error, 0);
    // started, two empty sources, merging, done
    assert_eq!(counts.info, 5);
}

#[test]
fn concurrent_requests_are_coalesced_until_delivery() {
    let temp = tempfile::tempdir().unwrap();
    let config = CatalogConfig::new(temp.path()).with_remote_endpoint(
        "http://remote.test/spells/",
    );
    let (pipeline, snapshots) = CatalogPipeline::new(
        config,
        Arc::new(EventReporter::silent()),
        Arc::new(StaticTransport(
            r#"{"count": 1, "next": null, "results": [{"slug": "light"}]}"#,
        )),
    );

    assert!(pipeline.request_fetch(false));
    // the cycle cannot finish until its snapshot is received
    assert!(!pipeline.request_fetch(false));
    assert!(!pipeline.request_fetch(true));
    assert_eq!(pipeline.state(), FetchState::Fetching);

    let first = snapshots.recv_timeout(Duration::from_secs(10)).unwrap();
    assert_eq!(keys(&first.records), vec!["light"]);
    assert!(wait_until(Duration::from_secs(5), || pipeline.state() == FetchState::Idle));

    // forced so the second cycle does not race the first cycle's cache write
    assert!(pipeline.request_fetch(true));
    let second = snapshots.recv_timeout(Duration::from_secs(10)).unwrap();
    assert_eq!(keys(&second.records), vec!["light"]);
}

#[test]
fn panicking_fetcher_contributes_empty_collection() {
    let temp = tempfile::tempdir().unwrap();
    let config = CatalogConfig::new(temp.path()).with_remote_endpoint("http://remote.test/");
    write_collection(
        &config.local_dir().join("spells.json"),
        &[record("wish", "custom")],
    );
    let reporter = Arc::new(EventReporter::silent());
    let (pipeline, snapshots) =
        CatalogPipeline::new(config, Arc::clone(&reporter), Arc::new(PanickingTransport));

    assert!(pipeline.request_fetch(false));
    let snapshot = snapshots.recv_timeout(Duration::from_secs(10)).unwrap();
    assert_eq!(keys(&snapshot.records), vec!["wish"]);
    assert_eq!(reporter.counts().error, 1);
    assert!(wait_until(Duration::from_secs(5), || pipeline.state() == FetchState::Idle));
}

#[test]
fn lock_is_released_after_a_panicking_cycle() {
    let temp = tempfile::tempdir().unwrap();
    let config = CatalogConfig::new(temp.path()).with_remote_endpoint("");
    let tripped = Arc::new(AtomicBool::new(false));
    let trip = Arc::clone(&tripped);
    let seen = Arc::new(Mutex::new(Vec::<String>::new()));
    let sink = Arc::clone(&seen);
    let reporter = Arc::new(EventReporter::with_subscriber(
        EventLog::discard(),
        move |status: &str| {
            sink.lock().unwrap().push(status.to_string());
            if status == "Merging spells..." && !trip.swap(true, Ordering::SeqCst) {
                panic!("presentation layer crashed");
            }
        },
    ));
    let (pipeline, snapshots) = CatalogPipeline::new(
        config,
        Arc::clone(&reporter),
        Arc::new(CountingTransport::default()),
    );

    assert!(pipeline.request_fetch(false));
    // the aborted cycle delivers nothing, so a waiting consumer is released
    assert!(pipeline.wait_for_snapshot(&snapshots).is_none());
    assert!(tripped.load(Ordering::SeqCst));
    assert_eq!(pipeline.state(), FetchState::Idle);
    assert_eq!(reporter.counts().error, 1);

    assert!(pipeline.request_fetch(false));
    let snapshot = pipeline.wait_for_snapshot(&snapshots).unwrap();
    assert!(snapshot.records.is_empty());
}

#[test]
fn dropped_consumer_is_reported_and_lock_released() {
    let temp = tempfile::tempdir().unwrap();
    let config = CatalogConfig::new(temp.path()).with_remote_endpoint("");
    let reporter = Arc::new(EventReporter::silent());
    let (pipeline, snapshots) = CatalogPipeline::new(
        config,
        Arc::clone(&reporter),
        Arc::new(CountingTransport::default()),
    );
    drop(snapshots);

    assert!(pipeline.request_fetch(false));
    assert!(wait_until(Duration::from_secs(5), || pipeline.state() == FetchState::Idle));
    assert_eq!(reporter.counts().warn, 1);
}
