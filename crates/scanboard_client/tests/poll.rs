use std::sync::{Arc, Mutex};
use std::time::Duration;

use scanboard_client::{ApiClient, ClientConfig, ClientEvent, EventSink, PollSet};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Default)]
struct TestSink {
    events: Arc<Mutex<Vec<ClientEvent>>>,
}

impl TestSink {
    fn new() -> Self {
        Self::default()
    }

    fn shared(&self) -> Arc<Mutex<Vec<ClientEvent>>> {
        self.events.clone()
    }
}

impl EventSink for TestSink {
    fn emit(&self, event: ClientEvent) {
        self.events.lock().unwrap().push(event);
    }
}

fn statuses(events: &[ClientEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|event| match event {
            ClientEvent::PollStatus { status, .. } => Some(status.clone()),
            _ => None,
        })
        .collect()
}

fn poll_set(server: &MockServer, sink: Arc<TestSink>, interval: Duration) -> PollSet {
    let config = ClientConfig {
        base_url: server.uri(),
        bearer_token: "test-token".to_string(),
        ..ClientConfig::default()
    };
    let api = Arc::new(ApiClient::new(config).expect("client"));
    PollSet::new(tokio::runtime::Handle::current(), api, sink, interval)
}

async fn wait_until(timeout: Duration, mut done: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if done() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    done()
}

#[tokio::test]
async fn first_poll_fires_immediately() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/job/status"))
        .and(query_param("uuid", "job-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json("Pending"))
        .mount(&server)
        .await;

    let sink = Arc::new(TestSink::new());
    let events = sink.shared();
    // Interval far longer than the test: any observation must come from the
    // immediate first poll.
    let polls = poll_set(&server, sink, Duration::from_secs(30));
    polls.start("job-1");

    assert!(wait_until(Duration::from_secs(2), || !events.lock().unwrap().is_empty()).await);
    assert_eq!(statuses(&events.lock().unwrap()), vec!["Pending"]);
    assert!(polls.is_active("job-1"));
}

#[tokio::test]
async fn terminal_status_is_forwarded_before_the_loop_stops() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/job/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json("In Progress"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/job/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json("Completed"))
        .mount(&server)
        .await;

    let sink = Arc::new(TestSink::new());
    let events = sink.shared();
    let polls = poll_set(&server, sink, Duration::from_millis(25));
    polls.start("job-1");

    assert!(
        wait_until(Duration::from_secs(5), || {
            statuses(&events.lock().unwrap()).contains(&"Completed".to_string())
        })
        .await
    );
    assert_eq!(
        statuses(&events.lock().unwrap()),
        vec!["In Progress", "Completed"]
    );

    // The loop deregisters itself after delivering the terminal value.
    assert!(wait_until(Duration::from_secs(2), || !polls.is_active("job-1")).await);

    // Stopping after self-termination stays safe.
    polls.stop("job-1");
}

#[tokio::test]
async fn stop_cancels_the_loop() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/job/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json("Pending"))
        .mount(&server)
        .await;

    let sink = Arc::new(TestSink::new());
    let events = sink.shared();
    let polls = poll_set(&server, sink, Duration::from_millis(25));
    polls.start("job-1");

    assert!(wait_until(Duration::from_secs(2), || !events.lock().unwrap().is_empty()).await);
    polls.stop("job-1");
    assert!(!polls.is_active("job-1"));

    let count_at_stop = events.lock().unwrap().len();
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(events.lock().unwrap().len(), count_at_stop);

    // Idempotent.
    polls.stop("job-1");
}

#[tokio::test]
async fn transport_errors_do_not_stop_the_loop() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/job/status"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/job/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json("Completed"))
        .mount(&server)
        .await;

    let sink = Arc::new(TestSink::new());
    let events = sink.shared();
    let polls = poll_set(&server, sink, Duration::from_millis(25));
    polls.start("job-1");

    assert!(
        wait_until(Duration::from_secs(5), || {
            statuses(&events.lock().unwrap()).contains(&"Completed".to_string())
        })
        .await
    );
    // The failed poll produced no observation; the loop survived it.
    assert_eq!(statuses(&events.lock().unwrap()), vec!["Completed"]);
}

#[tokio::test]
async fn second_start_for_the_same_job_is_a_no_op() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/job/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json("Pending"))
        .mount(&server)
        .await;

    let sink = Arc::new(TestSink::new());
    let events = sink.shared();
    let polls = poll_set(&server, sink, Duration::from_secs(30));
    polls.start("job-1");
    polls.start("job-1");

    assert!(wait_until(Duration::from_secs(2), || !events.lock().unwrap().is_empty()).await);
    tokio::time::sleep(Duration::from_millis(200)).await;
    // A duplicate poller would have produced a second immediate observation.
    assert_eq!(statuses(&events.lock().unwrap()), vec!["Pending"]);
}

#[tokio::test]
async fn stop_all_cancels_every_loop() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/job/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json("Pending"))
        .mount(&server)
        .await;

    let sink = Arc::new(TestSink::new());
    let events = sink.shared();
    let polls = poll_set(&server, sink, Duration::from_millis(25));
    polls.start("job-1");
    polls.start("job-2");

    assert!(
        wait_until(Duration::from_secs(2), || {
            events.lock().unwrap().len() >= 2
        })
        .await
    );
    polls.stop_all();
    assert!(!polls.is_active("job-1"));
    assert!(!polls.is_active("job-2"));
}
