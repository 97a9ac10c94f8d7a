mod helpers;

use ferrous_resolver_application::Callbacks;
use ferrous_resolver_domain::{RecordData, RecordType, ResolveError};
use ferrous_resolver_infrastructure::LookupError;
use helpers::{resolver, Behavior, MockDnsServer};
use std::cell::RefCell;
use std::net::{IpAddr, Ipv4Addr};
use std::rc::Rc;
use std::time::{Duration, Instant};

const ANSWER: Ipv4Addr = Ipv4Addr::new(10, 0, 0, 1);

fn trimmed(names: Vec<String>) -> Vec<String> {
    names
        .into_iter()
        .map(|n| n.trim_end_matches('.').to_string())
        .collect()
}

#[tokio::test]
async fn test_resolves_a_record_over_udp() {
    let server = MockDnsServer::start(Behavior::Answer(ANSWER)).await.unwrap();
    let mut resolver = resolver(&[server.addr()], 5.0, 1.0);

    let response = resolver.resolve("example.com", RecordType::A).await.unwrap();

    assert_eq!(response.answers.len(), 1);
    assert_eq!(response.answers[0].data, RecordData::A(ANSWER));
    assert!(!response.truncated);
    assert!(resolver.dispatcher().is_idle());
}

#[tokio::test]
async fn test_single_attempt_on_fresh_socket_is_answered() {
    let server = MockDnsServer::start(Behavior::Answer(ANSWER)).await.unwrap();
    let mut resolver = resolver(&[server.addr()], 2.0, 1.0);
    resolver.dispatcher_mut().set_attempts(1);

    let response = resolver.resolve("example.com", RecordType::A).await.unwrap();

    assert_eq!(response.answers[0].data, RecordData::A(ANSWER));
    assert_eq!(server.queries().len(), 1);
}

#[tokio::test]
async fn test_nxdomain_is_delivered_as_failure() {
    let server = MockDnsServer::start(Behavior::NxDomain).await.unwrap();
    let mut resolver = resolver(&[server.addr()], 5.0, 1.0);

    let result = resolver.resolve("missing.example", RecordType::A).await;

    assert_eq!(result, Err(LookupError::Failed(ResolveError::NxDomain)));
    assert_eq!(server.queries().len(), 1);
}

#[tokio::test]
async fn test_server_failure_is_not_retried() {
    let server = MockDnsServer::start(Behavior::ServFail).await.unwrap();
    let mut resolver = resolver(&[server.addr()], 2.0, 0.2);

    let result = resolver.resolve("broken.example", RecordType::A).await;

    assert_eq!(result, Err(LookupError::Failed(ResolveError::ServerFailure)));
    assert_eq!(server.queries().len(), 1);
}

#[tokio::test]
async fn test_silent_server_times_out_after_retries() {
    let server = MockDnsServer::start(Behavior::Silent).await.unwrap();
    let mut resolver = resolver(&[server.addr()], 0.5, 0.2);
    let started = Instant::now();

    let result = resolver.resolve("example.com", RecordType::A).await;

    assert_eq!(result, Err(LookupError::Failed(ResolveError::Timeout)));
    assert!(started.elapsed() >= Duration::from_millis(500));
    assert!(started.elapsed() < Duration::from_secs(3));
    assert_eq!(server.queries().len(), 3);
}

#[tokio::test]
async fn test_retry_moves_to_the_next_server() {
    let silent = MockDnsServer::start(Behavior::Silent).await.unwrap();
    let answering = MockDnsServer::start(Behavior::Answer(ANSWER)).await.unwrap();
    let mut resolver = resolver(&[silent.addr(), answering.addr()], 5.0, 0.2);

    let response = resolver.resolve("example.com", RecordType::A).await.unwrap();

    assert_eq!(response.answers[0].data, RecordData::A(ANSWER));
    assert_eq!(silent.queries().len(), 1);
    assert_eq!(answering.queries().len(), 1);
}

#[tokio::test]
async fn test_truncated_answer_is_fetched_over_tcp() {
    let server = MockDnsServer::start(Behavior::Truncate(ANSWER)).await.unwrap();
    let mut resolver = resolver(&[server.addr()], 5.0, 1.0);

    let response = resolver.resolve("big.example", RecordType::A).await.unwrap();

    assert!(!response.truncated);
    assert_eq!(response.answers[0].data, RecordData::A(ANSWER));
    assert_eq!(trimmed(server.tcp_queries()), vec!["big.example"]);
}

#[tokio::test]
async fn test_search_list_expands_short_names() {
    let server = MockDnsServer::start(Behavior::NxDomain).await.unwrap();
    let mut resolver = resolver(&[server.addr()], 5.0, 1.0);
    resolver
        .dispatcher_mut()
        .set_search(vec!["corp.example".to_string(), "example.com".to_string()]);

    let result = resolver.resolve("www", RecordType::A).await;

    assert_eq!(result, Err(LookupError::Failed(ResolveError::NxDomain)));
    assert_eq!(
        trimmed(server.queries()),
        vec!["www.corp.example", "www.example.com", "www"]
    );
}

#[tokio::test]
async fn test_reverse_lookup_queries_in_addr_arpa() {
    let server = MockDnsServer::start(Behavior::NxDomain).await.unwrap();
    let mut resolver = resolver(&[server.addr()], 5.0, 1.0);
    let outcome = Rc::new(RefCell::new(None));
    let on_failure = outcome.clone();

    resolver
        .reverse(
            IpAddr::V4(Ipv4Addr::new(192, 0, 2, 1)),
            Callbacks::new(|_| {}, move |e| *on_failure.borrow_mut() = Some(e)),
        )
        .unwrap();
    resolver.run_until_idle().await;

    assert_eq!(*outcome.borrow(), Some(ResolveError::NxDomain));
    assert_eq!(trimmed(server.queries()), vec!["1.2.0.192.in-addr.arpa"]);
}

#[tokio::test]
async fn test_many_lookups_share_limited_capacity() {
    let server = MockDnsServer::start(Behavior::Answer(ANSWER)).await.unwrap();
    let mut resolver = resolver(&[server.addr()], 5.0, 1.0);
    resolver.dispatcher_mut().set_capacity(4);
    resolver.dispatcher_mut().set_maxcalls(3);
    let successes = Rc::new(RefCell::new(0usize));

    for i in 0..20 {
        let counter = successes.clone();
        resolver
            .query(
                &format!("host{i}.example.com"),
                RecordType::A,
                Callbacks::new(move |_| *counter.borrow_mut() += 1, |_| {}),
            )
            .unwrap();
    }
    assert_eq!(resolver.dispatcher().active(), 4);
    assert_eq!(resolver.dispatcher().queued(), 16);

    resolver.run_until_idle().await;

    assert_eq!(*successes.borrow(), 20);
    assert_eq!(server.queries().len(), 20);
}

#[tokio::test]
async fn test_cancelled_lookup_never_completes() {
    let server = MockDnsServer::start(Behavior::Answer(ANSWER)).await.unwrap();
    let mut resolver = resolver(&[server.addr()], 5.0, 1.0);
    let called = Rc::new(RefCell::new(false));
    let on_success = called.clone();

    let handle = resolver
        .query(
            "example.com",
            RecordType::A,
            Callbacks::new(move |_| *on_success.borrow_mut() = true, |_| {}),
        )
        .unwrap();
    resolver.cancel(handle);
    resolver.run_until_idle().await;

    assert!(!*called.borrow());
}
