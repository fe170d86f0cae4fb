//! End-to-end walks against the simulated agent.

mod common;

use common::*;
use snmp_walker::{
    ErrorStatus, InterfaceTable, WalkFailure, WalkReport, WalkStatus, Walker, walk,
    walk_interfaces,
};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const BUDGET: Duration = Duration::from_secs(5);

fn values(report: &WalkReport) -> Vec<&str> {
    report.rows.iter().map(|r| r.value.as_str()).collect()
}

fn indexes(report: &WalkReport) -> Vec<&str> {
    report.rows.iter().map(|r| r.index.as_str()).collect()
}

#[tokio::test]
async fn test_walk_column_until_out_of_subtree() {
    let agent = SimAgent::start(router_mib()).await;
    let report = walk(if_descr(), &agent.host(), COMMUNITY, BUDGET)
        .await
        .unwrap();

    assert_eq!(report.status, WalkStatus::Done);
    assert_eq!(report.target, agent.addr());
    assert_eq!(report.root, if_descr());
    assert_eq!(indexes(&report), ["1", "2", "10"]);
    assert_eq!(values(&report), ["lo", "Ethernet0", "Serial0"]);
}

#[tokio::test]
async fn test_index_derivation() {
    let agent = SimAgent::start(router_mib()).await;
    let report = walk(if_descr(), &agent.host(), COMMUNITY, BUDGET)
        .await
        .unwrap();

    let row = &report.rows[1];
    assert_eq!(row.index, "2");
    assert_eq!(row.oid, "1.3.6.1.2.1.2.2.1.2.2");
    assert_eq!(row.value, "Ethernet0");
}

#[tokio::test]
async fn test_three_integer_rows_then_next_column() {
    let agent = SimAgent::start(router_mib()).await;
    let report = walk(if_admin_status(), &agent.host(), COMMUNITY, BUDGET)
        .await
        .unwrap();

    // ifAdminStatus.10 is followed by ifOperStatus.1, outside the subtree
    assert_eq!(report.status, WalkStatus::Done);
    assert_eq!(values(&report), ["1", "1", "2"]);
}

#[tokio::test]
async fn test_end_of_mib_no_such_name() {
    let agent = SimAgent::start(router_mib()).await;
    let report = walk(if_oper_status(), &agent.host(), COMMUNITY, BUDGET)
        .await
        .unwrap();

    assert_eq!(report.status, WalkStatus::Done);
    assert_eq!(values(&report), ["1", "2", "2"]);
}

#[tokio::test]
async fn test_end_of_mib_null_value() {
    let agent = SimAgent::with_fault(router_mib(), Fault::NullAtEnd).await;
    let report = walk(if_oper_status(), &agent.host(), COMMUNITY, BUDGET)
        .await
        .unwrap();

    // the NULL row echoing ifOperStatus.10 is kept, with an empty value
    assert_eq!(report.status, WalkStatus::Done);
    assert_eq!(indexes(&report), ["1", "2", "10", "10"]);
    assert_eq!(values(&report), ["1", "2", "2", ""]);
}

#[tokio::test]
async fn test_empty_subtree() {
    let agent = SimAgent::start(router_mib()).await;
    let report = walk(nonexistent_subtree(), &agent.host(), COMMUNITY, BUDGET)
        .await
        .unwrap();

    assert_eq!(report.status, WalkStatus::Done);
    assert!(report.rows.is_empty());
}

#[tokio::test]
async fn test_system_subtree_indexes() {
    let agent = SimAgent::start(router_mib()).await;
    let report = walk(system_subtree(), &agent.host(), COMMUNITY, BUDGET)
        .await
        .unwrap();

    assert_eq!(indexes(&report), ["1.0", "5.0"]);
    assert_eq!(values(&report), ["Test router", "r1"]);
}

#[tokio::test]
async fn test_request_ids_strictly_increase() {
    let agent = SimAgent::start(router_mib()).await;
    walk(if_descr(), &agent.host(), COMMUNITY, BUDGET)
        .await
        .unwrap();

    let ids = agent.request_ids();
    // root, then one request per row
    assert_eq!(ids.len(), 4);
    assert!(ids.windows(2).all(|w| w[0] < w[1]), "{ids:?}");
}

#[tokio::test]
async fn test_silent_agent_times_out_with_partial_result() {
    let agent = SimAgent::with_fault(router_mib(), Fault::Silent).await;
    let report = walk(if_descr(), &agent.host(), COMMUNITY, Duration::from_millis(200))
        .await
        .unwrap();

    assert_eq!(report.status, WalkStatus::TimedOut);
    assert!(report.rows.is_empty());
}

#[tokio::test]
async fn test_zero_timeout() {
    let agent = SimAgent::start(router_mib()).await;
    let report = walk(if_descr(), &agent.host(), COMMUNITY, Duration::ZERO)
        .await
        .unwrap();

    assert_eq!(report.status, WalkStatus::TimedOut);
    assert!(report.rows.is_empty());
    // the first request still went out
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(agent.request_ids().len(), 1);
}

#[tokio::test]
async fn test_fatal_error_status_fails_walk() {
    let agent = SimAgent::with_fault(router_mib(), Fault::Status(ErrorStatus::GenErr)).await;
    let report = walk(if_descr(), &agent.host(), COMMUNITY, BUDGET)
        .await
        .unwrap();

    assert_eq!(
        report.status,
        WalkStatus::Failed(WalkFailure::Agent(ErrorStatus::GenErr))
    );
    assert!(report.rows.is_empty());
    assert_eq!(report.status.to_string(), "failed: agent returned genErr (5)");
}

#[tokio::test]
async fn test_no_such_name_on_first_request_is_not_fatal() {
    let agent =
        SimAgent::with_fault(router_mib(), Fault::Status(ErrorStatus::NoSuchName)).await;
    let report = walk(if_descr(), &agent.host(), COMMUNITY, BUDGET)
        .await
        .unwrap();

    assert_eq!(report.status, WalkStatus::Done);
    assert!(report.rows.is_empty());
}

#[tokio::test]
async fn test_stale_responses_are_ignored() {
    let agent = SimAgent::with_fault(router_mib(), Fault::StaleFirst).await;
    let report = walk(if_descr(), &agent.host(), COMMUNITY, BUDGET)
        .await
        .unwrap();

    assert_eq!(report.status, WalkStatus::Done);
    assert_eq!(values(&report), ["lo", "Ethernet0", "Serial0"]);
}

#[tokio::test]
async fn test_trailing_garbage_keeps_decoded_answer() {
    let agent = SimAgent::with_fault(router_mib(), Fault::TrailingGarbage).await;
    let report = walk(if_descr(), &agent.host(), COMMUNITY, BUDGET)
        .await
        .unwrap();

    assert_eq!(report.status, WalkStatus::Done);
    assert_eq!(report.rows.len(), 3);
}

#[tokio::test]
async fn test_repeated_oid_fails_walk() {
    let agent = SimAgent::with_fault(router_mib(), Fault::Repeat).await;
    let report = walk(if_descr(), &agent.host(), COMMUNITY, BUDGET)
        .await
        .unwrap();

    assert!(matches!(
        report.status,
        WalkStatus::Failed(WalkFailure::NonIncreasingOid { .. })
    ));
    assert!(report.rows.is_empty());
}

#[tokio::test]
async fn test_several_roots_one_run() {
    let agent = SimAgent::start(router_mib()).await;
    let reports = Walker::builder(agent.host())
        .timeout(BUDGET)
        .root(if_oper_status())
        .root(if_descr())
        .root(nonexistent_subtree())
        .build()
        .run()
        .await
        .unwrap();

    assert_eq!(reports.len(), 3);
    assert_eq!(reports[0].root, if_oper_status());
    assert_eq!(values(&reports[0]), ["1", "2", "2"]);
    assert_eq!(values(&reports[1]), ["lo", "Ethernet0", "Serial0"]);
    assert!(reports[2].rows.is_empty());
    assert!(reports.iter().all(|r| r.status == WalkStatus::Done));
}

#[tokio::test]
async fn test_cancel_keeps_partial_rows() {
    let agent = SimAgent::with_fault(router_mib(), Fault::Silent).await;
    let token = CancellationToken::new();
    let walker = Walker::builder(agent.host())
        .timeout(BUDGET)
        .cancel(token.clone())
        .root(if_descr())
        .build();

    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        token.cancel();
    });
    let reports = walker.run().await.unwrap();
    canceller.await.unwrap();

    assert_eq!(reports[0].status, WalkStatus::Cancelled);
    assert!(reports[0].rows.is_empty());
}

#[tokio::test]
async fn test_interface_table() {
    let agent = SimAgent::start(router_mib()).await;
    let view = walk_interfaces(&agent.host(), COMMUNITY, BUDGET)
        .await
        .unwrap();

    assert!(view.is_complete());
    let rows: Vec<_> = view
        .rows()
        .iter()
        .map(|r| {
            (
                r.index.as_str(),
                r.name.as_deref().unwrap_or(""),
                r.admin_status.as_deref().unwrap_or(""),
                r.oper_status.as_deref().unwrap_or(""),
            )
        })
        .collect();
    assert_eq!(
        rows,
        [
            ("1", "lo", "up", "up"),
            ("2", "Ethernet0", "up", "down"),
            ("10", "Serial0", "down", "down"),
        ]
    );
}

#[tokio::test]
async fn test_interface_table_rendering() {
    let agent = SimAgent::start(router_mib()).await;
    let reports = InterfaceTable::columns(Walker::builder(agent.host()))
        .timeout(BUDGET)
        .build()
        .run()
        .await
        .unwrap();
    let text = InterfaceTable::from_reports(&reports).to_string();

    assert_eq!(
        text,
        "index  name       admin  oper\n\
         1      lo         up     up\n\
         2      Ethernet0  up     down\n\
         10     Serial0    down   down\n"
    );
}

#[tokio::test]
async fn test_unresolvable_target_is_error() {
    let result = walk(if_descr(), "host.invalid", COMMUNITY, BUDGET).await;
    assert!(matches!(result, Err(snmp_walker::Error::Io { .. })));
}
