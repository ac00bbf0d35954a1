//! Integration tests — full copy lifecycle against an in-process SNMP
//! agent that models `ccCopyTable` over a real UDP socket on localhost.

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use snmpcopy_core::copy::mib::{COPY_ENTRY, Column};
use snmpcopy_core::copy::{RowRegistry, SequenceRowIds};
use snmpcopy_core::snmp::{ErrorStatus, Message, PduType};
use snmpcopy_core::{
    CopyError, CopyOrchestrator, CopyRequest, Device, Location, Oid, PollPolicy, SnmpTarget,
    UdpTransport, Value, VarBind,
};
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;

// ── Fake agent ───────────────────────────────────────────────────

#[derive(Clone)]
struct Behavior {
    community: &'static str,
    /// Status polls answered with waiting/running before the final status.
    busy_polls: u32,
    final_status: i32,
    fail_cause: Option<i32>,
    reject_create: bool,
}

impl Default for Behavior {
    fn default() -> Self {
        Self {
            community: "private",
            busy_polls: 2,
            final_status: 3,
            fail_cause: None,
            reject_create: false,
        }
    }
}

#[derive(Default)]
struct AgentState {
    sets: Vec<Vec<VarBind>>,
    /// Row discriminator -> status polls answered so far.
    rows: HashMap<u32, u32>,
    rows_created: Vec<u32>,
}

struct FakeAgent {
    addr: SocketAddr,
    state: Arc<Mutex<AgentState>>,
    handle: JoinHandle<()>,
}

impl FakeAgent {
    async fn spawn(behavior: Behavior) -> Self {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = socket.local_addr().unwrap();
        let state = Arc::new(Mutex::new(AgentState::default()));

        let handle = tokio::spawn({
            let state = state.clone();
            async move {
                let mut buf = vec![0u8; 2048];
                loop {
                    let Ok((len, from)) = socket.recv_from(&mut buf).await else {
                        break;
                    };
                    let Ok(request) = Message::decode(&buf[..len]) else {
                        continue;
                    };
                    if &request.community[..] != behavior.community.as_bytes() {
                        continue;
                    }
                    let response = answer(&behavior, &state, &request);
                    let bytes = response.to_bytes().unwrap();
                    socket.send_to(&bytes, from).await.unwrap();
                }
            }
        });

        Self {
            addr,
            state,
            handle,
        }
    }

    fn target(&self) -> SnmpTarget {
        SnmpTarget::new("127.0.0.1", "private")
            .with_port(self.addr.port())
            .with_source_address(IpAddr::V4(Ipv4Addr::LOCALHOST))
            .with_timeout(Duration::from_millis(250))
            .with_retries(1)
    }

    fn sets(&self) -> Vec<Vec<VarBind>> {
        self.state.lock().unwrap().sets.clone()
    }

    fn live_rows(&self) -> usize {
        self.state.lock().unwrap().rows.len()
    }

    fn rows_created(&self) -> Vec<u32> {
        self.state.lock().unwrap().rows_created.clone()
    }
}

impl Drop for FakeAgent {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn copy_column(oid: &Oid) -> Option<(u32, u32)> {
    let arcs = oid.arcs();
    if arcs.len() == COPY_ENTRY.len() + 2 && arcs.starts_with(&COPY_ENTRY) {
        Some((arcs[COPY_ENTRY.len()], arcs[COPY_ENTRY.len() + 1]))
    } else {
        None
    }
}

fn answer(behavior: &Behavior, state: &Mutex<AgentState>, request: &Message) -> Message {
    let mut state = state.lock().unwrap();
    let pdu = &request.pdu;

    let response = match pdu.pdu_type {
        PduType::SetRequest => {
            state.sets.push(pdu.bindings.clone());
            let mut rejected = None;
            for (i, vb) in pdu.bindings.iter().enumerate() {
                let Some((column, row)) = copy_column(&vb.oid) else {
                    continue;
                };
                if column != Column::EntryRowStatus.number() {
                    continue;
                }
                match vb.value {
                    Value::Integer(4) if behavior.reject_create => rejected = Some(i as u32 + 1),
                    Value::Integer(4) => {
                        state.rows.insert(row, 0);
                        state.rows_created.push(row);
                    }
                    Value::Integer(6) => {
                        state.rows.remove(&row);
                    }
                    _ => {}
                }
            }
            let response = pdu.response(pdu.bindings.clone());
            match rejected {
                Some(index) => response.with_error(ErrorStatus::NoCreation, index),
                None => response,
            }
        }
        PduType::GetRequest => {
            let bindings = pdu
                .bindings
                .iter()
                .map(|vb| VarBind::new(vb.oid.clone(), get_value(behavior, &mut state, &vb.oid)))
                .collect();
            pdu.response(bindings)
        }
        _ => pdu.response(vec![]).with_error(ErrorStatus::GenErr, 0),
    };
    Message::new(behavior.community, response)
}

fn get_value(behavior: &Behavior, state: &mut AgentState, oid: &Oid) -> Value {
    if oid.to_string() == "1.3.6.1.2.1.1.5.0" {
        return Value::octet_string("lab-r1");
    }
    if oid.to_string() == "1.3.6.1.2.1.1.1.0" {
        return Value::octet_string("Cisco IOS Software, C2960 Software");
    }
    let Some((column, row)) = copy_column(oid) else {
        return Value::NoSuchObject;
    };
    let Some(polls) = state.rows.get_mut(&row) else {
        return Value::NoSuchInstance;
    };
    match column {
        10 => {
            *polls += 1;
            if *polls == 1 && behavior.busy_polls > 0 {
                Value::Integer(1)
            } else if *polls <= behavior.busy_polls {
                Value::Integer(2)
            } else {
                Value::Integer(behavior.final_status)
            }
        }
        13 => behavior
            .fail_cause
            .map_or(Value::NoSuchInstance, Value::Integer),
        11 => Value::TimeTicks(500),
        12 => Value::TimeTicks(740),
        _ => Value::NoSuchInstance,
    }
}

// ── Helpers ──────────────────────────────────────────────────────

fn fast_policy() -> PollPolicy {
    PollPolicy::fixed(50, Duration::from_millis(5))
}

fn device(agent: &FakeAgent) -> Device {
    Device::new(agent.target()).configure(|o| o.with_poll_policy(fast_policy()))
}

fn destroy_sets(sets: &[Vec<VarBind>], row: u32) -> usize {
    sets.iter()
        .filter(|s| {
            s.len() == 1
                && s[0].value == Value::Integer(6)
                && copy_column(&s[0].oid) == Some((14, row))
        })
        .count()
}

// ── Copy lifecycle ───────────────────────────────────────────────

#[tokio::test]
async fn test_running_to_startup() {
    let agent = FakeAgent::spawn(Behavior::default()).await;
    let device = device(&agent);

    let report = device
        .copy(&CopyRequest::new(Location::Running, Location::Startup))
        .await
        .unwrap();
    assert_eq!(report.to_string(), "snmp copy result: successful");
    assert_eq!(report.polls, 3);

    let created = agent.rows_created();
    assert_eq!(created.len(), 1);
    let row = created[0];
    assert!((100..=999).contains(&row));

    let sets = agent.sets();
    let create = sets
        .iter()
        .find(|s| s.len() > 1)
        .expect("creation set issued");
    let columns: Vec<_> = create
        .iter()
        .map(|vb| (copy_column(&vb.oid).unwrap().0, vb.value.clone()))
        .collect();
    assert_eq!(
        columns,
        vec![
            (3, Value::Integer(4)),
            (4, Value::Integer(3)),
            (14, Value::Integer(4)),
        ]
    );

    // stale-row clear + teardown
    assert_eq!(destroy_sets(&sets, row), 2);
    assert_eq!(sets.last().map(|s| s[0].value.clone()), Some(Value::Integer(6)));
    assert_eq!(agent.live_rows(), 0);
}

#[tokio::test]
async fn test_startup_to_tftp_backup() {
    let agent = FakeAgent::spawn(Behavior::default()).await;
    let device = device(&agent);

    let request = CopyRequest::new(Location::Startup, Location::Tftp)
        .server("10.0.0.5")
        .filename("cfg.txt");
    let report = device.copy(&request).await.unwrap();
    assert!(report.is_success());

    let sets = agent.sets();
    let create = sets.iter().find(|s| s.len() > 1).unwrap();
    let by_column: HashMap<u32, Value> = create
        .iter()
        .map(|vb| (copy_column(&vb.oid).unwrap().0, vb.value.clone()))
        .collect();
    assert_eq!(by_column[&5], Value::IpAddress(Ipv4Addr::new(10, 0, 0, 5)));
    assert_eq!(by_column[&6], Value::octet_string("cfg.txt"));
    assert_eq!(by_column[&3], Value::Integer(3));
    assert_eq!(by_column[&4], Value::Integer(1));
    assert_eq!(by_column[&2], Value::Integer(1));
    assert!(!by_column.contains_key(&7));
    assert!(!by_column.contains_key(&8));
    assert_eq!(copy_column(&create.last().unwrap().oid).unwrap().0, 14);
}

#[tokio::test]
async fn test_failure_reports_cause() {
    let agent = FakeAgent::spawn(Behavior {
        final_status: 4,
        fail_cause: Some(3),
        ..Behavior::default()
    })
    .await;
    let device = device(&agent);

    let request = CopyRequest::new(Location::Scp, Location::Running)
        .server("10.0.0.9")
        .filename("r1.cfg")
        .credentials("backup", "hunter2");
    let report = device.copy(&request).await.unwrap();
    assert!(!report.is_success());
    assert_eq!(report.to_string(), "snmp copy result: operation timed out");
    assert_eq!(agent.live_rows(), 0);
}

#[tokio::test]
async fn test_polling_timeout_still_destroys_once() {
    let agent = FakeAgent::spawn(Behavior {
        busy_polls: u32::MAX,
        ..Behavior::default()
    })
    .await;
    let device = Device::new(agent.target())
        .configure(|o| o.with_poll_policy(PollPolicy::fixed(20, Duration::from_millis(1))));

    let report = device
        .copy(&CopyRequest::new(Location::Running, Location::Startup))
        .await
        .unwrap();
    assert!(report.timed_out());
    assert_eq!(report.polls, 20);
    assert_eq!(report.to_string(), "snmp copy result: running");

    let row = agent.rows_created()[0];
    let sets = agent.sets();
    let create_at = sets.iter().position(|s| s.len() > 1).unwrap();
    assert_eq!(destroy_sets(&sets[create_at..], row), 1);
    assert_eq!(agent.live_rows(), 0);
}

#[tokio::test]
async fn test_rejected_create_surfaces_protocol_error() {
    let agent = FakeAgent::spawn(Behavior {
        reject_create: true,
        ..Behavior::default()
    })
    .await;
    let device = device(&agent);

    let err = device
        .copy(&CopyRequest::new(Location::Running, Location::Startup))
        .await
        .unwrap_err();
    match &err {
        CopyError::Protocol {
            status, offending, ..
        } => {
            assert_eq!(*status, ErrorStatus::NoCreation);
            assert_eq!(copy_column(offending.as_ref().unwrap()).unwrap().0, 14);
        }
        other => panic!("expected protocol error, got {other:?}"),
    }

    let sets = agent.sets();
    assert_eq!(sets.len(), 3);
    assert_eq!(sets[2][0].value, Value::Integer(6));
}

#[tokio::test]
async fn test_timestamps_enriched_report() {
    let agent = FakeAgent::spawn(Behavior::default()).await;
    let device = Device::new(agent.target())
        .configure(|o| o.with_poll_policy(fast_policy()).with_timestamps(true));

    let report = device
        .copy(&CopyRequest::new(Location::Startup, Location::Running))
        .await
        .unwrap();
    assert_eq!(report.started, Some(500));
    assert_eq!(report.completed, Some(740));
}

// ── Error scenarios ──────────────────────────────────────────────

#[tokio::test]
async fn test_wrong_community_is_no_response() {
    let agent = FakeAgent::spawn(Behavior {
        community: "s3cret",
        ..Behavior::default()
    })
    .await;
    let device = device(&agent);

    let err = device.system_name().await.unwrap_err();
    assert!(matches!(err, CopyError::NoResponse { attempts: 2, .. }));
    assert!(err.is_transport());
}

#[tokio::test]
async fn test_invalid_request_sends_nothing() {
    let agent = FakeAgent::spawn(Behavior::default()).await;
    let device = device(&agent);

    let err = device
        .copy(&CopyRequest::new(Location::Running, Location::Tftp).server("10.0.0.5"))
        .await
        .unwrap_err();
    assert!(matches!(err, CopyError::InvalidRequest(_)));
    assert!(agent.sets().is_empty());
}

// ── Row identity ─────────────────────────────────────────────────

#[tokio::test]
async fn test_concurrent_copies_get_distinct_rows() {
    let agent = FakeAgent::spawn(Behavior {
        busy_polls: 5,
        ..Behavior::default()
    })
    .await;
    let registry = RowRegistry::new();
    let key = agent.target().key();

    // Both sources start on 333; the registry forces the second one on.
    let make = |ids: Vec<u16>| {
        CopyOrchestrator::new(Arc::new(UdpTransport::new(agent.target())), key.clone())
            .with_registry(registry.clone())
            .with_row_ids(Arc::new(SequenceRowIds::new(ids)))
            .with_poll_policy(fast_policy())
    };
    let first = make(vec![333]);
    let second = make(vec![333, 334]);

    let request = CopyRequest::new(Location::Running, Location::Startup);
    let (a, b) = tokio::join!(first.copy(&request), second.copy(&request));
    let (a, b) = (a.unwrap(), b.unwrap());

    assert_ne!(a.row, b.row);
    let mut created = agent.rows_created();
    created.sort_unstable();
    assert_eq!(created, vec![333, 334]);
    assert_eq!(registry.active_count(&key), 0);
    assert_eq!(agent.live_rows(), 0);
}

// ── Generic access ───────────────────────────────────────────────

#[tokio::test]
async fn test_system_info() {
    let agent = FakeAgent::spawn(Behavior::default()).await;
    let device = device(&agent);

    assert_eq!(device.system_name().await.unwrap(), "lab-r1");
    assert!(device.system_description().await.unwrap().starts_with("Cisco IOS"));

    let bindings = device
        .get(&["1.3.6.1.4.1.9.9.96.1.1.1.1.10.999".parse().unwrap()])
        .await
        .unwrap();
    assert_eq!(bindings[0].value, Value::NoSuchInstance);
}
