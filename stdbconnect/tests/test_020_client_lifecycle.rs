mod test_utils;

use log::info;
use stdbconnect::{ConnectionState, DbClient, StdbError, StdbResult};
use test_utils::{
    initial_connection_frame, schema, Event, RecordingHandler, ScriptedTransport,
};

#[test]
fn test_020_client_lifecycle() -> StdbResult<()> {
    let _log_handle = test_utils::init_logger();
    authentication_fires_on_connect_once()?;
    subscribe_frames_are_byte_exact()?;
    request_ids_increase_across_operations()?;
    closed_stream_emits_on_disconnect()?;
    operations_require_a_connection();
    Ok(())
}

fn authentication_fires_on_connect_once() -> StdbResult<()> {
    info!("authenticate from an initial_connection frame");
    let (mut transport, _sent) = ScriptedTransport::new();
    let identity = [0x11_u8; 32];
    let connection_id = *b"conn-id-16-bytes";
    transport.push_frame(initial_connection_frame(&identity, &connection_id, "tok-9"));
    transport.push_nothing();

    let (handler, events) = RecordingHandler::new();
    let mut client = DbClient::new(schema(), Box::new(handler));
    client.connect(Box::new(transport));
    assert_eq!(client.state(), ConnectionState::Connected);

    assert!(client.frame_tick()?);
    assert_eq!(client.state(), ConnectionState::Authenticated);
    assert_eq!(client.token(), Some("tok-9"));
    assert_eq!(client.identity(), Some(&identity));

    // the heartbeat tick must not re-fire the callback
    assert!(client.frame_tick()?);
    let events = events.lock().unwrap();
    let connects: Vec<&Event> = events
        .iter()
        .filter(|event| matches!(event, Event::Connect { .. }))
        .collect();
    assert_eq!(connects.len(), 1);
    match connects[0] {
        Event::Connect {
            identity: got_identity,
            connection_id: got_connection_id,
            token,
        } => {
            assert_eq!(*got_identity, identity);
            assert_eq!(*got_connection_id, connection_id);
            assert_eq!(token, "tok-9");
        }
        _ => unreachable!(),
    }
    Ok(())
}

fn subscribe_frames_are_byte_exact() -> StdbResult<()> {
    info!("subscribe emits the documented wire layout");
    let (transport, sent) = ScriptedTransport::new();
    let (handler, _events) = RecordingHandler::new();
    let mut client = DbClient::new(schema(), Box::new(handler));
    client.connect(Box::new(transport));

    // force the query set counter to 7 and the request counter to 42
    for _ in 1..7 {
        client.subscribe(vec![String::new()])?;
    }
    for _ in 7..42 {
        client.one_off_query("SELECT 1")?;
    }
    let query_set_id = client.subscribe(vec![
        "SELECT * FROM players".to_string(),
        "SELECT * FROM scores".to_string(),
    ])?;
    assert_eq!(query_set_id, 7);

    let sent = sent.lock().unwrap();
    let frame = sent.last().unwrap();
    let mut expected = vec![0x00];
    expected.extend_from_slice(&42_u32.to_le_bytes());
    expected.extend_from_slice(&7_u32.to_le_bytes());
    expected.extend_from_slice(&2_u32.to_le_bytes());
    expected.extend_from_slice(&21_u32.to_le_bytes());
    expected.extend_from_slice(b"SELECT * FROM players");
    expected.extend_from_slice(&20_u32.to_le_bytes());
    expected.extend_from_slice(b"SELECT * FROM scores");
    assert_eq!(frame, &expected);
    Ok(())
}

fn request_ids_increase_across_operations() -> StdbResult<()> {
    info!("request ids start at 1 and only grow");
    let (transport, _sent) = ScriptedTransport::new();
    let (handler, _events) = RecordingHandler::new();
    let mut client = DbClient::new(schema(), Box::new(handler));
    client.connect(Box::new(transport));

    let first = client.one_off_query("SELECT 1")?;
    let _query_set = client.subscribe(vec!["SELECT * FROM players".to_string()])?;
    let third = client.call_reducer_raw("rename", vec![])?;
    let fourth = client.unsubscribe(1, false)?;
    assert_eq!(first, 1);
    assert_eq!(third, 3);
    assert_eq!(fourth, 4);
    Ok(())
}

fn closed_stream_emits_on_disconnect() -> StdbResult<()> {
    info!("EOF transitions to disconnected");
    let (transport, _sent) = ScriptedTransport::new();
    let (handler, events) = RecordingHandler::new();
    let mut client = DbClient::new(schema(), Box::new(handler));
    client.connect(Box::new(transport));

    assert!(!client.frame_tick()?);
    assert_eq!(client.state(), ConnectionState::Disconnected);
    let events = events.lock().unwrap();
    assert!(matches!(events.last(), Some(Event::Disconnect(_))));
    Ok(())
}

fn operations_require_a_connection() {
    info!("sends without a transport are usage errors");
    let (handler, _events) = RecordingHandler::new();
    let mut client = DbClient::new(schema(), Box::new(handler));
    assert!(matches!(
        client.one_off_query("SELECT 1"),
        Err(StdbError::NotConnected)
    ));
    assert!(matches!(
        client.subscribe(vec![String::new()]),
        Err(StdbError::NotConnected)
    ));
}
